//! Config file loading.
//!
//! The file holds a [`StorefrontConfig`]; TOML unless the name ends in
//! `.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use storefront_commerce::config::StorefrontConfig;

/// Names searched for, in order, in the working directory and its parents.
pub const CONFIG_NAMES: [&str; 3] = ["shop.toml", ".shop.toml", "shop.json"];

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Load config from a file.
pub fn load(path: &Path) -> Result<StorefrontConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if is_json(path) {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }
}

/// Find the nearest config file at or above `start`.
///
/// Files that fail to parse are skipped.
pub fn find(start: &Path) -> Option<(PathBuf, StorefrontConfig)> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_NAMES {
            let path = current.join(name);
            if path.is_file() {
                match load(&path) {
                    Ok(config) => return Some((path, config)),
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping config file"),
                }
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Generate a default shop.toml config file.
pub fn generate_default_config() -> String {
    r#"# Storefront configuration

[storage]
# Relative paths are resolved against this file's directory.
dir = ".shop"
namespace = "shop"

[checkout]
processing_delay_ms = 1500

[orders]
# "exclude_voided" or "include_voided"
spend_policy = "exclude_voided"

[promotions.codes]
SAVE10 = 0.10
SAVE20 = 0.20
WELCOME15 = 0.15

[currency.rates]
# EUR = 0.92
# JPY = 150.0
"#
    .to_string()
}
