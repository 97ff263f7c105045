//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use storefront_commerce::config::StorefrontConfig;
use storefront_commerce::notify::{ChannelSink, Notification};
use storefront_commerce::Storefront;
use tokio::sync::mpsc;

use crate::config;
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// Storefront configuration.
    pub config: StorefrontConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from an explicit config file or the nearest one found.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config_path, config) = match config_path {
            Some(path) => {
                let path = resolve(&cwd, Path::new(path));
                let config = config::load(&path)?;
                (Some(path), config)
            }
            None => match config::find(&cwd) {
                Some((path, config)) => (Some(path), config),
                None => (None, StorefrontConfig::default()),
            },
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Directory the store lives in. Relative paths are taken from the
    /// config file's directory, or the working directory without one.
    pub fn storage_dir(&self) -> PathBuf {
        let base = self
            .config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(self.cwd.as_path());
        resolve(base, &self.config.storage.dir)
    }

    /// Open the storefront for one command.
    pub fn open_session(&self) -> Result<Session> {
        let mut config = self.config.clone();
        config.storage.dir = self.storage_dir();
        self.output
            .debug(&format!("Using store at {}", config.storage.dir.display()));

        let (sink, notifications) = ChannelSink::new();
        let shop = Storefront::open(config, Arc::new(sink))
            .with_context(|| format!("Failed to open store in {}", self.storage_dir().display()))?;

        Ok(Session {
            shop,
            notifications,
        })
    }
}

/// An open storefront plus the notifications it raised.
pub struct Session {
    pub shop: Storefront,
    notifications: mpsc::UnboundedReceiver<Notification>,
}

impl Session {
    /// Print every notification raised so far.
    pub fn flush(&mut self, output: &Output) {
        while let Ok(notification) = self.notifications.try_recv() {
            output.notification(&notification);
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_dir_relative_to_config_file() {
        let ctx = Context {
            config: StorefrontConfig::default(),
            config_path: Some(PathBuf::from("/srv/shop/shop.toml")),
            output: Output::new(false, true),
            cwd: PathBuf::from("/home/ada"),
        };
        assert_eq!(ctx.storage_dir(), PathBuf::from("/srv/shop/.shop"));
    }

    #[test]
    fn test_storage_dir_without_config_file() {
        let mut config = StorefrontConfig::default();
        config.storage.dir = PathBuf::from("/var/lib/shop");
        let ctx = Context {
            config,
            config_path: None,
            output: Output::new(false, true),
            cwd: PathBuf::from("/home/ada"),
        };
        assert_eq!(ctx.storage_dir(), PathBuf::from("/var/lib/shop"));
    }
}
