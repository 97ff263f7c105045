//! Preference commands.

use anyhow::{bail, Result};
use storefront_commerce::preferences::Preferences;
use storefront_commerce::Currency;

use super::{PrefsArgs, PrefsCommand};
use crate::context::{Context, Session};

/// Run the prefs command.
pub async fn run(args: PrefsArgs, ctx: &Context, session: &mut Session) -> Result<()> {
    match args.command.unwrap_or(PrefsCommand::Show) {
        PrefsCommand::Show => {
            show(ctx, session.shop.preferences().get());
            Ok(())
        }
        PrefsCommand::Set {
            currency,
            language,
            dark_mode,
            font_size,
            mfa,
        } => {
            let currency = match currency.as_deref() {
                Some(code) => Some(parse_currency(code)?),
                None => None,
            };

            let prefs = session.shop.preferences_mut();
            prefs.update(|p| {
                if let Some(currency) = currency {
                    p.currency = currency;
                }
                if let Some(language) = language {
                    p.language = language;
                }
                if let Some(enabled) = dark_mode {
                    p.dark_mode = enabled;
                }
                if let Some(size) = font_size {
                    p.font_size = size;
                }
                if let Some(enabled) = mfa {
                    p.mfa_enabled = enabled;
                }
            });

            let stored = prefs.get();
            if let Some(requested) = font_size {
                if requested != stored.font_size {
                    ctx.output.warn(&format!(
                        "Font size {} is out of range; using {}",
                        requested, stored.font_size
                    ));
                }
            }
            show(ctx, stored);
            Ok(())
        }
    }
}

fn parse_currency(code: &str) -> Result<Currency> {
    match Currency::from_code(code) {
        Some(currency) => Ok(currency),
        None => bail!("Unknown currency: {}", code),
    }
}

fn show(ctx: &Context, prefs: &Preferences) {
    if ctx.output.is_json() {
        ctx.output.json(prefs);
        return;
    }

    ctx.output.header("Preferences");
    ctx.output.kv("currency", prefs.currency.code());
    ctx.output.kv("language", &prefs.language);
    ctx.output.kv("dark_mode", &prefs.dark_mode.to_string());
    ctx.output.kv("font_size", &prefs.font_size.to_string());
    ctx.output.kv("mfa", &prefs.mfa_enabled.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency(" eur ").unwrap(), Currency::EUR);
        assert!(parse_currency("XYZ").is_err());
    }
}
