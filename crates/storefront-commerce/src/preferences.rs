//! Shopper preferences.

use std::sync::Arc;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use storefront_kv::Store;
use tokio::sync::watch;

use crate::money::Currency;
use crate::notify::{Notification, NotificationEvent, NotificationSink, TracingSink};
use crate::persist::{self, Record};

/// Smallest font size the storefront renders.
pub const MIN_FONT_SIZE: u8 = 12;
/// Largest font size the storefront renders.
pub const MAX_FONT_SIZE: u8 = 24;

/// Display and account preferences.
///
/// Each stored field is read on its own: a missing or malformed field takes
/// its default and the rest of the record is kept. An unrecognized currency
/// code falls back to the canonical currency and an out-of-range font size
/// is clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub currency: Currency,
    pub language: String,
    pub dark_mode: bool,
    pub font_size: u8,
    pub mfa_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            currency: Currency::CANONICAL,
            language: "en".to_string(),
            dark_mode: false,
            font_size: 16,
            mfa_enabled: false,
        }
    }
}

impl Preferences {
    fn normalized(mut self) -> Self {
        self.font_size = clamp_font_size(self.font_size);
        if self.language.trim().is_empty() {
            self.language = Self::default().language;
        }
        self
    }
}

fn clamp_font_size(size: u8) -> u8 {
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

impl<'de> Deserialize<'de> for Preferences {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Value::Object(fields) = Value::deserialize(deserializer)? else {
            return Err(D::Error::custom("preferences must be an object"));
        };
        let defaults = Preferences::default();

        let currency = lenient_field::<String>(&fields, "currency")
            .and_then(|code| Currency::from_code(&code))
            .unwrap_or(defaults.currency);
        let font_size = lenient_field::<i64>(&fields, "font_size")
            .map(|size| size.clamp(i64::from(MIN_FONT_SIZE), i64::from(MAX_FONT_SIZE)) as u8)
            .unwrap_or(defaults.font_size);

        Ok(Preferences {
            currency,
            language: lenient_field(&fields, "language").unwrap_or(defaults.language),
            dark_mode: lenient_field(&fields, "dark_mode").unwrap_or(defaults.dark_mode),
            font_size,
            mfa_enabled: lenient_field(&fields, "mfa_enabled").unwrap_or(defaults.mfa_enabled),
        }
        .normalized())
    }
}

/// Read one field, or `None` when it is absent or has the wrong shape.
fn lenient_field<T: DeserializeOwned>(fields: &Map<String, Value>, name: &str) -> Option<T> {
    let value = fields.get(name)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(field = name, error = %e, "ignoring malformed stored preference");
            None
        }
    }
}

/// Owns the `preferences` record.
pub struct PreferencesStore {
    prefs: Preferences,
    store: Store,
    key: String,
    notifier: Arc<dyn NotificationSink>,
    tx: watch::Sender<Preferences>,
}

impl PreferencesStore {
    /// Load preferences persisted under `namespace`, filling gaps with
    /// defaults.
    pub fn load(store: Store, namespace: &str, notifier: Arc<dyn NotificationSink>) -> Self {
        let key = Record::Preferences.key(namespace);
        let prefs = persist::load_or_default::<Preferences>(
            &store,
            &key,
            Record::Preferences,
            notifier.as_ref(),
        )
        .normalized();
        let (tx, _) = watch::channel(prefs.clone());

        Self {
            prefs,
            store,
            key,
            notifier,
            tx,
        }
    }

    pub fn ephemeral() -> Self {
        Self::load(Store::in_memory(), "ephemeral", Arc::new(TracingSink))
    }

    pub fn get(&self) -> &Preferences {
        &self.prefs
    }

    pub fn set_currency(&mut self, currency: Currency) {
        self.update(|p| p.currency = currency);
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        let language = language.into();
        self.update(|p| p.language = language);
    }

    pub fn set_dark_mode(&mut self, enabled: bool) {
        self.update(|p| p.dark_mode = enabled);
    }

    /// Set the font size, clamped to `MIN_FONT_SIZE..=MAX_FONT_SIZE`.
    /// Returns the size actually stored.
    pub fn set_font_size(&mut self, size: u8) -> u8 {
        self.update(|p| p.font_size = size);
        self.prefs.font_size
    }

    pub fn set_mfa_enabled(&mut self, enabled: bool) {
        self.update(|p| p.mfa_enabled = enabled);
    }

    /// Apply `f`, then persist and publish if anything changed.
    pub fn update(&mut self, f: impl FnOnce(&mut Preferences)) {
        let mut next = self.prefs.clone();
        f(&mut next);
        let next = next.normalized();
        if next == self.prefs {
            return;
        }

        self.prefs = next;
        tracing::debug!(currency = %self.prefs.currency, language = %self.prefs.language, "preferences updated");
        persist::save(
            &self.store,
            &self.key,
            Record::Preferences,
            &self.prefs,
            self.notifier.as_ref(),
        );
        self.tx.send_replace(self.prefs.clone());
        self.notifier.notify(Notification::info(
            NotificationEvent::PreferencesUpdated,
            "Preferences saved",
        ));
    }

    /// Watch preferences. The receiver always holds the latest value.
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemorySink;

    #[test]
    fn test_defaults() {
        let prefs = PreferencesStore::ephemeral();
        assert_eq!(prefs.get(), &Preferences::default());
        assert_eq!(prefs.get().currency, Currency::USD);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let store = Store::in_memory();
        store
            .set_raw("shop:preferences", br#"{"dark_mode":true,"theme":"retro"}"#)
            .unwrap();
        let sink = Arc::new(MemorySink::new());

        let prefs = PreferencesStore::load(store, "shop", sink.clone());
        assert!(prefs.get().dark_mode);
        assert_eq!(prefs.get().font_size, 16);
        assert_eq!(prefs.get().language, "en");
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_unknown_currency_falls_back() {
        let store = Store::in_memory();
        store
            .set_raw("shop:preferences", br#"{"currency":"XYZ","font_size":40}"#)
            .unwrap();

        let prefs = PreferencesStore::load(store, "shop", Arc::new(TracingSink));
        assert_eq!(prefs.get().currency, Currency::USD);
        assert_eq!(prefs.get().font_size, MAX_FONT_SIZE);
    }

    #[test]
    fn test_malformed_field_keeps_the_rest() {
        let store = Store::in_memory();
        store
            .set_raw(
                "shop:preferences",
                br#"{"currency":"EUR","dark_mode":true,"font_size":300,"language":null,"mfa_enabled":"yes"}"#,
            )
            .unwrap();
        let sink = Arc::new(MemorySink::new());

        let prefs = PreferencesStore::load(store, "shop", sink.clone());
        assert_eq!(
            prefs.get(),
            &Preferences {
                currency: Currency::EUR,
                language: "en".to_string(),
                dark_mode: true,
                font_size: MAX_FONT_SIZE,
                mfa_enabled: false,
            }
        );
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_non_object_record_is_corrupt() {
        let store = Store::in_memory();
        store.set_raw("shop:preferences", b"[1,2,3]").unwrap();
        let sink = Arc::new(MemorySink::new());

        let prefs = PreferencesStore::load(store, "shop", sink.clone());
        assert_eq!(prefs.get(), &Preferences::default());
        assert_eq!(sink.events(), vec![NotificationEvent::PersistenceCorruption]);
    }

    #[test]
    fn test_corrupt_record_loads_defaults() {
        let store = Store::in_memory();
        store.set_raw("shop:preferences", b"not json").unwrap();
        let sink = Arc::new(MemorySink::new());

        let prefs = PreferencesStore::load(store, "shop", sink.clone());
        assert_eq!(prefs.get(), &Preferences::default());
        assert_eq!(sink.events(), vec![NotificationEvent::PersistenceCorruption]);
    }

    #[test]
    fn test_changes_persist_and_publish() {
        let store = Store::in_memory();
        let mut prefs = PreferencesStore::load(store.clone(), "shop", Arc::new(TracingSink));
        let rx = prefs.subscribe();

        prefs.set_currency(Currency::JPY);
        prefs.set_mfa_enabled(true);
        assert_eq!(prefs.set_font_size(4), MIN_FONT_SIZE);

        assert_eq!(rx.borrow().currency, Currency::JPY);
        let reloaded = PreferencesStore::load(store, "shop", Arc::new(TracingSink));
        assert_eq!(reloaded.get(), prefs.get());
        assert!(reloaded.get().mfa_enabled);
    }

    #[test]
    fn test_unchanged_update_is_silent() {
        let sink = Arc::new(MemorySink::new());
        let mut prefs = PreferencesStore::load(Store::in_memory(), "shop", sink.clone());
        prefs.set_dark_mode(false);
        assert!(sink.events().is_empty());

        prefs.set_dark_mode(true);
        assert_eq!(sink.events(), vec![NotificationEvent::PreferencesUpdated]);
    }
}
