//! # Value Adapters
//!
//! Some field types have no single natural JSON form. Dates are the main case:
//! the workshop may want `19/10/2026` in its files rather than chrono's default.
//! An [`AdapterRegistry`] maps a Rust type to a [`ValueAdapter`] that encodes a
//! value to a string and decodes it back.
//!
//! Fields opt in explicitly:
//!
//! ```ignore
//! #[serde(with = "crate::store::adapters::adapted")]
//! pub registered_on: NaiveDate,
//! ```
//!
//! The persistence service installs its registry for the duration of each
//! load/save ([`with_registry`]). Outside of that scope, or when no adapter is
//! registered for a type, the field falls back to the type's own serde impl.
//!
//! Every adapter must satisfy `decode(encode(v)) == v`.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

pub trait ValueAdapter<T> {
    fn encode(&self, value: &T) -> String;
    fn decode(&self, raw: &str) -> Result<T, String>;
}

#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<TypeId, Box<dyn Any>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the date and timestamp adapters every entity relies on.
    pub fn with_defaults(date_format: &str) -> Self {
        let mut registry = Self::new();
        registry
            .register::<NaiveDate>(DateAdapter::new(date_format))
            .register::<DateTime<Utc>>(TimestampAdapter);
        registry
    }

    /// Registers (or replaces) the adapter for `T`.
    pub fn register<T: 'static>(&mut self, adapter: impl ValueAdapter<T> + 'static) -> &mut Self {
        let adapter: Rc<dyn ValueAdapter<T>> = Rc::new(adapter);
        self.adapters.insert(TypeId::of::<T>(), Box::new(adapter));
        self
    }

    pub fn get<T: 'static>(&self) -> Option<Rc<dyn ValueAdapter<T>>> {
        self.adapters
            .get(&TypeId::of::<T>())?
            .downcast_ref::<Rc<dyn ValueAdapter<T>>>()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// `NaiveDate` as a `strftime` formatted string.
#[derive(Debug, Clone)]
pub struct DateAdapter {
    format: String,
}

impl DateAdapter {
    pub fn new(format: &str) -> Self {
        Self {
            format: format.to_string(),
        }
    }

    /// Like [`DateAdapter::new`], but rejects formats that lose information
    /// (e.g. `%d/%m` without a year) by round-tripping a probe date.
    pub fn checked(format: &str) -> Result<Self, String> {
        let adapter = Self::new(format);
        let probe = NaiveDate::from_ymd_opt(2031, 12, 29)
            .ok_or_else(|| "invalid probe date".to_string())?;
        match adapter.decode(&adapter.encode(&probe)) {
            Ok(decoded) if decoded == probe => Ok(adapter),
            _ => Err(format!("date format '{}' does not round-trip", format)),
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}

impl ValueAdapter<NaiveDate> for DateAdapter {
    fn encode(&self, value: &NaiveDate) -> String {
        value.format(&self.format).to_string()
    }

    fn decode(&self, raw: &str) -> Result<NaiveDate, String> {
        NaiveDate::parse_from_str(raw, &self.format)
            .map_err(|e| format!("invalid date '{}' for format '{}': {}", raw, self.format, e))
    }
}

/// `DateTime<Utc>` as RFC 3339, keeping sub-second precision.
#[derive(Debug, Clone, Copy)]
pub struct TimestampAdapter;

impl ValueAdapter<DateTime<Utc>> for TimestampAdapter {
    fn encode(&self, value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    fn decode(&self, raw: &str) -> Result<DateTime<Utc>, String> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
    }
}

thread_local! {
    static ACTIVE: RefCell<Option<Rc<AdapterRegistry>>> = const { RefCell::new(None) };
}

struct RestoreActive(Option<Rc<AdapterRegistry>>);

impl Drop for RestoreActive {
    fn drop(&mut self) {
        let previous = self.0.take();
        ACTIVE.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Runs `f` with `registry` as the active adapter set for this thread.
pub fn with_registry<R>(registry: &Rc<AdapterRegistry>, f: impl FnOnce() -> R) -> R {
    let previous = ACTIVE.with(|slot| slot.replace(Some(Rc::clone(registry))));
    let _restore = RestoreActive(previous);
    f()
}

fn active<T: 'static>() -> Option<Rc<dyn ValueAdapter<T>>> {
    ACTIVE.with(|slot| slot.borrow().as_ref().and_then(|r| r.get::<T>()))
}

/// `#[serde(with = "adapted")]` for plain fields.
pub mod adapted {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize + 'static,
        S: Serializer,
    {
        match super::active::<T>() {
            Some(adapter) => serializer.serialize_str(&adapter.encode(value)),
            None => value.serialize(serializer),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: Deserialize<'de> + 'static,
        D: Deserializer<'de>,
    {
        match super::active::<T>() {
            Some(adapter) => {
                let raw = String::deserialize(deserializer)?;
                adapter.decode(&raw).map_err(de::Error::custom)
            }
            None => T::deserialize(deserializer),
        }
    }
}

/// `#[serde(with = "adapted_option")]` for `Option<T>` fields.
pub mod adapted_option {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    struct Adapted<'a, T>(&'a T);

    impl<T: Serialize + 'static> Serialize for Adapted<'_, T> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            super::adapted::serialize(self.0, serializer)
        }
    }

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize + 'static,
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(&Adapted(v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de> + 'static,
        D: Deserializer<'de>,
    {
        match super::active::<T>() {
            Some(adapter) => Option::<String>::deserialize(deserializer)?
                .map(|raw| adapter.decode(&raw).map_err(de::Error::custom))
                .transpose(),
            None => Option::<T>::deserialize(deserializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Visit {
        #[serde(with = "adapted")]
        on: NaiveDate,
        #[serde(default, with = "adapted_option")]
        closed_at: Option<DateTime<Utc>>,
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn registry_lookup_by_type() {
        let registry = AdapterRegistry::with_defaults(DEFAULT_DATE_FORMAT);
        assert_eq!(registry.len(), 2);
        assert!(registry.get::<NaiveDate>().is_some());
        assert!(registry.get::<DateTime<Utc>>().is_some());
        assert!(registry.get::<String>().is_none());
    }

    #[test]
    fn register_replaces_existing_adapter() {
        let mut registry = AdapterRegistry::with_defaults(DEFAULT_DATE_FORMAT);
        registry.register::<NaiveDate>(DateAdapter::new("%d.%m.%Y"));
        assert_eq!(registry.len(), 2);
        let adapter = registry.get::<NaiveDate>().unwrap();
        assert_eq!(adapter.encode(&date(2026, 10, 19)), "19.10.2026");
    }

    #[test]
    fn fields_use_the_active_registry() {
        let registry = Rc::new(AdapterRegistry::with_defaults("%d/%m/%Y"));
        let visit = Visit {
            on: date(2026, 3, 4),
            closed_at: None,
        };

        let json = with_registry(&registry, || serde_json::to_string(&visit).unwrap());
        assert_eq!(json, r#"{"on":"04/03/2026","closed_at":null}"#);

        let back: Visit = with_registry(&registry, || serde_json::from_str(&json).unwrap());
        assert_eq!(back, visit);
    }

    #[test]
    fn falls_back_to_serde_outside_a_scope() {
        let visit = Visit {
            on: date(2026, 3, 4),
            closed_at: None,
        };
        let json = serde_json::to_string(&visit).unwrap();
        assert_eq!(json, r#"{"on":"2026-03-04","closed_at":null}"#);
    }

    #[test]
    fn scope_is_restored_after_use() {
        let registry = Rc::new(AdapterRegistry::with_defaults("%d/%m/%Y"));
        with_registry(&registry, || assert!(active::<NaiveDate>().is_some()));
        assert!(active::<NaiveDate>().is_none());
    }

    #[test]
    fn missing_optional_field_defaults_to_none() {
        let registry = Rc::new(AdapterRegistry::with_defaults(DEFAULT_DATE_FORMAT));
        let back: Visit =
            with_registry(&registry, || serde_json::from_str(r#"{"on":"2026-01-02"}"#).unwrap());
        assert_eq!(back.closed_at, None);
    }

    #[test]
    fn decode_errors_surface_through_serde() {
        let registry = Rc::new(AdapterRegistry::with_defaults(DEFAULT_DATE_FORMAT));
        let result: Result<Visit, _> =
            with_registry(&registry, || serde_json::from_str(r#"{"on":"02/01/2026"}"#));
        assert!(result.is_err());
    }

    #[test]
    fn checked_rejects_lossy_formats() {
        assert!(DateAdapter::checked("%Y-%m-%d").is_ok());
        assert!(DateAdapter::checked("%d/%m/%Y").is_ok());
        assert!(DateAdapter::checked("%d/%m").is_err());
        assert!(DateAdapter::checked("%B").is_err());
    }

    #[test]
    fn timestamp_keeps_subseconds() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap() + Duration::nanoseconds(123_456_789);
        let adapter = TimestampAdapter;
        assert_eq!(adapter.decode(&adapter.encode(&ts)).unwrap(), ts);
    }

    proptest! {
        #[test]
        fn date_round_trip(days in 0i64..150_000, fmt in prop::sample::select(vec!["%Y-%m-%d", "%d/%m/%Y", "%m-%d-%Y", "%d.%m.%Y"])) {
            let value = date(1900, 1, 1) + Duration::days(days);
            let adapter = DateAdapter::new(fmt);
            prop_assert_eq!(adapter.decode(&adapter.encode(&value)).unwrap(), value);
        }

        #[test]
        fn timestamp_round_trip(secs in 0i64..4_000_000_000, nanos in 0u32..1_000_000_000) {
            let value = Utc.timestamp_opt(secs, nanos).unwrap();
            let adapter = TimestampAdapter;
            prop_assert_eq!(adapter.decode(&adapter.encode(&value)).unwrap(), value);
        }
    }
}
