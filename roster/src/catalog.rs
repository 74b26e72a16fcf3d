//! Pillar catalog: the set of pillar keys a session may filter by.
//!
//! Fetched once at startup from the execution backend and immutable for
//! the session's lifetime. The example values are kept only for existence
//! validation and pretty-printing; they are never re-fetched.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value;

/// Catalog state for one session.
///
/// `Disabled` means pillar support was turned off at run time; a `Loaded`
/// catalog may still be empty if the fetch returned nothing or failed.
#[derive(Debug, Clone)]
pub enum PillarCatalog {
    Disabled,
    Loaded(BTreeMap<String, Value>),
}

impl PillarCatalog {
    pub fn disabled() -> Self {
        PillarCatalog::Disabled
    }

    pub fn empty() -> Self {
        PillarCatalog::Loaded(BTreeMap::new())
    }

    /// Build a catalog from a fetched pillar map, dropping keys that match
    /// the configured exclusion pattern (machine-internal pillars the user
    /// should never target by).
    pub fn from_map(map: BTreeMap<String, Value>, exclude: Option<&Regex>) -> Self {
        let kept = match exclude {
            Some(re) => map.into_iter().filter(|(k, _)| !re.is_match(k)).collect(),
            None => map,
        };
        PillarCatalog::Loaded(kept)
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, PillarCatalog::Disabled)
    }

    /// True when there is nothing to validate against: disabled, or loaded
    /// but empty.
    pub fn is_empty(&self) -> bool {
        match self {
            PillarCatalog::Disabled => true,
            PillarCatalog::Loaded(map) => map.is_empty(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        match self {
            PillarCatalog::Disabled => false,
            PillarCatalog::Loaded(map) => map.contains_key(key),
        }
    }

    /// `(type name, key)` pairs in sorted key order, for remediation hints
    /// and verbose startup output.
    pub fn describe(&self) -> Vec<(&'static str, &str)> {
        match self {
            PillarCatalog::Disabled => Vec::new(),
            PillarCatalog::Loaded(map) => map
                .iter()
                .map(|(k, v)| (type_name(v), k.as_str()))
                .collect(),
        }
    }
}

/// Human-readable JSON type name for an example pillar value.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
