//! A typed key-value mapping standing in for Qt's `QVariantMap` (§9 design
//! note: "not part of the core contract", but its `get<T>(key, default)`
//! semantics are). Engine and solver factories read their parameters from
//! a [`ParamMap`]; only strings cross the factory boundary as enum-keys,
//! everything else is read out through [`ParamMap::get`].

use std::collections::HashMap;

/// One parameter value. Kept deliberately small: the distilled spec's
/// configuration keys are only floats, unsigned integers, and strings
/// (`min_step`, `max_recursion`, `"engine"`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Float(f64),
    UInt(u64),
    Str(String),
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        ParamValue::UInt(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// Trait implemented by the value types `ParamMap::get` can decode into.
/// `QVariantMap::value(key, default).toDouble()` and friends become
/// `map.get::<f64>(key, default)`.
pub trait FromParam: Sized {
    fn from_param(value: &ParamValue) -> Option<Self>;
}

impl FromParam for f64 {
    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Float(f) => Some(*f),
            ParamValue::UInt(u) => Some(*u as f64),
            ParamValue::Str(s) => s.parse().ok(),
        }
    }
}

impl FromParam for u32 {
    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::UInt(u) => Some(*u as u32),
            ParamValue::Float(f) => Some(*f as u32),
            ParamValue::Str(s) => s.parse().ok(),
        }
    }
}

impl FromParam for usize {
    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::UInt(u) => Some(*u as usize),
            ParamValue::Float(f) => Some(*f as usize),
            ParamValue::Str(s) => s.parse().ok(),
        }
    }
}

impl FromParam for String {
    fn from_param(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Str(s) => Some(s.clone()),
            ParamValue::Float(f) => Some(f.to_string()),
            ParamValue::UInt(u) => Some(u.to_string()),
        }
    }
}

/// Typed key-value configuration mapping, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap {
    values: HashMap<String, ParamValue>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// `QVariantMap::value(key, default).toT()`: returns `default` both
    /// when the key is absent and when the stored value cannot be decoded
    /// as `T` (mirrors Qt's lenient conversion semantics rather than
    /// surfacing a configuration error for a merely-wrong-typed value).
    pub fn get<T: FromParam>(&self, key: &str, default: T) -> T {
        self.values
            .get(key)
            .and_then(T::from_param)
            .unwrap_or(default)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ParamValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// Device-selector grammar documented here for completeness (§6): an
/// accelerator back-end would parse `"P:D[,D...][;P:D...]"` selecting a
/// platform `P` and one or more devices `D`, with repeated `P:D` groups
/// separated by `;` selecting independent contexts. No back-end in this
/// crate consumes it — OpenCL is out of scope — so it is never parsed,
/// only documented for the external back-end that would need it.
pub const DEVICE_SELECTOR_GRAMMAR: &str = "P:D[,D...][;P:D...]";
