use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Stable numeric parameter key. Ids are grouped in bands per description,
/// e.g. `9000..=9004` for the complex shape base and `8000..=8013` for the
/// complex spline base.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamId(pub u32);

impl ParamId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec3([f32; 3]),
    String(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Params {
    pub values: BTreeMap<ParamId, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (ParamId, ParamValue)>) -> Self {
        Self {
            values: pairs.into_iter().collect(),
        }
    }

    pub fn get(&self, key: ParamId) -> Option<&ParamValue> {
        self.values.get(&key)
    }

    /// Stores `value` and reports whether the stored value changed.
    pub fn set(&mut self, key: ParamId, value: ParamValue) -> bool {
        let changed = self
            .values
            .get(&key)
            .map(|existing| existing != &value)
            .unwrap_or(true);
        if changed {
            self.values.insert(key, value);
        }
        changed
    }

    pub fn merge(&mut self, other: &Params) {
        for (key, value) in &other.values {
            self.values.insert(*key, value.clone());
        }
    }

    pub fn get_vec3(&self, key: ParamId, default: [f32; 3]) -> [f32; 3] {
        self.values
            .get(&key)
            .and_then(|value| match value {
                ParamValue::Vec3(v) => Some(*v),
                _ => None,
            })
            .unwrap_or(default)
    }

    pub fn get_float(&self, key: ParamId, default: f32) -> f32 {
        self.values
            .get(&key)
            .and_then(|value| match value {
                ParamValue::Float(v) => Some(*v),
                ParamValue::Int(v) => Some(*v as f32),
                _ => None,
            })
            .unwrap_or(default)
    }

    pub fn get_int(&self, key: ParamId, default: i32) -> i32 {
        self.values
            .get(&key)
            .and_then(|value| match value {
                ParamValue::Int(v) => Some(*v),
                // Float-stored counts truncate toward zero.
                ParamValue::Float(v) => Some(*v as i32),
                _ => None,
            })
            .unwrap_or(default)
    }

    pub fn get_bool(&self, key: ParamId, default: bool) -> bool {
        self.values
            .get(&key)
            .and_then(|value| match value {
                ParamValue::Bool(v) => Some(*v),
                _ => None,
            })
            .unwrap_or(default)
    }

    pub fn get_string<'a>(&'a self, key: ParamId, default: &'a str) -> &'a str {
        self.values
            .get(&key)
            .and_then(|value| match value {
                ParamValue::String(v) => Some(v.as_str()),
                _ => None,
            })
            .unwrap_or(default)
    }
}
