use crate::params::{ParamId, ParamValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Float,
    Int,
    Bool,
    Vec3,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamRange {
    Float { min: f32, max: f32 },
    Int { min: i32, max: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamOption {
    pub value: i32,
    pub label: &'static str,
}

/// Describes one editable parameter. The range is enforced when the value is
/// edited through [`crate::PrimitiveObject::set_param`], never at generation time.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub key: ParamId,
    pub label: &'static str,
    pub kind: ParamKind,
    pub range: Option<ParamRange>,
    pub options: Vec<ParamOption>,
    pub help: Option<&'static str>,
    pub read_only: bool,
}

impl ParamSpec {
    pub fn new(key: ParamId, label: &'static str, kind: ParamKind) -> Self {
        Self {
            key,
            label,
            kind,
            range: None,
            options: Vec::new(),
            help: None,
            read_only: false,
        }
    }

    pub fn float(key: ParamId, label: &'static str) -> Self {
        Self::new(key, label, ParamKind::Float)
    }

    pub fn float_min(key: ParamId, label: &'static str, min: f32) -> Self {
        Self::new(key, label, ParamKind::Float).with_range(ParamRange::Float {
            min,
            max: f32::INFINITY,
        })
    }

    pub fn float_range(key: ParamId, label: &'static str, min: f32, max: f32) -> Self {
        Self::new(key, label, ParamKind::Float).with_range(ParamRange::Float { min, max })
    }

    pub fn int_min(key: ParamId, label: &'static str, min: i32) -> Self {
        Self::new(key, label, ParamKind::Int).with_range(ParamRange::Int { min, max: i32::MAX })
    }

    pub fn int_enum(key: ParamId, label: &'static str, options: Vec<(i32, &'static str)>) -> Self {
        let options = options
            .into_iter()
            .map(|(value, label)| ParamOption { value, label })
            .collect();
        Self::new(key, label, ParamKind::Int).with_options(options)
    }

    pub fn bool(key: ParamId, label: &'static str) -> Self {
        Self::new(key, label, ParamKind::Bool)
    }

    pub fn vec3(key: ParamId, label: &'static str) -> Self {
        Self::new(key, label, ParamKind::Vec3)
    }

    pub fn string(key: ParamId, label: &'static str) -> Self {
        Self::new(key, label, ParamKind::String)
    }

    pub fn status(key: ParamId, label: &'static str) -> Self {
        let mut spec = Self::new(key, label, ParamKind::String);
        spec.read_only = true;
        spec
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub fn with_range(mut self, range: ParamRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_options(mut self, options: Vec<ParamOption>) -> Self {
        self.options = options;
        self
    }

    /// Brings an edited value into this parameter's range. Values of a
    /// different kind are rejected.
    pub fn clamp(&self, value: ParamValue) -> Result<ParamValue, String> {
        let value = match (self.kind, value) {
            (ParamKind::Float, ParamValue::Float(v)) => ParamValue::Float(v),
            (ParamKind::Float, ParamValue::Int(v)) => ParamValue::Float(v as f32),
            (ParamKind::Int, ParamValue::Int(v)) => ParamValue::Int(v),
            (ParamKind::Int, ParamValue::Float(v)) => ParamValue::Int(v as i32),
            (ParamKind::Bool, ParamValue::Bool(v)) => ParamValue::Bool(v),
            (ParamKind::Vec3, ParamValue::Vec3(v)) => ParamValue::Vec3(v),
            (ParamKind::String, ParamValue::String(v)) => ParamValue::String(v),
            (kind, other) => {
                return Err(format!(
                    "parameter {} ({}) expects {:?}, got {:?}",
                    self.key.value(),
                    self.label,
                    kind,
                    other
                ))
            }
        };

        if let ParamValue::Int(v) = value {
            if !self.options.is_empty() && !self.options.iter().any(|opt| opt.value == v) {
                return Err(format!(
                    "parameter {} ({}) has no option {}",
                    self.key.value(),
                    self.label,
                    v
                ));
            }
        }

        Ok(match (self.range, value) {
            (Some(ParamRange::Int { min, max }), ParamValue::Int(v)) => {
                ParamValue::Int(v.clamp(min, max))
            }
            (Some(ParamRange::Float { min, max }), ParamValue::Float(v)) => {
                ParamValue::Float(v.max(min).min(max))
            }
            (_, value) => value,
        })
    }
}
