use crate::mesh::ShadingTag;
use crate::param_spec::ParamSpec;
use crate::params::{ParamId, ParamValue, Params};

/// A parameter-driven object as the host sees it: its parameter set, an
/// optional shading tag and a counter that moves on every real edit.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveObject {
    params: Params,
    specs: Vec<ParamSpec>,
    shading: Option<ShadingTag>,
    dirty_count: u64,
}

impl PrimitiveObject {
    pub fn new(params: Params, specs: Vec<ParamSpec>) -> Self {
        Self {
            params,
            specs,
            shading: None,
            dirty_count: 0,
        }
    }

    /// Attaches a shading tag at construction; the object starts clean.
    pub fn with_shading(mut self, shading: ShadingTag) -> Self {
        self.shading = Some(shading);
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param_specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    pub fn param_spec(&self, key: ParamId) -> Option<&ParamSpec> {
        self.specs.iter().find(|spec| spec.key == key)
    }

    pub fn dirty_count(&self) -> u64 {
        self.dirty_count
    }

    /// Stores an edited value, clamped to its declared range. Returns whether
    /// the stored value changed; only then does the dirty counter move.
    pub fn set_param(&mut self, key: ParamId, value: ParamValue) -> Result<bool, String> {
        let value = match self.param_spec(key) {
            Some(spec) if spec.read_only => {
                return Err(format!(
                    "parameter {} ({}) is read-only",
                    key.value(),
                    spec.label
                ))
            }
            Some(spec) => spec.clamp(value)?,
            None => value,
        };
        let changed = self.params.set(key, value);
        if changed {
            self.dirty_count = self.dirty_count.wrapping_add(1);
        }
        Ok(changed)
    }

    /// Applies every value of `params`; returns how many changed.
    pub fn set_params(&mut self, params: &Params) -> Result<usize, String> {
        let mut changed = 0;
        for (key, value) in &params.values {
            if self.set_param(*key, value.clone())? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Writes an informational string without marking the object dirty.
    pub fn set_status(&mut self, key: ParamId, text: impl Into<String>) {
        self.params.set(key, ParamValue::String(text.into()));
    }

    pub fn shading(&self) -> Option<&ShadingTag> {
        self.shading.as_ref()
    }

    pub fn set_shading(&mut self, shading: Option<ShadingTag>) {
        if self.shading != shading {
            self.shading = shading;
            self.dirty_count = self.dirty_count.wrapping_add(1);
        }
    }
}
