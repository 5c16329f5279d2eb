use serde::{Deserialize, Serialize};

use crate::env;
use crate::error::{ScalarError, ScalarResult};
use crate::scalar::ScalarType;

/// Explicit compilation settings threaded through graphs and composites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScalarConfig {
    /// Floating type produced when true division sees only discrete operands,
    /// and the gradient type of discrete values.
    pub float_x: ScalarType,
}

impl ScalarConfig {
    pub fn new(float_x: ScalarType) -> ScalarResult<Self> {
        if !float_x.is_float() {
            return Err(ScalarError::type_error(format!(
                "float_x must be a floating type, got {float_x}"
            )));
        }
        Ok(Self { float_x })
    }

    /// Builds a config from `SCALARRS_FLOATX`, falling back to the defaults.
    pub fn from_env() -> Self {
        match env::float_x_override() {
            Some(float_x) => Self { float_x },
            None => Self::default(),
        }
    }

    /// Returns the config used by float32-narrowed composites.
    pub fn narrowed(self) -> Self {
        if self.float_x == ScalarType::Float16 {
            Self {
                float_x: ScalarType::Float32,
            }
        } else {
            self
        }
    }
}

impl Default for ScalarConfig {
    fn default() -> Self {
        Self {
            float_x: ScalarType::Float64,
        }
    }
}
