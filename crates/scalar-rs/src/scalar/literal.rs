use std::fmt;

use half::f16;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{ScalarError, ScalarResult};
use crate::scalar::ScalarType;

/// Concrete scalar payload used for constants and interpreted evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Complex { re: f64, im: f64 },
}

impl Literal {
    /// Type given to a constant built from this literal without an explicit dtype.
    ///
    /// Integers get the smallest signed type holding them (`2` is `int8`).
    pub fn infer_type(self) -> ScalarType {
        match self {
            Literal::Bool(_) => ScalarType::Bool,
            Literal::Signed(value) => smallest_signed(i128::from(value)),
            Literal::Unsigned(value) => {
                if value <= i64::MAX as u64 {
                    smallest_signed(i128::from(value))
                } else {
                    ScalarType::UInt64
                }
            }
            Literal::Float(_) => ScalarType::Float64,
            Literal::Complex { .. } => ScalarType::Complex128,
        }
    }

    /// Converts to `ty` with C semantics: integers wrap, floats truncate toward
    /// zero, floating targets round to their width.
    pub fn cast(self, ty: ScalarType) -> Literal {
        match ty {
            ScalarType::Bool => Literal::Bool(self.is_truthy()),
            ScalarType::Float16 => Literal::Float(f16::from_f64(self.real()).to_f64()),
            ScalarType::Float32 => Literal::Float(self.real() as f32 as f64),
            ScalarType::Float64 => Literal::Float(self.real()),
            ScalarType::Complex64 => {
                let value = self.to_complex();
                Literal::Complex {
                    re: value.re as f32 as f64,
                    im: value.im as f32 as f64,
                }
            }
            ScalarType::Complex128 => {
                let value = self.to_complex();
                Literal::Complex {
                    re: value.re,
                    im: value.im,
                }
            }
            ty if ty.is_signed_integer() => {
                Literal::Signed(wrap_signed(self.truncated(), ty.bitwidth()))
            }
            ty => Literal::Unsigned(wrap_unsigned(self.truncated(), ty.bitwidth())),
        }
    }

    /// Converts to `ty`, rejecting values the type cannot represent exactly.
    ///
    /// Floating and complex targets always accept real inputs.
    pub fn checked_cast(self, ty: ScalarType) -> ScalarResult<Literal> {
        if let Literal::Complex { im, .. } = self {
            if im != 0.0 && !ty.is_complex() {
                return Err(ScalarError::domain(format!(
                    "{self} has an imaginary part and cannot be stored as {ty}"
                )));
            }
        }
        if !ty.is_discrete() {
            return Ok(self.cast(ty));
        }
        let exact = self.exact_integer().ok_or_else(|| {
            ScalarError::domain(format!("{self} is not an integral value for {ty}"))
        })?;
        let (min, max) = integer_bounds(ty);
        if exact < min || exact > max {
            return Err(ScalarError::domain(format!(
                "{self} is outside the range of {ty} [{min}, {max}]"
            )));
        }
        Ok(self.cast(ty))
    }

    pub fn is_truthy(self) -> bool {
        match self {
            Literal::Bool(value) => value,
            Literal::Signed(value) => value != 0,
            Literal::Unsigned(value) => value != 0,
            Literal::Float(value) => value != 0.0,
            Literal::Complex { re, im } => re != 0.0 || im != 0.0,
        }
    }

    /// Real part as `f64`.
    pub fn real(self) -> f64 {
        match self {
            Literal::Bool(value) => f64::from(u8::from(value)),
            Literal::Signed(value) => value as f64,
            Literal::Unsigned(value) => value as f64,
            Literal::Float(value) => value,
            Literal::Complex { re, .. } => re,
        }
    }

    pub fn to_complex(self) -> Complex64 {
        match self {
            Literal::Complex { re, im } => Complex64::new(re, im),
            other => Complex64::new(other.real(), 0.0),
        }
    }

    pub fn as_f64(self) -> Option<f64> {
        match self {
            Literal::Complex { .. } => None,
            other => Some(other.real()),
        }
    }

    /// Exact integer payload for bool and integer literals.
    pub(crate) fn as_i128(self) -> Option<i128> {
        match self {
            Literal::Bool(value) => Some(i128::from(value)),
            Literal::Signed(value) => Some(i128::from(value)),
            Literal::Unsigned(value) => Some(i128::from(value)),
            _ => None,
        }
    }

    fn exact_integer(self) -> Option<i128> {
        if let Some(value) = self.as_i128() {
            return Some(value);
        }
        let real = self.real();
        if real.is_finite() && real.fract() == 0.0 {
            Some(real as i128)
        } else {
            None
        }
    }

    fn truncated(self) -> i128 {
        match self.as_i128() {
            Some(value) => value,
            None => {
                let real = self.real();
                if real.is_nan() {
                    0
                } else {
                    real.trunc() as i128
                }
            }
        }
    }

    /// Renders the literal as C source for a value of type `ty`.
    pub fn render_c(self, ty: ScalarType) -> String {
        let single = matches!(
            ty,
            ScalarType::Float16 | ScalarType::Float32 | ScalarType::Complex64
        );
        match self.cast(ty) {
            Literal::Bool(value) => if value { "1" } else { "0" }.to_string(),
            Literal::Signed(i64::MIN) => "(-9223372036854775807LL - 1)".to_string(),
            Literal::Signed(value) => {
                if i32::try_from(value).is_ok() {
                    value.to_string()
                } else {
                    format!("{value}LL")
                }
            }
            Literal::Unsigned(value) => {
                if value > u64::from(u32::MAX) {
                    format!("{value}ULL")
                } else {
                    format!("{value}u")
                }
            }
            Literal::Float(value) => format_c_float(value, single),
            Literal::Complex { re, im } => format!(
                "({} + {} * I)",
                format_c_float(re, single),
                format_c_float(im, single)
            ),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Signed(value) => write!(f, "{value}"),
            Literal::Unsigned(value) => write!(f, "{value}"),
            Literal::Float(value) => write!(f, "{value:?}"),
            Literal::Complex { re, im } => {
                let sign = if im.is_sign_negative() { "-" } else { "+" };
                write!(f, "({re:?}{sign}{:?}j)", im.abs())
            }
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Signed(i64::from(value))
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Signed(value)
    }
}

impl From<u64> for Literal {
    fn from(value: u64) -> Self {
        Literal::Unsigned(value)
    }
}

impl From<f32> for Literal {
    fn from(value: f32) -> Self {
        Literal::Float(f64::from(value))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<Complex64> for Literal {
    fn from(value: Complex64) -> Self {
        Literal::Complex {
            re: value.re,
            im: value.im,
        }
    }
}

fn smallest_signed(value: i128) -> ScalarType {
    [
        ScalarType::Int8,
        ScalarType::Int16,
        ScalarType::Int32,
        ScalarType::Int64,
    ]
    .into_iter()
    .find(|ty| {
        let (min, max) = integer_bounds(*ty);
        value >= min && value <= max
    })
    .unwrap_or(ScalarType::UInt64)
}

fn integer_bounds(ty: ScalarType) -> (i128, i128) {
    match ty {
        ScalarType::Bool => (0, 1),
        ScalarType::Int8 => (i128::from(i8::MIN), i128::from(i8::MAX)),
        ScalarType::Int16 => (i128::from(i16::MIN), i128::from(i16::MAX)),
        ScalarType::Int32 => (i128::from(i32::MIN), i128::from(i32::MAX)),
        ScalarType::Int64 => (i128::from(i64::MIN), i128::from(i64::MAX)),
        ScalarType::UInt8 => (0, i128::from(u8::MAX)),
        ScalarType::UInt16 => (0, i128::from(u16::MAX)),
        ScalarType::UInt32 => (0, i128::from(u32::MAX)),
        ScalarType::UInt64 => (0, i128::from(u64::MAX)),
        _ => (i128::MIN, i128::MAX),
    }
}

fn wrap_signed(value: i128, bits: usize) -> i64 {
    match bits {
        8 => i64::from(value as i8),
        16 => i64::from(value as i16),
        32 => i64::from(value as i32),
        _ => value as i64,
    }
}

fn wrap_unsigned(value: i128, bits: usize) -> u64 {
    match bits {
        8 => u64::from(value as u8),
        16 => u64::from(value as u16),
        32 => u64::from(value as u32),
        _ => value as u64,
    }
}

pub(crate) fn format_c_float(value: f64, single: bool) -> String {
    if value.is_nan() {
        "NAN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_negative() {
            "-INFINITY".to_string()
        } else {
            "INFINITY".to_string()
        }
    } else {
        let base = format!("{value:?}");
        if single {
            format!("{base}f")
        } else {
            base
        }
    }
}
