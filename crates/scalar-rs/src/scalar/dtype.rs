use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScalarError;

/// Enumerates the scalar element types a value can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScalarType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl ScalarType {
    pub const ALL: [ScalarType; 14] = [
        ScalarType::Bool,
        ScalarType::Int8,
        ScalarType::Int16,
        ScalarType::Int32,
        ScalarType::Int64,
        ScalarType::UInt8,
        ScalarType::UInt16,
        ScalarType::UInt32,
        ScalarType::UInt64,
        ScalarType::Float16,
        ScalarType::Float32,
        ScalarType::Float64,
        ScalarType::Complex64,
        ScalarType::Complex128,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int8 => "int8",
            ScalarType::Int16 => "int16",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::UInt8 => "uint8",
            ScalarType::UInt16 => "uint16",
            ScalarType::UInt32 => "uint32",
            ScalarType::UInt64 => "uint64",
            ScalarType::Float16 => "float16",
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
            ScalarType::Complex64 => "complex64",
            ScalarType::Complex128 => "complex128",
        }
    }

    pub fn is_bool(self) -> bool {
        self == ScalarType::Bool
    }

    /// Returns `true` for signed and unsigned integers (not `bool`).
    pub fn is_integer(self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    pub fn is_signed_integer(self) -> bool {
        matches!(
            self,
            ScalarType::Int8 | ScalarType::Int16 | ScalarType::Int32 | ScalarType::Int64
        )
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            ScalarType::UInt8 | ScalarType::UInt16 | ScalarType::UInt32 | ScalarType::UInt64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(
            self,
            ScalarType::Float16 | ScalarType::Float32 | ScalarType::Float64
        )
    }

    pub fn is_complex(self) -> bool {
        matches!(self, ScalarType::Complex64 | ScalarType::Complex128)
    }

    /// Returns `true` for `bool` and integer types, whose gradients are always zero.
    pub fn is_discrete(self) -> bool {
        self.is_bool() || self.is_integer()
    }

    pub fn bitwidth(self) -> usize {
        match self {
            ScalarType::Bool => 1,
            ScalarType::Int8 | ScalarType::UInt8 => 8,
            ScalarType::Int16 | ScalarType::UInt16 | ScalarType::Float16 => 16,
            ScalarType::Int32 | ScalarType::UInt32 | ScalarType::Float32 => 32,
            ScalarType::Int64 | ScalarType::UInt64 | ScalarType::Float64 => 64,
            ScalarType::Complex64 => 64,
            ScalarType::Complex128 => 128,
        }
    }

    fn signed_of_width(bits: usize) -> Option<ScalarType> {
        match bits {
            8 => Some(ScalarType::Int8),
            16 => Some(ScalarType::Int16),
            32 => Some(ScalarType::Int32),
            64 => Some(ScalarType::Int64),
            _ => None,
        }
    }

    /// Smallest floating type an integer widens into when mixed with floats.
    fn float_for_integer(self) -> ScalarType {
        if self.bitwidth() <= 16 {
            ScalarType::Float32
        } else {
            ScalarType::Float64
        }
    }

    /// Real floating precision carried by a non-bool numeric type.
    fn float_precision(self) -> ScalarType {
        match self {
            ScalarType::Complex64 => ScalarType::Float32,
            ScalarType::Complex128 => ScalarType::Float64,
            t if t.is_float() => t,
            t => t.float_for_integer(),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalarType {
    type Err = ScalarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ScalarType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == normalized)
            .ok_or_else(|| ScalarError::type_error(format!("unknown scalar type '{s}'")))
    }
}

/// Joins two scalar types into the type both can be computed in.
///
/// Commutative; integer/float mixes never produce float16.
pub fn promote(a: ScalarType, b: ScalarType) -> ScalarType {
    if a == b {
        return a;
    }
    if a.is_bool() {
        return b;
    }
    if b.is_bool() {
        return a;
    }
    if a.is_complex() || b.is_complex() {
        let precision = a.float_precision().max(b.float_precision());
        return if precision == ScalarType::Float64 {
            ScalarType::Complex128
        } else {
            ScalarType::Complex64
        };
    }
    match (a.is_float(), b.is_float()) {
        (true, true) => a.max(b),
        (true, false) => a.max(b.float_for_integer()),
        (false, true) => b.max(a.float_for_integer()),
        (false, false) => promote_integers(a, b),
    }
}

fn promote_integers(a: ScalarType, b: ScalarType) -> ScalarType {
    if a.is_signed_integer() == b.is_signed_integer() {
        return if a.bitwidth() >= b.bitwidth() { a } else { b };
    }
    let (signed, unsigned) = if a.is_signed_integer() { (a, b) } else { (b, a) };
    if signed.bitwidth() > unsigned.bitwidth() {
        return signed;
    }
    ScalarType::signed_of_width(unsigned.bitwidth() * 2).unwrap_or(ScalarType::Float64)
}

/// Folds [`promote`] over `types`; `None` when the list is empty.
pub fn upcast(types: &[ScalarType]) -> Option<ScalarType> {
    let (first, rest) = types.split_first()?;
    Some(rest.iter().fold(*first, |acc, ty| promote(acc, *ty)))
}

/// Output type of transcendental functions: discrete inputs become float32 or
/// float64 (never float16), floating and complex inputs are kept.
pub fn upgrade_to_float(ty: ScalarType) -> ScalarType {
    if ty.is_discrete() {
        ty.float_for_integer()
    } else {
        ty
    }
}
