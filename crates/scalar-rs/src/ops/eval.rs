use std::cmp::Ordering;
use std::f64::consts::{LN_10, LN_2, PI};

use num_complex::Complex64;

use crate::error::{ScalarError, ScalarResult};
use crate::ops::{BitwiseOp, CompareOp, ScalarOp, UnaryMathOp};
use crate::scalar::{upcast, Literal, ScalarType};

/// Operand lifted into the arithmetic domain of a scalar type.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i128),
    Float(f64),
    Complex(Complex64),
}

impl Num {
    fn lift(value: Literal, ty: ScalarType) -> Num {
        if ty.is_complex() {
            Num::Complex(value.to_complex())
        } else if ty.is_float() {
            Num::Float(value.real())
        } else {
            Num::Int(value.cast(ty).as_i128().unwrap_or(0))
        }
    }

    fn into_literal(self) -> Literal {
        match self {
            Num::Int(value) => match i64::try_from(value) {
                Ok(value) => Literal::Signed(value),
                Err(_) => Literal::Unsigned(value as u64),
            },
            Num::Float(value) => Literal::Float(value),
            Num::Complex(value) => Literal::from(value),
        }
    }
}

impl ScalarOp {
    /// Evaluates the operation on concrete inputs.
    ///
    /// Every output is normalized to its declared type, so float16/float32
    /// rounding and integer wrap-around match the generated code.
    pub fn evaluate(
        &self,
        inputs: &[Literal],
        input_types: &[ScalarType],
        output_types: &[ScalarType],
    ) -> ScalarResult<Vec<Literal>> {
        self.check_arity(inputs.len())?;
        if let ScalarOp::Composite(composite) = self {
            return composite.evaluate(inputs);
        }
        let out_ty = output_types.first().copied().ok_or_else(|| {
            ScalarError::type_error(format!("{} has no declared output type", self.name()))
        })?;
        let value = self.evaluate_single(inputs, input_types, out_ty)?;
        Ok(vec![value.cast(out_ty)])
    }

    fn evaluate_single(
        &self,
        inputs: &[Literal],
        input_types: &[ScalarType],
        ty: ScalarType,
    ) -> ScalarResult<Literal> {
        let lifted = || inputs.iter().map(|value| Num::lift(*value, ty));
        let value = match self {
            ScalarOp::Add => fold(lifted(), |a, b| a + b, |a, b| a + b, |a, b| a + b),
            ScalarOp::Mul => fold(lifted(), |a, b| a * b, |a, b| a * b, |a, b| a * b),
            ScalarOp::Sub => fold(lifted(), |a, b| a - b, |a, b| a - b, |a, b| a - b),
            ScalarOp::Neg => match Num::lift(inputs[0], ty) {
                Num::Int(a) => Num::Int(-a),
                Num::Float(a) => Num::Float(-a),
                Num::Complex(a) => Num::Complex(-a),
            },
            ScalarOp::TrueDiv => match (Num::lift(inputs[0], ty), Num::lift(inputs[1], ty)) {
                (Num::Complex(a), Num::Complex(b)) => Num::Complex(a / b),
                _ => Num::Float(inputs[0].real() / inputs[1].real()),
            },
            ScalarOp::IntDiv => match (Num::lift(inputs[0], ty), Num::lift(inputs[1], ty)) {
                (Num::Int(a), Num::Int(b)) => Num::Int(floor_div(a, b)),
                (Num::Float(a), Num::Float(b)) => Num::Float((a / b).floor()),
                _ => return Err(ScalarError::complex("int_div")),
            },
            ScalarOp::Mod => match (Num::lift(inputs[0], ty), Num::lift(inputs[1], ty)) {
                (Num::Int(a), Num::Int(b)) => Num::Int(floor_mod(a, b)),
                (Num::Float(a), Num::Float(b)) => Num::Float(float_mod(a, b)),
                _ => return Err(ScalarError::complex("mod")),
            },
            ScalarOp::Pow => match (Num::lift(inputs[0], ty), Num::lift(inputs[1], ty)) {
                (Num::Int(a), Num::Int(b)) => Num::Int(int_pow(a, b)),
                (Num::Float(a), Num::Float(b)) => Num::Float(a.powf(b)),
                (Num::Complex(a), Num::Complex(b)) => Num::Complex(a.powc(b)),
                _ => return Err(ScalarError::type_error("pow operands disagree on domain")),
            },
            ScalarOp::Reciprocal => match Num::lift(inputs[0], ty) {
                Num::Complex(a) => Num::Complex(a.inv()),
                _ => Num::Float(1.0 / inputs[0].real()),
            },
            ScalarOp::Identity | ScalarOp::Cast(_) => return Ok(inputs[0]),
            ScalarOp::Compare(op) => {
                let domain = domain_of(input_types);
                let ordering = compare(inputs[0], inputs[1], domain);
                return Ok(Literal::Bool(compare_holds(*op, ordering)));
            }
            ScalarOp::Bitwise(op) => return bitwise(*op, inputs, ty),
            ScalarOp::Unary(op) => match Num::lift(inputs[0], ty) {
                Num::Complex(a) => Num::Complex(unary_complex(*op, a)),
                _ => Num::Float(unary_real(*op, inputs[0].real())),
            },
            ScalarOp::ArcTan2 => Num::Float(inputs[0].real().atan2(inputs[1].real())),
            ScalarOp::Switch => {
                return Ok(if inputs[0].is_truthy() {
                    inputs[1]
                } else {
                    inputs[2]
                })
            }
            ScalarOp::Mean => {
                if inputs.is_empty() {
                    return Ok(Literal::Float(0.0));
                }
                let count = inputs.len() as f64;
                if ty.is_complex() {
                    let sum: Complex64 = inputs.iter().map(|value| value.to_complex()).sum();
                    Num::Complex(sum / count)
                } else {
                    let sum: f64 = inputs.iter().map(|value| value.real()).sum();
                    Num::Float(sum / count)
                }
            }
            ScalarOp::InRange {
                include_lower,
                include_upper,
            } => {
                let domain = domain_of(input_types);
                let lower = compare(inputs[0], inputs[1], domain);
                let upper = compare(inputs[0], inputs[2], domain);
                let above = if *include_lower {
                    compare_holds(CompareOp::Ge, lower)
                } else {
                    compare_holds(CompareOp::Gt, lower)
                };
                let below = if *include_upper {
                    compare_holds(CompareOp::Le, upper)
                } else {
                    compare_holds(CompareOp::Lt, upper)
                };
                return Ok(Literal::Bool(above && below));
            }
            ScalarOp::Composite(_) => {
                return Err(ScalarError::type_error(
                    "composite evaluation yields several outputs",
                ))
            }
        };
        Ok(value.into_literal())
    }
}

fn domain_of(input_types: &[ScalarType]) -> ScalarType {
    upcast(input_types).unwrap_or(ScalarType::Float64)
}

fn fold(
    mut values: impl Iterator<Item = Num>,
    int: impl Fn(i128, i128) -> i128,
    float: impl Fn(f64, f64) -> f64,
    complex: impl Fn(Complex64, Complex64) -> Complex64,
) -> Num {
    let Some(first) = values.next() else {
        return Num::Int(0);
    };
    values.fold(first, |acc, value| match (acc, value) {
        (Num::Int(a), Num::Int(b)) => Num::Int(wrap_i128(int(a, b))),
        (Num::Complex(a), Num::Complex(b)) => Num::Complex(complex(a, b)),
        (a, b) => Num::Float(float(real_of(a), real_of(b))),
    })
}

fn real_of(value: Num) -> f64 {
    match value {
        Num::Int(value) => value as f64,
        Num::Float(value) => value,
        Num::Complex(value) => value.re,
    }
}

/// Keeps intermediate integer results within 64 bits so variadic folds
/// cannot overflow `i128`.
fn wrap_i128(value: i128) -> i128 {
    i128::from(value as i64)
}

fn floor_div(a: i128, b: i128) -> i128 {
    if b == 0 {
        return 0;
    }
    let quotient = a / b;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        quotient - 1
    } else {
        quotient
    }
}

fn floor_mod(a: i128, b: i128) -> i128 {
    if b == 0 {
        return 0;
    }
    let rem = a % b;
    if rem != 0 && ((rem < 0) != (b < 0)) {
        rem + b
    } else {
        rem
    }
}

fn float_mod(a: f64, b: f64) -> f64 {
    let rem = a % b;
    if rem != 0.0 && ((rem < 0.0) != (b < 0.0)) {
        rem + b
    } else {
        rem
    }
}

/// Integer power with wrap-around. Negative exponents truncate `1 / base^n`
/// toward zero: `1` and `-1` keep their magnitude, every other base gives 0.
fn int_pow(base: i128, exponent: i128) -> i128 {
    if exponent < 0 {
        return match base {
            1 => 1,
            -1 => {
                if exponent % 2 == 0 {
                    1
                } else {
                    -1
                }
            }
            _ => 0,
        };
    }
    let mut result: i128 = 1;
    let mut base = base;
    let mut exponent = exponent;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = wrap_i128(result.wrapping_mul(base));
        }
        base = wrap_i128(base.wrapping_mul(base));
        exponent >>= 1;
    }
    result
}

fn compare(a: Literal, b: Literal, domain: ScalarType) -> Option<Ordering> {
    match (Num::lift(a, domain), Num::lift(b, domain)) {
        (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
        (Num::Complex(a), Num::Complex(b)) => (a == b).then_some(Ordering::Equal),
        (a, b) => real_of(a).partial_cmp(&real_of(b)),
    }
}

fn compare_holds(op: CompareOp, ordering: Option<Ordering>) -> bool {
    match op {
        CompareOp::Gt => ordering == Some(Ordering::Greater),
        CompareOp::Lt => ordering == Some(Ordering::Less),
        CompareOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        CompareOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Eq => ordering == Some(Ordering::Equal),
        CompareOp::Neq => ordering != Some(Ordering::Equal),
    }
}

fn bitwise(op: BitwiseOp, inputs: &[Literal], ty: ScalarType) -> ScalarResult<Literal> {
    if ty.is_complex() {
        return Err(ScalarError::complex(op.name()));
    }
    if ty.is_bool() {
        let mut values = inputs.iter().map(|value| value.is_truthy());
        let value = match op {
            BitwiseOp::Invert => !values.next().unwrap_or(false),
            BitwiseOp::And => values.all(|value| value),
            BitwiseOp::Or => values.any(|value| value),
            BitwiseOp::Xor => values.fold(false, |acc, value| acc ^ value),
        };
        return Ok(Literal::Bool(value));
    }
    let mut values = inputs
        .iter()
        .map(|value| value.cast(ty).as_i128().unwrap_or(0));
    let value = match op {
        BitwiseOp::Invert => !values.next().unwrap_or(0),
        BitwiseOp::And => values.fold(-1, |acc, value| acc & value),
        BitwiseOp::Or => values.fold(0, |acc, value| acc | value),
        BitwiseOp::Xor => values.fold(0, |acc, value| acc ^ value),
    };
    Ok(Num::Int(value).into_literal())
}

fn unary_real(op: UnaryMathOp, x: f64) -> f64 {
    match op {
        UnaryMathOp::Sqrt => x.sqrt(),
        UnaryMathOp::Log => x.ln(),
        UnaryMathOp::Log2 => x.log2(),
        UnaryMathOp::Log10 => x.log10(),
        UnaryMathOp::Log1p => x.ln_1p(),
        UnaryMathOp::Exp => x.exp(),
        UnaryMathOp::Exp2 => x.exp2(),
        UnaryMathOp::Expm1 => x.exp_m1(),
        UnaryMathOp::Sin => x.sin(),
        UnaryMathOp::Cos => x.cos(),
        UnaryMathOp::Tan => x.tan(),
        UnaryMathOp::ArcSin => x.asin(),
        UnaryMathOp::ArcCos => x.acos(),
        UnaryMathOp::ArcTan => x.atan(),
        UnaryMathOp::Sinh => x.sinh(),
        UnaryMathOp::Cosh => x.cosh(),
        UnaryMathOp::Tanh => x.tanh(),
        UnaryMathOp::ArcSinh => x.asinh(),
        UnaryMathOp::ArcCosh => x.acosh(),
        UnaryMathOp::ArcTanh => x.atanh(),
        UnaryMathOp::Deg2Rad => x * (PI / 180.0),
        UnaryMathOp::Rad2Deg => x * (180.0 / PI),
    }
}

fn unary_complex(op: UnaryMathOp, z: Complex64) -> Complex64 {
    let one = Complex64::new(1.0, 0.0);
    match op {
        UnaryMathOp::Sqrt => z.sqrt(),
        UnaryMathOp::Log => z.ln(),
        UnaryMathOp::Log2 => z.ln() / LN_2,
        UnaryMathOp::Log10 => z.ln() / LN_10,
        UnaryMathOp::Log1p => (z + one).ln(),
        UnaryMathOp::Exp => z.exp(),
        UnaryMathOp::Exp2 => (z * LN_2).exp(),
        UnaryMathOp::Expm1 => z.exp() - one,
        UnaryMathOp::Sin => z.sin(),
        UnaryMathOp::Cos => z.cos(),
        UnaryMathOp::Tan => z.tan(),
        UnaryMathOp::ArcSin => z.asin(),
        UnaryMathOp::ArcCos => z.acos(),
        UnaryMathOp::ArcTan => z.atan(),
        UnaryMathOp::Sinh => z.sinh(),
        UnaryMathOp::Cosh => z.cosh(),
        UnaryMathOp::Tanh => z.tanh(),
        UnaryMathOp::ArcSinh => z.asinh(),
        UnaryMathOp::ArcCosh => z.acosh(),
        UnaryMathOp::ArcTanh => z.atanh(),
        UnaryMathOp::Deg2Rad => z * (PI / 180.0),
        UnaryMathOp::Rad2Deg => z * (180.0 / PI),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_division_rounds_toward_negative_infinity() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(floor_div(7, -2), -4);
        assert_eq!(floor_div(7, 0), 0);
    }

    #[test]
    fn modulo_takes_sign_of_divisor() {
        assert_eq!(floor_mod(-7, 3), 2);
        assert_eq!(floor_mod(7, -3), -2);
        assert_eq!(float_mod(-1.0, 3.0), 2.0);
    }

    #[test]
    fn integer_addition_wraps_at_declared_width() {
        let out = ScalarOp::Add
            .evaluate(
                &[Literal::Signed(100), Literal::Signed(100)],
                &[ScalarType::Int8, ScalarType::Int8],
                &[ScalarType::Int8],
            )
            .expect("evaluate");
        assert_eq!(out, vec![Literal::Signed(-56)]);
    }

    #[test]
    fn mod_of_complex_fails() {
        let err = ScalarOp::Mod
            .evaluate(
                &[Literal::Complex { re: 1.0, im: 1.0 }, Literal::Signed(2)],
                &[ScalarType::Complex64, ScalarType::Int32],
                &[ScalarType::Complex128],
            )
            .unwrap_err();
        assert_eq!(err, ScalarError::complex("mod"));
    }

    #[test]
    fn negative_integer_powers_truncate() {
        assert_eq!(int_pow(2, -1), 0);
        assert_eq!(int_pow(0, -2), 0);
        assert_eq!(int_pow(-1, -3), -1);
        assert_eq!(int_pow(-1, -4), 1);
        assert_eq!(int_pow(1, -7), 1);
        assert_eq!(int_pow(3, 4), 81);
    }
}
