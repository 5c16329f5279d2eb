use std::f64::consts::{LN_10, LN_2, PI};

use crate::error::{ScalarError, ScalarResult};
use crate::ops::{BitwiseOp, ScalarOp, UnaryMathOp};
use crate::scalar::{format_c_float, upcast, ScalarType};

/// A C expression together with the scalar type it evaluates to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CValue {
    pub expr: String,
    pub ty: ScalarType,
}

impl CValue {
    pub fn new(expr: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            expr: expr.into(),
            ty,
        }
    }
}

/// C spelling of a scalar type. `float16` has none; narrow first.
pub fn c_type(ty: ScalarType) -> ScalarResult<&'static str> {
    match ty {
        ScalarType::Bool => Ok("uint8_t"),
        ScalarType::Int8 => Ok("int8_t"),
        ScalarType::Int16 => Ok("int16_t"),
        ScalarType::Int32 => Ok("int32_t"),
        ScalarType::Int64 => Ok("int64_t"),
        ScalarType::UInt8 => Ok("uint8_t"),
        ScalarType::UInt16 => Ok("uint16_t"),
        ScalarType::UInt32 => Ok("uint32_t"),
        ScalarType::UInt64 => Ok("uint64_t"),
        ScalarType::Float32 => Ok("float"),
        ScalarType::Float64 => Ok("double"),
        ScalarType::Complex64 => Ok("float _Complex"),
        ScalarType::Complex128 => Ok("double _Complex"),
        ScalarType::Float16 => Err(ScalarError::type_error(
            "float16 has no C representation; narrow the composite to float32 first",
        )),
    }
}

impl ScalarOp {
    /// Emits the C statements computing `outputs` from `inputs`.
    ///
    /// `unique_id` namespaces any block-local temporaries the fragment needs.
    pub fn c_code(
        &self,
        inputs: &[CValue],
        outputs: &[CValue],
        unique_id: &str,
    ) -> ScalarResult<String> {
        self.check_arity(inputs.len())?;
        if let ScalarOp::Composite(composite) = self {
            let input_exprs: Vec<&str> = inputs.iter().map(|value| value.expr.as_str()).collect();
            let output_exprs: Vec<&str> =
                outputs.iter().map(|value| value.expr.as_str()).collect();
            return crate::codegen::emit_block(composite, &input_exprs, &output_exprs, unique_id);
        }
        let out = outputs.first().ok_or_else(|| {
            ScalarError::type_error(format!("{} has no output to assign", self.name()))
        })?;
        let ty = out.ty;
        let o = out.expr.as_str();
        let ct = c_type(ty)?;
        let args = || -> ScalarResult<Vec<String>> {
            inputs.iter().map(|value| operand(value, ty)).collect()
        };

        let code = match self {
            ScalarOp::Add => {
                let sep = if ty.is_bool() { " || " } else { " + " };
                format!("{o} = {};", args()?.join(sep))
            }
            ScalarOp::Mul => {
                let sep = if ty.is_bool() { " && " } else { " * " };
                format!("{o} = {};", args()?.join(sep))
            }
            ScalarOp::Sub => format!("{o} = {};", args()?.join(" - ")),
            ScalarOp::TrueDiv => format!("{o} = {};", args()?.join(" / ")),
            ScalarOp::Neg => format!("{o} = -{};", args()?[0]),
            ScalarOp::Identity => format!("{o} = {};", args()?[0]),
            ScalarOp::Reciprocal => {
                format!("{o} = {} / {};", one(ty), args()?[0])
            }
            ScalarOp::IntDiv => {
                let args = args()?;
                let (a, b) = (&args[0], &args[1]);
                if ty.is_complex() {
                    return Err(ScalarError::complex("int_div"));
                }
                if !ty.is_discrete() {
                    format!("{o} = {}({a} / {b});", math_fn("floor", ty)?)
                } else if ty.is_signed_integer() {
                    format!(
                        "{{\n    {ct} V{unique_id}_a = {a};\n    {ct} V{unique_id}_b = {b};\n    {o} = (V{unique_id}_b == 0) ? 0 : (V{unique_id}_a / V{unique_id}_b - ((V{unique_id}_a % V{unique_id}_b != 0) && ((V{unique_id}_a % V{unique_id}_b < 0) != (V{unique_id}_b < 0))));\n}}"
                    )
                } else {
                    format!("{o} = ({b} == 0) ? 0 : {a} / {b};")
                }
            }
            ScalarOp::Mod => {
                let args = args()?;
                let (a, b) = (&args[0], &args[1]);
                if ty.is_complex() {
                    return Err(ScalarError::complex("mod"));
                }
                if !ty.is_discrete() {
                    format!(
                        "{{\n    {ct} V{unique_id}_r = {}({a}, {b});\n    {o} = (V{unique_id}_r != 0 && ((V{unique_id}_r < 0) != ({b} < 0))) ? V{unique_id}_r + {b} : V{unique_id}_r;\n}}",
                        math_fn("fmod", ty)?
                    )
                } else if ty.is_signed_integer() {
                    format!(
                        "{{\n    {ct} V{unique_id}_b = {b};\n    {ct} V{unique_id}_r = (V{unique_id}_b == 0) ? 0 : {a} % V{unique_id}_b;\n    {o} = (V{unique_id}_r != 0 && ((V{unique_id}_r < 0) != (V{unique_id}_b < 0))) ? V{unique_id}_r + V{unique_id}_b : V{unique_id}_r;\n}}"
                    )
                } else {
                    format!("{o} = ({b} == 0) ? 0 : {a} % {b};")
                }
            }
            ScalarOp::Pow => {
                let args = args()?;
                let (a, b) = (&args[0], &args[1]);
                if ty.is_discrete() {
                    let base = format!("V{unique_id}_base");
                    let exp = format!("V{unique_id}_exp");
                    let acc = format!("V{unique_id}_acc");
                    let mut lines = vec!["{".to_string(), format!("    {ct} {base} = {a};")];
                    if ty.is_unsigned_integer() {
                        lines.push(format!("    uint64_t {exp} = (uint64_t){b};"));
                        lines.push(format!("    {ct} {acc} = 1;"));
                    } else {
                        // Negative exponents truncate 1 / base^n toward zero.
                        lines.push(format!("    int64_t {exp} = (int64_t){b};"));
                        lines.push(format!("    {ct} {acc} = 1;"));
                        lines.push(format!("    if ({exp} < 0) {{"));
                        lines.push(format!(
                            "        {acc} = ({base} == 1) ? 1 : ({base} == -1) ? (({exp} & 1) ? -1 : 1) : 0;"
                        ));
                        lines.push("    }".to_string());
                    }
                    lines.push(format!("    while ({exp} > 0) {{"));
                    lines.push(format!("        if ({exp} & 1) {acc} *= {base};"));
                    lines.push(format!("        {base} *= {base};"));
                    lines.push(format!("        {exp} >>= 1;"));
                    lines.push("    }".to_string());
                    lines.push(format!("    {o} = {acc};"));
                    lines.push("}".to_string());
                    lines.join("\n")
                } else {
                    format!("{o} = {}({a}, {b});", math_fn("pow", ty)?)
                }
            }
            ScalarOp::Compare(op) => {
                let domain = upcast(&types_of(inputs)).unwrap_or(ty);
                let a = operand(&inputs[0], domain)?;
                let b = operand(&inputs[1], domain)?;
                format!("{o} = ({a} {} {b});", op.symbol())
            }
            ScalarOp::Bitwise(op) => {
                if ty.is_complex() {
                    return Err(ScalarError::complex(op.name()));
                }
                let args = args()?;
                match op {
                    BitwiseOp::Invert if ty.is_bool() => format!("{o} = !{};", args[0]),
                    BitwiseOp::Invert => format!("{o} = ~{};", args[0]),
                    _ => format!("{o} = {};", args.join(&format!(" {} ", op.symbol()))),
                }
            }
            ScalarOp::Unary(op) => {
                let x = args()?.remove(0);
                format!("{o} = {};", unary_expr(*op, ty, &x)?)
            }
            ScalarOp::ArcTan2 => {
                let args = args()?;
                format!(
                    "{o} = {}({}, {});",
                    math_fn("atan2", ty)?,
                    args[0],
                    args[1]
                )
            }
            ScalarOp::Cast(_) => format!("{o} = {};", operand(&inputs[0], ty)?),
            ScalarOp::Switch => {
                let a = operand(&inputs[1], ty)?;
                let b = operand(&inputs[2], ty)?;
                format!("{o} = {} ? {a} : {b};", inputs[0].expr)
            }
            ScalarOp::Mean => {
                if inputs.is_empty() {
                    format!("{o} = 0;")
                } else {
                    let count = format_c_float(inputs.len() as f64, is_single(ty));
                    format!("{o} = ({}) / {count};", args()?.join(" + "))
                }
            }
            ScalarOp::InRange {
                include_lower,
                include_upper,
            } => {
                let domain = upcast(&types_of(inputs)).unwrap_or(ty);
                let x = operand(&inputs[0], domain)?;
                let low = operand(&inputs[1], domain)?;
                let high = operand(&inputs[2], domain)?;
                let lower = if *include_lower { ">=" } else { ">" };
                let upper = if *include_upper { "<=" } else { "<" };
                format!("{o} = ({x} {lower} {low} && {x} {upper} {high});")
            }
            ScalarOp::Composite(_) => {
                return Err(ScalarError::type_error("composite calls are emitted as blocks"))
            }
        };
        Ok(code)
    }
}

fn types_of(values: &[CValue]) -> Vec<ScalarType> {
    values.iter().map(|value| value.ty).collect()
}

fn is_single(ty: ScalarType) -> bool {
    matches!(ty, ScalarType::Float32 | ScalarType::Complex64)
}

fn one(ty: ScalarType) -> String {
    format_c_float(1.0, is_single(ty))
}

/// Converts `value` to the C representation of `ty` when the types differ.
fn operand(value: &CValue, ty: ScalarType) -> ScalarResult<String> {
    if value.ty == ty {
        return Ok(value.expr.clone());
    }
    let ct = c_type(ty)?;
    if ty.is_bool() {
        return Ok(format!("(({ct})({} != 0))", value.expr));
    }
    if value.ty.is_complex() && !ty.is_complex() {
        let real = if value.ty == ScalarType::Complex64 {
            "crealf"
        } else {
            "creal"
        };
        return Ok(format!("(({ct}){real}({}))", value.expr));
    }
    Ok(format!("(({ct}){})", value.expr))
}

/// Name of the libm / complex.h function `base` for values of type `ty`.
fn math_fn(base: &str, ty: ScalarType) -> ScalarResult<String> {
    match ty {
        ScalarType::Float32 => Ok(format!("{base}f")),
        ScalarType::Float64 => Ok(base.to_string()),
        ScalarType::Complex64 => Ok(format!("c{base}f")),
        ScalarType::Complex128 => Ok(format!("c{base}")),
        other => Err(ScalarError::type_error(format!(
            "{base} has no C implementation for {other}"
        ))),
    }
}

fn unary_expr(op: UnaryMathOp, ty: ScalarType, x: &str) -> ScalarResult<String> {
    let single = is_single(ty);
    let call = |base: &str| -> ScalarResult<String> { Ok(format!("{}({x})", math_fn(base, ty)?)) };
    let expr = match op {
        UnaryMathOp::Sqrt => call("sqrt")?,
        UnaryMathOp::Log => call("log")?,
        UnaryMathOp::Exp => call("exp")?,
        UnaryMathOp::Sin => call("sin")?,
        UnaryMathOp::Cos => call("cos")?,
        UnaryMathOp::Tan => call("tan")?,
        UnaryMathOp::ArcSin => call("asin")?,
        UnaryMathOp::ArcCos => call("acos")?,
        UnaryMathOp::ArcTan => call("atan")?,
        UnaryMathOp::Sinh => call("sinh")?,
        UnaryMathOp::Cosh => call("cosh")?,
        UnaryMathOp::Tanh => call("tanh")?,
        UnaryMathOp::ArcSinh => call("asinh")?,
        UnaryMathOp::ArcCosh => call("acosh")?,
        UnaryMathOp::ArcTanh => call("atanh")?,
        UnaryMathOp::Deg2Rad => format!("{x} * {}", format_c_float(PI / 180.0, single)),
        UnaryMathOp::Rad2Deg => format!("{x} * {}", format_c_float(180.0 / PI, single)),
        UnaryMathOp::Log2 if !ty.is_complex() => call("log2")?,
        UnaryMathOp::Log10 if !ty.is_complex() => call("log10")?,
        UnaryMathOp::Log1p if !ty.is_complex() => call("log1p")?,
        UnaryMathOp::Exp2 if !ty.is_complex() => call("exp2")?,
        UnaryMathOp::Expm1 if !ty.is_complex() => call("expm1")?,
        UnaryMathOp::Log2 => format!("{} / {}", call("log")?, format_c_float(LN_2, single)),
        UnaryMathOp::Log10 => format!("{} / {}", call("log")?, format_c_float(LN_10, single)),
        UnaryMathOp::Log1p => format!("{}({} + {x})", math_fn("log", ty)?, one(ty)),
        UnaryMathOp::Exp2 => format!(
            "{}({x} * {})",
            math_fn("exp", ty)?,
            format_c_float(LN_2, single)
        ),
        UnaryMathOp::Expm1 => format!("{} - {}", call("exp")?, one(ty)),
    };
    Ok(expr)
}
