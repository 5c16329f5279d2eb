//! Scalar operation variants.
//!
//! Every variant supplies four capabilities: output typing (this module),
//! interpreted evaluation ([`eval`]), C code generation ([`codegen`]) and
//! gradient construction ([`grad`]).

mod codegen;
mod eval;
pub(crate) mod grad;

pub use codegen::{c_type, CValue};

use crate::composite::Composite;
use crate::config::ScalarConfig;
use crate::error::{ScalarError, ScalarResult};
use crate::scalar::{upcast, upgrade_to_float, ScalarType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Gt,
    Lt,
    Le,
    Ge,
    Eq,
    Neq,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Neq => "!=",
        }
    }

    fn name(self) -> &'static str {
        match self {
            CompareOp::Gt => "gt",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
            CompareOp::Ge => "ge",
            CompareOp::Eq => "eq",
            CompareOp::Neq => "neq",
        }
    }

    /// Ordered comparisons are undefined for complex operands.
    pub fn is_ordered(self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Neq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitwiseOp {
    And,
    Or,
    Xor,
    Invert,
}

impl BitwiseOp {
    fn name(self) -> &'static str {
        match self {
            BitwiseOp::And => "and",
            BitwiseOp::Or => "or",
            BitwiseOp::Xor => "xor",
            BitwiseOp::Invert => "invert",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BitwiseOp::And => "&",
            BitwiseOp::Or => "|",
            BitwiseOp::Xor => "^",
            BitwiseOp::Invert => "~",
        }
    }
}

/// Single-argument transcendental functions. Discrete inputs are upgraded to
/// float32 or float64 before evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryMathOp {
    Sqrt,
    Log,
    Log2,
    Log10,
    Log1p,
    Exp,
    Exp2,
    Expm1,
    Sin,
    Cos,
    Tan,
    ArcSin,
    ArcCos,
    ArcTan,
    Sinh,
    Cosh,
    Tanh,
    ArcSinh,
    ArcCosh,
    ArcTanh,
    Deg2Rad,
    Rad2Deg,
}

impl UnaryMathOp {
    pub const ALL: [UnaryMathOp; 22] = [
        UnaryMathOp::Sqrt,
        UnaryMathOp::Log,
        UnaryMathOp::Log2,
        UnaryMathOp::Log10,
        UnaryMathOp::Log1p,
        UnaryMathOp::Exp,
        UnaryMathOp::Exp2,
        UnaryMathOp::Expm1,
        UnaryMathOp::Sin,
        UnaryMathOp::Cos,
        UnaryMathOp::Tan,
        UnaryMathOp::ArcSin,
        UnaryMathOp::ArcCos,
        UnaryMathOp::ArcTan,
        UnaryMathOp::Sinh,
        UnaryMathOp::Cosh,
        UnaryMathOp::Tanh,
        UnaryMathOp::ArcSinh,
        UnaryMathOp::ArcCosh,
        UnaryMathOp::ArcTanh,
        UnaryMathOp::Deg2Rad,
        UnaryMathOp::Rad2Deg,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UnaryMathOp::Sqrt => "sqrt",
            UnaryMathOp::Log => "log",
            UnaryMathOp::Log2 => "log2",
            UnaryMathOp::Log10 => "log10",
            UnaryMathOp::Log1p => "log1p",
            UnaryMathOp::Exp => "exp",
            UnaryMathOp::Exp2 => "exp2",
            UnaryMathOp::Expm1 => "expm1",
            UnaryMathOp::Sin => "sin",
            UnaryMathOp::Cos => "cos",
            UnaryMathOp::Tan => "tan",
            UnaryMathOp::ArcSin => "arcsin",
            UnaryMathOp::ArcCos => "arccos",
            UnaryMathOp::ArcTan => "arctan",
            UnaryMathOp::Sinh => "sinh",
            UnaryMathOp::Cosh => "cosh",
            UnaryMathOp::Tanh => "tanh",
            UnaryMathOp::ArcSinh => "arcsinh",
            UnaryMathOp::ArcCosh => "arccosh",
            UnaryMathOp::ArcTanh => "arctanh",
            UnaryMathOp::Deg2Rad => "deg2rad",
            UnaryMathOp::Rad2Deg => "rad2deg",
        }
    }
}

/// Closed set of scalar operations a graph node can apply.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarOp {
    /// Variadic sum (at least one input).
    Add,
    /// Variadic product (at least one input).
    Mul,
    Sub,
    TrueDiv,
    /// Floor division.
    IntDiv,
    /// Floor modulo; the result takes the sign of the divisor.
    Mod,
    Pow,
    Neg,
    Reciprocal,
    Identity,
    Compare(CompareOp),
    Bitwise(BitwiseOp),
    Unary(UnaryMathOp),
    ArcTan2,
    Cast(ScalarType),
    /// `switch(cond, a, b)` selects `a` when `cond` is truthy.
    Switch,
    /// Variadic arithmetic mean; zero inputs evaluate to `0`.
    Mean,
    /// `in_range(x, low, high)` with per-endpoint inclusivity.
    InRange {
        include_lower: bool,
        include_upper: bool,
    },
    Composite(Composite),
}

enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl ScalarOp {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarOp::Add => "add",
            ScalarOp::Mul => "mul",
            ScalarOp::Sub => "sub",
            ScalarOp::TrueDiv => "true_div",
            ScalarOp::IntDiv => "int_div",
            ScalarOp::Mod => "mod",
            ScalarOp::Pow => "pow",
            ScalarOp::Neg => "neg",
            ScalarOp::Reciprocal => "reciprocal",
            ScalarOp::Identity => "identity",
            ScalarOp::Compare(op) => op.name(),
            ScalarOp::Bitwise(op) => op.name(),
            ScalarOp::Unary(op) => op.name(),
            ScalarOp::ArcTan2 => "arctan2",
            ScalarOp::Cast(_) => "cast",
            ScalarOp::Switch => "switch",
            ScalarOp::Mean => "mean",
            ScalarOp::InRange { .. } => "in_range",
            ScalarOp::Composite(_) => "composite",
        }
    }

    fn arity(&self) -> Arity {
        match self {
            ScalarOp::Add | ScalarOp::Mul => Arity::AtLeast(1),
            ScalarOp::Bitwise(BitwiseOp::Invert) => Arity::Exact(1),
            ScalarOp::Bitwise(_) => Arity::AtLeast(2),
            ScalarOp::Mean => Arity::AtLeast(0),
            ScalarOp::Sub
            | ScalarOp::TrueDiv
            | ScalarOp::IntDiv
            | ScalarOp::Mod
            | ScalarOp::Pow
            | ScalarOp::ArcTan2
            | ScalarOp::Compare(_) => Arity::Exact(2),
            ScalarOp::Neg
            | ScalarOp::Reciprocal
            | ScalarOp::Identity
            | ScalarOp::Unary(_)
            | ScalarOp::Cast(_) => Arity::Exact(1),
            ScalarOp::Switch | ScalarOp::InRange { .. } => Arity::Exact(3),
            ScalarOp::Composite(composite) => Arity::Exact(composite.nin()),
        }
    }

    pub fn check_arity(&self, found: usize) -> ScalarResult<()> {
        let (ok, expected) = match self.arity() {
            Arity::Exact(n) => (found == n, n.to_string()),
            Arity::AtLeast(n) => (found >= n, format!("at least {n}")),
        };
        if ok {
            Ok(())
        } else {
            Err(ScalarError::Arity {
                op: self.name().to_string(),
                expected,
                found,
            })
        }
    }

    /// Number of outputs the operation produces.
    pub fn nout(&self) -> usize {
        match self {
            ScalarOp::Composite(composite) => composite.nout(),
            _ => 1,
        }
    }

    /// Resolves the output types for the given input types.
    pub fn output_types(
        &self,
        inputs: &[ScalarType],
        config: &ScalarConfig,
    ) -> ScalarResult<Vec<ScalarType>> {
        self.check_arity(inputs.len())?;
        let ty = match self {
            ScalarOp::Add | ScalarOp::Mul | ScalarOp::Identity => self.joined(inputs)?,
            ScalarOp::Sub | ScalarOp::Neg => {
                let joined = self.joined(inputs)?;
                if joined.is_bool() {
                    return Err(ScalarError::type_error(format!(
                        "{} is not defined for bool operands",
                        self.name()
                    )));
                }
                joined
            }
            ScalarOp::IntDiv | ScalarOp::Mod | ScalarOp::Pow => {
                let joined = self.joined(inputs)?;
                if joined.is_bool() {
                    ScalarType::Int8
                } else {
                    joined
                }
            }
            ScalarOp::TrueDiv => {
                if inputs.iter().all(|ty| ty.is_discrete()) {
                    config.float_x
                } else {
                    self.joined(inputs)?
                }
            }
            ScalarOp::Reciprocal | ScalarOp::Unary(_) => upgrade_to_float(self.joined(inputs)?),
            ScalarOp::ArcTan2 => {
                self.reject_complex(inputs)?;
                upgrade_to_float(self.joined(inputs)?)
            }
            ScalarOp::Compare(op) => {
                if op.is_ordered() {
                    self.reject_complex(inputs)?;
                }
                ScalarType::Bool
            }
            ScalarOp::InRange { .. } => {
                self.reject_complex(inputs)?;
                ScalarType::Bool
            }
            ScalarOp::Bitwise(_) => {
                if let Some(ty) = inputs.iter().find(|ty| ty.is_float()) {
                    return Err(ScalarError::type_error(format!(
                        "{} is not defined for {ty} operands",
                        self.name()
                    )));
                }
                self.joined(inputs)?
            }
            ScalarOp::Cast(target) => *target,
            ScalarOp::Switch => self.joined(&inputs[1..])?,
            ScalarOp::Mean => match upcast(inputs) {
                Some(joined) => upgrade_to_float(joined),
                None => config.float_x,
            },
            ScalarOp::Composite(composite) => return Ok(composite.output_types().to_vec()),
        };
        Ok(vec![ty])
    }

    fn joined(&self, inputs: &[ScalarType]) -> ScalarResult<ScalarType> {
        upcast(inputs).ok_or_else(|| {
            ScalarError::type_error(format!("{} needs at least one typed input", self.name()))
        })
    }

    fn reject_complex(&self, inputs: &[ScalarType]) -> ScalarResult<()> {
        match inputs.iter().find(|ty| ty.is_complex()) {
            Some(ty) => Err(ScalarError::type_error(format!(
                "{} is not defined for {ty} operands",
                self.name()
            ))),
            None => Ok(()),
        }
    }

    /// Renders the operation applied to already-rendered arguments using
    /// conventional infix/prefix notation.
    pub fn render(&self, args: &[String]) -> String {
        match self {
            ScalarOp::Add => infix(" + ", args),
            ScalarOp::Mul => infix(" * ", args),
            ScalarOp::Sub => infix(" - ", args),
            ScalarOp::TrueDiv => infix(" / ", args),
            ScalarOp::IntDiv => infix(" // ", args),
            ScalarOp::Mod => infix(" % ", args),
            ScalarOp::Pow => infix(" ** ", args),
            ScalarOp::Compare(op) => infix(&format!(" {} ", op.symbol()), args),
            ScalarOp::Bitwise(BitwiseOp::Invert) => format!("(~{})", args.join(", ")),
            ScalarOp::Bitwise(op) => infix(&format!(" {} ", op.symbol()), args),
            ScalarOp::Neg => format!("(-{})", args.join(", ")),
            ScalarOp::Cast(ty) => format!("cast{{{ty}}}({})", args.join(", ")),
            ScalarOp::InRange {
                include_lower,
                include_upper,
            } => format!(
                "in_range{{{},{}}}({})",
                endpoint(*include_lower),
                endpoint(*include_upper),
                args.join(", ")
            ),
            ScalarOp::Composite(composite) => {
                format!("{}({})", composite.signature(), args.join(", "))
            }
            other => format!("{}({})", other.name(), args.join(", ")),
        }
    }
}

fn infix(symbol: &str, args: &[String]) -> String {
    format!("({})", args.join(symbol))
}

fn endpoint(inclusive: bool) -> &'static str {
    if inclusive {
        "closed"
    } else {
        "open"
    }
}
