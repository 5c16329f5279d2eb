use std::f64::consts::{LN_10, LN_2, PI};

use crate::error::ScalarResult;
use crate::gradient;
use crate::graph::{Graph, ValueId};
use crate::ops::{ScalarOp, UnaryMathOp};
use crate::scalar::Literal;

/// Zero gradient for `value`: its own type when it is floating or complex,
/// the configured float type otherwise.
pub(crate) fn zero_grad(graph: &mut Graph, value: ValueId) -> ValueId {
    let ty = graph.value_type(value);
    let ty = if ty.is_discrete() {
        graph.config().float_x
    } else {
        ty
    };
    graph.typed_constant(Literal::Float(0.0), ty)
}

fn constant_like(graph: &mut Graph, like: ValueId, value: f64) -> ValueId {
    let ty = graph.value_type(like);
    let ty = if ty.is_discrete() {
        graph.config().float_x
    } else {
        ty
    };
    graph.typed_constant(Literal::Float(value), ty)
}

impl ScalarOp {
    /// Builds gradient expressions with respect to each input.
    ///
    /// `output_grads` holds one upstream gradient per output. Bool and integer
    /// inputs always receive a zero gradient of `float_x`; piecewise-constant
    /// operations return zeros everywhere.
    pub fn grad(
        &self,
        graph: &mut Graph,
        inputs: &[ValueId],
        outputs: &[ValueId],
        output_grads: &[ValueId],
    ) -> ScalarResult<Vec<ValueId>> {
        if inputs.iter().all(|id| graph.value_type(*id).is_discrete()) {
            return Ok(inputs.iter().map(|id| zero_grad(graph, *id)).collect());
        }
        let mut grads = self.raw_grad(graph, inputs, outputs, output_grads)?;
        for (input, grad) in inputs.iter().zip(grads.iter_mut()) {
            if graph.value_type(*input).is_discrete() {
                *grad = zero_grad(graph, *input);
            }
        }
        Ok(grads)
    }

    fn raw_grad(
        &self,
        graph: &mut Graph,
        inputs: &[ValueId],
        outputs: &[ValueId],
        output_grads: &[ValueId],
    ) -> ScalarResult<Vec<ValueId>> {
        if let ScalarOp::Composite(composite) = self {
            let inlined = composite.inline_into(graph, inputs)?;
            let seeds: Vec<(ValueId, ValueId)> =
                inlined.into_iter().zip(output_grads.iter().copied()).collect();
            return gradient::backprop(graph, &seeds, inputs, inputs);
        }
        let gz = output_grads[0];
        let z = outputs[0];
        let zeros = |graph: &mut Graph| -> Vec<ValueId> {
            inputs.iter().map(|id| zero_grad(graph, *id)).collect()
        };
        let grads = match self {
            ScalarOp::Add | ScalarOp::Identity => vec![gz; inputs.len()],
            ScalarOp::Sub => vec![gz, graph.neg(gz)?],
            ScalarOp::Neg => vec![graph.neg(gz)?],
            ScalarOp::Mul => {
                let mut grads = Vec::with_capacity(inputs.len());
                for index in 0..inputs.len() {
                    let others: Vec<ValueId> = inputs
                        .iter()
                        .enumerate()
                        .filter(|(other, _)| *other != index)
                        .map(|(_, id)| *id)
                        .collect();
                    let grad = if others.is_empty() {
                        gz
                    } else {
                        let mut factors = vec![gz];
                        factors.extend(others);
                        graph.mul_many(&factors)?
                    };
                    grads.push(grad);
                }
                grads
            }
            ScalarOp::TrueDiv => {
                let (x, y) = (inputs[0], inputs[1]);
                let gx = graph.true_div(gz, y)?;
                let gzx = graph.mul(gz, x)?;
                let yy = graph.mul(y, y)?;
                let ratio = graph.true_div(gzx, yy)?;
                vec![gx, graph.neg(ratio)?]
            }
            ScalarOp::Mod => {
                let (x, y) = (inputs[0], inputs[1]);
                let quotient = graph.int_div(x, y)?;
                let scaled = graph.mul(gz, quotient)?;
                vec![gz, graph.neg(scaled)?]
            }
            ScalarOp::Pow => {
                let (x, y) = (inputs[0], inputs[1]);
                let one = constant_like(graph, y, 1.0);
                let y_minus_one = graph.sub(y, one)?;
                let power = graph.pow(x, y_minus_one)?;
                let gx = graph.mul_many(&[gz, y, power])?;
                let log_x = graph.unary(UnaryMathOp::Log, x)?;
                let gy = graph.mul_many(&[gz, log_x, z])?;
                vec![gx, gy]
            }
            ScalarOp::Reciprocal => {
                let x = inputs[0];
                let xx = graph.mul(x, x)?;
                let ratio = graph.true_div(gz, xx)?;
                vec![graph.neg(ratio)?]
            }
            ScalarOp::IntDiv
            | ScalarOp::Compare(_)
            | ScalarOp::Bitwise(_)
            | ScalarOp::InRange { .. } => zeros(graph),
            ScalarOp::Cast(target) => {
                if target.is_discrete() {
                    zeros(graph)
                } else {
                    let ty = graph.value_type(inputs[0]);
                    vec![graph.cast(gz, ty)?]
                }
            }
            ScalarOp::Switch => {
                let cond = inputs[0];
                let zero = constant_like(graph, gz, 0.0);
                let ga = graph.switch(cond, gz, zero)?;
                let gb = graph.switch(cond, zero, gz)?;
                vec![zero_grad(graph, cond), ga, gb]
            }
            ScalarOp::Mean => {
                let count = constant_like(graph, gz, inputs.len() as f64);
                let share = graph.true_div(gz, count)?;
                vec![share; inputs.len()]
            }
            ScalarOp::ArcTan2 => {
                let (y, x) = (inputs[0], inputs[1]);
                let yy = graph.mul(y, y)?;
                let xx = graph.mul(x, x)?;
                let norm = graph.add(yy, xx)?;
                let gzx = graph.mul(gz, x)?;
                let gy = graph.true_div(gzx, norm)?;
                let gzy = graph.mul(gz, y)?;
                let ratio = graph.true_div(gzy, norm)?;
                vec![gy, graph.neg(ratio)?]
            }
            ScalarOp::Unary(op) => vec![unary_grad(graph, *op, inputs[0], z, gz)?],
            ScalarOp::Composite(_) => Vec::new(),
        };
        Ok(grads)
    }
}

/// `gz * f'(x)` for a unary math function with `z = f(x)`.
fn unary_grad(
    graph: &mut Graph,
    op: UnaryMathOp,
    x: ValueId,
    z: ValueId,
    gz: ValueId,
) -> ScalarResult<ValueId> {
    let one = constant_like(graph, z, 1.0);
    let grad = match op {
        UnaryMathOp::Sqrt => {
            let half = constant_like(graph, z, 0.5);
            let scaled = graph.mul(gz, half)?;
            graph.true_div(scaled, z)?
        }
        UnaryMathOp::Log => graph.true_div(gz, x)?,
        UnaryMathOp::Log2 | UnaryMathOp::Log10 => {
            let ln = if op == UnaryMathOp::Log2 { LN_2 } else { LN_10 };
            let ln = constant_like(graph, z, ln);
            let denom = graph.mul(x, ln)?;
            graph.true_div(gz, denom)?
        }
        UnaryMathOp::Log1p => {
            let denom = graph.add(one, x)?;
            graph.true_div(gz, denom)?
        }
        UnaryMathOp::Exp => graph.mul(gz, z)?,
        UnaryMathOp::Exp2 => {
            let ln2 = constant_like(graph, z, LN_2);
            graph.mul_many(&[gz, z, ln2])?
        }
        UnaryMathOp::Expm1 => {
            let exp = graph.add(z, one)?;
            graph.mul(gz, exp)?
        }
        UnaryMathOp::Sin => {
            let cos = graph.unary(UnaryMathOp::Cos, x)?;
            graph.mul(gz, cos)?
        }
        UnaryMathOp::Cos => {
            let sin = graph.unary(UnaryMathOp::Sin, x)?;
            let scaled = graph.mul(gz, sin)?;
            graph.neg(scaled)?
        }
        UnaryMathOp::Tan => {
            let zz = graph.mul(z, z)?;
            let sec2 = graph.add(one, zz)?;
            graph.mul(gz, sec2)?
        }
        UnaryMathOp::ArcSin | UnaryMathOp::ArcCos => {
            let xx = graph.mul(x, x)?;
            let diff = graph.sub(one, xx)?;
            let root = graph.unary(UnaryMathOp::Sqrt, diff)?;
            let ratio = graph.true_div(gz, root)?;
            if op == UnaryMathOp::ArcSin {
                ratio
            } else {
                graph.neg(ratio)?
            }
        }
        UnaryMathOp::ArcTan => {
            let xx = graph.mul(x, x)?;
            let denom = graph.add(one, xx)?;
            graph.true_div(gz, denom)?
        }
        UnaryMathOp::Sinh => {
            let cosh = graph.unary(UnaryMathOp::Cosh, x)?;
            graph.mul(gz, cosh)?
        }
        UnaryMathOp::Cosh => {
            let sinh = graph.unary(UnaryMathOp::Sinh, x)?;
            graph.mul(gz, sinh)?
        }
        UnaryMathOp::Tanh => {
            let zz = graph.mul(z, z)?;
            let sech2 = graph.sub(one, zz)?;
            graph.mul(gz, sech2)?
        }
        UnaryMathOp::ArcSinh | UnaryMathOp::ArcCosh => {
            let xx = graph.mul(x, x)?;
            let inner = if op == UnaryMathOp::ArcSinh {
                graph.add(xx, one)?
            } else {
                graph.sub(xx, one)?
            };
            let root = graph.unary(UnaryMathOp::Sqrt, inner)?;
            graph.true_div(gz, root)?
        }
        UnaryMathOp::ArcTanh => {
            let xx = graph.mul(x, x)?;
            let denom = graph.sub(one, xx)?;
            graph.true_div(gz, denom)?
        }
        UnaryMathOp::Deg2Rad | UnaryMathOp::Rad2Deg => {
            let factor = if op == UnaryMathOp::Deg2Rad {
                PI / 180.0
            } else {
                180.0 / PI
            };
            let factor = constant_like(graph, z, factor);
            graph.mul(gz, factor)?
        }
    };
    Ok(grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::ScalarType;

    #[test]
    fn zero_gradient_of_integers_uses_float_x() {
        let mut graph = Graph::new();
        let x = graph.unnamed(ScalarType::Int32);
        let zero = zero_grad(&mut graph, x);
        assert_eq!(graph.value_type(zero), graph.config().float_x);
        assert_eq!(graph.value(zero).literal(), Some(Literal::Float(0.0)));
    }
}
