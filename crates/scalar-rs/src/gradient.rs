//! Minimal reverse-mode accumulation over [`ScalarOp::grad`] rules.
//!
//! Full automatic differentiation belongs to the caller; this driver exists
//! so the per-operation rules can be composed and checked.

use std::collections::HashMap;

use tracing::trace;

use crate::error::ScalarResult;
use crate::graph::{Graph, ValueId};
use crate::ops::grad::zero_grad;
use crate::ops::ScalarOp;
use crate::scalar::Literal;

/// Gradient of `cost` with respect to each value of `wrt`.
///
/// The seed is `1` of the cost's type (`float_x` for discrete costs). Values
/// the cost does not depend on receive a zero gradient.
pub fn grad(graph: &mut Graph, cost: ValueId, wrt: &[ValueId]) -> ScalarResult<Vec<ValueId>> {
    let ty = graph.value_type(cost);
    let seed_ty = if ty.is_discrete() {
        graph.config().float_x
    } else {
        ty
    };
    let seed = graph.typed_constant(Literal::Float(1.0), seed_ty);
    backprop(graph, &[(cost, seed)], wrt, &[])
}

/// Propagates `(value, gradient)` seeds backward through every node they
/// depend on, summing contributions per value. Nodes producing `boundary`
/// values are not visited.
pub(crate) fn backprop(
    graph: &mut Graph,
    seeds: &[(ValueId, ValueId)],
    wrt: &[ValueId],
    boundary: &[ValueId],
) -> ScalarResult<Vec<ValueId>> {
    let mut grads: HashMap<ValueId, ValueId> = HashMap::new();
    for (value, seed) in seeds {
        accumulate(graph, &mut grads, *value, *seed)?;
    }
    let roots: Vec<ValueId> = seeds.iter().map(|(value, _)| *value).collect();
    let nodes = graph.ancestors(&roots, boundary);
    trace!(nodes = nodes.len(), "backpropagating");

    for node_id in nodes.into_iter().rev() {
        let node = graph.node(node_id);
        if !node.outputs.iter().any(|out| grads.contains_key(out)) {
            continue;
        }
        let op: ScalarOp = node.op.clone();
        let inputs = node.inputs.clone();
        let outputs = node.outputs.clone();
        let mut output_grads = Vec::with_capacity(outputs.len());
        for output in &outputs {
            let grad = match grads.get(output) {
                Some(grad) => *grad,
                None => zero_grad(graph, *output),
            };
            output_grads.push(grad);
        }
        let input_grads = op.grad(graph, &inputs, &outputs, &output_grads)?;
        for (input, grad) in inputs.iter().zip(input_grads) {
            accumulate(graph, &mut grads, *input, grad)?;
        }
    }

    Ok(wrt
        .iter()
        .map(|value| match grads.get(value) {
            Some(grad) => *grad,
            None => zero_grad(graph, *value),
        })
        .collect())
}

fn accumulate(
    graph: &mut Graph,
    grads: &mut HashMap<ValueId, ValueId>,
    value: ValueId,
    grad: ValueId,
) -> ScalarResult<()> {
    let total = match grads.get(&value) {
        Some(existing) => graph.add(*existing, grad)?,
        None => grad,
    };
    grads.insert(value, total);
    Ok(())
}
