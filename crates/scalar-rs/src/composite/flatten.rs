use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::ScalarResult;
use crate::graph::rewrite::{rebuild, Rebuilt, Replacement, RewritePolicy};
use crate::graph::{ExpressionGraph, Graph, NodeId, ValueId};
use crate::ops::ScalarOp;

/// Inlines the nested composites selected by [`FlattenPlan::new`].
struct FlattenPlan {
    inline: HashSet<NodeId>,
}

impl FlattenPlan {
    /// A nested composite is inlined when it has a single output and either
    /// exactly one node consumes that output, or it is the sole output of the
    /// graph being fused. Shared or multi-output calls stay opaque.
    fn new(expr: &ExpressionGraph<'_>) -> Self {
        let consumers = expr.consumers();
        let outputs = expr.outputs();
        let graph = expr.graph();
        let inline = expr
            .nodes()
            .iter()
            .copied()
            .filter(|id| {
                let node = graph.node(*id);
                let ScalarOp::Composite(nested) = &node.op else {
                    return false;
                };
                if nested.nout() != 1 {
                    return false;
                }
                let out = node.outputs[0];
                let users = consumers.get(&out).map_or(0, |users| users.len());
                let is_output = outputs.contains(&out);
                (users == 1 && !is_output) || (users == 0 && is_output && outputs.len() == 1)
            })
            .collect();
        Self { inline }
    }
}

impl RewritePolicy for FlattenPlan {
    fn rewrite(
        &mut self,
        dst: &mut Graph,
        node: NodeId,
        op: &ScalarOp,
        inputs: &[ValueId],
    ) -> ScalarResult<Replacement> {
        match op {
            ScalarOp::Composite(nested) if self.inline.contains(&node) => {
                debug!(signature = %nested.signature(), "inlining nested composite");
                Ok(Replacement::Values(nested.inline_into(dst, inputs)?))
            }
            _ => Ok(Replacement::Keep),
        }
    }
}

/// Copies `expr` into a fresh arena, inlining nested composites until no
/// further inlining is legal.
pub(super) fn flatten(expr: &ExpressionGraph<'_>) -> ScalarResult<Rebuilt> {
    let mut rebuilt = rebuild(expr, &mut FlattenPlan::new(expr))?;
    let mut passes = 1usize;
    loop {
        let next = {
            let expr = ExpressionGraph::new(&rebuilt.graph, &rebuilt.inputs, &rebuilt.outputs)?;
            let mut plan = FlattenPlan::new(&expr);
            if plan.inline.is_empty() {
                break;
            }
            rebuild(&expr, &mut plan)?
        };
        rebuilt = next;
        passes += 1;
    }
    trace!(passes, "flattened composite body");
    Ok(rebuilt)
}
