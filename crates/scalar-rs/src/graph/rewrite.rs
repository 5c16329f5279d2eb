use std::collections::HashMap;

use crate::config::ScalarConfig;
use crate::error::{ScalarError, ScalarResult};
use crate::graph::{ExpressionGraph, Graph, NodeId, ValueId, ValueKind};
use crate::ops::ScalarOp;
use crate::scalar::ScalarType;

/// What to emit in place of a replayed source node.
pub(crate) enum Replacement {
    /// Re-apply the source operation to the mapped inputs.
    Keep,
    /// Apply a different operation to the mapped inputs.
    Op(ScalarOp),
    /// Use values already present in the destination graph.
    Values(Vec<ValueId>),
}

/// Hooks consulted while a sub-graph is replayed into a new arena.
pub(crate) trait RewritePolicy {
    fn config(&self, config: ScalarConfig) -> ScalarConfig {
        config
    }

    /// Type given to rebuilt inputs and constants.
    fn value_type(&self, ty: ScalarType) -> ScalarType {
        ty
    }

    fn rewrite(
        &mut self,
        _dst: &mut Graph,
        _node: NodeId,
        _op: &ScalarOp,
        _inputs: &[ValueId],
    ) -> ScalarResult<Replacement> {
        Ok(Replacement::Keep)
    }
}

/// Replays nodes unchanged.
pub(crate) struct Verbatim;

impl RewritePolicy for Verbatim {}

/// Copies nodes of `src` into `dst`, tracking where each source value went.
///
/// Output types are re-inferred by [`Graph::apply`], so binding inputs to
/// values of different types retypes everything downstream.
pub(crate) struct GraphRewriter<'s, 'd> {
    src: &'s Graph,
    dst: &'d mut Graph,
    map: HashMap<ValueId, ValueId>,
}

impl<'s, 'd> GraphRewriter<'s, 'd> {
    pub(crate) fn new(src: &'s Graph, dst: &'d mut Graph) -> Self {
        Self {
            src,
            dst,
            map: HashMap::new(),
        }
    }

    pub(crate) fn bind(&mut self, from: ValueId, to: ValueId) {
        self.map.entry(from).or_insert(to);
    }

    pub(crate) fn replay(
        &mut self,
        order: &[NodeId],
        policy: &mut impl RewritePolicy,
    ) -> ScalarResult<()> {
        for node_id in order {
            let node = self.src.node(*node_id);
            let inputs = node
                .inputs
                .iter()
                .map(|id| self.resolve(*id, &*policy))
                .collect::<ScalarResult<Vec<_>>>()?;
            let outputs = match policy.rewrite(self.dst, *node_id, &node.op, &inputs)? {
                Replacement::Keep => self.apply(node.op.clone(), &inputs)?,
                Replacement::Op(op) => self.apply(op, &inputs)?,
                Replacement::Values(values) => values,
            };
            debug_assert_eq!(
                outputs.len(),
                node.outputs.len(),
                "rewrite changed the output count of {}",
                node.op.name()
            );
            for (from, to) in node.outputs.iter().zip(outputs) {
                self.map.insert(*from, to);
            }
        }
        Ok(())
    }

    fn apply(&mut self, op: ScalarOp, inputs: &[ValueId]) -> ScalarResult<Vec<ValueId>> {
        let node = match op {
            ScalarOp::Composite(composite) => composite.make_node(self.dst, inputs)?,
            op => self.dst.apply(op, inputs)?,
        };
        Ok(self.dst.node(node).outputs.clone())
    }

    /// Destination value for `id`, copying constants on first use.
    pub(crate) fn resolve(
        &mut self,
        id: ValueId,
        policy: &impl RewritePolicy,
    ) -> ScalarResult<ValueId> {
        if let Some(mapped) = self.map.get(&id) {
            return Ok(*mapped);
        }
        let data = self.src.value(id);
        match &data.kind {
            ValueKind::Constant { literal, name } => {
                let ty = policy.value_type(data.ty);
                let copied = self.dst.push_constant(literal.cast(ty), ty, name.clone());
                self.map.insert(id, copied);
                Ok(copied)
            }
            ValueKind::Variable { name } => Err(ScalarError::dependency(format!(
                "variable {} is not bound in the rewritten graph",
                name.as_deref().unwrap_or("<unnamed>")
            ))),
            ValueKind::Output { .. } => Err(ScalarError::dependency(format!(
                "value {} is used before its producer was replayed",
                id.0
            ))),
        }
    }
}

/// A sub-graph copied into its own arena.
pub(crate) struct Rebuilt {
    pub graph: Graph,
    pub inputs: Vec<ValueId>,
    pub outputs: Vec<ValueId>,
}

/// Copies `expr` into a fresh arena with one new variable per distinct input.
pub(crate) fn rebuild(
    expr: &ExpressionGraph<'_>,
    policy: &mut impl RewritePolicy,
) -> ScalarResult<Rebuilt> {
    let src = expr.graph();
    let mut graph = Graph::with_config(policy.config(src.config()));
    let mut inputs = Vec::with_capacity(expr.inputs().len());
    let outputs = {
        let mut rewriter = GraphRewriter::new(src, &mut graph);
        for input in expr.inputs() {
            let data = src.value(*input);
            let ty = policy.value_type(data.ty);
            let fresh = match data.name() {
                Some(name) => rewriter.dst.variable(ty, name),
                None => rewriter.dst.unnamed(ty),
            };
            rewriter.bind(*input, fresh);
            inputs.push(fresh);
        }
        rewriter.replay(expr.nodes(), policy)?;
        expr.outputs()
            .iter()
            .map(|id| rewriter.resolve(*id, &*policy))
            .collect::<ScalarResult<Vec<_>>>()?
    };
    Ok(Rebuilt {
        graph,
        inputs,
        outputs,
    })
}
