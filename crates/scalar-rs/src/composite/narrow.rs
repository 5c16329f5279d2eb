use tracing::debug;

use crate::composite::Composite;
use crate::config::ScalarConfig;
use crate::error::ScalarResult;
use crate::graph::rewrite::{rebuild, Replacement, RewritePolicy};
use crate::graph::{Graph, NodeId, ValueId};
use crate::ops::ScalarOp;
use crate::scalar::ScalarType;

/// Replaces float16 with float32 on inputs, constants, casts and nested
/// composites. Every other operation is re-typed from its new inputs.
struct NarrowFloat16;

fn widen(ty: ScalarType) -> ScalarType {
    if ty == ScalarType::Float16 {
        ScalarType::Float32
    } else {
        ty
    }
}

impl RewritePolicy for NarrowFloat16 {
    fn config(&self, config: ScalarConfig) -> ScalarConfig {
        config.narrowed()
    }

    fn value_type(&self, ty: ScalarType) -> ScalarType {
        widen(ty)
    }

    fn rewrite(
        &mut self,
        _dst: &mut Graph,
        _node: NodeId,
        op: &ScalarOp,
        _inputs: &[ValueId],
    ) -> ScalarResult<Replacement> {
        match op {
            ScalarOp::Cast(ScalarType::Float16) => {
                Ok(Replacement::Op(ScalarOp::Cast(ScalarType::Float32)))
            }
            ScalarOp::Composite(nested) if nested.has_float16() => {
                Ok(Replacement::Op(ScalarOp::Composite(nested.clone_float32()?)))
            }
            _ => Ok(Replacement::Keep),
        }
    }
}

impl Composite {
    /// Returns an equivalent composite computing in float32 wherever this one
    /// uses float16. `self` is left untouched; narrowing a composite without
    /// float16 yields a structurally identical one.
    pub fn clone_float32(&self) -> ScalarResult<Composite> {
        let narrowed = rebuild(&self.expression(), &mut NarrowFloat16)?;
        let narrowed = Composite::new(&narrowed.graph, &narrowed.inputs, &narrowed.outputs)?;
        debug_assert!(
            !narrowed.has_float16(),
            "float16 survived narrowing in {}",
            narrowed.signature()
        );
        if self.has_float16() {
            debug!(
                from = %self.signature(),
                to = %narrowed.signature(),
                "narrowed float16 composite to float32"
            );
        }
        Ok(narrowed)
    }
}
