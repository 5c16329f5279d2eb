//! Append-only arena of typed scalar values and the nodes producing them.

mod builder;
pub(crate) mod display;
mod expr;
pub(crate) mod rewrite;

pub use expr::ExpressionGraph;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::ScalarConfig;
use crate::error::{ScalarError, ScalarResult};
use crate::ops::ScalarOp;
use crate::scalar::{Literal, ScalarType};

/// Handle to a value stored in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId(pub u32);

/// Handle to a node stored in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// Placeholder bound at evaluation or call time.
    Variable { name: Option<String> },
    Constant {
        literal: Literal,
        name: Option<String>,
    },
    /// Output `index` of `node`; every such value has exactly one producer.
    Output { node: NodeId, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueData {
    pub ty: ScalarType,
    pub kind: ValueKind,
}

impl ValueData {
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::Variable { name } | ValueKind::Constant { name, .. } => name.as_deref(),
            ValueKind::Output { .. } => None,
        }
    }

    pub fn literal(&self) -> Option<Literal> {
        match &self.kind {
            ValueKind::Constant { literal, .. } => Some(*literal),
            _ => None,
        }
    }

    pub fn producer(&self) -> Option<NodeId> {
        match &self.kind {
            ValueKind::Output { node, .. } => Some(*node),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub op: ScalarOp,
    pub inputs: Vec<ValueId>,
    pub outputs: Vec<ValueId>,
}

/// Owns every value and node built by a front end.
///
/// Nodes are appended only after their inputs exist, so ascending [`NodeId`]
/// order is always a valid topological order and the graph cannot contain
/// cycles.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    values: Vec<ValueData>,
    nodes: Vec<Node>,
    config: ScalarConfig,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScalarConfig) -> Self {
        Self {
            values: Vec::new(),
            nodes: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> ScalarConfig {
        self.config
    }

    pub fn variable(&mut self, ty: ScalarType, name: &str) -> ValueId {
        self.push_value(ty, ValueKind::Variable {
            name: Some(name.to_string()),
        })
    }

    pub fn unnamed(&mut self, ty: ScalarType) -> ValueId {
        self.push_value(ty, ValueKind::Variable { name: None })
    }

    /// Creates one named variable per entry of `names`.
    pub fn variables(&mut self, ty: ScalarType, names: &[&str]) -> Vec<ValueId> {
        names.iter().map(|name| self.variable(ty, name)).collect()
    }

    /// Adds a constant.
    ///
    /// Without `dtype` the type is inferred from the literal (`2` is `int8`).
    /// With an integer `dtype`, values it cannot represent fail with
    /// [`ScalarError::Domain`]. The constant keeps only the name given here.
    pub fn constant(
        &mut self,
        literal: impl Into<Literal>,
        dtype: Option<ScalarType>,
        name: Option<&str>,
    ) -> ScalarResult<ValueId> {
        let literal = literal.into();
        let (literal, ty) = match dtype {
            Some(ty) => (literal.checked_cast(ty)?, ty),
            None => (literal, literal.infer_type()),
        };
        Ok(self.push_constant(literal, ty, name.map(str::to_string)))
    }

    /// Adds an unnamed constant of type `ty`, converting with C semantics.
    pub fn typed_constant(&mut self, literal: Literal, ty: ScalarType) -> ValueId {
        self.push_constant(literal.cast(ty), ty, None)
    }

    pub(crate) fn push_constant(
        &mut self,
        literal: Literal,
        ty: ScalarType,
        name: Option<String>,
    ) -> ValueId {
        self.push_value(ty, ValueKind::Constant { literal, name })
    }

    fn push_value(&mut self, ty: ScalarType, kind: ValueKind) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(ValueData { ty, kind });
        id
    }

    /// Applies `op` to `inputs`, creating the node and its typed outputs.
    pub fn apply(&mut self, op: ScalarOp, inputs: &[ValueId]) -> ScalarResult<NodeId> {
        if inputs.is_empty() && !matches!(op, ScalarOp::Mean) {
            return Err(ScalarError::Arity {
                op: op.name().to_string(),
                expected: "at least 1".to_string(),
                found: 0,
            });
        }
        let input_types: Vec<ScalarType> = inputs.iter().map(|id| self.value_type(*id)).collect();
        let output_types = op.output_types(&input_types, &self.config)?;
        let node = NodeId(self.nodes.len() as u32);
        let outputs = output_types
            .iter()
            .enumerate()
            .map(|(index, ty)| self.push_value(*ty, ValueKind::Output { node, index }))
            .collect();
        trace!(op = op.name(), ?node, "applied scalar op");
        self.nodes.push(Node {
            op,
            inputs: inputs.to_vec(),
            outputs,
        });
        Ok(node)
    }

    /// Applies a single-output operation and returns its output.
    pub fn apply1(&mut self, op: ScalarOp, inputs: &[ValueId]) -> ScalarResult<ValueId> {
        let node = self.apply(op, inputs)?;
        match self.nodes[node.index()].outputs.as_slice() {
            [out] => Ok(*out),
            outputs => Err(ScalarError::Arity {
                op: self.nodes[node.index()].op.name().to_string(),
                expected: "1 output".to_string(),
                found: outputs.len(),
            }),
        }
    }

    /// # Panics
    ///
    /// Panics when `id` does not belong to this graph.
    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.index()]
    }

    pub fn value_type(&self, id: ValueId) -> ScalarType {
        self.value(id).ty
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn producer(&self, id: ValueId) -> Option<NodeId> {
        self.value(id).producer()
    }

    pub fn value_ids(&self) -> impl Iterator<Item = ValueId> + '_ {
        (0..self.values.len()).map(|index| ValueId(index as u32))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|index| NodeId(index as u32))
    }

    /// Nodes consuming `value`, in creation order.
    pub fn users_of(&self, value: ValueId) -> Vec<NodeId> {
        self.node_ids()
            .filter(|id| self.node(*id).inputs.contains(&value))
            .collect()
    }

    /// Nodes reachable backward from `values` without walking past `boundary`
    /// values, in topological order.
    pub(crate) fn ancestors(&self, values: &[ValueId], boundary: &[ValueId]) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: Vec<ValueId> = values.to_vec();
        while let Some(value) = stack.pop() {
            if boundary.contains(&value) {
                continue;
            }
            if let Some(node) = self.producer(value) {
                if !seen[node.index()] {
                    seen[node.index()] = true;
                    stack.extend(self.node(node).inputs.iter().copied());
                }
            }
        }
        self.node_ids().filter(|id| seen[id.index()]).collect()
    }
}
