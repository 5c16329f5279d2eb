use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use crate::error::{ScalarError, ScalarResult};
use crate::graph::{Graph, NodeId, ValueId, ValueKind};
use crate::scalar::{Literal, ScalarType};

/// Sub-graph reachable backward from `outputs`, bounded by `inputs`.
///
/// Inputs are never traversed past. Node order is deterministic and places
/// producers before consumers.
#[derive(Debug, Clone)]
pub struct ExpressionGraph<'g> {
    graph: &'g Graph,
    inputs: Vec<ValueId>,
    outputs: Vec<ValueId>,
    order: Vec<NodeId>,
}

struct Collect<'a> {
    graph: &'a Graph,
    inputs: HashSet<ValueId>,
    visited: HashSet<NodeId>,
    order: Vec<NodeId>,
}

enum Step {
    Value(ValueId),
    Emit(NodeId),
}

impl Collect<'_> {
    /// Post-order walk from `root` with an explicit stack. Node inputs are
    /// expanded left to right, so the order matches a recursive traversal.
    fn visit(&mut self, root: ValueId) -> ScalarResult<()> {
        let mut stack = vec![Step::Value(root)];
        while let Some(step) = stack.pop() {
            let value = match step {
                Step::Emit(node) => {
                    self.order.push(node);
                    continue;
                }
                Step::Value(value) => value,
            };
            if self.inputs.contains(&value) {
                continue;
            }
            match &self.graph.value(value).kind {
                ValueKind::Constant { .. } => {}
                ValueKind::Variable { name } => {
                    return Err(ScalarError::dependency(format!(
                        "variable {} of type {} is required but is not among the declared inputs",
                        name.as_deref().unwrap_or("<unnamed>"),
                        self.graph.value_type(value)
                    )))
                }
                ValueKind::Output { node, .. } => {
                    let node = *node;
                    if !self.visited.insert(node) {
                        continue;
                    }
                    stack.push(Step::Emit(node));
                    let inputs = &self.graph.node(node).inputs;
                    stack.extend(inputs.iter().rev().map(|input| Step::Value(*input)));
                }
            }
        }
        Ok(())
    }
}

impl<'g> ExpressionGraph<'g> {
    /// Fails with [`ScalarError::Dependency`] when an output depends on a
    /// variable that is not one of `inputs`.
    pub fn new(graph: &'g Graph, inputs: &[ValueId], outputs: &[ValueId]) -> ScalarResult<Self> {
        let mut collect = Collect {
            graph,
            inputs: inputs.iter().copied().collect(),
            visited: HashSet::new(),
            order: Vec::new(),
        };
        for output in outputs {
            collect.visit(*output)?;
        }
        Ok(Self {
            graph,
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            order: collect.order,
        })
    }

    pub(crate) fn from_parts(
        graph: &'g Graph,
        inputs: &[ValueId],
        outputs: &[ValueId],
        order: &[NodeId],
    ) -> Self {
        Self {
            graph,
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            order: order.to_vec(),
        }
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn inputs(&self) -> &[ValueId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ValueId] {
        &self.outputs
    }

    /// Nodes in topological order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.order
    }

    /// Inputs, referenced constants and node outputs, in first-seen order.
    pub fn values(&self) -> Vec<ValueId> {
        let mut seen = HashSet::new();
        let mut values = Vec::new();
        let mut push = |value: ValueId| {
            if seen.insert(value) {
                values.push(value);
            }
        };
        for input in &self.inputs {
            push(*input);
        }
        for node in &self.order {
            let node = self.graph.node(*node);
            for input in &node.inputs {
                push(*input);
            }
            for output in &node.outputs {
                push(*output);
            }
        }
        for output in &self.outputs {
            push(*output);
        }
        values
    }

    /// Distinct consumer nodes of every value used inside the sub-graph.
    pub fn consumers(&self) -> HashMap<ValueId, SmallVec<[NodeId; 2]>> {
        let mut consumers: HashMap<ValueId, SmallVec<[NodeId; 2]>> = HashMap::new();
        for node_id in &self.order {
            for input in &self.graph.node(*node_id).inputs {
                let users = consumers.entry(*input).or_default();
                if !users.contains(node_id) {
                    users.push(*node_id);
                }
            }
        }
        consumers
    }

    pub fn input_types(&self) -> Vec<ScalarType> {
        self.inputs
            .iter()
            .map(|id| self.graph.value_type(*id))
            .collect()
    }

    pub fn output_types(&self) -> Vec<ScalarType> {
        self.outputs
            .iter()
            .map(|id| self.graph.value_type(*id))
            .collect()
    }

    /// Interprets the sub-graph on concrete arguments.
    ///
    /// Arguments are converted to the declared input types; every output is
    /// normalized to its declared type.
    pub fn evaluate(&self, args: &[Literal]) -> ScalarResult<Vec<Literal>> {
        if args.len() != self.inputs.len() {
            return Err(ScalarError::Arity {
                op: "expression graph".to_string(),
                expected: self.inputs.len().to_string(),
                found: args.len(),
            });
        }
        let mut env: HashMap<ValueId, Literal> = HashMap::new();
        for (input, arg) in self.inputs.iter().zip(args) {
            env.entry(*input)
                .or_insert_with(|| arg.cast(self.graph.value_type(*input)));
        }
        for node_id in &self.order {
            let node = self.graph.node(*node_id);
            let values = node
                .inputs
                .iter()
                .map(|id| self.lookup(&env, *id))
                .collect::<ScalarResult<Vec<_>>>()?;
            let input_types: Vec<ScalarType> = node
                .inputs
                .iter()
                .map(|id| self.graph.value_type(*id))
                .collect();
            let output_types: Vec<ScalarType> = node
                .outputs
                .iter()
                .map(|id| self.graph.value_type(*id))
                .collect();
            let results = node.op.evaluate(&values, &input_types, &output_types)?;
            debug_assert_eq!(results.len(), node.outputs.len());
            for ((output, value), ty) in node.outputs.iter().zip(results).zip(&output_types) {
                env.insert(*output, value.cast(*ty));
            }
        }
        self.outputs
            .iter()
            .map(|id| self.lookup(&env, *id))
            .collect()
    }

    fn lookup(&self, env: &HashMap<ValueId, Literal>, id: ValueId) -> ScalarResult<Literal> {
        if let Some(value) = env.get(&id) {
            return Ok(*value);
        }
        let data = self.graph.value(id);
        data.literal().ok_or_else(|| {
            ScalarError::dependency(format!(
                "value {} of type {} has no binding during evaluation",
                id.0, data.ty
            ))
        })
    }
}
