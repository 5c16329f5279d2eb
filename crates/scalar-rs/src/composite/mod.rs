//! Fused scalar operations.
//!
//! A [`Composite`] owns a private body graph whose inputs and outputs map
//! positionally onto the operation's arguments and results. Nested composites
//! are flattened once, at construction; the body is immutable afterwards and
//! shared between clones.

mod flatten;
mod narrow;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::codegen;
use crate::config::ScalarConfig;
use crate::error::{ScalarError, ScalarResult};
use crate::graph::display::render_signature;
use crate::graph::rewrite::{GraphRewriter, Rebuilt, Verbatim};
use crate::graph::{ExpressionGraph, Graph, NodeId, ValueId};
use crate::hashing::fnv1a_hash;
use crate::ops::ScalarOp;
use crate::scalar::{Literal, ScalarType};

#[derive(Clone)]
pub struct Composite {
    inner: Arc<Body>,
}

struct Body {
    graph: Graph,
    inputs: Vec<ValueId>,
    outputs: Vec<ValueId>,
    order: Vec<NodeId>,
    input_types: Vec<ScalarType>,
    output_types: Vec<ScalarType>,
    signature: String,
    cache_key: String,
}

impl Composite {
    /// Fuses the sub-graph of `graph` between `inputs` and `outputs`.
    ///
    /// Inputs are deduplicated in first-occurrence order. Fails with
    /// [`ScalarError::Dependency`] when the outputs need a variable that is
    /// not among the inputs.
    pub fn new(graph: &Graph, inputs: &[ValueId], outputs: &[ValueId]) -> ScalarResult<Self> {
        if outputs.is_empty() {
            return Err(ScalarError::Arity {
                op: "composite".to_string(),
                expected: "at least 1 output".to_string(),
                found: 0,
            });
        }
        let mut unique: Vec<ValueId> = Vec::with_capacity(inputs.len());
        for input in inputs {
            if !unique.contains(input) {
                unique.push(*input);
            }
        }
        let expr = ExpressionGraph::new(graph, &unique, outputs)?;
        let rebuilt = flatten::flatten(&expr)?;
        Self::from_rebuilt(rebuilt)
    }

    fn from_rebuilt(rebuilt: Rebuilt) -> ScalarResult<Self> {
        let Rebuilt {
            graph,
            inputs,
            outputs,
        } = rebuilt;
        let expr = ExpressionGraph::new(&graph, &inputs, &outputs)?;
        let order = expr.nodes().to_vec();
        // The signature prints constants without their type, so the key also
        // lists every body value's type and the keys of nested bodies.
        let value_types: Vec<ScalarType> = expr
            .values()
            .iter()
            .map(|id| graph.value_type(*id))
            .collect();
        let nested: Vec<&str> = order
            .iter()
            .filter_map(|id| match &graph.node(*id).op {
                ScalarOp::Composite(inner) => Some(inner.cache_key()),
                _ => None,
            })
            .collect();
        let input_types: Vec<ScalarType> = inputs.iter().map(|id| graph.value_type(*id)).collect();
        let output_types: Vec<ScalarType> =
            outputs.iter().map(|id| graph.value_type(*id)).collect();
        let signature = render_signature(&graph, &inputs, &outputs);
        let mut cache_key = format!(
            "{signature}|{}->{}|{}",
            type_list(&input_types),
            type_list(&output_types),
            type_list(&value_types)
        );
        if !nested.is_empty() {
            cache_key.push_str(&format!("|[{}]", nested.join(";")));
        }
        debug!(%signature, nodes = order.len(), "built composite");
        Ok(Self {
            inner: Arc::new(Body {
                graph,
                inputs,
                outputs,
                order,
                input_types,
                output_types,
                signature,
                cache_key,
            }),
        })
    }

    /// The body arena. Only values reachable from the outputs live in it.
    pub fn graph(&self) -> &Graph {
        &self.inner.graph
    }

    pub fn inputs(&self) -> &[ValueId] {
        &self.inner.inputs
    }

    pub fn outputs(&self) -> &[ValueId] {
        &self.inner.outputs
    }

    /// Body nodes in topological order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.inner.order
    }

    pub fn input_types(&self) -> &[ScalarType] {
        &self.inner.input_types
    }

    pub fn output_types(&self) -> &[ScalarType] {
        &self.inner.output_types
    }

    pub fn nin(&self) -> usize {
        self.inner.inputs.len()
    }

    pub fn nout(&self) -> usize {
        self.inner.outputs.len()
    }

    pub fn config(&self) -> ScalarConfig {
        self.inner.graph.config()
    }

    /// `Composite{...}` rendering of the outputs over placeholders `i0, i1, ...`.
    pub fn signature(&self) -> &str {
        &self.inner.signature
    }

    /// Signature plus input, output and body value types, followed by the keys
    /// of nested composites. Equal keys mean identical code.
    pub fn cache_key(&self) -> &str {
        &self.inner.cache_key
    }

    pub fn fingerprint(&self) -> u64 {
        fnv1a_hash(self.inner.cache_key.as_bytes())
    }

    pub fn expression(&self) -> ExpressionGraph<'_> {
        let body = &*self.inner;
        ExpressionGraph::from_parts(&body.graph, &body.inputs, &body.outputs, &body.order)
    }

    pub fn evaluate(&self, args: &[Literal]) -> ScalarResult<Vec<Literal>> {
        self.expression().evaluate(args)
    }

    /// Producer operation of output `index`, if it is computed by a node.
    pub fn output_op(&self, index: usize) -> Option<&ScalarOp> {
        let output = *self.inner.outputs.get(index)?;
        let node = self.inner.graph.producer(output)?;
        Some(&self.inner.graph.node(node).op)
    }

    fn check_args(&self, found: usize) -> ScalarResult<()> {
        if found == self.nin() {
            Ok(())
        } else {
            Err(ScalarError::Arity {
                op: "composite".to_string(),
                expected: self.nin().to_string(),
                found,
            })
        }
    }

    /// Binds the composite to `args` in `graph` without re-running fusion.
    ///
    /// Arguments may be the outputs of existing nodes. When their types differ
    /// from the declared input types the body is replayed with the argument
    /// types first.
    pub fn make_node(&self, graph: &mut Graph, args: &[ValueId]) -> ScalarResult<NodeId> {
        self.check_args(args.len())?;
        let arg_types: Vec<ScalarType> = args.iter().map(|id| graph.value_type(*id)).collect();
        let op = if arg_types == self.inner.input_types {
            self.clone()
        } else {
            self.retyped(&arg_types)?
        };
        graph.apply(ScalarOp::Composite(op), args)
    }

    /// Like [`Composite::make_node`], returning the node's outputs.
    pub fn call(&self, graph: &mut Graph, args: &[ValueId]) -> ScalarResult<Vec<ValueId>> {
        let node = self.make_node(graph, args)?;
        Ok(graph.node(node).outputs.clone())
    }

    fn retyped(&self, types: &[ScalarType]) -> ScalarResult<Composite> {
        debug!(
            signature = %self.inner.signature,
            from = ?self.inner.input_types,
            to = ?types,
            "retyping composite for call site"
        );
        let body = &*self.inner;
        let mut scratch = Graph::with_config(body.graph.config());
        let inputs: Vec<ValueId> = body
            .inputs
            .iter()
            .zip(types)
            .map(|(input, ty)| match body.graph.value(*input).name() {
                Some(name) => scratch.variable(*ty, name),
                None => scratch.unnamed(*ty),
            })
            .collect();
        let outputs = self.inline_into(&mut scratch, &inputs)?;
        Composite::new(&scratch, &inputs, &outputs)
    }

    /// Splices the body into `dst` with its inputs bound to `args`.
    pub fn inline_into(&self, dst: &mut Graph, args: &[ValueId]) -> ScalarResult<Vec<ValueId>> {
        self.check_args(args.len())?;
        let body = &*self.inner;
        let mut rewriter = GraphRewriter::new(&body.graph, dst);
        for (input, arg) in body.inputs.iter().zip(args) {
            rewriter.bind(*input, *arg);
        }
        rewriter.replay(&body.order, &mut Verbatim)?;
        body.outputs
            .iter()
            .map(|id| rewriter.resolve(*id, &Verbatim))
            .collect()
    }

    /// Whether any body value, including those of nested composites, is float16.
    pub fn has_float16(&self) -> bool {
        let body = &*self.inner;
        body.graph
            .value_ids()
            .any(|id| body.graph.value_type(id) == ScalarType::Float16)
            || body.order.iter().any(|node| {
                matches!(&body.graph.node(*node).op, ScalarOp::Composite(nested) if nested.has_float16())
            })
    }

    /// Straight-line C statements computing the outputs; see [`codegen::emit`].
    pub fn c_code(
        &self,
        input_names: &[&str],
        output_names: &[&str],
        unique_id: &str,
    ) -> ScalarResult<String> {
        codegen::emit(self, input_names, output_names, unique_id)
    }
}

fn type_list(types: &[ScalarType]) -> String {
    types
        .iter()
        .map(|ty| ty.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

impl PartialEq for Composite {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.cache_key == other.inner.cache_key
    }
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("signature", &self.inner.signature)
            .field("inputs", &self.inner.input_types)
            .field("outputs", &self.inner.output_types)
            .finish()
    }
}

impl fmt::Display for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.signature)
    }
}
