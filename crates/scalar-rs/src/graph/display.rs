use std::collections::HashMap;
use std::fmt;

use crate::graph::{ExpressionGraph, Graph, NodeId, ValueId, ValueKind};

enum Leaves<'a> {
    /// Inputs render as their names, shared nodes get `*N` tags.
    Named,
    /// Inputs render as positional placeholders `i0, i1, ...`.
    Positional(&'a HashMap<ValueId, usize>),
}

struct Printer<'a> {
    graph: &'a Graph,
    leaves: Leaves<'a>,
    inputs: &'a [ValueId],
    shared: HashMap<NodeId, bool>,
    tags: HashMap<NodeId, usize>,
    memo: HashMap<NodeId, String>,
}

impl<'a> Printer<'a> {
    fn render(&mut self, value: ValueId) -> String {
        let data = self.graph.value(value);
        if self.inputs.contains(&value) {
            return match &self.leaves {
                Leaves::Positional(positions) => positions
                    .get(&value)
                    .map(|index| format!("i{index}"))
                    .unwrap_or_else(|| "i?".to_string()),
                Leaves::Named => leaf_name(data.name(), &data.ty.to_string()),
            };
        }
        match &data.kind {
            ValueKind::Variable { name } => leaf_name(name.as_deref(), &data.ty.to_string()),
            ValueKind::Constant { literal, name } => match (&self.leaves, name) {
                (Leaves::Named, Some(name)) => name.clone(),
                _ => literal.to_string(),
            },
            ValueKind::Output { node, index } => self.render_output(*node, *index),
        }
    }

    fn render_output(&mut self, node: NodeId, index: usize) -> String {
        let nout = self.graph.node(node).outputs.len();
        let suffix = if nout > 1 && index > 0 {
            format!("::{index}")
        } else {
            String::new()
        };
        let tagged = matches!(self.leaves, Leaves::Named)
            && self.shared.get(&node).copied().unwrap_or(false);
        if tagged {
            if let Some(tag) = self.tags.get(&node) {
                return format!("*{tag}{suffix}");
            }
            let tag = self.tags.len() + 1;
            self.tags.insert(node, tag);
            let call = self.render_call(node);
            return format!("*{tag}{suffix} -> {call}");
        }
        let call = match self.memo.get(&node) {
            Some(call) => call.clone(),
            None => {
                let call = self.render_call(node);
                self.memo.insert(node, call.clone());
                call
            }
        };
        format!("{call}{suffix}")
    }

    fn render_call(&mut self, node: NodeId) -> String {
        let node = self.graph.node(node);
        let args: Vec<String> = node.inputs.iter().map(|input| self.render(*input)).collect();
        node.op.render(&args)
    }
}

fn leaf_name(name: Option<&str>, ty: &str) -> String {
    match name {
        Some(name) => name.to_string(),
        None => format!("<{ty}>"),
    }
}

/// Canonical `Composite{...}` rendering of a body with positional inputs.
pub(crate) fn render_signature(graph: &Graph, inputs: &[ValueId], outputs: &[ValueId]) -> String {
    let positions: HashMap<ValueId, usize> = inputs
        .iter()
        .enumerate()
        .rev()
        .map(|(index, id)| (*id, index))
        .collect();
    let mut printer = Printer {
        graph,
        leaves: Leaves::Positional(&positions),
        inputs,
        shared: HashMap::new(),
        tags: HashMap::new(),
        memo: HashMap::new(),
    };
    let rendered: Vec<String> = outputs.iter().map(|id| printer.render(*id)).collect();
    format!("Composite{{{}}}", rendered.join(", "))
}

impl fmt::Display for ExpressionGraph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.graph();
        let mut references: HashMap<ValueId, usize> = HashMap::new();
        for node in self.nodes() {
            for input in &graph.node(*node).inputs {
                *references.entry(*input).or_default() += 1;
            }
        }
        for output in self.outputs() {
            *references.entry(*output).or_default() += 1;
        }
        let shared = self
            .nodes()
            .iter()
            .map(|id| {
                let node = graph.node(*id);
                let many = node.outputs.len() > 1
                    || node
                        .outputs
                        .iter()
                        .any(|out| references.get(out).copied().unwrap_or(0) > 1);
                (*id, many)
            })
            .collect();
        let mut printer = Printer {
            graph,
            leaves: Leaves::Named,
            inputs: self.inputs(),
            shared,
            tags: HashMap::new(),
            memo: HashMap::new(),
        };
        let rendered: Vec<String> = self.outputs().iter().map(|id| printer.render(*id)).collect();
        write!(f, "ExpressionGraph({})", rendered.join(", "))
    }
}
