//! Straight-line C emission for composite bodies.

use std::collections::HashMap;

use tracing::trace;

use crate::composite::Composite;
use crate::error::{ScalarError, ScalarResult};
use crate::graph::{ValueId, ValueKind};
use crate::ops::{c_type, CValue};

/// Renders `composite` as C statements.
///
/// Every node output gets a temporary named `V{unique_id}_tmp{n}`, numbered in
/// topological order and declared where it is first assigned. Constants are
/// inlined as literal text. The designated outputs are assigned to
/// `output_names` last. Distinct `unique_id`s keep several composites in one
/// translation unit from colliding.
pub fn emit(
    composite: &Composite,
    input_names: &[&str],
    output_names: &[&str],
    unique_id: &str,
) -> ScalarResult<String> {
    if input_names.len() != composite.nin() {
        return Err(ScalarError::Arity {
            op: "composite inputs".to_string(),
            expected: composite.nin().to_string(),
            found: input_names.len(),
        });
    }
    if output_names.len() != composite.nout() {
        return Err(ScalarError::Arity {
            op: "composite outputs".to_string(),
            expected: composite.nout().to_string(),
            found: output_names.len(),
        });
    }
    let graph = composite.graph();
    let mut names: HashMap<ValueId, CValue> = HashMap::new();
    for (input, name) in composite.inputs().iter().zip(input_names) {
        names
            .entry(*input)
            .or_insert_with(|| CValue::new(*name, graph.value_type(*input)));
    }

    let resolve = |names: &HashMap<ValueId, CValue>, id: ValueId| -> ScalarResult<CValue> {
        if let Some(value) = names.get(&id) {
            return Ok(value.clone());
        }
        let data = graph.value(id);
        match &data.kind {
            ValueKind::Constant { literal, .. } => {
                Ok(CValue::new(literal.render_c(data.ty), data.ty))
            }
            _ => Err(ScalarError::dependency(format!(
                "value {} has no C name during emission",
                id.0
            ))),
        }
    };

    let mut lines: Vec<String> = Vec::new();
    let mut temp = 0usize;
    for (position, node_id) in composite.nodes().iter().enumerate() {
        let node = graph.node(*node_id);
        let inputs = node
            .inputs
            .iter()
            .map(|id| resolve(&names, *id))
            .collect::<ScalarResult<Vec<_>>>()?;
        let mut outputs = Vec::with_capacity(node.outputs.len());
        for output in &node.outputs {
            let ty = graph.value_type(*output);
            let name = format!("V{unique_id}_tmp{temp}");
            temp += 1;
            lines.push(format!("{} {name};", c_type(ty)?));
            let value = CValue::new(name, ty);
            names.insert(*output, value.clone());
            outputs.push(value);
        }
        let node_id = format!("{unique_id}_{position}");
        lines.push(node.op.c_code(&inputs, &outputs, &node_id)?);
    }
    for (output, name) in composite.outputs().iter().zip(output_names) {
        let value = resolve(&names, *output)?;
        lines.push(format!("{name} = {};", value.expr));
    }
    trace!(unique_id, temps = temp, "emitted composite body");
    Ok(lines.join("\n"))
}

/// Emits a nested composite call as a braced block so its temporaries stay
/// local to the call.
pub(crate) fn emit_block(
    composite: &Composite,
    input_names: &[&str],
    output_names: &[&str],
    unique_id: &str,
) -> ScalarResult<String> {
    let body = emit(composite, input_names, output_names, unique_id)?;
    let indented: Vec<String> = body.lines().map(|line| format!("    {line}")).collect();
    Ok(format!("{{\n{}\n}}", indented.join("\n")))
}
