mod utils;

use scalar_rs::ops::c_type;
use scalar_rs::{Composite, ScalarOp};

use crate::error::CodegenResult;
use utils::{push_block, push_line};

pub(crate) use utils::sanitize_symbol;

/// Renders a self-contained translation unit defining `symbol`.
///
/// Inputs are passed by value as `i0, i1, ...`; outputs are written through
/// the pointers `o0, o1, ...`.
pub(crate) fn render_module(composite: &Composite, symbol: &str) -> CodegenResult<String> {
    let mut params = Vec::with_capacity(composite.nin() + composite.nout());
    let mut input_names = Vec::with_capacity(composite.nin());
    for (index, ty) in composite.input_types().iter().enumerate() {
        params.push(format!("{} i{index}", c_type(*ty)?));
        input_names.push(format!("i{index}"));
    }
    let mut output_names = Vec::with_capacity(composite.nout());
    for (index, ty) in composite.output_types().iter().enumerate() {
        params.push(format!("{}* o{index}", c_type(*ty)?));
        output_names.push(format!("(*o{index})"));
    }
    let inputs: Vec<&str> = input_names.iter().map(String::as_str).collect();
    let outputs: Vec<&str> = output_names.iter().map(String::as_str).collect();
    let body = composite.c_code(&inputs, &outputs, "0")?;

    let mut module = String::new();
    push_line(&mut module, 0, "#include <stdint.h>");
    push_line(&mut module, 0, "#include <math.h>");
    if uses_complex(composite) {
        push_line(&mut module, 0, "#include <complex.h>");
    }
    module.push('\n');
    push_line(
        &mut module,
        0,
        &format!("void {symbol}({}) {{", params.join(", ")),
    );
    push_block(&mut module, 1, &body);
    push_line(&mut module, 0, "}");
    Ok(module)
}

fn uses_complex(composite: &Composite) -> bool {
    let graph = composite.graph();
    graph
        .value_ids()
        .any(|id| graph.value_type(id).is_complex())
        || composite.nodes().iter().any(|node| {
            matches!(&graph.node(*node).op, ScalarOp::Composite(nested) if uses_complex(nested))
        })
}
