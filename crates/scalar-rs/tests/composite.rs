use anyhow::Result;
use scalar_rs::{Composite, ExpressionGraph, Graph, Literal, ScalarError, ScalarOp, ScalarType};
use scalar_rs::ops::UnaryMathOp;

fn floats(graph: &mut Graph, names: &[&str]) -> Vec<scalar_rs::ValueId> {
    let float_x = graph.config().float_x;
    graph.variables(float_x, names)
}

fn as_f64(values: &[Literal]) -> Vec<f64> {
    values.iter().filter_map(|value| value.as_f64()).collect()
}

#[test]
fn mul_add_true_div_evaluates() -> Result<()> {
    let mut g = Graph::new();
    let v = floats(&mut g, &["x", "y"]);
    let (x, y) = (v[0], v[1]);
    let sum = g.add(x, y)?;
    let ratio = g.true_div(x, y)?;
    let e = g.mul(sum, ratio)?;
    let expr = ExpressionGraph::new(&g, &[x, y], &[e])?;
    assert_eq!(expr.evaluate(&[1.0.into(), 2.0.into()])?, vec![Literal::Float(1.5)]);
    Ok(())
}

#[test]
fn composite_node_evaluates_like_its_body() -> Result<()> {
    let mut g = Graph::new();
    let v = floats(&mut g, &["x", "y"]);
    let (x, y) = (v[0], v[1]);
    let sum = g.add(x, y)?;
    let ratio = g.true_div(x, y)?;
    let e = g.mul(sum, ratio)?;
    let c = Composite::new(&g, &[x, y], &[e])?;
    let node = c.make_node(&mut g, &[x, y])?;
    let out = g.node(node).outputs[0];
    let expr = ExpressionGraph::new(&g, &[x, y], &[out])?;
    assert_eq!(expr.evaluate(&[1.0.into(), 2.0.into()])?, vec![Literal::Float(1.5)]);
    Ok(())
}

#[test]
fn flattens_single_output_nested_composite() -> Result<()> {
    let mut g = Graph::new();
    let v = floats(&mut g, &["x", "y", "z"]);
    let (x, y) = (v[0], v[1]);
    let sum = g.add(x, y)?;
    let c = Composite::new(&g, &[x, y], &[sum])?;

    let xy = g.mul(x, y)?;
    let out = c.call(&mut g, &[xy, y])?[0];
    let cc = Composite::new(&g, &[x, y], &[out])?;
    assert!(matches!(cc.output_op(0), Some(ScalarOp::Add)));
    assert_eq!(cc.signature(), "Composite{((i0 * i1) + i1)}");
    assert_eq!(cc.evaluate(&[2.0.into(), 3.0.into()])?, vec![Literal::Float(9.0)]);
    Ok(())
}

#[test]
fn keeps_nested_composites_feeding_several_outputs() -> Result<()> {
    let mut g = Graph::new();
    let v = floats(&mut g, &["x", "y", "z"]);
    let (x, y, z) = (v[0], v[1], v[2]);
    let sum = g.add(x, y)?;
    let c = Composite::new(&g, &[x, y], &[sum])?;

    let xy = g.mul(x, y)?;
    let xz = g.mul(x, z)?;
    let first = c.call(&mut g, &[xy, y])?[0];
    let second = c.call(&mut g, &[xz, y])?[0];
    let cc = Composite::new(&g, &[x, y, z], &[first, second])?;
    assert_eq!(cc.nout(), 2);
    assert!(matches!(cc.output_op(0), Some(ScalarOp::Composite(_))));
    assert!(matches!(cc.output_op(1), Some(ScalarOp::Composite(_))));
    assert_eq!(
        as_f64(&cc.evaluate(&[1.0.into(), 2.0.into(), 3.0.into()])?),
        vec![4.0, 5.0]
    );
    Ok(())
}

#[test]
fn keeps_nested_composite_with_shared_output() -> Result<()> {
    let mut g = Graph::new();
    let v = floats(&mut g, &["x", "y"]);
    let (x, y) = (v[0], v[1]);
    let sum = g.add(x, y)?;
    let c = Composite::new(&g, &[x, y], &[sum])?;

    let shared = c.call(&mut g, &[x, y])?[0];
    let left = g.add(shared, x)?;
    let right = g.sub(shared, y)?;
    let e = g.mul(left, right)?;
    let cc = Composite::new(&g, &[x, y], &[e])?;
    let nested = cc
        .nodes()
        .iter()
        .filter(|node| matches!(cc.graph().node(**node).op, ScalarOp::Composite(_)))
        .count();
    assert_eq!(nested, 1);
    assert_eq!(cc.evaluate(&[1.0.into(), 2.0.into()])?, vec![Literal::Float(4.0)]);
    Ok(())
}

#[test]
fn flattens_multi_level_nesting() -> Result<()> {
    let mut g = Graph::new();
    let v = floats(&mut g, &["x", "y", "z"]);
    let (x, y, z) = (v[0], v[1], v[2]);
    let sum = g.add(x, y)?;
    let inner = Composite::new(&g, &[x, y], &[sum])?;

    let called = inner.call(&mut g, &[x, y])?[0];
    let scaled = g.mul(called, y)?;
    let middle = Composite::new(&g, &[x, y], &[scaled])?;

    let called = middle.call(&mut g, &[x, z])?[0];
    let e = g.sub(called, z)?;
    let outer = Composite::new(&g, &[x, y, z], &[e])?;

    assert!(outer
        .nodes()
        .iter()
        .all(|node| !matches!(outer.graph().node(*node).op, ScalarOp::Composite(_))));
    assert_eq!(outer.signature(), "Composite{(((i0 + i2) * i2) - i2)}");
    Ok(())
}

#[test]
fn deduplicates_inputs_by_identity() -> Result<()> {
    let mut g = Graph::new();
    let v = floats(&mut g, &["x", "y"]);
    let (x, y) = (v[0], v[1]);
    let e = g.add(x, y)?;
    let c = Composite::new(&g, &[x, y, x], &[e])?;
    assert_eq!(c.nin(), 2);
    Ok(())
}

#[test]
fn missing_input_is_a_dependency_error() -> Result<()> {
    let mut g = Graph::new();
    let v = floats(&mut g, &["x", "y"]);
    let e = g.add(v[0], v[1])?;
    let err = Composite::new(&g, &[v[0]], &[e]).unwrap_err();
    assert!(matches!(err, ScalarError::Dependency(_)), "{err}");
    Ok(())
}

#[test]
fn constants_are_embedded_in_generated_code() -> Result<()> {
    let mut g = Graph::new();
    let v = floats(&mut g, &["x", "y"]);
    let (x, y) = (v[0], v[1]);
    let seventy = g.constant(70.0, None, None)?;
    let shifted = g.add(seventy, y)?;
    let ratio = g.true_div(x, y)?;
    let e = g.mul(shifted, ratio)?;
    let c = Composite::new(&g, &[x, y], &[e])?;
    let node = c.make_node(&mut g, &[x, y])?;

    let code = c.c_code(&["x", "y"], &["z"], "0")?;
    assert!(code.contains("70.0"), "constant missing from code:\n{code}");

    let out = g.node(node).outputs[0];
    let expr = ExpressionGraph::new(&g, &[x, y], &[out])?;
    assert_eq!(expr.evaluate(&[1.0.into(), 2.0.into()])?, vec![Literal::Float(36.0)]);
    Ok(())
}

#[test]
fn many_outputs_evaluate_in_order() -> Result<()> {
    let mut g = Graph::new();
    let v = floats(&mut g, &["x", "y", "z"]);
    let (x, y, z) = (v[0], v[1], v[2]);
    let xy = g.add(x, y)?;
    let e0 = g.add(xy, z)?;
    let yz = g.mul(y, z)?;
    let e1 = g.add(x, yz)?;
    let e2 = g.true_div(x, y)?;
    let c = Composite::new(&g, &[x, y, z], &[e0, e1, e2])?;
    let outs = c.call(&mut g, &[x, y, z])?;
    let expr = ExpressionGraph::new(&g, &[x, y, z], &outs)?;
    let values = expr.evaluate(&[1.0.into(), 2.0.into(), 3.0.into()])?;
    assert_eq!(as_f64(&values), vec![6.0, 7.0, 0.5]);
    Ok(())
}

#[test]
fn make_node_accepts_existing_computation() -> Result<()> {
    let mut g = Graph::new();
    let si0 = g.unnamed(ScalarType::Int8);
    let si1 = g.unnamed(ScalarType::Int8);
    let si2 = g.unnamed(ScalarType::Float32);
    let product = g.mul(si0, si1)?;
    let sout = g.true_div(product, si2)?;
    let sop = Composite::new(&g, &[si0, si1, si2], &[sout])?;

    let a = g.variable(ScalarType::Int8, "a");
    let b = g.variable(ScalarType::Int8, "b");
    let c = g.variable(ScalarType::Float32, "c");
    let d = g.variable(ScalarType::Float32, "d");
    let ad = g.mul(a, d)?;
    let node = sop.make_node(&mut g, &[ad, b, c])?;
    let ScalarOp::Composite(bound) = &g.node(node).op else {
        panic!("expected a composite node");
    };
    assert_eq!(
        bound.input_types(),
        &[ScalarType::Float32, ScalarType::Int8, ScalarType::Float32]
    );

    let out = g.node(node).outputs[0];
    let expr = ExpressionGraph::new(&g, &[a, b, c, d], &[out])?;
    let values = expr.evaluate(&[
        Literal::Signed(2),
        Literal::Signed(3),
        Literal::Float(2.0),
        Literal::Float(1.5),
    ])?;
    assert_eq!(values, vec![Literal::Float(4.5)]);
    Ok(())
}

#[test]
fn make_node_rejects_wrong_argument_count() -> Result<()> {
    let mut g = Graph::new();
    let v = floats(&mut g, &["x", "y"]);
    let e = g.add(v[0], v[1])?;
    let c = Composite::new(&g, &[v[0], v[1]], &[e])?;
    let err = c.make_node(&mut g, &[v[0]]).unwrap_err();
    assert!(matches!(err, ScalarError::Arity { found: 1, .. }), "{err}");
    Ok(())
}

#[test]
fn identical_bodies_share_cache_key() -> Result<()> {
    let build = || -> Result<Composite> {
        let mut g = Graph::new();
        let v = floats(&mut g, &["p", "q"]);
        let s = g.unary(UnaryMathOp::Exp, v[0])?;
        let e = g.mul(s, v[1])?;
        Ok(Composite::new(&g, &[v[0], v[1]], &[e])?)
    };
    let first = build()?;
    let second = build()?;
    assert_eq!(first.cache_key(), second.cache_key());
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(first, second);
    Ok(())
}

fn widened_sum(constant_type: Option<ScalarType>) -> Result<Composite> {
    let mut g = Graph::new();
    let x = g.variable(ScalarType::Int8, "x");
    let hundred = g.constant(100, constant_type, None)?;
    let two = g.constant(2.0, None, None)?;
    let sum = g.add(x, hundred)?;
    let e = g.mul(sum, two)?;
    Ok(Composite::new(&g, &[x], &[e])?)
}

#[test]
fn constant_types_separate_cache_keys() -> Result<()> {
    let narrow = widened_sum(None)?;
    let wide = widened_sum(Some(ScalarType::Int16))?;
    assert_eq!(narrow.signature(), wide.signature());
    assert_ne!(narrow.cache_key(), wide.cache_key());
    assert_ne!(narrow.fingerprint(), wide.fingerprint());
    assert_ne!(narrow, wide);

    assert_eq!(narrow.evaluate(&[Literal::Signed(100)])?, vec![Literal::Float(-112.0)]);
    assert_eq!(wide.evaluate(&[Literal::Signed(100)])?, vec![Literal::Float(400.0)]);
    Ok(())
}
