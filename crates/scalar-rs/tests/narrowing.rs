use anyhow::Result;
use scalar_rs::ops::UnaryMathOp;
use scalar_rs::{Composite, Graph, Literal, ScalarOp, ScalarType};

fn mixed_precision() -> Result<Composite> {
    let mut g = Graph::new();
    let w = g.unnamed(ScalarType::Int8);
    let x = g.unnamed(ScalarType::Float16);
    let y = g.unnamed(ScalarType::Float32);

    let cy = g.cast(y, ScalarType::Float16)?;
    let sum = g.add(x, cy)?;
    let t = g.unary(UnaryMathOp::Tanh, sum)?;
    let cz = Composite::new(&g, &[x, y], &[t])?;

    let a = cz.call(&mut g, &[x, y])?[0];
    let b = cz.call(&mut g, &[x, y])?[0];
    let two = g.constant(2, None, None)?;
    let b2 = g.pow(b, two)?;
    let d = g.sub(a, b2)?;
    let x16 = g.cast(x, ScalarType::Int16)?;
    let e1 = g.add(d, x16)?;
    let x32 = g.cast(x, ScalarType::Float32)?;
    let e2 = g.add(e1, x32)?;
    let w16 = g.cast(w, ScalarType::Float16)?;
    let e3 = g.add(e2, w16)?;
    let one = g.constant(1.0, Some(ScalarType::Float16), None)?;
    let e4 = g.sub(e3, one)?;
    Ok(Composite::new(&g, &[w, x, y], &[e4])?)
}

#[test]
fn clone_float32_removes_float16() -> Result<()> {
    let c = mixed_precision()?;
    assert!(c.has_float16());
    let narrowed = c.clone_float32()?;
    assert!(!narrowed.has_float16());
    assert_eq!(
        narrowed.input_types(),
        &[ScalarType::Int8, ScalarType::Float32, ScalarType::Float32]
    );
    assert_eq!(narrowed.output_types(), &[ScalarType::Float32]);
    assert!(!narrowed.signature().contains("float16"));
    Ok(())
}

#[test]
fn clone_float32_is_idempotent() -> Result<()> {
    let narrowed = mixed_precision()?.clone_float32()?;
    let again = narrowed.clone_float32()?;
    assert_eq!(again.cache_key(), narrowed.cache_key());
    Ok(())
}

#[test]
fn clone_float32_stays_close_to_float16_result() -> Result<()> {
    let c = mixed_precision()?;
    let narrowed = c.clone_float32()?;
    let args = [Literal::Signed(1), Literal::Float(0.5), Literal::Float(0.25)];
    let wide = narrowed.evaluate(&args)?[0].real();
    let half = c.evaluate(&args)?[0].real();
    assert!((wide - half).abs() < 1e-2, "{wide} vs {half}");
    Ok(())
}

#[test]
fn clone_float32_narrows_switch_operands() -> Result<()> {
    let mut g = Graph::new();
    let v = g.unnamed(ScalarType::UInt8);
    let w = g.unnamed(ScalarType::Float16);
    let x = g.unnamed(ScalarType::Float16);
    let y = g.unnamed(ScalarType::Float16);
    let z = g.unnamed(ScalarType::Float16);
    let product = g.mul_many(&[w, x, y])?;
    let picked = g.switch(v, product, z)?;
    let c = Composite::new(&g, &[v, w, x, y, z], &[picked])?;
    assert!(c.has_float16());

    let narrowed = c.clone_float32()?;
    assert!(!narrowed.has_float16());
    assert_eq!(narrowed.output_types(), &[ScalarType::Float32]);
    Ok(())
}

#[test]
fn clone_float32_recurses_into_opaque_composites() -> Result<()> {
    let mut g = Graph::new();
    let x = g.unnamed(ScalarType::Float16);
    let y = g.unnamed(ScalarType::Float16);
    let sum = g.add(x, y)?;
    let product = g.mul(x, y)?;
    let inner = Composite::new(&g, &[x, y], &[sum, product])?;

    let outs = inner.call(&mut g, &[x, y])?;
    let outer = Composite::new(&g, &[x, y], &outs)?;
    assert!(matches!(outer.output_op(0), Some(ScalarOp::Composite(_))));
    assert!(outer.has_float16());

    let narrowed = outer.clone_float32()?;
    assert!(!narrowed.has_float16());
    let Some(ScalarOp::Composite(nested)) = narrowed.output_op(0) else {
        panic!("nested composite should survive narrowing");
    };
    assert_eq!(nested.input_types(), &[ScalarType::Float32, ScalarType::Float32]);
    Ok(())
}

#[test]
fn float32_composites_are_unchanged() -> Result<()> {
    let mut g = Graph::new();
    let x = g.unnamed(ScalarType::Float32);
    let e = g.unary(UnaryMathOp::Exp, x)?;
    let c = Composite::new(&g, &[x], &[e])?;
    assert_eq!(c.clone_float32()?.cache_key(), c.cache_key());
    Ok(())
}
