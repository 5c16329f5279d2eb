use anyhow::Result;
use scalar_rs::codegen::emit;
use scalar_rs::{Composite, ExpressionGraph, Graph, Literal, ScalarError, ScalarType};

#[test]
fn emits_temporaries_then_outputs() -> Result<()> {
    let mut g = Graph::new();
    let v = g.variables(ScalarType::Float64, &["x", "y"]);
    let e = g.add(v[0], v[1])?;
    let c = Composite::new(&g, &v, &[e])?;
    let code = c.c_code(&["a", "b"], &["z"], "3")?;
    assert_eq!(code, "double V3_tmp0;\nV3_tmp0 = a + b;\nz = V3_tmp0;");
    assert_eq!(emit(&c, &["a", "b"], &["z"], "3")?, code);
    Ok(())
}

#[test]
fn emission_is_deterministic() -> Result<()> {
    let mut g = Graph::new();
    let v = g.variables(ScalarType::Float32, &["x", "y", "z"]);
    let s = g.mul(v[0], v[1])?;
    let cond = g.gt(s, v[2])?;
    let picked = g.switch(cond, s, v[2])?;
    let c = Composite::new(&g, &v, &[picked, s])?;
    let first = c.c_code(&["x", "y", "z"], &["o0", "o1"], "0")?;
    let second = c.c_code(&["x", "y", "z"], &["o0", "o1"], "0")?;
    assert_eq!(first, second);
    assert!(first.contains("o0 = V0_tmp2;"), "{first}");
    assert!(first.contains("o1 = V0_tmp0;"), "{first}");
    Ok(())
}

#[test]
fn single_precision_constants_get_suffix() -> Result<()> {
    let mut g = Graph::new();
    let x = g.variable(ScalarType::Float32, "x");
    let half = g.constant(0.5, Some(ScalarType::Float32), None)?;
    let e = g.mul(x, half)?;
    let c = Composite::new(&g, &[x], &[e])?;
    let code = c.c_code(&["x"], &["z"], "0")?;
    assert!(code.contains("0.5f"), "{code}");
    assert!(code.starts_with("float V0_tmp0;"), "{code}");
    Ok(())
}

#[test]
fn wrong_name_counts_are_rejected() -> Result<()> {
    let mut g = Graph::new();
    let v = g.variables(ScalarType::Float64, &["x", "y"]);
    let e = g.add(v[0], v[1])?;
    let c = Composite::new(&g, &v, &[e])?;
    let err = c.c_code(&["a"], &["z"], "0").expect_err("one input name is missing");
    assert!(matches!(err, ScalarError::Arity { found: 1, .. }), "{err}");
    assert!(c.c_code(&["a", "b"], &[], "0").is_err());
    Ok(())
}

#[test]
fn float16_bodies_cannot_be_emitted_directly() -> Result<()> {
    let mut g = Graph::new();
    let x = g.variable(ScalarType::Float16, "x");
    let e = g.neg(x)?;
    let c = Composite::new(&g, &[x], &[e])?;
    let err = c.c_code(&["x"], &["z"], "0").expect_err("float16 has no C type");
    assert!(matches!(err, ScalarError::Type(_)), "{err}");
    assert!(c.clone_float32()?.c_code(&["x"], &["z"], "0").is_ok());
    Ok(())
}

#[test]
fn nested_composites_become_blocks() -> Result<()> {
    let mut g = Graph::new();
    let v = g.variables(ScalarType::Float64, &["x", "y"]);
    let sum = g.add(v[0], v[1])?;
    let product = g.mul(v[0], v[1])?;
    let inner = Composite::new(&g, &v, &[sum, product])?;
    let outs = inner.call(&mut g, &v)?;
    let outer = Composite::new(&g, &v, &outs)?;

    let code = outer.c_code(&["x", "y"], &["p", "q"], "0")?;
    assert!(code.contains("{\n"), "{code}");
    assert!(code.contains("    double V0_0_tmp0;"), "{code}");
    assert!(code.contains("V0_tmp0 = V0_0_tmp0;"), "{code}");
    assert!(code.ends_with("p = V0_tmp0;\nq = V0_tmp1;"), "{code}");
    Ok(())
}

#[test]
fn negative_integer_powers_agree_with_emitted_c() -> Result<()> {
    let mut g = Graph::new();
    let v = g.variables(ScalarType::Int32, &["b", "e"]);
    let p = g.pow(v[0], v[1])?;
    let expr = ExpressionGraph::new(&g, &v, &[p])?;
    for (base, exp, expected) in [(-1, -3, -1), (-1, -2, 1), (1, -5, 1), (2, -1, 0), (0, -2, 0), (3, 3, 27)] {
        let got = expr.evaluate(&[Literal::Signed(base), Literal::Signed(exp)])?;
        assert_eq!(got, vec![Literal::Signed(expected)], "{base} ** {exp}");
    }

    let c = Composite::new(&g, &v, &[p])?;
    let code = c.c_code(&["b", "e"], &["z"], "0")?;
    assert!(code.contains("if (V0_0_exp < 0) {"), "{code}");
    assert!(
        code.contains("V0_0_acc = (V0_0_base == 1) ? 1 : (V0_0_base == -1) ? ((V0_0_exp & 1) ? -1 : 1) : 0;"),
        "{code}"
    );

    let mut g = Graph::new();
    let v = g.variables(ScalarType::UInt16, &["b", "e"]);
    let p = g.pow(v[0], v[1])?;
    let code = Composite::new(&g, &v, &[p])?.c_code(&["b", "e"], &["z"], "0")?;
    assert!(code.contains("uint64_t V0_0_exp = (uint64_t)e;"), "{code}");
    assert!(!code.contains("V0_0_exp < 0"), "{code}");
    Ok(())
}
