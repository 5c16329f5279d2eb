use anyhow::Result;
use scalar_rs::{CompareOp, ExpressionGraph, Graph, Literal, ScalarType, ValueId};

fn eval2(g: &Graph, inputs: &[ValueId], out: ValueId, args: [Literal; 2]) -> Result<Literal> {
    let expr = ExpressionGraph::new(g, inputs, &[out])?;
    Ok(expr.evaluate(&args)?[0])
}

#[test]
fn comparisons_follow_operands() -> Result<()> {
    let cases = [(3.0, 9.0), (3.0, 0.9), (3.0, 3.0)];
    let ops: [(CompareOp, fn(f64, f64) -> bool); 6] = [
        (CompareOp::Gt, |a, b| a > b),
        (CompareOp::Lt, |a, b| a < b),
        (CompareOp::Le, |a, b| a <= b),
        (CompareOp::Ge, |a, b| a >= b),
        (CompareOp::Eq, |a, b| a == b),
        (CompareOp::Neq, |a, b| a != b),
    ];
    for (op, reference) in ops {
        let mut g = Graph::new();
        let v = g.variables(ScalarType::Float64, &["x", "y"]);
        let out = g.compare(op, v[0], v[1])?;
        assert_eq!(g.value_type(out), ScalarType::Bool);
        for (a, b) in cases {
            let got = eval2(&g, &v, out, [a.into(), b.into()])?;
            assert_eq!(got, Literal::Bool(reference(a, b)), "{op:?} on ({a}, {b})");
        }
    }
    Ok(())
}

#[test]
fn mixed_type_comparison_uses_common_type() -> Result<()> {
    let mut g = Graph::new();
    let i = g.variable(ScalarType::Int8, "i");
    let f = g.variable(ScalarType::Float32, "f");
    let out = g.lt(i, f)?;
    let got = eval2(&g, &[i, f], out, [Literal::Signed(3), Literal::Float(3.5)])?;
    assert_eq!(got, Literal::Bool(true));
    Ok(())
}

#[test]
fn bitwise_ops_on_integers() -> Result<()> {
    let mut g = Graph::new();
    let v = g.variables(ScalarType::Int64, &["x", "y"]);
    let and = g.and(v[0], v[1])?;
    let or = g.or(v[0], v[1])?;
    let xor = g.xor(v[0], v[1])?;
    let inv = g.invert(v[0])?;
    let expr = ExpressionGraph::new(&g, &v, &[and, or, xor, inv])?;
    for (a, b) in [(0i64, 1i64), (0, 0), (1, 0), (1, 1)] {
        let values = expr.evaluate(&[Literal::Signed(a), Literal::Signed(b)])?;
        assert_eq!(
            values,
            vec![
                Literal::Signed(a & b),
                Literal::Signed(a | b),
                Literal::Signed(a ^ b),
                Literal::Signed(!a),
            ],
            "({a}, {b})"
        );
    }
    Ok(())
}

#[test]
fn bitwise_ops_on_bools_are_logical() -> Result<()> {
    let mut g = Graph::new();
    let v = g.variables(ScalarType::Bool, &["p", "q"]);
    let and = g.and(v[0], v[1])?;
    let xor = g.xor(v[0], v[1])?;
    let inv = g.invert(v[0])?;
    assert_eq!(g.value_type(inv), ScalarType::Bool);
    let expr = ExpressionGraph::new(&g, &v, &[and, xor, inv])?;
    let values = expr.evaluate(&[Literal::Bool(true), Literal::Bool(false)])?;
    assert_eq!(
        values,
        vec![Literal::Bool(false), Literal::Bool(true), Literal::Bool(false)]
    );
    Ok(())
}

#[test]
fn bitwise_on_floats_is_a_type_error() -> Result<()> {
    let mut g = Graph::new();
    let v = g.variables(ScalarType::Float64, &["x", "y"]);
    assert!(g.and(v[0], v[1]).is_err());
    Ok(())
}
