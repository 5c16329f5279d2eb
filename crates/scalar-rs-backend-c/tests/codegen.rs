use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use scalar_rs::{Composite, Graph, ScalarType};
use scalar_rs_backend_c::{CCompositeTarget, KernelCache};

fn shifted_int8(constant_type: Option<ScalarType>) -> Result<Composite> {
    let mut g = Graph::new();
    let x = g.variable(ScalarType::Int8, "x");
    let hundred = g.constant(100, constant_type, None)?;
    let two = g.constant(2.0, None, None)?;
    let sum = g.add(x, hundred)?;
    let e = g.mul(sum, two)?;
    Ok(Composite::new(&g, &[x], &[e])?)
}

fn scaled_ratio() -> Result<Composite> {
    let mut g = Graph::new();
    let v = g.variables(ScalarType::Float64, &["x", "y"]);
    let seventy = g.constant(70.0, None, None)?;
    let shifted = g.add(seventy, v[1])?;
    let ratio = g.true_div(v[0], v[1])?;
    let e = g.mul(shifted, ratio)?;
    Ok(Composite::new(&g, &v, &[e])?)
}

#[test]
fn symbol_is_derived_from_fingerprint() -> Result<()> {
    let composite = scaled_ratio()?;
    let target = CCompositeTarget::new();
    let module = target.convert(&composite)?;
    assert_eq!(module.symbol, format!("composite__{:016x}", composite.fingerprint()));
    assert_eq!(module.symbol.len(), "composite__".len() + 16);
    assert_eq!(target.name(), "c");
    Ok(())
}

#[test]
fn module_defines_entrypoint() -> Result<()> {
    let composite = scaled_ratio()?;
    let module = CCompositeTarget::new().convert(&composite)?;
    let signature = format!("void {}(double i0, double i1, double* o0) {{", module.symbol);
    assert!(module.source.contains(&signature), "{}", module.source);
    assert!(module.source.starts_with("#include <stdint.h>\n#include <math.h>\n"));
    assert!(!module.source.contains("complex.h"));
    assert!(module.source.contains("70.0"), "{}", module.source);
    assert!(module.source.contains("  (*o0) = V0_tmp2;"), "{}", module.source);
    assert!(module.source.trim_end().ends_with('}'));
    Ok(())
}

#[test]
fn float16_composites_are_narrowed() -> Result<()> {
    let mut g = Graph::new();
    let x = g.variable(ScalarType::Float16, "x");
    let e = g.neg(x)?;
    let composite = Composite::new(&g, &[x], &[e])?;
    let module = CCompositeTarget::new().convert(&composite)?;
    assert!(module.source.contains("float i0"), "{}", module.source);
    assert!(module.source.contains("float* o0"), "{}", module.source);
    Ok(())
}

#[test]
fn complex_composites_include_complex_header() -> Result<()> {
    let mut g = Graph::new();
    let x = g.variable(ScalarType::Complex128, "x");
    let e = g.add(x, x)?;
    let composite = Composite::new(&g, &[x], &[e])?;
    let module = CCompositeTarget::new().convert(&composite)?;
    assert!(module.source.contains("#include <complex.h>"));
    assert!(module.source.contains("double _Complex i0"));
    Ok(())
}

#[test]
fn unsupported_operations_surface_as_codegen_errors() -> Result<()> {
    let mut g = Graph::new();
    let x = g.variable(ScalarType::Complex64, "x");
    let y = g.variable(ScalarType::Int32, "y");
    let e = g.modulo(x, y)?;
    let composite = Composite::new(&g, &[x, y], &[e])?;
    let err = CCompositeTarget::new()
        .convert(&composite)
        .expect_err("complex modulo has no C lowering");
    assert!(err.message().contains("mod"), "{err}");
    Ok(())
}

#[test]
fn prefix_is_sanitized() -> Result<()> {
    let composite = scaled_ratio()?;
    let target = CCompositeTarget::with_prefix("my-kernel");
    assert!(target.entrypoint_name(&composite).starts_with("my_kernel__"));
    Ok(())
}

#[test]
fn cache_builds_each_structure_once() -> Result<()> {
    let cache = KernelCache::new();
    let target = CCompositeTarget::new();
    let builds = AtomicUsize::new(0);
    let build = |composite: &Composite| {
        builds.fetch_add(1, Ordering::SeqCst);
        target.convert(composite)
    };

    let first = cache.get_or_convert(&scaled_ratio()?, build)?;
    let second = cache.get_or_convert(&scaled_ratio()?, build)?;
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[test]
fn cache_separates_bodies_differing_in_constant_type() -> Result<()> {
    let cache = KernelCache::new();
    let target = CCompositeTarget::new();
    let build = |composite: &Composite| target.convert(composite);

    let narrow = cache.get_or_convert(&shifted_int8(None)?, build)?;
    let wide = cache.get_or_convert(&shifted_int8(Some(ScalarType::Int16))?, build)?;
    assert_ne!(narrow.symbol, wide.symbol);
    assert!(narrow.source.contains("int8_t V0_tmp0;"), "{}", narrow.source);
    assert!(wide.source.contains("int16_t V0_tmp0;"), "{}", wide.source);
    assert_eq!(cache.len(), 2);
    Ok(())
}
