use std::env;

use crate::scalar::ScalarType;

const FLOATX_VAR: &str = "SCALARRS_FLOATX";

fn parse_float_x(value: &str) -> Option<ScalarType> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "float16" | "f16" | "half" => Some(ScalarType::Float16),
        "float32" | "f32" | "single" => Some(ScalarType::Float32),
        "float64" | "f64" | "double" => Some(ScalarType::Float64),
        _ => None,
    }
}

/// Reads the default floating precision requested through `SCALARRS_FLOATX`.
pub(crate) fn float_x_override() -> Option<ScalarType> {
    match env::var(FLOATX_VAR) {
        Ok(value) if !value.trim().is_empty() => parse_float_x(&value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_float_names_case_insensitively() {
        assert_eq!(parse_float_x(" Float32 "), Some(ScalarType::Float32));
        assert_eq!(parse_float_x("f16"), Some(ScalarType::Float16));
        assert_eq!(parse_float_x("DOUBLE"), Some(ScalarType::Float64));
    }

    #[test]
    fn rejects_non_float_names() {
        assert_eq!(parse_float_x("int32"), None);
        assert_eq!(parse_float_x(""), None);
    }
}
