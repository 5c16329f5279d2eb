mod dtype;
mod literal;

pub use dtype::{promote, upcast, upgrade_to_float, ScalarType};
pub(crate) use literal::format_c_float;
pub use literal::Literal;
