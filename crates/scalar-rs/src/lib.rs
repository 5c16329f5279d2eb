//! Scalar expression graphs with composite fusion.
//!
//! Front ends build a [`Graph`] of typed scalar operations, fuse elementwise
//! chains into a [`Composite`], optionally narrow float16 arithmetic to
//! float32, and hand the composite to [`codegen::emit`] to obtain a
//! straight-line C body.

pub mod codegen;
pub mod composite;
pub mod config;
mod env;
pub mod error;
pub mod gradient;
pub mod graph;
pub mod hashing;
pub mod ops;
pub mod scalar;

pub use composite::Composite;
pub use config::ScalarConfig;
pub use error::{ScalarError, ScalarResult};
pub use graph::{ExpressionGraph, Graph, NodeId, ValueId};
pub use ops::{BitwiseOp, CompareOp, ScalarOp, UnaryMathOp};
pub use scalar::{promote, upcast, upgrade_to_float, Literal, ScalarType};
