//! Field evaluation capability.

pub mod evaluator;

pub use evaluator::{FieldEvaluator, ScalarClosureEvaluator};
