//! Field evaluator capability.
//!
//! The consumer supplies the physics: given a source element and a point
//! inside it, produce the field value(s) there. The core treats the
//! evaluator as a pure function and only ever calls it on (element, point)
//! pairs this rank owns under the export map.

use crate::mesh::element::ElementId;
use crate::transfer_error::TransferError;

/// Computes field values at points inside locally owned source elements.
pub trait FieldEvaluator {
    /// Number of field components per point.
    fn dim(&self) -> usize;

    /// Evaluate at every (element, coordinate) pair. Returns
    /// `elements.len() * dim()` values, point-major: all components of point
    /// 0, then point 1, and so on. May be arbitrarily expensive; it runs
    /// once per `apply()` with no communication.
    fn evaluate(
        &self,
        elements: &[ElementId],
        coords: &[[f64; 3]],
    ) -> Result<Vec<f64>, TransferError>;
}

/// Scalar evaluator from a plain closure, mostly for tests and quick runs.
pub struct ScalarClosureEvaluator<F>(pub F);

impl<F> FieldEvaluator for ScalarClosureEvaluator<F>
where
    F: Fn(ElementId, [f64; 3]) -> f64 + Send + Sync,
{
    fn dim(&self) -> usize {
        1
    }

    fn evaluate(
        &self,
        elements: &[ElementId],
        coords: &[[f64; 3]],
    ) -> Result<Vec<f64>, TransferError> {
        Ok(elements
            .iter()
            .zip(coords)
            .map(|(&e, &p)| (self.0)(e, p))
            .collect())
    }
}
