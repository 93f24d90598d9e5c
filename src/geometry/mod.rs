//! Geometry utilities: bounding boxes and point-in-element tests.

pub mod bounding_box;
pub mod containment;

pub use bounding_box::BoundingBox;
