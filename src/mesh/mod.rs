//! Mesh adapter capability and element identity.

pub mod adapter;
pub mod element;

pub use adapter::{InMemoryMesh, MeshAdapter};
pub use element::{CellType, ElementId};
