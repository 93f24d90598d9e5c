//! Rendezvous decomposition: box-confined repartition plus point location.

pub mod decomposition;
pub mod spatial_index;

pub use decomposition::RendezvousDecomposition;
pub use spatial_index::SpatialIndex;
