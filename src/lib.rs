//! # mesh-rendezvous
//!
//! mesh-rendezvous performs decomposition-independent transfer of field data
//! between two arbitrarily partitioned, distributed meshes/point-sets running
//! across the same set of parallel processes. The source mesh and the target
//! point set do not need to share a domain decomposition: for every target
//! point, the crate finds the source element that geometrically contains it —
//! wherever that element lives — and freezes a reusable communication plan so
//! repeated field evaluations move cheaply after the one-time search.
//!
//! ## How it works
//! [`map::SharedDomainMap::setup`] intersects the global bounding boxes of
//! both domains, builds a temporary search-optimized repartition of the
//! source mesh over the shared box (the *rendezvous decomposition*), locates
//! target points against it, inverts the correspondence back onto the true
//! source decomposition, and caches an export plan keyed by globally unique
//! point ordinals. [`map::SharedDomainMap::apply`] then only evaluates the
//! user's field locally and runs the cached plan.
//!
//! ## Parallel model
//! SPMD: one thread of control per process, cooperation only through
//! collective operations. Every setup/apply call, map construction, and plan
//! execution is collective — all ranks must call in the same order or the
//! program deadlocks. Backends: [`algs::communicator::NoComm`] (serial),
//! [`algs::communicator::RayonComm`] (in-process multi-rank, used by the
//! tests), and `MpiComm` with the `mpi-support` feature.
//!
//! ## Usage
//! Add `mesh-rendezvous` as a dependency and enable features as needed:
//!
//! ```toml
//! [dependencies]
//! mesh-rendezvous = "0.1"
//! # features = ["mpi-support"]
//! ```

// Re-export our major subsystems:
pub mod algs;
pub mod field;
pub mod geometry;
pub mod map;
pub mod mesh;
pub mod rendezvous;
pub mod transfer_error;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{CommTag, Communicator, NoComm, RayonComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::distributor::CommunicationPlan;
    pub use crate::field::evaluator::{FieldEvaluator, ScalarClosureEvaluator};
    pub use crate::geometry::bounding_box::BoundingBox;
    pub use crate::geometry::containment::{Containment, StandardContainment};
    pub use crate::map::exporter::Exporter;
    pub use crate::map::global_map::{GlobalMap, GlobalOrdinal};
    pub use crate::map::shared_domain::SharedDomainMap;
    pub use crate::mesh::adapter::{InMemoryMesh, MeshAdapter};
    pub use crate::mesh::element::{CellType, ElementId};
    pub use crate::rendezvous::decomposition::RendezvousDecomposition;
    pub use crate::transfer_error::TransferError;
}
