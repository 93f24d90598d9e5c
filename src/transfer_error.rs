//! TransferError: unified error type for mesh-rendezvous public APIs.
//!
//! All public entry points return `Result<_, TransferError>`; the library never
//! panics on user input. Collective call sites report failures locally — a
//! failure on one rank is not propagated to its peers (see crate docs).

use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for mesh-rendezvous operations.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The global source and target bounding boxes do not intersect; no
    /// transfer is possible. Recoverable by adjusting the domains.
    #[error("source and target geometry domains do not intersect")]
    DomainMismatch,
    /// A point-to-point exchange with a neighbor rank failed.
    #[error("communication with rank {neighbor} failed: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A received message did not have the expected byte length.
    #[error("buffer size mismatch from rank {neighbor}: expected {expected} bytes, got {got}")]
    BufferSizeMismatch {
        neighbor: usize,
        expected: usize,
        got: usize,
    },
    /// A destination rank is outside `0..size`.
    #[error("destination rank {rank} out of range (communicator size {size})")]
    RankOutOfRange { rank: usize, size: usize },
    /// A send/receive buffer passed to a plan or exporter has the wrong length.
    #[error("payload length mismatch: expected {expected} items, got {got}")]
    PayloadSizeMismatch { expected: usize, got: usize },
    /// `apply()` precondition: target buffer length must equal the import
    /// map's local count times the field dimension.
    #[error("target field has {got} entries but the import map requires {expected}")]
    TargetSizeMismatch { expected: usize, got: usize },
    /// The field evaluator returned a buffer of unexpected length.
    #[error("evaluator returned {got} values, expected {expected}")]
    EvaluatorSizeMismatch { expected: usize, got: usize },
    /// `missed_target_points()` was called without enabling tracking.
    #[error("missed-point tracking is disabled; construct with keep_missed_points = true")]
    MissedPointsUnavailable,
    /// `apply()` or an accessor was called before a successful `setup()`.
    #[error("shared domain map is unconfigured; call setup() first")]
    Unconfigured,
    /// An ordinal arrived that the local map does not hold.
    #[error("ordinal {0} is not held by the local map")]
    OrdinalNotLocal(u64),
    /// An element handle of 0 appeared where a valid handle was required.
    #[error("element handle must be non-zero (0 is reserved as the no-match sentinel)")]
    InvalidElementId,
    /// A cell kind tag on the wire did not decode to a known cell type.
    #[error("unknown cell kind {0} on the wire")]
    UnknownCellKind(u32),
    /// A cell has the wrong number of vertices for its type.
    #[error("cell {cell:?} expects {expected} vertices, got {got}")]
    VertexCountMismatch {
        cell: crate::mesh::element::CellType,
        expected: usize,
        got: usize,
    },
    /// Internal invariant broken while building a map or exporter. This is a
    /// library defect, not a user error.
    #[error("postcondition violation: {0}")]
    PostconditionViolation(&'static str),
}
