//! `ElementId`: a strong, zero-cost handle for mesh elements.
//!
//! Every source-mesh element is identified by a globally unique, stable,
//! nonzero 64-bit handle assigned by the mesh adapter. `ElementId` wraps a
//! `NonZeroU64` so that 0 can serve as the on-wire sentinel for "no
//! containing element" without ever colliding with a real handle.

use std::{fmt, num::NonZeroU64};

use crate::transfer_error::TransferError;

/// Globally unique handle for a source-mesh element.
///
/// `repr(transparent)` over `NonZeroU64`: same ABI and alignment as a `u64`,
/// and `Option<ElementId>` is also 8 bytes.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct ElementId(NonZeroU64);

impl ElementId {
    /// Creates an `ElementId` from a raw handle; `Err` if `raw == 0`.
    #[inline]
    pub fn new(raw: u64) -> Result<Self, TransferError> {
        NonZeroU64::new(raw)
            .map(ElementId)
            .ok_or(TransferError::InvalidElementId)
    }

    /// Returns the raw handle value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }

}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementId").field(&self.get()).finish()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Cell types supported by the containment search.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CellType {
    /// 1D segment/edge.
    Segment,
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D tensor-product cell (hex).
    Hexahedron,
}

impl CellType {
    /// Topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Segment => 1,
            CellType::Triangle | CellType::Quadrilateral => 2,
            CellType::Tetrahedron | CellType::Hexahedron => 3,
        }
    }

    /// Number of vertices the cell carries.
    pub fn vertex_count(self) -> usize {
        match self {
            CellType::Segment => 2,
            CellType::Triangle => 3,
            CellType::Quadrilateral => 4,
            CellType::Tetrahedron => 4,
            CellType::Hexahedron => 8,
        }
    }

    /// Stable numeric tag used on the wire.
    pub fn wire_kind(self) -> u32 {
        match self {
            CellType::Segment => 1,
            CellType::Triangle => 2,
            CellType::Quadrilateral => 3,
            CellType::Tetrahedron => 4,
            CellType::Hexahedron => 5,
        }
    }

    /// Decodes a wire tag back into a cell type.
    pub fn from_wire_kind(kind: u32) -> Result<Self, TransferError> {
        match kind {
            1 => Ok(CellType::Segment),
            2 => Ok(CellType::Triangle),
            3 => Ok(CellType::Quadrilateral),
            4 => Ok(CellType::Tetrahedron),
            5 => Ok(CellType::Hexahedron),
            other => Err(TransferError::UnknownCellKind(other)),
        }
    }
}
