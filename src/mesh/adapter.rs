//! Mesh adapter capability: how the core sees a source mesh.
//!
//! The rendezvous algorithm never touches a concrete mesh representation; it
//! iterates elements, asks for their cell type and vertex coordinates, and
//! relies on the adapter to hand out globally unique, stable element handles.
//! New mesh backends plug in by implementing [`MeshAdapter`].

use crate::geometry::bounding_box::BoundingBox;
use crate::mesh::element::{CellType, ElementId};
use crate::transfer_error::TransferError;

/// Read-only view of the locally owned part of a distributed mesh.
pub trait MeshAdapter {
    /// Locally owned element handles, in a stable order.
    fn elements(&self) -> Box<dyn Iterator<Item = ElementId> + '_>;

    /// Cell type of a locally owned element.
    fn cell_type(&self, element: ElementId) -> Result<CellType, TransferError>;

    /// Vertex coordinates of a locally owned element, in the cell type's
    /// reference ordering. Clears and fills `out`.
    fn vertices(&self, element: ElementId, out: &mut Vec<[f64; 3]>)
    -> Result<(), TransferError>;

    /// Tight box around the local elements' vertices; `None` when this rank
    /// owns no elements.
    fn local_bounding_box(&self) -> Result<Option<BoundingBox>, TransferError> {
        let mut bx: Option<BoundingBox> = None;
        let mut verts = Vec::new();
        for element in self.elements() {
            self.vertices(element, &mut verts)?;
            if let Some(elem_box) = BoundingBox::from_points(verts.iter()) {
                bx = Some(match bx {
                    Some(b) => b.union(&elem_box),
                    None => elem_box,
                });
            }
        }
        Ok(bx)
    }
}

/// Simple owning mesh for tests, examples, and small serial runs.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMesh {
    elements: Vec<(ElementId, CellType, Vec<[f64; 3]>)>,
    index: hashbrown::HashMap<ElementId, usize>,
}

impl InMemoryMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element; the handle must be globally unique across ranks.
    pub fn add_element(
        &mut self,
        element: ElementId,
        cell: CellType,
        vertices: Vec<[f64; 3]>,
    ) -> Result<(), TransferError> {
        if vertices.len() != cell.vertex_count() {
            return Err(TransferError::VertexCountMismatch {
                cell,
                expected: cell.vertex_count(),
                got: vertices.len(),
            });
        }
        self.index.insert(element, self.elements.len());
        self.elements.push((element, cell, vertices));
        Ok(())
    }

    fn slot(&self, element: ElementId) -> Result<&(ElementId, CellType, Vec<[f64; 3]>), TransferError> {
        self.index
            .get(&element)
            .map(|&i| &self.elements[i])
            .ok_or(TransferError::OrdinalNotLocal(element.get()))
    }
}

impl MeshAdapter for InMemoryMesh {
    fn elements(&self) -> Box<dyn Iterator<Item = ElementId> + '_> {
        Box::new(self.elements.iter().map(|(id, _, _)| *id))
    }

    fn cell_type(&self, element: ElementId) -> Result<CellType, TransferError> {
        self.slot(element).map(|(_, cell, _)| *cell)
    }

    fn vertices(
        &self,
        element: ElementId,
        out: &mut Vec<[f64; 3]>,
    ) -> Result<(), TransferError> {
        let (_, _, verts) = self.slot(element)?;
        out.clear();
        out.extend_from_slice(verts);
        Ok(())
    }
}
