//! The rendezvous decomposition: a temporary, search-optimized repartition of
//! the source mesh confined to the shared domain box.
//!
//! The shared box is tiled into one region per rank by recursive bisection.
//! The tiling is computed identically (and without communication) on every
//! rank, so any rank can route a point to its rendezvous owner locally.
//! Source elements are then pushed to every region their bounding box
//! intersects — an element straddling a cut is replicated, which guarantees
//! that whichever region a contained point routes to also holds the element.
//! A BVH over the received elements serves the exact search.
//!
//! Built fresh on every `setup()`; never persisted.

use log::debug;

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::distributor::CommunicationPlan;
use crate::algs::wire::WireElement;
use crate::geometry::bounding_box::BoundingBox;
use crate::geometry::containment::Containment;
use crate::mesh::adapter::MeshAdapter;
use crate::mesh::element::{CellType, ElementId};
use crate::rendezvous::spatial_index::SpatialIndex;
use crate::transfer_error::TransferError;

/// One repartitioned element held by this rendezvous rank.
#[derive(Clone, Debug)]
struct RendezvousElement {
    handle: ElementId,
    cell: CellType,
    vertices: Vec<[f64; 3]>,
}

/// Search-side view of the source mesh, confined to the shared box.
#[derive(Debug)]
pub struct RendezvousDecomposition {
    regions: Vec<BoundingBox>,
    elements: Vec<RendezvousElement>,
    index: SpatialIndex,
}

impl RendezvousDecomposition {
    /// Collective. Repartitions `mesh`'s elements over the tiling of
    /// `shared_box` and builds the local search structure. Consumes two
    /// consecutive tags starting at `tag`.
    pub fn build<C, M>(
        comm: &C,
        tag: CommTag,
        mesh: &M,
        shared_box: BoundingBox,
    ) -> Result<Self, TransferError>
    where
        C: Communicator,
        M: MeshAdapter,
    {
        let regions = tile_box(shared_box, comm.size());

        // One plan item per (element, intersecting region) pair.
        let mut destinations = Vec::new();
        let mut payload = Vec::new();
        let mut verts = Vec::new();
        for element in mesh.elements() {
            mesh.vertices(element, &mut verts)?;
            let elem_box = match BoundingBox::from_points(verts.iter()) {
                Some(b) => b,
                None => continue,
            };
            if !elem_box.intersects(&shared_box) {
                continue;
            }
            let cell = mesh.cell_type(element)?;
            let record = WireElement::new(element.get(), cell.wire_kind(), &verts);
            for (region, region_box) in regions.iter().enumerate() {
                if elem_box.intersects(region_box) {
                    destinations.push(region);
                    payload.push(record);
                }
            }
        }

        let plan = CommunicationPlan::from_sends(comm, tag, &destinations)?;
        let mut received: Vec<WireElement> =
            vec![bytemuck::Zeroable::zeroed(); plan.total_receives()];
        plan.posts_and_waits(comm, tag.offset(1), &payload, 1, &mut received)?;

        let mut elements = Vec::with_capacity(received.len());
        let mut boxes = Vec::with_capacity(received.len());
        for record in &received {
            let handle = ElementId::new(record.handle())?;
            let cell = CellType::from_wire_kind(record.kind())?;
            let vertices = record.vertices();
            let bbox = BoundingBox::from_points(vertices.iter())
                .ok_or(TransferError::PostconditionViolation("element without vertices on the wire"))?;
            elements.push(RendezvousElement {
                handle,
                cell,
                vertices,
            });
            boxes.push(bbox);
        }
        debug!(
            "rendezvous on rank {}: {} element copies in region {:?}..{:?}",
            comm.rank(),
            elements.len(),
            regions[comm.rank()].min,
            regions[comm.rank()].max,
        );

        let index = SpatialIndex::build(&boxes);
        Ok(Self {
            regions,
            elements,
            index,
        })
    }

    /// Coarse routing: which rendezvous rank would be queried for a
    /// containing element. `None` only for points outside the shared box.
    /// Points on an internal cut route to the lowest intersecting region.
    /// A point may legitimately route to a rank whose elements do not
    /// contain it; the exact search discards non-matches.
    pub fn region_of_point(&self, p: [f64; 3]) -> Option<usize> {
        self.regions.iter().position(|r| r.contains(p))
    }

    /// Exact search against the local partition. One entry per input point;
    /// `None` means no local element contains the point (a normal outcome:
    /// mesh gaps, degenerate geometry, or coarse-routing misdirection).
    /// Among multiple containing elements the smallest handle wins, so the
    /// result is independent of arrival order.
    pub fn elements_containing_points<G: Containment>(
        &self,
        coords: &[[f64; 3]],
        containment: &G,
    ) -> Result<Vec<Option<ElementId>>, TransferError> {
        let mut out = Vec::with_capacity(coords.len());
        for &p in coords {
            let mut best: Option<ElementId> = None;
            for i in self.index.candidates(p) {
                let e = &self.elements[i];
                if containment.contains(e.cell, &e.vertices, p)? {
                    best = Some(match best {
                        Some(b) => b.min(e.handle),
                        None => e.handle,
                    });
                }
            }
            out.push(best);
        }
        Ok(out)
    }
}

/// Tile `bx` into `n` boxes by recursive bisection of the longest axis,
/// weighted so each leaf covers an equal fraction. Leaves share faces and
/// exactly cover `bx`.
fn tile_box(bx: BoundingBox, n: usize) -> Vec<BoundingBox> {
    if n <= 1 {
        return vec![bx];
    }
    let axis = bx.longest_axis();
    let left_n = n / 2;
    let right_n = n - left_n;
    let cut =
        bx.min[axis] + (bx.max[axis] - bx.min[axis]) * (left_n as f64) / (n as f64);
    let mut left = bx;
    left.max[axis] = cut;
    let mut right = bx;
    right.min[axis] = cut;
    let mut out = tile_box(left, left_n);
    out.extend(tile_box(right, right_n));
    out
}
