//! Point-in-element tests.
//!
//! The core algorithm treats containment as an external capability keyed by
//! cell type: [`Containment`] is the seam, [`StandardContainment`] the
//! reference implementation covering the built-in cell types with
//! tolerance-based barycentric tests. Planar cells embedded in 3D are tested
//! in their own plane with a thickness tolerance.

use crate::mesh::element::CellType;
use crate::transfer_error::TransferError;

/// Topology-specific point-in-element predicate.
pub trait Containment {
    /// Whether `point` lies inside the cell spanned by `vertices` (in the
    /// cell type's reference ordering). Boundary points count as inside.
    fn contains(
        &self,
        cell: CellType,
        vertices: &[[f64; 3]],
        point: [f64; 3],
    ) -> Result<bool, TransferError>;
}

/// Barycentric containment tests for the built-in cell types.
#[derive(Clone, Copy, Debug)]
pub struct StandardContainment {
    /// Barycentric slack: coordinates down to `-tolerance` still count.
    pub tolerance: f64,
    /// Out-of-plane thickness accepted for 1D/2D cells embedded in 3D.
    pub plane_tolerance: f64,
}

impl Default for StandardContainment {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            plane_tolerance: 1e-9,
        }
    }
}

impl Containment for StandardContainment {
    fn contains(
        &self,
        cell: CellType,
        vertices: &[[f64; 3]],
        point: [f64; 3],
    ) -> Result<bool, TransferError> {
        if vertices.len() != cell.vertex_count() {
            return Err(TransferError::VertexCountMismatch {
                cell,
                expected: cell.vertex_count(),
                got: vertices.len(),
            });
        }
        Ok(match cell {
            CellType::Segment => self.in_segment(vertices[0], vertices[1], point),
            CellType::Triangle => {
                self.in_triangle(vertices[0], vertices[1], vertices[2], point)
            }
            CellType::Quadrilateral => {
                self.in_triangle(vertices[0], vertices[1], vertices[2], point)
                    || self.in_triangle(vertices[0], vertices[2], vertices[3], point)
            }
            CellType::Tetrahedron => {
                self.in_tet(vertices[0], vertices[1], vertices[2], vertices[3], point)
            }
            CellType::Hexahedron => HEX_TETS.iter().any(|t| {
                self.in_tet(
                    vertices[t[0]],
                    vertices[t[1]],
                    vertices[t[2]],
                    vertices[t[3]],
                    point,
                )
            }),
        })
    }
}

/// Corner decomposition of a hexahedron (bottom 0-1-2-3, top 4-5-6-7) into
/// five tetrahedra.
const HEX_TETS: [[usize; 4]; 5] = [
    [0, 1, 3, 4],
    [1, 2, 3, 6],
    [1, 4, 5, 6],
    [3, 4, 6, 7],
    [1, 3, 4, 6],
];

impl StandardContainment {
    fn in_segment(&self, a: [f64; 3], b: [f64; 3], p: [f64; 3]) -> bool {
        let ab = sub(b, a);
        let len2 = dot(ab, ab);
        if len2 < f64::MIN_POSITIVE {
            return norm(sub(p, a)) <= self.plane_tolerance;
        }
        let t = dot(sub(p, a), ab) / len2;
        if t < -self.tolerance || t > 1.0 + self.tolerance {
            return false;
        }
        let closest = [a[0] + t * ab[0], a[1] + t * ab[1], a[2] + t * ab[2]];
        norm(sub(p, closest)) <= self.plane_tolerance
    }

    fn in_triangle(&self, a: [f64; 3], b: [f64; 3], c: [f64; 3], p: [f64; 3]) -> bool {
        let v0 = sub(b, a);
        let v1 = sub(c, a);
        let n = cross(v0, v1);
        let n_len = norm(n);
        if n_len < f64::MIN_POSITIVE {
            return false; // degenerate triangle
        }
        let dist = dot(sub(p, a), [n[0] / n_len, n[1] / n_len, n[2] / n_len]).abs();
        if dist > self.plane_tolerance {
            return false;
        }
        let v2 = sub(p, a);
        let d00 = dot(v0, v0);
        let d01 = dot(v0, v1);
        let d11 = dot(v1, v1);
        let d20 = dot(v2, v0);
        let d21 = dot(v2, v1);
        let denom = d00 * d11 - d01 * d01;
        if denom.abs() < f64::MIN_POSITIVE {
            return false;
        }
        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        let u = 1.0 - v - w;
        u >= -self.tolerance && v >= -self.tolerance && w >= -self.tolerance
    }

    fn in_tet(&self, a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3], p: [f64; 3]) -> bool {
        let vol = signed_volume(a, b, c, d);
        if vol.abs() < f64::MIN_POSITIVE {
            return false; // degenerate tet
        }
        let b0 = signed_volume(p, b, c, d) / vol;
        let b1 = signed_volume(a, p, c, d) / vol;
        let b2 = signed_volume(a, b, p, d) / vol;
        let b3 = signed_volume(a, b, c, p) / vol;
        [b0, b1, b2, b3].iter().all(|&w| w >= -self.tolerance)
    }
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

fn signed_volume(a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3]) -> f64 {
    dot(sub(b, a), cross(sub(c, a), sub(d, a))) / 6.0
}
