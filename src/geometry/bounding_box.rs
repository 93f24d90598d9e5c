//! Axis-aligned bounding boxes and their global (all-rank) reduction.
//!
//! `BoundingBox` is a pure value type: built once by reduction over local
//! geometry, never mutated afterwards. The intersection of the source mesh's
//! and the target points' global boxes is the *shared domain box* — the only
//! region where transfer is possible.

use crate::algs::collective::allgather_bytes;
use crate::algs::communicator::{CommTag, Communicator};
use crate::transfer_error::TransferError;

/// Closed axis-aligned box `[min_d, max_d]` per axis.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    /// Box spanning the given corners. Invariant `min[d] <= max[d]` is the
    /// caller's responsibility; reductions below always produce valid boxes.
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// Tight box around a point set; `None` for an empty set.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [f64; 3]>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bx = BoundingBox::new(first, first);
        for p in iter {
            for d in 0..3 {
                bx.min[d] = bx.min[d].min(p[d]);
                bx.max[d] = bx.max[d].max(p[d]);
            }
        }
        Some(bx)
    }

    /// Closed-interval containment test per axis.
    pub fn contains(&self, p: [f64; 3]) -> bool {
        (0..3).all(|d| self.min[d] <= p[d] && p[d] <= self.max[d])
    }

    /// Smallest box covering both operands.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut out = *self;
        for d in 0..3 {
            out.min[d] = out.min[d].min(other.min[d]);
            out.max[d] = out.max[d].max(other.max[d]);
        }
        out
    }

    /// Intersection of two boxes; `None` when any axis interval is
    /// degenerate-empty. Commutative. Boxes touching on a face intersect
    /// (closed intervals).
    pub fn intersection(a: &BoundingBox, b: &BoundingBox) -> Option<BoundingBox> {
        let mut out = BoundingBox::new([0.0; 3], [0.0; 3]);
        for d in 0..3 {
            let lo = a.min[d].max(b.min[d]);
            let hi = a.max[d].min(b.max[d]);
            if lo > hi {
                return None;
            }
            out.min[d] = lo;
            out.max[d] = hi;
        }
        Some(out)
    }

    /// Whether this box overlaps another (closed intervals).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        BoundingBox::intersection(self, other).is_some()
    }

    /// Axis with the largest extent.
    pub fn longest_axis(&self) -> usize {
        let mut axis = 0;
        let mut best = self.max[0] - self.min[0];
        for d in 1..3 {
            let len = self.max[d] - self.min[d];
            if len > best {
                best = len;
                axis = d;
            }
        }
        axis
    }
}

/// Reduce local boxes to the global box over all ranks. Collective.
///
/// Ranks with no local geometry pass `None`; the result is `None` only when
/// every rank is empty.
pub fn global_bounding_box<C: Communicator>(
    comm: &C,
    tag: CommTag,
    local: Option<BoundingBox>,
) -> Result<Option<BoundingBox>, TransferError> {
    // Encode emptiness as an inverted box so every rank contributes a
    // fixed-size payload.
    let sentinel = BoundingBox::new([f64::INFINITY; 3], [f64::NEG_INFINITY; 3]);
    let bx = local.unwrap_or(sentinel);
    let mut payload = [0u8; 48];
    for d in 0..3 {
        payload[d * 8..d * 8 + 8].copy_from_slice(&bx.min[d].to_le_bytes());
        payload[24 + d * 8..24 + d * 8 + 8].copy_from_slice(&bx.max[d].to_le_bytes());
    }
    let gathered = allgather_bytes(comm, tag, &payload)?;

    let mut global: Option<BoundingBox> = None;
    for raw in &gathered {
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for d in 0..3 {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&raw[d * 8..d * 8 + 8]);
            min[d] = f64::from_le_bytes(buf);
            buf.copy_from_slice(&raw[24 + d * 8..24 + d * 8 + 8]);
            max[d] = f64::from_le_bytes(buf);
        }
        if (0..3).any(|d| min[d] > max[d]) {
            continue; // empty contribution
        }
        let contrib = BoundingBox::new(min, max);
        global = Some(match global {
            Some(g) => g.union(&contrib),
            None => contrib,
        });
    }
    Ok(global)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_closed() {
        let bx = BoundingBox::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        assert!(bx.contains([0.0, 0.0, 0.0]));
        assert!(bx.contains([1.0, 1.0, 1.0]));
        assert!(bx.contains([0.5, 0.5, 0.5]));
        assert!(!bx.contains([1.0 + 1e-12, 0.5, 0.5]));
    }

    #[test]
    fn intersection_commutes() {
        let a = BoundingBox::new([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let b = BoundingBox::new([1.0, -1.0, 0.5], [3.0, 1.0, 1.5]);
        assert_eq!(
            BoundingBox::intersection(&a, &b),
            BoundingBox::intersection(&b, &a)
        );
    }

    #[test]
    fn nested_intersection_is_inner_box() {
        let outer = BoundingBox::new([-1.0; 3], [4.0; 3]);
        let inner = BoundingBox::new([0.0; 3], [1.0; 3]);
        assert_eq!(BoundingBox::intersection(&outer, &inner), Some(inner));
    }

    #[test]
    fn disjoint_on_one_axis() {
        let a = BoundingBox::new([0.0; 3], [1.0; 3]);
        let b = BoundingBox::new([0.0, 0.0, 2.0], [1.0, 1.0, 3.0]);
        assert_eq!(BoundingBox::intersection(&a, &b), None);
    }

    #[test]
    fn face_touching_boxes_intersect() {
        let a = BoundingBox::new([0.0; 3], [1.0; 3]);
        let b = BoundingBox::new([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]);
        let got = BoundingBox::intersection(&a, &b).unwrap();
        assert_eq!(got.min[0], 1.0);
        assert_eq!(got.max[0], 1.0);
    }

    #[test]
    fn from_points_tightens() {
        let pts = [[0.0, 5.0, -1.0], [2.0, 1.0, 3.0]];
        let bx = BoundingBox::from_points(pts.iter()).unwrap();
        assert_eq!(bx.min, [0.0, 1.0, -1.0]);
        assert_eq!(bx.max, [2.0, 5.0, 3.0]);
        assert!(BoundingBox::from_points([].iter()).is_none());
    }
}
