//! Bounding-volume tree over repartitioned elements.
//!
//! A small median-split BVH: interior nodes carry the union box of their
//! subtree, leaves carry up to [`LEAF_SIZE`] items with their own boxes.
//! Queries walk the tree and return the indices of every item whose box
//! contains the query point; the exact point-in-element test happens outside.

use crate::geometry::bounding_box::BoundingBox;

const LEAF_SIZE: usize = 8;

#[derive(Clone, Debug)]
enum Node {
    Leaf {
        bbox: BoundingBox,
        /// (item index, that item's box); tested individually on query.
        items: Vec<(usize, BoundingBox)>,
    },
    Inner {
        bbox: BoundingBox,
        left: usize,
        right: usize,
    },
}

/// Static point-lookup structure over item bounding boxes.
#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl SpatialIndex {
    /// Build over one box per item. Item indices in query results refer to
    /// positions in `boxes`.
    pub fn build(boxes: &[BoundingBox]) -> Self {
        let mut index = SpatialIndex::default();
        if boxes.is_empty() {
            return index;
        }
        let mut items: Vec<usize> = (0..boxes.len()).collect();
        let root = index.build_node(boxes, &mut items);
        index.root = Some(root);
        index
    }

    fn build_node(&mut self, boxes: &[BoundingBox], items: &mut [usize]) -> usize {
        // `items` is non-empty: build() rejects the empty case and median
        // splits never produce an empty half.
        let mut bbox = boxes[items[0]];
        for &i in &items[1..] {
            bbox = bbox.union(&boxes[i]);
        }

        if items.len() <= LEAF_SIZE {
            self.nodes.push(Node::Leaf {
                bbox,
                items: items.iter().map(|&i| (i, boxes[i])).collect(),
            });
            return self.nodes.len() - 1;
        }

        // Median split on box centers along the node's longest axis.
        let axis = bbox.longest_axis();
        let mid = items.len() / 2;
        items.select_nth_unstable_by(mid, |&a, &b| {
            let ca = boxes[a].min[axis] + boxes[a].max[axis];
            let cb = boxes[b].min[axis] + boxes[b].max[axis];
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        });
        let (lo, hi) = items.split_at_mut(mid);
        let left = self.build_node(boxes, lo);
        let right = self.build_node(boxes, hi);
        self.nodes.push(Node::Inner { bbox, left, right });
        self.nodes.len() - 1
    }

    /// Indices of items whose box contains `p`.
    pub fn candidates(&self, p: [f64; 3]) -> Vec<usize> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            let mut stack = vec![root];
            while let Some(n) = stack.pop() {
                match &self.nodes[n] {
                    Node::Leaf { bbox, items } => {
                        if bbox.contains(p) {
                            out.extend(
                                items
                                    .iter()
                                    .filter(|(_, item_box)| item_box.contains(p))
                                    .map(|&(i, _)| i),
                            );
                        }
                    }
                    Node::Inner { bbox, left, right } => {
                        if bbox.contains(p) {
                            stack.push(*left);
                            stack.push(*right);
                        }
                    }
                }
            }
        }
        out
    }
}
