//! KD-tree over node positions for nearest-node lookups.
//!
//! Positions are stored as 3D cartesian points on the earth sphere so that
//! squared euclidean distance orders candidates the same way great-circle
//! distance does.

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use tracing::debug;

use crate::geo::LatLng;
use crate::graph::{Graph, NodeId};

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

/// Spatial index over every node of a [`Graph`].
pub struct NodeIndex {
    tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32>,
    nodes: Vec<(NodeId, LatLng)>,
}

impl NodeIndex {
    pub fn build(graph: &Graph) -> Self {
        let mut tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32> = KdTree::new();
        let mut nodes = Vec::with_capacity(graph.nodes().len());
        for node in graph.nodes() {
            tree.add(&node.latlng.to_cartesian(), nodes.len());
            nodes.push((node.id, node.latlng));
        }
        debug!(node_count = nodes.len(), "built node index");
        Self { tree, nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Up to `k` nodes nearest to `point`, as (node, great-circle metres),
    /// closest first.
    pub fn nearest(&self, point: &LatLng, k: usize) -> Vec<(NodeId, f64)> {
        if k == 0 || self.nodes.is_empty() {
            return Vec::new();
        }

        self.tree
            .nearest_n::<SquaredEuclidean>(&point.to_cartesian(), k)
            .into_iter()
            .map(|neighbour| {
                let (id, latlng) = self.nodes[neighbour.item];
                (id, point.distance(&latlng))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn nearest_returns_closest_first() {
        let graph = Graph::builder()
            .node(1, 40.0, -75.0)
            .node(2, 40.0, -74.99)
            .node(3, 40.0, -74.98)
            .build()
            .expect("graph");
        let index = NodeIndex::build(&graph);
        assert_eq!(index.len(), 3);

        let hits = index.nearest(&LatLng::new(40.0, -74.981), 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, NodeId(3));
        assert_eq!(hits[1].0, NodeId(2));
        assert!(hits[0].1 < hits[1].1);
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = NodeIndex::build(&Graph::default());
        assert!(index.is_empty());
        assert!(index.nearest(&LatLng::new(0.0, 0.0), 4).is_empty());
    }
}
