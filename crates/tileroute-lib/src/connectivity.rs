//! Tile colouring for the connectivity preflight.
//!
//! At a single hierarchy level every tile holding a node gets a colour; two
//! tiles share a colour when any edge joins nodes lying in them. Waypoints
//! whose candidate edges share no colour cannot be routed between, so the
//! search can be skipped entirely.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::correlate::PathLocation;
use crate::graph::{Graph, TileId};

/// Colour identifier of a connected group of tiles.
pub type Color = usize;

/// Connected tile groups at one hierarchy level.
pub struct ConnectivityMap<'a> {
    graph: &'a Graph,
    level: u8,
    colors: HashMap<TileId, Color>,
}

impl<'a> ConnectivityMap<'a> {
    pub fn new(graph: &'a Graph, level: u8) -> Self {
        let hierarchy = graph.hierarchy();
        let mut sets = DisjointSets::default();

        for node in graph.nodes() {
            if let Some(tile) = hierarchy.tile_id(level, &node.latlng) {
                sets.insert(tile);
            }
        }
        for edge in graph.edges() {
            let from = graph.latlng(edge.from).and_then(|p| hierarchy.tile_id(level, &p));
            let to = graph.latlng(edge.to).and_then(|p| hierarchy.tile_id(level, &p));
            if let (Some(a), Some(b)) = (from, to) {
                sets.union(a, b);
            }
        }

        let colors = sets.colors();
        debug!(
            level,
            tiles = colors.len(),
            colors = colors.values().collect::<HashSet<_>>().len(),
            "built connectivity map"
        );
        Self {
            graph,
            level,
            colors,
        }
    }

    pub fn color(&self, tile: &TileId) -> Option<Color> {
        self.colors.get(tile).copied()
    }

    /// Colours of the tiles holding the location's candidate edges, plus
    /// the tiles within `radius` metres of the waypoint when `radius > 0`.
    pub fn get_colors(&self, location: &PathLocation, radius: f64) -> HashSet<Color> {
        let hierarchy = self.graph.hierarchy();
        let mut colors = HashSet::new();

        for candidate in &location.edges {
            let Some(edge) = self.graph.edge(candidate.id) else {
                continue;
            };
            for node in [edge.from, edge.to] {
                let tile = self
                    .graph
                    .latlng(node)
                    .and_then(|p| hierarchy.tile_id(self.level, &p));
                if let Some(color) = tile.and_then(|t| self.color(&t)) {
                    colors.insert(color);
                }
            }
        }

        if radius > 0.0 {
            for tile in hierarchy.tiles_within(self.level, &location.latlng(), radius) {
                if let Some(color) = self.color(&tile) {
                    colors.insert(color);
                }
            }
        }
        colors
    }
}

/// Whether every location shares at least one colour with the destination
/// (the last location), using the coarsest hierarchy level.
pub fn check_connectivity(graph: &Graph, locations: &[PathLocation]) -> bool {
    let Some(destination) = locations.last() else {
        return true;
    };
    let map = ConnectivityMap::new(graph, graph.hierarchy().coarsest_level());

    let destination_colors = map.get_colors(destination, 0.0);
    let mut counts: HashMap<Color, usize> =
        destination_colors.iter().map(|&color| (color, 0)).collect();

    for location in locations {
        for color in map.get_colors(location, 0.0) {
            if let Some(count) = counts.get_mut(&color) {
                *count += 1;
            }
        }
    }

    let connected = counts.values().any(|&count| count == locations.len());
    debug!(
        locations = locations.len(),
        connected, "connectivity preflight"
    );
    connected
}

/// Union-find keyed by tile.
#[derive(Default)]
struct DisjointSets {
    index: HashMap<TileId, usize>,
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSets {
    fn insert(&mut self, tile: TileId) -> usize {
        if let Some(&idx) = self.index.get(&tile) {
            return idx;
        }
        let idx = self.parent.len();
        self.index.insert(tile, idx);
        self.parent.push(idx);
        self.rank.push(0);
        idx
    }

    fn find(&mut self, mut idx: usize) -> usize {
        while self.parent[idx] != idx {
            self.parent[idx] = self.parent[self.parent[idx]];
            idx = self.parent[idx];
        }
        idx
    }

    fn union(&mut self, a: TileId, b: TileId) {
        let a = self.insert(a);
        let b = self.insert(b);
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }

    fn colors(mut self) -> HashMap<TileId, Color> {
        let tiles: Vec<(TileId, usize)> = self.index.iter().map(|(t, i)| (*t, *i)).collect();
        tiles
            .into_iter()
            .map(|(tile, idx)| (tile, self.find(idx)))
            .collect()
    }
}
