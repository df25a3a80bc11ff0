//! In-memory tiled road graph.
//!
//! Edges are directed and carry the hierarchy level they belong to. The
//! [`TileHierarchy`] maps coordinates onto tiles per level; level 0 is the
//! coarsest (largest tiles, highway network) and the last level the finest.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geo::LatLng;

/// Default speed in kph for edges that do not specify one.
const DEFAULT_EDGE_SPEED: f64 = 50.0;

/// Default hierarchy level for edges that do not specify one (local roads).
const DEFAULT_EDGE_LEVEL: u8 = 2;

/// Identifier of a directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kinds of traffic an edge or node admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Auto,
    Bus,
    Truck,
    Bicycle,
    Pedestrian,
    Transit,
}

impl Access {
    fn bit(self) -> u8 {
        match self {
            Access::Auto => 1,
            Access::Bus => 1 << 1,
            Access::Truck => 1 << 2,
            Access::Bicycle => 1 << 3,
            Access::Pedestrian => 1 << 4,
            Access::Transit => 1 << 5,
        }
    }
}

/// Bit set of [`Access`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessMask(u8);

impl AccessMask {
    /// Every road access; transit is opt-in.
    pub const ROAD: AccessMask = AccessMask(0b0001_1111);
    pub const NONE: AccessMask = AccessMask(0);

    pub fn contains(self, access: Access) -> bool {
        self.0 & access.bit() != 0
    }

    pub fn with(self, access: Access) -> Self {
        AccessMask(self.0 | access.bit())
    }

    pub fn only(access: Access) -> Self {
        AccessMask(access.bit())
    }
}

impl Default for AccessMask {
    fn default() -> Self {
        AccessMask::ROAD
    }
}

impl FromIterator<Access> for AccessMask {
    fn from_iter<T: IntoIterator<Item = Access>>(iter: T) -> Self {
        iter.into_iter().fold(AccessMask::NONE, AccessMask::with)
    }
}

/// Graph vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub latlng: LatLng,
    pub access: AccessMask,
}

/// Directed edge between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectedEdge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    /// Hierarchy level, 0 being the coarsest.
    pub level: u8,
    /// Length in metres.
    pub length: f64,
    /// Speed in kph.
    pub speed: f64,
    pub name: Option<String>,
    pub way_id: u64,
    pub access: AccessMask,
    /// Set when the edge cannot be reached from (or cannot reach) the rest
    /// of the network.
    pub unreachable: bool,
}

/// One level of the tile hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLevel {
    pub level: u8,
    pub name: &'static str,
    /// Tile edge length in degrees.
    pub tile_size: f64,
}

/// Identifier of a tile at a given level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    pub level: u8,
    pub index: u32,
}

/// Tiling scheme shared by every level of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct TileHierarchy {
    levels: Vec<TileLevel>,
}

impl Default for TileHierarchy {
    fn default() -> Self {
        Self {
            levels: vec![
                TileLevel {
                    level: 0,
                    name: "highway",
                    tile_size: 4.0,
                },
                TileLevel {
                    level: 1,
                    name: "arterial",
                    tile_size: 1.0,
                },
                TileLevel {
                    level: 2,
                    name: "local",
                    tile_size: 0.25,
                },
            ],
        }
    }
}

impl TileHierarchy {
    pub fn levels(&self) -> &[TileLevel] {
        &self.levels
    }

    pub fn level(&self, level: u8) -> Option<&TileLevel> {
        self.levels.iter().find(|l| l.level == level)
    }

    /// The level with the largest tiles.
    pub fn coarsest_level(&self) -> u8 {
        self.levels
            .iter()
            .max_by(|a, b| a.tile_size.total_cmp(&b.tile_size))
            .map(|l| l.level)
            .unwrap_or(0)
    }

    /// The level with the smallest tiles.
    pub fn finest_level(&self) -> u8 {
        self.levels
            .iter()
            .min_by(|a, b| a.tile_size.total_cmp(&b.tile_size))
            .map(|l| l.level)
            .unwrap_or(0)
    }

    /// Tile containing `latlng` at `level`.
    pub fn tile_id(&self, level: u8, latlng: &LatLng) -> Option<TileId> {
        let tile_level = self.level(level)?;
        let (rows, cols) = grid_dimensions(tile_level.tile_size);
        let row = row_of(latlng.lat, tile_level.tile_size, rows);
        let col = col_of(latlng.lng, tile_level.tile_size, cols);
        Some(TileId {
            level,
            index: row * cols + col,
        })
    }

    /// Tiles intersecting the bounding box of a circle around `latlng`.
    pub fn tiles_within(&self, level: u8, latlng: &LatLng, radius: f64) -> Vec<TileId> {
        let Some(tile_level) = self.level(level) else {
            return Vec::new();
        };
        let size = tile_level.tile_size;
        let (rows, cols) = grid_dimensions(size);
        let dlat = radius.max(0.0) / 111_195.0;
        let dlng = dlat / latlng.lat.to_radians().cos().max(1e-6);

        let row_lo = row_of(latlng.lat - dlat, size, rows);
        let row_hi = row_of(latlng.lat + dlat, size, rows);
        let col_lo = col_of(latlng.lng - dlng, size, cols);
        let col_hi = col_of(latlng.lng + dlng, size, cols);

        let mut tiles = Vec::new();
        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                tiles.push(TileId {
                    level,
                    index: row * cols + col,
                });
            }
        }
        tiles
    }
}

fn grid_dimensions(tile_size: f64) -> (u32, u32) {
    let rows = (180.0 / tile_size).ceil() as u32;
    let cols = (360.0 / tile_size).ceil() as u32;
    (rows.max(1), cols.max(1))
}

fn row_of(lat: f64, size: f64, rows: u32) -> u32 {
    (((lat + 90.0) / size).floor().max(0.0) as u32).min(rows - 1)
}

fn col_of(lng: f64, size: f64, cols: u32) -> u32 {
    (((lng + 180.0) / size).floor().max(0.0) as u32).min(cols - 1)
}

/// Routing graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    hierarchy: TileHierarchy,
    nodes: Vec<GraphNode>,
    node_index: HashMap<NodeId, usize>,
    edges: Vec<DirectedEdge>,
    edge_index: HashMap<EdgeId, usize>,
    outgoing: HashMap<NodeId, Vec<usize>>,
    incoming: HashMap<NodeId, Vec<usize>>,
}

impl Graph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    pub fn hierarchy(&self) -> &TileHierarchy {
        &self.hierarchy
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.node_index.get(&id).map(|&idx| &self.nodes[idx])
    }

    pub fn edge(&self, id: EdgeId) -> Option<&DirectedEdge> {
        self.edge_index.get(&id).map(|&idx| &self.edges[idx])
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[DirectedEdge] {
        &self.edges
    }

    /// Edges leaving `node`.
    pub fn outgoing(&self, node: NodeId) -> impl Iterator<Item = &DirectedEdge> {
        self.outgoing
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(|&idx| &self.edges[idx])
    }

    /// Edges arriving at `node`.
    pub fn incoming(&self, node: NodeId) -> impl Iterator<Item = &DirectedEdge> {
        self.incoming
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(|&idx| &self.edges[idx])
    }

    /// Position of a node. Nodes referenced by edges always exist.
    pub fn latlng(&self, node: NodeId) -> Option<LatLng> {
        self.node(node).map(|n| n.latlng)
    }
}

/// Construction parameters for one directed edge (and optionally its twin).
#[derive(Debug, Clone)]
pub struct EdgeSpec {
    pub id: u64,
    pub from: u32,
    pub to: u32,
    /// When set, the opposite directed edge is created with this id.
    pub reverse_id: Option<u64>,
    pub level: u8,
    pub speed: f64,
    pub length: Option<f64>,
    pub name: Option<String>,
    pub way_id: u64,
    pub access: AccessMask,
    pub unreachable: bool,
}

impl EdgeSpec {
    pub fn new(id: u64, from: u32, to: u32) -> Self {
        Self {
            id,
            from,
            to,
            reverse_id: None,
            level: DEFAULT_EDGE_LEVEL,
            speed: DEFAULT_EDGE_SPEED,
            length: None,
            name: None,
            way_id: 0,
            access: AccessMask::ROAD,
            unreachable: false,
        }
    }

    pub fn two_way(mut self, reverse_id: u64) -> Self {
        self.reverse_id = Some(reverse_id);
        self
    }

    pub fn level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn way_id(mut self, way_id: u64) -> Self {
        self.way_id = way_id;
        self
    }

    pub fn access(mut self, access: AccessMask) -> Self {
        self.access = access;
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }
}

/// Incremental graph construction with reference validation.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    hierarchy: TileHierarchy,
    nodes: Vec<GraphNode>,
    specs: Vec<EdgeSpec>,
}

impl GraphBuilder {
    pub fn node(mut self, id: u32, lat: f64, lng: f64) -> Self {
        self.add_node(id, LatLng::new(lat, lng), AccessMask::ROAD);
        self
    }

    pub fn edge(mut self, spec: EdgeSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn add_node(&mut self, id: u32, latlng: LatLng, access: AccessMask) {
        self.nodes.push(GraphNode {
            id: NodeId(id),
            latlng,
            access,
        });
    }

    pub fn add_edge(&mut self, spec: EdgeSpec) {
        self.specs.push(spec);
    }

    pub fn build(self) -> Result<Graph> {
        let mut graph = Graph {
            hierarchy: self.hierarchy,
            ..Graph::default()
        };

        for node in self.nodes {
            graph.node_index.insert(node.id, graph.nodes.len());
            graph.nodes.push(node);
        }

        for spec in self.specs {
            let from = graph
                .latlng(NodeId(spec.from))
                .ok_or(Error::UnknownNode {
                    edge: spec.id,
                    node: spec.from,
                })?;
            let to = graph.latlng(NodeId(spec.to)).ok_or(Error::UnknownNode {
                edge: spec.id,
                node: spec.to,
            })?;
            let length = spec.length.unwrap_or_else(|| from.distance(&to));

            let forward = DirectedEdge {
                id: EdgeId(spec.id),
                from: NodeId(spec.from),
                to: NodeId(spec.to),
                level: spec.level,
                length,
                speed: spec.speed,
                name: spec.name.clone(),
                way_id: spec.way_id,
                access: spec.access,
                unreachable: spec.unreachable,
            };
            let reverse = spec.reverse_id.map(|reverse_id| DirectedEdge {
                id: EdgeId(reverse_id),
                from: forward.to,
                to: forward.from,
                ..forward.clone()
            });

            graph.push_edge(forward);
            if let Some(reverse) = reverse {
                graph.push_edge(reverse);
            }
        }

        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "built graph"
        );
        Ok(graph)
    }
}

impl Graph {
    fn push_edge(&mut self, edge: DirectedEdge) {
        let idx = self.edges.len();
        self.edge_index.insert(edge.id, idx);
        self.outgoing.entry(edge.from).or_default().push(idx);
        self.incoming.entry(edge.to).or_default().push(idx);
        self.edges.push(edge);
    }
}

#[derive(Debug, Deserialize)]
struct GraphFile {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
}

#[derive(Debug, Deserialize)]
struct NodeRecord {
    id: u32,
    lat: f64,
    lon: f64,
    #[serde(default)]
    access: Option<Vec<Access>>,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    id: u64,
    from: u32,
    to: u32,
    #[serde(default)]
    reverse_id: Option<u64>,
    #[serde(default)]
    level: Option<u8>,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    length: Option<f64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    way_id: u64,
    #[serde(default)]
    access: Option<Vec<Access>>,
    #[serde(default)]
    unreachable: bool,
}

impl From<EdgeRecord> for EdgeSpec {
    fn from(record: EdgeRecord) -> Self {
        EdgeSpec {
            id: record.id,
            from: record.from,
            to: record.to,
            reverse_id: record.reverse_id,
            level: record.level.unwrap_or(DEFAULT_EDGE_LEVEL),
            speed: record.speed.unwrap_or(DEFAULT_EDGE_SPEED),
            length: record.length,
            name: record.name,
            way_id: record.way_id,
            access: record
                .access
                .map(|list| list.into_iter().collect())
                .unwrap_or_default(),
            unreachable: record.unreachable,
        }
    }
}

/// Parse a graph from its JSON representation.
pub fn parse_graph(json: &str, origin: &Path) -> Result<Graph> {
    let file: GraphFile = serde_json::from_str(json).map_err(|e| Error::GraphLoad {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut builder = GraphBuilder::default();
    for node in file.nodes {
        let access = node
            .access
            .map(|list| list.into_iter().collect())
            .unwrap_or_default();
        builder.add_node(node.id, LatLng::new(node.lat, node.lon), access);
    }
    for edge in file.edges {
        builder.add_edge(edge.into());
    }
    builder.build()
}

/// Load a graph from a JSON file on disk.
pub fn load_graph(path: &Path) -> Result<Graph> {
    let json = fs::read_to_string(path)?;
    let graph = parse_graph(&json, path)?;
    info!(
        path = %path.display(),
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        "loaded graph"
    );
    Ok(graph)
}
