//! Road network graph for pathfinding
//!
//! Wraps the consumed [`Topology`] in an undirected `petgraph` graph and
//! provides the path primitives the routing policies are built from.

use anyhow::{Context, Result};
use petgraph::algo::{all_simple_paths, astar, dijkstra};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::hash_map::RandomState;
use std::collections::HashMap;

use super::error::ConfigError;
use super::topology::{RoadSpec, Topology};
use super::types::SegmentId;

/// Raised when simple-path enumeration runs past its budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathBudgetExceeded;

/// Undirected, distance-weighted graph over segment ids
#[derive(Debug, Default)]
pub struct SimRoadNetwork {
    /// Node weight is the segment id, edge weight the distance
    graph: UnGraph<SegmentId, f64>,

    /// Maps segment IDs to their node indices in the graph
    segment_to_node: HashMap<SegmentId, NodeIndex>,

    /// Physical segment length, indexed by node index
    lengths: Vec<f64>,

    /// Sink-capable segments in insertion order
    sinks: Vec<SegmentId>,

    /// Authored roads, forward direction
    roads: Vec<RoadSpec>,
}

impl SimRoadNetwork {
    /// Build the graph, rejecting malformed topology
    pub fn new(topology: &Topology) -> Result<Self, ConfigError> {
        let mut network = Self::default();

        for spec in &topology.segments {
            if network.segment_to_node.contains_key(&spec.id) {
                return Err(ConfigError::DuplicateSegment(spec.id.clone()));
            }
            if !spec.length.is_finite() || spec.length < 0.0 {
                return Err(ConfigError::InvalidSegmentLength {
                    id: spec.id.clone(),
                    length: spec.length,
                });
            }

            let node = network.graph.add_node(spec.id.clone());
            network.segment_to_node.insert(spec.id.clone(), node);
            network.lengths.push(spec.length);

            if spec.kind.removes() {
                network.sinks.push(spec.id.clone());
            }
        }

        for edge in &topology.edges {
            let u = network.require_node(&edge.u)?;
            let v = network.require_node(&edge.v)?;
            if !edge.weight.is_finite() || edge.weight < 0.0 {
                return Err(ConfigError::InvalidEdgeWeight {
                    u: edge.u.clone(),
                    v: edge.v.clone(),
                    weight: edge.weight,
                });
            }
            network.graph.add_edge(u, v, edge.weight);
        }

        for road in &topology.roads {
            if road.segments.is_empty() {
                return Err(ConfigError::EmptyRoad(road.name.clone()));
            }
            for id in &road.segments {
                network.require_node(id)?;
            }
            network.roads.push(road.clone());
        }

        if network.sinks.is_empty() {
            return Err(ConfigError::NoSinks);
        }

        Ok(network)
    }

    fn require_node(&self, id: &SegmentId) -> Result<NodeIndex, ConfigError> {
        self.segment_to_node
            .get(id)
            .copied()
            .ok_or_else(|| ConfigError::UnknownSegment(id.clone()))
    }

    pub fn node(&self, id: &SegmentId) -> Option<NodeIndex> {
        self.segment_to_node.get(id).copied()
    }

    pub fn contains(&self, id: &SegmentId) -> bool {
        self.segment_to_node.contains_key(id)
    }

    /// Physical length of a segment in meters
    pub fn segment_length(&self, id: &SegmentId) -> Option<f64> {
        self.node(id).map(|node| self.lengths[node.index()])
    }

    /// Sum of the physical lengths of every segment on a path
    pub fn path_length(&self, path: &[SegmentId]) -> Result<f64> {
        path.iter().try_fold(0.0, |total, id| {
            let length = self
                .segment_length(id)
                .with_context(|| format!("Segment {id} not found"))?;
            Ok(total + length)
        })
    }

    pub fn sinks(&self) -> &[SegmentId] {
        &self.sinks
    }

    pub fn roads(&self) -> &[RoadSpec] {
        &self.roads
    }

    pub fn segment_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Minimum-weight path between two segments, both endpoints included.
    /// Uses A* with a null heuristic, which is Dijkstra.
    pub fn shortest_path(&self, from: &SegmentId, to: &SegmentId) -> Option<Vec<SegmentId>> {
        let start = self.node(from)?;
        let goal = self.node(to)?;

        let (_, node_path) = astar(
            &self.graph,
            start,
            |node| node == goal,
            |edge| *edge.weight(),
            |_| 0.0,
        )?;

        Some(
            node_path
                .into_iter()
                .map(|node| self.graph[node].clone())
                .collect(),
        )
    }

    /// Shortest weighted distance from `from` to every reachable segment
    pub fn distances_from(&self, from: &SegmentId) -> Option<HashMap<SegmentId, f64>> {
        let start = self.node(from)?;
        let distances = dijkstra(&self.graph, start, None, |edge| *edge.weight());

        Some(
            distances
                .into_iter()
                .map(|(node, distance)| (self.graph[node].clone(), distance))
                .collect(),
        )
    }

    /// Longest simple path from `from` to `to`, measured by physical segment
    /// length. Ties keep the first path enumerated. Every path enumerated
    /// consumes one unit of `budget`.
    pub fn longest_simple_path(
        &self,
        from: &SegmentId,
        to: &SegmentId,
        budget: &mut usize,
    ) -> Result<Option<(Vec<SegmentId>, f64)>, PathBudgetExceeded> {
        let (Some(start), Some(goal)) = (self.node(from), self.node(to)) else {
            return Ok(None);
        };
        if start == goal {
            return Ok(None);
        }

        let mut best: Option<(Vec<NodeIndex>, f64)> = None;
        let paths = all_simple_paths::<Vec<_>, _, RandomState>(&self.graph, start, goal, 0, None);

        for nodes in paths {
            if *budget == 0 {
                return Err(PathBudgetExceeded);
            }
            *budget -= 1;

            let length = self.nodes_length(&nodes);
            if best.as_ref().map_or(true, |(_, longest)| length > *longest) {
                best = Some((nodes, length));
            }
        }

        Ok(best.map(|(nodes, length)| {
            (
                nodes.into_iter().map(|node| self.graph[node].clone()).collect(),
                length,
            )
        }))
    }

    fn nodes_length(&self, nodes: &[NodeIndex]) -> f64 {
        nodes.iter().map(|node| self.lengths[node.index()]).sum()
    }
}
