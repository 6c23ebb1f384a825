//! Input topology consumed by the simulation
//!
//! Road data loaders produce a [`Topology`]: the segments with their kind and
//! length, the weighted undirected edges between them, and the authored order
//! of segments along each road.

use super::types::{SegmentId, SegmentKind};

/// One infrastructure segment as authored in the road data
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSpec {
    pub id: SegmentId,
    pub kind: SegmentKind,
    /// Length in meters
    pub length: f64,
    pub name: String,
    pub road_name: String,
    /// Condition class of a bridge (e.g. "A".."D"); ignored for other kinds
    pub condition: Option<String>,
}

impl SegmentSpec {
    pub fn new(id: impl Into<String>, kind: SegmentKind, length: f64, road_name: &str) -> Self {
        Self {
            id: SegmentId::new(id),
            kind,
            length,
            name: String::new(),
            road_name: road_name.to_string(),
            condition: None,
        }
    }

    pub fn bridge(id: impl Into<String>, length: f64, road_name: &str, condition: &str) -> Self {
        Self {
            condition: Some(condition.to_string()),
            ..Self::new(id, SegmentKind::Bridge, length, road_name)
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

/// Undirected connection between two segments, weighted by distance
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    pub u: SegmentId,
    pub v: SegmentId,
    pub weight: f64,
}

/// Authored segment order along a road, in its forward direction
#[derive(Debug, Clone, PartialEq)]
pub struct RoadSpec {
    pub name: String,
    pub segments: Vec<SegmentId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    pub segments: Vec<SegmentSpec>,
    pub edges: Vec<EdgeSpec>,
    pub roads: Vec<RoadSpec>,
}

impl Topology {
    pub fn builder() -> TopologyBuilder {
        TopologyBuilder::default()
    }

    /// Small two-road network used by the headless runner.
    ///
    /// N1 runs west to east with three bridges, N2 runs north to south and
    /// crosses N1 at a shared intersection. Every road end is a source and a sink.
    pub fn demo() -> Self {
        let mut builder = Topology::builder();

        builder.road(
            "N1",
            vec![
                SegmentSpec::new("N1_W", SegmentKind::SourceSink, 0.0, "N1").with_name("Westgate"),
                SegmentSpec::new("N1_L1", SegmentKind::Link, 1800.0, "N1"),
                SegmentSpec::bridge("N1_B1", 8.0, "N1", "A"),
                SegmentSpec::new("N1_L2", SegmentKind::Link, 2400.0, "N1"),
                SegmentSpec::bridge("N1_B2", 120.0, "N1", "C"),
                SegmentSpec::new("N1_L3", SegmentKind::Link, 950.0, "N1"),
                SegmentSpec::new("X1", SegmentKind::Intersection, 0.0, "N1").with_name("Junction"),
                SegmentSpec::new("N1_L4", SegmentKind::Link, 3100.0, "N1"),
                SegmentSpec::bridge("N1_B3", 260.0, "N1", "D"),
                SegmentSpec::new("N1_L5", SegmentKind::Link, 1200.0, "N1"),
                SegmentSpec::new("N1_E", SegmentKind::SourceSink, 0.0, "N1").with_name("Eastport"),
            ],
        );

        builder.road(
            "N2",
            vec![
                SegmentSpec::new("N2_N", SegmentKind::SourceSink, 0.0, "N2").with_name("Northfield"),
                SegmentSpec::new("N2_L1", SegmentKind::Link, 2200.0, "N2"),
                SegmentSpec::bridge("N2_B1", 35.0, "N2", "B"),
                SegmentSpec::new("N2_L2", SegmentKind::Link, 1500.0, "N2"),
                SegmentSpec::new("X1", SegmentKind::Intersection, 0.0, "N2"),
                SegmentSpec::new("N2_L3", SegmentKind::Link, 2600.0, "N2"),
                SegmentSpec::bridge("N2_B2", 75.0, "N2", "C"),
                SegmentSpec::new("N2_L4", SegmentKind::Link, 900.0, "N2"),
                SegmentSpec::new("N2_S", SegmentKind::SourceSink, 0.0, "N2").with_name("Southbay"),
            ],
        );

        builder.build()
    }
}

/// Assembles a [`Topology`] road by road, chaining consecutive segments
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    topology: Topology,
}

impl TopologyBuilder {
    /// Add a road. Consecutive segments are connected by an edge weighted
    /// with the length of the later segment. A segment id that already
    /// exists (a shared intersection) is reused rather than duplicated.
    pub fn road(&mut self, name: &str, segments: Vec<SegmentSpec>) -> &mut Self {
        let mut ids = Vec::with_capacity(segments.len());
        let mut previous: Option<SegmentId> = None;

        for spec in segments {
            let id = spec.id.clone();
            let length = spec.length;

            if !self.topology.segments.iter().any(|s| s.id == id) {
                self.topology.segments.push(spec);
            }

            if let Some(prev) = previous.take() {
                self.topology.edges.push(EdgeSpec {
                    u: prev,
                    v: id.clone(),
                    weight: length,
                });
            }

            previous = Some(id.clone());
            ids.push(id);
        }

        self.topology.roads.push(RoadSpec {
            name: name.to_string(),
            segments: ids,
        });
        self
    }

    /// Add an extra edge not implied by any road order
    pub fn edge(&mut self, u: &str, v: &str, weight: f64) -> &mut Self {
        self.topology.edges.push(EdgeSpec {
            u: SegmentId::new(u),
            v: SegmentId::new(v),
            weight,
        });
        self
    }

    pub fn build(&mut self) -> Topology {
        std::mem::take(&mut self.topology)
    }
}
