//! Error types surfaced by the simulation core

use thiserror::Error;

use super::types::SegmentId;

/// Problems with the scenario configuration or the input topology.
/// These abort world construction.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("tick duration must be positive, got {0}")]
    InvalidTickDuration(f64),

    #[error("generation interval must be at least one tick")]
    ZeroGenerationInterval,

    #[error("break probability for condition {condition:?} must be in [0, 1], got {value}")]
    InvalidBreakProbability { condition: String, value: f64 },

    #[error("malformed delay distribution for {class}: {reason}")]
    MalformedDelayDistribution { class: &'static str, reason: String },

    #[error("routing thresholds must be ascending within [0, 1], got {random} / {straight} / {nearest_sink}")]
    InvalidRoutingThresholds {
        random: f64,
        straight: f64,
        nearest_sink: f64,
    },

    #[error("vehicle mix {0:?} has no positive weight or a negative/non-finite weight")]
    InvalidVehicleMix(String),

    #[error("longest-route budget must be at least one path")]
    ZeroLongestRouteBudget,

    #[error("duplicate segment id {0}")]
    DuplicateSegment(SegmentId),

    #[error("segment {id} has invalid length {length}")]
    InvalidSegmentLength { id: SegmentId, length: f64 },

    #[error("edge references unknown segment {0}")]
    UnknownSegment(SegmentId),

    #[error("edge {u} - {v} has invalid weight {weight}")]
    InvalidEdgeWeight { u: SegmentId, v: SegmentId, weight: f64 },

    #[error("road {0:?} has no segments")]
    EmptyRoad(String),

    #[error("topology has no sink")]
    NoSinks,
}

/// A single route request that cannot be satisfied
#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("origin {0} is not part of the network")]
    UnknownOrigin(SegmentId),

    #[error("no sink other than {0} exists")]
    NoOtherSink(SegmentId),

    #[error("no authored road starts at {0}")]
    NoStraightRoute(SegmentId),

    #[error("no sink is reachable from {0}")]
    NoReachableSink(SegmentId),

    #[error("no path from {from} to {to}")]
    NoPath { from: SegmentId, to: SegmentId },
}
