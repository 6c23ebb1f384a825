//! Standalone freight simulation module
//!
//! This module contains the whole simulation core: topology, segments,
//! routing, the vehicle state machine, the scheduler and statistics. It runs
//! headless and can be driven from tests or the command line.

mod bridge;
mod config;
mod error;
mod road_network;
mod routing;
mod segment;
mod stats;
mod topology;
mod types;
mod vehicle;
mod vehicle_manager;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use bridge::{minutes_to_ticks, sample_minutes, Bridge, LastArrival};
#[allow(unused_imports)]
pub use config::{
    DelayDistribution, DelayModel, DelayTable, LengthClass, RoutingThresholds, SimConfig,
    SpeedPolicy, VehicleMix, VehicleMixSampler,
};
#[allow(unused_imports)]
pub use error::{ConfigError, RouteError};
#[allow(unused_imports)]
pub use road_network::{PathBudgetExceeded, SimRoadNetwork};
#[allow(unused_imports)]
pub use routing::{Destination, RouteEngine, RoutePolicy};
#[allow(unused_imports)]
pub use segment::{Emitter, Remover, Segment, Segments};
#[allow(unused_imports)]
pub use stats::{SimulationStats, StatsCollector, TravelTimeRecord, WaitingTimeRecord};
#[allow(unused_imports)]
pub use topology::{EdgeSpec, RoadSpec, SegmentSpec, Topology, TopologyBuilder};
#[allow(unused_imports)]
pub use types::{
    Path, SegmentId, SegmentKind, Tick, VehicleClass, VehicleId, VehicleState,
    DEFAULT_GENERATION_INTERVAL, DEFAULT_TICK_MINUTES,
};
#[allow(unused_imports)]
pub use vehicle::{
    SimVehicle, StepContext, VehicleUpdateResult, AVERAGE_VEHICLE_LENGTH, SLOW_DOWN_FACTOR,
    SPEED_UP_FACTOR,
};
#[allow(unused_imports)]
pub use vehicle_manager::UpdateSummary;
pub use world::SimWorld;
