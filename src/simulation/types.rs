//! Core types for the freight simulation
//!
//! Identifiers, vehicle classes and segment kinds shared by every module.

use std::fmt;

/// Identifier of an infrastructure segment, as authored in the road data
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub String);

impl SegmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SegmentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a vehicle, e.g. `HeavyTruck42`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VehicleId(pub String);

impl VehicleId {
    pub fn new(class: VehicleClass, counter: u64) -> Self {
        Self(format!("{}{}", class.name(), counter))
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered sequence of segment ids a vehicle traverses, origin first
pub type Path = std::sync::Arc<[SegmentId]>;

/// Simulated tick counter
pub type Tick = u64;

/// Class of a vehicle. Speed and physical length differ per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VehicleClass {
    LargeBus,
    HeavyTruck,
    MediumTruck,
    SmallTruck,
    MiniBus,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 5] = [
        VehicleClass::LargeBus,
        VehicleClass::HeavyTruck,
        VehicleClass::MediumTruck,
        VehicleClass::SmallTruck,
        VehicleClass::MiniBus,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VehicleClass::LargeBus => "LargeBus",
            VehicleClass::HeavyTruck => "HeavyTruck",
            VehicleClass::MediumTruck => "MediumTruck",
            VehicleClass::SmallTruck => "SmallTruck",
            VehicleClass::MiniBus => "MiniBus",
        }
    }

    /// Cruising speed in km/h
    pub fn speed_kmh(&self) -> f64 {
        match self {
            VehicleClass::LargeBus | VehicleClass::MiniBus => 45.0,
            VehicleClass::HeavyTruck | VehicleClass::MediumTruck | VehicleClass::SmallTruck => 41.0,
        }
    }

    /// Cruising speed in meters per simulated minute
    pub fn speed_m_per_min(&self) -> f64 {
        self.speed_kmh() * 1000.0 / 60.0
    }

    /// Physical length in meters
    pub fn length(&self) -> f64 {
        match self {
            VehicleClass::LargeBus => 11.080,
            VehicleClass::HeavyTruck => 9.010,
            VehicleClass::MediumTruck => 8.395,
            VehicleClass::SmallTruck => 5.000,
            VehicleClass::MiniBus => 5.970,
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Movement state of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleState {
    Drive,
    /// Queued at a broken bridge
    Wait,
}

/// Kind of an infrastructure segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Source,
    Sink,
    SourceSink,
    Bridge,
    Link,
    Intersection,
}

impl SegmentKind {
    pub fn emits(&self) -> bool {
        matches!(self, SegmentKind::Source | SegmentKind::SourceSink)
    }

    pub fn removes(&self) -> bool {
        matches!(self, SegmentKind::Sink | SegmentKind::SourceSink)
    }
}

/// Default simulated minutes per tick
pub const DEFAULT_TICK_MINUTES: f64 = 1.0;

/// Default number of ticks between two vehicles generated by a source
pub const DEFAULT_GENERATION_INTERVAL: u64 = 5;
