//! Main simulation world that ties everything together
//!
//! `SimWorld` owns the segments, the live vehicles, the route engine, the
//! statistics and the single seeded random generator of a run. Every call to
//! [`SimWorld::tick`] is one synchronous pass: sources first, then vehicles,
//! both in insertion order.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::config::SimConfig;
use super::error::ConfigError;
use super::road_network::SimRoadNetwork;
use super::routing::RouteEngine;
use super::segment::{Segment, Segments};
use super::stats::{SimulationStats, StatsCollector, TravelTimeRecord, WaitingTimeRecord};
use super::topology::Topology;
use super::types::{SegmentId, Tick, VehicleState};
use super::vehicle::SimVehicle;
use super::vehicle_manager;

/// The main simulation world
pub struct SimWorld {
    config: SimConfig,

    /// Graph used for routing
    network: SimRoadNetwork,

    routes: RouteEngine,

    /// All segments, in topology order
    segments: Segments,

    /// Indices of emitting segments, in topology order
    sources: Vec<usize>,

    /// Live vehicles, in spawn order
    vehicles: Vec<SimVehicle>,

    stats: StatsCollector,

    /// Current tick; incremented after each pass
    tick: Tick,

    /// Next value used in a vehicle id
    next_vehicle: u64,

    vehicles_generated: u64,
    vehicles_completed: u64,
    skipped_spawns: u64,
    dropped_vehicles: u64,

    rng: StdRng,
}

impl SimWorld {
    /// Build a world from a topology and a configuration.
    ///
    /// Fails on any configuration or topology problem. Bridge failure states
    /// are drawn here, in segment order, from the generator seeded with `seed`.
    pub fn new(topology: &Topology, config: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let network = SimRoadNetwork::new(topology)?;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut segments = Segments::default();
        let mut sources = Vec::new();
        for spec in &topology.segments {
            let segment = Segment::from_spec(spec, &config, &mut rng)?;
            let emits = segment.emitter.is_some();
            let index = segments.push(segment)?;
            if emits {
                sources.push(index);
            }
        }

        let routes = RouteEngine::new(&network, config.routing, config.longest_route_budget);

        Ok(Self {
            config,
            network,
            routes,
            segments,
            sources,
            vehicles: Vec::new(),
            stats: StatsCollector::new(),
            tick: 0,
            next_vehicle: 0,
            vehicles_generated: 0,
            vehicles_completed: 0,
            skipped_spawns: 0,
            dropped_vehicles: 0,
            rng,
        })
    }

    /// Build a world over the built-in demo network
    pub fn demo(config: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(&Topology::demo(), config, seed)
    }

    /// Advance the simulation by one tick
    pub fn tick(&mut self) {
        for segment in self.segments.iter_mut() {
            segment.settle_absorbed();
            if let Some(emitter) = &mut segment.emitter {
                emitter.generated_this_tick = false;
            }
        }

        // Vehicles spawned below wait for the next tick
        let existing = self.vehicles.len();

        if self.tick % self.config.generation_interval == 0 {
            self.update_sources();
        }

        let summary = vehicle_manager::update_vehicles(
            existing,
            self.tick,
            &mut self.vehicles,
            &self.config,
            &mut self.segments,
            &mut self.stats,
            &mut self.rng,
        );
        self.vehicles_completed += summary.arrived.len() as u64;
        self.dropped_vehicles += summary.dropped.len() as u64;

        self.tick += 1;
    }

    /// Run `ticks` passes
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    fn update_sources(&mut self) {
        for i in 0..self.sources.len() {
            let source = self.sources[i];
            match vehicle_manager::spawn_vehicle(
                source,
                self.next_vehicle,
                self.tick,
                &mut self.segments,
                &self.network,
                &mut self.routes,
                &mut self.rng,
            ) {
                Ok(vehicle) => {
                    self.next_vehicle += 1;
                    self.vehicles_generated += 1;
                    self.vehicles.push(vehicle);
                }
                Err(err) => {
                    warn!("Skipping spawn at tick {}: {:#}", self.tick, err);
                    self.skipped_spawns += 1;
                }
            }
        }
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn network(&self) -> &SimRoadNetwork {
        &self.network
    }

    pub fn route_engine(&self) -> &RouteEngine {
        &self.routes
    }

    pub fn segments(&self) -> &Segments {
        &self.segments
    }

    pub fn segment(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.get(id)
    }

    pub fn occupancy(&self, id: &SegmentId) -> Option<u32> {
        self.segments.get(id).map(Segment::occupancy)
    }

    /// Live vehicles in spawn order
    pub fn vehicles(&self) -> &[SimVehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: &str) -> Option<&SimVehicle> {
        self.vehicles.iter().find(|v| v.id.0 == id)
    }

    /// Segment a live vehicle is on
    pub fn vehicle_segment(&self, vehicle: &SimVehicle) -> &Segment {
        &self.segments[vehicle.location]
    }

    /// Snapshot of all completed trips
    pub fn travel_time_records(&self) -> Vec<TravelTimeRecord> {
        self.stats.travel_time_records()
    }

    /// Snapshot of all bridge encounters
    pub fn waiting_time_records(&self) -> Vec<WaitingTimeRecord> {
        self.stats.waiting_time_records()
    }

    pub fn stats(&self) -> SimulationStats {
        let bridges = self.segments.iter().filter_map(|s| s.bridge.as_ref());
        let (broken_bridges, total_bridges) =
            bridges.fold((0, 0), |(broken, total), b| (broken + usize::from(b.is_broken()), total + 1));

        SimulationStats {
            ticks: self.tick,
            vehicles_generated: self.vehicles_generated,
            vehicles_completed: self.vehicles_completed,
            active_vehicles: self.vehicles.len(),
            waiting_vehicles: self
                .vehicles
                .iter()
                .filter(|v| v.state == VehicleState::Wait)
                .count(),
            skipped_spawns: self.skipped_spawns,
            dropped_vehicles: self.dropped_vehicles,
            broken_bridges,
            total_bridges,
            mean_travel_time: self.stats.mean_travel_time(),
            mean_waiting_time: self.stats.mean_waiting_time(),
        }
    }

    /// Log run-level counters at info level
    pub fn log_summary(&self) {
        let stats = self.stats();
        info!(
            "Tick {}: generated={} completed={} active={} waiting={} skipped={} dropped={}",
            stats.ticks,
            stats.vehicles_generated,
            stats.vehicles_completed,
            stats.active_vehicles,
            stats.waiting_vehicles,
            stats.skipped_spawns,
            stats.dropped_vehicles
        );
    }

    /// Print a summary of the world to stdout
    pub fn print_summary(&self) {
        let stats = self.stats();
        println!("=== Freight Simulation Summary ===");
        println!(
            "Tick: {} ({:.0} simulated minutes)",
            self.tick,
            self.tick as f64 * self.config.tick_minutes
        );
        println!("Segments: {}", self.segments.len());
        println!(
            "Bridges: {} ({} broken)",
            stats.total_bridges, stats.broken_bridges
        );
        println!(
            "Vehicles: {} active, {} waiting",
            stats.active_vehicles, stats.waiting_vehicles
        );
        println!();

        println!("--- Bridges ---");
        for segment in self.segments.iter() {
            if let Some(bridge) = &segment.bridge {
                println!(
                    "  {} ({:.0} m, condition {}): {}, occupancy={}",
                    segment.id,
                    segment.length,
                    bridge.condition.as_deref().unwrap_or("-"),
                    if bridge.is_broken() { "broken" } else { "working" },
                    segment.occupancy()
                );
            }
        }

        println!("--- Sources ---");
        for &index in &self.sources {
            let segment = &self.segments[index];
            let removed = segment.remover.as_ref().map_or(0, |r| r.removed);
            let generated = segment.emitter.as_ref().map_or(0, |e| e.generated);
            println!(
                "  {}: generated={} removed={}",
                segment.id, generated, removed
            );
        }
        println!();
    }
}
