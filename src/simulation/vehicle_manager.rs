//! Vehicle spawning and management for the freight simulation
//!
//! This module contains functions for spawning and updating vehicles.
//! It separates vehicle management logic from the main world coordination.

use anyhow::{Context, Result};
use log::{debug, error};
use rand::Rng;

use super::config::SimConfig;
use super::road_network::SimRoadNetwork;
use super::routing::RouteEngine;
use super::segment::Segments;
use super::stats::StatsCollector;
use super::types::{Tick, VehicleId};
use super::vehicle::{SimVehicle, StepContext, VehicleUpdateResult};

/// Spawn a vehicle at the given source segment
///
/// # Arguments
/// * `source` - Index of the emitting segment
/// * `counter` - Value used for the vehicle id
/// * `tick` - Creation tick
/// * `segments` - All segments; the source's occupancy and counters are updated
/// * `network` - The road network to use for pathfinding
/// * `routes` - Route engine resolving the vehicle's path
/// * `rng` - The run's random generator
///
/// Returns the new vehicle if successful. On error nothing has been changed
/// apart from random draws and the route cache.
pub fn spawn_vehicle<R: Rng + ?Sized>(
    source: usize,
    counter: u64,
    tick: Tick,
    segments: &mut Segments,
    network: &SimRoadNetwork,
    routes: &mut RouteEngine,
    rng: &mut R,
) -> Result<SimVehicle> {
    let segment = &segments[source];
    let emitter = segment
        .emitter
        .as_ref()
        .with_context(|| format!("Segment {} cannot generate vehicles", segment.id))?;
    let class = emitter.draw_class(rng);
    let origin = segment.id.clone();

    let (policy, path) = routes
        .select_route(network, &origin, rng)
        .with_context(|| format!("No route for a {class} from {origin}"))?;

    let vehicle = SimVehicle::new(VehicleId::new(class, counter), class, source, path, tick);

    let segment = &mut segments[source];
    segment.enter();
    if let Some(emitter) = &mut segment.emitter {
        emitter.generated += 1;
        emitter.generated_this_tick = true;
    }

    debug!(
        "GENERATE {} at {} via {:?} to {}",
        vehicle.id,
        origin,
        policy,
        vehicle
            .destination()
            .map_or_else(|| "?".to_string(), |d| d.to_string())
    );

    Ok(vehicle)
}

/// Outcome of stepping every vehicle once
#[derive(Debug, Default)]
pub struct UpdateSummary {
    pub arrived: Vec<VehicleId>,
    pub dropped: Vec<VehicleId>,
}

/// Update the first `count` vehicles in insertion order
///
/// Vehicles spawned after the snapshot was taken are left alone. Arrived
/// vehicles are removed from `vehicles`. A vehicle whose update fails is
/// dropped as well, after releasing whatever occupancy it still holds.
pub fn update_vehicles<R: Rng + ?Sized>(
    count: usize,
    tick: Tick,
    vehicles: &mut Vec<SimVehicle>,
    config: &SimConfig,
    segments: &mut Segments,
    stats: &mut StatsCollector,
    rng: &mut R,
) -> UpdateSummary {
    let mut summary = UpdateSummary::default();
    let mut ctx = StepContext {
        tick,
        config,
        segments,
        stats,
        rng,
    };

    let existing: Vec<SimVehicle> = vehicles.drain(..count.min(vehicles.len())).collect();
    let mut kept = Vec::with_capacity(existing.len());

    for mut vehicle in existing {
        match vehicle.step(&mut ctx) {
            Ok(VehicleUpdateResult::Continue) => kept.push(vehicle),
            Ok(VehicleUpdateResult::Arrived(sink)) => {
                debug!("REMOVE {} at {}", vehicle.id, sink);
                summary.arrived.push(vehicle.id);
            }
            Err(err) => {
                error!("Dropping vehicle {}: {:#}", vehicle.id, err);
                release_vehicle(&vehicle, ctx.segments);
                summary.dropped.push(vehicle.id);
            }
        }
    }

    // Newcomers go back behind the stepped vehicles
    kept.append(vehicles);
    *vehicles = kept;

    summary
}

fn release_vehicle(vehicle: &SimVehicle, segments: &mut Segments) {
    let segment = &mut segments[vehicle.location];
    if segment.leave().is_err() {
        error!(
            "Vehicle {} was not counted on segment {}",
            vehicle.id, segment.id
        );
    }
    if let Some(bridge) = &mut segment.bridge {
        bridge.release(&vehicle.id);
    }
}
