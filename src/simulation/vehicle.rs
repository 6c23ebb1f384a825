//! Vehicle movement logic for the freight simulation
//!
//! A vehicle either drives along its fixed path or waits in a bridge queue.
//! Driving covers `speed * tick` meters per tick; any distance left over at
//! the end of a segment carries into the following segments of the path.

use anyhow::{bail, Context, Result};
use rand::Rng;

use super::config::{SimConfig, SpeedPolicy};
use super::segment::Segments;
use super::stats::{StatsCollector, TravelTimeRecord, WaitingTimeRecord};
use super::types::{Path, SegmentId, SegmentKind, Tick, VehicleClass, VehicleId, VehicleState};

/// Average vehicle length used to judge how crowded a segment is
pub const AVERAGE_VEHICLE_LENGTH: f64 = 7.891;

/// Speed factor applied on a crowded segment
pub const SLOW_DOWN_FACTOR: f64 = 0.5;

/// Speed factor applied on an almost empty segment
pub const SPEED_UP_FACTOR: f64 = 1.2;

/// Result of a vehicle update indicating what should happen to the vehicle
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleUpdateResult {
    Continue,
    /// Reached a sink and left the network
    Arrived(SegmentId),
}

/// Everything a vehicle touches while it steps
pub struct StepContext<'a, R: Rng + ?Sized> {
    pub tick: Tick,
    pub config: &'a SimConfig,
    pub segments: &'a mut Segments,
    pub stats: &'a mut StatsCollector,
    pub rng: &'a mut R,
}

/// A vehicle in the freight simulation
#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub id: VehicleId,
    pub class: VehicleClass,
    pub state: VehicleState,
    /// Index of the segment the vehicle is on
    pub location: usize,
    /// Meters from the start of the current segment
    pub offset: f64,
    pub path: Path,
    /// Position of the current segment in `path`
    pub path_index: usize,
    /// Ticks left in the current bridge queue
    pub remaining_wait: u32,
    /// Ticks spent in bridge queues so far
    pub accumulated_wait: u64,
    pub created_at: Tick,
    pub removed_at: Option<Tick>,
    /// Bridge where the vehicle last finished waiting
    pub waited_at: Option<SegmentId>,
    /// Current speed in meters per minute
    pub speed: f64,
    slowed_down: bool,
    sped_up: bool,
}

impl SimVehicle {
    pub fn new(
        id: VehicleId,
        class: VehicleClass,
        location: usize,
        path: Path,
        created_at: Tick,
    ) -> Self {
        Self {
            id,
            class,
            state: VehicleState::Drive,
            location,
            offset: 0.0,
            path,
            path_index: 0,
            remaining_wait: 0,
            accumulated_wait: 0,
            created_at,
            removed_at: None,
            waited_at: None,
            speed: class.speed_m_per_min(),
            slowed_down: false,
            sped_up: false,
        }
    }

    pub fn origin(&self) -> Option<&SegmentId> {
        self.path.first()
    }

    pub fn destination(&self) -> Option<&SegmentId> {
        self.path.last()
    }

    /// Advance the vehicle by one tick
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        ctx: &mut StepContext<'_, R>,
    ) -> Result<VehicleUpdateResult> {
        if self.state == VehicleState::Wait {
            self.remaining_wait = self.remaining_wait.saturating_sub(1);
            if self.remaining_wait == 0 {
                self.state = VehicleState::Drive;
                let segment = &mut ctx.segments[self.location];
                self.waited_at = Some(segment.id.clone());
                if let Some(bridge) = &mut segment.bridge {
                    bridge.release(&self.id);
                }
            }
        }

        if self.state == VehicleState::Drive {
            return self.drive(ctx);
        }

        Ok(VehicleUpdateResult::Continue)
    }

    fn drive<R: Rng + ?Sized>(&mut self, ctx: &mut StepContext<'_, R>) -> Result<VehicleUpdateResult> {
        if ctx.config.speed_policy == SpeedPolicy::CongestionAware {
            self.adjust_speed(ctx.segments);
        }

        let distance = self.speed * ctx.config.tick_minutes;
        let current_length = ctx.segments[self.location].length;

        if self.offset + distance < current_length {
            self.offset += distance;
            return Ok(VehicleUpdateResult::Continue);
        }

        let overflow = self.offset + distance - current_length;

        // Speed is judged afresh on every segment
        self.speed = self.class.speed_m_per_min();
        self.slowed_down = false;
        self.sped_up = false;

        self.drive_to_next(overflow, ctx)
    }

    /// Cross into the following segments until `distance` is used up or the
    /// vehicle reaches a sink or has to queue at a bridge
    fn drive_to_next<R: Rng + ?Sized>(
        &mut self,
        mut distance: f64,
        ctx: &mut StepContext<'_, R>,
    ) -> Result<VehicleUpdateResult> {
        // Each iteration consumes one path entry
        for _ in 0..self.path.len() {
            self.path_index += 1;
            let next_id = self
                .path
                .get(self.path_index)
                .with_context(|| format!("Vehicle {} ran past the end of its path", self.id))?
                .clone();
            let next = ctx
                .segments
                .index_of(&next_id)
                .with_context(|| format!("Segment {next_id} not found"))?;

            match ctx.segments[next].kind {
                SegmentKind::Sink | SegmentKind::SourceSink => {
                    return self.arrive_at_sink(next, next_id, ctx);
                }
                SegmentKind::Bridge => {
                    if self.arrive_at_bridge(next, &next_id, ctx)? {
                        return Ok(VehicleUpdateResult::Continue);
                    }
                }
                SegmentKind::Source | SegmentKind::Link | SegmentKind::Intersection => {}
            }

            let length = ctx.segments[next].length;
            if length > distance {
                self.move_to(next, distance, ctx.segments)?;
                return Ok(VehicleUpdateResult::Continue);
            }
            distance -= length;
        }

        bail!(
            "Vehicle {} crossed more segments than its path holds",
            self.id
        )
    }

    fn arrive_at_sink<R: Rng + ?Sized>(
        &mut self,
        sink: usize,
        sink_id: SegmentId,
        ctx: &mut StepContext<'_, R>,
    ) -> Result<VehicleUpdateResult> {
        ctx.segments[self.location].leave()?;
        ctx.segments[sink].absorb()?;
        self.location = sink;
        self.offset = 0.0;
        self.removed_at = Some(ctx.tick);

        let origin = self
            .origin()
            .cloned()
            .with_context(|| format!("Vehicle {} has an empty path", self.id))?;

        ctx.stats.record_travel_time(TravelTimeRecord {
            vehicle_id: self.id.clone(),
            travel_time: ctx.tick - self.created_at,
            total_waiting_time: self.accumulated_wait,
            origin,
            destination: sink_id.clone(),
            class: self.class,
        });

        Ok(VehicleUpdateResult::Arrived(sink_id))
    }

    /// Ask the bridge for a delay. Returns true when the vehicle has to queue.
    fn arrive_at_bridge<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        bridge_id: &SegmentId,
        ctx: &mut StepContext<'_, R>,
    ) -> Result<bool> {
        let segment = &mut ctx.segments[index];
        let length = segment.length;
        let bridge = segment
            .bridge
            .as_mut()
            .with_context(|| format!("Segment {bridge_id} has no bridge state"))?;

        let delay = bridge.delay_for_arrival(
            ctx.config.delay_model,
            length,
            ctx.config.tick_minutes,
            ctx.tick,
            ctx.rng,
        );

        ctx.stats.record_waiting_time(WaitingTimeRecord {
            vehicle_id: self.id.clone(),
            bridge_id: bridge_id.clone(),
            waiting_time: delay,
            class: self.class,
        });

        if delay == 0 {
            return Ok(false);
        }

        bridge.register_arrival(self.id.clone(), ctx.tick + u64::from(delay));
        self.move_to(index, 0.0, ctx.segments)?;
        self.state = VehicleState::Wait;
        self.remaining_wait = delay;
        self.accumulated_wait += u64::from(delay);
        Ok(true)
    }

    fn move_to(&mut self, next: usize, offset: f64, segments: &mut Segments) -> Result<()> {
        debug_assert!(offset == 0.0 || offset < segments[next].length);
        segments.transfer(self.location, next)?;
        self.location = next;
        self.offset = offset;
        Ok(())
    }

    /// Halve speed on a crowded segment, speed up on an almost empty one.
    /// Each adjustment happens at most once per segment.
    fn adjust_speed(&mut self, segments: &Segments) {
        let segment = &segments[self.location];
        if segment.emitter.is_some() {
            return;
        }

        let needed = f64::from(segment.occupancy()) * AVERAGE_VEHICLE_LENGTH;
        if segment.length < needed {
            if !self.slowed_down {
                self.speed *= SLOW_DOWN_FACTOR;
                self.slowed_down = true;
            }
        } else if segment.length / 2.0 > needed && !self.sped_up {
            self.speed *= SPEED_UP_FACTOR;
            self.sped_up = true;
        }
    }
}
