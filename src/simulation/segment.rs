//! Infrastructure segments
//!
//! A segment is a passive piece of road. Sources, sinks and bridges are the
//! same struct carrying optional capabilities: an [`Emitter`] generates
//! vehicles, a [`Remover`] takes them off the network, a [`Bridge`] may
//! delay them. A SourceSink simply carries both an emitter and a remover.

use anyhow::{bail, Result};
use rand::distr::Distribution;
use rand::Rng;
use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use super::bridge::Bridge;
use super::config::{SimConfig, VehicleMixSampler};
use super::error::ConfigError;
use super::topology::SegmentSpec;
use super::types::{SegmentId, SegmentKind, VehicleClass};

/// Vehicle generation capability
#[derive(Debug, Clone)]
pub struct Emitter {
    /// Vehicles generated here over the whole run
    pub generated: u64,
    /// Presentation flag: a vehicle was generated on the current tick
    pub generated_this_tick: bool,
    sampler: VehicleMixSampler,
}

impl Emitter {
    pub fn draw_class<R: Rng + ?Sized>(&self, rng: &mut R) -> VehicleClass {
        self.sampler.classes[self.sampler.index.sample(rng)]
    }
}

/// Vehicle removal capability
#[derive(Debug, Clone, Default)]
pub struct Remover {
    /// Vehicles removed here over the whole run
    pub removed: u64,
    /// Presentation flag, flips on every removal
    pub removed_toggle: bool,
    /// Vehicles that arrived during the current tick
    resting: u32,
}

#[derive(Debug, Clone)]
pub struct Segment {
    pub id: SegmentId,
    pub kind: SegmentKind,
    /// Length in meters
    pub length: f64,
    pub name: String,
    pub road_name: String,
    occupancy: u32,
    pub emitter: Option<Emitter>,
    pub remover: Option<Remover>,
    pub bridge: Option<Bridge>,
}

impl Segment {
    /// Build a segment from its spec. Bridges draw their failure status here.
    pub fn from_spec<R: Rng + ?Sized>(
        spec: &SegmentSpec,
        config: &SimConfig,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        let emitter = if spec.kind.emits() {
            let mix = config.vehicle_mix_for_road(&spec.road_name);
            Some(Emitter {
                generated: 0,
                generated_this_tick: false,
                sampler: mix.sampler(&spec.road_name)?,
            })
        } else {
            None
        };

        let remover = spec.kind.removes().then(Remover::default);

        let bridge = (spec.kind == SegmentKind::Bridge).then(|| {
            let condition = spec.condition.clone();
            let probability = config.break_probability(condition.as_deref());
            Bridge::new(
                &spec.id,
                condition,
                probability,
                config.delay_table.for_length(spec.length),
                rng,
            )
        });

        Ok(Self {
            id: spec.id.clone(),
            kind: spec.kind,
            length: spec.length,
            name: spec.name.clone(),
            road_name: spec.road_name.clone(),
            occupancy: 0,
            emitter,
            remover,
            bridge,
        })
    }

    /// Vehicles currently on this segment
    pub fn occupancy(&self) -> u32 {
        self.occupancy
    }

    pub fn is_sink(&self) -> bool {
        self.remover.is_some()
    }

    /// A vehicle comes to rest on this segment
    pub fn enter(&mut self) {
        self.occupancy += 1;
    }

    /// A vehicle leaves this segment. Vacating a bridge resets its queue.
    pub fn leave(&mut self) -> Result<()> {
        if self.occupancy == 0 {
            bail!("Occupancy of segment {} would go negative", self.id);
        }
        self.occupancy -= 1;

        if self.occupancy == 0 {
            if let Some(bridge) = &mut self.bridge {
                bridge.on_vacated();
            }
        }
        Ok(())
    }

    /// A vehicle reached this sink and is taken off the network.
    /// It counts towards occupancy until the start of the next tick.
    pub fn absorb(&mut self) -> Result<()> {
        let Some(remover) = &mut self.remover else {
            bail!("Segment {} cannot remove vehicles", self.id);
        };
        remover.removed += 1;
        remover.removed_toggle = !remover.removed_toggle;
        remover.resting += 1;
        self.occupancy += 1;
        Ok(())
    }

    /// Vehicles that arrived during the current tick
    pub fn resting(&self) -> u32 {
        self.remover.as_ref().map_or(0, |r| r.resting)
    }

    /// Drop vehicles absorbed on the previous tick from the occupancy count
    pub fn settle_absorbed(&mut self) {
        if let Some(remover) = &mut self.remover {
            self.occupancy = self.occupancy.saturating_sub(remover.resting);
            remover.resting = 0;
        }
    }
}

/// All segments of a run, in insertion order, addressable by id
#[derive(Debug, Clone, Default)]
pub struct Segments {
    list: Vec<Segment>,
    by_id: HashMap<SegmentId, usize>,
}

impl Segments {
    pub fn push(&mut self, segment: Segment) -> Result<usize, ConfigError> {
        if self.by_id.contains_key(&segment.id) {
            return Err(ConfigError::DuplicateSegment(segment.id.clone()));
        }
        let index = self.list.len();
        self.by_id.insert(segment.id.clone(), index);
        self.list.push(segment);
        Ok(index)
    }

    pub fn index_of(&self, id: &SegmentId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, id: &SegmentId) -> Option<&Segment> {
        self.index_of(id).map(|index| &self.list[index])
    }

    pub fn get_mut(&mut self, id: &SegmentId) -> Option<&mut Segment> {
        self.index_of(id).map(move |index| &mut self.list[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.list.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Segment> {
        self.list.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Total vehicles counted on all segments
    pub fn total_occupancy(&self) -> u64 {
        self.list.iter().map(|s| u64::from(s.occupancy())).sum()
    }

    /// Move one vehicle's occupancy from one segment to another
    pub fn transfer(&mut self, from: usize, to: usize) -> Result<()> {
        self.list[from].leave()?;
        self.list[to].enter();
        Ok(())
    }
}

impl Index<usize> for Segments {
    type Output = Segment;

    fn index(&self, index: usize) -> &Segment {
        &self.list[index]
    }
}

impl IndexMut<usize> for Segments {
    fn index_mut(&mut self, index: usize) -> &mut Segment {
        &mut self.list[index]
    }
}
