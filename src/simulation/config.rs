//! Scenario configuration for a simulation run
//!
//! Everything a scenario can vary lives here: bridge break probabilities,
//! delay distributions per bridge length class, the vehicle mix emitted by
//! sources, routing-policy thresholds and the active delay model.

use std::collections::HashMap;

use rand::distr::weighted::WeightedIndex;

use super::error::ConfigError;
use super::types::{VehicleClass, DEFAULT_GENERATION_INTERVAL, DEFAULT_TICK_MINUTES};

/// Bridge length category used to select a delay distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthClass {
    Under10,
    From10To50,
    From50To200,
    Over200,
}

impl LengthClass {
    pub fn for_length(length: f64) -> Self {
        if length > 200.0 {
            LengthClass::Over200
        } else if length > 50.0 {
            LengthClass::From50To200
        } else if length > 10.0 {
            LengthClass::From10To50
        } else {
            LengthClass::Under10
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LengthClass::Under10 => "under10",
            LengthClass::From10To50 => "from10to50",
            LengthClass::From50To200 => "from50to200",
            LengthClass::Over200 => "over200",
        }
    }
}

/// Distribution a broken bridge draws its delay from. Values are minutes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DelayDistribution {
    /// Exponential with mean `length * delay_per_meter`
    Exponential { delay_per_meter: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
    Uniform { min: f64, max: f64 },
}

impl DelayDistribution {
    fn validate(&self, class: LengthClass) -> Result<(), ConfigError> {
        let malformed = |reason: String| ConfigError::MalformedDelayDistribution {
            class: class.name(),
            reason,
        };

        match *self {
            DelayDistribution::Exponential { delay_per_meter } => {
                if !delay_per_meter.is_finite() || delay_per_meter < 0.0 {
                    return Err(malformed(format!("delay per meter {delay_per_meter}")));
                }
            }
            DelayDistribution::Triangular { min, mode, max } => {
                if ![min, mode, max].iter().all(|v| v.is_finite()) || min < 0.0 {
                    return Err(malformed(format!("bounds {min} / {mode} / {max}")));
                }
                if !(min <= mode && mode <= max) {
                    return Err(malformed(format!("mode {mode} outside [{min}, {max}]")));
                }
            }
            DelayDistribution::Uniform { min, max } => {
                if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
                    return Err(malformed(format!("range [{min}, {max}]")));
                }
            }
        }

        Ok(())
    }
}

/// One delay distribution per bridge length class
#[derive(Debug, Clone, PartialEq)]
pub struct DelayTable {
    pub under_10: DelayDistribution,
    pub from_10_to_50: DelayDistribution,
    pub from_50_to_200: DelayDistribution,
    pub over_200: DelayDistribution,
}

impl DelayTable {
    /// Every length class uses the same distribution
    pub fn uniform_for_all(distribution: DelayDistribution) -> Self {
        Self {
            under_10: distribution,
            from_10_to_50: distribution,
            from_50_to_200: distribution,
            over_200: distribution,
        }
    }

    pub fn for_length(&self, length: f64) -> DelayDistribution {
        self.get(LengthClass::for_length(length))
    }

    pub fn get(&self, class: LengthClass) -> DelayDistribution {
        match class {
            LengthClass::Under10 => self.under_10,
            LengthClass::From10To50 => self.from_10_to_50,
            LengthClass::From50To200 => self.from_50_to_200,
            LengthClass::Over200 => self.over_200,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for class in [
            LengthClass::Under10,
            LengthClass::From10To50,
            LengthClass::From50To200,
            LengthClass::Over200,
        ] {
            self.get(class).validate(class)?;
        }
        Ok(())
    }
}

impl Default for DelayTable {
    fn default() -> Self {
        Self {
            under_10: DelayDistribution::Uniform { min: 10.0, max: 20.0 },
            from_10_to_50: DelayDistribution::Uniform { min: 15.0, max: 60.0 },
            from_50_to_200: DelayDistribution::Triangular {
                min: 45.0,
                mode: 60.0,
                max: 90.0,
            },
            over_200: DelayDistribution::Triangular {
                min: 60.0,
                mode: 120.0,
                max: 240.0,
            },
        }
    }
}

/// Relative generation weights per vehicle class
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleMix {
    pub weights: Vec<(VehicleClass, f64)>,
}

impl VehicleMix {
    pub fn new(weights: Vec<(VehicleClass, f64)>) -> Self {
        Self { weights }
    }

    /// A mix that only ever produces `class`
    pub fn single(class: VehicleClass) -> Self {
        Self::new(vec![(class, 1.0)])
    }

    /// Build the categorical sampler used by an emitter
    pub fn sampler(&self, label: &str) -> Result<VehicleMixSampler, ConfigError> {
        let invalid = || ConfigError::InvalidVehicleMix(label.to_string());

        if self.weights.iter().any(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(invalid());
        }

        let index = WeightedIndex::new(self.weights.iter().map(|(_, w)| *w))
            .map_err(|_| invalid())?;

        Ok(VehicleMixSampler {
            classes: self.weights.iter().map(|(class, _)| *class).collect(),
            index,
        })
    }
}

impl Default for VehicleMix {
    fn default() -> Self {
        Self::new(vec![
            (VehicleClass::LargeBus, 0.20),
            (VehicleClass::HeavyTruck, 0.15),
            (VehicleClass::MediumTruck, 0.15),
            (VehicleClass::SmallTruck, 0.25),
            (VehicleClass::MiniBus, 0.25),
        ])
    }
}

/// Prepared categorical draw over a [`VehicleMix`]
#[derive(Debug, Clone)]
pub struct VehicleMixSampler {
    pub classes: Vec<VehicleClass>,
    pub index: WeightedIndex<f64>,
}

/// Cumulative thresholds for picking a routing policy from one uniform draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutingThresholds {
    /// Below this: random sink, shortest path
    pub random: f64,
    /// Below this: authored straight road
    pub straight: f64,
    /// Below this: nearest sink; above: longest route
    pub nearest_sink: f64,
}

impl RoutingThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        let values = [self.random, self.straight, self.nearest_sink];
        let in_range = values.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v));
        let ascending = self.random <= self.straight && self.straight <= self.nearest_sink;

        if in_range && ascending {
            Ok(())
        } else {
            Err(ConfigError::InvalidRoutingThresholds {
                random: self.random,
                straight: self.straight,
                nearest_sink: self.nearest_sink,
            })
        }
    }
}

impl Default for RoutingThresholds {
    fn default() -> Self {
        Self {
            random: 0.5,
            straight: 0.9,
            nearest_sink: 0.95,
        }
    }
}

/// How a broken bridge hands out delays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayModel {
    /// Independent draw per vehicle, raised so no vehicle leaves before an
    /// earlier arrival
    #[default]
    Sampled,
    /// One shared countdown per queue, extended by a tick per extra arrival
    IncrementalQueue,
}

/// How vehicles pick their speed on a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedPolicy {
    #[default]
    Constant,
    /// Slow down on crowded segments, speed up on empty ones
    CongestionAware,
}

/// Full configuration of one simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub tick_minutes: f64,
    pub generation_interval: u64,
    /// Condition class -> break probability. Missing classes never break.
    pub break_probabilities: HashMap<String, f64>,
    pub delay_table: DelayTable,
    pub vehicle_mix: VehicleMix,
    /// Per-road overrides of `vehicle_mix`, keyed by road name
    pub road_vehicle_mix: HashMap<String, VehicleMix>,
    pub routing: RoutingThresholds,
    pub delay_model: DelayModel,
    pub speed_policy: SpeedPolicy,
    /// Maximum simple paths enumerated per origin by the longest-route policy
    pub longest_route_budget: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_minutes: DEFAULT_TICK_MINUTES,
            generation_interval: DEFAULT_GENERATION_INTERVAL,
            break_probabilities: HashMap::new(),
            delay_table: DelayTable::default(),
            vehicle_mix: VehicleMix::default(),
            road_vehicle_mix: HashMap::new(),
            routing: RoutingThresholds::default(),
            delay_model: DelayModel::default(),
            speed_policy: SpeedPolicy::default(),
            longest_route_budget: 10_000,
        }
    }
}

impl SimConfig {
    /// Break probability for a bridge condition class
    pub fn break_probability(&self, condition: Option<&str>) -> f64 {
        condition
            .and_then(|c| self.break_probabilities.get(c))
            .copied()
            .unwrap_or(0.0)
    }

    /// Vehicle mix for sources on the given road
    pub fn vehicle_mix_for_road(&self, road_name: &str) -> &VehicleMix {
        self.road_vehicle_mix
            .get(road_name)
            .unwrap_or(&self.vehicle_mix)
    }

    /// Check the whole configuration, failing on the first problem
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_minutes.is_finite() || self.tick_minutes <= 0.0 {
            return Err(ConfigError::InvalidTickDuration(self.tick_minutes));
        }
        if self.generation_interval == 0 {
            return Err(ConfigError::ZeroGenerationInterval);
        }
        if self.longest_route_budget == 0 {
            return Err(ConfigError::ZeroLongestRouteBudget);
        }

        // Sorted so the reported error does not depend on hash order
        let mut conditions: Vec<_> = self.break_probabilities.iter().collect();
        conditions.sort_by(|a, b| a.0.cmp(b.0));
        for (condition, &value) in conditions {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidBreakProbability {
                    condition: condition.clone(),
                    value,
                });
            }
        }

        self.delay_table.validate()?;
        self.routing.validate()?;
        self.vehicle_mix.sampler("default")?;
        for (road, mix) in &self.road_vehicle_mix {
            mix.sampler(road)?;
        }

        Ok(())
    }
}
