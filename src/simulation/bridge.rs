//! Bridge failure and delay model
//!
//! A bridge draws its failure status once, when the world is built. A working
//! bridge never delays anyone. A broken bridge hands out delays according to
//! the configured [`DelayModel`], in whole ticks.

use log::debug;
use rand::distr::Uniform;
use rand::Rng;
use rand_distr::{Distribution, Exp, Triangular};

use super::config::{DelayDistribution, DelayModel};
use super::types::{SegmentId, Tick, VehicleId};

/// The most recent vehicle queued at a bridge and the tick it is released
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastArrival {
    pub vehicle: VehicleId,
    pub release_tick: Tick,
}

/// Failure and queue state of a bridge segment
#[derive(Debug, Clone)]
pub struct Bridge {
    pub condition: Option<String>,
    pub break_probability: f64,
    /// Drawn once at creation, never changes afterwards
    broken: bool,
    pub distribution: DelayDistribution,
    /// Delay handed to the most recent arrival, in ticks
    pub delay_ticks: u32,
    /// Release tick of the shared countdown (incremental-queue model).
    /// Cleared only when the bridge is vacated.
    queue_release: Option<Tick>,
    last_arrival: Option<LastArrival>,
}

impl Bridge {
    pub fn new<R: Rng + ?Sized>(
        id: &SegmentId,
        condition: Option<String>,
        break_probability: f64,
        distribution: DelayDistribution,
        rng: &mut R,
    ) -> Self {
        let broken = rng.random_bool(break_probability.clamp(0.0, 1.0));
        debug!(
            "Status for bridge {} is set to {}",
            id,
            if broken { "broken" } else { "working" }
        );

        Self {
            condition,
            break_probability,
            broken,
            distribution,
            delay_ticks: 0,
            queue_release: None,
            last_arrival: None,
        }
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn last_arrival(&self) -> Option<&LastArrival> {
        self.last_arrival.as_ref()
    }

    /// Whether vehicles are still queued behind an outstanding delay
    pub fn has_queue(&self, now: Tick) -> bool {
        self.queue_release.is_some_and(|release| release >= now)
    }

    /// Delay, in ticks, for a vehicle arriving at `now`
    pub fn delay_for_arrival<R: Rng + ?Sized>(
        &mut self,
        model: DelayModel,
        length: f64,
        tick_minutes: f64,
        now: Tick,
        rng: &mut R,
    ) -> u32 {
        if !self.broken {
            return 0;
        }

        let delay = match model {
            DelayModel::Sampled => {
                let mut delay = self.sample_ticks(length, tick_minutes, rng);
                // Never let a later arrival leave before the previous one
                if let Some(last) = &self.last_arrival {
                    let remaining = last.release_tick.saturating_sub(now);
                    if u64::from(delay) <= remaining {
                        delay = u32::try_from(remaining + 1).unwrap_or(u32::MAX);
                    }
                }
                delay
            }
            // The queue lives until the bridge is vacated, even past its countdown
            DelayModel::IncrementalQueue => match self.queue_release {
                Some(release) => {
                    let extended = release.max(now) + 1;
                    self.queue_release = Some(extended);
                    u32::try_from(extended - now).unwrap_or(u32::MAX)
                }
                None => {
                    let delay = self.sample_ticks(length, tick_minutes, rng);
                    self.queue_release = (delay > 0).then(|| now + u64::from(delay));
                    delay
                }
            },
        };

        self.delay_ticks = delay;
        delay
    }

    /// Remember `vehicle` as the latest vehicle queued here
    pub fn register_arrival(&mut self, vehicle: VehicleId, release_tick: Tick) {
        self.last_arrival = Some(LastArrival {
            vehicle,
            release_tick,
        });
    }

    /// Clear the latest-arrival marker if `vehicle` holds it
    pub fn release(&mut self, vehicle: &VehicleId) {
        if self
            .last_arrival
            .as_ref()
            .is_some_and(|last| &last.vehicle == vehicle)
        {
            self.last_arrival = None;
        }
    }

    /// The last vehicle left the bridge; the queue is empty again
    pub fn on_vacated(&mut self) {
        self.queue_release = None;
        self.delay_ticks = 0;
    }

    fn sample_ticks<R: Rng + ?Sized>(&self, length: f64, tick_minutes: f64, rng: &mut R) -> u32 {
        let minutes = sample_minutes(self.distribution, length, rng);
        minutes_to_ticks(minutes, tick_minutes)
    }
}

/// Draw a delay in minutes for a bridge of the given length
pub fn sample_minutes<R: Rng + ?Sized>(
    distribution: DelayDistribution,
    length: f64,
    rng: &mut R,
) -> f64 {
    match distribution {
        DelayDistribution::Exponential { delay_per_meter } => {
            let mean = length * delay_per_meter;
            if mean <= 0.0 {
                return 0.0;
            }
            Exp::new(1.0 / mean)
                .map(|exp| exp.sample(rng))
                .unwrap_or(mean)
        }
        DelayDistribution::Triangular { min, mode, max } => {
            if min >= max {
                return min;
            }
            Triangular::new(min, max, mode)
                .map(|tri| tri.sample(rng))
                .unwrap_or(mode)
        }
        DelayDistribution::Uniform { min, max } => {
            if min >= max {
                return min;
            }
            Uniform::new(min, max)
                .map(|uniform| uniform.sample(rng))
                .unwrap_or(min)
        }
    }
}

/// Whole ticks needed to sit out `minutes`; any positive delay is at least one tick
pub fn minutes_to_ticks(minutes: f64, tick_minutes: f64) -> u32 {
    if !(minutes > 0.0) {
        return 0;
    }
    let ticks = (minutes / tick_minutes).ceil();
    if ticks >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        ticks as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn broken_bridge(rng: &mut StdRng, distribution: DelayDistribution) -> Bridge {
        Bridge::new(&SegmentId::new("B"), Some("D".into()), 1.0, distribution, rng)
    }

    fn vehicle(name: &str) -> VehicleId {
        VehicleId(name.to_string())
    }

    #[test]
    fn test_status_follows_break_probability() {
        let mut rng = StdRng::seed_from_u64(7);
        let dist = DelayDistribution::Uniform { min: 1.0, max: 2.0 };
        let id = SegmentId::new("B");
        assert!(Bridge::new(&id, None, 1.0, dist, &mut rng).is_broken());
        assert!(!Bridge::new(&id, None, 0.0, dist, &mut rng).is_broken());
    }

    #[test]
    fn test_working_bridge_never_delays() {
        let mut rng = StdRng::seed_from_u64(1);
        let dist = DelayDistribution::Exponential { delay_per_meter: 5.0 };
        let mut bridge = Bridge::new(&SegmentId::new("B"), None, 0.0, dist, &mut rng);

        for now in 0..50 {
            assert_eq!(bridge.delay_for_arrival(DelayModel::Sampled, 100.0, 1.0, now, &mut rng), 0);
            assert_eq!(
                bridge.delay_for_arrival(DelayModel::IncrementalQueue, 100.0, 1.0, now, &mut rng),
                0
            );
        }
    }

    #[test]
    fn test_sampled_delay_respects_previous_arrival() {
        let mut rng = StdRng::seed_from_u64(3);
        // Always two minutes
        let dist = DelayDistribution::Uniform { min: 2.0, max: 2.0 };
        let mut bridge = broken_bridge(&mut rng, dist);

        // Earlier vehicle still has 10 ticks to wait at tick 5
        bridge.register_arrival(vehicle("first"), 15);
        let delay = bridge.delay_for_arrival(DelayModel::Sampled, 20.0, 1.0, 5, &mut rng);
        assert_eq!(delay, 11);
        assert!(5 + u64::from(delay) >= 15);
    }

    #[test]
    fn test_sampled_delay_equal_to_remaining_is_raised() {
        let mut rng = StdRng::seed_from_u64(3);
        let dist = DelayDistribution::Uniform { min: 10.0, max: 10.0 };
        let mut bridge = broken_bridge(&mut rng, dist);

        // Earlier vehicle leaves at tick 15; a plain sample would tie with it
        bridge.register_arrival(vehicle("first"), 15);
        let delay = bridge.delay_for_arrival(DelayModel::Sampled, 20.0, 1.0, 5, &mut rng);
        assert_eq!(delay, 11);
        assert!(5 + u64::from(delay) >= 16);
    }

    #[test]
    fn test_sampled_delay_kept_when_already_later() {
        let mut rng = StdRng::seed_from_u64(3);
        let dist = DelayDistribution::Uniform { min: 30.0, max: 30.0 };
        let mut bridge = broken_bridge(&mut rng, dist);

        bridge.register_arrival(vehicle("first"), 12);
        let delay = bridge.delay_for_arrival(DelayModel::Sampled, 20.0, 1.0, 10, &mut rng);
        assert_eq!(delay, 30);
    }

    #[test]
    fn test_release_only_clears_own_marker() {
        let mut rng = StdRng::seed_from_u64(3);
        let dist = DelayDistribution::Uniform { min: 2.0, max: 2.0 };
        let mut bridge = broken_bridge(&mut rng, dist);

        bridge.register_arrival(vehicle("second"), 20);
        bridge.release(&vehicle("first"));
        assert!(bridge.last_arrival().is_some());
        bridge.release(&vehicle("second"));
        assert!(bridge.last_arrival().is_none());
    }

    #[test]
    fn test_incremental_queue_extends_shared_countdown() {
        let mut rng = StdRng::seed_from_u64(11);
        let dist = DelayDistribution::Uniform { min: 8.0, max: 8.0 };
        let mut bridge = broken_bridge(&mut rng, dist);

        let first = bridge.delay_for_arrival(DelayModel::IncrementalQueue, 20.0, 1.0, 0, &mut rng);
        assert_eq!(first, 8);
        assert!(bridge.has_queue(0));

        // Arrives 3 ticks later, released one tick after the first vehicle
        let second = bridge.delay_for_arrival(DelayModel::IncrementalQueue, 20.0, 1.0, 3, &mut rng);
        assert_eq!(3 + u64::from(second), 9);

        let third = bridge.delay_for_arrival(DelayModel::IncrementalQueue, 20.0, 1.0, 3, &mut rng);
        assert_eq!(3 + u64::from(third), 10);
    }

    #[test]
    fn test_occupied_bridge_keeps_extending_expired_countdown() {
        let mut rng = StdRng::seed_from_u64(11);
        let dist = DelayDistribution::Uniform { min: 8.0, max: 8.0 };
        let mut bridge = broken_bridge(&mut rng, dist);

        assert_eq!(bridge.delay_for_arrival(DelayModel::IncrementalQueue, 20.0, 1.0, 0, &mut rng), 8);

        // Countdown ran out at tick 8 but the bridge was never vacated
        let late = bridge.delay_for_arrival(DelayModel::IncrementalQueue, 20.0, 1.0, 20, &mut rng);
        assert_eq!(late, 1);
        assert!(bridge.has_queue(21));
    }

    #[test]
    fn test_vacated_bridge_starts_fresh_queue() {
        let mut rng = StdRng::seed_from_u64(11);
        let dist = DelayDistribution::Uniform { min: 4.0, max: 4.0 };
        let mut bridge = broken_bridge(&mut rng, dist);

        bridge.delay_for_arrival(DelayModel::IncrementalQueue, 20.0, 1.0, 0, &mut rng);
        bridge.delay_for_arrival(DelayModel::IncrementalQueue, 20.0, 1.0, 1, &mut rng);
        bridge.on_vacated();
        assert!(!bridge.has_queue(2));

        let fresh = bridge.delay_for_arrival(DelayModel::IncrementalQueue, 20.0, 1.0, 2, &mut rng);
        assert_eq!(fresh, 4);
    }

    #[test]
    fn test_exponential_delay_scales_with_length() {
        let mut rng = StdRng::seed_from_u64(42);
        let dist = DelayDistribution::Exponential { delay_per_meter: 0.05 };

        let samples = 4000;
        let mean = (0..samples)
            .map(|_| sample_minutes(dist, 100.0, &mut rng))
            .sum::<f64>()
            / samples as f64;
        // Mean is length * rate = 5 minutes
        assert!((mean - 5.0).abs() < 0.5, "mean was {mean}");

        assert_eq!(sample_minutes(dist, 0.0, &mut rng), 0.0);
    }

    #[test]
    fn test_triangular_and_uniform_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        let tri = DelayDistribution::Triangular { min: 10.0, mode: 20.0, max: 60.0 };
        let uni = DelayDistribution::Uniform { min: 5.0, max: 7.5 };

        for _ in 0..500 {
            let t = sample_minutes(tri, 100.0, &mut rng);
            assert!((10.0..=60.0).contains(&t));
            let u = sample_minutes(uni, 100.0, &mut rng);
            assert!((5.0..7.5).contains(&u));
        }
    }

    #[test]
    fn test_minutes_to_ticks_rounds_up() {
        assert_eq!(minutes_to_ticks(0.0, 1.0), 0);
        assert_eq!(minutes_to_ticks(-1.0, 1.0), 0);
        assert_eq!(minutes_to_ticks(0.2, 1.0), 1);
        assert_eq!(minutes_to_ticks(3.0, 1.0), 3);
        assert_eq!(minutes_to_ticks(3.01, 1.0), 4);
        assert_eq!(minutes_to_ticks(10.0, 5.0), 2);
    }
}
