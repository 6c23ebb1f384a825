//! Statistics collected during a run
//!
//! Rows are appended as trips complete and bridges are crossed, and are
//! never changed afterwards.

use super::types::{SegmentId, Tick, VehicleClass, VehicleId};

/// One completed trip
#[derive(Debug, Clone, PartialEq)]
pub struct TravelTimeRecord {
    pub vehicle_id: VehicleId,
    /// Ticks between creation and removal
    pub travel_time: Tick,
    /// Ticks spent queued at bridges over the whole trip
    pub total_waiting_time: u64,
    pub origin: SegmentId,
    pub destination: SegmentId,
    pub class: VehicleClass,
}

/// One vehicle reaching a bridge. Working bridges record zero.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitingTimeRecord {
    pub vehicle_id: VehicleId,
    pub bridge_id: SegmentId,
    pub waiting_time: u32,
    pub class: VehicleClass,
}

/// Append-only store of result rows
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    travel_times: Vec<TravelTimeRecord>,
    waiting_times: Vec<WaitingTimeRecord>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_travel_time(&mut self, record: TravelTimeRecord) {
        self.travel_times.push(record);
    }

    pub fn record_waiting_time(&mut self, record: WaitingTimeRecord) {
        self.waiting_times.push(record);
    }

    /// Copy of all travel-time rows, in insertion order
    pub fn travel_time_records(&self) -> Vec<TravelTimeRecord> {
        self.travel_times.clone()
    }

    /// Copy of all waiting-time rows, in insertion order
    pub fn waiting_time_records(&self) -> Vec<WaitingTimeRecord> {
        self.waiting_times.clone()
    }

    pub fn travel_time_count(&self) -> usize {
        self.travel_times.len()
    }

    pub fn waiting_time_count(&self) -> usize {
        self.waiting_times.len()
    }

    /// Mean travel time in ticks, if any trip completed
    pub fn mean_travel_time(&self) -> Option<f64> {
        mean(self.travel_times.iter().map(|r| r.travel_time as f64))
    }

    /// Mean waiting time per bridge encounter, in ticks
    pub fn mean_waiting_time(&self) -> Option<f64> {
        mean(self.waiting_times.iter().map(|r| f64::from(r.waiting_time)))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Snapshot of run-level counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationStats {
    pub ticks: Tick,
    pub vehicles_generated: u64,
    pub vehicles_completed: u64,
    pub active_vehicles: usize,
    pub waiting_vehicles: usize,
    pub skipped_spawns: u64,
    pub dropped_vehicles: u64,
    pub broken_bridges: usize,
    pub total_bridges: usize,
    pub mean_travel_time: Option<f64>,
    pub mean_waiting_time: Option<f64>,
}

impl SimulationStats {
    /// Share of generated vehicles that completed their trip, in percent
    pub fn completion_rate(&self) -> f64 {
        if self.vehicles_generated > 0 {
            self.vehicles_completed as f64 / self.vehicles_generated as f64 * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn travel(id: &str, travel_time: Tick) -> TravelTimeRecord {
        TravelTimeRecord {
            vehicle_id: VehicleId(id.to_string()),
            travel_time,
            total_waiting_time: 0,
            origin: SegmentId::new("S"),
            destination: SegmentId::new("K"),
            class: VehicleClass::SmallTruck,
        }
    }

    #[test]
    fn test_records_keep_insertion_order() {
        let mut stats = StatsCollector::new();
        stats.record_travel_time(travel("b", 4));
        stats.record_travel_time(travel("a", 2));

        let ids: Vec<_> = stats
            .travel_time_records()
            .into_iter()
            .map(|r| r.vehicle_id.0)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut stats = StatsCollector::new();
        stats.record_travel_time(travel("a", 2));
        let snapshot = stats.travel_time_records();
        stats.record_travel_time(travel("b", 3));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(stats.travel_time_count(), 2);
    }

    #[test]
    fn test_means() {
        let mut stats = StatsCollector::new();
        assert_eq!(stats.mean_travel_time(), None);

        stats.record_travel_time(travel("a", 2));
        stats.record_travel_time(travel("b", 6));
        assert_eq!(stats.mean_travel_time(), Some(4.0));

        stats.record_waiting_time(WaitingTimeRecord {
            vehicle_id: VehicleId("a".to_string()),
            bridge_id: SegmentId::new("B"),
            waiting_time: 3,
            class: VehicleClass::MiniBus,
        });
        assert_eq!(stats.mean_waiting_time(), Some(3.0));
    }

    #[test]
    fn test_completion_rate() {
        let stats = SimulationStats {
            vehicles_generated: 8,
            vehicles_completed: 6,
            ..SimulationStats::default()
        };
        assert_eq!(stats.completion_rate(), 75.0);
        assert_eq!(SimulationStats::default().completion_rate(), 0.0);
    }
}
