//! Route selection for newly generated vehicles
//!
//! Four policies share one path cache keyed by origin and destination:
//! a random sink over the shortest path, the authored straight road, the
//! nearest sink, and the farthest sink over its longest simple path.
//! Cached paths are never invalidated; the topology is fixed for a run.

use log::warn;
use ordered_float::OrderedFloat;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

use super::config::RoutingThresholds;
use super::error::RouteError;
use super::road_network::{PathBudgetExceeded, SimRoadNetwork};
use super::types::{Path, SegmentId};

/// Destination half of a path cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    Sink(SegmentId),
    /// The authored road starting at the origin
    Straight,
    /// The longest-route policy's pick for the origin
    Longest,
}

/// Which policy produced a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutePolicy {
    Random,
    Straight,
    NearestSink,
    Longest,
}

/// Computes and caches routes over a [`SimRoadNetwork`]
#[derive(Debug)]
pub struct RouteEngine {
    path_cache: HashMap<(SegmentId, Destination), Path>,
    /// Memoized nearest sink per origin
    nearest_sink: HashMap<SegmentId, SegmentId>,
    thresholds: RoutingThresholds,
    longest_route_budget: usize,
    /// Number of paths computed from the graph (cache misses)
    computed_paths: usize,
}

impl RouteEngine {
    /// Create an engine with the authored roads pre-registered in both
    /// directions, under `(first, Straight)` and `(first, Sink(last))`.
    pub fn new(
        network: &SimRoadNetwork,
        thresholds: RoutingThresholds,
        longest_route_budget: usize,
    ) -> Self {
        let mut engine = Self {
            path_cache: HashMap::new(),
            nearest_sink: HashMap::new(),
            thresholds,
            longest_route_budget,
            computed_paths: 0,
        };

        for road in network.roads() {
            let forward: Vec<SegmentId> = road.segments.clone();
            let backward: Vec<SegmentId> = road.segments.iter().rev().cloned().collect();

            for ids in [forward, backward] {
                let (Some(first), Some(last)) = (ids.first().cloned(), ids.last().cloned()) else {
                    continue;
                };
                let path: Path = Arc::from(ids);
                engine
                    .path_cache
                    .insert((first.clone(), Destination::Straight), path.clone());
                engine
                    .path_cache
                    .insert((first, Destination::Sink(last)), path);
            }
        }

        engine
    }

    pub fn thresholds(&self) -> RoutingThresholds {
        self.thresholds
    }

    /// How many paths have been computed from the graph so far
    pub fn computed_paths(&self) -> usize {
        self.computed_paths
    }

    pub fn cached_path(&self, origin: &SegmentId, destination: &Destination) -> Option<Path> {
        self.path_cache
            .get(&(origin.clone(), destination.clone()))
            .cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.path_cache.len()
    }

    /// Pick a policy with one uniform draw and resolve the route
    pub fn select_route<R: Rng + ?Sized>(
        &mut self,
        network: &SimRoadNetwork,
        origin: &SegmentId,
        rng: &mut R,
    ) -> Result<(RoutePolicy, Path), RouteError> {
        let chance: f64 = rng.random();
        let policy = self.policy_for(chance);

        let path = match policy {
            RoutePolicy::Random => self.random_route(network, origin, rng)?,
            RoutePolicy::Straight => self.straight_route(origin)?,
            RoutePolicy::NearestSink => self.shortest_to_nearest_sink(network, origin)?,
            RoutePolicy::Longest => self.longest_route(network, origin)?,
        };

        Ok((policy, path))
    }

    /// Map a uniform draw in [0, 1) onto a policy
    pub fn policy_for(&self, chance: f64) -> RoutePolicy {
        if chance < self.thresholds.random {
            RoutePolicy::Random
        } else if chance < self.thresholds.straight {
            RoutePolicy::Straight
        } else if chance < self.thresholds.nearest_sink {
            RoutePolicy::NearestSink
        } else {
            RoutePolicy::Longest
        }
    }

    /// Shortest path to a uniformly chosen sink other than the origin
    pub fn random_route<R: Rng + ?Sized>(
        &mut self,
        network: &SimRoadNetwork,
        origin: &SegmentId,
        rng: &mut R,
    ) -> Result<Path, RouteError> {
        if !network.contains(origin) {
            return Err(RouteError::UnknownOrigin(origin.clone()));
        }

        let candidates: Vec<&SegmentId> =
            network.sinks().iter().filter(|sink| *sink != origin).collect();
        let sink = candidates
            .choose(rng)
            .map(|sink| (*sink).clone())
            .ok_or_else(|| RouteError::NoOtherSink(origin.clone()))?;

        self.shortest_path_cached(network, origin, &sink)
    }

    /// The authored road starting at the origin
    pub fn straight_route(&self, origin: &SegmentId) -> Result<Path, RouteError> {
        self.cached_path(origin, &Destination::Straight)
            .ok_or_else(|| RouteError::NoStraightRoute(origin.clone()))
    }

    /// Shortest path to the sink closest to the origin by edge weight.
    /// Ties go to the sink registered first.
    pub fn shortest_to_nearest_sink(
        &mut self,
        network: &SimRoadNetwork,
        origin: &SegmentId,
    ) -> Result<Path, RouteError> {
        if let Some(sink) = self.nearest_sink.get(origin).cloned() {
            return self.shortest_path_cached(network, origin, &sink);
        }

        let distances = network
            .distances_from(origin)
            .ok_or_else(|| RouteError::UnknownOrigin(origin.clone()))?;

        let sink = network
            .sinks()
            .iter()
            .filter(|sink| *sink != origin)
            .filter_map(|sink| distances.get(sink).map(|distance| (sink, *distance)))
            .min_by_key(|(_, distance)| OrderedFloat(*distance))
            .map(|(sink, _)| sink.clone())
            .ok_or_else(|| RouteError::NoReachableSink(origin.clone()))?;

        let path = self.shortest_path_cached(network, origin, &sink)?;
        self.nearest_sink.insert(origin.clone(), sink);
        Ok(path)
    }

    /// Longest simple path to the sink that maximizes it, by physical length.
    ///
    /// Enumerating simple paths is exponential in the network size, so the
    /// enumeration for one origin is capped by the configured budget. Past the
    /// budget the nearest-sink route is used instead. Either way the answer is
    /// cached and never recomputed.
    pub fn longest_route(
        &mut self,
        network: &SimRoadNetwork,
        origin: &SegmentId,
    ) -> Result<Path, RouteError> {
        if let Some(path) = self.cached_path(origin, &Destination::Longest) {
            return Ok(path);
        }
        if !network.contains(origin) {
            return Err(RouteError::UnknownOrigin(origin.clone()));
        }

        let mut budget = self.longest_route_budget;
        let mut best: Option<(Vec<SegmentId>, f64)> = None;
        let mut over_budget = false;

        for sink in network.sinks().iter().filter(|sink| *sink != origin) {
            match network.longest_simple_path(origin, sink, &mut budget) {
                Ok(Some((path, length))) => {
                    if best.as_ref().map_or(true, |(_, longest)| length > *longest) {
                        best = Some((path, length));
                    }
                }
                Ok(None) => {}
                Err(PathBudgetExceeded) => {
                    over_budget = true;
                    break;
                }
            }
        }

        let path = if over_budget {
            warn!(
                "Longest route from {} exceeded the budget of {} paths; using the nearest sink",
                origin, self.longest_route_budget
            );
            self.shortest_to_nearest_sink(network, origin)?
        } else {
            let (ids, _) = best.ok_or_else(|| RouteError::NoReachableSink(origin.clone()))?;
            self.computed_paths += 1;
            Arc::from(ids)
        };

        self.path_cache
            .insert((origin.clone(), Destination::Longest), path.clone());
        Ok(path)
    }

    fn shortest_path_cached(
        &mut self,
        network: &SimRoadNetwork,
        origin: &SegmentId,
        sink: &SegmentId,
    ) -> Result<Path, RouteError> {
        let key = (origin.clone(), Destination::Sink(sink.clone()));
        if let Some(path) = self.path_cache.get(&key) {
            return Ok(path.clone());
        }

        let ids = network
            .shortest_path(origin, sink)
            .ok_or_else(|| RouteError::NoPath {
                from: origin.clone(),
                to: sink.clone(),
            })?;
        self.computed_paths += 1;

        let path: Path = Arc::from(ids);
        self.path_cache.insert(key, path.clone());
        Ok(path)
    }
}
