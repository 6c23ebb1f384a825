use freight_sim::simulation::{
    Destination, RouteEngine, RouteError, RoutePolicy, RoutingThresholds, SegmentId, SegmentKind,
    SegmentSpec, SimRoadNetwork, Topology,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Two roads crossing at X, with an extra shortcut between L2 and L4.
///
/// ```text
///   A - L1 - X - L2 - B
///            |  \   |
///   C - L3 --+   L4-+- D
/// ```
fn crossing_topology() -> Topology {
    let mut builder = Topology::builder();
    builder
        .road(
            "R1",
            vec![
                SegmentSpec::new("A", SegmentKind::SourceSink, 0.0, "R1"),
                SegmentSpec::new("L1", SegmentKind::Link, 100.0, "R1"),
                SegmentSpec::new("X", SegmentKind::Intersection, 0.0, "R1"),
                SegmentSpec::new("L2", SegmentKind::Link, 100.0, "R1"),
                SegmentSpec::new("B", SegmentKind::SourceSink, 0.0, "R1"),
            ],
        )
        .road(
            "R2",
            vec![
                SegmentSpec::new("C", SegmentKind::SourceSink, 0.0, "R2"),
                SegmentSpec::new("L3", SegmentKind::Link, 50.0, "R2"),
                SegmentSpec::new("X", SegmentKind::Intersection, 0.0, "R2"),
                SegmentSpec::new("L4", SegmentKind::Link, 400.0, "R2"),
                SegmentSpec::new("D", SegmentKind::Sink, 0.0, "R2"),
            ],
        )
        .edge("L2", "L4", 10.0);
    builder.build()
}

fn ids(names: &[&str]) -> Vec<SegmentId> {
    names.iter().map(|n| SegmentId::new(*n)).collect()
}

fn setup(budget: usize) -> (SimRoadNetwork, RouteEngine) {
    let network = SimRoadNetwork::new(&crossing_topology()).expect("valid topology");
    let engine = RouteEngine::new(&network, RoutingThresholds::default(), budget);
    (network, engine)
}

#[test]
fn test_network_shape() {
    let (network, _) = setup(100);
    assert_eq!(network.segment_count(), 9);
    assert_eq!(network.edge_count(), 9);
    assert_eq!(network.sinks(), ids(&["A", "B", "C", "D"]).as_slice());
}

#[test]
fn test_straight_route_both_directions() {
    let (_, engine) = setup(100);

    let forward = engine.straight_route(&SegmentId::new("A")).unwrap();
    assert_eq!(forward.to_vec(), ids(&["A", "L1", "X", "L2", "B"]));

    let backward = engine.straight_route(&SegmentId::new("B")).unwrap();
    assert_eq!(backward.to_vec(), ids(&["B", "L2", "X", "L1", "A"]));

    // Authored roads are also registered under their far end
    let cached = engine
        .cached_path(&SegmentId::new("D"), &Destination::Sink(SegmentId::new("C")))
        .unwrap();
    assert_eq!(cached.to_vec(), ids(&["D", "L4", "X", "L3", "C"]));

    assert_eq!(
        engine.straight_route(&SegmentId::new("L1")),
        Err(RouteError::NoStraightRoute(SegmentId::new("L1")))
    );
}

#[test]
fn test_nearest_sink_route() {
    let (network, mut engine) = setup(100);

    let path = engine
        .shortest_to_nearest_sink(&network, &SegmentId::new("A"))
        .unwrap();
    assert_eq!(path.to_vec(), ids(&["A", "L1", "X", "L3", "C"]));
}

#[test]
fn test_nearest_sink_tie_goes_to_first_sink() {
    let (network, mut engine) = setup(100);

    // A and B are both 150 away from C
    let path = engine
        .shortest_to_nearest_sink(&network, &SegmentId::new("C"))
        .unwrap();
    assert_eq!(path.last(), Some(&SegmentId::new("A")));
}

#[test]
fn test_cached_routes_are_not_recomputed() {
    let (network, mut engine) = setup(100);
    let origin = SegmentId::new("A");

    let first = engine.shortest_to_nearest_sink(&network, &origin).unwrap();
    let computed = engine.computed_paths();
    let cache_len = engine.cache_len();
    assert_eq!(computed, 1);

    for _ in 0..5 {
        let again = engine.shortest_to_nearest_sink(&network, &origin).unwrap();
        assert_eq!(again, first);
    }
    assert_eq!(engine.computed_paths(), computed);
    assert_eq!(engine.cache_len(), cache_len);

    let longest = engine.longest_route(&network, &origin).unwrap();
    let computed = engine.computed_paths();
    assert_eq!(engine.longest_route(&network, &origin).unwrap(), longest);
    assert_eq!(engine.computed_paths(), computed);
}

#[test]
fn test_longest_route_uses_physical_length() {
    let (network, mut engine) = setup(100);

    // The detours to B and to D are both 600 m; B comes first in sink order
    let path = engine
        .longest_route(&network, &SegmentId::new("A"))
        .unwrap();
    assert_eq!(path.to_vec(), ids(&["A", "L1", "X", "L4", "L2", "B"]));
    assert_eq!(network.path_length(&path).unwrap(), 600.0);
    assert_eq!(
        engine.cached_path(&SegmentId::new("A"), &Destination::Longest),
        Some(path)
    );
}

#[test]
fn test_longest_route_falls_back_past_budget() {
    // Five simple paths exist from A to the other sinks
    let (network, mut engine) = setup(4);

    let path = engine
        .longest_route(&network, &SegmentId::new("A"))
        .unwrap();
    assert_eq!(path.to_vec(), ids(&["A", "L1", "X", "L3", "C"]));

    let (network, mut engine) = setup(5);
    let path = engine
        .longest_route(&network, &SegmentId::new("A"))
        .unwrap();
    assert_eq!(path.last(), Some(&SegmentId::new("B")));
}

#[test]
fn test_random_route_never_returns_origin() {
    let (network, mut engine) = setup(100);
    let mut rng = StdRng::seed_from_u64(99);
    let origin = SegmentId::new("B");

    for _ in 0..50 {
        let path = engine.random_route(&network, &origin, &mut rng).unwrap();
        assert_eq!(path.first(), Some(&origin));
        assert_ne!(path.last(), Some(&origin));
        assert!(network.sinks().contains(path.last().unwrap()));
    }

    // Three destinations at most; one of them is the authored road
    assert!(engine.computed_paths() <= 2);
}

#[test]
fn test_random_route_without_other_sink() {
    let mut builder = Topology::builder();
    builder.road(
        "Solo",
        vec![
            SegmentSpec::new("S", SegmentKind::SourceSink, 0.0, "Solo"),
            SegmentSpec::new("L", SegmentKind::Link, 300.0, "Solo"),
            SegmentSpec::new("E", SegmentKind::Source, 0.0, "Solo"),
        ],
    );
    let network = SimRoadNetwork::new(&builder.build()).unwrap();
    let mut engine = RouteEngine::new(&network, RoutingThresholds::default(), 100);
    let mut rng = StdRng::seed_from_u64(1);

    let origin = SegmentId::new("S");
    assert_eq!(
        engine.random_route(&network, &origin, &mut rng),
        Err(RouteError::NoOtherSink(origin.clone()))
    );
    assert_eq!(
        engine.shortest_to_nearest_sink(&network, &origin),
        Err(RouteError::NoReachableSink(origin))
    );

    let path = engine
        .random_route(&network, &SegmentId::new("E"), &mut rng)
        .unwrap();
    assert_eq!(path.to_vec(), ids(&["E", "L", "S"]));
}

#[test]
fn test_policy_thresholds() {
    let (network, mut engine) = setup(100);
    assert_eq!(engine.policy_for(0.0), RoutePolicy::Random);
    assert_eq!(engine.policy_for(0.49), RoutePolicy::Random);
    assert_eq!(engine.policy_for(0.5), RoutePolicy::Straight);
    assert_eq!(engine.policy_for(0.9), RoutePolicy::NearestSink);
    assert_eq!(engine.policy_for(0.95), RoutePolicy::Longest);
    assert_eq!(engine.policy_for(0.999), RoutePolicy::Longest);

    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..100 {
        let (_, path) = engine
            .select_route(&network, &SegmentId::new("C"), &mut rng)
            .unwrap();
        assert_eq!(path.first(), Some(&SegmentId::new("C")));
    }
}

#[test]
fn test_unknown_origin() {
    let (network, mut engine) = setup(100);
    let mut rng = StdRng::seed_from_u64(5);
    let origin = SegmentId::new("nowhere");

    assert_eq!(
        engine.random_route(&network, &origin, &mut rng),
        Err(RouteError::UnknownOrigin(origin.clone()))
    );
    assert_eq!(
        engine.longest_route(&network, &origin),
        Err(RouteError::UnknownOrigin(origin))
    );
}
