//! End-to-end layout behaviour through the public API.

use force_layout::force::{BARNES_HUT_MIN_NODES, CENTER, CHARGE, LinkForce, from_fn};
use force_layout::{
    Deltas, DragController, EdgeSpec, ForceError, ForceRegistry, Graph, GraphView, LayoutError, LinkParams,
    Point, Simulation, SimulationConfig, SimulationEvent, SimulationState,
};

fn distance(a: Point, b: Point) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn triangle() -> Simulation {
    Simulation::from_parts(
        ["A", "B", "C"],
        vec![EdgeSpec::new("A", "B"), EdgeSpec::new("B", "C")],
        SimulationConfig::default(),
    )
    .unwrap()
}

#[test]
fn test_no_forces_no_motion() {
    let mut graph = Graph::new();
    graph.add_node_at("A", 1.0, 2.0).unwrap();
    graph.add_node_at("B", -3.0, 4.0).unwrap();
    let mut sim = Simulation::with_forces(graph, SimulationConfig::default(), ForceRegistry::new()).unwrap();

    sim.run(50).unwrap();

    assert_eq!(sim.graph().position("A"), Some(Point::new(1.0, 2.0)));
    assert_eq!(sim.graph().position("B"), Some(Point::new(-3.0, 4.0)));
}

#[test]
fn test_alpha_decays_monotonically_and_converges() {
    let config = SimulationConfig {
        alpha_decay: 0.0228,
        ..SimulationConfig::default()
    };
    let mut sim = Simulation::new(
        Graph::from_parts(["A", "B", "C"], vec![EdgeSpec::new("A", "B")]).unwrap(),
        config,
    )
    .unwrap();
    sim.start();

    let mut previous = sim.alpha();
    let mut ticks = 0;
    while let Some(event) = sim.advance().unwrap() {
        assert!(event.alpha <= previous);
        previous = event.alpha;
        ticks += 1;
        assert!(ticks <= 300, "still running after 300 ticks");
    }

    assert!(sim.alpha() < 0.001);
    assert!(!sim.is_running());
}

#[test]
fn test_two_nodes_settle_at_rest_length() {
    let mut graph = Graph::new();
    graph.add_node_at("A", 0.0, 0.0).unwrap();
    graph.add_node_at("B", 0.0, 0.0).unwrap();
    graph
        .add_edge("A", "B", LinkParams::default().distance(100.0))
        .unwrap();
    let mut sim = Simulation::new(graph, SimulationConfig::default()).unwrap();
    sim.forces_mut().remove(CHARGE);
    sim.forces_mut().remove(CENTER);

    sim.run(1000).unwrap();

    let a = sim.graph().position("A").unwrap();
    let b = sim.graph().position("B").unwrap();
    assert!((distance(a, b) - 100.0).abs() < 1.0, "distance {}", distance(a, b));
}

#[test]
fn test_link_at_rest_length_is_idle() {
    let mut graph = Graph::new();
    graph.add_node_at("A", 0.0, 0.0).unwrap();
    graph.add_node_at("B", 30.0, 0.0).unwrap();
    graph.add_edge("A", "B", LinkParams::default()).unwrap();
    let mut forces = ForceRegistry::new();
    forces.insert("link", LinkForce::new(30.0, 1.0));
    let mut sim = Simulation::with_forces(graph, SimulationConfig::default(), forces).unwrap();

    sim.run(10).unwrap();

    assert_eq!(sim.graph().position("A"), Some(Point::new(0.0, 0.0)));
    assert_eq!(sim.graph().position("B"), Some(Point::new(30.0, 0.0)));
}

#[test]
fn test_pinned_node_holds_every_tick() {
    let mut sim = triangle();
    sim.graph_mut().pin("B", 12.0, -8.0).unwrap();

    for _ in 0..100 {
        let Some(event) = sim.tick().unwrap() else { break };
        assert_eq!(event.position("B"), Some(Point::new(12.0, -8.0)));
    }
}

#[test]
fn test_edge_to_unknown_node_is_rejected() {
    let mut graph = Graph::from_parts(["A", "B"], Vec::<EdgeSpec>::new()).unwrap();

    let err = graph.add_edge("A", "Z", LinkParams::default()).unwrap_err();

    assert!(matches!(err, LayoutError::UnknownNode(ref id) if id.as_str() == "Z"));
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_from_parts_is_atomic() {
    let result = Graph::from_parts(["A", "B"], vec![EdgeSpec::new("A", "B"), EdgeSpec::new("B", "Z")]);
    assert!(matches!(result, Err(LayoutError::UnknownNode(_))));

    let result = Graph::from_parts(["A", "A"], Vec::<EdgeSpec>::new());
    assert!(matches!(result, Err(LayoutError::DuplicateId(_))));
}

#[test]
fn test_drag_lifecycle() {
    let mut sim = triangle();
    let mut drag = DragController::new();
    sim.run(400).unwrap();
    assert!(!sim.is_running());

    let a = sim.graph().position("A").unwrap();
    let picked = drag.pick(&sim, a.x + 0.5, a.y, 1.0).unwrap();
    assert_eq!(picked.as_str(), "A");

    drag.begin_drag(&mut sim, "A", 0.0, 0.0).unwrap();
    assert!(sim.is_running());

    for step in 0..20 {
        let target = Point::new(200.0 + step as f32, 150.0);
        drag.update_drag(&mut sim, "A", target.x, target.y).unwrap();
        let event = sim.advance().unwrap().unwrap();
        assert_eq!(event.position("A"), Some(target));
    }

    drag.end_drag(&mut sim, "A").unwrap();
    assert_eq!(sim.graph().position("A"), Some(Point::new(219.0, 150.0)));
    assert!(!sim.graph().pin_of("A").unwrap().is_pinned());

    // With the drag released the layout cools back down.
    let ticks = sim.run(2000).unwrap();
    assert!(ticks < 2000);
    assert!(!sim.is_running());
}

#[test]
fn test_reheat_after_convergence_resumes() {
    let mut sim = triangle();
    sim.start();
    sim.run(1000).unwrap();
    assert!(sim.advance().unwrap().is_none());

    let cold = sim.alpha();
    sim.reheat(0.3).unwrap();
    let event = sim.advance().unwrap().unwrap();
    assert!(event.alpha > cold);

    sim.cool();
    assert!(sim.run(1000).unwrap() > 0);
    assert!(!sim.is_running());

    sim.restart();
    let event = sim.advance().unwrap().unwrap();
    assert!(event.alpha > 0.9);
}

#[test]
fn test_removed_node_disappears_from_events() {
    let mut sim = triangle();
    assert!(sim.graph_mut().remove_node("B"));
    assert_eq!(sim.graph().edge_count(), 0);

    let event = sim.tick().unwrap().unwrap();
    assert_eq!(event.positions.len(), 2);
    assert!(event.position("B").is_none());
}

#[test]
fn test_subscribers_see_end_event() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut sim = triangle();
    let ends = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&ends);
    sim.subscribe(move |event| {
        if let SimulationEvent::End { .. } = event {
            *seen.borrow_mut() += 1;
        }
    });

    sim.start();
    while sim.advance().unwrap().is_some() {}

    assert_eq!(*ends.borrow(), 1);
}

#[test]
fn test_large_graph_converges_with_default_forces() {
    let n = BARNES_HUT_MIN_NODES * 3;
    let ids: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
    // Binary tree plus a few cross links.
    let mut edges: Vec<EdgeSpec> = (1..n).map(|i| EdgeSpec::new(&ids[(i - 1) / 2], &ids[i])).collect();
    edges.extend((0..n / 8).map(|i| EdgeSpec::new(&ids[i], &ids[n - 1 - i])));
    let mut sim = Simulation::from_parts(ids.clone(), edges, SimulationConfig::default()).unwrap();
    sim.start();

    let mut ticks = 0;
    while sim.advance().unwrap().is_some() {
        ticks += 1;
        assert!(ticks < 1000, "did not converge");
    }

    assert!(!sim.is_running());
    let (min_x, min_y, max_x, max_y) = sim.graph().bounds().unwrap();
    for (id, p) in sim.graph().positions() {
        assert!(p.x.is_finite() && p.y.is_finite(), "{id} at {p:?}");
    }
    // Repulsion spread the nodes out instead of collapsing them.
    assert!(max_x - min_x > 50.0 && max_y - min_y > 50.0);
}

#[test]
fn test_force_failure_surfaces_through_advance() {
    let mut sim = triangle();
    sim.forces_mut().insert(
        "broken",
        from_fn(|_view: &GraphView<'_>, _alpha: f32, _deltas: &mut Deltas| {
            Err(ForceError::Failed("boom".to_string()))
        }),
    );
    let before: Vec<Point> = sim.graph().positions().map(|(_, p)| p).collect();
    sim.start();

    let err = sim.advance().unwrap_err();

    assert!(matches!(err, LayoutError::ForceEvaluation { ref force, .. } if force == "broken"));
    assert_eq!(sim.state(), SimulationState::Idle);
    assert_eq!(sim.ticks(), 0);
    let after: Vec<Point> = sim.graph().positions().map(|(_, p)| p).collect();
    assert_eq!(before, after);
    // Idle after the failure, so the scheduler stops calling into forces.
    assert!(sim.advance().unwrap().is_none());
}
