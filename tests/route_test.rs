use std::fs;

use scenario_spawner::route::{
    export_route, render_route_plot, route_csv, trace_anchor_route, write_route_csv, RouteRequest,
};
use scenario_spawner::world::{Location, SimWorld, WorldClient};

#[test]
fn test_route_is_sampled_at_resolution() {
    let mut world = SimWorld::new_with_seed(71);
    let anchors = world.spawn_points();

    let route = trace_anchor_route(&mut world, 0, 100, 1.0).expect("anchors exist");

    assert!(route.len() > 2);
    assert_eq!(route.first().copied(), Some(anchors[0].location));
    let last = route.last().expect("non-empty route");
    assert!(last.planar_distance(&anchors[100].location) < 1e-3);
    for pair in route.windows(2) {
        assert!(pair[0].planar_distance(&pair[1]) <= 1.0 + 1e-3);
    }
}

#[test]
fn test_out_of_range_anchor_is_an_error() {
    let mut world = SimWorld::new_with_seed(72);
    assert!(trace_anchor_route(&mut world, 0, 100_000, 1.0).is_err());
}

#[test]
fn test_route_csv_has_no_header() {
    let route = [Location::new(1.5, -2.0, 0.0), Location::new(3.0, 4.25, 9.0)];
    assert_eq!(route_csv(&route), "1.5,-2\n3,4.25\n");
    assert_eq!(route_csv(&[]), "");
}

#[test]
fn test_route_csv_is_replaced_each_run() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("global_path.csv");

    let long = [
        Location::new(0.0, 0.0, 0.0),
        Location::new(1.0, 0.0, 0.0),
        Location::new(2.0, 0.0, 0.0),
    ];
    write_route_csv(&path, &long).expect("first write");
    write_route_csv(&path, &long[..1]).expect("second write");

    assert_eq!(fs::read_to_string(&path).expect("csv exists"), "0,0\n");
    assert!(!dir.path().join("global_path.csv.tmp").exists());
}

#[test]
fn test_export_route_writes_every_waypoint() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut world = SimWorld::new_with_seed(73);
    let roads = world.map().road_segments();
    let request = RouteRequest {
        output: dir.path().join("nested").join("global_path.csv"),
        ..RouteRequest::default()
    };

    let count = export_route(&mut world, &roads, &request).expect("route exported");

    let text = fs::read_to_string(&request.output).expect("csv written");
    assert_eq!(text.lines().count(), count);
    for line in text.lines() {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().all(|field| field.parse::<f32>().is_ok()));
    }
}

#[test]
fn test_plot_marks_start_and_goal_with_inverted_x() {
    let roads = [(Location::new(0.0, 0.0, 0.0), Location::new(100.0, 0.0, 0.0))];
    let route = [Location::new(0.0, 0.0, 0.0), Location::new(100.0, 0.0, 0.0)];

    let plot = render_route_plot(&roads, &route);
    let first_row = plot.lines().next().expect("plot has rows");

    // Larger x is drawn further left
    assert_eq!(first_row.chars().next(), Some('G'));
    assert_eq!(first_row.chars().last(), Some('S'));
    assert!(first_row.contains('.'));
}

#[test]
fn test_plot_draws_route_over_map() {
    let mut world = SimWorld::new_with_seed(74);
    let roads = world.map().road_segments();
    let route = trace_anchor_route(&mut world, 0, 100, 1.0).expect("anchors exist");

    let plot = render_route_plot(&roads, &route);

    assert!(plot.contains('S'));
    assert!(plot.contains('G'));
    assert!(plot.contains('*'));
    assert!(plot.contains('.'));
}
