//! Road map of the simulated world
//!
//! A grid of intersections joined by two-way roads, stored as a petgraph
//! directed graph. Anchors (spawn points) are sampled along every directed
//! road in its driving lane; pedestrians navigate on the sidewalks beside it.

use ordered_float::OrderedFloat;
use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use rand::Rng;

use super::types::{Location, Rotation, Transform};
use crate::scenario::offset::apply_offset;

/// Lateral distance from the road center line to the lane center
pub const LANE_OFFSET: f32 = 1.75;

/// Lateral distance from the road center line to the sidewalk
pub const SIDEWALK_OFFSET: f32 = 5.0;

/// Shape of a generated grid map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapLayout {
    pub rows: usize,
    pub cols: usize,
    /// Distance between neighbouring intersections
    pub spacing: f32,
    /// Distance between consecutive anchors along one road
    pub anchor_spacing: f32,
}

impl Default for MapLayout {
    fn default() -> Self {
        Self {
            rows: 5,
            cols: 5,
            spacing: 60.0,
            anchor_spacing: 10.0,
        }
    }
}

/// Edge data for the road graph
#[derive(Debug, Clone, Copy)]
pub struct RoadEdge {
    pub length: f32,
    pub yaw: f32,
}

#[derive(Default)]
pub struct SimMap {
    graph: DiGraph<Location, RoadEdge>,
    anchors: Vec<Transform>,
}

impl SimMap {
    pub fn grid(layout: MapLayout) -> Self {
        let mut map = Self::default();
        let mut nodes = vec![vec![NodeIndex::new(0); layout.cols]; layout.rows];

        for (row, row_nodes) in nodes.iter_mut().enumerate() {
            for (col, node) in row_nodes.iter_mut().enumerate() {
                let x = col as f32 * layout.spacing;
                let y = row as f32 * layout.spacing;
                *node = map.graph.add_node(Location::new(x, y, 0.0));
            }
        }

        for row in 0..layout.rows {
            for col in 0..layout.cols {
                if col + 1 < layout.cols {
                    map.add_two_way_road(nodes[row][col], nodes[row][col + 1], layout.anchor_spacing);
                }
                if row + 1 < layout.rows {
                    map.add_two_way_road(nodes[row][col], nodes[row + 1][col], layout.anchor_spacing);
                }
            }
        }

        map
    }

    fn add_two_way_road(&mut self, a: NodeIndex, b: NodeIndex, anchor_spacing: f32) {
        self.add_road(a, b, anchor_spacing);
        self.add_road(b, a, anchor_spacing);
    }

    fn add_road(&mut self, start: NodeIndex, end: NodeIndex, anchor_spacing: f32) {
        let from = self.graph[start];
        let to = self.graph[end];
        let length = from.planar_distance(&to);
        let yaw = (to.y - from.y).atan2(to.x - from.x).to_degrees();

        self.graph.add_edge(start, end, RoadEdge { length, yaw });

        if anchor_spacing <= 0.0 {
            return;
        }

        // Anchors stay one spacing clear of either intersection
        let base = Transform::new(from, Rotation::from_yaw(yaw));
        let mut along = anchor_spacing;
        while along <= length - anchor_spacing + f32::EPSILON {
            self.anchors.push(apply_offset(&base, along, LANE_OFFSET));
            along += anchor_spacing;
        }
    }

    /// Indexed anchor catalog
    pub fn anchors(&self) -> &[Transform] {
        &self.anchors
    }

    pub fn intersection_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn road_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Center lines of every directed road
    pub fn road_segments(&self) -> Vec<(Location, Location)> {
        self.graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .map(|(a, b)| (self.graph[a], self.graph[b]))
            .collect()
    }

    /// A random point on a sidewalk next to a random road
    pub fn random_sidewalk_location(&self, rng: &mut impl Rng) -> Option<Location> {
        if self.graph.edge_count() == 0 {
            return None;
        }

        let edge = self.graph.edge_indices().nth(rng.random_range(0..self.graph.edge_count()))?;
        let (start, _) = self.graph.edge_endpoints(edge)?;
        let road = self.graph[edge];

        let base = Transform::new(self.graph[start], Rotation::from_yaw(road.yaw));
        let along = rng.random_range(0.0..=road.length);
        let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };

        Some(apply_offset(&base, along, side * SIDEWALK_OFFSET).location)
    }

    fn closest_intersection(&self, location: &Location) -> Option<NodeIndex> {
        self.graph.node_indices().min_by(|a, b| {
            let dist_a = location.planar_distance(&self.graph[*a]);
            let dist_b = location.planar_distance(&self.graph[*b]);
            dist_a
                .partial_cmp(&dist_b)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Shortest road route from `start` to `goal`, sampled every `resolution` meters
    pub fn trace_route(&self, start: Location, goal: Location, resolution: f32) -> Vec<Location> {
        let (Some(start_node), Some(goal_node)) = (
            self.closest_intersection(&start),
            self.closest_intersection(&goal),
        ) else {
            return Vec::new();
        };

        let Some((_, node_path)) = astar(
            &self.graph,
            start_node,
            |node| node == goal_node,
            |edge| OrderedFloat(edge.weight().length),
            |_| OrderedFloat(0.0), // Null heuristic = Dijkstra
        ) else {
            return Vec::new();
        };

        let mut corners = vec![start];
        corners.extend(node_path.iter().map(|node| self.graph[*node]));
        corners.push(goal);
        corners.dedup_by(|a, b| a.planar_distance(b) < f32::EPSILON);

        sample_polyline(&corners, resolution)
    }
}

/// Points spaced `resolution` apart along a polyline, ending on its last corner
fn sample_polyline(corners: &[Location], resolution: f32) -> Vec<Location> {
    if resolution <= 0.0 || corners.len() < 2 {
        return corners.to_vec();
    }

    let mut points = vec![corners[0]];
    // Distance already travelled past the last emitted sample
    let mut carried = 0.0;

    for pair in corners.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let length = from.planar_distance(&to);
        let mut along = resolution - carried;

        while along <= length {
            points.push(from.lerp(&to, along / length));
            along += resolution;
        }

        carried = length - (along - resolution);
    }

    if let Some(last) = corners.last() {
        if points
            .last()
            .map_or(true, |point| point.planar_distance(last) > f32::EPSILON)
        {
            points.push(*last);
        }
    }

    points
}
