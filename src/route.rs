//! Global route export
//!
//! Traces the road route between two anchors, writes it as a CSV of planar
//! waypoints and draws it over the road network as ASCII art.

use anyhow::{bail, Context, Result};
use log::{error, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::scenario::AnchorIndex;
use crate::world::{Location, WorldClient};

pub const DEFAULT_START_ANCHOR: AnchorIndex = 0;
pub const DEFAULT_GOAL_ANCHOR: AnchorIndex = 100;
pub const DEFAULT_OUTPUT: &str = "global_path.csv";

/// Meters between waypoints
pub const ROUTE_RESOLUTION: f32 = 1.0;

const PLOT_WIDTH: usize = 100;
const PLOT_HEIGHT: usize = 40;

/// Route request between two anchors of the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub start: AnchorIndex,
    pub goal: AnchorIndex,
    pub resolution: f32,
    pub output: PathBuf,
}

impl Default for RouteRequest {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_ANCHOR,
            goal: DEFAULT_GOAL_ANCHOR,
            resolution: ROUTE_RESOLUTION,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

/// Trace the route between two anchors
pub fn trace_anchor_route<W: WorldClient>(
    world: &mut W,
    start: AnchorIndex,
    goal: AnchorIndex,
    resolution: f32,
) -> Result<Vec<Location>> {
    let anchors = world.spawn_points();
    let lookup = |index: AnchorIndex| {
        anchors
            .get(index)
            .map(|anchor| anchor.location)
            .with_context(|| format!("Anchor {} out of range ({} anchors)", index, anchors.len()))
    };
    let start_location = lookup(start)?;
    let goal_location = lookup(goal)?;

    info!(
        "Start: ({:.1}, {:.1})  Goal: ({:.1}, {:.1})",
        start_location.x, start_location.y, goal_location.x, goal_location.y
    );

    let route = world.trace_route(start_location, goal_location, resolution);
    info!("Route has {} waypoints", route.len());
    Ok(route)
}

/// Waypoints as `x,y` lines, no header
pub fn route_csv(route: &[Location]) -> String {
    route
        .iter()
        .map(|point| format!("{},{}\n", point.x, point.y))
        .collect()
}

/// Replace `path` with the route CSV without ever exposing a half-written file
pub fn write_route_csv(path: &Path, route: &[Location]) -> Result<()> {
    write_text_atomic(path, &route_csv(route))
        .with_context(|| format!("Failed to write route to {}", path.display()))
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text)?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("route.csv");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

/// Draw roads (`.`), the route (`*`), start (`S`) and goal (`G`).
///
/// The x axis runs right to left so the picture matches the simulator's
/// left-handed top-down view.
pub fn render_route_plot(roads: &[(Location, Location)], route: &[Location]) -> String {
    let points = roads
        .iter()
        .flat_map(|(from, to)| [*from, *to])
        .chain(route.iter().copied());

    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for point in points {
        min_x = min_x.min(point.x);
        max_x = max_x.max(point.x);
        min_y = min_y.min(point.y);
        max_y = max_y.max(point.y);
    }
    if !min_x.is_finite() || !min_y.is_finite() {
        return String::new();
    }

    let span_x = (max_x - min_x).max(1.0);
    let span_y = (max_y - min_y).max(1.0);
    let mut grid = vec![vec![' '; PLOT_WIDTH]; PLOT_HEIGHT];

    // Inverted x: larger x lands further left
    let to_grid = |point: &Location| -> (i32, i32) {
        let col = ((max_x - point.x) / span_x * (PLOT_WIDTH - 1) as f32).round() as i32;
        let row = ((max_y - point.y) / span_y * (PLOT_HEIGHT - 1) as f32).round() as i32;
        (row, col)
    };

    for (from, to) in roads {
        draw_line(&mut grid, to_grid(from), to_grid(to), '.');
    }
    for point in route {
        plot(&mut grid, to_grid(point), '*');
    }
    if let (Some(first), Some(last)) = (route.first(), route.last()) {
        plot(&mut grid, to_grid(first), 'S');
        plot(&mut grid, to_grid(last), 'G');
    }

    let mut out = String::with_capacity((PLOT_WIDTH + 1) * PLOT_HEIGHT);
    for row in grid {
        out.extend(row.iter());
        out.push('\n');
    }
    out
}

fn plot(grid: &mut [Vec<char>], (row, col): (i32, i32), mark: char) {
    if row < 0 || col < 0 {
        return;
    }
    if let Some(cell) = grid
        .get_mut(row as usize)
        .and_then(|line| line.get_mut(col as usize))
    {
        *cell = mark;
    }
}

// Bresenham
fn draw_line(grid: &mut [Vec<char>], (row0, col0): (i32, i32), (row1, col1): (i32, i32), mark: char) {
    let dx = (col1 - col0).abs();
    let dy = (row1 - row0).abs();
    let sx = if col0 < col1 { 1 } else { -1 };
    let sy = if row0 < row1 { 1 } else { -1 };

    let mut err = dx - dy;
    let (mut col, mut row) = (col0, row0);
    loop {
        plot(grid, (row, col), mark);
        if col == col1 && row == row1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            col += sx;
        }
        if e2 < dx {
            err += dx;
            row += sy;
        }
    }
}

/// Trace, save and draw the route. Returns the waypoint count.
///
/// An empty route is reported and nothing is written.
pub fn export_route<W: WorldClient>(
    world: &mut W,
    roads: &[(Location, Location)],
    request: &RouteRequest,
) -> Result<usize> {
    if request.resolution <= 0.0 {
        bail!("Route resolution must be positive, got {}", request.resolution);
    }

    let route = trace_anchor_route(world, request.start, request.goal, request.resolution)?;
    if route.is_empty() {
        error!(
            "No route found between anchors {} and {}",
            request.start, request.goal
        );
        return Ok(0);
    }

    write_route_csv(&request.output, &route)?;
    info!("Saved {} waypoints to {}", route.len(), request.output.display());

    println!("{}", render_route_plot(roads, &route));
    Ok(route.len())
}
