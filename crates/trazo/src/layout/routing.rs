//! Edge routing between placed nodes.
//!
//! Every edge gets a polyline from its source's border to its target's
//! border. Candidates are tried in a fixed order: the straight segment, an
//! orthogonal Z-route through the gap between the two boxes, then detours
//! around all boxes on either side. The first candidate that crosses no
//! foreign box wins; if none is clear the straight segment is kept.

use log::trace;

use trazo_core::{
    geometry::{Bounds, Point},
    graph::Graph,
};

/// Distance kept between a detour and the boxes it avoids.
const CLEARANCE: f32 = 20.0;

/// Width of the loop drawn for an edge from a node to itself.
const LOOP_REACH: f32 = 18.0;

/// Routes every edge of `graph`, indexed like its edges.
///
/// `boxes` holds the node bounds, indexed like its nodes.
pub fn route_edges(graph: &Graph, boxes: &[Bounds]) -> Vec<Vec<Point>> {
    graph
        .edges()
        .map(|(id, edge)| {
            let route = route(edge.source().index(), edge.target().index(), boxes);
            trace!(edge = id.index(), points = route.len(); "Routed edge");
            route
        })
        .collect()
}

fn route(source: usize, target: usize, boxes: &[Bounds]) -> Vec<Point> {
    if source == target {
        return self_loop(boxes[source]);
    }

    let from = boxes[source];
    let to = boxes[target];
    let straight = vec![
        from.border_point_toward(to.center()),
        to.border_point_toward(from.center()),
    ];
    if is_clear(&straight, source, target, boxes) {
        return straight;
    }

    candidates(from, to, boxes)
        .into_iter()
        .map(dedup)
        .find(|route| is_clear(route, source, target, boxes))
        .unwrap_or(straight)
}

/// Orthogonal alternatives to the straight segment, in preference order.
fn candidates(from: Bounds, to: Bounds, boxes: &[Bounds]) -> Vec<Vec<Point>> {
    let mut routes = Vec::new();
    let (fc, tc) = (from.center(), to.center());

    // Z-routes through the gap between the boxes
    if from.max_y() <= to.min_y() || to.max_y() <= from.min_y() {
        let downward = from.max_y() <= to.min_y();
        let start = Point::new(fc.x(), if downward { from.max_y() } else { from.min_y() });
        let end = Point::new(tc.x(), if downward { to.min_y() } else { to.max_y() });
        let mid = (start.y() + end.y()) / 2.0;
        routes.push(vec![start, start.with_y(mid), end.with_y(mid), end]);
    }
    if from.max_x() <= to.min_x() || to.max_x() <= from.min_x() {
        let rightward = from.max_x() <= to.min_x();
        let start = Point::new(if rightward { from.max_x() } else { from.min_x() }, fc.y());
        let end = Point::new(if rightward { to.min_x() } else { to.max_x() }, tc.y());
        let mid = (start.x() + end.x()) / 2.0;
        routes.push(vec![start, start.with_x(mid), end.with_x(mid), end]);
    }

    // Detours around every box spanning the edge's extent
    let (low_y, high_y) = (fc.y().min(tc.y()), fc.y().max(tc.y()));
    let across_rows = || {
        boxes
            .iter()
            .filter(move |b| b.max_y() >= low_y && b.min_y() <= high_y)
    };
    let right = across_rows().map(|b| b.max_x()).fold(f32::MIN, f32::max) + CLEARANCE;
    let left = across_rows().map(|b| b.min_x()).fold(f32::MAX, f32::min) - CLEARANCE;

    let (low_x, high_x) = (fc.x().min(tc.x()), fc.x().max(tc.x()));
    let across_columns = || {
        boxes
            .iter()
            .filter(move |b| b.max_x() >= low_x && b.min_x() <= high_x)
    };
    let below = across_columns().map(|b| b.max_y()).fold(f32::MIN, f32::max) + CLEARANCE;
    let above = across_columns().map(|b| b.min_y()).fold(f32::MAX, f32::min) - CLEARANCE;

    let side = |x_from: f32, x_to: f32, x: f32| {
        let start = Point::new(x_from, fc.y());
        let end = Point::new(x_to, tc.y());
        vec![start, start.with_x(x), end.with_x(x), end]
    };
    routes.push(side(from.max_x(), to.max_x(), right));
    routes.push(side(from.min_x(), to.min_x(), left));

    let level = |y_from: f32, y_to: f32, y: f32| {
        let start = Point::new(fc.x(), y_from);
        let end = Point::new(tc.x(), y_to);
        vec![start, start.with_y(y), end.with_y(y), end]
    };
    routes.push(level(from.max_y(), to.max_y(), below));
    routes.push(level(from.min_y(), to.min_y(), above));

    routes
}

/// Small rectangular loop on the right side of the node.
fn self_loop(bounds: Bounds) -> Vec<Point> {
    let center = bounds.center();
    let rise = (bounds.height() / 4.0).min(12.0);
    let start = Point::new(bounds.max_x(), center.y() - rise);
    let end = Point::new(bounds.max_x(), center.y() + rise);
    vec![
        start,
        start.with_x(bounds.max_x() + LOOP_REACH),
        end.with_x(bounds.max_x() + LOOP_REACH),
        end,
    ]
}

/// Returns `true` if no segment of `route` enters a box other than the
/// edge's own endpoints.
fn is_clear(route: &[Point], source: usize, target: usize, boxes: &[Bounds]) -> bool {
    route.windows(2).all(|segment| {
        boxes
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != source && *index != target)
            .all(|(_, b)| !b.intersects_segment(segment[0], segment[1]))
    })
}

/// Drops consecutive duplicate points, keeping at least the two endpoints.
fn dedup(mut route: Vec<Point>) -> Vec<Point> {
    if route.len() > 2 {
        route.dedup();
    }
    if route.len() < 2 {
        if let Some(&only) = route.first() {
            route.push(only);
        }
    }
    route
}
