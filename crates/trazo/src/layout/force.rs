//! Force-directed layout engine for large graphs.
//!
//! Nodes start on a jittered grid and relax under pairwise repulsion and
//! spring attraction along edges for a fixed number of iterations. The
//! jitter comes from a seeded [`StdRng`], so a given graph and seed always
//! produce the same drawing. A final sweep pushes overlapping boxes apart
//! along the x axis, which guarantees that no two boxes overlap.

use log::{debug, trace};
use rand::{Rng, SeedableRng, rngs::StdRng};

use trazo_core::{
    geometry::{Bounds, Insets, Point, Size},
    graph::Graph,
};

use super::LayoutError;
use crate::CancellationToken;

/// Force layout engine
///
/// A physics simulation that positions nodes based on a system of
/// attractive and repulsive forces.
pub struct Engine {
    // Simulation parameters
    iterations: usize,
    spring_constant: f32,
    repulsion_constant: f32,
    damping_factor: f32,
    max_step: f32,
    seed: u64,
    // Gap kept between boxes
    min_distance: f32,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            iterations: 300,
            spring_constant: 0.1,
            repulsion_constant: 1000.0,
            damping_factor: 0.85,
            max_step: 50.0,
            seed: 0,
            min_distance: 40.0,
        }
    }

    /// Set the number of iterations for the force simulation
    pub fn set_iterations(&mut self, iterations: usize) -> &mut Self {
        self.iterations = iterations;
        self
    }

    /// Set the seed of the initial jitter
    pub fn set_seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    /// Set the minimum distance between nodes
    pub fn set_min_distance(&mut self, distance: f32) -> &mut Self {
        self.min_distance = distance;
        self
    }

    /// Computes node centers, indexed like `graph`'s nodes.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Cancelled`] if `cancel` fires during the simulation.
    pub fn calculate(
        &self,
        graph: &Graph,
        sizes: &[Size],
        cancel: &CancellationToken,
    ) -> Result<Vec<Point>, LayoutError> {
        let mut positions = self.run_force_simulation(graph, sizes, cancel)?;
        self.remove_overlaps(&mut positions, sizes);
        center_layout(&mut positions);
        Ok(positions)
    }

    /// Place nodes on a grid with seeded jitter
    fn initialize_positions(&self, sizes: &[Size]) -> Vec<Point> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let grid_size = (sizes.len() as f32).sqrt().ceil().max(1.0) as usize;
        let largest = sizes.iter().fold(Size::default(), |acc, s| acc.max(*s));
        let cell = Size::new(
            largest.width() + self.min_distance,
            largest.height() + self.min_distance,
        );

        (0..sizes.len())
            .map(|i| {
                let row = i / grid_size;
                let col = i % grid_size;
                let base = Point::new(col as f32 * cell.width(), row as f32 * cell.height());

                // Jitter avoids perfectly balanced forces on the grid
                let jitter = Point::new(rng.random_range(-20.0..20.0), rng.random_range(-20.0..20.0));
                base.add_point(jitter)
            })
            .collect()
    }

    fn run_force_simulation(
        &self,
        graph: &Graph,
        sizes: &[Size],
        cancel: &CancellationToken,
    ) -> Result<Vec<Point>, LayoutError> {
        let mut positions = self.initialize_positions(sizes);
        let mut velocities = vec![Point::default(); positions.len()];
        let springs: Vec<(usize, usize)> = graph
            .edges()
            .map(|(_, edge)| (edge.source().index(), edge.target().index()))
            .filter(|(source, target)| source != target)
            .collect();

        for iteration in 0..self.iterations {
            if cancel.is_cancelled() {
                debug!(iteration = iteration; "Force simulation cancelled");
                return Err(LayoutError::Cancelled);
            }

            let mut forces = vec![Point::default(); positions.len()];

            // Repulsion between every pair of nodes
            for i in 0..positions.len() {
                for j in 0..positions.len() {
                    if i == j {
                        continue;
                    }
                    let trans = positions[i].sub_point(positions[j]);
                    let min_dist = (sizes[i].width()
                        + sizes[j].width()
                        + sizes[i].height()
                        + sizes[j].height())
                        / 4.0
                        + self.min_distance;

                    let distance = trans.hypot().max(1.0);

                    // Stronger repulsion when nodes are too close
                    let force_factor = if distance < min_dist {
                        self.repulsion_constant * (min_dist / distance).powi(2)
                    } else {
                        self.repulsion_constant / distance
                    };
                    forces[i] = forces[i].add_point(trans.scale(force_factor / distance));
                }
            }

            // Springs pull connected nodes together
            for &(source, target) in &springs {
                let dist = positions[source].sub_point(positions[target]);
                let distance = dist.hypot().max(1.0);
                let pull = dist.scale(self.spring_constant);

                forces[source] = forces[source].sub_point(pull);
                forces[target] = forces[target].add_point(pull);
                trace!(source = source, target = target, distance = distance; "Spring force");
            }

            for (i, force) in forces.into_iter().enumerate() {
                let velocity = velocities[i].add_point(force).scale(self.damping_factor);
                let speed = velocity.hypot();
                let velocity = if speed > self.max_step {
                    velocity.scale(self.max_step / speed)
                } else {
                    velocity
                };
                velocities[i] = velocity;
                positions[i] = positions[i].add_point(velocity);
            }
        }

        debug!(iterations = self.iterations, nodes = positions.len(); "Force simulation finished");
        Ok(positions)
    }

    /// Sweeps nodes left to right, pushing each one right until it clears
    /// every node placed before it.
    ///
    /// A node only ever moves right and each push clears one placed node for
    /// good, so the sweep terminates and leaves all boxes disjoint.
    fn remove_overlaps(&self, positions: &mut [Point], sizes: &[Size]) {
        let gap = self.min_distance.max(1.0);
        let mut order: Vec<usize> = (0..positions.len()).collect();
        order.sort_by(|&a, &b| {
            positions[a]
                .x()
                .total_cmp(&positions[b].x())
                .then(positions[a].y().total_cmp(&positions[b].y()))
                .then(a.cmp(&b))
        });

        let mut placed: Vec<Bounds> = Vec::with_capacity(order.len());
        let mut pushes = 0usize;
        for index in order {
            let mut bounds = Bounds::new_from_center(positions[index], sizes[index]);
            while let Some(blocker) = placed
                .iter()
                .find(|other| other.add_padding(Insets::uniform(gap)).intersects(&bounds))
            {
                let shift = blocker.max_x() + gap - bounds.min_x();
                bounds = bounds.translate(Point::new(shift, 0.0));
                pushes += 1;
            }
            positions[index] = bounds.center();
            placed.push(bounds);
        }
        debug!(pushes = pushes; "Removed overlaps");
    }
}

/// Center the layout around the origin
fn center_layout(positions: &mut [Point]) {
    if positions.is_empty() {
        return;
    }
    let sum = positions
        .iter()
        .fold(Point::default(), |acc, p| acc.add_point(*p));
    let center = sum.scale(1.0 / positions.len() as f32);
    for position in positions.iter_mut() {
        *position = position.sub_point(center);
    }
}
