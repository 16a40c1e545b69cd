//! Force-directed relaxation engine
//!
//! Each pass applies two phases:
//!
//! 1. **Repulsion** over every ordered pair of nodes closer than
//!    `min_distance`, pushing both ends apart along the line joining them.
//! 2. **Attraction** over every parent-child edge longer than `min_distance`,
//!    pulling both ends together.
//!
//! The engine always runs the configured number of passes; there is no
//! convergence check.

use log::{debug, trace};

use skilltree_core::geometry::Point;

use super::Edge;
use crate::config::{LayoutConfig, RelaxationMode};

/// Length of the displacement substituted for two coincident nodes.
const JITTER_LENGTH: f32 = 0.01;

/// Golden angle in radians, spreads jitter directions of successive pairs.
const GOLDEN_ANGLE: f32 = 2.399_963;

/// Force layout engine for skill trees
///
/// Repulsion and attraction deltas are applied as equal-and-opposite moves of
/// the two nodes involved, so a pass never shifts the centroid of a pair.
#[derive(Debug, Clone)]
pub struct Engine {
    min_distance: f32,
    repulsion_strength: f32,
    attraction_strength: f32,
    iterations: usize,
    relaxation: RelaxationMode,
}

impl Default for Engine {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

impl Engine {
    /// Create an engine from layout configuration
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            min_distance: config.min_distance(),
            repulsion_strength: config.repulsion_strength(),
            attraction_strength: config.attraction_strength(),
            iterations: config.iterations(),
            relaxation: config.relaxation(),
        }
    }

    /// Set the number of passes per [`relax`](Self::relax) call
    pub fn set_iterations(&mut self, iterations: usize) -> &mut Self {
        self.iterations = iterations;
        self
    }

    /// Set the target spacing between nodes
    pub fn set_min_distance(&mut self, distance: f32) -> &mut Self {
        self.min_distance = distance;
        self
    }

    /// Set the relaxation mode
    pub fn set_relaxation(&mut self, relaxation: RelaxationMode) -> &mut Self {
        self.relaxation = relaxation;
        self
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    /// Run the full relaxation over `positions`.
    ///
    /// `edges` index into `positions`; an edge whose indices are out of range
    /// is ignored.
    pub fn relax(&self, positions: &mut [Point], edges: &[Edge]) {
        debug!(
            node_count = positions.len(),
            edge_count = edges.len(),
            iterations = self.iterations,
            relaxation:? = self.relaxation;
            "Running force relaxation"
        );

        let edges: Vec<Edge> = edges
            .iter()
            .copied()
            .filter(|edge| edge.child() < positions.len() && edge.parent() < positions.len())
            .collect();

        for _ in 0..self.iterations {
            match self.relaxation {
                RelaxationMode::InPlace => {
                    self.repel_in_place(positions);
                    self.attract_in_place(positions, &edges);
                }
                RelaxationMode::Batched => {
                    self.repel_batched(positions);
                    self.attract_batched(positions, &edges);
                }
            }
        }

        trace!(positions:?; "Force relaxation finished");
    }

    fn repel_in_place(&self, positions: &mut [Point]) {
        for i in 0..positions.len() {
            for j in 0..positions.len() {
                if i == j {
                    continue;
                }
                if let Some(delta) = self.repulsion(positions[i], positions[j], i, j) {
                    positions[i] = positions[i].sub_point(delta);
                    positions[j] = positions[j].add_point(delta);
                }
            }
        }
    }

    fn attract_in_place(&self, positions: &mut [Point], edges: &[Edge]) {
        for edge in edges {
            let (child, parent) = (edge.child(), edge.parent());
            if let Some(delta) = self.attraction(positions[child], positions[parent]) {
                positions[child] = positions[child].add_point(delta);
                positions[parent] = positions[parent].sub_point(delta);
            }
        }
    }

    fn repel_batched(&self, positions: &mut [Point]) {
        let snapshot = positions.to_vec();
        let mut deltas = vec![Point::default(); positions.len()];

        for (i, &pos_i) in snapshot.iter().enumerate() {
            for (j, &pos_j) in snapshot.iter().enumerate() {
                if i == j {
                    continue;
                }
                if let Some(delta) = self.repulsion(pos_i, pos_j, i, j) {
                    deltas[i] = deltas[i].sub_point(delta);
                    deltas[j] = deltas[j].add_point(delta);
                }
            }
        }

        apply_deltas(positions, &deltas);
    }

    fn attract_batched(&self, positions: &mut [Point], edges: &[Edge]) {
        let mut deltas = vec![Point::default(); positions.len()];

        for edge in edges {
            let (child, parent) = (edge.child(), edge.parent());
            if let Some(delta) = self.attraction(positions[child], positions[parent]) {
                deltas[child] = deltas[child].add_point(delta);
                deltas[parent] = deltas[parent].sub_point(delta);
            }
        }

        apply_deltas(positions, &deltas);
    }

    /// Delta to add to `pos_j` (and subtract from `pos_i`) when the pair is
    /// closer than `min_distance`.
    fn repulsion(&self, pos_i: Point, pos_j: Point, i: usize, j: usize) -> Option<Point> {
        let mut direction = pos_j.sub_point(pos_i);
        let mut distance = direction.hypot();

        if distance == 0.0 {
            direction = jitter(i, j);
            distance = JITTER_LENGTH;
        }

        if distance < self.min_distance {
            let force = self.repulsion_strength * (self.min_distance - distance) / distance;
            Some(direction.scale(force))
        } else {
            None
        }
    }

    /// Delta to add to the child (and subtract from the parent) when the edge
    /// is longer than `min_distance`.
    fn attraction(&self, child: Point, parent: Point) -> Option<Point> {
        let direction = parent.sub_point(child);
        let distance = direction.hypot();

        if distance > self.min_distance {
            let force = self.attraction_strength * (distance - self.min_distance) / distance;
            Some(direction.scale(force))
        } else {
            None
        }
    }
}

fn apply_deltas(positions: &mut [Point], deltas: &[Point]) {
    for (position, delta) in positions.iter_mut().zip(deltas) {
        *position = position.add_point(*delta);
    }
}

/// Deterministic small displacement for the ordered pair `(i, j)`.
fn jitter(i: usize, j: usize) -> Point {
    let seed = (i * 31 + j * 17) as f32;
    Point::from_polar(JITTER_LENGTH, seed * GOLDEN_ANGLE)
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    fn engine_with_iterations(iterations: usize) -> Engine {
        Engine::from_config(&LayoutConfig::default().with_iterations(iterations))
    }

    fn distance(positions: &[Point], a: usize, b: usize) -> f32 {
        positions[a].distance(positions[b])
    }

    #[test]
    fn test_single_repulsion_pass_separates_close_pair() {
        let engine = engine_with_iterations(1);
        let mut positions = vec![Point::new(100.0, 100.0), Point::new(110.0, 100.0)];

        engine.relax(&mut positions, &[]);

        let after = distance(&positions, 0, 1);
        assert!(after > 10.0, "distance should grow, got {after}");
        assert!(
            approx_eq!(f32, after, 150.0, epsilon = 0.01),
            "expected ~150, got {after}"
        );
    }

    #[test]
    fn test_repulsion_grows_monotonically_with_weak_strength() {
        let config = LayoutConfig::default()
            .with_iterations(1)
            .with_repulsion_strength(0.05);
        let engine = Engine::from_config(&config);
        let mut positions = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];

        let mut previous = distance(&positions, 0, 1);
        for _ in 0..50 {
            engine.relax(&mut positions, &[]);
            let current = distance(&positions, 0, 1);
            if previous >= 150.0 {
                break;
            }
            assert!(current > previous, "{current} should exceed {previous}");
            previous = current;
        }
    }

    #[test]
    fn test_repulsion_is_symmetric_about_midpoint() {
        let midpoint = |a: Point, b: Point| a.add_point(b).scale(0.5);
        let engine = engine_with_iterations(1);
        let mut positions = vec![Point::new(0.0, 0.0), Point::new(30.0, 40.0)];
        let before = midpoint(positions[0], positions[1]);

        engine.relax(&mut positions, &[]);

        let after = midpoint(positions[0], positions[1]);
        assert!(approx_eq!(f32, after.distance(before), 0.0, epsilon = 0.001));
    }

    #[test]
    fn test_attraction_pulls_distant_pair_toward_min_distance() {
        let engine = engine_with_iterations(1);
        let mut positions = vec![Point::new(0.0, 0.0), Point::new(400.0, 0.0)];
        let edges = [Edge::new(1, 0)];

        engine.relax(&mut positions, &edges);

        let after = distance(&positions, 0, 1);
        // 400 - 2 * 0.1 * (400 - 150)
        assert!(
            approx_eq!(f32, after, 350.0, epsilon = 0.01),
            "expected ~350, got {after}"
        );
        assert!(after > 150.0);
    }

    #[test]
    fn test_pair_at_min_distance_is_untouched() {
        let engine = engine_with_iterations(1);
        let original = vec![Point::new(0.0, 0.0), Point::new(150.0, 0.0)];
        let mut positions = original.clone();

        engine.relax(&mut positions, &[Edge::new(1, 0)]);

        assert_eq!(positions, original);
    }

    #[test]
    fn test_unlinked_distant_nodes_do_not_move() {
        let engine = engine_with_iterations(10);
        let original = vec![Point::new(0.0, 0.0), Point::new(500.0, 500.0)];
        let mut positions = original.clone();

        engine.relax(&mut positions, &[]);

        assert_eq!(positions, original);
    }

    #[test]
    fn test_coincident_nodes_are_separated_deterministically() {
        let engine = engine_with_iterations(1);
        let mut first = vec![Point::new(50.0, 50.0), Point::new(50.0, 50.0)];
        let mut second = first.clone();

        engine.relax(&mut first, &[]);
        engine.relax(&mut second, &[]);

        assert!(first.iter().all(|p| p.is_finite()));
        assert!(distance(&first, 0, 1) > 0.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_iterations_leaves_positions() {
        let engine = engine_with_iterations(0);
        let original = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        let mut positions = original.clone();

        engine.relax(&mut positions, &[Edge::new(1, 0)]);

        assert_eq!(positions, original);
    }

    #[test]
    fn test_out_of_range_edge_is_ignored() {
        let engine = engine_with_iterations(3);
        let mut positions = vec![Point::new(0.0, 0.0), Point::new(500.0, 0.0)];

        engine.relax(&mut positions, &[Edge::new(5, 0)]);

        assert_eq!(positions[0], Point::new(0.0, 0.0));
    }

    #[test]
    fn test_full_run_spreads_star_tree() {
        let engine = Engine::default();
        let mut positions = vec![
            Point::new(400.0, 300.0),
            Point::new(410.0, 300.0),
            Point::new(400.0, 310.0),
            Point::new(405.0, 305.0),
        ];
        let edges = [Edge::new(1, 0), Edge::new(2, 0), Edge::new(3, 0)];

        engine.relax(&mut positions, &edges);

        for a in 0..positions.len() {
            for b in (a + 1)..positions.len() {
                assert!(
                    distance(&positions, a, b) > 100.0,
                    "nodes {a} and {b} too close: {positions:?}"
                );
            }
        }
    }

    #[test]
    fn test_batched_mode_matches_force_laws() {
        let mut engine = engine_with_iterations(1);
        engine.set_relaxation(RelaxationMode::Batched);

        let mut positions = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        engine.relax(&mut positions, &[]);

        // Both ordered pairs see the same snapshot distance of 10.
        let after = distance(&positions, 0, 1);
        assert!(
            approx_eq!(f32, after, 290.0, epsilon = 0.01),
            "expected ~290, got {after}"
        );
    }

    #[test]
    fn test_batched_and_in_place_diverge_for_three_nodes() {
        let mut positions_in_place = vec![
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(40.0, 5.0),
        ];
        let mut positions_batched = positions_in_place.clone();

        let in_place = engine_with_iterations(1);
        let mut batched = engine_with_iterations(1);
        batched.set_relaxation(RelaxationMode::Batched);

        in_place.relax(&mut positions_in_place, &[]);
        batched.relax(&mut positions_batched, &[]);

        assert_ne!(positions_in_place, positions_batched);
    }

    #[test]
    fn test_setters() {
        let mut engine = Engine::default();
        engine.set_iterations(7).set_min_distance(42.0);
        assert_eq!(engine.iterations(), 7);
        assert_eq!(engine.min_distance(), 42.0);
    }
}
