/*
 * Neighbor Aggregation Module
 *
 * Rather than collecting neighbor lists, a query folds every agent within the
 * perception radius into one LocalFlockStats. Distances are plain coordinate
 * differences: an agent does not see neighbors across the torus seam, even
 * though the cell window itself wraps.
 */

use glam::Vec2;

use crate::boid::Boid;
use crate::spatial_grid::SpatialGrid;

/// Squared distance below which two agents count as coincident and are left
/// out of the separation sum.
pub const COINCIDENT_EPSILON: f32 = 1e-4;

/// Summed statistics over one agent's neighborhood.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocalFlockStats {
    pub velocity_sum: Vec2,
    pub position_sum: Vec2,
    pub inverse_direction_sum: Vec2,
    pub count: usize,
}

impl LocalFlockStats {
    #[inline]
    fn accumulate(&mut self, agent: &Boid, other: &Boid, radius_sq: f32) {
        let offset = agent.position - other.position;
        let d2 = offset.length_squared();
        if d2 < radius_sq {
            self.velocity_sum += other.velocity;
            self.position_sum += other.position;
            self.count += 1;
            if d2 > COINCIDENT_EPSILON {
                self.inverse_direction_sum += offset / d2;
            }
        }
    }
}

/// Aggregate the neighbors of `boids[agent_index]` found in the
/// `cell_range` window of cells around its home cell.
///
/// `cell_range` must be at least `ceil(radius / grid.cell_size())`, otherwise
/// neighbors near the window edge are missed. This is not checked here.
pub fn aggregate(
    boids: &[Boid],
    agent_index: usize,
    grid: &SpatialGrid,
    cell_range: usize,
    radius: f32,
) -> LocalFlockStats {
    let agent = &boids[agent_index];
    let radius_sq = radius * radius;
    let home = grid.cell_of(agent.position);

    let mut stats = LocalFlockStats::default();
    for cell in grid.cells_in_range(home.row, home.col, cell_range) {
        for &other_index in grid.cell(cell.row, cell.col) {
            if other_index != agent_index {
                stats.accumulate(agent, &boids[other_index], radius_sq);
            }
        }
    }
    stats
}

/// Reference O(n) scan per agent over the whole population.
pub fn aggregate_brute_force(boids: &[Boid], agent_index: usize, radius: f32) -> LocalFlockStats {
    let agent = &boids[agent_index];
    let radius_sq = radius * radius;

    let mut stats = LocalFlockStats::default();
    for (other_index, other) in boids.iter().enumerate() {
        if other_index != agent_index {
            stats.accumulate(agent, other, radius_sq);
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SimulationParams;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn params() -> SimulationParams {
        SimulationParams {
            world_width: 1000.0,
            world_height: 1000.0,
            grid_resolution: 50.0,
            perception_radius: 50.0,
            cell_capacity: 64,
            ..SimulationParams::dense()
        }
    }

    fn boid_at(x: f32, y: f32, vx: f32, vy: f32) -> Boid {
        Boid::new(Vec2::new(x, y), Vec2::new(vx, vy))
    }

    #[test]
    fn close_pair_sees_each_other_and_loner_sees_nobody() {
        let params = params();
        let boids = [
            boid_at(10.0, 10.0, 1.0, 0.0),
            boid_at(12.0, 10.0, 0.0, 1.0),
            boid_at(200.0, 200.0, 1.0, 1.0),
        ];
        let mut grid = SpatialGrid::new(&params).unwrap();
        grid.rebuild(&boids);

        let first = aggregate(&boids, 0, &grid, 1, 50.0);
        assert_eq!(first.count, 1);
        assert_eq!(first.velocity_sum, Vec2::new(0.0, 1.0));
        assert_eq!(first.position_sum, Vec2::new(12.0, 10.0));
        // (10 - 12, 0) / 4
        assert_relative_eq!(first.inverse_direction_sum.x, -0.5);
        assert_relative_eq!(first.inverse_direction_sum.y, 0.0);

        let second = aggregate(&boids, 1, &grid, 1, 50.0);
        assert_eq!(second.count, 1);
        assert_relative_eq!(second.inverse_direction_sum.x, 0.5);

        let loner = aggregate(&boids, 2, &grid, 1, 50.0);
        assert_eq!(loner, LocalFlockStats::default());
    }

    #[test]
    fn coincident_agents_count_but_do_not_repel() {
        let params = params();
        let boids = [boid_at(100.0, 100.0, 0.0, 0.0), boid_at(100.0, 100.0, 2.0, 0.0)];
        let mut grid = SpatialGrid::new(&params).unwrap();
        grid.rebuild(&boids);

        let stats = aggregate(&boids, 0, &grid, 1, 50.0);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.inverse_direction_sum, Vec2::ZERO);
        assert_eq!(stats.velocity_sum, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn radius_boundary_is_exclusive() {
        let params = params();
        let boids = [boid_at(100.0, 100.0, 0.0, 0.0), boid_at(150.0, 100.0, 0.0, 0.0)];
        let mut grid = SpatialGrid::new(&params).unwrap();
        grid.rebuild(&boids);
        assert_eq!(aggregate(&boids, 0, &grid, 1, 50.0).count, 0);
    }

    #[test]
    fn no_neighbors_across_the_seam() {
        let params = params();
        let boids = [boid_at(1.0, 500.0, 0.0, 0.0), boid_at(999.0, 500.0, 0.0, 0.0)];
        let mut grid = SpatialGrid::new(&params).unwrap();
        grid.rebuild(&boids);

        // The window wraps onto the far column, but plain distance is 998.
        assert_eq!(aggregate(&boids, 0, &grid, 1, 50.0).count, 0);
        assert_eq!(aggregate_brute_force(&boids, 0, 50.0).count, 0);
    }

    #[test]
    fn grid_matches_brute_force_on_random_population() {
        let params = params();
        let mut rng = StdRng::seed_from_u64(7);
        let boids: Vec<Boid> = (0..600)
            .map(|_| {
                boid_at(
                    rng.gen_range(0.0..1000.0),
                    rng.gen_range(0.0..1000.0),
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-5.0..5.0),
                )
            })
            .collect();
        let mut grid = SpatialGrid::new(&params).unwrap();
        assert_eq!(grid.rebuild(&boids).dropped, 0);

        for i in 0..boids.len() {
            let fast = aggregate(&boids, i, &grid, 1, 50.0);
            let slow = aggregate_brute_force(&boids, i, 50.0);
            assert_eq!(fast.count, slow.count, "agent {i}");
            assert_relative_eq!(fast.velocity_sum.x, slow.velocity_sum.x, epsilon = 1e-3);
            assert_relative_eq!(fast.velocity_sum.y, slow.velocity_sum.y, epsilon = 1e-3);
            assert_relative_eq!(fast.position_sum.x, slow.position_sum.x, epsilon = 1e-2);
            assert_relative_eq!(fast.position_sum.y, slow.position_sum.y, epsilon = 1e-2);
            assert_relative_eq!(
                fast.inverse_direction_sum.x,
                slow.inverse_direction_sum.x,
                epsilon = 1e-3
            );
            assert_relative_eq!(
                fast.inverse_direction_sum.y,
                slow.inverse_direction_sum.y,
                epsilon = 1e-3
            );
        }
    }
}
