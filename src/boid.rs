/*
 * Boid Module
 *
 * This module defines the Boid struct and its behavior.
 * Each boid follows three main rules, computed from aggregated neighbor stats:
 * 1. Separation: Avoid crowding neighbors
 * 2. Alignment: Steer towards the average heading of neighbors
 * 3. Cohesion: Steer towards the average position of neighbors
 *
 * Integration (velocity update, speed bound, toroidal wrap) also lives here.
 */

use glam::Vec2;
use rand::Rng;

use crate::neighbors::LocalFlockStats;
use crate::params::{ForceWeights, SimulationParams, VelocityPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Boid {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
}

impl Boid {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vec2::ZERO,
        }
    }

    /// Uniform position over the world, uniform velocity components in
    /// `[-max_initial_velocity, max_initial_velocity]`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, params: &SimulationParams) -> Self {
        let v = params.initial_state.max_initial_velocity;
        let position = Vec2::new(
            rng.gen_range(0.0..params.world_width),
            rng.gen_range(0.0..params.world_height),
        );
        let velocity = if v > 0.0 {
            Vec2::new(rng.gen_range(-v..=v), rng.gen_range(-v..=v))
        } else {
            Vec2::ZERO
        };
        Self::new(position, velocity)
    }

    // Steer towards the local mean heading
    pub fn alignment(&self, stats: &LocalFlockStats, weight: f32, max_acceleration: f32) -> Vec2 {
        if stats.count == 0 {
            return Vec2::ZERO;
        }
        let mean_velocity = stats.velocity_sum / stats.count as f32;
        ((mean_velocity - self.velocity) * weight).clamp_length_max(max_acceleration)
    }

    // Steer towards the local mean position
    pub fn cohesion(&self, stats: &LocalFlockStats, weight: f32, max_acceleration: f32) -> Vec2 {
        if stats.count == 0 {
            return Vec2::ZERO;
        }
        let center = stats.position_sum / stats.count as f32;
        ((center - self.position) * weight).clamp_length_max(max_acceleration)
    }

    // Steer away from close neighbors, weighted by inverse squared distance
    pub fn separation(&self, stats: &LocalFlockStats, weight: f32, max_acceleration: f32) -> Vec2 {
        if stats.count == 0 {
            return Vec2::ZERO;
        }
        (stats.inverse_direction_sum / stats.count as f32 * weight).clamp_length_max(max_acceleration)
    }

    /// Sum of the three individually clamped rules. The sum itself is not
    /// clamped again.
    pub fn steering(&self, stats: &LocalFlockStats, weights: &ForceWeights, max_acceleration: f32) -> Vec2 {
        self.alignment(stats, weights.alignment, max_acceleration)
            + self.cohesion(stats, weights.cohesion, max_acceleration)
            + self.separation(stats, weights.separation, max_acceleration)
    }

    /// Advance one tick: `v += a`, bound speed, `p += v`, wrap onto the torus.
    pub fn integrate(&mut self, params: &SimulationParams) {
        self.velocity += self.acceleration;
        self.velocity = params
            .velocity_policy
            .apply(self.velocity, params.min_velocity, params.max_velocity);

        self.position += self.velocity;
        self.wrap_edges(params.world_width, params.world_height);
    }

    // Wrap the boid around the world edges
    pub fn wrap_edges(&mut self, world_width: f32, world_height: f32) {
        self.position.x = wrap_coordinate(self.position.x, world_width);
        self.position.y = wrap_coordinate(self.position.y, world_height);
    }
}

/// Floored modulo into `[0, size)`.
///
/// `rem_euclid` can round a tiny negative value up to exactly `size`; that case
/// maps to `0` so the half-open bound always holds.
#[inline]
pub fn wrap_coordinate(value: f32, size: f32) -> f32 {
    let wrapped = value.rem_euclid(size);
    if wrapped >= size {
        0.0
    } else {
        wrapped
    }
}

impl VelocityPolicy {
    /// Bound `velocity`'s length according to the policy.
    ///
    /// Lengths are measured on the velocity divided by its largest component,
    /// so huge but finite velocities keep their heading instead of overflowing
    /// to a zero rescale.
    pub fn apply(self, velocity: Vec2, min_velocity: f32, max_velocity: f32) -> Vec2 {
        let largest = velocity.abs().max_element();
        if largest == 0.0 {
            return match self {
                VelocityPolicy::ClampMax => velocity,
                // No heading to preserve
                VelocityPolicy::Band => Vec2::X * min_velocity,
            };
        }

        let direction = velocity / largest;
        let direction_length = direction.length();
        let speed = largest * direction_length;

        let target = match self {
            VelocityPolicy::ClampMax if speed > max_velocity => max_velocity,
            VelocityPolicy::Band if speed > max_velocity => max_velocity,
            VelocityPolicy::Band if speed < min_velocity => min_velocity,
            _ => return velocity,
        };
        direction * (target / direction_length)
    }
}
