/*
 * Debug Information Module
 *
 * Running diagnostics accumulated from tick reports, and flock-level metrics
 * that the viewer (or a test) can sample between ticks.
 *
 * Includes metrics for:
 * - Ticks run and time spent per tick
 * - Agents dropped by full grid cells (per tick and cumulative)
 * - Peak cell occupancy
 * - Order parameter and mean speed of the flock
 */

use std::time::Duration;

use glam::Vec2;

use crate::boid::Boid;
use crate::physics::TickReport;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepDiagnostics {
    pub ticks: u64,
    pub last_tick: TickReport,
    pub total_dropped: u64,
    pub peak_cell_occupancy: usize,
    pub total_step_time: Duration,
}

impl StepDiagnostics {
    pub fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.last_tick = *report;
        self.total_dropped += report.rebuild.dropped as u64;
        self.peak_cell_occupancy = self.peak_cell_occupancy.max(report.rebuild.max_occupancy);
        self.total_step_time += report.total_time();
    }

    pub fn mean_step_time(&self) -> Duration {
        if self.ticks == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((self.total_step_time.as_nanos() / u128::from(self.ticks)) as u64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlockMetrics {
    /// Length of the mean unit heading: 1 when every agent flies the same
    /// way, near 0 for random headings.
    pub order_parameter: f32,
    pub mean_speed: f32,
}

impl FlockMetrics {
    pub fn measure(boids: &[Boid]) -> Self {
        if boids.is_empty() {
            return Self::default();
        }

        let (heading_sum, speed_sum) = boids.iter().fold((Vec2::ZERO, 0.0f32), |(heading, speed), boid| {
            let v = boid.velocity.length();
            let unit = if v > 0.0 { boid.velocity / v } else { Vec2::ZERO };
            (heading + unit, speed + v)
        });

        let n = boids.len() as f32;
        Self {
            order_parameter: heading_sum.length() / n,
            mean_speed: speed_sum / n,
        }
    }
}
