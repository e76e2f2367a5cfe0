/*
 * Boid Flocking Kernel - Module Definitions
 *
 * Agents move on a toroidal 2D world. Every tick the spatial grid is rebuilt,
 * each agent's steering is computed from the aggregated state of its
 * neighbors, and all agents are integrated. The two parallel phases are
 * separated by a fork-join barrier.
 */

// Re-export key components for easier access
pub use boid::{wrap_coordinate, Boid};
pub use debug::{FlockMetrics, StepDiagnostics};
pub use error::{FlockError, Result};
pub use neighbors::{aggregate, aggregate_brute_force, LocalFlockStats};
pub use params::{ForceWeights, InitialState, SimulationParams, VelocityPolicy};
pub use physics::{Phase, StepScheduler, TickReport};
pub use simulation::{AgentView, Simulation};
pub use spatial_grid::{CellCoord, RebuildReport, SpatialGrid};

// Define modules
pub mod boid;
pub mod debug;
pub mod error;
pub mod neighbors;
pub mod params;
pub mod physics;
pub mod simulation;
pub mod spatial_grid;

pub use glam::Vec2;
