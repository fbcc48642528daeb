pub mod components;
pub mod config;
pub mod ecs;
pub mod rng;
pub mod scheduler;
pub mod simulation;
pub mod systems;

pub use config::SimulationConfig;
pub use ecs::{EcsError, Entity, Registry};
pub use simulation::{Simulation, SimulationSummary};
