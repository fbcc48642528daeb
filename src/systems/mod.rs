mod aging;
mod movement;
mod spawn;

pub use aging::AgingSystem;
pub use movement::MovementSystem;
pub use spawn::{spawn_agent, SpawnSettings, SpawnSystem};
