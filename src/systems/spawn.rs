use anyhow::Result;
use rand::Rng;

use crate::{
    components::{Counters, Lifetime, Position, Tag, Velocity},
    config::SimulationConfig,
    ecs::{Entity, Registry},
    rng::{RngExt, SystemId},
    scheduler::{System, SystemContext},
};

/// Parameters for building a fresh agent.
#[derive(Clone, Debug)]
pub struct SpawnSettings {
    pub lifetime: (u32, u32),
    pub speed: (f32, f32),
    pub bounds: (f32, f32),
    pub tag_ratio: f64,
}

impl SpawnSettings {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            lifetime: (config.lifetime.min, config.lifetime.max),
            speed: (config.speed.min, config.speed.max),
            bounds: (config.bounds.width, config.bounds.height),
            tag_ratio: config.tag_ratio,
        }
    }
}

/// Creates one agent with a random position, heading, speed and lifetime.
pub fn spawn_agent<R: Rng>(
    registry: &mut Registry,
    rng: &mut R,
    settings: &SpawnSettings,
) -> Result<Entity> {
    let entity = registry.create();
    let (width, height) = settings.bounds;
    registry.emplace(
        entity,
        Position::new(rng.random_f32(0.0, width), rng.random_f32(0.0, height)),
    )?;

    let heading = rng.random_f32(0.0, std::f32::consts::TAU);
    let speed = rng.random_f32(settings.speed.0, settings.speed.1);
    registry.emplace(
        entity,
        Velocity::new(heading.cos() * speed, heading.sin() * speed),
    )?;

    let remaining = rng.random_u32(settings.lifetime.0, settings.lifetime.1);
    registry.emplace(entity, Lifetime { remaining })?;

    if rng.random_bool(settings.tag_ratio) {
        registry.emplace(entity, Tag(format!("agent-{}", entity.id())))?;
    }

    registry.each::<Counters>(|_, counters| counters.created += 1);
    Ok(entity)
}

pub struct SpawnSystem {
    per_tick: u32,
    settings: SpawnSettings,
}

impl SpawnSystem {
    pub fn new(per_tick: u32, settings: SpawnSettings) -> Self {
        Self { per_tick, settings }
    }
}

impl System for SpawnSystem {
    fn name(&self) -> &str {
        "spawn"
    }

    fn system_id(&self) -> SystemId {
        1
    }

    fn update(&mut self, registry: &mut Registry, ctx: &mut SystemContext<'_>) -> Result<()> {
        for _ in 0..self.per_tick {
            spawn_agent(registry, &mut *ctx.rng, &self.settings)?;
        }
        Ok(())
    }
}
