//! Churn simulation: a population of short-lived agents driven through the
//! registry by the scheduler.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{
    components::{Counters, Position, Tag},
    config::SimulationConfig,
    ecs::{Entity, Registry},
    rng::{RngManager, SystemId},
    scheduler::{Scheduler, TickStats},
    systems::{spawn_agent, AgingSystem, MovementSystem, SpawnSettings, SpawnSystem},
};

/// Stream used for the initial population, before the first tick.
const SEED_STREAM: SystemId = 0;

/// End-of-run report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub name: String,
    pub ticks: u64,
    pub alive: usize,
    pub tagged: usize,
    pub created: u64,
    pub destroyed: u64,
    pub recycled: u64,
    pub max_version: u32,
    pub avg_tick_ms: f64,
}

pub struct Simulation {
    config: SimulationConfig,
    registry: Registry,
    scheduler: Scheduler,
    rng: RngManager,
    counters: Entity,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate().context("invalid simulation config")?;

        let settings = SpawnSettings::from_config(&config);
        let mut registry = Registry::with_capacity(config.initial_entities as usize + 1);
        let counters = registry.create();
        registry.emplace(counters, Counters::default())?;

        let mut rng = RngManager::new(config.seed);
        for _ in 0..config.initial_entities {
            spawn_agent(&mut registry, rng.system_rng(SEED_STREAM), &settings)?;
        }
        info!(
            "simulation `{}` seeded with {} agents (seed {})",
            config.name, config.initial_entities, config.seed
        );

        let scheduler = Scheduler::new(config.dt)
            .with_system(SpawnSystem::new(config.spawn_per_tick, settings.clone()))
            .with_system(MovementSystem::new(settings.bounds.0, settings.bounds.1))
            .with_system(AgingSystem::new());

        Ok(Self {
            config,
            registry,
            scheduler,
            rng,
            counters,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn tick_count(&self) -> u64 {
        self.scheduler.tick_count()
    }

    /// Runs a single tick.
    pub fn step(&mut self) -> Result<TickStats> {
        self.scheduler.tick(&mut self.registry, &mut self.rng)
    }

    pub fn recent_stats(&self) -> &[TickStats] {
        self.scheduler.recent_stats()
    }

    pub fn run(&mut self, ticks: u64) -> Result<SimulationSummary> {
        self.scheduler
            .run(&mut self.registry, &mut self.rng, ticks)?;
        let summary = self.summary()?;
        info!(
            "simulation `{}` finished after {} ticks: {} alive, {} recycled",
            summary.name, summary.ticks, summary.alive, summary.recycled
        );
        Ok(summary)
    }

    pub fn summary(&self) -> Result<SimulationSummary> {
        let counters = self
            .registry
            .get::<Counters>(self.counters)
            .context("bookkeeping entity lost its counters")?;
        let max_version = self
            .registry
            .entities()
            .map(|entity| entity.version())
            .max()
            .unwrap_or(0);
        let avg_tick_ms = self
            .scheduler
            .average_tick_time()
            .map_or(0.0, |d| d.as_secs_f64() * 1000.0);

        Ok(SimulationSummary {
            name: self.config.name.clone(),
            ticks: self.scheduler.tick_count(),
            alive: self.registry.view::<(Position,)>().count(),
            tagged: self.registry.view::<(Position, Tag)>().count(),
            created: counters.created,
            destroyed: counters.destroyed,
            recycled: self.registry.allocator().recycled(),
            max_version,
            avg_tick_ms,
        })
    }
}
