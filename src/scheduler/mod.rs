//! Scheduler - runs systems against the registry, one after another

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::debug;
use rand_chacha::ChaCha8Rng;

use crate::ecs::Registry;
use crate::rng::{RngManager, SystemId};

/// Per-system view of the current tick.
pub struct SystemContext<'a> {
    pub tick: u64,
    pub dt: f32,
    pub rng: &'a mut ChaCha8Rng,
}

/// System trait - each simulation step implements this
pub trait System {
    fn name(&self) -> &str;
    fn system_id(&self) -> SystemId;
    fn update(&mut self, registry: &mut Registry, ctx: &mut SystemContext<'_>) -> Result<()>;
}

/// Statistics for a single tick
#[derive(Debug, Clone)]
pub struct TickStats {
    pub tick: u64,
    pub duration: Duration,
    pub alive: usize,
    pub system_times: Vec<(String, Duration)>,
}

pub struct Scheduler {
    systems: Vec<Box<dyn System>>,
    tick_count: u64,
    dt: f32,
    stats_history: Vec<TickStats>,
    max_stats_history: usize,
}

impl Scheduler {
    pub fn new(dt: f32) -> Self {
        Self {
            systems: Vec::new(),
            tick_count: 0,
            dt,
            stats_history: Vec::new(),
            max_stats_history: 100,
        }
    }

    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Execute one tick
    pub fn tick(&mut self, registry: &mut Registry, rng: &mut RngManager) -> Result<TickStats> {
        let tick_start = Instant::now();
        let mut system_times = Vec::with_capacity(self.systems.len());

        rng.advance_tick();
        let tick = self.tick_count + 1;

        for system in &mut self.systems {
            let system_start = Instant::now();
            let mut ctx = SystemContext {
                tick,
                dt: self.dt,
                rng: rng.system_rng(system.system_id()),
            };
            system
                .update(registry, &mut ctx)
                .with_context(|| format!("system `{}` failed on tick {tick}", system.name()))?;
            system_times.push((system.name().to_string(), system_start.elapsed()));
        }

        self.tick_count = tick;
        let stats = TickStats {
            tick,
            duration: tick_start.elapsed(),
            alive: registry.len(),
            system_times,
        };
        debug!(
            "tick {} done in {:?}, {} alive",
            stats.tick, stats.duration, stats.alive
        );

        self.stats_history.push(stats.clone());
        if self.stats_history.len() > self.max_stats_history {
            self.stats_history.remove(0);
        }

        Ok(stats)
    }

    /// Get recent tick statistics
    pub fn recent_stats(&self) -> &[TickStats] {
        &self.stats_history
    }

    /// Get average tick time from recent history
    pub fn average_tick_time(&self) -> Option<Duration> {
        if self.stats_history.is_empty() {
            return None;
        }

        let total: Duration = self.stats_history.iter().map(|s| s.duration).sum();
        Some(total / self.stats_history.len() as u32)
    }

    pub fn run(&mut self, registry: &mut Registry, rng: &mut RngManager, num_ticks: u64) -> Result<()> {
        for _ in 0..num_ticks {
            self.tick(registry, rng)?;
        }
        Ok(())
    }
}
