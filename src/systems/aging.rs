use anyhow::Result;
use log::trace;

use crate::{
    components::{Counters, Lifetime},
    ecs::{Entity, Registry},
    rng::SystemId,
    scheduler::{System, SystemContext},
};

/// Counts lifetimes down and destroys entities that run out.
///
/// Expired entities are collected during the view and destroyed after it
/// ends.
#[derive(Default)]
pub struct AgingSystem {
    expired: Vec<Entity>,
}

impl AgingSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for AgingSystem {
    fn name(&self) -> &str {
        "aging"
    }

    fn system_id(&self) -> SystemId {
        3
    }

    fn update(&mut self, registry: &mut Registry, ctx: &mut SystemContext<'_>) -> Result<()> {
        let expired = &mut self.expired;
        expired.clear();
        registry
            .view_mut::<(Lifetime,)>()?
            .for_each(|entity, (lifetime,): (&mut Lifetime,)| {
                lifetime.remaining = lifetime.remaining.saturating_sub(1);
                if lifetime.remaining == 0 {
                    expired.push(entity);
                }
            });

        let mut destroyed = 0;
        for &entity in expired.iter() {
            if registry.destroy(entity) {
                destroyed += 1;
            }
        }
        if destroyed > 0 {
            trace!("tick {}: {destroyed} entities expired", ctx.tick);
            registry.each::<Counters>(|_, counters| counters.destroyed += destroyed);
        }
        Ok(())
    }
}
