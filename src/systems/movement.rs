use anyhow::Result;

use crate::{
    components::{Position, Velocity},
    ecs::Registry,
    rng::SystemId,
    scheduler::{System, SystemContext},
};

/// Integrates velocity into position, wrapping around the world bounds.
pub struct MovementSystem {
    width: f32,
    height: f32,
}

impl MovementSystem {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Maps `value` into `[0, bound)`. `rem_euclid` alone can round a tiny
/// negative input up to exactly `bound`.
fn wrap(value: f32, bound: f32) -> f32 {
    let wrapped = value.rem_euclid(bound);
    if wrapped < bound {
        wrapped
    } else {
        0.0
    }
}

impl System for MovementSystem {
    fn name(&self) -> &str {
        "movement"
    }

    fn system_id(&self) -> SystemId {
        2
    }

    fn update(&mut self, registry: &mut Registry, ctx: &mut SystemContext<'_>) -> Result<()> {
        let (width, height, dt) = (self.width, self.height, ctx.dt);
        registry
            .view_mut::<(Position, Velocity)>()?
            .for_each(|_, (pos, vel): (&mut Position, &mut Velocity)| {
                pos.x = wrap(pos.x + vel.dx * dt, width);
                pos.y = wrap(pos.y + vel.dy * dt, height);
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngManager;

    #[test]
    fn test_movement_wraps() {
        let mut registry = Registry::new();
        let moving = registry.create();
        registry.emplace(moving, Position::new(9.0, 1.0)).unwrap();
        registry.emplace(moving, Velocity::new(2.0, -2.0)).unwrap();
        let still = registry.create();
        registry.emplace(still, Position::new(5.0, 5.0)).unwrap();

        let mut rng = RngManager::new(1);
        let mut ctx = SystemContext {
            tick: 1,
            dt: 1.0,
            rng: rng.system_rng(2),
        };
        MovementSystem::new(10.0, 10.0)
            .update(&mut registry, &mut ctx)
            .unwrap();

        assert_eq!(registry.get::<Position>(moving).unwrap(), &Position::new(1.0, 9.0));
        assert_eq!(registry.get::<Position>(still).unwrap(), &Position::new(5.0, 5.0));
    }

    #[test]
    fn test_wrap_stays_below_bound() {
        assert_eq!(wrap(-1e-10, 10.0), 0.0);
        assert_eq!(wrap(10.0, 10.0), 0.0);
        assert_eq!(wrap(-2.5, 10.0), 7.5);
        assert_eq!(wrap(12.5, 10.0), 2.5);
        for step in 0..1_000 {
            let value = -(step as f32) * 1e-7;
            let wrapped = wrap(value, 320.0);
            assert!((0.0..320.0).contains(&wrapped), "{value} -> {wrapped}");
        }
    }
}
