//! Error types surfaced by the registry and its storages

use thiserror::Error;

use super::Entity;

pub type Result<T, E = EcsError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum EcsError {
    /// The handle is unknown, was destroyed, or carries an outdated version.
    #[error("entity {0} is not alive")]
    EntityNotAlive(Entity),

    #[error("entity {entity} has no `{component}` component")]
    ComponentNotFound {
        entity: Entity,
        component: &'static str,
    },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Every 32-bit entity id has been handed out at least once.
    #[error("entity id space exhausted")]
    EntityIdsExhausted,

    #[error("component `{component}` requested more than once in a mutable view")]
    AliasedComponentAccess { component: &'static str },

    #[error("failed to construct `{component}` component")]
    ComponentConstruction {
        component: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
