use bevy::prelude::*;

use super::TemplateId;

/// Non-fatal pool conditions.
///
/// Every variant is recoverable by the immediate caller: skip the shot, skip the effect,
/// keep playing. The registry logs each one where it is detected.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool for {template} already exists")]
    PoolAlreadyExists { template: TemplateId },

    #[error("no pool found for {template}")]
    PoolNotFound { template: TemplateId },

    #[error("no inactive objects available in pool for {template}")]
    PoolExhausted { template: TemplateId },

    #[error("{entity:?} is not owned by any pool")]
    InvalidHandleReturn { entity: Entity },

    #[error("refusing to create an empty pool for {template}")]
    EmptyPool { template: TemplateId },
}
