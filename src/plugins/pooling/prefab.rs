use bevy::ecs::system::EntityCommands;
use bevy::prelude::*;

use super::TemplateId;

/// Something the registry can pre-instantiate.
pub trait Prefab {
    fn template(&self) -> TemplateId;

    /// Human-readable name, used for member entity names and log lines.
    fn label(&self) -> &str;

    /// Insert the template's components.
    ///
    /// The entity already carries `Name`, `PoolMember`, a default `Transform`,
    /// `Visibility::Hidden` and `ChildOf(container)`.
    fn instantiate(&self, entity: &mut EntityCommands<'_>);
}

/// Tag on every pooled entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolMember {
    pub template: TemplateId,
}

/// The single scope every pool member is parented under.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PoolContainer;
