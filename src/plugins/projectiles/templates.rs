//! Bullet templates: config data that doubles as the pool prefab.

use avian2d::prelude::*;
use bevy::ecs::system::EntityCommands;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use serde::Deserialize;

use crate::common::layers::Layer;
use crate::common::tunables::Tunables;
use crate::plugins::pooling::{PoolError, PoolRegistry, Prefab, TemplateId};
use crate::plugins::timers::secs;

use super::components::{Bullet, BulletStats};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BulletTemplate {
    pub id: TemplateId,
    pub name: String,
    pub color: [f32; 3],
    pub radius: f32,
    pub speed: f32,
    pub damage: i32,
    pub lifetime_secs: f32,
}

impl Default for BulletTemplate {
    fn default() -> Self {
        Self {
            id: TemplateId::default(),
            name: "Bullet".into(),
            color: [1.0, 0.85, 0.3],
            radius: 4.0,
            speed: 720.0,
            damage: 1,
            lifetime_secs: 5.0,
        }
    }
}

impl BulletTemplate {
    pub fn stats(&self) -> BulletStats {
        BulletStats {
            damage: self.damage,
            speed: self.speed,
            lifetime: secs(self.lifetime_secs),
        }
    }
}

impl Prefab for BulletTemplate {
    fn template(&self) -> TemplateId {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    /// Physics components stay present; inactive members simply collide with nothing.
    fn instantiate(&self, entity: &mut EntityCommands<'_>) {
        let [r, g, b] = self.color;
        entity.insert((
            Bullet::default(),
            self.stats(),
            Sprite {
                color: Color::srgb(r, g, b),
                custom_size: Some(Vec2::splat(self.radius * 2.0)),
                ..default()
            },
            RigidBody::Dynamic,
            Collider::circle(self.radius),
            Sensor,
            inactive_bullet_layers(),
            LinearVelocity(Vec2::ZERO),
            // Avian only emits CollisionStart if one side opts in.
            CollisionEventsEnabled,
        ));
    }
}

/// Lookup of every configured bullet template.
#[derive(Resource, Debug, Default, Clone)]
pub struct BulletTemplates {
    by_id: HashMap<TemplateId, BulletTemplate>,
}

impl BulletTemplates {
    pub fn from_tunables(tunables: &Tunables) -> Self {
        let mut by_id = HashMap::default();
        for t in &tunables.bullets {
            if by_id.insert(t.id, t.clone()).is_some() {
                warn!("Duplicate bullet template {}; keeping the last definition.", t.id);
            }
        }
        Self { by_id }
    }

    pub fn get(&self, id: TemplateId) -> Option<&BulletTemplate> {
        self.by_id.get(&id)
    }
}

#[inline]
pub fn active_bullet_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::PlayerBullet, [Layer::World, Layer::Meteorite])
}

/// "Disabled" without structural changes: empty filters means we collide with nothing.
#[inline]
pub fn inactive_bullet_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::PlayerBullet, [] as [Layer; 0])
}

/// Make sure a pool exists for `id`, creating it at the default size if needed.
///
/// Returns `false` if the template is unknown or the pool couldn't be created.
pub fn ensure_bullet_pool(
    registry: &mut PoolRegistry,
    commands: &mut Commands,
    templates: &BulletTemplates,
    id: TemplateId,
) -> bool {
    if registry.pool_exists(id) {
        return true;
    }

    let Some(template) = templates.get(id) else {
        error!("Unknown bullet template {id}; cannot create its pool.");
        return false;
    };

    match registry.create_default_pool(commands, template) {
        Ok(()) | Err(PoolError::PoolAlreadyExists { .. }) => true,
        Err(_) => false,
    }
}
