use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::health::Health;
use crate::common::layers::Layer;
use crate::plugins::pooling::PoolRegistry;
use crate::plugins::timers::DeferredQueue;

use super::ProjectileTimer;
use super::components::Bullet;

#[derive(Clone, Copy, Debug)]
struct CollisionTarget {
    collider: Entity,
    body: Option<Entity>,
}

impl CollisionTarget {
    #[inline]
    fn gameplay_owner(self) -> Entity {
        self.body.unwrap_or(self.collider)
    }
}

#[inline]
fn targets(ev: &CollisionStart) -> (CollisionTarget, CollisionTarget) {
    (
        CollisionTarget {
            collider: ev.collider1,
            body: ev.body1,
        },
        CollisionTarget {
            collider: ev.collider2,
            body: ev.body2,
        },
    )
}

#[inline]
fn is_in_layer(layers: &CollisionLayers, layer: Layer) -> bool {
    layers.memberships.has_all(layer)
}

/// Any contact sends an active bullet straight back to its pool and cancels its expiry.
/// Meteorites take the bullet's damage first.
pub fn resolve_bullet_collisions(
    mut started: MessageReader<CollisionStart>,
    mut registry: ResMut<PoolRegistry>,
    mut timers: ResMut<DeferredQueue<ProjectileTimer>>,
    mut q_bullets: Query<&mut Bullet>,
    q_layers: Query<&CollisionLayers>,
    mut q_health: Query<&mut Health, Without<Bullet>>,
    // Per-frame dedupe
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        let (t1, t2) = targets(ev);

        let b1 = q_bullets.contains(t1.collider);
        let b2 = q_bullets.contains(t2.collider);
        if !(b1 ^ b2) {
            continue; // must be exactly one bullet
        }
        let (bullet_side, other_side) = if b1 { (t1, t2) } else { (t2, t1) };

        if registry.is_active(bullet_side.collider) != Some(true) {
            continue;
        }
        if !seen.insert(bullet_side.collider) {
            continue;
        }

        let Ok(mut bullet) = q_bullets.get_mut(bullet_side.collider) else {
            continue;
        };

        if let Ok(other_layers) = q_layers.get(other_side.collider)
            && is_in_layer(other_layers, Layer::Meteorite)
        {
            let target = other_side.gameplay_owner();
            if let Ok(mut health) = q_health.get_mut(target) {
                let outcome = health.take_damage(bullet.damage);
                debug!(
                    "Bullet {:?} hit {target:?} for {} ({outcome:?}, {} left).",
                    bullet_side.collider,
                    bullet.damage,
                    health.current()
                );
            }
        }

        if let Some(token) = bullet.expiry.take() {
            timers.cancel(token);
        }
        let _ = registry.release(bullet_side.collider);
    }
}
