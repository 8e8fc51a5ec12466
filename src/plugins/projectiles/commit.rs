//! Release commit: make released bullets look and behave released.
//!
//! This system is the "owner" of the *inactive invariants*. Whatever returned the bullet
//! (collision, expiry, session reset), an inactive bullet must be:
//! - hidden
//! - velocity = 0
//! - collide with nothing (filters empty)
//! - holding no lease and no pending expiry

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::plugins::pooling::PoolRegistry;
use crate::plugins::timers::DeferredQueue;

use super::ProjectileTimer;
use super::components::Bullet;
use super::templates::inactive_bullet_layers;

pub fn commit_released_bullets(
    registry: Res<PoolRegistry>,
    mut timers: ResMut<DeferredQueue<ProjectileTimer>>,
    mut q: Query<(
        Entity,
        &mut Bullet,
        &mut Visibility,
        &mut LinearVelocity,
        &mut CollisionLayers,
    )>,
) {
    for (e, mut bullet, mut vis, mut vel, mut layers) in &mut q {
        if registry.is_active(e) != Some(false) {
            continue;
        }
        if *vis == Visibility::Hidden && bullet.lease.is_none() && bullet.expiry.is_none() {
            continue;
        }

        if let Some(token) = bullet.expiry.take() {
            timers.cancel(token);
        }
        bullet.lease = None;
        *vis = Visibility::Hidden;
        vel.0 = Vec2::ZERO;
        *layers = inactive_bullet_layers();
    }
}
