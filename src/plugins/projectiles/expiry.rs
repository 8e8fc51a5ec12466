//! Deferred projectile actions: bullet lifetime and shooter cooldown.
//!
//! Expiry goes through `release_lease`, so a timer that outlived its borrow (the bullet hit
//! something, went back, and was fired again) finds a newer generation and does nothing.

use bevy::prelude::*;

use crate::plugins::pooling::{PoolRegistry, ReleaseOutcome};
use crate::plugins::timers::{DeferredQueue, SimClock};

use super::ProjectileTimer;
use super::components::{Bullet, Shooter};

pub fn run_projectile_timers(
    clock: Res<SimClock>,
    mut timers: ResMut<DeferredQueue<ProjectileTimer>>,
    mut registry: ResMut<PoolRegistry>,
    mut q_bullets: Query<&mut Bullet>,
    mut q_shooters: Query<&mut Shooter>,
) {
    for fired in timers.drain_due(&clock) {
        match fired.action {
            ProjectileTimer::Expire(lease) => {
                if let Ok(mut bullet) = q_bullets.get_mut(lease.entity())
                    && bullet.expiry == Some(fired.token)
                {
                    bullet.expiry = None;
                }

                if let Ok(ReleaseOutcome::Deactivated) = registry.release_lease(lease) {
                    debug!("{:?} expired after its lifetime.", lease.entity());
                }
            }
            ProjectileTimer::ShooterReady(entity) => {
                // Shooter may have been despawned while cooling down.
                if let Ok(mut shooter) = q_shooters.get_mut(entity) {
                    shooter.ready = true;
                }
            }
        }
    }
}
