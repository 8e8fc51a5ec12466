//! Shot consumer: borrow a bullet from the pool and launch it.
//!
//! The registry only flips the member to active. Everything a previous shot may have left
//! on the entity (pose, velocity, damage, timers) is reset here, right after the borrow.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::messages::FireInput;
use crate::plugins::pooling::PoolRegistry;
use crate::plugins::timers::{DeferredQueue, SimClock};

use super::ProjectileTimer;
use super::components::{Bullet, BulletStats, FirePoint, Loadout, Shooter};
use super::templates::active_bullet_layers;

type ShooterItem = (
    &'static mut Shooter,
    &'static Loadout,
    &'static FirePoint,
    &'static Transform,
);

type BulletItem = (
    &'static mut Bullet,
    &'static BulletStats,
    &'static mut Transform,
    &'static mut LinearVelocity,
    &'static mut Visibility,
    &'static mut CollisionLayers,
);

pub fn fire_bullets(
    mut reader: MessageReader<FireInput>,
    mut registry: ResMut<PoolRegistry>,
    mut timers: ResMut<DeferredQueue<ProjectileTimer>>,
    clock: Res<SimClock>,
    mut q_shooters: Query<ShooterItem, Without<Bullet>>,
    mut q_bullets: Query<BulletItem, Without<Shooter>>,
) {
    for req in reader.read() {
        let Ok((mut shooter, loadout, fire_point, shooter_tf)) = q_shooters.get_mut(req.shooter)
        else {
            debug!("FireInput from {:?}, which is not a shooter.", req.shooter);
            continue;
        };

        if !shooter.ready {
            continue;
        }

        // Exhausted or missing pool: already logged, no shot this time.
        let Ok(lease) = registry.borrow(loadout.current) else {
            continue;
        };

        shooter.ready = false;
        timers.schedule(
            &clock,
            shooter.cooldown,
            ProjectileTimer::ShooterReady(req.shooter),
        );

        let Ok((mut bullet, stats, mut tf, mut vel, mut vis, mut layers)) =
            q_bullets.get_mut(lease.entity())
        else {
            error!(
                "Pooled {:?} for {} has no bullet components; returning it.",
                lease.entity(),
                lease.template()
            );
            let _ = registry.release_lease(lease);
            continue;
        };

        let dir = fire_point.direction.normalize_or(Vec2::Y);
        let origin = shooter_tf.translation.truncate() + fire_point.offset;

        // Lease guard makes a leftover expiry inert anyway; drop it so the queue stays small.
        if let Some(old) = bullet.expiry.take() {
            timers.cancel(old);
        }
        bullet.reset_for_fire(stats, lease);
        tf.translation = origin.extend(2.0);
        tf.rotation = Quat::from_rotation_arc_2d(Vec2::Y, dir);
        vel.0 = dir * stats.speed;
        *vis = Visibility::Visible;
        *layers = active_bullet_layers();

        bullet.expiry = Some(timers.schedule(
            &clock,
            stats.lifetime,
            ProjectileTimer::Expire(lease),
        ));

        debug!("Fired {:?} ({}) from {:?}.", lease.entity(), lease.template(), req.shooter);
    }
}
