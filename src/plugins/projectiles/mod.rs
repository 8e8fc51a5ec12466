//! Projectiles: the pool's main client.
//!
//! Bullets are pool members (`BulletTemplate` is the prefab). The registry decides which
//! member is free; this plugin does everything else with it.
//!
//! # Data flow
//! ```text
//!   Update
//!┌──────────────────────────────────────────────────────────────────────────┐
//!│  player::gather_input          writes FireInput                          │
//!│  fire_bullets                  reads FireInput                           │
//!│                                registry.borrow(loadout.current) -> Lease │
//!│                                resets pose/velocity/damage/layers        │
//!│                                schedules Expire(lease), ShooterReady     │
//!└──────────────────────────────────────────────────────────────────────────┘
//!                │
//!                v
//!   FixedUpdate
//!┌──────────────────────────────────────────────────────────────────────────┐
//!│  run_projectile_timers         Expire(lease) -> registry.release_lease   │
//!│                                ShooterReady  -> shooter.ready = true     │
//!└──────────────────────────────────────────────────────────────────────────┘
//!                │
//!                v
//!   FixedPostUpdate
//!┌──────────────────────────────────────────────────────────────────────────┐
//!│  (Avian emits CollisionStart)                                            │
//!│  resolve_bullet_collisions     damage meteorite, cancel expiry,          │
//!│                                registry.release(bullet)                  │
//!│  commit_released_bullets       inactive -> hidden, still, no filters     │
//!└──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Expiry and collision race for the same bullet. Whichever releases first wins: collision
//! cancels the timer, and a timer that fires anyway carries a lease from an older borrow.

pub mod collision;
pub mod commit;
pub mod components;
pub mod expiry;
pub mod fire;
pub mod templates;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use bevy::prelude::*;

use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::pooling::Lease;
use crate::plugins::timers::DeferredQueue;

/// Deferred work owned by this plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileTimer {
    /// Lifetime ran out for this borrow.
    Expire(Lease),
    /// Fire cooldown is over.
    ShooterReady(Entity),
}

pub struct ProjectilesPlugin;

impl Plugin for ProjectilesPlugin {
    fn build(&self, app: &mut App) {
        let templates =
            templates::BulletTemplates::from_tunables(app.world().resource::<Tunables>());

        app.insert_resource(templates)
            .init_resource::<DeferredQueue<ProjectileTimer>>()
            .add_systems(OnEnter(GameState::GameOver), clear_projectile_timers);

        app.add_systems(
            Update,
            fire::fire_bullets.run_if(in_state(GameState::InGame)),
        );

        app.add_systems(FixedUpdate, expiry::run_projectile_timers);

        // The commit runs in every state so a session reset still hides everything.
        app.add_systems(
            FixedPostUpdate,
            (
                collision::resolve_bullet_collisions
                    .after(CollisionEventSystems)
                    .run_if(in_state(GameState::InGame)),
                commit::commit_released_bullets.after(collision::resolve_bullet_collisions),
            ),
        );
    }
}

fn clear_projectile_timers(mut timers: ResMut<DeferredQueue<ProjectileTimer>>) {
    timers.clear();
}

#[cfg(test)]
mod tests;
