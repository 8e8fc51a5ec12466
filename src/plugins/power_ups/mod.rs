//! Power-ups: timed bullet-template substitution.
//!
//! The registry has no idea which template a shooter is "on". That lives in the player's
//! `Loadout`; a power-up swaps `loadout.current`, makes sure the pool exists, and schedules
//! a revert. A newer pickup cancels the older revert.
//!
//! ```text
//! FixedPostUpdate: collect_power_ups      CollisionStart(pickup, player)
//!                                         -> cancel old timer, equip, ensure pool
//!                                         -> schedule Expire if duration > 0
//!                                         -> PowerUpApplied, pickup -> PendingDespawn
//! FixedUpdate:     run_power_up_timers    Expire -> revert, re-create initial pool if gone
//!                                         -> PowerUpExpired
//! ```

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use serde::Deserialize;

use crate::common::layers::Layer;
use crate::common::messages::{PowerUpApplied, PowerUpExpired};
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::player::Player;
use crate::plugins::pooling::{PoolRegistry, TemplateId};
use crate::plugins::projectiles::components::Loadout;
use crate::plugins::projectiles::templates::{BulletTemplates, ensure_bullet_pool};
use crate::plugins::timers::{DeferredQueue, SimClock, TimerToken, secs};
use crate::plugins::world::{Falling, HALF_H, PendingDespawn};

const RADIUS: f32 = 12.0;
const SPAWN_INTERVAL_SECS: f32 = 12.0;

/// A power-up definition from config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PowerUpData {
    pub name: String,
    /// Template granted while active. `None` means "back to the initial bullet".
    pub bullet: Option<TemplateId>,
    /// `<= 0` lasts until replaced.
    pub duration_secs: f32,
    pub color: [f32; 3],
}

impl Default for PowerUpData {
    fn default() -> Self {
        Self {
            name: "New PowerUp".into(),
            bullet: None,
            duration_secs: 10.0,
            color: [1.0, 1.0, 1.0],
        }
    }
}

/// Falling pickup carrying its definition.
#[derive(Component, Debug, Clone)]
pub struct PowerUpPickup(pub PowerUpData);

/// What the player currently has, and the timer that will take it away.
#[derive(Component, Debug, Default, Clone)]
pub struct PowerUpSlot {
    pub active: Option<String>,
    pub timer: Option<TimerToken>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpTimer {
    Expire { player: Entity },
}

#[derive(Resource, Debug)]
pub struct PowerUpSpawner {
    pub timer: Timer,
    pub next: usize,
}

impl Default for PowerUpSpawner {
    fn default() -> Self {
        Self {
            timer: Timer::from_seconds(SPAWN_INTERVAL_SECS, TimerMode::Repeating),
            next: 0,
        }
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<DeferredQueue<PowerUpTimer>>()
        .init_resource::<PowerUpSpawner>()
        .add_systems(OnEnter(GameState::InGame), reset_spawner)
        .add_systems(OnEnter(GameState::GameOver), clear_power_up_timers)
        .add_systems(Update, tick_spawner.run_if(in_state(GameState::InGame)))
        .add_systems(
            FixedUpdate,
            run_power_up_timers.run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            collect_power_ups
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        );
}

pub fn spawn_pickup(
    commands: &mut Commands,
    tunables: &Tunables,
    data: &PowerUpData,
    x: f32,
) -> Entity {
    let [r, g, b] = data.color;
    commands
        .spawn((
            Name::new(format!("PowerUp({})", data.name)),
            PowerUpPickup(data.clone()),
            Sprite {
                color: Color::srgb(r, g, b),
                custom_size: Some(Vec2::splat(RADIUS * 2.0)),
                ..default()
            },
            Transform::from_xyz(x, HALF_H + RADIUS * 2.0, 1.0),
            RigidBody::Kinematic,
            Collider::circle(RADIUS),
            Sensor,
            CollisionLayers::new(Layer::Pickup, [Layer::Player]),
            LinearVelocity(Vec2::new(0.0, -tunables.power_up_fall_speed)),
            CollisionEventsEnabled,
            Falling,
            DespawnOnExit(GameState::InGame),
        ))
        .id()
}

fn reset_spawner(mut spawner: ResMut<PowerUpSpawner>) {
    *spawner = PowerUpSpawner::default();
}

fn clear_power_up_timers(mut timers: ResMut<DeferredQueue<PowerUpTimer>>) {
    timers.clear();
}

fn tick_spawner(
    mut commands: Commands,
    time: Res<Time>,
    tunables: Res<Tunables>,
    mut spawner: ResMut<PowerUpSpawner>,
) {
    spawner.timer.tick(time.delta());
    if tunables.power_ups.is_empty() {
        return;
    }

    for _ in 0..spawner.timer.times_finished_this_tick() {
        let i = spawner.next % tunables.power_ups.len();
        spawner.next = spawner.next.wrapping_add(1);
        // Alternate sides so pickups don't stack on the meteorite lanes.
        let x = if i % 2 == 0 { -160.0 } else { 160.0 };
        spawn_pickup(&mut commands, &tunables, &tunables.power_ups[i], x);
    }
}

pub fn collect_power_ups(
    mut commands: Commands,
    mut started: MessageReader<CollisionStart>,
    q_pickups: Query<&PowerUpPickup, Without<PendingDespawn>>,
    mut q_player: Query<(&mut Loadout, &mut PowerUpSlot), With<Player>>,
    mut registry: ResMut<PoolRegistry>,
    templates: Res<BulletTemplates>,
    mut timers: ResMut<DeferredQueue<PowerUpTimer>>,
    clock: Res<SimClock>,
    mut applied: MessageWriter<PowerUpApplied>,
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        let a = ev.body1.unwrap_or(ev.collider1);
        let b = ev.body2.unwrap_or(ev.collider2);

        let (pickup, player) = if q_pickups.contains(a) && q_player.contains(b) {
            (a, b)
        } else if q_pickups.contains(b) && q_player.contains(a) {
            (b, a)
        } else {
            continue;
        };

        if !seen.insert(pickup) {
            continue;
        }

        let Ok(PowerUpPickup(data)) = q_pickups.get(pickup) else {
            continue;
        };
        let Ok((mut loadout, mut slot)) = q_player.get_mut(player) else {
            continue;
        };

        info!("Applying power-up {}.", data.name);

        if let Some(token) = slot.timer.take() {
            timers.cancel(token);
        }

        match data.bullet {
            Some(bullet) => {
                if ensure_bullet_pool(&mut registry, &mut commands, &templates, bullet) {
                    loadout.equip(Some(bullet));
                    info!("Bullet template changed to {bullet}.");
                } else {
                    warn!(
                        "Power-up {} grants unknown bullet {bullet}; keeping the initial template.",
                        data.name
                    );
                    loadout.revert();
                }
            }
            None => {
                warn!(
                    "Power-up {} has no bullet template. Reverting to initial.",
                    data.name
                );
                loadout.revert();
            }
        }

        if data.duration_secs > 0.0 {
            slot.timer = Some(timers.schedule(
                &clock,
                secs(data.duration_secs),
                PowerUpTimer::Expire { player },
            ));
            debug!("Power-up {} active for {} seconds.", data.name, data.duration_secs);
        } else {
            debug!("Power-up {} lasts until replaced.", data.name);
        }

        slot.active = Some(data.name.clone());
        applied.write(PowerUpApplied {
            player,
            name: data.name.clone(),
        });
        commands.entity(pickup).insert(PendingDespawn);
    }
}

pub fn run_power_up_timers(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut timers: ResMut<DeferredQueue<PowerUpTimer>>,
    mut q_player: Query<(&mut Loadout, &mut PowerUpSlot)>,
    mut registry: ResMut<PoolRegistry>,
    templates: Res<BulletTemplates>,
    mut expired: MessageWriter<PowerUpExpired>,
) {
    for fired in timers.drain_due(&clock) {
        let PowerUpTimer::Expire { player } = fired.action;

        let Ok((mut loadout, mut slot)) = q_player.get_mut(player) else {
            continue;
        };
        // Superseded by a later pickup.
        if slot.timer != Some(fired.token) {
            continue;
        }

        slot.timer = None;
        let name = slot.active.take().unwrap_or_default();
        let initial = loadout.revert();
        info!("Power-up {name} ended; back to {initial}.");

        if !registry.pool_exists(initial) {
            warn!("Initial bullet pool for {initial} not found on revert. Creating it now.");
            ensure_bullet_pool(&mut registry, &mut commands, &templates, initial);
        }

        expired.write(PowerUpExpired { player, name });
    }
}
