//! Meteorites: falling targets that hurt the player on contact.
//!
//! ```text
//! Update:          tick_spawner                 timer -> spawn a meteorite in the next lane
//! FixedPostUpdate: resolve_player_impacts       CollisionStart(meteorite, player)
//!                                               -> player takes contact damage
//!                                               -> meteorite health forced to zero
//!                  destroy_depleted_meteorites  health == 0 -> stop, stop colliding,
//!                                               PendingDespawn, MeteoriteDestroyed (once)
//! ```
//!
//! Bullet damage is applied by the projectiles plugin; this module only reacts to the
//! resulting `Health`.

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::health::{Damage, Health};
use crate::common::layers::Layer;
use crate::common::messages::{MeteoriteDestroyed, PlayerDied, PlayerHealthChanged};
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::player::Player;
use crate::plugins::projectiles::collision::resolve_bullet_collisions;
use crate::plugins::world::{Falling, HALF_H, HALF_W, PendingDespawn};

const RADIUS: f32 = 20.0;
const LANES: usize = 12;
const SPAWN_INTERVAL_SECS: f32 = 1.5;

#[derive(Component, Debug, Clone, Copy)]
pub struct Meteorite {
    pub contact_damage: i32,
}

/// Cycles spawn positions across the top edge.
#[derive(Resource, Debug)]
pub struct MeteoriteSpawner {
    pub timer: Timer,
    pub next_lane: usize,
}

impl Default for MeteoriteSpawner {
    fn default() -> Self {
        Self {
            timer: Timer::from_seconds(SPAWN_INTERVAL_SECS, TimerMode::Repeating),
            next_lane: 0,
        }
    }
}

impl MeteoriteSpawner {
    /// x of the next lane. Stride 5 is coprime with 12, so every lane gets visited.
    pub fn next_x(&mut self) -> f32 {
        let lane = (self.next_lane * 5) % LANES;
        self.next_lane = self.next_lane.wrapping_add(1);

        let margin = RADIUS * 3.0;
        let span = (HALF_W - margin) * 2.0;
        -HALF_W + margin + span * lane as f32 / (LANES - 1) as f32
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<MeteoriteSpawner>()
        .add_systems(OnEnter(GameState::InGame), reset_spawner)
        .add_systems(Update, tick_spawner.run_if(in_state(GameState::InGame)))
        .add_systems(
            FixedPostUpdate,
            (
                resolve_player_impacts.after(CollisionEventSystems),
                destroy_depleted_meteorites
                    .after(resolve_player_impacts)
                    .after(resolve_bullet_collisions),
            )
                .run_if(in_state(GameState::InGame)),
        );
}

/// Meteorite collision intent: the player and player bullets, nothing else.
#[inline]
fn meteorite_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Meteorite, [Layer::Player, Layer::PlayerBullet])
}

/// Membership stays, filters go: stops new interactions without structural changes.
#[inline]
fn non_interacting_meteorite_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Meteorite, [] as [Layer; 0])
}

pub fn spawn_meteorite(commands: &mut Commands, tunables: &Tunables, x: f32) -> Entity {
    commands
        .spawn((
            Name::new("Meteorite"),
            Meteorite {
                contact_damage: tunables.meteorite_contact_damage,
            },
            Health::new(tunables.meteorite_max_health),
            Sprite {
                color: Color::srgb(0.55, 0.42, 0.35),
                custom_size: Some(Vec2::splat(RADIUS * 2.0)),
                ..default()
            },
            Transform::from_xyz(x, HALF_H + RADIUS * 2.0, 1.0),
            RigidBody::Kinematic,
            Collider::circle(RADIUS),
            Sensor,
            meteorite_layers(),
            LinearVelocity(Vec2::new(0.0, -tunables.meteorite_speed)),
            CollisionEventsEnabled,
            Falling,
            DespawnOnExit(GameState::InGame),
        ))
        .id()
}

fn reset_spawner(mut spawner: ResMut<MeteoriteSpawner>) {
    *spawner = MeteoriteSpawner::default();
}

fn tick_spawner(
    mut commands: Commands,
    time: Res<Time>,
    tunables: Res<Tunables>,
    mut spawner: ResMut<MeteoriteSpawner>,
) {
    spawner.timer.tick(time.delta());
    for _ in 0..spawner.timer.times_finished_this_tick() {
        let x = spawner.next_x();
        spawn_meteorite(&mut commands, &tunables, x);
    }
}

pub fn resolve_player_impacts(
    mut started: MessageReader<CollisionStart>,
    mut q_meteorites: Query<(&Meteorite, &mut Health), (Without<Player>, Without<PendingDespawn>)>,
    mut q_player: Query<&mut Health, With<Player>>,
    mut health_changed: MessageWriter<PlayerHealthChanged>,
    mut died: MessageWriter<PlayerDied>,
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        let a = ev.body1.unwrap_or(ev.collider1);
        let b = ev.body2.unwrap_or(ev.collider2);

        let (meteorite, player) = if q_meteorites.contains(a) && q_player.contains(b) {
            (a, b)
        } else if q_meteorites.contains(b) && q_player.contains(a) {
            (b, a)
        } else {
            continue;
        };

        if !seen.insert(meteorite) {
            continue;
        }

        let Ok((rock, mut rock_health)) = q_meteorites.get_mut(meteorite) else {
            continue;
        };
        if rock_health.is_depleted() {
            continue;
        }
        let contact_damage = rock.contact_damage;
        let remaining = rock_health.current();
        rock_health.take_damage(remaining);

        let Ok(mut health) = q_player.get_mut(player) else {
            continue;
        };
        let outcome = health.take_damage(contact_damage);
        if outcome == Damage::Ignored {
            continue;
        }

        info!(
            "Player took {contact_damage} damage, health {}/{}.",
            health.current(),
            health.max()
        );
        health_changed.write(PlayerHealthChanged {
            player,
            current: health.current(),
            max: health.max(),
        });

        if outcome == Damage::Depleted {
            info!("Player died.");
            died.write(PlayerDied { player });
        }
    }
}

pub fn destroy_depleted_meteorites(
    mut commands: Commands,
    mut q: Query<
        (
            Entity,
            &Health,
            &Transform,
            &mut LinearVelocity,
            &mut CollisionLayers,
        ),
        (With<Meteorite>, Without<PendingDespawn>),
    >,
    mut destroyed: MessageWriter<MeteoriteDestroyed>,
) {
    for (e, health, tf, mut vel, mut layers) in &mut q {
        if !health.is_depleted() {
            continue;
        }

        vel.0 = Vec2::ZERO;
        *layers = non_interacting_meteorite_layers();
        commands.entity(e).insert(PendingDespawn);

        let position = tf.translation.truncate();
        info!("Meteorite {e:?} destroyed at {position}.");
        destroyed.write(MeteoriteDestroyed {
            meteorite: e,
            position,
        });
    }
}
