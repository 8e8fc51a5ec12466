//! Coins: dropped where a meteorite breaks, collected on contact with the player.
//!
//! Coins aren't pooled; they are plain spawn/despawn.

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::messages::{CoinsChanged, MeteoriteDestroyed};
use crate::common::state::GameState;
use crate::plugins::meteorites::destroy_depleted_meteorites;
use crate::plugins::player::{Player, Wallet};
use crate::plugins::world::{Falling, PendingDespawn};

const RADIUS: f32 = 8.0;
const FALL_SPEED: f32 = 120.0;

#[derive(Component, Debug, Clone, Copy)]
pub struct Coin;

pub fn plugin(app: &mut App) {
    app.add_systems(
        FixedPostUpdate,
        (
            collect_coins.after(CollisionEventSystems),
            drop_coins.after(destroy_depleted_meteorites),
        )
            .run_if(in_state(GameState::InGame)),
    );
}

fn drop_coins(mut commands: Commands, mut destroyed: MessageReader<MeteoriteDestroyed>) {
    for ev in destroyed.read() {
        commands.spawn((
            Name::new("Coin"),
            Coin,
            Sprite {
                color: Color::srgb(1.0, 0.82, 0.1),
                custom_size: Some(Vec2::splat(RADIUS * 2.0)),
                ..default()
            },
            Transform::from_translation(ev.position.extend(1.0)),
            RigidBody::Kinematic,
            Collider::circle(RADIUS),
            Sensor,
            CollisionLayers::new(Layer::Pickup, [Layer::Player]),
            LinearVelocity(Vec2::new(0.0, -FALL_SPEED)),
            CollisionEventsEnabled,
            Falling,
            DespawnOnExit(GameState::InGame),
        ));
    }
}

fn collect_coins(
    mut commands: Commands,
    mut started: MessageReader<CollisionStart>,
    q_coins: Query<(), (With<Coin>, Without<PendingDespawn>)>,
    mut q_wallet: Query<&mut Wallet, With<Player>>,
    mut changed: MessageWriter<CoinsChanged>,
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        let a = ev.body1.unwrap_or(ev.collider1);
        let b = ev.body2.unwrap_or(ev.collider2);

        let (coin, player) = if q_coins.contains(a) {
            (a, b)
        } else if q_coins.contains(b) {
            (b, a)
        } else {
            continue;
        };

        let Ok(mut wallet) = q_wallet.get_mut(player) else {
            continue;
        };
        if !seen.insert(coin) {
            continue;
        }

        wallet.coins += 1;
        debug!("Coin collected, total {}.", wallet.coins);
        changed.write(CoinsChanged {
            player,
            coins: wallet.coins,
        });
        commands.entity(coin).insert(PendingDespawn);
    }
}
