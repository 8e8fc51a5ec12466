//! World plugin: arena walls and entity cleanup.
//!
//! Walls only stop the player and bullets; falling objects (meteorites, pickups, coins)
//! don't filter `World` and drift through the bottom edge, where they get marked.
//!
//! ```text
//! FixedPostUpdate: mark_out_of_arena   below the arena -> PendingDespawn
//! PostUpdate:      despawn_pending     PendingDespawn  -> despawn
//! ```

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;

pub const HALF_W: f32 = 640.0;
pub const HALF_H: f32 = 360.0;

/// How far past the bottom edge something may fall before it is removed.
const CLEANUP_MARGIN: f32 = 80.0;

/// Marker: entity should be removed from the world.
///
/// We don't despawn inside the fixed step; we mark and despawn later in PostUpdate.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingDespawn;

/// Removed once it falls below the arena.
#[derive(Component, Debug, Clone, Copy)]
pub struct Falling;

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_arena)
        .add_systems(FixedPostUpdate, mark_out_of_arena)
        .add_systems(PostUpdate, despawn_pending);
}

fn spawn_arena(mut commands: Commands) {
    let wall_color = Color::srgb(0.25, 0.27, 0.33);
    let thickness = 30.0;

    let wall_layers = CollisionLayers::new(Layer::World, [Layer::Player, Layer::PlayerBullet]);

    let mut spawn_wall = |name: &str, pos: Vec3, size: Vec2| {
        commands.spawn((
            Name::new(name.to_owned()),
            Sprite {
                color: wall_color,
                custom_size: Some(size),
                ..default()
            },
            Transform::from_translation(pos),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            wall_layers,
            DespawnOnExit(GameState::InGame),
        ));
    };

    spawn_wall(
        "WallTop",
        Vec3::new(0.0, HALF_H + thickness * 0.5, 0.0),
        Vec2::new(HALF_W * 2.0 + thickness * 2.0, thickness),
    );
    spawn_wall(
        "WallBottom",
        Vec3::new(0.0, -HALF_H - thickness * 0.5, 0.0),
        Vec2::new(HALF_W * 2.0 + thickness * 2.0, thickness),
    );
    spawn_wall(
        "WallLeft",
        Vec3::new(-HALF_W - thickness * 0.5, 0.0, 0.0),
        Vec2::new(thickness, HALF_H * 2.0),
    );
    spawn_wall(
        "WallRight",
        Vec3::new(HALF_W + thickness * 0.5, 0.0, 0.0),
        Vec2::new(thickness, HALF_H * 2.0),
    );
}

fn mark_out_of_arena(
    mut commands: Commands,
    q: Query<(Entity, &Transform), (With<Falling>, Without<PendingDespawn>)>,
) {
    for (e, tf) in &q {
        if tf.translation.y < -HALF_H - CLEANUP_MARGIN {
            commands.entity(e).insert(PendingDespawn);
        }
    }
}

fn despawn_pending(mut commands: Commands, q: Query<Entity, With<PendingDespawn>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}
