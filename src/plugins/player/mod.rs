//! Player plugin.
//!
//! Pipeline:
//! - Update: sample input, write PlayerInput resource + FireInput messages
//! - FixedUpdate: apply velocity to the body, tilt the ship mesh toward the input
//! - Update: react to PlayerDied (lock input, end the session)
//!
//! The player is composed once at spawn: everything other systems need (`Shooter`,
//! `Loadout`, `Health`, `Wallet`, ...) is a component on the player entity, and the tilted
//! mesh is a child whose id is kept in `ShipMesh`.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::health::Health;
use crate::common::layers::Layer;
use crate::common::messages::{FireInput, PlayerDied};
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::pooling::PoolRegistry;
use crate::plugins::power_ups::PowerUpSlot;
use crate::plugins::projectiles::components::{FirePoint, Loadout, Shooter};
use crate::plugins::projectiles::templates::{BulletTemplates, ensure_bullet_pool};
use crate::plugins::timers::secs;

const RADIUS: f32 = 16.0;

#[derive(Component)]
pub struct Player;

/// Coins collected this session.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Wallet {
    pub coins: u32,
}

/// The child entity that tilts while the body moves.
#[derive(Component, Debug, Clone, Copy)]
pub struct ShipMesh(pub Entity);

/// Present once the player can no longer act.
#[derive(Component, Debug)]
pub struct InputLocked;

#[derive(Resource, Default, Debug)]
pub struct PlayerInput {
    pub move_axis: Vec2,
}

pub fn plugin(app: &mut App) {
    app.insert_resource(PlayerInput::default())
        .add_systems(OnEnter(GameState::InGame), spawn)
        .add_systems(
            Update,
            (gather_input, handle_player_death).run_if(in_state(GameState::InGame)),
        )
        .add_systems(Update, restart_on_key.run_if(in_state(GameState::GameOver)))
        .add_systems(
            FixedUpdate,
            (apply_movement, apply_tilt).run_if(in_state(GameState::InGame)),
        );
}

fn spawn(
    mut commands: Commands,
    tunables: Res<Tunables>,
    templates: Res<BulletTemplates>,
    mut registry: ResMut<PoolRegistry>,
) {
    if !ensure_bullet_pool(
        &mut registry,
        &mut commands,
        &templates,
        tunables.initial_bullet,
    ) {
        error!(
            "Initial bullet {} has no pool; the player won't be able to shoot.",
            tunables.initial_bullet
        );
    }

    let layers = CollisionLayers::new(
        Layer::Player,
        [Layer::World, Layer::Meteorite, Layer::Pickup],
    );

    let mesh = commands
        .spawn((
            Name::new("ShipMesh"),
            Sprite {
                color: Color::srgb(0.2, 0.75, 0.9),
                custom_size: Some(Vec2::new(RADIUS * 1.6, RADIUS * 2.0)),
                ..default()
            },
            Transform::default(),
        ))
        .id();

    commands
        .spawn((
            (
                Name::new("Player"),
                Player,
                Health::new(tunables.player_max_health),
                Wallet::default(),
                Shooter::new(secs(tunables.fire_cooldown_secs)),
                FirePoint::default(),
                Loadout::new(tunables.initial_bullet),
                PowerUpSlot::default(),
                ShipMesh(mesh),
            ),
            Transform::from_xyz(0.0, -220.0, 1.0),
            Visibility::default(),
            RigidBody::Dynamic,
            LockedAxes::ROTATION_LOCKED,
            Collider::circle(RADIUS),
            layers,
            LinearVelocity::ZERO,
            CollisionEventsEnabled,
            DespawnOnExit(GameState::InGame),
        ))
        .add_child(mesh);

    info!("Player spawned with {} health.", tunables.player_max_health);
}

fn gather_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    q_player: Query<Entity, (With<Player>, Without<InputLocked>)>,
    mut input: ResMut<PlayerInput>,
    mut fire: MessageWriter<FireInput>,
) {
    let Ok(player) = q_player.single() else {
        input.move_axis = Vec2::ZERO;
        return;
    };
    // Headless apps have no input plugin.
    let Some(keys) = keys else {
        return;
    };

    let mut axis = Vec2::ZERO;

    if keys.pressed(KeyCode::KeyW) || keys.pressed(KeyCode::ArrowUp) {
        axis.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) || keys.pressed(KeyCode::ArrowDown) {
        axis.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) || keys.pressed(KeyCode::ArrowLeft) {
        axis.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) || keys.pressed(KeyCode::ArrowRight) {
        axis.x += 1.0;
    }

    input.move_axis = axis.normalize_or_zero();

    let clicked = buttons.is_some_and(|b| b.just_pressed(MouseButton::Left));
    if keys.just_pressed(KeyCode::Space) || clicked {
        fire.write(FireInput { shooter: player });
    }
}

fn apply_movement(
    tunables: Res<Tunables>,
    input: Res<PlayerInput>,
    mut q_player: Query<(&mut LinearVelocity, Has<InputLocked>), With<Player>>,
) {
    let Ok((mut vel, locked)) = q_player.single_mut() else {
        return;
    };
    vel.0 = if locked {
        Vec2::ZERO
    } else {
        input.move_axis * tunables.player_speed
    };
}

/// Bank angle for a horizontal input: `-x * max`, dead zone around zero.
pub fn target_tilt(input_x: f32, max_angle_deg: f32) -> Quat {
    if input_x.abs() > 0.01 {
        Quat::from_rotation_z((-input_x * max_angle_deg).to_radians())
    } else {
        Quat::IDENTITY
    }
}

fn apply_tilt(
    time: Res<Time>,
    tunables: Res<Tunables>,
    input: Res<PlayerInput>,
    q_player: Query<&ShipMesh, With<Player>>,
    mut q_mesh: Query<&mut Transform, Without<Player>>,
) {
    let Ok(mesh) = q_player.single() else {
        return;
    };
    let Ok(mut tf) = q_mesh.get_mut(mesh.0) else {
        return;
    };

    let target = target_tilt(input.move_axis.x, tunables.player_tilt_angle_deg);
    let t = (tunables.player_tilt_speed * time.delta_secs()).clamp(0.0, 1.0);
    tf.rotation = tf.rotation.slerp(target, t);
}

fn handle_player_death(
    mut died: MessageReader<PlayerDied>,
    mut commands: Commands,
    mut q_player: Query<&mut LinearVelocity, With<Player>>,
    mut next: ResMut<NextState<GameState>>,
) {
    for ev in died.read() {
        if let Ok(mut vel) = q_player.get_mut(ev.player) {
            vel.0 = Vec2::ZERO;
        }
        commands.entity(ev.player).try_insert(InputLocked);
        next.set(GameState::GameOver);
    }
}

fn restart_on_key(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut next: ResMut<NextState<GameState>>,
) {
    if keys.is_some_and(|k| k.just_pressed(KeyCode::KeyR)) {
        info!("Restarting session.");
        next.set(GameState::InGame);
    }
}
