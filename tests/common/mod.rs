//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `meteor_shooter::game::configure_headless` to install gameplay plugins.
//! - `app_stepped` additionally advances time by a fixed amount per `update()`, so physics
//!   runs deterministically.

#![allow(dead_code)]

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use meteor_shooter::common::state::GameState;
use meteor_shooter::plugins::player::Player;

pub fn app_headless() -> App {
    let mut app = App::new();

    // Add AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));

    meteor_shooter::game::configure_headless(&mut app);

    // Avian inserts part of its resources in `Plugin::finish`.
    app.finish();
    app.cleanup();
    app
}

/// Headless app where every `update()` advances time by `step`.
pub fn app_stepped(step: Duration) -> App {
    let mut app = app_headless();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(step));
    app
}

pub fn set_state(app: &mut App, state: GameState) {
    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(state);
    app.update();
}

pub fn player(app: &mut App) -> Option<Entity> {
    app.world_mut()
        .query_filtered::<Entity, With<Player>>()
        .iter(app.world())
        .next()
}
