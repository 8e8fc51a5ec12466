//! Feature plugins.

use bevy::prelude::*;

use crate::plugins::projectiles::ProjectilesPlugin;

pub mod coins;
pub mod core;
pub mod feedback;
pub mod meteorites;
pub mod physics;
pub mod player;
pub mod pooling;
pub mod power_ups;
pub mod projectiles;
pub mod timers;
pub mod world;

// Render-only
pub mod camera;

/// Register gameplay plugins that work in headless tests.
///
/// Order matters for plugins that read resources at build time: `core` inserts
/// `Tunables` before `physics`, `pooling` and `projectiles` read it.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    physics::plugin(app);
    timers::plugin(app);
    pooling::plugin(app);
    world::plugin(app);
    app.add_plugins(ProjectilesPlugin);
    player::plugin(app);
    meteorites::plugin(app);
    power_ups::plugin(app);
    coins::plugin(app);
    feedback::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    camera::plugin(app);
}
