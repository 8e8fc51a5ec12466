//! Core plugin: shared resources, global settings and message buffers.

use bevy::prelude::*;

use crate::common::messages;
use crate::common::tunables::Tunables;

pub fn plugin(app: &mut App) {
    // `configure_full` may already have loaded tunables from disk.
    app.init_resource::<Tunables>();
    app.insert_resource(ClearColor(Color::srgb(0.02, 0.02, 0.05)));
    messages::register(app);
}
