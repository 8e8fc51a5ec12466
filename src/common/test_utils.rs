//! Test helpers.
//!
//! `World::run_system_once` (via the `RunSystemOnce` trait) executes a system without
//! building a full schedule. Systems that use `Commands` only enqueue structural changes,
//! so we `flush()` afterwards to apply them before assertions.

use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::ecs::world::CommandQueue;
use bevy::prelude::*;

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// Runs `f(commands, resource)` with resource `R` temporarily removed from the World,
/// then applies the queued commands and puts the resource back.
pub fn with_commands_and<R: Resource, T>(
    world: &mut World,
    f: impl FnOnce(&mut Commands, &mut R) -> T,
) -> T {
    let mut res = world
        .remove_resource::<R>()
        .expect("resource must exist");

    let mut queue = CommandQueue::default();
    let result = {
        let mut commands = Commands::new(&mut queue, world);
        f(&mut commands, &mut res)
    };
    queue.apply(world);
    world.insert_resource(res);
    result
}
