//! Deferred one-shot timers on a simulation clock.
//!
//! Clients keep a `TimerToken` for anything they schedule and cancel it when the thing it
//! refers to goes away early. Nothing blocks: a scheduled action is just data in a
//! `DeferredQueue<A>` until a client system drains it.
//!
//! ```text
//!   FixedFirst   advance_sim_clock      SimClock += Time<Fixed>::delta()
//!   FixedUpdate  <client>::run_timers   queue.drain_due(&clock) -> handle actions
//! ```

mod scheduler;

use bevy::prelude::*;

pub use scheduler::{DeferredQueue, Fired, SimClock, TimerToken, secs};

pub fn plugin(app: &mut App) {
    app.init_resource::<SimClock>()
        .add_systems(FixedFirst, advance_sim_clock);
}

fn advance_sim_clock(time: Res<Time<Fixed>>, mut clock: ResMut<SimClock>) {
    clock.advance(time.delta());
}
