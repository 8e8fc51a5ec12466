//! Pool registry: lazily created, fixed-size pools of reusable entities.
//!
//! # Protocol
//! ```text
//!   create_pool(prefab, n)    spawn n hidden members under PoolContainer (once per template)
//!   borrow(template)          first inactive member in creation order -> active, Lease
//!   release(entity)           active -> inactive (inactive -> no-op)
//!   release_lease(lease)      same, but only for the borrow that produced `lease`
//! ```
//!
//! The registry never calls into its clients. It only tracks which members are active;
//! clients own everything else about a borrowed entity (pose, velocity, damage) and must
//! reset it right after borrowing.
//!
//! Failures (`PoolError`) are logged here and returned to the caller, who degrades
//! gracefully: a missed shot, a missing effect. Nothing panics.

mod error;
mod prefab;
mod registry;

use bevy::prelude::*;

use crate::common::state::GameState;
use crate::common::tunables::Tunables;

pub use error::PoolError;
pub use prefab::{PoolContainer, PoolMember, Prefab};
pub use registry::{Lease, PoolRegistry, ReleaseOutcome, TemplateId};

pub fn plugin(app: &mut App) {
    let default_size = app.world().resource::<Tunables>().default_pool_size;
    app.insert_resource(PoolRegistry::new(default_size))
        .add_systems(OnEnter(GameState::GameOver), recycle_all_pools);
}

/// Hand every borrowed member back when the session ends.
fn recycle_all_pools(mut registry: ResMut<PoolRegistry>) {
    let released = registry.release_all();
    if released > 0 {
        info!("Recycled {released} pooled objects.");
    }
}
