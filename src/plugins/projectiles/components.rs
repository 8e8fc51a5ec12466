use std::time::Duration;

use bevy::prelude::*;

use crate::plugins::pooling::{Lease, TemplateId};
use crate::plugins::timers::TimerToken;

/// Per-template constants, inserted once when the pool member is spawned.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BulletStats {
    pub damage: i32,
    pub speed: f32,
    pub lifetime: Duration,
}

/// Mutable per-shot state. Reset on every borrow.
#[derive(Component, Debug, Clone, Default)]
pub struct Bullet {
    pub damage: i32,
    /// The borrow this shot belongs to.
    pub lease: Option<Lease>,
    /// Pending lifetime expiry.
    pub expiry: Option<TimerToken>,
}

impl Bullet {
    #[inline]
    pub fn reset_for_fire(&mut self, stats: &BulletStats, lease: Lease) {
        self.damage = stats.damage;
        self.lease = Some(lease);
        self.expiry = None;
    }
}

/// Fire-rate gate. `ready` drops on each shot and comes back via a deferred timer.
#[derive(Component, Debug, Clone)]
pub struct Shooter {
    pub ready: bool,
    pub cooldown: Duration,
}

impl Shooter {
    pub fn new(cooldown: Duration) -> Self {
        Self { ready: true, cooldown }
    }
}

/// Muzzle pose relative to the shooter.
#[derive(Component, Debug, Clone, Copy)]
pub struct FirePoint {
    pub offset: Vec2,
    pub direction: Vec2,
}

impl Default for FirePoint {
    fn default() -> Self {
        Self { offset: Vec2::new(0.0, 24.0), direction: Vec2::Y }
    }
}

/// Which bullet template the shooter borrows from.
///
/// Owned by the client, not the registry. Power-ups swap `current` and put it back.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loadout {
    pub initial: TemplateId,
    pub current: TemplateId,
}

impl Loadout {
    pub fn new(initial: TemplateId) -> Self {
        Self { initial, current: initial }
    }

    /// Switch to `bullet`, or back to the initial template when there is none.
    /// Returns the template now in use.
    pub fn equip(&mut self, bullet: Option<TemplateId>) -> TemplateId {
        self.current = bullet.unwrap_or(self.initial);
        self.current
    }

    pub fn revert(&mut self) -> TemplateId {
        self.current = self.initial;
        self.current
    }

    #[inline]
    pub fn is_substituted(&self) -> bool {
        self.current != self.initial
    }
}
