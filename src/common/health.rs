//! Subtraction-based health shared by the player and meteorites.

use bevy::prelude::*;

/// Result of applying damage once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Damage {
    /// Already at zero; nothing changed.
    Ignored,
    /// Health went down but is still positive.
    Hurt,
    /// This hit brought health to zero. Reported exactly once per life.
    Depleted,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    current: i32,
    max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self { current: max, max }
    }

    #[inline]
    pub fn current(&self) -> i32 {
        self.current
    }

    #[inline]
    pub fn max(&self) -> i32 {
        self.max
    }

    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.current <= 0
    }

    /// Subtract `amount` (negative amounts count as zero), clamping at zero.
    pub fn take_damage(&mut self, amount: i32) -> Damage {
        if self.is_depleted() {
            return Damage::Ignored;
        }

        self.current -= amount.max(0);
        if self.current <= 0 {
            self.current = 0;
            Damage::Depleted
        } else {
            Damage::Hurt
        }
    }
}
