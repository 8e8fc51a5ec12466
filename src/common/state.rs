//! Global state machine.
//!
//! `InGame -> GameOver` when the player dies, `GameOver -> InGame` on restart.
//! Pools outlive both states; only their members' activity is reset.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    InGame,
    GameOver,
}
