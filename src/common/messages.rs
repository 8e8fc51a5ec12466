//! Buffered gameplay notifications.
//!
//! Producers write intent or facts; consumers read them through `MessageReader`.
//! Readers are system params, so there is nothing to unsubscribe when an entity goes away.

use bevy::prelude::*;

/// The player pressed fire this frame.
#[derive(Message, Clone, Copy, Debug)]
pub struct FireInput {
    pub shooter: Entity,
}

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerHealthChanged {
    pub player: Entity,
    pub current: i32,
    pub max: i32,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct PlayerDied {
    pub player: Entity,
}

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoinsChanged {
    pub player: Entity,
    pub coins: u32,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct MeteoriteDestroyed {
    pub meteorite: Entity,
    pub position: Vec2,
}

#[derive(Message, Clone, Debug)]
pub struct PowerUpApplied {
    pub player: Entity,
    pub name: String,
}

#[derive(Message, Clone, Debug)]
pub struct PowerUpExpired {
    pub player: Entity,
    pub name: String,
}

/// Register every gameplay message buffer.
pub fn register(app: &mut App) {
    app.add_message::<FireInput>()
        .add_message::<PlayerHealthChanged>()
        .add_message::<PlayerDied>()
        .add_message::<CoinsChanged>()
        .add_message::<MeteoriteDestroyed>()
        .add_message::<PowerUpApplied>()
        .add_message::<PowerUpExpired>();
}
