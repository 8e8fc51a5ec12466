//! Presentation stand-in: turns gameplay messages into log lines.
//!
//! A HUD would read the same messages; nothing in gameplay depends on this plugin.

use bevy::prelude::*;

use crate::common::messages::{
    CoinsChanged, MeteoriteDestroyed, PlayerDied, PlayerHealthChanged, PowerUpApplied,
    PowerUpExpired,
};

pub fn plugin(app: &mut App) {
    app.add_systems(PostUpdate, log_game_events);
}

fn log_game_events(
    mut health: MessageReader<PlayerHealthChanged>,
    mut died: MessageReader<PlayerDied>,
    mut coins: MessageReader<CoinsChanged>,
    mut destroyed: MessageReader<MeteoriteDestroyed>,
    mut applied: MessageReader<PowerUpApplied>,
    mut expired: MessageReader<PowerUpExpired>,
) {
    for ev in health.read() {
        info!("[hud] health {}/{}", ev.current, ev.max);
    }
    for _ in died.read() {
        info!("[hud] game over, press R to restart");
    }
    for ev in coins.read() {
        info!("[hud] coins {}", ev.coins);
    }
    for ev in destroyed.read() {
        debug!("[hud] boom at {}", ev.position);
    }
    for ev in applied.read() {
        info!("[hud] power-up {}", ev.name);
    }
    for ev in expired.read() {
        info!("[hud] power-up {} ended", ev.name);
    }
}
