//! Tunable gameplay constants.
//!
//! Defaults are compiled in. A `tunables.toml` next to the binary can override any subset
//! of fields; missing fields keep their defaults (`#[serde(default)]`).

use std::path::Path;

use bevy::prelude::*;
use serde::Deserialize;

use crate::plugins::pooling::TemplateId;
use crate::plugins::power_ups::PowerUpData;
use crate::plugins::projectiles::templates::BulletTemplate;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub pixels_per_meter: f32,

    pub player_speed: f32,
    pub player_tilt_angle_deg: f32,
    pub player_tilt_speed: f32,
    pub player_max_health: i32,
    pub fire_cooldown_secs: f32,

    /// Pool size used when a client creates a pool without an explicit size.
    pub default_pool_size: usize,
    pub initial_bullet: TemplateId,
    pub bullets: Vec<BulletTemplate>,

    pub meteorite_speed: f32,
    pub meteorite_max_health: i32,
    pub meteorite_contact_damage: i32,

    pub power_up_fall_speed: f32,
    pub power_ups: Vec<PowerUpData>,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            player_speed: 360.0,
            player_tilt_angle_deg: 30.0,
            player_tilt_speed: 5.0,
            player_max_health: 3,
            fire_cooldown_secs: 0.5,
            default_pool_size: 10,
            initial_bullet: TemplateId::new(0),
            bullets: vec![
                BulletTemplate {
                    id: TemplateId::new(0),
                    name: "Bullet".into(),
                    color: [1.0, 0.85, 0.3],
                    radius: 4.0,
                    speed: 720.0,
                    damage: 1,
                    lifetime_secs: 5.0,
                },
                BulletTemplate {
                    id: TemplateId::new(1),
                    name: "HeavyBullet".into(),
                    color: [1.0, 0.35, 0.2],
                    radius: 7.0,
                    speed: 540.0,
                    damage: 3,
                    lifetime_secs: 4.0,
                },
            ],
            meteorite_speed: 150.0,
            meteorite_max_health: 3,
            meteorite_contact_damage: 1,
            power_up_fall_speed: 90.0,
            power_ups: vec![
                PowerUpData {
                    name: "Heavy Rounds".into(),
                    bullet: Some(TemplateId::new(1)),
                    duration_secs: 10.0,
                    color: [1.0, 0.35, 0.2],
                },
                PowerUpData {
                    name: "Standard Issue".into(),
                    bullet: None,
                    duration_secs: 0.0,
                    color: [0.8, 0.8, 0.8],
                },
            ],
        }
    }
}

impl Tunables {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load from `path`, falling back to defaults when the file is missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No tunables file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(t) => {
                info!("Loaded tunables from {}", path.display());
                t
            }
            Err(e) => {
                warn!("Ignoring tunables file {}: {e}", path.display());
                Self::default()
            }
        }
    }
}
