//! Simulation configuration.
//!
//! Every tunable lives here, grouped by component. Values can be loaded from
//! and saved to a TOML file. Loading never fails the caller: a missing or
//! malformed file yields the defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use platformer_common::error::PlatformerError;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "platformer.toml";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// File contents are not valid TOML for this config
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be serialized
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl From<ConfigError> for PlatformerError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => PlatformerError::Io(e),
            other => PlatformerError::Config(other.to_string()),
        }
    }
}

/// Gravity, terminal velocity, and tile-interaction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration in units per frame squared
    pub gravity: f32,
    /// Maximum falling speed in units per frame
    pub terminal_velocity: f32,
    /// Tile edge length in units
    pub tile_size: f32,
    /// Seconds an interactive tile stays silent after firing
    pub tile_cooldown: f32,
    /// Probe distance used for edge and interactive-tile detection
    pub ground_detection_offset: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.8,
            terminal_velocity: 20.0,
            tile_size: 32.0,
            tile_cooldown: 0.5,
            ground_detection_offset: 1.0,
        }
    }
}

/// Player movement and survival parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Box edge length
    pub size: f32,
    /// Horizontal speed in units per frame
    pub move_speed: f32,
    /// Vertical jump impulse in units per frame
    pub jump_speed: f32,
    /// Grounded horizontal damping per frame
    pub friction: f32,
    /// Airborne horizontal damping per frame
    pub air_resistance: f32,
    /// Seconds a jump press stays buffered
    pub jump_buffer_time: f32,
    /// Seconds after leaving a ledge during which a jump is still honored
    pub coyote_time: f32,
    /// Seconds of invulnerability after losing a power level
    pub damage_invulnerability: f32,
    /// Horizontal knockback impulse when hurt by an enemy
    pub knockback_speed: f32,
    /// Vertical knockback impulse when hurt by an enemy
    pub knockback_lift: f32,
    /// Lives at the start of a run
    pub lives: u32,
    /// Falling below this height counts as a death
    pub fall_limit: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            size: 32.0,
            move_speed: 5.0,
            jump_speed: 16.0,
            friction: 0.8,
            air_resistance: 0.95,
            jump_buffer_time: 0.1,
            coyote_time: 0.1,
            damage_invulnerability: 2.0,
            knockback_speed: 6.0,
            knockback_lift: 6.0,
            lives: 3,
            fall_limit: -500.0,
        }
    }
}

/// Enemy behaviour parameters shared by all variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Walk speed before the variant multiplier
    pub base_speed: f32,
    /// Half-width of the patrol zone around the spawn x
    pub patrol_distance: f32,
    /// Seconds a chase lasts without re-detection
    pub chase_timeout: f32,
    /// Seconds a stun lasts
    pub stun_duration: f32,
    /// Seconds of the dying animation
    pub death_duration: f32,
    /// Seconds of invulnerability after a non-lethal hit
    pub hit_invulnerability: f32,
    /// Distance at which an enemy can attack
    pub attack_range: f32,
    /// Chase speed multiplier for charging variants
    pub charge_speed_multiplier: f32,
    /// Per-frame chance of a random turn for variants that do so
    pub direction_change_chance: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            base_speed: 1.0,
            patrol_distance: 128.0,
            chase_timeout: 3.0,
            stun_duration: 1.0,
            death_duration: 0.5,
            hit_invulnerability: 0.5,
            attack_range: 32.0,
            charge_speed_multiplier: 1.5,
            direction_change_chance: 0.02,
        }
    }
}

/// Coin parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinConfig {
    /// Score value of a coin
    pub value: u32,
    /// Box edge length
    pub size: f32,
    /// Distance at which coins drift toward the player
    pub magnetic_range: f32,
    /// Drift speed in units per frame
    pub magnetic_speed: f32,
    /// Seconds of the post-collection animation
    pub collection_duration: f32,
    /// Amplitude of the idle bob
    pub bounce_height: f32,
    /// Angular speed of the idle bob in radians per second
    pub bounce_speed: f32,
}

impl Default for CoinConfig {
    fn default() -> Self {
        Self {
            value: 100,
            size: 24.0,
            magnetic_range: 50.0,
            magnetic_speed: 8.0,
            collection_duration: 0.5,
            bounce_height: 4.0,
            bounce_speed: 2.0,
        }
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Physics engine settings
    pub physics: PhysicsConfig,
    /// Player settings
    pub player: PlayerConfig,
    /// Enemy settings
    pub enemy: EnemyConfig,
    /// Coin settings
    pub coin: CoinConfig,
}

impl GameConfig {
    /// Loads configuration from a file, falling back to defaults.
    ///
    /// The result is validated before it is returned.
    #[must_use]
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match Self::try_load_from(path) {
            Ok(mut config) => {
                info!("Loaded config from {}", path.display());
                config.validate();
                config
            },
            Err(e) => {
                warn!("Failed to load config file: {e}");
                Self::default()
            },
        }
    }

    /// Loads configuration from a file, reporting failures.
    pub fn try_load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut contents = String::new();
        fs::File::open(path)?.read_to_string(&mut contents)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to a file, creating parent directories.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Replaces out-of-range values with defaults.
    ///
    /// Returns the number of corrected fields.
    pub fn validate(&mut self) -> usize {
        let physics = PhysicsConfig::default();
        let player = PlayerConfig::default();
        let enemy = EnemyConfig::default();
        let coin = CoinConfig::default();
        let mut fixed = 0;

        let mut positive = |name: &str, value: &mut f32, default: f32| {
            if !(value.is_finite() && *value > 0.0) {
                warn!("Invalid {name} = {value}, using {default}");
                *value = default;
                fixed += 1;
            }
        };

        positive("physics.gravity", &mut self.physics.gravity, physics.gravity);
        positive(
            "physics.terminal_velocity",
            &mut self.physics.terminal_velocity,
            physics.terminal_velocity,
        );
        positive("physics.tile_size", &mut self.physics.tile_size, physics.tile_size);
        positive(
            "physics.tile_cooldown",
            &mut self.physics.tile_cooldown,
            physics.tile_cooldown,
        );
        positive(
            "physics.ground_detection_offset",
            &mut self.physics.ground_detection_offset,
            physics.ground_detection_offset,
        );

        positive("player.size", &mut self.player.size, player.size);
        positive("player.move_speed", &mut self.player.move_speed, player.move_speed);
        positive("player.jump_speed", &mut self.player.jump_speed, player.jump_speed);
        positive("player.friction", &mut self.player.friction, player.friction);
        positive(
            "player.air_resistance",
            &mut self.player.air_resistance,
            player.air_resistance,
        );
        positive(
            "player.jump_buffer_time",
            &mut self.player.jump_buffer_time,
            player.jump_buffer_time,
        );
        positive("player.coyote_time", &mut self.player.coyote_time, player.coyote_time);
        positive(
            "player.damage_invulnerability",
            &mut self.player.damage_invulnerability,
            player.damage_invulnerability,
        );

        positive("enemy.base_speed", &mut self.enemy.base_speed, enemy.base_speed);
        positive(
            "enemy.patrol_distance",
            &mut self.enemy.patrol_distance,
            enemy.patrol_distance,
        );
        positive("enemy.chase_timeout", &mut self.enemy.chase_timeout, enemy.chase_timeout);
        positive("enemy.stun_duration", &mut self.enemy.stun_duration, enemy.stun_duration);
        positive(
            "enemy.death_duration",
            &mut self.enemy.death_duration,
            enemy.death_duration,
        );
        positive("enemy.attack_range", &mut self.enemy.attack_range, enemy.attack_range);
        positive(
            "enemy.charge_speed_multiplier",
            &mut self.enemy.charge_speed_multiplier,
            enemy.charge_speed_multiplier,
        );

        positive("coin.size", &mut self.coin.size, coin.size);
        positive(
            "coin.collection_duration",
            &mut self.coin.collection_duration,
            coin.collection_duration,
        );

        // Damping factors above 1 would accelerate the mover.
        for (value, default) in [
            (&mut self.player.friction, player.friction),
            (&mut self.player.air_resistance, player.air_resistance),
        ] {
            if *value > 1.0 {
                warn!("Damping factor {value} above 1.0, using {default}");
                *value = default;
                fixed += 1;
            }
        }

        if !(0.0..=1.0).contains(&self.enemy.direction_change_chance) {
            warn!(
                "Invalid enemy.direction_change_chance = {}, using {}",
                self.enemy.direction_change_chance, enemy.direction_change_chance
            );
            self.enemy.direction_change_chance = enemy.direction_change_chance;
            fixed += 1;
        }

        if self.player.lives == 0 {
            warn!("player.lives must be at least 1, using {}", player.lives);
            self.player.lives = player.lives;
            fixed += 1;
        }

        fixed
    }
}
