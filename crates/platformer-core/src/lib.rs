//! # Platformer Core
//!
//! Deterministic simulation for a tile-based 2D platformer.
//!
//! This crate provides:
//! - AABB overlap, classification and resolution
//! - Tile storage with spatial lookup and per-tile collision callbacks
//! - A physics engine with ground/wall detection and tile cooldowns
//! - Player controller with coyote time and jump buffering
//! - Goomba enemies with a state machine and variant tunables
//! - Coins, an event bus, TOML configuration and replays
//!
//! Coordinates are y-up. Velocities are in world units per frame; timers
//! count seconds of the `delta_time` passed to each update.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod appearance;
pub mod body;
pub mod coin;
pub mod collision;
pub mod config;
pub mod enemy;
pub mod enemy_manager;
pub mod events;
pub mod input;
pub mod level;
pub mod physics;
pub mod player;
pub mod replay;
pub mod simulation;
pub mod tile;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::appearance::*;
    pub use crate::body::*;
    pub use crate::coin::*;
    pub use crate::collision::*;
    pub use crate::config::*;
    pub use crate::enemy::*;
    pub use crate::enemy_manager::*;
    pub use crate::events::*;
    pub use crate::input::*;
    pub use crate::level::*;
    pub use crate::physics::*;
    pub use crate::player::*;
    pub use crate::replay::*;
    pub use crate::simulation::*;
    pub use crate::tile::*;
}

pub use prelude::*;
