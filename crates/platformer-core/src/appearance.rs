//! Visual side channel.
//!
//! The simulation never renders. Each entity only reports what it should look
//! like, and a renderer maps that to textures.

use serde::{Deserialize, Serialize};

use crate::enemy::{EnemyAnimation, GoombaVariant};
use crate::player::PlayerAnimation;
use crate::tile::TileKind;

/// What an entity should look like this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Appearance {
    /// Static tile
    Tile(TileKind),
    /// The player
    Player {
        /// Current animation
        animation: PlayerAnimation,
        /// Power level (0 small, 1 big, 2 fire)
        power_level: u8,
        /// Drawn flashing while invulnerable
        flashing: bool,
        /// Facing direction (+1 right, -1 left)
        facing: i8,
    },
    /// An enemy
    Enemy {
        /// Goomba variant
        variant: GoombaVariant,
        /// Current animation
        animation: EnemyAnimation,
        /// Uniform draw scale (shrinks while dying)
        scale: f32,
    },
    /// A coin
    Coin {
        /// Vertical draw offset of the idle bob
        bob_offset: f32,
        /// Playing the collection animation
        collected: bool,
    },
}

impl Appearance {
    /// Texture key for the renderer.
    #[must_use]
    pub fn texture_key(&self) -> &'static str {
        match self {
            Self::Tile(kind) => kind.texture_key(),
            Self::Player { power_level, .. } => match power_level {
                0 => "player_small",
                1 => "player_big",
                _ => "player_fire",
            },
            Self::Enemy { variant, .. } => variant.texture_key(),
            Self::Coin { .. } => "coin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_keys() {
        assert_eq!(Appearance::Tile(TileKind::Brick).texture_key(), "brick");
        assert_eq!(
            Appearance::Coin {
                bob_offset: 0.0,
                collected: false
            }
            .texture_key(),
            "coin"
        );
        let big = Appearance::Player {
            animation: PlayerAnimation::Idle,
            power_level: 1,
            flashing: false,
            facing: 1,
        };
        assert_eq!(big.texture_key(), "player_big");
    }
}
