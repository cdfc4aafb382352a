//! Level description and providers.
//!
//! Level file formats are out of scope. A [`LevelProvider`] hands the
//! simulation an already-built [`LevelData`]; [`LevelBuilder`] builds one in
//! code.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::enemy::GoombaVariant;
use crate::tile::TileKind;

/// A tile placed on the level grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSpec {
    /// Tile kind
    pub kind: TileKind,
    /// Grid column
    pub x: i32,
    /// Grid row (0 is the bottom row)
    pub y: i32,
}

/// An enemy spawn point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// Center position
    pub position: Vec2,
    /// Variant to spawn
    pub variant: GoombaVariant,
}

/// Everything needed to populate a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    /// Display name
    pub name: String,
    /// Tile edge length
    pub tile_size: f32,
    /// Width in tiles
    pub width: u32,
    /// Height in tiles
    pub height: u32,
    /// Static tiles
    pub tiles: Vec<TileSpec>,
    /// Player start
    pub player_spawn: Vec2,
    /// Enemy spawns
    pub enemy_spawns: Vec<EnemySpawn>,
    /// Coin positions
    pub coin_spawns: Vec<Vec2>,
    /// Goal position, if any
    pub level_end: Option<Vec2>,
}

impl LevelData {
    /// Center of a grid cell in world units.
    #[must_use]
    pub fn grid_to_world(&self, x: i32, y: i32) -> Vec2 {
        grid_to_world(self.tile_size, x, y)
    }

    /// True when the level has no tiles to stand on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Built-in level used when no provider supplies one.
    #[must_use]
    pub fn test_level(tile_size: f32) -> Self {
        let mut builder = LevelBuilder::new("Test Level", tile_size, 50, 20)
            .row(TileKind::Ground, 0, 50, 0)
            .row(TileKind::Ground, 0, 50, 1);

        for (start, end, y) in [(10, 15, 5), (20, 25, 8), (30, 35, 6), (40, 45, 10)] {
            builder = builder.row(TileKind::Ground, start, end, y);
        }

        builder = builder
            .tile(TileKind::QuestionBlock, 12, 6)
            .tile(TileKind::QuestionBlock, 22, 9)
            .row(TileKind::Brick, 32, 35, 7);

        for (x, y) in [(15, 10), (25, 12), (35, 8), (5, 5)] {
            builder = builder.coin(x, y);
        }
        for (x, y) in [(18, 6), (28, 9), (38, 7)] {
            builder = builder.enemy(x, y, GoombaVariant::Normal);
        }

        builder.player_spawn(3, 3).level_end(48, 5).build()
    }
}

fn grid_to_world(tile_size: f32, x: i32, y: i32) -> Vec2 {
    Vec2::new(
        x as f32 * tile_size + tile_size / 2.0,
        y as f32 * tile_size + tile_size / 2.0,
    )
}

/// Source of level data.
pub trait LevelProvider {
    /// Returns the level to play, or `None` when unavailable.
    fn load_level(&self) -> Option<LevelData>;
}

impl LevelProvider for LevelData {
    fn load_level(&self) -> Option<LevelData> {
        Some(self.clone())
    }
}

/// Builds [`LevelData`] in grid coordinates.
#[derive(Debug, Clone)]
pub struct LevelBuilder {
    data: LevelData,
}

impl LevelBuilder {
    /// Starts an empty level.
    #[must_use]
    pub fn new(name: impl Into<String>, tile_size: f32, width: u32, height: u32) -> Self {
        let tile_size = if tile_size.is_finite() && tile_size > 0.0 {
            tile_size
        } else {
            warn!("Invalid level tile size {}, using 32", tile_size);
            32.0
        };

        Self {
            data: LevelData {
                name: name.into(),
                tile_size,
                width,
                height,
                tiles: Vec::new(),
                player_spawn: grid_to_world(tile_size, 1, 2),
                enemy_spawns: Vec::new(),
                coin_spawns: Vec::new(),
                level_end: None,
            },
        }
    }

    /// Places a tile, replacing any tile already in that cell.
    #[must_use]
    pub fn tile(mut self, kind: TileKind, x: i32, y: i32) -> Self {
        self.data.tiles.retain(|t| t.x != x || t.y != y);
        self.data.tiles.push(TileSpec { kind, x, y });
        self
    }

    /// Places tiles on row `y` from column `start` up to (not including) `end`.
    #[must_use]
    pub fn row(mut self, kind: TileKind, start: i32, end: i32, y: i32) -> Self {
        for x in start..end {
            self = self.tile(kind, x, y);
        }
        self
    }

    /// Adds an enemy centred in a cell.
    #[must_use]
    pub fn enemy(mut self, x: i32, y: i32, variant: GoombaVariant) -> Self {
        let position = grid_to_world(self.data.tile_size, x, y);
        self.data.enemy_spawns.push(EnemySpawn { position, variant });
        self
    }

    /// Adds a coin centred in a cell.
    #[must_use]
    pub fn coin(mut self, x: i32, y: i32) -> Self {
        let position = grid_to_world(self.data.tile_size, x, y);
        self.data.coin_spawns.push(position);
        self
    }

    /// Sets the player start cell.
    #[must_use]
    pub fn player_spawn(mut self, x: i32, y: i32) -> Self {
        self.data.player_spawn = grid_to_world(self.data.tile_size, x, y);
        self
    }

    /// Sets the goal cell.
    #[must_use]
    pub fn level_end(mut self, x: i32, y: i32) -> Self {
        self.data.level_end = Some(grid_to_world(self.data.tile_size, x, y));
        self
    }

    /// Finishes the level.
    #[must_use]
    pub fn build(self) -> LevelData {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_to_world() {
        let level = LevelBuilder::new("t", 32.0, 10, 10).build();
        assert_eq!(level.grid_to_world(3, 3), Vec2::new(112.0, 112.0));
        assert_eq!(level.grid_to_world(0, 0), Vec2::new(16.0, 16.0));
    }

    #[test]
    fn test_test_level_contents() {
        let level = LevelData::test_level(32.0);
        assert_eq!(level.name, "Test Level");
        assert_eq!(level.player_spawn, Vec2::new(112.0, 112.0));
        assert_eq!(level.enemy_spawns.len(), 3);
        assert_eq!(level.coin_spawns.len(), 4);
        assert_eq!(level.level_end, Some(Vec2::new(1552.0, 176.0)));

        let count = |kind| level.tiles.iter().filter(|t| t.kind == kind).count();
        assert_eq!(count(TileKind::Ground), 100 + 20);
        assert_eq!(count(TileKind::QuestionBlock), 2);
        assert_eq!(count(TileKind::Brick), 3);
    }

    #[test]
    fn test_tile_replaces_cell() {
        let level = LevelBuilder::new("t", 32.0, 4, 4)
            .tile(TileKind::Ground, 1, 1)
            .tile(TileKind::Brick, 1, 1)
            .build();
        assert_eq!(level.tiles, vec![TileSpec { kind: TileKind::Brick, x: 1, y: 1 }]);
    }

    #[test]
    fn test_provider_returns_copy() {
        let level = LevelBuilder::new("t", 32.0, 4, 4).row(TileKind::Ground, 0, 4, 0).build();
        let loaded = level.load_level().expect("should provide");
        assert_eq!(loaded, level);
        assert!(!loaded.is_empty());
    }
}
