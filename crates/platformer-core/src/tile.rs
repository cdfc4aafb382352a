//! Static level tiles and the tile set the physics resolves against.
//!
//! Tiles are stored in a generational arena so a destroyed brick's handle
//! never resolves again. A uniform spatial grid narrows every box query to
//! nearby tiles; candidates are always returned in handle order so repeated
//! runs visit tiles identically.

use ahash::AHashMap;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use platformer_common::{Arena, Handle};

use crate::appearance::Appearance;
use crate::collision::{query_overlaps, Aabb, CollisionSide};

/// Stable identifier for a tile.
pub type TileId = Handle<Tile>;

/// Kind of tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Plain ground
    Ground,
    /// Breakable brick
    Brick,
    /// Question block, turns into a used block when hit from below
    QuestionBlock,
    /// Spent question block
    UsedBlock,
    /// Pipe segment
    Pipe,
}

impl TileKind {
    /// Every tile blocks movement.
    #[must_use]
    pub fn is_solid(self) -> bool {
        true
    }

    /// Interactive tiles react to contact and are cooldown-gated.
    #[must_use]
    pub fn is_interactive(self) -> bool {
        matches!(self, Self::Brick | Self::QuestionBlock)
    }

    /// Texture key for the renderer.
    #[must_use]
    pub fn texture_key(self) -> &'static str {
        match self {
            Self::Ground => "ground",
            Self::Brick => "brick",
            Self::QuestionBlock => "question_block",
            Self::UsedBlock => "used_block",
            Self::Pipe => "pipe",
        }
    }
}

/// What a tile did in response to a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileReaction {
    /// Nothing happened
    None,
    /// Tile was bumped but is unchanged
    Bumped,
    /// Tile was spent (question block became a used block)
    Activated,
    /// Tile broke and must be removed from the set
    Destroyed,
}

/// Information about the mover passed to a tile callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactContext {
    /// Mover power level (0 small, 1 big, 2 fire)
    pub power_level: u8,
}

/// Capability for objects that react to being touched.
pub trait CollisionHandler {
    /// Called with the struck side of `self`.
    fn on_collision(&mut self, contact: &ContactContext, side: CollisionSide) -> TileReaction;
}

/// A single static tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    kind: TileKind,
    bounds: Aabb,
    hits: u32,
}

impl Tile {
    /// Creates a tile occupying a box.
    #[must_use]
    pub fn new(kind: TileKind, bounds: Aabb) -> Self {
        Self {
            kind,
            bounds,
            hits: 0,
        }
    }

    /// Returns the tile kind.
    #[must_use]
    pub fn kind(&self) -> TileKind {
        self.kind
    }

    /// Returns the tile box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Returns the tile center.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.bounds.center()
    }

    /// Number of reacting hits this tile has taken.
    #[must_use]
    pub fn hits(&self) -> u32 {
        self.hits
    }

    /// Returns what the renderer should draw.
    #[must_use]
    pub fn appearance(&self) -> Appearance {
        Appearance::Tile(self.kind)
    }
}

impl CollisionHandler for Tile {
    fn on_collision(&mut self, contact: &ContactContext, side: CollisionSide) -> TileReaction {
        let reaction = match (self.kind, side) {
            (TileKind::QuestionBlock, CollisionSide::Bottom) => {
                self.kind = TileKind::UsedBlock;
                TileReaction::Activated
            },
            (TileKind::Brick, CollisionSide::Bottom) if contact.power_level > 0 => {
                TileReaction::Destroyed
            },
            (TileKind::Brick, CollisionSide::Bottom) => TileReaction::Bumped,
            _ => TileReaction::None,
        };

        if reaction != TileReaction::None {
            self.hits += 1;
        }
        reaction
    }
}

/// Arena of tiles with a uniform grid index.
#[derive(Debug, Clone)]
pub struct TileSet {
    tiles: Arena<Tile>,
    grid: AHashMap<(i32, i32), Vec<TileId>>,
    cell_size: f32,
}

impl Default for TileSet {
    fn default() -> Self {
        Self::new(32.0)
    }
}

impl TileSet {
    /// Creates an empty tile set whose grid cells are `cell_size` wide.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            warn!("Invalid tile cell size {}, using 32", cell_size);
            32.0
        };

        Self {
            tiles: Arena::new(),
            grid: AHashMap::new(),
            cell_size,
        }
    }

    /// Returns the grid cell size.
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of live tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True when there are no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Inserts a tile with an explicit box.
    ///
    /// Zero-size boxes are kept but never collide.
    pub fn insert(&mut self, kind: TileKind, bounds: Aabb) -> TileId {
        if !bounds.is_valid() {
            warn!("Tile {:?} has invalid bounds {:?}", kind, bounds);
        }

        let id = self.tiles.insert(Tile::new(kind, bounds));
        for cell in self.cells(&bounds) {
            self.grid.entry(cell).or_default().push(id);
        }
        id
    }

    /// Inserts a tile at a grid coordinate, one cell in size.
    pub fn insert_at_grid(&mut self, kind: TileKind, grid_x: i32, grid_y: i32) -> TileId {
        let size = self.cell_size;
        let left = grid_x as f32 * size;
        let bottom = grid_y as f32 * size;
        self.insert(kind, Aabb::new(left, bottom, left + size, bottom + size))
    }

    /// Removes a tile. Stale handles are ignored.
    pub fn remove(&mut self, id: TileId) -> Option<Tile> {
        let tile = self.tiles.remove(id).ok()?;
        for cell in self.cells(&tile.bounds) {
            if let Some(ids) = self.grid.get_mut(&cell) {
                ids.retain(|other| *other != id);
                if ids.is_empty() {
                    self.grid.remove(&cell);
                }
            }
        }
        debug!("Removed {:?} tile {}", tile.kind, id);
        Some(tile)
    }

    /// Gets a tile.
    #[must_use]
    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    /// Gets a tile mutably.
    pub fn get_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(id)
    }

    /// Iterates over all tiles in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (TileId, &Tile)> {
        self.tiles.iter()
    }

    /// Solid tiles overlapping `bounds`, in handle order.
    #[must_use]
    pub fn solid_overlaps(&self, bounds: &Aabb) -> Vec<(TileId, Aabb)> {
        query_overlaps(bounds, self.candidates(bounds, |tile| tile.kind.is_solid()))
    }

    /// Interactive tiles overlapping `bounds`, in handle order.
    #[must_use]
    pub fn interactive_overlaps(&self, bounds: &Aabb) -> Vec<(TileId, Aabb)> {
        query_overlaps(
            bounds,
            self.candidates(bounds, |tile| tile.kind.is_interactive()),
        )
    }

    /// True when a solid tile contains the point.
    #[must_use]
    pub fn is_solid_at(&self, point: Vec2) -> bool {
        let probe = Aabb::new(point.x, point.y, point.x, point.y);
        self.candidates(&probe, |tile| tile.kind.is_solid())
            .into_iter()
            .any(|(_, bounds)| bounds.is_valid() && bounds.contains_point(point))
    }

    fn candidates(&self, bounds: &Aabb, filter: impl Fn(&Tile) -> bool) -> Vec<(TileId, Aabb)> {
        let mut ids: Vec<TileId> = self
            .cells(bounds)
            .filter_map(|cell| self.grid.get(&cell))
            .flatten()
            .copied()
            .collect();
        ids.sort_by_key(|id| (id.index(), id.generation()));
        ids.dedup();

        ids.into_iter()
            .filter_map(|id| self.tiles.get(id).map(|tile| (id, tile)))
            .filter(|(_, tile)| filter(tile))
            .map(|(id, tile)| (id, tile.bounds))
            .collect()
    }

    fn cells(&self, bounds: &Aabb) -> impl Iterator<Item = (i32, i32)> {
        let to_cell = |v: f32| {
            if v.is_finite() {
                (v / self.cell_size).floor() as i32
            } else {
                0
            }
        };
        let (x0, x1) = (to_cell(bounds.left), to_cell(bounds.right));
        let (y0, y1) = (to_cell(bounds.bottom), to_cell(bounds.top));

        (x0..=x1).flat_map(move |x| (y0..=y1).map(move |y| (x, y)))
    }
}
