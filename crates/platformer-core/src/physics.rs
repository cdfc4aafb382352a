//! Platform physics.
//!
//! Movement is resolved in two passes per frame: the mover first moves along
//! x and is pushed out of any walls it entered, then moves along y and is
//! pushed out of floors and ceilings. Ground contact is re-derived from the
//! vertical pass every frame.
//!
//! [`move_and_collide`] is the shared resolver used by both the player engine
//! and the enemy manager. [`PlatformPhysicsEngine`] adds interactive-tile
//! callbacks with a per-tile cooldown on top of it.

use ahash::AHashMap;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::body::Body;
use crate::collision::{collision_info, resolve, resolve_vertical, CollisionSide};
use crate::config::PhysicsConfig;
use crate::tile::{CollisionHandler, ContactContext, TileId, TileReaction, TileSet};

/// Anything the platform physics engine can move.
pub trait Mover {
    /// Returns the mover body.
    fn body(&self) -> &Body;

    /// Returns the mover body mutably.
    fn body_mut(&mut self) -> &mut Body;

    /// Receives the ground state computed this frame.
    fn set_ground_state(&mut self, _on_ground: bool) {}

    /// Power level passed to tile callbacks.
    fn power_level(&self) -> u8 {
        0
    }
}

impl Mover for Body {
    fn body(&self) -> &Body {
        self
    }

    fn body_mut(&mut self) -> &mut Body {
        self
    }
}

/// A solid tile touched during a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    /// Tile that was touched
    pub tile: TileId,
    /// Side of the tile that was struck
    pub side: CollisionSide,
}

/// Result of one [`move_and_collide`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveReport {
    /// Landed on a surface this frame
    pub on_ground: bool,
    /// Pushed out of a wall this frame
    pub on_wall: bool,
    /// +1 wall on the right, -1 wall on the left, 0 none
    pub wall_direction: i8,
    /// Tiles touched, in resolution order
    pub contacts: Vec<Contact>,
}

/// Applies one frame of gravity, clamped to terminal velocity.
pub fn apply_gravity(body: &mut Body, gravity: f32, terminal_velocity: f32) {
    body.velocity.y -= gravity;
    if body.velocity.y < -terminal_velocity {
        body.velocity.y = -terminal_velocity;
    }
}

/// Integrates gravity and moves `body` through `tiles` in two passes.
pub fn move_and_collide(body: &mut Body, tiles: &TileSet, config: &PhysicsConfig) -> MoveReport {
    let mut report = MoveReport::default();

    apply_gravity(body, config.gravity, config.terminal_velocity);

    // Horizontal pass
    body.position.x += body.velocity.x;
    for (tile, bounds) in tiles.solid_overlaps(&body.bounds()) {
        let Some(info) = collision_info(&body.bounds(), &bounds) else {
            continue;
        };
        if !info.is_horizontal() {
            continue;
        }

        resolve(body, &bounds, &info);
        report.on_wall = true;
        report.wall_direction = if info.from_left { 1 } else { -1 };
        report.contacts.push(Contact {
            tile,
            side: info.horizontal_side(),
        });
    }

    // Vertical pass
    body.position.y += body.velocity.y;
    for (tile, bounds) in tiles.solid_overlaps(&body.bounds()) {
        let Some(info) = collision_info(&body.bounds(), &bounds) else {
            continue;
        };

        // Walls belong to the x pass; a shallow x overlap here is a tile seam.
        let falling = body.velocity.y <= 0.0;
        resolve_vertical(body, &bounds, &info);
        if info.from_above && falling {
            report.on_ground = true;
        }
        report.contacts.push(Contact {
            tile,
            side: info.vertical_side(),
        });
    }

    trace!(
        "Moved to ({:.2}, {:.2}) ground={} wall={} contacts={}",
        body.position.x,
        body.position.y,
        report.on_ground,
        report.on_wall,
        report.contacts.len()
    );
    report
}

/// True when no solid tile lies just beyond the leading foot of `body`.
///
/// `direction` is the sign of the intended horizontal movement. Only
/// meaningful for a grounded body.
#[must_use]
pub fn is_at_edge(body: &Body, direction: f32, tiles: &TileSet, probe_offset: f32) -> bool {
    let bounds = body.bounds();
    let x = if direction >= 0.0 {
        bounds.right + probe_offset
    } else {
        bounds.left - probe_offset
    };
    !tiles.is_solid_at(Vec2::new(x, bounds.bottom - probe_offset))
}

/// A tile callback that fired this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileTrigger {
    /// Tile that was hit
    pub tile: TileId,
    /// Side of the tile that was struck
    pub side: CollisionSide,
    /// How the tile reacted
    pub reaction: TileReaction,
    /// Tile center at the time of the hit
    pub position: Vec2,
}

/// Result of one [`PlatformPhysicsEngine::update`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhysicsStep {
    /// Mover stands on a surface
    pub on_ground: bool,
    /// Mover is pressed against a wall
    pub on_wall: bool,
    /// +1 wall on the right, -1 wall on the left, 0 none
    pub wall_direction: i8,
    /// Tile callbacks that produced a reaction
    pub triggers: Vec<TileTrigger>,
}

/// Authoritative mover for the player.
#[derive(Debug, Clone)]
pub struct PlatformPhysicsEngine {
    config: PhysicsConfig,
    on_ground: bool,
    on_wall: bool,
    wall_direction: i8,
    cooldowns: AHashMap<TileId, f32>,
    clock: f32,
}

impl Default for PlatformPhysicsEngine {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PlatformPhysicsEngine {
    /// Creates a new engine.
    #[must_use]
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            on_ground: false,
            on_wall: false,
            wall_direction: 0,
            cooldowns: AHashMap::new(),
            clock: 0.0,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Mover stood on a surface after the last update.
    #[must_use]
    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    /// Mover was pressed against a wall after the last update.
    #[must_use]
    pub fn on_wall(&self) -> bool {
        self.on_wall
    }

    /// Wall side after the last update.
    #[must_use]
    pub fn wall_direction(&self) -> i8 {
        self.wall_direction
    }

    /// Seconds of simulated time seen by this engine.
    #[must_use]
    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// True when a tile callback is currently suppressed.
    #[must_use]
    pub fn is_on_cooldown(&self, tile: TileId) -> bool {
        self.cooldowns.contains_key(&tile)
    }

    /// Forgets contact state and cooldowns.
    pub fn reset(&mut self) {
        self.on_ground = false;
        self.on_wall = false;
        self.wall_direction = 0;
        self.cooldowns.clear();
    }

    /// Advances the mover by one frame.
    pub fn update<M: Mover>(&mut self, mover: &mut M, tiles: &mut TileSet, delta_time: f32) -> PhysicsStep {
        self.clock += delta_time.max(0.0);
        let clock = self.clock;
        self.cooldowns.retain(|tile, expiry| {
            let live = *expiry > clock;
            if !live {
                trace!("Cooldown expired for tile {}", tile);
            }
            live
        });

        let report = move_and_collide(mover.body_mut(), tiles, &self.config);
        self.on_ground = report.on_ground;
        self.on_wall = report.on_wall;
        self.wall_direction = report.wall_direction;

        // Interactive tiles are solid, so after resolution the mover only
        // touches them. Probe with a slightly larger box.
        let sensor = mover.body().bounds().expanded(self.config.ground_detection_offset);
        let mut contacts = report.contacts;
        for (tile, bounds) in tiles.interactive_overlaps(&sensor) {
            if let Some(info) = collision_info(&sensor, &bounds) {
                contacts.push(Contact {
                    tile,
                    side: info.side(),
                });
            }
        }

        let context = ContactContext {
            power_level: mover.power_level(),
        };
        let mut triggers = Vec::new();
        for contact in contacts {
            if let Some(trigger) = self.dispatch(tiles, &context, contact) {
                triggers.push(trigger);
            }
        }

        mover.set_ground_state(self.on_ground);

        PhysicsStep {
            on_ground: self.on_ground,
            on_wall: self.on_wall,
            wall_direction: self.wall_direction,
            triggers,
        }
    }

    fn dispatch(
        &mut self,
        tiles: &mut TileSet,
        context: &ContactContext,
        contact: Contact,
    ) -> Option<TileTrigger> {
        let tile = tiles.get_mut(contact.tile)?;

        if tile.kind().is_interactive() {
            if self.cooldowns.contains_key(&contact.tile) {
                return None;
            }
            self.cooldowns
                .insert(contact.tile, self.clock + self.config.tile_cooldown);
        }

        let position = tile.center();
        let reaction = tile.on_collision(context, contact.side);
        if reaction == TileReaction::None {
            return None;
        }

        debug!(
            "Tile {} hit on {:?}: {:?}",
            contact.tile, contact.side, reaction
        );
        if reaction == TileReaction::Destroyed {
            tiles.remove(contact.tile);
        }

        Some(TileTrigger {
            tile: contact.tile,
            side: contact.side,
            reaction,
            position,
        })
    }
}
