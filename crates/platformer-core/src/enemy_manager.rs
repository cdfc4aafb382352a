//! Enemy collection, batch update, and spawn helpers.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use platformer_common::Arena;

use crate::config::{EnemyConfig, PhysicsConfig};
use crate::enemy::{Enemy, EnemyId, EnemyInteraction, GoombaVariant, PlayerContact};
use crate::physics::{is_at_edge, move_and_collide, Mover};
use crate::player::Player;
use crate::tile::TileSet;

/// Default spawn weights for Normal, Fast, Large, Elite.
pub const DEFAULT_SPAWN_WEIGHTS: [f32; 4] = [0.6, 0.2, 0.15, 0.05];

/// Aggregate enemy statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Enemies ever added since the last reset
    pub total: u32,
    /// Enemies killed by the player
    pub defeated: u32,
    /// Enemies still in the collection
    pub remaining: u32,
    /// Share of enemies defeated, 0 to 100
    pub defeat_percentage: f32,
}

/// Shape of a spawn formation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formation {
    /// Three abreast, fast one in the middle
    Line,
    /// Elite up front, two normals flanking
    Triangle,
    /// Two by two: normal, fast, normal, large
    Square,
}

impl Formation {
    /// Offset from the formation center and variant of every member.
    #[must_use]
    pub fn slots(self) -> Vec<(Vec2, GoombaVariant)> {
        use GoombaVariant::{Elite, Fast, Large, Normal};
        match self {
            Self::Line => vec![
                (Vec2::new(-64.0, 0.0), Normal),
                (Vec2::ZERO, Fast),
                (Vec2::new(64.0, 0.0), Normal),
            ],
            Self::Triangle => vec![
                (Vec2::new(0.0, 32.0), Elite),
                (Vec2::new(-48.0, 0.0), Normal),
                (Vec2::new(48.0, 0.0), Normal),
            ],
            Self::Square => vec![
                (Vec2::new(-32.0, 32.0), Normal),
                (Vec2::new(32.0, 32.0), Fast),
                (Vec2::new(-32.0, -32.0), Normal),
                (Vec2::new(32.0, -32.0), Large),
            ],
        }
    }
}

/// Owns every live enemy.
#[derive(Debug, Clone, Default)]
pub struct EnemyManager {
    enemies: Arena<Enemy>,
    config: EnemyConfig,
    total: u32,
    defeated: u32,
}

impl EnemyManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new(config: EnemyConfig) -> Self {
        Self {
            enemies: Arena::new(),
            config,
            total: 0,
            defeated: 0,
        }
    }

    /// Number of enemies in the collection (including dying ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    /// True when there are no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    /// Gets an enemy. Removed enemies never resolve.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(id)
    }

    /// Gets an enemy mutably.
    pub fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.get_mut(id)
    }

    /// Iterates over enemies in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (EnemyId, &Enemy)> {
        self.enemies.iter()
    }

    /// Adds an enemy and returns its handle.
    pub fn add_enemy(
        &mut self,
        variant: GoombaVariant,
        position: Vec2,
        rng: &mut fastrand::Rng,
    ) -> EnemyId {
        let config = &self.config;
        let id = self
            .enemies
            .insert_with(|id| Enemy::new(id, variant, position, config, rng));
        self.total += 1;
        debug!("Spawned {} goomba {} at {:?}", variant.name(), id, position);
        id
    }

    /// Adds one enemy per position with a weighted random variant.
    ///
    /// Weights are indexed like [`GoombaVariant::ALL`]. Missing or
    /// non-positive weights fall back to [`DEFAULT_SPAWN_WEIGHTS`].
    pub fn spawn_group(
        &mut self,
        positions: &[Vec2],
        weights: Option<&[f32]>,
        rng: &mut fastrand::Rng,
    ) -> Vec<EnemyId> {
        let weights = weights
            .filter(|w| w.len() == GoombaVariant::ALL.len() && w.iter().all(|v| *v >= 0.0))
            .filter(|w| w.iter().sum::<f32>() > 0.0)
            .unwrap_or(&DEFAULT_SPAWN_WEIGHTS);

        positions
            .iter()
            .map(|position| {
                let variant = weighted_variant(weights, rng);
                self.add_enemy(variant, *position, rng)
            })
            .collect()
    }

    /// Adds a formation around `center`.
    pub fn spawn_formation(
        &mut self,
        center: Vec2,
        formation: Formation,
        rng: &mut fastrand::Rng,
    ) -> Vec<EnemyId> {
        formation
            .slots()
            .into_iter()
            .map(|(offset, variant)| self.add_enemy(variant, center + offset, rng))
            .collect()
    }

    /// Adds `count` enemies evenly spaced from `start` to `end_x`, cycling
    /// through `variants`.
    pub fn spawn_patrol_line(
        &mut self,
        start: Vec2,
        end_x: f32,
        count: usize,
        variants: &[GoombaVariant],
        rng: &mut fastrand::Rng,
    ) -> Vec<EnemyId> {
        if count == 0 {
            return Vec::new();
        }

        let step = if count > 1 {
            (end_x - start.x) / (count - 1) as f32
        } else {
            0.0
        };
        (0..count)
            .map(|i| {
                let variant = if variants.is_empty() {
                    GoombaVariant::Normal
                } else {
                    variants[i % variants.len()]
                };
                let position = Vec2::new(start.x + step * i as f32, start.y);
                self.add_enemy(variant, position, rng)
            })
            .collect()
    }

    /// Runs physics, then AI, then removes finished enemies.
    ///
    /// Returns the handles that were removed.
    pub fn update(
        &mut self,
        delta_time: f32,
        player_position: Option<Vec2>,
        tiles: &TileSet,
        physics: &PhysicsConfig,
        rng: &mut fastrand::Rng,
    ) -> Vec<EnemyId> {
        for (_, enemy) in self.enemies.iter_mut() {
            if !enemy.is_alive() {
                continue;
            }

            let report = move_and_collide(enemy.body_mut(), tiles, physics);
            enemy.set_ground_state(report.on_ground);
            if report.on_wall {
                enemy.handle_wall_collision(report.wall_direction);
            }
            if report.on_ground
                && is_at_edge(
                    enemy.body(),
                    enemy.direction(),
                    tiles,
                    physics.ground_detection_offset,
                )
            {
                enemy.handle_edge();
            }
        }

        for (_, enemy) in self.enemies.iter_mut() {
            enemy.update(delta_time, player_position, rng);
        }

        let mut removed = Vec::new();
        self.enemies.retain(|id, enemy| {
            if enemy.is_dead() {
                removed.push(id);
                false
            } else {
                true
            }
        });
        for id in &removed {
            debug!("Removed enemy {}", id);
        }
        removed
    }

    /// Tests every live enemy against the player.
    ///
    /// A contact is a stomp when the player is falling and its bottom edge is
    /// above the enemy's center.
    pub fn check_player_interactions(&mut self, player: &Player) -> Vec<EnemyInteraction> {
        let player_bounds = player.bounds();
        let falling = player.velocity().y < 0.0;

        let mut interactions = Vec::new();
        for (_, enemy) in self.enemies.iter_mut() {
            if !enemy.is_alive() || !enemy.bounds().overlaps(&player_bounds) {
                continue;
            }

            let contact = if falling && player_bounds.bottom > enemy.position().y {
                PlayerContact::Top
            } else {
                PlayerContact::Side
            };
            if let Some(interaction) = enemy.interact_with_player(contact, player.position()) {
                interactions.push(interaction);
            }
        }

        self.defeated += interactions.iter().filter(|i| i.enemy_died()).count() as u32;
        interactions
    }

    /// Returns aggregate statistics.
    #[must_use]
    pub fn stats(&self) -> EnemyStats {
        let defeat_percentage = if self.total == 0 {
            0.0
        } else {
            self.defeated as f32 / self.total as f32 * 100.0
        };
        EnemyStats {
            total: self.total,
            defeated: self.defeated,
            remaining: self.enemies.len() as u32,
            defeat_percentage,
        }
    }

    /// Removes every enemy and clears statistics.
    pub fn reset(&mut self) {
        info!("Resetting {} enemies", self.enemies.len());
        self.enemies.clear();
        self.total = 0;
        self.defeated = 0;
    }
}

fn weighted_variant(weights: &[f32], rng: &mut fastrand::Rng) -> GoombaVariant {
    let total: f32 = weights.iter().sum();
    let mut roll = rng.f32() * total;
    for (variant, weight) in GoombaVariant::ALL.iter().zip(weights) {
        if roll < *weight {
            return *variant;
        }
        roll -= weight;
    }
    GoombaVariant::Normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::enemy::EnemyState;
    use crate::tile::TileKind;

    fn floor(width: i32) -> TileSet {
        let mut tiles = TileSet::new(32.0);
        for x in 0..width {
            tiles.insert_at_grid(TileKind::Ground, x, 0);
        }
        tiles
    }

    #[test]
    fn test_add_and_get() {
        let mut manager = EnemyManager::default();
        let mut rng = fastrand::Rng::with_seed(3);
        let id = manager.add_enemy(GoombaVariant::Large, Vec2::new(100.0, 50.0), &mut rng);

        let enemy = manager.get(id).expect("should exist");
        assert_eq!(enemy.id(), id);
        assert_eq!(enemy.variant(), GoombaVariant::Large);
        assert_eq!(manager.stats().total, 1);
    }

    #[test]
    fn test_enemy_lands_and_walks() {
        let tiles = floor(20);
        let mut manager = EnemyManager::default();
        let mut rng = fastrand::Rng::with_seed(3);
        let id = manager.add_enemy(GoombaVariant::Normal, Vec2::new(320.0, 80.0), &mut rng);

        for _ in 0..60 {
            manager.update(1.0 / 60.0, None, &tiles, &PhysicsConfig::default(), &mut rng);
        }
        let enemy = manager.get(id).expect("should exist");
        assert!(enemy.is_on_ground());
        assert_eq!(enemy.bounds().bottom, 32.0);
        assert_ne!(enemy.position().x, 320.0);
    }

    #[test]
    fn test_enemy_turns_at_ledge() {
        let tiles = floor(4);
        let mut manager = EnemyManager::new(EnemyConfig {
            patrol_distance: 1000.0,
            ..EnemyConfig::default()
        });
        let mut rng = fastrand::Rng::with_seed(3);
        let id = manager.add_enemy(GoombaVariant::Normal, Vec2::new(64.0, 46.0), &mut rng);

        for _ in 0..300 {
            manager.update(1.0 / 60.0, None, &tiles, &PhysicsConfig::default(), &mut rng);
            let enemy = manager.get(id).expect("should never fall off");
            assert!(enemy.bounds().left > -2.0 && enemy.bounds().right < 130.0);
        }
    }

    #[test]
    fn test_enemy_keeps_heading_on_open_floor() {
        let tiles = floor(200);
        let physics = PhysicsConfig::default();
        for seed in 0..20 {
            let mut manager = EnemyManager::new(EnemyConfig {
                patrol_distance: 1e5,
                ..EnemyConfig::default()
            });
            let mut rng = fastrand::Rng::with_seed(seed);
            let id = manager.add_enemy(GoombaVariant::Large, Vec2::new(3200.3, 50.0), &mut rng);
            let heading = manager.get(id).expect("should exist").direction();

            for _ in 0..600 {
                manager.update(1.0 / 60.0, None, &tiles, &physics, &mut rng);
                let enemy = manager.get(id).expect("should exist");
                assert_eq!(
                    enemy.direction(),
                    heading,
                    "seed {seed}: reversed at x={}",
                    enemy.position().x
                );
            }
        }
    }

    #[test]
    fn test_enemy_turns_at_wall() {
        let mut tiles = floor(20);
        tiles.insert_at_grid(TileKind::Pipe, 12, 1);
        let mut manager = EnemyManager::default();
        let mut rng = fastrand::Rng::with_seed(3);
        let id = manager.add_enemy(GoombaVariant::Normal, Vec2::new(370.0, 46.0), &mut rng);

        for _ in 0..120 {
            manager.update(1.0 / 60.0, None, &tiles, &PhysicsConfig::default(), &mut rng);
            let enemy = manager.get(id).expect("should exist");
            assert!(enemy.bounds().right <= 384.0);
        }
    }

    #[test]
    fn test_stomp_then_purge() {
        let tiles = floor(20);
        let mut manager = EnemyManager::default();
        let mut rng = fastrand::Rng::with_seed(3);
        let id = manager.add_enemy(GoombaVariant::Normal, Vec2::new(200.0, 46.0), &mut rng);

        // Player falling onto the goomba.
        let mut player = Player::new(Vec2::new(200.0, 70.0), &PlayerConfig::default());
        player.bounce(-4.0);

        let interactions = manager.check_player_interactions(&player);
        assert_eq!(interactions.len(), 1);
        assert!(interactions[0].enemy_died());
        assert_eq!(manager.get(id).expect("dying").state(), EnemyState::Dying);

        // A dying enemy interacts no more.
        assert!(manager.check_player_interactions(&player).is_empty());

        let mut removed = Vec::new();
        for _ in 0..4 {
            removed.extend(manager.update(0.125, None, &tiles, &PhysicsConfig::default(), &mut rng));
        }
        assert_eq!(removed, vec![id]);
        assert!(manager.get(id).is_none());
        assert!(manager.update(0.125, None, &tiles, &PhysicsConfig::default(), &mut rng).is_empty());

        let stats = manager.stats();
        assert_eq!(stats.defeated, 1);
        assert_eq!(stats.remaining, 0);
        assert_eq!(stats.defeat_percentage, 100.0);
    }

    #[test]
    fn test_side_contact_is_damage() {
        let mut manager = EnemyManager::default();
        let mut rng = fastrand::Rng::with_seed(3);
        manager.add_enemy(GoombaVariant::Normal, Vec2::new(200.0, 46.0), &mut rng);
        let player = Player::new(Vec2::new(175.0, 48.0), &PlayerConfig::default());

        let interactions = manager.check_player_interactions(&player);
        assert!(matches!(
            interactions.as_slice(),
            [EnemyInteraction::Damage { knockback_direction, .. }] if *knockback_direction == -1.0
        ));
    }

    #[test]
    fn test_removed_handle_never_resolves() {
        let tiles = floor(20);
        let mut manager = EnemyManager::default();
        let mut rng = fastrand::Rng::with_seed(3);
        let old = manager.add_enemy(GoombaVariant::Normal, Vec2::new(200.0, 46.0), &mut rng);
        manager.get_mut(old).expect("should exist").die();
        for _ in 0..4 {
            manager.update(0.125, None, &tiles, &PhysicsConfig::default(), &mut rng);
        }

        let new = manager.add_enemy(GoombaVariant::Fast, Vec2::new(200.0, 46.0), &mut rng);
        assert_eq!(old.index(), new.index());
        assert!(manager.get(old).is_none());
        assert!(manager.get(new).is_some());
    }

    #[test]
    fn test_spawn_group_is_seeded() {
        let positions: Vec<Vec2> = (0..20).map(|i| Vec2::new(i as f32 * 40.0, 50.0)).collect();
        let spawn = |seed| {
            let mut manager = EnemyManager::default();
            let mut rng = fastrand::Rng::with_seed(seed);
            manager.spawn_group(&positions, None, &mut rng);
            manager.iter().map(|(_, e)| e.variant()).collect::<Vec<_>>()
        };

        assert_eq!(spawn(5), spawn(5));
        assert_eq!(spawn(5).len(), 20);
    }

    #[test]
    fn test_spawn_group_respects_weights() {
        let mut manager = EnemyManager::default();
        let mut rng = fastrand::Rng::with_seed(5);
        let positions = vec![Vec2::ZERO; 10];
        manager.spawn_group(&positions, Some(&[0.0, 0.0, 1.0, 0.0]), &mut rng);
        assert!(manager.iter().all(|(_, e)| e.variant() == GoombaVariant::Large));
    }

    #[test]
    fn test_formations() {
        let mut manager = EnemyManager::default();
        let mut rng = fastrand::Rng::with_seed(5);
        let center = Vec2::new(300.0, 100.0);

        let line = manager.spawn_formation(center, Formation::Line, &mut rng);
        let variants: Vec<_> = line
            .iter()
            .map(|id| manager.get(*id).expect("should exist").variant())
            .collect();
        assert_eq!(
            variants,
            vec![GoombaVariant::Normal, GoombaVariant::Fast, GoombaVariant::Normal]
        );
        assert_eq!(
            manager.get(line[2]).expect("should exist").position(),
            Vec2::new(364.0, 100.0)
        );

        let triangle = manager.spawn_formation(center, Formation::Triangle, &mut rng);
        let lead = manager.get(triangle[0]).expect("should exist");
        assert_eq!(lead.variant(), GoombaVariant::Elite);
        assert_eq!(lead.position(), Vec2::new(300.0, 132.0));

        let square = manager.spawn_formation(center, Formation::Square, &mut rng);
        assert_eq!(square.len(), 4);
        let last = manager.get(square[3]).expect("should exist");
        assert_eq!(last.variant(), GoombaVariant::Large);
        assert_eq!(last.position(), Vec2::new(332.0, 68.0));
        assert_eq!(manager.len(), 10);
    }

    #[test]
    fn test_patrol_line() {
        let mut manager = EnemyManager::default();
        let mut rng = fastrand::Rng::with_seed(5);
        let ids = manager.spawn_patrol_line(
            Vec2::new(100.0, 50.0),
            400.0,
            4,
            &[GoombaVariant::Normal, GoombaVariant::Fast],
            &mut rng,
        );

        let xs: Vec<f32> = ids
            .iter()
            .map(|id| manager.get(*id).expect("should exist").position().x)
            .collect();
        assert_eq!(xs, vec![100.0, 200.0, 300.0, 400.0]);
        assert_eq!(
            manager.get(ids[1]).expect("should exist").variant(),
            GoombaVariant::Fast
        );
    }

    #[test]
    fn test_reset() {
        let mut manager = EnemyManager::default();
        let mut rng = fastrand::Rng::with_seed(5);
        manager.add_enemy(GoombaVariant::Normal, Vec2::ZERO, &mut rng);
        manager.reset();

        assert!(manager.is_empty());
        assert_eq!(manager.stats().total, 0);
        assert_eq!(manager.stats().defeat_percentage, 0.0);
    }
}
