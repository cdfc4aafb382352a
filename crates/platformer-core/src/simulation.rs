//! Frame driver.
//!
//! [`Simulation`] owns every entity and advances them one frame at a time:
//!
//! 1. input sets the player's horizontal velocity and jump buffer
//! 2. the physics engine moves the player and fires tile callbacks
//! 3. enemies move through the shared resolver, then think
//! 4. player/enemy and player/coin overlaps are resolved into effects
//!
//! Everything is driven by the caller's `delta_time` and a seeded RNG, so two
//! simulations fed the same inputs stay identical.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::Vec2;
use tracing::{debug, info, warn};

use crate::body::PhysicsBody;
use crate::coin::{CoinManager, CoinPickup};
use crate::collision::Aabb;
use crate::config::{GameConfig, PlayerConfig};
use crate::enemy::{EnemyId, EnemyInteraction};
use crate::enemy_manager::EnemyManager;
use crate::events::{EventBus, GameEvent, SoundEvent};
use crate::input::FrameInput;
use crate::level::{LevelData, LevelProvider};
use crate::physics::{PlatformPhysicsEngine, TileTrigger};
use crate::player::Player;
use crate::tile::{TileReaction, TileSet};

/// What happened during one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Index of the frame that was simulated
    pub frame: u64,
    /// Player stands on a surface
    pub on_ground: bool,
    /// Player is pressed against a wall
    pub on_wall: bool,
    /// Player jumped
    pub jumped: bool,
    /// Player landed
    pub landed: bool,
    /// Tile callbacks that reacted
    pub tile_triggers: Vec<TileTrigger>,
    /// Player/enemy contacts
    pub interactions: Vec<EnemyInteraction>,
    /// Coins collected
    pub pickups: Vec<CoinPickup>,
    /// Enemies removed after dying
    pub removed_enemies: Vec<EnemyId>,
    /// Player lost a life
    pub player_died: bool,
    /// Player reached the goal
    pub level_complete: bool,
    /// No lives left
    pub game_over: bool,
}

/// The whole game state.
#[derive(Debug)]
pub struct Simulation {
    config: GameConfig,
    level_name: String,
    spawn_point: Vec2,
    level_end: Option<Aabb>,
    player: Player,
    engine: PlatformPhysicsEngine,
    tiles: TileSet,
    enemies: EnemyManager,
    coins: CoinManager,
    events: EventBus,
    rng: fastrand::Rng,
    seed: u64,
    frame: u64,
    score: u64,
    lives: u32,
    level_complete: bool,
    game_over: bool,
}

impl Simulation {
    /// Builds a simulation from a level.
    ///
    /// Without a provider, or when the provider has no usable level, the
    /// built-in test level is used.
    #[must_use]
    pub fn new(config: GameConfig, provider: Option<&dyn LevelProvider>, seed: u64) -> Self {
        let mut config = config;
        config.validate();

        let level = match provider.map(|p| p.load_level()) {
            Some(Some(level)) if !level.is_empty() => level,
            Some(Some(level)) => {
                warn!("Level '{}' has no tiles, using built-in test level", level.name);
                LevelData::test_level(config.physics.tile_size)
            },
            Some(None) => {
                warn!("Level provider returned nothing, using built-in test level");
                LevelData::test_level(config.physics.tile_size)
            },
            None => {
                warn!("No level provider, using built-in test level");
                LevelData::test_level(config.physics.tile_size)
            },
        };

        let mut rng = fastrand::Rng::with_seed(seed);

        let mut tiles = TileSet::new(level.tile_size);
        for spec in &level.tiles {
            tiles.insert_at_grid(spec.kind, spec.x, spec.y);
        }

        let mut enemies = EnemyManager::new(config.enemy.clone());
        for spawn in &level.enemy_spawns {
            enemies.add_enemy(spawn.variant, spawn.position, &mut rng);
        }

        let mut coins = CoinManager::new(config.coin.clone());
        for position in &level.coin_spawns {
            coins.add_coin(*position, None);
        }

        let player = Player::new(level.player_spawn, &config.player)
            .with_physics_body(PhysicsBody::new(1.0));
        let level_end = level
            .level_end
            .map(|end| Aabb::from_center(end, Vec2::splat(level.tile_size / 2.0)));

        info!(
            "Loaded level '{}': {} tiles, {} enemies, {} coins (seed {})",
            level.name,
            tiles.len(),
            enemies.len(),
            coins.len(),
            seed
        );

        Self {
            engine: PlatformPhysicsEngine::new(config.physics.clone()),
            lives: config.player.lives,
            config,
            level_name: level.name,
            spawn_point: level.player_spawn,
            level_end,
            player,
            tiles,
            enemies,
            coins,
            events: EventBus::default(),
            rng,
            seed,
            frame: 0,
            score: 0,
            level_complete: false,
            game_over: false,
        }
    }

    /// Returns the configuration in use (after validation).
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Returns the level name.
    #[must_use]
    pub fn level_name(&self) -> &str {
        &self.level_name
    }

    /// Returns the respawn point.
    #[must_use]
    pub fn spawn_point(&self) -> Vec2 {
        self.spawn_point
    }

    /// Returns the player.
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Returns the player mutably.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Returns the physics engine.
    #[must_use]
    pub fn engine(&self) -> &PlatformPhysicsEngine {
        &self.engine
    }

    /// Returns the tiles.
    #[must_use]
    pub fn tiles(&self) -> &TileSet {
        &self.tiles
    }

    /// Returns the enemies.
    #[must_use]
    pub fn enemies(&self) -> &EnemyManager {
        &self.enemies
    }

    /// Returns the enemies mutably.
    pub fn enemies_mut(&mut self) -> &mut EnemyManager {
        &mut self.enemies
    }

    /// Returns the coins.
    #[must_use]
    pub fn coins(&self) -> &CoinManager {
        &self.coins
    }

    /// Returns the coins mutably.
    pub fn coins_mut(&mut self) -> &mut CoinManager {
        &mut self.coins
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Returns the simulation RNG, for spawning in step with the simulation.
    pub fn rng_mut(&mut self) -> &mut fastrand::Rng {
        &mut self.rng
    }

    /// Returns the seed the simulation was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of frames simulated.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Returns the score.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Returns the lives left.
    #[must_use]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    /// True once the player touched the goal.
    #[must_use]
    pub fn is_level_complete(&self) -> bool {
        self.level_complete
    }

    /// True once no lives are left.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Advances the simulation by one frame.
    ///
    /// After game over this is a no-op that reports `game_over`.
    pub fn step(&mut self, input: &FrameInput, delta_time: f32) -> FrameReport {
        let mut report = FrameReport {
            frame: self.frame,
            game_over: self.game_over,
            ..FrameReport::default()
        };
        if self.game_over {
            return report;
        }

        let dt = if delta_time.is_finite() {
            delta_time.max(0.0)
        } else {
            0.0
        };

        match input.horizontal() {
            -1 => self.player.move_left(),
            1 => self.player.move_right(),
            _ => self.player.stop_moving(),
        }
        self.player.update(dt);

        report.jumped = if input.jump {
            self.player.jump()
        } else if self.player.jump_buffered() {
            self.player.try_jump()
        } else {
            false
        };
        if report.jumped {
            self.events.play(SoundEvent::Jump);
        }

        let was_on_ground = self.player.is_on_ground();
        let step = self.engine.update(&mut self.player, &mut self.tiles, dt);
        report.on_ground = step.on_ground;
        report.on_wall = step.on_wall;
        report.landed = step.on_ground && !was_on_ground;
        if report.landed {
            self.events.play(SoundEvent::Land);
        }
        for trigger in &step.triggers {
            self.publish_tile_trigger(trigger);
        }
        report.tile_triggers = step.triggers;

        report.removed_enemies = self.enemies.update(
            dt,
            Some(self.player.position()),
            &self.tiles,
            &self.config.physics,
            &mut self.rng,
        );
        for enemy in &report.removed_enemies {
            self.events.publish(GameEvent::EnemyRemoved { enemy: *enemy });
        }

        report.interactions = self.enemies.check_player_interactions(&self.player);
        for interaction in &report.interactions {
            self.apply_interaction(interaction, &mut report.player_died);
        }

        self.coins.update(dt, Some(self.player.position()));
        report.pickups = self.coins.check_player_collection(&self.player.bounds());
        for pickup in &report.pickups {
            self.score += u64::from(pickup.value);
            self.events.publish(GameEvent::CoinCollected {
                coin: pickup.coin,
                value: pickup.value,
            });
            self.events.play(SoundEvent::Coin);
        }

        if !report.player_died && self.player.position().y < self.config.player.fall_limit {
            debug!("Player fell out of the world");
            self.lose_life();
            report.player_died = true;
        }

        if let Some(goal) = self.level_end {
            if !self.level_complete && goal.overlaps(&self.player.bounds()) {
                info!("Level '{}' complete at frame {}", self.level_name, self.frame);
                self.level_complete = true;
            }
        }

        report.level_complete = self.level_complete;
        report.game_over = self.game_over;
        self.frame += 1;
        report
    }

    fn publish_tile_trigger(&mut self, trigger: &TileTrigger) {
        match trigger.reaction {
            TileReaction::Activated => {
                self.events.publish(GameEvent::BlockActivated {
                    tile: trigger.tile,
                    position: trigger.position,
                });
                self.events.play(SoundEvent::BlockBump);
            },
            TileReaction::Destroyed => {
                self.events.publish(GameEvent::BlockDestroyed {
                    tile: trigger.tile,
                    position: trigger.position,
                });
                self.events.play(SoundEvent::BlockBreak);
            },
            TileReaction::Bumped => self.events.play(SoundEvent::BlockBump),
            TileReaction::None => {},
        }
    }

    fn apply_interaction(&mut self, interaction: &EnemyInteraction, player_died: &mut bool) {
        match *interaction {
            EnemyInteraction::Stomp {
                enemy,
                variant,
                died,
                score,
                bounce,
            } => {
                self.player.bounce(bounce);
                self.score += u64::from(score);
                self.events.publish(GameEvent::EnemyStomped { enemy, died, score });
                self.events.play(SoundEvent::Stomp);
                if died {
                    self.events.publish(GameEvent::EnemyDefeated { enemy, variant });
                    self.events.play(SoundEvent::EnemyDeath);
                } else {
                    self.events.play(SoundEvent::EnemyHit);
                }
            },
            EnemyInteraction::Damage {
                knockback_direction,
                ..
            } => {
                if *player_died || self.player.is_invulnerable() {
                    return;
                }
                if self.player.take_damage() {
                    self.lose_life();
                    *player_died = true;
                } else {
                    let PlayerConfig {
                        knockback_speed,
                        knockback_lift,
                        ..
                    } = self.config.player;
                    self.player.knockback(knockback_direction, knockback_speed, knockback_lift);
                    self.events.publish(GameEvent::PlayerDamaged {
                        power_level: self.player.power_level(),
                    });
                    self.events.play(SoundEvent::PlayerHurt);
                }
            },
        }
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.events.play(SoundEvent::Death);
        self.events.publish(GameEvent::PlayerDied {
            lives_left: self.lives,
        });

        if self.lives == 0 {
            info!("Game over at frame {} with score {}", self.frame, self.score);
            self.game_over = true;
            self.events.publish(GameEvent::GameOver { score: self.score });
        } else {
            info!("Player died, {} lives left", self.lives);
            self.player.reset_to_checkpoint(self.spawn_point);
            self.engine.reset();
        }
    }

    /// Hashes everything that determines future frames.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.frame.hash(&mut hasher);
        self.score.hash(&mut hasher);
        self.lives.hash(&mut hasher);
        self.game_over.hash(&mut hasher);
        self.rng.get_seed().hash(&mut hasher);

        hash_vec2(self.player.position(), &mut hasher);
        hash_vec2(self.player.velocity(), &mut hasher);
        self.player.is_on_ground().hash(&mut hasher);
        self.player.power_level().hash(&mut hasher);

        for (id, enemy) in self.enemies.iter() {
            id.hash(&mut hasher);
            enemy.state().hash(&mut hasher);
            enemy.health().hash(&mut hasher);
            hash_vec2(enemy.position(), &mut hasher);
            hash_vec2(enemy.velocity(), &mut hasher);
        }

        for (id, coin) in self.coins.iter() {
            id.hash(&mut hasher);
            coin.is_collected().hash(&mut hasher);
            hash_vec2(coin.position(), &mut hasher);
        }

        for (id, tile) in self.tiles.iter() {
            id.hash(&mut hasher);
            tile.kind().hash(&mut hasher);
        }

        hasher.finish()
    }
}

fn hash_vec2(v: Vec2, hasher: &mut impl Hasher) {
    v.x.to_bits().hash(hasher);
    v.y.to_bits().hash(hasher);
}
