//! Enemy state machine and the goomba family of variants.
//!
//! ```text
//! Walking ──see player──▶ Chasing ──reach target / timeout──▶ Walking
//!    │                       │
//!    └──── stomp (survives) ─┴──▶ Stunned ──stun elapsed──▶ Walking
//!
//! any live state ──health ≤ 0──▶ Dying ──death elapsed──▶ Dead
//! ```
//!
//! `update` only decides velocities. Gravity and tile collision are applied
//! by [`EnemyManager`](crate::enemy_manager::EnemyManager) through the shared
//! resolver.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use platformer_common::Handle;

use crate::appearance::Appearance;
use crate::body::Body;
use crate::collision::Aabb;
use crate::config::EnemyConfig;
use crate::physics::Mover;

/// Stable identifier for an enemy.
pub type EnemyId = Handle<Enemy>;

/// Horizontal distance at which a chase counts as having reached its target.
const CHASE_ARRIVAL_DISTANCE: f32 = 10.0;

/// Chase speed relative to walk speed.
const CHASE_SPEED_MULTIPLIER: f32 = 2.0;

/// Smallest draw scale reached while dying.
const MIN_DYING_SCALE: f32 = 0.1;

/// Enemy behaviour state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    /// Patrolling around the spawn point
    Walking,
    /// Steering toward the last place the player was seen
    Chasing,
    /// Briefly frozen after a non-lethal stomp
    Stunned,
    /// Playing the death animation
    Dying,
    /// Finished; removed on the next purge
    Dead,
}

impl EnemyState {
    /// True for states that move, see, and interact.
    #[must_use]
    pub fn is_alive(self) -> bool {
        matches!(self, Self::Walking | Self::Chasing | Self::Stunned)
    }
}

/// Goomba variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoombaVariant {
    /// Plain goomba
    #[default]
    Normal,
    /// Faster, turns at random
    Fast,
    /// Takes two stomps
    Large,
    /// Sees far, turns at random, charges when chasing
    Elite,
}

/// How a variant moves while chasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementPattern {
    /// Chase at the normal chase speed
    Walk,
    /// Chase at the charge multiplier over the normal chase speed
    Charge,
}

/// Per-variant tuning data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariantTunables {
    /// Multiplier over the configured base speed
    pub speed_multiplier: f32,
    /// Starting health
    pub hit_points: i32,
    /// Score for a kill
    pub score_value: u32,
    /// Detection radius
    pub vision_range: f32,
    /// Reverses direction at random while walking
    pub random_turns: bool,
    /// Chase movement
    pub chase_pattern: MovementPattern,
    /// Box edge length
    pub size: f32,
    /// Upward speed given to the player on a stomp
    pub stomp_bounce: f32,
    /// A single stomp kills regardless of health
    pub stomp_kills: bool,
}

impl GoombaVariant {
    /// All variants.
    pub const ALL: [GoombaVariant; 4] = [Self::Normal, Self::Fast, Self::Large, Self::Elite];

    /// Returns the tuning data for this variant.
    #[must_use]
    pub fn tunables(self) -> VariantTunables {
        let base = VariantTunables {
            speed_multiplier: 1.0,
            hit_points: 1,
            score_value: 100,
            vision_range: 100.0,
            random_turns: false,
            chase_pattern: MovementPattern::Walk,
            size: 28.0,
            stomp_bounce: 8.0,
            stomp_kills: true,
        };

        match self {
            Self::Normal => base,
            Self::Fast => VariantTunables {
                speed_multiplier: 1.5,
                score_value: 200,
                vision_range: 120.0,
                random_turns: true,
                ..base
            },
            Self::Large => VariantTunables {
                speed_multiplier: 1.2,
                hit_points: 2,
                score_value: 300,
                vision_range: 150.0,
                size: 36.0,
                stomp_bounce: 12.0,
                stomp_kills: false,
                ..base
            },
            Self::Elite => VariantTunables {
                speed_multiplier: 1.2,
                score_value: 500,
                vision_range: 200.0,
                random_turns: true,
                chase_pattern: MovementPattern::Charge,
                stomp_bounce: 15.0,
                ..base
            },
        }
    }

    /// Parses a variant name, falling back to `Normal`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "normal" | "goomba" => Self::Normal,
            "fast" => Self::Fast,
            "large" | "big" => Self::Large,
            "elite" => Self::Elite,
            other => {
                warn!("Unknown goomba variant '{}', using normal", other);
                Self::Normal
            },
        }
    }

    /// Returns the canonical name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Fast => "fast",
            Self::Large => "large",
            Self::Elite => "elite",
        }
    }

    /// Texture key for the renderer.
    #[must_use]
    pub fn texture_key(self) -> &'static str {
        match self {
            Self::Normal => "goomba",
            Self::Fast => "goomba_fast",
            Self::Large => "goomba_large",
            Self::Elite => "goomba_elite",
        }
    }
}

/// Movement flags shared by every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyBehavior {
    /// Walking enemies turn around at walls
    pub bounces_off_walls: bool,
    /// Walking enemies turn around at ledges
    pub bounces_off_edges: bool,
    /// Walking enemies may walk off ledges
    pub can_fall_off_platforms: bool,
    /// Top contact counts as a stomp rather than a hit on the player
    pub can_be_stomped: bool,
}

impl Default for EnemyBehavior {
    fn default() -> Self {
        Self {
            bounces_off_walls: true,
            bounces_off_edges: true,
            can_fall_off_platforms: false,
            can_be_stomped: true,
        }
    }
}

/// Kind of hit an enemy receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageKind {
    /// Player landed on it
    Stomp,
    /// Any other source
    Normal,
}

/// Outcome of [`Enemy::take_damage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Invulnerable or not alive
    Ignored,
    /// Health reduced, still alive
    Hurt,
    /// Health reached zero
    Killed,
}

/// Which part of the enemy the player touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerContact {
    /// Player fell onto the enemy
    Top,
    /// Any other contact
    Side,
}

/// Enemy animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyAnimation {
    /// Walking or chasing
    Walk,
    /// Frozen after a stomp
    Stunned,
    /// Flattened while dying
    Squished,
}

/// Structured result of a player/enemy contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyInteraction {
    /// Player landed on the enemy
    Stomp {
        /// Stomped enemy
        enemy: EnemyId,
        /// Enemy variant
        variant: GoombaVariant,
        /// The stomp killed it
        died: bool,
        /// Score awarded
        score: u32,
        /// Upward speed to give the player
        bounce: f32,
    },
    /// Enemy hurt the player
    Damage {
        /// Enemy that hit
        enemy: EnemyId,
        /// Damage dealt
        damage: u32,
        /// Sign of the push away from the enemy
        knockback_direction: f32,
    },
}

impl EnemyInteraction {
    /// Enemy involved.
    #[must_use]
    pub fn enemy(&self) -> EnemyId {
        match self {
            Self::Stomp { enemy, .. } | Self::Damage { enemy, .. } => *enemy,
        }
    }

    /// True when the interaction killed the enemy.
    #[must_use]
    pub fn enemy_died(&self) -> bool {
        matches!(self, Self::Stomp { died: true, .. })
    }
}

/// A single enemy.
#[derive(Debug, Clone)]
pub struct Enemy {
    id: EnemyId,
    variant: GoombaVariant,
    tunables: VariantTunables,
    behavior: EnemyBehavior,
    body: Body,
    on_ground: bool,

    state: EnemyState,
    previous_state: EnemyState,
    state_timer: f32,

    direction: f32,
    speed: f32,
    charge_multiplier: f32,
    direction_change_chance: f32,
    patrol_start_x: f32,
    patrol_distance: f32,

    health: i32,
    max_health: i32,
    invulnerable_timer: f32,
    hit_invulnerability: f32,

    player_last_seen: Option<Vec2>,
    time_since_seen: f32,
    attack_range: f32,
    chase_timeout: f32,
    stun_duration: f32,
    death_duration: f32,
    scale: f32,
}

impl Enemy {
    /// Creates an enemy walking in a random direction from `position`.
    #[must_use]
    pub fn new(
        id: EnemyId,
        variant: GoombaVariant,
        position: Vec2,
        config: &EnemyConfig,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let tunables = variant.tunables();
        let direction = if rng.bool() { 1.0 } else { -1.0 };
        let speed = config.base_speed * tunables.speed_multiplier;
        let body = Body::square(position, tunables.size)
            .with_velocity(Vec2::new(direction * speed, 0.0));

        Self {
            id,
            variant,
            tunables,
            behavior: EnemyBehavior::default(),
            body,
            on_ground: false,
            state: EnemyState::Walking,
            previous_state: EnemyState::Walking,
            state_timer: 0.0,
            direction,
            speed,
            charge_multiplier: config.charge_speed_multiplier,
            direction_change_chance: config.direction_change_chance,
            patrol_start_x: position.x,
            patrol_distance: config.patrol_distance,
            health: tunables.hit_points,
            max_health: tunables.hit_points,
            invulnerable_timer: 0.0,
            hit_invulnerability: config.hit_invulnerability,
            player_last_seen: None,
            time_since_seen: 0.0,
            attack_range: config.attack_range,
            chase_timeout: config.chase_timeout,
            stun_duration: config.stun_duration,
            death_duration: config.death_duration,
            scale: 1.0,
        }
    }

    /// Replaces the movement flags.
    #[must_use]
    pub fn with_behavior(mut self, behavior: EnemyBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Returns the enemy handle.
    #[must_use]
    pub fn id(&self) -> EnemyId {
        self.id
    }

    /// Returns the variant.
    #[must_use]
    pub fn variant(&self) -> GoombaVariant {
        self.variant
    }

    /// Returns the variant tuning data.
    #[must_use]
    pub fn tunables(&self) -> &VariantTunables {
        &self.tunables
    }

    /// Returns the movement flags.
    #[must_use]
    pub fn behavior(&self) -> &EnemyBehavior {
        &self.behavior
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> EnemyState {
        self.state
    }

    /// Returns the state before the last transition.
    #[must_use]
    pub fn previous_state(&self) -> EnemyState {
        self.previous_state
    }

    /// Seconds since the last transition.
    #[must_use]
    pub fn state_timer(&self) -> f32 {
        self.state_timer
    }

    /// Returns the center position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    /// Returns the velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.body.velocity
    }

    /// Returns the bounding box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.body.bounds()
    }

    /// Walking direction (+1 right, -1 left).
    #[must_use]
    pub fn direction(&self) -> f32 {
        self.direction
    }

    /// Returns the walk speed.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Returns the chase speed, including the charge multiplier.
    #[must_use]
    pub fn chase_speed(&self) -> f32 {
        let chase = self.speed * CHASE_SPEED_MULTIPLIER;
        match self.tunables.chase_pattern {
            MovementPattern::Walk => chase,
            MovementPattern::Charge => chase * self.charge_multiplier,
        }
    }

    /// Returns current health.
    #[must_use]
    pub fn health(&self) -> i32 {
        self.health
    }

    /// Returns starting health.
    #[must_use]
    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Returns the score for a kill.
    #[must_use]
    pub fn score_value(&self) -> u32 {
        self.tunables.score_value
    }

    /// Returns the detection radius.
    #[must_use]
    pub fn vision_range(&self) -> f32 {
        self.tunables.vision_range
    }

    /// Where the player was last seen.
    #[must_use]
    pub fn player_last_seen(&self) -> Option<Vec2> {
        self.player_last_seen
    }

    /// Returns whether the enemy stood on a surface after its last move.
    #[must_use]
    pub fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    /// True while walking, chasing, or stunned.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state.is_alive()
    }

    /// True once the death animation has finished.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.state == EnemyState::Dead
    }

    /// True while hits are ignored.
    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0.0
    }

    /// Current draw scale.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Returns the current animation.
    #[must_use]
    pub fn animation(&self) -> EnemyAnimation {
        match self.state {
            EnemyState::Walking | EnemyState::Chasing => EnemyAnimation::Walk,
            EnemyState::Stunned => EnemyAnimation::Stunned,
            EnemyState::Dying | EnemyState::Dead => EnemyAnimation::Squished,
        }
    }

    /// Returns what the renderer should draw.
    #[must_use]
    pub fn appearance(&self) -> Appearance {
        Appearance::Enemy {
            variant: self.variant,
            animation: self.animation(),
            scale: self.scale,
        }
    }

    /// Lists variant traits for inspection.
    #[must_use]
    pub fn special_abilities(&self) -> Vec<&'static str> {
        let mut abilities = Vec::new();
        if self.tunables.random_turns {
            abilities.push("random_turns");
        }
        if self.tunables.speed_multiplier > 1.0 {
            abilities.push("fast");
        }
        if self.max_health > 1 {
            abilities.push("multi_hit");
        }
        if !self.tunables.stomp_kills {
            abilities.push("stun_on_stomp");
        }
        if self.tunables.chase_pattern == MovementPattern::Charge {
            abilities.push("charge");
        }
        abilities
    }

    /// True when the player is within attack range.
    #[must_use]
    pub fn can_attack_player(&self, player_position: Vec2) -> bool {
        self.is_alive() && self.body.position.distance(player_position) <= self.attack_range
    }

    /// Records the player if within vision range.
    ///
    /// A walking enemy that sees the player starts chasing.
    pub fn detect_player(&mut self, player_position: Vec2) -> bool {
        if !self.is_alive() {
            return false;
        }
        if self.body.position.distance(player_position) > self.tunables.vision_range {
            return false;
        }

        self.player_last_seen = Some(player_position);
        self.time_since_seen = 0.0;
        if self.state == EnemyState::Walking {
            self.set_state(EnemyState::Chasing);
        }
        true
    }

    /// Advances timers, runs detection, and steps the state machine.
    pub fn update(&mut self, delta_time: f32, player_position: Option<Vec2>, rng: &mut fastrand::Rng) {
        if self.state == EnemyState::Dead {
            return;
        }

        let dt = delta_time.max(0.0);
        self.state_timer += dt;
        self.time_since_seen += dt;
        self.invulnerable_timer = (self.invulnerable_timer - dt).max(0.0);

        if let Some(position) = player_position {
            self.detect_player(position);
        }

        match self.state {
            EnemyState::Walking => self.update_walking(rng),
            EnemyState::Chasing => self.update_chasing(),
            EnemyState::Stunned => self.update_stunned(),
            EnemyState::Dying => self.update_dying(),
            EnemyState::Dead => {},
        }
    }

    fn update_walking(&mut self, rng: &mut fastrand::Rng) {
        if self.tunables.random_turns && rng.f32() < self.direction_change_chance {
            self.direction = -self.direction;
        }

        let x = self.body.position.x;
        if x > self.patrol_start_x + self.patrol_distance && self.direction > 0.0 {
            self.direction = -1.0;
        } else if x < self.patrol_start_x - self.patrol_distance && self.direction < 0.0 {
            self.direction = 1.0;
        }

        self.body.velocity.x = self.direction * self.speed;
    }

    fn update_chasing(&mut self) {
        if self.time_since_seen >= self.chase_timeout {
            debug!("Enemy {} lost the player", self.id);
            self.set_state(EnemyState::Walking);
            return;
        }

        match self.player_last_seen {
            Some(target) if (target.x - self.body.position.x).abs() > CHASE_ARRIVAL_DISTANCE => {
                self.direction = (target.x - self.body.position.x).signum();
                self.body.velocity.x = self.direction * self.chase_speed();
            },
            _ => self.set_state(EnemyState::Walking),
        }
    }

    fn update_stunned(&mut self) {
        self.body.velocity.x = 0.0;
        if self.state_timer >= self.stun_duration {
            self.set_state(EnemyState::Walking);
        }
    }

    fn update_dying(&mut self) {
        if self.state_timer >= self.death_duration {
            self.set_state(EnemyState::Dead);
        } else {
            self.scale = (1.0 - self.state_timer / self.death_duration).max(MIN_DYING_SCALE);
        }
    }

    fn set_state(&mut self, state: EnemyState) {
        if state == self.state {
            return;
        }

        debug!("Enemy {} {:?} -> {:?}", self.id, self.state, state);
        self.previous_state = self.state;
        self.state = state;
        self.state_timer = 0.0;

        match state {
            EnemyState::Walking => self.body.velocity.x = self.direction * self.speed,
            EnemyState::Stunned => self.body.velocity.x = 0.0,
            EnemyState::Dying => {
                self.body.velocity = Vec2::ZERO;
                self.scale = 1.0;
            },
            EnemyState::Dead => {
                self.body.velocity = Vec2::ZERO;
                self.scale = MIN_DYING_SCALE;
            },
            EnemyState::Chasing => {},
        }
    }

    /// Applies a hit.
    pub fn take_damage(&mut self, amount: i32, kind: DamageKind) -> DamageOutcome {
        if !self.is_alive() || self.is_invulnerable() {
            return DamageOutcome::Ignored;
        }

        match kind {
            DamageKind::Stomp if self.tunables.stomp_kills => self.health = 0,
            DamageKind::Stomp => {
                self.health -= amount;
                if self.health > 0 {
                    self.set_state(EnemyState::Stunned);
                }
            },
            DamageKind::Normal => self.health -= amount,
        }

        if self.health <= 0 {
            self.die();
            DamageOutcome::Killed
        } else {
            self.invulnerable_timer = self.hit_invulnerability;
            DamageOutcome::Hurt
        }
    }

    /// Starts the death animation.
    pub fn die(&mut self) {
        if !self.is_alive() {
            return;
        }
        self.health = self.health.min(0);
        self.set_state(EnemyState::Dying);
    }

    /// Resolves a contact with the player.
    ///
    /// Returns nothing for dying or dead enemies, and for stomps that hit an
    /// invulnerable enemy.
    pub fn interact_with_player(
        &mut self,
        contact: PlayerContact,
        player_position: Vec2,
    ) -> Option<EnemyInteraction> {
        if !self.is_alive() {
            return None;
        }

        if contact == PlayerContact::Top && self.behavior.can_be_stomped {
            let died = match self.take_damage(1, DamageKind::Stomp) {
                DamageOutcome::Ignored => return None,
                DamageOutcome::Hurt => false,
                DamageOutcome::Killed => true,
            };
            let score = if died {
                self.tunables.score_value
            } else {
                self.tunables.score_value / 2
            };

            return Some(EnemyInteraction::Stomp {
                enemy: self.id,
                variant: self.variant,
                died,
                score,
                bounce: self.tunables.stomp_bounce,
            });
        }

        let knockback_direction = if player_position.x < self.body.position.x {
            -1.0
        } else {
            1.0
        };
        Some(EnemyInteraction::Damage {
            enemy: self.id,
            damage: 1,
            knockback_direction,
        })
    }

    /// Turns a walking enemy away from a wall on the given side.
    pub fn handle_wall_collision(&mut self, wall_direction: i8) {
        if !self.behavior.bounces_off_walls || self.state != EnemyState::Walking {
            return;
        }
        if self.direction * f32::from(wall_direction) > 0.0 {
            self.reverse();
        }
    }

    /// Turns a walking enemy away from a ledge.
    pub fn handle_edge(&mut self) {
        if self.state != EnemyState::Walking
            || !self.behavior.bounces_off_edges
            || self.behavior.can_fall_off_platforms
        {
            return;
        }
        self.reverse();
    }

    fn reverse(&mut self) {
        self.direction = -self.direction;
        self.body.velocity.x = self.direction * self.speed;
    }
}

impl Mover for Enemy {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn set_ground_state(&mut self, on_ground: bool) {
        self.on_ground = on_ground;
    }
}
