//! Player controller.
//!
//! Horizontal input sets the velocity directly. Jumps go through a short
//! input buffer and are granted while grounded or within the coyote window
//! after walking off a ledge. Vertical motion and ground contact are owned by
//! [`PlatformPhysicsEngine`](crate::physics::PlatformPhysicsEngine).

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::appearance::Appearance;
use crate::body::{Body, PhysicsBody};
use crate::collision::Aabb;
use crate::config::PlayerConfig;
use crate::physics::Mover;

/// Highest power level (fire).
pub const MAX_POWER_LEVEL: u8 = 2;

/// Horizontal speed below which the player counts as standing still.
const RUN_THRESHOLD: f32 = 0.1;

/// Player animation, used as the texture side channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerAnimation {
    /// Standing still
    Idle,
    /// Moving on the ground
    Running,
    /// Airborne and rising
    Jumping,
    /// Airborne and falling
    Falling,
}

/// The player-controlled character.
#[derive(Debug, Clone)]
pub struct Player {
    body: Body,
    physics_body: Option<PhysicsBody>,
    facing: i8,
    on_ground: bool,
    was_on_ground: bool,
    moving: bool,

    speed: f32,
    jump_speed: f32,
    friction: f32,
    air_resistance: f32,
    jump_buffer_time: f32,
    coyote_time: f32,
    jump_buffer_timer: f32,
    coyote_timer: f32,

    power_level: u8,
    invulnerable: bool,
    invulnerable_timer: f32,
    damage_invulnerability: f32,
    animation: PlayerAnimation,
}

impl Player {
    /// Creates a small player centred at `position`.
    #[must_use]
    pub fn new(position: Vec2, config: &PlayerConfig) -> Self {
        Self {
            body: Body::square(position, config.size),
            physics_body: None,
            facing: 1,
            on_ground: false,
            was_on_ground: false,
            moving: false,
            speed: config.move_speed,
            jump_speed: config.jump_speed,
            friction: config.friction,
            air_resistance: config.air_resistance,
            jump_buffer_time: config.jump_buffer_time,
            coyote_time: config.coyote_time,
            jump_buffer_timer: 0.0,
            coyote_timer: 0.0,
            power_level: 0,
            invulnerable: false,
            invulnerable_timer: 0.0,
            damage_invulnerability: config.damage_invulnerability,
            animation: PlayerAnimation::Idle,
        }
    }

    /// Attaches a force/impulse component.
    #[must_use]
    pub fn with_physics_body(mut self, physics_body: PhysicsBody) -> Self {
        self.physics_body = Some(physics_body);
        self
    }

    /// Returns the attached force/impulse component.
    #[must_use]
    pub fn physics_body(&self) -> Option<&PhysicsBody> {
        self.physics_body.as_ref()
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

    /// Returns the facing direction (+1 right, -1 left).
    #[must_use]
    pub fn facing(&self) -> i8 {
        self.facing
    }

    /// Returns whether the player stood on a surface after the last physics update.
    #[must_use]
    pub fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    /// Returns whether horizontal input is held.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Seconds left in the jump buffer.
    #[must_use]
    pub fn jump_buffer_timer(&self) -> f32 {
        self.jump_buffer_timer
    }

    /// Seconds left in the coyote window.
    #[must_use]
    pub fn coyote_timer(&self) -> f32 {
        self.coyote_timer
    }

    /// True while a buffered jump press is waiting.
    #[must_use]
    pub fn jump_buffered(&self) -> bool {
        self.jump_buffer_timer > 0.0
    }

    /// Returns the power level (0 small, 1 big, 2 fire).
    #[must_use]
    pub fn power_level(&self) -> u8 {
        self.power_level
    }

    /// Returns whether damage is currently ignored.
    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable
    }

    /// Returns the current animation.
    #[must_use]
    pub fn animation(&self) -> PlayerAnimation {
        self.animation
    }

    /// Returns what the renderer should draw.
    #[must_use]
    pub fn appearance(&self) -> Appearance {
        Appearance::Player {
            animation: self.animation,
            power_level: self.power_level,
            flashing: self.invulnerable,
            facing: self.facing,
        }
    }

    /// Moves left at full speed.
    pub fn move_left(&mut self) {
        self.body.velocity.x = -self.speed;
        self.moving = true;
    }

    /// Moves right at full speed.
    pub fn move_right(&mut self) {
        self.body.velocity.x = self.speed;
        self.moving = true;
    }

    /// Releases horizontal input. Friction takes over.
    pub fn stop_moving(&mut self) {
        self.moving = false;
    }

    /// Arms the jump buffer and tries to jump immediately.
    ///
    /// Returns true when the jump fired.
    pub fn jump(&mut self) -> bool {
        self.jump_buffer_timer = self.jump_buffer_time;
        self.try_jump()
    }

    /// Fires a buffered jump if the player is grounded or within the coyote
    /// window.
    pub fn try_jump(&mut self) -> bool {
        let near_ground = self.on_ground || self.coyote_timer > 0.0;
        if !(near_ground && self.jump_buffer_timer > 0.0) {
            return false;
        }

        self.body.velocity.y = self.jump_speed;
        self.jump_buffer_timer = 0.0;
        self.coyote_timer = 0.0;
        self.on_ground = false;
        // Leaving the ground by jumping must not open a coyote window.
        self.was_on_ground = false;
        debug!("Player jumped at ({:.1}, {:.1})", self.body.position.x, self.body.position.y);
        true
    }

    /// Advances timers and applies horizontal damping.
    pub fn update(&mut self, delta_time: f32) {
        let dt = delta_time.max(0.0);

        self.jump_buffer_timer = (self.jump_buffer_timer - dt).max(0.0);
        if self.was_on_ground && !self.on_ground {
            self.coyote_timer = self.coyote_time;
        } else if self.on_ground {
            self.coyote_timer = 0.0;
        } else {
            self.coyote_timer = (self.coyote_timer - dt).max(0.0);
        }
        self.was_on_ground = self.on_ground;

        if let Some(physics_body) = self.physics_body.as_mut() {
            physics_body.integrate(&mut self.body, self.on_ground);
        }

        if !self.on_ground {
            self.body.velocity.x *= self.air_resistance;
        } else if !self.moving {
            self.body.velocity.x *= self.friction;
        }

        if self.body.velocity.x > 0.0 {
            self.facing = 1;
        } else if self.body.velocity.x < 0.0 {
            self.facing = -1;
        }

        if self.invulnerable {
            self.invulnerable_timer -= dt;
            if self.invulnerable_timer <= 0.0 {
                self.invulnerable = false;
                self.invulnerable_timer = 0.0;
            }
        }

        self.animation = if !self.on_ground {
            if self.body.velocity.y > 0.0 {
                PlayerAnimation::Jumping
            } else {
                PlayerAnimation::Falling
            }
        } else if self.body.velocity.x.abs() > RUN_THRESHOLD {
            PlayerAnimation::Running
        } else {
            PlayerAnimation::Idle
        };
    }

    /// Applies a hit.
    ///
    /// Returns true when the hit is fatal and the caller must take a life.
    pub fn take_damage(&mut self) -> bool {
        if self.invulnerable {
            return false;
        }

        if self.power_level > 0 {
            self.power_level -= 1;
            self.make_invulnerable(self.damage_invulnerability);
            debug!("Player powered down to level {}", self.power_level);
            false
        } else {
            true
        }
    }

    /// Raises the power level. Never lowers it.
    pub fn power_up(&mut self, level: u8) {
        let level = level.min(MAX_POWER_LEVEL);
        if level > self.power_level {
            self.power_level = level;
            debug!("Player powered up to level {}", level);
        }
    }

    /// Ignores damage for `duration` seconds.
    pub fn make_invulnerable(&mut self, duration: f32) {
        self.invulnerable = true;
        self.invulnerable_timer = duration;
    }

    /// Launches the player upward after a stomp.
    pub fn bounce(&mut self, height: f32) {
        self.body.velocity.y = height;
        self.on_ground = false;
    }

    /// Pushes the player away from a hazard.
    ///
    /// Uses the physics body when attached, otherwise sets the velocity.
    pub fn knockback(&mut self, direction: f32, speed: f32, lift: f32) {
        let kick = Vec2::new(direction.signum() * speed, lift);
        match self.physics_body.as_mut() {
            Some(physics_body) => {
                let mass = physics_body.mass();
                physics_body.apply_impulse(kick * mass);
            },
            None => self.body.velocity = kick,
        }
    }

    /// Moves the player to a checkpoint and clears transient state.
    pub fn reset_to_checkpoint(&mut self, position: Vec2) {
        self.body.position = position;
        self.body.velocity = Vec2::ZERO;
        self.on_ground = false;
        self.was_on_ground = false;
        self.moving = false;
        self.jump_buffer_timer = 0.0;
        self.coyote_timer = 0.0;
        self.invulnerable = false;
        self.invulnerable_timer = 0.0;
        self.animation = PlayerAnimation::Idle;
    }
}

impl Mover for Player {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn set_ground_state(&mut self, on_ground: bool) {
        self.on_ground = on_ground;
    }

    fn power_level(&self) -> u8 {
        self.power_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(Vec2::new(100.0, 48.0), &PlayerConfig::default())
    }

    fn exact_config() -> PlayerConfig {
        PlayerConfig {
            coyote_time: 0.25,
            jump_buffer_time: 0.25,
            ..PlayerConfig::default()
        }
    }

    #[test]
    fn test_player_creation() {
        let player = player();
        assert_eq!(player.position(), Vec2::new(100.0, 48.0));
        assert_eq!(player.bounds().bottom, 32.0);
        assert_eq!(player.facing(), 1);
        assert!(!player.is_on_ground());
        assert_eq!(player.power_level(), 0);
    }

    #[test]
    fn test_move_sets_velocity_and_facing() {
        let mut player = player();
        player.set_ground_state(true);

        player.move_left();
        assert_eq!(player.velocity().x, -5.0);
        player.update(0.125);
        assert_eq!(player.facing(), -1);
        assert_eq!(player.animation(), PlayerAnimation::Running);
    }

    #[test]
    fn test_friction_when_idle_on_ground() {
        let mut player = player();
        player.set_ground_state(true);
        player.move_right();
        player.stop_moving();

        player.update(0.125);
        assert_eq!(player.velocity().x, 4.0);
    }

    #[test]
    fn test_air_resistance_when_airborne() {
        let mut player = player();
        player.move_right();
        player.update(0.125);
        assert_eq!(player.velocity().x, 4.75);
    }

    #[test]
    fn test_jump_on_ground() {
        let mut player = player();
        player.set_ground_state(true);

        assert!(player.jump());
        assert_eq!(player.velocity().y, 16.0);
        assert!(!player.is_on_ground());
        assert!(!player.jump_buffered());
        assert_eq!(player.coyote_timer(), 0.0);
    }

    #[test]
    fn test_jump_in_air_is_buffered() {
        let mut player = player();
        assert!(!player.jump());
        assert!(player.jump_buffered());

        player.set_ground_state(true);
        player.update(1.0 / 60.0);
        assert!(player.try_jump());
    }

    #[test]
    fn test_buffer_expires() {
        let mut player = Player::new(Vec2::ZERO, &exact_config());
        assert!(!player.jump());

        player.update(0.125);
        player.update(0.125);
        assert!(!player.jump_buffered());
        player.set_ground_state(true);
        assert!(!player.try_jump());
    }

    #[test]
    fn test_coyote_window_after_walking_off() {
        let mut player = Player::new(Vec2::ZERO, &exact_config());
        player.set_ground_state(true);
        player.update(0.125);

        // Walked off the ledge.
        player.set_ground_state(false);
        player.update(0.125);
        assert_eq!(player.coyote_timer(), 0.25);
        player.update(0.125);
        assert_eq!(player.coyote_timer(), 0.125);

        assert!(player.jump());
        assert_eq!(player.velocity().y, 16.0);
    }

    #[test]
    fn test_coyote_window_closes() {
        let mut player = Player::new(Vec2::ZERO, &exact_config());
        player.set_ground_state(true);
        player.update(0.125);
        player.set_ground_state(false);
        player.update(0.125);
        player.update(0.125);
        player.update(0.125);

        assert_eq!(player.coyote_timer(), 0.0);
        assert!(!player.jump());
        assert_eq!(player.velocity().y, 0.0);
    }

    #[test]
    fn test_coyote_not_armed_while_continuously_airborne() {
        let mut player = player();
        for _ in 0..5 {
            player.update(0.125);
            assert_eq!(player.coyote_timer(), 0.0);
        }
    }

    #[test]
    fn test_jump_does_not_open_coyote_window() {
        let mut player = player();
        player.set_ground_state(true);
        player.update(0.125);
        assert!(player.jump());

        player.set_ground_state(false);
        player.update(0.125);
        assert_eq!(player.coyote_timer(), 0.0);
        assert!(!player.jump());
    }

    #[test]
    fn test_take_damage_small_dies() {
        let mut player = player();
        assert!(player.take_damage());
    }

    #[test]
    fn test_take_damage_powered_down() {
        let mut player = player();
        player.power_up(2);

        assert!(!player.take_damage());
        assert_eq!(player.power_level(), 1);
        assert!(player.is_invulnerable());

        // Ignored while invulnerable.
        assert!(!player.take_damage());
        assert_eq!(player.power_level(), 1);
    }

    #[test]
    fn test_invulnerability_expires() {
        let mut player = player();
        player.make_invulnerable(0.25);
        player.update(0.125);
        assert!(player.is_invulnerable());
        player.update(0.125);
        assert!(!player.is_invulnerable());
    }

    #[test]
    fn test_power_up_never_lowers() {
        let mut player = player();
        player.power_up(2);
        player.power_up(1);
        assert_eq!(player.power_level(), 2);
        player.power_up(9);
        assert_eq!(player.power_level(), MAX_POWER_LEVEL);
    }

    #[test]
    fn test_bounce_and_animation() {
        let mut player = player();
        player.set_ground_state(true);
        player.bounce(8.0);
        player.update(0.125);
        assert_eq!(player.velocity().y, 8.0);
        assert_eq!(player.animation(), PlayerAnimation::Jumping);
    }

    #[test]
    fn test_knockback_through_physics_body() {
        let mut player = player().with_physics_body(PhysicsBody::new(2.0));
        player.knockback(-1.0, 6.0, 4.0);
        player.update(0.125);

        // Airborne, so air resistance applies after the impulse.
        assert_eq!(player.velocity().x, -6.0 * 0.95);
        assert_eq!(player.velocity().y, 4.0);
    }

    #[test]
    fn test_reset_to_checkpoint() {
        let mut player = player();
        player.move_right();
        player.make_invulnerable(2.0);
        player.reset_to_checkpoint(Vec2::new(10.0, 20.0));

        assert_eq!(player.position(), Vec2::new(10.0, 20.0));
        assert_eq!(player.velocity(), Vec2::ZERO);
        assert!(!player.is_invulnerable());
        assert!(!player.is_moving());
    }

    #[test]
    fn test_appearance_reports_power() {
        let mut player = player();
        player.power_up(1);
        assert_eq!(player.appearance().texture_key(), "player_big");
    }
}
