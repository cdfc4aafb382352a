//! Kinematic bodies and the optional force-integration component.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::collision::{Aabb, CollisionSide};

/// Position, velocity, and box of anything that moves through the level.
///
/// Velocities are in units per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Center position
    pub position: Vec2,
    /// Velocity in units per frame
    pub velocity: Vec2,
    /// Half of the box size
    pub half_extents: Vec2,
}

impl Body {
    /// Creates a body at rest.
    #[must_use]
    pub fn new(position: Vec2, half_extents: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            half_extents,
        }
    }

    /// Creates a square body from its full side length.
    #[must_use]
    pub fn square(position: Vec2, size: f32) -> Self {
        Self::new(position, Vec2::splat(size / 2.0))
    }

    /// Sets the initial velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Returns the current bounding box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position, self.half_extents)
    }

    /// Returns the full size of the box.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }

    /// Places the body so its bottom edge rests at `y`.
    pub fn set_bottom(&mut self, y: f32) {
        self.position.y = y + self.half_extents.y;
    }
}

/// Force and impulse accumulator layered on top of a [`Body`].
///
/// Forces are integrated as accelerations (`force / mass`) once per frame and
/// then cleared. Impulses change velocity immediately on the next integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    mass: f32,
    /// Horizontal damping while grounded (1.0 disables)
    pub friction: f32,
    /// Horizontal damping while airborne (1.0 disables)
    pub air_resistance: f32,
    /// Fraction of velocity kept when bouncing off a surface
    pub bounce: f32,
    forces: Vec<Vec2>,
    impulses: Vec<Vec2>,
    previous_position: Vec2,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PhysicsBody {
    /// Creates a physics component with no damping.
    ///
    /// Non-positive or non-finite masses fall back to 1.0.
    #[must_use]
    pub fn new(mass: f32) -> Self {
        let mass = if mass.is_finite() && mass > 0.0 {
            mass
        } else {
            warn!("Invalid mass {}, using 1.0", mass);
            1.0
        };

        Self {
            mass,
            friction: 1.0,
            air_resistance: 1.0,
            bounce: 0.0,
            forces: Vec::new(),
            impulses: Vec::new(),
            previous_position: Vec2::ZERO,
        }
    }

    /// Sets damping coefficients.
    #[must_use]
    pub fn with_damping(mut self, friction: f32, air_resistance: f32) -> Self {
        self.friction = friction;
        self.air_resistance = air_resistance;
        self
    }

    /// Sets the bounce coefficient.
    #[must_use]
    pub fn with_bounce(mut self, bounce: f32) -> Self {
        self.bounce = bounce;
        self
    }

    /// Returns the mass.
    #[must_use]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Queues a continuous force for the next integration.
    pub fn add_force(&mut self, force: Vec2) {
        self.forces.push(force);
    }

    /// Queues an instantaneous velocity change scaled by mass.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.impulses.push(impulse);
    }

    /// True when forces or impulses are waiting to be integrated.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.forces.is_empty() || !self.impulses.is_empty()
    }

    /// Integrates queued forces and impulses into the body velocity and
    /// applies damping. Clears the queues.
    pub fn integrate(&mut self, body: &mut Body, on_ground: bool) {
        self.previous_position = body.position;

        let force: Vec2 = self.forces.drain(..).sum();
        let impulse: Vec2 = self.impulses.drain(..).sum();
        body.velocity += (force + impulse) / self.mass;

        body.velocity.x *= if on_ground {
            self.friction
        } else {
            self.air_resistance
        };
    }

    /// Distance the body moved since the last integration.
    #[must_use]
    pub fn frame_delta(&self, body: &Body) -> Vec2 {
        body.position - self.previous_position
    }

    /// Reflects the velocity component heading into a struck side.
    pub fn reflect(&self, body: &mut Body, side: CollisionSide) {
        if side.is_horizontal() {
            body.velocity.x = -body.velocity.x * self.bounce;
        } else {
            body.velocity.y = -body.velocity.y * self.bounce;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_bounds() {
        let body = Body::square(Vec2::new(50.0, 100.0), 32.0);
        let bounds = body.bounds();
        assert_eq!(bounds.bottom, 84.0);
        assert_eq!(bounds.right, 66.0);
        assert_eq!(body.size(), Vec2::splat(32.0));
    }

    #[test]
    fn test_set_bottom() {
        let mut body = Body::square(Vec2::ZERO, 32.0);
        body.set_bottom(64.0);
        assert_eq!(body.position.y, 80.0);
    }

    #[test]
    fn test_impulse_scaled_by_mass() {
        let mut body = Body::square(Vec2::ZERO, 10.0);
        let mut physics = PhysicsBody::new(2.0);
        physics.apply_impulse(Vec2::new(8.0, 4.0));
        physics.integrate(&mut body, false);

        assert_eq!(body.velocity, Vec2::new(4.0, 2.0));
        assert!(!physics.has_pending());
    }

    #[test]
    fn test_forces_cleared_after_integration() {
        let mut body = Body::square(Vec2::ZERO, 10.0);
        let mut physics = PhysicsBody::new(1.0);
        physics.add_force(Vec2::new(1.0, 0.0));
        physics.add_force(Vec2::new(1.0, 0.0));
        physics.integrate(&mut body, true);
        physics.integrate(&mut body, true);

        assert_eq!(body.velocity.x, 2.0);
    }

    #[test]
    fn test_damping_depends_on_ground() {
        let mut physics = PhysicsBody::new(1.0).with_damping(0.5, 0.75);
        let mut grounded = Body::square(Vec2::ZERO, 10.0).with_velocity(Vec2::new(4.0, 0.0));
        let mut airborne = grounded;

        physics.integrate(&mut grounded, true);
        physics.integrate(&mut airborne, false);
        assert_eq!(grounded.velocity.x, 2.0);
        assert_eq!(airborne.velocity.x, 3.0);
    }

    #[test]
    fn test_invalid_mass_falls_back() {
        assert_eq!(PhysicsBody::new(0.0).mass(), 1.0);
        assert_eq!(PhysicsBody::new(f32::NAN).mass(), 1.0);
    }

    #[test]
    fn test_reflect() {
        let physics = PhysicsBody::new(1.0).with_bounce(0.5);
        let mut body = Body::square(Vec2::ZERO, 10.0).with_velocity(Vec2::new(6.0, -4.0));

        physics.reflect(&mut body, CollisionSide::Left);
        assert_eq!(body.velocity, Vec2::new(-3.0, -4.0));
        physics.reflect(&mut body, CollisionSide::Top);
        assert_eq!(body.velocity, Vec2::new(-3.0, 2.0));
    }

    #[test]
    fn test_frame_delta() {
        let mut body = Body::square(Vec2::new(1.0, 1.0), 10.0);
        let mut physics = PhysicsBody::default();
        physics.integrate(&mut body, false);
        body.position += Vec2::new(3.0, -2.0);
        assert_eq!(physics.frame_delta(&body), Vec2::new(3.0, -2.0));
    }
}
