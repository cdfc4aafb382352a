//! Axis-aligned collision utilities.
//!
//! Boxes use y-up coordinates: `bottom < top`, `left < right`.
//!
//! Side classification compares box *centres*, not edges. A small, fast
//! mover that ends a frame deep inside a large obstacle can therefore be
//! classified on the wrong side. There is no swept test to compensate.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::body::Body;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Left edge (minimum x)
    pub left: f32,
    /// Bottom edge (minimum y)
    pub bottom: f32,
    /// Right edge (maximum x)
    pub right: f32,
    /// Top edge (maximum y)
    pub top: f32,
}

impl Aabb {
    /// Creates a new box from its edges.
    #[must_use]
    pub const fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Creates a box from center and half-extents.
    #[must_use]
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            left: center.x - half_extents.x,
            bottom: center.y - half_extents.y,
            right: center.x + half_extents.x,
            top: center.y + half_extents.y,
        }
    }

    /// Returns the center of the box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) / 2.0,
            (self.bottom + self.top) / 2.0,
        )
    }

    /// Returns the width of the box.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Returns the height of the box.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// True when the box has finite edges and a positive area.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.left, self.bottom, self.right, self.top]
            .iter()
            .all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }

    /// Checks if this box overlaps another with non-zero area.
    ///
    /// Boxes that only touch along an edge do not overlap. Invalid boxes
    /// never overlap anything.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.is_valid()
            && other.is_valid()
            && self.left < other.right
            && self.right > other.left
            && self.bottom < other.top
            && self.top > other.bottom
    }

    /// Checks if a point lies inside the box (edges inclusive).
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.bottom && point.y <= self.top
    }

    /// Expands the box by a margin on all sides.
    #[must_use]
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            left: self.left - margin,
            bottom: self.bottom - margin,
            right: self.right + margin,
            top: self.top + margin,
        }
    }
}

/// Face of an obstacle that was struck by a mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionSide {
    /// Mover came from above (landed on it)
    Top,
    /// Mover came from below (bumped it)
    Bottom,
    /// Mover came from the left
    Left,
    /// Mover came from the right
    Right,
}

impl CollisionSide {
    /// True for `Left` and `Right`.
    #[must_use]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Axis a resolution corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// X axis
    Horizontal,
    /// Y axis
    Vertical,
}

/// Penetration depth and approach direction of an overlapping pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionInfo {
    /// Overlap depth along x
    pub overlap_x: f32,
    /// Overlap depth along y
    pub overlap_y: f32,
    /// Mover center is above the obstacle center
    pub from_above: bool,
    /// Mover center is below the obstacle center
    pub from_below: bool,
    /// Mover center is left of the obstacle center
    pub from_left: bool,
    /// Mover center is right of the obstacle center
    pub from_right: bool,
}

impl CollisionInfo {
    /// True when the x overlap is the smaller one.
    #[must_use]
    pub fn is_horizontal(&self) -> bool {
        self.overlap_x < self.overlap_y
    }

    /// Side struck along x.
    #[must_use]
    pub fn horizontal_side(&self) -> CollisionSide {
        if self.from_left {
            CollisionSide::Left
        } else {
            CollisionSide::Right
        }
    }

    /// Side struck along y.
    #[must_use]
    pub fn vertical_side(&self) -> CollisionSide {
        if self.from_above {
            CollisionSide::Top
        } else {
            CollisionSide::Bottom
        }
    }

    /// Side along the axis of least penetration.
    #[must_use]
    pub fn side(&self) -> CollisionSide {
        if self.is_horizontal() {
            self.horizontal_side()
        } else {
            self.vertical_side()
        }
    }
}

/// True iff the two boxes intersect with non-zero area.
#[must_use]
pub fn overlaps(a: &Aabb, b: &Aabb) -> bool {
    a.overlaps(b)
}

/// Computes overlap depths and centre-based direction flags.
///
/// Returns `None` when the boxes do not overlap.
#[must_use]
pub fn collision_info(mover: &Aabb, obstacle: &Aabb) -> Option<CollisionInfo> {
    if !mover.overlaps(obstacle) {
        return None;
    }

    let mover_center = mover.center();
    let obstacle_center = obstacle.center();

    Some(CollisionInfo {
        overlap_x: mover.right.min(obstacle.right) - mover.left.max(obstacle.left),
        overlap_y: mover.top.min(obstacle.top) - mover.bottom.max(obstacle.bottom),
        from_above: mover_center.y > obstacle_center.y,
        from_below: mover_center.y < obstacle_center.y,
        from_left: mover_center.x < obstacle_center.x,
        from_right: mover_center.x > obstacle_center.x,
    })
}

/// Pushes `mover` out of `obstacle` along the axis of least penetration.
///
/// Horizontal corrections always zero the x velocity. Vertical corrections
/// zero the y velocity only when the mover was heading into the obstacle.
pub fn resolve(mover: &mut Body, obstacle: &Aabb, info: &CollisionInfo) -> Axis {
    if info.is_horizontal() {
        mover.position.x = if info.from_left {
            obstacle.left - mover.half_extents.x
        } else {
            obstacle.right + mover.half_extents.x
        };
        mover.velocity.x = 0.0;
        Axis::Horizontal
    } else {
        resolve_vertical(mover, obstacle, info);
        Axis::Vertical
    }
}

/// Pushes `mover` out of `obstacle` along y only, whatever the overlap depths.
///
/// The y velocity is zeroed only when the mover was heading into the obstacle.
pub fn resolve_vertical(mover: &mut Body, obstacle: &Aabb, info: &CollisionInfo) {
    if info.from_above {
        mover.position.y = obstacle.top + mover.half_extents.y;
        if mover.velocity.y < 0.0 {
            mover.velocity.y = 0.0;
        }
    } else {
        mover.position.y = obstacle.bottom - mover.half_extents.y;
        if mover.velocity.y > 0.0 {
            mover.velocity.y = 0.0;
        }
    }
}

/// Returns every candidate box that overlaps `mover`, keeping input order.
pub fn query_overlaps<K>(
    mover: &Aabb,
    candidates: impl IntoIterator<Item = (K, Aabb)>,
) -> Vec<(K, Aabb)> {
    candidates
        .into_iter()
        .filter(|(_, aabb)| mover.overlaps(aabb))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn body_at(x: f32, y: f32, vx: f32, vy: f32) -> Body {
        Body::new(Vec2::new(x, y), Vec2::new(16.0, 16.0)).with_velocity(Vec2::new(vx, vy))
    }

    #[test]
    fn test_aabb_from_center() {
        let aabb = Aabb::from_center(Vec2::new(10.0, 10.0), Vec2::new(5.0, 10.0));
        assert_eq!(aabb.left, 5.0);
        assert_eq!(aabb.right, 15.0);
        assert_eq!(aabb.bottom, 0.0);
        assert_eq!(aabb.top, 20.0);
        assert_eq!(aabb.center(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_overlaps_requires_area() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(5.0, 5.0, 15.0, 15.0);
        let touching = Aabb::new(10.0, 0.0, 20.0, 10.0);
        let far = Aabb::new(20.0, 20.0, 30.0, 30.0);

        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
        assert!(!overlaps(&a, &touching));
        assert!(!overlaps(&a, &far));
    }

    #[test]
    fn test_zero_size_box_never_collides() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let flat = Aabb::new(2.0, 5.0, 8.0, 5.0);
        let nan = Aabb::new(f32::NAN, 0.0, 5.0, 5.0);

        assert!(!overlaps(&a, &flat));
        assert!(!overlaps(&a, &nan));
        assert!(collision_info(&a, &flat).is_none());
    }

    #[test]
    fn test_collision_info_depths_and_flags() {
        let mover = Aabb::new(0.0, 8.0, 10.0, 18.0);
        let ground = Aabb::new(-20.0, -10.0, 40.0, 10.0);
        let info = collision_info(&mover, &ground).expect("should overlap");

        assert_eq!(info.overlap_x, 10.0);
        assert_eq!(info.overlap_y, 2.0);
        assert!(info.from_above);
        assert!(!info.from_below);
        assert!(!info.is_horizontal());
        assert_eq!(info.side(), CollisionSide::Top);
    }

    #[test]
    fn test_center_classification_misreads_deep_corner() {
        // A small mover that ended deep in the lower-right quadrant of a big
        // block is classified as coming from below and the right, regardless
        // of where it entered.
        let block = Aabb::new(0.0, 0.0, 100.0, 100.0);
        let mover = Aabb::new(70.0, 20.0, 80.0, 30.0);
        let info = collision_info(&mover, &block).expect("should overlap");

        assert!(info.from_below);
        assert!(info.from_right);
        assert_eq!(info.vertical_side(), CollisionSide::Bottom);
    }

    #[test]
    fn test_resolve_landing() {
        // 32x32 player at y=100 falling at -5 onto a platform whose top is 84.
        let mut player = body_at(50.0, 100.0, 0.0, -5.0);
        player.position.y += player.velocity.y;
        let platform = Aabb::new(0.0, 52.0, 200.0, 84.0);

        let info = collision_info(&player.bounds(), &platform).expect("should overlap");
        let axis = resolve(&mut player, &platform, &info);

        assert_eq!(axis, Axis::Vertical);
        assert_eq!(player.bounds().bottom, 84.0);
        assert_eq!(player.velocity.y, 0.0);
    }

    #[test]
    fn test_resolve_keeps_velocity_moving_away() {
        // Rising while corrected upward: velocity is not zeroed.
        let mut body = body_at(0.0, 30.0, 0.0, 3.0);
        let obstacle = Aabb::new(-50.0, -10.0, 50.0, 20.0);
        let info = collision_info(&body.bounds(), &obstacle).expect("should overlap");

        resolve(&mut body, &obstacle, &info);
        assert_eq!(body.velocity.y, 3.0);
        assert_eq!(body.bounds().bottom, 20.0);
    }

    #[test]
    fn test_resolve_horizontal_zeroes_x() {
        let mut body = body_at(10.0, 0.0, 5.0, -1.0);
        let wall = Aabb::new(24.0, -100.0, 56.0, 100.0);
        let info = collision_info(&body.bounds(), &wall).expect("should overlap");

        assert_eq!(resolve(&mut body, &wall, &info), Axis::Horizontal);
        assert_eq!(body.bounds().right, 24.0);
        assert_eq!(body.velocity.x, 0.0);
        assert_eq!(body.velocity.y, -1.0);
    }

    #[test]
    fn test_resolve_vertical_ignores_shallow_x_overlap() {
        // Just past a tile seam: the x overlap is the smaller one.
        let mut body = body_at(15.6, 15.2, 1.2, -0.8);
        let tile = Aabb::new(-32.0, -32.0, 0.0, 0.0);
        let info = collision_info(&body.bounds(), &tile).expect("should overlap");
        assert!(info.is_horizontal());

        resolve_vertical(&mut body, &tile, &info);
        assert_eq!(body.bounds().bottom, 0.0);
        assert_eq!(body.velocity, Vec2::new(1.2, 0.0));
    }

    #[test]
    fn test_query_overlaps() {
        let mover = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let hits = query_overlaps(
            &mover,
            vec![
                (1, Aabb::new(5.0, 5.0, 15.0, 15.0)),
                (2, Aabb::new(50.0, 50.0, 60.0, 60.0)),
                (3, Aabb::new(-5.0, -5.0, 1.0, 1.0)),
            ],
        );
        let ids: Vec<_> = hits.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    proptest! {
        #[test]
        fn prop_resolve_clears_corrected_axis(
            mx in -200i16..200, my in -200i16..200,
            mw in 1i16..64, mh in 1i16..64,
            ox in -200i16..200, oy in -200i16..200,
            ow in 1i16..128, oh in 1i16..128,
            vx in -20i16..20, vy in -20i16..20,
        ) {
            let mut body = Body::new(
                Vec2::new(f32::from(mx), f32::from(my)),
                Vec2::new(f32::from(mw), f32::from(mh)),
            ).with_velocity(Vec2::new(f32::from(vx), f32::from(vy)));
            let obstacle = Aabb::from_center(
                Vec2::new(f32::from(ox), f32::from(oy)),
                Vec2::new(f32::from(ow), f32::from(oh)),
            );

            if let Some(info) = collision_info(&body.bounds(), &obstacle) {
                let axis = resolve(&mut body, &obstacle, &info);
                let after = body.bounds();
                let depth = match axis {
                    Axis::Horizontal => after.right.min(obstacle.right) - after.left.max(obstacle.left),
                    Axis::Vertical => after.top.min(obstacle.top) - after.bottom.max(obstacle.bottom),
                };
                prop_assert!(depth <= 0.0);
                prop_assert!(!after.overlaps(&obstacle));
            }
        }

        #[test]
        fn prop_overlap_is_symmetric(
            ax in -100i16..100, ay in -100i16..100, bx in -100i16..100, by in -100i16..100,
        ) {
            let a = Aabb::from_center(Vec2::new(f32::from(ax), f32::from(ay)), Vec2::splat(16.0));
            let b = Aabb::from_center(Vec2::new(f32::from(bx), f32::from(by)), Vec2::splat(16.0));
            prop_assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
        }
    }
}
