//! # Platformer Common
//!
//! Common types and shared abstractions for the platformer crates.
//!
//! This crate provides foundational types used across the simulation:
//! - Math types (`Vec2`, re-exported from glam)
//! - Generational arena storage with typed handles
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod arena;
pub mod error;
pub mod ids;

pub use glam::Vec2;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::arena::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use glam::Vec2;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_distinct() {
        let mut arena: Arena<u32> = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_stale_handle_is_not_found() {
        let mut arena: Arena<&str> = Arena::new();
        let handle = arena.insert("goomba");
        assert!(arena.remove(handle).is_ok());

        let err = arena.try_get(handle).expect_err("removed handle must not resolve");
        assert!(matches!(err, ArenaError::NotFound { .. }));
    }
}
