//! Per-frame player input.

use serde::{Deserialize, Serialize};

/// Input state for one simulated frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameInput {
    /// Left held
    pub left: bool,
    /// Right held
    pub right: bool,
    /// Jump pressed this frame (edge, not level)
    pub jump: bool,
}

impl FrameInput {
    /// No input.
    pub const IDLE: Self = Self {
        left: false,
        right: false,
        jump: false,
    };

    /// Holding right.
    #[must_use]
    pub const fn right() -> Self {
        Self {
            left: false,
            right: true,
            jump: false,
        }
    }

    /// Holding left.
    #[must_use]
    pub const fn left() -> Self {
        Self {
            left: true,
            right: false,
            jump: false,
        }
    }

    /// Adds a jump press.
    #[must_use]
    pub const fn with_jump(mut self) -> Self {
        self.jump = true;
        self
    }

    /// Net horizontal direction: -1, 0, or +1. Opposing keys cancel.
    #[must_use]
    pub fn horizontal(&self) -> i8 {
        match (self.left, self.right) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }
}
