//! Scripted input for smoke runs.

use platformer_core::{FrameInput, FrameReport};

/// Frames to keep holding jump after a wall stops the player.
const WALL_JUMP_HOLD: u32 = 8;

/// Runs right, jumps over walls and hops every so often.
#[derive(Debug, Clone)]
pub struct Autopilot {
    hop_interval: u64,
    wall_frames: u32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new(90)
    }
}

impl Autopilot {
    /// Creates an autopilot that hops every `hop_interval` frames.
    pub fn new(hop_interval: u64) -> Self {
        Self {
            hop_interval: hop_interval.max(1),
            wall_frames: 0,
        }
    }

    /// Chooses the input for `frame` given the previous frame's report.
    pub fn next_input(&mut self, frame: u64, last: Option<&FrameReport>) -> FrameInput {
        let input = FrameInput::right();

        if last.is_some_and(|r| r.on_wall) {
            self.wall_frames = WALL_JUMP_HOLD;
        }
        if self.wall_frames > 0 {
            self.wall_frames -= 1;
            return input.with_jump();
        }

        if frame % self.hop_interval == 0 {
            input.with_jump()
        } else {
            input
        }
    }
}
