//! Input recording and deterministic playback.
//!
//! A [`Replay`] stores the seed, the configuration and every frame's input
//! and `delta_time`. Playing it back through a fresh [`Simulation`] must
//! reproduce the recorded state hashes exactly.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use platformer_common::PlatformerError;

use crate::config::GameConfig;
use crate::input::FrameInput;
use crate::level::LevelProvider;
use crate::simulation::{FrameReport, Simulation};

/// Default number of frames between recorded state hashes.
pub const DEFAULT_HASH_INTERVAL: u64 = 60;

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Failed to serialize
    #[error("Failed to serialize replay: {0}")]
    Serialization(String),

    /// Failed to deserialize
    #[error("Failed to deserialize replay: {0}")]
    Deserialization(String),

    /// Playback produced a different state
    #[error("Replay diverged at frame {frame}: expected {expected:#018x}, got {actual:#018x}")]
    Diverged {
        /// Frame at which the hashes differ
        frame: u64,
        /// Recorded hash
        expected: u64,
        /// Hash produced on playback
        actual: u64,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ReplayError> for PlatformerError {
    fn from(err: ReplayError) -> Self {
        match err {
            ReplayError::Diverged { frame, .. } => Self::ReplayDiverged { frame },
            ReplayError::Io(e) => Self::Io(e),
            other => Self::Serialization(other.to_string()),
        }
    }
}

/// One recorded frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Input for the frame
    pub input: FrameInput,
    /// Time step used
    pub delta_time: f32,
}

/// Checkpoint hash taken after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateHash {
    /// Frame count after stepping
    pub frame: u64,
    /// [`Simulation::state_hash`] at that point
    pub hash: u64,
}

/// A recorded play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    /// Simulation seed
    pub seed: u64,
    /// Configuration the session ran with
    pub config: GameConfig,
    /// Every frame in order
    pub frames: Vec<InputFrame>,
    /// Periodic state hashes
    pub state_hashes: Vec<StateHash>,
    /// Frames between state hashes
    pub hash_interval: u64,
}

impl Replay {
    /// Starts an empty recording for a simulation built from `seed` and `config`.
    #[must_use]
    pub fn new(seed: u64, config: GameConfig) -> Self {
        Self {
            seed,
            config,
            frames: Vec::new(),
            state_hashes: Vec::new(),
            hash_interval: DEFAULT_HASH_INTERVAL,
        }
    }

    /// Sets how often state hashes are recorded.
    #[must_use]
    pub fn with_hash_interval(mut self, interval: u64) -> Self {
        self.hash_interval = interval.max(1);
        self
    }

    /// Starts a recording matching an existing, unstepped simulation.
    #[must_use]
    pub fn for_simulation(sim: &Simulation) -> Self {
        Self::new(sim.seed(), sim.config().clone())
    }

    /// Steps `sim` and records the frame.
    pub fn record(&mut self, sim: &mut Simulation, input: FrameInput, delta_time: f32) -> FrameReport {
        let report = sim.step(&input, delta_time);
        self.frames.push(InputFrame { input, delta_time });

        let frame = sim.frame();
        if frame % self.hash_interval == 0 {
            self.state_hashes.push(StateHash {
                frame,
                hash: sim.state_hash(),
            });
        }
        report
    }

    /// Number of recorded frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Total recorded time in seconds.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.frames.iter().map(|f| f.delta_time).sum()
    }

    /// Replays every frame through a fresh simulation, checking each hash.
    pub fn play(&self, provider: Option<&dyn LevelProvider>) -> Result<Simulation, ReplayError> {
        let mut sim = Simulation::new(self.config.clone(), provider, self.seed);
        let mut checkpoints = self.state_hashes.iter().peekable();

        for frame in &self.frames {
            sim.step(&frame.input, frame.delta_time);

            while let Some(expected) = checkpoints.next_if(|h| h.frame <= sim.frame()) {
                if expected.frame != sim.frame() {
                    continue;
                }
                let actual = sim.state_hash();
                if actual != expected.hash {
                    return Err(ReplayError::Diverged {
                        frame: expected.frame,
                        expected: expected.hash,
                        actual,
                    });
                }
                debug!("Replay checkpoint {} verified", expected.frame);
            }
        }

        info!("Replayed {} frames, {} checkpoints verified", self.frames.len(), self.state_hashes.len());
        Ok(sim)
    }

    /// Serializes to JSON.
    pub fn to_json(&self) -> Result<String, ReplayError> {
        serde_json::to_string(self).map_err(|e| ReplayError::Serialization(e.to_string()))
    }

    /// Deserializes from JSON.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        serde_json::from_str(json).map_err(|e| ReplayError::Deserialization(e.to_string()))
    }

    /// Writes the replay as JSON.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), ReplayError> {
        serde_json::to_writer(writer, self).map_err(|e| ReplayError::Serialization(e.to_string()))
    }

    /// Reads a JSON replay.
    pub fn load<R: Read>(reader: R) -> Result<Self, ReplayError> {
        serde_json::from_reader(reader).map_err(|e| ReplayError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::BufReader;

    const DT: f32 = 0.125;

    fn scripted(frame: usize) -> FrameInput {
        match frame % 30 {
            0 => FrameInput::right().with_jump(),
            1..=20 => FrameInput::right(),
            _ => FrameInput::left(),
        }
    }

    fn record(frames: usize) -> Replay {
        let mut sim = Simulation::new(GameConfig::default(), None, 7);
        let mut replay = Replay::for_simulation(&sim).with_hash_interval(10);
        for i in 0..frames {
            replay.record(&mut sim, scripted(i), DT);
        }
        replay
    }

    #[test]
    fn test_record_counts() {
        let replay = record(95);
        assert_eq!(replay.frame_count(), 95);
        assert_eq!(replay.state_hashes.len(), 9);
        assert_eq!(replay.duration(), 95.0 * DT);
    }

    #[test]
    fn test_playback_matches() {
        let replay = record(120);
        let sim = replay.play(None).expect("replay should match");
        assert_eq!(sim.frame(), 120);
        assert_eq!(sim.state_hash(), replay.state_hashes[11].hash);
    }

    #[test]
    fn test_tampered_replay_diverges() {
        let mut replay = record(60);
        replay.state_hashes[2].hash ^= 1;
        let err = replay.play(None).unwrap_err();
        assert!(matches!(err, ReplayError::Diverged { frame: 30, .. }));

        let common: PlatformerError = err.into();
        assert!(matches!(common, PlatformerError::ReplayDiverged { frame: 30 }));
    }

    #[test]
    fn test_json_roundtrip() {
        let replay = record(20);
        let json = replay.to_json().expect("should serialize");
        assert_eq!(Replay::from_json(&json).expect("should parse"), replay);
        assert!(Replay::from_json("{not json").is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let replay = record(40);
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.replay.json");

        replay.save(File::create(&path).expect("create")).expect("save");
        let loaded = Replay::load(BufReader::new(File::open(&path).expect("open"))).expect("load");

        assert_eq!(loaded, replay);
        loaded.play(None).expect("loaded replay should match");
    }
}
