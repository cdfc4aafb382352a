//! Command-line options and the frame loop.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use platformer_common::PlatformerError;
use platformer_core::{
    FrameReport, GameConfig, GameEvent, Replay, Simulation, SoundEvent, SoundSink, CONFIG_FILE,
};

use crate::autopilot::Autopilot;

/// Options for one run.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "platformer")]
#[command(about = "Headless platformer simulation runner")]
pub struct RunOptions {
    /// Configuration file
    #[arg(long, default_value = CONFIG_FILE)]
    pub config: PathBuf,
    /// Frames to simulate with the autopilot
    #[arg(long, default_value_t = 600)]
    pub frames: u64,
    /// Simulation seed
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// Fixed time step in seconds
    #[arg(long = "dt", default_value_t = 1.0 / 60.0, value_parser = parse_delta_time)]
    pub delta_time: f32,
    /// Write the run as a replay
    #[arg(long, conflicts_with = "replay")]
    pub record: Option<PathBuf>,
    /// Play back a replay instead of the autopilot
    #[arg(long)]
    pub replay: Option<PathBuf>,
    /// Emit JSON log lines
    #[arg(long)]
    pub log_json: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::parse_from(["platformer"])
    }
}

fn parse_delta_time(value: &str) -> Result<f32, String> {
    let dt: f32 = value.parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
    if dt.is_finite() && dt > 0.0 {
        Ok(dt)
    } else {
        Err(format!("must be positive, got {dt}"))
    }
}

/// Sound collaborator that only logs.
#[derive(Debug, Default)]
struct LogSink {
    played: u64,
}

impl SoundSink for LogSink {
    fn play(&mut self, sound: SoundEvent) {
        self.played += 1;
        debug!("Sound: {}", sound.name());
    }
}

/// Totals reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames simulated
    pub frames: u64,
    /// Final score
    pub score: u64,
    /// Lives left
    pub lives: u32,
    /// Enemies defeated
    pub enemies_defeated: u32,
    /// Coins collected
    pub coins_collected: u32,
    /// Sounds triggered
    pub sounds: u64,
    /// Level goal reached
    pub level_complete: bool,
}

/// Runs the simulation according to `options`.
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    let summary = match &options.replay {
        Some(path) => run_replay(path)?,
        None => run_autopilot(options)?,
    };

    info!(
        "Ran {} frames: score {}, lives {}, {} enemies defeated, {} coins, {} sounds{}",
        summary.frames,
        summary.score,
        summary.lives,
        summary.enemies_defeated,
        summary.coins_collected,
        summary.sounds,
        if summary.level_complete {
            ", level complete"
        } else {
            ""
        }
    );
    Ok(summary)
}

fn run_autopilot(options: &RunOptions) -> Result<RunSummary> {
    let config = GameConfig::load_from(&options.config);
    let mut sim = Simulation::new(config, None, options.seed);
    let mut replay = options.record.as_ref().map(|_| Replay::for_simulation(&sim));
    let mut pilot = Autopilot::default();
    let mut sink = LogSink::default();
    let mut last: Option<FrameReport> = None;

    for frame in 0..options.frames {
        let input = pilot.next_input(frame, last.as_ref());
        let report = match replay.as_mut() {
            Some(replay) => replay.record(&mut sim, input, options.delta_time),
            None => sim.step(&input, options.delta_time),
        };
        drain_events(&sim, &mut sink);

        if report.game_over {
            warn!("Game over after {} frames", frame + 1);
            break;
        }
        if report.level_complete {
            break;
        }
        last = Some(report);
    }

    if let (Some(path), Some(replay)) = (&options.record, &replay) {
        let file = File::create(path)
            .with_context(|| format!("Failed to create replay file {}", path.display()))?;
        replay.save(BufWriter::new(file)).map_err(PlatformerError::from)?;
        info!("Recorded {} frames to {}", replay.frame_count(), path.display());
    }

    Ok(summarize(&sim, sink.played))
}

fn run_replay(path: &Path) -> Result<RunSummary> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open replay file {}", path.display()))?;
    let replay = Replay::load(BufReader::new(file)).map_err(PlatformerError::from)?;
    info!(
        "Replaying {} frames ({:.1}s, seed {})",
        replay.frame_count(),
        replay.duration(),
        replay.seed
    );

    let sim = replay.play(None).map_err(PlatformerError::from)?;
    let mut sink = LogSink::default();
    drain_events(&sim, &mut sink);
    Ok(summarize(&sim, sink.played))
}

fn drain_events(sim: &Simulation, sink: &mut LogSink) {
    for event in sim.events().forward_sounds(sink) {
        match event {
            GameEvent::Sound(_) => {},
            GameEvent::PlayerDied { lives_left } => info!("Player died, {} lives left", lives_left),
            GameEvent::BlockDestroyed { position, .. } => {
                debug!("Brick broken at ({:.0}, {:.0})", position.x, position.y);
            },
            other => debug!("Event: {:?}", other),
        }
    }
}

fn summarize(sim: &Simulation, sounds: u64) -> RunSummary {
    RunSummary {
        frames: sim.frame(),
        score: sim.score(),
        lives: sim.lives(),
        enemies_defeated: sim.enemies().stats().defeated,
        coins_collected: sim.coins().stats().collected,
        sounds,
        level_complete: sim.is_level_complete(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(list: &[&str]) -> Result<RunOptions, clap::Error> {
        RunOptions::try_parse_from(std::iter::once("platformer").chain(list.iter().copied()))
    }

    #[test]
    fn test_parse_defaults() {
        let options = parse(&[]).expect("should parse");
        assert_eq!(options, RunOptions::default());
        assert_eq!(options.config, PathBuf::from("platformer.toml"));
        assert_eq!(options.frames, 600);
        assert_eq!(options.delta_time, 1.0 / 60.0);
    }

    #[test]
    fn test_parse_flags() {
        let options = parse(&[
            "--frames", "120", "--seed", "9", "--dt", "0.125", "--log-json",
        ])
        .expect("should parse");
        assert_eq!(options.frames, 120);
        assert_eq!(options.seed, 9);
        assert_eq!(options.delta_time, 0.125);
        assert!(options.log_json);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse(&["--frames"]).is_err());
        assert!(parse(&["--frames", "lots"]).is_err());
        assert!(parse(&["--dt", "0"]).is_err());
        assert!(parse(&["--dt", "-0.5"]).is_err());
        assert!(parse(&["--fly"]).is_err());
        assert!(parse(&["--record", "a", "--replay", "b"]).is_err());
    }

    #[test]
    fn test_record_then_replay() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.json");

        let recorded = run(&RunOptions {
            config: dir.path().join("missing.toml"),
            frames: 120,
            seed: 4,
            record: Some(path.clone()),
            ..RunOptions::default()
        })
        .expect("autopilot run");

        let replayed = run(&RunOptions {
            replay: Some(path),
            ..RunOptions::default()
        })
        .expect("replay run");

        assert_eq!(replayed.frames, recorded.frames);
        assert_eq!(replayed.score, recorded.score);
        assert_eq!(replayed.lives, recorded.lives);
    }
}
