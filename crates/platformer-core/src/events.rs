//! Event bus for notifying collaborators outside the simulation.
//!
//! Publishing never blocks: when the bus is full, new events are dropped.

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::coin::CoinId;
use crate::enemy::{EnemyId, GoombaVariant};
use crate::tile::TileId;

/// Named sound triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEvent {
    /// Player jumped
    Jump,
    /// Player landed
    Land,
    /// Coin collected
    Coin,
    /// Enemy stomped
    Stomp,
    /// Enemy killed
    EnemyDeath,
    /// Enemy hurt but alive
    EnemyHit,
    /// Player lost a power level
    PlayerHurt,
    /// Player lost a life
    Death,
    /// Player powered up
    Powerup,
    /// Block bumped or activated
    BlockBump,
    /// Brick broken
    BlockBreak,
}

impl SoundEvent {
    /// Stable name used to look up the sound asset.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Jump => "jump",
            Self::Land => "land",
            Self::Coin => "coin",
            Self::Stomp => "stomp",
            Self::EnemyDeath => "enemy_death",
            Self::EnemyHit => "enemy_hit",
            Self::PlayerHurt => "player_hurt",
            Self::Death => "death",
            Self::Powerup => "powerup",
            Self::BlockBump => "block_bump",
            Self::BlockBreak => "block_break",
        }
    }
}

/// Something that plays sounds.
///
/// The simulation runs identically with or without one.
pub trait SoundSink {
    /// Plays a sound.
    fn play(&mut self, sound: SoundEvent);
}

impl SoundSink for Vec<SoundEvent> {
    fn play(&mut self, sound: SoundEvent) {
        self.push(sound);
    }
}

/// Event types that can be sent through the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A sound should play
    Sound(SoundEvent),
    /// Player stomped an enemy
    EnemyStomped {
        /// Stomped enemy
        enemy: EnemyId,
        /// The stomp killed it
        died: bool,
        /// Score awarded
        score: u32,
    },
    /// Enemy killed
    EnemyDefeated {
        /// Killed enemy
        enemy: EnemyId,
        /// Its variant
        variant: GoombaVariant,
    },
    /// Enemy removed from the level
    EnemyRemoved {
        /// Removed enemy
        enemy: EnemyId,
    },
    /// Player was hit
    PlayerDamaged {
        /// Power level after the hit
        power_level: u8,
    },
    /// Player lost a life
    PlayerDied {
        /// Lives left
        lives_left: u32,
    },
    /// No lives left
    GameOver {
        /// Final score
        score: u64,
    },
    /// Coin collected
    CoinCollected {
        /// Collected coin
        coin: CoinId,
        /// Score value
        value: u32,
    },
    /// Question block spent
    BlockActivated {
        /// Tile
        tile: TileId,
        /// Tile center
        position: Vec2,
    },
    /// Brick broken
    BlockDestroyed {
        /// Tile
        tile: TileId,
        /// Tile center
        position: Vec2,
    },
}

/// Event bus for decoupled communication.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: GameEvent) {
        if self.sender.try_send(event).is_err() {
            trace!("Event bus full, dropping event");
        }
    }

    /// Publishes a sound trigger.
    pub fn play(&self, sound: SoundEvent) {
        self.publish(GameEvent::Sound(sound));
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Drains all pending events and plays the sound triggers on `sink`.
    ///
    /// Returns every drained event, sounds included.
    pub fn forward_sounds(&self, sink: &mut dyn SoundSink) -> Vec<GameEvent> {
        let events = self.drain();
        for event in &events {
            if let GameEvent::Sound(sound) = event {
                sink.play(*sound);
            }
        }
        events
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<GameEvent> {
        self.sender.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        bus.play(SoundEvent::Jump);
        bus.publish(GameEvent::PlayerDied { lives_left: 2 });

        assert_eq!(bus.pending_count(), 2);
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], GameEvent::Sound(SoundEvent::Jump));
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops_events() {
        let bus = EventBus::new(2);
        for _ in 0..5 {
            bus.play(SoundEvent::Coin);
        }
        assert_eq!(bus.drain().len(), 2);
    }

    #[test]
    fn test_forward_sounds() {
        let bus = EventBus::default();
        bus.play(SoundEvent::Stomp);
        bus.publish(GameEvent::PlayerDied { lives_left: 0 });
        bus.play(SoundEvent::Death);

        let mut played: Vec<SoundEvent> = Vec::new();
        let events = bus.forward_sounds(&mut played);
        assert_eq!(events.len(), 3);
        assert_eq!(played, vec![SoundEvent::Stomp, SoundEvent::Death]);
    }

    #[test]
    fn test_sender_handle() {
        let bus = EventBus::new(4);
        let sender = bus.sender();
        sender
            .send(GameEvent::Sound(SoundEvent::Land))
            .expect("should send");
        assert_eq!(bus.drain(), vec![GameEvent::Sound(SoundEvent::Land)]);
    }

    #[test]
    fn test_sound_names() {
        assert_eq!(SoundEvent::EnemyDeath.name(), "enemy_death");
        assert_eq!(SoundEvent::BlockBreak.name(), "block_break");
    }
}
