//! Collectible coins.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use platformer_common::{Arena, Handle};

use crate::appearance::Appearance;
use crate::collision::Aabb;
use crate::config::CoinConfig;

/// Stable identifier for a coin.
pub type CoinId = Handle<Coin>;

/// A coin collected this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoinPickup {
    /// Collected coin
    pub coin: CoinId,
    /// Score value
    pub value: u32,
    /// Where it was collected
    pub position: Vec2,
}

/// Aggregate coin statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinStats {
    /// Coins ever added since the last reset
    pub total: u32,
    /// Coins collected
    pub collected: u32,
    /// Sum of collected values
    pub value_collected: u64,
}

/// A single coin.
#[derive(Debug, Clone)]
pub struct Coin {
    position: Vec2,
    half_size: f32,
    value: u32,
    collected: bool,
    animation_time: f32,
    bob_offset: f32,
    collection_time: f32,
}

impl Coin {
    /// Creates a coin.
    #[must_use]
    pub fn new(position: Vec2, value: u32, size: f32) -> Self {
        Self {
            position,
            half_size: size / 2.0,
            value,
            collected: false,
            animation_time: 0.0,
            bob_offset: 0.0,
            collection_time: 0.0,
        }
    }

    /// Returns the center position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Returns the bounding box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position, Vec2::splat(self.half_size))
    }

    /// Returns the score value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Returns whether the coin has been collected.
    #[must_use]
    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Vertical draw offset of the idle bob.
    #[must_use]
    pub fn bob_offset(&self) -> f32 {
        self.bob_offset
    }

    /// Returns what the renderer should draw.
    #[must_use]
    pub fn appearance(&self) -> Appearance {
        Appearance::Coin {
            bob_offset: self.bob_offset,
            collected: self.collected,
        }
    }

    /// Marks the coin collected. Returns the value only the first time.
    pub fn collect(&mut self) -> Option<u32> {
        if self.collected {
            return None;
        }
        self.collected = true;
        self.collection_time = 0.0;
        Some(self.value)
    }

    /// True once the post-collection animation has finished.
    #[must_use]
    pub fn is_finished(&self, collection_duration: f32) -> bool {
        self.collected && self.collection_time >= collection_duration
    }

    /// Advances the animation and drifts toward a nearby player.
    pub fn update(&mut self, delta_time: f32, player_position: Option<Vec2>, config: &CoinConfig) {
        let dt = delta_time.max(0.0);
        self.animation_time += dt;

        if self.collected {
            self.collection_time += dt;
            return;
        }

        self.bob_offset = (self.animation_time * config.bounce_speed).sin() * config.bounce_height;

        if let Some(target) = player_position {
            let offset = target - self.position;
            let distance = offset.length();
            if distance > 0.0 && distance <= config.magnetic_range {
                self.position += offset / distance * config.magnetic_speed.min(distance);
            }
        }
    }
}

/// Owns every coin.
#[derive(Debug, Clone, Default)]
pub struct CoinManager {
    coins: Arena<Coin>,
    config: CoinConfig,
    total: u32,
    collected: u32,
    value_collected: u64,
}

impl CoinManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new(config: CoinConfig) -> Self {
        Self {
            coins: Arena::new(),
            config,
            total: 0,
            collected: 0,
            value_collected: 0,
        }
    }

    /// Number of coins, including ones still animating out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coins.len()
    }

    /// True when there are no coins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// Gets a coin.
    #[must_use]
    pub fn get(&self, id: CoinId) -> Option<&Coin> {
        self.coins.get(id)
    }

    /// Iterates over coins in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (CoinId, &Coin)> {
        self.coins.iter()
    }

    /// Adds a coin. `None` uses the configured value.
    pub fn add_coin(&mut self, position: Vec2, value: Option<u32>) -> CoinId {
        let value = value.unwrap_or(self.config.value);
        self.total += 1;
        self.coins.insert(Coin::new(position, value, self.config.size))
    }

    /// Animates coins and removes those whose collection animation finished.
    ///
    /// Returns the number of removed coins.
    pub fn update(&mut self, delta_time: f32, player_position: Option<Vec2>) -> usize {
        let config = &self.config;
        for (_, coin) in self.coins.iter_mut() {
            coin.update(delta_time, player_position, config);
        }

        let duration = self.config.collection_duration;
        self.coins.retain(|_, coin| !coin.is_finished(duration))
    }

    /// Collects every uncollected coin overlapping the player.
    pub fn check_player_collection(&mut self, player_bounds: &Aabb) -> Vec<CoinPickup> {
        let mut pickups = Vec::new();
        for (id, coin) in self.coins.iter_mut() {
            if coin.collected || !coin.bounds().overlaps(player_bounds) {
                continue;
            }
            if let Some(value) = coin.collect() {
                debug!("Collected coin {} worth {}", id, value);
                pickups.push(CoinPickup {
                    coin: id,
                    value,
                    position: coin.position,
                });
            }
        }

        self.collected += pickups.len() as u32;
        self.value_collected += pickups.iter().map(|p| u64::from(p.value)).sum::<u64>();
        pickups
    }

    /// Returns aggregate statistics.
    #[must_use]
    pub fn stats(&self) -> CoinStats {
        CoinStats {
            total: self.total,
            collected: self.collected,
            value_collected: self.value_collected,
        }
    }

    /// Removes every coin and clears statistics.
    pub fn reset(&mut self) {
        self.coins.clear();
        self.total = 0;
        self.collected = 0;
        self.value_collected = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_once() {
        let mut coin = Coin::new(Vec2::ZERO, 100, 24.0);
        assert_eq!(coin.collect(), Some(100));
        assert_eq!(coin.collect(), None);
        assert!(coin.is_collected());
    }

    #[test]
    fn test_bob_offset() {
        let config = CoinConfig::default();
        let mut coin = Coin::new(Vec2::ZERO, 100, 24.0);
        coin.update(0.25, None, &config);
        assert_eq!(coin.bob_offset(), (0.25_f32 * 2.0).sin() * 4.0);
    }

    #[test]
    fn test_magnetic_pull() {
        let config = CoinConfig::default();
        let mut coin = Coin::new(Vec2::ZERO, 100, 24.0);

        coin.update(0.1, Some(Vec2::new(40.0, 0.0)), &config);
        assert_eq!(coin.position(), Vec2::new(8.0, 0.0));

        // Never overshoots the player.
        coin.update(0.1, Some(Vec2::new(11.0, 0.0)), &config);
        assert_eq!(coin.position(), Vec2::new(11.0, 0.0));

        // Out of range: stays put.
        coin.update(0.1, Some(Vec2::new(200.0, 0.0)), &config);
        assert_eq!(coin.position(), Vec2::new(11.0, 0.0));
    }

    #[test]
    fn test_manager_collection_and_purge() {
        let mut manager = CoinManager::default();
        let near = manager.add_coin(Vec2::new(10.0, 10.0), None);
        manager.add_coin(Vec2::new(500.0, 10.0), Some(250));

        let player = Aabb::from_center(Vec2::new(20.0, 10.0), Vec2::splat(16.0));
        let pickups = manager.check_player_collection(&player);
        assert_eq!(pickups.len(), 1);
        assert_eq!(pickups[0].coin, near);
        assert_eq!(pickups[0].value, 100);
        assert!(manager.check_player_collection(&player).is_empty());

        assert_eq!(manager.update(0.25, None), 0);
        assert!(manager.get(near).is_some());
        assert_eq!(manager.update(0.25, None), 1);
        assert!(manager.get(near).is_none());

        let stats = manager.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.collected, 1);
        assert_eq!(stats.value_collected, 100);
    }

    #[test]
    fn test_reset() {
        let mut manager = CoinManager::default();
        manager.add_coin(Vec2::ZERO, None);
        manager.reset();
        assert!(manager.is_empty());
        assert_eq!(manager.stats().total, 0);
    }
}
