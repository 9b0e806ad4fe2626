//! Seeded generator of the items handed to every spawned pair.

use mikanbox_core::{Item, ItemKind, ItemSource};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::GameConfig;

/// Deterministic [`ItemSource`] driven by a ChaCha stream.
///
/// Fruit arrive with a random amount of damage; preservatives arrive fresh.
/// The fall speed grows with every item drawn until it reaches its ceiling.
#[derive(Clone, Debug)]
pub struct SeededItemSource {
    rng: ChaCha8Rng,
    preservative_ratio: f64,
    base_fall_speed: f32,
    fall_acceleration: f32,
    max_fall_speed: f32,
    drawn: u64,
}

impl SeededItemSource {
    /// Creates a source from the generation knobs of `config`.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            preservative_ratio: config.preservative_ratio.clamp(0.0, 1.0),
            base_fall_speed: config.base_fall_speed,
            fall_acceleration: config.fall_acceleration,
            max_fall_speed: config.max_fall_speed,
            drawn: 0,
        }
    }

    /// Number of items produced so far.
    #[must_use]
    pub fn drawn(&self) -> u64 {
        self.drawn
    }
}

impl ItemSource for SeededItemSource {
    fn next_item(&mut self) -> Item {
        self.drawn += 1;
        if self.rng.gen_bool(self.preservative_ratio) {
            return Item::new(ItemKind::Preservative);
        }
        let mut item = Item::new(ItemKind::Mikan);
        item.set_damage(self.rng.gen_range(0..=ItemKind::Mikan.max_damage()));
        item
    }

    fn fall_speed(&self) -> f32 {
        let pairs = (self.drawn / 2) as f32;
        (self.base_fall_speed + self.fall_acceleration * pairs).min(self.max_fall_speed)
    }
}
