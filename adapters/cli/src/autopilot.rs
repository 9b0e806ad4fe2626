//! Seeded stand-in for a player.

use mikanbox_core::InputEvent;
use mikanbox_system_gameplay::Game;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const MOVES: [InputEvent; 9] = [
    InputEvent::MoveLeft,
    InputEvent::MoveLeft,
    InputEvent::MoveRight,
    InputEvent::MoveRight,
    InputEvent::RotateClockwise,
    InputEvent::RotateClockwise,
    InputEvent::RotateCounterClockwise,
    InputEvent::MoveLeft,
    InputEvent::ReleaseControl,
];

/// Emits random inputs while a pair is under control.
#[derive(Debug)]
pub(crate) struct Autopilot {
    rng: ChaCha8Rng,
    activity: f64,
}

impl Autopilot {
    /// Creates an autopilot that acts on roughly `activity` of all ticks.
    pub(crate) fn new(seed: u64, activity: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            activity: activity.clamp(0.0, 1.0),
        }
    }

    /// Input to submit before the next tick, if any.
    pub(crate) fn next_input(&mut self, game: &Game) -> Option<InputEvent> {
        if game.pair().is_none() || !self.rng.gen_bool(self.activity) {
            return None;
        }
        MOVES.choose(&mut self.rng).copied()
    }
}
