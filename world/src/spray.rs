//! Particles emitted by erased items.

use std::f32::consts::FRAC_1_SQRT_2;

use glam::Vec2;
use mikanbox_core::{Canvas, Renderable, Sprite};
use mikanbox_scheduler::{Actor, ActorScheduler, Flow};

/// Number of ticks a spray particle stays alive.
pub const SPRAY_TTL: u32 = 10;

/// Number of frames in the spray animation.
pub const SPRAY_FRAME_COUNT: u32 = 4;

/// Unit velocities of the eight particles emitted per erased cell, clockwise
/// from straight up in pixel space.
pub const SPRAY_DIRECTIONS: [Vec2; 8] = [
    Vec2::new(0.0, -1.0),
    Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    Vec2::new(1.0, 0.0),
    Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    Vec2::new(0.0, 1.0),
    Vec2::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    Vec2::new(-1.0, 0.0),
    Vec2::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
];

/// A short-lived particle travelling in a straight line.
#[derive(Clone, Debug, PartialEq)]
pub struct Spray {
    position: Vec2,
    velocity: Vec2,
    ttl: u32,
    frame: u32,
}

impl Spray {
    /// Creates a particle at `origin` moving along `direction` at `speed`
    /// pixels per tick.
    #[must_use]
    pub fn new(origin: Vec2, direction: Vec2, speed: f32) -> Self {
        Self {
            position: origin,
            velocity: direction * speed,
            ttl: SPRAY_TTL,
            frame: 0,
        }
    }

    /// Current pixel location.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Remaining ticks before the particle disappears.
    #[must_use]
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Current animation frame.
    #[must_use]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Advances the particle by one tick. Returns `false` once it expired.
    pub fn advance(&mut self) -> bool {
        self.ttl = self.ttl.saturating_sub(1);
        if self.ttl == 0 {
            return false;
        }
        self.position += self.velocity;
        self.frame = (self.frame + 1) % SPRAY_FRAME_COUNT;
        true
    }
}

impl<C> Actor<C> for Spray {
    fn act(&mut self, _: &mut ActorScheduler<C>, _: &mut C) -> anyhow::Result<Flow> {
        Ok(if self.advance() {
            Flow::Continue
        } else {
            Flow::Done
        })
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }

    fn name(&self) -> &'static str {
        "spray"
    }
}

impl Renderable for Spray {
    fn render(&self, canvas: &mut dyn Canvas) {
        canvas.draw_sprite(Sprite::Spray { frame: self.frame }, self.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_are_unit_length() {
        for direction in SPRAY_DIRECTIONS {
            assert!((direction.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn particle_moves_and_animates_until_it_expires() {
        let mut spray = Spray::new(Vec2::new(10.0, 10.0), Vec2::X, 3.0);
        assert!(spray.advance());
        assert_eq!(spray.position(), Vec2::new(13.0, 10.0));
        assert_eq!(spray.frame(), 1);

        let mut alive = 1;
        while spray.advance() {
            alive += 1;
        }
        assert_eq!(alive, SPRAY_TTL - 1);
        assert_eq!(spray.ttl(), 0);
        assert!(spray.frame() < SPRAY_FRAME_COUNT);
    }
}
