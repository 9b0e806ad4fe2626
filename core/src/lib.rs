#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the MikanBox engine.
//!
//! This crate defines the vocabulary that connects the actor scheduler, the
//! authoritative grid, gameplay systems and adapters. Priorities order the
//! work performed on every tick, [`Item`] values are the fruit stored in the
//! grid, and the [`Canvas`], [`ItemSource`] and [`StatisticsSink`] traits mark
//! the boundaries towards rendering, difficulty tuning and score keeping.

use std::{cmp::Ordering, fmt};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to MikanBox.";

/// Minimum number of connected spent items that form an active chain.
pub const CHAIN_LENGTH: usize = 4;

/// Errors raised when constructing core values from untrusted input.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A value could not be represented by the requested type.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Execution precedence of a scheduled task. Lower values run first.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Priority(i32);

impl Priority {
    /// One-shot reactions to player input. Preempts every other tier.
    pub const INPUT: Self = Self(-1);
    /// Erase spray particles.
    pub const SPRAY: Self = Self(0);
    /// Damage applied to the neighbours of erased chains.
    pub const SPOIL: Self = Self(1);
    /// Items falling towards their resting row.
    pub const MOVE: Self = Self(2);
    /// The player-controlled pair and chain checks.
    pub const CONTROL: Self = Self(3);
    /// Spawning of the next controlled pair.
    pub const SPAWN: Self = Self(4);

    /// Creates a priority from its raw value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Retrieves the raw priority value.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Reports whether the priority belongs to the negative, input-reaction range.
    #[must_use]
    pub const fn is_urgent(&self) -> bool {
        self.0 < 0
    }

    /// Phase mirrored from this priority, used for logging and tests.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self.0 {
            0 => Phase::Spray,
            1 => Phase::Spoil,
            2 => Phase::Move,
            3 => Phase::Control,
            4 => Phase::Spawn,
            value if value < 0 => Phase::Input,
            value => Phase::Other(value),
        }
    }
}

impl TryFrom<i64> for Priority {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        i32::try_from(value).map(Self).map_err(|_| {
            CoreError::InvalidArgument(format!("priority {value} does not fit in 32 bits"))
        })
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.phase(), self.0)
    }
}

/// Compares two priorities the way `a - b` would, without overflow.
#[must_use]
pub fn compare_priorities(a: Priority, b: Priority) -> Ordering {
    a.get().cmp(&b.get())
}

/// Named view over the priority tiers. Carries no scheduling semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Negative priorities.
    Input,
    /// [`Priority::SPRAY`].
    Spray,
    /// [`Priority::SPOIL`].
    Spoil,
    /// [`Priority::MOVE`].
    Move,
    /// [`Priority::CONTROL`].
    Control,
    /// [`Priority::SPAWN`].
    Spawn,
    /// Any non-canonical, non-negative priority.
    Other(i32),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Spray => f.write_str("spray"),
            Self::Spoil => f.write_str("spoil"),
            Self::Move => f.write_str("move"),
            Self::Control => f.write_str("control"),
            Self::Spawn => f.write_str("spawn"),
            Self::Other(_) => f.write_str("other"),
        }
    }
}

/// Location of a single grid cell. Row zero is the physical bottom.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell, counted upwards from the floor.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Returns the neighbouring cell displaced by the provided deltas when it
    /// lies inside a `columns` by `rows` grid.
    #[must_use]
    pub fn offset(
        self,
        column_delta: i32,
        row_delta: i32,
        columns: u32,
        rows: u32,
    ) -> Option<Self> {
        let column = i64::from(self.column) + i64::from(column_delta);
        let row = i64::from(self.row) + i64::from(row_delta);
        if column < 0 || row < 0 || column >= i64::from(columns) || row >= i64::from(rows) {
            return None;
        }
        Some(Self::new(column as u32, row as u32))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Kinds of items that can be stored in the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Plain fruit.
    Mikan,
    /// Preservative block. Tolerates more spoiling before it is spent.
    Preservative,
}

impl ItemKind {
    /// Damage at which an item of this kind is spent and may chain.
    #[must_use]
    pub const fn max_damage(self) -> u32 {
        match self {
            Self::Mikan => 4,
            Self::Preservative => 6,
        }
    }
}

/// A single fruit or preservative together with its pixel location.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    kind: ItemKind,
    damage: u32,
    position: Vec2,
}

impl Item {
    /// Creates an undamaged item.
    #[must_use]
    pub const fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            damage: 0,
            position: Vec2::ZERO,
        }
    }

    /// Creates an item carrying the provided damage.
    ///
    /// Fails when `damage` exceeds the kind's maximum.
    pub fn with_damage(kind: ItemKind, damage: u32) -> Result<Self, CoreError> {
        if damage > kind.max_damage() {
            return Err(CoreError::InvalidArgument(format!(
                "damage {damage} exceeds the maximum of {} for {kind:?}",
                kind.max_damage()
            )));
        }
        Ok(Self {
            kind,
            damage,
            position: Vec2::ZERO,
        })
    }

    /// Kind of the item.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Accumulated damage.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        self.damage
    }

    /// Damage at which the item is spent.
    #[must_use]
    pub const fn max_damage(&self) -> u32 {
        self.kind.max_damage()
    }

    /// Reports whether the item reached its maximum damage.
    #[must_use]
    pub const fn is_spent(&self) -> bool {
        self.damage >= self.kind.max_damage()
    }

    /// Overwrites the damage, truncating it to the kind's maximum.
    pub fn set_damage(&mut self, damage: u32) {
        self.damage = damage.min(self.kind.max_damage());
    }

    /// Adds one point of damage. Returns `false` when the item was already spent.
    pub fn spoil(&mut self) -> bool {
        if self.is_spent() {
            return false;
        }
        self.damage += 1;
        true
    }

    /// Pixel location of the item's top-left corner.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Moves the item to a new pixel location.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Sprite used to draw the item in its current state.
    #[must_use]
    pub const fn sprite(&self) -> Sprite {
        match self.kind {
            ItemKind::Mikan => Sprite::Mikan {
                damage: self.damage,
            },
            ItemKind::Preservative => Sprite::Preservative {
                damage: self.damage,
            },
        }
    }
}

/// Handle identifying the artwork a [`Canvas`] should draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sprite {
    /// Fruit at the given damage.
    Mikan {
        /// Damage of the fruit being drawn.
        damage: u32,
    },
    /// Preservative at the given damage.
    Preservative {
        /// Damage of the preservative being drawn.
        damage: u32,
    },
    /// Frame of the erase spray animation.
    Spray {
        /// Animation frame index.
        frame: u32,
    },
}

/// Drawing surface supplied by a rendering adapter.
pub trait Canvas {
    /// Draws `sprite` with its top-left corner at `position`, in pixels.
    fn draw_sprite(&mut self, sprite: Sprite, position: Vec2);
}

/// Capability implemented by everything that knows how to draw itself.
pub trait Renderable {
    /// Draws the value onto the provided canvas.
    fn render(&self, canvas: &mut dyn Canvas);
}

/// Player intents delivered by an input adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputEvent {
    /// Shift the controlled pair one column to the left.
    MoveLeft,
    /// Shift the controlled pair one column to the right.
    MoveRight,
    /// Rotate the satellite item clockwise around the pivot.
    RotateClockwise,
    /// Rotate the satellite item counter-clockwise around the pivot.
    RotateCounterClockwise,
    /// Drop the controlled pair straight down and hand it to the grid.
    ReleaseControl,
}

/// Produces the items of every spawn cycle.
pub trait ItemSource {
    /// Produces the next item to enter the grid.
    fn next_item(&mut self) -> Item;

    /// Current fall speed of the controlled pair, in pixels per tick.
    fn fall_speed(&self) -> f32;
}

/// Named events emitted while the game progresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatisticsEvent {
    /// A new controlled pair entered the grid.
    PairSpawned,
    /// The controlled pair came to rest and was handed to the grid.
    PairLanded,
    /// Chains were detected during a cascade step.
    ChainsCleared {
        /// Number of chains removed in this step.
        chains: usize,
        /// One-based cascade depth of this step.
        cascade: u32,
    },
    /// Items were erased from the grid.
    MikansErased {
        /// Number of erased items.
        count: usize,
    },
    /// Neighbours of erased chains received damage.
    ItemsSpoiled {
        /// Number of items whose damage increased.
        count: usize,
    },
    /// The spawn cells were blocked and play ended.
    GameOver,
}

/// Observer notified with [`StatisticsEvent`] values.
pub trait StatisticsSink {
    /// Receives a single event.
    fn notify(&mut self, event: &StatisticsEvent);
}

impl StatisticsSink for Vec<StatisticsEvent> {
    fn notify(&mut self, event: &StatisticsEvent) {
        self.push(*event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_priorities_are_strictly_increasing() {
        let tiers = [
            Priority::INPUT,
            Priority::SPRAY,
            Priority::SPOIL,
            Priority::MOVE,
            Priority::CONTROL,
            Priority::SPAWN,
        ];
        for pair in tiers.windows(2) {
            assert_eq!(compare_priorities(pair[0], pair[1]), Ordering::Less);
        }
    }

    #[test]
    fn phases_mirror_priorities() {
        assert_eq!(Priority::new(-7).phase(), Phase::Input);
        assert_eq!(Priority::MOVE.phase(), Phase::Move);
        assert_eq!(Priority::new(12).phase(), Phase::Other(12));
        assert_eq!(Priority::SPOIL.to_string(), "spoil(1)");
    }

    #[test]
    fn priority_conversion_rejects_values_outside_i32() {
        assert_eq!(Priority::try_from(-3_i64), Ok(Priority::new(-3)));
        assert!(matches!(
            Priority::try_from(i64::from(i32::MAX) + 1),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn offset_stays_inside_the_grid() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(corner.offset(-1, 0, 8, 12), None);
        assert_eq!(corner.offset(0, -1, 8, 12), None);
        assert_eq!(corner.offset(1, 1, 8, 12), Some(CellCoord::new(1, 1)));
        assert_eq!(CellCoord::new(7, 11).offset(1, 0, 8, 12), None);
    }

    #[test]
    fn item_damage_is_bounded_by_kind() {
        assert!(Item::with_damage(ItemKind::Mikan, 5).is_err());

        let mut mikan = Item::with_damage(ItemKind::Mikan, 3).expect("valid damage");
        assert!(!mikan.is_spent());
        assert!(mikan.spoil());
        assert!(mikan.is_spent());
        assert!(!mikan.spoil());
        assert_eq!(mikan.damage(), 4);

        let mut preservative = Item::new(ItemKind::Preservative);
        preservative.set_damage(40);
        assert_eq!(preservative.damage(), ItemKind::Preservative.max_damage());
    }

    #[test]
    fn item_round_trips_through_bincode() {
        let mut item = Item::with_damage(ItemKind::Preservative, 2).expect("valid damage");
        item.set_position(Vec2::new(64.0, 320.0));
        let bytes = bincode::serialize(&item).expect("serialize");
        let restored: Item = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, item);
    }

    #[test]
    fn vec_sink_records_events_in_order() {
        let mut sink: Vec<StatisticsEvent> = Vec::new();
        sink.notify(&StatisticsEvent::PairSpawned);
        sink.notify(&StatisticsEvent::MikansErased { count: 4 });
        assert_eq!(
            sink,
            vec![
                StatisticsEvent::PairSpawned,
                StatisticsEvent::MikansErased { count: 4 }
            ]
        );
    }
}
