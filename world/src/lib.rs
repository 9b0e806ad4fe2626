#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state for MikanBox.
//!
//! [`MikanBox`] owns every placed item. Apart from plain placement queries it
//! turns ungrounded items into falling actors, detects chains of spent items
//! and prepares the spray and spoil follow-ups of an erase, always by
//! submitting tasks to an [`ActorScheduler`] rather than mutating over time
//! itself.

mod chain;
mod falling;
mod spray;

use std::collections::BTreeSet;

use glam::Vec2;
use log::debug;
use mikanbox_core::{Canvas, CellCoord, Item, Priority, Renderable};
use mikanbox_scheduler::{Actor, ActorScheduler, Flow, Task};
use thiserror::Error;

pub use self::chain::Chain;
pub use self::falling::FallingMikan;
pub use self::spray::{Spray, SPRAY_DIRECTIONS, SPRAY_FRAME_COUNT, SPRAY_TTL};

/// Errors raised by grid construction and cell access.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// A construction parameter was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The requested cell lies outside the grid.
    #[error("cell ({column}, {row}) lies outside the {columns}x{rows} grid")]
    OutOfBounds {
        /// Requested column.
        column: u32,
        /// Requested row.
        row: u32,
        /// Number of columns in the grid.
        columns: u32,
        /// Number of rows in the grid.
        rows: u32,
    },
    /// The requested cell already holds an item.
    #[error("cell ({column}, {row}) is already occupied")]
    OccupiedCell {
        /// Requested column.
        column: u32,
        /// Requested row.
        row: u32,
    },
}

/// Contexts through which grid actors reach the grid they belong to.
pub trait BoxContext {
    /// Grants mutable access to the grid.
    fn mikan_box(&mut self) -> &mut MikanBox;
}

impl BoxContext for MikanBox {
    fn mikan_box(&mut self) -> &mut MikanBox {
        self
    }
}

/// Pixel speeds used by the actors the grid creates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    /// Pixels a falling item descends per tick.
    pub fall_step: f32,
    /// Pixels a spray particle travels per tick.
    pub spray_speed: f32,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            fall_step: 8.0,
            spray_speed: 3.0,
        }
    }
}

/// Fixed-size, column-major grid of optional items. Row zero is the floor.
#[derive(Clone, Debug)]
pub struct MikanBox {
    columns: u32,
    rows: u32,
    square_size: u32,
    motion: Motion,
    cells: Vec<Option<Item>>,
}

impl MikanBox {
    /// Creates an empty grid. Every dimension must be positive.
    pub fn new(columns: u32, rows: u32, square_size: u32) -> Result<Self, GridError> {
        for (name, value) in [
            ("column count", columns),
            ("row count", rows),
            ("square size", square_size),
        ] {
            if value == 0 {
                return Err(GridError::InvalidArgument(format!(
                    "{name} must be positive"
                )));
            }
        }

        let capacity = usize::try_from(u64::from(columns) * u64::from(rows))
            .map_err(|_| GridError::InvalidArgument("grid is too large".to_owned()))?;
        Ok(Self {
            columns,
            rows,
            square_size,
            motion: Motion::default(),
            cells: vec![None; capacity],
        })
    }

    /// Creates an empty grid from fractional dimensions, flooring each one
    /// before validation.
    pub fn from_floats(columns: f64, rows: f64, square_size: f64) -> Result<Self, GridError> {
        let floor = |name: &str, value: f64| -> Result<u32, GridError> {
            let floored = value.floor();
            if !floored.is_finite() || floored < 1.0 || floored > f64::from(u32::MAX) {
                return Err(GridError::InvalidArgument(format!(
                    "{name} must be a positive number (received {value})"
                )));
            }
            Ok(floored as u32)
        };
        Self::new(
            floor("column count", columns)?,
            floor("row count", rows)?,
            floor("square size", square_size)?,
        )
    }

    /// Replaces the speeds handed to falling and spray actors.
    #[must_use]
    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a cell in pixels.
    #[must_use]
    pub const fn square_size(&self) -> u32 {
        self.square_size
    }

    /// Speeds used for falling and spray actors.
    #[must_use]
    pub const fn motion(&self) -> Motion {
        self.motion
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Returns the item stored at the cell, if any.
    pub fn item_at(&self, column: u32, row: u32) -> Result<Option<&Item>, GridError> {
        let index = self.checked_index(column, row)?;
        Ok(self.cells[index].as_ref())
    }

    /// Reports whether the cell holds an item.
    pub fn is_occupied(&self, column: u32, row: u32) -> Result<bool, GridError> {
        self.item_at(column, row).map(|item| item.is_some())
    }

    /// Stores `item` at the cell and moves it to the cell's pixel location.
    ///
    /// The grid is left untouched when the cell is out of bounds or occupied.
    pub fn place(&mut self, mut item: Item, column: u32, row: u32) -> Result<(), GridError> {
        let index = self.checked_index(column, row)?;
        if self.cells[index].is_some() {
            return Err(GridError::OccupiedCell { column, row });
        }
        item.set_position(self.pixel_of(column, row));
        self.cells[index] = Some(item);
        Ok(())
    }

    /// Removes and returns the item stored at the cell.
    pub fn take(&mut self, column: u32, row: u32) -> Result<Option<Item>, GridError> {
        let index = self.checked_index(column, row)?;
        Ok(self.cells[index].take())
    }

    /// Adds one point of damage to the item at `cell`.
    ///
    /// Returns `false` for empty cells and items that are already spent.
    pub fn spoil_at(&mut self, cell: CellCoord) -> Result<bool, GridError> {
        let index = self.checked_index(cell.column(), cell.row())?;
        Ok(self.cells[index].as_mut().map_or(false, Item::spoil))
    }

    /// Removes every item belonging to the provided chains.
    pub fn erase(&mut self, chains: &[Chain]) -> Vec<Item> {
        let mut erased = Vec::new();
        for cell in chains.iter().flat_map(Chain::cells) {
            if let Some(index) = self.index(cell.column(), cell.row()) {
                if let Some(item) = self.cells[index].take() {
                    erased.push(item);
                }
            }
        }
        erased
    }

    /// Pixel location of the top-left corner of a cell.
    ///
    /// Rows above the grid map to negative `y` values.
    #[must_use]
    pub fn pixel_of(&self, column: u32, row: u32) -> Vec2 {
        let size = self.square_size as f32;
        let flipped = i64::from(self.rows) - i64::from(row) - 1;
        Vec2::new(column as f32 * size, flipped as f32 * size)
    }

    /// Cell containing the pixel location, if it lies inside the grid.
    #[must_use]
    pub fn cell_at_pixel(&self, position: Vec2) -> Option<CellCoord> {
        if !position.is_finite() || position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        let size = self.square_size as f32;
        let column = (position.x / size).floor() as u32;
        let flipped = (position.y / size).floor() as u32;
        if column >= self.columns || flipped >= self.rows {
            return None;
        }
        Some(CellCoord::new(column, self.rows - flipped - 1))
    }

    /// Iterator over every placed item together with its cell.
    pub fn items(&self) -> impl Iterator<Item = (CellCoord, &Item)> + '_ {
        let rows = self.rows as usize;
        self.cells.iter().enumerate().filter_map(move |(index, slot)| {
            slot.as_ref().map(|item| {
                let cell = CellCoord::new((index / rows) as u32, (index % rows) as u32);
                (cell, item)
            })
        })
    }

    /// Number of placed items.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|slot| slot.is_some()).count()
    }

    /// Height of the contiguous stack resting on the floor of `column`.
    #[must_use]
    pub fn stack_height(&self, column: u32) -> u32 {
        (0..self.rows)
            .take_while(|&row| {
                self.index(column, row)
                    .map_or(false, |index| self.cells[index].is_some())
            })
            .count() as u32
    }

    /// Evicts every item that does not rest on its column's stack and
    /// schedules it as a [`FallingMikan`] at [`Priority::MOVE`].
    ///
    /// Items keep their vertical order: the lowest evicted item lands right
    /// on top of the stack, the next one above it, and so on. One call is one
    /// settling pass. Returns the number of evicted items.
    pub fn drop_mikans<C>(&mut self, scheduler: &mut ActorScheduler<C>) -> usize
    where
        C: BoxContext + 'static,
    {
        let mut evicted = 0;
        for column in 0..self.columns {
            let mut landing = 0;
            let mut grounded = true;
            for row in 0..self.rows {
                let index = self.cell_index(column, row);
                let Some(item) = self.cells[index] else {
                    grounded = false;
                    continue;
                };
                if grounded {
                    landing += 1;
                    continue;
                }

                self.cells[index] = None;
                let destination = CellCoord::new(column, landing);
                let target = self.pixel_of(column, landing);
                let falling = FallingMikan::new(item, destination, target.y, self.motion.fall_step);
                let _ = scheduler.schedule(Task::new(Priority::MOVE, falling));
                debug!("item at ({column}, {row}) falls to {destination}");
                landing += 1;
                evicted += 1;
            }
        }
        evicted
    }

    /// Returns every active chain of spent items without mutating the grid.
    ///
    /// Cells are scanned column by column from the floor up; chains and
    /// their members are reported in discovery order.
    #[must_use]
    pub fn chain_mikans(&self) -> Vec<Chain> {
        chain::find_chains(self.columns, self.rows, |cell| {
            self.cells[self.cell_index(cell.column(), cell.row())]
                .as_ref()
                .map_or(false, Item::is_spent)
        })
    }

    /// Schedules eight [`Spray`] particles per chain cell at
    /// [`Priority::SPRAY`]. Returns the number of scheduled particles.
    pub fn schedule_sprays<C>(&self, chains: &[Chain], scheduler: &mut ActorScheduler<C>) -> usize
    where
        C: 'static,
    {
        let mut scheduled = 0;
        for cell in chains.iter().flat_map(Chain::cells) {
            let origin = self.pixel_of(cell.column(), cell.row());
            for direction in SPRAY_DIRECTIONS {
                let spray = Spray::new(origin, direction, self.motion.spray_speed);
                let _ = scheduler.schedule(Task::new(Priority::SPRAY, spray));
                scheduled += 1;
            }
        }
        scheduled
    }

    /// Cells adjacent (diagonals included) to any chain cell that are not
    /// themselves part of a chain, deduplicated and ordered column by column.
    #[must_use]
    pub fn spoil_targets(&self, chains: &[Chain]) -> Vec<CellCoord> {
        let members: BTreeSet<CellCoord> =
            chains.iter().flat_map(Chain::cells).copied().collect();
        let mut targets = BTreeSet::new();
        for cell in &members {
            for column_delta in -1..=1 {
                for row_delta in -1..=1 {
                    if column_delta == 0 && row_delta == 0 {
                        continue;
                    }
                    if let Some(neighbour) =
                        cell.offset(column_delta, row_delta, self.columns, self.rows)
                    {
                        if !members.contains(&neighbour) {
                            let _ = targets.insert(neighbour);
                        }
                    }
                }
            }
        }
        targets.into_iter().collect()
    }

    /// Schedules one task at [`Priority::SPOIL`] that hands the spoil
    /// targets of `chains` to `action`. Returns the number of targets.
    pub fn schedule_spoiler<C, F>(
        &self,
        chains: &[Chain],
        scheduler: &mut ActorScheduler<C>,
        action: F,
    ) -> usize
    where
        C: 'static,
        F: FnOnce(&[CellCoord], &mut ActorScheduler<C>, &mut C) -> anyhow::Result<()> + 'static,
    {
        let targets = self.spoil_targets(chains);
        let count = targets.len();
        let spoiler = Spoiler {
            targets,
            action: Some(action),
        };
        let _ = scheduler.schedule(Task::new(Priority::SPOIL, spoiler));
        count
    }

    fn index(&self, column: u32, row: u32) -> Option<usize> {
        if column < self.columns && row < self.rows {
            Some(self.cell_index(column, row))
        } else {
            None
        }
    }

    fn cell_index(&self, column: u32, row: u32) -> usize {
        row as usize + column as usize * self.rows as usize
    }

    fn checked_index(&self, column: u32, row: u32) -> Result<usize, GridError> {
        self.index(column, row).ok_or(GridError::OutOfBounds {
            column,
            row,
            columns: self.columns,
            rows: self.rows,
        })
    }
}

impl Renderable for MikanBox {
    fn render(&self, canvas: &mut dyn Canvas) {
        for (_, item) in self.items() {
            canvas.draw_sprite(item.sprite(), item.position());
        }
    }
}

struct Spoiler<F> {
    targets: Vec<CellCoord>,
    action: Option<F>,
}

impl<C, F> Actor<C> for Spoiler<F>
where
    F: FnOnce(&[CellCoord], &mut ActorScheduler<C>, &mut C) -> anyhow::Result<()>,
{
    fn act(
        &mut self,
        scheduler: &mut ActorScheduler<C>,
        context: &mut C,
    ) -> anyhow::Result<Flow> {
        if let Some(action) = self.action.take() {
            action(&self.targets, scheduler, context)?;
        }
        Ok(Flow::Done)
    }

    fn name(&self) -> &'static str {
        "spoiler"
    }
}
