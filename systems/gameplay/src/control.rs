//! The player-controlled pair of items.

use glam::Vec2;
use log::debug;
use mikanbox_core::{Canvas, CellCoord, InputEvent, Item};
use mikanbox_scheduler::{Actor, ActorScheduler, Flow};
use mikanbox_world::{GridError, MikanBox};
use thiserror::Error;

use crate::Game;

/// Errors raised when an input cannot be applied to the controlled pair.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    /// Walls or placed items prevent the requested motion.
    #[error("{event:?} is blocked at column {column}")]
    Blocked {
        /// Input that could not be applied.
        event: InputEvent,
        /// Pivot column at the time of the input.
        column: u32,
    },
}

/// Side of the pivot occupied by the satellite item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Satellite above the pivot.
    Up,
    /// Satellite right of the pivot.
    Right,
    /// Satellite below the pivot.
    Down,
    /// Satellite left of the pivot.
    Left,
}

impl Orientation {
    /// Orientation after a quarter turn clockwise.
    #[must_use]
    pub const fn clockwise(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }

    /// Orientation after a quarter turn counter-clockwise.
    #[must_use]
    pub const fn counter_clockwise(self) -> Self {
        match self {
            Self::Up => Self::Left,
            Self::Left => Self::Down,
            Self::Down => Self::Right,
            Self::Right => Self::Up,
        }
    }

    /// Column and row displacement of the satellite relative to the pivot.
    #[must_use]
    pub const fn offset(self) -> (i64, i64) {
        match self {
            Self::Up => (0, 1),
            Self::Right => (1, 0),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
        }
    }
}

/// Outcome of lowering the pair for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Descent {
    /// The pair moved and may keep falling.
    Falling,
    /// Nothing is free below the pair.
    Landed,
}

/// Two items falling together under player control.
///
/// The pair is aligned to `row` and hangs `offset` pixels below it. A
/// non-zero offset means the pair overlaps the row underneath, which is
/// therefore always free.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlledPair {
    pivot: Item,
    satellite: Item,
    column: u32,
    row: u32,
    offset: f32,
    orientation: Orientation,
}

impl ControlledPair {
    /// Creates an upright pair whose pivot sits at `(column, row)`.
    #[must_use]
    pub fn new(pivot: Item, satellite: Item, column: u32, row: u32) -> Self {
        Self {
            pivot,
            satellite,
            column,
            row,
            offset: 0.0,
            orientation: Orientation::Up,
        }
    }

    /// Column of the pivot.
    #[must_use]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Row the pivot is aligned to.
    #[must_use]
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Pixels the pair hangs below its aligned row.
    #[must_use]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Side of the pivot occupied by the satellite.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Cells of the pivot and the satellite, in that order.
    #[must_use]
    pub fn cells(&self) -> [CellCoord; 2] {
        let (column_delta, row_delta) = self.orientation.offset();
        [
            CellCoord::new(self.column, self.row),
            CellCoord::new(
                (i64::from(self.column) + column_delta) as u32,
                (i64::from(self.row) + row_delta) as u32,
            ),
        ]
    }

    /// Shifts the pair one column towards `direction` (negative is left).
    pub fn shift(
        &mut self,
        grid: &MikanBox,
        event: InputEvent,
        direction: i64,
    ) -> Result<(), ControlError> {
        let column = i64::from(self.column) + direction;
        if !fits(grid, column, i64::from(self.row), self.orientation, self.offset) {
            return Err(self.blocked(event));
        }
        self.column = column as u32;
        Ok(())
    }

    /// Rotates the satellite to `orientation`, kicking the pair away from a
    /// wall or obstacle when the turn does not fit in place.
    pub fn rotate(
        &mut self,
        grid: &MikanBox,
        event: InputEvent,
        orientation: Orientation,
    ) -> Result<(), ControlError> {
        let (column_delta, row_delta) = orientation.offset();
        let column = i64::from(self.column);
        let row = i64::from(self.row);
        for (kick_column, kick_row) in [(0, 0), (-column_delta, -row_delta)] {
            if fits(grid, column + kick_column, row + kick_row, orientation, self.offset) {
                self.column = (column + kick_column) as u32;
                self.row = (row + kick_row) as u32;
                self.orientation = orientation;
                return Ok(());
            }
        }
        Err(self.blocked(event))
    }

    /// Drops the pair straight down onto whatever lies underneath.
    pub fn release(&mut self, grid: &MikanBox) {
        self.offset = 0.0;
        while fits(grid, i64::from(self.column), i64::from(self.row) - 1, self.orientation, 0.0) {
            self.row -= 1;
        }
    }

    /// Lowers the pair by `speed` pixels.
    pub fn descend(&mut self, grid: &MikanBox, speed: f32) -> Descent {
        let column = i64::from(self.column);
        if !fits(grid, column, i64::from(self.row) - 1, self.orientation, 0.0) {
            self.offset = 0.0;
            return Descent::Landed;
        }

        let size = grid.square_size() as f32;
        self.offset += speed;
        while self.offset >= size {
            self.offset -= size;
            self.row -= 1;
            if !fits(grid, column, i64::from(self.row) - 1, self.orientation, 0.0) {
                self.offset = 0.0;
                break;
            }
        }
        Descent::Falling
    }

    /// Hands both items to the grid at the pair's cells.
    pub fn land(self, grid: &mut MikanBox) -> Result<(), GridError> {
        let [pivot, satellite] = self.cells();
        grid.place(self.pivot, pivot.column(), pivot.row())?;
        grid.place(self.satellite, satellite.column(), satellite.row())
    }

    /// Draws both items at their current, possibly fractional, location.
    pub fn render_on(&self, grid: &MikanBox, canvas: &mut dyn Canvas) {
        for (item, cell) in [self.pivot, self.satellite].iter().zip(self.cells()) {
            let position = grid.pixel_of(cell.column(), cell.row()) + Vec2::new(0.0, self.offset);
            canvas.draw_sprite(item.sprite(), position);
        }
    }

    fn blocked(&self, event: InputEvent) -> ControlError {
        ControlError::Blocked {
            event,
            column: self.column,
        }
    }
}

/// Reports whether a pair with the given pivot cell and orientation fits,
/// including the row underneath when it hangs below its aligned row.
fn fits(grid: &MikanBox, column: i64, row: i64, orientation: Orientation, offset: f32) -> bool {
    let fits_row = |row: i64| {
        let (column_delta, row_delta) = orientation.offset();
        [(column, row), (column + column_delta, row + row_delta)]
            .into_iter()
            .all(|(column, row)| is_free(grid, column, row))
    };
    fits_row(row) && (offset <= 0.0 || fits_row(row - 1))
}

fn is_free(grid: &MikanBox, column: i64, row: i64) -> bool {
    let (Ok(column), Ok(row)) = (u32::try_from(column), u32::try_from(row)) else {
        return false;
    };
    matches!(grid.is_occupied(column, row), Ok(false))
}

/// Lowers the controlled pair every tick until it lands.
pub(crate) struct Control;

impl Actor<Game> for Control {
    fn act(
        &mut self,
        scheduler: &mut ActorScheduler<Game>,
        game: &mut Game,
    ) -> anyhow::Result<Flow> {
        let speed = game.fall_speed();
        let Some(descent) = game.descend_pair(speed) else {
            debug!("control finished without an active pair");
            return Ok(Flow::Done);
        };
        match descent {
            Descent::Falling => Ok(Flow::Continue),
            Descent::Landed => {
                game.land_pair(scheduler)?;
                Ok(Flow::Done)
            }
        }
    }

    fn name(&self) -> &'static str {
        "control"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mikanbox_core::ItemKind;

    fn pair(column: u32, row: u32) -> ControlledPair {
        ControlledPair::new(
            Item::new(ItemKind::Mikan),
            Item::new(ItemKind::Preservative),
            column,
            row,
        )
    }

    #[test]
    fn rotation_cycles_through_all_sides() {
        let mut orientation = Orientation::Up;
        for _ in 0..4 {
            let next = orientation.clockwise();
            assert_eq!(next.counter_clockwise(), orientation);
            orientation = next;
        }
        assert_eq!(orientation, Orientation::Up);
    }

    #[test]
    fn rotation_against_the_wall_kicks_the_pair_inwards() {
        let grid = MikanBox::new(4, 6, 8).expect("valid grid");
        let mut pair = pair(3, 2);

        pair.rotate(&grid, InputEvent::RotateClockwise, Orientation::Right)
            .expect("kick succeeds");

        assert_eq!(pair.column(), 2);
        assert_eq!(
            pair.cells(),
            [CellCoord::new(2, 2), CellCoord::new(3, 2)]
        );
    }

    #[test]
    fn rotation_below_the_floor_kicks_the_pair_up() {
        let grid = MikanBox::new(4, 6, 8).expect("valid grid");
        let mut pair = pair(1, 0);

        pair.rotate(&grid, InputEvent::RotateClockwise, Orientation::Right)
            .expect("fits in place");
        pair.rotate(&grid, InputEvent::RotateClockwise, Orientation::Down)
            .expect("kick succeeds");

        assert_eq!(pair.row(), 1);
        assert_eq!(pair.cells()[1], CellCoord::new(1, 0));
    }

    #[test]
    fn shifting_into_a_wall_is_blocked() {
        let grid = MikanBox::new(4, 6, 8).expect("valid grid");
        let mut pair = pair(0, 3);
        assert_eq!(
            pair.shift(&grid, InputEvent::MoveLeft, -1),
            Err(ControlError::Blocked {
                event: InputEvent::MoveLeft,
                column: 0
            })
        );
        assert_eq!(pair.column(), 0);
    }

    #[test]
    fn descent_stops_on_top_of_the_stack() {
        let mut grid = MikanBox::new(4, 6, 8).expect("valid grid");
        grid.place(Item::new(ItemKind::Mikan), 2, 0).expect("free cell");
        let mut pair = pair(2, 4);

        let mut ticks = 0;
        while pair.descend(&grid, 3.0) == Descent::Falling {
            ticks += 1;
            assert!(ticks < 100, "pair never landed");
        }

        assert_eq!(pair.row(), 1);
        assert_eq!(pair.offset(), 0.0);
        pair.land(&mut grid).expect("free cells");
        assert_eq!(grid.stack_height(2), 3);
    }

    #[test]
    fn release_drops_to_the_lowest_free_row() {
        let mut grid = MikanBox::new(4, 6, 8).expect("valid grid");
        grid.place(Item::new(ItemKind::Mikan), 1, 0).expect("free cell");
        let mut pair = pair(0, 4);
        pair.rotate(&grid, InputEvent::RotateClockwise, Orientation::Right)
            .expect("fits in place");

        pair.release(&grid);

        assert_eq!(pair.row(), 1);
        assert_eq!(pair.descend(&grid, 3.0), Descent::Landed);
    }
}
