//! Items travelling from their evicted cell to their resting row.

use anyhow::Context;
use log::debug;
use mikanbox_core::{Canvas, CellCoord, Item, Renderable};
use mikanbox_scheduler::{Actor, ActorScheduler, Flow};

use crate::{BoxContext, GridError};

/// An item falling towards `destination`.
///
/// The item is owned by the actor while it falls and returns to the grid on
/// arrival.
#[derive(Clone, Debug, PartialEq)]
pub struct FallingMikan {
    item: Item,
    destination: CellCoord,
    target_y: f32,
    step: f32,
}

impl FallingMikan {
    /// Creates a falling item that descends `step` pixels per tick until its
    /// top edge reaches `target_y`.
    #[must_use]
    pub fn new(item: Item, destination: CellCoord, target_y: f32, step: f32) -> Self {
        Self {
            item,
            destination,
            target_y,
            step: step.max(f32::EPSILON),
        }
    }

    /// The falling item.
    #[must_use]
    pub fn item(&self) -> &Item {
        &self.item
    }

    /// Cell the item will occupy once it lands.
    #[must_use]
    pub fn destination(&self) -> CellCoord {
        self.destination
    }

    /// Reports whether the item reached its destination pixel.
    #[must_use]
    pub fn has_arrived(&self) -> bool {
        self.item.position().y >= self.target_y
    }

    /// Moves the item one step down without overshooting.
    pub fn advance(&mut self) {
        let mut position = self.item.position();
        position.y = (position.y + self.step).min(self.target_y);
        self.item.set_position(position);
    }
}

impl<C> Actor<C> for FallingMikan
where
    C: BoxContext,
{
    fn act(&mut self, _: &mut ActorScheduler<C>, context: &mut C) -> anyhow::Result<Flow> {
        self.advance();
        if !self.has_arrived() {
            return Ok(Flow::Continue);
        }

        let grid = context.mikan_box();
        let column = self.destination.column();
        let row = match grid.place(self.item, column, self.destination.row()) {
            Err(GridError::OccupiedCell { .. }) => {
                // Something settled underneath while this item fell.
                let row = grid.stack_height(column);
                grid.place(self.item, column, row)
                    .with_context(|| format!("column {column} has no room left"))?;
                row
            }
            other => {
                other.with_context(|| format!("landing at {}", self.destination))?;
                self.destination.row()
            }
        };
        debug!("item landed at ({column}, {row})");
        Ok(Flow::Done)
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }

    fn name(&self) -> &'static str {
        "falling mikan"
    }
}

impl Renderable for FallingMikan {
    fn render(&self, canvas: &mut dyn Canvas) {
        canvas.draw_sprite(self.item.sprite(), self.item.position());
    }
}
