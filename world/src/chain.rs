//! Flood-fill detection of connected spent items.

use mikanbox_core::{CellCoord, CHAIN_LENGTH};

/// Propagation order of the flood fill: up, down, left, right.
const PROPAGATION: [(i32, i32); 4] = [(0, 1), (0, -1), (-1, 0), (1, 0)];

/// Connected group of spent items, in discovery order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Chain {
    cells: Vec<CellCoord>,
}

impl Chain {
    /// Creates a chain from the provided member cells.
    #[must_use]
    pub fn new(cells: Vec<CellCoord>) -> Self {
        Self { cells }
    }

    /// Member cells in discovery order.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Number of member cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the chain has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reports whether `cell` belongs to the chain.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.cells.contains(&cell)
    }

    /// Reports whether the chain is long enough to be erased.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cells.len() >= CHAIN_LENGTH
    }
}

/// Scans a `columns` by `rows` grid column by column and returns every active
/// chain of cells for which `is_spent` holds.
///
/// Each group is grown depth-first in pre-order, trying the neighbour above
/// first, then below, left and right. Shorter groups are discovered, marked
/// and discarded so they never seed another search.
pub(crate) fn find_chains<F>(columns: u32, rows: u32, is_spent: F) -> Vec<Chain>
where
    F: Fn(CellCoord) -> bool,
{
    let index = |cell: CellCoord| cell.row() as usize + cell.column() as usize * rows as usize;
    let mut assigned: Vec<Option<usize>> = vec![None; columns as usize * rows as usize];
    let mut chains = Vec::new();
    let mut stack = Vec::new();
    let mut group = 0;

    for column in 0..columns {
        for row in 0..rows {
            let start = CellCoord::new(column, row);
            if assigned[index(start)].is_some() || !is_spent(start) {
                continue;
            }

            let mut members = Vec::new();
            stack.push(start);
            while let Some(cell) = stack.pop() {
                let slot = &mut assigned[index(cell)];
                if slot.is_some() {
                    continue;
                }
                *slot = Some(group);
                members.push(cell);

                for &(column_delta, row_delta) in PROPAGATION.iter().rev() {
                    let Some(next) = cell.offset(column_delta, row_delta, columns, rows) else {
                        continue;
                    };
                    if assigned[index(next)].is_none() && is_spent(next) {
                        stack.push(next);
                    }
                }
            }

            group += 1;
            let chain = Chain::new(members);
            if chain.is_active() {
                chains.push(chain);
            }
        }
    }

    chains
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spent_set(cells: &[(u32, u32)]) -> impl Fn(CellCoord) -> bool + '_ {
        move |cell| cells.contains(&(cell.column(), cell.row()))
    }

    #[test]
    fn growth_prefers_up_then_down_then_left_then_right() {
        // Plus shape centred on (1, 1); the scan reaches (0, 1) first.
        let cells = [(1, 1), (1, 2), (1, 0), (0, 1), (2, 1)];
        let chains = find_chains(3, 3, spent_set(&cells));

        assert_eq!(chains.len(), 1);
        assert_eq!(
            chains[0].cells(),
            &[
                CellCoord::new(0, 1),
                CellCoord::new(1, 1),
                CellCoord::new(1, 2),
                CellCoord::new(1, 0),
                CellCoord::new(2, 1),
            ]
        );
    }

    #[test]
    fn short_groups_are_discarded() {
        let cells = [(0, 0), (0, 1), (0, 2)];
        assert!(find_chains(4, 4, spent_set(&cells)).is_empty());
    }

    #[test]
    fn activity_starts_at_the_chain_length() {
        let cells: Vec<CellCoord> = (0..CHAIN_LENGTH as u32)
            .map(|row| CellCoord::new(0, row))
            .collect();
        assert!(Chain::new(cells.clone()).is_active());
        assert!(!Chain::new(cells[1..].to_vec()).is_active());
    }

    #[test]
    fn empty_grid_has_no_chains() {
        assert!(find_chains(5, 5, |_| false).is_empty());
    }
}
