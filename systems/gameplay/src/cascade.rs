//! Chain resolution after every landing.
//!
//! A check runs at [`Priority::CONTROL`], so it only fires once every
//! spray, spoil and fall scheduled before it has finished. Each step that
//! finds chains erases them, emits sprays and queues a spoiler; the spoiler
//! damages the neighbours, settles the grid and queues the next check.

use log::debug;
use mikanbox_core::{CellCoord, Priority, StatisticsEvent};
use mikanbox_scheduler::{Actor, ActorScheduler, Flow, Task};
use mikanbox_world::BoxContext;

use crate::{spawn::Spawn, Game};

/// Looks for chains and either starts a cascade step or hands over to spawning.
pub(crate) struct ChainCheck;

impl ChainCheck {
    pub(crate) fn task() -> Task<Game> {
        Task::new(Priority::CONTROL, Self)
    }
}

impl Actor<Game> for ChainCheck {
    fn act(
        &mut self,
        scheduler: &mut ActorScheduler<Game>,
        game: &mut Game,
    ) -> anyhow::Result<Flow> {
        let chains = game.mikan_box().chain_mikans();
        if chains.is_empty() {
            game.finish_cascade();
            let _ = scheduler.schedule(Spawn::task());
            return Ok(Flow::Done);
        }

        let cascade = game.deepen_cascade();
        let erased = game.mikan_box().erase(&chains);
        debug!(
            "cascade {cascade}: erased {} item(s) in {} chain(s)",
            erased.len(),
            chains.len()
        );
        game.notify(StatisticsEvent::ChainsCleared {
            chains: chains.len(),
            cascade,
        });
        game.notify(StatisticsEvent::MikansErased {
            count: erased.len(),
        });

        let grid = game.mikan_box();
        let _ = grid.schedule_sprays(&chains, scheduler);
        let _ = grid.schedule_spoiler(&chains, scheduler, spoil);
        Ok(Flow::Done)
    }

    fn name(&self) -> &'static str {
        "chain check"
    }
}

fn spoil(
    targets: &[CellCoord],
    scheduler: &mut ActorScheduler<Game>,
    game: &mut Game,
) -> anyhow::Result<()> {
    let mut spoiled = 0;
    for &cell in targets {
        if game.mikan_box().spoil_at(cell)? {
            spoiled += 1;
        }
    }
    game.notify(StatisticsEvent::ItemsSpoiled { count: spoiled });

    let falling = game.mikan_box().drop_mikans(scheduler);
    debug!("spoiled {spoiled} item(s), {falling} item(s) falling");
    let _ = scheduler.schedule(ChainCheck::task());
    Ok(())
}
