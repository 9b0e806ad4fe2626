//! Entry of the next controlled pair.

use log::info;
use mikanbox_core::{Priority, StatisticsEvent};
use mikanbox_scheduler::{Actor, ActorScheduler, Flow, Task};

use crate::{control::Control, Game};

/// Installs a new pair, or ends the session when its cells are blocked.
pub(crate) struct Spawn;

impl Spawn {
    pub(crate) fn task() -> Task<Game> {
        Task::new(Priority::SPAWN, Self)
    }
}

impl Actor<Game> for Spawn {
    fn act(
        &mut self,
        scheduler: &mut ActorScheduler<Game>,
        game: &mut Game,
    ) -> anyhow::Result<Flow> {
        if game.is_over() {
            return Ok(Flow::Done);
        }
        if !game.spawn_pair()? {
            info!("spawn cells are blocked; game over");
            game.end();
            return Ok(Flow::Done);
        }

        game.notify(StatisticsEvent::PairSpawned);
        let _ = scheduler.schedule(Task::new(Priority::CONTROL, Control));
        Ok(Flow::Done)
    }

    fn name(&self) -> &'static str {
        "spawn"
    }
}
