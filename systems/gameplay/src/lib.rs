#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Gameplay system driving a MikanBox session through the actor scheduler.
//!
//! [`Game`] is the context handed to every actor. [`Game::start`] queues the
//! first spawn; from there on the session unfolds purely through actors:
//! spawning installs a controlled pair, control lowers it until it lands,
//! and a chain check either resolves a cascade step or spawns again. Player
//! input enters through [`Game::submit_input`] as one-shot tasks at
//! [`Priority::INPUT`], which preempt whatever tier is due next.

mod cascade;
mod config;
mod control;
mod source;
mod spawn;
mod statistics;

use log::{debug, info};
use mikanbox_core::{
    Canvas, InputEvent, ItemSource, Priority, Renderable, StatisticsEvent, StatisticsSink,
};
use mikanbox_scheduler::{ActorScheduler, Flow, Task};
use mikanbox_world::{BoxContext, GridError, MikanBox, Motion};
use thiserror::Error;

pub use self::config::{ConfigError, GameConfig};
pub use self::control::{ControlError, ControlledPair, Descent, Orientation};
pub use self::source::SeededItemSource;
pub use self::statistics::{Statistics, POINTS_PER_MIKAN};

use self::{cascade::ChainCheck, spawn::Spawn};

/// Errors raised while assembling a game.
#[derive(Debug, Error)]
pub enum GameError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The grid could not be created.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Context shared by every gameplay actor.
pub struct Game {
    grid: MikanBox,
    source: Box<dyn ItemSource>,
    pair: Option<ControlledPair>,
    statistics: Statistics,
    observers: Vec<Box<dyn StatisticsSink>>,
    cascade: u32,
    over: bool,
}

impl Game {
    /// Creates a game whose items come from a [`SeededItemSource`].
    pub fn new(config: &GameConfig) -> Result<Self, GameError> {
        Self::with_source(config, Box::new(SeededItemSource::new(config)))
    }

    /// Creates a game drawing its items from `source`.
    pub fn with_source(
        config: &GameConfig,
        source: Box<dyn ItemSource>,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let grid = MikanBox::new(config.columns, config.rows, config.square_size)?.with_motion(
            Motion {
                fall_step: config.fall_step,
                spray_speed: config.spray_speed,
            },
        );
        Ok(Self {
            grid,
            source,
            pair: None,
            statistics: Statistics::default(),
            observers: Vec::new(),
            cascade: 0,
            over: false,
        })
    }

    /// Registers an additional observer of statistics events.
    pub fn add_observer(&mut self, observer: Box<dyn StatisticsSink>) {
        self.observers.push(observer);
    }

    /// Queues the first spawn.
    pub fn start(&self, scheduler: &mut ActorScheduler<Game>) {
        info!(
            "starting a {}x{} session",
            self.grid.columns(),
            self.grid.rows()
        );
        let _ = scheduler.schedule(Spawn::task());
    }

    /// Queues a one-shot reaction to `event` ahead of every regular tier.
    ///
    /// Rejected inputs are logged and otherwise ignored.
    pub fn submit_input(scheduler: &mut ActorScheduler<Game>, event: InputEvent) {
        let _ = scheduler.schedule(Task::from_fn(Priority::INPUT, move |_, game: &mut Game| {
            if let Err(error) = game.handle_input(event) {
                debug!("ignored input: {error}");
            }
            Ok(Flow::Done)
        }));
    }

    /// Applies `event` to the controlled pair. Without a pair it does nothing.
    pub fn handle_input(&mut self, event: InputEvent) -> Result<(), ControlError> {
        let Some(pair) = self.pair.as_mut() else {
            debug!("no controlled pair; dropping {event:?}");
            return Ok(());
        };
        match event {
            InputEvent::MoveLeft => pair.shift(&self.grid, event, -1),
            InputEvent::MoveRight => pair.shift(&self.grid, event, 1),
            InputEvent::RotateClockwise => {
                let orientation = pair.orientation().clockwise();
                pair.rotate(&self.grid, event, orientation)
            }
            InputEvent::RotateCounterClockwise => {
                let orientation = pair.orientation().counter_clockwise();
                pair.rotate(&self.grid, event, orientation)
            }
            InputEvent::ReleaseControl => {
                pair.release(&self.grid);
                Ok(())
            }
        }
    }

    /// Draws the grid, the controlled pair and every pending renderable actor.
    pub fn render(&self, scheduler: &ActorScheduler<Game>, canvas: &mut dyn Canvas) {
        self.grid.render(canvas);
        if let Some(pair) = &self.pair {
            pair.render_on(&self.grid, canvas);
        }
        scheduler.render_pending(canvas);
    }

    /// The grid.
    #[must_use]
    pub fn grid(&self) -> &MikanBox {
        &self.grid
    }

    /// The pair currently under player control.
    #[must_use]
    pub fn pair(&self) -> Option<&ControlledPair> {
        self.pair.as_ref()
    }

    /// Statistics accumulated so far.
    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Depth of the cascade in progress, zero between cascades.
    #[must_use]
    pub fn cascade_depth(&self) -> u32 {
        self.cascade
    }

    /// Reports whether the spawn cells were blocked.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.over
    }

    /// Spawn cells of the pivot and the satellite: the top two rows of the
    /// column left of centre.
    #[must_use]
    pub fn spawn_cells(&self) -> [(u32, u32); 2] {
        let column = (self.grid.columns() - 1) / 2;
        let top = self.grid.rows() - 1;
        [(column, top - 1), (column, top)]
    }

    fn notify(&mut self, event: StatisticsEvent) {
        self.statistics.notify(&event);
        for observer in &mut self.observers {
            observer.notify(&event);
        }
    }

    fn fall_speed(&self) -> f32 {
        self.source.fall_speed()
    }

    fn spawn_pair(&mut self) -> Result<bool, GridError> {
        let [(column, pivot_row), (_, satellite_row)] = self.spawn_cells();
        if self.grid.is_occupied(column, pivot_row)?
            || self.grid.is_occupied(column, satellite_row)?
        {
            return Ok(false);
        }
        let pivot = self.source.next_item();
        let satellite = self.source.next_item();
        self.pair = Some(ControlledPair::new(pivot, satellite, column, pivot_row));
        Ok(true)
    }

    fn descend_pair(&mut self, speed: f32) -> Option<Descent> {
        let pair = self.pair.as_mut()?;
        Some(pair.descend(&self.grid, speed))
    }

    fn land_pair(&mut self, scheduler: &mut ActorScheduler<Game>) -> anyhow::Result<()> {
        if let Some(pair) = self.pair.take() {
            pair.land(&mut self.grid)?;
            self.notify(StatisticsEvent::PairLanded);
            let falling = self.grid.drop_mikans(scheduler);
            debug!("pair landed, {falling} item(s) falling");
            let _ = scheduler.schedule(ChainCheck::task());
        }
        Ok(())
    }

    fn deepen_cascade(&mut self) -> u32 {
        self.cascade += 1;
        self.cascade
    }

    fn finish_cascade(&mut self) {
        self.cascade = 0;
    }

    fn end(&mut self) {
        self.over = true;
        self.pair = None;
        self.notify(StatisticsEvent::GameOver);
    }
}

impl BoxContext for Game {
    fn mikan_box(&mut self) -> &mut MikanBox {
        &mut self.grid
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("grid", &self.grid)
            .field("pair", &self.pair)
            .field("statistics", &self.statistics)
            .field("cascade", &self.cascade)
            .field("over", &self.over)
            .finish_non_exhaustive()
    }
}
