#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cooperative, single-threaded actor scheduler for MikanBox.
//!
//! Every call to [`ActorScheduler::run`] executes exactly one priority tier:
//! all negative-priority tasks when any are pending, otherwise the run of
//! tasks sharing the lowest non-negative priority. Tasks scheduled while a
//! tier executes land in the next tick. Multi-phase cascades therefore unfold
//! purely through actors re-submitting themselves or follow-up actors at the
//! priority of the phase that should come next.

mod task;

use log::{trace, warn};
use mikanbox_core::{Canvas, Phase, Priority};
use thiserror::Error;

pub use self::task::{Actor, Flow, Task};

/// Errors reported by scheduler harnesses.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// The awaited condition did not hold within the tick ceiling.
    #[error("condition not reached within {ticks} ticks")]
    Timeout {
        /// Number of ticks that were run before giving up.
        ticks: usize,
    },
}

/// Summary of the most recent [`ActorScheduler::run`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Priority of the tier that executed, `None` when the queue was empty.
    pub tier: Option<Priority>,
    /// Number of actions invoked, including failed ones.
    pub executed: usize,
    /// Number of actions that returned an error.
    pub failed: usize,
    /// Number of tasks kept pending because their actor was already running,
    /// including deferrals inside nested `run` calls made by this tier.
    pub deferred: usize,
}

impl TickReport {
    /// Phase mirrored from the executed tier.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        self.tier.as_ref().map(Priority::phase)
    }
}

enum Execution {
    Finished,
    Failed,
    Deferred,
}

/// Priority-tiered queue of pending tasks sharing a context `C`.
pub struct ActorScheduler<C> {
    pending: Vec<Task<C>>,
    ticks: u64,
    deferrals: usize,
    last_tick: TickReport,
}

impl<C> ActorScheduler<C> {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            ticks: 0,
            deferrals: 0,
            last_tick: TickReport::default(),
        }
    }

    /// Appends a task to the pending collection.
    pub fn schedule(&mut self, task: Task<C>) -> &mut Self {
        self.pending.push(task);
        self
    }

    /// Wraps a closure into a task and schedules it.
    pub fn schedule_fn<F>(&mut self, priority: Priority, action: F) -> &mut Self
    where
        F: FnMut(&mut ActorScheduler<C>, &mut C) -> anyhow::Result<Flow> + 'static,
        C: 'static,
    {
        self.schedule(Task::from_fn(priority, action))
    }

    /// Executes a single priority tier against the provided context.
    pub fn run(&mut self, context: &mut C) -> &mut Self {
        if self.pending.is_empty() {
            self.last_tick = TickReport::default();
            return self;
        }
        self.ticks += 1;
        let deferrals_before = self.deferrals;

        let mut tier = std::mem::take(&mut self.pending);
        tier.sort_by_key(Task::priority);

        let negative_end = tier.partition_point(|task| task.priority().is_urgent());
        let tier_end = if negative_end > 0 {
            negative_end
        } else {
            let lowest = tier[0].priority();
            tier.partition_point(|task| task.priority() <= lowest)
        };
        let remainder = tier.split_off(tier_end);

        let mut report = TickReport {
            tier: tier.first().map(Task::priority),
            ..TickReport::default()
        };
        for task in tier {
            match self.execute(task, context) {
                Execution::Finished => report.executed += 1,
                Execution::Failed => {
                    report.executed += 1;
                    report.failed += 1;
                }
                Execution::Deferred => {}
            }
        }
        report.deferred = self.deferrals.wrapping_sub(deferrals_before);

        self.pending.extend(remainder);
        trace!(
            "tick {}: ran {} task(s) of {:?}, {} pending",
            self.ticks,
            report.executed,
            report.tier,
            self.pending.len()
        );
        self.last_tick = report;
        self
    }

    fn execute(&mut self, task: Task<C>, context: &mut C) -> Execution {
        let outcome = match task.actor().try_borrow_mut() {
            Ok(mut actor) => {
                let result = actor.act(self, context);
                Some((actor.name(), result))
            }
            Err(_) => None,
        };

        match outcome {
            None => {
                warn!(
                    "task at {} is already running; keeping it pending",
                    task.priority()
                );
                self.pending.push(task);
                self.deferrals = self.deferrals.wrapping_add(1);
                Execution::Deferred
            }
            Some((_, Ok(Flow::Continue))) => {
                self.pending.push(task);
                Execution::Finished
            }
            Some((_, Ok(Flow::Done))) => Execution::Finished,
            Some((name, Err(error))) => {
                warn!("{name} at {} failed: {error:#}", task.priority());
                Execution::Failed
            }
        }
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Reports whether no task is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Iterator over the pending tasks.
    pub fn pending(&self) -> impl Iterator<Item = &Task<C>> {
        self.pending.iter()
    }

    /// Reports whether any negative-priority task is pending.
    #[must_use]
    pub fn has_negative(&self) -> bool {
        self.pending.iter().any(|task| task.priority().is_urgent())
    }

    /// Number of pending tasks at exactly `priority`.
    #[must_use]
    pub fn count_at(&self, priority: Priority) -> usize {
        self.pending
            .iter()
            .filter(|task| task.priority() == priority)
            .count()
    }

    /// Number of `run` calls that executed a tier.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Summary of the most recent `run` call.
    #[must_use]
    pub fn last_tick(&self) -> TickReport {
        self.last_tick
    }

    /// Renders every pending actor that exposes the render capability.
    pub fn render_pending(&self, canvas: &mut dyn Canvas) {
        for task in &self.pending {
            task.render(canvas);
        }
    }
}

impl<C> Default for ActorScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for ActorScheduler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorScheduler")
            .field("pending", &self.pending)
            .field("ticks", &self.ticks)
            .finish()
    }
}

/// Runs the scheduler until `predicate` holds, at most `max_ticks` times.
///
/// Returns the number of `run` calls performed. Harnesses waiting on the
/// scheduler must go through this ceiling instead of looping unbounded.
pub fn run_until<C, P>(
    scheduler: &mut ActorScheduler<C>,
    context: &mut C,
    max_ticks: usize,
    mut predicate: P,
) -> Result<usize, SchedulerError>
where
    P: FnMut(&ActorScheduler<C>, &C) -> bool,
{
    for ticks in 0..max_ticks {
        if predicate(scheduler, context) {
            return Ok(ticks);
        }
        let _ = scheduler.run(context);
    }
    if predicate(scheduler, context) {
        Ok(max_ticks)
    } else {
        Err(SchedulerError::Timeout { ticks: max_ticks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger(label: &'static str) -> Task<Vec<&'static str>> {
        Task::from_fn(Priority::SPRAY, move |_, log: &mut Vec<&'static str>| {
            log.push(label);
            Ok(Flow::Done)
        })
    }

    #[test]
    fn empty_run_is_a_no_op() {
        let mut scheduler: ActorScheduler<Vec<&'static str>> = ActorScheduler::new();
        let mut log = Vec::new();
        let _ = scheduler.run(&mut log);
        assert!(log.is_empty());
        assert_eq!(scheduler.ticks(), 0);
        assert_eq!(scheduler.last_tick(), TickReport::default());
    }

    #[test]
    fn duplicate_submission_runs_the_actor_twice() {
        let mut scheduler = ActorScheduler::new();
        let task = logger("twice");
        let _ = scheduler.schedule(task.clone()).schedule(task);
        let mut log = Vec::new();
        let _ = scheduler.run(&mut log);
        assert_eq!(log, vec!["twice", "twice"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn report_mirrors_the_executed_phase() {
        let mut scheduler = ActorScheduler::new();
        let _ = scheduler.schedule(logger("a"));
        let mut log = Vec::new();
        let _ = scheduler.run(&mut log);
        let report = scheduler.last_tick();
        assert_eq!(report.phase(), Some(Phase::Spray));
        assert_eq!(report.executed, 1);
        assert_eq!(report.failed, 0);
    }
}
