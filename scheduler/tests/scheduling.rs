use std::{cell::Cell, cmp::Ordering, rc::Rc};

use anyhow::anyhow;
use mikanbox_core::{Phase, Priority};
use mikanbox_scheduler::{run_until, ActorScheduler, Flow, SchedulerError, Task, TickReport};
use test_log::test;

type Log = Vec<String>;

fn record(priority: Priority, label: &str) -> Task<Log> {
    let label = label.to_owned();
    Task::from_fn(priority, move |_, log: &mut Log| {
        log.push(label.clone());
        Ok(Flow::Done)
    })
}

fn perpetual(priority: Priority, label: &str) -> Task<Log> {
    let label = label.to_owned();
    Task::from_fn(priority, move |_, log: &mut Log| {
        log.push(label.clone());
        Ok(Flow::Continue)
    })
}

#[test]
fn equal_priority_tasks_run_in_submission_order() {
    let mut scheduler = ActorScheduler::new();
    let _ = scheduler
        .schedule(record(Priority::MOVE, "a"))
        .schedule(record(Priority::MOVE, "b"))
        .schedule(record(Priority::MOVE, "c"));

    let mut log = Log::new();
    let _ = scheduler.run(&mut log);

    assert_eq!(log, ["a", "b", "c"]);
    assert!(scheduler.is_empty());
}

#[test]
fn tasks_compare_by_priority_only() {
    let mut scheduler = ActorScheduler::new();
    let _ = scheduler
        .schedule(record(Priority::MOVE, "a"))
        .schedule(perpetual(Priority::MOVE, "b"))
        .schedule(record(Priority::SPAWN, "c"))
        .schedule(record(Priority::INPUT, "d"));

    let pending: Vec<&Task<Log>> = scheduler.pending().collect();
    assert_eq!(pending[0].cmp_priority(pending[1]), Ordering::Equal);
    assert_eq!(pending[1].cmp_priority(pending[2]), Ordering::Less);
    assert_eq!(pending[2].cmp_priority(pending[3]), Ordering::Greater);
    assert_eq!(pending[3].phase(), Phase::Input);
}

#[test]
fn lower_priority_waits_for_the_higher_tier() {
    let mut scheduler = ActorScheduler::new();
    let _ = scheduler
        .schedule(record(Priority::CONTROL, "control"))
        .schedule(record(Priority::SPOIL, "spoil-1"))
        .schedule(record(Priority::SPAWN, "spawn"))
        .schedule(record(Priority::SPOIL, "spoil-2"));

    let mut log = Log::new();
    let _ = scheduler.run(&mut log);
    assert_eq!(log, ["spoil-1", "spoil-2"]);
    assert_eq!(scheduler.len(), 2);

    let _ = scheduler.run(&mut log);
    assert_eq!(log, ["spoil-1", "spoil-2", "control"]);

    let _ = scheduler.run(&mut log);
    assert_eq!(log, ["spoil-1", "spoil-2", "control", "spawn"]);
    assert!(scheduler.is_empty());
}

#[test]
fn negative_tier_preempts_and_runs_as_one_tier() {
    let mut scheduler = ActorScheduler::new();
    let _ = scheduler
        .schedule(record(Priority::SPRAY, "spray"))
        .schedule(record(Priority::new(-1), "input-late"))
        .schedule(record(Priority::new(-5), "input-early"))
        .schedule(record(Priority::new(-1), "input-late-2"));

    let mut log = Log::new();
    let _ = scheduler.run(&mut log);

    assert_eq!(log, ["input-early", "input-late", "input-late-2"]);
    assert!(!scheduler.has_negative());
    assert_eq!(scheduler.count_at(Priority::SPRAY), 1);
}

#[test]
fn queue_drains_after_a_single_run() {
    let mut scheduler = ActorScheduler::new();
    for index in 0..16 {
        let _ = scheduler.schedule(record(Priority::SPRAY, &index.to_string()));
    }

    let mut log = Log::new();
    let _ = scheduler.run(&mut log);

    assert!(scheduler.is_empty());
    let expected: Vec<String> = (0..16).map(|index| index.to_string()).collect();
    assert_eq!(log, expected);
    assert_eq!(scheduler.last_tick().executed, 16);
}

#[test]
fn self_rescheduling_task_stays_pending() {
    let mut scheduler = ActorScheduler::new();
    let _ = scheduler.schedule(perpetual(Priority::MOVE, "tick"));

    let mut log = Log::new();
    for _ in 0..25 {
        let _ = scheduler.run(&mut log);
    }

    assert_eq!(log.len(), 25);
    assert_eq!(scheduler.len(), 1);
    assert_eq!(scheduler.count_at(Priority::MOVE), 1);
}

#[test]
fn rescheduling_task_runs_once_per_selected_tick() {
    let mut scheduler = ActorScheduler::new();
    let _ = scheduler
        .schedule(perpetual(Priority::MOVE, "fall"))
        .schedule(record(Priority::CONTROL, "check"));

    let mut log = Log::new();
    for _ in 0..3 {
        let _ = scheduler.run(&mut log);
    }

    assert_eq!(log, ["fall", "fall", "fall"]);
    assert_eq!(scheduler.count_at(Priority::CONTROL), 1);
}

#[test]
fn tasks_scheduled_during_a_run_land_in_the_next_tick() {
    let mut scheduler = ActorScheduler::new();
    let _ = scheduler.schedule_fn(Priority::SPRAY, |scheduler, log: &mut Log| {
        log.push("first".to_owned());
        let _ = scheduler.schedule(record(Priority::SPRAY, "follow-up"));
        Ok(Flow::Done)
    });

    let mut log = Log::new();
    let _ = scheduler.run(&mut log);
    assert_eq!(log, ["first"]);
    assert_eq!(scheduler.len(), 1);

    let _ = scheduler.run(&mut log);
    assert_eq!(log, ["first", "follow-up"]);
}

#[test]
fn follow_ups_at_a_later_priority_sequence_phases() {
    let mut scheduler = ActorScheduler::new();
    let _ = scheduler.schedule_fn(Priority::CONTROL, |scheduler, log: &mut Log| {
        log.push("check".to_owned());
        let _ = scheduler
            .schedule(record(Priority::SPOIL, "spoil"))
            .schedule(record(Priority::SPRAY, "spray"));
        Ok(Flow::Done)
    });
    let _ = scheduler.schedule(record(Priority::SPAWN, "spawn"));

    let mut log = Log::new();
    let ticks = run_until(&mut scheduler, &mut log, 10, |scheduler, _| scheduler.is_empty())
        .expect("queue drains");

    assert_eq!(ticks, 4);
    assert_eq!(log, ["check", "spray", "spoil", "spawn"]);
}

#[test]
fn failing_action_does_not_disturb_its_tier() {
    let mut scheduler = ActorScheduler::new();
    let _ = scheduler
        .schedule(record(Priority::MOVE, "before"))
        .schedule_fn(Priority::MOVE, |_, _: &mut Log| Err(anyhow!("boom")))
        .schedule(record(Priority::MOVE, "after"))
        .schedule(record(Priority::SPAWN, "later"));

    let mut log = Log::new();
    let _ = scheduler.run(&mut log);

    assert_eq!(log, ["before", "after"]);
    let report = scheduler.last_tick();
    assert_eq!(report.executed, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(scheduler.len(), 1);
}

#[test]
fn run_until_gives_up_at_the_ceiling() {
    let mut scheduler = ActorScheduler::new();
    let _ = scheduler.schedule(perpetual(Priority::MOVE, "forever"));

    let mut log = Log::new();
    let outcome = run_until(&mut scheduler, &mut log, 10, |scheduler, _| scheduler.is_empty());

    assert_eq!(outcome, Err(SchedulerError::Timeout { ticks: 10 }));
    assert_eq!(log.len(), 10);
}

#[test]
fn run_until_returns_immediately_when_condition_holds() {
    let mut scheduler: ActorScheduler<Log> = ActorScheduler::new();
    let mut log = Log::new();
    assert_eq!(
        run_until(&mut scheduler, &mut log, 5, |scheduler, _| scheduler.is_empty()),
        Ok(0)
    );
}

#[test]
fn reentrant_run_defers_a_running_actor() {
    let calls = Rc::new(Cell::new(0));
    let inner = Rc::new(Cell::new(None));
    let task = Task::from_fn(Priority::MOVE, {
        let calls = Rc::clone(&calls);
        let inner = Rc::clone(&inner);
        move |scheduler: &mut ActorScheduler<Log>, log: &mut Log| {
            calls.set(calls.get() + 1);
            if calls.get() == 2 {
                let _ = scheduler.run(log);
                inner.set(Some(scheduler.last_tick()));
            }
            Ok(Flow::Continue)
        }
    });

    let mut scheduler = ActorScheduler::new();
    let _ = scheduler.schedule(task.clone()).schedule(task);
    let mut log = Log::new();
    let _ = scheduler.run(&mut log);

    assert_eq!(calls.get(), 2);
    assert_eq!(
        inner.get(),
        Some(TickReport {
            tier: Some(Priority::MOVE),
            executed: 0,
            failed: 0,
            deferred: 1,
        })
    );
    let outer = scheduler.last_tick();
    assert_eq!(outer.executed, 2);
    assert_eq!(outer.deferred, 1);
    assert_eq!(scheduler.len(), 2);
    assert_eq!(scheduler.count_at(Priority::MOVE), 2);
}
