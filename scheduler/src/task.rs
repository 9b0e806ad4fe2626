//! Units of deferred work and the actors that perform them.

use std::{cell::RefCell, cmp::Ordering, fmt, rc::Rc};

use mikanbox_core::{compare_priorities, Canvas, Phase, Priority, Renderable};

use crate::ActorScheduler;

/// Outcome of a single actor invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flow {
    /// Re-submit the same task at the same priority for a later tick.
    Continue,
    /// The actor is finished and will not run again.
    Done,
}

/// Behaviour executed when the scheduler selects a task's tier.
///
/// `C` is the context shared by every actor of a scheduler, passed alongside
/// the scheduler so actions can reach the grid and submit follow-up work.
pub trait Actor<C> {
    /// Performs one tick of work.
    ///
    /// An error terminates this actor only; the scheduler logs it and
    /// continues with the rest of the tier.
    fn act(&mut self, scheduler: &mut ActorScheduler<C>, context: &mut C) -> anyhow::Result<Flow>;

    /// Exposes the render capability of actors that have one.
    fn as_renderable(&self) -> Option<&dyn Renderable> {
        None
    }

    /// Short name used in log messages.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

struct FnActor<F> {
    action: F,
}

impl<C, F> Actor<C> for FnActor<F>
where
    F: FnMut(&mut ActorScheduler<C>, &mut C) -> anyhow::Result<Flow>,
{
    fn act(
        &mut self,
        scheduler: &mut ActorScheduler<C>,
        context: &mut C,
    ) -> anyhow::Result<Flow> {
        (self.action)(scheduler, context)
    }

    fn name(&self) -> &'static str {
        "closure"
    }
}

/// A priority paired with a shared handle to an actor.
///
/// Cloning a task clones the handle: submitting both copies runs the same
/// actor twice, once per submission.
pub struct Task<C> {
    priority: Priority,
    actor: Rc<RefCell<dyn Actor<C>>>,
}

impl<C> Task<C> {
    /// Wraps an actor into a task with an immutable priority.
    #[must_use]
    pub fn new<A>(priority: Priority, actor: A) -> Self
    where
        A: Actor<C> + 'static,
    {
        Self {
            priority,
            actor: Rc::new(RefCell::new(actor)),
        }
    }

    /// Wraps a closure into a task.
    #[must_use]
    pub fn from_fn<F>(priority: Priority, action: F) -> Self
    where
        F: FnMut(&mut ActorScheduler<C>, &mut C) -> anyhow::Result<Flow> + 'static,
        C: 'static,
    {
        Self::new(priority, FnActor { action })
    }

    /// Priority the task was created with.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Phase mirrored from the task's priority.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.priority.phase()
    }

    /// Orders two tasks by priority only.
    #[must_use]
    pub fn cmp_priority(&self, other: &Self) -> Ordering {
        compare_priorities(self.priority, other.priority)
    }

    /// Draws the actor when it is renderable and not currently running.
    pub fn render(&self, canvas: &mut dyn Canvas) {
        if let Ok(actor) = self.actor.try_borrow() {
            if let Some(renderable) = actor.as_renderable() {
                renderable.render(canvas);
            }
        }
    }

    pub(crate) fn actor(&self) -> &RefCell<dyn Actor<C>> {
        &self.actor
    }
}

impl<C> Clone for Task<C> {
    fn clone(&self) -> Self {
        Self {
            priority: self.priority,
            actor: Rc::clone(&self.actor),
        }
    }
}

impl<C> fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .actor
            .try_borrow()
            .map(|actor| actor.name())
            .unwrap_or("<running>");
        f.debug_struct("Task")
            .field("priority", &self.priority)
            .field("actor", &name)
            .finish()
    }
}
