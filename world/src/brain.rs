//! Per-tank command queue plus the policy harness around it.
//!
//! A brain couples one tank to one [`CommandQueue`] and, optionally, one
//! boxed [`Policy`]. The harness shields the tick loop from misbehaving
//! policies: a panic inside `think` is caught, the queue is restored to its
//! pre-think contents and the policy is dropped so it never runs again.
//! Detaching a brain is irrevocable; a detached brain neither thinks nor
//! yields queued commands.

use std::panic::{self, AssertUnwindSafe};

use tank_clash_core::{Command, CommandQueue, Observation, Policy};

/// What happened when a brain was given its per-tick chance to think.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ThinkOutcome {
    /// No attached policy, or the brain is detached; nothing ran.
    Skipped,
    /// The policy ran to completion.
    Thought,
    /// The policy panicked; it was dropped and the queue rolled back.
    Faulted,
}

#[derive(Debug, Default)]
pub(crate) struct Brain {
    queue: CommandQueue,
    policy: Option<Box<dyn Policy>>,
    detached: bool,
}

impl Brain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Attaches a policy, reporting whether the brain accepted it.
    pub(crate) fn install_policy(&mut self, policy: Box<dyn Policy>) -> bool {
        if self.detached {
            return false;
        }
        self.policy = Some(policy);
        true
    }

    /// Runs the attached policy once against the observation.
    pub(crate) fn think(&mut self, observation: &Observation<'_>) -> ThinkOutcome {
        if self.detached {
            return ThinkOutcome::Skipped;
        }
        let Some(policy) = self.policy.as_mut() else {
            return ThinkOutcome::Skipped;
        };
        let rollback = self.queue.clone();
        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            policy.think(observation, &mut self.queue);
        }));
        if run.is_err() {
            self.queue = rollback;
            self.policy = None;
            return ThinkOutcome::Faulted;
        }
        ThinkOutcome::Thought
    }

    /// Removes and returns the oldest pending command, unless detached.
    pub(crate) fn pop(&mut self) -> Option<Command> {
        if self.detached {
            return None;
        }
        self.queue.pop()
    }

    /// Appends a command injected from outside the policy.
    pub(crate) fn push(&mut self, command: Command) -> bool {
        self.queue.push(command)
    }

    pub(crate) fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// Severs the brain from its tank. There is no way back.
    pub(crate) fn detach(&mut self) {
        self.detached = true;
        self.policy = None;
        self.queue.forget();
    }

    pub(crate) const fn is_detached(&self) -> bool {
        self.detached
    }
}
