#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scripted policy for Tank Clash.
//!
//! Replays a fixed command sequence, feeding the tank exactly one command
//! whenever its queue runs dry. Useful for choreographed battles and for
//! pinning manoeuvre timings in tests.

use tank_clash_core::{Command, CommandQueue, Observation, Policy};

/// Policy that walks a fixed command script front to back.
#[derive(Clone, Debug)]
pub struct Scripted {
    script: Vec<Command>,
    cursor: usize,
}

impl Scripted {
    /// Creates a policy that will issue the provided commands in order.
    #[must_use]
    pub fn new(script: Vec<Command>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Number of script entries not yet handed to the tank.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len().saturating_sub(self.cursor)
    }
}

impl Policy for Scripted {
    fn think(&mut self, _observation: &Observation<'_>, queue: &mut CommandQueue) {
        if !queue.is_empty() {
            return;
        }
        if let Some(command) = self.script.get(self.cursor).copied() {
            self.cursor += 1;
            let _accepted = queue.push(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Scripted;
    use tank_clash_core::{
        Command, CommandQueue, Facing, FieldView, Observation, Policy, TankColor, TankId,
        TileCoord,
    };

    fn observation() -> Observation<'static> {
        Observation::new(
            TankId::new(0),
            TankColor::Red,
            TileCoord::new(0, 0),
            Facing::Up,
            0,
            &[],
            FieldView::new(&[], &[], 0, 0),
        )
    }

    #[test]
    fn commands_are_issued_in_script_order() {
        let mut policy = Scripted::new(vec![
            Command::Face(Facing::Right),
            Command::Forward,
            Command::Shoot,
        ]);
        let mut queue = CommandQueue::new();

        policy.think(&observation(), &mut queue);
        assert_eq!(queue.pop(), Some(Command::Face(Facing::Right)));
        policy.think(&observation(), &mut queue);
        assert_eq!(queue.pop(), Some(Command::Forward));
        policy.think(&observation(), &mut queue);
        assert_eq!(queue.pop(), Some(Command::Shoot));
        assert_eq!(policy.remaining(), 0);
    }

    #[test]
    fn a_busy_queue_pauses_the_script() {
        let mut policy = Scripted::new(vec![Command::Shoot]);
        let mut queue = CommandQueue::new();
        assert!(queue.push(Command::Forward));

        policy.think(&observation(), &mut queue);
        assert_eq!(policy.remaining(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn an_exhausted_script_stays_silent() {
        let mut policy = Scripted::new(Vec::new());
        let mut queue = CommandQueue::new();

        policy.think(&observation(), &mut queue);
        assert!(queue.is_empty());
        assert_eq!(policy.remaining(), 0);
    }
}
