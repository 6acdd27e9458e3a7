#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wandering hunter policy for Tank Clash.
//!
//! The tank drives ahead until something blocks its path, then turns toward
//! the first living opponent it can see, shooting opportunistically along the
//! way. Direction choices roll dice from a policy-owned seeded generator, so
//! a battle replays identically for the same seed.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tank_clash_core::{
    Command, CommandQueue, Facing, Observation, Policy, TankState, Tile, TileCoord,
};

/// Construction parameters for a [`Wander`] policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Seed for the policy's private dice stream.
    pub seed: u64,
}

/// Policy that wanders the field and hunts the first living opponent.
#[derive(Debug)]
pub struct Wander {
    rng: ChaCha8Rng,
    thinks: u64,
}

impl Wander {
    /// Creates a wander policy rolling dice from the configured seed.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            thinks: 0,
        }
    }

    /// Number of times the policy has been asked to think.
    #[must_use]
    pub const fn thinks(&self) -> u64 {
        self.thinks
    }

    /// Picks a facing that closes in on the first living opponent.
    ///
    /// One axis is chosen by dice; when the hunter is already level with its
    /// prey on that axis the other axis is used instead. A facing whose next
    /// cell is unsafe is discarded. Keeping the current facing or giving up
    /// entirely both queue a shot, since either means the prey is in reach or
    /// the hunter is cornered.
    fn hunt_facing(&mut self, observation: &Observation<'_>, queue: &mut CommandQueue) -> Facing {
        let Some(enemy) = observation
            .opponents()
            .iter()
            .find(|tank| tank.state != TankState::Dead)
        else {
            queue.shoot();
            return self.random_facing(observation);
        };

        let cell = observation.cell();
        let mut candidates: Vec<Facing> = Vec::new();
        let horizontal = self.rng.gen_range(0..2) == 0;
        let mut vertical = !horizontal;
        if horizontal {
            if cell.column() > enemy.cell.column() {
                candidates.push(Facing::Left);
            } else if cell.column() < enemy.cell.column() {
                candidates.push(Facing::Right);
            } else {
                vertical = true;
            }
        }
        if vertical {
            if cell.row() > enemy.cell.row() {
                candidates.push(Facing::Up);
            } else if cell.row() < enemy.cell.row() {
                candidates.push(Facing::Down);
            }
        }

        let good: Vec<Facing> = candidates
            .iter()
            .copied()
            .filter(|facing| is_safe(observation, cell.offset(facing.vector())))
            .collect();

        if good.contains(&observation.facing()) {
            queue.shoot();
            return observation.facing();
        }
        if let Some(first) = good.first() {
            return *first;
        }
        queue.shoot();
        self.random_facing(observation)
    }

    /// Picks any safe facing other than the current one, falling back to an
    /// unsafe one when the tank is boxed in.
    fn random_facing(&mut self, observation: &Observation<'_>) -> Facing {
        let current = observation.facing();
        let candidates: Vec<Facing> = [Facing::Up, Facing::Down, Facing::Left, Facing::Right]
            .into_iter()
            .filter(|facing| *facing != current)
            .collect();
        let good: Vec<Facing> = candidates
            .iter()
            .copied()
            .filter(|facing| is_safe(observation, observation.cell().offset(facing.vector())))
            .collect();
        let pool = if good.is_empty() { &candidates } else { &good };
        pool.choose(&mut self.rng).copied().unwrap_or(current)
    }
}

impl Policy for Wander {
    fn think(&mut self, observation: &Observation<'_>, queue: &mut CommandQueue) {
        self.thinks = self.thinks.saturating_add(1);

        let (tile, item) = observation.radar(observation.cell_ahead());
        let blocked = item.is_some() || tile.map_or(true, Tile::is_hazard);

        if blocked {
            queue.forget();
            let target = self.hunt_facing(observation, queue);
            queue.face(target);
            queue.shoot();
        } else if self.rng.gen_range(0..3) == 0 {
            let target = self.hunt_facing(observation, queue);
            queue.face(target);
            queue.shoot();
        }

        if self.rng.gen_range(0..3) == 0 {
            queue.shoot();
        }

        if !queue.contains(Command::Forward) {
            queue.forward();
        }
    }
}

/// A cell is safe to drive into when it is on the field, carries no item and
/// its terrain is not a hazard.
fn is_safe(observation: &Observation<'_>, cell: TileCoord) -> bool {
    let (tile, item) = observation.radar(cell);
    item.is_none() && tile.map_or(false, |tile| !tile.is_hazard())
}
