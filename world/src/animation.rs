//! Progress tracking for timed tank manoeuvres.
//!
//! An [`Animation`] measures how far a manoeuvre has advanced toward a fixed
//! target value. Drives measure distance in field units and tick forward at
//! the tank's current ground speed; turns measure seconds and tick forward at
//! unit speed. The world never interpolates grid state from an animation: the
//! grid cell changes only once the animation reports completion.

/// Accumulates progress toward a fixed target at a modulated speed.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Animation {
    elapsed: f32,
    target: f32,
    speed: f32,
}

impl Animation {
    pub(crate) fn new(target: f32, speed: f32) -> Self {
        Self {
            elapsed: 0.0,
            target,
            speed,
        }
    }

    /// Advances progress by `dt` seconds scaled by the current speed, never
    /// past the target.
    pub(crate) fn update(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt * self.speed).min(self.target);
    }

    /// Replaces the speed used by subsequent updates.
    pub(crate) fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Whether the full target has elapsed. A zero-target animation is done
    /// before its first update.
    pub(crate) fn done(&self) -> bool {
        self.elapsed >= self.target
    }

    /// Progress as a fraction in `[0, 1]`.
    pub(crate) fn unit(&self) -> f32 {
        if self.target <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.target).clamp(0.0, 1.0)
        }
    }

    /// Raw progress accumulated so far.
    pub(crate) fn value(&self) -> f32 {
        self.elapsed
    }
}
