//! Fixed-tick interpolation of the progress scalar toward a target.
//!
//! One step per 5 ms of virtual time; each step closes 1/20 of the remaining
//! distance, which decays the error to the snap epsilon in roughly 100 ms.
//! The driver is cooperative: the dial owns the progress scalar and applies
//! the step results through its own guarded write path.

use std::time::Duration;

/// Interval between driver steps.
pub(crate) const STEP: Duration = Duration::from_millis(5);

/// Remaining-delta magnitude below which the value snaps to the target.
pub(crate) const SNAP_EPSILON: f32 = 1e-4;

const STEP_DIVISOR: f32 = 20.0;

/// Outcome of one driver step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Step {
    /// Already at the target; the loop stops without writing.
    Settle,
    /// Write this value, then stop.
    Snap(f32),
    /// Write this value and keep looping.
    Advance(f32),
}

/// One iteration of the driver loop body.
///
/// Overshoot past the target in the delta's direction snaps to the target;
/// anything else is clamped to the absolute [0, 1] bounds. The clamp only
/// matters when the target itself lies outside [0, 1]; in-range targets are
/// caught by the overshoot snap first.
pub(crate) fn smooth_step(current: f32, target: f32) -> Step {
    let delta = (target - current) / STEP_DIVISOR;
    if current == target {
        return Step::Settle;
    }
    if delta.abs() < SNAP_EPSILON {
        return Step::Snap(target);
    }
    let next = current + delta;
    if (delta > 0.0 && next >= target) || (delta < 0.0 && next <= target) {
        return Step::Advance(target);
    }
    Step::Advance(next.clamp(0.0, 1.0))
}

/// Schedules driver steps on the virtual clock. At most one loop is ever
/// active; retargeting a live loop changes nothing here.
#[derive(Debug, Default)]
pub(crate) struct SmoothDriver {
    active: bool,
    next_step_at: Duration,
}

impl SmoothDriver {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&mut self, now: Duration) {
        self.active = true;
        self.next_step_at = now + STEP;
    }

    /// Idempotent; cancelling an inactive driver is a no-op.
    pub fn cancel(&mut self) {
        self.active = false;
    }

    /// Consume one due step, advancing the step deadline. Returns false when
    /// inactive or not yet due.
    pub fn take_step(&mut self, now: Duration) -> bool {
        if self.active && now >= self.next_step_at {
            self.next_step_at += STEP;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn converges_to_exact_target_within_bounds() {
        let mut current = 0.6f32;
        let target = 1.0f32;
        let mut steps = 0;
        loop {
            match smooth_step(current, target) {
                Step::Settle => break,
                Step::Snap(v) => {
                    current = v;
                    break;
                }
                Step::Advance(v) => current = v,
            }
            assert!(current <= 1.0, "overshoot at step {steps}: {current}");
            assert!(current >= 0.0, "negative at step {steps}: {current}");
            steps += 1;
            assert!(steps < 10_000, "failed to converge");
        }
        assert_eq!(current, 1.0);
        // Exponential decay to the epsilon takes on the order of 100 steps.
        assert!(steps > 20);
    }

    #[test]
    fn converges_downward_too() {
        let mut current = 0.9f32;
        let target = 0.25f32;
        for _ in 0..10_000 {
            match smooth_step(current, target) {
                Step::Settle => break,
                Step::Snap(v) => {
                    current = v;
                    break;
                }
                Step::Advance(v) => current = v,
            }
        }
        assert_eq!(current, 0.25);
    }

    #[test]
    fn settled_value_stops_without_writing() {
        assert_eq!(smooth_step(0.5, 0.5), Step::Settle);
    }

    #[test]
    fn tiny_delta_snaps_to_target() {
        assert_eq!(smooth_step(0.5, 0.5004), Step::Snap(0.5004));
    }

    #[test]
    fn out_of_range_target_is_clamped() {
        // Only reachable with a target outside [0, 1]; movement clamps at 1.
        match smooth_step(0.999, 1.5) {
            Step::Advance(v) => assert!(v <= 1.0),
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn driver_steps_on_the_five_unit_grid() {
        let mut driver = SmoothDriver::default();
        assert!(!driver.take_step(ms(100)));

        driver.start(ms(0));
        assert!(!driver.take_step(ms(4)));
        assert!(driver.take_step(ms(5)));
        assert!(!driver.take_step(ms(7)));
        // A long gap yields the missed steps one by one.
        assert!(driver.take_step(ms(20)));
        assert!(driver.take_step(ms(20)));
        assert!(driver.take_step(ms(20)));
        assert!(!driver.take_step(ms(20)));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut driver = SmoothDriver::default();
        driver.start(ms(0));
        driver.cancel();
        driver.cancel();
        assert!(!driver.is_active());
        assert!(!driver.take_step(ms(50)));
    }
}
