//! Time-driven value interpolation.
//!
//! Animations run on a virtual clock: the host feeds absolute elapsed time
//! into [`Timeline::advance`] on every render tick, which keeps the whole
//! subsystem deterministic and unit-testable. A [`Timeline`] is generic over
//! the context its update callbacks mutate, so the widget-level timeline and
//! the water-wave's internal timeline stay independently owned.

pub mod easing;

use std::time::Duration;

use self::easing::Curve;

/// Handle identifying a spawned animation group.
pub type GroupId = u64;

type Apply<C> = Box<dyn FnMut(&mut C, f32)>;
type Hook<C> = Box<dyn FnOnce(&mut C)>;

/// A single interpolated value: start/end, duration, easing curve, optional
/// start delay, and an update callback invoked with the current value on
/// every tick while the animation is live.
pub struct Anim<C> {
    from: f32,
    to: f32,
    duration: Duration,
    delay: Duration,
    curve: Curve,
    apply: Apply<C>,
    done: bool,
}

impl<C> Anim<C> {
    pub fn new(
        from: f32,
        to: f32,
        duration: Duration,
        curve: Curve,
        apply: impl FnMut(&mut C, f32) + 'static,
    ) -> Self {
        Self {
            from,
            to,
            duration,
            delay: Duration::ZERO,
            curve,
            apply: Box::new(apply),
            done: false,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn span(&self) -> Duration {
        self.delay + self.duration
    }

    /// Apply the value for group-local time `local`. No callback fires before
    /// the start delay has elapsed or after the terminal value was applied.
    fn tick(&mut self, local: Duration, ctx: &mut C) {
        if self.done || local < self.delay {
            return;
        }
        let t = if self.duration.is_zero() {
            1.0
        } else {
            ((local - self.delay).as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        };
        let value = self.from + (self.to - self.from) * self.curve.apply(t);
        (self.apply)(ctx, value);
        if t >= 1.0 {
            self.done = true;
        }
    }
}

/// A composite of animations running concurrently. The start and end hooks
/// wrap the whole group's lifecycle and fire exactly once each; the end hook
/// also fires when the group is cancelled, so cleanup always runs.
pub struct AnimGroup<C> {
    anims: Vec<Anim<C>>,
    on_start: Option<Hook<C>>,
    on_end: Option<Hook<C>>,
}

impl<C> Default for AnimGroup<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> AnimGroup<C> {
    pub fn new() -> Self {
        Self {
            anims: Vec::new(),
            on_start: None,
            on_end: None,
        }
    }

    pub fn with(mut self, anim: Anim<C>) -> Self {
        self.anims.push(anim);
        self
    }

    pub fn on_start(mut self, hook: impl FnOnce(&mut C) + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    pub fn on_end(mut self, hook: impl FnOnce(&mut C) + 'static) -> Self {
        self.on_end = Some(Box::new(hook));
        self
    }

    fn span(&self) -> Duration {
        self.anims.iter().map(Anim::span).max().unwrap_or_default()
    }
}

struct Running<C> {
    id: GroupId,
    started_at: Duration,
    group: AnimGroup<C>,
}

/// Virtual-time scheduler for animation groups.
pub struct Timeline<C> {
    running: Vec<Running<C>>,
    next_id: GroupId,
}

impl<C> Default for Timeline<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Timeline<C> {
    pub fn new() -> Self {
        Self {
            running: Vec::new(),
            next_id: 0,
        }
    }

    /// Register a group starting at `now`. The start hook fires synchronously,
    /// before this returns, matching animator-set semantics.
    pub fn spawn(&mut self, mut group: AnimGroup<C>, now: Duration, ctx: &mut C) -> GroupId {
        if let Some(hook) = group.on_start.take() {
            hook(ctx);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.running.push(Running {
            id,
            started_at: now,
            group,
        });
        id
    }

    /// Advance every live group to absolute time `now`, firing update
    /// callbacks and retiring (with end hooks) groups whose span has elapsed.
    pub fn advance(&mut self, now: Duration, ctx: &mut C) {
        let mut i = 0;
        while i < self.running.len() {
            let local = now.saturating_sub(self.running[i].started_at);
            for anim in &mut self.running[i].group.anims {
                anim.tick(local, ctx);
            }
            if local >= self.running[i].group.span() {
                let mut retired = self.running.remove(i);
                if let Some(hook) = retired.group.on_end.take() {
                    hook(ctx);
                }
            } else {
                i += 1;
            }
        }
    }

    /// Stop a group immediately. Further update callbacks are suppressed; the
    /// end hook still fires exactly once. Unknown ids are ignored.
    pub fn cancel(&mut self, id: GroupId, ctx: &mut C) {
        if let Some(pos) = self.running.iter().position(|r| r.id == id) {
            let mut cancelled = self.running.remove(pos);
            if let Some(hook) = cancelled.group.on_end.take() {
                hook(ctx);
            }
        }
    }

    /// Cancel every live group.
    pub fn cancel_all(&mut self, ctx: &mut C) {
        while let Some(mut cancelled) = self.running.pop() {
            if let Some(hook) = cancelled.group.on_end.take() {
                hook(ctx);
            }
        }
    }

    pub fn is_running(&self, id: GroupId) -> bool {
        self.running.iter().any(|r| r.id == id)
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::time::Duration;

    #[derive(Default)]
    struct Probe {
        value: f32,
        starts: u32,
        ends: u32,
        updates: u32,
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn value_group() -> AnimGroup<Probe> {
        AnimGroup::new()
            .with(Anim::new(
                0.0,
                10.0,
                ms(100),
                Curve::Linear,
                |p: &mut Probe, v| {
                    p.value = v;
                    p.updates += 1;
                },
            ))
            .on_start(|p: &mut Probe| p.starts += 1)
            .on_end(|p: &mut Probe| p.ends += 1)
    }

    #[test]
    fn start_hook_fires_synchronously_at_spawn() {
        let mut tl = Timeline::new();
        let mut probe = Probe::default();
        tl.spawn(value_group(), ms(0), &mut probe);
        assert_eq!(probe.starts, 1);
        assert_eq!(probe.ends, 0);
    }

    #[test]
    fn linear_interpolation_and_completion() {
        let mut tl = Timeline::new();
        let mut probe = Probe::default();
        let id = tl.spawn(value_group(), ms(0), &mut probe);

        tl.advance(ms(50), &mut probe);
        assert_abs_diff_eq!(probe.value, 5.0, epsilon = 1e-4);
        assert!(tl.is_running(id));

        tl.advance(ms(100), &mut probe);
        assert_abs_diff_eq!(probe.value, 10.0, epsilon = 1e-4);
        assert!(!tl.is_running(id));
        assert_eq!(probe.starts, 1);
        assert_eq!(probe.ends, 1);
    }

    #[test]
    fn delay_suppresses_updates_until_due() {
        let mut tl = Timeline::new();
        let mut probe = Probe::default();
        let group = AnimGroup::new().with(
            Anim::new(1.0, 2.0, ms(100), Curve::Linear, |p: &mut Probe, v| {
                p.value = v;
                p.updates += 1;
            })
            .with_delay(ms(200)),
        );
        tl.spawn(group, ms(0), &mut probe);

        tl.advance(ms(150), &mut probe);
        assert_eq!(probe.updates, 0);

        tl.advance(ms(250), &mut probe);
        assert_eq!(probe.updates, 1);
        assert_abs_diff_eq!(probe.value, 1.5, epsilon = 1e-4);

        tl.advance(ms(300), &mut probe);
        assert_abs_diff_eq!(probe.value, 2.0, epsilon = 1e-4);
        assert!(tl.is_idle());
    }

    #[test]
    fn cancel_fires_end_hook_once_and_suppresses_updates() {
        let mut tl = Timeline::new();
        let mut probe = Probe::default();
        let id = tl.spawn(value_group(), ms(0), &mut probe);

        tl.advance(ms(30), &mut probe);
        let updates_before = probe.updates;

        tl.cancel(id, &mut probe);
        assert_eq!(probe.ends, 1);

        // Double cancel is a no-op.
        tl.cancel(id, &mut probe);
        assert_eq!(probe.ends, 1);

        tl.advance(ms(90), &mut probe);
        assert_eq!(probe.updates, updates_before);
    }

    #[test]
    fn completed_anim_stops_reapplying_while_group_lives() {
        let mut tl = Timeline::new();
        let mut probe = Probe::default();
        let group = AnimGroup::new()
            .with(Anim::new(
                0.0,
                1.0,
                ms(50),
                Curve::Linear,
                |p: &mut Probe, _| p.updates += 1,
            ))
            .with(Anim::new(0.0, 1.0, ms(500), Curve::Linear, |_, _| {}));
        tl.spawn(group, ms(0), &mut probe);

        tl.advance(ms(50), &mut probe);
        let updates_before = probe.updates;
        tl.advance(ms(200), &mut probe);
        tl.advance(ms(400), &mut probe);
        assert_eq!(probe.updates, updates_before);
        assert!(!tl.is_idle());

        tl.advance(ms(500), &mut probe);
        assert!(tl.is_idle());
    }
}
