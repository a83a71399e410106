//! The car-navigation dial widget.
//!
//! `NavigationDial` owns the configuration, the visual parts, the current
//! navigation state and the animation timeline. It runs entirely on a
//! virtual clock: the host calls [`NavigationDial::advance`] with absolute
//! elapsed time on every tick, then [`NavigationDial::draw`] to collect
//! paint operations. All parameter mutation happens inside those calls, so
//! a frame never observes a half-applied update.

pub mod geometry;
pub mod parts;
pub mod smooth;
pub mod state;
pub mod surface;
pub mod wave;

use std::time::Duration;

use tracing::{debug, warn};

use crate::animation::{AnimGroup, GroupId, Timeline};
use crate::config::DialConfig;

use self::geometry::ViewSize;
use self::parts::Parts;
use self::smooth::{smooth_step, SmoothDriver, Step};
use self::state::{AtFrontState, NavState, NearbyState, SearchState, StateCore, StateKind};
use self::surface::Surface;

/// Animation context for the widget timeline: the visual parts plus the
/// flags animation hooks are allowed to touch.
pub struct Stage {
    pub parts: Parts,
    /// True while the Nearby intermediate composite owns the visual state;
    /// external progress writes are ignored for the duration.
    pub guard: bool,
    /// Latched redraw request, consumed by the host.
    pub redraw: bool,
}

/// Everything the states choreograph: configuration, view, stage and the
/// widget timeline, advanced together on one clock.
pub struct Scene {
    pub cfg: DialConfig,
    pub view: ViewSize,
    pub stage: Stage,
    pub timeline: Timeline<Stage>,
    pub now: Duration,
}

impl Scene {
    fn new(cfg: DialConfig) -> Self {
        let parts = Parts::new(&cfg);
        Self {
            cfg,
            view: ViewSize::default(),
            stage: Stage {
                parts,
                guard: false,
                redraw: false,
            },
            timeline: Timeline::new(),
            now: Duration::ZERO,
        }
    }

    /// Start a group on the widget timeline (start hook fires here).
    pub(crate) fn spawn(&mut self, group: AnimGroup<Stage>) -> GroupId {
        let Self {
            stage,
            timeline,
            now,
            ..
        } = self;
        timeline.spawn(group, *now, stage)
    }

    pub(crate) fn cancel(&mut self, id: GroupId) {
        let Self {
            stage, timeline, ..
        } = self;
        timeline.cancel(id, stage);
    }

    pub(crate) fn request_redraw(&mut self) {
        self.stage.redraw = true;
    }

    /// Advance the widget timeline and the wave emitter to `self.now`.
    fn tick(&mut self) {
        let Self {
            stage,
            timeline,
            now,
            ..
        } = self;
        timeline.advance(*now, stage);
        stage.parts.wave.advance(*now);
        if stage.parts.wave.is_running() {
            stage.redraw = true;
        }
    }
}

/// Outcome of a direct progress write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressWrite {
    /// Value accepted; state re-evaluated.
    Applied,
    /// Value equals the current progress; nothing happened.
    Unchanged,
    /// Rejected: a guarded transition owns the visual state.
    Guarded,
    /// Rejected: value outside [0, 1].
    OutOfRange,
}

/// The widget orchestrator. See the module docs for the clocking model.
pub struct NavigationDial {
    scene: Scene,
    search: SearchState,
    nearby: NearbyState,
    at_front: AtFrontState,
    current: StateKind,
    progress: f32,
    target_progress: f32,
    smooth: SmoothDriver,
}

impl NavigationDial {
    /// Build the dial in its default Search state and lay out all parts.
    pub fn new(cfg: DialConfig) -> Self {
        let mut dial = Self {
            scene: Scene::new(cfg),
            search: SearchState {
                core: StateCore::default(),
            },
            nearby: NearbyState {
                core: StateCore::default(),
            },
            at_front: AtFrontState {
                core: StateCore::default(),
            },
            current: StateKind::Search,
            progress: 0.0,
            target_progress: 0.0,
            smooth: SmoothDriver::default(),
        };
        dial.dispatch(StateKind::Search, |state, scene| state.init_params(scene));
        dial
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn target_progress(&self) -> f32 {
        self.target_progress
    }

    pub fn state(&self) -> StateKind {
        self.current
    }

    pub fn is_guarded(&self) -> bool {
        self.scene.stage.guard
    }

    pub fn view(&self) -> ViewSize {
        self.scene.view
    }

    pub fn config(&self) -> &DialConfig {
        &self.scene.cfg
    }

    /// Direct progress write. Ignored while a guarded transition runs;
    /// rejected outside [0, 1].
    pub fn try_set_progress(&mut self, value: f32) -> ProgressWrite {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            warn!(value, "rejecting out-of-range progress");
            return ProgressWrite::OutOfRange;
        }
        self.write_progress(value)
    }

    fn write_progress(&mut self, value: f32) -> ProgressWrite {
        if self.progress == value {
            return ProgressWrite::Unchanged;
        }
        if self.scene.stage.guard {
            return ProgressWrite::Guarded;
        }
        self.progress = value;
        self.on_progress_changed();
        ProgressWrite::Applied
    }

    fn on_progress_changed(&mut self) {
        let progress = self.progress;
        self.dispatch(self.current, |state, scene| {
            state.update_progress(progress, scene);
        });
        if progress == 1.0 || progress == 0.0 {
            self.transition_to(StateKind::AtFront);
        } else {
            self.set_nearby_state(false);
        }
    }

    /// Force the Nearby state on, or resolve back to AtFront/Search from
    /// the current progress.
    pub fn set_nearby_state(&mut self, nearby: bool) {
        let next = if nearby {
            StateKind::Nearby
        } else if self.progress == 1.0 {
            StateKind::AtFront
        } else {
            StateKind::Search
        };
        self.transition_to(next);
    }

    fn transition_to(&mut self, next: StateKind) {
        // Re-entering the current state is a no-op.
        if next == self.current {
            return;
        }
        debug!(from = ?self.current, to = ?next, "state change");
        self.dispatch(self.current, |state, scene| state.on_exit(scene));
        self.current = next;
        self.dispatch(next, |state, scene| {
            state.init_params(scene);
            state.on_enter(scene);
        });
        self.scene.request_redraw();
    }

    /// Asynchronously drive progress toward `target`. A live driver loop
    /// just picks up the new target on its next step.
    pub fn smoothly_set_progress(&mut self, target: f32) {
        self.target_progress = target;
        if self.smooth.is_active() {
            return;
        }
        self.smooth.start(self.scene.now);
    }

    /// Stop the smooth driver where it is. Idempotent.
    pub fn cancel_smooth_progress(&mut self) {
        self.smooth.cancel();
    }

    /// Width is imposed by the host layout; height adds the car-icon margin.
    /// Propagates the new size to all parts.
    pub fn resize(&mut self, width: f32) {
        let height = width + self.scene.cfg.car_icon_size;
        if self.scene.view.width == width && self.scene.view.height == height {
            return;
        }
        self.scene.view.set(width, height);
        let Scene {
            cfg, view, stage, ..
        } = &mut self.scene;
        stage.parts.on_dimens_changed(cfg, *view);
        self.scene.request_redraw();
    }

    /// Host visibility regained (or first attach): resume the current
    /// state's animations. Idempotent.
    pub fn on_visible(&mut self) {
        self.dispatch(self.current, |state, scene| state.on_enter(scene));
    }

    /// Host visibility lost: force-exit the current state's animations.
    pub fn on_hidden(&mut self) {
        self.dispatch(self.current, |state, scene| state.on_exit(scene));
    }

    /// Advance the whole dial to absolute elapsed time `now`: due smooth
    /// steps first, then the animation timeline and wave emitter.
    pub fn advance(&mut self, now: Duration) {
        self.scene.now = now;
        while self.smooth.take_step(now) {
            match smooth_step(self.progress, self.target_progress) {
                Step::Settle => {
                    self.smooth.cancel();
                    break;
                }
                Step::Snap(value) => {
                    self.write_progress(value);
                    self.smooth.cancel();
                    break;
                }
                Step::Advance(value) => {
                    self.write_progress(value);
                }
            }
        }
        self.scene.tick();
    }

    /// Emit paint operations for all parts in layering order.
    pub fn draw(&self, surface: &mut dyn Surface) {
        let Scene {
            cfg, view, stage, ..
        } = &self.scene;
        stage.parts.draw(cfg, *view, surface);
    }

    /// Consume the redraw latch.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.scene.stage.redraw)
    }

    fn dispatch(&mut self, kind: StateKind, f: impl FnOnce(&mut dyn NavState, &mut Scene)) {
        let scene = &mut self.scene;
        match kind {
            StateKind::Search => f(&mut self.search, scene),
            StateKind::Nearby => f(&mut self.nearby, scene),
            StateKind::AtFront => f(&mut self.at_front, scene),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parts::DialPart;
    use super::*;
    use crate::config::Config;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn dial() -> NavigationDial {
        let cfg = DialConfig::resolve(&Config::default()).unwrap();
        NavigationDial::new(cfg)
    }

    #[test]
    fn starts_in_search_with_parts_laid_out() {
        let d = dial();
        assert_eq!(d.state(), StateKind::Search);
        assert_eq!(d.progress(), 0.0);
        assert!(!d.is_guarded());
        let parts = &d.scene.stage.parts;
        assert_eq!(parts.track_ring.params().opacity, 0.1);
        assert_eq!(parts.car_icon.params().pos.radius, d.scene.cfg.bar_radius);
    }

    #[test]
    fn progress_boundaries_force_at_front() {
        let mut d = dial();
        assert_eq!(d.try_set_progress(0.5), ProgressWrite::Applied);
        assert_eq!(d.state(), StateKind::Search);

        assert_eq!(d.try_set_progress(1.0), ProgressWrite::Applied);
        assert_eq!(d.state(), StateKind::AtFront);

        assert_eq!(d.try_set_progress(0.5), ProgressWrite::Applied);
        assert_eq!(d.state(), StateKind::Search);

        assert_eq!(d.try_set_progress(0.0), ProgressWrite::Applied);
        assert_eq!(d.state(), StateKind::AtFront);
    }

    #[test]
    fn search_progress_rotates_the_car() {
        let mut d = dial();
        d.try_set_progress(0.25);
        let parts = &d.scene.stage.parts;
        assert_eq!(parts.car_icon.params().pos.angle, 0.0);
        assert_eq!(parts.progress_arc.params().pos.angle, 0.0);
        assert_eq!(parts.icon_backdrop.params().pos.angle, 0.0);
        assert_eq!(parts.wave.params().pos.angle, 0.0);
    }

    #[test]
    fn unchanged_write_is_a_noop() {
        let mut d = dial();
        assert_eq!(d.try_set_progress(0.0), ProgressWrite::Unchanged);
        assert_eq!(d.state(), StateKind::Search);
    }

    #[test]
    fn out_of_range_writes_are_rejected() {
        let mut d = dial();
        assert_eq!(d.try_set_progress(1.5), ProgressWrite::OutOfRange);
        assert_eq!(d.try_set_progress(-0.1), ProgressWrite::OutOfRange);
        assert_eq!(d.try_set_progress(f32::NAN), ProgressWrite::OutOfRange);
        assert_eq!(d.progress(), 0.0);
    }

    #[test]
    fn nearby_reentry_is_idempotent() {
        let mut d = dial();
        d.try_set_progress(0.5);
        d.set_nearby_state(true);
        assert_eq!(d.state(), StateKind::Nearby);
        assert!(d.is_guarded());
        let groups_after_enter = d.scene.timeline.len();

        // Second call: identity check short-circuits, no exit/enter runs.
        d.set_nearby_state(true);
        assert_eq!(d.scene.timeline.len(), groups_after_enter);
        assert_eq!(d.state(), StateKind::Nearby);
    }

    #[test]
    fn guard_blocks_external_progress_writes() {
        let mut d = dial();
        d.try_set_progress(0.5);
        d.set_nearby_state(true);
        assert!(d.is_guarded());

        assert_eq!(d.try_set_progress(0.8), ProgressWrite::Guarded);
        assert_eq!(d.progress(), 0.5);

        // The intermediate composite runs 600 ms; past it the guard lifts.
        d.advance(ms(700));
        assert!(!d.is_guarded());
        assert_eq!(d.try_set_progress(0.8), ProgressWrite::Applied);
        assert_eq!(d.progress(), 0.8);
        // A non-boundary write with no nearby signal resolves to Search.
        assert_eq!(d.state(), StateKind::Search);
    }

    #[test]
    fn nearby_exit_plays_reverse_and_guards_again() {
        let mut d = dial();
        d.try_set_progress(0.5);
        d.set_nearby_state(true);
        d.advance(ms(700));
        assert!(!d.is_guarded());

        d.set_nearby_state(false);
        assert_eq!(d.state(), StateKind::Search);
        assert!(d.is_guarded());

        d.advance(ms(1400));
        assert!(!d.is_guarded());
        // Reverse run restores the Search layout endpoints.
        let parts = &d.scene.stage.parts;
        assert_eq!(parts.car_icon.params().opacity, 1.0);
        assert_eq!(parts.track_ring.params().scale, 1.0);
        assert_eq!(
            parts.icon_backdrop.params().pos.radius,
            d.scene.cfg.bar_radius
        );
    }

    #[test]
    fn nearby_runs_the_continuous_wave() {
        let mut d = dial();
        d.try_set_progress(0.5);
        d.set_nearby_state(true);
        assert!(d.scene.stage.parts.wave.is_running());

        d.advance(ms(1500));
        assert!(!d.scene.stage.parts.wave.rings().is_empty());
    }

    #[test]
    fn at_front_starts_wave_and_arrow_fade_in() {
        let mut d = dial();
        // Attach: Search's enter fades the arrival arrow out.
        d.on_visible();
        assert!(d.scene.stage.parts.arrival_arrow.fade_group.is_some());
        d.advance(ms(700));
        assert_eq!(d.scene.stage.parts.arrival_arrow.params().opacity, 0.0);

        d.try_set_progress(1.0);
        assert_eq!(d.state(), StateKind::AtFront);
        assert!(d.scene.stage.parts.wave.is_running());
        assert!(d.scene.stage.parts.arrival_arrow.fade_group.is_some());

        // Arrow fade completes after 650 ms at full opacity.
        d.advance(ms(1400));
        assert_eq!(d.scene.stage.parts.arrival_arrow.params().opacity, 1.0);
    }

    #[test]
    fn smooth_progress_converges_and_lands_at_front() {
        let mut d = dial();
        d.try_set_progress(0.6);
        d.smoothly_set_progress(1.0);

        for tick in 1..=200u64 {
            d.advance(ms(tick * 5));
            assert!(d.progress() <= 1.0);
            assert!(d.progress() >= 0.0);
        }
        assert_eq!(d.progress(), 1.0);
        assert_eq!(d.state(), StateKind::AtFront);
    }

    #[test]
    fn smooth_retarget_reuses_the_live_loop() {
        let mut d = dial();
        d.try_set_progress(0.6);
        d.smoothly_set_progress(0.9);
        d.advance(ms(25));
        assert!(d.progress() > 0.6);

        d.smoothly_set_progress(0.2);
        for tick in 6..=300u64 {
            d.advance(ms(tick * 5));
        }
        assert_eq!(d.progress(), 0.2);
        assert_eq!(d.state(), StateKind::Search);
    }

    #[test]
    fn smooth_cancel_is_idempotent() {
        let mut d = dial();
        d.smoothly_set_progress(0.7);
        d.cancel_smooth_progress();
        d.cancel_smooth_progress();
        d.advance(ms(100));
        assert_eq!(d.progress(), 0.0);
    }

    #[test]
    fn visibility_pauses_and_resumes_animations() {
        let mut d = dial();
        d.try_set_progress(1.0);
        assert!(d.scene.stage.parts.wave.is_running());

        d.on_hidden();
        assert!(!d.scene.stage.parts.wave.is_running());
        d.advance(ms(2000));
        assert!(d.scene.stage.parts.wave.rings().is_empty());

        d.on_visible();
        assert!(d.scene.stage.parts.wave.is_running());
        // Resuming twice is safe: start is a no-op while running.
        d.on_visible();
        assert!(d.scene.stage.parts.wave.is_running());
    }

    #[test]
    fn resize_applies_the_icon_margin_rule() {
        let mut d = dial();
        d.resize(40.0);
        let view = d.view();
        assert_eq!(view.width, 40.0);
        assert_eq!(view.height, 40.0 + d.scene.cfg.car_icon_size);
        assert!(d.take_redraw());
        assert!(!d.take_redraw());
    }

    #[test]
    fn advance_latches_redraw_while_animating() {
        let mut d = dial();
        d.try_set_progress(1.0);
        d.take_redraw();
        d.advance(ms(100));
        assert!(d.take_redraw());
    }
}
