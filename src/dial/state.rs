//! The three navigation states and their animation choreography.
//!
//! States are tagged variants sharing a common core (shadow progress with
//! change detection, no-op lifecycle hooks by default). Each state owns the
//! visual parts' parameters while it is current; ownership hands over at the
//! exit-then-enter boundary of every transition.

use std::time::Duration;

use crate::animation::{easing, Anim, AnimGroup};

use super::parts::DialPart;
use super::{Scene, Stage};

/// Duration of the Nearby enter/exit composite.
pub(crate) const INTERMEDIATE_DURATION: Duration = Duration::from_millis(600);
const ARROW_FADE_DURATION: Duration = Duration::from_millis(650);

const TRACK_ENLARGE_SCALE: f32 = 1.4;
const BACKDROP_ENLARGE_SCALE: f32 = 3.7;

const AT_FRONT_WAVE_SCALE: (f32, f32) = (0.2, 1.6);
const NEARBY_WAVE_SCALE: (f32, f32) = (1.0, 1.92);

/// Angle of the destination at the top of the dial.
const TOP_ANGLE: f32 = -90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Search,
    Nearby,
    AtFront,
}

/// Shared per-state record.
#[derive(Debug, Default)]
pub(crate) struct StateCore {
    pub progress: f32,
}

pub(crate) trait NavState {
    fn core_mut(&mut self) -> &mut StateCore;

    /// Lay out all visual parts for this state's steady configuration.
    fn init_params(&mut self, scene: &mut Scene);

    fn on_progress_changed(&mut self, _scene: &mut Scene) {}

    fn on_enter(&mut self, _scene: &mut Scene) {}

    fn on_exit(&mut self, _scene: &mut Scene) {}

    /// Update the shadow progress, invoking the change hook when the value
    /// actually moved.
    fn update_progress(&mut self, value: f32, scene: &mut Scene) {
        let changed = self.core_mut().progress != value;
        self.core_mut().progress = value;
        if changed {
            self.on_progress_changed(scene);
        }
    }
}

// ─── Search ─────────────────────────────────────────────────────────────

/// The car circles the ring as progress advances.
pub(crate) struct SearchState {
    pub core: StateCore,
}

impl NavState for SearchState {
    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn init_params(&mut self, scene: &mut Scene) {
        let bar_radius = scene.cfg.bar_radius;
        let arrow_distance = scene.cfg.arrow_distance;
        let parts = &mut scene.stage.parts;
        parts.front_sector.update(|p| p.opacity = 1.0);
        parts.track_ring.update(|p| {
            p.opacity = 0.1;
            p.scale = 1.0;
        });
        parts.car_icon.update(|p| p.pos.set_radius(bar_radius));
        parts.icon_backdrop.update(|p| p.pos.set_radius(bar_radius));
        parts.wave.update(|p| p.pos.set_radius(bar_radius));
        parts
            .arrival_arrow
            .update(|p| p.pos.set(arrow_distance, TOP_ANGLE));
    }

    fn on_progress_changed(&mut self, scene: &mut Scene) {
        let angle = TOP_ANGLE + self.core.progress * 360.0;
        let bar_radius = scene.cfg.bar_radius;
        let parts = &mut scene.stage.parts;
        parts.car_icon.update(|p| p.pos.set(bar_radius, angle));
        parts.icon_backdrop.update(|p| p.pos.set(bar_radius, angle));
        parts.wave.update(|p| p.pos.set(bar_radius, angle));
        parts.progress_arc.update(|p| p.pos.set(bar_radius, angle));
        scene.request_redraw();
    }

    fn on_enter(&mut self, scene: &mut Scene) {
        // Not at the destination: the arrival arrow goes away.
        start_arrow_fade(scene, false);
    }

    fn on_exit(&mut self, scene: &mut Scene) {
        scene.stage.parts.wave.stop();
        stop_arrow_fade(scene);
    }
}

// ─── AtFront ────────────────────────────────────────────────────────────

/// Arrived: the car rests at the top while the wave pulses.
pub(crate) struct AtFrontState {
    pub core: StateCore,
}

impl NavState for AtFrontState {
    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn init_params(&mut self, scene: &mut Scene) {
        let bar_radius = scene.cfg.bar_radius;
        let parts = &mut scene.stage.parts;
        parts.front_sector.update(|p| p.opacity = 1.0);
        parts.track_ring.update(|p| {
            p.opacity = 0.1;
            p.scale = 1.0;
        });
        parts.car_icon.update(|p| {
            p.pos.set(bar_radius, TOP_ANGLE);
            p.scale = 1.0;
            p.opacity = 1.0;
        });
        parts.icon_backdrop.update(|p| {
            p.pos.set(bar_radius, TOP_ANGLE);
            p.scale = 1.0;
            p.opacity = 1.0;
        });
        parts.wave.update(|p| {
            p.pos.set(bar_radius, TOP_ANGLE);
            p.scale = 1.0;
            p.opacity = 1.0;
        });
        parts
            .progress_arc
            .update(|p| p.pos.set(bar_radius, TOP_ANGLE));
    }

    fn on_enter(&mut self, scene: &mut Scene) {
        let now = scene.now;
        let (start, end) = AT_FRONT_WAVE_SCALE;
        scene.stage.parts.wave.start(now, start, end);
        start_arrow_fade(scene, true);
    }

    fn on_exit(&mut self, scene: &mut Scene) {
        scene.stage.parts.wave.stop();
        stop_arrow_fade(scene);
    }
}

// ─── Nearby ─────────────────────────────────────────────────────────────

/// Approaching: everything collapses to an enlarged pulsing center.
pub(crate) struct NearbyState {
    pub core: StateCore,
}

impl NavState for NearbyState {
    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    /// Progress updates are absorbed without reacting while nearby.
    fn update_progress(&mut self, value: f32, _scene: &mut Scene) {
        self.core.progress = value;
    }

    fn init_params(&mut self, scene: &mut Scene) {
        let bar_radius = scene.cfg.bar_radius;
        let parts = &mut scene.stage.parts;
        parts
            .progress_arc
            .update(|p| p.pos.set(bar_radius, TOP_ANGLE));
        parts.front_sector.update(|p| p.opacity = 0.0);
    }

    fn on_enter(&mut self, scene: &mut Scene) {
        self.start_intermediate(scene, false);
        start_arrow_fade(scene, false);
    }

    fn on_exit(&mut self, scene: &mut Scene) {
        self.start_intermediate(scene, true);
    }
}

impl NearbyState {
    /// The 600 ms intermediate composite: position collapses to the center,
    /// icon and sector fade out, the track ring grows ×1.4 and the backdrop
    /// and wave anchor grow ×3.7. External progress writes are guarded for
    /// the whole run. `reverse` plays the same tracks back out.
    fn start_intermediate(&mut self, scene: &mut Scene, reverse: bool) {
        let bar_radius = scene.cfg.bar_radius;
        scene.stage.parts.wave.update(|p| p.pos.set_radius(0.0));

        let seg = |from: f32, to: f32| if reverse { (to, from) } else { (from, to) };

        let (tr_from, tr_to) = seg(0.0, bar_radius);
        let (fade_from, fade_to) = seg(1.0, 0.0);
        let (track_from, track_to) = seg(1.0, TRACK_ENLARGE_SCALE);
        let (grow_from, grow_to) = seg(1.0, BACKDROP_ENLARGE_SCALE);

        let group = AnimGroup::new()
            .with(Anim::new(
                tr_from,
                tr_to,
                INTERMEDIATE_DURATION,
                easing::ALPHA,
                move |stage: &mut Stage, v| {
                    let radius = bar_radius - v;
                    stage.parts.car_icon.update(|p| p.pos.set_radius(radius));
                    stage
                        .parts
                        .icon_backdrop
                        .update(|p| p.pos.set_radius(radius));
                    stage.parts.wave.update(|p| p.pos.set_radius(radius));
                    stage.redraw = true;
                },
            ))
            .with(Anim::new(
                fade_from,
                fade_to,
                INTERMEDIATE_DURATION,
                easing::ALPHA,
                |stage: &mut Stage, v| {
                    stage.parts.car_icon.update(|p| p.opacity = v);
                    stage.parts.front_sector.update(|p| p.opacity = v);
                    stage.redraw = true;
                },
            ))
            .with(Anim::new(
                track_from,
                track_to,
                INTERMEDIATE_DURATION,
                easing::ALPHA,
                |stage: &mut Stage, v| {
                    stage.parts.track_ring.update(|p| p.scale = v);
                },
            ))
            .with(Anim::new(
                grow_from,
                grow_to,
                INTERMEDIATE_DURATION,
                easing::ALPHA,
                |stage: &mut Stage, v| {
                    stage.parts.icon_backdrop.update(|p| p.scale = v);
                    stage.parts.wave.update(|p| p.scale = v);
                    stage.redraw = true;
                },
            ))
            .on_start(|stage: &mut Stage| {
                stage.parts.wave.stop();
                stage.guard = true;
            })
            .on_end(|stage: &mut Stage| {
                stage.guard = false;
            });

        scene.spawn(group);

        if reverse {
            scene.stage.parts.wave.stop();
        } else {
            let now = scene.now;
            let (start, end) = NEARBY_WAVE_SCALE;
            scene.stage.parts.wave.start(now, start, end);
        }
    }
}

// ─── Shared arrow fade helper ───────────────────────────────────────────

/// Fade the arrival arrow toward full or zero opacity. Cancels any previous
/// fade; skips entirely when the arrow already sits at the target.
pub(crate) fn start_arrow_fade(scene: &mut Scene, fade_in: bool) {
    stop_arrow_fade(scene);

    let current = scene.stage.parts.arrival_arrow.params().opacity;
    if (fade_in && current == 1.0) || (!fade_in && current == 0.0) {
        return;
    }

    let (from, to) = if fade_in { (0.0, 1.0) } else { (1.0, 0.0) };
    let group = AnimGroup::new().with(Anim::new(
        from,
        to,
        ARROW_FADE_DURATION,
        easing::ALPHA,
        |stage: &mut Stage, v| {
            stage.parts.arrival_arrow.update(|p| p.opacity = v);
            stage.redraw = true;
        },
    ));
    let id = scene.spawn(group);
    scene.stage.parts.arrival_arrow.fade_group = Some(id);
}

/// Cancel a live arrow fade, if any.
pub(crate) fn stop_arrow_fade(scene: &mut Scene) {
    if let Some(id) = scene.stage.parts.arrival_arrow.fade_group.take() {
        scene.cancel(id);
    }
}
