//! The radiating "water wave" pulse around the car icon.
//!
//! Each cycle spawns one expanding, fading ring as a four-way composite
//! animation and unconditionally re-arms the next cycle on a fixed cadence.
//! The cadence (1000 ms) is shorter than a cycle's span (4500 ms), so several
//! rings are in flight at once. Stopping cancels both owned schedules: the
//! pending re-arm deadline and every in-flight ring group.

use std::time::Duration;

use tracing::debug;

use crate::animation::{easing, Anim, AnimGroup, Timeline};
use crate::config::DialConfig;

use super::geometry::ViewSize;
use super::parts::{DialPart, PartBase};
use super::surface::Surface;

/// Interval between ring cycles.
pub(crate) const CYCLE_INTERVAL: Duration = Duration::from_millis(1000);

const ENLARGE_DURATION: Duration = Duration::from_millis(4500);
const FADE_IN_DURATION: Duration = Duration::from_millis(500);
const FADE_OUT_DURATION: Duration = Duration::from_millis(2500);
const BLUR_DURATION: Duration = Duration::from_millis(2500);
const LATE_TRACK_DELAY: Duration = Duration::from_millis(2000);
const PEAK_OPACITY: f32 = 0.2;

/// One ephemeral expanding ring. Created when its cycle starts, destroyed
/// when the cycle's composite completes or is cancelled.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveRing {
    id: u64,
    pub radius: f32,
    pub opacity: f32,
    pub blur: f32,
}

fn ring_mut(rings: &mut [WaveRing], id: u64) -> Option<&mut WaveRing> {
    rings.iter_mut().find(|ring| ring.id == id)
}

/// The wave visual part with its embedded self-rescheduling emitter.
pub struct WaterWave {
    base: PartBase,
    bg_radius: f32,
    enabled: bool,
    scale_range: (f32, f32),
    rings: Vec<WaveRing>,
    cycles: Timeline<Vec<WaveRing>>,
    rearm_at: Option<Duration>,
    next_ring_id: u64,
}

impl WaterWave {
    pub fn new(bg_radius: f32) -> Self {
        Self {
            base: PartBase::default(),
            bg_radius,
            enabled: false,
            scale_range: (0.0, 0.0),
            rings: Vec::new(),
            cycles: Timeline::new(),
            rearm_at: None,
            next_ring_id: 0,
        }
    }

    /// Begin emitting rings growing from `scale_start` to `scale_end`.
    /// A no-op while cycles are already in flight.
    pub fn start(&mut self, now: Duration, scale_start: f32, scale_end: f32) {
        if !self.cycles.is_idle() {
            return;
        }
        debug!(scale_start, scale_end, "wave start");
        self.enabled = true;
        self.scale_range = (scale_start, scale_end);
        self.spawn_cycle(now);
    }

    fn spawn_cycle(&mut self, now: Duration) {
        if !self.enabled {
            return;
        }
        let id = self.next_ring_id;
        self.next_ring_id += 1;
        let bg = self.bg_radius;
        let (scale_start, scale_end) = self.scale_range;

        let group = AnimGroup::new()
            .with(Anim::new(
                scale_start,
                scale_end,
                ENLARGE_DURATION,
                easing::SCALE,
                move |rings: &mut Vec<WaveRing>, v| {
                    if let Some(ring) = ring_mut(rings, id) {
                        ring.radius = bg * v;
                    }
                },
            ))
            .with(Anim::new(
                0.0,
                PEAK_OPACITY,
                FADE_IN_DURATION,
                easing::ALPHA,
                move |rings: &mut Vec<WaveRing>, v| {
                    if let Some(ring) = ring_mut(rings, id) {
                        ring.opacity = v;
                    }
                },
            ))
            .with(
                Anim::new(
                    PEAK_OPACITY,
                    0.0,
                    FADE_OUT_DURATION,
                    easing::ALPHA,
                    move |rings: &mut Vec<WaveRing>, v| {
                        if let Some(ring) = ring_mut(rings, id) {
                            ring.opacity = v;
                        }
                    },
                )
                .with_delay(LATE_TRACK_DELAY),
            )
            .with(
                Anim::new(
                    0.0,
                    1.0,
                    BLUR_DURATION,
                    easing::ALPHA,
                    move |rings: &mut Vec<WaveRing>, v| {
                        if let Some(ring) = ring_mut(rings, id) {
                            ring.blur = v;
                        }
                    },
                )
                .with_delay(LATE_TRACK_DELAY),
            )
            .on_start(move |rings: &mut Vec<WaveRing>| {
                rings.push(WaveRing {
                    id,
                    radius: bg,
                    opacity: 0.0,
                    blur: 0.0,
                });
            })
            .on_end(move |rings: &mut Vec<WaveRing>| {
                rings.retain(|ring| ring.id != id);
            });

        self.cycles.spawn(group, now, &mut self.rings);
        self.rearm_at = Some(now + CYCLE_INTERVAL);
    }

    /// Advance in-flight rings and fire a due re-arm.
    pub fn advance(&mut self, now: Duration) {
        if self.rearm_at.is_some_and(|deadline| now >= deadline) {
            self.rearm_at = None;
            self.spawn_cycle(now);
        }
        self.cycles.advance(now, &mut self.rings);
    }

    /// Stop emitting: clear live rings, cancel all in-flight cycle groups
    /// and the pending re-arm. Idempotent, safe before any start.
    pub fn stop(&mut self) {
        if self.enabled || !self.cycles.is_idle() {
            debug!("wave stop");
        }
        self.enabled = false;
        self.rearm_at = None;
        self.rings.clear();
        self.cycles.cancel_all(&mut self.rings);
    }

    pub fn rings(&self) -> &[WaveRing] {
        &self.rings
    }

    /// True while any cycle group is in flight.
    pub fn is_running(&self) -> bool {
        !self.cycles.is_idle()
    }
}

impl DialPart for WaterWave {
    fn base(&self) -> &PartBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut PartBase {
        &mut self.base
    }

    fn draw(&self, cfg: &DialConfig, view: ViewSize, surface: &mut dyn Surface) {
        let center = self.base.draw_pos(view);
        let anchor_scale = self.base.params().scale;
        for ring in self.rings() {
            surface.fill_circle(
                center,
                ring.radius * anchor_scale,
                cfg.icon_backdrop_color,
                (ring.opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
                ring.blur,
            );
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
    fn rings_are_live_shortly_after_start() {
        let mut wave = WaterWave::new(3.0);
        wave.start(ms(0), 0.2, 1.6);
        wave.advance(ms(1500));
        assert!(!wave.rings().is_empty());
        // First ring at t=0, second re-armed at t=1000.
        assert_eq!(wave.rings().len(), 2);
    }

    #[test]
    fn ring_population_stays_bounded() {
        let mut wave = WaterWave::new(3.0);
        wave.start(ms(0), 1.0, 1.92);
        let mut max_live = 0usize;
        for t in (0..=10_000).step_by(50) {
            wave.advance(ms(t));
            max_live = max_live.max(wave.rings().len());
        }
        assert!(max_live >= 1);
        // Cadence 1000 against a 4500 span caps concurrency.
        assert!(max_live <= 5, "unbounded ring growth: {max_live}");
    }

    #[test]
    fn start_is_a_noop_while_running() {
        let mut wave = WaterWave::new(3.0);
        wave.start(ms(0), 0.2, 1.6);
        wave.advance(ms(500));
        let live_before = wave.rings().len();
        wave.start(ms(500), 1.0, 1.92);
        assert_eq!(wave.rings().len(), live_before);
        assert_eq!(wave.scale_range, (0.2, 1.6));
    }

    #[test]
    fn stop_clears_rings_and_cancels_the_rearm() {
        let mut wave = WaterWave::new(3.0);
        wave.start(ms(0), 0.2, 1.6);
        wave.advance(ms(2500));
        assert!(!wave.rings().is_empty());

        wave.stop();
        assert!(wave.rings().is_empty());
        assert!(!wave.is_running());

        // Past the next scheduled cycle: still nothing.
        wave.advance(ms(4000));
        assert!(wave.rings().is_empty());
    }

    #[test]
    fn stop_is_idempotent_and_safe_before_start() {
        let mut wave = WaterWave::new(3.0);
        wave.stop();
        wave.stop();
        assert!(wave.rings().is_empty());

        wave.start(ms(0), 0.2, 1.6);
        wave.stop();
        wave.stop();
        assert!(!wave.is_running());
    }

    #[test]
    fn restart_after_stop_spawns_fresh_rings() {
        let mut wave = WaterWave::new(3.0);
        wave.start(ms(0), 0.2, 1.6);
        wave.advance(ms(1200));
        wave.stop();

        wave.start(ms(1300), 1.0, 1.92);
        wave.advance(ms(1350));
        assert_eq!(wave.rings().len(), 1);
        assert_eq!(wave.scale_range, (1.0, 1.92));
    }

    #[test]
    fn ring_fades_in_peaks_then_fades_out() {
        let mut wave = WaterWave::new(3.0);
        wave.start(ms(0), 0.2, 1.6);

        wave.advance(ms(500));
        let peak = wave.rings()[0].opacity;
        assert!((peak - PEAK_OPACITY).abs() < 1e-4);

        wave.advance(ms(3000));
        let fading = wave.rings()[0].opacity;
        assert!(fading < PEAK_OPACITY);
        assert!(wave.rings()[0].blur > 0.0);

        // The first ring's composite retires at 4500.
        wave.advance(ms(4600));
        assert!(wave.rings().iter().all(|ring| ring.id != 0));
    }
}
