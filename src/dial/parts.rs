//! The dial's visual parts.
//!
//! Every part owns a [`PartParams`] set and mutates it exclusively through
//! [`PartBase::update`], which recomputes derived draw state (the u8 paint
//! alpha) immediately so a later draw can never observe a params/paint
//! mismatch. Drawing reads params and issues [`Surface`] calls; it never
//! mutates model state.

use crate::config::DialConfig;

use super::geometry::{CartesianPos, PolarPos, ViewSize};
use super::surface::Surface;
use super::wave::WaterWave;
use crate::animation::GroupId;

/// Mutable per-part parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartParams {
    pub pos: PolarPos,
    pub rotation: f32,
    pub scale: f32,
    pub opacity: f32,
}

impl Default for PartParams {
    fn default() -> Self {
        Self {
            pos: PolarPos::new(0.0, 0.0),
            rotation: 0.0,
            scale: 1.0,
            opacity: 1.0,
        }
    }
}

/// Shared state and behavior embedded in every part.
#[derive(Debug)]
pub struct PartBase {
    params: PartParams,
    paint_alpha: u8,
}

impl Default for PartBase {
    fn default() -> Self {
        Self::new()
    }
}

impl PartBase {
    fn new() -> Self {
        Self {
            params: PartParams::default(),
            paint_alpha: 255,
        }
    }

    /// The single mutation entry point: apply the mutator, then recompute
    /// derived draw state.
    pub fn update(&mut self, mutate: impl FnOnce(&mut PartParams)) {
        mutate(&mut self.params);
        self.on_params_changed();
    }

    fn on_params_changed(&mut self) {
        self.paint_alpha = (self.params.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    }

    pub fn params(&self) -> &PartParams {
        &self.params
    }

    pub fn paint_alpha(&self) -> u8 {
        self.paint_alpha
    }

    /// Draw position: polar position recentered to the view's visual center.
    pub fn draw_pos(&self, view: ViewSize) -> CartesianPos {
        let center = view.center();
        self.params.pos.to_cartesian().offset(center.x, center.y)
    }
}

/// Capability set of a visual part: draw and react to dimension changes.
/// Param mutation goes through the shared base (`update`).
pub trait DialPart {
    fn base(&self) -> &PartBase;
    fn base_mut(&mut self) -> &mut PartBase;

    fn params(&self) -> &PartParams {
        self.base().params()
    }

    fn update(&mut self, mutate: impl FnOnce(&mut PartParams))
    where
        Self: Sized,
    {
        self.base_mut().update(mutate);
    }

    /// Recompute size-dependent cached draw state. Invoked only when the
    /// view size changes.
    fn on_dimens_changed(&mut self, _cfg: &DialConfig, _view: ViewSize) {}

    fn draw(&self, cfg: &DialConfig, view: ViewSize, surface: &mut dyn Surface);
}

// ─── Concrete Parts ─────────────────────────────────────────────────────

/// Small filled dot marking the destination at the dial center.
pub struct CenterPoint {
    base: PartBase,
}

impl DialPart for CenterPoint {
    fn base(&self) -> &PartBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut PartBase {
        &mut self.base
    }

    fn draw(&self, cfg: &DialConfig, view: ViewSize, surface: &mut dyn Surface) {
        surface.fill_circle(
            self.base.draw_pos(view),
            cfg.center_point_radius,
            cfg.icon_backdrop_color,
            self.base.paint_alpha(),
            0.0,
        );
    }
}

/// Wedge sprite above the destination, anchored by its bottom edge.
pub struct FrontSector {
    base: PartBase,
}

impl DialPart for FrontSector {
    fn base(&self) -> &PartBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut PartBase {
        &mut self.base
    }

    fn draw(&self, cfg: &DialConfig, view: ViewSize, surface: &mut dyn Surface) {
        let pos = self
            .base
            .draw_pos(view)
            .offset(-cfg.sector.width() / 2.0, -cfg.sector.height());
        surface.sprite(pos, &cfg.sector, self.base.paint_alpha());
    }
}

/// The full low-opacity track ring. Radius scales with the part scale
/// (enlarged during the Nearby transition).
pub struct TrackRing {
    base: PartBase,
}

impl DialPart for TrackRing {
    fn base(&self) -> &PartBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut PartBase {
        &mut self.base
    }

    fn draw(&self, cfg: &DialConfig, view: ViewSize, surface: &mut dyn Surface) {
        surface.stroke_circle(
            self.base.draw_pos(view),
            cfg.bar_radius * self.base.params().scale,
            cfg.bar_width,
            cfg.bar_unused_color,
            self.base.paint_alpha(),
        );
    }
}

/// The progress arc. Always centered on the view (cached on dimension
/// change); only the sweep follows the part's polar angle.
pub struct ProgressArc {
    base: PartBase,
    center: CartesianPos,
}

impl DialPart for ProgressArc {
    fn base(&self) -> &PartBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut PartBase {
        &mut self.base
    }

    fn on_dimens_changed(&mut self, _cfg: &DialConfig, view: ViewSize) {
        self.center = view.center();
    }

    fn draw(&self, cfg: &DialConfig, _view: ViewSize, surface: &mut dyn Surface) {
        let (start, sweep) = sweep_angles(self.base.params().pos.angle);
        surface.stroke_arc(
            self.center,
            cfg.bar_radius,
            start,
            sweep,
            cfg.bar_width,
            cfg.bar_used_color,
            self.base.paint_alpha(),
        );
    }
}

/// Sweep policy for the progress arc, keyed on the car angle. The split at
/// 90° avoids a wrapped arc when the car sits just short of the ring's
/// start angle.
pub fn sweep_angles(angle: f32) -> (f32, f32) {
    if angle > 90.0 {
        (angle, 270.0 - angle)
    } else {
        (-90.0, angle + 90.0)
    }
}

/// Arrow sprite shown at arrival, centered on its position.
pub struct ArrivalArrow {
    base: PartBase,
    /// Live fade group on the widget timeline, if any.
    pub(crate) fade_group: Option<GroupId>,
}

impl DialPart for ArrivalArrow {
    fn base(&self) -> &PartBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut PartBase {
        &mut self.base
    }

    fn draw(&self, cfg: &DialConfig, view: ViewSize, surface: &mut dyn Surface) {
        let pos = self.base.draw_pos(view).offset(
            -cfg.arrival_arrow.width() / 2.0,
            -cfg.arrival_arrow.height() / 2.0,
        );
        surface.sprite(pos, &cfg.arrival_arrow, self.base.paint_alpha());
    }
}

/// Filled disc behind the car icon. Radius scales with the part scale.
pub struct IconBackdrop {
    base: PartBase,
}

impl DialPart for IconBackdrop {
    fn base(&self) -> &PartBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut PartBase {
        &mut self.base
    }

    fn draw(&self, cfg: &DialConfig, view: ViewSize, surface: &mut dyn Surface) {
        surface.fill_circle(
            self.base.draw_pos(view),
            cfg.icon_bg_radius * self.base.params().scale,
            cfg.icon_backdrop_color,
            self.base.paint_alpha(),
            0.0,
        );
    }
}

/// The vehicle sprite, centered on its position.
pub struct CarIcon {
    base: PartBase,
}

impl DialPart for CarIcon {
    fn base(&self) -> &PartBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut PartBase {
        &mut self.base
    }

    fn draw(&self, cfg: &DialConfig, view: ViewSize, surface: &mut dyn Surface) {
        let pos = self
            .base
            .draw_pos(view)
            .offset(-cfg.car_icon.width() / 2.0, -cfg.car_icon.height() / 2.0);
        surface.sprite(pos, &cfg.car_icon, self.base.paint_alpha());
    }
}

// ─── Part Collection ────────────────────────────────────────────────────

/// All visual parts, drawn back-to-front in a fixed layering order.
pub struct Parts {
    pub track_ring: TrackRing,
    pub progress_arc: ProgressArc,
    pub front_sector: FrontSector,
    pub center_point: CenterPoint,
    pub arrival_arrow: ArrivalArrow,
    pub wave: WaterWave,
    pub icon_backdrop: IconBackdrop,
    pub car_icon: CarIcon,
}

impl Parts {
    pub fn new(cfg: &DialConfig) -> Self {
        Self {
            track_ring: TrackRing {
                base: PartBase::new(),
            },
            progress_arc: ProgressArc {
                base: PartBase::new(),
                center: CartesianPos::default(),
            },
            front_sector: FrontSector {
                base: PartBase::new(),
            },
            center_point: CenterPoint {
                base: PartBase::new(),
            },
            arrival_arrow: ArrivalArrow {
                base: PartBase::new(),
                fade_group: None,
            },
            wave: WaterWave::new(cfg.icon_bg_radius),
            icon_backdrop: IconBackdrop {
                base: PartBase::new(),
            },
            car_icon: CarIcon {
                base: PartBase::new(),
            },
        }
    }

    /// Fixed back-to-front draw order. Overlap correctness depends on it:
    /// the car icon must cover its backdrop, which must cover the wave.
    fn ordered(&self) -> [&dyn DialPart; 8] {
        [
            &self.track_ring,
            &self.progress_arc,
            &self.front_sector,
            &self.center_point,
            &self.arrival_arrow,
            &self.wave,
            &self.icon_backdrop,
            &self.car_icon,
        ]
    }

    fn ordered_mut(&mut self) -> [&mut dyn DialPart; 8] {
        [
            &mut self.track_ring,
            &mut self.progress_arc,
            &mut self.front_sector,
            &mut self.center_point,
            &mut self.arrival_arrow,
            &mut self.wave,
            &mut self.icon_backdrop,
            &mut self.car_icon,
        ]
    }

    pub fn on_dimens_changed(&mut self, cfg: &DialConfig, view: ViewSize) {
        for part in self.ordered_mut() {
            part.on_dimens_changed(cfg, view);
        }
    }

    pub fn draw(&self, cfg: &DialConfig, view: ViewSize, surface: &mut dyn Surface) {
        for part in self.ordered() {
            part.draw(cfg, view, surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dial::surface::{PaintBuffer, PaintOp};

    fn test_cfg() -> DialConfig {
        DialConfig::resolve(&Config::default()).unwrap()
    }

    #[test]
    fn sweep_policy_below_and_above_ninety() {
        assert_eq!(sweep_angles(45.0), (-90.0, 135.0));
        assert_eq!(sweep_angles(120.0), (120.0, 150.0));
        // Boundary: 90 belongs to the from-top branch.
        assert_eq!(sweep_angles(90.0), (-90.0, 180.0));
        assert_eq!(sweep_angles(-90.0), (-90.0, 0.0));
    }

    #[test]
    fn opacity_updates_recompute_paint_alpha() {
        let cfg = test_cfg();
        let mut parts = Parts::new(&cfg);
        parts.track_ring.update(|p| p.opacity = 0.1);
        assert_eq!(parts.track_ring.base().paint_alpha(), 26);
        parts.track_ring.update(|p| p.opacity = 0.0);
        assert_eq!(parts.track_ring.base().paint_alpha(), 0);
        parts.track_ring.update(|p| p.opacity = 2.0);
        assert_eq!(parts.track_ring.base().paint_alpha(), 255);
    }

    #[test]
    fn draw_emits_all_parts_in_layer_order() {
        let cfg = test_cfg();
        let mut parts = Parts::new(&cfg);
        let mut view = ViewSize::default();
        view.set(40.0, 44.0);
        parts.on_dimens_changed(&cfg, view);

        let mut buffer = PaintBuffer::default();
        parts.draw(&cfg, view, &mut buffer);

        // Track ring first, car icon sprite last.
        assert!(matches!(buffer.ops.first(), Some(PaintOp::StrokeCircle { .. })));
        assert!(matches!(buffer.ops.last(), Some(PaintOp::Sprite { .. })));
        // 7 single-op parts + an idle wave contributing nothing.
        assert_eq!(buffer.ops.len(), 7);
    }

    #[test]
    fn progress_arc_caches_view_center() {
        let cfg = test_cfg();
        let mut parts = Parts::new(&cfg);
        let mut view = ViewSize::default();
        view.set(60.0, 64.0);
        parts.on_dimens_changed(&cfg, view);
        parts.progress_arc.update(|p| p.pos.set(cfg.bar_radius, 45.0));

        let mut buffer = PaintBuffer::default();
        parts.progress_arc.draw(&cfg, view, &mut buffer);
        match &buffer.ops[0] {
            PaintOp::StrokeArc { center, start, sweep, .. } => {
                assert_eq!((center.x, center.y), (30.0, 32.0));
                assert_eq!((*start, *sweep), (-90.0, 135.0));
            }
            other => panic!("expected arc, got {other:?}"),
        }
    }
}
