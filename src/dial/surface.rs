//! The drawing seam between the dial core and the host renderer.
//!
//! The core only computes what to draw (positions, radii, sweep angles,
//! paint alphas) and issues those as operations against a [`Surface`].
//! Rasterization (the ratatui canvas) lives in `ui.rs`; tests inspect the
//! recorded operations directly.

use ratatui::style::Color;

use crate::config::Sprite;

use super::geometry::CartesianPos;

pub trait Surface {
    /// Filled disc. `blur` in [0, 1] softens/dims the fill (wave rings).
    fn fill_circle(&mut self, center: CartesianPos, radius: f32, color: Color, alpha: u8, blur: f32);

    /// Ring outline of the given stroke width.
    fn stroke_circle(&mut self, center: CartesianPos, radius: f32, width: f32, color: Color, alpha: u8);

    /// Partial ring: `start` angle in degrees, `sweep` extent in degrees,
    /// positive sweeping clockwise in dial coordinates.
    #[allow(clippy::too_many_arguments)]
    fn stroke_arc(
        &mut self,
        center: CartesianPos,
        radius: f32,
        start: f32,
        sweep: f32,
        width: f32,
        color: Color,
        alpha: u8,
    );

    /// Glyph sprite with its top-left corner at `top_left`.
    fn sprite(&mut self, top_left: CartesianPos, sprite: &Sprite, alpha: u8);
}

/// One recorded draw operation.
#[derive(Debug, Clone)]
pub enum PaintOp {
    FillCircle {
        center: CartesianPos,
        radius: f32,
        color: Color,
        alpha: u8,
        blur: f32,
    },
    StrokeCircle {
        center: CartesianPos,
        radius: f32,
        width: f32,
        color: Color,
        alpha: u8,
    },
    StrokeArc {
        center: CartesianPos,
        radius: f32,
        start: f32,
        sweep: f32,
        width: f32,
        color: Color,
        alpha: u8,
    },
    Sprite {
        top_left: CartesianPos,
        sprite: Sprite,
        alpha: u8,
    },
}

/// Recording surface: collects paint operations in submission (back-to-front)
/// order for the renderer to replay.
#[derive(Debug, Default)]
pub struct PaintBuffer {
    pub ops: Vec<PaintOp>,
}

impl Surface for PaintBuffer {
    fn fill_circle(&mut self, center: CartesianPos, radius: f32, color: Color, alpha: u8, blur: f32) {
        self.ops.push(PaintOp::FillCircle {
            center,
            radius,
            color,
            alpha,
            blur,
        });
    }

    fn stroke_circle(&mut self, center: CartesianPos, radius: f32, width: f32, color: Color, alpha: u8) {
        self.ops.push(PaintOp::StrokeCircle {
            center,
            radius,
            width,
            color,
            alpha,
        });
    }

    fn stroke_arc(
        &mut self,
        center: CartesianPos,
        radius: f32,
        start: f32,
        sweep: f32,
        width: f32,
        color: Color,
        alpha: u8,
    ) {
        self.ops.push(PaintOp::StrokeArc {
            center,
            radius,
            start,
            sweep,
            width,
            color,
            alpha,
        });
    }

    fn sprite(&mut self, top_left: CartesianPos, sprite: &Sprite, alpha: u8) {
        self.ops.push(PaintOp::Sprite {
            top_left,
            sprite: sprite.clone(),
            alpha,
        });
    }
}
