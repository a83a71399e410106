//! Frame layout and rasterization of the dial's paint operations.
//!
//! The dial emits [`PaintOp`]s in dial coordinates (origin top-left, y
//! growing downward, one unit per terminal column). The canvas coordinate
//! system grows upward, so every op is y-flipped here. Two units make one
//! terminal row, which keeps circles round under the Braille marker.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Context, Points};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::App;
use crate::dial::state::StateKind;
use crate::dial::surface::{PaintBuffer, PaintOp};
use crate::dial::ProgressWrite;

/// Point sampling density: one sample per half dial unit.
const SAMPLE_STEP: f32 = 0.5;

/// Top-level draw function
pub fn draw(f: &mut Frame, app: &mut App) {
    let constraints = if app.show_help_bar {
        vec![
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ]
    } else {
        vec![Constraint::Length(1), Constraint::Min(0)]
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_dial(f, app, chunks[1]);
    if app.show_help_bar {
        draw_help_bar(f, chunks[2]);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let state_label = match app.dial.state() {
        StateKind::Search => Span::styled("SEARCH", Style::default().fg(Color::Cyan)),
        StateKind::Nearby => Span::styled("NEARBY", Style::default().fg(Color::Yellow)),
        StateKind::AtFront => Span::styled("ARRIVED", Style::default().fg(Color::Green)),
    };

    let mut spans = vec![
        Span::styled(
            " navdial ",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", Style::default().fg(Color::DarkGray)),
        state_label,
        Span::styled(
            format!(" │ progress {:>5.1}%", app.dial.progress() * 100.0),
            Style::default().fg(Color::White),
        ),
    ];
    if app.dial.is_guarded() {
        spans.push(Span::styled(
            " │ guarded",
            Style::default().fg(Color::Yellow),
        ));
    }
    if !app.visible {
        spans.push(Span::styled(
            " │ hidden",
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(outcome) = app.last_write {
        let (text, color) = match outcome {
            ProgressWrite::Applied => ("applied", Color::Green),
            ProgressWrite::Unchanged => ("unchanged", Color::DarkGray),
            ProgressWrite::Guarded => ("ignored: guarded", Color::Yellow),
            ProgressWrite::OutOfRange => ("rejected: out of range", Color::Red),
        };
        spans.push(Span::styled(
            format!(" │ last write: {text}"),
            Style::default().fg(color),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_help_bar(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(Line::from(Span::styled(
        " ←/→ smooth ±0.1 · ↑/↓ set ±0.01 · 0-9 target · g arrive · r return · \
         s stop · n nearby · v visibility · ? help · q quit",
        Style::default().fg(Color::DarkGray),
    )));
    f.render_widget(help, area);
}

fn draw_dial(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 4 || area.height < 4 {
        return;
    }

    // Width is imposed by the layout; the dial derives its height from it.
    // Vertical dial units available: two per terminal row.
    let icon_margin = app.dial.config().car_icon_size;
    let avail_w = area.width as f32;
    let avail_h_units = area.height as f32 * 2.0;
    let width = avail_w.min(avail_h_units - icon_margin).max(10.0);
    app.dial.resize(width);
    let view = app.dial.view();

    let mut buffer = PaintBuffer::default();
    app.dial.draw(&mut buffer);
    app.dial.take_redraw();

    let cols = (view.width.round() as u16).min(area.width);
    let rows = ((view.height / 2.0).ceil() as u16).clamp(1, area.height);
    let rect = Rect::new(
        area.x + (area.width - cols) / 2,
        area.y + (area.height - rows) / 2,
        cols,
        rows,
    );

    let view_h = f64::from(view.height);
    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, f64::from(view.width)])
        .y_bounds([0.0, view_h])
        .paint(|ctx| rasterize(ctx, &buffer, view_h));
    f.render_widget(canvas, rect);
}

/// Replay recorded paint operations onto the canvas, flipping y.
fn rasterize(ctx: &mut Context, buffer: &PaintBuffer, view_h: f64) {
    for op in &buffer.ops {
        match op {
            PaintOp::FillCircle {
                center,
                radius,
                color,
                alpha,
                blur,
            } => {
                let alpha = soften(*alpha, *blur);
                if alpha == 0 || *radius <= 0.0 {
                    continue;
                }
                let color = blend(*color, alpha);
                let mut coords = Vec::new();
                let mut y = -radius;
                while y <= *radius {
                    let half_span = (radius * radius - y * y).max(0.0).sqrt();
                    let mut x = -half_span;
                    while x <= half_span {
                        coords.push((
                            f64::from(center.x + x),
                            view_h - f64::from(center.y + y),
                        ));
                        x += SAMPLE_STEP;
                    }
                    y += SAMPLE_STEP;
                }
                ctx.draw(&Points {
                    coords: &coords,
                    color,
                });
            }
            PaintOp::StrokeCircle {
                center,
                radius,
                width,
                color,
                alpha,
            } => {
                draw_ring(ctx, view_h, (center.x, center.y), *radius, *width, -90.0, 360.0, blend_checked(*color, *alpha));
            }
            PaintOp::StrokeArc {
                center,
                radius,
                start,
                sweep,
                width,
                color,
                alpha,
            } => {
                draw_ring(ctx, view_h, (center.x, center.y), *radius, *width, *start, *sweep, blend_checked(*color, *alpha));
            }
            PaintOp::Sprite {
                top_left,
                sprite,
                alpha,
            } => {
                if *alpha == 0 {
                    continue;
                }
                let style = Style::default().fg(blend(Color::White, *alpha));
                for (row, text) in sprite.lines().iter().enumerate() {
                    if text.trim().is_empty() {
                        continue;
                    }
                    let y = f64::from(top_left.y) + row as f64 + 0.5;
                    ctx.print(
                        f64::from(top_left.x),
                        view_h - y,
                        Line::from(Span::styled(text.clone(), style)),
                    );
                }
            }
        }
    }
}

/// Sample a (partial) ring of the given stroke width as canvas points.
#[allow(clippy::too_many_arguments)]
fn draw_ring(
    ctx: &mut Context,
    view_h: f64,
    center: (f32, f32),
    radius: f32,
    width: f32,
    start: f32,
    sweep: f32,
    color: Option<Color>,
) {
    let Some(color) = color else { return };
    if radius <= 0.0 || sweep == 0.0 {
        return;
    }
    let mut coords = Vec::new();
    let rings = ((width / SAMPLE_STEP).ceil() as i32).max(1);
    for ring in 0..rings {
        let r = radius - width / 2.0 + ring as f32 * SAMPLE_STEP + SAMPLE_STEP / 2.0;
        if r <= 0.0 {
            continue;
        }
        let steps = ((sweep.abs().to_radians() * r / SAMPLE_STEP).ceil() as i32).max(2);
        for i in 0..=steps {
            let angle = (start + sweep * i as f32 / steps as f32).to_radians();
            coords.push((
                f64::from(center.0 + r * angle.cos()),
                view_h - f64::from(center.1 + r * angle.sin()),
            ));
        }
    }
    ctx.draw(&Points {
        coords: &coords,
        color,
    });
}

/// Fold the blur channel into the alpha: blurred rings read dimmer.
fn soften(alpha: u8, blur: f32) -> u8 {
    let factor = 1.0 - 0.5 * blur.clamp(0.0, 1.0);
    (f32::from(alpha) * factor).round() as u8
}

fn blend_checked(color: Color, alpha: u8) -> Option<Color> {
    if alpha == 0 {
        None
    } else {
        Some(blend(color, alpha))
    }
}

/// Scale a color toward black by alpha. Full alpha keeps terminal-native
/// colors untouched.
fn blend(color: Color, alpha: u8) -> Color {
    if alpha == 255 {
        return color;
    }
    let Some((r, g, b)) = color_rgb(color) else {
        return color;
    };
    let scale = f32::from(alpha) / 255.0;
    Color::Rgb(
        (f32::from(r) * scale) as u8,
        (f32::from(g) * scale) as u8,
        (f32::from(b) * scale) as u8,
    )
}

/// Approximate RGB for blendable colors; None leaves the color untouched.
fn color_rgb(color: Color) -> Option<(u8, u8, u8)> {
    match color {
        Color::Rgb(r, g, b) => Some((r, g, b)),
        Color::Black => Some((0, 0, 0)),
        Color::Red => Some((205, 49, 49)),
        Color::Green => Some((13, 188, 121)),
        Color::Yellow => Some((229, 229, 16)),
        Color::Blue => Some((36, 114, 200)),
        Color::Magenta => Some((188, 63, 188)),
        Color::Cyan => Some((17, 168, 205)),
        Color::White => Some((229, 229, 229)),
        Color::Gray => Some((150, 150, 150)),
        Color::DarkGray => Some((102, 102, 102)),
        Color::LightRed => Some((241, 76, 76)),
        Color::LightGreen => Some((35, 209, 139)),
        Color::LightYellow => Some((245, 245, 67)),
        Color::LightBlue => Some((59, 142, 234)),
        Color::LightMagenta => Some((214, 112, 214)),
        Color::LightCyan => Some((41, 184, 219)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_scales_toward_black() {
        assert_eq!(blend(Color::Rgb(200, 100, 50), 255), Color::Rgb(200, 100, 50));
        assert_eq!(blend(Color::Rgb(200, 100, 50), 0), Color::Rgb(0, 0, 0));
        match blend(Color::Rgb(200, 100, 50), 128) {
            Color::Rgb(r, g, b) => {
                assert!((99..=101).contains(&r));
                assert!((49..=51).contains(&g));
                assert!((24..=26).contains(&b));
            }
            other => panic!("expected rgb, got {other:?}"),
        }
    }

    #[test]
    fn soften_dims_by_half_at_full_blur() {
        assert_eq!(soften(200, 0.0), 200);
        assert_eq!(soften(200, 1.0), 100);
    }

    #[test]
    fn reset_color_is_never_blended() {
        assert_eq!(blend(Color::Reset, 128), Color::Reset);
    }
}
