use crate::pipeline::project::Rgb;
use crate::scene::ParticleKind;
use crate::shared::DisplayState;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

// key hint per pad, same order as the layout table
const KEY_HINTS: [&str; 11] = ["_", "q", "w", "e", "r", "t", "y", "u", "i", "o", "p"];
const DROP_TAIL: f64 = 18.0;

// paints the falling rain, the drum and the effects on a canvas spanning the
// virtual viewport. scene coordinates grow downward, the canvas grows upward
pub fn draw_drum(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let width = state.viewport.width as f64;
    let height = state.viewport.height as f64;
    let flip = |y: f32| height - y as f64;

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(" RainDrum "))
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            paint_pads(ctx, state, width, height);
            ctx.layer();

            let rain = to_color(state.theme.rain, 1.0);
            for drop in &state.drops {
                let (x, y) = (drop.x as f64, flip(drop.y));
                ctx.draw(&Line::new(x, y + DROP_TAIL, x, y, rain));
            }
            for ripple in &state.ripples {
                ctx.draw(&Circle {
                    x: ripple.x as f64,
                    y: flip(ripple.y),
                    radius: (ripple.size / 2.0) as f64,
                    color: to_color(ripple.color, ripple.opacity),
                });
            }
            ctx.layer();

            for p in &state.particles {
                let glyph = match p.kind {
                    ParticleKind::Symbol(c) => c.to_string(),
                    ParticleKind::Sparkle => "·".to_string(),
                    ParticleKind::Star => "★".to_string(),
                };
                let color = to_color(state.theme.accent, p.opacity);
                ctx.print(p.x as f64, flip(p.y), ratatui::text::Span::styled(glyph, color));
            }
            for hit in &state.hits {
                ctx.print(hit.x as f64, flip(hit.y), ratatui::text::Span::styled("*", rain));
            }
        });
    frame.render_widget(canvas, area);
}

fn paint_pads(ctx: &mut Context, state: &DisplayState, width: f64, height: f64) {
    // the drum sits in the middle; pad positions are percentages of its box
    let radius = width.min(height) * 0.3;
    let (cx, cy) = (width / 2.0, height * 0.55);
    let drum = to_color(state.theme.drum, 1.0);
    ctx.draw(&Circle { x: cx, y: cy, radius, color: drum });

    for (i, pad) in state.pads.iter().enumerate() {
        let x = cx + (pad.left as f64 - 50.0) / 50.0 * radius;
        let y = cy - (pad.top as f64 - 50.0) / 50.0 * radius;
        let color = if pad.flash {
            to_color(state.theme.accent, 1.0)
        } else if pad.practice_next {
            Color::Yellow
        } else {
            to_color(state.theme.drum, 0.7)
        };
        let pad_radius = if i == 0 { radius * 0.22 } else { radius * 0.14 };
        ctx.draw(&Circle { x, y, radius: pad_radius, color });
        let hint = KEY_HINTS.get(i).copied().unwrap_or("");
        ctx.print(
            x - pad_radius * 0.6,
            y,
            ratatui::text::Span::styled(format!("{hint} {}", pad.label), color),
        );
    }
}

// fade a theme colour towards black
fn to_color((r, g, b): Rgb, opacity: f32) -> Color {
    let k = opacity.clamp(0.0, 1.0);
    Color::Rgb(
        (r as f32 * k) as u8,
        (g as f32 * k) as u8,
        (b as f32 * k) as u8,
    )
}
