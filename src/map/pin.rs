//! Location marker drawn onto map snapshots.
//!
//! The glyph is a round head with a tapered tail. It is anchored by the tip
//! of the tail, which lands exactly on the requested point.

use image::{imageops, Rgba, RgbaImage};

const PIN_FILL: Rgba<u8> = Rgba([220, 38, 38, 255]);
const PIN_OUTLINE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const SHADOW_ALPHA: u8 = 120;
const SHADOW_OFFSET: i64 = 2;
const SHADOW_SIGMA: f32 = 1.6;

/// Transparent border around the glyph so the blurred shadow is not clipped.
const PAD: f32 = 5.0;
const HEAD_RADIUS: f32 = 13.0;
const OUTLINE: f32 = 2.0;
const DOT_RADIUS: f32 = 5.0;
/// Distance from the head centre down to the tip.
const TAIL_LENGTH: f32 = 27.0;

const CANVAS_W: u32 = ((HEAD_RADIUS + OUTLINE + PAD) * 2.0) as u32;
const CANVAS_H: u32 = (HEAD_RADIUS + OUTLINE + TAIL_LENGTH + PAD * 2.0) as u32;

fn head_center() -> (f32, f32) {
    (CANVAS_W as f32 / 2.0, PAD + OUTLINE + HEAD_RADIUS)
}

/// Tip position inside the glyph canvas, in pixels.
pub fn tip_offset() -> (u32, u32) {
    let (cx, cy) = head_center();
    (cx as u32, (cy + TAIL_LENGTH) as u32)
}

fn cross(o: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn in_triangle(p: (f32, f32), a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Head circle of `radius` joined to a tail ending `tail` pixels below centre.
fn in_pin(p: (f32, f32), radius: f32, tail: f32) -> bool {
    let (cx, cy) = head_center();
    let (dx, dy) = (p.0 - cx, p.1 - cy);
    if dx * dx + dy * dy <= radius * radius {
        return true;
    }
    let shoulder = (cx - radius * 0.8, cy + radius * 0.6);
    let shoulder_r = (cx + radius * 0.8, cy + radius * 0.6);
    in_triangle(p, shoulder, shoulder_r, (cx, cy + tail))
}

/// The marker glyph on a transparent canvas.
pub fn render_glyph() -> RgbaImage {
    let (cx, cy) = head_center();
    RgbaImage::from_fn(CANVAS_W, CANVAS_H, |x, y| {
        let p = (x as f32 + 0.5, y as f32 + 0.5);
        let (dx, dy) = (p.0 - cx, p.1 - cy);
        if dx * dx + dy * dy <= DOT_RADIUS * DOT_RADIUS {
            PIN_OUTLINE
        } else if in_pin(p, HEAD_RADIUS, TAIL_LENGTH - OUTLINE) {
            PIN_FILL
        } else if in_pin(p, HEAD_RADIUS + OUTLINE, TAIL_LENGTH) {
            PIN_OUTLINE
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// Blurred dark silhouette of the glyph.
fn render_shadow(glyph: &RgbaImage) -> RgbaImage {
    let silhouette = RgbaImage::from_fn(glyph.width(), glyph.height(), |x, y| {
        let alpha = glyph.get_pixel(x, y)[3];
        Rgba([0, 0, 0, if alpha > 0 { SHADOW_ALPHA } else { 0 }])
    });
    imageops::blur(&silhouette, SHADOW_SIGMA)
}

/// Draw the marker so its tip sits on (`x`, `y`) of `canvas`.
pub fn stamp_pin(canvas: &mut RgbaImage, x: u32, y: u32) {
    let glyph = render_glyph();
    let shadow = render_shadow(&glyph);
    let (tip_x, tip_y) = tip_offset();
    let left = i64::from(x) - i64::from(tip_x);
    let top = i64::from(y) - i64::from(tip_y);

    imageops::overlay(canvas, &shadow, left + SHADOW_OFFSET, top + SHADOW_OFFSET);
    imageops::overlay(canvas, &glyph, left, top);
}
