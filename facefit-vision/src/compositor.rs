use image::{Rgba, RgbaImage};

use crate::placement::PlacementTransform;
use crate::sprite::ProductSprite;

/// Destination drawing surface.
///
/// Resized to match the current source frame on every render, because
/// frame dimensions may change between static-image and live-camera
/// sessions. Clearing always yields true transparency, never an opaque
/// background fill.
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    pub fn new() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    fn reset(&mut self, width: u32, height: u32) {
        if self.image.width() != width || self.image.height() != height {
            self.image = RgbaImage::new(width, height);
        } else {
            for px in self.image.pixels_mut() {
                *px = Rgba([0, 0, 0, 0]);
            }
        }
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

/// Composites one frame: source at (0,0) unscaled, then the sprite at
/// each placement with source-over alpha blending.
///
/// Mutates only `surface`. An empty placement list (or an absent sprite)
/// leaves the bare source frame on the surface.
pub fn render(
    surface: &mut Surface,
    source: &RgbaImage,
    placements: &[PlacementTransform],
    sprite: Option<&ProductSprite>,
) {
    surface.reset(source.width(), source.height());
    for (dst, src) in surface.image.pixels_mut().zip(source.pixels()) {
        *dst = *src;
    }

    let Some(sprite) = sprite else { return };
    for placement in placements {
        draw_sprite(&mut surface.image, sprite.image(), placement);
    }
}

/// Draws the sprite at one placement by inverse mapping: every
/// destination pixel inside the rotated quad is translated to the
/// placement center, rotated back onto the sprite's axes, and bilinearly
/// sampled. Handles the rotation == 0 case with the same path.
fn draw_sprite(dst: &mut RgbaImage, sprite: &RgbaImage, t: &PlacementTransform) {
    if t.width <= 0.0 || t.height <= 0.0 {
        return;
    }

    let half_w = t.width / 2.0;
    let half_h = t.height / 2.0;
    let cos = t.rotation.cos();
    let sin = t.rotation.sin();

    // Destination-space bounding box of the rotated quad, clamped to the
    // surface.
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for (cx, cy) in [
        (-half_w, -half_h),
        (half_w, -half_h),
        (-half_w, half_h),
        (half_w, half_h),
    ] {
        let x = t.center_x + cx * cos - cy * sin;
        let y = t.center_y + cx * sin + cy * cos;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    let x0 = min_x.floor().max(0.0) as u32;
    let y0 = min_y.floor().max(0.0) as u32;
    let x1 = (max_x.ceil().max(0.0) as u32).min(dst.width());
    let y1 = (max_y.ceil().max(0.0) as u32).min(dst.height());

    // Destination pixels per sprite pixel.
    let scale_x = sprite.width() as f32 / t.width;
    let scale_y = sprite.height() as f32 / t.height;

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - t.center_x;
            let dy = y as f32 + 0.5 - t.center_y;

            // Rotate back into the sprite's local axes.
            let local_x = dx * cos + dy * sin;
            let local_y = -dx * sin + dy * cos;
            if local_x < -half_w || local_x >= half_w || local_y < -half_h || local_y >= half_h
            {
                continue;
            }

            let u = (local_x + half_w) * scale_x;
            let v = (local_y + half_h) * scale_y;
            let src = sample_bilinear(sprite, u, v);
            if src[3] > 0 {
                blend_over(dst.get_pixel_mut(x, y), src);
            }
        }
    }
}

fn sample_bilinear(img: &RgbaImage, u: f32, v: f32) -> Rgba<u8> {
    let max_x = img.width() - 1;
    let max_y = img.height() - 1;
    let u = u.clamp(0.0, max_x as f32);
    let v = v.clamp(0.0, max_y as f32);

    let x0 = u.floor() as u32;
    let y0 = v.floor() as u32;
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);

    let fx = u - x0 as f32;
    let fy = v - y0 as f32;

    let p00 = img.get_pixel(x0, y0);
    let p10 = img.get_pixel(x1, y0);
    let p01 = img.get_pixel(x0, y1);
    let p11 = img.get_pixel(x1, y1);

    let w00 = (1.0 - fx) * (1.0 - fy);
    let w10 = fx * (1.0 - fy);
    let w01 = (1.0 - fx) * fy;
    let w11 = fx * fy;

    let mut out = [0u8; 4];
    for c in 0..4 {
        out[c] = (p00[c] as f32 * w00
            + p10[c] as f32 * w10
            + p01[c] as f32 * w01
            + p11[c] as f32 * w11)
            .round()
            .clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

/// Standard source-over compositing with straight (non-premultiplied)
/// alpha.
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = src[3] as f32 / 255.0;
    if sa >= 1.0 {
        *dst = src;
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for c in 0..3 {
        let sc = src[c] as f32;
        let dc = dst[c] as f32;
        dst[c] = ((sc * sa + dc * da * (1.0 - sa)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
