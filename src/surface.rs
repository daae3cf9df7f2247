// Copyright (c) 2026 rezky_nightky

use crate::cell::Cell;
use crate::frame::Frame;
use crate::palette::Palette;
use crate::runtime::ColorMode;

/// Float RGB drawing surface backing the terminal grid.
///
/// Each terminal cell covers two vertical pixels (upper-half-block
/// rendering), supersampled by `scale`. `scale` plays the device pixel
/// ratio role: simulation coordinates are device pixels, and a resize
/// recomputes the backing buffer as cell size x scale, discarding its
/// contents.
pub struct Surface {
    cols: u16,
    rows: u16,
    scale: u16,
    width: u32,
    height: u32,
    px: Vec<[f32; 3]>,
}

impl Surface {
    pub fn new(cols: u16, rows: u16, scale: u16, backdrop: [f32; 3]) -> Self {
        let scale = scale.max(1);
        let width = cols as u32 * scale as u32;
        let height = rows as u32 * 2 * scale as u32;
        Self {
            cols,
            rows,
            scale,
            width,
            height,
            px: vec![backdrop; (width * height) as usize],
        }
    }

    pub fn width(&self) -> f32 {
        self.width as f32
    }

    pub fn height(&self) -> f32 {
        self.height as f32
    }

    pub fn scale(&self) -> f32 {
        self.scale as f32
    }

    /// Recompute backing dimensions from new cell dimensions.
    ///
    /// A real dimension change discards the pixel contents and re-primes
    /// the backdrop; calling with unchanged dimensions is a no-op so
    /// spurious resize notifications do not flash the trail away.
    pub fn resize(&mut self, cols: u16, rows: u16, backdrop: [f32; 3]) -> (f32, f32) {
        if cols == self.cols && rows == self.rows {
            return (self.width(), self.height());
        }
        self.cols = cols;
        self.rows = rows;
        self.width = cols as u32 * self.scale as u32;
        self.height = rows as u32 * 2 * self.scale as u32;
        self.px = vec![backdrop; (self.width * self.height) as usize];
        (self.width(), self.height())
    }

    pub fn prime(&mut self, color: [f32; 3]) {
        self.px.fill(color);
    }

    /// Trail fade: blend every pixel toward `color` by `alpha` instead of
    /// clearing, which leaves motion streaks from previous frames.
    pub fn fade(&mut self, color: [f32; 3], alpha: f32) {
        let a = alpha.clamp(0.0, 1.0);
        let keep = 1.0 - a;
        for p in &mut self.px {
            p[0] = p[0] * keep + color[0] * a;
            p[1] = p[1] * keep + color[1] * a;
            p[2] = p[2] * keep + color[2] * a;
        }
    }

    /// Additive circle fill: overlapping particles sum brightness rather
    /// than occlude. Values are only clamped at quantization time.
    pub fn fill_circle_add(&mut self, cx: f32, cy: f32, r: f32, color: [f32; 3], alpha: f32) {
        if !(r > 0.0) || alpha <= 0.0 {
            return;
        }
        let x0 = ((cx - r).floor().max(0.0)) as u32;
        let y0 = ((cy - r).floor().max(0.0)) as u32;
        let x1 = ((cx + r).ceil() as i64).clamp(0, self.width as i64) as u32;
        let y1 = ((cy + r).ceil() as i64).clamp(0, self.height as i64) as u32;
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let r2 = r * r;
        for y in y0..y1 {
            let dy = y as f32 + 0.5 - cy;
            let row = (y * self.width) as usize;
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let p = &mut self.px[row + x as usize];
                p[0] += color[0] * alpha;
                p[1] += color[1] * alpha;
                p[2] += color[2] * alpha;
            }
        }
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        self.px[(y * self.width + x) as usize]
    }

    /// Downsample the pixel buffer into terminal cells.
    ///
    /// Color modes emit half-block cells (fg = upper sample, bg = lower
    /// sample); mono averages the whole cell into a luma ramp glyph.
    pub fn render_to(&self, frame: &mut Frame, palette: &Palette) {
        let s = self.scale as u32;
        for cy in 0..self.rows.min(frame.height) {
            for cx in 0..self.cols.min(frame.width) {
                let top = self.block_avg(cx as u32 * s, cy as u32 * 2 * s, s, s);
                let bottom = self.block_avg(cx as u32 * s, (cy as u32 * 2 + 1) * s, s, s);
                let cell = if palette.mode == ColorMode::Mono {
                    let avg = [
                        (top[0] + bottom[0]) * 0.5,
                        (top[1] + bottom[1]) * 0.5,
                        (top[2] + bottom[2]) * 0.5,
                    ];
                    Cell::glyph(palette.luma_glyph(avg), None, None)
                } else {
                    Cell::half_block(palette.quantize(top), palette.quantize(bottom))
                };
                frame.set(cx, cy, cell);
            }
        }
    }

    fn block_avg(&self, x0: u32, y0: u32, w: u32, h: u32) -> [f32; 3] {
        let mut acc = [0.0f32; 3];
        let mut n = 0u32;
        for y in y0..(y0 + h).min(self.height) {
            let row = (y * self.width) as usize;
            for x in x0..(x0 + w).min(self.width) {
                let p = self.px[row + x as usize];
                acc[0] += p[0];
                acc[1] += p[1];
                acc[2] += p[2];
                n += 1;
            }
        }
        if n == 0 {
            return acc;
        }
        let inv = 1.0 / n as f32;
        [acc[0] * inv, acc[1] * inv, acc[2] * inv]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: [f32; 3] = [0.0, 0.0, 0.0];

    #[test]
    fn dimensions_follow_cells_and_scale() {
        let s = Surface::new(80, 24, 2, BLACK);
        assert_eq!(s.width(), 160.0);
        assert_eq!(s.height(), 96.0);
    }

    #[test]
    fn resize_with_same_dimensions_keeps_pixels() {
        let mut s = Surface::new(10, 5, 1, BLACK);
        s.fill_circle_add(5.0, 5.0, 2.0, [1.0, 1.0, 1.0], 1.0);
        let before = s.pixel(5, 5);
        let (w, h) = s.resize(10, 5, BLACK);
        assert_eq!((w, h), (10.0, 10.0));
        assert_eq!(s.pixel(5, 5), before);
    }

    #[test]
    fn resize_with_new_dimensions_discards_pixels() {
        let mut s = Surface::new(10, 5, 1, BLACK);
        s.fill_circle_add(5.0, 5.0, 2.0, [1.0, 1.0, 1.0], 1.0);
        s.resize(12, 5, BLACK);
        assert_eq!(s.width(), 12.0);
        assert_eq!(s.pixel(5, 5), BLACK);
    }

    #[test]
    fn fade_converges_toward_trail_color() {
        let mut s = Surface::new(4, 2, 1, [1.0, 1.0, 1.0]);
        for _ in 0..64 {
            s.fade([0.25, 0.5, 0.75], 0.28);
        }
        let p = s.pixel(0, 0);
        assert!((p[0] - 0.25).abs() < 1e-3);
        assert!((p[1] - 0.5).abs() < 1e-3);
        assert!((p[2] - 0.75).abs() < 1e-3);
    }

    #[test]
    fn circle_fill_is_additive() {
        let mut s = Surface::new(8, 4, 1, BLACK);
        s.fill_circle_add(4.0, 4.0, 1.5, [0.2, 0.0, 0.0], 1.0);
        s.fill_circle_add(4.0, 4.0, 1.5, [0.2, 0.0, 0.0], 1.0);
        let p = s.pixel(4, 4);
        assert!((p[0] - 0.4).abs() < 1e-5);
    }

    #[test]
    fn circle_outside_bounds_is_ignored() {
        let mut s = Surface::new(4, 2, 1, BLACK);
        s.fill_circle_add(-10.0, -10.0, 2.0, [1.0, 0.0, 0.0], 1.0);
        s.fill_circle_add(100.0, 100.0, 2.0, [1.0, 0.0, 0.0], 1.0);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(s.pixel(x, y), BLACK);
            }
        }
    }
}
