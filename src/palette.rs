// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::runtime::{ColorMode, ColorScheme};

/// Colors the renderer works in. Pixel math happens on normalized RGB
/// floats; quantization to the terminal's color depth happens last.
#[derive(Clone, Debug)]
pub struct Palette {
    pub mode: ColorMode,
    /// Terminal background for blank cells (None = default background).
    pub bg: Option<Color>,
    /// Particle base color before life-alpha is applied.
    pub water: [f32; 3],
    /// Color the surface is primed with at startup and after a resize.
    pub backdrop: [f32; 3],
    /// Color the trail fade pulls every pixel toward each frame.
    pub trail: [f32; 3],
}

/// Luma ramp for mono output, darkest first.
const MONO_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

fn scheme_hsl(scheme: ColorScheme) -> (f32, f32, f32) {
    match scheme {
        ColorScheme::Azure => (196.0, 1.0, 0.60),
        ColorScheme::Glacier => (210.0, 0.90, 0.70),
        ColorScheme::Teal => (174.0, 0.95, 0.55),
        ColorScheme::Ember => (18.0, 0.95, 0.58),
        ColorScheme::Violet => (268.0, 0.85, 0.65),
        ColorScheme::Moss => (110.0, 0.70, 0.55),
        ColorScheme::Silver => (200.0, 0.05, 0.75),
    }
}

/// Standard HSL to RGB, hue in degrees, s/l in [0, 1], output in [0, 1].
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let h = h.rem_euclid(360.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    [r1 + m, g1 + m, b1 + m]
}

pub fn build_palette(scheme: ColorScheme, mode: ColorMode, default_background: bool) -> Palette {
    let (h, s, l) = scheme_hsl(scheme);
    let bg = if default_background || mode == ColorMode::Mono {
        None
    } else {
        Some(quantize_rgb([2.0 / 255.0, 8.0 / 255.0, 20.0 / 255.0], mode))
    };
    Palette {
        mode,
        bg,
        water: hsl_to_rgb(h, s, l),
        backdrop: [2.0 / 255.0, 8.0 / 255.0, 20.0 / 255.0],
        trail: [5.0 / 255.0, 15.0 / 255.0, 30.0 / 255.0],
    }
}

impl Palette {
    /// Map an accumulated pixel to a terminal color at the active depth.
    pub fn quantize(&self, rgb: [f32; 3]) -> Color {
        quantize_rgb(rgb, self.mode)
    }

    /// Mono output: pick a ramp glyph from perceived brightness.
    pub fn luma_glyph(&self, rgb: [f32; 3]) -> char {
        let luma = (0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2]).clamp(0.0, 1.0);
        let idx = (luma * (MONO_RAMP.len() - 1) as f32).round() as usize;
        MONO_RAMP[idx.min(MONO_RAMP.len() - 1)]
    }
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

fn quantize_rgb(rgb: [f32; 3], mode: ColorMode) -> Color {
    let (r, g, b) = (to_byte(rgb[0]), to_byte(rgb[1]), to_byte(rgb[2]));
    match mode {
        ColorMode::TrueColor => Color::Rgb { r, g, b },
        ColorMode::Color256 => Color::AnsiValue(rgb_to_ansi256(r, g, b)),
        ColorMode::Mono => Color::Reset,
    }
}

fn dist2(r0: u8, g0: u8, b0: u8, r1: u8, g1: u8, b1: u8) -> i32 {
    let dr = (r0 as i32) - (r1 as i32);
    let dg = (g0 as i32) - (g1 as i32);
    let db = (b0 as i32) - (b1 as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

/// Nearest xterm-256 index: compare the 6x6x6 cube candidate against the
/// grayscale ramp candidate and keep the closer one.
pub fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let r6 = ((r as u16 * 5) + 127) / 255;
    let g6 = ((g as u16 * 5) + 127) / 255;
    let b6 = ((b as u16 * 5) + 127) / 255;

    let cr = CUBE_LEVELS[r6 as usize];
    let cg = CUBE_LEVELS[g6 as usize];
    let cb = CUBE_LEVELS[b6 as usize];
    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);
    let cube_dist = dist2(r, g, b, cr, cg, cb);

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let gray_idx = if avg < 8 {
        16
    } else if avg > 238 {
        231
    } else {
        232 + ((avg - 8) / 10)
    };
    let (gr, gg, gb) = if gray_idx == 16 {
        (0, 0, 0)
    } else if gray_idx == 231 {
        (255, 255, 255)
    } else {
        let v = 8 + 10 * (gray_idx - 232);
        (v, v, v)
    };
    let gray_dist = dist2(r, g, b, gr, gg, gb);

    if gray_dist < cube_dist {
        gray_idx
    } else {
        cube_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_primaries_round_trip() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red[0] - 1.0).abs() < 1e-5);
        assert!(red[1].abs() < 1e-5);
        assert!(red[2].abs() < 1e-5);

        let white = hsl_to_rgb(123.0, 0.4, 1.0);
        assert!(white.iter().all(|&v| (v - 1.0).abs() < 1e-5));
    }

    #[test]
    fn azure_water_is_mostly_blue() {
        let p = build_palette(ColorScheme::Azure, ColorMode::TrueColor, true);
        assert!(p.water[2] > p.water[0]);
        assert!(p.water[2] > 0.9);
    }

    #[test]
    fn ansi256_endpoints() {
        assert_eq!(rgb_to_ansi256(0, 0, 0), 16);
        assert_eq!(rgb_to_ansi256(255, 255, 255), 231);
    }

    #[test]
    fn luma_glyph_spans_ramp() {
        let p = build_palette(ColorScheme::Azure, ColorMode::Mono, true);
        assert_eq!(p.luma_glyph([0.0, 0.0, 0.0]), ' ');
        assert_eq!(p.luma_glyph([1.0, 1.0, 1.0]), '@');
    }
}
