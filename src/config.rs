// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::str::FromStr;

use clap::Parser;

use crate::runtime::ColorScheme;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  hydrostrix --duration 0 --color azure --color-bg black --fps 60 --scale 2 --base 140 --max-bonus 260 --gain 1.2 --gravity 2200 --drag 0.0015 --splash 0.18 --radius 1.2,3.4 --alpha 0.88 --fade 0.28 --scroll-step 40";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_usage(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        if is_heading {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
        } else if let Some(rest) = line.strip_prefix("  hydrostrix") {
            out.push_str("  \x1b[1;34mhydrostrix\x1b[0m");
            out.push_str(rest);
        } else {
            out.push_str(line);
        }
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_usage(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

pub fn print_list_colors() {
    println!("COLORS:");
    println!("  azure     - spring water blue (default)");
    println!("  glacier   - pale glacial melt");
    println!("  teal      - tropical shallows");
    println!("  ember     - lava fall");
    println!("  violet    - nebula runoff");
    println!("  moss      - forest stream");
    println!("  silver    - moonlit spray");
}

pub fn parse_color_scheme(s: &str) -> Result<ColorScheme, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "azure" | "water" => Ok(ColorScheme::Azure),
        "glacier" | "ice" => Ok(ColorScheme::Glacier),
        "teal" => Ok(ColorScheme::Teal),
        "ember" | "lava" => Ok(ColorScheme::Ember),
        "violet" | "purple" => Ok(ColorScheme::Violet),
        "moss" | "forest" => Ok(ColorScheme::Moss),
        "silver" | "gray" | "grey" => Ok(ColorScheme::Silver),
        _ => Err(format!("invalid color: {} (see --list-colors)", s)),
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBg {
    #[value(name = "black")]
    Black,
    #[value(name = "default-background")]
    DefaultBackground,
}

#[derive(Clone, Copy, Debug)]
pub struct F32Range {
    pub low: f32,
    pub high: f32,
}

impl FromStr for F32Range {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(',')
            .ok_or_else(|| "expected: NUM1,NUM2".to_string())?;
        let low: f32 = a
            .trim()
            .parse()
            .map_err(|_| "invalid low value".to_string())?;
        let high: f32 = b
            .trim()
            .parse()
            .map_err(|_| "invalid high value".to_string())?;
        if !low.is_finite() || !high.is_finite() || low <= 0.0 || low > high {
            return Err("range must be finite, >0 and low <= high".to_string());
        }
        Ok(Self { low, high })
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "hydrostrix",
    about = "A scroll-driven particle waterfall for the terminal",
    disable_version_flag = true
)]
pub struct Args {
    /// Target frames per second (1-240)
    #[arg(long, default_value_t = 60.0, help_heading = "TIMING")]
    pub fps: f64,

    /// Exit after SECONDS (0 = run until quit)
    #[arg(long, value_name = "SECONDS", help_heading = "TIMING")]
    pub duration: Option<f64>,

    /// Water color scheme (see --list-colors)
    #[arg(long, default_value = "azure", help_heading = "LOOKS")]
    pub color: String,

    /// Cell background: black or the terminal default
    #[arg(long, value_enum, default_value_t = ColorBg::Black, help_heading = "LOOKS")]
    pub color_bg: ColorBg,

    /// Force color depth: 0 = mono, 8 = 256-color, 24 = truecolor
    #[arg(long, value_name = "BITS", help_heading = "LOOKS")]
    pub colormode: Option<u8>,

    /// Supersample factor, the device-pixel-ratio analog (1-4)
    #[arg(long, default_value_t = 2, help_heading = "LOOKS")]
    pub scale: u16,

    /// Particle alpha ceiling (0-1)
    #[arg(long, default_value_t = 0.88, help_heading = "LOOKS")]
    pub alpha: f32,

    /// Trail fade strength per frame (0-1); higher = shorter streaks
    #[arg(long, default_value_t = 0.28, help_heading = "LOOKS")]
    pub fade: f32,

    /// Base emission with no scrolling, particles/second
    #[arg(long, default_value_t = 140.0, help_heading = "POUR")]
    pub base: f32,

    /// Cap on the scroll-velocity emission bonus, particles/second
    #[arg(long, default_value_t = 260.0, help_heading = "POUR")]
    pub max_bonus: f32,

    /// Scroll velocity (px/s) to bonus emission gain
    #[arg(long, default_value_t = 1.2, help_heading = "POUR")]
    pub gain: f32,

    /// Virtual pixels of scroll per wheel notch
    #[arg(long, default_value_t = 40.0, help_heading = "POUR")]
    pub scroll_step: f32,

    /// Gravity in px/s^2
    #[arg(long, default_value_t = 2200.0, help_heading = "PHYSICS")]
    pub gravity: f32,

    /// Per-tick drag coefficient
    #[arg(long, default_value_t = 0.0015, help_heading = "PHYSICS")]
    pub drag: f32,

    /// Floor restitution factor (0-1)
    #[arg(long, default_value_t = 0.18, help_heading = "PHYSICS")]
    pub splash: f32,

    /// Particle radius range in device pixels: MIN,MAX
    #[arg(long, default_value = "1.2,3.4", help_heading = "PHYSICS")]
    pub radius: F32Range,

    /// RNG seed for reproducible motion
    #[arg(long, help_heading = "PHYSICS")]
    pub seed: Option<u64>,

    /// Exit on the first key press
    #[arg(long, help_heading = "MODES")]
    pub screensaver: bool,

    /// List available color schemes and exit
    #[arg(long, help_heading = "HELP")]
    pub list_colors: bool,

    /// Report detected terminal color support and exit
    #[arg(long, help_heading = "HELP")]
    pub check_bitcolor: bool,

    /// Print version and exit
    #[arg(short = 'v', long, help_heading = "HELP")]
    pub version: bool,

    /// Print build info and exit
    #[arg(long, help_heading = "HELP")]
    pub info: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_range_parses_pairs() {
        let r: F32Range = "1.2,3.4".parse().unwrap();
        assert_eq!(r.low, 1.2);
        assert_eq!(r.high, 3.4);
    }

    #[test]
    fn f32_range_rejects_bad_input() {
        assert!("3.4".parse::<F32Range>().is_err());
        assert!("0,2".parse::<F32Range>().is_err());
        assert!("5,2".parse::<F32Range>().is_err());
        assert!("nan,2".parse::<F32Range>().is_err());
    }

    #[test]
    fn scheme_names_and_aliases_resolve() {
        assert_eq!(parse_color_scheme("azure").unwrap(), ColorScheme::Azure);
        assert_eq!(parse_color_scheme("ICE").unwrap(), ColorScheme::Glacier);
        assert_eq!(parse_color_scheme("grey").unwrap(), ColorScheme::Silver);
        assert!(parse_color_scheme("plaid").is_err());
    }
}
