// Copyright (c) 2026 rezky_nightky

mod cell;
mod config;
mod frame;
mod palette;
mod runtime;
mod scroll;
mod surface;
mod terminal;
mod waterfall;

use std::env;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind, MouseEventKind};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, parse_color_scheme, print_list_colors,
    Args, ColorBg,
};
use crate::frame::Frame;
use crate::palette::build_palette;
use crate::runtime::ColorMode;
use crate::scroll::{emission_rate, ScrollTracker};
use crate::surface::Surface;
use crate::terminal::{restore_terminal_best_effort, Terminal};
use crate::waterfall::{Waterfall, WaterfallParams, DEFAULT_SEED};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn build_info() -> &'static str {
    env!("HYDROSTRIX_BUILD")
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_f32_range(name: &str, v: f32, min: f32, max: f32) -> f32 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_u16_range(name: &str, v: u16, min: u16, max: u16) -> u16 {
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn detect_color_mode_auto() -> ColorMode {
    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }

    ColorMode::Color256
}

fn detect_color_mode(args: &Args) -> ColorMode {
    if let Some(m) = args.colormode {
        return match m {
            0 => ColorMode::Mono,
            8 => ColorMode::Color256,
            24 => ColorMode::TrueColor,
            _ => {
                eprintln!("invalid --colormode: {} (allowed: 0,8,24)", m);
                std::process::exit(1);
            }
        };
    }

    detect_color_mode_auto()
}

fn color_mode_label(m: ColorMode) -> &'static str {
    match m {
        ColorMode::TrueColor => "24-bit truecolor",
        ColorMode::Color256 => "8-bit (256-color)",
        ColorMode::Mono => "mono",
    }
}

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    let matches = cmd.get_matches_from(env::args_os());
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_colors {
        print_list_colors();
        return Ok(());
    }

    if args.check_bitcolor {
        let colorterm = env::var("COLORTERM").unwrap_or_default();
        let term = env::var("TERM").unwrap_or_default();
        let auto = detect_color_mode_auto();
        let effective = detect_color_mode(&args);

        println!("BITCOLOR CHECK:");
        println!(
            "  COLORTERM: {}",
            if colorterm.is_empty() {
                "(unset)"
            } else {
                &colorterm
            }
        );
        println!(
            "  TERM: {}",
            if term.is_empty() { "(unset)" } else { &term }
        );
        println!("  auto_detected: {}", color_mode_label(auto));
        if args.colormode.is_some() {
            println!("  forced: {}", color_mode_label(effective));
        }
        println!("  effective: {}", color_mode_label(effective));
        return Ok(());
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    let color_mode = detect_color_mode(&args);
    let mut scheme = match parse_color_scheme(&args.color) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let target_fps = require_f64_range("--fps", args.fps, 1.0, 240.0);
    let duration_s = args.duration.map(|s| {
        if !s.is_finite() {
            eprintln!("failed to apply --duration {} (must be a finite number)", s);
            std::process::exit(1);
        }
        if s > 0.0 {
            return require_f64_range("--duration", s, 0.1, 86400.0);
        }
        s
    });

    let scale = require_u16_range("--scale", args.scale, 1, 4);
    let params = WaterfallParams {
        gravity: require_f32_range("--gravity", args.gravity, 0.0, 100_000.0),
        drag: require_f32_range("--drag", args.drag, 0.0, 0.5),
        splash: require_f32_range("--splash", args.splash, 0.0, 1.0),
        radius_min: args.radius.low,
        radius_max: args.radius.high,
        alpha: require_f32_range("--alpha", args.alpha, 0.0, 1.0),
        trail_alpha: require_f32_range("--fade", args.fade, 0.01, 1.0),
        base_emission: require_f32_range("--base", args.base, 0.0, 10_000.0),
        max_bonus: require_f32_range("--max-bonus", args.max_bonus, 0.0, 10_000.0),
        velocity_gain: require_f32_range("--gain", args.gain, 0.0, 100.0),
        ..WaterfallParams::default()
    };
    let scroll_step = require_f32_range("--scroll-step", args.scroll_step, 1.0, 1000.0);
    let default_background = matches!(args.color_bg, ColorBg::DefaultBackground);

    let mut term = Terminal::new()?;
    let (w, h) = term.size()?;

    let mut palette = build_palette(scheme, color_mode, default_background);
    let mut surface = Surface::new(w, h, scale, palette.backdrop);
    let mut frame = Frame::new(w, h, palette.bg);
    let mut waterfall = Waterfall::new(params, args.seed.unwrap_or(DEFAULT_SEED));
    let mut tracker = ScrollTracker::new();

    // Virtual scroll position fed by wheel notches and scroll keys.
    let mut scroll_offset: f32 = 0.0;
    let step_px = scroll_step * scale as f32;

    let start_time = Instant::now();
    let end_time = duration_s.and_then(|s| {
        if s <= 0.0 {
            return None;
        }
        Some(start_time + Duration::from_secs_f64(s))
    });

    let target_period = Duration::from_secs_f64(1.0 / target_fps);
    let mut next_frame = Instant::now();
    let mut last_tick: Option<Instant> = None;
    let mut running = true;
    let mut paused = false;

    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }
        let mut pending_resize: Option<(u16, u16)> = None;

        loop {
            while Terminal::poll_event(Duration::from_millis(0))? {
                let ev = Terminal::read_event()?;
                match ev {
                    Event::Resize(nw, nh) => {
                        pending_resize = Some((nw, nh));
                    }
                    Event::Mouse(m) => {
                        let delta = match m.kind {
                            MouseEventKind::ScrollDown => step_px,
                            MouseEventKind::ScrollUp => -step_px,
                            _ => 0.0,
                        };
                        if delta != 0.0 {
                            scroll_offset += delta;
                            tracker.on_scroll(scroll_offset, Instant::now());
                        }
                    }
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        if args.screensaver {
                            running = false;
                            break;
                        }

                        match k.code {
                            KeyCode::Esc | KeyCode::Char('q') => running = false,
                            KeyCode::Char(' ') => {
                                waterfall.clear();
                                tracker = ScrollTracker::new();
                                scroll_offset = 0.0;
                                surface.prime(palette.backdrop);
                            }
                            KeyCode::Char('p') => paused = !paused,
                            KeyCode::Char('c') => {
                                scheme = scheme.next();
                                palette = build_palette(scheme, color_mode, default_background);
                            }
                            KeyCode::Char('-') => {
                                waterfall.density = (waterfall.density - 0.25).max(0.0);
                            }
                            KeyCode::Char('+') | KeyCode::Char('=') => {
                                waterfall.density = (waterfall.density + 0.25).min(5.0);
                            }
                            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown => {
                                let delta = match k.code {
                                    KeyCode::Up => -step_px,
                                    KeyCode::Down => step_px,
                                    KeyCode::PageUp => -5.0 * step_px,
                                    _ => 5.0 * step_px,
                                };
                                scroll_offset += delta;
                                tracker.on_scroll(scroll_offset, Instant::now());
                            }
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }

            if !running || pending_resize.is_some() {
                break;
            }

            let now = Instant::now();
            if now >= next_frame {
                break;
            }

            let mut timeout = next_frame - now;
            if let Some(end) = end_time {
                if now >= end {
                    break;
                }
                timeout = timeout.min(end - now);
            }
            let _ = Terminal::poll_event(timeout)?;
        }

        if !running {
            break;
        }

        if let Some((nw, nh)) = pending_resize {
            surface.resize(nw, nh, palette.backdrop);
            frame = Frame::new(nw, nh, palette.bg);
        }

        let now = Instant::now();
        let dt = last_tick
            .map(|t| now.saturating_duration_since(t).as_secs_f32())
            .unwrap_or_else(|| target_period.as_secs_f32());
        last_tick = Some(now);

        if !paused {
            tracker.settle(now);
            let rate = emission_rate(tracker.velocity(), &waterfall.params);
            waterfall.step(dt, rate, &mut surface, &palette);
        }

        surface.render_to(&mut frame, &palette);
        if frame.is_dirty_all() || !frame.dirty_indices().is_empty() {
            term.draw(&mut frame)?;
        }

        next_frame += target_period;
        let now = Instant::now();
        if now > next_frame {
            next_frame = now;
        }
    }

    Ok(())
}
