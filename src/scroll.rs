// Copyright (c) 2026 rezky_nightky

use std::time::{Duration, Instant};

use crate::waterfall::WaterfallParams;

/// Floor applied to the sample interval so back-to-back events cannot
/// blow the velocity up through a near-zero divisor.
const MIN_SAMPLE_DT: Duration = Duration::from_millis(16);

/// Fraction of the previous estimate kept per sample. Trades
/// responsiveness for jitter suppression.
const SMOOTHING: f32 = 0.85;

/// Scroll velocity estimator.
///
/// Samples a virtual scroll offset over time and low-pass-filters the
/// instantaneous velocity into a stable px/s signal. Input-agnostic:
/// the event loop converts wheel notches and scroll keys to offsets.
#[derive(Debug)]
pub struct ScrollTracker {
    last_offset: f32,
    last_t: Option<Instant>,
    filtered: f32,
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self {
            last_offset: 0.0,
            last_t: None,
            filtered: 0.0,
        }
    }

    /// Feed one scroll sample. The first sample only seeds the state, so
    /// the first computed velocity is exactly zero rather than a spike
    /// against an arbitrary origin.
    pub fn on_scroll(&mut self, offset: f32, now: Instant) {
        let last_t = match self.last_t {
            Some(t) => t,
            None => {
                self.last_offset = offset;
                now
            }
        };

        let dt = now.saturating_duration_since(last_t).max(MIN_SAMPLE_DT);
        let v = (offset - self.last_offset) / dt.as_secs_f32();
        self.filtered = self.filtered * SMOOTHING + v * (1.0 - SMOOTHING);

        self.last_offset = offset;
        self.last_t = Some(now);
    }

    /// Filtered velocity in px/s. Signed; emission uses the magnitude.
    pub fn velocity(&self) -> f32 {
        self.filtered
    }

    pub fn offset(&self) -> f32 {
        self.last_offset
    }

    /// Decay the estimate when no events arrive, so emission settles back
    /// to the base rate once scrolling stops.
    pub fn settle(&mut self, now: Instant) {
        if let Some(t) = self.last_t {
            if now.saturating_duration_since(t) > Duration::from_millis(150) {
                self.filtered *= SMOOTHING;
            }
        }
    }
}

/// Emission controller: map filtered scroll velocity to a spawn rate in
/// particles/second. Pure in the estimator output; monotone in its
/// magnitude and saturating at base + max_bonus.
pub fn emission_rate(filtered_velocity: f32, params: &WaterfallParams) -> f32 {
    let bonus = (filtered_velocity.abs() * params.velocity_gain).clamp(0.0, params.max_bonus);
    params.base_emission + bonus
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{emission_rate, ScrollTracker};
    use crate::waterfall::WaterfallParams;

    #[test]
    fn first_sample_yields_zero_velocity() {
        let mut t = ScrollTracker::new();
        t.on_scroll(5000.0, Instant::now());
        assert_eq!(t.velocity(), 0.0);
        assert_eq!(t.offset(), 5000.0);
    }

    #[test]
    fn converges_toward_constant_raw_velocity() {
        let mut t = ScrollTracker::new();
        let start = Instant::now();
        t.on_scroll(0.0, start);

        // 100 px every 100 ms is a steady 1000 px/s.
        for i in 1..=40u32 {
            t.on_scroll(i as f32 * 100.0, start + Duration::from_millis(i as u64 * 100));
        }
        assert!((t.velocity() - 1000.0).abs() < 10.0);

        // Exponential approach: after n samples the residual is 0.85^n.
        let mut t2 = ScrollTracker::new();
        t2.on_scroll(0.0, start);
        for i in 1..=5u32 {
            t2.on_scroll(i as f32 * 100.0, start + Duration::from_millis(i as u64 * 100));
        }
        let expected = 1000.0 * (1.0 - 0.85f32.powi(5));
        assert!((t2.velocity() - expected).abs() < 1.0);
    }

    #[test]
    fn sample_interval_is_floored() {
        let mut t = ScrollTracker::new();
        let start = Instant::now();
        t.on_scroll(0.0, start);
        // 16 px in 1 ms would be 16000 px/s raw; the 16 ms floor caps the
        // raw estimate at 1000 px/s.
        t.on_scroll(16.0, start + Duration::from_millis(1));
        assert!((t.velocity() - 1000.0 * 0.15).abs() < 1.0);
    }

    #[test]
    fn negative_scroll_gives_negative_velocity() {
        let mut t = ScrollTracker::new();
        let start = Instant::now();
        t.on_scroll(1000.0, start);
        t.on_scroll(900.0, start + Duration::from_millis(100));
        assert!(t.velocity() < 0.0);
    }

    #[test]
    fn settle_decays_a_stale_estimate() {
        let mut t = ScrollTracker::new();
        let start = Instant::now();
        t.on_scroll(0.0, start);
        t.on_scroll(100.0, start + Duration::from_millis(100));
        let v = t.velocity();
        assert!(v > 0.0);
        t.settle(start + Duration::from_millis(500));
        assert!(t.velocity() < v);
    }

    #[test]
    fn emission_is_monotone_and_saturates() {
        let params = WaterfallParams::default();
        let mut prev = emission_rate(0.0, &params);
        assert_eq!(prev, params.base_emission);
        for v in [10.0, 50.0, 100.0, 200.0, 400.0, 1000.0, 10000.0] {
            let rate = emission_rate(v, &params);
            assert!(rate >= prev);
            prev = rate;
        }
        assert_eq!(prev, params.base_emission + params.max_bonus);
        // Sign of the velocity must not matter.
        assert_eq!(emission_rate(-300.0, &params), emission_rate(300.0, &params));
    }
}
