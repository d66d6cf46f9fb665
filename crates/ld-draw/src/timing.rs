//! Timing profiles for the reveal animation

use serde::{Deserialize, Serialize};

/// Timing profile identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Live show timing
    #[default]
    Normal,
    /// Rehearsal speed (quarter length)
    Turbo,
    /// Near-zero durations, for scripted runs
    Instant,
    /// Scaled from another profile
    Custom,
}

impl TimingProfile {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Turbo => "Turbo",
            Self::Instant => "Instant",
            Self::Custom => "Custom",
        }
    }
}

/// Reveal timing configuration (all values in ms)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealTiming {
    /// Profile type
    pub profile: TimingProfile,

    /// Lock time of the highest digit
    pub first_lock_ms: u64,

    /// Added lock delay per following digit
    pub lock_interval_ms: u64,

    /// Frame interval while digits spin freely
    pub spin_tick_ms: u64,

    /// Deceleration length for an ordinary winner
    pub slow_mo_ms: u64,

    /// Deceleration length for the last winner of the last prize
    pub final_slow_mo_ms: u64,

    /// How long before the deceleration ends the fake-out fires
    pub fake_out_lead_ms: u64,

    /// How long the wrong digit is held
    pub fake_out_hold_ms: u64,

    /// Gap between the end of the hold and the next frame
    pub fake_out_resume_ms: u64,

    /// Frame interval at the start of deceleration
    pub decel_min_delay_ms: f64,

    /// Frame interval added as deceleration completes
    pub decel_delay_span_ms: f64,

    /// Pause between winners of one batch
    pub winner_pause_ms: u64,
}

impl RevealTiming {
    /// Live show timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            first_lock_ms: 800,
            lock_interval_ms: 400,
            spin_tick_ms: 75,
            slow_mo_ms: 4000,
            final_slow_mo_ms: 14000,
            fake_out_lead_ms: 2000,
            fake_out_hold_ms: 800,
            fake_out_resume_ms: 50,
            decel_min_delay_ms: 50.0,
            decel_delay_span_ms: 400.0,
            winner_pause_ms: 2000,
        }
    }

    /// Rehearsal timing
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            ..Self::normal().scaled(0.25)
        }
    }

    /// Near-instant reveals
    pub fn instant() -> Self {
        Self {
            profile: TimingProfile::Instant,
            first_lock_ms: 0,
            lock_interval_ms: 0,
            spin_tick_ms: 1,
            slow_mo_ms: 0,
            final_slow_mo_ms: 0,
            fake_out_lead_ms: 0,
            fake_out_hold_ms: 0,
            fake_out_resume_ms: 1,
            decel_min_delay_ms: 1.0,
            decel_delay_span_ms: 0.0,
            winner_pause_ms: 0,
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Instant => Self::instant(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Scale timing by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        let factor = factor.max(0.0);
        let ms = |v: u64| (v as f64 * factor).round() as u64;
        Self {
            profile: TimingProfile::Custom,
            first_lock_ms: ms(self.first_lock_ms),
            lock_interval_ms: ms(self.lock_interval_ms),
            spin_tick_ms: ms(self.spin_tick_ms).max(1),
            slow_mo_ms: ms(self.slow_mo_ms),
            final_slow_mo_ms: ms(self.final_slow_mo_ms),
            fake_out_lead_ms: ms(self.fake_out_lead_ms),
            fake_out_hold_ms: ms(self.fake_out_hold_ms),
            fake_out_resume_ms: ms(self.fake_out_resume_ms).max(1),
            decel_min_delay_ms: (self.decel_min_delay_ms * factor).max(1.0),
            decel_delay_span_ms: self.decel_delay_span_ms * factor,
            winner_pause_ms: ms(self.winner_pause_ms),
        }
    }

    /// Lock time of high digit `index`
    pub fn lock_time(&self, index: usize) -> u64 {
        self.first_lock_ms + index as u64 * self.lock_interval_ms
    }

    /// When the lowest digit starts decelerating, for a display `width` wide
    ///
    /// This is the lock time of the last high digit, or the first lock time
    /// when there are no high digits.
    pub fn slow_mo_start(&self, width: usize) -> u64 {
        if width >= 2 {
            self.lock_time(width - 2)
        } else {
            self.first_lock_ms
        }
    }

    /// Deceleration length for one winner
    pub fn slow_mo_duration(&self, climax: bool) -> u64 {
        if climax {
            self.final_slow_mo_ms
        } else {
            self.slow_mo_ms
        }
    }

    /// Frame interval for an eased progress value
    pub fn decel_delay(&self, eased: f64) -> u64 {
        (self.decel_min_delay_ms + eased * self.decel_delay_span_ms)
            .round()
            .max(1.0) as u64
    }
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self::normal()
    }
}

/// Quadratic ease-out: fast start, gentle landing
pub fn ease_out(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p) * (1.0 - p)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_lock_schedule() {
        let timing = RevealTiming::normal();
        assert_eq!(timing.lock_time(0), 800);
        assert_eq!(timing.lock_time(2), 1600);
        assert_eq!(timing.slow_mo_start(4), 1600);
        assert_eq!(timing.slow_mo_start(2), 800);
        assert_eq!(timing.slow_mo_start(1), 800);
    }

    #[test]
    fn test_slow_mo_duration() {
        let timing = RevealTiming::normal();
        assert_eq!(timing.slow_mo_duration(false), 4000);
        assert_eq!(timing.slow_mo_duration(true), 14000);
    }

    #[test]
    fn test_ease_out() {
        assert_relative_eq!(ease_out(0.0), 0.0);
        assert_relative_eq!(ease_out(0.5), 0.75);
        assert_relative_eq!(ease_out(1.0), 1.0);
        assert_relative_eq!(ease_out(2.0), 1.0);
    }

    #[test]
    fn test_decel_delay_grows() {
        let timing = RevealTiming::normal();
        assert_eq!(timing.decel_delay(0.0), 50);
        assert_eq!(timing.decel_delay(1.0), 450);
        assert!(timing.decel_delay(0.5) > timing.decel_delay(0.1));
    }

    #[test]
    fn test_profiles() {
        let normal = RevealTiming::normal();
        let turbo = RevealTiming::turbo();
        let instant = RevealTiming::instant();

        assert_eq!(turbo.profile, TimingProfile::Turbo);
        assert!(turbo.slow_mo_ms < normal.slow_mo_ms);
        assert_eq!(instant.slow_mo_ms, 0);
        assert!(instant.spin_tick_ms >= 1);
        assert_eq!(RevealTiming::from_profile(TimingProfile::Normal), normal);
    }

    #[test]
    fn test_scaled_keeps_progress() {
        let tiny = RevealTiming::normal().scaled(0.0);
        assert_eq!(tiny.profile, TimingProfile::Custom);
        assert!(tiny.spin_tick_ms >= 1);
        assert!(tiny.decel_delay(0.0) >= 1);
    }
}
