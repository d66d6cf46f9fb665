//! Reveal Animator: timed dramatization of a known winner
//!
//! The winner is decided before the animator is built. The animator only
//! produces a sequence of display frames that ends exactly on the target.
//!
//! ## Numeric schedule (width `W`)
//!
//! ```text
//! t=0        t0=800     t1=1200 ...  t(W-2)          slow-mo end
//!  │ spinning │ high digits lock one by one │ low digit decelerates │ settled
//!                                            (fake-out 2s before end,
//!                                             final prize only)
//! ```
//!
//! Names are swapped whole at an easing-based cadence until the slow-mo
//! duration elapses, then snap to the target.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::pool::{DrawMode, Entry};
use crate::timing::{RevealTiming, ease_out};

/// Steps of the low-digit countdown during deceleration
const DECEL_STEPS: u32 = 10;

/// Animation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealPhase {
    /// Every position shows random values
    Spinning,
    /// High digits are freezing onto the target
    Locking,
    /// Low digit counts down onto the target
    Decelerating,
    /// A wrong low digit is held on purpose
    FakeOut,
    /// Display equals the target; no more frames
    Settled,
}

/// What to reveal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealPlan {
    pub target: Entry,
    pub mode: DrawMode,
    /// Digit width of the display (numeric mode)
    pub width: usize,
    /// Final winner of the final prize: long deceleration plus fake-out
    pub climax: bool,
}

/// One display update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealFrame {
    pub display: String,
    pub phase: RevealPhase,
    /// Whether this frame should pulse the tick side channel
    pub pulse: bool,
    /// When the next frame is due (`None` once settled)
    pub next_at: Option<u64>,
}

impl RevealFrame {
    pub fn is_settled(&self) -> bool {
        self.next_at.is_none()
    }
}

/// Reveal state machine for a single winner
#[derive(Debug, Clone)]
pub struct RevealAnimator {
    plan: RevealPlan,
    /// Target digits, or `None` for a whole-value reveal
    digits: Option<Vec<u8>>,
    timing: RevealTiming,
    started_at: u64,
    slow_mo_start: u64,
    slow_mo_ms: u64,
    fake_out_fired: bool,
    display: String,
    phase: RevealPhase,
    next_at: Option<u64>,
}

impl RevealAnimator {
    /// Start a reveal at `now`; the first frame is due immediately
    pub fn new(plan: RevealPlan, timing: RevealTiming, now: u64) -> Self {
        let digits = match plan.mode {
            DrawMode::Numeric => target_digits(&plan.target, plan.width),
            DrawMode::Name => None,
        };
        let width = digits.as_ref().map(Vec::len).unwrap_or(1);
        let slow_mo_start = if digits.is_some() {
            timing.slow_mo_start(width)
        } else {
            0
        };
        let slow_mo_ms = timing.slow_mo_duration(plan.climax);

        Self {
            display: plan.target.to_string(),
            plan,
            digits,
            timing,
            started_at: now,
            slow_mo_start,
            slow_mo_ms,
            fake_out_fired: false,
            phase: RevealPhase::Spinning,
            next_at: Some(now),
        }
    }

    pub fn target(&self) -> &Entry {
        &self.plan.target
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn next_at(&self) -> Option<u64> {
        self.next_at
    }

    pub fn is_settled(&self) -> bool {
        self.phase == RevealPhase::Settled
    }

    pub fn fake_out_fired(&self) -> bool {
        self.fake_out_fired
    }

    /// Produce the frame for time `now`
    ///
    /// `pool` supplies random values for whole-value reveals. Once settled,
    /// further calls return the settled frame without pulsing.
    pub fn step<R: Rng + ?Sized>(&mut self, now: u64, pool: &[Entry], rng: &mut R) -> RevealFrame {
        if !self.is_settled() {
            let elapsed = now.saturating_sub(self.started_at);
            let pulse = match self.digits.take() {
                Some(digits) => {
                    let pulse = self.step_digits(&digits, now, elapsed, rng);
                    self.digits = Some(digits);
                    pulse
                }
                None => self.step_whole(now, elapsed, pool, rng),
            };
            return self.frame(pulse);
        }
        self.frame(false)
    }

    fn frame(&self, pulse: bool) -> RevealFrame {
        RevealFrame {
            display: self.display.clone(),
            phase: self.phase,
            pulse,
            next_at: self.next_at,
        }
    }

    fn settle(&mut self) -> bool {
        self.display = self.plan.target.to_string();
        self.phase = RevealPhase::Settled;
        self.next_at = None;
        false
    }

    fn step_digits<R: Rng + ?Sized>(&mut self, digits: &[u8], now: u64, elapsed: u64, rng: &mut R) -> bool {
        let width = digits.len();
        let low = width - 1;

        if elapsed < self.slow_mo_start {
            let timing = &self.timing;
            self.display = digits
                .iter()
                .enumerate()
                .map(|(i, &d)| {
                    let shown = if i < low && elapsed >= timing.lock_time(i) {
                        d
                    } else {
                        rng.random_range(0..10u8)
                    };
                    char::from(b'0' + shown)
                })
                .collect();
            self.phase = if low > 0 && elapsed >= self.timing.first_lock_ms {
                RevealPhase::Locking
            } else {
                RevealPhase::Spinning
            };
            self.next_at = Some(now + self.timing.spin_tick_ms);
            return true;
        }

        let slow_elapsed = elapsed - self.slow_mo_start;
        if slow_elapsed >= self.slow_mo_ms {
            return self.settle();
        }

        let target_low = digits[low];
        let mut shown = digits.to_vec();

        if self.plan.climax
            && !self.fake_out_fired
            && slow_elapsed >= self.slow_mo_ms.saturating_sub(self.timing.fake_out_lead_ms)
        {
            self.fake_out_fired = true;
            let mut fake = rng.random_range(0..9u8);
            if fake >= target_low {
                fake += 1;
            }
            shown[low] = fake;
            self.display = render_digits(&shown);
            self.phase = RevealPhase::FakeOut;
            self.next_at =
                Some(now + self.timing.fake_out_hold_ms + self.timing.fake_out_resume_ms);
            log::debug!("fake-out on {} showing {}", self.plan.target, self.display);
            return false;
        }

        let eased = ease_out(slow_elapsed as f64 / self.slow_mo_ms as f64);
        let step = ((eased * DECEL_STEPS as f64).floor() as u32).min(DECEL_STEPS);
        shown[low] = ((target_low as u32 + DECEL_STEPS - step) % 10) as u8;

        self.display = render_digits(&shown);
        self.phase = RevealPhase::Decelerating;
        self.next_at = Some(now + self.timing.decel_delay(eased));
        true
    }

    fn step_whole<R: Rng + ?Sized>(&mut self, now: u64, elapsed: u64, pool: &[Entry], rng: &mut R) -> bool {
        if elapsed >= self.slow_mo_ms {
            return self.settle();
        }

        self.display = if pool.is_empty() {
            self.plan.target.to_string()
        } else {
            pool[rng.random_range(0..pool.len())].to_string()
        };

        let eased = ease_out(elapsed as f64 / self.slow_mo_ms as f64);
        self.phase = RevealPhase::Spinning;
        self.next_at = Some(now + self.timing.decel_delay(eased));
        true
    }
}

fn target_digits(target: &Entry, width: usize) -> Option<Vec<u8>> {
    let padded = format!("{:0>width$}", target.as_str());
    padded
        .bytes()
        .map(|b| b.is_ascii_digit().then(|| b - b'0'))
        .collect()
}

fn render_digits(digits: &[u8]) -> String {
    digits.iter().map(|&d| char::from(b'0' + d)).collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn plan(target: &str, mode: DrawMode, climax: bool) -> RevealPlan {
        RevealPlan {
            target: Entry::from(target),
            mode,
            width: target.len(),
            climax,
        }
    }

    /// Drive an animator on a virtual clock until it settles
    fn run(animator: &mut RevealAnimator, pool: &[Entry], seed: u64) -> Vec<(u64, RevealFrame)> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut frames = Vec::new();
        while let Some(at) = animator.next_at() {
            let frame = animator.step(at, pool, &mut rng);
            frames.push((at, frame));
            assert!(frames.len() < 10_000, "reveal never settled");
        }
        frames
    }

    #[test]
    fn test_numeric_lands_on_target_for_all_widths() {
        for target in ["7", "42", "305", "0419", "99999", "1234567890"] {
            for climax in [false, true] {
                let mut anim = RevealAnimator::new(
                    plan(target, DrawMode::Numeric, climax),
                    RevealTiming::normal(),
                    1000,
                );
                let frames = run(&mut anim, &[], 3);
                let (_, last) = frames.last().unwrap();
                assert!(last.is_settled());
                assert_eq!(last.display, target);
                assert_eq!(last.phase, RevealPhase::Settled);
                assert!(frames[..frames.len() - 1].iter().all(|(_, f)| !f.is_settled()));
            }
        }
    }

    #[test]
    fn test_high_digits_freeze_after_lock_time() {
        let timing = RevealTiming::normal();
        let mut anim = RevealAnimator::new(plan("5831", DrawMode::Numeric, false), timing.clone(), 0);
        let frames = run(&mut anim, &[], 11);

        for (at, frame) in &frames {
            let shown: Vec<char> = frame.display.chars().collect();
            assert_eq!(shown.len(), 4);
            for (i, expected) in "583".chars().enumerate() {
                if *at >= timing.lock_time(i) {
                    assert_eq!(shown[i], expected, "digit {i} not frozen at {at}ms");
                }
            }
        }
    }

    #[test]
    fn test_settles_at_slow_mo_end() {
        let timing = RevealTiming::normal();
        let mut anim = RevealAnimator::new(plan("123", DrawMode::Numeric, false), timing.clone(), 0);
        let frames = run(&mut anim, &[], 5);
        let (settled_at, _) = frames.last().unwrap();
        let end = timing.slow_mo_start(3) + timing.slow_mo_ms;
        assert!(*settled_at >= end);
        assert!(*settled_at < end + 500);
    }

    #[test]
    fn test_deceleration_slows_down() {
        let mut anim = RevealAnimator::new(plan("64", DrawMode::Numeric, false), RevealTiming::normal(), 0);
        let frames = run(&mut anim, &[], 9);
        let decel: Vec<u64> = frames
            .iter()
            .filter(|(_, f)| f.phase == RevealPhase::Decelerating)
            .map(|(at, _)| *at)
            .collect();
        assert!(decel.len() > 3);
        let first_gap = decel[1] - decel[0];
        let last_gap = decel[decel.len() - 1] - decel[decel.len() - 2];
        assert!(last_gap > first_gap);
    }

    #[test]
    fn test_deceleration_counts_down_onto_target() {
        let timing = RevealTiming::normal();
        for target in ["5", "07", "4821"] {
            let width = target.len();
            let mut anim = RevealAnimator::new(plan(target, DrawMode::Numeric, false), timing.clone(), 0);
            let frames = run(&mut anim, &[], 21);
            let slow_start = timing.slow_mo_start(width);
            let target_low = target.as_bytes()[width - 1] - b'0';

            let decel: Vec<&(u64, RevealFrame)> = frames
                .iter()
                .filter(|(_, f)| f.phase == RevealPhase::Decelerating)
                .collect();
            assert!(decel.len() > 10, "{target}: only {} decel frames", decel.len());

            for (at, frame) in decel {
                let eased = ease_out((at - slow_start) as f64 / timing.slow_mo_ms as f64);
                let step = ((eased * 10.0).floor() as u8).min(10);
                let low = (target_low + 10 - step) % 10;
                let expected = format!("{}{}", &target[..width - 1], low);
                assert_eq!(frame.display, expected, "{target} at {at}ms");
            }

            let spin: Vec<u64> = frames
                .iter()
                .map(|(at, _)| *at)
                .filter(|at| *at < slow_start)
                .collect();
            assert!(spin.len() > 1);
            assert!(spin.windows(2).all(|w| w[1] - w[0] == timing.spin_tick_ms), "{target}");
        }
    }

    #[test]
    fn test_fake_out_only_on_climax() {
        let mut ordinary = RevealAnimator::new(plan("27", DrawMode::Numeric, false), RevealTiming::normal(), 0);
        let frames = run(&mut ordinary, &[], 1);
        assert!(frames.iter().all(|(_, f)| f.phase != RevealPhase::FakeOut));
        assert!(!ordinary.fake_out_fired());

        let timing = RevealTiming::normal();
        let mut climax = RevealAnimator::new(plan("27", DrawMode::Numeric, true), timing.clone(), 0);
        let frames = run(&mut climax, &[], 1);
        let fakes: Vec<&(u64, RevealFrame)> = frames
            .iter()
            .filter(|(_, f)| f.phase == RevealPhase::FakeOut)
            .collect();
        assert_eq!(fakes.len(), 1);

        let (at, fake) = fakes[0];
        assert!(fake.display.starts_with('2'));
        assert_ne!(fake.display, "27");
        assert!(!fake.pulse);
        assert_eq!(
            fake.next_at,
            Some(at + timing.fake_out_hold_ms + timing.fake_out_resume_ms)
        );
        assert!(*at >= timing.slow_mo_start(2) + timing.final_slow_mo_ms - timing.fake_out_lead_ms);
        assert_eq!(frames.last().unwrap().1.display, "27");
    }

    #[test]
    fn test_single_digit_spins_then_decelerates() {
        let timing = RevealTiming::normal();
        let mut anim = RevealAnimator::new(plan("3", DrawMode::Numeric, false), timing.clone(), 0);
        let frames = run(&mut anim, &[], 4);
        assert!(frames.iter().all(|(_, f)| f.phase != RevealPhase::Locking));
        assert!(frames
            .iter()
            .filter(|(at, _)| *at < timing.first_lock_ms)
            .all(|(_, f)| f.phase == RevealPhase::Spinning));
        assert_eq!(frames.last().unwrap().1.display, "3");
    }

    #[test]
    fn test_name_mode_draws_from_full_pool() {
        let pool: Vec<Entry> = ["Ana", "Bo", "Cy", "Di"].into_iter().map(Entry::from).collect();
        let mut anim = RevealAnimator::new(plan("Cy", DrawMode::Name, false), RevealTiming::normal(), 0);
        let frames = run(&mut anim, &pool, 8);

        for (_, frame) in &frames[..frames.len() - 1] {
            assert!(pool.iter().any(|e| e.as_str() == frame.display));
            assert!(frame.pulse);
        }
        let (at, last) = frames.last().unwrap();
        assert_eq!(last.display, "Cy");
        assert!(*at >= RevealTiming::normal().slow_mo_ms);
    }

    #[test]
    fn test_no_pulse_after_settling() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut anim = RevealAnimator::new(plan("10", DrawMode::Numeric, false), RevealTiming::instant(), 0);
        let first = anim.step(0, &[], &mut rng);
        assert!(first.is_settled());
        assert_eq!(first.display, "10");

        let again = anim.step(5000, &[], &mut rng);
        assert!(!again.pulse);
        assert!(again.is_settled());
    }
}
