//! Fractional clock-divider search.
//!
//! The peripheral derives its output clock as `base / (N + B/A)` with a
//! limited-precision fraction: `1 <= A <= 63`, `0 <= B < A`. The solver scans
//! every denominator once, keeps the best numerator for each, and settles on
//! the closest achievable divisor. It runs once at setup and never again.

use libm::fabs;

use crate::{Error, Result};

/// Largest fraction denominator the divider hardware supports.
pub const FRACTION_MAX: u32 = 63;

/// Fractional clock divider: `base / (n + b/a)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockDivider {
    /// Integer divisor.
    pub n: u32,
    /// Fraction numerator, `b < a`.
    pub b: u32,
    /// Fraction denominator, `1..=63`.
    pub a: u32,
}

impl ClockDivider {
    /// Find the `(n, b, a)` whose divisor is closest to
    /// `base_clock_hz / pulse_rate_hz`.
    ///
    /// The first exact fraction (lowest `a`) wins; otherwise the closest
    /// approximation seen during the scan is kept. A scan that converges on
    /// `a == b` is a carry artifact of a fractional part rounding to one and
    /// is corrected by stepping `n` instead. Fails with
    /// [`Error::DividerUnsolvable`] when the pulse rate is zero or above the
    /// base clock.
    pub fn solve(base_clock_hz: u32, pulse_rate_hz: f64) -> Result<Self> {
        if pulse_rate_hz <= 0.0 {
            return Err(Error::DividerUnsolvable);
        }
        let ideal = f64::from(base_clock_hz) / pulse_rate_hz;
        let mut n = ideal as u32;
        if n == 0 {
            return Err(Error::DividerUnsolvable);
        }
        let fraction = ideal - f64::from(n);

        let mut best_a = 1;
        let mut best_b = 0;
        let mut best_error = fraction;
        for a in 1..=FRACTION_MAX {
            // Nearest numerator for this denominator; may land on `b == a`.
            let b = (fraction * f64::from(a) + 0.5) as u32;
            let error = fabs(fraction - f64::from(b) / f64::from(a));
            if error == 0.0 {
                best_a = a;
                best_b = b;
                break;
            }
            if error < best_error {
                best_a = a;
                best_b = b;
                best_error = error;
            }
        }

        // Fractional part rounded to a whole step: carry into the integer.
        if best_a == best_b {
            best_a = 1;
            best_b = 0;
            n += 1;
        }

        let divider = Self {
            n,
            b: best_b,
            a: best_a,
        };
        debug!(
            "clock divider: {} + {}/{} of {} Hz base ({} Hz achieved)",
            divider.n,
            divider.b,
            divider.a,
            base_clock_hz,
            divider.output_hz(base_clock_hz) as u32
        );
        Ok(divider)
    }

    /// The divisor `n + b/a` as a float.
    #[must_use]
    pub fn divisor(&self) -> f64 {
        f64::from(self.n) + f64::from(self.b) / f64::from(self.a)
    }

    /// Output clock this divider produces from `base_clock_hz`.
    #[must_use]
    pub fn output_hz(&self, base_clock_hz: u32) -> f64 {
        f64::from(base_clock_hz) / self.divisor()
    }
}
