//! Timing-profile resolution for one-wire bit protocols.
//!
//! A single-wire strip protocol is described by three phase durations. A
//! one-bit holds the line high for `t1 + t2` then low for `t3`; a zero-bit
//! holds it high for `t1` then low for `t2 + t3`. The parallel peripheral
//! cannot vary pulse widths per bit, so the resolver re-expresses the three
//! phases as a fixed number of equal-width pulses per bit: a bit becomes
//! `pulses_per_bit` output cycles of which the leading `ones_for_one`
//! (respectively `ones_for_zero`) are high.
//!
//! The search is a constrained common-divisor hunt, not an exact GCD: it
//! tolerates a small integer remainder on each phase, widening that slack only
//! when no tighter divisor keeps the pulse count under the ceiling. A few
//! percent of timing error is traded for a bounded pulse count.

use crate::{Error, Result};

/// Absolute ceiling on pulses per encoded bit, regardless of configuration.
///
/// Transfer buffers are sized for this worst case.
pub const PULSE_CEILING: usize = 40;

/// Phase durations of a one-wire bit protocol, in nanoseconds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    /// Leading high time shared by both bit values.
    pub t1: u32,
    /// Extra high time of a one-bit; extra low time of a zero-bit.
    pub t2: u32,
    /// Trailing low time shared by both bit values.
    pub t3: u32,
}

impl BitTiming {
    /// Phase durations in nanoseconds.
    #[must_use]
    pub const fn new(t1: u32, t2: u32, t3: u32) -> Self {
        Self { t1, t2, t3 }
    }

    /// Duration of one whole bit on the wire, in nanoseconds.
    #[must_use]
    pub const fn bit_period_ns(&self) -> u32 {
        self.t1 + self.t2 + self.t3
    }
}

/// Resolved pulse encoding for one bit protocol.
///
/// All strips attached to one peripheral instance share a single profile; it
/// is resolved once, on the first attach, and is immutable afterwards.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingProfile {
    source: BitTiming,
    pulses_per_bit: usize,
    ones_for_zero: usize,
    ones_for_one: usize,
}

impl TimingProfile {
    /// Resolve a pulse encoding for `timing` with at most `max_pulses_per_bit`
    /// pulses per bit (clamped to [`PULSE_CEILING`]).
    ///
    /// Fails with [`Error::DegenerateTiming`] when `t2` is zero (both bit
    /// values would encode identically) and [`Error::TimingUnsolvable`] when
    /// no common divisor keeps the pulse count under the ceiling even at
    /// maximal slack.
    pub fn resolve(timing: BitTiming, max_pulses_per_bit: usize) -> Result<Self> {
        if timing.t2 == 0 {
            return Err(Error::DegenerateTiming);
        }
        if timing.t1 == 0 || timing.t3 == 0 {
            return Err(Error::TimingUnsolvable);
        }
        let ceiling = max_pulses_per_bit.min(PULSE_CEILING);

        let smallest = timing.t1.min(timing.t2).min(timing.t3);
        let mut slack = 0;
        let mut divisor = common_divisor(smallest, slack, &timing);
        while divisor == 1 || pulse_count(divisor, &timing) > ceiling {
            slack += 1;
            if slack > smallest {
                return Err(Error::TimingUnsolvable);
            }
            divisor = common_divisor(smallest, slack, &timing);
        }

        let profile = Self {
            source: timing,
            pulses_per_bit: pulse_count(divisor, &timing),
            ones_for_zero: (timing.t1 / divisor) as usize,
            ones_for_one: ((timing.t1 / divisor) + (timing.t2 / divisor)) as usize,
        };
        if profile.ones_for_zero == profile.ones_for_one {
            return Err(Error::DegenerateTiming);
        }
        debug!(
            "pulse encoding: {} pulses per bit (high {} for zero, {} for one), divisor {} with slack {}",
            profile.pulses_per_bit,
            profile.ones_for_zero,
            profile.ones_for_one,
            divisor,
            slack
        );
        Ok(profile)
    }

    /// The timing this profile was resolved from.
    #[must_use]
    pub const fn timing(&self) -> BitTiming {
        self.source
    }

    /// Output cycles per encoded bit.
    #[must_use]
    pub const fn pulses_per_bit(&self) -> usize {
        self.pulses_per_bit
    }

    /// Leading high pulses of a zero-bit. Pulses below this index are high in
    /// both encodings.
    #[must_use]
    pub const fn ones_for_zero(&self) -> usize {
        self.ones_for_zero
    }

    /// Leading high pulses of a one-bit. Pulses at or past this index are low
    /// in both encodings.
    #[must_use]
    pub const fn ones_for_one(&self) -> usize {
        self.ones_for_one
    }

    /// Required output pulse rate in Hz: `pulses_per_bit` pulses spread over
    /// one bit period.
    #[must_use]
    pub fn pulse_rate_hz(&self) -> f64 {
        1e9 * self.pulses_per_bit as f64 / f64::from(self.source.bit_period_ns())
    }

    /// Words one transfer buffer needs for a single pixel of
    /// `components` color bytes across all lanes.
    #[must_use]
    pub const fn buffer_words(&self, components: usize) -> usize {
        self.pulses_per_bit * components * 8
    }
}

const fn pulse_count(divisor: u32, timing: &BitTiming) -> usize {
    ((timing.t1 / divisor) + (timing.t2 / divisor) + (timing.t3 / divisor)) as usize
}

/// Largest candidate divisor, searched downward from the smallest phase, that
/// divides all three phases with remainder at most `slack`. Falls back to 1.
fn common_divisor(smallest: u32, slack: u32, timing: &BitTiming) -> u32 {
    for candidate in (2..=smallest).rev() {
        if timing.t1 % candidate <= slack
            && timing.t2 % candidate <= slack
            && timing.t3 % candidate <= slack
        {
            return candidate;
        }
    }
    1
}
