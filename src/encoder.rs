//! Pulse-expansion encoding of transposed bit words.
//!
//! Within one encoded bit, only the pulses in `[ones_for_zero, ones_for_one)`
//! differ between the two bit values: everything below is high for both,
//! everything at or past is low for both. Buffers are therefore written in two
//! passes: [`clear_pass`] stamps the invariant regions across the whole
//! buffer once per fill cycle, then [`overlay_plane`] writes only the
//! differing pulses per bit. Both passes are required for correctness. A
//! reused buffer still holds the previous pixel's data, and only the clear
//! pass restores the invariant regions.

use crate::timing::TimingProfile;
use crate::transpose;

/// Stamp the invariant pulse regions of every bit group in `words`.
///
/// For each of the `8 * components` bit groups: all-ones words for pulses
/// below `ones_for_zero`, zero words at and past `ones_for_one`. The middle
/// region is left untouched for [`overlay_plane`]. Idempotent.
pub fn clear_pass(words: &mut [u32], profile: &TimingProfile, components: usize) {
    let pulses = profile.pulses_per_bit();
    for group in 0..(8 * components) {
        let offset = group * pulses;
        for pulse in 0..profile.ones_for_zero() {
            words[offset + pulse] = u32::MAX;
        }
        for pulse in profile.ones_for_one()..pulses {
            words[offset + pulse] = 0;
        }
    }
}

/// Overlay one component's transposed bit words onto `words`.
///
/// Writes only the differing pulse range of each bit position, as
/// `active_mask & bit_word`: a lane missing from the mask is forced low for
/// those pulses no matter what the transpose produced, which is how exhausted
/// strips stay dark while others finish the frame.
pub fn overlay_plane(
    words: &mut [u32],
    profile: &TimingProfile,
    component: usize,
    bit_words: &[u32; 8],
    active_mask: u32,
) {
    let pulses = profile.pulses_per_bit();
    for (bit, word) in bit_words.iter().enumerate() {
        let offset = (component * 8 + bit) * pulses;
        for pulse in profile.ones_for_zero()..profile.ones_for_one() {
            words[offset + pulse] = active_mask & word;
        }
    }
}

/// Decode lane `lane`'s byte back out of one component's buffer group.
///
/// Reads the first pulse of the differing region of each bit position, the
/// inverse of [`overlay_plane`] over a cleared buffer. Diagnostic and test
/// helper; the hardware path never reads buffers back.
#[must_use]
pub fn read_back_lane(
    words: &[u32],
    profile: &TimingProfile,
    component: usize,
    lane: usize,
) -> u8 {
    let pulses = profile.pulses_per_bit();
    let probe = profile.ones_for_zero();
    let mut byte = 0u8;
    for bit in 0..8 {
        let offset = (component * 8 + bit) * pulses;
        if words[offset + probe] & transpose::lane_mask(lane) != 0 {
            byte |= 0x80 >> bit;
        }
    }
    byte
}
