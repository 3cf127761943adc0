#![allow(missing_docs)]
//! Pulse-expansion encoder tests.

use parallel_clockless::encoder::{clear_pass, overlay_plane, read_back_lane};
use parallel_clockless::timing::{BitTiming, TimingProfile};
use parallel_clockless::transpose::{ROW_BYTES, lane_mask, lane_slot, transpose_plane};

const COMPONENTS: usize = 3;

fn ws2812_profile() -> TimingProfile {
    TimingProfile::resolve(BitTiming::new(250, 625, 375), 20).unwrap()
}

fn encode_lane_byte(lane: usize, value: u8) -> [u32; 8] {
    let mut row = [0u8; ROW_BYTES];
    row[lane_slot(lane)] = value;
    transpose_plane(&row)
}

#[test]
fn clear_pass_stamps_the_invariant_regions() {
    let profile = ws2812_profile();
    let mut words = vec![0xDEAD_BEEF_u32; profile.buffer_words(COMPONENTS)];
    clear_pass(&mut words, &profile, COMPONENTS);

    let pulses = profile.pulses_per_bit();
    for group in 0..(8 * COMPONENTS) {
        let offset = group * pulses;
        for pulse in 0..pulses {
            let word = words[offset + pulse];
            if pulse < profile.ones_for_zero() {
                assert_eq!(word, u32::MAX, "group {group} pulse {pulse}");
            } else if pulse >= profile.ones_for_one() {
                assert_eq!(word, 0, "group {group} pulse {pulse}");
            } else {
                // The differing region belongs to the overlay pass.
                assert_eq!(word, 0xDEAD_BEEF, "group {group} pulse {pulse}");
            }
        }
    }
}

#[test]
fn clear_pass_is_idempotent() {
    let profile = ws2812_profile();
    let mut words = vec![0u32; profile.buffer_words(COMPONENTS)];

    clear_pass(&mut words, &profile, COMPONENTS);
    let once = words.clone();
    clear_pass(&mut words, &profile, COMPONENTS);

    assert_eq!(words, once);
}

#[test]
fn overlay_touches_only_the_differing_pulses() {
    let profile = ws2812_profile();
    let mut words = vec![0u32; profile.buffer_words(COMPONENTS)];
    clear_pass(&mut words, &profile, COMPONENTS);
    let before = words.clone();

    let bits = encode_lane_byte(4, 0xFF);
    overlay_plane(&mut words, &profile, 1, &bits, lane_mask(4));

    let pulses = profile.pulses_per_bit();
    for (index, (after, original)) in words.iter().zip(&before).enumerate() {
        let group = index / pulses;
        let pulse = index % pulses;
        let differing = (profile.ones_for_zero()..profile.ones_for_one()).contains(&pulse);
        let component = group / 8;
        if differing && component == 1 {
            assert_eq!(*after, lane_mask(4), "index {index}");
        } else {
            assert_eq!(*after, *original, "index {index}");
        }
    }
}

#[test]
fn inactive_lanes_are_forced_low_in_the_differing_region() {
    let profile = ws2812_profile();
    let mut words = vec![0u32; profile.buffer_words(COMPONENTS)];
    clear_pass(&mut words, &profile, COMPONENTS);

    // Lane 3 transposed all-ones, but it is absent from the active mask.
    let mut row = [0u8; ROW_BYTES];
    row[lane_slot(3)] = 0xFF;
    row[lane_slot(7)] = 0xFF;
    let bits = transpose_plane(&row);
    for component in 0..COMPONENTS {
        overlay_plane(&mut words, &profile, component, &bits, lane_mask(7));
    }

    let pulses = profile.pulses_per_bit();
    for group in 0..(8 * COMPONENTS) {
        for pulse in profile.ones_for_zero()..profile.ones_for_one() {
            let word = words[group * pulses + pulse];
            assert_eq!(word & lane_mask(3), 0, "group {group} pulse {pulse}");
            assert_eq!(word & lane_mask(7), lane_mask(7), "group {group} pulse {pulse}");
        }
    }
    for component in 0..COMPONENTS {
        assert_eq!(read_back_lane(&words, &profile, component, 3), 0);
        assert_eq!(read_back_lane(&words, &profile, component, 7), 0xFF);
    }
}

#[test]
fn overlay_round_trips_lane_bytes() {
    let profile = ws2812_profile();
    let mut words = vec![0u32; profile.buffer_words(COMPONENTS)];
    clear_pass(&mut words, &profile, COMPONENTS);

    let mut row = [0u8; ROW_BYTES];
    row[lane_slot(0)] = 0xA5;
    row[lane_slot(12)] = 0x5A;
    row[lane_slot(23)] = 0x81;
    let bits = transpose_plane(&row);
    overlay_plane(&mut words, &profile, 2, &bits, lane_mask(0) | lane_mask(12) | lane_mask(23));

    assert_eq!(read_back_lane(&words, &profile, 2, 0), 0xA5);
    assert_eq!(read_back_lane(&words, &profile, 2, 12), 0x5A);
    assert_eq!(read_back_lane(&words, &profile, 2, 23), 0x81);
    assert_eq!(read_back_lane(&words, &profile, 2, 5), 0);
}
