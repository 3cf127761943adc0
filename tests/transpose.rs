#![allow(missing_docs)]
//! Bit-plane transpose tests.

use parallel_clockless::registry::MAX_LANES;
use parallel_clockless::transpose::{
    LANE_BIT_OFFSET, ROW_BYTES, lane_mask, lane_slot, transpose_plane,
};

fn read_back(words: &[u32; 8], lane: usize) -> u8 {
    let mut byte = 0u8;
    for (bit, word) in words.iter().enumerate() {
        if word & lane_mask(lane) != 0 {
            byte |= 0x80 >> bit;
        }
    }
    byte
}

#[test]
fn round_trip_every_lane_and_value() {
    for lane in 0..MAX_LANES {
        for value in 0..=u8::MAX {
            let mut row = [0u8; ROW_BYTES];
            row[lane_slot(lane)] = value;
            let words = transpose_plane(&row);

            assert_eq!(read_back(&words, lane), value, "lane {lane} value {value}");
            // No other lane may see a bit, and the unrouted low byte stays
            // clear.
            for word in words {
                assert_eq!(word & !lane_mask(lane), 0, "lane {lane} value {value}");
            }
        }
    }
}

#[test]
fn every_lane_round_trips_in_the_same_row() {
    let mut row = [0u8; ROW_BYTES];
    for lane in 0..MAX_LANES {
        row[lane_slot(lane)] = (lane as u8).wrapping_mul(11).wrapping_add(3);
    }
    let words = transpose_plane(&row);

    for lane in 0..MAX_LANES {
        assert_eq!(
            read_back(&words, lane),
            (lane as u8).wrapping_mul(11).wrapping_add(3),
            "lane {lane}"
        );
    }
}

#[test]
fn word_zero_carries_the_most_significant_bits() {
    let mut row = [0u8; ROW_BYTES];
    row[lane_slot(5)] = 0x80;
    let words = transpose_plane(&row);

    assert_eq!(words[0], lane_mask(5));
    assert!(words[1..].iter().all(|&word| word == 0));
}

#[test]
fn full_rows_fill_exactly_the_lane_bits() {
    let row = [0xFF_u8; ROW_BYTES];
    let words = transpose_plane(&row);

    for word in words {
        assert_eq!(word, 0xFFFF_FF00);
    }
}

#[test]
fn lane_positions_are_fixed() {
    assert_eq!(lane_mask(0), 1 << LANE_BIT_OFFSET);
    assert_eq!(lane_mask(23), 1 << 31);
    assert_eq!(lane_slot(0), 23);
    assert_eq!(lane_slot(23), 0);
}
