//! Parallel transmission engine for single-wire "clockless" LED strips.
//!
//! Drives up to 24 strips at once through one parallel serial peripheral.
//! Such peripherals cannot vary pulse widths per bit the way a dedicated
//! one-wire transmitter can, so the engine runs the output clock high and
//! synthesizes each data bit as a fixed train of equal-width pulses: with a
//! WS2812-style protocol and ten pulses per bit, a one-bit goes out as
//! `1111111000` and a zero-bit as `1100000000`. Every pulse is one 32-bit
//! word carrying all lanes' levels in parallel, produced by transposing one
//! pixel from every strip into bit-position order and expanding each bit
//! position into its pulse train. Two DMA-visible buffers alternate, one
//! refilled from interrupt context while the hardware clocks out the other,
//! and the strip whose `transmit` call completes the frame's set performs the
//! transfer for all of them, suspending until it drains.
//!
//! The pixel pipeline above (gamma, dithering, color order, animation) and
//! the peripheral registers below are both out of scope: pixels arrive
//! through the [`cursor::PixelCursor`] contract as wire-ready bytes, and the
//! hardware sits behind the [`bus::ParallelBus`] trait.
//!
//! # Glossary
//!
//! - **Lane:** one bit position in the parallel output word, permanently
//!   assigned to one strip at attach time.
//! - **Pulse:** one output cycle of the peripheral clock, the smallest unit
//!   of the synthesized waveform.
//! - **Timing profile:** the resolved pulses-per-bit encoding of a one-wire
//!   protocol's three timing phases (see [`timing`]).
//! - **Transpose:** regrouping pixel data from per-lane bytes into
//!   per-bit-position words (see [`transpose`]).
//! - **Double buffering:** alternating two transfer buffers so one is filled
//!   while the hardware consumes the other (see [`engine`]).
#![no_std]

// This module must come first so the others see its macros.
pub(crate) mod fmt;

mod error;

pub mod bus;
pub mod cursor;
pub mod divider;
pub mod encoder;
pub mod engine;
pub mod registry;
pub mod timing;
pub mod transpose;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
