//! The downstream peripheral seam.
//!
//! Implement [`ParallelBus`] to bind the engine to real hardware: a parallel
//! serial peripheral (I2S/LCD, FlexIO, or PIO style) whose DMA unit walks the
//! two transfer buffers as a circular list. The engine is generic over this
//! trait, so everything above the register layer runs unchanged on any
//! platform, including the host, where tests drive a mock.

use crate::Result;
use crate::divider::ClockDivider;

/// Width in bits of one output word. Lanes occupy the high 24 bits.
pub const WORD_WIDTH: u32 = 32;

/// The two hardware-visible transfer buffers, in ring order.
///
/// Handed to [`ParallelBus::start`] so the implementation can point its DMA
/// descriptors at the words. The first buffer is always the first one clocked
/// out.
pub struct BufferRing<'a> {
    buffers: [&'a [u32]; 2],
}

impl<'a> BufferRing<'a> {
    pub(crate) const fn new(first: &'a [u32], second: &'a [u32]) -> Self {
        Self {
            buffers: [first, second],
        }
    }

    /// Buffer `index` of the ring (0 or 1).
    #[must_use]
    pub fn buffer(&self, index: usize) -> &'a [u32] {
        self.buffers[index % 2]
    }

    /// Words per buffer.
    #[must_use]
    pub fn words_per_buffer(&self) -> usize {
        self.buffers[0].len()
    }
}

/// Parallel serial peripheral driven by the engine.
///
/// The contract mirrors the engine's frame lifecycle:
///
/// 1. [`configure`](Self::configure) once, after the clock divider is solved;
/// 2. [`start`](Self::start) at the beginning of every frame, with both
///    buffers already primed;
/// 3. one buffer-consumed callback into
///    [`TransmissionContext::on_buffer_consumed`] per fully-sent buffer, from
///    interrupt context;
/// 4. [`stop`](Self::stop) when the frame has drained.
///
/// [`TransmissionContext::on_buffer_consumed`]:
///     crate::engine::TransmissionContext::on_buffer_consumed
pub trait ParallelBus {
    /// Apply clock divider and output geometry. Called once per peripheral
    /// lifetime; a failure is fatal and surfaced to the caller unretried.
    fn configure(
        &mut self,
        divider: &ClockDivider,
        lane_count: usize,
        word_width: u32,
    ) -> Result<()>;

    /// Begin clocking out the ring, starting with its first buffer. A failure
    /// is fatal and surfaced to the caller unretried.
    fn start(&mut self, ring: BufferRing<'_>) -> Result<()>;

    /// Halt output. Called from the buffer-consumed context when the frame
    /// drains, so implementations must be interrupt-safe.
    fn stop(&mut self);
}
