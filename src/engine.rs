//! The double-buffered transfer engine.
//!
//! One [`TransmissionContext`] exists per peripheral instance and owns
//! everything the lanes share: the resolved timing, the clock divider, the
//! channel table, the two DMA-visible transfer buffers, and the completion
//! signal. Strips attach once at setup; per frame, every strip submits its
//! pixel cursor through [`transmit`](TransmissionContext::transmit) and the
//! last submitter performs the whole transfer on behalf of all of them.
//!
//! Two contexts touch the shared state. The calling context fills both
//! buffers while priming, before the hardware starts, then suspends on the
//! completion signal. The interrupt context refills buffers while streaming
//! and finally releases the signal. The state machine hands the buffers from
//! one side to the other, so the two never overlap; the short critical
//! sections around each access keep the hand-off sound on any target.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicUsize, Ordering};

use crate::bus::{BufferRing, ParallelBus, WORD_WIDTH};
use crate::cursor::PixelCursor;
use crate::divider::ClockDivider;
use crate::encoder;
use crate::error::{Error, Result};
use crate::registry::ChannelRegistry;
use crate::timing::{BitTiming, PULSE_CEILING, TimingProfile};
use crate::transpose::{self, ROW_BYTES};

/// Transfer buffers in the ring.
pub const BUFFER_COUNT: usize = 2;

/// Most color components per pixel the transfer buffers are sized for.
pub const MAX_COMPONENTS: usize = 4;

const BUFFER_WORDS: usize = PULSE_CEILING * MAX_COMPONENTS * 8;

/// Attach-time engine configuration. Never mutated at runtime.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Base clock feeding the peripheral's fractional divider, in Hz.
    pub base_clock_hz: u32,
    /// Upper bound on pulses per encoded bit. More pulses encode the timing
    /// more accurately but lower the refresh rate; clamped to
    /// [`PULSE_CEILING`].
    pub max_pulses_per_bit: usize,
}

impl EngineConfig {
    /// 80 MHz base clock, at most 20 pulses per bit.
    pub const DEFAULT: Self = Self {
        base_clock_hz: 80_000_000,
        max_pulses_per_bit: 20,
    };
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Transfer engine states, in frame order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferState {
    /// No frame in progress.
    Idle,
    /// Both buffers being filled; hardware not yet started.
    Priming,
    /// Hardware consuming one buffer while the engine refills the other.
    Streaming,
    /// All channels exhausted; the final buffer is still going out.
    Draining,
    /// Frame complete, hardware stopped, caller about to be released.
    Stopped,
}

/// One hardware-visible transfer buffer, sized for the worst-case pulse
/// count and reused for the life of the peripheral.
struct TransferBuffer {
    words: [u32; BUFFER_WORDS],
}

impl TransferBuffer {
    const fn new() -> Self {
        Self {
            words: [0; BUFFER_WORDS],
        }
    }
}

struct Inner<P, C, const COMPONENTS: usize> {
    bus: P,
    config: EngineConfig,
    configured: bool,
    resolved: Option<(TimingProfile, ClockDivider)>,
    registry: ChannelRegistry<C>,
    buffers: [TransferBuffer; BUFFER_COUNT],
    /// Buffer the next fill cycle writes.
    next_fill: usize,
    /// Set once a fill cycle finds every channel exhausted.
    done_filling: bool,
    state: TransferState,
}

impl<P, C, const COMPONENTS: usize> Inner<P, C, COMPONENTS>
where
    P: ParallelBus,
    C: PixelCursor,
{
    /// Clear and prime both buffers, then start the hardware. Runs in the
    /// calling context with the state machine in `Priming`, so the interrupt
    /// side cannot touch the buffers yet.
    fn start_frame(&mut self) -> Result<()> {
        let Some((profile, divider)) = self.resolved else {
            return Err(Error::InvalidLane);
        };
        self.state = TransferState::Priming;
        self.next_fill = 0;
        self.done_filling = false;

        let words = profile.buffer_words(COMPONENTS);
        for buffer in &mut self.buffers {
            encoder::clear_pass(&mut buffer.words[..words], &profile, COMPONENTS);
        }
        self.fill_next(&profile);
        self.fill_next(&profile);

        if !self.configured {
            self.bus
                .configure(&divider, self.registry.len(), WORD_WIDTH)?;
            info!(
                "parallel bus configured: {} lanes, {} words per buffer",
                self.registry.len(),
                words
            );
            self.configured = true;
        }
        let ring = BufferRing::new(
            &self.buffers[0].words[..words],
            &self.buffers[1].words[..words],
        );
        self.bus.start(ring)?;
        self.state = TransferState::Streaming;
        Ok(())
    }

    /// One fill cycle: take the next pixel from every live channel,
    /// transpose, and overlay into the next ring buffer. Marks the engine
    /// done when no channel has data; the buffer is then left in its last
    /// valid state since it will not be reused this frame.
    fn fill_next(&mut self, profile: &TimingProfile) {
        if self.done_filling {
            return;
        }
        let index = self.next_fill;
        self.next_fill = (self.next_fill + 1) % BUFFER_COUNT;

        let mut rows = [[0u8; ROW_BYTES]; COMPONENTS];
        let mut active_mask = 0u32;
        for (lane, channel) in self.registry.channels_mut() {
            if !channel.live {
                continue;
            }
            let has_data = channel
                .cursor
                .as_ref()
                .is_some_and(PixelCursor::has_next);
            if !has_data {
                channel.live = false;
                continue;
            }
            let Some(cursor) = channel.cursor.as_mut() else {
                continue;
            };
            let slot = transpose::lane_slot(lane);
            for (component, row) in rows.iter_mut().enumerate() {
                row[slot] = cursor.component(component);
            }
            cursor.advance();
            active_mask |= transpose::lane_mask(lane);
        }

        if active_mask == 0 {
            self.done_filling = true;
            return;
        }

        let words = profile.buffer_words(COMPONENTS);
        let buffer = &mut self.buffers[index].words[..words];
        for (component, row) in rows.iter().enumerate() {
            let bit_words = transpose::transpose_plane(row);
            encoder::overlay_plane(buffer, profile, component, &bit_words, active_mask);
        }
    }
}

/// Shared transmission engine for one parallel peripheral instance.
///
/// `COMPONENTS` is the number of color bytes per pixel (3 for RGB strips,
/// 4 for RGBW), at most [`MAX_COMPONENTS`].
///
/// # Example
///
/// ```no_run
/// use parallel_clockless::Result;
/// use parallel_clockless::bus::{BufferRing, ParallelBus};
/// use parallel_clockless::cursor::{FrameCursor, Rgb, colors};
/// use parallel_clockless::divider::ClockDivider;
/// use parallel_clockless::engine::{EngineConfig, TransmissionContext};
/// use parallel_clockless::timing::BitTiming;
///
/// struct I2sBus; // wraps the real peripheral registers
///
/// impl ParallelBus for I2sBus {
///     fn configure(&mut self, _: &ClockDivider, _: usize, _: u32) -> Result<()> {
///         Ok(())
///     }
///     fn start(&mut self, _: BufferRing<'_>) -> Result<()> {
///         Ok(())
///     }
///     fn stop(&mut self) {}
/// }
///
/// async fn run() -> Result<()> {
///     let engine: TransmissionContext<I2sBus, FrameCursor<'static>, 3> =
///         TransmissionContext::new(I2sBus, EngineConfig::DEFAULT);
///
///     // WS2812-style timing, one lane per strip.
///     let timing = BitTiming::new(250, 625, 375);
///     let first = engine.attach(timing)?;
///     let second = engine.attach(timing)?;
///
///     static FRAME_A: [Rgb; 8] = [colors::BLUE; 8];
///     static FRAME_B: [Rgb; 8] = [colors::GRAY; 8];
///     engine.transmit(first, FrameCursor::new(&FRAME_A)).await?;
///     // The last strip's transmit performs the transfer and blocks until
///     // the frame has fully drained.
///     engine.transmit(second, FrameCursor::new(&FRAME_B)).await?;
///     Ok(())
/// }
/// ```
pub struct TransmissionContext<P, C, const COMPONENTS: usize = 3> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<P, C, COMPONENTS>>>,
    /// Channels that have requested transmission this frame; the caller that
    /// brings this to the registered total performs the transfer.
    requested: AtomicUsize,
    frame_done: Signal<CriticalSectionRawMutex, ()>,
}

impl<P, C, const COMPONENTS: usize> TransmissionContext<P, C, COMPONENTS>
where
    P: ParallelBus,
    C: PixelCursor,
{
    /// Engine around an unconfigured peripheral.
    pub fn new(bus: P, config: EngineConfig) -> Self {
        const {
            assert!(
                COMPONENTS >= 1 && COMPONENTS <= MAX_COMPONENTS,
                "COMPONENTS must be 1..=MAX_COMPONENTS"
            );
        }
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                bus,
                config,
                configured: false,
                resolved: None,
                registry: ChannelRegistry::new(),
                buffers: [TransferBuffer::new(), TransferBuffer::new()],
                next_fill: 0,
                done_filling: false,
                state: TransferState::Idle,
            })),
            requested: AtomicUsize::new(0),
            frame_done: Signal::new(),
        }
    }

    /// Attach a strip with the given bit timing and claim its lane.
    ///
    /// The first attach resolves the shared [`TimingProfile`] and clock
    /// divider; later attaches must request the identical timing or fail with
    /// [`Error::MixedProtocols`]. Fails with [`Error::CapacityExceeded`] once
    /// all lanes are claimed.
    pub fn attach(&self, timing: BitTiming) -> Result<usize> {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            match inner.resolved {
                Some((profile, _)) if profile.timing() != timing => {
                    return Err(Error::MixedProtocols);
                }
                Some(_) => {}
                None => {
                    let profile = TimingProfile::resolve(timing, inner.config.max_pulses_per_bit)?;
                    let divider = ClockDivider::solve(
                        inner.config.base_clock_hz,
                        profile.pulse_rate_hz(),
                    )?;
                    inner.resolved = Some((profile, divider));
                }
            }
            inner.registry.attach()
        })
    }

    /// Submit this lane's pixel cursor for the current frame.
    ///
    /// Every attached lane calls this once per frame, all from the same
    /// calling context. All but the last return immediately; the call that
    /// completes the set primes both buffers, starts the hardware, and
    /// suspends here until the frame has fully drained, the one suspension
    /// point in the engine. There is no timeout: a peripheral that never
    /// raises its buffer-consumed event leaves the caller suspended, by
    /// design.
    pub async fn transmit(&self, lane: usize, cursor: C) -> Result<()> {
        let total = self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if self.requested.load(Ordering::Acquire) == 0 {
                inner.registry.begin_frame();
            }
            inner.registry.store_cursor(lane, cursor)?;
            Ok::<_, Error>(inner.registry.len())
        })?;

        let requested = self.requested.fetch_add(1, Ordering::AcqRel) + 1;
        if requested < total {
            return Ok(());
        }

        // Last caller: do the real transfer on behalf of every lane.
        trace!("frame start: {} lanes", total);
        self.frame_done.reset();
        let started = self.inner.lock(|cell| cell.borrow_mut().start_frame());
        if let Err(error) = started {
            // Surface setup failures once and leave the engine reusable.
            self.inner
                .lock(|cell| cell.borrow_mut().state = TransferState::Idle);
            self.requested.store(0, Ordering::Release);
            return Err(error);
        }

        self.frame_done.wait().await;
        self.inner
            .lock(|cell| cell.borrow_mut().state = TransferState::Idle);
        self.requested.store(0, Ordering::Release);
        trace!("frame complete");
        Ok(())
    }

    /// Buffer-consumed event, invoked by the peripheral binding once per
    /// fully-sent buffer, from interrupt context.
    ///
    /// Refills the freed buffer while channels still have data; otherwise
    /// lets the in-flight buffer drain and, one event later, stops the
    /// hardware and releases the suspended caller. Events outside a frame are
    /// ignored as spurious.
    pub fn on_buffer_consumed(&self) {
        let completed = self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            match inner.state {
                TransferState::Streaming => {
                    let profile = inner.resolved.map(|(profile, _)| profile);
                    if let Some(profile) = profile {
                        inner.fill_next(&profile);
                    }
                    if inner.done_filling {
                        inner.state = TransferState::Draining;
                        trace!("last buffer filled, draining");
                    }
                    false
                }
                TransferState::Draining => {
                    inner.state = TransferState::Stopped;
                    inner.bus.stop();
                    true
                }
                // Spurious event outside a frame.
                TransferState::Idle | TransferState::Priming | TransferState::Stopped => false,
            }
        });
        if completed {
            self.frame_done.signal(());
        }
    }

    /// Current transfer state.
    pub fn state(&self) -> TransferState {
        self.inner.lock(|cell| cell.borrow().state)
    }

    /// Resolved timing profile, once the first strip has attached.
    pub fn profile(&self) -> Option<TimingProfile> {
        self.inner
            .lock(|cell| cell.borrow().resolved.map(|(profile, _)| profile))
    }

    /// Resolved clock divider, once the first strip has attached.
    pub fn divider(&self) -> Option<ClockDivider> {
        self.inner
            .lock(|cell| cell.borrow().resolved.map(|(_, divider)| divider))
    }

    /// Attached lane count.
    pub fn lanes(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().registry.len())
    }

    /// Read-only view of transfer buffer `index`, sized to the resolved
    /// profile (empty before the first attach).
    ///
    /// Peripheral bindings use this to point DMA descriptors at stable
    /// addresses during setup; tests use it to inspect encoded pulses.
    pub fn with_buffer<R>(&self, index: usize, f: impl FnOnce(&[u32]) -> R) -> R {
        self.inner.lock(|cell| {
            let inner = cell.borrow();
            let words = inner
                .resolved
                .map_or(0, |(profile, _)| profile.buffer_words(COMPONENTS));
            f(&inner.buffers[index % BUFFER_COUNT].words[..words])
        })
    }
}
