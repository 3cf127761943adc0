//! Channel bookkeeping for attached strips.
//!
//! Each attached strip owns one lane of the parallel output word for the life
//! of the peripheral. The table is fixed-size; lanes are handed out in attach
//! order and never reassigned.

use heapless::Vec;

use crate::{Error, Result};

/// Lanes in the parallel output word, and therefore the most strips one
/// peripheral instance can drive.
pub const MAX_LANES: usize = 24;

/// Per-lane state: the pixel cursor supplied for the current frame and the
/// frame-local liveness flag.
pub(crate) struct Channel<C> {
    pub(crate) cursor: Option<C>,
    /// True until the cursor runs dry; cleared permanently for the frame.
    pub(crate) live: bool,
}

pub(crate) struct ChannelRegistry<C> {
    channels: Vec<Channel<C>, MAX_LANES>,
}

impl<C> ChannelRegistry<C> {
    pub(crate) const fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    /// Claim the next free lane. The table is untouched on failure.
    pub(crate) fn attach(&mut self) -> Result<usize> {
        let lane = self.channels.len();
        self.channels
            .push(Channel {
                cursor: None,
                live: false,
            })
            .map_err(|_| Error::CapacityExceeded)?;
        Ok(lane)
    }

    pub(crate) fn len(&self) -> usize {
        self.channels.len()
    }

    /// Reset every channel for a fresh frame: liveness on, cursors cleared.
    pub(crate) fn begin_frame(&mut self) {
        for channel in &mut self.channels {
            channel.cursor = None;
            channel.live = true;
        }
    }

    pub(crate) fn store_cursor(&mut self, lane: usize, cursor: C) -> Result<()> {
        let channel = self.channels.get_mut(lane).ok_or(Error::InvalidLane)?;
        channel.cursor = Some(cursor);
        Ok(())
    }

    pub(crate) fn channels_mut(&mut self) -> impl Iterator<Item = (usize, &mut Channel<C>)> {
        self.channels.iter_mut().enumerate()
    }
}
