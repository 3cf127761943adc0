//! Crate-wide error type.
//!
//! Every variant is a fatal configuration or hardware-sequencing failure,
//! detected synchronously during attach or transfer setup. Once a frame is
//! streaming, no new error conditions exist: the frame either completes or the
//! hardware never raises its interrupt again, and the latter is a watchdog's
//! problem, not this crate's.

use derive_more::{Display, Error};

/// Errors reported during attach and transfer setup.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Every output lane of the parallel word is already attached.
    #[display("all output lanes are already attached")]
    CapacityExceeded,

    /// A strip with a different bit timing is already attached; one peripheral
    /// instance carries exactly one protocol.
    #[display("all strips on one peripheral must share the same bit timing")]
    MixedProtocols,

    /// No common divisor of the three timing phases keeps the pulse count
    /// under the ceiling, even at maximal rounding slack.
    #[display("bit timing has no pulse encoding under the configured ceiling")]
    TimingUnsolvable,

    /// The timing encodes zero-bits and one-bits identically (`t2 == 0`), so
    /// no pulse pattern can distinguish them.
    #[display("bit timing does not distinguish zero-bits from one-bits")]
    DegenerateTiming,

    /// The required pulse rate cannot be reached from the base clock with the
    /// fractional divider hardware.
    #[display("no clock divider reaches the required pulse rate")]
    DividerUnsolvable,

    /// The lane index has no attached strip.
    #[display("lane is not attached")]
    InvalidLane,

    /// The peripheral rejected its clock or geometry configuration.
    #[display("peripheral configuration failed")]
    PeripheralConfig,

    /// The peripheral failed to start the transfer.
    #[display("peripheral failed to start the transfer")]
    PeripheralStart,
}

/// Alias for `core::result::Result` with this crate's [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
