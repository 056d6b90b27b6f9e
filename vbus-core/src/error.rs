//! Crate-level error type.

use crate::bus::BusError;
use crate::queue::QueueError;
use vbus_proto::DecodeError;

/// Error type for endpoint and controller operations.
///
/// All variants are recoverable: the failing operation has no effect on queue
/// state, and retry policy is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A push was attempted on a queue with every slot in use.
    QueueFull,
    /// A pop was attempted on an empty queue.
    QueueEmpty,
    /// The controller already tracks as many peripherals as it can.
    RegistryFull,
    /// The address is already registered.
    DuplicatePeripheral,
    /// A peripheral did not answer with a full frame.
    TransportUnavailable,
    /// The handshake summary had the wrong kind (carries the kind byte).
    UnexpectedReply(u8),
    /// A write transaction failed.
    Bus(BusError),
    /// A received frame had the wrong length.
    Decode(DecodeError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::QueueFull => write!(f, "queue full"),
            Self::QueueEmpty => write!(f, "no packet available"),
            Self::RegistryFull => write!(f, "peripheral registry full"),
            Self::DuplicatePeripheral => write!(f, "peripheral already registered"),
            Self::TransportUnavailable => write!(f, "no reply from peripheral"),
            Self::UnexpectedReply(kind) => write!(f, "unexpected reply kind 0x{kind:02X}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
        }
    }
}

impl From<QueueError> for Error {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Full => Error::QueueFull,
            QueueError::Empty => Error::QueueEmpty,
        }
    }
}

impl From<BusError> for Error {
    fn from(err: BusError) -> Self {
        Error::Bus(err)
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err)
    }
}
