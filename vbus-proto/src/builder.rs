//! Builder pattern API for constructing packets.
//!
//! # Example
//!
//! ```
//! use vbus_proto::{ControllerKind, PacketBuilder, PeripheralKind};
//!
//! // Controller side: start every peripheral with a level number
//! let start = PacketBuilder::controller(ControllerKind::Start)
//!     .broadcast()
//!     .payload(&[3])
//!     .build()
//!     .unwrap();
//! assert!(start.is_broadcast());
//!
//! // Peripheral side: report a solved puzzle with its time in seconds
//! let success = PacketBuilder::peripheral(PeripheralKind::Success)
//!     .payload(&42u16.to_le_bytes())
//!     .build()
//!     .unwrap();
//! assert_eq!(&success.payload[..2], &[42, 0]);
//! ```

use crate::types::{
    ControllerKind, ControllerPacket, PeripheralKind, PeripheralPacket, BROADCAST, FRAME_SIZE,
    PAYLOAD_SIZE,
};
use crate::wire::Frame;

/// Error type for packet construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BuildError {
    /// More payload bytes were supplied than fit in one frame.
    PayloadTooLong(usize),
}

impl core::fmt::Display for BuildError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PayloadTooLong(len) => {
                write!(f, "payload of {len} bytes exceeds {PAYLOAD_SIZE}")
            }
        }
    }
}

/// Entry point for building packets.
pub struct PacketBuilder;

impl PacketBuilder {
    /// Start building a controller packet. The target defaults to address 0.
    #[must_use]
    pub fn controller(kind: ControllerKind) -> ControllerPacketBuilder {
        ControllerPacketBuilder {
            packet: ControllerPacket::new(kind, 0),
            overflow: None,
        }
    }

    /// Start building a peripheral packet.
    ///
    /// The sender is left at 0; the endpoint stamps its own address on submit.
    #[must_use]
    pub fn peripheral(kind: PeripheralKind) -> PeripheralPacketBuilder {
        PeripheralPacketBuilder {
            packet: PeripheralPacket::new(kind),
            overflow: None,
        }
    }
}

/// Copy `bytes` into the start of `payload`, returning the rejected length on overflow.
fn fill_payload(payload: &mut [u8; PAYLOAD_SIZE], bytes: &[u8]) -> Option<usize> {
    if bytes.len() > PAYLOAD_SIZE {
        return Some(bytes.len());
    }
    *payload = [0; PAYLOAD_SIZE];
    payload[..bytes.len()].copy_from_slice(bytes);
    None
}

/// Builder for [`ControllerPacket`].
///
/// Created via [`PacketBuilder::controller()`].
#[derive(Debug, Clone)]
pub struct ControllerPacketBuilder {
    packet: ControllerPacket,
    overflow: Option<usize>,
}

impl ControllerPacketBuilder {
    /// Address the packet to one peripheral.
    #[must_use]
    pub fn target(mut self, address: u8) -> Self {
        self.packet.target = address;
        self
    }

    /// Address the packet to every registered peripheral.
    #[must_use]
    pub fn broadcast(self) -> Self {
        self.target(BROADCAST)
    }

    /// Copy `bytes` to the start of the payload. Remaining bytes stay zero.
    #[must_use]
    pub fn payload(mut self, bytes: &[u8]) -> Self {
        self.overflow = fill_payload(&mut self.packet.payload, bytes);
        self
    }

    /// Finish the packet.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::PayloadTooLong`] if [`payload`](Self::payload) got too many bytes.
    pub fn build(self) -> Result<ControllerPacket, BuildError> {
        match self.overflow {
            Some(len) => Err(BuildError::PayloadTooLong(len)),
            None => Ok(self.packet),
        }
    }

    /// Finish the packet and encode it to a frame.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn encode(self) -> Result<[u8; FRAME_SIZE], BuildError> {
        self.build().map(|packet| packet.encode())
    }
}

/// Builder for [`PeripheralPacket`].
///
/// Created via [`PacketBuilder::peripheral()`].
#[derive(Debug, Clone)]
pub struct PeripheralPacketBuilder {
    packet: PeripheralPacket,
    overflow: Option<usize>,
}

impl PeripheralPacketBuilder {
    /// Set the sender explicitly (only useful outside an endpoint, e.g. in tests).
    #[must_use]
    pub fn sender(mut self, address: u8) -> Self {
        self.packet.sender = address;
        self
    }

    /// Copy `bytes` to the start of the payload. Remaining bytes stay zero.
    #[must_use]
    pub fn payload(mut self, bytes: &[u8]) -> Self {
        self.overflow = fill_payload(&mut self.packet.payload, bytes);
        self
    }

    /// Finish the packet.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::PayloadTooLong`] if [`payload`](Self::payload) got too many bytes.
    pub fn build(self) -> Result<PeripheralPacket, BuildError> {
        match self.overflow {
            Some(len) => Err(BuildError::PayloadTooLong(len)),
            None => Ok(self.packet),
        }
    }

    /// Finish the packet and encode it to a frame.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn encode(self) -> Result<[u8; FRAME_SIZE], BuildError> {
        self.build().map(|packet| packet.encode())
    }
}
