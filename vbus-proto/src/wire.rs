//! Fixed-width wire codec for both packet directions.
//!
//! Every frame is exactly [`FRAME_SIZE`] bytes:
//!
//! ```text
//! byte 0      kind
//! byte 1      address (target for controller packets, sender for peripheral packets)
//! bytes 2..32 payload
//! ```
//!
//! There is no length prefix and no checksum; the frame size is the only
//! delimiter, so a buffer of any other length is rejected rather than
//! partially decoded.
//!
//! # Example
//!
//! ```
//! use vbus_proto::{ControllerKind, ControllerPacket, Frame, FRAME_SIZE};
//!
//! let packet = ControllerPacket::new(ControllerKind::Start, 0x12);
//! let bytes = packet.encode();
//! assert_eq!(bytes.len(), FRAME_SIZE);
//! assert_eq!(&bytes[..2], &[0x01, 0x12]);
//! assert_eq!(ControllerPacket::decode(&bytes), Ok(packet));
//! ```

use crate::types::{
    ControllerKind, ControllerPacket, PeripheralKind, PeripheralPacket, FRAME_SIZE, PAYLOAD_SIZE,
};

const KIND_OFFSET: usize = 0;
const ADDRESS_OFFSET: usize = 1;
const PAYLOAD_OFFSET: usize = 2;

/// Error type for decoding a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// The buffer was not exactly one frame long; carries the received length.
    Length(usize),
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Length(len) => write!(f, "expected {FRAME_SIZE}-byte frame, got {len} bytes"),
        }
    }
}

/// Error type for encoding into a caller-supplied buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// The output buffer is shorter than one frame.
    BufferTooSmall,
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

/// A packet with a fixed-width binary frame representation.
///
/// Implemented by [`ControllerPacket`] and [`PeripheralPacket`]; queues and
/// endpoints are generic over this trait so both roles share one codec.
pub trait Frame: Copy {
    /// The value of a zeroed slot; encodes to all-zero bytes.
    const ZEROED: Self;

    /// Raw kind byte.
    fn kind_byte(&self) -> u8;

    /// Address byte (target or sender, depending on direction).
    fn address(&self) -> u8;

    /// Overwrite the address byte.
    fn set_address(&mut self, address: u8);

    /// Payload bytes.
    fn payload(&self) -> &[u8; PAYLOAD_SIZE];

    /// Rebuild a packet from its three fields.
    fn from_parts(kind: u8, address: u8, payload: [u8; PAYLOAD_SIZE]) -> Self;

    /// Encode to a full frame.
    #[must_use]
    fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut frame = [0u8; FRAME_SIZE];
        frame[KIND_OFFSET] = self.kind_byte();
        frame[ADDRESS_OFFSET] = self.address();
        frame[PAYLOAD_OFFSET..].copy_from_slice(self.payload());
        frame
    }

    /// Encode into the start of `buf`.
    ///
    /// Returns the number of bytes written (always [`FRAME_SIZE`]).
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::BufferTooSmall`] if `buf` cannot hold a frame.
    fn encode_into(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let out = buf
            .get_mut(..FRAME_SIZE)
            .ok_or(EncodeError::BufferTooSmall)?;
        out.copy_from_slice(&self.encode());
        Ok(FRAME_SIZE)
    }

    /// Decode exactly one frame.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Length`] unless `bytes` is exactly [`FRAME_SIZE`] long.
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != FRAME_SIZE {
            return Err(DecodeError::Length(bytes.len()));
        }
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload.copy_from_slice(&bytes[PAYLOAD_OFFSET..]);
        Ok(Self::from_parts(
            bytes[KIND_OFFSET],
            bytes[ADDRESS_OFFSET],
            payload,
        ))
    }
}

impl Frame for ControllerPacket {
    const ZEROED: Self = ControllerPacket::ZEROED;

    #[inline]
    fn kind_byte(&self) -> u8 {
        self.kind.as_u8()
    }

    #[inline]
    fn address(&self) -> u8 {
        self.target
    }

    #[inline]
    fn set_address(&mut self, address: u8) {
        self.target = address;
    }

    #[inline]
    fn payload(&self) -> &[u8; PAYLOAD_SIZE] {
        &self.payload
    }

    fn from_parts(kind: u8, address: u8, payload: [u8; PAYLOAD_SIZE]) -> Self {
        Self {
            kind: ControllerKind::from_u8(kind),
            target: address,
            payload,
        }
    }
}

impl Frame for PeripheralPacket {
    const ZEROED: Self = PeripheralPacket::ZEROED;

    #[inline]
    fn kind_byte(&self) -> u8 {
        self.kind.as_u8()
    }

    #[inline]
    fn address(&self) -> u8 {
        self.sender
    }

    #[inline]
    fn set_address(&mut self, address: u8) {
        self.sender = address;
    }

    #[inline]
    fn payload(&self) -> &[u8; PAYLOAD_SIZE] {
        &self.payload
    }

    fn from_parts(kind: u8, address: u8, payload: [u8; PAYLOAD_SIZE]) -> Self {
        Self {
            kind: PeripheralKind::from_u8(kind),
            sender: address,
            payload,
        }
    }
}
