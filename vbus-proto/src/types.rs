//! Packet kinds and the two packet structures, one per direction.

/// Maximum length of a single bus transaction, and therefore of every frame.
pub const FRAME_SIZE: usize = 32;

/// Bytes of application payload carried by one frame (kind and address use the rest).
pub const PAYLOAD_SIZE: usize = FRAME_SIZE - 2;

/// Target address meaning "deliver to every registered peripheral".
pub const BROADCAST: u8 = 0xFF;

/// Kind byte of a packet sent by the controller.
///
/// `StartTx` and `StopTx` are protocol control packets and never reach the
/// application on the peripheral side. Byte values without a named variant
/// are kept as [`ControllerKind::Other`] so applications can define their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerKind {
    Init,
    Start,
    /// Opens the transmit phase of the handshake.
    StartTx,
    /// Closes the transmit phase of the handshake.
    StopTx,
    Abort,
    Other(u8),
}

impl ControllerKind {
    /// Wire value of this kind.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Init => 0x00,
            Self::Start => 0x01,
            Self::StartTx => 0x02,
            Self::StopTx => 0x03,
            Self::Abort => 0x04,
            Self::Other(b) => b,
        }
    }

    /// Decode a kind byte. Never fails: unknown values map to `Other`.
    #[inline]
    #[must_use]
    pub const fn from_u8(b: u8) -> Self {
        match b {
            0x00 => Self::Init,
            0x01 => Self::Start,
            0x02 => Self::StartTx,
            0x03 => Self::StopTx,
            0x04 => Self::Abort,
            other => Self::Other(other),
        }
    }

    /// True for the kinds that drive the handshake rather than carry data.
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, Self::StartTx | Self::StopTx)
    }
}

impl From<u8> for ControllerKind {
    fn from(b: u8) -> Self {
        Self::from_u8(b)
    }
}

impl From<ControllerKind> for u8 {
    fn from(kind: ControllerKind) -> Self {
        kind.as_u8()
    }
}

/// Kind byte of a packet sent by a peripheral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeripheralKind {
    /// Handshake summary; the payload carries the number of queued packets.
    StartAck,
    Success,
    GameOver,
    RuntimeError,
    Other(u8),
}

impl PeripheralKind {
    /// Wire value of this kind.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::StartAck => 0x00,
            Self::Success => 0x01,
            Self::GameOver => 0x02,
            Self::RuntimeError => 0x03,
            Self::Other(b) => b,
        }
    }

    /// Decode a kind byte. Never fails: unknown values map to `Other`.
    #[inline]
    #[must_use]
    pub const fn from_u8(b: u8) -> Self {
        match b {
            0x00 => Self::StartAck,
            0x01 => Self::Success,
            0x02 => Self::GameOver,
            0x03 => Self::RuntimeError,
            other => Self::Other(other),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, Self::StartAck)
    }
}

impl From<u8> for PeripheralKind {
    fn from(b: u8) -> Self {
        Self::from_u8(b)
    }
}

impl From<PeripheralKind> for u8 {
    fn from(kind: PeripheralKind) -> Self {
        kind.as_u8()
    }
}

/// A packet travelling from the controller to one peripheral (or all of them).
///
/// # Example
///
/// ```
/// use vbus_proto::{ControllerKind, ControllerPacket, BROADCAST};
///
/// let packet = ControllerPacket::broadcast(ControllerKind::Start);
/// assert_eq!(packet.target, BROADCAST);
/// assert!(packet.is_broadcast());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerPacket {
    pub kind: ControllerKind,
    /// Destination peripheral address, or [`BROADCAST`].
    pub target: u8,
    pub payload: [u8; PAYLOAD_SIZE],
}

impl ControllerPacket {
    /// All-zero packet, the content of a cleared queue slot.
    pub const ZEROED: Self = Self {
        kind: ControllerKind::Init,
        target: 0,
        payload: [0; PAYLOAD_SIZE],
    };

    /// Create a packet with an empty payload.
    #[must_use]
    pub const fn new(kind: ControllerKind, target: u8) -> Self {
        Self {
            kind,
            target,
            payload: [0; PAYLOAD_SIZE],
        }
    }

    /// Create a packet addressed to every peripheral.
    #[must_use]
    pub const fn broadcast(kind: ControllerKind) -> Self {
        Self::new(kind, BROADCAST)
    }

    /// Whether the packet is addressed to every peripheral.
    #[inline]
    #[must_use]
    pub const fn is_broadcast(&self) -> bool {
        self.target == BROADCAST
    }

    /// Whether the packet must be delivered to the peripheral at `address`.
    #[inline]
    #[must_use]
    pub const fn is_for(&self, address: u8) -> bool {
        self.target == address || self.target == BROADCAST
    }
}

impl Default for ControllerPacket {
    fn default() -> Self {
        Self::ZEROED
    }
}

/// A packet travelling from a peripheral back to the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralPacket {
    pub kind: PeripheralKind,
    /// Address of the originating peripheral. Overwritten on submit.
    pub sender: u8,
    pub payload: [u8; PAYLOAD_SIZE],
}

impl PeripheralPacket {
    /// All-zero packet, the content of a cleared queue slot.
    pub const ZEROED: Self = Self {
        kind: PeripheralKind::StartAck,
        sender: 0,
        payload: [0; PAYLOAD_SIZE],
    };

    /// Create a packet with an empty payload and no sender yet.
    #[must_use]
    pub const fn new(kind: PeripheralKind) -> Self {
        Self {
            kind,
            sender: 0,
            payload: [0; PAYLOAD_SIZE],
        }
    }

    /// Build the handshake summary announcing `count` queued packets.
    ///
    /// The count is stored little-endian in the first two payload bytes.
    #[must_use]
    pub const fn summary(sender: u8, count: u16) -> Self {
        let mut payload = [0; PAYLOAD_SIZE];
        let bytes = count.to_le_bytes();
        payload[0] = bytes[0];
        payload[1] = bytes[1];
        Self {
            kind: PeripheralKind::StartAck,
            sender,
            payload,
        }
    }

    /// Announced count of a summary packet, `None` for any other kind.
    #[must_use]
    pub const fn announced_count(&self) -> Option<u16> {
        match self.kind {
            PeripheralKind::StartAck => Some(u16::from_le_bytes([self.payload[0], self.payload[1]])),
            _ => None,
        }
    }
}

impl Default for PeripheralPacket {
    fn default() -> Self {
        Self::ZEROED
    }
}
