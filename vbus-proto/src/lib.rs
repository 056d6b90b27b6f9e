//! Packet types and wire format for the vbus store-and-forward bus protocol.
//!
//! One controller and several peripherals share a two-wire bus where every
//! transaction carries a single fixed-size frame. This crate defines what is
//! inside those frames:
//!
//! - **Types**: [`ControllerPacket`] / [`ControllerKind`] travelling down,
//!   [`PeripheralPacket`] / [`PeripheralKind`] travelling up
//! - **Wire codec**: the [`Frame`] trait, shared by both directions
//! - **Builder**: [`PacketBuilder`] for filling payloads without index math
//!
//! # Frame Format
//!
//! ```text
//! +------+---------+----------------------+
//! | kind | address | payload (30 bytes)   |
//! +------+---------+----------------------+
//!   1B      1B        FRAME_SIZE - 2
//! ```
//!
//! The address byte is the target on the way down ([`BROADCAST`] reaches every
//! peripheral) and the sender on the way up. There is no length prefix and no
//! checksum.
//!
//! # Handshake Kinds
//!
//! [`PeripheralKind::StartAck`] is the summary a peripheral returns when
//! polled; its payload holds the number of packets it has queued.
//! [`ControllerKind::StartTx`] and [`ControllerKind::StopTx`] bracket the
//! phase in which the controller pulls those packets one frame at a time.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod builder;
pub mod types;
pub mod wire;

pub use builder::{BuildError, ControllerPacketBuilder, PacketBuilder, PeripheralPacketBuilder};
pub use types::{
    ControllerKind, ControllerPacket, PeripheralKind, PeripheralPacket, BROADCAST, FRAME_SIZE,
    PAYLOAD_SIZE,
};
pub use wire::{DecodeError, EncodeError, Frame};
