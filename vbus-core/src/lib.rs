//! Store-and-forward endpoints for the vbus two-wire protocol.
//!
//! One controller owns the bus and drives every transaction; any number of
//! peripherals answer. Each side keeps a bounded outbound queue of packets
//! staged for the other side and a bounded inbound queue of packets received
//! from it. Packets only move when the controller calls
//! [`Controller::tick`].
//!
//! # Overview
//!
//! - [`queue`]: fixed-capacity LIFO [`PacketQueue`]
//! - [`bus`]: controller-side transport trait ([`BusMaster`])
//! - [`hal`]: [`BusMaster`] over an `embedded-hal` I2C controller ([`HalBus`])
//! - [`peripheral`]: reactive endpoint driven by bus events ([`Peripheral`])
//! - [`controller`]: tick-driven polling loop ([`Controller`])
//! - [`handler`]: packet notification capability ([`MessageHandler`])
//!
//! # Example
//!
//! ```rust
//! use embassy_sync::blocking_mutex::raw::NoopRawMutex;
//! use vbus_core::{Error, Peripheral};
//! use vbus_proto::{ControllerKind, ControllerPacket, Frame, PeripheralKind, PeripheralPacket};
//!
//! let peripheral: Peripheral<NoopRawMutex> = Peripheral::new(0x20);
//! peripheral
//!     .submit(PeripheralPacket::new(PeripheralKind::Success))
//!     .unwrap();
//!
//! // The controller first reads the count summary
//! let summary = PeripheralPacket::decode(&peripheral.on_bus_read()).unwrap();
//! assert_eq!(summary.announced_count(), Some(1));
//!
//! // then opens the transmit phase and pulls the packet
//! let start = ControllerPacket::new(ControllerKind::StartTx, 0x20).encode();
//! peripheral.on_bus_write(&start).unwrap();
//! let packet = PeripheralPacket::decode(&peripheral.on_bus_read()).unwrap();
//! assert_eq!(packet.sender, 0x20);
//! assert_eq!(peripheral.get_data(), Err(Error::QueueEmpty));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: defmt formatting and logging (for embedded targets)
//! - **`log`**: Route logging to the `log` facade
//!
//! Without `defmt` or `log` all logging compiles to nothing.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;

pub mod bus;
pub mod controller;
pub mod error;
pub mod hal;
pub mod handler;
pub mod peripheral;
pub mod queue;

// Re-export main types at crate root
pub use bus::{BusError, BusMaster};
pub use controller::{Controller, PeripheralFailure, TickReport, DEFAULT_MAX_PERIPHERALS};
pub use error::Error;
pub use hal::HalBus;
pub use handler::MessageHandler;
pub use peripheral::Peripheral;
pub use queue::{PacketQueue, QueueError, DEFAULT_QUEUE_CAPACITY};
