//! vbus firmware for RP2040.
//!
//! Two binaries share this library:
//!
//! - **`vbus-controller`**: owns the bus as I2C controller and runs
//!   [`Controller::tick`](vbus_core::Controller::tick) every [`board::TICK_PERIOD_MS`].
//! - **`vbus-peripheral`**: answers as I2C target at [`board::PERIPHERAL_ADDRESS`],
//!   feeding bus events into a [`Peripheral`](vbus_core::Peripheral) endpoint.
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | I2C0 SDA | 4    | Bus data (external pull-up) |
//! | I2C0 SCL | 5    | Bus clock (external pull-up) |
//! | LED      | 25   | On-board LED (activity indicator) |
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

pub mod board;

// Re-export core types for convenience
pub use vbus_core::{Controller, Error, HalBus, Peripheral, TickReport};
pub use vbus_proto::{ControllerKind, ControllerPacket, PeripheralKind, PeripheralPacket};
