//! Board-level constants shared by both binaries.

/// Bus clock in Hz. Standard mode keeps long jumper wires happy.
pub const BUS_FREQUENCY_HZ: u32 = 100_000;

/// Period of the controller's polling sweep.
pub const TICK_PERIOD_MS: u64 = 50;

/// Address the peripheral binary answers at.
pub const PERIPHERAL_ADDRESS: u8 = 0x20;

/// Peripherals the controller binary registers at boot.
pub const PERIPHERAL_ADDRESSES: &[u8] = &[0x20, 0x21];

/// Simulated run time of one job on the peripheral.
pub const JOB_DURATION_MS: u64 = 500;
