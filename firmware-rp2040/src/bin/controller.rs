#![no_std]
#![no_main]

use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{Blocking, Config as I2cConfig, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_time::{Duration, Ticker};
use static_cell::StaticCell;
use vbus_rp2040::board::{BUS_FREQUENCY_HZ, PERIPHERAL_ADDRESSES, TICK_PERIOD_MS};
use vbus_rp2040::{Controller, ControllerKind, ControllerPacket, HalBus, PeripheralKind};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

type Bus = HalBus<I2c<'static, I2C0, Blocking>>;

static CONTROLLER: StaticCell<Controller<'static, Bus>> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("vbus controller starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- I2C Setup ---
    let mut i2c_config = I2cConfig::default();
    i2c_config.frequency = BUS_FREQUENCY_HZ;
    let i2c = I2c::new_blocking(
        p.I2C0,
        p.PIN_5, // SCL
        p.PIN_4, // SDA
        i2c_config,
    );

    let controller = CONTROLLER.init(Controller::new(HalBus::new(i2c)));
    for &address in PERIPHERAL_ADDRESSES {
        if let Err(e) = controller.register_peripheral(address) {
            error!("Cannot register 0x{:02x}: {:?}", address, e);
        }
    }

    // Reset every peripheral, then start the first round
    for kind in [ControllerKind::Init, ControllerKind::Start] {
        if let Err(e) = controller.submit(ControllerPacket::broadcast(kind)) {
            error!("Cannot stage {:?}: {:?}", kind, e);
        }
    }

    let led = Output::new(p.PIN_25, Level::Low);

    spawner.spawn(poll_task(controller, led).unwrap());

    info!("vbus controller initialized, polling {} peripherals", PERIPHERAL_ADDRESSES.len());
}

/// Poll task - one sweep per tick, restarting peripherals that finish.
#[embassy_executor::task]
async fn poll_task(controller: &'static mut Controller<'static, Bus>, mut led: Output<'static>) {
    let mut ticker = Ticker::every(Duration::from_millis(TICK_PERIOD_MS));
    loop {
        ticker.next().await;

        let report = controller.tick();
        for failure in &report.failures {
            warn!("0x{:02x}: {:?}", failure.address, failure.error);
        }
        if report.received > 0 {
            led.toggle();
        }

        while let Ok(packet) = controller.get_data() {
            match packet.kind {
                PeripheralKind::Success => info!("0x{:02x} reported success", packet.sender),
                PeripheralKind::RuntimeError => {
                    warn!("0x{:02x} reported a runtime error", packet.sender)
                }
                PeripheralKind::GameOver => {
                    info!("0x{:02x} finished, starting again", packet.sender);
                    let restart = ControllerPacket::new(ControllerKind::Start, packet.sender);
                    if let Err(e) = controller.submit(restart) {
                        error!("Cannot stage restart: {:?}", e);
                    }
                }
                other => warn!("0x{:02x} sent {:?}", packet.sender, other),
            }
        }
    }
}
