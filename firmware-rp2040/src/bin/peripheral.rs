#![no_std]
#![no_main]

use defmt::{debug, error, info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c_slave::{Command, Config as I2cSlaveConfig, I2cSlave};
use embassy_rp::peripherals::I2C0;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use vbus_proto::FRAME_SIZE;
use vbus_rp2040::board::{JOB_DURATION_MS, PERIPHERAL_ADDRESS};
use vbus_rp2040::{ControllerKind, ControllerPacket, Peripheral, PeripheralKind, PeripheralPacket};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => embassy_rp::i2c::InterruptHandler<I2C0>;
});

/// Endpoint shared by the bus task and the job task.
static NODE: Peripheral<'static, CriticalSectionRawMutex> = Peripheral::new(PERIPHERAL_ADDRESS);

/// Wakes the job task when a command has been queued.
static COMMAND_READY: Signal<CriticalSectionRawMutex, ()> = Signal::new();

static ON_COMMAND: fn(&ControllerPacket) = |_| COMMAND_READY.signal(());

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("vbus peripheral 0x{:02x} starting...", PERIPHERAL_ADDRESS);

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- I2C Setup ---
    let mut config = I2cSlaveConfig::default();
    config.addr = u16::from(PERIPHERAL_ADDRESS);
    let i2c = I2cSlave::new(
        p.I2C0,
        p.PIN_5, // SCL
        p.PIN_4, // SDA
        Irqs,
        config,
    );

    NODE.set_message_handler(&ON_COMMAND);

    let led = Output::new(p.PIN_25, Level::Low);

    spawner.spawn(bus_task(i2c).unwrap());
    spawner.spawn(job_task(led).unwrap());

    info!("vbus peripheral initialized, waiting for controller...");
}

/// Bus task - feeds every bus transaction into the endpoint.
#[embassy_executor::task]
async fn bus_task(mut i2c: I2cSlave<'static, I2C0>) {
    let mut buf = [0u8; FRAME_SIZE];
    loop {
        match i2c.listen(&mut buf).await {
            Ok(Command::Write(len)) => {
                if let Err(e) = NODE.on_bus_write(&buf[..len]) {
                    warn!("Dropped write of {} bytes: {:?}", len, e);
                }
            }
            Ok(Command::WriteRead(len)) => {
                if let Err(e) = NODE.on_bus_write(&buf[..len]) {
                    warn!("Dropped write of {} bytes: {:?}", len, e);
                }
                respond(&mut i2c).await;
            }
            Ok(Command::Read) => respond(&mut i2c).await,
            Ok(Command::GeneralCall(len)) => debug!("Ignoring general call ({} bytes)", len),
            Err(e) => error!("I2C error: {:?}", e),
        }
    }
}

async fn respond(i2c: &mut I2cSlave<'static, I2C0>) {
    if let Err(e) = i2c.respond_to_read(&NODE.on_bus_read()).await {
        error!("Read response failed: {:?}", e);
    }
}

/// Job task - runs each Start command and reports the outcome.
#[embassy_executor::task]
async fn job_task(mut led: Output<'static>) {
    loop {
        COMMAND_READY.wait().await;

        while let Ok(packet) = NODE.get_data() {
            match packet.kind {
                ControllerKind::Init => {
                    info!("Init: clearing queues");
                    NODE.clear_outbound();
                    led.set_low();
                }
                ControllerKind::Abort => {
                    info!("Abort");
                    NODE.clear_outbound();
                    led.set_low();
                }
                ControllerKind::Start => {
                    info!("Start: running job");
                    led.set_high();
                    Timer::after(Duration::from_millis(JOB_DURATION_MS)).await;
                    led.set_low();
                    report(PeripheralKind::Success);
                    report(PeripheralKind::GameOver);
                }
                other => debug!("Ignoring {:?}", other),
            }
        }
    }
}

fn report(kind: PeripheralKind) {
    if let Err(e) = NODE.submit(PeripheralPacket::new(kind)) {
        warn!("Cannot queue {:?}: {:?}", kind, e);
    }
}
