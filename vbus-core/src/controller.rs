//! Controller loop: drives every bus transaction, once per tick.
//!
//! A tick first flushes the staged outbound packets to each registered
//! peripheral, then runs the count handshake with each peripheral in
//! registry order:
//!
//! ```text
//! controller                         peripheral
//!     | ---- read one frame ----------> |
//!     | <--- StartAck (count = n) ----- |
//!     | ---- StartTx -----------------> |
//!     | ---- read one frame ----------> |  \
//!     | <--- queued packet ------------ |   } n times
//!     | ---- StopTx ------------------> |
//! ```
//!
//! A failure with one peripheral is recorded in the [`TickReport`] and the
//! sweep moves on to the next one. Nothing is retried.

use heapless::Vec;
use vbus_proto::{ControllerKind, ControllerPacket, Frame, PeripheralPacket};

use crate::bus::BusMaster;
use crate::error::Error;
use crate::handler::MessageHandler;
use crate::queue::{PacketQueue, DEFAULT_QUEUE_CAPACITY};

/// Default number of peripherals one controller can poll.
pub const DEFAULT_MAX_PERIPHERALS: usize = 8;

/// First error seen for one peripheral during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralFailure {
    pub address: u8,
    pub error: Error,
}

/// Outcome of one [`Controller::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport<const P: usize = DEFAULT_MAX_PERIPHERALS> {
    /// Outbound frames written successfully (a broadcast counts once per peripheral).
    pub flushed: usize,
    /// Outbound frames whose write transaction failed.
    pub failed_writes: usize,
    /// Packets pulled from peripherals into the inbound queue.
    pub received: usize,
    /// Announced packets left on peripherals because the inbound queue had no room.
    pub deferred: usize,
    /// At most one entry per peripheral, in registry order of first failure.
    pub failures: Vec<PeripheralFailure, P>,
}

impl<const P: usize> TickReport<P> {
    /// True when every transaction of the tick succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// The recorded failure for `address`, if any.
    #[must_use]
    pub fn failure_for(&self, address: u8) -> Option<Error> {
        self.failures
            .iter()
            .find(|f| f.address == address)
            .map(|f| f.error)
    }

    fn record(&mut self, address: u8, error: Error) {
        if self.failure_for(address).is_none() {
            // One slot per registered peripheral, so this cannot overflow
            let _ = self.failures.push(PeripheralFailure { address, error });
        }
    }
}

/// Bus controller node.
///
/// Owns the bus transport, the peripheral registry and one queue per
/// direction. Single-context: nothing here is touched from an interrupt, so
/// all methods take `&mut self` and no lock is needed.
///
/// # Type Parameters
///
/// - `B`: bus transport
/// - `OUT`: outbound (staged) queue capacity
/// - `IN`: inbound (received) queue capacity
/// - `P`: maximum number of registered peripherals
pub struct Controller<
    'a,
    B,
    const OUT: usize = DEFAULT_QUEUE_CAPACITY,
    const IN: usize = DEFAULT_QUEUE_CAPACITY,
    const P: usize = DEFAULT_MAX_PERIPHERALS,
> {
    bus: B,
    registry: Vec<u8, P>,
    outbound: PacketQueue<ControllerPacket, OUT>,
    inbound: PacketQueue<PeripheralPacket, IN>,
    handler: Option<&'a dyn MessageHandler<PeripheralPacket>>,
}

impl<'a, B: BusMaster, const OUT: usize, const IN: usize, const P: usize>
    Controller<'a, B, OUT, IN, P>
{
    /// Create a controller over `bus` with an empty registry.
    #[must_use]
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            registry: Vec::new(),
            outbound: PacketQueue::new(),
            inbound: PacketQueue::new(),
            handler: None,
        }
    }

    /// Add a peripheral to the polling sweep. Peripherals are polled in
    /// registration order.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicatePeripheral`] if `address` is already registered.
    /// - [`Error::RegistryFull`] past `P` peripherals.
    pub fn register_peripheral(&mut self, address: u8) -> Result<(), Error> {
        if self.registry.contains(&address) {
            return Err(Error::DuplicatePeripheral);
        }
        self.registry
            .push(address)
            .map_err(|_| Error::RegistryFull)?;
        debug!("registered peripheral 0x{:02x}", address);
        Ok(())
    }

    /// Registered peripheral addresses, in polling order.
    #[must_use]
    pub fn peripherals(&self) -> &[u8] {
        &self.registry
    }

    /// Install the handler called for every packet received during a tick.
    pub fn set_message_handler(&mut self, handler: &'a dyn MessageHandler<PeripheralPacket>) {
        self.handler = Some(handler);
    }

    /// Remove the message handler.
    pub fn clear_message_handler(&mut self) {
        self.handler = None;
    }

    /// Stage a packet for delivery on the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueFull`] when the outbound queue is saturated.
    pub fn submit(&mut self, packet: ControllerPacket) -> Result<(), Error> {
        self.outbound.push(packet).map_err(|e| {
            warn!("outbound queue full, packet {:?} rejected", packet.kind);
            Error::from(e)
        })
    }

    /// Write one packet right away, bypassing the outbound queue.
    ///
    /// A broadcast packet is written to every registered peripheral; every
    /// write is attempted and the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if a write transaction fails.
    pub fn send_now(&mut self, packet: &ControllerPacket) -> Result<(), Error> {
        let frame = packet.encode();
        if !packet.is_broadcast() {
            return Ok(self.bus.send_frame(packet.target, &frame)?);
        }

        let mut result = Ok(());
        for &address in &self.registry {
            if let Err(e) = self.bus.send_frame(address, &frame) {
                warn!("write to 0x{:02x} failed: {:?}", address, e);
                result = result.and(Err(e.into()));
            }
        }
        result
    }

    /// Run one full sweep: flush staged packets, then poll every peripheral.
    ///
    /// The outbound queue is cleared after the flush whether or not each
    /// write succeeded. Per-peripheral failures are collected in the report
    /// and never stop the sweep.
    pub fn tick(&mut self) -> TickReport<P> {
        let mut report = TickReport::default();

        for &address in &self.registry {
            for packet in self.outbound.iter().filter(|p| p.is_for(address)) {
                match self.bus.send_frame(address, &packet.encode()) {
                    Ok(()) => {
                        trace!("sent {:?} to 0x{:02x}", packet.kind, address);
                        report.flushed += 1;
                    }
                    Err(e) => {
                        warn!("write to 0x{:02x} failed: {:?}", address, e);
                        report.failed_writes += 1;
                        report.record(address, e.into());
                    }
                }
            }
        }
        self.outbound.clear();

        for index in 0..self.registry.len() {
            let address = self.registry[index];
            if let Err(e) = self.handshake(address, &mut report) {
                warn!("handshake with 0x{:02x} failed: {:?}", address, e);
                report.record(address, e);
            }
        }

        debug!(
            "tick: flushed {} received {} deferred {} failures {}",
            report.flushed,
            report.received,
            report.deferred,
            report.failures.len()
        );
        report
    }

    /// Pull every packet a peripheral announces, bounded by free inbound slots.
    fn handshake(&mut self, address: u8, report: &mut TickReport<P>) -> Result<(), Error> {
        let frame = self
            .bus
            .receive_frame(address)
            .ok_or(Error::TransportUnavailable)?;
        let summary = PeripheralPacket::decode(&frame)?;
        let Some(announced) = summary.announced_count().map(usize::from) else {
            return self.resync(address, summary, report);
        };

        let room = self.inbound.capacity() - self.inbound.len();
        let pulls = announced.min(room);
        if pulls < announced {
            debug!(
                "0x{:02x} announced {} packets, room for {}",
                address, announced, pulls
            );
            report.deferred += announced - pulls;
        }

        self.send_control(address, ControllerKind::StartTx)?;
        let pulled = self.pull(address, pulls, report);
        // Always close the transmit phase, even after a failed pull
        let stopped = self.send_control(address, ControllerKind::StopTx);
        pulled.and(stopped)
    }

    /// A data frame where the summary belongs means the peripheral missed an
    /// earlier `StopTx` and is still in its transmit phase. The frame has
    /// already left the peripheral, so it is kept before the phase is closed.
    fn resync(
        &mut self,
        address: u8,
        packet: PeripheralPacket,
        report: &mut TickReport<P>,
    ) -> Result<(), Error> {
        warn!("0x{:02x} still in transmit phase, sending StopTx", address);
        let kept = self.accept(address, packet, report);
        self.send_control(address, ControllerKind::StopTx)?;
        kept?;
        Err(Error::UnexpectedReply(packet.kind.as_u8()))
    }

    fn pull(&mut self, address: u8, count: usize, report: &mut TickReport<P>) -> Result<(), Error> {
        for _ in 0..count {
            let frame = self
                .bus
                .receive_frame(address)
                .ok_or(Error::TransportUnavailable)?;
            let packet = PeripheralPacket::decode(&frame)?;
            if packet.kind.is_control() {
                debug!("ignoring {:?} from 0x{:02x} in transmit phase", packet.kind, address);
                continue;
            }
            self.accept(address, packet, report)?;
        }
        Ok(())
    }

    fn accept(
        &mut self,
        address: u8,
        packet: PeripheralPacket,
        report: &mut TickReport<P>,
    ) -> Result<(), Error> {
        self.inbound.push(packet).map_err(|e| {
            warn!("inbound queue full, dropped {:?} from 0x{:02x}", packet.kind, address);
            Error::from(e)
        })?;
        report.received += 1;
        trace!("received {:?} from 0x{:02x}", packet.kind, address);
        if let Some(handler) = self.handler {
            handler.on_message(&packet);
        }
        Ok(())
    }

    fn send_control(&mut self, address: u8, kind: ControllerKind) -> Result<(), Error> {
        let packet = ControllerPacket::new(kind, address);
        Ok(self.bus.send_frame(address, &packet.encode())?)
    }

    /// Whether a packet from a peripheral is waiting.
    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.inbound.is_empty()
    }

    /// Take the most recently received packet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueEmpty`] when nothing is waiting.
    pub fn get_data(&mut self) -> Result<PeripheralPacket, Error> {
        Ok(self.inbound.pop()?)
    }

    /// Number of unread packets from peripherals.
    #[must_use]
    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    /// Number of packets staged for the next tick.
    #[must_use]
    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    /// Discard every unread packet from peripherals.
    pub fn clear_inbound(&mut self) {
        self.inbound.clear();
    }

    /// Discard every staged packet.
    pub fn clear_outbound(&mut self) {
        self.outbound.clear();
    }

    /// Get a reference to the bus transport.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Get a mutable reference to the bus transport.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Decompose the controller, returning its bus transport.
    pub fn into_bus(self) -> B {
        self.bus
    }
}
