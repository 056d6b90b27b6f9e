//! Peripheral endpoint: reacts to controller-initiated bus transactions.
//!
//! The two reactive handlers, [`Peripheral::on_bus_write`] and
//! [`Peripheral::on_bus_read`], are called by the bus driver (usually from
//! its interrupt or from a high-priority task) and may preempt foreground
//! code such as [`Peripheral::submit`] at any point. Every access to the
//! queues and the transmit-phase flag therefore happens inside one blocking
//! mutex. With `CriticalSectionRawMutex` that is a critical section: the
//! count check and the slot copy of a push or pop are never observed half
//! done.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use vbus_proto::{
    ControllerKind, ControllerPacket, Frame, PeripheralPacket, FRAME_SIZE,
};

use crate::error::Error;
use crate::handler::MessageHandler;
use crate::queue::{PacketQueue, DEFAULT_QUEUE_CAPACITY};

type Handler<'a> = &'a (dyn MessageHandler<ControllerPacket> + Sync);

struct State<'a, const IN: usize, const OUT: usize> {
    inbound: PacketQueue<ControllerPacket, IN>,
    outbound: PacketQueue<PeripheralPacket, OUT>,
    /// Set by `StartTx`, cleared by `StopTx`.
    sending: bool,
    handler: Option<Handler<'a>>,
}

/// Bus endpoint of a peripheral node.
///
/// All methods take `&self`, so one endpoint can live in a `static` and be
/// shared between the bus driver and application code.
///
/// # Example
///
/// ```
/// use embassy_sync::blocking_mutex::raw::NoopRawMutex;
/// use vbus_core::Peripheral;
/// use vbus_proto::{ControllerKind, ControllerPacket, Frame, PeripheralKind, PeripheralPacket};
///
/// let endpoint: Peripheral<NoopRawMutex> = Peripheral::new(0x10);
/// endpoint.submit(PeripheralPacket::new(PeripheralKind::Success)).unwrap();
///
/// // Controller polls: the summary announces one packet
/// let summary = PeripheralPacket::decode(&endpoint.on_bus_read()).unwrap();
/// assert_eq!(summary.announced_count(), Some(1));
///
/// // Controller opens the transmit phase and pulls the packet
/// endpoint
///     .on_bus_write(&ControllerPacket::new(ControllerKind::StartTx, 0x10).encode())
///     .unwrap();
/// let packet = PeripheralPacket::decode(&endpoint.on_bus_read()).unwrap();
/// assert_eq!(packet.kind, PeripheralKind::Success);
/// assert_eq!(packet.sender, 0x10);
/// ```
pub struct Peripheral<
    'a,
    M: RawMutex,
    const IN: usize = DEFAULT_QUEUE_CAPACITY,
    const OUT: usize = DEFAULT_QUEUE_CAPACITY,
> {
    address: u8,
    state: Mutex<M, RefCell<State<'a, IN, OUT>>>,
}

impl<'a, M: RawMutex, const IN: usize, const OUT: usize> Peripheral<'a, M, IN, OUT> {
    /// Create an endpoint for the peripheral at bus `address`.
    ///
    /// Both slot stores are allocated here, inline, and never grow.
    #[must_use]
    pub const fn new(address: u8) -> Self {
        Self {
            address,
            state: Mutex::new(RefCell::new(State {
                inbound: PacketQueue::new(),
                outbound: PacketQueue::new(),
                sending: false,
                handler: None,
            })),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State<'a, IN, OUT>) -> T) -> T {
        self.state.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Bus address this endpoint answers on.
    #[inline]
    #[must_use]
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Install the handler called for every non-control packet from the controller.
    pub fn set_message_handler(&self, handler: Handler<'a>) {
        self.with_state(|s| s.handler = Some(handler));
    }

    /// Remove the message handler.
    pub fn clear_message_handler(&self) {
        self.with_state(|s| s.handler = None);
    }

    /// Queue a packet for the controller's next poll.
    ///
    /// The sender field is overwritten with this endpoint's address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueFull`] when the outbound queue is saturated.
    pub fn submit(&self, mut packet: PeripheralPacket) -> Result<(), Error> {
        packet.set_address(self.address);
        self.with_state(|s| s.outbound.push(packet)).map_err(|e| {
            warn!("outbound queue full, packet {:?} rejected", packet.kind);
            Error::from(e)
        })?;
        trace!("queued {:?} for controller", packet.kind);
        Ok(())
    }

    /// Handle bytes written to this node by the controller.
    ///
    /// `StartTx` and `StopTx` toggle the transmit phase and are consumed here.
    /// Any other packet is queued, then handed to the message handler (after
    /// the lock is released, so the handler may call [`get_data`](Self::get_data)).
    ///
    /// # Errors
    ///
    /// - [`Error::Decode`] if `bytes` is not exactly one frame; nothing is queued.
    /// - [`Error::QueueFull`] if the inbound queue has no free slot.
    pub fn on_bus_write(&self, bytes: &[u8]) -> Result<(), Error> {
        let packet = ControllerPacket::decode(bytes)?;

        let handler = self.with_state(|s| match packet.kind {
            ControllerKind::StartTx => {
                s.sending = true;
                Ok(None)
            }
            ControllerKind::StopTx => {
                s.sending = false;
                Ok(None)
            }
            _ => s.inbound.push(packet).map(|()| s.handler),
        });

        match handler {
            Ok(handler) => {
                trace!("received {:?}", packet.kind);
                if let Some(handler) = handler {
                    handler.on_message(&packet);
                }
                Ok(())
            }
            Err(e) => {
                warn!("inbound queue full, dropped {:?}", packet.kind);
                Err(e.into())
            }
        }
    }

    /// Produce the frame to return when the controller reads from this node.
    ///
    /// Outside the transmit phase this is a `StartAck` summary announcing the
    /// outbound queue length. Inside it, the most recently queued packet is
    /// popped and returned; if none is left, a zero-count summary is returned
    /// instead of stale slot bytes.
    #[must_use]
    pub fn on_bus_read(&self) -> [u8; FRAME_SIZE] {
        self.with_state(|s| {
            if s.sending {
                match s.outbound.pop() {
                    Ok(packet) => return packet.encode(),
                    Err(_) => warn!("read during transmit phase with nothing queued"),
                }
            }
            let count = u16::try_from(s.outbound.len()).unwrap_or(u16::MAX);
            PeripheralPacket::summary(self.address, count).encode()
        })
    }

    /// Whether a packet from the controller is waiting.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.with_state(|s| !s.inbound.is_empty())
    }

    /// Take the most recently received packet from the controller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueEmpty`] when nothing is waiting.
    pub fn get_data(&self) -> Result<ControllerPacket, Error> {
        Ok(self.with_state(|s| s.inbound.pop())?)
    }

    /// Number of unread packets from the controller.
    #[must_use]
    pub fn inbound_len(&self) -> usize {
        self.with_state(|s| s.inbound.len())
    }

    /// Number of packets waiting for the controller to pull them.
    #[must_use]
    pub fn pending_outbound(&self) -> usize {
        self.with_state(|s| s.outbound.len())
    }

    /// Whether the controller is currently pulling queued packets.
    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.with_state(|s| s.sending)
    }

    /// Discard every unread packet from the controller.
    pub fn clear_inbound(&self) {
        self.with_state(|s| s.inbound.clear());
    }

    /// Discard every packet not yet pulled by the controller.
    pub fn clear_outbound(&self) {
        self.with_state(|s| s.outbound.clear());
    }
}
