//! Message handler capability injected into endpoints.

/// Receives every non-control packet as soon as it has been queued.
///
/// Called synchronously from the point where the packet arrives: the bus
/// handler on a peripheral, the handshake inside `tick()` on the controller.
/// The packet is still in the inbound queue when the handler runs. A
/// peripheral handler runs with the endpoint unlocked and may call
/// `get_data()` itself. Keep it short; on a peripheral it runs in the bus
/// interrupt context.
///
/// Closures implement this trait:
///
/// ```
/// use core::sync::atomic::{AtomicUsize, Ordering};
/// use vbus_core::MessageHandler;
/// use vbus_proto::ControllerPacket;
///
/// let seen = AtomicUsize::new(0);
/// let handler = |_: &ControllerPacket| {
///     seen.fetch_add(1, Ordering::Relaxed);
/// };
/// handler.on_message(&ControllerPacket::ZEROED);
/// assert_eq!(seen.load(Ordering::Relaxed), 1);
/// ```
pub trait MessageHandler<P> {
    fn on_message(&self, packet: &P);
}

impl<P, F: Fn(&P)> MessageHandler<P> for F {
    #[inline]
    fn on_message(&self, packet: &P) {
        self(packet)
    }
}
