//! Bus transport trait consumed by the controller, and its error type.

use vbus_proto::FRAME_SIZE;

/// Error type for bus transport operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// No device acknowledged the address.
    AddressNack,
    /// The device stopped acknowledging mid-transfer.
    DataNack,
    /// Another controller won arbitration.
    ArbitrationLoss,
    /// More bytes were written than one transaction holds.
    Overrun,
    /// Any other transport failure.
    Other,
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AddressNack => write!(f, "address not acknowledged"),
            Self::DataNack => write!(f, "data not acknowledged"),
            Self::ArbitrationLoss => write!(f, "arbitration lost"),
            Self::Overrun => write!(f, "transaction overrun"),
            Self::Other => write!(f, "bus error"),
        }
    }
}

/// Controller-side view of the two-wire bus.
///
/// The shape follows the classic two-wire library: a write is opened with
/// [`begin_transmission`](Self::begin_transmission), filled with
/// [`write`](Self::write) and committed by
/// [`end_transmission`](Self::end_transmission); a read is performed by
/// [`request_from`](Self::request_from) and then drained with
/// [`read_bytes`](Self::read_bytes).
///
/// Implementations are blocking. The controller never configures the bus
/// beyond these calls.
pub trait BusMaster {
    /// Start buffering a write to the device at `address`.
    fn begin_transmission(&mut self, address: u8);

    /// Append bytes to the pending write. Returns how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> usize;

    /// Send the pending write.
    fn end_transmission(&mut self) -> Result<(), BusError>;

    /// Read up to `count` bytes from `address`. Returns how many arrived.
    fn request_from(&mut self, address: u8, count: usize) -> usize;

    /// Bytes received by the last request and not yet read.
    fn available(&self) -> usize;

    /// Move received bytes into `buf`. Returns how many were copied.
    fn read_bytes(&mut self, buf: &mut [u8]) -> usize;

    /// Write one whole frame to `address` in a single transaction.
    fn send_frame(&mut self, address: u8, frame: &[u8; FRAME_SIZE]) -> Result<(), BusError> {
        self.begin_transmission(address);
        if self.write(frame) != FRAME_SIZE {
            // Still close the transaction so the next one starts clean
            let _ = self.end_transmission();
            return Err(BusError::Overrun);
        }
        self.end_transmission()
    }

    /// Read one whole frame from `address`, or `None` if the device sent less.
    fn receive_frame(&mut self, address: u8) -> Option<[u8; FRAME_SIZE]> {
        self.request_from(address, FRAME_SIZE);
        if self.available() < FRAME_SIZE {
            // Drop the partial reply
            let mut scratch = [0u8; FRAME_SIZE];
            while self.available() > 0 && self.read_bytes(&mut scratch) > 0 {}
            return None;
        }
        let mut frame = [0u8; FRAME_SIZE];
        (self.read_bytes(&mut frame) == FRAME_SIZE).then_some(frame)
    }
}

impl<B: BusMaster + ?Sized> BusMaster for &mut B {
    fn begin_transmission(&mut self, address: u8) {
        (**self).begin_transmission(address);
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        (**self).write(bytes)
    }

    fn end_transmission(&mut self) -> Result<(), BusError> {
        (**self).end_transmission()
    }

    fn request_from(&mut self, address: u8, count: usize) -> usize {
        (**self).request_from(address, count)
    }

    fn available(&self) -> usize {
        (**self).available()
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        (**self).read_bytes(buf)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    /// Records writes and serves canned replies.
    #[derive(Default)]
    struct ScriptedBus {
        pending: Vec<u8>,
        sent: Vec<(u8, Vec<u8>)>,
        address: u8,
        reply: Vec<u8>,
        rx: Vec<u8>,
    }

    impl BusMaster for ScriptedBus {
        fn begin_transmission(&mut self, address: u8) {
            self.address = address;
            self.pending.clear();
        }

        fn write(&mut self, bytes: &[u8]) -> usize {
            let room = FRAME_SIZE - self.pending.len();
            let n = bytes.len().min(room);
            self.pending.extend_from_slice(&bytes[..n]);
            n
        }

        fn end_transmission(&mut self) -> Result<(), BusError> {
            self.sent.push((self.address, core::mem::take(&mut self.pending)));
            Ok(())
        }

        fn request_from(&mut self, _address: u8, count: usize) -> usize {
            let n = count.min(self.reply.len());
            self.rx = self.reply[..n].to_vec();
            n
        }

        fn available(&self) -> usize {
            self.rx.len()
        }

        fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
            let n = buf.len().min(self.rx.len());
            buf[..n].copy_from_slice(&self.rx[..n]);
            self.rx.drain(..n);
            n
        }
    }

    #[test]
    fn test_send_frame_is_one_transaction() {
        let mut bus = ScriptedBus::default();
        let frame = [7u8; FRAME_SIZE];
        bus.send_frame(0x21, &frame).unwrap();

        assert_eq!(bus.sent.len(), 1);
        assert_eq!(bus.sent[0].0, 0x21);
        assert_eq!(bus.sent[0].1, frame.to_vec());
    }

    #[test]
    fn test_receive_full_frame() {
        let mut bus = ScriptedBus {
            reply: (0..FRAME_SIZE as u8).collect(),
            ..Default::default()
        };
        let frame = bus.receive_frame(0x21).unwrap();
        assert_eq!(frame[0], 0);
        assert_eq!(frame[FRAME_SIZE - 1], FRAME_SIZE as u8 - 1);
        assert_eq!(bus.available(), 0);
    }

    #[test]
    fn test_receive_short_reply_is_none_and_drained() {
        let mut bus = ScriptedBus {
            reply: std::vec![1, 2, 3],
            ..Default::default()
        };
        assert_eq!(bus.receive_frame(0x21), None);
        assert_eq!(bus.available(), 0);
    }

    #[test]
    fn test_receive_nothing() {
        let mut bus = ScriptedBus::default();
        assert_eq!(bus.receive_frame(0x21), None);
    }

    #[test]
    fn test_mut_ref_forwards() {
        let mut bus = ScriptedBus::default();
        {
            let mut borrowed = &mut bus;
            <&mut ScriptedBus as BusMaster>::send_frame(&mut borrowed, 0x05, &[0u8; FRAME_SIZE])
                .unwrap();
        }
        assert_eq!(bus.sent.len(), 1);
    }
}
