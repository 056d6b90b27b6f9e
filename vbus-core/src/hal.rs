//! [`BusMaster`] over any `embedded-hal` 1.0 blocking I2C controller.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};
use heapless::Vec;
use vbus_proto::FRAME_SIZE;

use crate::bus::{BusError, BusMaster};

impl From<ErrorKind> for BusError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => BusError::DataNack,
            ErrorKind::NoAcknowledge(_) => BusError::AddressNack,
            ErrorKind::ArbitrationLoss => BusError::ArbitrationLoss,
            ErrorKind::Overrun => BusError::Overrun,
            _ => BusError::Other,
        }
    }
}

/// Adapts an `embedded_hal::i2c::I2c` to the buffered two-wire shape.
///
/// Writes are buffered up to one frame and sent as a single I2C write on
/// `end_transmission`. Reads are performed eagerly by `request_from`.
pub struct HalBus<I2C> {
    i2c: I2C,
    address: u8,
    tx: Vec<u8, FRAME_SIZE>,
    overflow: bool,
    rx: [u8; FRAME_SIZE],
    rx_pos: usize,
    rx_len: usize,
}

impl<I2C: I2c> HalBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: 0,
            tx: Vec::new(),
            overflow: false,
            rx: [0; FRAME_SIZE],
            rx_pos: 0,
            rx_len: 0,
        }
    }

    pub fn inner(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> BusMaster for HalBus<I2C> {
    fn begin_transmission(&mut self, address: u8) {
        self.address = address;
        self.tx.clear();
        self.overflow = false;
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        let room = self.tx.capacity() - self.tx.len();
        let n = bytes.len().min(room);
        // Cannot fail: n is bounded by the remaining capacity
        let _ = self.tx.extend_from_slice(&bytes[..n]);
        self.overflow |= n < bytes.len();
        n
    }

    fn end_transmission(&mut self) -> Result<(), BusError> {
        if self.overflow {
            self.tx.clear();
            return Err(BusError::Overrun);
        }
        let result = self.i2c.write(self.address, &self.tx);
        self.tx.clear();
        result.map_err(|e| BusError::from(e.kind()))
    }

    fn request_from(&mut self, address: u8, count: usize) -> usize {
        let n = count.min(FRAME_SIZE);
        self.rx_pos = 0;
        self.rx_len = match self.i2c.read(address, &mut self.rx[..n]) {
            Ok(()) => n,
            Err(e) => {
                trace!("read from 0x{:02x} failed: {:?}", address, BusError::from(e.kind()));
                0
            }
        };
        self.rx_len
    }

    fn available(&self) -> usize {
        self.rx_len - self.rx_pos
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.available());
        buf[..n].copy_from_slice(&self.rx[self.rx_pos..self.rx_pos + n]);
        self.rx_pos += n;
        n
    }
}
