//! In-memory bus wiring a controller straight to peripheral endpoints.

#![allow(dead_code)]

use std::collections::VecDeque;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use vbus_core::{BusError, BusMaster, Peripheral};

pub type Node = Peripheral<'static, CriticalSectionRawMutex>;

/// One bus transaction as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    /// Write to `address`; carries the kind byte.
    Write(u8, u8),
    /// Read request to `address`.
    Read(u8),
}

pub struct Loopback<'p> {
    nodes: Vec<&'p Node>,
    address: u8,
    pending: Vec<u8>,
    rx: VecDeque<u8>,
    pub log: Vec<Transaction>,
    /// Kind byte whose next write is dropped with a NACK.
    pub drop_next: Option<u8>,
}

impl<'p> Loopback<'p> {
    pub fn new(nodes: &[&'p Node]) -> Self {
        Self {
            nodes: nodes.to_vec(),
            address: 0,
            pending: Vec::new(),
            rx: VecDeque::new(),
            log: Vec::new(),
            drop_next: None,
        }
    }

    fn node(&self, address: u8) -> Option<&'p Node> {
        self.nodes.iter().copied().find(|n| n.address() == address)
    }

    /// Transactions addressed to one peripheral.
    pub fn log_for(&self, address: u8) -> Vec<Transaction> {
        self.log
            .iter()
            .copied()
            .filter(|t| match t {
                Transaction::Write(a, _) | Transaction::Read(a) => *a == address,
            })
            .collect()
    }
}

impl BusMaster for Loopback<'_> {
    fn begin_transmission(&mut self, address: u8) {
        self.address = address;
        self.pending.clear();
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        self.pending.extend_from_slice(bytes);
        bytes.len()
    }

    fn end_transmission(&mut self) -> Result<(), BusError> {
        let node = self.node(self.address).ok_or(BusError::AddressNack)?;
        if self.drop_next.is_some() && self.drop_next == self.pending.first().copied() {
            self.drop_next = None;
            return Err(BusError::DataNack);
        }
        self.log
            .push(Transaction::Write(self.address, self.pending[0]));
        node.on_bus_write(&self.pending).map_err(|_| BusError::Other)
    }

    fn request_from(&mut self, address: u8, count: usize) -> usize {
        self.rx.clear();
        if let Some(node) = self.node(address) {
            self.log.push(Transaction::Read(address));
            self.rx.extend(node.on_bus_read().into_iter().take(count));
        }
        self.rx.len()
    }

    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        n
    }
}
