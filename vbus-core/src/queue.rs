//! Bounded packet queue over a preallocated slot store.
//!
//! Slots are allocated once, inline in the queue value, and reused by copy.
//! The queue only tracks how many slots (counted from index 0) hold unread
//! packets. Push writes slot `len`, pop returns slot `len - 1`: the order is
//! last-in first-out.

use vbus_proto::Frame;

/// Default number of slots per queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// Error type for queue operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    /// Every slot holds an unread packet.
    Full,
    /// No packet is available.
    Empty,
}

impl core::fmt::Display for QueueError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full => write!(f, "queue full"),
            Self::Empty => write!(f, "queue empty"),
        }
    }
}

/// Fixed-capacity LIFO queue of packets.
///
/// # Example
///
/// ```
/// use vbus_core::PacketQueue;
/// use vbus_proto::{PeripheralKind, PeripheralPacket};
///
/// let mut queue: PacketQueue<PeripheralPacket, 2> = PacketQueue::new();
/// queue.push(PeripheralPacket::new(PeripheralKind::Success)).unwrap();
/// queue.push(PeripheralPacket::new(PeripheralKind::GameOver)).unwrap();
/// assert!(queue.push(PeripheralPacket::new(PeripheralKind::Success)).is_err());
///
/// // Most recent first
/// assert_eq!(queue.pop().unwrap().kind, PeripheralKind::GameOver);
/// assert_eq!(queue.pop().unwrap().kind, PeripheralKind::Success);
/// assert!(queue.pop().is_err());
/// ```
#[derive(Clone, Debug)]
pub struct PacketQueue<P, const N: usize = DEFAULT_QUEUE_CAPACITY> {
    slots: [P; N],
    available: usize,
}

impl<P: Frame, const N: usize> PacketQueue<P, N> {
    /// Create an empty queue with every slot zeroed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [P::ZEROED; N],
            available: 0,
        }
    }

    /// Copy `item` into the next free slot.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`] and leaves the queue untouched when every
    /// slot is in use.
    pub fn push(&mut self, item: P) -> Result<(), QueueError> {
        let slot = self.slots.get_mut(self.available).ok_or(QueueError::Full)?;
        *slot = item;
        self.available += 1;
        Ok(())
    }

    /// Take the most recently pushed packet.
    ///
    /// The slot keeps its bytes until it is overwritten by a later push or
    /// zeroed by [`clear`](Self::clear).
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Empty`] when no packet is available.
    pub fn pop(&mut self) -> Result<P, QueueError> {
        let item = self.peek().ok_or(QueueError::Empty)?;
        self.available -= 1;
        Ok(item)
    }

    /// Copy of the packet [`pop`](Self::pop) would return.
    #[must_use]
    pub fn peek(&self) -> Option<P> {
        self.available
            .checked_sub(1)
            .and_then(|index| self.slots.get(index))
            .copied()
    }

    /// Zero every slot and forget all packets.
    pub fn clear(&mut self) {
        self.slots = [P::ZEROED; N];
        self.available = 0;
    }

    /// Number of unread packets.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.available
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.available == 0
    }

    #[inline]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.available == N
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Unread packets in slot order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.slots[..self.available].iter()
    }
}

impl<P: Frame, const N: usize> Default for PacketQueue<P, N> {
    fn default() -> Self {
        Self::new()
    }
}
