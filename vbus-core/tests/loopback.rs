//! Controller and peripherals exchanging packets over an in-memory bus.

mod common;

use common::{Loopback, Node, Transaction};
use critical_section as _;
use vbus_core::{Controller, Error, Peripheral};
use vbus_proto::{
    ControllerKind, ControllerPacket, PeripheralKind, PeripheralPacket, BROADCAST,
};

const START_TX: u8 = ControllerKind::StartTx.as_u8();
const STOP_TX: u8 = ControllerKind::StopTx.as_u8();

fn result(tag: u8) -> PeripheralPacket {
    let mut packet = PeripheralPacket::new(PeripheralKind::Success);
    packet.payload[0] = tag;
    packet
}

#[test]
fn test_three_packet_handshake() {
    let node: Node = Peripheral::new(0x20);
    for tag in 1..=3 {
        node.submit(result(tag)).unwrap();
    }
    let mut controller: Controller<_> = Controller::new(Loopback::new(&[&node]));
    controller.register_peripheral(0x20).unwrap();

    let report = controller.tick();
    assert!(report.is_clean());
    assert_eq!(report.received, 3);
    assert_eq!(
        controller.bus().log,
        [
            Transaction::Read(0x20),
            Transaction::Write(0x20, START_TX),
            Transaction::Read(0x20),
            Transaction::Read(0x20),
            Transaction::Read(0x20),
            Transaction::Write(0x20, STOP_TX),
        ]
    );
    assert_eq!(node.pending_outbound(), 0);
    assert!(!node.is_sending());

    // Popped newest-first on both sides, so submission order comes back out
    for tag in 1..=3 {
        let packet = controller.get_data().unwrap();
        assert_eq!(packet.sender, 0x20);
        assert_eq!(packet.payload[0], tag);
    }
    assert_eq!(controller.get_data(), Err(Error::QueueEmpty));
}

#[test]
fn test_zero_count_handshake() {
    let node: Node = Peripheral::new(0x20);
    let mut controller: Controller<_> = Controller::new(Loopback::new(&[&node]));
    controller.register_peripheral(0x20).unwrap();

    let report = controller.tick();
    assert!(report.is_clean());
    assert_eq!(
        controller.bus().log,
        [
            Transaction::Read(0x20),
            Transaction::Write(0x20, START_TX),
            Transaction::Write(0x20, STOP_TX),
        ]
    );
    assert!(!node.is_sending());
    assert!(!controller.has_data());
}

#[test]
fn test_lost_stop_tx_loses_no_packets() {
    use vbus_core::BusError;

    let node: Node = Peripheral::new(0x20);
    let mut controller: Controller<_> = Controller::new(Loopback::new(&[&node]));
    controller.register_peripheral(0x20).unwrap();

    controller.bus_mut().drop_next = Some(STOP_TX);
    let report = controller.tick();
    assert_eq!(report.failure_for(0x20), Some(Error::Bus(BusError::DataNack)));
    assert!(node.is_sending());

    for tag in 1..=3 {
        node.submit(result(tag)).unwrap();
    }

    // The stale phase hands over one packet in place of the summary
    let report = controller.tick();
    assert_eq!(
        report.failure_for(0x20),
        Some(Error::UnexpectedReply(PeripheralKind::Success.as_u8()))
    );
    assert_eq!(report.received, 1);
    assert!(!node.is_sending());

    let report = controller.tick();
    assert!(report.is_clean());
    assert_eq!(report.received, 2);

    let mut tags: Vec<u8> = std::iter::from_fn(|| controller.get_data().ok())
        .map(|packet| packet.payload[0])
        .collect();
    tags.sort_unstable();
    assert_eq!(tags, [1, 2, 3]);
    assert_eq!(node.pending_outbound(), 0);
}

#[test]
fn test_broadcast_reaches_every_peripheral() {
    let first: Node = Peripheral::new(0x20);
    let second: Node = Peripheral::new(0x21);
    let mut controller: Controller<_> = Controller::new(Loopback::new(&[&first, &second]));
    controller.register_peripheral(0x20).unwrap();
    controller.register_peripheral(0x21).unwrap();

    controller
        .submit(ControllerPacket::broadcast(ControllerKind::Init))
        .unwrap();
    let report = controller.tick();
    assert_eq!(report.flushed, 2);
    assert_eq!(controller.outbound_len(), 0);

    for node in [&first, &second] {
        let packet = node.get_data().unwrap();
        assert_eq!(packet.kind, ControllerKind::Init);
        assert_eq!(packet.target, BROADCAST);
        assert!(!node.has_data());
    }
}

#[test]
fn test_targeted_packet_reaches_one_peripheral() {
    let first: Node = Peripheral::new(0x20);
    let second: Node = Peripheral::new(0x21);
    let mut controller: Controller<_> = Controller::new(Loopback::new(&[&first, &second]));
    controller.register_peripheral(0x20).unwrap();
    controller.register_peripheral(0x21).unwrap();

    controller
        .submit(ControllerPacket::new(ControllerKind::Start, 0x21))
        .unwrap();
    controller.tick();

    assert!(!first.has_data());
    assert_eq!(second.get_data().unwrap().kind, ControllerKind::Start);
}

#[test]
fn test_full_queue_transfers_in_one_tick() {
    let node: Node = Peripheral::new(0x20);
    for tag in 0..8 {
        node.submit(result(tag)).unwrap();
    }
    assert_eq!(node.submit(result(8)), Err(Error::QueueFull));

    let mut controller: Controller<_> = Controller::new(Loopback::new(&[&node]));
    controller.register_peripheral(0x20).unwrap();
    let report = controller.tick();
    assert_eq!(report.received, 8);
    assert_eq!(report.deferred, 0);
    assert_eq!(controller.inbound_len(), 8);

    // Slots are free again
    node.submit(result(9)).unwrap();
}

#[test]
fn test_missing_peripheral_does_not_block_others() {
    let present: Node = Peripheral::new(0x21);
    present.submit(result(5)).unwrap();
    let mut controller: Controller<_> = Controller::new(Loopback::new(&[&present]));
    controller.register_peripheral(0x20).unwrap();
    controller.register_peripheral(0x21).unwrap();

    let report = controller.tick();
    assert_eq!(report.failure_for(0x20), Some(Error::TransportUnavailable));
    assert_eq!(report.failure_for(0x21), None);
    assert_eq!(controller.get_data().unwrap().payload[0], 5);
}

#[test]
fn test_deferred_packets_arrive_next_tick() {
    let node: Node = Peripheral::new(0x20);
    for tag in 1..=3 {
        node.submit(result(tag)).unwrap();
    }
    let mut controller: Controller<_, 8, 2> = Controller::new(Loopback::new(&[&node]));
    controller.register_peripheral(0x20).unwrap();

    let report = controller.tick();
    assert_eq!(report.received, 2);
    assert_eq!(report.deferred, 1);
    assert_eq!(node.pending_outbound(), 1);
    assert!(!node.is_sending());

    controller.clear_inbound();
    let report = controller.tick();
    assert_eq!(report.received, 1);
    assert_eq!(report.deferred, 0);
    // The oldest packet was left behind
    assert_eq!(controller.get_data().unwrap().payload[0], 1);
}

#[test]
fn test_round_trip_with_handlers() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static REPLIES: AtomicUsize = AtomicUsize::new(0);
    static NODE: Node = Peripheral::new(0x22);

    // The peripheral answers every Start with one result
    static ON_COMMAND: fn(&ControllerPacket) = |packet| {
        if packet.kind == ControllerKind::Start {
            let _ = NODE.get_data();
            let _ = NODE.submit(PeripheralPacket::new(PeripheralKind::GameOver));
        }
    };
    NODE.set_message_handler(&ON_COMMAND);

    let on_result = |packet: &PeripheralPacket| {
        assert_eq!(packet.kind, PeripheralKind::GameOver);
        REPLIES.fetch_add(1, Ordering::Relaxed);
    };
    let mut controller: Controller<_> = Controller::new(Loopback::new(&[&NODE]));
    controller.set_message_handler(&on_result);
    controller.register_peripheral(0x22).unwrap();

    controller
        .submit(ControllerPacket::new(ControllerKind::Start, 0x22))
        .unwrap();
    // The reply is queued during the flush and collected in the same tick
    let report = controller.tick();
    assert_eq!(report.received, 1);
    assert_eq!(REPLIES.load(Ordering::Relaxed), 1);
    assert!(!NODE.has_data());
    NODE.clear_message_handler();
}
