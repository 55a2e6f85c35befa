//! Scripted bus for unit tests.

use std::collections::VecDeque;

use crate::bus::HciBus;

/// Replays queued inbound packets, records outbound ones and advances a
/// tick counter by `step` on every `tick()` call.
#[derive(Debug)]
pub(crate) struct MockBus {
    pub(crate) inbound: VecDeque<Vec<u8>>,
    pub(crate) sent: Vec<Vec<u8>>,
    pub(crate) now: u32,
    pub(crate) step: u32,
    pub(crate) receive_calls: usize,
    pub(crate) init_calls: usize,
    pub(crate) reset_calls: usize,
}

impl MockBus {
    pub(crate) fn new() -> Self {
        Self {
            inbound: VecDeque::new(),
            sent: Vec::new(),
            now: 0,
            step: 1,
            receive_calls: 0,
            init_calls: 0,
            reset_calls: 0,
        }
    }

    pub(crate) fn with_packets(packets: &[&[u8]]) -> Self {
        let mut bus = Self::new();
        for packet in packets {
            bus.push(packet);
        }
        bus
    }

    pub(crate) fn push(&mut self, packet: &[u8]) {
        self.inbound.push_back(packet.to_vec());
    }
}

impl HciBus for MockBus {
    fn init(&mut self) {
        self.init_calls += 1;
    }

    fn reset(&mut self) {
        self.reset_calls += 1;
    }

    fn send(&mut self, packet: &[u8]) {
        self.sent.push(packet.to_vec());
    }

    fn receive(&mut self, buf: &mut [u8]) -> usize {
        self.receive_calls += 1;
        match self.inbound.pop_front() {
            Some(packet) => {
                let n = packet.len().min(buf.len());
                buf[..n].copy_from_slice(&packet[..n]);
                n
            }
            None => 0,
        }
    }

    fn tick(&mut self) -> u32 {
        self.now = self.now.wrapping_add(self.step);
        self.now
    }
}

/// Event packets shared by the transport tests.
pub(crate) mod packets {
    /// Command Complete for HCI reset (opcode 0x0c03), status 0.
    pub(crate) const RESET_COMPLETE: &[u8] = &[0x04, 0x0e, 0x04, 0x01, 0x03, 0x0c, 0x00];
    /// Disconnection Complete, handle 0x0001, reason 0x13.
    pub(crate) const DISCONNECT: &[u8] = &[0x04, 0x05, 0x04, 0x00, 0x01, 0x00, 0x13];
    /// Vendor event.
    pub(crate) const VENDOR: &[u8] = &[0x04, 0xff, 0x03, 0x01, 0x00, 0x01];
    /// LE advertising report meta-event.
    pub(crate) const ADV_REPORT: &[u8] = &[0x04, 0x3e, 0x03, 0x02, 0x01, 0x00];
}
