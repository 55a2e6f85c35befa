//! Platform bus binding.
//!
//! The transport never touches the physical link itself. Everything it needs
//! from the platform is expressed by [`HciBus`]: one-time setup, a controller
//! reset, raw byte transmission and reception, and a monotonic tick.
//!
//! How the bytes cross the link (SPI header exchange, UART framing, chip
//! select handling) is the implementation's concern.
//!
//! ## Example
//!
//! ```rust
//! use hci_tl::bus::HciBus;
//!
//! struct Silent {
//!     now: u32,
//! }
//!
//! impl HciBus for Silent {
//!     fn send(&mut self, _packet: &[u8]) {}
//!
//!     fn tick(&mut self) -> u32 {
//!         self.now += 1;
//!         self.now
//!     }
//! }
//! ```

/// Capability set supplied by the platform.
///
/// Only [`tick`](Self::tick) is mandatory. The other defaults do nothing, so a
/// bus without a transmit path turns outbound requests into no-ops.
pub trait HciBus {
    /// One-time bus setup. Failures are not reported to the transport.
    fn init(&mut self) {}

    /// Forces the controller into a known state. Runs once at startup, after [`init`](Self::init).
    fn reset(&mut self) {}

    /// Transmits all of `packet`. No acknowledgment is expected.
    fn send(&mut self, packet: &[u8]) {
        let _ = packet;
    }

    /// Fills up to `buf.len()` bytes of one inbound packet.
    ///
    /// Returns the number of bytes read; `0` means nothing was available,
    /// which is also what a bus without a receive path reports.
    fn receive(&mut self, buf: &mut [u8]) -> usize {
        let _ = buf;
        0
    }

    /// Returns a monotonically increasing, wrapping time value in a fixed unit.
    fn tick(&mut self) -> u32;
}

impl<B: HciBus + ?Sized> HciBus for &mut B {
    fn init(&mut self) {
        (**self).init()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn send(&mut self, packet: &[u8]) {
        (**self).send(packet)
    }

    fn receive(&mut self, buf: &mut [u8]) -> usize {
        (**self).receive(buf)
    }

    fn tick(&mut self) -> u32 {
        (**self).tick()
    }
}
