//! Scheduling utilities for the HCI transport.
//!
//! The link signals "data available" on an IRQ line. This module offers two ways of
//! reacting to it: an interrupt service routine sharing the transport through
//! `critical_section::with` (`isr` feature), or a blocking loop paced by a delay
//! provider (`delay-loop` feature).
//!
//! Contains:
//! - `ticks_from_ms`: runtime timeout conversion
//! - `const_ticks_from_ms`: compile-time timeout conversion
//! - `service_irq_line`: drains the link while its IRQ line is asserted
//! - `send_request_with_delay` and `run_hci_event_loop`: delay-paced waiting (feature `delay-loop`)
//! - `global_hci_notify`, `global_hci_send_request` and the `init_hci_transport!()` /
//!   `setup_hci_transport!()` / `notify_hci_transport!()` macros: interrupt-shared transport
//!   (feature `isr`)
//!
//! Timeouts are expressed in bus ticks. Common tick sources:
//!
//! | Tick rate | 1000 ms timeout |
//! |-----------|-----------------|
//! |      1 kHz |      1000 ticks |
//! |    100 Hz  |       100 ticks |
//! |  32768 Hz  |     32768 ticks |

use embedded_hal::digital::InputPin;

use crate::bus::HciBus;
use crate::transport::{HciTransport, IngestStatus};

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "isr")]
mod isr;
#[cfg_attr(feature = "isr", allow(unused_imports))]
#[cfg(feature = "isr")]
pub use isr::*;

#[cfg(feature = "isr")]
mod macros;
#[cfg_attr(feature = "isr", allow(unused_imports))]
#[cfg(feature = "isr")]
pub use macros::*;

/// Milliseconds per second
pub const MILLIS_PER_SECOND: u64 = 1_000;

/// Converts a duration in milliseconds to bus ticks
///
/// # Arguments
/// - `ms`: duration in milliseconds
/// - `tick_hz`: frequency of the bus tick in Hz
///
/// # Returns
/// - Number of ticks, rounded up and saturated at `u32::MAX`
pub fn ticks_from_ms(ms: u32, tick_hz: u32) -> u32 {
    let ticks = (ms as u64 * tick_hz as u64).div_ceil(MILLIS_PER_SECOND);
    u32::try_from(ticks).unwrap_or(u32::MAX)
}

/// Compile-time timeout conversion
///
/// # Arguments
/// - `ms`: duration in milliseconds
/// - `tick_hz`: frequency of the bus tick in Hz
///
/// # Returns
/// - Number of ticks, rounded up and saturated at `u32::MAX`
pub const fn const_ticks_from_ms(ms: u32, tick_hz: u32) -> u32 {
    let ticks = (ms as u64 * tick_hz as u64).div_ceil(MILLIS_PER_SECOND);
    if ticks > u32::MAX as u64 {
        u32::MAX
    } else {
        ticks as u32
    }
}

/// Ingests packets for as long as the link keeps its IRQ line high.
///
/// Stops early when the free pool is exhausted or the bus reports nothing to
/// read. A pin read error counts as a deasserted line.
///
/// # Returns
/// - Number of packets appended to the ready queue
pub fn service_irq_line<B, P, const N: usize, const SIZE: usize>(
    transport: &mut HciTransport<B, N, SIZE>,
    irq: &mut P,
) -> usize
where
    B: HciBus,
    P: InputPin,
{
    let mut queued = 0;
    while irq.is_high().unwrap_or(false) {
        match transport.ingest() {
            IngestStatus::Queued => queued += 1,
            IngestStatus::Rejected(_) => {}
            IngestStatus::Busy | IngestStatus::Empty => break,
        }
    }
    queued
}
