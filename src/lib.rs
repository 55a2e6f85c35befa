//! # hci-tl
//!
//! A portable, no_std host-side HCI transport layer for Bluetooth Low Energy network
//! processors (BlueNRG-class controllers) attached over an interrupt-signaled serial link.
//!
//! This crate implements the host half of the link using:
//! - a fixed arena of receive buffers moved between free, ready and holdback queues
//! - command/response correlation by opcode or LE meta sub-event, with a timeout
//! - in-order delivery of unsolicited events to a single handler
//! - interrupt-safe transport sharing with `critical-section`
//!
//! ## Crate features
//! | Feature         | Description |
//! |-----------------|-------------|
//! | `std`           | Disables `#![no_std]` |
//! | `delay-loop`    | Uses `embedded_hal::delay::DelayNs` to pace waits and event polling |
//! | `isr` (default) | Uses `critical_section::with` to share the transport with an ISR |
//! | `defmt-0-3`     | Uses `defmt` logging |
//! | `log`           | Uses `log` logging |
//!
//! ## Packet flow
//!
//! - Every inbound packet is validated (event type marker, exact declared length)
//!   before it is queued; nothing else is ever delivered
//! - A pending command sees the ready queue first; packets it does not want are set
//!   aside and put back ahead of newer arrivals, in arrival order
//! - When the free pool runs low, the oldest undelivered events are reclaimed
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hci_tl::transport::{HciTransport, TransportConfig};
//!
//! let mut hci: HciTransport<_> = HciTransport::new(spi_bus, TransportConfig::new());
//! hci.init(Some(on_event));
//! hci_tl::commands::reset(&mut hci)?;
//!
//! loop {
//!     hci_tl::irq::service_irq_line(&mut hci, &mut irq_pin);
//!     hci.process_pending();
//! }
//! ```
//!
//! Or, use `run_hci_event_loop()` with a `DelayNs` implementation:
//!
//! ```rust,ignore
//! hci_tl::irq::run_hci_event_loop(&mut hci, &mut irq_pin, &mut delay, 500);
//! ```
//!
//! ## Integration Notes
//!
//! - Timeouts are counted in bus ticks; see `irq::ticks_from_ms` for conversions
//! - Buffer count and size are const generics (defaults 5 and 128 bytes)
//! - With an interrupt-driven link, set `WaitMode::Interrupt` and share the transport
//!   through `irq::SharedTransport`
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "isr")]
pub use critical_section;

pub use heapless;

#[macro_use]
mod fmt;

pub mod bus;
pub mod commands;
pub mod consts;
pub mod error;
pub mod irq;
pub mod opcode;
pub mod packet;
pub mod pool;
pub mod request;
pub mod transport;

#[cfg(test)]
mod mock;
