//! HCI transport: packet ingestion, command/response correlation and event delivery.
//!
//! This module provides [`HciTransport`], the context value that owns the bus
//! binding and the fixed buffer arena. All transport state lives here; there is
//! no hidden global, so independent instances can coexist (one per test, for
//! instance).
//!
//! ## Data flow
//!
//! ```text
//!  link signal ──> ingest() ──> ready queue ──┬──> send_request() (matched response)
//!                                             └──> process_pending() / drain_events()
//! ```
//!
//! - [`ingest()`](HciTransport::ingest) runs once per data-available signal. It never
//!   blocks and never reads when the free pool is empty: that is the only ingress
//!   backpressure.
//! - [`send_request()`](HciTransport::send_request) sends a command and waits for the
//!   correlated response. Unrelated packets seen while waiting are set aside and put
//!   back ahead of newer arrivals, in arrival order, before it returns.
//! - [`process_pending()`](HciTransport::process_pending) hands every ready packet to
//!   the registered handler in arrival order.
//!
//! ## Execution model
//!
//! Ingestion and the waiting caller share one context. With [`WaitMode::Poll`] the wait
//! loop calls `ingest()` itself on every iteration; with [`WaitMode::Interrupt`] it only
//! inspects the queues and relies on an interrupt handler to ingest. In that case the
//! transport must be shared through a critical section, see `irq::isr`.
//!
//! ## Overflow
//!
//! Before each command the oldest undelivered ready packets are dropped until the free
//! pool is back at the [`ReclaimPolicy`] threshold. Events are lost only under this
//! policy, and only if nobody drains them.
//!
//! ## Example
//!
//! ```rust
//! use hci_tl::bus::HciBus;
//! use hci_tl::consts::{OCF_RESET, OGF_HOST_CTL};
//! use hci_tl::error::HciError;
//! use hci_tl::request::HciRequest;
//! use hci_tl::transport::{HciTransport, TransportConfig};
//!
//! # struct Spi { now: u32 }
//! # impl HciBus for Spi {
//! #     fn receive(&mut self, _buf: &mut [u8]) -> usize { 0 }
//! #     fn tick(&mut self) -> u32 { self.now += 1; self.now }
//! # }
//! let mut hci: HciTransport<Spi> =
//!     HciTransport::new(Spi { now: 0 }, TransportConfig::new().with_timeout(10));
//! hci.init(None);
//!
//! let mut status = [0u8; 1];
//! let mut request = HciRequest::new(OGF_HOST_CTL, OCF_RESET).response(&mut status);
//! // Nothing answers on this bus.
//! assert_eq!(hci.send_request(&mut request), Err(HciError::Timeout));
//! ```

use heapless::Vec;

use crate::bus::HciBus;
use crate::consts::{HCI_DEFAULT_TIMEOUT_MS, HCI_READ_PACKET_NUM_MAX, HCI_READ_PACKET_SIZE};
use crate::error::{HciError, PacketError};
use crate::packet::{encode_command, verify_event_packet};
use crate::pool::{PacketPool, QueueKind};
use crate::request::{HciRequest, PendingRequest, Verdict};

/// How many ready packets may be dropped to keep the free pool healthy.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ReclaimPolicy {
    /// Keep at least half of the arena free.
    #[default]
    HalfCapacity,
    /// Keep at least this many buffers free (clamped to the arena size).
    Threshold(usize),
    /// Never drop undelivered packets.
    Disabled,
}

impl ReclaimPolicy {
    /// Minimum free-pool size for an arena of `capacity` buffers.
    pub fn threshold(self, capacity: usize) -> usize {
        match self {
            ReclaimPolicy::HalfCapacity => capacity / 2,
            ReclaimPolicy::Threshold(n) => n.min(capacity),
            ReclaimPolicy::Disabled => 0,
        }
    }
}

/// Who drives ingestion while a request waits.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum WaitMode {
    /// The wait loop calls [`HciTransport::ingest`] on every iteration.
    #[default]
    Poll,
    /// An interrupt handler ingests; the wait loop only reads the queues.
    Interrupt,
}

/// Transport configuration.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TransportConfig {
    /// Default request timeout, in bus ticks.
    pub timeout: u32,
    /// Overflow reclamation policy applied before each command.
    pub reclaim: ReclaimPolicy,
    /// Ingestion strategy while waiting.
    pub wait: WaitMode,
}

impl TransportConfig {
    /// 1000-tick timeout (one second at a 1 kHz tick), half-capacity reclaim, polling wait.
    pub const fn new() -> Self {
        Self {
            timeout: HCI_DEFAULT_TIMEOUT_MS,
            reclaim: ReclaimPolicy::HalfCapacity,
            wait: WaitMode::Poll,
        }
    }

    /// Sets the default request timeout, in bus ticks.
    pub const fn with_timeout(mut self, ticks: u32) -> Self {
        self.timeout = ticks;
        self
    }

    /// Sets the overflow reclamation policy.
    pub const fn with_reclaim(mut self, reclaim: ReclaimPolicy) -> Self {
        self.reclaim = reclaim;
        self
    }

    /// Sets the wait strategy.
    pub const fn with_wait(mut self, wait: WaitMode) -> Self {
        self.wait = wait;
        self
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Running counters, for diagnostics.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct HciStats {
    /// Packets accepted into the ready queue.
    pub rx_good: u32,
    /// Packets refused by validation.
    pub rx_bad: u32,
    /// Ingestion attempts declined because the free pool was empty.
    pub rx_busy: u32,
    /// Command packets handed to the bus.
    pub tx_packets: u32,
    /// Undelivered packets dropped by overflow reclamation.
    pub reclaimed: u32,
    /// Unrelated packets dropped to keep a buffer for a pending response.
    pub dropped: u32,
    /// Requests that timed out.
    pub timeouts: u32,
}

/// Outcome of one ingestion attempt.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum IngestStatus {
    /// A valid event was appended to the ready queue.
    Queued,
    /// The bus had nothing to read.
    Empty,
    /// The free pool is empty; nothing was read.
    Busy,
    /// The packet failed validation and was discarded.
    Rejected(PacketError),
}

/// Consumer of unsolicited events, called with the raw event packet.
pub type EventHandler = fn(&[u8]);

/// The HCI transport context.
///
/// ## Type Parameters
///
/// - `B`: the platform [`HciBus`]
/// - `N`: number of receive buffers (default [`HCI_READ_PACKET_NUM_MAX`])
/// - `SIZE`: capacity of each receive buffer (default [`HCI_READ_PACKET_SIZE`])
#[derive(Debug)]
pub struct HciTransport<
    B: HciBus,
    const N: usize = HCI_READ_PACKET_NUM_MAX,
    const SIZE: usize = HCI_READ_PACKET_SIZE,
> {
    /// The bus binding.
    pub bus: B,
    /// Diagnostic counters.
    pub stats: HciStats,
    pool: PacketPool<N, SIZE>,
    config: TransportConfig,
    handler: Option<EventHandler>,
}

impl<B: HciBus, const N: usize, const SIZE: usize> HciTransport<B, N, SIZE> {
    /// Creates a transport over `bus` with every buffer free.
    ///
    /// The bus is not touched until [`init()`](Self::init).
    pub fn new(bus: B, config: TransportConfig) -> Self {
        Self {
            bus,
            stats: HciStats::default(),
            pool: PacketPool::new(),
            config,
            handler: None,
        }
    }

    /// Brings the transport up.
    ///
    /// Registers `handler` if one is given (a `None` keeps the current one),
    /// returns every buffer to the free pool, then runs the bus `init` and
    /// `reset` once.
    pub fn init(&mut self, handler: Option<EventHandler>) {
        if handler.is_some() {
            self.handler = handler;
        }
        self.pool.reset();
        self.bus.init();
        self.bus.reset();
        debug!("hci: transport up, {} buffers of {} bytes", N, SIZE);
    }

    /// Replaces the event handler. `None` unregisters it.
    pub fn set_event_handler(&mut self, handler: Option<EventHandler>) {
        self.handler = handler;
    }

    /// The active configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Replaces the configuration.
    pub fn set_config(&mut self, config: TransportConfig) {
        self.config = config;
    }

    /// The buffer arena, for inspection.
    pub fn pool(&self) -> &PacketPool<N, SIZE> {
        &self.pool
    }

    /// Reads one packet from the bus into a free buffer.
    ///
    /// Call once per data-available signal (interrupt or poll).
    ///
    /// # Behavior
    /// - Free pool empty: returns [`IngestStatus::Busy`] without reading
    /// - Nothing read: the buffer goes back to the free pool head
    /// - Valid event packet: appended to the ready queue tail
    /// - Invalid packet: the buffer goes back to the free pool head
    pub fn ingest(&mut self) -> IngestStatus {
        let Some(handle) = self.pool.acquire_free() else {
            self.stats.rx_busy = self.stats.rx_busy.wrapping_add(1);
            trace!("hci: free pool empty, read deferred");
            return IngestStatus::Busy;
        };

        let buf = self.pool.buffer_mut(&handle);
        let len = self.bus.receive(buf.storage_mut());
        buf.set_len(len);
        if len == 0 {
            self.pool.release_free_head(handle);
            return IngestStatus::Empty;
        }

        match verify_event_packet(self.pool.buffer(&handle).bytes()) {
            Ok(()) => {
                self.pool.push_ready(handle);
                self.stats.rx_good = self.stats.rx_good.wrapping_add(1);
                IngestStatus::Queued
            }
            Err(err) => {
                self.pool.release_free_head(handle);
                self.stats.rx_bad = self.stats.rx_bad.wrapping_add(1);
                debug!("hci: dropped inbound packet: {:?}", err);
                IngestStatus::Rejected(err)
            }
        }
    }

    /// Sends `request` and blocks until its response arrives, an error event
    /// ends it, or the timeout elapses.
    ///
    /// # Returns
    /// - `Ok(n)`: the response was found and `n` bytes were copied into the
    ///   request's response buffer (truncated to its capacity)
    /// - `Err(_)`: timeout, error event, opcode mismatch or invalid parameters
    pub fn send_request(&mut self, request: &mut HciRequest<'_>) -> Result<usize, HciError> {
        let pending = self.begin_request(request)?;
        nb::block!(self.poll_request(&pending, request))
    }

    /// Sends `request` without waiting for any response.
    pub fn send_request_async(&mut self, request: &HciRequest<'_>) -> Result<(), HciError> {
        let _ = self.begin_request(request)?;
        Ok(())
    }

    /// Reclaims ready-queue pressure and sends the command.
    ///
    /// The returned [`PendingRequest`] is then driven with
    /// [`poll_request()`](Self::poll_request) until it resolves.
    pub fn begin_request(&mut self, request: &HciRequest<'_>) -> Result<PendingRequest, HciError> {
        let packet = encode_command(request.opcode(), request.cparams())
            .map_err(|_| HciError::InvalidParameters(request.cparams().len()))?;

        self.reclaim();
        self.bus.send(&packet);
        self.stats.tx_packets = self.stats.tx_packets.wrapping_add(1);
        trace!("hci: sent opcode {}", request.opcode().raw());

        let timeout = request.timeout_override().unwrap_or(self.config.timeout);
        Ok(PendingRequest::new(
            request.opcode(),
            request.event(),
            self.bus.tick(),
            timeout,
        ))
    }

    /// Advances a pending request by at most one ready packet.
    ///
    /// # Returns
    /// - `Ok(n)`: matched; `n` response bytes were copied
    /// - `Err(nb::Error::WouldBlock)`: still waiting
    /// - `Err(nb::Error::Other(_))`: the request failed
    ///
    /// Once it returns anything but `WouldBlock`, set-aside packets are back at
    /// the head of the ready queue and `pending` must not be polled again.
    pub fn poll_request(
        &mut self,
        pending: &PendingRequest,
        request: &mut HciRequest<'_>,
    ) -> nb::Result<usize, HciError> {
        if self.config.wait == WaitMode::Poll {
            let _ = self.ingest();
        }

        let Some(handle) = self.pool.pop_ready() else {
            return self.check_deadline(pending);
        };

        match pending.classify(self.pool.buffer(&handle).bytes()) {
            Verdict::Matched(offset) => {
                let bytes = self.pool.buffer(&handle).bytes();
                let src = bytes.get(offset..).unwrap_or_default();
                let out = request.response_mut();
                let n = src.len().min(out.len());
                out[..n].copy_from_slice(&src[..n]);
                self.pool.release_free_head(handle);
                self.finish();
                Ok(n)
            }
            Verdict::Failed(err) => {
                self.pool.release_free_head(handle);
                self.finish();
                warn!("hci: request failed: {:?}", err);
                Err(nb::Error::Other(err))
            }
            Verdict::Discard => {
                self.pool.release_free_head(handle);
                self.check_deadline(pending)
            }
            Verdict::Unrelated => {
                if self.pool.is_empty(QueueKind::Free) && self.pool.is_empty(QueueKind::Ready) {
                    // Keep one buffer for the response.
                    self.pool.release_free_tail(handle);
                    self.stats.dropped = self.stats.dropped.wrapping_add(1);
                    warn!("hci: pool starved, dropped an unrelated event");
                } else {
                    self.pool.hold_back(handle);
                }
                self.check_deadline(pending)
            }
        }
    }

    /// Hands every ready packet to the registered handler, oldest first, and
    /// frees its buffer. Packets are freed even with no handler registered.
    ///
    /// Returns the number of packets drained. The handler must not call back
    /// into the transport.
    pub fn process_pending(&mut self) -> usize {
        let mut count = 0;
        while let Some(handle) = self.pool.pop_ready() {
            if let Some(handler) = self.handler {
                handler(self.pool.buffer(&handle).bytes());
            }
            self.pool.release_free_tail(handle);
            count += 1;
        }
        count
    }

    /// Iterates over the ready packets, oldest first, freeing each buffer as
    /// its copy is yielded.
    pub fn drain_events(&mut self) -> Drain<'_, N, SIZE> {
        Drain {
            pool: &mut self.pool,
        }
    }

    fn reclaim(&mut self) {
        let threshold = self.config.reclaim.threshold(N);
        let dropped = self.pool.reclaim_ready(threshold);
        if dropped > 0 {
            self.stats.reclaimed = self.stats.reclaimed.wrapping_add(dropped as u32);
            warn!("hci: reclaimed {} undelivered events", dropped);
        }
    }

    fn check_deadline(&mut self, pending: &PendingRequest) -> nb::Result<usize, HciError> {
        if !pending.expired(self.bus.tick()) {
            return Err(nb::Error::WouldBlock);
        }
        self.finish();
        self.stats.timeouts = self.stats.timeouts.wrapping_add(1);
        warn!("hci: opcode {} timed out", pending.opcode().raw());
        Err(nb::Error::Other(HciError::Timeout))
    }

    fn finish(&mut self) {
        let restored = self.pool.restore_holdback();
        if restored > 0 {
            trace!("hci: restored {} held events", restored);
        }
    }
}

/// Iterator returned by [`HciTransport::drain_events`].
#[derive(Debug)]
pub struct Drain<'a, const N: usize, const SIZE: usize> {
    pool: &'a mut PacketPool<N, SIZE>,
}

impl<const N: usize, const SIZE: usize> Iterator for Drain<'_, N, SIZE> {
    type Item = Vec<u8, SIZE>;

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.pool.pop_ready()?;
        // A buffer never holds more than SIZE bytes, so the copy always fits.
        let packet = Vec::from_slice(self.pool.buffer(&handle).bytes());
        self.pool.release_free_tail(handle);
        packet.ok()
    }
}
