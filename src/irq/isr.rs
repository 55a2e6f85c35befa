use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::InputPin;

use super::service_irq_line;
use crate::bus::HciBus;
use crate::consts::{HCI_READ_PACKET_NUM_MAX, HCI_READ_PACKET_SIZE};
use crate::error::HciError;
use crate::request::HciRequest;
use crate::transport::{EventHandler, HciTransport, IngestStatus, TransportConfig};

/// A transport shared between interrupt context and the main thread.
pub type SharedTransport<
    B,
    const N: usize = HCI_READ_PACKET_NUM_MAX,
    const SIZE: usize = HCI_READ_PACKET_SIZE,
> = Mutex<RefCell<Option<HciTransport<B, N, SIZE>>>>;

/// Used to initialize the global static `HciTransport` for use with
/// `critical_section`.
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```rust,ignore
/// use hci_tl::irq::{SharedTransport, global_hci_transport_init};
/// use some_hal::SpiBus;
///
/// static HCI: SharedTransport<SpiBus> = global_hci_transport_init();
/// ```
pub const fn global_hci_transport_init<B: HciBus, const N: usize, const SIZE: usize>()
-> SharedTransport<B, N, SIZE> {
    Mutex::new(RefCell::new(None))
}

/// Builds and initializes the shared transport.
///
/// Any transport already stored is replaced. The bus is initialized and the
/// controller reset inside the critical section.
///
/// # Arguments
/// * The global static transport
/// * The bus binding
/// * The transport configuration, normally with [`WaitMode::Interrupt`](crate::transport::WaitMode::Interrupt)
/// * The optional event handler
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     let config = TransportConfig::new().with_wait(WaitMode::Interrupt);
///     global_hci_transport_setup(&HCI, spi, config, Some(on_event));
/// }
/// ```
pub fn global_hci_transport_setup<B: HciBus, const N: usize, const SIZE: usize>(
    global_transport: &'static SharedTransport<B, N, SIZE>,
    bus: B,
    config: TransportConfig,
    handler: Option<EventHandler>,
) {
    critical_section::with(|cs| {
        let mut transport = HciTransport::new(bus, config);
        transport.init(handler);
        let _ = global_transport.borrow(cs).replace(Some(transport));
    });
}

/// Ingests one packet. Call from the link's data-available interrupt.
///
/// # Returns
/// * `None` if the transport has not been set up yet
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn EXTI0() {
///     let _ = global_hci_notify(&HCI);
/// }
/// ```
pub fn global_hci_notify<B: HciBus, const N: usize, const SIZE: usize>(
    global_transport: &'static SharedTransport<B, N, SIZE>,
) -> Option<IngestStatus> {
    critical_section::with(|cs| {
        global_transport
            .borrow(cs)
            .borrow_mut()
            .as_mut()
            .map(HciTransport::ingest)
    })
}

/// Ingests packets while the IRQ line stays high. Call from the IRQ line's interrupt.
///
/// # Returns
/// * Number of packets queued, `0` if the transport has not been set up yet
pub fn global_hci_service_irq<B, P, const N: usize, const SIZE: usize>(
    global_transport: &'static SharedTransport<B, N, SIZE>,
    irq: &mut P,
) -> usize
where
    B: HciBus,
    P: InputPin,
{
    critical_section::with(|cs| {
        match global_transport.borrow(cs).borrow_mut().as_mut() {
            Some(transport) => service_irq_line(transport, irq),
            None => 0,
        }
    })
}

/// Sends a request through the shared transport and waits for its response.
///
/// Each wait iteration runs in its own short critical section, so the
/// ingestion interrupt can run between them.
///
/// # Returns
/// * The number of response bytes copied
/// * [`HciError::NotInitialized`] if the transport is missing, now or while waiting
pub fn global_hci_send_request<B: HciBus, const N: usize, const SIZE: usize>(
    global_transport: &'static SharedTransport<B, N, SIZE>,
    request: &mut HciRequest<'_>,
) -> Result<usize, HciError> {
    let pending = critical_section::with(|cs| {
        global_transport
            .borrow(cs)
            .borrow_mut()
            .as_mut()
            .ok_or(HciError::NotInitialized)?
            .begin_request(request)
    })?;

    loop {
        let step = critical_section::with(|cs| {
            match global_transport.borrow(cs).borrow_mut().as_mut() {
                Some(transport) => transport.poll_request(&pending, request),
                None => Err(nb::Error::Other(HciError::NotInitialized)),
            }
        });
        match step {
            Ok(n) => return Ok(n),
            Err(nb::Error::Other(err)) => return Err(err),
            Err(nb::Error::WouldBlock) => core::hint::spin_loop(),
        }
    }
}

/// Hands every ready packet to the shared transport's event handler.
///
/// # Returns
/// * Number of packets drained, `0` if the transport has not been set up yet
pub fn global_hci_process_pending<B: HciBus, const N: usize, const SIZE: usize>(
    global_transport: &'static SharedTransport<B, N, SIZE>,
) -> usize {
    critical_section::with(|cs| {
        global_transport
            .borrow(cs)
            .borrow_mut()
            .as_mut()
            .map_or(0, HciTransport::process_pending)
    })
}
