use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use super::service_irq_line;
use crate::bus::HciBus;
use crate::error::HciError;
use crate::request::HciRequest;
use crate::transport::HciTransport;

/// Sends a request and waits for its response, sleeping between polls.
///
/// Same outcome as [`HciTransport::send_request`], but each unproductive wait
/// iteration yields to `delay` instead of spinning.
///
/// # Arguments
/// - `transport`: The transport to send through.
/// - `request`: The request; its response buffer receives the answer.
/// - `delay`: A delay provider implementing `DelayNs`, typically from the HAL.
/// - `poll_us`: Pause between polls, in microseconds.
///
/// # Example
/// ```rust,ignore
/// use hci_tl::consts::{OCF_RESET, OGF_HOST_CTL};
/// use hci_tl::irq::send_request_with_delay;
/// use hci_tl::request::HciRequest;
///
/// let mut request = HciRequest::new(OGF_HOST_CTL, OCF_RESET);
/// let n = send_request_with_delay(&mut hci, &mut request, &mut delay, 100)?;
/// ```
pub fn send_request_with_delay<B, D, const N: usize, const SIZE: usize>(
    transport: &mut HciTransport<B, N, SIZE>,
    request: &mut HciRequest<'_>,
    delay: &mut D,
    poll_us: u32,
) -> Result<usize, HciError>
where
    B: HciBus,
    D: DelayNs,
{
    let pending = transport.begin_request(request)?;
    loop {
        match transport.poll_request(&pending, request) {
            Ok(n) => return Ok(n),
            Err(nb::Error::Other(err)) => return Err(err),
            Err(nb::Error::WouldBlock) => delay.delay_us(poll_us),
        }
    }
}

/// Runs a blocking loop that services the IRQ line and dispatches events.
///
/// For firmware without interrupts: every `poll_us` microseconds the link is
/// drained while its IRQ line is high and the ready queue is handed to the
/// registered event handler.
///
/// # Arguments
/// - `transport`: A mutable reference to an initialized `HciTransport`.
/// - `irq`: The link's data-available line.
/// - `delay`: A delay provider implementing `DelayNs`, typically from the HAL.
/// - `poll_us`: The delay between iterations, in microseconds.
///
/// # Notes
/// - This loop never returns; it is intended for single-purpose polling firmware.
pub fn run_hci_event_loop<B, P, D, const N: usize, const SIZE: usize>(
    transport: &mut HciTransport<B, N, SIZE>,
    irq: &mut P,
    delay: &mut D,
    poll_us: u32,
) -> !
where
    B: HciBus,
    P: InputPin,
    D: DelayNs,
{
    loop {
        let _ = service_irq_line(transport, irq);
        let _ = transport.process_pending();
        delay.delay_us(poll_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{OCF_RESET, OGF_HOST_CTL};
    use crate::mock::MockBus;
    use crate::mock::packets::{DISCONNECT, RESET_COMPLETE};
    use crate::transport::TransportConfig;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    fn transport(bus: MockBus) -> HciTransport<MockBus, 5, 64> {
        let mut t = HciTransport::new(bus, TransportConfig::new().with_timeout(10));
        t.init(None);
        t
    }

    #[test]
    fn test_delayed_send_matches_response() {
        let mut t = transport(MockBus::with_packets(&[DISCONNECT, RESET_COMPLETE]));
        let mut rp = [0xffu8; 1];
        let mut request = HciRequest::new(OGF_HOST_CTL, OCF_RESET).response(&mut rp);
        let mut delay = NoopDelay::new();

        assert_eq!(
            send_request_with_delay(&mut t, &mut request, &mut delay, 50),
            Ok(1)
        );
        assert_eq!(rp, [0x00]);
        assert_eq!(t.process_pending(), 1);
    }

    #[test]
    fn test_delayed_send_times_out() {
        let mut t = transport(MockBus::new());
        let mut request = HciRequest::new(OGF_HOST_CTL, OCF_RESET);
        let mut delay = NoopDelay::new();

        assert_eq!(
            send_request_with_delay(&mut t, &mut request, &mut delay, 50),
            Err(HciError::Timeout)
        );
        assert_eq!(t.stats.timeouts, 1);
    }
}
