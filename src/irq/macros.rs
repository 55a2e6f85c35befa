/// Declares a static global `HCI_TRANSPORT` instance protected by a `critical_section` mutex.
///
/// This macro creates a `static` singleton `HCI_TRANSPORT` suitable for use in
/// interrupt-based environments, where both the main thread and an ISR need
/// to safely access the shared transport state.
///
/// # Arguments
/// - `$bus`: The concrete type of the bus binding (must implement `HciBus`)
/// - `$n`, `$size`: Optional buffer count and buffer size (defaults 5 and 128)
///
/// # Example
/// ```rust,ignore
/// init_hci_transport!(MySpiBus);
/// init_hci_transport!(MySpiBus, 8, 255);
/// ```
#[macro_export]
macro_rules! init_hci_transport {
    ( $bus:ty ) => {
        pub static HCI_TRANSPORT: $crate::irq::SharedTransport<$bus> =
            $crate::irq::global_hci_transport_init();
    };
    ( $bus:ty, $n:expr, $size:expr ) => {
        pub static HCI_TRANSPORT: $crate::irq::SharedTransport<$bus, { $n }, { $size }> =
            $crate::irq::global_hci_transport_init();
    };
}

/// Initializes the global `HCI_TRANSPORT` singleton with a new transport instance.
///
/// This macro wraps construction and bring-up of the `HciTransport` and stores it
/// inside the globally declared `HCI_TRANSPORT` created by `init_hci_transport!`.
///
/// # Arguments
/// - `$bus`: The bus binding value
/// - `$config`: Optional `TransportConfig` (defaults to interrupt-driven waiting)
/// - `$handler`: Optional event handler function
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     setup_hci_transport!(spi);
///     // or
///     setup_hci_transport!(spi, TransportConfig::new().with_timeout(500), on_event);
/// }
/// ```
///
/// # Notes
/// - Requires `init_hci_transport!` to have been used earlier.
#[macro_export]
macro_rules! setup_hci_transport {
    ( $bus:expr ) => {
        $crate::irq::global_hci_transport_setup(
            &HCI_TRANSPORT,
            $bus,
            $crate::transport::TransportConfig::new()
                .with_wait($crate::transport::WaitMode::Interrupt),
            None,
        )
    };
    ( $bus:expr, $config:expr ) => {
        $crate::irq::global_hci_transport_setup(&HCI_TRANSPORT, $bus, $config, None)
    };
    ( $bus:expr, $config:expr, $handler:expr ) => {
        $crate::irq::global_hci_transport_setup(&HCI_TRANSPORT, $bus, $config, Some($handler))
    };
}

/// Ingests one packet into the global `HCI_TRANSPORT` if it has been set up.
///
/// This macro is intended to be invoked from the link's data-available interrupt.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn EXTI0() {
///     notify_hci_transport!();
/// }
/// ```
///
/// # Notes
/// - This macro assumes `HCI_TRANSPORT` was declared with `init_hci_transport!`
///   and initialized via `setup_hci_transport!`.
/// - Safe to call before setup: it silently does nothing.
#[macro_export]
macro_rules! notify_hci_transport {
    () => {
        let _ = $crate::irq::global_hci_notify(&HCI_TRANSPORT);
    };
}

#[cfg(test)]
mod tests {
    use crate::consts::{OCF_RESET, OGF_HOST_CTL};
    use crate::irq::{global_hci_process_pending, global_hci_send_request};
    use crate::mock::MockBus;
    use crate::mock::packets::{RESET_COMPLETE, VENDOR};
    use crate::request::HciRequest;
    use crate::transport::TransportConfig;
    use core::sync::atomic::{AtomicUsize, Ordering};

    crate::init_hci_transport!(MockBus, 3, 32);

    static HANDLED: AtomicUsize = AtomicUsize::new(0);

    fn count(_packet: &[u8]) {
        let _ = HANDLED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_macros_drive_global_transport() {
        notify_before_setup();

        let bus = MockBus::with_packets(&[VENDOR]);
        crate::setup_hci_transport!(bus, TransportConfig::new().with_timeout(10), count);
        crate::notify_hci_transport!();
        assert_eq!(global_hci_process_pending(&HCI_TRANSPORT), 1);
        assert_eq!(HANDLED.load(Ordering::SeqCst), 1);

        crate::setup_hci_transport!(MockBus::new());
        let request = &mut HciRequest::new(OGF_HOST_CTL, OCF_RESET);
        // Interrupt wait mode: nothing ingests, so the pending reset times out.
        assert_eq!(
            global_hci_send_request(&HCI_TRANSPORT, request),
            Err(crate::error::HciError::Timeout)
        );

        crate::setup_hci_transport!(
            MockBus::with_packets(&[RESET_COMPLETE]),
            TransportConfig::new()
        );
        assert_eq!(global_hci_send_request(&HCI_TRANSPORT, request), Ok(0));
    }

    fn notify_before_setup() {
        crate::notify_hci_transport!();
    }
}
