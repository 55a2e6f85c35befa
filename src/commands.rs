//! Typed command helpers built on [`HciTransport::send_request`].
//!
//! Each helper builds the command parameters, waits for the Command Complete
//! and decodes the return parameters. A non-zero status byte in the return
//! parameters becomes [`HciError::CommandFailed`]. Fields the controller did
//! not return read as zero.
//!
//! The `hal_*` helpers are vendor commands (OGF `0x3f`) of BlueNRG-class
//! controllers.

use heapless::Vec;

use crate::bus::HciBus;
use crate::consts::{
    BDADDR_SIZE, HAL_GET_ANCHOR_PERIOD_RP_SIZE, HAL_GET_LINK_STATUS_RP_SIZE,
    HAL_LE_TX_TEST_PACKET_NUMBER_RP_SIZE, HAL_LINK_SLOTS, HCI_MAX_PAYLOAD_SIZE,
    OCF_HAL_DEVICE_STANDBY, OCF_HAL_GET_ANCHOR_PERIOD, OCF_HAL_GET_FW_BUILD_NUMBER,
    OCF_HAL_GET_LINK_STATUS, OCF_HAL_LE_TX_TEST_PACKET_NUMBER, OCF_HAL_READ_CONFIG_DATA,
    OCF_HAL_SET_TX_POWER_LEVEL, OCF_HAL_TONE_START, OCF_HAL_TONE_STOP,
    OCF_HAL_WRITE_CONFIG_DATA, OCF_READ_BD_ADDR, OCF_READ_LOCAL_VERSION, OCF_RESET,
    OGF_HOST_CTL, OGF_INFO_PARAM, OGF_VENDOR_CMD, READ_BD_ADDR_RP_SIZE,
    READ_LOCAL_VERSION_RP_SIZE,
};
use crate::error::HciError;
use crate::request::HciRequest;
use crate::transport::HciTransport;

/// A public device address, least significant byte first.
pub type BdAddr = [u8; BDADDR_SIZE];

/// Controller version information.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct LocalVersion {
    /// HCI version.
    pub hci_version: u8,
    /// HCI revision.
    pub hci_revision: u16,
    /// LMP/PAL version.
    pub lmp_pal_version: u8,
    /// Company identifier of the manufacturer.
    pub manufacturer_name: u16,
    /// LMP/PAL subversion.
    pub lmp_pal_subversion: u16,
}

/// Per-slot state reported by [`hal_get_link_status`].
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct LinkStatus {
    /// Link state of each slot (`0` idle, otherwise advertising, connected, scanning...).
    pub state: [u8; HAL_LINK_SLOTS],
    /// Connection handle of each slot.
    pub conn_handle: [u16; HAL_LINK_SLOTS],
}

/// Timing reported by [`hal_get_anchor_period`], in 625 us slots.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct AnchorPeriod {
    /// Current anchor period.
    pub anchor_period: u32,
    /// Largest free slot in the period.
    pub max_free_slot: u32,
}

fn check_status(status: u8) -> Result<(), HciError> {
    match status {
        0 => Ok(()),
        code => Err(HciError::CommandFailed(code)),
    }
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

// Commands whose only return parameter is the status byte.
fn status_command<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
    ogf: u16,
    ocf: u16,
    params: &[u8],
) -> Result<(), HciError> {
    let mut rp = [0u8; 1];
    let mut request = HciRequest::new(ogf, ocf).params(params).response(&mut rp);
    let _ = hci.send_request(&mut request)?;
    check_status(rp[0])
}

/// Resets the controller.
pub fn reset<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
) -> Result<(), HciError> {
    status_command(hci, OGF_HOST_CTL, OCF_RESET, &[])
}

/// Reads the controller's version information.
pub fn read_local_version<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
) -> Result<LocalVersion, HciError> {
    let mut rp = [0u8; READ_LOCAL_VERSION_RP_SIZE];
    let mut request = HciRequest::new(OGF_INFO_PARAM, OCF_READ_LOCAL_VERSION).response(&mut rp);
    let _ = hci.send_request(&mut request)?;
    check_status(rp[0])?;
    Ok(LocalVersion {
        hci_version: rp[1],
        hci_revision: u16::from_le_bytes([rp[2], rp[3]]),
        lmp_pal_version: rp[4],
        manufacturer_name: u16::from_le_bytes([rp[5], rp[6]]),
        lmp_pal_subversion: u16::from_le_bytes([rp[7], rp[8]]),
    })
}

/// Reads the controller's public device address.
pub fn read_bd_addr<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
) -> Result<BdAddr, HciError> {
    let mut rp = [0u8; READ_BD_ADDR_RP_SIZE];
    let mut request = HciRequest::new(OGF_INFO_PARAM, OCF_READ_BD_ADDR).response(&mut rp);
    let _ = hci.send_request(&mut request)?;
    check_status(rp[0])?;
    let mut addr = BdAddr::default();
    addr.copy_from_slice(&rp[1..]);
    Ok(addr)
}

/// Reads the firmware build number.
pub fn hal_get_fw_build_number<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
) -> Result<u16, HciError> {
    let mut rp = [0u8; 3];
    let mut request =
        HciRequest::new(OGF_VENDOR_CMD, OCF_HAL_GET_FW_BUILD_NUMBER).response(&mut rp);
    let _ = hci.send_request(&mut request)?;
    check_status(rp[0])?;
    Ok(u16::from_le_bytes([rp[1], rp[2]]))
}

/// Writes `value` at `offset` in the controller's configuration data.
///
/// The public address (offset [`CONFIG_DATA_PUBADDR_OFFSET`](crate::consts::CONFIG_DATA_PUBADDR_OFFSET))
/// can only be written by the first command after a reset.
///
/// # Returns
/// - [`HciError::InvalidParameters`] if `value` does not fit a command payload
///   together with its offset and length bytes; nothing is sent
pub fn hal_write_config_data<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
    offset: u8,
    value: &[u8],
) -> Result<(), HciError> {
    let invalid = HciError::InvalidParameters(value.len() + 2);
    let len = u8::try_from(value.len()).map_err(|_| invalid)?;
    let mut params: Vec<u8, HCI_MAX_PAYLOAD_SIZE> = Vec::new();
    params.extend_from_slice(&[offset, len]).map_err(|_| invalid)?;
    params.extend_from_slice(value).map_err(|_| invalid)?;

    status_command(hci, OGF_VENDOR_CMD, OCF_HAL_WRITE_CONFIG_DATA, &params)
}

/// Reads configuration data at `offset` into `out`.
///
/// # Returns
/// - Number of bytes copied into `out`; longer values are truncated
pub fn hal_read_config_data<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
    offset: u8,
    out: &mut [u8],
) -> Result<usize, HciError> {
    let mut rp = [0u8; HCI_MAX_PAYLOAD_SIZE];
    let params = [offset];
    let mut request = HciRequest::new(OGF_VENDOR_CMD, OCF_HAL_READ_CONFIG_DATA)
        .params(&params)
        .response(&mut rp);
    let n = hci.send_request(&mut request)?;
    check_status(rp[0])?;

    let data = rp.get(1..n).unwrap_or_default();
    let copied = data.len().min(out.len());
    out[..copied].copy_from_slice(&data[..copied]);
    Ok(copied)
}

/// Sets the radio output power.
///
/// # Arguments
/// - `high_power`: selects the high-power amplifier mode
/// - `pa_level`: amplifier level, `0` (lowest) to `7` (highest)
pub fn hal_set_tx_power_level<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
    high_power: bool,
    pa_level: u8,
) -> Result<(), HciError> {
    let params = [u8::from(high_power), pa_level];
    status_command(hci, OGF_VENDOR_CMD, OCF_HAL_SET_TX_POWER_LEVEL, &params)
}

/// Reads how many packets the last direct TX test sent.
pub fn hal_le_tx_test_packet_number<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
) -> Result<u32, HciError> {
    let mut rp = [0u8; HAL_LE_TX_TEST_PACKET_NUMBER_RP_SIZE];
    let mut request =
        HciRequest::new(OGF_VENDOR_CMD, OCF_HAL_LE_TX_TEST_PACKET_NUMBER).response(&mut rp);
    let _ = hci.send_request(&mut request)?;
    check_status(rp[0])?;
    Ok(read_u32_le(&rp[1..]))
}

/// Puts the controller in standby. Any bus activity wakes it up.
pub fn hal_device_standby<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
) -> Result<(), HciError> {
    status_command(hci, OGF_VENDOR_CMD, OCF_HAL_DEVICE_STANDBY, &[])
}

/// Starts an unmodulated carrier on `rf_channel` (`0` to `39`).
pub fn hal_tone_start<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
    rf_channel: u8,
) -> Result<(), HciError> {
    status_command(hci, OGF_VENDOR_CMD, OCF_HAL_TONE_START, &[rf_channel])
}

/// Stops the carrier started by [`hal_tone_start`].
pub fn hal_tone_stop<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
) -> Result<(), HciError> {
    status_command(hci, OGF_VENDOR_CMD, OCF_HAL_TONE_STOP, &[])
}

/// Reads the state and connection handle of every link slot.
pub fn hal_get_link_status<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
) -> Result<LinkStatus, HciError> {
    let mut rp = [0u8; HAL_GET_LINK_STATUS_RP_SIZE];
    let mut request = HciRequest::new(OGF_VENDOR_CMD, OCF_HAL_GET_LINK_STATUS).response(&mut rp);
    let _ = hci.send_request(&mut request)?;
    check_status(rp[0])?;

    let mut status = LinkStatus::default();
    status.state.copy_from_slice(&rp[1..=HAL_LINK_SLOTS]);
    let handles = &rp[1 + HAL_LINK_SLOTS..];
    for (slot, pair) in status.conn_handle.iter_mut().zip(handles.chunks_exact(2)) {
        *slot = u16::from_le_bytes([pair[0], pair[1]]);
    }
    Ok(status)
}

/// Reads the current anchor period and the largest free slot.
pub fn hal_get_anchor_period<B: HciBus, const N: usize, const SIZE: usize>(
    hci: &mut HciTransport<B, N, SIZE>,
) -> Result<AnchorPeriod, HciError> {
    let mut rp = [0u8; HAL_GET_ANCHOR_PERIOD_RP_SIZE];
    let mut request =
        HciRequest::new(OGF_VENDOR_CMD, OCF_HAL_GET_ANCHOR_PERIOD).response(&mut rp);
    let _ = hci.send_request(&mut request)?;
    check_status(rp[0])?;
    Ok(AnchorPeriod {
        anchor_period: read_u32_le(&rp[1..5]),
        max_free_slot: read_u32_le(&rp[5..9]),
    })
}
