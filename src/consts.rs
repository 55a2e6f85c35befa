//! Constants used across the HCI transport implementation.
//!
//! This module defines the packet type markers, header layouts, event codes and
//! command group/code values shared by the packet codec, the request engine
//! and the typed command helpers.
//!
//! ## Key Concepts
//!
//! - **Packet types**: The first byte of every packet on the link identifies its kind.
//!   Only event packets are accepted at the ingress boundary.
//! - **Headers**: Command packets carry a 3-byte header (opcode + parameter length),
//!   event packets a 2-byte header (event code + payload length), both after the type byte.
//! - **Opcodes**: A command group (OGF) in the 6 high bits and a command code (OCF)
//!   in the 10 low bits of a little-endian `u16`.
//! - **Arena sizing**: Default buffer count, buffer size and request timeout.

/// Packet type marker for an HCI command packet (host to controller).
pub const HCI_COMMAND_PKT: u8 = 0x01;
/// Packet type marker for an ACL data packet.
pub const HCI_ACLDATA_PKT: u8 = 0x02;
/// Packet type marker for an SCO data packet.
pub const HCI_SCODATA_PKT: u8 = 0x03;
/// Packet type marker for an HCI event packet (controller to host).
pub const HCI_EVENT_PKT: u8 = 0x04;
/// Packet type marker for vendor-specific packets.
pub const HCI_VENDOR_PKT: u8 = 0xff;

/// Length (in bytes) of the packet type marker.
pub const HCI_TYPE_SIZE: usize = 1;
/// Length (in bytes) of a command header: 2-byte opcode + 1-byte parameter length.
pub const HCI_COMMAND_HDR_SIZE: usize = 3;
/// Length (in bytes) of an event header: 1-byte event code + 1-byte payload length.
pub const HCI_EVENT_HDR_SIZE: usize = 2;
/// Offset of the declared payload length inside an event packet (type byte included).
pub const HCI_EVENT_LEN_OFFSET: usize = 2;

/// Largest parameter block carried by a single command.
pub const HCI_MAX_PAYLOAD_SIZE: usize = 128;
/// Largest complete command packet, type marker and header included.
pub const HCI_MAX_COMMAND_SIZE: usize = HCI_TYPE_SIZE + HCI_COMMAND_HDR_SIZE + HCI_MAX_PAYLOAD_SIZE;

/// Default number of receive buffers in the arena.
///
/// Raise it to cope with crowded radio environments or bursts of
/// notifications from peers.
pub const HCI_READ_PACKET_NUM_MAX: usize = 5;
/// Default capacity (in bytes) of a single receive buffer.
pub const HCI_READ_PACKET_SIZE: usize = 128;
/// Default request timeout, in milliseconds.
pub const HCI_DEFAULT_TIMEOUT_MS: u32 = 1_000;

/// "Command Complete" event code.
pub const EVT_CMD_COMPLETE: u8 = 0x0e;
/// Size of the fixed Command Complete header: command count + echoed opcode.
pub const EVT_CMD_COMPLETE_SIZE: usize = 3;
/// "Command Status" event code.
pub const EVT_CMD_STATUS: u8 = 0x0f;
/// Size of a Command Status payload: status + command count + echoed opcode.
pub const EVT_CMD_STATUS_SIZE: usize = 4;
/// "Hardware Error" event code.
pub const EVT_HARDWARE_ERROR: u8 = 0x10;
/// "LE Meta" event code; the first payload byte selects the sub-event.
pub const EVT_LE_META_EVENT: u8 = 0x3e;
/// Size of the meta-event header: the sub-event selector.
pub const EVT_LE_META_EVENT_SIZE: usize = 1;
/// "Disconnection Complete" event code.
pub const EVT_DISCONN_COMPLETE: u8 = 0x05;
/// Vendor-specific event code.
pub const EVT_VENDOR: u8 = 0xff;

/// LE sub-event: connection complete.
pub const EVT_LE_CONN_COMPLETE: u8 = 0x01;
/// LE sub-event: advertising report.
pub const EVT_LE_ADVERTISING_REPORT: u8 = 0x02;
/// LE sub-event: connection update complete.
pub const EVT_LE_CONN_UPDATE_COMPLETE: u8 = 0x03;

/// Link control command group.
pub const OGF_LINK_CTL: u16 = 0x01;
/// Controller and baseband command group.
pub const OGF_HOST_CTL: u16 = 0x03;
/// Informational parameters command group.
pub const OGF_INFO_PARAM: u16 = 0x04;
/// Status parameters command group.
pub const OGF_STATUS_PARAM: u16 = 0x05;
/// LE controller command group.
pub const OGF_LE_CTL: u16 = 0x08;
/// Vendor-specific command group.
pub const OGF_VENDOR_CMD: u16 = 0x3f;

/// `OGF_HOST_CTL`: reset the controller.
pub const OCF_RESET: u16 = 0x0003;
/// `OGF_INFO_PARAM`: read local version information.
pub const OCF_READ_LOCAL_VERSION: u16 = 0x0001;
/// `OGF_INFO_PARAM`: read the public device address.
pub const OCF_READ_BD_ADDR: u16 = 0x0009;
/// `OGF_VENDOR_CMD`: read the firmware build number.
pub const OCF_HAL_GET_FW_BUILD_NUMBER: u16 = 0x0000;
/// `OGF_VENDOR_CMD`: write a configuration data block.
pub const OCF_HAL_WRITE_CONFIG_DATA: u16 = 0x000c;
/// `OGF_VENDOR_CMD`: read a configuration data block.
pub const OCF_HAL_READ_CONFIG_DATA: u16 = 0x000d;
/// `OGF_VENDOR_CMD`: set the radio output power.
pub const OCF_HAL_SET_TX_POWER_LEVEL: u16 = 0x000f;
/// `OGF_VENDOR_CMD`: put the controller in standby.
pub const OCF_HAL_DEVICE_STANDBY: u16 = 0x0013;
/// `OGF_VENDOR_CMD`: packets sent in the last direct TX test.
pub const OCF_HAL_LE_TX_TEST_PACKET_NUMBER: u16 = 0x0014;
/// `OGF_VENDOR_CMD`: start an unmodulated carrier.
pub const OCF_HAL_TONE_START: u16 = 0x0015;
/// `OGF_VENDOR_CMD`: stop the carrier.
pub const OCF_HAL_TONE_STOP: u16 = 0x0016;
/// `OGF_VENDOR_CMD`: state of every link slot.
pub const OCF_HAL_GET_LINK_STATUS: u16 = 0x0017;
/// `OGF_VENDOR_CMD`: current anchor period and largest free slot.
pub const OCF_HAL_GET_ANCHOR_PERIOD: u16 = 0x0019;

/// Return parameter size of "read local version".
pub const READ_LOCAL_VERSION_RP_SIZE: usize = 9;
/// Return parameter size of "read BD address".
pub const READ_BD_ADDR_RP_SIZE: usize = 7;
/// Return parameter size of "HAL LE TX test packet number".
pub const HAL_LE_TX_TEST_PACKET_NUMBER_RP_SIZE: usize = 5;
/// Return parameter size of "HAL get link status".
pub const HAL_GET_LINK_STATUS_RP_SIZE: usize = 1 + HAL_LINK_SLOTS * 3;
/// Return parameter size of "HAL get anchor period".
pub const HAL_GET_ANCHOR_PERIOD_RP_SIZE: usize = 9;
/// Number of link slots reported by "HAL get link status".
pub const HAL_LINK_SLOTS: usize = 8;
/// Length of a device address.
pub const BDADDR_SIZE: usize = 6;

/// Config data offset of the public address.
pub const CONFIG_DATA_PUBADDR_OFFSET: u8 = 0x00;
/// Config data length of the public address.
pub const CONFIG_DATA_PUBADDR_LEN: u8 = 6;
