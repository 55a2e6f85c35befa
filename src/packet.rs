//! Wire packet encoding, parsing and validation.
//!
//! Command packet (host to controller):
//!
//! ```text
//! | 0x01 | opcode lo | opcode hi | plen | params[plen] |
//! ```
//!
//! Event packet (controller to host):
//!
//! ```text
//! | 0x04 | event code | plen | payload[plen] |
//! ```
//!
//! ## Functions
//!
//! - [`encode_command`]: Builds a command packet into a fixed-capacity buffer
//! - [`verify_event_packet`]: The ingress check applied to every received packet
//! - [`EventPacket::parse`]: A borrowed view over a validated event packet
//!
//! ## Event payload shapes
//!
//! - Command Complete: `| num_packets | opcode (2) | return parameters... |`
//! - Command Status: `| status | num_packets | opcode (2) |`
//! - LE Meta: `| subevent | subevent payload... |`
//! - Hardware Error: `| code |`

use heapless::Vec;

use crate::consts::{
    EVT_CMD_COMPLETE, EVT_CMD_COMPLETE_SIZE, EVT_CMD_STATUS, EVT_CMD_STATUS_SIZE,
    EVT_HARDWARE_ERROR, EVT_LE_META_EVENT, EVT_LE_META_EVENT_SIZE, HCI_COMMAND_PKT,
    HCI_EVENT_HDR_SIZE, HCI_EVENT_LEN_OFFSET, HCI_EVENT_PKT, HCI_MAX_COMMAND_SIZE,
    HCI_MAX_PAYLOAD_SIZE, HCI_TYPE_SIZE,
};
use crate::error::PacketError;
use crate::opcode::Opcode;

/// A fully assembled command packet.
pub type CommandPacket = Vec<u8, HCI_MAX_COMMAND_SIZE>;

/// Offset of the first payload byte in an event packet.
pub const EVENT_PAYLOAD_OFFSET: usize = HCI_TYPE_SIZE + HCI_EVENT_HDR_SIZE;

/// Builds a command packet for `opcode` carrying `params`.
///
/// # Returns
/// - The packet, type marker first, ready to hand to the bus
/// - [`PacketError::TooLong`] if the parameters do not fit the one-byte length
///   field or the maximum command payload
pub fn encode_command(opcode: Opcode, params: &[u8]) -> Result<CommandPacket, PacketError> {
    let plen = u8::try_from(params.len()).map_err(|_| PacketError::TooLong(params.len()))?;
    if params.len() > HCI_MAX_PAYLOAD_SIZE {
        return Err(PacketError::TooLong(params.len()));
    }

    let [lo, hi] = opcode.to_le_bytes();
    let mut packet = CommandPacket::new();
    packet
        .extend_from_slice(&[HCI_COMMAND_PKT, lo, hi, plen])
        .map_err(|_| PacketError::TooLong(params.len()))?;
    packet
        .extend_from_slice(params)
        .map_err(|_| PacketError::TooLong(params.len()))?;
    Ok(packet)
}

/// Validates a freshly received packet.
///
/// A packet is accepted only if its type marker is [`HCI_EVENT_PKT`] and the
/// declared payload length equals the number of bytes read minus the
/// type marker and event header.
pub fn verify_event_packet(bytes: &[u8]) -> Result<(), PacketError> {
    match bytes.first() {
        None => return Err(PacketError::Truncated(0)),
        Some(&kind) if kind != HCI_EVENT_PKT => return Err(PacketError::WrongType(kind)),
        Some(_) => {}
    }
    if bytes.len() < EVENT_PAYLOAD_OFFSET {
        return Err(PacketError::Truncated(bytes.len()));
    }

    let declared = bytes[HCI_EVENT_LEN_OFFSET] as usize;
    let actual = bytes.len() - EVENT_PAYLOAD_OFFSET;
    if declared != actual {
        return Err(PacketError::LengthMismatch { declared, actual });
    }
    Ok(())
}

/// Decoded shape of an event payload.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum EventKind<'a> {
    /// A command finished; `return_params` follows the fixed completion header.
    CommandComplete {
        /// Number of commands the controller can accept.
        num_packets: u8,
        /// Opcode of the completed command.
        opcode: Opcode,
        /// Command-specific return parameters.
        return_params: &'a [u8],
    },
    /// A command was accepted (or refused) and may complete later.
    CommandStatus {
        /// Zero on success.
        status: u8,
        /// Number of commands the controller can accept.
        num_packets: u8,
        /// Opcode of the command.
        opcode: Opcode,
    },
    /// An LE meta-event addressed by sub-event rather than opcode.
    LeMeta {
        /// Sub-event selector.
        subevent: u8,
        /// Sub-event payload.
        data: &'a [u8],
    },
    /// The controller hit an unrecoverable hardware error.
    HardwareError {
        /// Vendor-specific error code.
        code: u8,
    },
    /// Any other event, or a known event too short to decode.
    Other {
        /// Event code.
        code: u8,
        /// Raw payload.
        payload: &'a [u8],
    },
}

/// A borrowed view over a validated event packet.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct EventPacket<'a> {
    code: u8,
    payload: &'a [u8],
}

impl<'a> EventPacket<'a> {
    /// Validates `bytes` (see [`verify_event_packet`]) and wraps them.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, PacketError> {
        verify_event_packet(bytes)?;
        Ok(Self {
            code: bytes[HCI_TYPE_SIZE],
            payload: &bytes[EVENT_PAYLOAD_OFFSET..],
        })
    }

    /// The event code.
    pub fn code(&self) -> u8 {
        self.code
    }

    /// Payload bytes following the event header.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Decodes the payload according to the event code.
    pub fn kind(&self) -> EventKind<'a> {
        let p = self.payload;
        match self.code {
            EVT_CMD_COMPLETE if p.len() >= EVT_CMD_COMPLETE_SIZE => EventKind::CommandComplete {
                num_packets: p[0],
                opcode: Opcode::from_le_bytes([p[1], p[2]]),
                return_params: &p[EVT_CMD_COMPLETE_SIZE..],
            },
            EVT_CMD_STATUS if p.len() >= EVT_CMD_STATUS_SIZE => EventKind::CommandStatus {
                status: p[0],
                num_packets: p[1],
                opcode: Opcode::from_le_bytes([p[2], p[3]]),
            },
            EVT_LE_META_EVENT if p.len() >= EVT_LE_META_EVENT_SIZE => EventKind::LeMeta {
                subevent: p[0],
                data: &p[EVT_LE_META_EVENT_SIZE..],
            },
            EVT_HARDWARE_ERROR if !p.is_empty() => EventKind::HardwareError { code: p[0] },
            code => EventKind::Other { code, payload: p },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{EVT_DISCONN_COMPLETE, HCI_ACLDATA_PKT, OCF_RESET, OGF_HOST_CTL};

    #[test]
    fn test_encode_command_without_params() {
        let packet = encode_command(Opcode::new(OGF_HOST_CTL, OCF_RESET), &[]).unwrap();
        assert_eq!(packet.as_slice(), &[0x01, 0x03, 0x0c, 0x00]);
    }

    #[test]
    fn test_encode_command_with_params() {
        let packet = encode_command(Opcode::new(0x3f, 0x000c), &[0x00, 0x02, 0xaa, 0xbb]).unwrap();
        assert_eq!(
            packet.as_slice(),
            &[0x01, 0x0c, 0xfc, 0x04, 0x00, 0x02, 0xaa, 0xbb]
        );
    }

    #[test]
    fn test_encode_rejects_oversized_params() {
        let params = [0u8; HCI_MAX_PAYLOAD_SIZE + 1];
        assert_eq!(
            encode_command(Opcode::new(0x08, 0x0008), &params),
            Err(PacketError::TooLong(HCI_MAX_PAYLOAD_SIZE + 1))
        );
    }

    #[test]
    fn test_verify_accepts_exact_length() {
        assert_eq!(verify_event_packet(&[0x04, 0x05, 0x04, 0, 1, 0, 0x13]), Ok(()));
        assert_eq!(verify_event_packet(&[0x04, 0x10, 0x00]), Ok(()));
    }

    #[test]
    fn test_verify_rejects_non_event_marker() {
        assert_eq!(
            verify_event_packet(&[HCI_ACLDATA_PKT, 0x01, 0x00, 0x00]),
            Err(PacketError::WrongType(HCI_ACLDATA_PKT))
        );
    }

    #[test]
    fn test_verify_rejects_length_mismatch() {
        assert_eq!(
            verify_event_packet(&[0x04, 0x0e, 0x05, 0x01, 0x03, 0x0c]),
            Err(PacketError::LengthMismatch {
                declared: 5,
                actual: 3
            })
        );
        assert_eq!(
            verify_event_packet(&[0x04, 0x0e, 0x01, 0x01, 0x03, 0x0c]),
            Err(PacketError::LengthMismatch {
                declared: 1,
                actual: 3
            })
        );
    }

    #[test]
    fn test_verify_rejects_truncated_header() {
        assert_eq!(verify_event_packet(&[]), Err(PacketError::Truncated(0)));
        assert_eq!(
            verify_event_packet(&[0x04, 0x0e]),
            Err(PacketError::Truncated(2))
        );
    }

    #[test]
    fn test_parse_command_complete() {
        let bytes = [0x04, 0x0e, 0x05, 0x01, 0x03, 0x0c, 0x00, 0x7f];
        let event = EventPacket::parse(&bytes).unwrap();
        assert_eq!(event.code(), EVT_CMD_COMPLETE);
        assert_eq!(
            event.kind(),
            EventKind::CommandComplete {
                num_packets: 1,
                opcode: Opcode::new(OGF_HOST_CTL, OCF_RESET),
                return_params: &[0x00, 0x7f],
            }
        );
    }

    #[test]
    fn test_parse_command_status_and_meta() {
        let status = [0x04, 0x0f, 0x04, 0x0c, 0x01, 0x0d, 0x20];
        assert_eq!(
            EventPacket::parse(&status).unwrap().kind(),
            EventKind::CommandStatus {
                status: 0x0c,
                num_packets: 1,
                opcode: Opcode::new(0x08, 0x000d),
            }
        );

        let meta = [0x04, 0x3e, 0x03, 0x01, 0xaa, 0xbb];
        assert_eq!(
            EventPacket::parse(&meta).unwrap().kind(),
            EventKind::LeMeta {
                subevent: 0x01,
                data: &[0xaa, 0xbb],
            }
        );
    }

    #[test]
    fn test_short_known_event_decodes_as_other() {
        let bytes = [0x04, 0x0e, 0x01, 0x01];
        assert_eq!(
            EventPacket::parse(&bytes).unwrap().kind(),
            EventKind::Other {
                code: EVT_CMD_COMPLETE,
                payload: &[0x01],
            }
        );

        let disconnect = [0x04, EVT_DISCONN_COMPLETE, 0x01, 0x00];
        assert!(matches!(
            EventPacket::parse(&disconnect).unwrap().kind(),
            EventKind::Other { code: EVT_DISCONN_COMPLETE, .. }
        ));
    }
}
