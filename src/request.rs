//! Command requests and response correlation.
//!
//! A request names the command to send, the parameters to send with it, the
//! event that answers it and where to copy the answer. Completion and status
//! events are correlated by opcode; meta-events by sub-event selector.

use crate::consts::{EVT_CMD_COMPLETE_SIZE, EVT_LE_META_EVENT_SIZE};
use crate::error::HciError;
use crate::opcode::Opcode;
use crate::packet::{EVENT_PAYLOAD_OFFSET, EventKind, EventPacket};

/// The event that completes a request.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ExpectedEvent {
    /// A Command Complete echoing the request's opcode. The response is the
    /// return parameters after the completion header.
    #[default]
    CommandComplete,
    /// A Command Status echoing the request's opcode. The response is the
    /// whole status payload: status, command count and opcode.
    CommandStatus,
    /// An LE meta-event with this sub-event selector, whatever the opcode.
    /// The response is the payload after the selector.
    LeMeta(u8),
}

/// A command to send and the response it expects.
///
/// # Example
///
/// ```rust
/// use hci_tl::consts::{OCF_READ_BD_ADDR, OGF_INFO_PARAM};
/// use hci_tl::request::{ExpectedEvent, HciRequest};
///
/// let mut rp = [0u8; 7];
/// let request = HciRequest::new(OGF_INFO_PARAM, OCF_READ_BD_ADDR)
///     .expect(ExpectedEvent::CommandComplete)
///     .response(&mut rp)
///     .timeout(500);
/// assert_eq!(request.response_capacity(), 7);
/// ```
#[derive(Debug)]
pub struct HciRequest<'a> {
    opcode: Opcode,
    params: &'a [u8],
    event: ExpectedEvent,
    response: &'a mut [u8],
    timeout: Option<u32>,
}

impl<'a> HciRequest<'a> {
    /// A request for command `ocf` of group `ogf`, with no parameters and no response buffer.
    pub fn new(ogf: u16, ocf: u16) -> Self {
        Self {
            opcode: Opcode::new(ogf, ocf),
            params: &[],
            event: ExpectedEvent::CommandComplete,
            response: &mut [],
            timeout: None,
        }
    }

    /// Sets the outbound parameter bytes.
    pub fn params(mut self, params: &'a [u8]) -> Self {
        self.params = params;
        self
    }

    /// Sets the event that completes the request.
    pub fn expect(mut self, event: ExpectedEvent) -> Self {
        self.event = event;
        self
    }

    /// Sets the buffer the response is copied into. Longer responses are truncated.
    pub fn response(mut self, buf: &'a mut [u8]) -> Self {
        self.response = buf;
        self
    }

    /// Overrides the transport's default timeout, in bus ticks.
    pub fn timeout(mut self, ticks: u32) -> Self {
        self.timeout = Some(ticks);
        self
    }

    /// The packed opcode.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// The outbound parameters.
    pub fn cparams(&self) -> &[u8] {
        self.params
    }

    /// The expected event.
    pub fn event(&self) -> ExpectedEvent {
        self.event
    }

    /// Capacity of the response buffer.
    pub fn response_capacity(&self) -> usize {
        self.response.len()
    }

    /// The response buffer.
    pub fn response_buf(&self) -> &[u8] {
        &self.response[..]
    }

    pub(crate) fn response_mut(&mut self) -> &mut [u8] {
        &mut self.response[..]
    }

    pub(crate) fn timeout_override(&self) -> Option<u32> {
        self.timeout
    }
}

/// State of a command that has been sent and is awaiting its response.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct PendingRequest {
    opcode: Opcode,
    event: ExpectedEvent,
    start: u32,
    timeout: u32,
}

/// What to do with a packet taken from the ready queue while a request waits.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub(crate) enum Verdict {
    /// The packet answers the request; copy from this offset.
    Matched(usize),
    /// The packet ends the request with an error.
    Failed(HciError),
    /// The packet belongs to the request but does not end it.
    Discard,
    /// The packet is for someone else.
    Unrelated,
}

impl PendingRequest {
    pub(crate) fn new(opcode: Opcode, event: ExpectedEvent, start: u32, timeout: u32) -> Self {
        Self {
            opcode,
            event,
            start,
            timeout,
        }
    }

    /// Opcode of the command that was sent.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Tick at which the command was sent.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Whether more than the timeout has elapsed at tick `now`.
    pub fn expired(&self, now: u32) -> bool {
        now.wrapping_sub(self.start) > self.timeout
    }

    pub(crate) fn classify(&self, packet: &[u8]) -> Verdict {
        let Ok(event) = EventPacket::parse(packet) else {
            return Verdict::Unrelated;
        };
        match event.kind() {
            EventKind::CommandStatus { status, opcode, .. } => {
                if opcode != self.opcode {
                    Verdict::Failed(self.mismatch(opcode))
                } else if self.event == ExpectedEvent::CommandStatus {
                    Verdict::Matched(EVENT_PAYLOAD_OFFSET)
                } else if status != 0 {
                    Verdict::Failed(HciError::StatusError(status))
                } else {
                    Verdict::Discard
                }
            }
            EventKind::CommandComplete { opcode, .. } => {
                if opcode != self.opcode {
                    Verdict::Failed(self.mismatch(opcode))
                } else {
                    Verdict::Matched(EVENT_PAYLOAD_OFFSET + EVT_CMD_COMPLETE_SIZE)
                }
            }
            EventKind::LeMeta { subevent, .. } if self.event == ExpectedEvent::LeMeta(subevent) => {
                Verdict::Matched(EVENT_PAYLOAD_OFFSET + EVT_LE_META_EVENT_SIZE)
            }
            EventKind::HardwareError { code } => Verdict::Failed(HciError::HardwareError(code)),
            EventKind::LeMeta { .. } | EventKind::Other { .. } => Verdict::Unrelated,
        }
    }

    fn mismatch(&self, received: Opcode) -> HciError {
        HciError::OpcodeMismatch {
            expected: self.opcode.raw(),
            received: received.raw(),
        }
    }
}
