//! Error types surfaced by the transport.
//!
//! Nothing in this crate is fatal: ingestion reports problems through
//! [`IngestStatus`](crate::transport::IngestStatus) and requests through
//! [`HciError`]. [`PacketError`] describes why an inbound packet was refused.

use thiserror::Error;

/// Why an inbound packet failed validation or an outbound one could not be built.
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum PacketError {
    /// The leading type marker is not the event marker.
    #[error("unexpected packet type {0:#04x}")]
    WrongType(u8),
    /// Fewer bytes than a complete event header were read.
    #[error("packet truncated to {0} bytes")]
    Truncated(usize),
    /// The declared payload length disagrees with the bytes actually read.
    #[error("declared payload length {declared} but {actual} bytes follow the header")]
    LengthMismatch {
        /// Length field carried in the event header.
        declared: usize,
        /// Payload bytes actually present.
        actual: usize,
    },
    /// The command parameters do not fit in a single command packet.
    #[error("{0} parameter bytes exceed the command packet capacity")]
    TooLong(usize),
}

/// Failure of a command request.
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum HciError {
    /// No correlated response arrived within the timeout window.
    #[error("timed out waiting for the command response")]
    Timeout,
    /// A Command Status event for the pending opcode carried a non-zero status.
    #[error("command status reported error {0:#04x}")]
    StatusError(u8),
    /// The controller raised a hardware error event.
    #[error("controller hardware error {0:#04x}")]
    HardwareError(u8),
    /// A completion or status event echoed a different opcode than the one sent.
    #[error("response for opcode {received:#06x} while waiting for {expected:#06x}")]
    OpcodeMismatch {
        /// Opcode of the pending request.
        expected: u16,
        /// Opcode echoed by the controller.
        received: u16,
    },
    /// The command completed but its return parameters carry a non-zero status.
    #[error("command failed with status {0:#04x}")]
    CommandFailed(u8),
    /// The command parameters are too long to be sent.
    #[error("invalid command parameters ({0} bytes)")]
    InvalidParameters(usize),
    /// The shared transport has not been set up yet.
    #[error("transport not initialized")]
    NotInitialized,
}
