//! Command opcode packing.
//!
//! An opcode is carried on the wire as a little-endian `u16` with the command
//! group (OGF) in the 6 high bits and the command code (OCF) in the 10 low bits.

const OCF_MASK: u16 = 0x03ff;
const OGF_MASK: u16 = 0x3f;
const OGF_SHIFT: u16 = 10;

/// A packed (group, code) command identifier.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Opcode(u16);

impl Opcode {
    /// Packs a command group and command code into an opcode.
    ///
    /// Bits beyond the 6-bit group and 10-bit code are discarded.
    pub const fn new(ogf: u16, ocf: u16) -> Self {
        Self(((ogf & OGF_MASK) << OGF_SHIFT) | (ocf & OCF_MASK))
    }

    /// Wraps an already packed opcode.
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Reads an opcode from its two little-endian wire bytes.
    pub const fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_le_bytes(bytes))
    }

    /// The packed value.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// The command group field.
    pub const fn ogf(self) -> u16 {
        self.0 >> OGF_SHIFT
    }

    /// The command code field.
    pub const fn ocf(self) -> u16 {
        self.0 & OCF_MASK
    }

    /// The little-endian wire representation.
    pub const fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}

impl From<Opcode> for u16 {
    fn from(op: Opcode) -> u16 {
        op.0
    }
}
