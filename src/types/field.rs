/// How a [`Field`] obtains its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldKind {
    /// Unused operand (e.g. the right side of an `AddSource` row).
    #[default]
    None,
    /// Memory read in the current frame.
    Memory,
    /// Memory read as of the previous frame.
    Delta,
    /// The last value the memory held before it most recently changed.
    Prior,
    /// Memory read decoded as binary-coded decimal.
    Bcd,
    /// Literal constant.
    Value,
}

/// Width of a memory read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldSize {
    Bit0,
    Bit1,
    Bit2,
    Bit3,
    Bit4,
    Bit5,
    Bit6,
    Bit7,
    LowNibble,
    HighNibble,
    #[default]
    Byte,
    Word,
    TByte,
    DWord,
    BigEndianWord,
    BigEndianTByte,
    BigEndianDWord,
    BitCount,
}

impl FieldSize {
    pub const ALL: [FieldSize; 18] = [
        FieldSize::Bit0,
        FieldSize::Bit1,
        FieldSize::Bit2,
        FieldSize::Bit3,
        FieldSize::Bit4,
        FieldSize::Bit5,
        FieldSize::Bit6,
        FieldSize::Bit7,
        FieldSize::LowNibble,
        FieldSize::HighNibble,
        FieldSize::Byte,
        FieldSize::Word,
        FieldSize::TByte,
        FieldSize::DWord,
        FieldSize::BigEndianWord,
        FieldSize::BigEndianTByte,
        FieldSize::BigEndianDWord,
        FieldSize::BitCount,
    ];

    /// Largest value a read of this size can produce.
    #[must_use]
    pub fn max_value(self) -> u32 {
        match self {
            FieldSize::Bit0
            | FieldSize::Bit1
            | FieldSize::Bit2
            | FieldSize::Bit3
            | FieldSize::Bit4
            | FieldSize::Bit5
            | FieldSize::Bit6
            | FieldSize::Bit7 => 1,
            FieldSize::LowNibble | FieldSize::HighNibble => 0x0F,
            FieldSize::Byte => 0xFF,
            FieldSize::Word | FieldSize::BigEndianWord => 0xFFFF,
            FieldSize::TByte | FieldSize::BigEndianTByte => 0x00FF_FFFF,
            FieldSize::DWord | FieldSize::BigEndianDWord => u32::MAX,
            FieldSize::BitCount => 8,
        }
    }

    /// Largest value a BCD-decoded read of this size can produce.
    #[must_use]
    pub fn max_bcd_value(self) -> u32 {
        match self {
            FieldSize::LowNibble | FieldSize::HighNibble => 9,
            FieldSize::Byte => 99,
            FieldSize::Word | FieldSize::BigEndianWord => 9_999,
            FieldSize::TByte | FieldSize::BigEndianTByte => 999_999,
            FieldSize::DWord | FieldSize::BigEndianDWord => 99_999_999,
            other => other.max_value(),
        }
    }

    /// Bit position for the single-bit sizes.
    #[must_use]
    pub fn bit_index(self) -> Option<u8> {
        match self {
            FieldSize::Bit0 => Some(0),
            FieldSize::Bit1 => Some(1),
            FieldSize::Bit2 => Some(2),
            FieldSize::Bit3 => Some(3),
            FieldSize::Bit4 => Some(4),
            FieldSize::Bit5 => Some(5),
            FieldSize::Bit6 => Some(6),
            FieldSize::Bit7 => Some(7),
            _ => None,
        }
    }

    #[must_use]
    pub fn bit(index: u8) -> Option<FieldSize> {
        FieldSize::ALL[..8].get(usize::from(index)).copied()
    }

    /// Script-side accessor name, e.g. `byte` or `bit3`.
    #[must_use]
    pub fn accessor_name(self) -> &'static str {
        match self {
            FieldSize::Bit0 => "bit0",
            FieldSize::Bit1 => "bit1",
            FieldSize::Bit2 => "bit2",
            FieldSize::Bit3 => "bit3",
            FieldSize::Bit4 => "bit4",
            FieldSize::Bit5 => "bit5",
            FieldSize::Bit6 => "bit6",
            FieldSize::Bit7 => "bit7",
            FieldSize::LowNibble => "low4",
            FieldSize::HighNibble => "high4",
            FieldSize::Byte => "byte",
            FieldSize::Word => "word",
            FieldSize::TByte => "tbyte",
            FieldSize::DWord => "dword",
            FieldSize::BigEndianWord => "word_be",
            FieldSize::BigEndianTByte => "tbyte_be",
            FieldSize::BigEndianDWord => "dword_be",
            FieldSize::BitCount => "bitcount",
        }
    }
}

/// One operand of a [`Requirement`](super::Requirement).
///
/// For memory kinds `value` is an address; for [`FieldKind::Value`] it is the
/// literal itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    pub kind: FieldKind,
    pub size: FieldSize,
    pub value: u32,
}

impl Field {
    #[must_use]
    pub fn memory(size: FieldSize, address: u32) -> Self {
        Self {
            kind: FieldKind::Memory,
            size,
            value: address,
        }
    }

    #[must_use]
    pub fn delta(size: FieldSize, address: u32) -> Self {
        Self {
            kind: FieldKind::Delta,
            size,
            value: address,
        }
    }

    #[must_use]
    pub fn prior(size: FieldSize, address: u32) -> Self {
        Self {
            kind: FieldKind::Prior,
            size,
            value: address,
        }
    }

    #[must_use]
    pub fn bcd(size: FieldSize, address: u32) -> Self {
        Self {
            kind: FieldKind::Bcd,
            size,
            value: address,
        }
    }

    /// A literal constant.
    #[must_use]
    pub fn value(value: u32) -> Self {
        Self {
            kind: FieldKind::Value,
            size: FieldSize::DWord,
            value,
        }
    }

    #[must_use]
    pub fn with_kind(self, kind: FieldKind) -> Self {
        Self { kind, ..self }
    }

    /// True for every kind that reads emulated memory.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Memory | FieldKind::Delta | FieldKind::Prior | FieldKind::Bcd
        )
    }

    #[must_use]
    pub fn is_value(&self) -> bool {
        self.kind == FieldKind::Value
    }

    /// Upper bound of the representable range `[0, max]`.
    #[must_use]
    pub fn max_value(&self) -> u32 {
        match self.kind {
            FieldKind::None => 0,
            FieldKind::Value => self.value,
            FieldKind::Bcd => self.size.max_bcd_value(),
            FieldKind::Memory | FieldKind::Delta | FieldKind::Prior => self.size.max_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_values_per_size() {
        assert_eq!(FieldSize::Bit5.max_value(), 1);
        assert_eq!(FieldSize::LowNibble.max_value(), 15);
        assert_eq!(FieldSize::Byte.max_value(), 255);
        assert_eq!(FieldSize::BigEndianWord.max_value(), 65_535);
        assert_eq!(FieldSize::TByte.max_value(), 0xFF_FFFF);
        assert_eq!(FieldSize::DWord.max_value(), u32::MAX);
        assert_eq!(FieldSize::BitCount.max_value(), 8);
    }

    #[test]
    fn bcd_range_is_decimal() {
        assert_eq!(Field::bcd(FieldSize::Byte, 0x10).max_value(), 99);
        assert_eq!(Field::bcd(FieldSize::Word, 0x10).max_value(), 9_999);
    }

    #[test]
    fn literal_max_is_itself() {
        assert_eq!(Field::value(42).max_value(), 42);
    }

    #[test]
    fn bit_lookup_round_trips() {
        for index in 0..8 {
            let size = FieldSize::bit(index).unwrap();
            assert_eq!(size.bit_index(), Some(index));
        }
        assert_eq!(FieldSize::bit(8), None);
        assert_eq!(FieldSize::Byte.bit_index(), None);
    }

    #[test]
    fn memory_kinds() {
        assert!(Field::memory(FieldSize::Byte, 1).is_memory());
        assert!(Field::delta(FieldSize::Byte, 1).is_memory());
        assert!(Field::prior(FieldSize::Byte, 1).is_memory());
        assert!(Field::bcd(FieldSize::Byte, 1).is_memory());
        assert!(!Field::value(1).is_memory());
        assert!(!Field::default().is_memory());
    }
}
