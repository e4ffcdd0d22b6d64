use std::{fmt, ops::BitOr};

use lockstep_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr};

/// Set of changed fields of a versioned object, one bit per field
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct DirtyMask(u64);

impl DirtyMask {
    pub const NONE: DirtyMask = DirtyMask(0);
    pub const ALL: DirtyMask = DirtyMask(u64::MAX);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u64 {
        self.0
    }

    pub const fn is_clear(&self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `other` is set in this mask
    pub const fn contains(&self, other: DirtyMask) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub const fn intersects(&self, other: DirtyMask) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: DirtyMask) -> DirtyMask {
        DirtyMask(self.0 | other.0)
    }

    pub const fn without(self, other: DirtyMask) -> DirtyMask {
        DirtyMask(self.0 & !other.0)
    }

    pub fn set(&mut self, other: DirtyMask) {
        self.0 |= other.0;
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

impl BitOr for DirtyMask {
    type Output = DirtyMask;

    fn bitor(self, rhs: DirtyMask) -> DirtyMask {
        self.union(rhs)
    }
}

impl fmt::Debug for DirtyMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirtyMask({:#b})", self.0)
    }
}

impl Serde for DirtyMask {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(DirtyMask(u64::de(reader)?))
    }

    fn bit_length(&self) -> u32 {
        <Self as ConstBitLength>::const_bit_length()
    }
}

impl ConstBitLength for DirtyMask {
    fn const_bit_length() -> u32 {
        64
    }
}

#[cfg(test)]
mod tests {
    use super::DirtyMask;

    #[test]
    fn contains_requires_every_bit() {
        let mask = DirtyMask::from_bits(0b0110);
        assert!(mask.contains(DirtyMask::from_bits(0b0010)));
        assert!(mask.contains(DirtyMask::from_bits(0b0110)));
        assert!(!mask.contains(DirtyMask::from_bits(0b0011)));
        assert!(!mask.contains(DirtyMask::NONE));
        assert!(mask.intersects(DirtyMask::from_bits(0b0011)));
    }

    #[test]
    fn set_and_clear() {
        let mut mask = DirtyMask::NONE;
        mask.set(DirtyMask::from_bits(0b100));
        mask.set(DirtyMask::from_bits(0b001));
        assert_eq!(mask.bits(), 0b101);
        assert_eq!(mask.without(DirtyMask::from_bits(0b100)).bits(), 0b001);
        mask.clear();
        assert!(mask.is_clear());
    }
}
