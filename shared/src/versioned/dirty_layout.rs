use super::{dirty_mask::DirtyMask, error::DirtyError};

/// Bit allocation table of one versioned object type.
///
/// A root layout owns the lowest bits; a subtype layout is built with
/// `extend` and receives the next free bits after its parent, so two levels
/// of the same chain can never hand out the same bit. Layouts are `const`:
/// running out of the 64 available bits, or asking for a bit the layout does
/// not own, fails const evaluation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DirtyLayout {
    name: &'static str,
    first: u8,
    count: u8,
}

impl DirtyLayout {
    pub const fn root(name: &'static str, count: u8) -> Self {
        assert!(count <= 64, "dirty layout needs more than 64 bits");
        Self {
            name,
            first: 0,
            count,
        }
    }

    pub const fn extend(&self, name: &'static str, count: u8) -> Self {
        let first = self.end();
        assert!(
            first as u32 + count as u32 <= 64,
            "dirty layout needs more than 64 bits"
        );
        Self { name, first, count }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// One past the highest bit used by this layout and its parents
    pub const fn end(&self) -> u8 {
        self.first + self.count
    }

    /// The `index`-th bit allocated by this level of the layout
    pub const fn bit(&self, index: u8) -> DirtyMask {
        assert!(index < self.count, "dirty bit outside of its layout");
        DirtyMask::from_bits(1u64 << (self.first + index))
    }

    /// Bits allocated by this level only
    pub const fn own_bits(&self) -> DirtyMask {
        DirtyMask::from_bits(Self::low_bits(self.end()) & !Self::low_bits(self.first))
    }

    /// Bits allocated by this level and every parent level
    pub const fn all_bits(&self) -> DirtyMask {
        DirtyMask::from_bits(Self::low_bits(self.end()))
    }

    const fn low_bits(count: u8) -> u64 {
        if count >= 64 {
            u64::MAX
        } else {
            (1u64 << count) - 1
        }
    }

    /// Checks a layout again when its object is registered, for layouts that
    /// were assembled at runtime rather than in a const
    pub fn validate(&self) -> Result<(), DirtyError> {
        if self.name.is_empty() {
            return Err(DirtyError::UnnamedLayout);
        }
        if self.end() > 64 {
            return Err(DirtyError::LayoutOverflow {
                layout: self.name,
                bits: self.end(),
            });
        }
        Ok(())
    }

    /// Whether `mask` only names bits this layout knows about
    pub fn covers(&self, mask: DirtyMask) -> bool {
        mask.without(self.all_bits()).is_clear()
    }
}

#[cfg(test)]
mod tests {
    use super::DirtyLayout;

    const BASE: DirtyLayout = DirtyLayout::root("Base", 2);
    const CHILD: DirtyLayout = BASE.extend("Child", 3);
    const GRANDCHILD: DirtyLayout = CHILD.extend("Grandchild", 1);

    #[test]
    fn subtype_bits_follow_parent_bits() {
        assert_eq!(BASE.bit(0).bits(), 0b1);
        assert_eq!(BASE.bit(1).bits(), 0b10);
        assert_eq!(CHILD.bit(0).bits(), 0b100);
        assert_eq!(CHILD.bit(2).bits(), 0b10000);
        assert_eq!(GRANDCHILD.bit(0).bits(), 0b100000);
    }

    #[test]
    fn own_and_all_bits() {
        assert_eq!(CHILD.own_bits().bits(), 0b11100);
        assert_eq!(CHILD.all_bits().bits(), 0b11111);
        assert!(!CHILD.own_bits().intersects(BASE.all_bits()));
        assert!(CHILD.covers(BASE.bit(1) | CHILD.bit(2)));
        assert!(!CHILD.covers(GRANDCHILD.bit(0)));
    }

    #[test]
    fn full_width_layout() {
        let full = DirtyLayout::root("Full", 64);
        assert_eq!(full.all_bits().bits(), u64::MAX);
        assert!(full.validate().is_ok());
    }

    #[test]
    fn unnamed_layout_fails_validation() {
        assert!(DirtyLayout::root("", 1).validate().is_err());
    }
}
