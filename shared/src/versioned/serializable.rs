use lockstep_serde::{BitReader, BitWrite, Serde, SerdeErr};

use super::{dirty_layout::DirtyLayout, dirty_mask::DirtyMask, dirty_tracker::DirtyTracker};

/// Layout of the fields every versioned object carries
pub const OBJECT_LAYOUT: DirtyLayout = DirtyLayout::root("Object", 1);
pub const DIRTY_NAME: DirtyMask = OBJECT_LAYOUT.bit(0);

/// State that can be replicated field by field.
///
/// `serialize` writes exactly the fields whose bits are set in `dirty`, base
/// fields first, and `deserialize` reads them back in the same order, leaving
/// every other field of the receiver untouched.
pub trait Serializable: Send + Sync + 'static {
    /// Bit allocation of this type, extending its parent's layout
    const LAYOUT: DirtyLayout;

    fn dirty_tracker(&self) -> &DirtyTracker;

    fn serialize(&self, writer: &mut dyn BitWrite, dirty: DirtyMask);

    fn deserialize(&mut self, reader: &mut BitReader, dirty: DirtyMask) -> Result<(), SerdeErr>;

    fn set_dirty(&self, bits: DirtyMask) {
        self.dirty_tracker().set(bits);
    }

    fn is_dirty(&self) -> bool {
        !self.dirty_tracker().is_clear()
    }
}

/// Base fields shared by all versioned objects
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectBase {
    name: String,
}

impl ObjectBase {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str, tracker: &DirtyTracker) {
        if self.name == name {
            return;
        }
        self.name = name.to_string();
        tracker.set(DIRTY_NAME);
    }

    pub fn serialize(&self, writer: &mut dyn BitWrite, dirty: DirtyMask) {
        if dirty.contains(DIRTY_NAME) {
            self.name.ser(writer);
        }
    }

    pub fn deserialize(&mut self, reader: &mut BitReader, dirty: DirtyMask) -> Result<(), SerdeErr> {
        if dirty.contains(DIRTY_NAME) {
            self.name = String::de(reader)?;
        }
        Ok(())
    }
}
