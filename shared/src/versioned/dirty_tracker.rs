use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{dirty_mask::DirtyMask, error::DirtyError};

/// Dirty bits of one versioned object.
///
/// Setters on the issuing thread mark bits while the sending side takes
/// them, so the mask sits behind a lock shared by every clone of the
/// tracker.
#[derive(Clone, Default)]
pub struct DirtyTracker {
    mask: Arc<RwLock<DirtyMask>>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mask(&self) -> DirtyMask {
        *self.try_mask().expect("dirty mask lock poisoned")
    }

    pub fn is_clear(&self) -> bool {
        self.try_is_clear()
            .expect("dirty mask lock poisoned")
    }

    pub fn set(&self, bits: DirtyMask) {
        self.try_set(bits)
            .expect("dirty mask lock poisoned")
    }

    /// Returns the current bits and clears them
    pub fn take(&self) -> DirtyMask {
        self.try_take()
            .expect("dirty mask lock poisoned")
    }

    pub fn clear(&self) {
        self.try_clear()
            .expect("dirty mask lock poisoned")
    }

    // Try versions that return Result instead of panicking

    pub fn try_mask(&self) -> Result<RwLockReadGuard<'_, DirtyMask>, DirtyError> {
        self.mask
            .as_ref()
            .read()
            .map_err(|_| DirtyError::LockPoisoned)
    }

    pub fn try_mask_mut(&self) -> Result<RwLockWriteGuard<'_, DirtyMask>, DirtyError> {
        self.mask
            .as_ref()
            .write()
            .map_err(|_| DirtyError::LockPoisoned)
    }

    pub fn try_is_clear(&self) -> Result<bool, DirtyError> {
        Ok(self.try_mask()?.is_clear())
    }

    pub fn try_set(&self, bits: DirtyMask) -> Result<(), DirtyError> {
        let mut mask = self.try_mask_mut()?;
        mask.set(bits);
        Ok(())
    }

    pub fn try_take(&self) -> Result<DirtyMask, DirtyError> {
        let mut mask = self.try_mask_mut()?;
        let bits = *mask;
        mask.clear();
        Ok(bits)
    }

    pub fn try_clear(&self) -> Result<(), DirtyError> {
        self.try_mask_mut()?.clear();
        Ok(())
    }
}
