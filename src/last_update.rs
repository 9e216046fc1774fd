use pinocchio::program_error::ProgramError;

use crate::{LendingError, STALE_AFTER_SLOTS_ELAPSED};

/// Slot bookkeeping shared by accounts that must be refreshed before use.
#[repr(C, packed)]
#[derive(Clone, Copy, Default)]
pub struct LastUpdate {
    slot: u64,
    stale: u8,
}

impl LastUpdate {
    pub const LEN: usize = size_of::<u64>() + size_of::<u8>();

    /// Starts out stale, a refresh is required before the first action.
    pub fn new(slot: u64) -> Self {
        Self { slot, stale: 1 }
    }

    #[inline(always)]
    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn slots_elapsed(&self, slot: u64) -> Result<u64, ProgramError> {
        slot.checked_sub(self.slot)
            .ok_or_else(|| ProgramError::from(LendingError::MathOverflow))
    }

    pub fn update_slot(&mut self, slot: u64) {
        self.slot = slot;
        self.stale = 0;
    }

    pub fn mark_stale(&mut self) {
        self.stale = 1;
    }

    pub fn is_stale(&self, slot: u64) -> Result<bool, ProgramError> {
        Ok(self.stale != 0 || self.slots_elapsed(slot)? >= STALE_AFTER_SLOTS_ELAPSED)
    }
}
