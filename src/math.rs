use pinocchio::program_error::ProgramError;

use crate::{LendingError, HALF_WAD, WAD};

/// Unsigned fixed point number scaled by [`WAD`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct FixedPrecision(pub u128);

impl FixedPrecision {
    pub const fn zero() -> Self {
        FixedPrecision(0)
    }

    pub const fn one() -> Self {
        FixedPrecision(WAD as u128)
    }

    /// Wrap an already scaled value
    pub const fn from_scaled(scaled: u128) -> Self {
        FixedPrecision(scaled)
    }

    pub fn from_integer(value: u64) -> Self {
        FixedPrecision(value as u128 * WAD as u128)
    }

    pub fn to_scaled(&self) -> u128 {
        self.0
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self, ProgramError> {
        self.0
            .checked_add(other.0)
            .map(FixedPrecision)
            .ok_or_else(|| ProgramError::from(LendingError::MathOverflow))
    }

    pub fn checked_sub(&self, other: &Self) -> Result<Self, ProgramError> {
        self.0
            .checked_sub(other.0)
            .map(FixedPrecision)
            .ok_or_else(|| ProgramError::from(LendingError::MathOverflow))
    }

    pub fn checked_mul(&self, other: &Self) -> Result<Self, ProgramError> {
        self.0
            .checked_mul(other.0)
            .and_then(|r| r.checked_div(WAD as u128))
            .map(FixedPrecision)
            .ok_or_else(|| ProgramError::from(LendingError::MathOverflow))
    }

    pub fn checked_div(&self, other: &Self) -> Result<Self, ProgramError> {
        if other.0 == 0 {
            return Err(LendingError::DivideByZero.into());
        }
        self.0
            .checked_mul(WAD as u128)
            .and_then(|r| r.checked_div(other.0))
            .map(FixedPrecision)
            .ok_or_else(|| ProgramError::from(LendingError::MathOverflow))
    }

    /// Round half up to the nearest integer
    pub fn round_u64(&self) -> Result<u64, ProgramError> {
        let rounded = self
            .0
            .checked_add(HALF_WAD as u128)
            .ok_or(LendingError::MathOverflow)?
            / WAD as u128;
        u64::try_from(rounded).map_err(|_| ProgramError::from(LendingError::MathOverflow))
    }
}
