use {pinocchio::program_error::ProgramError, thiserror::Error};

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LendingError {
    #[error("Lamport balance below rent-exempt threshold")]
    NotRentExempt,
    #[error("Invalid Owner")]
    InvalidOwner,
    #[error("Invalid Account Data")]
    InvalidAccountData,
    #[error("Invalid Address")]
    InvalidAddress,
    #[error("Uninitialized Account")]
    UninitializedAccount,
    #[error("Invalid state discriminator")]
    InvalidDiscriminator,
    #[error("Math overflow")]
    MathOverflow,
    #[error("Divide by zero")]
    DivideByZero,
    #[error("Insufficient liquidity")]
    InsufficientLiquidity,
    #[error("Stake account is not delegated")]
    WrongStakeState,
    #[error("Reserve is stale and must be refreshed in the current slot")]
    ReserveStale,
    #[error("Amount provided cannot be zero")]
    InvalidAmount,
    #[error("Signer is not the owner of the lending market")]
    OwnerMismatch,
    #[error("Reserve does not belong to this lending market")]
    LendingMarketMismatch,
}

impl From<LendingError> for ProgramError {
    fn from(error: LendingError) -> Self {
        ProgramError::Custom(error as u32)
    }
}
