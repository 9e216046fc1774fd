use pinocchio::{account_info::AccountInfo, program_error::ProgramError, pubkey::Pubkey, ProgramResult};
use pinocchio_log::log;

pub mod constants;
pub mod error;
pub mod instructions;
pub mod last_update;
pub mod lending_market_state;
pub mod math;
pub mod reserve_state;
pub mod stake;

pub use constants::*;
pub use error::*;
pub use instructions::*;
pub use last_update::*;
pub use lending_market_state::*;
pub use math::*;
pub use reserve_state::*;
pub use stake::*;

pinocchio_pubkey::declare_id!("6CiDLjqtdxtbqC8oympZZdqxG2niyHaAUrmawGdoV16y");

#[cfg(not(feature = "no-entrypoint"))]
pinocchio::entrypoint!(process_instruction);

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    if program_id != &ID {
        return Err(ProgramError::IncorrectProgramId);
    }

    match instruction_data.split_first() {
        Some((Initialize::DISCRIMINATOR, data)) => {
            log!("Instruction: Initialize");
            Initialize::try_from((data, accounts))?.process()
        }
        Some((InitLendingMarket::DISCRIMINATOR, data)) => {
            log!("Instruction: InitLendingMarket");
            InitLendingMarket::try_from((data, accounts))?.process()
        }
        Some((SetLendingMarketOwner::DISCRIMINATOR, data)) => {
            log!("Instruction: SetLendingMarketOwner");
            SetLendingMarketOwner::try_from((data, accounts))?.process()
        }
        Some((InitReserve::DISCRIMINATOR, data)) => {
            log!("Instruction: InitReserve");
            InitReserve::try_from((data, accounts))?.process()
        }
        Some((RefreshReserve::DISCRIMINATOR, data)) => {
            log!("Instruction: RefreshReserve");
            RefreshReserve::try_from((data, accounts))?.process()
        }
        Some((RefreshEpoch::DISCRIMINATOR, data)) => {
            log!("Instruction: RefreshEpoch");
            RefreshEpoch::try_from((data, accounts))?.process()
        }
        Some((DepositReserveLiquidity::DISCRIMINATOR, data)) => {
            log!("Instruction: DepositReserveLiquidity");
            DepositReserveLiquidity::try_from((data, accounts))?.process()
        }
        Some((RedeemReserveLiquidity::DISCRIMINATOR, data)) => {
            log!("Instruction: RedeemReserveLiquidity");
            RedeemReserveLiquidity::try_from((data, accounts))?.process()
        }
        _ => Err(ProgramError::InvalidInstructionData),
    }
}
