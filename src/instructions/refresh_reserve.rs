use pinocchio::{
    account_info::AccountInfo,
    instruction::Seed,
    program_error::ProgramError,
    sysvars::{clock::Clock, Sysvar},
    ProgramResult,
};

use crate::{ProgramAccount, Reserve, SignerAccount, RESERVE_PREFIX};

pub struct RefreshReserveAccounts<'a> {
    pub payer: &'a AccountInfo,
    pub reserve: &'a AccountInfo,
}

impl<'a> TryFrom<&'a [AccountInfo]> for RefreshReserveAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let [payer, reserve] = accounts else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        SignerAccount::check(payer)?;
        ProgramAccount::check_reserve(reserve)?;

        Ok(Self { payer, reserve })
    }
}

pub struct RefreshReserve<'a> {
    pub accounts: RefreshReserveAccounts<'a>,
}

impl<'a> TryFrom<(&[u8], &'a [AccountInfo])> for RefreshReserve<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&[u8], &'a [AccountInfo])) -> Result<Self, Self::Error> {
        if !data.is_empty() {
            return Err(ProgramError::InvalidInstructionData);
        }

        let accounts = RefreshReserveAccounts::try_from(accounts)?;

        {
            let reserve_data = accounts.reserve.try_borrow_data()?;
            let reserve = Reserve::load(&reserve_data)?;

            ProgramAccount::verify(
                &[
                    Seed::from(RESERVE_PREFIX),
                    Seed::from(reserve.lending_market().as_ref()),
                ],
                accounts.reserve,
                reserve.bump(),
            )?;
        }

        Ok(Self { accounts })
    }
}

impl<'a> RefreshReserve<'a> {
    pub const DISCRIMINATOR: &'a u8 = &4;

    pub fn process(&self) -> ProgramResult {
        let slot = Clock::get()?.slot;

        let mut reserve_data = self.accounts.reserve.try_borrow_mut_data()?;
        let reserve = Reserve::load_mut(&mut reserve_data)?;

        reserve.last_update_mut().update_slot(slot);

        Ok(())
    }
}
