use pinocchio::{
    account_info::AccountInfo, instruction::Seed, program_error::ProgramError, pubkey::Pubkey,
    ProgramResult,
};

use crate::{LendingError, LendingMarket, ProgramAccount, SignerAccount, LENDING_MARKET_PREFIX};

pub struct SetLendingMarketOwnerAccounts<'a> {
    pub owner: &'a AccountInfo,
    pub lending_market: &'a AccountInfo,
}

impl<'a> TryFrom<&'a [AccountInfo]> for SetLendingMarketOwnerAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let [owner, lending_market] = accounts else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        SignerAccount::check(owner)?;
        ProgramAccount::check_lending_market(lending_market)?;

        Ok(Self {
            owner,
            lending_market,
        })
    }
}

pub struct SetLendingMarketOwnerInstructionData {
    pub new_owner: Pubkey,
}

impl TryFrom<&[u8]> for SetLendingMarketOwnerInstructionData {
    type Error = ProgramError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        let new_owner: Pubkey = data
            .try_into()
            .map_err(|_| ProgramError::InvalidInstructionData)?;

        Ok(Self { new_owner })
    }
}

pub struct SetLendingMarketOwner<'a> {
    pub accounts: SetLendingMarketOwnerAccounts<'a>,
    pub instruction_data: SetLendingMarketOwnerInstructionData,
}

impl<'a> TryFrom<(&[u8], &'a [AccountInfo])> for SetLendingMarketOwner<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&[u8], &'a [AccountInfo])) -> Result<Self, Self::Error> {
        let accounts = SetLendingMarketOwnerAccounts::try_from(accounts)?;
        let instruction_data = SetLendingMarketOwnerInstructionData::try_from(data)?;

        {
            let lending_market_data = accounts.lending_market.try_borrow_data()?;
            let lending_market = LendingMarket::load(&lending_market_data)?;

            ProgramAccount::verify(
                &[
                    Seed::from(LENDING_MARKET_PREFIX),
                    Seed::from(lending_market.vote_account().as_ref()),
                ],
                accounts.lending_market,
                lending_market.bump_seed(),
            )?;

            if lending_market.owner() != accounts.owner.key() {
                return Err(LendingError::OwnerMismatch.into());
            }
        }

        Ok(Self {
            accounts,
            instruction_data,
        })
    }
}

impl<'a> SetLendingMarketOwner<'a> {
    pub const DISCRIMINATOR: &'a u8 = &2;

    pub fn process(&self) -> ProgramResult {
        let mut lending_market_data = self.accounts.lending_market.try_borrow_mut_data()?;
        let lending_market = LendingMarket::load_mut(&mut lending_market_data)?;

        lending_market.set_owner(self.instruction_data.new_owner);

        Ok(())
    }
}
