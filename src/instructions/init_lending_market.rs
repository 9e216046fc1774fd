use pinocchio::{
    account_info::AccountInfo,
    instruction::{Seed, Signer},
    program_error::ProgramError,
    pubkey::Pubkey,
    sysvars::{rent::Rent, Sysvar},
    ProgramResult,
};
use pinocchio_log::log;

use crate::{
    minimum_delegation, DelegateStake, InitializeChecked, LendingError, LendingMarket,
    ProgramAccount, SignerAccount, LENDING_MARKET_AUTHORITY_PREFIX, LENDING_MARKET_PREFIX,
    LENDING_MARKET_STAKE_PREFIX, STAKE_ACCOUNT_LEN, STAKE_PROGRAM_ID, VOTE_PROGRAM_ID,
};

pub struct InitLendingMarketAccounts<'a> {
    pub admin: &'a AccountInfo,
    pub lending_market: &'a AccountInfo,
    pub lending_market_stake: &'a AccountInfo,
    pub lending_market_authority: &'a AccountInfo,
    pub vote_account: &'a AccountInfo,
    pub rent_sysvar: &'a AccountInfo,
    pub clock_sysvar: &'a AccountInfo,
    pub stake_history_sysvar: &'a AccountInfo,
    pub stake_config: &'a AccountInfo,
    pub stake_program: &'a AccountInfo,
    pub system_program: &'a AccountInfo,
}

impl<'a> TryFrom<&'a [AccountInfo]> for InitLendingMarketAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let [admin, lending_market, lending_market_stake, lending_market_authority, vote_account, rent_sysvar, clock_sysvar, stake_history_sysvar, stake_config, stake_program, system_program] =
            accounts
        else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        SignerAccount::check(admin)?;
        ProgramAccount::check_system_program(system_program)?;
        ProgramAccount::check_stake_program(stake_program)?;
        ProgramAccount::check_stake_config(stake_config)?;
        ProgramAccount::check_stake_sysvars(rent_sysvar, clock_sysvar, stake_history_sysvar)?;

        if !vote_account.is_owned_by(&VOTE_PROGRAM_ID) {
            return Err(LendingError::InvalidOwner.into());
        }

        Ok(Self {
            admin,
            lending_market,
            lending_market_stake,
            lending_market_authority,
            vote_account,
            rent_sysvar,
            clock_sysvar,
            stake_history_sysvar,
            stake_config,
            stake_program,
            system_program,
        })
    }
}

#[repr(C, packed)]
pub struct InitLendingMarketInstructionData {
    pub owner: Pubkey,
    pub bump: u8,
    pub stake_bump: u8,
    pub authority_bump: u8,
}

impl TryFrom<&[u8]> for InitLendingMarketInstructionData {
    type Error = ProgramError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        if data.len() != core::mem::size_of::<InitLendingMarketInstructionData>() {
            return Err(ProgramError::InvalidInstructionData);
        }

        let mut owner = [0u8; 32];
        owner.copy_from_slice(&data[0..32]);

        Ok(InitLendingMarketInstructionData {
            owner,
            bump: data[32],
            stake_bump: data[33],
            authority_bump: data[34],
        })
    }
}

pub struct InitLendingMarket<'a> {
    pub accounts: InitLendingMarketAccounts<'a>,
    pub instruction_data: InitLendingMarketInstructionData,
}

impl<'a> TryFrom<(&[u8], &'a [AccountInfo])> for InitLendingMarket<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&[u8], &'a [AccountInfo])) -> Result<Self, Self::Error> {
        let accounts = InitLendingMarketAccounts::try_from(accounts)?;
        let instruction_data = InitLendingMarketInstructionData::try_from(data)?;

        ProgramAccount::verify(
            &[
                Seed::from(LENDING_MARKET_PREFIX),
                Seed::from(accounts.vote_account.key().as_ref()),
            ],
            accounts.lending_market,
            instruction_data.bump,
        )?;

        ProgramAccount::verify(
            &[
                Seed::from(LENDING_MARKET_STAKE_PREFIX),
                Seed::from(accounts.lending_market.key().as_ref()),
            ],
            accounts.lending_market_stake,
            instruction_data.stake_bump,
        )?;

        ProgramAccount::verify(
            &[
                Seed::from(LENDING_MARKET_AUTHORITY_PREFIX),
                Seed::from(accounts.lending_market.key().as_ref()),
            ],
            accounts.lending_market_authority,
            instruction_data.authority_bump,
        )?;

        Ok(Self {
            accounts,
            instruction_data,
        })
    }
}

impl<'a> InitLendingMarket<'a> {
    pub const DISCRIMINATOR: &'a u8 = &1;

    pub fn process(&self) -> ProgramResult {
        let bump_binding = [self.instruction_data.bump];
        let lending_market_seeds = [
            Seed::from(LENDING_MARKET_PREFIX),
            Seed::from(self.accounts.vote_account.key().as_ref()),
            Seed::from(&bump_binding),
        ];

        ProgramAccount::init::<LendingMarket>(
            self.accounts.admin,
            self.accounts.lending_market,
            &lending_market_seeds,
        )?;

        {
            let mut lending_market_data = self.accounts.lending_market.try_borrow_mut_data()?;
            let lending_market = LendingMarket::load_mut(&mut lending_market_data)?;

            lending_market.set_inner(
                self.instruction_data.bump,
                self.instruction_data.authority_bump,
                self.instruction_data.stake_bump,
                self.instruction_data.owner,
                *self.accounts.vote_account.key(),
            );
        }

        self.initialize_stake_account()
    }

    /// Create the market stake account, funded by the admin with rent plus the
    /// minimum delegation, and delegate it to the market's vote account.
    fn initialize_stake_account(&self) -> ProgramResult {
        let lending_market_key = self.accounts.lending_market.key();

        let stake_bump_binding = [self.instruction_data.stake_bump];
        let stake_seeds = [
            Seed::from(LENDING_MARKET_STAKE_PREFIX),
            Seed::from(lending_market_key.as_ref()),
            Seed::from(&stake_bump_binding),
        ];

        let authority_bump_binding = [self.instruction_data.authority_bump];
        let authority_seeds = [
            Seed::from(LENDING_MARKET_AUTHORITY_PREFIX),
            Seed::from(lending_market_key.as_ref()),
            Seed::from(&authority_bump_binding),
        ];

        let minimum_delegation = minimum_delegation()?;
        let stake_rent_plus_initial = Rent::get()?
            .minimum_balance(STAKE_ACCOUNT_LEN)
            .saturating_add(minimum_delegation);

        ProgramAccount::init_with_owner(
            self.accounts.admin,
            self.accounts.lending_market_stake,
            &stake_seeds,
            STAKE_ACCOUNT_LEN,
            stake_rent_plus_initial,
            &STAKE_PROGRAM_ID,
        )?;

        InitializeChecked {
            stake: self.accounts.lending_market_stake,
            rent_sysvar: self.accounts.rent_sysvar,
            authority: self.accounts.lending_market_authority,
        }
        .invoke_signed(&[Signer::from(&authority_seeds)])?;

        DelegateStake {
            stake: self.accounts.lending_market_stake,
            vote: self.accounts.vote_account,
            clock_sysvar: self.accounts.clock_sysvar,
            stake_history_sysvar: self.accounts.stake_history_sysvar,
            stake_config: self.accounts.stake_config,
            authority: self.accounts.lending_market_authority,
        }
        .invoke_signed(&[Signer::from(&authority_seeds)])?;

        log!("Delegated {} lamports to the market vote account", minimum_delegation);

        Ok(())
    }
}
