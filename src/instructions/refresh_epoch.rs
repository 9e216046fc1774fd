use pinocchio::{
    account_info::AccountInfo,
    instruction::{Seed, Signer},
    program_error::ProgramError,
    sysvars::{clock::Clock, rent::Rent, Sysvar},
    ProgramResult,
};
use pinocchio_log::log;
use pinocchio_system::instructions::{Allocate, Assign};

use crate::{
    minimum_delegation, DelegateStake, InitializeChecked, LendingError, LendingMarket, Merge,
    ProgramAccount, Reserve, SignerAccount, StakeAccount, StakeHistory, Withdraw,
    LENDING_MARKET_AUTHORITY_PREFIX, LENDING_MARKET_STAKE_PREFIX, RESERVE_PREFIX,
    STAKE_ACCOUNT_LEN, STAKE_PROGRAM_ID,
};

pub struct RefreshEpochAccounts<'a> {
    pub payer: &'a AccountInfo,
    pub lending_market: &'a AccountInfo,
    pub lending_market_stake: &'a AccountInfo,
    pub merging_stake: &'a AccountInfo,
    pub new_stake: &'a AccountInfo,
    pub lending_market_authority: &'a AccountInfo,
    pub reserve: &'a AccountInfo,
    pub vote_account: &'a AccountInfo,
    pub rent_sysvar: &'a AccountInfo,
    pub clock_sysvar: &'a AccountInfo,
    pub stake_history_sysvar: &'a AccountInfo,
    pub stake_config: &'a AccountInfo,
    pub stake_program: &'a AccountInfo,
    pub system_program: &'a AccountInfo,
}

impl<'a> TryFrom<&'a [AccountInfo]> for RefreshEpochAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let [payer, lending_market, lending_market_stake, merging_stake, new_stake, lending_market_authority, reserve, vote_account, rent_sysvar, clock_sysvar, stake_history_sysvar, stake_config, stake_program, system_program] =
            accounts
        else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        SignerAccount::check(payer)?;
        ProgramAccount::check_system_program(system_program)?;
        ProgramAccount::check_stake_program(stake_program)?;
        ProgramAccount::check_stake_config(stake_config)?;
        ProgramAccount::check_stake_sysvars(rent_sysvar, clock_sysvar, stake_history_sysvar)?;
        ProgramAccount::check_lending_market(lending_market)?;
        ProgramAccount::check_reserve(reserve)?;

        if !lending_market_stake.is_owned_by(&STAKE_PROGRAM_ID) {
            return Err(LendingError::InvalidOwner.into());
        }

        Ok(Self {
            payer,
            lending_market,
            lending_market_stake,
            merging_stake,
            new_stake,
            lending_market_authority,
            reserve,
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

pub struct RefreshEpochInstructionData {
    pub merging_bump: u8,
    pub new_bump: u8,
}

impl TryFrom<&[u8]> for RefreshEpochInstructionData {
    type Error = ProgramError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        let [merging_bump, new_bump] = data else {
            return Err(ProgramError::InvalidInstructionData);
        };

        Ok(Self {
            merging_bump: *merging_bump,
            new_bump: *new_bump,
        })
    }
}

pub struct RefreshEpoch<'a> {
    pub accounts: RefreshEpochAccounts<'a>,
    pub instruction_data: RefreshEpochInstructionData,
    pub authority_bump: u8,
    /// Epoch of the transient stake account being merged
    pub last_epoch: u64,
}

impl<'a> TryFrom<(&[u8], &'a [AccountInfo])> for RefreshEpoch<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&[u8], &'a [AccountInfo])) -> Result<Self, Self::Error> {
        let accounts = RefreshEpochAccounts::try_from(accounts)?;
        let instruction_data = RefreshEpochInstructionData::try_from(data)?;

        let lending_market_key = accounts.lending_market.key().as_ref();

        let (authority_bump, last_epoch) = {
            let lending_market_data = accounts.lending_market.try_borrow_data()?;
            let lending_market = LendingMarket::load(&lending_market_data)?;

            let reserve_data = accounts.reserve.try_borrow_data()?;
            let reserve = Reserve::load(&reserve_data)?;

            if reserve.lending_market() != accounts.lending_market.key() {
                return Err(LendingError::LendingMarketMismatch.into());
            }

            if lending_market.vote_account() != accounts.vote_account.key() {
                return Err(LendingError::InvalidAddress.into());
            }

            ProgramAccount::verify(
                &[Seed::from(RESERVE_PREFIX), Seed::from(lending_market_key)],
                accounts.reserve,
                reserve.bump(),
            )?;

            ProgramAccount::verify(
                &[
                    Seed::from(LENDING_MARKET_STAKE_PREFIX),
                    Seed::from(lending_market_key),
                ],
                accounts.lending_market_stake,
                lending_market.stake_bump(),
            )?;

            ProgramAccount::verify(
                &[
                    Seed::from(LENDING_MARKET_AUTHORITY_PREFIX),
                    Seed::from(lending_market_key),
                ],
                accounts.lending_market_authority,
                lending_market.authority_bump(),
            )?;

            (lending_market.authority_bump(), reserve.last_epoch())
        };

        let merging_epoch = last_epoch.to_le_bytes();
        ProgramAccount::verify(
            &[
                Seed::from(LENDING_MARKET_STAKE_PREFIX),
                Seed::from(lending_market_key),
                Seed::from(&merging_epoch),
            ],
            accounts.merging_stake,
            instruction_data.merging_bump,
        )?;

        let new_epoch = last_epoch
            .checked_add(1)
            .ok_or(LendingError::MathOverflow)?
            .to_le_bytes();
        ProgramAccount::verify(
            &[
                Seed::from(LENDING_MARKET_STAKE_PREFIX),
                Seed::from(lending_market_key),
                Seed::from(&new_epoch),
            ],
            accounts.new_stake,
            instruction_data.new_bump,
        )?;

        Ok(Self {
            accounts,
            instruction_data,
            authority_bump,
            last_epoch,
        })
    }
}

impl<'a> RefreshEpoch<'a> {
    pub const DISCRIMINATOR: &'a u8 = &5;

    pub fn process(&self) -> ProgramResult {
        let clock = Clock::get()?;

        let epoch_elapsed = {
            let mut reserve_data = self.accounts.reserve.try_borrow_mut_data()?;
            let reserve = Reserve::load_mut(&mut reserve_data)?;

            reserve.last_update_mut().update_slot(clock.slot);
            reserve.epoch_elapsed(clock.epoch)?
        };

        if epoch_elapsed == 0 {
            return Ok(());
        }

        // The transient account of the previous epoch must be fully active
        // before the rollover can move past it.
        if self.accounts.merging_stake.is_owned_by(&STAKE_PROGRAM_ID) {
            let mergeable = {
                let merging_data = self.accounts.merging_stake.try_borrow_data()?;
                if StakeAccount::is_delegated(&merging_data) {
                    let history_data = self.accounts.stake_history_sysvar.try_borrow_data()?;
                    let history = StakeHistory::new(&history_data);
                    if !StakeAccount::is_fully_active(&merging_data, clock.epoch, &history)? {
                        log!("Transient stake of epoch {} still activating", self.last_epoch);
                        return Ok(());
                    }
                    true
                } else {
                    false
                }
            };

            if mergeable {
                self.merge_stake_account()?;
            }
        }

        let inactive_lamports = {
            let stake_data = self.accounts.lending_market_stake.try_borrow_data()?;
            StakeAccount::inactive_lamports(self.accounts.lending_market_stake.lamports(), &stake_data)?
        };

        let stake_rent_plus_initial = Rent::get()?
            .minimum_balance(STAKE_ACCOUNT_LEN)
            .saturating_add(minimum_delegation()?);

        if inactive_lamports >= stake_rent_plus_initial {
            self.initialize_stake_account(inactive_lamports)?;
        }

        let new_epoch = self.last_epoch + 1;
        {
            let mut reserve_data = self.accounts.reserve.try_borrow_mut_data()?;
            let reserve = Reserve::load_mut(&mut reserve_data)?;
            reserve.update_epoch(new_epoch);
        }

        log!("Reserve rolled over to epoch {}", new_epoch);

        Ok(())
    }

    /// Merge the previous epoch's transient stake into the market stake account
    fn merge_stake_account(&self) -> ProgramResult {
        let authority_bump_binding = [self.authority_bump];
        let authority_seeds = [
            Seed::from(LENDING_MARKET_AUTHORITY_PREFIX),
            Seed::from(self.accounts.lending_market.key().as_ref()),
            Seed::from(&authority_bump_binding),
        ];

        Merge {
            destination: self.accounts.lending_market_stake,
            source: self.accounts.merging_stake,
            clock_sysvar: self.accounts.clock_sysvar,
            stake_history_sysvar: self.accounts.stake_history_sysvar,
            authority: self.accounts.lending_market_authority,
        }
        .invoke_signed(&[Signer::from(&authority_seeds)])?;

        log!("Merged transient stake of epoch {}", self.last_epoch);

        Ok(())
    }

    /// Move the market stake's inactive lamports into a new transient stake
    /// account and delegate it to the market's vote account.
    fn initialize_stake_account(&self, lamports: u64) -> ProgramResult {
        let authority_bump_binding = [self.authority_bump];
        let authority_seeds = [
            Seed::from(LENDING_MARKET_AUTHORITY_PREFIX),
            Seed::from(self.accounts.lending_market.key().as_ref()),
            Seed::from(&authority_bump_binding),
        ];

        let new_epoch = (self.last_epoch + 1).to_le_bytes();
        let new_bump_binding = [self.instruction_data.new_bump];
        let new_stake_seeds = [
            Seed::from(LENDING_MARKET_STAKE_PREFIX),
            Seed::from(self.accounts.lending_market.key().as_ref()),
            Seed::from(&new_epoch),
            Seed::from(&new_bump_binding),
        ];

        Withdraw {
            stake: self.accounts.lending_market_stake,
            recipient: self.accounts.new_stake,
            clock_sysvar: self.accounts.clock_sysvar,
            stake_history_sysvar: self.accounts.stake_history_sysvar,
            authority: self.accounts.lending_market_authority,
            lamports,
        }
        .invoke_signed(&[Signer::from(&authority_seeds)])?;

        Allocate {
            account: self.accounts.new_stake,
            space: STAKE_ACCOUNT_LEN as u64,
        }
        .invoke_signed(&[Signer::from(&new_stake_seeds)])?;

        Assign {
            account: self.accounts.new_stake,
            owner: &STAKE_PROGRAM_ID,
        }
        .invoke_signed(&[Signer::from(&new_stake_seeds)])?;

        InitializeChecked {
            stake: self.accounts.new_stake,
            rent_sysvar: self.accounts.rent_sysvar,
            authority: self.accounts.lending_market_authority,
        }
        .invoke_signed(&[Signer::from(&authority_seeds)])?;

        DelegateStake {
            stake: self.accounts.new_stake,
            vote: self.accounts.vote_account,
            clock_sysvar: self.accounts.clock_sysvar,
            stake_history_sysvar: self.accounts.stake_history_sysvar,
            stake_config: self.accounts.stake_config,
            authority: self.accounts.lending_market_authority,
        }
        .invoke_signed(&[Signer::from(&authority_seeds)])?;

        log!("Delegated {} inactive lamports to a transient stake", lamports);

        Ok(())
    }
}
