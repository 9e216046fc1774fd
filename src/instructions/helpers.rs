use pinocchio::{
    account_info::AccountInfo,
    instruction::{Seed, Signer},
    program_error::ProgramError,
    pubkey::{find_program_address, Pubkey},
    sysvars::{rent::Rent, Sysvar},
    ProgramResult,
};
use pinocchio_associated_token_account::instructions::Create;
use pinocchio_system::instructions::{Allocate, Assign, CreateAccount, Transfer};
use pinocchio_token::instructions::InitializeMint2;

use crate::{
    LendingError, LendingMarket, Reserve, STAKE_CONFIG_ID, STAKE_PROGRAM_ID, SYSVAR_CLOCK_ID,
    SYSVAR_RENT_ID, SYSVAR_STAKE_HISTORY_ID,
};

pub struct SignerAccount;

impl SignerAccount {
    pub fn check(account: &AccountInfo) -> Result<(), ProgramError> {
        if !account.is_signer() {
            return Err(ProgramError::MissingRequiredSignature);
        }
        Ok(())
    }
}

pub struct ProgramAccount;

impl ProgramAccount {
    fn check_id(account: &AccountInfo, id: &Pubkey) -> Result<(), ProgramError> {
        if account.key() != id {
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(())
    }

    pub fn check_system_program(account: &AccountInfo) -> Result<(), ProgramError> {
        Self::check_id(account, &pinocchio_system::ID)
    }

    pub fn check_token_program(account: &AccountInfo) -> Result<(), ProgramError> {
        Self::check_id(account, &pinocchio_token::ID)
    }

    pub fn check_ata_program(account: &AccountInfo) -> Result<(), ProgramError> {
        Self::check_id(account, &pinocchio_associated_token_account::ID)
    }

    pub fn check_stake_program(account: &AccountInfo) -> Result<(), ProgramError> {
        Self::check_id(account, &STAKE_PROGRAM_ID)
    }

    pub fn check_stake_config(account: &AccountInfo) -> Result<(), ProgramError> {
        if account.key() != &STAKE_CONFIG_ID {
            return Err(LendingError::InvalidAddress.into());
        }
        Ok(())
    }

    /// Rent, clock and stake history, in that order
    pub fn check_stake_sysvars(
        rent: &AccountInfo,
        clock: &AccountInfo,
        stake_history: &AccountInfo,
    ) -> Result<(), ProgramError> {
        if rent.key() != &SYSVAR_RENT_ID
            || clock.key() != &SYSVAR_CLOCK_ID
            || stake_history.key() != &SYSVAR_STAKE_HISTORY_ID
        {
            return Err(ProgramError::UnsupportedSysvar);
        }
        Ok(())
    }
}

pub trait Discriminator {
    const LEN: usize;
    const DISCRIMINATOR: u8;
}

impl ProgramAccount {
    pub fn check<T: Discriminator>(account: &AccountInfo) -> Result<(), ProgramError> {
        if !account.is_owned_by(&crate::ID) {
            return Err(LendingError::InvalidOwner.into());
        }

        if account.data_len() != T::LEN {
            return Err(LendingError::InvalidAccountData.into());
        }

        let data = account.try_borrow_data()?;
        if data[0] != T::DISCRIMINATOR {
            return Err(LendingError::InvalidDiscriminator.into());
        }

        Ok(())
    }

    pub fn check_lending_market(account: &AccountInfo) -> Result<(), ProgramError> {
        Self::check::<LendingMarket>(account)
    }

    pub fn check_reserve(account: &AccountInfo) -> Result<(), ProgramError> {
        Self::check::<Reserve>(account)
    }

    pub fn verify(seeds: &[Seed], account: &AccountInfo, bump: u8) -> Result<(), ProgramError> {
        let seed_bytes: Vec<&[u8]> = seeds.iter().map(|s| s.as_ref()).collect();

        let (expected_pubkey, expected_bump) = find_program_address(&seed_bytes, &crate::ID);

        if *account.key() != expected_pubkey {
            return Err(ProgramError::InvalidAccountData);
        }

        if bump != expected_bump {
            return Err(ProgramError::InvalidSeeds);
        }

        Ok(())
    }

    /// Create a PDA owned by `owner`. `seeds` must include the bump.
    ///
    /// Anyone can send lamports to a PDA address before it exists. A bare
    /// system account found there is topped up to `lamports`, then allocated
    /// and assigned in place.
    pub fn init_with_owner(
        payer: &AccountInfo,
        account: &AccountInfo,
        seeds: &[Seed],
        space: usize,
        lamports: u64,
        owner: &Pubkey,
    ) -> ProgramResult {
        let signer = [Signer::from(seeds)];

        if account.lamports() == 0 {
            return CreateAccount {
                from: payer,
                to: account,
                lamports,
                space: space as u64,
                owner,
            }
            .invoke_signed(&signer);
        }

        if SystemAccount::check(account).is_err() {
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let shortfall = lamports.saturating_sub(account.lamports());
        if shortfall > 0 {
            Transfer {
                from: payer,
                to: account,
                lamports: shortfall,
            }
            .invoke()?;
        }

        Allocate {
            account,
            space: space as u64,
        }
        .invoke_signed(&signer)?;

        Assign { account, owner }.invoke_signed(&signer)
    }

    pub fn init<T: Discriminator>(
        payer: &AccountInfo,
        account: &AccountInfo,
        seeds: &[Seed],
    ) -> ProgramResult {
        let lamports = Rent::get()?.minimum_balance(T::LEN);
        Self::init_with_owner(payer, account, seeds, T::LEN, lamports, &crate::ID)
    }
}

/// System owned PDA holding lamports, with no data.
pub struct SystemAccount;

impl SystemAccount {
    pub fn check(account: &AccountInfo) -> Result<(), ProgramError> {
        if !account.is_owned_by(&pinocchio_system::ID) {
            return Err(LendingError::InvalidOwner.into());
        }

        if account.data_len() != 0 {
            return Err(LendingError::InvalidAccountData.into());
        }

        Ok(())
    }
}

pub struct Mint;

impl Mint {
    /// Create a PDA mint with no freeze authority. `seeds` must include the bump.
    pub fn init(
        payer: &AccountInfo,
        mint: &AccountInfo,
        seeds: &[Seed],
        decimals: u8,
        mint_authority: &Pubkey,
    ) -> ProgramResult {
        let space = pinocchio_token::state::Mint::LEN;
        let lamports = Rent::get()?.minimum_balance(space);

        ProgramAccount::init_with_owner(
            payer,
            mint,
            seeds,
            space,
            lamports,
            &pinocchio_token::ID,
        )?;

        InitializeMint2 {
            mint,
            decimals,
            mint_authority,
            freeze_authority: None,
        }
        .invoke()
    }
}

pub struct Token;

impl Token {
    pub fn check(account: &AccountInfo) -> Result<(), ProgramError> {
        if !account.is_owned_by(&pinocchio_token::ID) {
            return Err(LendingError::InvalidOwner.into());
        }

        if account
            .data_len()
            .ne(&pinocchio_token::state::TokenAccount::LEN)
        {
            return Err(LendingError::InvalidAccountData.into());
        }

        Ok(())
    }
}

pub struct AssociatedToken;

impl AssociatedToken {
    pub fn check(
        account: &AccountInfo,
        authority: Pubkey,
        mint: Pubkey,
        token_program: Pubkey,
    ) -> Result<(), ProgramError> {
        Token::check(account)?;

        let (expected_ata, _bump) = find_program_address(
            &[authority.as_ref(), token_program.as_ref(), mint.as_ref()],
            &pinocchio_associated_token_account::ID,
        );

        if *account.key() != expected_ata {
            return Err(LendingError::InvalidAccountData.into());
        }

        if account.lamports() == 0 {
            return Err(LendingError::UninitializedAccount.into());
        }

        Ok(())
    }

    pub fn init(
        account: &AccountInfo,
        mint: &AccountInfo,
        payer: &AccountInfo,
        owner: &AccountInfo,
        system_program: &AccountInfo,
        token_program: &AccountInfo,
    ) -> ProgramResult {
        Create {
            funding_account: payer,
            account,
            wallet: owner,
            mint,
            system_program,
            token_program,
        }
        .invoke()
    }

    pub fn init_if_needed(
        account: &AccountInfo,
        mint: &AccountInfo,
        payer: &AccountInfo,
        owner: &AccountInfo,
        system_program: &AccountInfo,
        token_program: &AccountInfo,
    ) -> ProgramResult {
        match Self::check(account, *owner.key(), *mint.key(), *token_program.key()) {
            Ok(_) => Ok(()),
            Err(_) => Self::init(account, mint, payer, owner, system_program, token_program),
        }
    }
}
