use pinocchio::{
    account_info::AccountInfo,
    instruction::{Seed, Signer},
    program_error::ProgramError,
    sysvars::{clock::Clock, rent::Rent, Sysvar},
    ProgramResult,
};
use pinocchio_log::log;
use pinocchio_system::instructions::Transfer;
use pinocchio_token::instructions::MintTo;

use crate::{
    AssociatedToken, LendingError, LendingMarket, Mint, ProgramAccount, Reserve, SignerAccount,
    COLLATERAL_MINT_PREFIX, LENDING_MARKET_AUTHORITY_PREFIX, LIQUIDITY_MINT_PREFIX,
    LIQUIDITY_VAULT_PREFIX, MINT_DECIMALS, RESERVE_PREFIX,
};

pub struct InitReserveAccounts<'a> {
    pub admin: &'a AccountInfo,
    pub lending_market: &'a AccountInfo,
    pub liquidity_vault: &'a AccountInfo,
    pub reserve: &'a AccountInfo,
    pub lending_market_authority: &'a AccountInfo,
    pub collateral_mint: &'a AccountInfo,
    pub liquidity_mint: &'a AccountInfo,
    pub admin_liquidity_token: &'a AccountInfo,
    pub system_program: &'a AccountInfo,
    pub token_program: &'a AccountInfo,
    pub ata_program: &'a AccountInfo,
}

impl<'a> TryFrom<&'a [AccountInfo]> for InitReserveAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let [admin, lending_market, liquidity_vault, reserve, lending_market_authority, collateral_mint, liquidity_mint, admin_liquidity_token, system_program, token_program, ata_program] =
            accounts
        else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        SignerAccount::check(admin)?;
        ProgramAccount::check_system_program(system_program)?;
        ProgramAccount::check_token_program(token_program)?;
        ProgramAccount::check_ata_program(ata_program)?;
        ProgramAccount::check_lending_market(lending_market)?;

        Ok(Self {
            admin,
            lending_market,
            liquidity_vault,
            reserve,
            lending_market_authority,
            collateral_mint,
            liquidity_mint,
            admin_liquidity_token,
            system_program,
            token_program,
            ata_program,
        })
    }
}

#[repr(C, packed)]
pub struct InitReserveInstructionData {
    pub liquidity_amount: u64,
    pub reserve_bump: u8,
    pub vault_bump: u8,
    pub collateral_mint_bump: u8,
    pub liquidity_mint_bump: u8,
}

impl TryFrom<&[u8]> for InitReserveInstructionData {
    type Error = ProgramError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        if data.len() != core::mem::size_of::<InitReserveInstructionData>() {
            return Err(ProgramError::InvalidInstructionData);
        }

        let liquidity_amount = u64::from_le_bytes(
            data[0..8]
                .try_into()
                .map_err(|_| ProgramError::InvalidInstructionData)?,
        );

        if liquidity_amount == 0 {
            return Err(LendingError::InvalidAmount.into());
        }

        Ok(InitReserveInstructionData {
            liquidity_amount,
            reserve_bump: data[8],
            vault_bump: data[9],
            collateral_mint_bump: data[10],
            liquidity_mint_bump: data[11],
        })
    }
}

pub struct InitReserve<'a> {
    pub accounts: InitReserveAccounts<'a>,
    pub instruction_data: InitReserveInstructionData,
    pub authority_bump: u8,
}

impl<'a> TryFrom<(&[u8], &'a [AccountInfo])> for InitReserve<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&[u8], &'a [AccountInfo])) -> Result<Self, Self::Error> {
        let accounts = InitReserveAccounts::try_from(accounts)?;
        let instruction_data = InitReserveInstructionData::try_from(data)?;

        let authority_bump = {
            let lending_market_data = accounts.lending_market.try_borrow_data()?;
            let lending_market = LendingMarket::load(&lending_market_data)?;

            if lending_market.owner() != accounts.admin.key() {
                return Err(LendingError::OwnerMismatch.into());
            }

            lending_market.authority_bump()
        };

        let lending_market_key = accounts.lending_market.key().as_ref();

        ProgramAccount::verify(
            &[Seed::from(RESERVE_PREFIX), Seed::from(lending_market_key)],
            accounts.reserve,
            instruction_data.reserve_bump,
        )?;

        ProgramAccount::verify(
            &[Seed::from(LIQUIDITY_VAULT_PREFIX), Seed::from(lending_market_key)],
            accounts.liquidity_vault,
            instruction_data.vault_bump,
        )?;

        ProgramAccount::verify(
            &[Seed::from(COLLATERAL_MINT_PREFIX), Seed::from(lending_market_key)],
            accounts.collateral_mint,
            instruction_data.collateral_mint_bump,
        )?;

        ProgramAccount::verify(
            &[Seed::from(LIQUIDITY_MINT_PREFIX), Seed::from(lending_market_key)],
            accounts.liquidity_mint,
            instruction_data.liquidity_mint_bump,
        )?;

        ProgramAccount::verify(
            &[
                Seed::from(LENDING_MARKET_AUTHORITY_PREFIX),
                Seed::from(lending_market_key),
            ],
            accounts.lending_market_authority,
            authority_bump,
        )?;

        Ok(Self {
            accounts,
            instruction_data,
            authority_bump,
        })
    }
}

impl<'a> InitReserve<'a> {
    pub const DISCRIMINATOR: &'a u8 = &3;

    pub fn process(&self) -> ProgramResult {
        let lending_market_key = self.accounts.lending_market.key();

        let reserve_bump_binding = [self.instruction_data.reserve_bump];
        let reserve_seeds = [
            Seed::from(RESERVE_PREFIX),
            Seed::from(lending_market_key.as_ref()),
            Seed::from(&reserve_bump_binding),
        ];
        ProgramAccount::init::<Reserve>(self.accounts.admin, self.accounts.reserve, &reserve_seeds)?;

        let collateral_bump_binding = [self.instruction_data.collateral_mint_bump];
        let collateral_mint_seeds = [
            Seed::from(COLLATERAL_MINT_PREFIX),
            Seed::from(lending_market_key.as_ref()),
            Seed::from(&collateral_bump_binding),
        ];
        Mint::init(
            self.accounts.admin,
            self.accounts.collateral_mint,
            &collateral_mint_seeds,
            MINT_DECIMALS,
            self.accounts.lending_market_authority.key(),
        )?;

        let liquidity_bump_binding = [self.instruction_data.liquidity_mint_bump];
        let liquidity_mint_seeds = [
            Seed::from(LIQUIDITY_MINT_PREFIX),
            Seed::from(lending_market_key.as_ref()),
            Seed::from(&liquidity_bump_binding),
        ];
        Mint::init(
            self.accounts.admin,
            self.accounts.liquidity_mint,
            &liquidity_mint_seeds,
            MINT_DECIMALS,
            self.accounts.lending_market_authority.key(),
        )?;

        AssociatedToken::init(
            self.accounts.admin_liquidity_token,
            self.accounts.liquidity_mint,
            self.accounts.admin,
            self.accounts.admin,
            self.accounts.system_program,
            self.accounts.token_program,
        )?;

        let clock = Clock::get()?;
        let token_amount = {
            let mut reserve_data = self.accounts.reserve.try_borrow_mut_data()?;
            let reserve = Reserve::load_mut(&mut reserve_data)?;

            reserve.set_inner(
                self.instruction_data.reserve_bump,
                self.instruction_data.vault_bump,
                clock.epoch,
                clock.slot,
                *lending_market_key,
                *self.accounts.collateral_mint.key(),
                *self.accounts.liquidity_mint.key(),
                *self.accounts.liquidity_vault.key(),
            );

            reserve.deposit(self.instruction_data.liquidity_amount)?
        };

        // The vault keeps its own rent exemption out of the tracked liquidity.
        let vault_lamports = Rent::get()?
            .minimum_balance(0)
            .checked_add(self.instruction_data.liquidity_amount)
            .ok_or(LendingError::MathOverflow)?;

        Transfer {
            from: self.accounts.admin,
            to: self.accounts.liquidity_vault,
            lamports: vault_lamports,
        }
        .invoke()?;

        let authority_bump_binding = [self.authority_bump];
        let authority_seeds = [
            Seed::from(LENDING_MARKET_AUTHORITY_PREFIX),
            Seed::from(lending_market_key.as_ref()),
            Seed::from(&authority_bump_binding),
        ];

        MintTo {
            mint: self.accounts.liquidity_mint,
            account: self.accounts.admin_liquidity_token,
            mint_authority: self.accounts.lending_market_authority,
            amount: token_amount,
        }
        .invoke_signed(&[Signer::from(&authority_seeds)])?;

        let liquidity_amount = self.instruction_data.liquidity_amount;
        log!(
            "Reserve seeded with {} lamports for {} pool tokens",
            liquidity_amount,
            token_amount
        );

        Ok(())
    }
}
