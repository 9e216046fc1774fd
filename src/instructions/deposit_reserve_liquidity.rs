use pinocchio::{
    account_info::AccountInfo,
    instruction::{Seed, Signer},
    program_error::ProgramError,
    sysvars::{clock::Clock, Sysvar},
    ProgramResult,
};
use pinocchio_log::log;
use pinocchio_system::instructions::Transfer;
use pinocchio_token::instructions::MintTo;

use crate::{
    AssociatedToken, LendingError, LendingMarket, ProgramAccount, Reserve, SignerAccount,
    SystemAccount, LENDING_MARKET_AUTHORITY_PREFIX, RESERVE_PREFIX,
};

/// Accounts shared by deposits and redemptions of reserve liquidity.
pub struct ReserveLiquidityAccounts<'a> {
    pub user: &'a AccountInfo,
    pub lending_market: &'a AccountInfo,
    pub reserve: &'a AccountInfo,
    pub lending_market_authority: &'a AccountInfo,
    pub liquidity_mint: &'a AccountInfo,
    pub liquidity_vault: &'a AccountInfo,
    pub user_liquidity_token: &'a AccountInfo,
    pub system_program: &'a AccountInfo,
    pub token_program: &'a AccountInfo,
    pub ata_program: &'a AccountInfo,
}

impl<'a> TryFrom<&'a [AccountInfo]> for ReserveLiquidityAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountInfo]) -> Result<Self, Self::Error> {
        let [user, lending_market, reserve, lending_market_authority, liquidity_mint, liquidity_vault, user_liquidity_token, system_program, token_program, ata_program] =
            accounts
        else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        SignerAccount::check(user)?;
        ProgramAccount::check_system_program(system_program)?;
        ProgramAccount::check_token_program(token_program)?;
        ProgramAccount::check_ata_program(ata_program)?;
        ProgramAccount::check_lending_market(lending_market)?;
        ProgramAccount::check_reserve(reserve)?;
        SystemAccount::check(liquidity_vault)?;

        Ok(Self {
            user,
            lending_market,
            reserve,
            lending_market_authority,
            liquidity_mint,
            liquidity_vault,
            user_liquidity_token,
            system_program,
            token_program,
            ata_program,
        })
    }
}

impl ReserveLiquidityAccounts<'_> {
    /// Check the reserve belongs to the market and the mint, vault and
    /// authority are the ones it was created with. Returns the authority bump.
    pub fn validate(&self) -> Result<u8, ProgramError> {
        let lending_market_data = self.lending_market.try_borrow_data()?;
        let lending_market = LendingMarket::load(&lending_market_data)?;

        let reserve_data = self.reserve.try_borrow_data()?;
        let reserve = Reserve::load(&reserve_data)?;

        if reserve.lending_market() != self.lending_market.key() {
            return Err(LendingError::LendingMarketMismatch.into());
        }

        ProgramAccount::verify(
            &[
                Seed::from(RESERVE_PREFIX),
                Seed::from(self.lending_market.key().as_ref()),
            ],
            self.reserve,
            reserve.bump(),
        )?;

        ProgramAccount::verify(
            &[
                Seed::from(LENDING_MARKET_AUTHORITY_PREFIX),
                Seed::from(self.lending_market.key().as_ref()),
            ],
            self.lending_market_authority,
            lending_market.authority_bump(),
        )?;

        if reserve.liquidity().mint_pubkey() != self.liquidity_mint.key()
            || reserve.liquidity().vault_pubkey() != self.liquidity_vault.key()
        {
            return Err(LendingError::InvalidAddress.into());
        }

        Ok(lending_market.authority_bump())
    }

    /// Fail unless the reserve was refreshed in the current slot
    pub fn check_fresh(&self, slot: u64) -> Result<(), ProgramError> {
        let reserve_data = self.reserve.try_borrow_data()?;
        let reserve = Reserve::load(&reserve_data)?;

        if reserve.last_update().is_stale(slot)? {
            return Err(LendingError::ReserveStale.into());
        }

        Ok(())
    }
}

pub struct DepositReserveLiquidityInstructionData {
    pub liquidity_amount: u64,
}

impl TryFrom<&[u8]> for DepositReserveLiquidityInstructionData {
    type Error = ProgramError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        let liquidity_amount = u64::from_le_bytes(
            data.try_into()
                .map_err(|_| ProgramError::InvalidInstructionData)?,
        );

        if liquidity_amount == 0 {
            return Err(LendingError::InvalidAmount.into());
        }

        Ok(Self { liquidity_amount })
    }
}

pub struct DepositReserveLiquidity<'a> {
    pub accounts: ReserveLiquidityAccounts<'a>,
    pub instruction_data: DepositReserveLiquidityInstructionData,
    pub authority_bump: u8,
}

impl<'a> TryFrom<(&[u8], &'a [AccountInfo])> for DepositReserveLiquidity<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&[u8], &'a [AccountInfo])) -> Result<Self, Self::Error> {
        let accounts = ReserveLiquidityAccounts::try_from(accounts)?;
        let instruction_data = DepositReserveLiquidityInstructionData::try_from(data)?;
        let authority_bump = accounts.validate()?;

        Ok(Self {
            accounts,
            instruction_data,
            authority_bump,
        })
    }
}

impl<'a> DepositReserveLiquidity<'a> {
    pub const DISCRIMINATOR: &'a u8 = &6;

    pub fn process(&self) -> ProgramResult {
        let liquidity_amount = self.instruction_data.liquidity_amount;

        self.accounts.check_fresh(Clock::get()?.slot)?;

        let token_amount = {
            let mut reserve_data = self.accounts.reserve.try_borrow_mut_data()?;
            let reserve = Reserve::load_mut(&mut reserve_data)?;

            let token_amount = reserve.deposit(liquidity_amount)?;
            reserve.last_update_mut().mark_stale();
            token_amount
        };

        Transfer {
            from: self.accounts.user,
            to: self.accounts.liquidity_vault,
            lamports: liquidity_amount,
        }
        .invoke()?;

        AssociatedToken::init_if_needed(
            self.accounts.user_liquidity_token,
            self.accounts.liquidity_mint,
            self.accounts.user,
            self.accounts.user,
            self.accounts.system_program,
            self.accounts.token_program,
        )?;

        let lending_market_key = self.accounts.lending_market.key();
        let authority_bump_binding = [self.authority_bump];
        let authority_seeds = [
            Seed::from(LENDING_MARKET_AUTHORITY_PREFIX),
            Seed::from(lending_market_key.as_ref()),
            Seed::from(&authority_bump_binding),
        ];

        MintTo {
            mint: self.accounts.liquidity_mint,
            account: self.accounts.user_liquidity_token,
            mint_authority: self.accounts.lending_market_authority,
            amount: token_amount,
        }
        .invoke_signed(&[Signer::from(&authority_seeds)])?;

        log!("Deposited {} lamports, minted {}", liquidity_amount, token_amount);

        Ok(())
    }
}
