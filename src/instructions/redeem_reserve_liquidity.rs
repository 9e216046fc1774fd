use pinocchio::{
    account_info::AccountInfo,
    instruction::{Seed, Signer},
    program_error::ProgramError,
    sysvars::{clock::Clock, Sysvar},
    ProgramResult,
};
use pinocchio_log::log;
use pinocchio_system::instructions::Transfer;
use pinocchio_token::{instructions::Burn, state::TokenAccount};

use crate::{
    AssociatedToken, LendingError, Reserve, ReserveLiquidityAccounts, LIQUIDITY_VAULT_PREFIX,
};

pub struct RedeemReserveLiquidityInstructionData {
    pub token_amount: u64,
}

impl TryFrom<&[u8]> for RedeemReserveLiquidityInstructionData {
    type Error = ProgramError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        let token_amount = u64::from_le_bytes(
            data.try_into()
                .map_err(|_| ProgramError::InvalidInstructionData)?,
        );

        if token_amount == 0 {
            return Err(LendingError::InvalidAmount.into());
        }

        Ok(Self { token_amount })
    }
}

pub struct RedeemReserveLiquidity<'a> {
    pub accounts: ReserveLiquidityAccounts<'a>,
    pub instruction_data: RedeemReserveLiquidityInstructionData,
}

impl<'a> TryFrom<(&[u8], &'a [AccountInfo])> for RedeemReserveLiquidity<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&[u8], &'a [AccountInfo])) -> Result<Self, Self::Error> {
        let accounts = ReserveLiquidityAccounts::try_from(accounts)?;
        let instruction_data = RedeemReserveLiquidityInstructionData::try_from(data)?;
        accounts.validate()?;

        AssociatedToken::check(
            accounts.user_liquidity_token,
            *accounts.user.key(),
            *accounts.liquidity_mint.key(),
            *accounts.token_program.key(),
        )?;

        {
            let user_token = TokenAccount::from_account_info(accounts.user_liquidity_token)?;
            if user_token.amount() < instruction_data.token_amount {
                return Err(ProgramError::InsufficientFunds);
            }
        }

        Ok(Self {
            accounts,
            instruction_data,
        })
    }
}

impl<'a> RedeemReserveLiquidity<'a> {
    pub const DISCRIMINATOR: &'a u8 = &7;

    pub fn process(&self) -> ProgramResult {
        let token_amount = self.instruction_data.token_amount;

        self.accounts.check_fresh(Clock::get()?.slot)?;

        let (liquidity_amount, vault_bump) = {
            let mut reserve_data = self.accounts.reserve.try_borrow_mut_data()?;
            let reserve = Reserve::load_mut(&mut reserve_data)?;

            let liquidity_amount = reserve.redeem(token_amount)?;
            reserve.last_update_mut().mark_stale();
            (liquidity_amount, reserve.vault_bump())
        };

        Burn {
            account: self.accounts.user_liquidity_token,
            mint: self.accounts.liquidity_mint,
            authority: self.accounts.user,
            amount: token_amount,
        }
        .invoke()?;

        let lending_market_key = self.accounts.lending_market.key();
        let vault_bump_binding = [vault_bump];
        let vault_seeds = [
            Seed::from(LIQUIDITY_VAULT_PREFIX),
            Seed::from(lending_market_key.as_ref()),
            Seed::from(&vault_bump_binding),
        ];

        Transfer {
            from: self.accounts.liquidity_vault,
            to: self.accounts.user,
            lamports: liquidity_amount,
        }
        .invoke_signed(&[Signer::from(&vault_seeds)])?;

        log!("Burned {} pool tokens, redeemed {} lamports", token_amount, liquidity_amount);

        Ok(())
    }
}
