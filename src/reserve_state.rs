use pinocchio::{program_error::ProgramError, pubkey::Pubkey};

use crate::{Discriminator, FixedPrecision, LastUpdate, LendingError, PROGRAM_VERSION, WAD};

#[repr(C, packed)]
pub struct Reserve {
    discriminator: u8,
    version: u8,
    bump: u8,
    vault_bump: u8,
    /// Last epoch the market stake was rolled over
    last_epoch: u64,
    /// Last slot when supply and rates were updated
    last_update: LastUpdate,
    lending_market: Pubkey,
    collateral_mint: Pubkey,
    liquidity: ReserveLiquidity,
    _padding: [u8; 128],
}

impl Discriminator for Reserve {
    const LEN: usize = Self::LEN;
    const DISCRIMINATOR: u8 = Self::DISCRIMINATOR;
}

impl Reserve {
    pub const LEN: usize = size_of::<u8>() * 4
        + size_of::<u64>()
        + LastUpdate::LEN
        + size_of::<Pubkey>() * 2
        + ReserveLiquidity::LEN
        + 128;
    pub const DISCRIMINATOR: u8 = 2;

    #[inline(always)]
    pub fn load_mut(bytes: &mut [u8]) -> Result<&mut Self, ProgramError> {
        if bytes.len() != Reserve::LEN {
            return Err(ProgramError::InvalidAccountData);
        }
        Ok(unsafe { &mut *core::mem::transmute::<*mut u8, *mut Self>(bytes.as_mut_ptr()) })
    }

    #[inline(always)]
    pub fn load(bytes: &[u8]) -> Result<&Self, ProgramError> {
        if bytes.len() != Reserve::LEN {
            return Err(ProgramError::InvalidAccountData);
        }
        Ok(unsafe { &*core::mem::transmute::<*const u8, *const Self>(bytes.as_ptr()) })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_inner(
        &mut self,
        bump: u8,
        vault_bump: u8,
        current_epoch: u64,
        current_slot: u64,
        lending_market: Pubkey,
        collateral_mint: Pubkey,
        liquidity_mint: Pubkey,
        liquidity_vault: Pubkey,
    ) {
        self.discriminator = Reserve::DISCRIMINATOR;
        self.version = PROGRAM_VERSION;
        self.bump = bump;
        self.vault_bump = vault_bump;
        self.last_epoch = current_epoch;
        self.last_update = LastUpdate::new(current_slot);
        self.lending_market = lending_market;
        self.collateral_mint = collateral_mint;
        self.liquidity = ReserveLiquidity::new(liquidity_mint, liquidity_vault);
    }

    #[inline(always)]
    pub fn version(&self) -> u8 {
        self.version
    }

    #[inline(always)]
    pub fn bump(&self) -> u8 {
        self.bump
    }

    #[inline(always)]
    pub fn vault_bump(&self) -> u8 {
        self.vault_bump
    }

    #[inline(always)]
    pub fn last_epoch(&self) -> u64 {
        self.last_epoch
    }

    #[inline(always)]
    pub fn lending_market(&self) -> &Pubkey {
        &self.lending_market
    }

    #[inline(always)]
    pub fn collateral_mint(&self) -> &Pubkey {
        &self.collateral_mint
    }

    #[inline(always)]
    pub fn last_update(&self) -> &LastUpdate {
        &self.last_update
    }

    #[inline(always)]
    pub fn last_update_mut(&mut self) -> &mut LastUpdate {
        &mut self.last_update
    }

    #[inline(always)]
    pub fn liquidity(&self) -> &ReserveLiquidity {
        &self.liquidity
    }

    /// Epochs elapsed since the last rollover
    pub fn epoch_elapsed(&self, epoch: u64) -> Result<u64, ProgramError> {
        epoch
            .checked_sub(self.last_epoch)
            .ok_or_else(|| ProgramError::from(LendingError::MathOverflow))
    }

    pub fn update_epoch(&mut self, epoch: u64) {
        self.last_epoch = epoch;
    }

    /// Record deposited liquidity and return the amount of pool tokens to mint
    pub fn deposit(&mut self, liquidity_amount: u64) -> Result<u64, ProgramError> {
        let token_amount = Self::calculate_token_position(
            liquidity_amount,
            self.liquidity.total_liquidity()?,
            self.liquidity.mint_total_supply(),
        )?;

        self.liquidity.deposit(liquidity_amount)?;
        self.liquidity.mint(token_amount)?;

        Ok(token_amount)
    }

    /// Record burned pool tokens and return the liquidity to pay out
    pub fn redeem(&mut self, token_amount: u64) -> Result<u64, ProgramError> {
        let liquidity_amount = Self::calculate_liquidity_position(
            token_amount,
            self.liquidity.total_liquidity()?,
            self.liquidity.mint_total_supply(),
        )?;

        self.liquidity.withdraw(liquidity_amount)?;
        self.liquidity.burn(token_amount)?;

        Ok(liquidity_amount)
    }

    /// Pool tokens for a deposit. An empty reserve mints 1:1.
    pub fn calculate_token_position(
        liquidity_deposit: u64,
        total_liquidity: u64,
        total_token_supply: u64,
    ) -> Result<u64, ProgramError> {
        if total_liquidity == 0 || total_token_supply == 0 {
            return Ok(liquidity_deposit);
        }

        let token_amount = (liquidity_deposit as u128)
            .checked_mul(total_token_supply as u128)
            .ok_or(LendingError::MathOverflow)?
            / total_liquidity as u128;
        u64::try_from(token_amount).map_err(|_| LendingError::MathOverflow.into())
    }

    /// Liquidity returned for burning pool tokens
    pub fn calculate_liquidity_position(
        token_to_burn: u64,
        total_liquidity: u64,
        total_token_supply: u64,
    ) -> Result<u64, ProgramError> {
        if total_liquidity == 0 || total_token_supply == 0 {
            return Ok(0);
        }

        let liquidity_amount = (token_to_burn as u128)
            .checked_mul(total_liquidity as u128)
            .ok_or(LendingError::MathOverflow)?
            / total_token_supply as u128;
        u64::try_from(liquidity_amount).map_err(|_| LendingError::MathOverflow.into())
    }
}

/// Reserve liquidity
#[repr(C, packed)]
pub struct ReserveLiquidity {
    mint_pubkey: Pubkey,
    mint_total_supply: u64,
    vault_pubkey: Pubkey,
    available_amount: u64,
    borrowed_amount_wads: u128,
    cumulative_borrow_rate_wads: u128,
}

impl ReserveLiquidity {
    pub const LEN: usize =
        size_of::<Pubkey>() * 2 + size_of::<u64>() * 2 + size_of::<u128>() * 2;

    pub fn new(mint_pubkey: Pubkey, vault_pubkey: Pubkey) -> Self {
        Self {
            mint_pubkey,
            mint_total_supply: 0,
            vault_pubkey,
            available_amount: 0,
            borrowed_amount_wads: 0,
            cumulative_borrow_rate_wads: WAD as u128,
        }
    }

    #[inline(always)]
    pub fn mint_pubkey(&self) -> &Pubkey {
        &self.mint_pubkey
    }

    #[inline(always)]
    pub fn vault_pubkey(&self) -> &Pubkey {
        &self.vault_pubkey
    }

    #[inline(always)]
    pub fn mint_total_supply(&self) -> u64 {
        self.mint_total_supply
    }

    #[inline(always)]
    pub fn available_amount(&self) -> u64 {
        self.available_amount
    }

    #[inline(always)]
    pub fn borrowed_amount_wads(&self) -> u128 {
        self.borrowed_amount_wads
    }

    #[inline(always)]
    pub fn cumulative_borrow_rate_wads(&self) -> u128 {
        self.cumulative_borrow_rate_wads
    }

    pub fn total_liquidity(&self) -> Result<u64, ProgramError> {
        let borrowed = FixedPrecision::from_scaled(self.borrowed_amount_wads).round_u64()?;
        self.available_amount
            .checked_add(borrowed)
            .ok_or_else(|| LendingError::MathOverflow.into())
    }

    pub fn mint(&mut self, mint_amount: u64) -> Result<(), ProgramError> {
        self.mint_total_supply = self
            .mint_total_supply
            .checked_add(mint_amount)
            .ok_or(LendingError::MathOverflow)?;
        Ok(())
    }

    pub fn burn(&mut self, burn_amount: u64) -> Result<(), ProgramError> {
        self.mint_total_supply = self
            .mint_total_supply
            .checked_sub(burn_amount)
            .ok_or(LendingError::MathOverflow)?;
        Ok(())
    }

    pub fn deposit(&mut self, liquidity_amount: u64) -> Result<(), ProgramError> {
        self.available_amount = self
            .available_amount
            .checked_add(liquidity_amount)
            .ok_or(LendingError::MathOverflow)?;
        Ok(())
    }

    pub fn withdraw(&mut self, liquidity_amount: u64) -> Result<(), ProgramError> {
        if liquidity_amount > self.available_amount {
            return Err(LendingError::InsufficientLiquidity.into());
        }
        self.available_amount -= liquidity_amount;
        Ok(())
    }
}
