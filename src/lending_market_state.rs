use pinocchio::{program_error::ProgramError, pubkey::Pubkey};

use crate::{Discriminator, PROGRAM_VERSION, UNINITIALIZED_VERSION};

/// Lending market state
#[repr(C, packed)]
pub struct LendingMarket {
    discriminator: u8,
    /// Version of lending market
    version: u8,
    /// Bump seed of the market address
    bump_seed: u8,
    /// Bump seed of the derived authority address
    authority_bump: u8,
    /// Bump seed of the market stake account
    stake_bump: u8,
    /// Owner authority which can add new reserves
    owner: Pubkey,
    /// Vote account of the validator the market stakes with
    vote_account: Pubkey,
    _padding: [u8; 128],
}

impl Discriminator for LendingMarket {
    const LEN: usize = Self::LEN;
    const DISCRIMINATOR: u8 = Self::DISCRIMINATOR;
}

impl LendingMarket {
    pub const LEN: usize = size_of::<u8>() * 5 + size_of::<Pubkey>() * 2 + 128;
    pub const DISCRIMINATOR: u8 = 1;

    #[inline(always)]
    pub fn load_mut(bytes: &mut [u8]) -> Result<&mut Self, ProgramError> {
        if bytes.len() != LendingMarket::LEN {
            return Err(ProgramError::InvalidAccountData);
        }
        Ok(unsafe { &mut *core::mem::transmute::<*mut u8, *mut Self>(bytes.as_mut_ptr()) })
    }

    #[inline(always)]
    pub fn load(bytes: &[u8]) -> Result<&Self, ProgramError> {
        if bytes.len() != LendingMarket::LEN {
            return Err(ProgramError::InvalidAccountData);
        }
        Ok(unsafe { &*core::mem::transmute::<*const u8, *const Self>(bytes.as_ptr()) })
    }

    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.version != UNINITIALIZED_VERSION
    }

    #[inline(always)]
    pub fn version(&self) -> u8 {
        self.version
    }

    #[inline(always)]
    pub fn bump_seed(&self) -> u8 {
        self.bump_seed
    }

    #[inline(always)]
    pub fn authority_bump(&self) -> u8 {
        self.authority_bump
    }

    #[inline(always)]
    pub fn stake_bump(&self) -> u8 {
        self.stake_bump
    }

    #[inline(always)]
    pub fn owner(&self) -> &Pubkey {
        &self.owner
    }

    #[inline(always)]
    pub fn vote_account(&self) -> &Pubkey {
        &self.vote_account
    }

    pub fn set_owner(&mut self, owner: Pubkey) {
        self.owner = owner;
    }

    pub fn set_inner(
        &mut self,
        bump_seed: u8,
        authority_bump: u8,
        stake_bump: u8,
        owner: Pubkey,
        vote_account: Pubkey,
    ) {
        self.discriminator = LendingMarket::DISCRIMINATOR;
        self.version = PROGRAM_VERSION;
        self.bump_seed = bump_seed;
        self.authority_bump = authority_bump;
        self.stake_bump = stake_bump;
        self.owner = owner;
        self.vote_account = vote_account;
    }
}
