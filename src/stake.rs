//! Native stake program interface: the instructions the market signs for and
//! a reader for the fields it needs out of `StakeStateV2` account data.

use pinocchio::{
    account_info::AccountInfo,
    cpi::{get_return_data, invoke, invoke_signed},
    instruction::{AccountMeta, Instruction, Signer},
    program_error::ProgramError,
    pubkey::Pubkey,
    ProgramResult,
};

use crate::{LendingError, MINIMUM_DELEGATION_FLOOR};

pub const STAKE_PROGRAM_ID: Pubkey =
    pinocchio_pubkey::pubkey!("Stake11111111111111111111111111111111111111");
pub const STAKE_CONFIG_ID: Pubkey =
    pinocchio_pubkey::pubkey!("StakeConfig11111111111111111111111111111111");
pub const VOTE_PROGRAM_ID: Pubkey =
    pinocchio_pubkey::pubkey!("Vote111111111111111111111111111111111111111");
pub const SYSVAR_CLOCK_ID: Pubkey =
    pinocchio_pubkey::pubkey!("SysvarC1ock11111111111111111111111111111111");
pub const SYSVAR_RENT_ID: Pubkey =
    pinocchio_pubkey::pubkey!("SysvarRent111111111111111111111111111111111");
pub const SYSVAR_STAKE_HISTORY_ID: Pubkey =
    pinocchio_pubkey::pubkey!("SysvarStakeHistory1111111111111111111111111");

/// Serialized size of `StakeStateV2`
pub const STAKE_ACCOUNT_LEN: usize = 200;

// Instruction tags are bincode enum variants, encoded as u32 LE.
const DELEGATE_STAKE: u32 = 2;
const WITHDRAW: u32 = 4;
const MERGE: u32 = 7;
const INITIALIZE_CHECKED: u32 = 9;
const GET_MINIMUM_DELEGATION: u32 = 13;

/// Warmup rate applied to every epoch, see `StakeAccount::is_fully_active`
const WARMUP_COOLDOWN_RATE: f64 = 0.09;

/// Initialize a stake account with the same staker and withdrawer.
///
/// ### Accounts:
///   0. `[WRITE]` Uninitialized stake account
///   1. `[]` Rent sysvar
///   2. `[]` Stake authority
///   3. `[SIGNER]` Withdraw authority
pub struct InitializeChecked<'a> {
    pub stake: &'a AccountInfo,
    pub rent_sysvar: &'a AccountInfo,
    pub authority: &'a AccountInfo,
}

impl InitializeChecked<'_> {
    pub fn invoke_signed(&self, signers: &[Signer]) -> ProgramResult {
        let account_metas = [
            AccountMeta::writable(self.stake.key()),
            AccountMeta::readonly(self.rent_sysvar.key()),
            AccountMeta::readonly(self.authority.key()),
            AccountMeta::readonly_signer(self.authority.key()),
        ];
        let data = INITIALIZE_CHECKED.to_le_bytes();

        let instruction = Instruction {
            program_id: &STAKE_PROGRAM_ID,
            accounts: &account_metas,
            data: &data,
        };

        invoke_signed(
            &instruction,
            &[self.stake, self.rent_sysvar, self.authority, self.authority],
            signers,
        )
    }
}

/// Delegate a stake account to a vote account.
///
/// ### Accounts:
///   0. `[WRITE]` Initialized stake account
///   1. `[]` Vote account
///   2. `[]` Clock sysvar
///   3. `[]` Stake history sysvar
///   4. `[]` Stake config
///   5. `[SIGNER]` Stake authority
pub struct DelegateStake<'a> {
    pub stake: &'a AccountInfo,
    pub vote: &'a AccountInfo,
    pub clock_sysvar: &'a AccountInfo,
    pub stake_history_sysvar: &'a AccountInfo,
    pub stake_config: &'a AccountInfo,
    pub authority: &'a AccountInfo,
}

impl DelegateStake<'_> {
    pub fn invoke_signed(&self, signers: &[Signer]) -> ProgramResult {
        let account_metas = [
            AccountMeta::writable(self.stake.key()),
            AccountMeta::readonly(self.vote.key()),
            AccountMeta::readonly(self.clock_sysvar.key()),
            AccountMeta::readonly(self.stake_history_sysvar.key()),
            AccountMeta::readonly(self.stake_config.key()),
            AccountMeta::readonly_signer(self.authority.key()),
        ];
        let data = DELEGATE_STAKE.to_le_bytes();

        let instruction = Instruction {
            program_id: &STAKE_PROGRAM_ID,
            accounts: &account_metas,
            data: &data,
        };

        invoke_signed(
            &instruction,
            &[
                self.stake,
                self.vote,
                self.clock_sysvar,
                self.stake_history_sysvar,
                self.stake_config,
                self.authority,
            ],
            signers,
        )
    }
}

/// Withdraw undelegated lamports out of a stake account.
///
/// ### Accounts:
///   0. `[WRITE]` Stake account
///   1. `[WRITE]` Recipient
///   2. `[]` Clock sysvar
///   3. `[]` Stake history sysvar
///   4. `[SIGNER]` Withdraw authority
pub struct Withdraw<'a> {
    pub stake: &'a AccountInfo,
    pub recipient: &'a AccountInfo,
    pub clock_sysvar: &'a AccountInfo,
    pub stake_history_sysvar: &'a AccountInfo,
    pub authority: &'a AccountInfo,
    pub lamports: u64,
}

impl Withdraw<'_> {
    pub fn invoke_signed(&self, signers: &[Signer]) -> ProgramResult {
        let account_metas = [
            AccountMeta::writable(self.stake.key()),
            AccountMeta::writable(self.recipient.key()),
            AccountMeta::readonly(self.clock_sysvar.key()),
            AccountMeta::readonly(self.stake_history_sysvar.key()),
            AccountMeta::readonly_signer(self.authority.key()),
        ];

        let mut data = [0u8; 12];
        data[0..4].copy_from_slice(&WITHDRAW.to_le_bytes());
        data[4..12].copy_from_slice(&self.lamports.to_le_bytes());

        let instruction = Instruction {
            program_id: &STAKE_PROGRAM_ID,
            accounts: &account_metas,
            data: &data,
        };

        invoke_signed(
            &instruction,
            &[
                self.stake,
                self.recipient,
                self.clock_sysvar,
                self.stake_history_sysvar,
                self.authority,
            ],
            signers,
        )
    }
}

/// Merge `source` into `destination`, draining the source account.
///
/// ### Accounts:
///   0. `[WRITE]` Destination stake account
///   1. `[WRITE]` Source stake account
///   2. `[]` Clock sysvar
///   3. `[]` Stake history sysvar
///   4. `[SIGNER]` Stake authority
pub struct Merge<'a> {
    pub destination: &'a AccountInfo,
    pub source: &'a AccountInfo,
    pub clock_sysvar: &'a AccountInfo,
    pub stake_history_sysvar: &'a AccountInfo,
    pub authority: &'a AccountInfo,
}

impl Merge<'_> {
    pub fn invoke_signed(&self, signers: &[Signer]) -> ProgramResult {
        let account_metas = [
            AccountMeta::writable(self.destination.key()),
            AccountMeta::writable(self.source.key()),
            AccountMeta::readonly(self.clock_sysvar.key()),
            AccountMeta::readonly(self.stake_history_sysvar.key()),
            AccountMeta::readonly_signer(self.authority.key()),
        ];
        let data = MERGE.to_le_bytes();

        let instruction = Instruction {
            program_id: &STAKE_PROGRAM_ID,
            accounts: &account_metas,
            data: &data,
        };

        invoke_signed(
            &instruction,
            &[
                self.destination,
                self.source,
                self.clock_sysvar,
                self.stake_history_sysvar,
                self.authority,
            ],
            signers,
        )
    }
}

/// Ask the stake program for the cluster's minimum delegation.
///
/// The answer comes back as a `u64` in the transaction return data. The
/// stake program must be one of the instruction's accounts.
pub struct GetMinimumDelegation;

impl GetMinimumDelegation {
    pub fn invoke(&self) -> Result<u64, ProgramError> {
        let data = GET_MINIMUM_DELEGATION.to_le_bytes();

        let instruction = Instruction {
            program_id: &STAKE_PROGRAM_ID,
            accounts: &[],
            data: &data,
        };

        invoke::<0>(&instruction, &[])?;

        let return_data = get_return_data().ok_or(ProgramError::InvalidAccountData)?;
        if return_data.program_id() != &STAKE_PROGRAM_ID {
            return Err(ProgramError::IncorrectProgramId);
        }

        let bytes: [u8; 8] = return_data
            .as_slice()
            .try_into()
            .map_err(|_| ProgramError::InvalidAccountData)?;

        Ok(u64::from_le_bytes(bytes))
    }
}

/// Lamports every stake account of the market delegates at least: the
/// cluster minimum, floored at 1 SOL.
pub fn minimum_delegation() -> Result<u64, ProgramError> {
    Ok(GetMinimumDelegation
        .invoke()?
        .max(MINIMUM_DELEGATION_FLOOR))
}

/// Read-only view over the serialized `StakeHistory` sysvar: a u64 length
/// followed by `(epoch, effective, activating, deactivating)` entries,
/// newest epoch first.
pub struct StakeHistory<'a> {
    data: &'a [u8],
}

/// Cluster wide stake totals of one epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakeHistoryEntry {
    pub effective: u64,
    pub activating: u64,
    pub deactivating: u64,
}

impl<'a> StakeHistory<'a> {
    const ENTRY_LEN: usize = 32;

    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn read_u64(&self, offset: usize) -> Option<u64> {
        let bytes = self.data.get(offset..offset + 8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Some(u64::from_le_bytes(buf))
    }

    fn len(&self) -> u64 {
        self.read_u64(0).unwrap_or(0)
    }

    pub fn get_entry(&self, epoch: u64) -> Option<StakeHistoryEntry> {
        if self.len() == 0 {
            return None;
        }

        let newest_epoch = self.read_u64(8)?;
        let index = newest_epoch.checked_sub(epoch)?;
        if index >= self.len() {
            return None;
        }

        let offset = 8 + usize::try_from(index).ok()?.checked_mul(Self::ENTRY_LEN)?;
        if self.read_u64(offset)? != epoch {
            return None;
        }

        Some(StakeHistoryEntry {
            effective: self.read_u64(offset + 8)?,
            activating: self.read_u64(offset + 16)?,
            deactivating: self.read_u64(offset + 24)?,
        })
    }
}

/// Read-only view over a serialized `StakeStateV2`.
///
/// Layout: u32 state tag, `Meta` (rent reserve, authorized, lockup) and,
/// for the `Stake` state, the delegation.
pub struct StakeAccount;

impl StakeAccount {
    const STATE_STAKE: u32 = 2;

    const RENT_EXEMPT_RESERVE: usize = 4;
    const STAKER: usize = 12;
    const VOTER: usize = 124;
    const DELEGATED_STAKE: usize = 156;
    const ACTIVATION_EPOCH: usize = 164;
    const DEACTIVATION_EPOCH: usize = 172;

    fn read_u64(data: &[u8], offset: usize) -> Result<u64, ProgramError> {
        let bytes = data
            .get(offset..offset + 8)
            .ok_or(ProgramError::InvalidAccountData)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    fn read_pubkey(data: &[u8], offset: usize) -> Result<Pubkey, ProgramError> {
        let bytes = data
            .get(offset..offset + 32)
            .ok_or(ProgramError::InvalidAccountData)?;
        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);
        Ok(key)
    }

    pub fn is_delegated(data: &[u8]) -> bool {
        data.len() == STAKE_ACCOUNT_LEN
            && u32::from_le_bytes([data[0], data[1], data[2], data[3]]) == Self::STATE_STAKE
    }

    fn check_delegated(data: &[u8]) -> Result<(), ProgramError> {
        if !Self::is_delegated(data) {
            return Err(LendingError::WrongStakeState.into());
        }
        Ok(())
    }

    pub fn rent_exempt_reserve(data: &[u8]) -> Result<u64, ProgramError> {
        Self::check_delegated(data)?;
        Self::read_u64(data, Self::RENT_EXEMPT_RESERVE)
    }

    pub fn staker(data: &[u8]) -> Result<Pubkey, ProgramError> {
        Self::check_delegated(data)?;
        Self::read_pubkey(data, Self::STAKER)
    }

    pub fn voter(data: &[u8]) -> Result<Pubkey, ProgramError> {
        Self::check_delegated(data)?;
        Self::read_pubkey(data, Self::VOTER)
    }

    pub fn delegated_stake(data: &[u8]) -> Result<u64, ProgramError> {
        Self::check_delegated(data)?;
        Self::read_u64(data, Self::DELEGATED_STAKE)
    }

    /// Stake effective at `epoch`, walking the cluster warmup recorded in
    /// stake history from the activation epoch onwards.
    ///
    /// Only whether the delegation is fully warmed up matters here, so the
    /// current warmup rate is applied to every epoch.
    pub fn effective_stake(
        data: &[u8],
        epoch: u64,
        history: &StakeHistory,
    ) -> Result<u64, ProgramError> {
        let delegated_stake = Self::delegated_stake(data)?;
        let activation_epoch = Self::read_u64(data, Self::ACTIVATION_EPOCH)?;
        let deactivation_epoch = Self::read_u64(data, Self::DEACTIVATION_EPOCH)?;

        if activation_epoch == u64::MAX {
            return Ok(delegated_stake);
        }
        if activation_epoch == deactivation_epoch || epoch <= activation_epoch {
            return Ok(0);
        }

        let Some(mut cluster_stake) = history.get_entry(activation_epoch) else {
            // Out of history, long since fully active
            return Ok(delegated_stake);
        };

        let mut prev_epoch = activation_epoch;
        let mut effective_stake = 0u64;
        loop {
            let current_epoch = prev_epoch + 1;
            if cluster_stake.activating == 0 {
                return Ok(delegated_stake);
            }

            let remaining = delegated_stake - effective_stake;
            let weight = remaining as f64 / cluster_stake.activating as f64;
            let newly_effective_cluster_stake =
                cluster_stake.effective as f64 * WARMUP_COOLDOWN_RATE;
            let newly_effective = ((weight * newly_effective_cluster_stake) as u64).max(1);

            effective_stake = effective_stake.saturating_add(newly_effective);
            if effective_stake >= delegated_stake {
                return Ok(delegated_stake);
            }

            if current_epoch >= epoch || current_epoch >= deactivation_epoch {
                return Ok(effective_stake);
            }

            match history.get_entry(current_epoch) {
                Some(entry) => {
                    prev_epoch = current_epoch;
                    cluster_stake = entry;
                }
                None => return Ok(effective_stake),
            }
        }
    }

    /// Whole delegation effective at `epoch` and never deactivated, the
    /// state the stake program merges as fully active.
    pub fn is_fully_active(
        data: &[u8],
        epoch: u64,
        history: &StakeHistory,
    ) -> Result<bool, ProgramError> {
        let deactivation_epoch = Self::read_u64(data, Self::DEACTIVATION_EPOCH)?;
        if deactivation_epoch != u64::MAX {
            return Ok(false);
        }

        Ok(Self::effective_stake(data, epoch, history)? == Self::delegated_stake(data)?)
    }

    /// Lamports held by the account on top of its delegation and rent reserve
    pub fn inactive_lamports(lamports: u64, data: &[u8]) -> Result<u64, ProgramError> {
        let locked = Self::delegated_stake(data)?
            .checked_add(Self::rent_exempt_reserve(data)?)
            .ok_or(LendingError::MathOverflow)?;
        Ok(lamports.saturating_sub(locked))
    }
}
