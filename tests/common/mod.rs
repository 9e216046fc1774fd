#![allow(dead_code)]

use litesvm::LiteSVM;
use pinocchio_system::ID;
use solana_sdk::{
    account::Account,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use spl_associated_token_account::ID as ATA_PROGRAM_ID;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::{Account as TokenAccount, Mint};
use spl_token::ID as TOKEN_PROGRAM_ID;
use solana_vote_interface::{
    instruction::{create_account_with_config, CreateVoteAccountConfig},
    state::{VoteInit, VoteStateV4},
};

pub type TransactionResult =
    Result<litesvm::types::TransactionMetadata, litesvm::types::FailedTransactionMetadata>;

// 6CiDLjqtdxtbqC8oympZZdqxG2niyHaAUrmawGdoV16y
pub const PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    0x4d, 0x4a, 0x6c, 0x46, 0x9f, 0x13, 0x65, 0x48, 0xba, 0xe8, 0x15, 0xff, 0x50, 0xcd, 0xfa, 0x59,
    0xc7, 0xa7, 0x97, 0xb0, 0x05, 0x5c, 0x5c, 0x42, 0x7d, 0x20, 0x1d, 0x29, 0x4d, 0xd5, 0xba, 0xda,
]);

pub const STAKE_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    0x06, 0xa1, 0xd8, 0x17, 0x91, 0x37, 0x54, 0x2a, 0x98, 0x34, 0x37, 0xbd, 0xfe, 0x2a, 0x7a, 0xb2,
    0x55, 0x7f, 0x53, 0x5c, 0x8a, 0x78, 0x72, 0x2b, 0x68, 0xa4, 0x9d, 0xc0, 0x00, 0x00, 0x00, 0x00,
]);

pub const STAKE_CONFIG_ID: Pubkey = Pubkey::new_from_array([
    0x06, 0xa1, 0xd8, 0x17, 0xa5, 0x02, 0x05, 0x0b, 0x68, 0x07, 0x91, 0xe6, 0xce, 0x6d, 0xb8, 0x8e,
    0x1e, 0x5b, 0x71, 0x50, 0xf6, 0x1f, 0xc6, 0x79, 0x0a, 0x4e, 0xb4, 0xd1, 0x00, 0x00, 0x00, 0x00,
]);

pub const VOTE_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    0x07, 0x61, 0x48, 0x1d, 0x35, 0x74, 0x74, 0xbb, 0x7c, 0x4d, 0x76, 0x24, 0xeb, 0xd3, 0xbd, 0xb3,
    0xd8, 0x35, 0x5e, 0x73, 0xd1, 0x10, 0x43, 0xfc, 0x0d, 0xa3, 0x53, 0x80, 0x00, 0x00, 0x00, 0x00,
]);

pub const SYSVAR_CLOCK_ID: Pubkey = Pubkey::new_from_array([
    0x06, 0xa7, 0xd5, 0x17, 0x18, 0xc7, 0x74, 0xc9, 0x28, 0x56, 0x63, 0x98, 0x69, 0x1d, 0x5e, 0xb6,
    0x8b, 0x5e, 0xb8, 0xa3, 0x9b, 0x4b, 0x6d, 0x5c, 0x73, 0x55, 0x5b, 0x21, 0x00, 0x00, 0x00, 0x00,
]);

pub const SYSVAR_RENT_ID: Pubkey = Pubkey::new_from_array([
    0x06, 0xa7, 0xd5, 0x17, 0x19, 0x2c, 0x5c, 0x51, 0x21, 0x8c, 0xc9, 0x4c, 0x3d, 0x4a, 0xf1, 0x7f,
    0x58, 0xda, 0xee, 0x08, 0x9b, 0xa1, 0xfd, 0x44, 0xe3, 0xdb, 0xd9, 0x8a, 0x00, 0x00, 0x00, 0x00,
]);

pub const SYSVAR_STAKE_HISTORY_ID: Pubkey = Pubkey::new_from_array([
    0x06, 0xa7, 0xd5, 0x17, 0x19, 0x35, 0x84, 0xd0, 0xfe, 0xed, 0x9b, 0xb3, 0x43, 0x1d, 0x13, 0x20,
    0x6b, 0xe5, 0x44, 0x28, 0x1b, 0x57, 0xb8, 0x56, 0x6c, 0xc5, 0x37, 0x5f, 0xf4, 0x00, 0x00, 0x00,
]);

pub const INITIALIZE_DISCRIMINATOR: u8 = 0;
pub const INIT_LENDING_MARKET_DISCRIMINATOR: u8 = 1;
pub const SET_LENDING_MARKET_OWNER_DISCRIMINATOR: u8 = 2;
pub const INIT_RESERVE_DISCRIMINATOR: u8 = 3;
pub const REFRESH_RESERVE_DISCRIMINATOR: u8 = 4;
pub const REFRESH_EPOCH_DISCRIMINATOR: u8 = 5;
pub const DEPOSIT_RESERVE_LIQUIDITY_DISCRIMINATOR: u8 = 6;
pub const REDEEM_RESERVE_LIQUIDITY_DISCRIMINATOR: u8 = 7;

// LendingMarket::LEN = 5 * u8 + 2 * Pubkey + padding(128) = 197
pub const LENDING_MARKET_LEN: usize = 197;
pub const LENDING_MARKET_OWNER_OFFSET: usize = 5;

// Reserve::LEN = 4 * u8 + u64 + LastUpdate(9) + 2 * Pubkey
//   + ReserveLiquidity(112) + padding(128) = 325
pub const RESERVE_LEN: usize = 325;
pub const RESERVE_LAST_EPOCH_OFFSET: usize = 4;
pub const RESERVE_SLOT_OFFSET: usize = 12;
pub const RESERVE_STALE_OFFSET: usize = 20;
pub const RESERVE_MINT_SUPPLY_OFFSET: usize = 117;
pub const RESERVE_AVAILABLE_AMOUNT_OFFSET: usize = 157;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Custom error codes of `LendingError`
pub mod error_code {
    pub const INVALID_OWNER: u32 = 1;
    pub const INVALID_ADDRESS: u32 = 3;
    pub const WRONG_STAKE_STATE: u32 = 9;
    pub const RESERVE_STALE: u32 = 10;
    pub const INVALID_AMOUNT: u32 = 11;
    pub const OWNER_MISMATCH: u32 = 12;
    pub const LENDING_MARKET_MISMATCH: u32 = 13;
}

pub fn setup_svm() -> LiteSVM {
    let mut svm = LiteSVM::new();

    svm.add_program_from_file(PROGRAM_ID, "target/deploy/srl_program.so")
        .expect("Failed to load program");

    svm
}

pub fn print_transaction_logs(result: &TransactionResult) {
    if let Err(err) = result {
        println!("\n=== Transaction Failed ===");
        println!("Error: {:?}", err.err);
        println!("\nProgram Logs:");
        for log in &err.meta.logs {
            println!("  {}", log);
        }
        println!(
            "Compute units consumed: {}",
            err.meta.compute_units_consumed
        );
        println!("========================\n");
    }
}

pub fn send(svm: &mut LiteSVM, instructions: &[Instruction], payer: &Keypair) -> TransactionResult {
    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&payer.pubkey()),
        &[payer],
        svm.latest_blockhash(),
    );

    let result = svm.send_transaction(tx);
    print_transaction_logs(&result);
    result
}

pub fn assert_custom_error(result: &TransactionResult, code: u32) {
    let Err(err) = result else {
        panic!("transaction should fail with custom error {}", code);
    };
    let rendered = format!("{:?}", err.err);
    assert!(
        rendered.contains(&format!("Custom({})", code)),
        "expected custom error {}, got {}",
        code,
        rendered
    );
}

pub fn derive_lending_market_pda(vote_account: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"lending_market", vote_account.as_ref()], &PROGRAM_ID)
}

pub fn derive_lending_market_stake_pda(lending_market: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"stake", lending_market.as_ref()], &PROGRAM_ID)
}

pub fn derive_transient_stake_pda(lending_market: &Pubkey, epoch: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[b"stake", lending_market.as_ref(), &epoch.to_le_bytes()],
        &PROGRAM_ID,
    )
}

pub fn derive_authority_pda(lending_market: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"authority", lending_market.as_ref()], &PROGRAM_ID)
}

pub fn derive_ata(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address(owner, mint)
}

/// Every address a reserve of `lending_market` lives at
pub struct ReserveAddresses {
    pub lending_market: Pubkey,
    pub lending_market_authority: Pubkey,
    pub reserve: Pubkey,
    pub reserve_bump: u8,
    pub liquidity_vault: Pubkey,
    pub vault_bump: u8,
    pub collateral_mint: Pubkey,
    pub collateral_mint_bump: u8,
    pub liquidity_mint: Pubkey,
    pub liquidity_mint_bump: u8,
}

impl ReserveAddresses {
    pub fn derive(lending_market: &Pubkey) -> Self {
        let find = |prefix: &[u8]| {
            Pubkey::find_program_address(&[prefix, lending_market.as_ref()], &PROGRAM_ID)
        };

        let (reserve, reserve_bump) = find(b"reserve");
        let (liquidity_vault, vault_bump) = find(b"liquidity_vault");
        let (collateral_mint, collateral_mint_bump) = find(b"collateral_mint");
        let (liquidity_mint, liquidity_mint_bump) = find(b"liquidity_mint");

        Self {
            lending_market: *lending_market,
            lending_market_authority: derive_authority_pda(lending_market).0,
            reserve,
            reserve_bump,
            liquidity_vault,
            vault_bump,
            collateral_mint,
            collateral_mint_bump,
            liquidity_mint,
            liquidity_mint_bump,
        }
    }
}

/// Create a vote account through the vote program, paid for by `payer`
pub fn create_vote_account(svm: &mut LiteSVM, payer: &Keypair) -> Pubkey {
    let validator = Keypair::new();
    let vote_account = Keypair::new();
    svm.airdrop(&validator.pubkey(), LAMPORTS_PER_SOL).unwrap();

    let lamports = svm.minimum_balance_for_rent_exemption(VoteStateV4::size_of());
    let instructions = create_account_with_config(
        &payer.pubkey(),
        &vote_account.pubkey(),
        &VoteInit {
            node_pubkey: validator.pubkey(),
            authorized_voter: validator.pubkey(),
            authorized_withdrawer: payer.pubkey(),
            ..VoteInit::default()
        },
        lamports,
        CreateVoteAccountConfig::default(),
    );

    let tx = Transaction::new_signed_with_payer(
        &instructions,
        Some(&payer.pubkey()),
        &[payer, &vote_account, &validator],
        svm.latest_blockhash(),
    );
    let result = svm.send_transaction(tx);
    print_transaction_logs(&result);
    assert!(result.is_ok(), "Vote account creation should succeed");

    vote_account.pubkey()
}

/// Write an initialized lending market straight into the bank, skipping the
/// stake delegation `InitLendingMarket` performs.
pub fn create_lending_market(svm: &mut LiteSVM, owner: &Pubkey) -> Pubkey {
    create_lending_market_for_vote(svm, owner, &Keypair::new().pubkey())
}

pub fn create_lending_market_for_vote(
    svm: &mut LiteSVM,
    owner: &Pubkey,
    vote_account: &Pubkey,
) -> Pubkey {
    let (lending_market, bump) = derive_lending_market_pda(vote_account);
    let (_, authority_bump) = derive_authority_pda(&lending_market);
    let (_, stake_bump) = derive_lending_market_stake_pda(&lending_market);

    let mut data = Vec::with_capacity(LENDING_MARKET_LEN);
    data.push(1u8); // Discriminator
    data.push(1u8); // Version
    data.push(bump); // Bump seed
    data.push(authority_bump); // Authority bump
    data.push(stake_bump); // Stake bump
    data.extend_from_slice(owner.as_ref()); // Owner: Pubkey (32)
    data.extend_from_slice(vote_account.as_ref()); // Vote account: Pubkey (32)
    data.extend_from_slice(&[0u8; 128]); // Padding

    assert_eq!(data.len(), LENDING_MARKET_LEN);

    let lamports = svm.minimum_balance_for_rent_exemption(LENDING_MARKET_LEN);
    svm.set_account(
        lending_market,
        Account {
            lamports,
            data,
            owner: PROGRAM_ID,
            executable: false,
            rent_epoch: 0,
        }
        .into(),
    );

    lending_market
}

pub fn build_init_reserve_instruction(
    admin: &Pubkey,
    addresses: &ReserveAddresses,
    liquidity_amount: u64,
) -> Instruction {
    let mut data = vec![INIT_RESERVE_DISCRIMINATOR];
    data.extend_from_slice(&liquidity_amount.to_le_bytes());
    data.push(addresses.reserve_bump);
    data.push(addresses.vault_bump);
    data.push(addresses.collateral_mint_bump);
    data.push(addresses.liquidity_mint_bump);

    Instruction {
        program_id: PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new_readonly(addresses.lending_market, false),
            AccountMeta::new(addresses.liquidity_vault, false),
            AccountMeta::new(addresses.reserve, false),
            AccountMeta::new_readonly(addresses.lending_market_authority, false),
            AccountMeta::new(addresses.collateral_mint, false),
            AccountMeta::new(addresses.liquidity_mint, false),
            AccountMeta::new(derive_ata(admin, &addresses.liquidity_mint), false),
            AccountMeta::new_readonly(ID.into(), false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(ATA_PROGRAM_ID, false),
        ],
        data,
    }
}

pub fn build_refresh_reserve_instruction(payer: &Pubkey, reserve: &Pubkey) -> Instruction {
    Instruction {
        program_id: PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(*reserve, false),
        ],
        data: vec![REFRESH_RESERVE_DISCRIMINATOR],
    }
}

fn build_reserve_liquidity_instruction(
    discriminator: u8,
    user: &Pubkey,
    addresses: &ReserveAddresses,
    amount: u64,
) -> Instruction {
    let mut data = vec![discriminator];
    data.extend_from_slice(&amount.to_le_bytes());

    Instruction {
        program_id: PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*user, true),
            AccountMeta::new_readonly(addresses.lending_market, false),
            AccountMeta::new(addresses.reserve, false),
            AccountMeta::new_readonly(addresses.lending_market_authority, false),
            AccountMeta::new(addresses.liquidity_mint, false),
            AccountMeta::new(addresses.liquidity_vault, false),
            AccountMeta::new(derive_ata(user, &addresses.liquidity_mint), false),
            AccountMeta::new_readonly(ID.into(), false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(ATA_PROGRAM_ID, false),
        ],
        data,
    }
}

pub fn build_deposit_instruction(
    user: &Pubkey,
    addresses: &ReserveAddresses,
    liquidity_amount: u64,
) -> Instruction {
    build_reserve_liquidity_instruction(
        DEPOSIT_RESERVE_LIQUIDITY_DISCRIMINATOR,
        user,
        addresses,
        liquidity_amount,
    )
}

pub fn build_redeem_instruction(
    user: &Pubkey,
    addresses: &ReserveAddresses,
    token_amount: u64,
) -> Instruction {
    build_reserve_liquidity_instruction(
        REDEEM_RESERVE_LIQUIDITY_DISCRIMINATOR,
        user,
        addresses,
        token_amount,
    )
}

/// Market owned by `admin` with a reserve seeded by `liquidity_amount`
pub fn setup_reserve(svm: &mut LiteSVM, admin: &Keypair, liquidity_amount: u64) -> ReserveAddresses {
    let lending_market = create_lending_market(svm, &admin.pubkey());
    init_reserve(svm, admin, &lending_market, liquidity_amount)
}

pub fn init_reserve(
    svm: &mut LiteSVM,
    admin: &Keypair,
    lending_market: &Pubkey,
    liquidity_amount: u64,
) -> ReserveAddresses {
    let addresses = ReserveAddresses::derive(lending_market);

    let instruction = build_init_reserve_instruction(&admin.pubkey(), &addresses, liquidity_amount);
    let result = send(svm, &[instruction], admin);
    assert!(result.is_ok(), "Reserve initialization should succeed");

    addresses
}

pub fn read_u64(data: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(data[offset..offset + 8].try_into().unwrap())
}

pub fn read_pubkey(data: &[u8], offset: usize) -> Pubkey {
    Pubkey::new_from_array(data[offset..offset + 32].try_into().unwrap())
}

pub fn reserve_data(svm: &LiteSVM, reserve: &Pubkey) -> Vec<u8> {
    let account = svm.get_account(reserve).unwrap();
    assert_eq!(account.owner, PROGRAM_ID);
    assert_eq!(account.data.len(), RESERVE_LEN);
    account.data
}

pub fn token_balance(svm: &LiteSVM, token_account: &Pubkey) -> u64 {
    let account = svm.get_account(token_account).unwrap();
    TokenAccount::unpack(&account.data).unwrap().amount
}

pub fn mint_supply(svm: &LiteSVM, mint: &Pubkey) -> u64 {
    let account = svm.get_account(mint).unwrap();
    Mint::unpack(&account.data).unwrap().supply
}

pub fn lamports(svm: &LiteSVM, address: &Pubkey) -> u64 {
    svm.get_account(address).map(|a| a.lamports).unwrap_or(0)
}

pub fn lending_market_vote_account(svm: &LiteSVM, lending_market: &Pubkey) -> Pubkey {
    let account = svm.get_account(lending_market).unwrap();
    read_pubkey(&account.data, LENDING_MARKET_OWNER_OFFSET + 32)
}

// StakeStateV2::Stake: tag(4) | rent_exempt_reserve(8) | staker(32) | withdrawer(32)
//   | lockup(48) | voter(32) | stake(8) | activation(8) | deactivation(8) | ...
pub const STAKE_ACCOUNT_LEN: usize = 200;
pub const STAKE_STAKER_OFFSET: usize = 12;
pub const STAKE_WITHDRAWER_OFFSET: usize = 44;
pub const STAKE_VOTER_OFFSET: usize = 124;
pub const STAKE_DELEGATED_OFFSET: usize = 156;
pub const STAKE_ACTIVATION_OFFSET: usize = 164;
pub const STAKE_DEACTIVATION_OFFSET: usize = 172;

/// Data of a delegated stake account, checked for owner, size and state
pub fn stake_account_data(svm: &LiteSVM, address: &Pubkey) -> Vec<u8> {
    let account = svm.get_account(address).unwrap();
    assert_eq!(account.owner, STAKE_PROGRAM_ID);
    assert_eq!(account.data.len(), STAKE_ACCOUNT_LEN);
    assert_eq!(
        u32::from_le_bytes(account.data[0..4].try_into().unwrap()),
        2,
        "Stake account should be delegated"
    );
    account.data
}

pub fn delegated_stake_data(
    rent_exempt_reserve: u64,
    authority: &Pubkey,
    vote_account: &Pubkey,
    stake: u64,
    activation_epoch: u64,
) -> Vec<u8> {
    let mut data = vec![0u8; STAKE_ACCOUNT_LEN];
    data[0..4].copy_from_slice(&2u32.to_le_bytes());
    data[4..12].copy_from_slice(&rent_exempt_reserve.to_le_bytes());
    data[STAKE_STAKER_OFFSET..STAKE_STAKER_OFFSET + 32].copy_from_slice(authority.as_ref());
    data[STAKE_WITHDRAWER_OFFSET..STAKE_WITHDRAWER_OFFSET + 32].copy_from_slice(authority.as_ref());
    data[STAKE_VOTER_OFFSET..STAKE_VOTER_OFFSET + 32].copy_from_slice(vote_account.as_ref());
    data[STAKE_DELEGATED_OFFSET..STAKE_DELEGATED_OFFSET + 8].copy_from_slice(&stake.to_le_bytes());
    data[STAKE_ACTIVATION_OFFSET..STAKE_ACTIVATION_OFFSET + 8]
        .copy_from_slice(&activation_epoch.to_le_bytes());
    data[STAKE_DEACTIVATION_OFFSET..STAKE_DEACTIVATION_OFFSET + 8]
        .copy_from_slice(&u64::MAX.to_le_bytes());
    data
}

pub fn create_stake_account(svm: &mut LiteSVM, address: &Pubkey, lamports: u64, data: Vec<u8>) {
    svm.set_account(
        *address,
        Account {
            lamports,
            data,
            owner: STAKE_PROGRAM_ID,
            executable: false,
            rent_epoch: 0,
        }
        .into(),
    );
}

pub fn build_refresh_epoch_instruction(
    payer: &Pubkey,
    addresses: &ReserveAddresses,
    vote_account: &Pubkey,
    last_epoch: u64,
) -> Instruction {
    let lending_market = &addresses.lending_market;
    let (lending_market_stake, _) = derive_lending_market_stake_pda(lending_market);
    let (merging_stake, merging_bump) = derive_transient_stake_pda(lending_market, last_epoch);
    let (new_stake, new_bump) = derive_transient_stake_pda(lending_market, last_epoch + 1);

    Instruction {
        program_id: PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*lending_market, false),
            AccountMeta::new(lending_market_stake, false),
            AccountMeta::new(merging_stake, false),
            AccountMeta::new(new_stake, false),
            AccountMeta::new_readonly(addresses.lending_market_authority, false),
            AccountMeta::new(addresses.reserve, false),
            AccountMeta::new_readonly(*vote_account, false),
            AccountMeta::new_readonly(SYSVAR_RENT_ID, false),
            AccountMeta::new_readonly(SYSVAR_CLOCK_ID, false),
            AccountMeta::new_readonly(SYSVAR_STAKE_HISTORY_ID, false),
            AccountMeta::new_readonly(STAKE_CONFIG_ID, false),
            AccountMeta::new_readonly(STAKE_PROGRAM_ID, false),
            AccountMeta::new_readonly(ID.into(), false),
        ],
        data: vec![REFRESH_EPOCH_DISCRIMINATOR, merging_bump, new_bump],
    }
}
