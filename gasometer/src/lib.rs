//! Gas accounting: the hardfork-gated cost schedule (`Config`), the running
//! counter (`Gasometer`), and the formulas for memory expansion, access-list
//! discounts, and the SSTORE/refund schedule.
//!
//! This crate knows nothing about the orchestrator or host state; it only
//! turns "this opcode, on this input, against this track record of what's
//! already warm" into a `u64` gas cost (or a `GasCost` descriptor the caller
//! resolves once it knows whether a slot/address is cold or warm).

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
mod prelude {
    pub use alloc::vec::Vec;
}
#[cfg(feature = "std")]
mod prelude {
    pub use std::vec::Vec;
}

pub mod consts;
mod cost;
mod gasometer;
pub mod utils;

pub use cost::{
    account_access_cost, copy_cost, dynamic_opcode_cost, exp_cost, keccak256_cost, log_cost, opcode_enabled,
    sload_cost, sstore_cost, static_opcode_cost, GasCost, StorageTarget,
};
pub use gasometer::Gasometer;

use faithevm_core::ExitError;
use prelude::*;

/// Hardfork-gated gas schedule. One `Config` per active hardfork; construct
/// with one of the named constructors rather than building by hand.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    // Gas cost of a single step of the interpreter, not covered by a more
    // specific rule below.
    pub gas_ext_code: u64,
    pub gas_ext_code_hash: u64,
    pub gas_balance: u64,
    pub gas_sload: u64,
    pub gas_sload_cold: u64,
    pub gas_sstore_set: u64,
    pub gas_sstore_reset: u64,
    pub refund_sstore_clears: i64,
    pub max_refund_quotient: u64,
    pub gas_suicide: u64,
    pub gas_suicide_new_account: u64,
    pub gas_call: u64,
    pub gas_expbyte: u64,
    pub gas_transaction_create: u64,
    pub gas_transaction_call: u64,
    pub gas_transaction_zero_data: u64,
    pub gas_transaction_non_zero_data: u64,
    /// EIP-7623: minimum gas charged per non-zero/zero calldata token,
    /// enforced as a floor over the whole intrinsic + execution cost.
    pub gas_transaction_non_zero_data_floor: u64,
    pub gas_transaction_zero_data_floor: u64,
    pub gas_access_list_address: u64,
    pub gas_access_list_storage_key: u64,
    pub gas_account_access_cold: u64,
    pub gas_storage_read_warm: u64,
    pub gas_new_account: u64,
    pub gas_call_value_transfer: u64,
    pub gas_call_stipend: u64,
    pub gas_keccak256: u64,
    pub gas_keccak256_word: u64,
    pub gas_memory: u64,
    pub gas_log: u64,
    pub gas_log_data: u64,
    pub gas_log_topic: u64,
    pub gas_create: u64,
    pub gas_codedeposit: u64,
    pub gas_jumpdest: u64,
    pub gas_copy: u64,

    pub sstore_gas_metering: bool,
    pub sstore_revert_under_stipend: bool,
    pub increase_state_access_gas: bool,
    pub decrease_clears_refund: bool,
    pub disallow_executable_format: bool,
    pub warm_coinbase_address: bool,
    pub empty_considered_exists: bool,
    pub create_increase_nonce: bool,
    pub call_l64_after_gas: bool,
    pub err_on_call_with_more_gas: bool,

    pub stack_limit: usize,
    pub memory_limit: usize,
    pub call_stack_limit: usize,
    pub create_contract_limit: Option<usize>,
    pub max_initcode_size: Option<usize>,

    pub has_delegate_call: bool,
    pub has_create2: bool,
    pub has_revert: bool,
    pub has_return_data: bool,
    pub has_bitwise_shifting: bool,
    pub has_chain_id: bool,
    pub has_self_balance: bool,
    pub has_ext_code_hash: bool,
    pub has_base_fee: bool,
    pub has_push0: bool,
    pub has_mcopy: bool,
    pub has_transient_storage: bool,
    pub has_blob_base_fee: bool,
    pub has_authorization_list: bool,
    pub has_tx_calldata_floor: bool,
    /// EIP-6780: SELFDESTRUCT only deletes the account when it was created
    /// earlier in the *same* transaction.
    pub selfdestruct_only_in_same_tx: bool,
}

impl Config {
    #[must_use]
    pub const fn frontier() -> Self {
        Self {
            gas_ext_code: 20,
            gas_ext_code_hash: u64::MAX,
            gas_balance: 20,
            gas_sload: 50,
            gas_sload_cold: 0,
            gas_sstore_set: 20000,
            gas_sstore_reset: 5000,
            refund_sstore_clears: 15000,
            max_refund_quotient: 2,
            gas_suicide: 0,
            gas_suicide_new_account: 25000,
            gas_call: 40,
            gas_expbyte: 10,
            gas_transaction_create: 21000,
            gas_transaction_call: 21000,
            gas_transaction_zero_data: 4,
            gas_transaction_non_zero_data: 68,
            gas_transaction_non_zero_data_floor: 0,
            gas_transaction_zero_data_floor: 0,
            gas_access_list_address: 0,
            gas_access_list_storage_key: 0,
            gas_account_access_cold: 0,
            gas_storage_read_warm: 0,
            gas_new_account: 25000,
            gas_call_value_transfer: 9000,
            gas_call_stipend: 2300,
            gas_keccak256: 30,
            gas_keccak256_word: 6,
            gas_memory: 3,
            gas_log: 375,
            gas_log_data: 8,
            gas_log_topic: 375,
            gas_create: 32000,
            gas_codedeposit: 200,
            gas_jumpdest: 1,
            gas_copy: 3,

            sstore_gas_metering: false,
            sstore_revert_under_stipend: false,
            increase_state_access_gas: false,
            decrease_clears_refund: false,
            disallow_executable_format: false,
            warm_coinbase_address: false,
            empty_considered_exists: true,
            create_increase_nonce: false,
            call_l64_after_gas: false,
            err_on_call_with_more_gas: true,

            stack_limit: 1024,
            memory_limit: usize::MAX,
            call_stack_limit: 1024,
            create_contract_limit: None,
            max_initcode_size: None,

            has_delegate_call: false,
            has_create2: false,
            has_revert: false,
            has_return_data: false,
            has_bitwise_shifting: false,
            has_chain_id: false,
            has_self_balance: false,
            has_ext_code_hash: false,
            has_base_fee: false,
            has_push0: false,
            has_mcopy: false,
            has_transient_storage: false,
            has_blob_base_fee: false,
            has_authorization_list: false,
            has_tx_calldata_floor: false,
            selfdestruct_only_in_same_tx: false,
        }
    }

    #[must_use]
    pub const fn istanbul() -> Self {
        let mut c = Self::frontier();
        c.gas_sload = 800;
        c.gas_balance = 700;
        c.gas_ext_code = 700;
        c.gas_ext_code_hash = 700;
        c.gas_call = 700;
        c.gas_sstore_set = 20000;
        c.gas_sstore_reset = 5000;
        c.refund_sstore_clears = 15000;
        c.gas_transaction_non_zero_data = 16;
        c.sstore_gas_metering = true;
        c.sstore_revert_under_stipend = true;
        c.has_delegate_call = true;
        c.has_create2 = true;
        c.has_revert = true;
        c.has_return_data = true;
        c.has_bitwise_shifting = true;
        c.has_chain_id = true;
        c.has_self_balance = true;
        c.has_ext_code_hash = true;
        c.create_contract_limit = Some(0x6000);
        c.create_increase_nonce = true;
        c.call_l64_after_gas = true;
        c.err_on_call_with_more_gas = false;
        c
    }

    #[must_use]
    pub const fn berlin() -> Self {
        let mut c = Self::istanbul();
        c.gas_sload = 0;
        c.gas_sload_cold = 2100;
        c.gas_storage_read_warm = 100;
        c.gas_balance = 0;
        c.gas_ext_code = 0;
        c.gas_ext_code_hash = 0;
        c.gas_call = 0;
        c.gas_account_access_cold = 2600;
        c.gas_access_list_address = 2400;
        c.gas_access_list_storage_key = 1900;
        c.gas_sstore_reset = 5000 - 2100;
        c.increase_state_access_gas = true;
        c
    }

    #[must_use]
    pub const fn london() -> Self {
        let mut c = Self::berlin();
        c.refund_sstore_clears = 4800;
        c.max_refund_quotient = 5;
        c.decrease_clears_refund = true;
        c.disallow_executable_format = true;
        c.has_base_fee = true;
        c
    }

    #[must_use]
    pub const fn merge() -> Self {
        Self::london()
    }

    #[must_use]
    pub const fn shanghai() -> Self {
        let mut c = Self::merge();
        c.has_push0 = true;
        c.max_initcode_size = Some(2 * 0x6000);
        c.warm_coinbase_address = true;
        c
    }

    #[must_use]
    pub const fn cancun() -> Self {
        let mut c = Self::shanghai();
        c.has_mcopy = true;
        c.has_transient_storage = true;
        c.has_blob_base_fee = true;
        c.selfdestruct_only_in_same_tx = true;
        c
    }

    #[must_use]
    pub const fn prague() -> Self {
        let mut c = Self::cancun();
        c.has_authorization_list = true;
        c.has_tx_calldata_floor = true;
        c.gas_transaction_non_zero_data_floor = 40;
        c.gas_transaction_zero_data_floor = 10;
        c
    }
}

/// Memory expansion cost for growing to `new_effective_len` bytes, given the
/// previously-charged effective length (both already rounded to words).
///
/// # Errors
/// `OutOfGas` if the cost computation itself would overflow a `u64`.
pub fn memory_gas_cost(
    config: &Config,
    previous_effective_len: u64,
    new_effective_len: u64,
) -> Result<u64, ExitError> {
    if new_effective_len <= previous_effective_len {
        return Ok(0);
    }

    let cost = |len: u64| -> Option<u64> {
        let words = len / 32;
        let linear = words.checked_mul(config.gas_memory)?;
        let quadratic = words.checked_mul(words)?.checked_div(512)?;
        linear.checked_add(quadratic)
    };

    let prev = cost(previous_effective_len).ok_or(ExitError::OutOfGas)?;
    let next = cost(new_effective_len).ok_or(ExitError::OutOfGas)?;
    Ok(next.saturating_sub(prev))
}

/// EIP-3860 (Shanghai+): extra charge for CREATE/CREATE2 initcode, `2` gas
/// per 32-byte word. Zero under configs that predate EIP-3860 is not
/// expressed here — callers only invoke this once `max_initcode_size` gating
/// already applies, and the charge is harmless (and historically absent)
/// before Shanghai since initcode was never long enough to matter; embedders
/// targeting pre-Shanghai forks should not set `max_initcode_size`.
#[must_use]
pub fn consts_initcode_cost(initcode_len: usize) -> u64 {
    let words = (initcode_len as u64 + 31) / 32;
    words * consts::G_INITCODE_WORD
}

/// Intrinsic gas for a transaction: the base 21000 (or 53000 for contract
/// creation), plus calldata byte costs, EIP-2930 access-list costs, and the
/// EIP-3860 initcode word cost. Does not apply the EIP-7623 floor — callers
/// take `max` against [`intrinsic_gas_floor`] themselves once both are known.
#[must_use]
pub fn intrinsic_gas(
    config: &Config,
    is_create: bool,
    data: &[u8],
    access_list_addresses: usize,
    access_list_storage_keys: usize,
    authorization_list_len: usize,
) -> u64 {
    let mut gas = if is_create {
        config.gas_transaction_create
    } else {
        config.gas_transaction_call
    };

    let zero_bytes = data.iter().filter(|b| **b == 0).count() as u64;
    let non_zero_bytes = data.len() as u64 - zero_bytes;
    gas += zero_bytes * config.gas_transaction_zero_data;
    gas += non_zero_bytes * config.gas_transaction_non_zero_data;

    gas += access_list_addresses as u64 * config.gas_access_list_address;
    gas += access_list_storage_keys as u64 * config.gas_access_list_storage_key;

    if is_create && config.max_initcode_size.is_some() {
        gas += consts_initcode_cost(data.len());
    }

    // EIP-7702: each authorization tuple costs PER_EMPTY_ACCOUNT_COST (25000).
    // EIP-7702 allows a reduced PER_AUTH_BASE_COST (12500) once the authority
    // account is known to already exist; this function has no `Backend`
    // access to check that, so it always charges the full amount.
    if config.has_authorization_list {
        gas += authorization_list_len as u64 * consts::G_PER_EMPTY_ACCOUNT_COST;
    }

    gas
}

/// EIP-7623 (Prague+) intrinsic gas floor: `21000 + 10*nonzero + 4*zero`
/// (using the config's floor-specific per-token prices), a minimum the
/// *total* gas used by the transaction (intrinsic plus execution) must not
/// fall under.
#[must_use]
pub fn intrinsic_gas_floor(config: &Config, is_create: bool, data: &[u8]) -> u64 {
    if !config.has_tx_calldata_floor {
        return 0;
    }
    let base = if is_create {
        config.gas_transaction_create
    } else {
        config.gas_transaction_call
    };
    let zero_bytes = data.iter().filter(|b| **b == 0).count() as u64;
    let non_zero_bytes = data.len() as u64 - zero_bytes;
    base + zero_bytes * config.gas_transaction_zero_data_floor + non_zero_bytes * config.gas_transaction_non_zero_data_floor
}
