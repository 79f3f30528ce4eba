//! Per-opcode cost lookups. Static costs are a fixed constant known without
//! looking at the stack; dynamic costs need the popped operands (memory
//! range, number of topics, target address) and an access-list verdict from
//! the caller since only the caller (the Storage/Access-list manager) knows
//! whether a given slot/address is already warm.

use crate::consts::*;
use crate::utils::log2floor;
use crate::Config;
use faithevm_core::{ExitError, Opcode};
use primitive_types::U256;

/// What a dynamic-cost opcode needs priced: either a storage slot or an
/// external account, each potentially cold or warm.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StorageTarget {
    Slot { cold: bool },
    Address { cold: bool },
}

/// Resolved gas cost of one opcode. `cost` is what to deduct up front;
/// `refund` is what to later add back into the running refund counter (only
/// SSTORE produces a nonzero refund, and only on certain transitions).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GasCost {
    pub cost: u64,
    pub refund: i64,
}

impl GasCost {
    const fn flat(cost: u64) -> Self {
        Self { cost, refund: 0 }
    }
}

/// Cost of an opcode that needs no operand inspection.
///
/// # Errors
/// `InvalidCode` if `opcode` has no static cost under `config` (either it is
/// a dynamic-cost opcode, or it was not introduced yet).
pub fn static_opcode_cost(config: &Config, opcode: Opcode) -> Result<u64, ExitError> {
    let cost = match opcode {
        Opcode::STOP | Opcode::RETURN | Opcode::REVERT => G_ZERO,
        Opcode::ADD
        | Opcode::SUB
        | Opcode::NOT
        | Opcode::LT
        | Opcode::GT
        | Opcode::SLT
        | Opcode::SGT
        | Opcode::EQ
        | Opcode::ISZERO
        | Opcode::AND
        | Opcode::OR
        | Opcode::XOR
        | Opcode::BYTE
        | Opcode::SHL
        | Opcode::SHR
        | Opcode::SAR
        | Opcode::CALLDATALOAD
        | Opcode::MLOAD
        | Opcode::MSTORE
        | Opcode::MSTORE8
        | Opcode::PUSH0
        | Opcode::POP
        | Opcode::PC
        | Opcode::MSIZE
        | Opcode::GAS => G_VERYLOW,
        Opcode::MUL | Opcode::DIV | Opcode::SDIV | Opcode::MOD | Opcode::SMOD | Opcode::SIGNEXTEND => G_LOW,
        Opcode::ADDMOD | Opcode::MULMOD | Opcode::JUMP => G_MID,
        Opcode::JUMPI => G_HIGH,
        Opcode::ADDRESS
        | Opcode::ORIGIN
        | Opcode::CALLER
        | Opcode::CALLVALUE
        | Opcode::CALLDATASIZE
        | Opcode::CODESIZE
        | Opcode::GASPRICE
        | Opcode::COINBASE
        | Opcode::TIMESTAMP
        | Opcode::NUMBER
        | Opcode::PREVRANDAO
        | Opcode::GASLIMIT
        | Opcode::RETURNDATASIZE => G_BASE,
        Opcode::CHAINID if config.has_chain_id => G_BASE,
        Opcode::SELFBALANCE if config.has_self_balance => G_VERYLOW,
        Opcode::BASEFEE if config.has_base_fee => G_BASE,
        Opcode::BLOBBASEFEE if config.has_blob_base_fee => G_BASE,
        Opcode::BLOBHASH if config.has_blob_base_fee => G_VERYLOW,
        Opcode::TLOAD | Opcode::TSTORE if config.has_transient_storage => G_WARM_ACCESS,
        Opcode::JUMPDEST => G_BASE / 2, // 1
        Opcode::MCOPY if config.has_mcopy => G_VERYLOW,
        _ if opcode.is_push().is_some() => G_VERYLOW,
        _ if opcode.is_dup().is_some() => G_VERYLOW,
        _ if opcode.is_swap().is_some() => G_VERYLOW,
        _ => return Err(ExitError::InvalidCode(opcode)),
    };
    Ok(cost)
}

/// EXP's gas cost: `G_EXP + G_EXPBYTE * (bytes needed to hold the exponent)`.
#[must_use]
pub fn exp_cost(config: &Config, power: U256) -> u64 {
    if power.is_zero() {
        10
    } else {
        let bytes = log2floor(power) / 8 + 1;
        10 + config.gas_expbyte * bytes
    }
}

/// KECCAK256's gas cost for hashing `len` bytes.
#[must_use]
pub fn keccak256_cost(config: &Config, len: u64) -> u64 {
    let words = (len + 31) / 32;
    config.gas_keccak256 + config.gas_keccak256_word * words
}

/// A copy opcode's (CODECOPY/CALLDATACOPY/EXTCODECOPY/RETURNDATACOPY) cost
/// for copying `len` bytes, not including any access-list charge.
#[must_use]
pub fn copy_cost(config: &Config, len: u64) -> u64 {
    let words = (len + 31) / 32;
    config.gas_copy * words
}

/// LOG0..LOG4's cost for `topics` topics and `data_len` bytes of data.
#[must_use]
pub fn log_cost(config: &Config, topics: u64, data_len: u64) -> u64 {
    config.gas_log + config.gas_log_topic * topics + config.gas_log_data * data_len
}

/// SLOAD's dynamic cost, given whether the slot is already warm.
#[must_use]
pub fn sload_cost(config: &Config, cold: bool) -> u64 {
    if config.increase_state_access_gas {
        if cold {
            config.gas_sload_cold
        } else {
            config.gas_storage_read_warm
        }
    } else {
        config.gas_sload
    }
}

/// Cost of touching an external account (BALANCE/EXTCODESIZE/EXTCODEHASH/
/// EXTCODECOPY/the address component of CALL-family), given warmth.
#[must_use]
pub fn account_access_cost(config: &Config, cold: bool, warm_cost: u64) -> u64 {
    if config.increase_state_access_gas {
        if cold {
            config.gas_account_access_cold
        } else {
            config.gas_storage_read_warm
        }
    } else {
        warm_cost
    }
}

/// SSTORE gas cost and refund delta, computed per EIP-2200/3529: compares
/// `original` (value at transaction start), `current` (value before this
/// SSTORE), and `new` (value being written).
#[must_use]
pub fn sstore_cost(config: &Config, original: U256, current: U256, new: U256, cold: bool) -> GasCost {
    if !config.sstore_gas_metering {
        // Pre-Istanbul: flat cost keyed only on current/new.
        let cost = if current == U256::zero() && new != U256::zero() {
            config.gas_sstore_set
        } else {
            config.gas_sstore_reset
        };
        let refund = if current != U256::zero() && new == U256::zero() {
            config.refund_sstore_clears
        } else {
            0
        };
        return GasCost { cost, refund };
    }

    let cold_surcharge = if cold { config.gas_sload_cold } else { 0 };

    if current == new {
        let warm = if config.increase_state_access_gas {
            config.gas_storage_read_warm
        } else {
            config.gas_sload
        };
        return GasCost {
            cost: warm + cold_surcharge,
            refund: 0,
        };
    }

    if original == current {
        if original == U256::zero() {
            return GasCost {
                cost: config.gas_sstore_set + cold_surcharge,
                refund: 0,
            };
        }
        let refund = if new == U256::zero() {
            config.refund_sstore_clears
        } else {
            0
        };
        return GasCost {
            cost: config.gas_sstore_reset + cold_surcharge,
            refund,
        };
    }

    // Dirty slot: slot already diverges from its transaction-start value.
    let warm = if config.increase_state_access_gas {
        config.gas_storage_read_warm
    } else {
        config.gas_sload
    };
    let mut refund: i64 = 0;
    if original != U256::zero() {
        if current == U256::zero() {
            refund -= config.refund_sstore_clears;
        }
        if new == U256::zero() {
            refund += config.refund_sstore_clears;
        }
    }
    if original == new {
        if original == U256::zero() {
            refund += (config.gas_sstore_set - warm) as i64;
        } else {
            refund += (config.gas_sstore_reset - warm) as i64;
        }
    }

    GasCost {
        cost: warm + cold_surcharge,
        refund,
    }
}

/// Whether `opcode` is introduced under `config`'s hardfork. Checked once, up
/// front, by the orchestrator's `before_bytecode` hook, so neither
/// `static_opcode_cost` nor `dynamic_opcode_cost` need to repeat these gates
/// (and so a disabled opcode fails with `InvalidCode` before any gas is
/// charged against it, matching how the reference clients reject them at the
/// same fork boundary they were introduced).
#[must_use]
pub fn opcode_enabled(config: &Config, opcode: Opcode) -> bool {
    match opcode {
        Opcode::SHL | Opcode::SHR | Opcode::SAR => config.has_bitwise_shifting,
        Opcode::REVERT => config.has_revert,
        Opcode::RETURNDATASIZE | Opcode::RETURNDATACOPY => config.has_return_data,
        Opcode::DELEGATECALL => config.has_delegate_call,
        // No dedicated flag distinguishes Byzantium from Homestead; STATICCALL
        // and REVERT were introduced in the same hardfork, so `has_revert`
        // doubles as the marker for both.
        Opcode::STATICCALL => config.has_revert,
        Opcode::CREATE2 => config.has_create2,
        Opcode::EXTCODEHASH => config.has_ext_code_hash,
        Opcode::CHAINID => config.has_chain_id,
        Opcode::SELFBALANCE => config.has_self_balance,
        Opcode::BASEFEE => config.has_base_fee,
        Opcode::PUSH0 => config.has_push0,
        Opcode::MCOPY => config.has_mcopy,
        Opcode::TLOAD | Opcode::TSTORE => config.has_transient_storage,
        Opcode::BLOBBASEFEE | Opcode::BLOBHASH => config.has_blob_base_fee,
        _ => true,
    }
}

/// Dynamic cost dispatch for the opcodes whose price depends on operands or
/// warmth (everything not covered by `static_opcode_cost`). Returns `None`
/// for opcodes this module doesn't price directly (CALL-family gas
/// forwarding is priced by the orchestrator, which knows the 63/64 rule and
/// the stipend).
#[must_use]
pub fn dynamic_opcode_cost(
    config: &Config,
    opcode: Opcode,
    target: Option<StorageTarget>,
) -> Option<GasCost> {
    match (opcode, target) {
        (Opcode::SLOAD, Some(StorageTarget::Slot { cold })) => Some(GasCost::flat(sload_cost(config, cold))),
        (Opcode::BALANCE | Opcode::EXTCODESIZE | Opcode::EXTCODEHASH, Some(StorageTarget::Address { cold })) => {
            let warm = match opcode {
                Opcode::BALANCE => config.gas_balance,
                Opcode::EXTCODESIZE => config.gas_ext_code,
                Opcode::EXTCODEHASH => config.gas_ext_code_hash,
                _ => unreachable!(),
            };
            Some(GasCost::flat(account_access_cost(config, cold, warm)))
        }
        _ => None,
    }
}
