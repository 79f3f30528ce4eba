//! Gas constants that do not vary by hardfork.

/// G_verylow: most arithmetic/stack/memory opcodes.
pub const G_VERYLOW: u64 = 3;
/// G_low: slightly pricier arithmetic (MUL, DIV, MOD, SIGNEXTEND of 256-bit words).
pub const G_LOW: u64 = 5;
/// G_mid: ADDMOD, MULMOD, JUMP.
pub const G_MID: u64 = 8;
/// G_high: JUMPI.
pub const G_HIGH: u64 = 10;
/// G_base: PC, POP, and other single-cycle opcodes with no other rule.
pub const G_BASE: u64 = 2;
/// G_zero: STOP, RETURN, REVERT.
pub const G_ZERO: u64 = 0;
/// EIP-3860 initcode word cost.
pub const G_INITCODE_WORD: u64 = 2;
/// EIP-2929 access-list-precharge per address/key, already included once.
pub const G_COLD_ACCOUNT_ACCESS: u64 = 2600;
pub const G_COLD_SLOAD: u64 = 2100;
pub const G_WARM_ACCESS: u64 = 100;
/// EIP-7702: full per-authorization-tuple intrinsic charge (refunded to
/// `G_PER_AUTH_BASE_COST` if the authority account already exists).
pub const G_PER_EMPTY_ACCOUNT_COST: u64 = 25000;
/// EIP-7702: per-authorization-tuple charge once the authority is known to exist.
pub const G_PER_AUTH_BASE_COST: u64 = 12500;
/// EIP-150: a CALL/CREATE forwards at most 63/64 of the gas remaining.
pub const G_CALL_STIPEND: u64 = 2300;
/// Value-bearing CALL/CALLCODE surcharge.
pub const G_CALL_VALUE: u64 = 9000;
/// Surcharge for a CALL that creates a previously nonexistent account.
pub const G_NEW_ACCOUNT: u64 = 25000;
