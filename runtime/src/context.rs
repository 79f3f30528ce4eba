use faithevm_core::prelude::*;
use primitive_types::{H160, H256, U256};

/// Execution context of the currently-running frame: who it believes it is,
/// who called it, and what value it was called with. Distinct from the
/// *address being executed*, which CALLCODE/DELEGATECALL can point elsewhere
/// than `address`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Context {
    /// `ADDRESS`: the account whose storage this frame reads and writes.
    pub address: H160,
    /// `CALLER`.
    pub caller: H160,
    /// `CALLVALUE`.
    pub apparent_value: U256,
}

/// How a CREATE/CREATE2 chooses its target address.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CreateScheme {
    /// CREATE2: `keccak256(0xff ++ caller ++ salt ++ keccak256(initcode))[12..]`.
    Create2 { caller: H160, salt: H256 },
    /// CREATE: RLP(caller, nonce).
    Legacy { caller: H160 },
    /// EIP-7702 delegation designators never run CREATE; reserved for a
    /// host that wants to materialize a contract at a fixed address
    /// (used by test harnesses, not by the interpreter itself).
    Fixed(H160),
}

impl CreateScheme {
    #[must_use]
    pub const fn caller(&self) -> Option<H160> {
        match self {
            Self::Create2 { caller, .. } | Self::Legacy { caller } => Some(*caller),
            Self::Fixed(_) => None,
        }
    }
}

/// Which of CALL/CALLCODE/DELEGATECALL/STATICCALL triggered a nested call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CallScheme {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

/// A value transfer the host must apply atomically with entering the
/// nested frame (so a failing call never partially moves value).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transfer {
    pub source: H160,
    pub target: H160,
    pub value: U256,
}
