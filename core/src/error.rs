//! The error taxonomy. Every abnormal outcome of a frame is exactly one of
//! these kinds.

use crate::prelude::*;
use crate::Opcode;

/// Exit is either a reason, or a trap that hands control to the caller
/// (e.g. CALL/CREATE waiting for a nested Frame to run).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Capture<E, T> {
    Exit(E),
    Trap(T),
}

/// Opcodes that interrupt bytecode execution to ask the orchestrator to run
/// a nested call or contract creation.
pub type Trap = Opcode;

/// Why a frame stopped running.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExitReason {
    /// Frame returned normally.
    Succeed(ExitSucceed),
    /// Frame reverted: output is preserved, unused gas is returned.
    Revert(ExitRevert),
    /// Frame trapped: all gas forwarded to it is consumed.
    Error(ExitError),
    /// Non-recoverable condition; propagates out of the executor entirely.
    Fatal(ExitFatal),
}

impl ExitReason {
    /// True for `Succeed`.
    #[must_use]
    pub const fn is_succeed(&self) -> bool {
        matches!(self, Self::Succeed(_))
    }

    /// True for `Error` or `Fatal` (i.e. not a clean return or revert).
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_) | Self::Fatal(_))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExitSucceed {
    Stopped,
    Returned,
    Suicided,
}

impl From<ExitSucceed> for ExitReason {
    fn from(s: ExitSucceed) -> Self {
        Self::Succeed(s)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExitRevert {
    Reverted,
}

impl From<ExitRevert> for ExitReason {
    fn from(s: ExitRevert) -> Self {
        Self::Revert(s)
    }
}

/// Traps: the abnormal conditions that halt a frame and forfeit any gas
/// forwarded to it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExitError {
    /// Any gas charge that would drive `gas_remaining` negative.
    OutOfGas,
    /// A memory address exceeds `memory_limit`, or an offset/length pair
    /// overflows `usize`. Reads past calldata/code are *not* this error —
    /// those zero-extend.
    InvalidRange,
    /// Alias of `InvalidRange` used by copy opcodes; kept distinct because
    /// the reference implementation also distinguishes them.
    OutOfOffset,
    /// A `usize` conversion from `U256` would lose information.
    UsizeOverflow,
    StackUnderflow,
    StackOverflow,
    /// JUMP/JUMPI target not flagged by the bytecode analyzer.
    InvalidJump,
    /// Undefined opcode byte, or an opcode introduced after the active
    /// hardfork.
    InvalidCode(Opcode),
    /// Deployed code begins with the EOF prefix `0xEF` (EIP-3541, Berlin+) or
    /// attempted to deploy legacy code under a hardfork that forbids it.
    CreateContractStartingWithEF,
    /// State-mutating opcode attempted while `is_static`.
    WriteInStaticContext,
    /// CREATE/CREATE2 target already has code or nonce >= 1.
    CreateCollision,
    /// Deployed code length exceeds `max_bytecode_size` (EIP-170, Spurious+).
    CreateContractLimit,
    /// Initcode length exceeds `max_initcode_size` (EIP-3860, Shanghai+).
    InvalidCreateInitCodeSize,
    /// CREATE attempted into an account with no existing code/storage, but
    /// construction otherwise failed before any code ran.
    CreateEmpty,
    /// Call depth would exceed `max_call_depth`.
    CallTooDeep,
    /// Value transfer attempted without sufficient balance.
    OutOfFund,
    /// Sender nonce has reached `u64::MAX`.
    MaxNonce,
    /// PC underflowed (reserved for host-triggered rewinds; unused by the
    /// interpreter itself but kept for API parity with the error model).
    PCUnderflow,
    /// Debug iteration cap exceeded (see `Config::loop_quota`). Never set in
    /// release builds.
    ExecutionTimeout,
    Other(Cow<'static, str>),
}

impl From<ExitError> for ExitReason {
    fn from(s: ExitError) -> Self {
        Self::Error(s)
    }
}

/// Non-recoverable conditions: host I/O failures, allocator failures, or an
/// interpreter invariant violation. These propagate out of the executor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExitFatal {
    NotSupported,
    UnhandledInterrupt,
    CallErrorAsFatal(ExitError),
    Other(Cow<'static, str>),
}

impl From<ExitFatal> for ExitReason {
    fn from(s: ExitFatal) -> Self {
        Self::Fatal(s)
    }
}

impl From<ExitError> for Capture<ExitReason, Trap> {
    fn from(error: ExitError) -> Self {
        Self::Exit(error.into())
    }
}

impl From<ExitFatal> for Capture<ExitReason, Trap> {
    fn from(fatal: ExitFatal) -> Self {
        Self::Exit(fatal.into())
    }
}
