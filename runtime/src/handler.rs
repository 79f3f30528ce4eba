use crate::context::{Context, CreateScheme, Transfer};
use faithevm_core::prelude::*;
use faithevm_core::{ExitError, ExitReason};
use primitive_types::{H160, H256, U256};

/// Outcome of a resolved CALL-family trap.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallFeedback {
    pub reason: ExitReason,
    pub return_data: Vec<u8>,
}

/// Outcome of a resolved CREATE-family trap.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateFeedback {
    pub reason: ExitReason,
    pub address: Option<H160>,
    pub return_data: Vec<u8>,
}

/// The world-state contract the runtime needs to evaluate a system opcode.
/// Implemented by the orchestrator (the `StackExecutor` in the root crate),
/// never directly by embedders: this trait's job is to let
/// `faithevm-runtime` stay host-agnostic while still calling back into
/// whatever maintains balances, code, and storage.
///
/// CALL/CREATE are resolved synchronously: the orchestrator runs the nested
/// frame to completion (recursively) before returning, rather than handing
/// a continuation back to the caller. Call depth is bounded by
/// `Config::call_stack_limit`, so this recursion is itself bounded.
pub trait Handler {
    fn balance(&self, address: H160) -> U256;
    fn code_size(&self, address: H160) -> U256;
    fn code_hash(&self, address: H160) -> H256;
    fn code(&self, address: H160) -> Vec<u8>;
    fn storage(&self, address: H160, index: H256) -> H256;
    fn original_storage(&self, address: H160, index: H256) -> H256;
    fn transient_storage(&self, address: H160, index: H256) -> H256;

    fn gas_price(&self) -> U256;
    fn origin(&self) -> H160;
    fn block_hash(&self, number: U256) -> H256;
    fn block_number(&self) -> U256;
    fn block_coinbase(&self) -> H160;
    fn block_timestamp(&self) -> U256;
    fn block_difficulty(&self) -> U256;
    fn block_randomness(&self) -> Option<H256>;
    fn block_gas_limit(&self) -> U256;
    fn block_base_fee_per_gas(&self) -> U256;
    fn blob_base_fee_per_gas(&self) -> U256;
    fn blob_hash(&self, index: usize) -> Option<H256>;
    fn chain_id(&self) -> U256;

    fn exists(&self, address: H160) -> bool;
    fn deleted(&self, address: H160) -> bool;
    fn is_cold(&mut self, address: H160, index: Option<H256>) -> bool;

    /// # Errors
    /// Returns the write's failure reason (e.g. static context).
    fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError>;
    fn set_transient_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError>;

    /// # Errors
    /// Returns the transfer's failure reason (e.g. insufficient balance).
    fn transfer(&mut self, transfer: Transfer) -> Result<(), ExitError>;

    /// # Errors
    /// Returns the write's failure reason (e.g. static context).
    fn mark_delete(&mut self, address: H160, target: H160) -> Result<(), ExitError>;

    /// # Errors
    /// Returns the write's failure reason (e.g. static context).
    fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError>;

    /// Run a CREATE/CREATE2 to completion and report the outcome.
    fn create(
        &mut self,
        caller: H160,
        scheme: CreateScheme,
        value: U256,
        init_code: Vec<u8>,
        target_gas: Option<u64>,
    ) -> CreateFeedback;

    /// Run a CALL/CALLCODE/DELEGATECALL/STATICCALL to completion and report
    /// the outcome.
    #[allow(clippy::too_many_arguments)]
    fn call(
        &mut self,
        code_address: H160,
        transfer: Option<Transfer>,
        input: Vec<u8>,
        target_gas: Option<u64>,
        is_static: bool,
        context: Context,
    ) -> CallFeedback;

    /// Gas remaining in the *current* frame, for the GAS opcode. Distinct
    /// from `target_gas` passed to `call`/`create`, which is what the callee
    /// will receive after the 63/64 rule.
    fn gas_left(&self) -> u64;
}
