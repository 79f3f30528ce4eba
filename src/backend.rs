//! The read-only view of world state the orchestrator is built against.
//! Embedders implement this once per storage backend (in-memory for tests,
//! a trie-backed database in a full node); the orchestrator layers warm/cold
//! tracking, transient storage, and snapshot/revert on top via
//! [`crate::executor::stack::MemoryStackState`] or an equivalent.

use crate::prelude::*;
use primitive_types::{H160, H256, U256};

/// Immutable facts about the current block and chain, read by BLOCKHASH,
/// COINBASE, TIMESTAMP, NUMBER, PREVRANDAO, GASLIMIT, BASEFEE, BLOBBASEFEE,
/// CHAINID and ORIGIN/GASPRICE.
#[derive(Clone, Debug)]
pub struct Env {
    pub chain_id: U256,
    pub block_number: U256,
    pub block_coinbase: H160,
    pub block_timestamp: U256,
    pub block_difficulty: U256,
    pub block_randomness: Option<H256>,
    pub block_gas_limit: U256,
    pub block_base_fee_per_gas: U256,
    pub blob_base_fee_per_gas: U256,
    pub blob_hashes: Vec<H256>,
    pub gas_price: U256,
    pub origin: H160,
}

/// World state as of the start of the current transaction. Never mutated by
/// the orchestrator directly; all writes during execution go through the
/// substate so they can be rolled back on revert.
pub trait Backend {
    fn env(&self) -> &Env;

    fn exists(&self, address: H160) -> bool;
    fn basic(&self, address: H160) -> Basic;
    fn code(&self, address: H160) -> Vec<u8>;
    fn code_hash(&self, address: H160) -> H256;
    fn storage(&self, address: H160, index: H256) -> H256;

    /// Storage value as of the start of the *transaction* (EIP-2200's
    /// `original` operand), independent of what the in-flight substate
    /// currently holds.
    fn original_storage(&self, address: H160, index: H256) -> H256;

    fn block_hash(&self, number: U256) -> H256;
}

/// An account's balance and nonce, the two fields the interpreter reads
/// without touching code or storage.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Basic {
    pub balance: U256,
    pub nonce: U256,
}
