//! A trivial in-memory [`Backend`] for driving whole transactions in tests.
//! No trie, no persistence: just the account/storage maps the `Backend`
//! trait asks for, seeded by hand per test.

use faithevm::backend::{Backend, Basic, Env};
use primitive_types::{H160, H256, U256};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
pub struct Account {
    pub basic: Basic,
    pub code: Vec<u8>,
    pub storage: BTreeMap<H256, H256>,
}

pub struct InMemoryBackend {
    pub env: Env,
    pub accounts: BTreeMap<H160, Account>,
}

impl InMemoryBackend {
    pub fn new(env: Env) -> Self {
        Self { env, accounts: BTreeMap::new() }
    }

    pub fn fund(&mut self, address: H160, balance: U256) {
        self.accounts.entry(address).or_default().basic.balance = balance;
    }

    pub fn set_code(&mut self, address: H160, code: Vec<u8>) {
        self.accounts.entry(address).or_default().code = code;
    }

    pub fn set_storage(&mut self, address: H160, key: H256, value: H256) {
        self.accounts.entry(address).or_default().storage.insert(key, value);
    }
}

pub fn test_env() -> Env {
    Env {
        chain_id: U256::one(),
        block_number: U256::from(1),
        block_coinbase: H160::repeat_byte(0xc0),
        block_timestamp: U256::from(1_700_000_000u64),
        block_difficulty: U256::zero(),
        block_randomness: Some(H256::repeat_byte(0x42)),
        block_gas_limit: U256::from(30_000_000u64),
        block_base_fee_per_gas: U256::from(7u64),
        blob_base_fee_per_gas: U256::one(),
        blob_hashes: Vec::new(),
        gas_price: U256::from(10u64),
        origin: H160::zero(),
    }
}

impl Backend for InMemoryBackend {
    fn env(&self) -> &Env {
        &self.env
    }

    fn exists(&self, address: H160) -> bool {
        self.accounts.contains_key(&address)
    }

    fn basic(&self, address: H160) -> Basic {
        self.accounts.get(&address).map(|a| a.basic).unwrap_or_default()
    }

    fn code(&self, address: H160) -> Vec<u8> {
        self.accounts.get(&address).map(|a| a.code.clone()).unwrap_or_default()
    }

    fn code_hash(&self, address: H160) -> H256 {
        use sha3::{Digest, Keccak256};
        H256::from_slice(&Keccak256::digest(self.code(address)))
    }

    fn storage(&self, address: H160, index: H256) -> H256 {
        self.accounts.get(&address).and_then(|a| a.storage.get(&index)).copied().unwrap_or_default()
    }

    fn original_storage(&self, address: H160, index: H256) -> H256 {
        self.storage(address, index)
    }

    fn block_hash(&self, number: U256) -> H256 {
        let mut bytes = [0u8; 32];
        number.to_big_endian(&mut bytes);
        H256::from_slice(&bytes)
    }
}
