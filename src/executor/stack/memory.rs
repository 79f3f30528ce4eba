//! The Storage Manager: a layered overlay of accounts, storage, and
//! transient storage on top of a read-only [`Backend`], with
//! commit/revert/discard semantics matching the call-frame snapshot stack
//! described for the EVM Orchestrator.

use crate::access_list::AccessList;
use crate::backend::{Backend, Basic, Env};
use crate::prelude::*;
use faithevm_gasometer::Gasometer;
use primitive_types::{H160, H256, U256};

/// One emitted LOG0..LOG4.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Log {
    pub address: H160,
    pub topics: Vec<H256>,
    pub data: Vec<u8>,
}

/// Per-frame gas/refund/static-ness bookkeeping. One of these is created by
/// `spit_child` for every nested CALL/CREATE and merged back into the parent
/// on commit (or discarded on revert).
#[derive(Clone, Debug)]
pub struct StackSubstateMetadata {
    gasometer: Gasometer,
    is_static: bool,
    depth: usize,
}

impl StackSubstateMetadata {
    #[must_use]
    pub const fn new(gas_limit: u64, is_static: bool, depth: usize) -> Self {
        Self {
            gasometer: Gasometer::new(gas_limit),
            is_static,
            depth,
        }
    }

    #[must_use]
    pub fn gasometer(&self) -> &Gasometer {
        &self.gasometer
    }
    pub fn gasometer_mut(&mut self) -> &mut Gasometer {
        &mut self.gasometer
    }
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn spit_child(&self, gas_limit: u64, is_static: bool) -> Self {
        Self::new(gas_limit, is_static || self.is_static, self.depth + 1)
    }

    /// Fold a committed child's used gas and refund back into this frame.
    pub fn swallow_commit(&mut self, child: &Self) {
        self.gasometer.record_stipend(child.gasometer.gas(), child.gasometer.refunded_gas());
    }

    /// Fold a reverted child's used gas (but not its refund) back in.
    pub fn swallow_revert(&mut self, child: &Self) {
        self.gasometer.record_stipend(child.gasometer.gas(), 0);
    }
}

#[derive(Clone, Debug, Default)]
struct Account {
    basic: Option<Basic>,
    code: Option<Vec<u8>>,
    reset_storage: bool,
}

/// One layer of the call-frame stack. Holds only what *this* frame wrote;
/// reads fall through to `parent`, then to the backend.
pub struct MemoryStackSubstate<'backend, 'config, B: Backend> {
    backend: &'backend B,
    config: &'config faithevm_gasometer::Config,
    parent: Option<Box<Self>>,
    metadata: StackSubstateMetadata,
    accounts: BTreeMap<H160, Account>,
    storages: BTreeMap<(H160, H256), H256>,
    transient_storages: BTreeMap<(H160, H256), H256>,
    deletes: BTreeSet<H160>,
    creates: BTreeSet<H160>,
    /// Addresses that were the target of a CALL, a value transfer, or a
    /// CREATE this transaction, whether or not they were written to. Used by
    /// the transaction executor's EIP-161 empty-account cleanup, which only
    /// deletes accounts that were actually touched.
    touches: BTreeSet<H160>,
    logs: Vec<Log>,
    /// Addresses/slots warmed by *this* frame (EIP-2929). Looked up through
    /// the parent chain like `accounts`/`storages`, but — unlike those — a
    /// reverted frame's warming is never merged back into the parent: an
    /// access-list entry warmed only inside a call that itself reverted does
    /// not survive the revert (matches go-ethereum's journaled access list
    /// and this crate's own section-8 revert-identity property).
    accessed: AccessList,
}

impl<'backend, 'config, B: Backend> MemoryStackSubstate<'backend, 'config, B> {
    #[must_use]
    pub fn new(backend: &'backend B, config: &'config faithevm_gasometer::Config, gas_limit: u64) -> Self {
        Self {
            backend,
            config,
            parent: None,
            metadata: StackSubstateMetadata::new(gas_limit, false, 0),
            accounts: BTreeMap::new(),
            storages: BTreeMap::new(),
            transient_storages: BTreeMap::new(),
            deletes: BTreeSet::new(),
            creates: BTreeSet::new(),
            touches: BTreeSet::new(),
            logs: Vec::new(),
            accessed: AccessList::new(),
        }
    }

    #[must_use]
    pub fn metadata(&self) -> &StackSubstateMetadata {
        &self.metadata
    }
    pub fn metadata_mut(&mut self) -> &mut StackSubstateMetadata {
        &mut self.metadata
    }

    /// Push a new child frame for a nested CALL/CREATE.
    pub fn enter(&mut self, gas_limit: u64, is_static: bool) {
        let metadata = self.metadata.spit_child(gas_limit, is_static);
        let parent = core::mem::replace(
            self,
            Self {
                backend: self.backend,
                config: self.config,
                parent: None,
                metadata,
                accounts: BTreeMap::new(),
                storages: BTreeMap::new(),
                transient_storages: BTreeMap::new(),
                deletes: BTreeSet::new(),
                creates: BTreeSet::new(),
                touches: BTreeSet::new(),
                logs: Vec::new(),
                accessed: AccessList::new(),
            },
        );
        self.parent = Some(Box::new(parent));
    }

    fn pop_parent(&mut self) -> Self {
        let parent = self.parent.take().expect("exit called without a matching enter");
        core::mem::replace(self, *parent)
    }

    /// Merge this frame's writes into its parent.
    pub fn exit_commit(&mut self) {
        let child = self.pop_parent();
        self.metadata.swallow_commit(&child.metadata);
        self.accounts.extend(child.accounts);
        self.storages.extend(child.storages);
        self.transient_storages.extend(child.transient_storages);
        self.deletes.extend(child.deletes);
        self.creates.extend(child.creates);
        self.touches.extend(child.touches);
        self.logs.extend(child.logs);
        self.accessed.merge(child.accessed);
    }

    /// Discard this frame's writes on an explicit REVERT, returning its
    /// unused gas to the parent. Touches survive a revert: an account that
    /// was merely *visited* (not written) stays touched for EIP-161 purposes
    /// even if the call that visited it reverted.
    pub fn exit_revert(&mut self) {
        let child = self.pop_parent();
        self.metadata.swallow_revert(&child.metadata);
        self.touches.extend(child.touches);
    }

    /// Discard this frame's writes on a trap (`OutOfGas`, stack violation,
    /// invalid jump, and so on) — unlike `exit_revert`, none of the gas
    /// forwarded to this frame comes back to the parent: the parent already
    /// charged the full forwarded amount up front (`record_cost(after_gas)`
    /// in `call_inner`/`create_inner`), and a trap consumes all of it rather
    /// than only what it spent before failing. Touches still survive, same
    /// as a revert.
    pub fn exit_discard(&mut self) {
        let child = self.pop_parent();
        self.touches.extend(child.touches);
    }

    fn account(&self, address: H160) -> Option<&Account> {
        self.accounts.get(&address).or_else(|| self.parent.as_ref().and_then(|p| p.account(address)))
    }

    #[must_use]
    pub fn known_basic(&self, address: H160) -> Option<Basic> {
        self.account(address).and_then(|a| a.basic)
    }

    #[must_use]
    pub fn basic(&self, address: H160) -> Basic {
        self.known_basic(address).unwrap_or_else(|| self.backend.basic(address))
    }

    #[must_use]
    pub fn known_code(&self, address: H160) -> Option<Vec<u8>> {
        self.account(address).and_then(|a| a.code.clone())
    }

    #[must_use]
    pub fn code(&self, address: H160) -> Vec<u8> {
        self.known_code(address).unwrap_or_else(|| self.backend.code(address))
    }

    #[must_use]
    pub fn exists(&self, address: H160) -> bool {
        if self.account(address).is_some() {
            return true;
        }
        self.backend.exists(address)
    }

    #[must_use]
    pub fn deleted(&self, address: H160) -> bool {
        if self.deletes.contains(&address) {
            return true;
        }
        self.parent.as_ref().is_some_and(|p| p.deleted(address))
    }

    #[must_use]
    pub fn created_this_transaction(&self, address: H160) -> bool {
        if self.creates.contains(&address) {
            return true;
        }
        self.parent.as_ref().is_some_and(|p| p.created_this_transaction(address))
    }

    pub fn mark_created(&mut self, address: H160) {
        self.creates.insert(address);
    }

    fn entry(&mut self, address: H160) -> &mut Account {
        self.accounts.entry(address).or_insert_with(|| Account {
            basic: Some(self.backend.basic(address)),
            code: None,
            reset_storage: false,
        })
    }

    pub fn set_balance(&mut self, address: H160, balance: U256) {
        let basic = self.basic(address);
        self.entry(address).basic = Some(Basic { balance, ..basic });
    }

    pub fn set_nonce(&mut self, address: H160) {
        let basic = self.basic(address);
        self.entry(address).basic = Some(Basic {
            nonce: basic.nonce + U256::one(),
            ..basic
        });
    }

    pub fn set_code(&mut self, address: H160, code: Vec<u8>) {
        self.entry(address).code = Some(code);
    }

    pub fn reset_storage(&mut self, address: H160) {
        self.entry(address).reset_storage = true;
        let to_remove: Vec<_> = self.storages.keys().filter(|(a, _)| *a == address).cloned().collect();
        for key in to_remove {
            self.storages.remove(&key);
        }
    }

    fn storage_reset_since(&self, address: H160) -> bool {
        if let Some(a) = self.accounts.get(&address) {
            if a.reset_storage {
                return true;
            }
        }
        self.parent.as_ref().is_some_and(|p| p.storage_reset_since(address))
    }

    #[must_use]
    pub fn storage(&self, address: H160, index: H256) -> H256 {
        if let Some(v) = self.storages.get(&(address, index)) {
            return *v;
        }
        if let Some(p) = &self.parent {
            return p.storage(address, index);
        }
        if self.storage_reset_since(address) {
            return H256::zero();
        }
        self.backend.storage(address, index)
    }

    pub fn set_storage(&mut self, address: H160, index: H256, value: H256) {
        self.storages.insert((address, index), value);
    }

    #[must_use]
    pub fn original_storage(&self, address: H160, index: H256) -> H256 {
        self.backend.original_storage(address, index)
    }

    #[must_use]
    pub fn transient_storage(&self, address: H160, index: H256) -> H256 {
        if let Some(v) = self.transient_storages.get(&(address, index)) {
            return *v;
        }
        self.parent.as_ref().map_or(H256::zero(), |p| p.transient_storage(address, index))
    }

    pub fn set_transient_storage(&mut self, address: H160, index: H256, value: H256) {
        self.transient_storages.insert((address, index), value);
    }

    pub fn mark_delete(&mut self, address: H160) {
        self.deletes.insert(address);
    }

    pub fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) {
        self.logs.push(Log { address, topics, data });
    }

    #[must_use]
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    #[must_use]
    pub fn deletes(&self) -> &BTreeSet<H160> {
        &self.deletes
    }

    #[must_use]
    pub fn backend_env(&self) -> &Env {
        self.backend.env()
    }

    #[must_use]
    pub fn backend_block_hash(&self, number: U256) -> H256 {
        self.backend.block_hash(number)
    }

    #[must_use]
    pub fn touched(&self) -> &BTreeSet<H160> {
        &self.touches
    }

    pub fn touch(&mut self, address: H160) {
        self.touches.insert(address);
    }

    #[must_use]
    pub fn is_address_warm(&self, address: H160) -> bool {
        self.accessed.is_address_warm(address) || self.parent.as_ref().is_some_and(|p| p.is_address_warm(address))
    }

    #[must_use]
    pub fn is_storage_warm(&self, address: H160, key: H256) -> bool {
        self.accessed.is_storage_warm(address, key) || self.parent.as_ref().is_some_and(|p| p.is_storage_warm(address, key))
    }

    /// Marks `address` warm in the current frame, returning whether it was
    /// cold (i.e. not already warm in this frame or any ancestor).
    pub fn mark_address_warm(&mut self, address: H160) -> bool {
        if self.is_address_warm(address) {
            return false;
        }
        self.accessed.mark_address_warm(address);
        true
    }

    /// Marks `(address, key)` warm in the current frame, returning whether it
    /// was cold. Also implicitly warms `address` in this frame.
    pub fn mark_storage_warm(&mut self, address: H160, key: H256) -> bool {
        if self.is_storage_warm(address, key) {
            self.accessed.mark_address_warm(address);
            return false;
        }
        self.accessed.mark_storage_warm(address, key);
        true
    }

    /// Unconditionally warms `addresses`/`keys` in the current frame —
    /// used once at transaction start, before any nested frame exists, so
    /// there is nothing to roll back.
    pub fn prewarm(&mut self, addresses: impl IntoIterator<Item = H160>, keys: impl IntoIterator<Item = (H160, H256)>) {
        self.accessed.prewarm(addresses, keys);
    }
}

/// Top-level state wrapper the orchestrator drives: one persistent root
/// substate. The warm/cold access list lives inside the substate chain
/// itself (one `AccessList` per frame, see `MemoryStackSubstate::accessed`)
/// so that a reverted call's warming is rolled back with the rest of its
/// state, per EIP-2929.
pub struct MemoryStackState<'backend, 'config, B: Backend> {
    pub substate: MemoryStackSubstate<'backend, 'config, B>,
}

impl<'backend, 'config, B: Backend> MemoryStackState<'backend, 'config, B> {
    #[must_use]
    pub fn new(backend: &'backend B, config: &'config faithevm_gasometer::Config, gas_limit: u64) -> Self {
        Self {
            substate: MemoryStackSubstate::new(backend, config, gas_limit),
        }
    }
}
