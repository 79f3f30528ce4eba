//! EIP-2929/2930 warm/cold tracking: which addresses and storage slots have
//! already been touched this transaction, and the EIP-2930 access list
//! supplied with the transaction (pre-warmed before execution starts).

use crate::prelude::*;
use primitive_types::{H160, H256};

/// The set of addresses and (address, slot) pairs touched so far this
/// transaction. Cleared and reseeded once per transaction, never across
/// transactions.
#[derive(Clone, Debug, Default)]
pub struct AccessList {
    addresses: BTreeSet<H160>,
    storage_keys: BTreeSet<(H160, H256)>,
}

impl AccessList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `address` warm, returning whether it was cold (i.e. this is the
    /// first access this transaction).
    pub fn mark_address_warm(&mut self, address: H160) -> bool {
        self.addresses.insert(address)
    }

    #[must_use]
    pub fn is_address_warm(&self, address: H160) -> bool {
        self.addresses.contains(&address)
    }

    /// Mark `(address, key)` warm, returning whether it was cold. Also
    /// implicitly warms `address` (a cold slot access always also counts as
    /// a cold account access under EIP-2929).
    pub fn mark_storage_warm(&mut self, address: H160, key: H256) -> bool {
        self.addresses.insert(address);
        self.storage_keys.insert((address, key))
    }

    #[must_use]
    pub fn is_storage_warm(&self, address: H160, key: H256) -> bool {
        self.storage_keys.contains(&(address, key))
    }

    /// Pre-warm the sender, the tx's `to` (or `None` for contract creation),
    /// the coinbase (EIP-3651), and the EIP-2930 access list / EIP-7702
    /// authority addresses. Called once at the start of `init_transaction_state`.
    pub fn prewarm(&mut self, addresses: impl IntoIterator<Item = H160>, keys: impl IntoIterator<Item = (H160, H256)>) {
        for a in addresses {
            self.addresses.insert(a);
        }
        for (a, k) in keys {
            self.addresses.insert(a);
            self.storage_keys.insert((a, k));
        }
    }

    /// Fold a committed child frame's warm set into this one. Used by
    /// `MemoryStackSubstate::exit_commit` — a reverted frame's warming is
    /// simply dropped instead (see `exit_revert`), since EIP-2929 access-list
    /// entries warmed only inside a call that itself reverted do not survive
    /// the revert.
    pub fn merge(&mut self, mut other: Self) {
        self.addresses.append(&mut other.addresses);
        self.storage_keys.append(&mut other.storage_keys);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::H160;

    #[test]
    fn first_touch_is_cold_second_is_warm() {
        let mut list = AccessList::new();
        let addr = H160::repeat_byte(1);
        assert!(list.mark_address_warm(addr));
        assert!(!list.mark_address_warm(addr));
        assert!(list.is_address_warm(addr));
    }

    #[test]
    fn storage_warm_implies_address_warm() {
        let mut list = AccessList::new();
        let addr = H160::repeat_byte(2);
        let key = H256::repeat_byte(3);
        list.mark_storage_warm(addr, key);
        assert!(list.is_address_warm(addr));
        assert!(list.is_storage_warm(addr, key));
    }
}
