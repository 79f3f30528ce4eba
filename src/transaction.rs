//! The Transaction Executor: intrinsic gas, sender validation, fee handling,
//! pre-warming, EIP-7702 authorization processing, top-level dispatch, refund
//! capping, and the post-execution EIP-161/EIP-6780 cleanup passes.

use crate::backend::Backend;
use crate::executor::stack::{Log, MemoryStackState, StackExecutor};
use crate::precompiles::PrecompileSet;
use crate::prelude::*;
use faithevm_core::ExitReason;
use faithevm_gasometer::Config;
use primitive_types::{H160, H256, U256};
use rlp::RlpStream;
use sha3::{Digest, Keccak256};

/// One EIP-7702 authorization tuple: "I, `authority`, authorize `address` to
/// act as my code, as of my `nonce`-th transaction, on `chain_id`."
/// `chain_id` of zero authorizes on every chain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Authorization {
    pub chain_id: U256,
    pub address: H160,
    pub nonce: u64,
    pub y_parity: bool,
    pub r: U256,
    pub s: U256,
}

impl Authorization {
    fn signing_hash(&self) -> H256 {
        let mut stream = RlpStream::new_list(3);
        stream.append(&self.chain_id);
        stream.append(&self.address);
        stream.append(&self.nonce);
        let mut buf = Vec::with_capacity(1 + stream.as_raw().len());
        buf.push(MAGIC);
        buf.extend_from_slice(stream.as_raw());
        H256::from_slice(&Keccak256::digest(buf))
    }

    /// Recovers the authorizing EOA's address, or `None` on a malformed or
    /// invalid signature (per EIP-7702, such a tuple is simply skipped, not a
    /// transaction-level failure).
    #[must_use]
    pub fn recover_authority(&self) -> Option<H160> {
        if self.s > SECP256K1N_HALF {
            return None;
        }
        let recovery_id = libsecp256k1::RecoveryId::parse(u8::from(self.y_parity)).ok()?;
        let mut sig_bytes = [0u8; 64];
        self.r.to_big_endian(&mut sig_bytes[..32]);
        self.s.to_big_endian(&mut sig_bytes[32..]);
        let signature = libsecp256k1::Signature::parse_standard(&sig_bytes).ok()?;
        let message = libsecp256k1::Message::parse_slice(self.signing_hash().as_bytes()).ok()?;
        let public_key = libsecp256k1::recover(&message, &signature, &recovery_id).ok()?;
        let uncompressed = public_key.serialize();
        let hash = Keccak256::digest(&uncompressed[1..]);
        Some(H160::from_slice(&hash[12..]))
    }
}

/// MAGIC byte prefixing the RLP-encoded authorization tuple before hashing,
/// per EIP-7702.
const MAGIC: u8 = 0x05;

/// Half the secp256k1 curve order; EIP-2-compliant signatures keep `s` at or
/// below this.
const SECP256K1N_HALF: U256 = U256([
    0xDFE9_2F46_681B_20A0,
    0x5D57_6E73_57A4_501D,
    0xFFFF_FFFF_FFFF_FFFF,
    0x7FFF_FFFF_FFFF_FFFF,
]);

/// Prefix installed as an authority's code by a processed authorization
/// (`0xEF 0x01 || delegate_address`, 23 bytes total).
const DELEGATION_PREFIX: [u8; 2] = [0xef, 0x01];

/// Given an account's code, the delegation target if it is a valid EIP-7702
/// delegation designator.
#[must_use]
pub fn delegation_target(code: &[u8]) -> Option<H160> {
    if code.len() == 23 && code[..2] == DELEGATION_PREFIX {
        Some(H160::from_slice(&code[3..23]))
    } else {
        None
    }
}

fn delegation_designator(address: H160) -> Vec<u8> {
    let mut code = Vec::with_capacity(23);
    code.extend_from_slice(&DELEGATION_PREFIX);
    code.push(0x00);
    code.extend_from_slice(address.as_bytes());
    code
}

/// Either a top-level message call or a contract creation, with the access
/// list/authorization list EIP-2930/7702 carry along.
#[derive(Clone, Debug)]
pub struct Transaction {
    pub caller: H160,
    pub to: Option<H160>,
    pub value: U256,
    pub data: Vec<u8>,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub nonce: U256,
    pub access_list: Vec<(H160, Vec<H256>)>,
    pub authorization_list: Vec<Authorization>,
}

impl Transaction {
    #[must_use]
    pub const fn is_create(&self) -> bool {
        self.to.is_none()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransactionValidationError {
    NonceMismatch { expected: U256, actual: U256 },
    InsufficientBalance,
    GasLimitBelowIntrinsic,
    SenderHasCode,
    MaxNonce,
}

/// Everything the embedder needs to apply to persistent state and report to
/// the caller once a transaction finishes.
#[derive(Clone, Debug)]
pub struct ExecutionResult {
    pub reason: ExitReason,
    pub output: Vec<u8>,
    pub created_address: Option<H160>,
    pub gas_used: u64,
    /// Fee (in wei) the sender should be refunded for gas bought but unused.
    pub fee_refund: U256,
    /// Fee (in wei) credited to the block's coinbase.
    pub coinbase_reward: U256,
    pub logs: Vec<Log>,
    /// Accounts the self-destruct opcode marked for deletion this
    /// transaction (after the EIP-6780 same-tx restriction has been applied).
    pub deleted_accounts: Vec<H160>,
    /// Accounts touched this transaction and empty at the end of it — the
    /// host must delete these too, per EIP-161 (Spurious Dragon+).
    pub cleared_empty_accounts: Vec<H160>,
}

/// Drives one transaction end to end against a [`Backend`]: intrinsic gas,
/// sender checks, pre-warming, EIP-7702 processing, dispatch, and the two
/// post-execution cleanup passes. Construct one per transaction.
pub struct TransactionExecutor<'config, P: PrecompileSet> {
    config: &'config Config,
    precompiles: &'config P,
}

impl<'config, P: PrecompileSet> TransactionExecutor<'config, P> {
    #[must_use]
    pub const fn new(config: &'config Config, precompiles: &'config P) -> Self {
        Self { config, precompiles }
    }

    /// Intrinsic gas: the EIP-7623 floor (Prague+) is the larger of the
    /// ordinary formula and the floor formula, since the floor is a minimum
    /// on total gas used, not a separate extra charge.
    #[must_use]
    pub fn intrinsic_gas(&self, tx: &Transaction) -> u64 {
        let access_addresses = tx.access_list.len();
        let access_keys: usize = tx.access_list.iter().map(|(_, keys)| keys.len()).sum();
        let ordinary = faithevm_gasometer::intrinsic_gas(
            self.config,
            tx.is_create(),
            &tx.data,
            access_addresses,
            access_keys,
            tx.authorization_list.len(),
        );
        let floor = faithevm_gasometer::intrinsic_gas_floor(self.config, tx.is_create(), &tx.data);
        ordinary.max(floor)
    }

    /// Nonce and balance checks against the backend's view of the sender
    /// (the upfront fee is the transaction's own `gas_price`, since blob
    /// fees are an orchestration-layer concern this executor does not
    /// itself size).
    ///
    /// # Errors
    /// See [`TransactionValidationError`].
    pub fn validate<B: Backend>(&self, tx: &Transaction, backend: &B) -> Result<(), TransactionValidationError> {
        let sender = backend.basic(tx.caller);
        if sender.nonce != tx.nonce {
            return Err(TransactionValidationError::NonceMismatch { expected: sender.nonce, actual: tx.nonce });
        }
        if sender.nonce >= U256::from(u64::MAX) {
            return Err(TransactionValidationError::MaxNonce);
        }
        let intrinsic = self.intrinsic_gas(tx);
        if tx.gas_limit < intrinsic {
            return Err(TransactionValidationError::GasLimitBelowIntrinsic);
        }
        // EIP-3607, relaxed by EIP-7702: an EOA with code other than a valid
        // delegation designator cannot originate a transaction.
        let code = backend.code(tx.caller);
        if !code.is_empty() && delegation_target(&code).is_none() {
            return Err(TransactionValidationError::SenderHasCode);
        }
        let upfront_cost = tx.gas_price.saturating_mul(U256::from(tx.gas_limit)).saturating_add(tx.value);
        if sender.balance < upfront_cost {
            return Err(TransactionValidationError::InsufficientBalance);
        }
        Ok(())
    }

    /// Runs `tx` to completion. Callers must have already called
    /// [`Self::validate`] (or be content with the dispatch itself failing for
    /// equivalent reasons); this does not re-check nonce/balance.
    pub fn execute<'backend, B: Backend>(&self, tx: Transaction, backend: &'backend B) -> ExecutionResult {
        let intrinsic = self.intrinsic_gas(&tx);
        let data_floor = faithevm_gasometer::intrinsic_gas_floor(self.config, tx.is_create(), &tx.data);
        let state = MemoryStackState::new(backend, self.config, tx.gas_limit);
        let mut executor = StackExecutor::new(state, self.config, self.precompiles);

        // Step 6: pre-warm sender, target, coinbase (Shanghai+ — reuses
        // `has_push0` as the Shanghai marker, introduced the same fork),
        // active precompiles, and every EIP-2930 access-list entry.
        let mut warm_addresses = vec![tx.caller];
        if let Some(to) = tx.to {
            warm_addresses.push(to);
        }
        if self.config.has_push0 {
            warm_addresses.push(backend.env().block_coinbase);
        }
        warm_addresses.extend(tx.access_list.iter().map(|(addr, _)| *addr));
        let warm_keys = tx.access_list.iter().flat_map(|(addr, keys)| keys.iter().map(move |k| (*addr, *k)));
        executor.prewarm(warm_addresses, warm_keys);

        // Step 7: process EIP-7702 authorization tuples (Prague+ only).
        if self.config.has_authorization_list {
            for auth in &tx.authorization_list {
                if auth.chain_id != U256::zero() && auth.chain_id != backend.env().chain_id {
                    continue;
                }
                let Some(authority) = auth.recover_authority() else { continue };
                let authority_basic = executor.state().substate.basic(authority);
                if authority_basic.nonce != U256::from(auth.nonce) {
                    continue;
                }
                let authority_code = executor.state().substate.code(authority);
                if !authority_code.is_empty() && delegation_target(&authority_code).is_none() {
                    continue;
                }
                if auth.nonce == u64::MAX {
                    continue;
                }
                executor.mark_address_warm(authority);
                executor.state_mut().substate.set_nonce(authority);
                if auth.address.is_zero() {
                    // A zero delegate address clears any existing delegation.
                    executor.state_mut().substate.set_code(authority, Vec::new());
                } else {
                    executor.mark_address_warm(auth.address);
                    executor.state_mut().substate.set_code(authority, delegation_designator(auth.address));
                }
            }
        }

        if let Err(e) = executor.state_mut().substate.metadata_mut().gasometer_mut().record_cost(intrinsic) {
            return ExecutionResult {
                reason: ExitReason::Error(e),
                output: Vec::new(),
                created_address: None,
                gas_used: tx.gas_limit,
                fee_refund: U256::zero(),
                coinbase_reward: tx.gas_price.saturating_mul(U256::from(tx.gas_limit)),
                logs: Vec::new(),
                deleted_accounts: Vec::new(),
                cleared_empty_accounts: Vec::new(),
            };
        }

        let remaining_gas_limit = tx.gas_limit - intrinsic;
        let (reason, output, created_address) = if let Some(to) = tx.to {
            let (reason, output) = executor.transact_call(tx.caller, to, tx.value, tx.data, remaining_gas_limit);
            (reason, output, None)
        } else {
            let reason = executor.transact_create(tx.caller, tx.value, tx.data, remaining_gas_limit);
            // `transact_create`'s resolved address isn't surfaced by the
            // orchestrator's return value; recompute it the same way
            // `create_inner` did, from the sender's pre-call nonce.
            let sender_nonce_before = backend.basic(tx.caller).nonce;
            let created = if matches!(reason, ExitReason::Succeed(_)) {
                Some(legacy_create_address(tx.caller, sender_nonce_before))
            } else {
                None
            };
            (reason, Vec::new(), created)
        };

        // Step 9: refund capping.
        let used_before_refund = executor.used_gas();
        let refund_counter = executor.refunded_gas().max(0) as u64;
        let refund_credit = refund_counter.min(used_before_refund / self.config.max_refund_quotient);
        let gas_used = used_before_refund - refund_credit;

        // EIP-7623: total gas used is also floored.
        let gas_used = gas_used.max(data_floor);

        let gas_left = tx.gas_limit - gas_used;
        let fee_refund = tx.gas_price.saturating_mul(U256::from(gas_left));
        let base_fee = backend.env().block_base_fee_per_gas;
        let effective_price = if self.config.has_base_fee { tx.gas_price.saturating_sub(base_fee) } else { tx.gas_price };
        let coinbase_reward = effective_price.saturating_mul(U256::from(gas_used));

        // Step 11: EIP-161 cleanup — delete touched-and-empty accounts.
        let mut cleared_empty_accounts = Vec::new();
        if self.config.empty_considered_exists {
            for address in executor.state().substate.touched().iter().copied().collect::<Vec<_>>() {
                let basic = executor.state().substate.basic(address);
                let code = executor.state().substate.code(address);
                if basic.balance.is_zero() && basic.nonce.is_zero() && code.is_empty() {
                    cleared_empty_accounts.push(address);
                }
            }
        }

        // Step 12: self-destruct set (EIP-6780 restriction already applied
        // by `Handler::mark_delete`; here we only surface the final set).
        let deleted_accounts = executor.state().substate.deletes().iter().copied().collect();
        let logs = executor.logs().to_vec();

        log::debug!(target: "evm", "Transaction from {} used {} gas: {:?}", tx.caller, gas_used, reason);

        ExecutionResult {
            reason,
            output,
            created_address,
            gas_used,
            fee_refund,
            coinbase_reward,
            logs,
            deleted_accounts,
            cleared_empty_accounts,
        }
    }
}

/// Mirrors `StackExecutor::legacy_create_address` for the transaction
/// executor's own post-hoc address recomputation (the orchestrator resolves
/// the address internally but does not return it from `transact_create`).
fn legacy_create_address(caller: H160, nonce: U256) -> H160 {
    let mut stream = RlpStream::new_list(2);
    stream.append(&caller);
    if nonce.is_zero() {
        stream.append_empty_data();
    } else {
        let mut bytes = [0u8; 32];
        nonce.to_big_endian(&mut bytes);
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(31);
        stream.append(&&bytes[start..]);
    }
    H160::from_slice(&Keccak256::digest(stream.out())[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegation_designator_round_trips() {
        let target = H160::repeat_byte(0xab);
        let code = delegation_designator(target);
        assert_eq!(code.len(), 23);
        assert_eq!(delegation_target(&code), Some(target));
    }

    #[test]
    fn non_delegation_code_has_no_target() {
        assert_eq!(delegation_target(&[0x60, 0x00]), None);
    }
}
