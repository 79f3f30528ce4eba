//! The EVM Orchestrator: drives one call-frame's [`Runtime`] at a time,
//! dispatches precompiles ahead of ordinary bytecode, and implements
//! [`Handler`] against the layered [`MemoryStackState`] so CALL/CREATE
//! resolve synchronously (see the crate-level note on this simplification).

use crate::backend::{Backend, Basic};
use crate::executor::stack::memory::{Log, MemoryStackState};
use crate::precompiles::{PrecompileHandle, PrecompileSet};
use crate::prelude::*;
use faithevm_core::prelude::Rc;
use faithevm_core::{ExitError, ExitReason, ExitSucceed, InterpreterHandler, Machine, Opcode};
use faithevm_gasometer::{consts as gas_consts, dynamic_opcode_cost, opcode_enabled, sstore_cost, Config, GasCost, StorageTarget};
use faithevm_runtime::{CallFeedback, CallScheme, Context, CreateFeedback, CreateScheme, Handler, Runtime, Transfer};
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

/// How a completed frame's substate should be folded back into its parent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StackExitKind {
    Succeeded,
    Reverted,
    Failed,
}

/// Wraps a [`MemoryStackState`] and a [`PrecompileSet`] and drives the
/// call/create lifecycle described for the EVM Orchestrator: value transfer,
/// depth limiting, the EIP-150 63/64 gas-forwarding rule, EIP-3541/170/3860
/// deployed-code checks, and snapshot commit/revert/discard around every
/// nested frame.
pub struct StackExecutor<'backend, 'config, B: Backend, P: PrecompileSet> {
    config: &'config Config,
    precompiles: &'config P,
    state: MemoryStackState<'backend, 'config, B>,
}

impl<'backend, 'config, B: Backend, P: PrecompileSet> StackExecutor<'backend, 'config, B, P> {
    #[must_use]
    pub fn new(state: MemoryStackState<'backend, 'config, B>, config: &'config Config, precompiles: &'config P) -> Self {
        Self { config, precompiles, state }
    }

    #[must_use]
    pub const fn state(&self) -> &MemoryStackState<'backend, 'config, B> {
        &self.state
    }
    pub fn state_mut(&mut self) -> &mut MemoryStackState<'backend, 'config, B> {
        &mut self.state
    }
    #[must_use]
    pub fn into_state(self) -> MemoryStackState<'backend, 'config, B> {
        self.state
    }

    #[must_use]
    pub fn used_gas(&self) -> u64 {
        self.state.substate.metadata().gasometer().total_used_gas()
    }
    #[must_use]
    pub fn refunded_gas(&self) -> i64 {
        self.state.substate.metadata().gasometer().refunded_gas()
    }
    #[must_use]
    pub fn logs(&self) -> &[Log] {
        self.state.substate.logs()
    }
    /// Unconditionally warms `addresses`/`keys` in the current frame (used
    /// during transaction pre-warming, before any nested call exists).
    pub fn prewarm(&mut self, addresses: impl IntoIterator<Item = H160>, keys: impl IntoIterator<Item = (H160, H256)>) {
        self.state.substate.prewarm(addresses, keys);
    }

    /// Marks `address` warm, returning whether it was cold.
    pub fn mark_address_warm(&mut self, address: H160) -> bool {
        self.state.substate.mark_address_warm(address)
    }

    /// Top-level message call (the `to` branch of a transaction, or a test
    /// harness driving a call directly). `gas_limit` is the gas remaining
    /// after intrinsic gas has already been deducted by the caller.
    pub fn transact_call(
        &mut self,
        caller: H160,
        address: H160,
        value: U256,
        data: Vec<u8>,
        gas_limit: u64,
    ) -> (ExitReason, Vec<u8>) {
        self.state.substate.mark_address_warm(caller);
        self.state.substate.mark_address_warm(address);

        let transfer = if value.is_zero() {
            None
        } else {
            Some(Transfer { source: caller, target: address, value })
        };
        let context = Context { address, caller, apparent_value: value };
        let feedback = self.call_inner(address, transfer, data, Some(gas_limit), false, false, context);
        (feedback.reason, feedback.return_data)
    }

    /// Top-level CREATE (a transaction with no `to`).
    pub fn transact_create(&mut self, caller: H160, value: U256, init_code: Vec<u8>, gas_limit: u64) -> ExitReason {
        self.state.substate.mark_address_warm(caller);
        let scheme = CreateScheme::Legacy { caller };
        self.create_inner(caller, scheme, value, init_code, Some(gas_limit), false).reason
    }

    /// Top-level CREATE2.
    pub fn transact_create2(
        &mut self,
        caller: H160,
        value: U256,
        init_code: Vec<u8>,
        salt: H256,
        gas_limit: u64,
    ) -> ExitReason {
        self.state.substate.mark_address_warm(caller);
        let scheme = CreateScheme::Create2 { caller, salt };
        self.create_inner(caller, scheme, value, init_code, Some(gas_limit), false).reason
    }

    fn is_precompile(&self, address: H160) -> bool {
        self.precompiles.is_precompile(address)
    }

    /// The code a CALL/CALLCODE/DELEGATECALL/STATICCALL to `address` actually
    /// executes: `address`'s own code, unless that code is an EIP-7702
    /// delegation designator (Prague+), in which case it is the designated
    /// account's code instead — storage still resolves against `address`
    /// itself, since the runtime's `Context::address` is never changed here.
    /// EXTCODESIZE/EXTCODECOPY/EXTCODEHASH do not go through this: per
    /// EIP-7702 they observe the designator bytes, not the delegate's code.
    fn resolve_code(&self, address: H160) -> Vec<u8> {
        let code = self.state.substate.code(address);
        if self.config.has_authorization_list {
            if let Some(target) = crate::transaction::delegation_target(&code) {
                return self.state.substate.code(target);
            }
        }
        code
    }

    fn create_address(scheme: &CreateScheme, init_code: &[u8]) -> H160 {
        match scheme {
            CreateScheme::Legacy { caller } => {
                // Nonce is bumped by `create_inner` before this is called, so the
                // RLP encodes the nonce the deployer held *before* this CREATE.
                unreachable!("legacy address is resolved in create_inner with the pre-bump nonce: {caller:?}")
            }
            CreateScheme::Create2 { caller, salt } => {
                let code_hash = Keccak256::digest(init_code);
                let mut buf = [0u8; 85];
                buf[0] = 0xff;
                buf[1..21].copy_from_slice(caller.as_bytes());
                buf[21..53].copy_from_slice(salt.as_bytes());
                buf[53..85].copy_from_slice(&code_hash);
                H160::from_slice(&Keccak256::digest(buf)[12..])
            }
            CreateScheme::Fixed(address) => *address,
        }
    }

    fn legacy_create_address(caller: H160, nonce: U256) -> H160 {
        let mut stream = rlp::RlpStream::new_list(2);
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

    fn gas_stipend(&self, is_delegate_call: bool, value: U256) -> u64 {
        if !is_delegate_call && !value.is_zero() {
            self.config.gas_call_stipend
        } else {
            0
        }
    }

    /// EIP-150: a *nested* CALL/CREATE without an explicit gas limit, or
    /// asking for more than available, forwards all but 1/64th of what
    /// remains. The top-level call/create a transaction dispatches is not
    /// itself subject to this reduction — `take_l64` is `false` there — or a
    /// gas-tight transaction would be under-provisioned by the reserved
    /// 1/64th and spuriously trap.
    fn forwarded_gas(&self, target_gas: Option<u64>, take_l64: bool) -> Result<u64, ExitError> {
        let available = self.state.substate.metadata().gasometer().gas();
        let capped = if take_l64 { available - available / 64 } else { available };
        match target_gas {
            None => Ok(capped),
            Some(requested) => {
                if requested > available && self.config.err_on_call_with_more_gas {
                    return Err(ExitError::OutOfGas);
                }
                Ok(core::cmp::min(requested, capped))
            }
        }
    }

    fn call_inner(
        &mut self,
        code_address: H160,
        transfer: Option<Transfer>,
        input: Vec<u8>,
        target_gas: Option<u64>,
        is_static: bool,
        take_l64: bool,
        context: Context,
    ) -> CallFeedback {
        let after_gas = match self.forwarded_gas(target_gas, take_l64) {
            Ok(g) => g,
            Err(e) => return CallFeedback { reason: e.into(), return_data: Vec::new() },
        };
        if let Err(e) = self.state.substate.metadata_mut().gasometer_mut().record_cost(after_gas) {
            return CallFeedback { reason: e.into(), return_data: Vec::new() };
        }

        if self.state.substate.metadata().depth() >= self.config.call_stack_limit {
            self.state.substate.metadata_mut().gasometer_mut().record_stipend(after_gas, 0);
            return CallFeedback { reason: ExitError::CallTooDeep.into(), return_data: Vec::new() };
        }

        let is_delegate_call = matches!((&transfer, context.caller == context.address), (None, true));
        let stipend = transfer.as_ref().map_or(0, |t| self.gas_stipend(is_delegate_call, t.value));
        self.state.substate.touch(code_address);
        self.state.substate.enter(after_gas + stipend, is_static);

        if let Some(transfer) = &transfer {
            if let Err(e) = self.transfer_value(transfer) {
                // A CALL failing only because the sender's balance is
                // insufficient returns the forwarded gas to the caller, same
                // as an explicit REVERT, rather than burning it like a trap.
                self.state.substate.exit_revert();
                return CallFeedback { reason: e.into(), return_data: Vec::new() };
            }
        }

        if self.is_precompile(code_address) {
            let handle = PrecompileHandle { input: &input, gas_limit: Some(self.state.substate.metadata().gasometer().gas()), is_static };
            let result = self.precompiles.execute(code_address, handle);
            return match result {
                Some(Ok(output)) => {
                    let charged = self.state.substate.metadata_mut().gasometer_mut().record_cost(output.cost);
                    match charged {
                        Ok(()) => {
                            self.exit_kind_for(ExitReason::Succeed(ExitSucceed::Returned));
                            CallFeedback { reason: ExitSucceed::Returned.into(), return_data: output.output }
                        }
                        Err(e) => {
                            self.exit_kind_for(ExitReason::Error(e.clone()));
                            CallFeedback { reason: e.into(), return_data: Vec::new() }
                        }
                    }
                }
                Some(Err(_)) => {
                    self.exit_kind_for(ExitReason::Error(ExitError::Other(Cow::Borrowed("precompile execution failed"))));
                    CallFeedback { reason: ExitError::Other(Cow::Borrowed("precompile execution failed")).into(), return_data: Vec::new() }
                }
                None => {
                    self.exit_kind_for(ExitReason::Succeed(ExitSucceed::Stopped));
                    CallFeedback { reason: ExitSucceed::Stopped.into(), return_data: Vec::new() }
                }
            };
        }

        let code = self.resolve_code(code_address);
        let mut runtime = Runtime::new(Rc::new(code), Rc::new(input), context, is_static, self.config);
        let reason = runtime.run(self);
        let return_data = runtime.return_data_buffer().to_vec();

        log::debug!(target: "evm", "Call execution using address {}: {:?}", code_address, reason);
        self.exit_kind_for(reason.clone());
        CallFeedback { reason, return_data }
    }

    fn transfer_value(&mut self, transfer: &Transfer) -> Result<(), ExitError> {
        let source = self.state.substate.basic(transfer.source);
        if source.balance < transfer.value {
            return Err(ExitError::OutOfFund);
        }
        let target = self.state.substate.basic(transfer.target);
        self.state.substate.set_balance(transfer.source, source.balance - transfer.value);
        self.state.substate.set_balance(transfer.target, target.balance + transfer.value);
        self.state.substate.touch(transfer.source);
        self.state.substate.touch(transfer.target);
        Ok(())
    }

    /// Fold the just-finished child frame back into its parent per `reason`.
    /// An explicit REVERT returns its unused gas to the parent; a trap
    /// (`Error`/`Fatal`) burns all of the gas forwarded to it — see
    /// `MemoryStackSubstate::exit_discard`.
    fn exit_kind_for(&mut self, reason: ExitReason) {
        match reason {
            ExitReason::Succeed(_) => self.state.substate.exit_commit(),
            ExitReason::Revert(_) => self.state.substate.exit_revert(),
            ExitReason::Error(_) | ExitReason::Fatal(_) => self.state.substate.exit_discard(),
        }
    }

    fn create_inner(
        &mut self,
        caller: H160,
        scheme: CreateScheme,
        value: U256,
        init_code: Vec<u8>,
        target_gas: Option<u64>,
        take_l64: bool,
    ) -> CreateFeedback {
        let after_gas = match self.forwarded_gas(target_gas, take_l64) {
            Ok(g) => g,
            Err(e) => return CreateFeedback { reason: e.into(), address: None, return_data: Vec::new() },
        };

        if let Some(max) = self.config.max_initcode_size {
            if init_code.len() > max {
                return CreateFeedback {
                    reason: ExitError::InvalidCreateInitCodeSize.into(),
                    address: None,
                    return_data: Vec::new(),
                };
            }
        }
        let word_cost = faithevm_gasometer::consts_initcode_cost(init_code.len());
        if let Err(e) = self.state.substate.metadata_mut().gasometer_mut().record_cost(word_cost) {
            return CreateFeedback { reason: e.into(), address: None, return_data: Vec::new() };
        }
        if let Err(e) = self.state.substate.metadata_mut().gasometer_mut().record_cost(after_gas) {
            return CreateFeedback { reason: e.into(), address: None, return_data: Vec::new() };
        }

        if self.state.substate.metadata().depth() >= self.config.call_stack_limit {
            self.state.substate.metadata_mut().gasometer_mut().record_stipend(after_gas, 0);
            return CreateFeedback { reason: ExitError::CallTooDeep.into(), address: None, return_data: Vec::new() };
        }

        let caller_basic = self.state.substate.basic(caller);
        if caller_basic.balance < value {
            self.state.substate.metadata_mut().gasometer_mut().record_stipend(after_gas, 0);
            return CreateFeedback { reason: ExitError::OutOfFund.into(), address: None, return_data: Vec::new() };
        }

        let address = match &scheme {
            CreateScheme::Legacy { caller } => Self::legacy_create_address(*caller, caller_basic.nonce),
            other => Self::create_address(other, &init_code),
        };

        // The sender's nonce bump must land in the current frame, not the
        // child about to be entered: Spurious Dragon+ increments it even if
        // the CREATE itself fails (e.g. `CreateCollision`), and a failed
        // child frame's account writes are discarded by `exit_revert`.
        self.state.substate.touch(address);
        self.state.substate.set_nonce(caller);
        self.state.substate.enter(after_gas, false);
        self.state.substate.mark_created(address);

        if self.state.substate.exists(address)
            && (self.state.substate.basic(address).nonce > U256::zero() || !self.state.substate.code(address).is_empty())
        {
            self.exit_kind_for(ExitReason::Error(ExitError::CreateCollision));
            return CreateFeedback { reason: ExitError::CreateCollision.into(), address: None, return_data: Vec::new() };
        }

        let transfer = Transfer { source: caller, target: address, value };
        if let Err(e) = self.transfer_value(&transfer) {
            // Same as `call_inner`: a failed value transfer returns the
            // forwarded gas rather than burning it.
            self.state.substate.exit_revert();
            return CreateFeedback { reason: e.into(), address: None, return_data: Vec::new() };
        }
        if self.config.create_increase_nonce {
            self.state.substate.set_nonce(address);
        }

        if self.config.disallow_executable_format && init_code.first() == Some(&faithevm_core::Opcode::EOFMAGIC.as_u8()) {
            self.exit_kind_for(ExitReason::Error(ExitError::CreateContractStartingWithEF));
            return CreateFeedback {
                reason: ExitError::CreateContractStartingWithEF.into(),
                address: None,
                return_data: Vec::new(),
            };
        }

        let context = Context { address, caller, apparent_value: value };
        let mut runtime = Runtime::new(Rc::new(init_code), Rc::new(Vec::new()), context, false, self.config);
        let reason = runtime.run(self);
        let return_data = runtime.return_data_buffer().to_vec();

        log::debug!(target: "evm", "Create execution using address {}: {:?}", address, reason);
        match reason {
            ExitReason::Succeed(_) => {
                if let Some(limit) = self.config.create_contract_limit {
                    if return_data.len() > limit {
                        self.exit_kind_for(ExitReason::Error(ExitError::CreateContractLimit));
                        return CreateFeedback {
                            reason: ExitError::CreateContractLimit.into(),
                            address: None,
                            return_data: Vec::new(),
                        };
                    }
                }
                if self.config.disallow_executable_format && return_data.first() == Some(&faithevm_core::Opcode::EOFMAGIC.as_u8()) {
                    self.exit_kind_for(ExitReason::Error(ExitError::CreateContractStartingWithEF));
                    return CreateFeedback {
                        reason: ExitError::CreateContractStartingWithEF.into(),
                        address: None,
                        return_data: Vec::new(),
                    };
                }
                let deposit_cost = self.config.gas_codedeposit * return_data.len() as u64;
                if let Err(e) = self.state.substate.metadata_mut().gasometer_mut().record_cost(deposit_cost) {
                    self.exit_kind_for(ExitReason::Error(e.clone()));
                    return CreateFeedback { reason: e.into(), address: None, return_data: Vec::new() };
                }
                self.state.substate.set_code(address, return_data.clone());
                self.exit_kind_for(reason.clone());
                CreateFeedback { reason, address: Some(address), return_data }
            }
            _ => {
                self.exit_kind_for(reason.clone());
                CreateFeedback { reason, address: None, return_data }
            }
        }
    }
}

impl<'backend, 'config, B: Backend, P: PrecompileSet> Handler for StackExecutor<'backend, 'config, B, P> {
    fn balance(&self, address: H160) -> U256 {
        self.state.substate.basic(address).balance
    }
    fn code_size(&self, address: H160) -> U256 {
        U256::from(self.state.substate.code(address).len())
    }
    fn code_hash(&self, address: H160) -> H256 {
        if !self.state.substate.exists(address) {
            return H256::zero();
        }
        H256::from_slice(&Keccak256::digest(self.state.substate.code(address)))
    }
    fn code(&self, address: H160) -> Vec<u8> {
        self.state.substate.code(address)
    }
    fn storage(&self, address: H160, index: H256) -> H256 {
        self.state.substate.storage(address, index)
    }
    fn original_storage(&self, address: H160, index: H256) -> H256 {
        self.state.substate.original_storage(address, index)
    }
    fn transient_storage(&self, address: H160, index: H256) -> H256 {
        self.state.substate.transient_storage(address, index)
    }

    fn gas_price(&self) -> U256 {
        self.state.substate.backend_env().gas_price
    }
    fn origin(&self) -> H160 {
        self.state.substate.backend_env().origin
    }
    fn block_hash(&self, number: U256) -> H256 {
        self.state.substate.backend_block_hash(number)
    }
    fn block_number(&self) -> U256 {
        self.state.substate.backend_env().block_number
    }
    fn block_coinbase(&self) -> H160 {
        self.state.substate.backend_env().block_coinbase
    }
    fn block_timestamp(&self) -> U256 {
        self.state.substate.backend_env().block_timestamp
    }
    fn block_difficulty(&self) -> U256 {
        self.state.substate.backend_env().block_difficulty
    }
    fn block_randomness(&self) -> Option<H256> {
        self.state.substate.backend_env().block_randomness
    }
    fn block_gas_limit(&self) -> U256 {
        self.state.substate.backend_env().block_gas_limit
    }
    fn block_base_fee_per_gas(&self) -> U256 {
        self.state.substate.backend_env().block_base_fee_per_gas
    }
    fn blob_base_fee_per_gas(&self) -> U256 {
        self.state.substate.backend_env().blob_base_fee_per_gas
    }
    fn blob_hash(&self, index: usize) -> Option<H256> {
        self.state.substate.backend_env().blob_hashes.get(index).copied()
    }
    fn chain_id(&self) -> U256 {
        self.state.substate.backend_env().chain_id
    }

    fn exists(&self, address: H160) -> bool {
        self.state.substate.exists(address)
    }
    fn deleted(&self, address: H160) -> bool {
        self.state.substate.deleted(address)
    }
    fn is_cold(&mut self, address: H160, index: Option<H256>) -> bool {
        match index {
            Some(key) => !self.state.substate.mark_storage_warm(address, key),
            None => !self.state.substate.mark_address_warm(address),
        }
    }

    fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError> {
        self.state.substate.set_storage(address, index, value);
        Ok(())
    }
    fn set_transient_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError> {
        self.state.substate.set_transient_storage(address, index, value);
        Ok(())
    }

    fn transfer(&mut self, transfer: Transfer) -> Result<(), ExitError> {
        self.transfer_value(&transfer)
    }

    fn mark_delete(&mut self, address: H160, target: H160) -> Result<(), ExitError> {
        let balance = self.state.substate.basic(address).balance;
        let target_basic = self.state.substate.basic(target);
        if address != target {
            self.state.substate.set_balance(target, target_basic.balance + balance);
            self.state.substate.set_balance(address, U256::zero());
        }
        let should_delete = !self.config.selfdestruct_only_in_same_tx || self.state.substate.created_this_transaction(address);
        if should_delete {
            self.state.substate.mark_delete(address);
        }
        Ok(())
    }

    fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError> {
        self.state.substate.log(address, topics, data);
        Ok(())
    }

    fn create(
        &mut self,
        caller: H160,
        scheme: CreateScheme,
        value: U256,
        init_code: Vec<u8>,
        target_gas: Option<u64>,
    ) -> CreateFeedback {
        // Reached only from the CREATE/CREATE2 opcode handler — a nested
        // create, so the EIP-150 63/64 reduction applies.
        self.create_inner(caller, scheme, value, init_code, target_gas, true)
    }

    fn call(
        &mut self,
        code_address: H160,
        transfer: Option<Transfer>,
        input: Vec<u8>,
        target_gas: Option<u64>,
        is_static: bool,
        context: Context,
    ) -> CallFeedback {
        // Reached only from the CALL/CALLCODE/DELEGATECALL/STATICCALL opcode
        // handler — a nested call, so the EIP-150 63/64 reduction applies.
        self.call_inner(code_address, transfer, input, target_gas, is_static, true, context)
    }

    fn gas_left(&self) -> u64 {
        self.state.substate.metadata().gasometer().gas()
    }
}

impl<'backend, 'config, B: Backend, P: PrecompileSet> InterpreterHandler for StackExecutor<'backend, 'config, B, P> {
    fn before_bytecode(&mut self, opcode: Opcode, _pc: usize, machine: &Machine, address: &H160) -> Result<(), ExitError> {
        #[cfg(feature = "tracing")]
        faithevm_runtime::tracing::emit(faithevm_runtime::tracing::Event::Step {
            address: *address,
            opcode,
            position: _pc,
            stack: machine.stack(),
            memory: machine.memory(),
        });

        if !opcode_enabled(self.config, opcode) {
            return Err(ExitError::InvalidCode(opcode));
        }

        if let Ok(static_cost) = faithevm_gasometer::static_opcode_cost(self.config, opcode) {
            self.state.substate.metadata_mut().gasometer_mut().record_cost(static_cost)?;
            return Ok(());
        }

        let cost = self.dynamic_cost(opcode, machine, *address)?;
        self.state.substate.metadata_mut().gasometer_mut().record_cost(cost.cost)?;
        self.state.substate.metadata_mut().gasometer_mut().record_refund(cost.refund);
        Ok(())
    }

    #[cfg(feature = "tracing")]
    fn after_bytecode(&mut self, result: &Result<(), faithevm_core::Capture<ExitReason, faithevm_core::Trap>>, machine: &Machine) {
        faithevm_runtime::tracing::emit(faithevm_runtime::tracing::Event::StepResult { result, machine });
    }
}

impl<'backend, 'config, B: Backend, P: PrecompileSet> StackExecutor<'backend, 'config, B, P> {
    /// Price every opcode `static_opcode_cost` didn't handle: memory
    /// expansion, KECCAK256/copy/log length, EXP's exponent, and the
    /// EIP-2929 cold/warm surcharge on SLOAD/BALANCE/EXTCODE*/SSTORE.
    fn dynamic_cost(&mut self, opcode: Opcode, machine: &Machine, address: H160) -> Result<GasCost, ExitError> {
        let memory_cost = |this: &Self, offset: U256, len: U256| -> Result<u64, ExitError> {
            if len.is_zero() {
                return Ok(0);
            }
            let end = offset.checked_add(len).ok_or(ExitError::InvalidRange)?;
            let new_len = faithevm_core::Memory::next_multiple_of_32(end);
            faithevm_gasometer::memory_gas_cost(this.config, machine.memory().effective_len().as_u64(), new_len.as_u64())
        };

        let cost = match opcode {
            Opcode::EXP => {
                let power = machine.stack().peek(1)?;
                GasCost::from(faithevm_gasometer::exp_cost(self.config, power))
            }
            Opcode::SHA3 => {
                let offset = machine.stack().peek(0)?;
                let len = machine.stack().peek(1)?;
                let mem = memory_cost(self, offset, len)?;
                let len_u64 = len.min(U256::from(u64::MAX)).as_u64();
                GasCost::from(faithevm_gasometer::keccak256_cost(self.config, len_u64) + mem)
            }
            Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => {
                let offset = machine.stack().peek(0)?;
                let _data_offset = machine.stack().peek(1)?;
                let len = machine.stack().peek(2)?;
                let mem = memory_cost(self, offset, len)?;
                let len_u64 = len.min(U256::from(u64::MAX)).as_u64();
                GasCost::from(faithevm_gasometer::copy_cost(self.config, len_u64) + mem)
            }
            Opcode::EXTCODECOPY => {
                let target = address_from_u256(machine.stack().peek(0)?);
                let offset = machine.stack().peek(1)?;
                let len = machine.stack().peek(3)?;
                let mem = memory_cost(self, offset, len)?;
                let cold = self.is_cold(target, None);
                let len_u64 = len.min(U256::from(u64::MAX)).as_u64();
                let warm = self.config.gas_ext_code;
                let access = faithevm_gasometer::account_access_cost(self.config, cold, warm);
                GasCost::from(faithevm_gasometer::copy_cost(self.config, len_u64) + mem + access)
            }
            Opcode::MLOAD | Opcode::MSTORE => {
                let offset = machine.stack().peek(0)?;
                GasCost::from(memory_cost(self, offset, U256::from(32))?)
            }
            Opcode::MSTORE8 => {
                let offset = machine.stack().peek(0)?;
                GasCost::from(memory_cost(self, offset, U256::one())?)
            }
            Opcode::MCOPY => {
                let dest = machine.stack().peek(0)?;
                let src = machine.stack().peek(1)?;
                let len = machine.stack().peek(2)?;
                let mem = memory_cost(self, dest.max(src), len)?;
                let len_u64 = len.min(U256::from(u64::MAX)).as_u64();
                GasCost::from(faithevm_gasometer::copy_cost(self.config, len_u64) + mem)
            }
            _ if opcode.is_log().is_some() => {
                let topics = opcode.is_log().unwrap_or(0) as u64;
                let offset = machine.stack().peek(0)?;
                let len = machine.stack().peek(1)?;
                let mem = memory_cost(self, offset, len)?;
                let len_u64 = len.min(U256::from(u64::MAX)).as_u64();
                GasCost::from(faithevm_gasometer::log_cost(self.config, topics, len_u64) + mem)
            }
            Opcode::BALANCE | Opcode::EXTCODESIZE | Opcode::EXTCODEHASH => {
                let target = address_from_u256(machine.stack().peek(0)?);
                let cold = self.is_cold(target, None);
                dynamic_opcode_cost(self.config, opcode, Some(StorageTarget::Address { cold }))
                    .ok_or(ExitError::InvalidCode(opcode))?
            }
            Opcode::SLOAD => {
                let index = h256_from_u256(machine.stack().peek(0)?);
                let cold = self.is_cold(address, Some(index));
                dynamic_opcode_cost(self.config, opcode, Some(StorageTarget::Slot { cold }))
                    .ok_or(ExitError::InvalidCode(opcode))?
            }
            Opcode::SSTORE => {
                let index = h256_from_u256(machine.stack().peek(0)?);
                let new = h256_from_u256(machine.stack().peek(1)?);
                let cold = self.is_cold(address, Some(index));
                let original = self.state.substate.original_storage(address, index);
                let current = self.state.substate.storage(address, index);
                sstore_cost(self.config, u256_from_h256(original), u256_from_h256(current), u256_from_h256(new), cold)
            }
            Opcode::SELFDESTRUCT => {
                let target = address_from_u256(machine.stack().peek(0)?);
                let cold = self.is_cold(target, None);
                let target_exists = self.state.substate.exists(target);
                let new_account = !target_exists && self.config.empty_considered_exists;
                let mut cost = self.config.gas_suicide;
                if cold {
                    cost += faithevm_gasometer::consts::G_COLD_ACCOUNT_ACCESS;
                }
                if new_account {
                    cost += self.config.gas_suicide_new_account;
                }
                GasCost::from(cost)
            }
            Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL | Opcode::STATICCALL => {
                // Memory expansion, address access-list surcharge, and here
                // the value-transfer/new-account surcharges (CALL/CALLCODE
                // only). The 63/64 gas-forwarding cap and stipend are
                // separately accounted for by `call_inner`'s own
                // `forwarded_gas`/`gas_stipend`.
                let target = address_from_u256(machine.stack().peek(1)?);
                let value_args = matches!(opcode, Opcode::CALL | Opcode::CALLCODE);
                let value = if value_args { machine.stack().peek(2)? } else { U256::zero() };
                let (in_offset, in_len, out_offset, out_len) = if value_args {
                    (machine.stack().peek(3)?, machine.stack().peek(4)?, machine.stack().peek(5)?, machine.stack().peek(6)?)
                } else {
                    (machine.stack().peek(2)?, machine.stack().peek(3)?, machine.stack().peek(4)?, machine.stack().peek(5)?)
                };
                let mem_in = memory_cost(self, in_offset, in_len)?;
                let mem_out = memory_cost(self, out_offset, out_len)?;
                let cold = self.is_cold(target, None);
                let access = faithevm_gasometer::account_access_cost(self.config, cold, self.config.gas_call);
                let mut cost = mem_in.max(mem_out) + access;
                if opcode == Opcode::CALL && !value.is_zero() {
                    cost += gas_consts::G_CALL_VALUE;
                    if !self.state.substate.exists(target) {
                        cost += gas_consts::G_NEW_ACCOUNT;
                    }
                } else if opcode == Opcode::CALLCODE && !value.is_zero() {
                    cost += gas_consts::G_CALL_VALUE;
                }
                GasCost::from(cost)
            }
            Opcode::CREATE | Opcode::CREATE2 => {
                let offset = machine.stack().peek(1)?;
                let len = machine.stack().peek(2)?;
                GasCost::from(memory_cost(self, offset, len)? + self.config.gas_create)
            }
            _ => return Err(ExitError::InvalidCode(opcode)),
        };
        Ok(cost)
    }
}

fn address_from_u256(value: U256) -> H160 {
    H160::from(h256_from_u256(value))
}

fn h256_from_u256(value: U256) -> H256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    H256::from(bytes)
}

fn u256_from_h256(value: H256) -> U256 {
    U256::from_big_endian(value.as_bytes())
}

impl From<u64> for GasCost {
    fn from(cost: u64) -> Self {
        Self { cost, refund: 0 }
    }
}
