//! An Ethereum Virtual Machine interpreter and transaction executor, aiming
//! for gas-accounting and state-transition fidelity to the canonical
//! execution rules.
//!
//! This crate wires together the three lower layers —
//! [`faithevm_core`] (stack/memory/bytecode analysis),
//! [`faithevm_gasometer`] (gas schedule and accounting), and
//! [`faithevm_runtime`] (the `Handler`-facing system-opcode evaluator) —
//! into a [`StackExecutor`] orchestrator and a [`transaction`] executor that
//! runs a whole signed transaction end to end: intrinsic gas, fee payment,
//! EIP-7702 authorization processing, the call/create lifecycle, refunds,
//! and EIP-161 empty-account cleanup.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
pub mod prelude {
    pub use alloc::{borrow::Cow, boxed::Box, collections::BTreeMap, collections::BTreeSet, rc::Rc, vec, vec::Vec};
    pub use core::cell::RefCell;
}
#[cfg(feature = "std")]
pub mod prelude {
    pub use std::{
        borrow::Cow, boxed::Box, cell::RefCell, collections::BTreeMap, collections::BTreeSet, rc::Rc, vec, vec::Vec,
    };
}

pub mod access_list;
pub mod backend;
pub mod executor;
pub mod precompiles;
pub mod transaction;

pub use faithevm_core as core_vm;
pub use faithevm_gasometer::Config;
pub use faithevm_runtime as runtime;

pub use backend::Backend;
pub use executor::stack::{
    MemoryStackState, MemoryStackSubstate, StackExecutor, StackExitKind, StackSubstateMetadata,
};
pub use precompiles::{PrecompileFailure, PrecompileHandle, PrecompileOutput, PrecompileResult, PrecompileSet};
pub use transaction::{Authorization, ExecutionResult, Transaction, TransactionExecutor, TransactionValidationError};
