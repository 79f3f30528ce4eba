//! The stack-based executor: a [`StackExecutor`] wrapping in-memory,
//! snapshot-on-every-frame state ([`MemoryStackState`]).

mod executor;
pub mod memory;

pub use executor::{StackExecutor, StackExitKind};
pub use memory::{Log, MemoryStackState, MemoryStackSubstate, StackSubstateMetadata};
