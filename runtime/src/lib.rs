//! Host-facing half of the Frame interpreter: wraps a `faithevm_core::Machine`
//! and resolves every opcode that needs balances, storage, environment data,
//! or a nested call/create against a `Handler`.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod context;
mod eval;
mod handler;
pub mod tracing;

pub use context::{CallScheme, Context, CreateScheme, Transfer};
pub use faithevm_gasometer::Config;
pub use handler::{CallFeedback, CreateFeedback, Handler};

use faithevm_core::prelude::*;
use faithevm_core::{Capture, ExitError, ExitReason, InterpreterHandler, Machine};

/// One bytecode frame: the pure interpreter core plus everything it needs to
/// resolve a system opcode against the active `Handler`.
pub struct Runtime<'config> {
    machine: Machine,
    context: Context,
    return_data_buffer: Vec<u8>,
    is_static: bool,
    config: &'config Config,
}

impl<'config> Runtime<'config> {
    #[must_use]
    pub fn new(
        code: Rc<Vec<u8>>,
        data: Rc<Vec<u8>>,
        context: Context,
        is_static: bool,
        config: &'config Config,
    ) -> Self {
        Self {
            machine: Machine::new(code, data, config.stack_limit, config.memory_limit),
            context,
            return_data_buffer: Vec::new(),
            is_static,
            config,
        }
    }

    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    #[must_use]
    pub const fn machine(&self) -> &Machine {
        &self.machine
    }
    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }
    #[must_use]
    pub const fn config(&self) -> &Config {
        self.config
    }
    #[must_use]
    pub fn return_data_buffer(&self) -> &[u8] {
        &self.return_data_buffer
    }
    pub fn set_return_data_buffer(&mut self, data: Vec<u8>) {
        self.return_data_buffer = data;
    }

    /// Run until the frame exits, charging gas for each opcode and resolving
    /// system opcodes against `host`. The same value fills both roles: the
    /// orchestrator is both the gas metering hook the core interpreter calls
    /// before every step, and the world-state collaborator system opcodes
    /// resolve against.
    ///
    /// # Errors
    /// Returns the terminal `ExitReason` (never a `Trap`: traps are resolved
    /// internally before this function returns).
    pub fn run<H>(&mut self, host: &mut H) -> ExitReason
    where
        H: Handler + InterpreterHandler,
    {
        #[cfg(feature = "force-debug")]
        let mut iterations: u64 = 0;

        loop {
            #[cfg(feature = "force-debug")]
            {
                iterations += 1;
                if iterations > LOOP_QUOTA {
                    return ExitError::ExecutionTimeout.into();
                }
            }

            match self.machine.step(host, &self.context.address) {
                Ok(()) => continue,
                Err(Capture::Exit(reason)) => return reason,
                Err(Capture::Trap(opcode)) => {
                    if let Err(reason) = eval::eval_system(self, host, opcode) {
                        return reason;
                    }
                }
            }
        }
    }
}

/// Debug-build safety valve against a runaway frame (e.g. a fuzzer-discovered
/// infinite loop that never burns gas, or a host bug in gas accounting).
/// Production builds should not enable `force-debug` and so never pay this
/// check.
#[cfg(feature = "force-debug")]
const LOOP_QUOTA: u64 = 10_000_000;

pub(crate) fn write_in_static_context(is_static: bool) -> Result<(), ExitError> {
    if is_static {
        Err(ExitError::WriteInStaticContext)
    } else {
        Ok(())
    }
}
