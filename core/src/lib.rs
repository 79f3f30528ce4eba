//! Core bytecode interpreter layer.
//!
//! This crate owns the parts of the Frame interpreter that do not need to
//! call back out into host/world-state: the operand stack, linear memory,
//! the `JUMPDEST` bitmap, and the opcode dispatch loop for opcodes whose
//! semantics are purely local (arithmetic, bitwise, stack/memory shuffling,
//! control flow within a single frame). Opcodes that need balances,
//! storage, or nested calls are handled one layer up, in `faithevm-runtime`.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
pub mod prelude {
    pub use alloc::{borrow::Cow, boxed::Box, rc::Rc, vec, vec::Vec};
}
#[cfg(feature = "std")]
pub mod prelude {
    pub use std::{borrow::Cow, boxed::Box, rc::Rc, vec, vec::Vec};
}

mod error;
mod eval;
mod external;
mod memory;
mod opcode;
mod stack;
pub mod utils;
mod valids;

pub use error::{Capture, ExitError, ExitFatal, ExitReason, ExitRevert, ExitSucceed, Trap};
pub use external::ExternalOperation;
pub use memory::Memory;
pub use opcode::Opcode;
pub use stack::Stack;
pub use valids::Valids;

use core::ops::Range;
use eval::{eval, Control};
use prelude::*;
use primitive_types::{H160, U256};
use utils::U256_ZERO;

/// One bytecode frame's dispatch loop: program counter, stack, memory, and
/// the analyzed code it is executing. Constructed per CALL/CREATE by the
/// orchestrator and dropped when the call returns.
pub struct Machine {
    /// Input data (calldata or initcode constructor args).
    data: Rc<Vec<u8>>,
    /// Executing bytecode.
    code: Rc<Vec<u8>>,
    /// Program counter, or the terminal reason once execution has stopped.
    position: Result<usize, ExitReason>,
    /// Byte range of `code`/return data staged by RETURN/REVERT.
    return_range: Range<U256>,
    /// Precomputed `JUMPDEST` bitmap.
    valids: Valids,
    memory: Memory,
    stack: Stack,
}

/// Callback the Machine invokes around every opcode, so the owning layer can
/// charge gas and (optionally) emit a trace record before semantics run.
pub trait InterpreterHandler {
    /// # Errors
    /// Returns `ExitError` to abort execution (e.g. out of gas).
    fn before_bytecode(
        &mut self,
        opcode: Opcode,
        pc: usize,
        machine: &Machine,
        address: &H160,
    ) -> Result<(), ExitError>;

    #[cfg(feature = "tracing")]
    fn after_bytecode(&mut self, result: &Result<(), Capture<ExitReason, Trap>>, machine: &Machine);
}

impl Machine {
    #[must_use]
    pub const fn stack(&self) -> &Stack {
        &self.stack
    }
    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }
    #[must_use]
    pub const fn position(&self) -> &Result<usize, ExitReason> {
        &self.position
    }
    #[must_use]
    pub fn code(&self) -> &[u8] {
        &self.code
    }
    #[must_use]
    pub fn valids(&self) -> &Valids {
        &self.valids
    }

    /// Create a new machine with given code and data.
    #[must_use]
    pub fn new(
        code: Rc<Vec<u8>>,
        data: Rc<Vec<u8>>,
        stack_limit: usize,
        memory_limit: usize,
    ) -> Self {
        let valids = Valids::new(&code[..]);

        Self {
            data,
            code,
            position: Ok(0),
            return_range: U256_ZERO..U256_ZERO,
            valids,
            memory: Memory::new(memory_limit),
            stack: Stack::new(stack_limit),
        }
    }

    /// Explicit exit of the machine. Further steps return the same error.
    pub fn exit(&mut self, reason: ExitReason) {
        self.position = Err(reason);
    }

    /// Resume after a resolved trap: advance the program counter by `n`
    /// bytes (the trapping opcode itself, since traps never have immediates).
    pub fn advance(&mut self, n: usize) {
        if let Ok(position) = self.position {
            self.position = Ok(position + n);
        }
    }

    /// Resume after a resolved trap at an absolute position (unused today —
    /// no trapping opcode jumps — kept for parity with `Control::Jump`).
    pub fn jump_to(&mut self, position: usize) {
        self.position = Ok(position);
    }

    /// Inspect the next opcode and the current stack, without executing it.
    #[must_use]
    pub fn inspect(&self) -> Option<(Opcode, &Stack)> {
        let Ok(position) = self.position else {
            return None;
        };
        self.code.get(position).map(|v| (Opcode(*v), &self.stack))
    }

    /// Copy out the bytes staged by the most recent RETURN/REVERT.
    #[must_use]
    pub fn return_value(&self) -> Vec<u8> {
        if self.return_range.start > utils::USIZE_MAX {
            vec![0; (self.return_range.end - self.return_range.start).as_usize()]
        } else if self.return_range.end > utils::USIZE_MAX {
            let mut ret = self.memory.get(
                self.return_range.start.as_usize(),
                usize::MAX - self.return_range.start.as_usize(),
            );
            let new_len = (self.return_range.end - self.return_range.start).as_usize();
            if ret.len() < new_len {
                ret.resize(new_len, 0);
            }
            ret
        } else {
            self.memory.get(
                self.return_range.start.as_usize(),
                (self.return_range.end - self.return_range.start).as_usize(),
            )
        }
    }

    /// Run one opcode. Returns `Ok(())` if execution should keep going within
    /// this frame, `Err(Capture::Exit(..))` on termination, or
    /// `Err(Capture::Trap(..))` when control must hand off to the
    /// orchestrator (CALL/CREATE family).
    ///
    /// # Errors
    /// Returns `Capture<ExitReason, Trap>`.
    #[inline]
    pub fn step<H: InterpreterHandler>(
        &mut self,
        handler: &mut H,
        address: &H160,
    ) -> Result<(), Capture<ExitReason, Trap>> {
        let position = *self
            .position
            .as_ref()
            .map_err(|reason| Capture::Exit(reason.clone()))?;

        let opcode = match self.code.get(position) {
            Some(v) => Opcode(*v),
            None => {
                let reason = ExitSucceed::Stopped.into();
                self.position = Err(reason);
                return Err(Capture::Exit(ExitSucceed::Stopped.into()));
            }
        };

        if let Err(e) = handler.before_bytecode(opcode, position, self, address) {
            let reason = ExitReason::Error(e);
            self.position = Err(reason.clone());
            return Err(Capture::Exit(reason));
        }

        let result = eval(self, opcode, position);
        #[cfg(feature = "tracing")]
        {
            let wrapped = match &result {
                Control::Continue(_) | Control::Jump(_) => Ok(()),
                Control::Exit(e) => Err(Capture::Exit(e.clone())),
                Control::Trap(t) => Err(Capture::Trap(*t)),
            };
            handler.after_bytecode(&wrapped, self);
        }

        match result {
            Control::Continue(n) => {
                self.position = Ok(position + n);
                Ok(())
            }
            Control::Jump(n) => {
                self.position = Ok(n);
                Ok(())
            }
            Control::Exit(e) => {
                self.position = Err(e.clone());
                Err(Capture::Exit(e))
            }
            Control::Trap(opcode) => Err(Capture::Trap(opcode)),
        }
    }
}
