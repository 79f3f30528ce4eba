//! Stack/memory shuffling, control flow, and the few opcodes (CODECOPY,
//! CALLDATACOPY, SHA3, MCOPY, ...) that only touch this frame's own
//! code/data/memory and need no host access.

use super::macros::{pop_u256, push_u256, try_or_fail};
use super::Control;
use crate::error::{ExitError, ExitSucceed};
use crate::opcode::Opcode;
use crate::prelude::*;
use crate::Machine;
use primitive_types::{H256, U256};
use sha3::{Digest, Keccak256};

pub fn stop(_machine: &mut Machine) -> Control {
    Control::Exit(ExitSucceed::Stopped.into())
}

pub fn invalid(_machine: &mut Machine) -> Control {
    Control::Exit(ExitError::InvalidCode(Opcode::INVALID).into())
}

pub fn pop(machine: &mut Machine) -> Control {
    pop_u256!(machine, _val);
    Control::Continue(1)
}

pub fn pc(machine: &mut Machine, position: usize) -> Control {
    push_u256!(machine, U256::from(position));
    Control::Continue(1)
}

pub fn msize(machine: &mut Machine) -> Control {
    let len = machine.memory().effective_len();
    push_u256!(machine, len);
    Control::Continue(1)
}

pub fn jump(machine: &mut Machine) -> Control {
    pop_u256!(machine, dest);
    let dest = if dest > U256::from(usize::MAX) {
        return Control::Exit(ExitError::InvalidJump.into());
    } else {
        dest.as_usize()
    };

    if machine.valids().is_valid(dest) {
        Control::Jump(dest)
    } else {
        Control::Exit(ExitError::InvalidJump.into())
    }
}

pub fn jumpi(machine: &mut Machine) -> Control {
    pop_u256!(machine, dest, value);

    if value != U256::zero() {
        let dest = if dest > U256::from(usize::MAX) {
            return Control::Exit(ExitError::InvalidJump.into());
        } else {
            dest.as_usize()
        };

        if machine.valids().is_valid(dest) {
            Control::Jump(dest)
        } else {
            Control::Exit(ExitError::InvalidJump.into())
        }
    } else {
        Control::Continue(1)
    }
}

pub fn jumpdest(_machine: &mut Machine) -> Control {
    Control::Continue(1)
}

pub fn push(machine: &mut Machine, n: usize, position: usize) -> Control {
    // `n` immediate bytes follow the opcode; reads past the code's end are
    // zero-padded.
    let end = core::cmp::min(position + 1 + n, machine.code().len());
    let mut slice = [0u8; 32];
    let from = position + 1;
    if from < end {
        slice[32 - n..32 - n + (end - from)].copy_from_slice(&machine.code()[from..end]);
    }
    push_u256!(machine, U256::from_big_endian(&slice));
    Control::Continue(1 + n)
}

/// PUSH0 (EIP-3855): pushes a zero word, no immediate bytes.
pub fn push0(machine: &mut Machine) -> Control {
    push_u256!(machine, U256::zero());
    Control::Continue(1)
}

pub fn dup(machine: &mut Machine, n: usize) -> Control {
    let value = try_or_fail!(machine.stack().peek(n - 1));
    push_u256!(machine, value);
    Control::Continue(1)
}

pub fn swap(machine: &mut Machine, n: usize) -> Control {
    let val1 = try_or_fail!(machine.stack().peek(0));
    let val2 = try_or_fail!(machine.stack().peek(n));
    try_or_fail!(machine.stack_mut().set(0, val2));
    try_or_fail!(machine.stack_mut().set(n, val1));
    Control::Continue(1)
}

pub fn ret(machine: &mut Machine) -> Control {
    pop_u256!(machine, start, len);
    try_or_fail!(machine.memory_mut().resize_offset(start, len));
    machine.return_range = start..(start.overflowing_add(len).0);
    Control::Exit(ExitSucceed::Returned.into())
}

pub fn revert(machine: &mut Machine) -> Control {
    pop_u256!(machine, start, len);
    try_or_fail!(machine.memory_mut().resize_offset(start, len));
    machine.return_range = start..(start.overflowing_add(len).0);
    Control::Exit(crate::error::ExitRevert::Reverted.into())
}

pub fn mload(machine: &mut Machine) -> Control {
    pop_u256!(machine, index);
    try_or_fail!(machine.memory_mut().resize_offset(index, U256::from(32)));
    let index = index.as_usize();
    let value = H256::from_slice(&machine.memory_mut().get(index, 32));
    push_u256!(machine, value.into());
    Control::Continue(1)
}

pub fn mstore(machine: &mut Machine) -> Control {
    pop_u256!(machine, index, value);
    try_or_fail!(machine.memory_mut().resize_offset(index, U256::from(32)));
    let index = index.as_usize();
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    try_or_fail!(machine.memory_mut().set(index, &bytes, Some(32)));
    Control::Continue(1)
}

pub fn mstore8(machine: &mut Machine) -> Control {
    pop_u256!(machine, index, value);
    try_or_fail!(machine.memory_mut().resize_offset(index, U256::one()));
    let index = index.as_usize();
    let value = (value.low_u32() & 0xff) as u8;
    try_or_fail!(machine.memory_mut().set(index, &[value], Some(1)));
    Control::Continue(1)
}

pub fn mcopy(machine: &mut Machine) -> Control {
    pop_u256!(machine, dest, src, len);
    try_or_fail!(machine.memory_mut().resize_offset(core::cmp::max(dest, src), len));
    if len == U256::zero() {
        return Control::Continue(1);
    }
    let dest = dest.as_usize();
    let src = src.as_usize();
    let len = len.as_usize();
    let data = machine.memory().get(src, len);
    try_or_fail!(machine.memory_mut().set(dest, &data, Some(len)));
    Control::Continue(1)
}

pub fn codesize(machine: &mut Machine) -> Control {
    let size = U256::from(machine.code().len());
    push_u256!(machine, size);
    Control::Continue(1)
}

pub fn codecopy(machine: &mut Machine) -> Control {
    pop_u256!(machine, memory_offset, code_offset, len);
    try_or_fail!(machine.memory_mut().resize_offset(memory_offset, len));
    let len = if len > U256::from(usize::MAX) { return Control::Exit(ExitError::InvalidRange.into()); } else { len.as_usize() };
    let memory_offset = if memory_offset > U256::from(usize::MAX) { return Control::Exit(ExitError::InvalidRange.into()); } else { memory_offset.as_usize() };
    let code = Vec::from(machine.code());
    try_or_fail!(machine.memory_mut().copy_data(memory_offset, code_offset, len, &code));
    Control::Continue(1)
}

pub fn calldataload(machine: &mut Machine, data: &[u8]) -> Control {
    pop_u256!(machine, index);
    let mut load = [0u8; 32];
    #[allow(clippy::needless_range_loop)]
    for i in 0..32 {
        if let Some(p) = index.checked_add(U256::from(i)) {
            if p <= U256::from(usize::MAX) {
                let p = p.as_usize();
                if p < data.len() {
                    load[i] = data[p];
                }
            }
        }
    }
    push_u256!(machine, U256::from_big_endian(&load));
    Control::Continue(1)
}

pub fn calldatasize(machine: &mut Machine, data: &[u8]) -> Control {
    push_u256!(machine, U256::from(data.len()));
    Control::Continue(1)
}

pub fn calldatacopy(machine: &mut Machine, data: &[u8]) -> Control {
    pop_u256!(machine, memory_offset, data_offset, len);
    try_or_fail!(machine.memory_mut().resize_offset(memory_offset, len));
    let len = if len > U256::from(usize::MAX) { return Control::Exit(ExitError::InvalidRange.into()); } else { len.as_usize() };
    let memory_offset = if memory_offset > U256::from(usize::MAX) { return Control::Exit(ExitError::InvalidRange.into()); } else { memory_offset.as_usize() };
    try_or_fail!(machine.memory_mut().copy_data(memory_offset, data_offset, len, data));
    Control::Continue(1)
}

pub fn sha3(machine: &mut Machine) -> Control {
    pop_u256!(machine, from, len);
    try_or_fail!(machine.memory_mut().resize_offset(from, len));
    let data = if len > U256::from(usize::MAX) {
        return Control::Exit(ExitError::InvalidRange.into());
    } else {
        machine.memory().get(from.as_usize(), len.as_usize())
    };

    let ret = Keccak256::digest(&data);
    push_u256!(machine, U256::from_big_endian(&ret));
    Control::Continue(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::Rc;
    use crate::Machine;

    fn machine(code: Vec<u8>) -> Machine {
        Machine::new(Rc::new(code), Rc::new(Vec::new()), 1024, 1024 * 1024)
    }

    #[test]
    fn push_zero_pads_truncated_immediate() {
        // PUSH2 with only one immediate byte available.
        let mut m = machine(vec![Opcode::PUSH2.as_u8(), 0xff]);
        let ctrl = push(&mut m, 2, 0);
        assert_eq!(ctrl, Control::Continue(3));
        assert_eq!(m.stack().peek(0).unwrap(), U256::from(0xff00));
    }

    #[test]
    fn jump_to_non_jumpdest_is_invalid() {
        let mut m = machine(vec![Opcode::STOP.as_u8()]);
        m.stack_mut().push(U256::zero()).unwrap();
        let ctrl = jump(&mut m);
        assert_eq!(ctrl, Control::Exit(ExitError::InvalidJump.into()));
    }

    #[test]
    fn sha3_of_empty_range_is_keccak_empty() {
        let mut m = machine(vec![]);
        m.stack_mut().push(U256::zero()).unwrap();
        m.stack_mut().push(U256::zero()).unwrap();
        let ctrl = sha3(&mut m);
        assert_eq!(ctrl, Control::Continue(1));
        let expected = U256::from_big_endian(&Keccak256::digest([]));
        assert_eq!(m.stack().peek(0).unwrap(), expected);
    }
}
