//! Opcode dispatch for the subset of the instruction set that needs no host
//! access. Everything else (balances, storage, nested calls, logs,
//! environment reads) comes back as `Control::Trap` for the orchestrator to
//! resolve a layer up.

mod arithmetic;
mod bitwise;
mod macros;
mod misc;

use crate::error::{ExitError, ExitReason};
use crate::opcode::Opcode;
use crate::Machine;

/// What should happen to the machine after one opcode ran.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Control {
    /// Advance the program counter by this many bytes and keep running.
    Continue(usize),
    /// Set the program counter to this absolute position (a successful JUMP).
    Jump(usize),
    /// Stop the frame.
    Exit(ExitReason),
    /// Hand off to the orchestrator; it resolves the opcode against host
    /// state and resumes the machine with `Control::Continue`/`Jump`/`Exit`.
    Trap(Opcode),
}

pub fn eval(machine: &mut Machine, opcode: Opcode, position: usize) -> Control {
    match opcode {
        Opcode::STOP => misc::stop(machine),
        Opcode::ADD => arithmetic::add_op(machine),
        Opcode::MUL => arithmetic::mul_op(machine),
        Opcode::SUB => arithmetic::sub_op(machine),
        Opcode::DIV => arithmetic::div_op(machine),
        Opcode::SDIV => arithmetic::sdiv_op(machine),
        Opcode::MOD => arithmetic::mod_op(machine),
        Opcode::SMOD => arithmetic::smod_op(machine),
        Opcode::ADDMOD => arithmetic::addmod_op(machine),
        Opcode::MULMOD => arithmetic::mulmod_op(machine),
        Opcode::EXP => arithmetic::exp(machine),
        Opcode::SIGNEXTEND => arithmetic::signextend_op(machine),

        Opcode::LT => bitwise::lt_op(machine),
        Opcode::GT => bitwise::gt_op(machine),
        Opcode::SLT => bitwise::slt_op(machine),
        Opcode::SGT => bitwise::sgt_op(machine),
        Opcode::EQ => bitwise::eq_op(machine),
        Opcode::ISZERO => bitwise::iszero_op(machine),
        Opcode::AND => bitwise::and_op(machine),
        Opcode::OR => bitwise::or_op(machine),
        Opcode::XOR => bitwise::xor_op(machine),
        Opcode::NOT => bitwise::not_op(machine),
        Opcode::BYTE => bitwise::byte_op(machine),
        Opcode::SHL => bitwise::shl_op(machine),
        Opcode::SHR => bitwise::shr_op(machine),
        Opcode::SAR => bitwise::sar_op(machine),

        Opcode::SHA3 => misc::sha3(machine),

        Opcode::POP => misc::pop(machine),
        Opcode::MLOAD => misc::mload(machine),
        Opcode::MSTORE => misc::mstore(machine),
        Opcode::MSTORE8 => misc::mstore8(machine),
        Opcode::MCOPY => misc::mcopy(machine),
        Opcode::PC => misc::pc(machine, position),
        Opcode::MSIZE => misc::msize(machine),
        Opcode::JUMP => misc::jump(machine),
        Opcode::JUMPI => misc::jumpi(machine),
        Opcode::JUMPDEST => misc::jumpdest(machine),

        Opcode::CODESIZE => misc::codesize(machine),
        Opcode::CODECOPY => misc::codecopy(machine),
        Opcode::CALLDATALOAD => {
            let data = machine.data.clone();
            misc::calldataload(machine, &data[..])
        }
        Opcode::CALLDATASIZE => {
            let data = machine.data.clone();
            misc::calldatasize(machine, &data[..])
        }
        Opcode::CALLDATACOPY => {
            let data = machine.data.clone();
            misc::calldatacopy(machine, &data[..])
        }

        Opcode::RETURN => misc::ret(machine),
        Opcode::REVERT => misc::revert(machine),
        Opcode::INVALID => misc::invalid(machine),

        Opcode::PUSH0 => misc::push0(machine),
        _ if opcode.is_push().is_some() => misc::push(machine, opcode.is_push().unwrap() as usize, position),
        _ if opcode.is_dup().is_some() => misc::dup(machine, opcode.is_dup().unwrap() as usize),
        _ if opcode.is_swap().is_some() => misc::swap(machine, opcode.is_swap().unwrap() as usize),

        // Everything else needs host access: balances/storage/environment
        // reads, CALL/CREATE family, LOG, SELFDESTRUCT, GAS, return-data.
        Opcode::ADDRESS
        | Opcode::BALANCE
        | Opcode::ORIGIN
        | Opcode::CALLER
        | Opcode::CALLVALUE
        | Opcode::GASPRICE
        | Opcode::EXTCODESIZE
        | Opcode::EXTCODECOPY
        | Opcode::EXTCODEHASH
        | Opcode::RETURNDATASIZE
        | Opcode::RETURNDATACOPY
        | Opcode::BLOCKHASH
        | Opcode::COINBASE
        | Opcode::TIMESTAMP
        | Opcode::NUMBER
        | Opcode::PREVRANDAO
        | Opcode::GASLIMIT
        | Opcode::CHAINID
        | Opcode::SELFBALANCE
        | Opcode::BASEFEE
        | Opcode::BLOBHASH
        | Opcode::BLOBBASEFEE
        | Opcode::SLOAD
        | Opcode::SSTORE
        | Opcode::TLOAD
        | Opcode::TSTORE
        | Opcode::GAS
        | Opcode::LOG0
        | Opcode::LOG1
        | Opcode::LOG2
        | Opcode::LOG3
        | Opcode::LOG4
        | Opcode::CREATE
        | Opcode::CALL
        | Opcode::CALLCODE
        | Opcode::DELEGATECALL
        | Opcode::CREATE2
        | Opcode::STATICCALL
        | Opcode::SELFDESTRUCT => Control::Trap(opcode),

        _ => Control::Exit(ExitError::InvalidCode(opcode).into()),
    }
}
