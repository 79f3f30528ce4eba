use crate::context::{Context, CreateScheme, Transfer};
use crate::{write_in_static_context, Handler, Runtime};
use faithevm_core::prelude::*;
use faithevm_core::{ExitError, ExitReason, Opcode};
use primitive_types::{H160, H256, U256};

type StepResult = Result<(), ExitReason>;

fn pop(runtime: &mut Runtime) -> Result<U256, ExitReason> {
    runtime.machine_mut().stack_mut().pop().map_err(Into::into)
}

fn push(runtime: &mut Runtime, value: U256) -> StepResult {
    runtime.machine_mut().stack_mut().push(value).map_err(Into::into)
}

fn h256_from(value: U256) -> H256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    H256::from(bytes)
}

fn address_from(value: U256) -> H160 {
    H160::from(h256_from(value))
}

fn finish(runtime: &mut Runtime) -> StepResult {
    runtime.machine_mut().advance(1);
    Ok(())
}

pub(crate) fn eval<H: Handler>(runtime: &mut Runtime, host: &mut H, opcode: Opcode) -> StepResult {
    match opcode {
        Opcode::ADDRESS => {
            push(runtime, U256::from(runtime.context().address.as_bytes()))?;
            finish(runtime)
        }
        Opcode::ORIGIN => {
            push(runtime, U256::from(host.origin().as_bytes()))?;
            finish(runtime)
        }
        Opcode::CALLER => {
            push(runtime, U256::from(runtime.context().caller.as_bytes()))?;
            finish(runtime)
        }
        Opcode::CALLVALUE => {
            push(runtime, runtime.context().apparent_value)?;
            finish(runtime)
        }
        Opcode::GASPRICE => {
            push(runtime, host.gas_price())?;
            finish(runtime)
        }
        Opcode::CHAINID => {
            push(runtime, host.chain_id())?;
            finish(runtime)
        }
        Opcode::COINBASE => {
            push(runtime, U256::from(host.block_coinbase().as_bytes()))?;
            finish(runtime)
        }
        Opcode::TIMESTAMP => {
            push(runtime, host.block_timestamp())?;
            finish(runtime)
        }
        Opcode::NUMBER => {
            push(runtime, host.block_number())?;
            finish(runtime)
        }
        Opcode::PREVRANDAO => {
            let value = host
                .block_randomness()
                .map_or_else(|| host.block_difficulty(), |r| U256::from_big_endian(r.as_bytes()));
            push(runtime, value)?;
            finish(runtime)
        }
        Opcode::GASLIMIT => {
            push(runtime, host.block_gas_limit())?;
            finish(runtime)
        }
        Opcode::BASEFEE => {
            push(runtime, host.block_base_fee_per_gas())?;
            finish(runtime)
        }
        Opcode::BLOBBASEFEE => {
            push(runtime, host.blob_base_fee_per_gas())?;
            finish(runtime)
        }
        Opcode::BLOBHASH => {
            let index = pop(runtime)?;
            let value = if index > U256::from(usize::MAX) {
                H256::zero()
            } else {
                host.blob_hash(index.as_usize()).unwrap_or_default()
            };
            push(runtime, U256::from_big_endian(value.as_bytes()))?;
            finish(runtime)
        }
        Opcode::SELFBALANCE => {
            let address = runtime.context().address;
            push(runtime, host.balance(address))?;
            finish(runtime)
        }
        Opcode::BALANCE => {
            let address = address_from(pop(runtime)?);
            push(runtime, host.balance(address))?;
            finish(runtime)
        }
        Opcode::EXTCODESIZE => {
            let address = address_from(pop(runtime)?);
            push(runtime, host.code_size(address))?;
            finish(runtime)
        }
        Opcode::EXTCODEHASH => {
            let address = address_from(pop(runtime)?);
            let hash = if host.exists(address) { host.code_hash(address) } else { H256::zero() };
            push(runtime, U256::from_big_endian(hash.as_bytes()))?;
            finish(runtime)
        }
        Opcode::EXTCODECOPY => {
            let address = address_from(pop(runtime)?);
            let memory_offset = pop(runtime)?;
            let code_offset = pop(runtime)?;
            let len = pop(runtime)?;
            let code = host.code(address);
            copy_to_memory(runtime, memory_offset, code_offset, len, &code)?;
            finish(runtime)
        }
        Opcode::RETURNDATASIZE => {
            push(runtime, U256::from(runtime.return_data_buffer().len()))?;
            finish(runtime)
        }
        Opcode::RETURNDATACOPY => {
            let memory_offset = pop(runtime)?;
            let data_offset = pop(runtime)?;
            let len = pop(runtime)?;
            if data_offset.saturating_add(len) > U256::from(runtime.return_data_buffer().len()) {
                return Err(ExitError::OutOfOffset.into());
            }
            let data = runtime.return_data_buffer().to_vec();
            copy_to_memory(runtime, memory_offset, data_offset, len, &data)?;
            finish(runtime)
        }
        Opcode::BLOCKHASH => {
            let number = pop(runtime)?;
            let hash = host.block_hash(number);
            push(runtime, U256::from_big_endian(hash.as_bytes()))?;
            finish(runtime)
        }
        Opcode::GAS => {
            push(runtime, U256::from(host.gas_left()))?;
            finish(runtime)
        }
        Opcode::SLOAD => {
            let address = runtime.context().address;
            let index = h256_from(pop(runtime)?);
            let value = host.storage(address, index);
            push(runtime, U256::from_big_endian(value.as_bytes()))?;
            finish(runtime)
        }
        Opcode::SSTORE => {
            write_in_static_context(is_static(runtime))?;
            let address = runtime.context().address;
            let index = h256_from(pop(runtime)?);
            let value = h256_from(pop(runtime)?);
            host.set_storage(address, index, value)?;
            finish(runtime)
        }
        Opcode::TLOAD => {
            let address = runtime.context().address;
            let index = h256_from(pop(runtime)?);
            let value = host.transient_storage(address, index);
            push(runtime, U256::from_big_endian(value.as_bytes()))?;
            finish(runtime)
        }
        Opcode::TSTORE => {
            write_in_static_context(is_static(runtime))?;
            let address = runtime.context().address;
            let index = h256_from(pop(runtime)?);
            let value = h256_from(pop(runtime)?);
            host.set_transient_storage(address, index, value)?;
            finish(runtime)
        }
        Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => {
            write_in_static_context(is_static(runtime))?;
            log(runtime, host, opcode)?;
            finish(runtime)
        }
        Opcode::SELFDESTRUCT => {
            write_in_static_context(is_static(runtime))?;
            let target = address_from(pop(runtime)?);
            let address = runtime.context().address;
            host.mark_delete(address, target)?;
            Err(faithevm_core::ExitSucceed::Suicided.into())
        }
        Opcode::CREATE | Opcode::CREATE2 => {
            write_in_static_context(is_static(runtime))?;
            create(runtime, host, opcode)?;
            finish(runtime)
        }
        Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL | Opcode::STATICCALL => {
            call(runtime, host, opcode)?;
            finish(runtime)
        }
        _ => Err(ExitError::InvalidCode(opcode).into()),
    }
}

fn is_static(runtime: &Runtime) -> bool {
    runtime.is_static()
}

fn copy_to_memory(
    runtime: &mut Runtime,
    memory_offset: U256,
    data_offset: U256,
    len: U256,
    data: &[u8],
) -> StepResult {
    runtime
        .machine_mut()
        .memory_mut()
        .resize_offset(memory_offset, len)
        .map_err(ExitReason::from)?;
    if len > U256::from(usize::MAX) || memory_offset > U256::from(usize::MAX) {
        return Err(ExitError::InvalidRange.into());
    }
    runtime
        .machine_mut()
        .memory_mut()
        .copy_data(memory_offset.as_usize(), data_offset, len.as_usize(), data)
        .map_err(Into::into)
}

fn log<H: Handler>(runtime: &mut Runtime, host: &mut H, opcode: Opcode) -> StepResult {
    let offset = pop(runtime)?;
    let len = pop(runtime)?;
    let topic_count = opcode.is_log().unwrap_or(0) as usize;
    let mut topics = Vec::with_capacity(topic_count);
    for _ in 0..topic_count {
        topics.push(h256_from(pop(runtime)?));
    }

    runtime
        .machine_mut()
        .memory_mut()
        .resize_offset(offset, len)
        .map_err(ExitReason::from)?;
    if len > U256::from(usize::MAX) || offset > U256::from(usize::MAX) {
        return Err(ExitError::InvalidRange.into());
    }
    let data = runtime.machine().memory().get(offset.as_usize(), len.as_usize());
    let address = runtime.context().address;
    host.log(address, topics, data)?;
    Ok(())
}

fn create<H: Handler>(runtime: &mut Runtime, host: &mut H, opcode: Opcode) -> StepResult {
    let caller = runtime.context().address;
    let value = pop(runtime)?;
    let offset = pop(runtime)?;
    let len = pop(runtime)?;
    let scheme = if opcode == Opcode::CREATE2 {
        let salt = h256_from(pop(runtime)?);
        CreateScheme::Create2 { caller, salt }
    } else {
        CreateScheme::Legacy { caller }
    };

    runtime
        .machine_mut()
        .memory_mut()
        .resize_offset(offset, len)
        .map_err(ExitReason::from)?;
    if len > U256::from(usize::MAX) || offset > U256::from(usize::MAX) {
        return Err(ExitError::InvalidRange.into());
    }
    let init_code = runtime.machine().memory().get(offset.as_usize(), len.as_usize());

    let feedback = host.create(caller, scheme, value, init_code, None);
    runtime.set_return_data_buffer(feedback.return_data);
    let result = match (feedback.reason.is_succeed(), feedback.address) {
        (true, Some(address)) => U256::from(address.as_bytes()),
        _ => U256::zero(),
    };
    push(runtime, result)
}

fn call<H: Handler>(runtime: &mut Runtime, host: &mut H, opcode: Opcode) -> StepResult {
    let target_gas = pop(runtime)?;
    let code_address = address_from(pop(runtime)?);
    let value = if matches!(opcode, Opcode::CALL | Opcode::CALLCODE) {
        pop(runtime)?
    } else {
        U256::zero()
    };
    let in_offset = pop(runtime)?;
    let in_len = pop(runtime)?;
    let out_offset = pop(runtime)?;
    let out_len = pop(runtime)?;

    if opcode == Opcode::CALL {
        write_in_static_context(is_static(runtime) && value != U256::zero())?;
    }

    runtime
        .machine_mut()
        .memory_mut()
        .resize_offset(in_offset, in_len)
        .map_err(ExitReason::from)?;
    runtime
        .machine_mut()
        .memory_mut()
        .resize_offset(out_offset, out_len)
        .map_err(ExitReason::from)?;
    if in_len > U256::from(usize::MAX) || in_offset > U256::from(usize::MAX) {
        return Err(ExitError::InvalidRange.into());
    }
    let input = runtime.machine().memory().get(in_offset.as_usize(), in_len.as_usize());

    let own_address = runtime.context().address;
    let caller = runtime.context().caller;

    let (context, transfer) = match opcode {
        Opcode::CALL => (
            Context { address: code_address, caller: own_address, apparent_value: value },
            Some(Transfer { source: own_address, target: code_address, value }),
        ),
        Opcode::CALLCODE => (
            Context { address: own_address, caller: own_address, apparent_value: value },
            Some(Transfer { source: own_address, target: own_address, value }),
        ),
        Opcode::DELEGATECALL => (
            Context { address: own_address, caller, apparent_value: runtime.context().apparent_value },
            None,
        ),
        Opcode::STATICCALL => (
            Context { address: code_address, caller: own_address, apparent_value: U256::zero() },
            None,
        ),
        _ => unreachable!(),
    };

    let gas_limit = if target_gas > U256::from(u64::MAX) { None } else { Some(target_gas.as_u64()) };
    let is_static_call = matches!(opcode, Opcode::STATICCALL) || is_static(runtime);

    let feedback = host.call(code_address, transfer, input, gas_limit, is_static_call, context);
    runtime.set_return_data_buffer(feedback.return_data.clone());

    if out_len != U256::zero() {
        let copy_len = core::cmp::min(out_len.as_usize(), feedback.return_data.len());
        let data = &feedback.return_data[..copy_len];
        runtime
            .machine_mut()
            .memory_mut()
            .set(out_offset.as_usize(), data, Some(out_len.as_usize()))
            .map_err(ExitReason::from)?;
    }

    push(runtime, if feedback.reason.is_succeed() { U256::one() } else { U256::zero() })
}
