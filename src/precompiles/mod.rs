//! Precompile dispatch: addresses `0x01`-`0x12`, each wrapping a real
//! cryptographic primitive behind a simple input/output contract, treated
//! as an external collaborator rather than interpreted bytecode.

mod blake2;
mod bn128;
mod bls12381;
mod kzg;
mod modexp;
mod simple;

use crate::prelude::*;
use primitive_types::H160;

/// What a precompile needs from its caller: the input, the gas it's been
/// offered, and whether it's running in a STATICCALL (precompiles never
/// write state, so this is informational only, kept for parity with the
/// opcode handler contract).
#[derive(Clone, Debug)]
pub struct PrecompileHandle<'a> {
    pub input: &'a [u8],
    pub gas_limit: Option<u64>,
    pub is_static: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrecompileOutput {
    pub cost: u64,
    pub output: Vec<u8>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PrecompileFailure {
    /// Ran out of gas before producing output.
    OutOfGas,
    /// Input was malformed for this precompile (e.g. a point not on curve).
    /// Per EIP-2: this reverts (returns no data) rather than consuming all
    /// gas, except where EIP-198/spec note an exception.
    Error(Cow<'static, str>),
}

pub type PrecompileResult = Result<PrecompileOutput, PrecompileFailure>;

/// A dispatch table from address to precompile implementation. The
/// orchestrator consults this before running a CALL/CALLCODE/DELEGATECALL/
/// STATICCALL as ordinary bytecode.
pub trait PrecompileSet {
    fn execute(&self, address: H160, handle: PrecompileHandle<'_>) -> Option<PrecompileResult>;

    fn is_precompile(&self, address: H160) -> bool;
}

/// The standard precompile set, addresses `0x01`-`0x12`, gated by the active
/// hardfork (BLS12-381 from Prague, point evaluation from Cancun, and so
/// on); construct once per hardfork alongside the `Config`.
pub struct StandardPrecompiles {
    pub has_byzantium: bool,
    pub has_istanbul: bool,
    pub has_berlin: bool,
    pub has_cancun: bool,
    pub has_prague: bool,
}

impl StandardPrecompiles {
    #[must_use]
    pub const fn new(has_byzantium: bool, has_istanbul: bool, has_berlin: bool, has_cancun: bool, has_prague: bool) -> Self {
        Self { has_byzantium, has_istanbul, has_berlin, has_cancun, has_prague }
    }

    fn address_active(&self, byte: u8) -> bool {
        match byte {
            0x01..=0x04 => true,
            0x05..=0x08 => self.has_byzantium,
            0x09 => self.has_istanbul,
            0x0a => self.has_cancun,
            0x0b..=0x12 => self.has_prague,
            _ => false,
        }
    }
}

impl PrecompileSet for StandardPrecompiles {
    fn execute(&self, address: H160, handle: PrecompileHandle<'_>) -> Option<PrecompileResult> {
        let bytes = address.as_bytes();
        if bytes[..19] != [0u8; 19] {
            return None;
        }
        let byte = bytes[19];
        if !self.address_active(byte) {
            return None;
        }

        Some(match byte {
            0x01 => simple::ecrecover(handle.input),
            0x02 => simple::sha256(handle.input),
            0x03 => simple::ripemd160(handle.input),
            0x04 => simple::identity(handle.input),
            0x05 => modexp::modexp(handle.input, self.has_berlin),
            0x06 => bn128::add(handle.input, self.has_istanbul),
            0x07 => bn128::mul(handle.input, self.has_istanbul),
            0x08 => bn128::pairing(handle.input, self.has_istanbul),
            0x09 => blake2::blake2f(handle.input),
            0x0a => kzg::point_evaluation(handle.input),
            0x0b..=0x12 => bls12381::dispatch(byte, handle.input),
            _ => return None,
        })
    }

    fn is_precompile(&self, address: H160) -> bool {
        let bytes = address.as_bytes();
        bytes[..19] == [0u8; 19] && self.address_active(bytes[19])
    }
}
