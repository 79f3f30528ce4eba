//! `0x0a` POINT_EVALUATION (EIP-4844): verifies that a KZG commitment opens
//! to a claimed value at a claimed point, against the trusted setup shipped
//! with the chain's canonical KZG parameters.

use super::{PrecompileFailure, PrecompileOutput, PrecompileResult};
use crate::prelude::*;
use c_kzg::{Bytes32, Bytes48, KzgSettings};
use sha2::Digest as _;

const FIELD_ELEMENTS_PER_BLOB: u64 = 4096;
// BLS12-381 scalar field modulus, returned alongside the field-element count
// on success so callers can sanity-check the proof system in use.
const BLS_MODULUS: [u8; 32] = [
    0x73, 0xed, 0xa7, 0x53, 0x29, 0x9d, 0x7d, 0x48, 0x33, 0x39, 0xd8, 0x08, 0x09, 0xa1, 0xd8, 0x05, 0x53, 0xbd, 0xa4,
    0x02, 0xff, 0xfe, 0x5b, 0xfe, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01,
];

pub fn point_evaluation(input: &[u8]) -> PrecompileResult {
    const COST: u64 = 50_000;

    if input.len() != 192 {
        return Err(PrecompileFailure::Error(Cow::Borrowed("input must be 192 bytes")));
    }

    let versioned_hash = &input[0..32];
    let z = &input[32..64];
    let y = &input[64..96];
    let commitment = &input[96..144];
    let proof = &input[144..192];

    // EIP-4844: the first input word must equal the versioned hash of the
    // commitment (0x01 ++ sha256(commitment)[1..]).
    let mut expected = sha2::Sha256::digest(commitment).to_vec();
    expected[0] = 0x01;
    if expected != versioned_hash {
        return Err(PrecompileFailure::Error(Cow::Borrowed("versioned hash mismatch")));
    }

    let settings = KzgSettings::load_trusted_setup_file_from_env()
        .map_err(|_| PrecompileFailure::Error(Cow::Borrowed("trusted setup unavailable")))?;

    let commitment = Bytes48::from_slice(commitment).map_err(|_| invalid("commitment"))?;
    let proof = Bytes48::from_slice(proof).map_err(|_| invalid("proof"))?;
    let z = Bytes32::from_slice(z).map_err(|_| invalid("z"))?;
    let y = Bytes32::from_slice(y).map_err(|_| invalid("y"))?;

    let valid = c_kzg::KzgProof::verify_kzg_proof(&commitment, &z, &y, &proof, &settings)
        .map_err(|_| PrecompileFailure::Error(Cow::Borrowed("proof verification failed")))?;

    if !valid {
        return Err(PrecompileFailure::Error(Cow::Borrowed("invalid KZG proof")));
    }

    let mut output = vec![0u8; 64];
    output[0..32].copy_from_slice(&FIELD_ELEMENTS_PER_BLOB.to_be_bytes()[..].rpad());
    output[32..64].copy_from_slice(&BLS_MODULUS);
    Ok(PrecompileOutput { cost: COST, output })
}

fn invalid(what: &'static str) -> PrecompileFailure {
    PrecompileFailure::Error(Cow::Borrowed(what))
}

trait RightPad {
    fn rpad(&self) -> [u8; 32];
}

impl RightPad for [u8] {
    fn rpad(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[32 - self.len()..].copy_from_slice(self);
        out
    }
}
