//! `0x01` ECRECOVER, `0x02` SHA256, `0x03` RIPEMD160, `0x04` IDENTITY.

use super::{PrecompileFailure, PrecompileOutput, PrecompileResult};
use crate::prelude::*;
use primitive_types::{H160, H256};
use sha2::Digest as _;
use sha3::Digest as _;

fn word_count_cost(len: usize, base: u64, per_word: u64) -> u64 {
    let words = (len as u64 + 31) / 32;
    base + per_word * words
}

pub fn identity(input: &[u8]) -> PrecompileResult {
    Ok(PrecompileOutput {
        cost: word_count_cost(input.len(), 15, 3),
        output: input.to_vec(),
    })
}

pub fn sha256(input: &[u8]) -> PrecompileResult {
    let cost = word_count_cost(input.len(), 60, 12);
    let digest = sha2::Sha256::digest(input);
    Ok(PrecompileOutput { cost, output: digest.to_vec() })
}

pub fn ripemd160(input: &[u8]) -> PrecompileResult {
    let cost = word_count_cost(input.len(), 600, 120);
    let digest = ripemd::Ripemd160::digest(input);
    let mut output = vec![0u8; 32];
    output[12..].copy_from_slice(&digest);
    Ok(PrecompileOutput { cost, output })
}

/// ECDSA public key recovery, EVM-style: input is `hash ++ v ++ r ++ s`
/// (each 32 bytes, `v` in `{27, 28}`), output is the 32-byte zero-padded
/// recovered address, or empty on any malformed/invalid signature.
pub fn ecrecover(input: &[u8]) -> PrecompileResult {
    const COST: u64 = 3000;

    let mut buf = [0u8; 128];
    let len = input.len().min(128);
    buf[..len].copy_from_slice(&input[..len]);

    let hash = H256::from_slice(&buf[0..32]);
    let v = H256::from_slice(&buf[32..64]);
    let r = &buf[64..96];
    let s = &buf[96..128];

    if v.as_bytes()[..31] != [0u8; 31] {
        return Ok(PrecompileOutput { cost: COST, output: Vec::new() });
    }
    let recovery_byte = v.as_bytes()[31];
    if recovery_byte != 27 && recovery_byte != 28 {
        return Ok(PrecompileOutput { cost: COST, output: Vec::new() });
    }
    let recovery_id = match libsecp256k1::RecoveryId::parse(recovery_byte - 27) {
        Ok(id) => id,
        Err(_) => return Ok(PrecompileOutput { cost: COST, output: Vec::new() }),
    };

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(r);
    sig_bytes[32..].copy_from_slice(s);
    let signature = match libsecp256k1::Signature::parse_standard(&sig_bytes) {
        Ok(sig) => sig,
        Err(_) => return Ok(PrecompileOutput { cost: COST, output: Vec::new() }),
    };

    let message = match libsecp256k1::Message::parse_slice(hash.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Ok(PrecompileOutput { cost: COST, output: Vec::new() }),
    };

    let public_key = match libsecp256k1::recover(&message, &signature, &recovery_id) {
        Ok(key) => key,
        Err(_) => return Ok(PrecompileOutput { cost: COST, output: Vec::new() }),
    };

    let uncompressed = public_key.serialize();
    // uncompressed[0] is the 0x04 SEC1 tag; the address is the low 20 bytes
    // of keccak256 of the remaining 64 bytes.
    let hash = sha3::Keccak256::digest(&uncompressed[1..]);
    let address = H160::from_slice(&hash[12..]);

    let mut output = vec![0u8; 32];
    output[12..].copy_from_slice(address.as_bytes());
    Ok(PrecompileOutput { cost: COST, output })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_echoes_input() {
        let out = identity(b"hello").unwrap();
        assert_eq!(out.output, b"hello");
        assert_eq!(out.cost, 15 + 3); // 5 bytes -> 1 word
    }

    #[test]
    fn sha256_of_empty() {
        let out = sha256(&[]).unwrap();
        assert_eq!(out.cost, 60);
        assert_eq!(out.output.len(), 32);
    }

    #[test]
    fn ecrecover_rejects_bad_v() {
        let mut input = [0u8; 128];
        input[63] = 26; // invalid v
        let out = ecrecover(&input).unwrap();
        assert!(out.output.is_empty());
    }
}
