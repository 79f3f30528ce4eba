//! `0x09` BLAKE2F compression function (EIP-152).

use super::{PrecompileFailure, PrecompileOutput, PrecompileResult};
use crate::prelude::*;

pub fn blake2f(input: &[u8]) -> PrecompileResult {
    if input.len() != 213 {
        return Err(PrecompileFailure::Error(Cow::Borrowed("input must be 213 bytes")));
    }

    let rounds = u32::from_be_bytes(input[0..4].try_into().unwrap());

    let mut h = [0u64; 8];
    for i in 0..8 {
        h[i] = u64::from_le_bytes(input[4 + i * 8..4 + (i + 1) * 8].try_into().unwrap());
    }

    let mut m = [0u64; 16];
    for i in 0..16 {
        m[i] = u64::from_le_bytes(input[68 + i * 8..68 + (i + 1) * 8].try_into().unwrap());
    }

    let t = [
        u64::from_le_bytes(input[196..204].try_into().unwrap()),
        u64::from_le_bytes(input[204..212].try_into().unwrap()),
    ];

    let f = match input[212] {
        0 => false,
        1 => true,
        _ => return Err(PrecompileFailure::Error(Cow::Borrowed("final-block flag must be 0 or 1"))),
    };

    eip_152::compress(&mut h, m, t, f, rounds as usize);

    let mut output = vec![0u8; 64];
    for i in 0..8 {
        output[i * 8..(i + 1) * 8].copy_from_slice(&h[i].to_le_bytes());
    }

    Ok(PrecompileOutput { cost: u64::from(rounds), output })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert!(blake2f(&[0u8; 10]).is_err());
    }

    #[test]
    fn rejects_bad_final_flag() {
        let mut input = vec![0u8; 213];
        input[212] = 2;
        assert!(blake2f(&input).is_err());
    }
}
