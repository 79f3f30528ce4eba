//! `0x05` MODEXP (EIP-198, with the Berlin EIP-2565 gas repricing).

use super::{PrecompileOutput, PrecompileResult};
use aurora_engine_modexp::{AuroraModExp, ModExpAlgorithm};
use crate::prelude::*;
use primitive_types::U256;

fn read_len(input: &[u8], offset: usize) -> usize {
    let mut buf = [0u8; 32];
    for i in 0..32 {
        if offset + i < input.len() {
            buf[i] = input[offset + i];
        }
    }
    U256::from_big_endian(&buf).min(U256::from(usize::MAX)).as_usize()
}

fn read_bytes(input: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    for i in 0..len {
        if offset + i < input.len() {
            out[i] = input[offset + i];
        }
    }
    out
}

fn mult_complexity(max_len: u64) -> u64 {
    // EIP-2565's simplified complexity: ceil(max_len / 8)^2.
    let words = (max_len + 7) / 8;
    words * words
}

pub fn modexp(input: &[u8], berlin_pricing: bool) -> PrecompileResult {
    let base_len = read_len(input, 0);
    let exp_len = read_len(input, 32);
    let mod_len = read_len(input, 64);

    let header_len = 96;
    let base = read_bytes(input, header_len, base_len);
    let exp = read_bytes(input, header_len + base_len, exp_len);
    let modulus = read_bytes(input, header_len + base_len + exp_len, mod_len);

    let cost = if berlin_pricing {
        let max_len = core::cmp::max(base_len, mod_len) as u64;
        let exp_bit_len = bit_length(&exp);
        let adjusted_exp_len = if exp_len <= 32 {
            exp_bit_len.saturating_sub(1) as u64
        } else {
            let top_32 = read_bytes(input, header_len + base_len, 32.min(exp_len));
            let top_bits = bit_length(&top_32);
            8 * (exp_len as u64 - 32) + top_bits.saturating_sub(1) as u64
        };
        let complexity = mult_complexity(max_len);
        core::cmp::max(200, complexity * core::cmp::max(adjusted_exp_len, 1) / 3)
    } else {
        let max_len = core::cmp::max(base_len, mod_len) as u64;
        let complexity = {
            let words = (max_len + 7) / 8;
            words * words
        };
        let adjusted_exp_len = core::cmp::max(bit_length(&exp) as u64, 1) - 1;
        complexity * core::cmp::max(adjusted_exp_len, 1) / 20
    };

    let output = if mod_len == 0 {
        Vec::new()
    } else {
        let result = AuroraModExp::modexp(&base, &exp, &modulus);
        let mut out = vec![0u8; mod_len];
        let start = mod_len.saturating_sub(result.len());
        let copy_len = core::cmp::min(mod_len, result.len());
        out[start..].copy_from_slice(&result[result.len() - copy_len..]);
        out
    };

    Ok(PrecompileOutput { cost, output })
}

fn bit_length(bytes: &[u8]) -> u32 {
    for (i, b) in bytes.iter().enumerate() {
        if *b != 0 {
            return ((bytes.len() - i - 1) * 8) as u32 + (8 - b.leading_zeros());
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modexp_small_values() {
        // base=3, exp=2, mod=5 -> 3^2 mod 5 = 4, each operand 1 byte.
        let mut input = vec![0u8; 96];
        input[31] = 1;
        input[63] = 1;
        input[95] = 1;
        input.push(3);
        input.push(2);
        input.push(5);
        let out = modexp(&input, true).unwrap();
        assert_eq!(out.output, vec![4]);
    }
}
