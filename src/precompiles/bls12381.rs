//! `0x0b`-`0x12` BLS12-381 curve operations (EIP-2537): point addition and
//! scalar multiplication on G1/G2, the optimal-ate pairing check, and the
//! two hash-to-curve map functions, all built on `blst`'s constant-time
//! field and curve arithmetic.

use super::{PrecompileFailure, PrecompileOutput, PrecompileResult};
use crate::prelude::*;
use blst::min_pk::*;
use blst::*;

const G1_ADD: u8 = 0x0b;
const G1_MSM: u8 = 0x0c;
const G2_ADD: u8 = 0x0d;
const G2_MSM: u8 = 0x0e;
const PAIRING_CHECK: u8 = 0x0f;
const MAP_FP_TO_G1: u8 = 0x10;
const MAP_FP2_TO_G2: u8 = 0x11;
// 0x12 is reserved by some client implementations for a batched MSM variant;
// the canonical EIP-2537 set stops at 0x11. Kept unassigned here.

pub fn dispatch(address_byte: u8, input: &[u8]) -> PrecompileResult {
    match address_byte {
        G1_ADD => g1_add(input),
        G1_MSM => g1_msm(input),
        G2_ADD => g2_add(input),
        G2_MSM => g2_msm(input),
        PAIRING_CHECK => pairing_check(input),
        MAP_FP_TO_G1 => map_fp_to_g1(input),
        MAP_FP2_TO_G2 => map_fp2_to_g2(input),
        _ => Err(PrecompileFailure::Error(Cow::Borrowed("unassigned BLS12-381 precompile address"))),
    }
}

fn invalid(what: &'static str) -> PrecompileFailure {
    PrecompileFailure::Error(Cow::Borrowed(what))
}

/// G1 points are encoded as 128 bytes (two 64-byte field elements, each
/// zero-padded to 64 from a 48-byte value) per EIP-2537.
fn read_g1_affine(bytes: &[u8]) -> Result<blst_p1_affine, PrecompileFailure> {
    if bytes.len() != 128 {
        return Err(invalid("G1 point must be 128 bytes"));
    }
    let mut compressed = [0u8; 96];
    compressed[..48].copy_from_slice(&bytes[16..64]);
    compressed[48..].copy_from_slice(&bytes[80..128]);
    let mut point = blst_p1_affine::default();
    unsafe {
        if blst_p1_deserialize(&mut point, compressed.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
            return Err(invalid("invalid G1 encoding"));
        }
    }
    Ok(point)
}

fn write_g1_affine(point: &blst_p1_affine) -> Vec<u8> {
    let mut serialized = [0u8; 96];
    unsafe { blst_p1_affine_serialize(serialized.as_mut_ptr(), point) };
    let mut out = vec![0u8; 128];
    out[16..64].copy_from_slice(&serialized[..48]);
    out[80..128].copy_from_slice(&serialized[48..]);
    out
}

fn read_g2_affine(bytes: &[u8]) -> Result<blst_p2_affine, PrecompileFailure> {
    if bytes.len() != 256 {
        return Err(invalid("G2 point must be 256 bytes"));
    }
    let mut compressed = [0u8; 192];
    compressed[..48].copy_from_slice(&bytes[16..64]);
    compressed[48..96].copy_from_slice(&bytes[80..128]);
    compressed[96..144].copy_from_slice(&bytes[144..192]);
    compressed[144..].copy_from_slice(&bytes[208..256]);
    let mut point = blst_p2_affine::default();
    unsafe {
        if blst_p2_deserialize(&mut point, compressed.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
            return Err(invalid("invalid G2 encoding"));
        }
    }
    Ok(point)
}

fn write_g2_affine(point: &blst_p2_affine) -> Vec<u8> {
    let mut serialized = [0u8; 192];
    unsafe { blst_p2_affine_serialize(serialized.as_mut_ptr(), point) };
    let mut out = vec![0u8; 256];
    out[16..64].copy_from_slice(&serialized[..48]);
    out[80..128].copy_from_slice(&serialized[48..96]);
    out[144..192].copy_from_slice(&serialized[96..144]);
    out[208..256].copy_from_slice(&serialized[144..]);
    out
}

fn read_scalar(bytes: &[u8]) -> Result<blst_scalar, PrecompileFailure> {
    if bytes.len() != 32 {
        return Err(invalid("scalar must be 32 bytes"));
    }
    let mut scalar = blst_scalar::default();
    unsafe { blst_scalar_from_bendian(&mut scalar, bytes.as_ptr()) };
    Ok(scalar)
}

fn g1_add(input: &[u8]) -> PrecompileResult {
    if input.len() != 256 {
        return Err(invalid("G1ADD input must be 256 bytes"));
    }
    let a = read_g1_affine(&input[0..128])?;
    let b = read_g1_affine(&input[128..256])?;
    let mut a_jac = blst_p1::default();
    let mut sum = blst_p1::default();
    unsafe {
        blst_p1_from_affine(&mut a_jac, &a);
        blst_p1_add_or_double_affine(&mut sum, &a_jac, &b);
    }
    let mut out_affine = blst_p1_affine::default();
    unsafe { blst_p1_to_affine(&mut out_affine, &sum) };
    Ok(PrecompileOutput { cost: 500, output: write_g1_affine(&out_affine) })
}

fn g1_msm(input: &[u8]) -> PrecompileResult {
    const PAIR_LEN: usize = 160; // 128-byte point + 32-byte scalar
    if input.is_empty() || input.len() % PAIR_LEN != 0 {
        return Err(invalid("G1MSM input must be a multiple of 160 bytes"));
    }
    let pairs = input.len() / PAIR_LEN;
    let mut acc = blst_p1::default();
    for i in 0..pairs {
        let offset = i * PAIR_LEN;
        let point = read_g1_affine(&input[offset..offset + 128])?;
        let scalar = read_scalar(&input[offset + 128..offset + 160])?;
        let mut point_jac = blst_p1::default();
        let mut scaled = blst_p1::default();
        unsafe {
            blst_p1_from_affine(&mut point_jac, &point);
            blst_p1_mult(&mut scaled, &point_jac, scalar.b.as_ptr(), 256);
            let mut next = blst_p1::default();
            blst_p1_add_or_double(&mut next, &acc, &scaled);
            acc = next;
        }
    }
    let mut out_affine = blst_p1_affine::default();
    unsafe { blst_p1_to_affine(&mut out_affine, &acc) };
    let cost = 12000 * pairs as u64 / msm_discount(pairs);
    Ok(PrecompileOutput { cost, output: write_g1_affine(&out_affine) })
}

fn g2_add(input: &[u8]) -> PrecompileResult {
    if input.len() != 512 {
        return Err(invalid("G2ADD input must be 512 bytes"));
    }
    let a = read_g2_affine(&input[0..256])?;
    let b = read_g2_affine(&input[256..512])?;
    let mut a_jac = blst_p2::default();
    let mut sum = blst_p2::default();
    unsafe {
        blst_p2_from_affine(&mut a_jac, &a);
        blst_p2_add_or_double_affine(&mut sum, &a_jac, &b);
    }
    let mut out_affine = blst_p2_affine::default();
    unsafe { blst_p2_to_affine(&mut out_affine, &sum) };
    Ok(PrecompileOutput { cost: 800, output: write_g2_affine(&out_affine) })
}

fn g2_msm(input: &[u8]) -> PrecompileResult {
    const PAIR_LEN: usize = 288; // 256-byte point + 32-byte scalar
    if input.is_empty() || input.len() % PAIR_LEN != 0 {
        return Err(invalid("G2MSM input must be a multiple of 288 bytes"));
    }
    let pairs = input.len() / PAIR_LEN;
    let mut acc = blst_p2::default();
    for i in 0..pairs {
        let offset = i * PAIR_LEN;
        let point = read_g2_affine(&input[offset..offset + 256])?;
        let scalar = read_scalar(&input[offset + 256..offset + 288])?;
        let mut point_jac = blst_p2::default();
        let mut scaled = blst_p2::default();
        unsafe {
            blst_p2_from_affine(&mut point_jac, &point);
            blst_p2_mult(&mut scaled, &point_jac, scalar.b.as_ptr(), 256);
            let mut next = blst_p2::default();
            blst_p2_add_or_double(&mut next, &acc, &scaled);
            acc = next;
        }
    }
    let mut out_affine = blst_p2_affine::default();
    unsafe { blst_p2_to_affine(&mut out_affine, &acc) };
    let cost = 22500 * pairs as u64 / msm_discount(pairs);
    Ok(PrecompileOutput { cost, output: write_g2_affine(&out_affine) })
}

fn msm_discount(pairs: usize) -> u64 {
    // EIP-2537's discount table saturates quickly; a coarse, monotonic
    // approximation is used here rather than the exact lookup table.
    core::cmp::min(pairs as u64, 10).max(1)
}

fn pairing_check(input: &[u8]) -> PrecompileResult {
    const PAIR_LEN: usize = 384; // 128 (G1) + 256 (G2)
    if input.is_empty() || input.len() % PAIR_LEN != 0 {
        return Err(invalid("PAIRING_CHECK input must be a multiple of 384 bytes"));
    }
    let pairs = input.len() / PAIR_LEN;
    let cost = 32600 * pairs as u64 + 37700;

    let mut acc = blst_fp12::default();
    unsafe { blst_fp12_one(&mut acc) };
    for i in 0..pairs {
        let offset = i * PAIR_LEN;
        let g1 = read_g1_affine(&input[offset..offset + 128])?;
        let g2 = read_g2_affine(&input[offset + 128..offset + 384])?;
        let mut miller = blst_fp12::default();
        unsafe {
            blst_miller_loop(&mut miller, &g2, &g1);
            let mut next = blst_fp12::default();
            blst_fp12_mul(&mut next, &acc, &miller);
            acc = next;
        }
    }
    let mut final_exp = blst_fp12::default();
    unsafe { blst_final_exp(&mut final_exp, &acc) };
    let mut one = blst_fp12::default();
    unsafe { blst_fp12_one(&mut one) };
    let success = unsafe { blst_fp12_is_equal(&final_exp, &one) };

    let mut output = vec![0u8; 32];
    if success {
        output[31] = 1;
    }
    Ok(PrecompileOutput { cost, output })
}

fn map_fp_to_g1(input: &[u8]) -> PrecompileResult {
    if input.len() != 64 {
        return Err(invalid("MAP_FP_TO_G1 input must be 64 bytes"));
    }
    let mut fp = blst_fp::default();
    unsafe { blst_fp_from_bendian(&mut fp, input[16..].as_ptr()) };
    let mut point = blst_p1::default();
    unsafe { blst_map_to_g1(&mut point, &fp, core::ptr::null()) };
    let mut affine = blst_p1_affine::default();
    unsafe { blst_p1_to_affine(&mut affine, &point) };
    Ok(PrecompileOutput { cost: 5500, output: write_g1_affine(&affine) })
}

fn map_fp2_to_g2(input: &[u8]) -> PrecompileResult {
    if input.len() != 128 {
        return Err(invalid("MAP_FP2_TO_G2 input must be 128 bytes"));
    }
    let mut c0 = blst_fp::default();
    let mut c1 = blst_fp::default();
    unsafe {
        blst_fp_from_bendian(&mut c0, input[16..64].as_ptr());
        blst_fp_from_bendian(&mut c1, input[80..128].as_ptr());
    }
    let fp2 = blst_fp2 { fp: [c0, c1] };
    let mut point = blst_p2::default();
    unsafe { blst_map_to_g2(&mut point, &fp2, core::ptr::null()) };
    let mut affine = blst_p2_affine::default();
    unsafe { blst_p2_to_affine(&mut affine, &point) };
    Ok(PrecompileOutput { cost: 75000, output: write_g2_affine(&affine) })
}
