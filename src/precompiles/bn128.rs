//! `0x06` BN254 (alt_bn128) ADD, `0x07` MUL, `0x08` PAIRING (EIP-196/197).

use super::{PrecompileFailure, PrecompileOutput, PrecompileResult};
use crate::prelude::*;
use bn::{AffineG1, AffineG2, Fq, Fq2, Fr, Group, Gt, G1, G2};

fn read_fq(input: &[u8], offset: usize) -> Result<Fq, PrecompileFailure> {
    let mut buf = [0u8; 32];
    for i in 0..32 {
        if offset + i < input.len() {
            buf[i] = input[offset + i];
        }
    }
    Fq::from_slice(&buf).map_err(|_| PrecompileFailure::Error(Cow::Borrowed("invalid field element")))
}

fn read_g1(input: &[u8], offset: usize) -> Result<G1, PrecompileFailure> {
    let x = read_fq(input, offset)?;
    let y = read_fq(input, offset + 32)?;
    if x.is_zero() && y.is_zero() {
        return Ok(G1::zero());
    }
    AffineG1::new(x, y)
        .map(Into::into)
        .map_err(|_| PrecompileFailure::Error(Cow::Borrowed("point not on curve")))
}

fn read_g2(input: &[u8], offset: usize) -> Result<G2, PrecompileFailure> {
    let ay = read_fq(input, offset)?;
    let ax = read_fq(input, offset + 32)?;
    let by = read_fq(input, offset + 64)?;
    let bx = read_fq(input, offset + 96)?;
    let x = Fq2::new(ax, ay);
    let y = Fq2::new(bx, by);
    if x.is_zero() && y.is_zero() {
        return Ok(G2::zero());
    }
    AffineG2::new(x, y)
        .map(Into::into)
        .map_err(|_| PrecompileFailure::Error(Cow::Borrowed("point not on curve")))
}

fn write_g1(point: G1) -> Vec<u8> {
    let mut out = vec![0u8; 64];
    if let Some(affine) = AffineG1::from_jacobian(point) {
        affine.x().to_big_endian(&mut out[0..32]).ok();
        affine.y().to_big_endian(&mut out[32..64]).ok();
    }
    out
}

pub fn add(input: &[u8], has_istanbul: bool) -> PrecompileResult {
    let a = read_g1(input, 0)?;
    let b = read_g1(input, 64)?;
    let cost = if has_istanbul { 150 } else { 500 };
    Ok(PrecompileOutput { cost, output: write_g1(a + b) })
}

pub fn mul(input: &[u8], has_istanbul: bool) -> PrecompileResult {
    let a = read_g1(input, 0)?;
    let mut buf = [0u8; 32];
    for i in 0..32 {
        if 64 + i < input.len() {
            buf[i] = input[64 + i];
        }
    }
    let scalar = Fr::from_slice(&buf).unwrap_or_else(|_| Fr::zero());
    let cost = if has_istanbul { 6000 } else { 40000 };
    Ok(PrecompileOutput { cost, output: write_g1(a * scalar) })
}

pub fn pairing(input: &[u8], has_istanbul: bool) -> PrecompileResult {
    const PAIR_SIZE: usize = 192;
    if input.len() % PAIR_SIZE != 0 {
        return Err(PrecompileFailure::Error(Cow::Borrowed("invalid pairing input length")));
    }
    let pairs = input.len() / PAIR_SIZE;
    let (base, per_pair) = if has_istanbul { (45000, 34000) } else { (100000, 80000) };
    let cost = base + per_pair * pairs as u64;

    let mut acc = Gt::one();
    for i in 0..pairs {
        let offset = i * PAIR_SIZE;
        let a = read_g1(input, offset)?;
        let b = read_g2(input, offset + 64)?;
        acc = acc * bn::pairing(a, b);
    }

    let success = acc == Gt::one();
    let mut output = vec![0u8; 32];
    if success {
        output[31] = 1;
    }
    Ok(PrecompileOutput { cost, output })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_identity() {
        let input = vec![0u8; 128];
        let out = add(&input, true).unwrap();
        assert_eq!(out.output, vec![0u8; 64]);
        assert_eq!(out.cost, 150);
    }

    #[test]
    fn add_pre_istanbul_cost() {
        let input = vec![0u8; 128];
        let out = add(&input, false).unwrap();
        assert_eq!(out.cost, 500);
    }

    #[test]
    fn empty_pairing_succeeds() {
        let out = pairing(&[], true).unwrap();
        assert_eq!(out.output[31], 1);
        assert_eq!(out.cost, 45000);
    }
}
