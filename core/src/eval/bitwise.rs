//! LT..SAR: comparisons, equality and bitwise logic.

use super::macros::{op1_u256_fn, op2_u256_bool_ref, op2_u256_fn};
use super::Control;
use crate::utils::I256;
use crate::Machine;
use primitive_types::U256;

pub fn slt(op1: &U256, op2: &U256) -> bool {
    let op1: I256 = (*op1).into();
    let op2: I256 = (*op2).into();
    op1.lt(&op2)
}

pub fn sgt(op1: &U256, op2: &U256) -> bool {
    let op1: I256 = (*op1).into();
    let op2: I256 = (*op2).into();
    op1.gt(&op2)
}

pub fn iszero(op1: U256) -> U256 {
    if op1.is_zero() { U256::one() } else { U256::zero() }
}

pub fn not(op1: U256) -> U256 {
    !op1
}

pub fn byte(op1: U256, op2: U256) -> U256 {
    let mut ret = U256::zero();
    for i in 0..256 {
        if i < 8 && op1 < U256::from(32) {
            let o: usize = op1.as_usize();
            let t = 255 - (7 - i + 8 * o);
            let bit_mask = U256::one() << t;
            let value = (op2 & bit_mask) >> t;
            ret = ret.overflowing_add(value.overflowing_shl(i as u32).0).0;
        }
    }
    ret
}

pub fn shl(shift: U256, value: U256) -> U256 {
    if value.is_zero() || shift >= U256::from(256) {
        U256::zero()
    } else {
        value << shift.as_usize()
    }
}

pub fn shr(shift: U256, value: U256) -> U256 {
    if value.is_zero() || shift >= U256::from(256) {
        U256::zero()
    } else {
        value >> shift.as_usize()
    }
}

pub fn sar(shift: U256, value: U256) -> U256 {
    let value = I256::from(value);

    if value.1 == U256::zero() || shift >= U256::from(256) {
        if crate::utils::Sign::Minus == value.0 {
            U256::MAX
        } else {
            U256::zero()
        }
    } else {
        let shift = shift.as_usize();
        match value.0 {
            crate::utils::Sign::Plus | crate::utils::Sign::Zero => value.1 >> shift,
            crate::utils::Sign::Minus => {
                let shifted = ((value.1.overflowing_sub(U256::one()).0) >> shift).overflowing_add(U256::one()).0;
                crate::utils::I256(crate::utils::Sign::Minus, shifted).into()
            }
        }
    }
}

pub fn lt_op(machine: &mut Machine) -> Control {
    op2_u256_bool_ref!(machine, U256::lt)
}
pub fn gt_op(machine: &mut Machine) -> Control {
    op2_u256_bool_ref!(machine, U256::gt)
}
pub fn slt_op(machine: &mut Machine) -> Control {
    op2_u256_bool_ref!(machine, self::slt)
}
pub fn sgt_op(machine: &mut Machine) -> Control {
    op2_u256_bool_ref!(machine, self::sgt)
}
pub fn eq_op(machine: &mut Machine) -> Control {
    op2_u256_bool_ref!(machine, U256::eq)
}
pub fn iszero_op(machine: &mut Machine) -> Control {
    op1_u256_fn!(machine, self::iszero)
}
pub fn and_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, core::ops::BitAnd::bitand)
}
pub fn or_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, core::ops::BitOr::bitor)
}
pub fn xor_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, core::ops::BitXor::bitxor)
}
pub fn not_op(machine: &mut Machine) -> Control {
    op1_u256_fn!(machine, self::not)
}
pub fn byte_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, self::byte)
}
pub fn shl_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, self::shl)
}
pub fn shr_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, self::shr)
}
pub fn sar_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, self::sar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_extracts_big_endian() {
        let value = U256::from(0x1122_3344u64);
        // Byte 28 (0-indexed from the most significant) holds 0x11.
        assert_eq!(byte(U256::from(28), value), U256::from(0x11));
    }

    #[test]
    fn shl_shr_roundtrip() {
        let v = U256::from(1);
        assert_eq!(shr(U256::from(4), shl(U256::from(4), v)), v);
    }

    #[test]
    fn shift_by_256_or_more_is_zero() {
        assert_eq!(shl(U256::from(256), U256::from(1)), U256::zero());
        assert_eq!(shr(U256::from(500), U256::from(1)), U256::zero());
    }

    #[test]
    fn sar_of_negative_fills_with_ones() {
        let neg_one = U256::MAX;
        assert_eq!(sar(U256::from(4), neg_one), U256::MAX);
    }

    #[test]
    fn sar_large_shift_of_negative_is_all_ones() {
        assert_eq!(sar(U256::from(300), U256::MAX), U256::MAX);
    }
}
