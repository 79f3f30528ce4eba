//! ADD..SIGNEXTEND: the pure 256-bit arithmetic opcodes.

use super::macros::{op2_u256_fn, op3_u256_fn, pop_u256, push_u256};
use super::Control;
use crate::utils::I256;
use crate::Machine;
use primitive_types::U256;

pub fn add(op1: U256, op2: U256) -> U256 {
    op1.overflowing_add(op2).0
}

pub fn sub(op1: U256, op2: U256) -> U256 {
    op1.overflowing_sub(op2).0
}

pub fn mul(op1: U256, op2: U256) -> U256 {
    op1.overflowing_mul(op2).0
}

pub fn div(op1: U256, op2: U256) -> U256 {
    if op2.is_zero() {
        U256::zero()
    } else {
        op1 / op2
    }
}

pub fn sdiv(op1: U256, op2: U256) -> U256 {
    let op1: I256 = op1.into();
    let op2: I256 = op2.into();
    (op1 / op2).into()
}

pub fn rem(op1: U256, op2: U256) -> U256 {
    if op2.is_zero() {
        U256::zero()
    } else {
        op1 % op2
    }
}

pub fn srem(op1: U256, op2: U256) -> U256 {
    if op2.is_zero() {
        U256::zero()
    } else {
        let op1: I256 = op1.into();
        let op2: I256 = op2.into();
        (op1 % op2).into()
    }
}

pub fn addmod(op1: U256, op2: U256, op3: U256) -> U256 {
    if op3.is_zero() {
        return U256::zero();
    }
    let op1: primitive_types::U512 = op1.into();
    let op2: primitive_types::U512 = op2.into();
    let op3: primitive_types::U512 = op3.into();
    let v = (op1 + op2) % op3;
    U256::try_from(v).expect("sum of two U256 mod a U256 fits in U256")
}

pub fn mulmod(op1: U256, op2: U256, op3: U256) -> U256 {
    if op3.is_zero() {
        return U256::zero();
    }
    let op1: primitive_types::U512 = op1.into();
    let op2: primitive_types::U512 = op2.into();
    let op3: primitive_types::U512 = op3.into();
    let v = (op1 * op2) % op3;
    U256::try_from(v).expect("product mod a U256 fits in U256")
}

pub fn signextend(op1: U256, op2: U256) -> U256 {
    if op1 > U256::from(32) {
        op2
    } else {
        let bit_index = (8 * op1.low_u32() + 7) as usize;
        let bit = op2.bit(bit_index);
        let mask = (U256::one() << bit_index) - U256::one();
        if bit {
            op2 | !mask
        } else {
            op2 & mask
        }
    }
}

pub fn exp(machine: &mut Machine) -> Control {
    pop_u256!(machine, op1, op2);
    let mut r: U256 = U256::one();
    let mut base = op1;
    let mut power = op2;
    while power != U256::zero() {
        if power & U256::one() != U256::zero() {
            r = r.overflowing_mul(base).0;
        }
        power >>= 1;
        base = base.overflowing_mul(base).0;
    }
    push_u256!(machine, r);
    Control::Continue(1)
}

pub fn add_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, self::add)
}
pub fn sub_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, self::sub)
}
pub fn mul_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, self::mul)
}
pub fn div_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, self::div)
}
pub fn sdiv_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, self::sdiv)
}
pub fn mod_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, self::rem)
}
pub fn smod_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, self::srem)
}
pub fn addmod_op(machine: &mut Machine) -> Control {
    op3_u256_fn!(machine, self::addmod)
}
pub fn mulmod_op(machine: &mut Machine) -> Control {
    op3_u256_fn!(machine, self::mulmod)
}
pub fn signextend_op(machine: &mut Machine) -> Control {
    op2_u256_fn!(machine, self::signextend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_wraps() {
        assert_eq!(add(U256::MAX, U256::one()), U256::zero());
    }

    #[test]
    fn div_by_zero_is_zero() {
        assert_eq!(div(U256::from(5), U256::zero()), U256::zero());
    }

    #[test]
    fn sdiv_negative() {
        let neg_one = U256::MAX;
        assert_eq!(sdiv(U256::from(10), neg_one), neg_one - U256::from(9));
    }

    #[test]
    fn addmod_wraps_via_u512() {
        assert_eq!(addmod(U256::MAX, U256::MAX, U256::from(7)), (U256::MAX % U256::from(7) * U256::from(2)) % U256::from(7));
    }

    #[test]
    fn signextend_sets_high_bits_for_negative() {
        let v = signextend(U256::zero(), U256::from(0xff));
        assert_eq!(v, U256::MAX);
    }

    #[test]
    fn signextend_noop_for_index_above_31() {
        let v = signextend(U256::from(32), U256::from(0xff));
        assert_eq!(v, U256::from(0xff));
    }
}
