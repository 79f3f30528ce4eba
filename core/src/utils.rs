//! Shared primitive constants and the two's-complement view of `U256` used
//! by signed opcodes (SDIV, SMOD, SLT, SGT, SAR).

use primitive_types::U256;

pub const U256_ZERO: U256 = U256([0, 0, 0, 0]);
pub const U256_ONE: U256 = U256([1, 0, 0, 0]);
pub const U256_VALUE_32: U256 = U256([32, 0, 0, 0]);
pub const U256_VALUE_256: U256 = U256([256, 0, 0, 0]);

#[cfg(target_pointer_width = "64")]
pub const USIZE_MAX: U256 = U256([u64::MAX, 0, 0, 0]);
#[cfg(target_pointer_width = "32")]
pub const USIZE_MAX: U256 = U256([u32::MAX as u64, 0, 0, 0]);

pub const U64_MAX: U256 = U256([u64::MAX, 0, 0, 0]);

/// Sign of a two's-complement `U256`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Sign {
    Plus,
    Zero,
    Minus,
}

const SIGN_BIT_MASK: U256 = U256([
    0xffff_ffff_ffff_ffff,
    0xffff_ffff_ffff_ffff,
    0xffff_ffff_ffff_ffff,
    0x7fff_ffff_ffff_ffff,
]);

/// A 256-bit signed integer, stored as (sign, magnitude) to make SDIV/SMOD/SAR
/// easy to express without overflow-prone two's-complement negation tricks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct I256(pub Sign, pub U256);

impl I256 {
    #[must_use]
    pub const fn zero() -> Self {
        Self(Sign::Zero, U256_ZERO)
    }

    #[must_use]
    pub fn min_value() -> Self {
        Self(Sign::Minus, (U256::one() << 255))
    }

    pub fn lt(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            (Sign::Zero, Sign::Zero) => false,
            (Sign::Plus, Sign::Zero | Sign::Minus) | (Sign::Zero, Sign::Minus) => false,
            (Sign::Zero, Sign::Plus) | (Sign::Minus, Sign::Zero | Sign::Plus) => true,
            (Sign::Minus, Sign::Minus) => self.1 > other.1,
            (Sign::Plus, Sign::Plus) => self.1 < other.1,
        }
    }

    pub fn gt(&self, other: &Self) -> bool {
        !self.lt(other) && self != other
    }
}

impl Default for I256 {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<U256> for I256 {
    fn from(val: U256) -> Self {
        if val == U256_ZERO {
            return Self::zero();
        }
        if val & SIGN_BIT_MASK == val {
            Self(Sign::Plus, val)
        } else {
            Self(Sign::Minus, !val + U256_ONE)
        }
    }
}

impl From<I256> for U256 {
    fn from(value: I256) -> Self {
        let sign = value.0;
        if sign == Sign::Zero {
            return U256_ZERO;
        }
        let value = value.1;
        if sign == Sign::Plus {
            value
        } else {
            !value + U256_ONE
        }
    }
}

impl core::ops::Div for I256 {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        if other == Self::zero() {
            return Self::zero();
        }
        if self == Self::min_value() && other.1 == U256_ONE && other.0 == Sign::Minus {
            return Self::min_value();
        }
        let d = self.1 / other.1;
        match (self.0, other.0) {
            (Sign::Zero, _) | (_, Sign::Zero) => Self::zero(),
            (Sign::Plus, Sign::Plus) | (Sign::Minus, Sign::Minus) => Self(Sign::Plus, d),
            (Sign::Plus, Sign::Minus) | (Sign::Minus, Sign::Plus) => Self(Sign::Minus, d),
        }
    }
}

impl core::ops::Rem for I256 {
    type Output = Self;

    fn rem(self, other: Self) -> Self {
        if other == Self::zero() {
            return Self::zero();
        }
        let r = self.1 % other.1;
        if r == U256_ZERO {
            return Self::zero();
        }
        Self(self.0, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        for v in [U256::zero(), U256::one(), U256::MAX, U256::from(42)] {
            let signed: I256 = v.into();
            let back: U256 = signed.into();
            assert_eq!(v, back);
        }
    }

    #[test]
    fn sdiv_min_by_neg_one_is_min() {
        let min: I256 = I256::min_value();
        let neg_one: I256 = U256::MAX.into();
        assert_eq!(min / neg_one, min);
    }

    #[test]
    fn div_by_zero_is_zero() {
        let one: I256 = U256::one().into();
        assert_eq!(one / I256::zero(), I256::zero());
    }
}
