use faithevm_core::ExitError;

/// Running gas counter for one frame: how much was handed in, how much has
/// been spent, and the refund accrued so far (capped and applied once, at
/// the top of the call stack, by the transaction executor).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Gasometer {
    gas_limit: u64,
    used_gas: u64,
    refunded_gas: i64,
}

impl Gasometer {
    #[must_use]
    pub const fn new(gas_limit: u64) -> Self {
        Self {
            gas_limit,
            used_gas: 0,
            refunded_gas: 0,
        }
    }

    #[must_use]
    pub const fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// Gas remaining to this frame (limit minus used; never negative).
    #[must_use]
    pub const fn gas(&self) -> u64 {
        self.gas_limit - self.used_gas
    }

    #[must_use]
    pub const fn total_used_gas(&self) -> u64 {
        self.used_gas
    }

    #[must_use]
    pub const fn refunded_gas(&self) -> i64 {
        self.refunded_gas
    }

    /// Deduct `cost` from the remaining gas.
    ///
    /// # Errors
    /// `OutOfGas` if `cost` exceeds what remains.
    pub fn record_cost(&mut self, cost: u64) -> Result<(), ExitError> {
        let all_gas_cost = self.used_gas.checked_add(cost).ok_or(ExitError::OutOfGas)?;
        if self.gas_limit < all_gas_cost {
            return Err(ExitError::OutOfGas);
        }
        self.used_gas = all_gas_cost;
        Ok(())
    }

    /// Accrue (or subtract, if negative) a refund delta produced by SSTORE.
    pub fn record_refund(&mut self, refund: i64) {
        self.refunded_gas += refund;
    }

    /// Fold a completed sub-call's gas usage and refund back into this
    /// frame: the gas the sub-call didn't spend comes back, the gas it did
    /// spend (plus whatever it refunded) doesn't.
    pub fn record_stipend(&mut self, stipend: u64, refund: i64) {
        self.used_gas -= stipend;
        self.refunded_gas += refund;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_cost_errors_past_limit() {
        let mut g = Gasometer::new(100);
        g.record_cost(60).unwrap();
        assert_eq!(g.record_cost(50), Err(ExitError::OutOfGas));
        assert_eq!(g.gas(), 40);
    }

    #[test]
    fn refund_accumulates() {
        let mut g = Gasometer::new(1000);
        g.record_refund(4800);
        g.record_refund(-200);
        assert_eq!(g.refunded_gas(), 4600);
    }
}
