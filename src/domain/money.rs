use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Whole currency units. Rewards and withdrawals never carry fractions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn amount(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// `floor(self * rate)`, computed in decimal so 0.20 is exact.
    pub fn commission(&self, rate: Decimal) -> Money {
        let scaled = (Decimal::from(self.0) * rate).floor();
        Money(scaled.to_i64().unwrap_or(0))
    }

    /// Share of `target` reached, as a whole percent capped at 100.
    pub fn percent_of(&self, target: Money) -> u8 {
        if target.0 <= 0 {
            return 100;
        }
        let pct = (i128::from(self.0.max(0)) * 100) / i128::from(target.0);
        pct.min(100) as u8
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money(iter.map(|m| m.0).sum())
    }
}
