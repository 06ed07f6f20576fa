use rust_decimal::Decimal;
use std::fmt;

/// A USD-denominated price, stored as a `decimal(38,18)` matching the
/// `Price` table's column definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct UsdPrice(Decimal);

impl UsdPrice {
    /// The constant `1.0`, used for stablecoins and one-to-one pegs.
    pub const ONE: Self = Self(Decimal::ONE);

    /// The constant `0.0`.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Threshold above which a computed price triggers the soft sanity
    /// check described in the router's policy.
    pub const SANITY_THRESHOLD: i64 = 1000;

    /// Wrap a raw decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// The underlying decimal value.
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// True if this price is at or above the sanity-check threshold.
    pub fn exceeds_sanity_threshold(self) -> bool {
        self.0 >= Decimal::from(Self::SANITY_THRESHOLD)
    }

    /// Scale a raw on-chain integer amount by `10^-decimals`.
    pub fn scale_by_decimals(raw: Decimal, decimals: u8) -> Decimal {
        raw / Decimal::from(10u64.pow(decimals as u32))
    }
}

impl fmt::Display for UsdPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl std::ops::Add for UsdPrice {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Mul for UsdPrice {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl std::ops::Mul<Decimal> for UsdPrice {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self {
        Self(self.0 * rhs)
    }
}

impl From<Decimal> for UsdPrice {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<u64> for UsdPrice {
    fn from(value: u64) -> Self {
        Self(Decimal::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanity_threshold() {
        assert!(!UsdPrice::from(999u64).exceeds_sanity_threshold());
        assert!(UsdPrice::from(1000u64).exceeds_sanity_threshold());
    }

    #[test]
    fn scale_by_decimals() {
        let raw = Decimal::from(1_500_000u64);
        let scaled = UsdPrice::scale_by_decimals(raw, 6);
        assert_eq!(scaled, Decimal::new(15, 1));
    }
}
