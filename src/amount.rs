//! Conversions between decimal display strings and integer base units.

use alloy_primitives::U256;
use std::fmt;

/// Decimals of the native currency and of the token.
pub const ETHER_DECIMALS: u8 = 18;

/// Fractional digits shown for balances and payments.
pub const DISPLAY_PLACES: u8 = 4;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("{0:?} is not a decimal number")]
    Invalid(String),
    #[error("{input:?} has more than {decimals} fractional digits")]
    TooPrecise { input: String, decimals: u8 },
    #[error("amount does not fit in 256 bits")]
    Overflow,
}

/// A quantity held as base units together with the number of decimals of
/// its denomination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    base: U256,
    decimals: u8,
}

impl Amount {
    pub fn from_base(base: U256, decimals: u8) -> Self {
        Self { base, decimals }
    }

    pub fn ether(base: U256) -> Self {
        Self::from_base(base, ETHER_DECIMALS)
    }

    /// Parses a display string such as `"0.0001"` into base units.
    ///
    /// Surplus fractional digits are accepted only when they are zeros.
    pub fn parse(display: &str, decimals: u8) -> Result<Self, AmountError> {
        let trimmed = display.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }
        let (int_part, frac_part) = match trimmed.split_once('.') {
            Some((i, f)) => (i, f),
            None => (trimmed, ""),
        };
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(AmountError::Invalid(trimmed.to_string()));
        }

        let places = decimals as usize;
        let frac = if frac_part.len() > places {
            let (kept, surplus) = frac_part.split_at(places);
            if surplus.bytes().any(|b| b != b'0') {
                return Err(AmountError::TooPrecise {
                    input: trimmed.to_string(),
                    decimals,
                });
            }
            kept.to_string()
        } else {
            format!("{frac_part:0<places$}")
        };

        let digits = format!("{int_part}{frac}");
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(Self::from_base(U256::ZERO, decimals));
        }
        let base =
            U256::from_str_radix(digits, 10).map_err(|_| AmountError::Overflow)?;
        Ok(Self::from_base(base, decimals))
    }

    pub fn base(&self) -> U256 {
        self.base
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.base.is_zero()
    }

    /// Multiplies by a whole count, keeping the denomination.
    pub fn checked_mul(&self, count: u64) -> Option<Self> {
        self.base
            .checked_mul(U256::from(count))
            .map(|base| Self::from_base(base, self.decimals))
    }

    /// Shortest decimal form: `"1.5"`, `"0.0001"`, `"3"`.
    pub fn to_display(&self) -> String {
        let (int, frac) = self.split(self.decimals);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            int
        } else {
            format!("{int}.{frac}")
        }
    }

    /// Exactly `places` fractional digits, rounding half up.
    pub fn to_fixed(&self, places: u8) -> String {
        let places = places.min(self.decimals);
        let scale = pow10(self.decimals - places);
        let mut units = self.base / scale;
        let remainder = self.base % scale;
        if !remainder.is_zero() && remainder >= scale - remainder {
            units += U256::from(1u8);
        }
        join_units(units, places)
    }

    /// Exactly `places` fractional digits, dropping the rest.
    pub fn truncated(&self, places: u8) -> String {
        let places = places.min(self.decimals);
        let units = self.base / pow10(self.decimals - places);
        join_units(units, places)
    }

    fn split(&self, places: u8) -> (String, String) {
        let divisor = pow10(places);
        let int = (self.base / divisor).to_string();
        let frac = (self.base % divisor).to_string();
        let width = places as usize;
        (int, format!("{frac:0>width$}"))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}

fn pow10(exp: u8) -> U256 {
    U256::from(10u8).pow(U256::from(exp))
}

fn join_units(units: U256, places: u8) -> String {
    if places == 0 {
        return units.to_string();
    }
    let (int, frac) = Amount::from_base(units, places).split(places);
    format!("{int}.{frac}")
}

/// Parses typed user input as a whole number of purchasable units.
pub fn parse_unit_count(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Payment owed for `input` units at `unit_price`, with four fractional
/// digits. Partial or invalid input yields an empty string.
pub fn required_payment(input: &str, unit_price: Amount) -> String {
    parse_unit_count(input)
        .and_then(|count| unit_price.checked_mul(count))
        .map(|payment| payment.to_fixed(DISPLAY_PLACES))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    fn price() -> Amount {
        Amount::parse("0.0001", ETHER_DECIMALS).unwrap()
    }

    #[test]
    fn parse__converts_display_to_base_units() {
        let amount = Amount::parse("0.0001", 18).unwrap();
        assert_eq!(amount.base(), U256::from(100_000_000_000_000u64));

        let amount = Amount::parse("1", 18).unwrap();
        assert_eq!(amount.base(), U256::from(1_000_000_000_000_000_000u64));

        let amount = Amount::parse(".5", 2).unwrap();
        assert_eq!(amount.base(), U256::from(50u8));
    }

    #[test]
    fn parse__rejects_garbage_and_excess_precision() {
        assert_eq!(Amount::parse("  ", 18), Err(AmountError::Empty));
        assert!(matches!(Amount::parse("1e5", 18), Err(AmountError::Invalid(_))));
        assert!(matches!(Amount::parse("-1", 18), Err(AmountError::Invalid(_))));
        assert!(matches!(Amount::parse(".", 18), Err(AmountError::Invalid(_))));
        assert!(matches!(
            Amount::parse("0.001", 2),
            Err(AmountError::TooPrecise { .. })
        ));
        assert_eq!(Amount::parse("0.100", 2).unwrap().base(), U256::from(10u8));
    }

    #[test]
    fn to_display__trims_trailing_zeros() {
        let wei = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(Amount::ether(wei).to_display(), "1.5");
        assert_eq!(Amount::ether(U256::ZERO).to_display(), "0");
        assert_eq!(price().to_display(), "0.0001");
    }

    #[test]
    fn truncated__drops_digits_past_four_places() {
        let amount = Amount::parse("12.345678", 18).unwrap();
        assert_eq!(amount.truncated(4), "12.3456");
        assert_eq!(Amount::ether(U256::ZERO).truncated(4), "0.0000");
    }

    #[test]
    fn to_fixed__rounds_half_up() {
        assert_eq!(Amount::parse("0.00005", 18).unwrap().to_fixed(4), "0.0001");
        assert_eq!(Amount::parse("0.00004", 18).unwrap().to_fixed(4), "0.0000");
        assert_eq!(Amount::parse("1.99996", 18).unwrap().to_fixed(4), "2.0000");
    }

    #[test]
    fn required_payment__multiplies_by_unit_price() {
        assert_eq!(required_payment("50", price()), "0.0050");
        assert_eq!(required_payment("1", price()), "0.0001");
        assert_eq!(required_payment("12345", price()), "1.2345");
        assert_eq!(required_payment(" 7 ", price()), "0.0007");
    }

    #[test]
    fn required_payment__tolerates_partial_input() {
        for input in ["", " ", "abc", "1.5", "-3", "12a", "+"] {
            assert_eq!(required_payment(input, price()), "", "input {input:?}");
        }
    }
}
