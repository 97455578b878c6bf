//! Arbitrary-precision, non-negative decimal currency.
//!
//! A `Money` is `digits / 10^frac_digits`. Values are always normalised
//! (no trailing fractional zeros, zero has no fractional digits) so the
//! derived equality and hash agree with numeric equality.
//!
//! The operation set is deliberately small: add, scale by an integer,
//! multiply by a rational, compare, format. There is no unchecked
//! subtraction; affordability goes through `checked_sub`.

use crate::error::{GameError, GameResult};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    cmp::Ordering,
    fmt,
    iter::Sum,
    ops::Add,
    str::FromStr,
};

/// Extra fractional digits `multiply_by_rational` will spend looking for an
/// exact quotient before it truncates.
pub const MAX_RATIONAL_DIGITS: u32 = 18;

/// Display suffixes, one per factor of 1000.
const SUFFIXES: [&str; 12] = ["", "K", "M", "B", "T", "Qa", "Qi", "Sx", "Sp", "Oc", "No", "Dc"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Money {
    digits: BigUint,
    frac_digits: u32,
}

fn pow10(exp: u32) -> BigUint {
    BigUint::from(10u32).pow(exp)
}

impl Money {
    pub fn zero() -> Self {
        Self { digits: BigUint::zero(), frac_digits: 0 }
    }

    pub fn from_units(units: u64) -> Self {
        Self { digits: BigUint::from(units), frac_digits: 0 }
    }

    fn normalized(mut digits: BigUint, mut frac_digits: u32) -> Self {
        let ten = BigUint::from(10u32);
        if digits.is_zero() {
            frac_digits = 0;
        }
        while frac_digits > 0 && (&digits % &ten).is_zero() {
            digits /= &ten;
            frac_digits -= 1;
        }
        Self { digits, frac_digits }
    }

    /// Both values rescaled to a common number of fractional digits.
    fn aligned(&self, other: &Money) -> (BigUint, BigUint, u32) {
        let frac = self.frac_digits.max(other.frac_digits);
        let a = &self.digits * pow10(frac - self.frac_digits);
        let b = &other.digits * pow10(frac - other.frac_digits);
        (a, b, frac)
    }

    pub fn is_zero(&self) -> bool {
        self.digits.is_zero()
    }

    /// `self - other`, or `None` when `other` is larger.
    pub fn checked_sub(&self, other: &Money) -> Option<Money> {
        let (a, b, frac) = self.aligned(other);
        if a < b {
            return None;
        }
        Some(Self::normalized(a - b, frac))
    }

    /// Exact product with a non-negative integer (e.g. a cycle count).
    pub fn scale(&self, k: u64) -> Money {
        Self::normalized(&self.digits * BigUint::from(k), self.frac_digits)
    }

    /// `self * numerator / denominator`.
    ///
    /// Exact whenever the quotient has a terminating decimal expansion
    /// within `MAX_RATIONAL_DIGITS` extra digits; otherwise truncated
    /// toward zero at that precision. A zero denominator is rejected.
    pub fn multiply_by_rational(&self, numerator: u64, denominator: u64) -> GameResult<Money> {
        if denominator == 0 {
            return Err(GameError::invalid_amount(format!("{self} * {numerator}/0")));
        }
        let product = &self.digits * BigUint::from(numerator);
        let d = BigUint::from(denominator);
        for extra in 0..=MAX_RATIONAL_DIGITS {
            let shifted = &product * pow10(extra);
            if (&shifted % &d).is_zero() {
                return Ok(Self::normalized(shifted / &d, self.frac_digits + extra));
            }
        }
        let shifted = product * pow10(MAX_RATIONAL_DIGITS);
        Ok(Self::normalized(shifted / d, self.frac_digits + MAX_RATIONAL_DIGITS))
    }

    /// Whole units, fractional part discarded.
    fn whole(&self) -> BigUint {
        &self.digits / pow10(self.frac_digits)
    }

    /// Human-readable abbreviation: `999`, `12.5`, `1.23K`, `45.6M`, ...
    ///
    /// Two decimals at most, truncated (never rounded up into the next
    /// suffix). Past the last suffix the value switches to `1.23e45`.
    pub fn format_short(&self) -> String {
        let whole = self.whole();
        let whole_str = whole.to_str_radix(10);
        let len = whole_str.len() as u32;

        if whole < BigUint::from(1000u32) {
            let hundredths = (&self.digits * 100u32) / pow10(self.frac_digits);
            return render_hundredths(&hundredths);
        }

        let group = (len - 1) / 3;
        match SUFFIXES.get(group as usize) {
            Some(suffix) => {
                let hundredths = (whole * 100u32) / pow10(group * 3);
                format!("{}{suffix}", render_hundredths(&hundredths))
            }
            None => {
                let lead = BigUint::from_str(&whole_str[..3]).unwrap_or_default();
                format!("{}e{}", render_hundredths(&lead), len - 1)
            }
        }
    }
}

fn render_hundredths(hundredths: &BigUint) -> String {
    let int = hundredths / 100u32;
    let frac = (hundredths % 100u32).to_u32().unwrap_or(0);
    match frac {
        0 => int.to_string(),
        f if f % 10 == 0 => format!("{int}.{}", f / 10),
        f => format!("{int}.{f:02}"),
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<u64> for Money {
    fn from(units: u64) -> Self {
        Self::from_units(units)
    }
}

impl TryFrom<i64> for Money {
    type Error = GameError;

    fn try_from(raw: i64) -> GameResult<Self> {
        u64::try_from(raw)
            .map(Self::from_units)
            .map_err(|_| GameError::invalid_amount(raw))
    }
}

impl FromStr for Money {
    type Err = GameError;

    /// Plain decimal notation: `"123"`, `"0.05"`. Negative or malformed
    /// input fails with `InvalidAmount`.
    fn from_str(raw: &str) -> GameResult<Self> {
        let (int, frac) = match raw.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (raw, ""),
        };
        let well_formed = !int.is_empty()
            && int.bytes().all(|b| b.is_ascii_digit())
            && frac.bytes().all(|b| b.is_ascii_digit())
            && !(raw.contains('.') && frac.is_empty());
        if !well_formed {
            return Err(GameError::invalid_amount(raw));
        }
        let digits = BigUint::parse_bytes(format!("{int}{frac}").as_bytes(), 10)
            .ok_or_else(|| GameError::invalid_amount(raw))?;
        Ok(Self::normalized(digits, frac.len() as u32))
    }
}

/// Exact decimal notation, round-trips through `FromStr`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = self.digits.to_str_radix(10);
        if self.frac_digits == 0 {
            return f.write_str(&raw);
        }
        let width = self.frac_digits as usize + 1;
        let padded = format!("{raw:0>width$}");
        let (int, frac) = padded.split_at(padded.len() - self.frac_digits as usize);
        write!(f, "{int}.{frac}")
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b, _) = self.aligned(other);
        a.cmp(&b)
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for &Money {
    type Output = Money;

    fn add(self, rhs: &Money) -> Money {
        let (a, b, frac) = self.aligned(rhs);
        Money::normalized(a + b, frac)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        &self + &rhs
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| &acc + m)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// Money is persisted as a decimal string, never as a float.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
