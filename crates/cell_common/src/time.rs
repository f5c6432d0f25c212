//! Scaled fixed-point simulation time.
//!
//! A [`Time`] is `value × 10^exponent` seconds. Values with different
//! exponents are compared and added algebraically, aligning to the smaller
//! exponent. The canonical simulation unit is the picosecond; schedules
//! store times normalized with [`Time::to_unit`] to [`TimeUnit::Ps`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Decimal time units, named by their power-of-ten exponent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Seconds (10^0).
    S,
    /// Milliseconds (10^-3).
    Ms,
    /// Microseconds (10^-6).
    Us,
    /// Nanoseconds (10^-9).
    Ns,
    /// Picoseconds (10^-12).
    Ps,
}

impl TimeUnit {
    /// Returns the power-of-ten exponent of this unit relative to seconds.
    pub fn exponent(self) -> i32 {
        match self {
            TimeUnit::S => 0,
            TimeUnit::Ms => -3,
            TimeUnit::Us => -6,
            TimeUnit::Ns => -9,
            TimeUnit::Ps => -12,
        }
    }

    /// Returns the unit whose exponent is exactly `exponent`, if any.
    pub fn from_exponent(exponent: i32) -> Option<Self> {
        match exponent {
            0 => Some(TimeUnit::S),
            -3 => Some(TimeUnit::Ms),
            -6 => Some(TimeUnit::Us),
            -9 => Some(TimeUnit::Ns),
            -12 => Some(TimeUnit::Ps),
            _ => None,
        }
    }

    /// Returns the literal suffix for this unit.
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::S => "s",
            TimeUnit::Ms => "ms",
            TimeUnit::Us => "us",
            TimeUnit::Ns => "ns",
            TimeUnit::Ps => "ps",
        }
    }
}

/// A point in (or span of) simulated time: `value × 10^exponent` seconds.
///
/// Equality, ordering and hashing are algebraic, so `1 ns == 1000 ps`.
/// Arithmetic saturates when rescaling across extreme exponent gaps; such
/// magnitudes are outside the supported range rather than a reported fault.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Time {
    /// Integer magnitude.
    pub value: i64,
    /// Power-of-ten exponent relative to seconds.
    pub exponent: i32,
}

impl Time {
    /// Creates a time from a value and a unit.
    pub fn new(value: i64, unit: TimeUnit) -> Self {
        Self {
            value,
            exponent: unit.exponent(),
        }
    }

    /// Creates a time from a raw value and exponent.
    pub fn from_raw(value: i64, exponent: i32) -> Self {
        Self { value, exponent }
    }

    /// Time zero, expressed in picoseconds.
    pub fn zero() -> Self {
        Self::ps(0)
    }

    /// Creates a time in picoseconds.
    pub fn ps(value: i64) -> Self {
        Self::new(value, TimeUnit::Ps)
    }

    /// Creates a time in nanoseconds.
    pub fn ns(value: i64) -> Self {
        Self::new(value, TimeUnit::Ns)
    }

    /// Creates a time in microseconds.
    pub fn us(value: i64) -> Self {
        Self::new(value, TimeUnit::Us)
    }

    /// Creates a time in milliseconds.
    pub fn ms(value: i64) -> Self {
        Self::new(value, TimeUnit::Ms)
    }

    /// Creates a time in seconds.
    pub fn s(value: i64) -> Self {
        Self::new(value, TimeUnit::S)
    }

    /// Returns `true` if this time is zero.
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Rescales to `target_exponent`. Truncates toward zero when the target
    /// is coarser than the current exponent.
    pub fn to_unit(self, target_exponent: i32) -> Time {
        let value = match target_exponent.cmp(&self.exponent) {
            Ordering::Equal => self.value,
            Ordering::Less => scale_up(self.value, (self.exponent - target_exponent) as u32),
            Ordering::Greater => scale_down(self.value, (target_exponent - self.exponent) as u32),
        };
        Time {
            value,
            exponent: target_exponent,
        }
    }

    /// Returns the integer magnitude of this time expressed in `unit`.
    pub fn value_in(self, unit: TimeUnit) -> i64 {
        self.to_unit(unit.exponent()).value
    }

    /// Returns this time normalized to the canonical picosecond unit.
    pub fn to_ps(self) -> Time {
        self.to_unit(TimeUnit::Ps.exponent())
    }

    /// Strips trailing decimal zeros so that algebraically equal times share
    /// one representation.
    fn reduced(self) -> (i64, i32) {
        if self.value == 0 {
            return (0, 0);
        }
        let (mut value, mut exponent) = (self.value, self.exponent);
        while value % 10 == 0 {
            value /= 10;
            exponent += 1;
        }
        (value, exponent)
    }

    fn aligned(self, other: Time) -> (i64, i64, i32) {
        if self.exponent <= other.exponent {
            let diff = (other.exponent - self.exponent) as u32;
            (self.value, scale_up(other.value, diff), self.exponent)
        } else {
            let diff = (self.exponent - other.exponent) as u32;
            (scale_up(self.value, diff), other.value, other.exponent)
        }
    }

    fn as_f64(self) -> f64 {
        self.value as f64 * 10f64.powi(self.exponent)
    }
}

/// Multiplies by `10^diff`, saturating at the `i64` bounds.
fn scale_up(value: i64, diff: u32) -> i64 {
    match 10i64.checked_pow(diff) {
        Some(factor) => value.saturating_mul(factor),
        None if value == 0 => 0,
        None if value > 0 => i64::MAX,
        None => i64::MIN,
    }
}

/// Divides by `10^diff`, truncating toward zero.
fn scale_down(value: i64, diff: u32) -> i64 {
    match 10i64.checked_pow(diff) {
        Some(factor) => value / factor,
        None => 0,
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Time {
    type Output = Time;

    fn add(self, rhs: Time) -> Time {
        let (a, b, exponent) = self.aligned(rhs);
        Time {
            value: a.saturating_add(b),
            exponent,
        }
    }
}

impl Sub for Time {
    type Output = Time;

    fn sub(self, rhs: Time) -> Time {
        let (a, b, exponent) = self.aligned(rhs);
        Time {
            value: a.saturating_sub(b),
            exponent,
        }
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.exponent == other.exponent {
            return self.value.cmp(&other.value);
        }
        let (lo, hi, flipped) = if self.exponent < other.exponent {
            (self, other, false)
        } else {
            (other, self, true)
        };
        let diff = (hi.exponent - lo.exponent) as u32;
        let ord = match 10i128
            .checked_pow(diff)
            .and_then(|factor| (hi.value as i128).checked_mul(factor))
        {
            Some(scaled) => (lo.value as i128).cmp(&scaled),
            None => lo
                .as_f64()
                .partial_cmp(&hi.as_f64())
                .unwrap_or(Ordering::Equal),
        };
        if flipped {
            ord.reverse()
        } else {
            ord
        }
    }
}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Time {}

impl Hash for Time {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reduced().hash(state);
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match TimeUnit::from_exponent(self.exponent) {
            Some(unit) => write!(f, "{} {}", self.value, unit.suffix()),
            None => write!(f, "{} x10^{} s", self.value, self.exponent),
        }
    }
}

/// Error type for parsing time literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimeError {
    /// The input string that failed to parse.
    pub input: String,
}

impl fmt::Display for ParseTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid time literal: '{}'", self.input)
    }
}

impl std::error::Error for ParseTimeError {}

impl FromStr for Time {
    type Err = ParseTimeError;

    /// Parses literals such as `"10ns"`, `"2 us"` or `"500ps"`. A bare
    /// integer is interpreted as picoseconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseTimeError {
            input: s.to_string(),
        };

        let lower = s.to_ascii_lowercase();
        // Two-letter suffixes first so that "ns" is not read as "n" + "s".
        for unit in [TimeUnit::Ps, TimeUnit::Ns, TimeUnit::Us, TimeUnit::Ms, TimeUnit::S] {
            if let Some(num) = lower.strip_suffix(unit.suffix()) {
                let value: i64 = num.trim().parse().map_err(|_| err())?;
                return Ok(Time::new(value, unit));
            }
        }

        let value: i64 = s.parse().map_err(|_| err())?;
        Ok(Time::ps(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn add_aligns_to_smaller_exponent() {
        let t = Time::ns(1) + Time::ps(500);
        assert_eq!(t.exponent, -12);
        assert_eq!(t.value, 1_500);
    }

    #[test]
    fn add_is_symmetric() {
        assert_eq!(Time::ps(500) + Time::ns(1), Time::ns(1) + Time::ps(500));
    }

    #[test]
    fn sub_aligns_to_smaller_exponent() {
        let t = Time::ns(10) - Time::ps(2_000);
        assert_eq!(t, Time::ps(8_000));
    }

    #[test]
    fn compare_mixed_exponents() {
        assert!(Time::ps(999) < Time::ns(1));
        assert!(Time::ps(1_001) > Time::ns(1));
        assert!(Time::us(1) > Time::ns(999));
        assert!(Time::s(1) > Time::ms(999));
    }

    #[test]
    fn equality_is_algebraic() {
        assert_eq!(Time::ns(1), Time::ps(1_000));
        assert_eq!(Time::ms(2), Time::us(2_000));
        assert_ne!(Time::ns(1), Time::ps(1));
    }

    #[test]
    fn hash_matches_equality() {
        let mut set = HashSet::new();
        set.insert(Time::ns(3));
        assert!(set.contains(&Time::ps(3_000)));
        set.insert(Time::zero());
        assert!(set.contains(&Time::s(0)));
    }

    #[test]
    fn compare_extreme_gap_falls_back_to_magnitude() {
        let tiny = Time::from_raw(1, -60);
        let big = Time::s(1);
        assert!(tiny < big);
        assert!(big > tiny);
    }

    #[test]
    fn to_unit_scales_down_lossy() {
        let t = Time::ps(2_500).to_unit(TimeUnit::Ns.exponent());
        assert_eq!(t.value, 2);
        assert_eq!(t.exponent, -9);
    }

    #[test]
    fn to_unit_scales_up() {
        let t = Time::ns(10).to_ps();
        assert_eq!(t.value, 10_000);
        assert_eq!(t.exponent, -12);
    }

    #[test]
    fn value_in_unit() {
        assert_eq!(Time::us(3).value_in(TimeUnit::Ps), 3_000_000);
        assert_eq!(Time::ps(3_000_000).value_in(TimeUnit::Us), 3);
    }

    #[test]
    fn add_saturates_on_extreme_gap() {
        let t = Time::s(i64::MAX / 2) + Time::from_raw(1, -40);
        assert_eq!(t.value, i64::MAX);
    }

    #[test]
    fn display_known_units() {
        assert_eq!(Time::ns(10).to_string(), "10 ns");
        assert_eq!(Time::ps(500).to_string(), "500 ps");
        assert_eq!(Time::s(1).to_string(), "1 s");
    }

    #[test]
    fn display_odd_exponent() {
        assert_eq!(Time::from_raw(5, -7).to_string(), "5 x10^-7 s");
    }

    #[test]
    fn parse_suffixed() {
        assert_eq!("10ns".parse::<Time>().unwrap(), Time::ns(10));
        assert_eq!("2 us".parse::<Time>().unwrap(), Time::us(2));
        assert_eq!("3ms".parse::<Time>().unwrap(), Time::ms(3));
        assert_eq!("1s".parse::<Time>().unwrap(), Time::s(1));
        assert_eq!("500PS".parse::<Time>().unwrap(), Time::ps(500));
    }

    #[test]
    fn parse_bare_number_is_ps() {
        let t: Time = "1200".parse().unwrap();
        assert_eq!(t.exponent, -12);
        assert_eq!(t.value, 1_200);
    }

    #[test]
    fn parse_invalid() {
        assert!("ten ns".parse::<Time>().is_err());
        assert!("".parse::<Time>().is_err());
        let err = "5 fortnights".parse::<Time>().unwrap_err();
        assert_eq!(err.to_string(), "invalid time literal: '5 fortnights'");
    }

    #[test]
    fn serde_roundtrip() {
        let t = Time::ns(42);
        let json = serde_json::to_string(&t).unwrap();
        let back: Time = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value, 42);
        assert_eq!(back.exponent, -9);
    }
}
