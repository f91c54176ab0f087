use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

/// A selector number. Selector arithmetic is always performed on `f64`.
#[derive(Debug, Clone, PartialEq, Copy)]
pub struct Number(f64);

/// Not-a-number, the result of converting text that is not numeric.
pub const NAN: Number = Number(f64::NAN);

/// Integers up to 2^53 convert to and from `f64` exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

impl Number {
    pub const fn new(value: f64) -> Self {
        Number(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_int(&self) -> bool {
        self.0.is_finite() && self.0.fract() == 0.0
    }

    /// The value as an `i64` when it is an integer `f64` represents exactly.
    pub fn as_int(&self) -> Option<i64> {
        (self.is_int() && self.0.abs() <= MAX_SAFE_INTEGER).then_some(self.0 as i64)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    pub fn is_nan(&self) -> bool {
        self.0.is_nan()
    }

    pub fn abs(&self) -> Self {
        Number(self.0.abs())
    }

    pub fn floor(&self) -> Self {
        Number(self.0.floor())
    }

    pub fn ceil(&self) -> Self {
        Number(self.0.ceil())
    }

    pub fn round(&self) -> Self {
        Number(self.0.round())
    }

    /// Returns the number as a 1-based position when it is a positive integer.
    pub fn as_position(&self) -> Option<usize> {
        (self.is_int() && self.0 >= 1.0).then(|| self.0 as usize)
    }
}

impl Default for Number {
    fn default() -> Self {
        Number(0.0)
    }
}

impl Neg for Number {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Number(-self.0)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number(value as f64)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number(value as f64)
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number(value as f64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number(value)
    }
}

impl From<bool> for Number {
    fn from(value: bool) -> Self {
        Number(if value { 1.0 } else { 0.0 })
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_nan() {
            write!(f, "NaN")
        } else if self.0.is_infinite() {
            write!(f, "{}Infinity", if self.0 < 0.0 { "-" } else { "" })
        } else if let Some(n) = self.as_int() {
            write!(f, "{}", n)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Add for Number {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Number(self.0 + other.0)
    }
}

impl Sub for Number {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Number(self.0 - other.0)
    }
}

impl Mul for Number {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Number(self.0 * other.0)
    }
}

impl Div for Number {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        Number(self.0 / other.0)
    }
}

impl Rem for Number {
    type Output = Self;

    fn rem(self, other: Self) -> Self {
        Number(self.0 % other.0)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Number {}

// NaN sorts last so tokens holding numbers can be totally ordered.
impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.is_nan(), other.0.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.0.partial_cmp(&other.0).unwrap_or(Ordering::Less),
        }
    }
}
