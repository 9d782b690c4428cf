// rag-rhythm -- onset pattern analysis and rhythm substitution for ragtime
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Rational numbers are used for note values, i.e. the fraction of a whole note
//! a note or rest lasts, e.g. `1/4` for a quarter note.

use std::{cmp::Ordering, fmt, iter, ops};

use snafu::Snafu;

/// Underlying integral type for the rational numbers.
pub type Int = i64;

/// A rational number, always fully normalized.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Rational {
    /// The numerator of the fraction.
    /// If the fraction is negative, the numerator will be made negative.
    num: Int,
    /// The denominator of the fraction, always positive.
    denom: Int,
}

impl Rational {
    // ==================== Constructors ====================

    /// Create a new rational from a potentially unnormalized fraction.
    ///
    /// # Panic
    ///
    /// Panics if the denominator is zero or the normalized fraction does not fit
    /// into [`Int`], see [`Rational::checked_new`].
    ///
    /// # Examples
    ///
    /// ```
    /// use rag_rhythm::rational::*;
    ///
    /// assert_eq!(Rational::new(2, 4), Rational::new(1, 2));
    /// assert_eq!(Rational::new(-6, 8), Rational::new(3, -4));
    /// ```
    pub fn new(num: Int, denom: Int) -> Rational {
        assert_ne!(denom, 0, "Denominator must not be zero");

        match Rational::checked_new(num, denom) {
            Some(rational) => rational,
            None => panic!("{}/{} overflows when normalized", num, denom),
        }
    }

    /// Like [`Rational::new`], but returns `None` instead of panicking.
    ///
    /// ```
    /// use rag_rhythm::rational::*;
    ///
    /// assert_eq!(Rational::checked_new(4, -8), Some(Rational::new(-1, 2)));
    /// assert_eq!(Rational::checked_new(Int::MIN, 1).map(Rational::numerator), Some(Int::MIN));
    /// assert_eq!(Rational::checked_new(Int::MIN, -1), None);
    /// assert_eq!(Rational::checked_new(1, 0), None);
    /// ```
    pub fn checked_new(num: Int, denom: Int) -> Option<Rational> {
        if denom == 0 {
            return None;
        }
        let (num, denom) = if denom < 0 {
            (num.checked_neg()?, denom.checked_neg()?)
        } else {
            (num, denom)
        };
        // positive and at most `denom`
        let div = gcd(num, denom);
        Some(Rational {
            num: num / div,
            denom: denom / div,
        })
    }

    pub fn from_int(int: Int) -> Rational {
        Rational { num: int, denom: 1 }
    }

    pub fn zero() -> Rational {
        Rational::from_int(0)
    }

    pub fn one() -> Rational {
        Rational::from_int(1)
    }

    /// The note value `1/n`, e.g. `nth(8)` is an eighth note.
    pub fn nth(n: Int) -> Self {
        Rational::new(1, n)
    }

    // ==================== Queries ====================

    pub fn numerator(self) -> Int {
        self.num
    }

    pub fn denominator(self) -> Int {
        self.denom
    }

    pub fn is_positive(self) -> bool {
        self.num > 0
    }

    /// Whether this value ends on a cell boundary of a measure split into
    /// `cells` equal parts.
    pub fn lands_on_grid(self, cells: Int) -> bool {
        cells % self.denom == 0
    }

    /// How many cells of a measure split into `cells` equal parts this value covers,
    /// or `None` if it does not land on a cell boundary or the count overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use rag_rhythm::rational::*;
    ///
    /// assert_eq!(Rational::new(3, 8).cells(16), Some(6));
    /// assert_eq!(Rational::new(1, 4).cells(8), Some(2));
    /// assert_eq!(Rational::new(1, 3).cells(8), None);
    /// assert_eq!(Rational::from_int(Int::MAX).cells(16), None);
    /// ```
    pub fn cells(self, cells: Int) -> Option<Int> {
        if self.lands_on_grid(cells) {
            (cells / self.denom).checked_mul(self.num)
        } else {
            None
        }
    }

    /// Length in quarter notes, the unit most notation software counts in.
    pub fn quarter_length(self) -> Rational {
        self * 4
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.denom)
    }
}

/// # Examples
///
/// ```
/// use rag_rhythm::rational::*;
///
/// assert_eq!(Rational::new(1, 2) + Rational::new(3, 4), Rational::new(5, 4));
/// assert_eq!(Rational::new(3, 4) + Rational::new(-5, 8), Rational::new(1, 8));
/// ```
impl ops::Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Self::Output {
        Rational::new(
            self.num * rhs.denom + self.denom * rhs.num,
            self.denom * rhs.denom,
        )
    }
}

impl ops::Mul<Int> for Rational {
    type Output = Rational;

    fn mul(self, rhs: Int) -> Self::Output {
        Rational::new(self.num * rhs, self.denom)
    }
}

impl iter::Sum for Rational {
    fn sum<I: Iterator<Item = Rational>>(iter: I) -> Rational {
        iter.fold(Rational::zero(), |acc, x| acc + x)
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Rational) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// ```
/// use rag_rhythm::rational::*;
///
/// assert!(Rational::new(3, 4) < Rational::new(3, 2));
/// ```
impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        // a / b < c / d  <=>  a * d < c * b  (denominators are positive)
        let l = i128::from(self.num) * i128::from(other.denom);
        let r = i128::from(other.num) * i128::from(self.denom);
        l.cmp(&r)
    }
}

/// An error which can be returned when parsing a rational.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum RationalError {
    /// The numerator or denominator could not be parsed as integer.
    #[snafu(display("{:?} is not an integer", text))]
    InvalidInt { text: String },
    /// The denominator was zero.
    #[snafu(display("denominator must not be zero"))]
    ZeroDenominator,
    /// The rational was not of the form `<int>` or `<int>/<int>`.
    #[snafu(display("{:?} is not of the form <int>/<int>", text))]
    Malformed { text: String },
    /// The fraction cannot be normalized without overflowing.
    #[snafu(display("{:?} is out of range", text))]
    OutOfRange { text: String },
}

fn parse_int(text: &str) -> Result<Int, RationalError> {
    text.parse().map_err(|_| RationalError::InvalidInt {
        text: text.to_owned(),
    })
}

/// ```
/// use rag_rhythm::rational::*;
///
/// assert_eq!("3/8".parse::<Rational>(), Ok(Rational::new(3, 8)));
/// assert_eq!("2".parse::<Rational>(), Ok(Rational::from_int(2)));
/// assert_eq!("1/0".parse::<Rational>(), Err(RationalError::ZeroDenominator));
/// ```
impl std::str::FromStr for Rational {
    type Err = RationalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        // `split` always yields at least one part
        let numerator = parse_int(parts.next().unwrap_or(""))?;

        match (parts.next(), parts.next()) {
            (None, _) => Ok(Rational::from_int(numerator)),
            (Some(denominator_str), None) => {
                let denominator = parse_int(denominator_str)?;
                if denominator == 0 {
                    Err(RationalError::ZeroDenominator)
                } else {
                    Rational::checked_new(numerator, denominator)
                        .ok_or_else(|| RationalError::OutOfRange { text: s.to_owned() })
                }
            }
            (Some(_), Some(_)) => Err(RationalError::Malformed { text: s.to_owned() }),
        }
    }
}

/// Computes the greatest common divisor of two numbers using euclids algorithm.
///
/// The result is always non-negative, except for `gcd(Int::MIN, 0)` and
/// `gcd(Int::MIN, Int::MIN)` where it does not fit and wraps around.
///
/// # Example
///
/// ```
/// use rag_rhythm::rational::*;
///
/// assert_eq!(gcd(20, 15), 5);
/// assert_eq!(gcd(10, 0), 10);
/// assert_eq!(gcd(0, 0), 0);
/// assert_eq!(gcd(10, -10), 10);
/// assert_eq!(gcd(Int::MIN, 6), 2);
/// ```
pub fn gcd(a: Int, b: Int) -> Int {
    let mut a = a.unsigned_abs();
    let mut b = b.unsigned_abs();

    // Invariant: a >= b
    if a < b {
        std::mem::swap(&mut a, &mut b)
    }

    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a as Int
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_of_measure() {
        let values = vec![Rational::nth(4), Rational::nth(4), Rational::new(2, 4)];
        assert_eq!(values.into_iter().sum::<Rational>(), Rational::one());
    }

    #[test]
    fn malformed_fraction() {
        assert_eq!(
            "1/2/3".parse::<Rational>(),
            Err(RationalError::Malformed {
                text: "1/2/3".to_owned()
            })
        );
        assert_eq!(
            "a/4".parse::<Rational>(),
            Err(RationalError::InvalidInt {
                text: "a".to_owned()
            })
        );
    }

    #[test]
    fn extreme_fractions() {
        assert_eq!(
            "-9223372036854775808/-1".parse::<Rational>(),
            Err(RationalError::OutOfRange {
                text: "-9223372036854775808/-1".to_owned()
            })
        );
        let min = "-9223372036854775808/4".parse::<Rational>().unwrap();
        assert_eq!((min.numerator(), min.denominator()), (Int::MIN / 4, 1));
        assert!(Rational::from_int(Int::MIN) < Rational::from_int(Int::MAX));
    }

    #[test]
    fn quarter_length_of_half_note() {
        assert_eq!(Rational::nth(2).quarter_length(), Rational::from_int(2));
    }
}
