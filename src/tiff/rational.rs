//! Exact rational numbers for TIFF RATIONAL and SRATIONAL values.
//!
//! A [`Rational`] is always stored in lowest terms with the sign carried on
//! the numerator, so the denominator is strictly positive. A distinguished
//! NaN sentinel represents the zero-denominator values that occur in the
//! wild; the reader maps those to NaN instead of failing the parse.
//!
//! Equality and ordering compare the reduced ratio as `f64`. This is a
//! deliberate approximation: very large numerators or denominators near the
//! limits of double precision can compare equal without being exactly equal.
//! Exact cross-multiplication comparison would change observable behavior
//! for such values, so the floating-point comparison is kept.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// Errors from rational construction and arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RationalError {
    /// Denominator of zero passed to a constructor
    #[error("denominator must be non-zero")]
    ZeroDenominator,

    /// Numerator or denominator equal to `i64::MIN`, which cannot be negated
    #[error("numerator and denominator must be greater than i64::MIN")]
    OutOfRange,

    /// Division by a zero-valued rational
    #[error("division by zero-valued rational")]
    DivisionByZero,
}

/// An immutable rational number reduced to lowest terms.
#[derive(Debug, Clone, Copy)]
pub struct Rational {
    numerator: i64,
    denominator: i64,
}

impl Rational {
    /// The NaN sentinel produced when lenient parsing meets a
    /// zero-denominator value.
    pub const NAN: Rational = Rational {
        numerator: 0,
        denominator: 0,
    };

    /// Create a rational from a numerator and denominator.
    ///
    /// The value is reduced to lowest terms and the sign normalized onto the
    /// numerator. A zero denominator and components equal to `i64::MIN` are
    /// rejected.
    pub fn new(numerator: i64, denominator: i64) -> Result<Self, RationalError> {
        if denominator == 0 {
            return Err(RationalError::ZeroDenominator);
        }
        if numerator == i64::MIN || denominator == i64::MIN {
            return Err(RationalError::OutOfRange);
        }

        let divisor = gcd(numerator.unsigned_abs(), denominator.unsigned_abs()) as i64;
        let mut numerator = numerator / divisor;
        let mut denominator = denominator / divisor;

        // Sign lives on the numerator
        if denominator < 0 {
            numerator = -numerator;
            denominator = -denominator;
        }

        Ok(Rational {
            numerator,
            denominator,
        })
    }

    /// Create a rational from a whole number.
    pub fn from_integer(value: i64) -> Result<Self, RationalError> {
        Rational::new(value, 1)
    }

    /// The reduced numerator, carrying the sign.
    #[inline]
    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    /// The reduced denominator, always positive for non-NaN values.
    #[inline]
    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    /// Whether this is the NaN sentinel.
    #[inline]
    pub fn is_nan(&self) -> bool {
        self.denominator == 0
    }

    /// The ratio as double precision.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        if self.is_nan() {
            f64::NAN
        } else {
            self.numerator as f64 / self.denominator as f64
        }
    }

    /// Sum of two rationals.
    ///
    /// Operand denominators are cross-cancelled before multiplying to keep
    /// intermediate products small.
    pub fn plus(&self, other: &Rational) -> Rational {
        if self.is_nan() || other.is_nan() {
            return Rational::NAN;
        }
        let g = gcd(self.denominator.unsigned_abs(), other.denominator.unsigned_abs()) as i64;
        let numerator = self.numerator * (other.denominator / g) + other.numerator * (self.denominator / g);
        let denominator = self.denominator * (other.denominator / g);
        Rational::new(numerator, denominator).unwrap_or(Rational::NAN)
    }

    /// Difference of two rationals.
    pub fn minus(&self, other: &Rational) -> Rational {
        self.plus(&other.negate())
    }

    /// Product of two rationals.
    ///
    /// Cross-cancels numerators against the opposite denominators before
    /// multiplying so the operands reduce each other first.
    pub fn times(&self, other: &Rational) -> Rational {
        if self.is_nan() || other.is_nan() {
            return Rational::NAN;
        }
        let g1 = gcd(self.numerator.unsigned_abs(), other.denominator.unsigned_abs()) as i64;
        let g2 = gcd(other.numerator.unsigned_abs(), self.denominator.unsigned_abs()) as i64;
        let numerator = (self.numerator / g1) * (other.numerator / g2);
        let denominator = (self.denominator / g2) * (other.denominator / g1);
        Rational::new(numerator, denominator).unwrap_or(Rational::NAN)
    }

    /// Quotient of two rationals.
    ///
    /// Dividing by a zero-valued rational is an error.
    pub fn divides(&self, other: &Rational) -> Result<Rational, RationalError> {
        Ok(self.times(&other.reciprocal()?))
    }

    /// Additive inverse.
    pub fn negate(&self) -> Rational {
        if self.is_nan() {
            return Rational::NAN;
        }
        Rational {
            numerator: -self.numerator,
            denominator: self.denominator,
        }
    }

    /// Multiplicative inverse. The reciprocal of zero is an error.
    pub fn reciprocal(&self) -> Result<Rational, RationalError> {
        if self.is_nan() {
            return Ok(Rational::NAN);
        }
        if self.numerator == 0 {
            return Err(RationalError::DivisionByZero);
        }
        Rational::new(self.denominator, self.numerator)
    }
}

impl PartialEq for Rational {
    fn eq(&self, other: &Self) -> bool {
        // Floating-point comparison of the reduced ratio, not exact
        // cross-multiplication. See module docs.
        self.as_f64() == other.as_f64()
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_f64().partial_cmp(&other.as_f64())
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nan() {
            write!(f, "NaN")
        } else if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

/// Greatest common divisor, always positive for non-zero input.
fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    // gcd(0, 0) would be 0; callers never pass both zero, but a divisor of
    // 1 keeps the arithmetic safe regardless.
    if a == 0 {
        1
    } else {
        a
    }
}

// =============================================================================
// Tests
// =============================================================================
