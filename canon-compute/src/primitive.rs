//! Functions to construct [`Integer`]s and [`Rational`]s from various types.

use canon_parser::parser::ast::DIGITS;
use rug::{Integer, Rational};

/// Creates an [`Integer`] with the given value.
pub fn int<T>(n: T) -> Integer
where
    Integer: From<T>,
{
    Integer::from(n)
}

/// Creates an [`Integer`] from a string slice of decimal digits.
///
/// The parser only hands over strings matching `[0-9]+`, so this cannot fail.
pub fn int_from_str(s: &str) -> Integer {
    Integer::from_str_radix(s, 10).unwrap_or_default()
}

/// Creates a [`Rational`] with the given value.
pub fn rat<T>(n: T) -> Rational
where
    Rational: From<T>,
{
    Rational::from(n)
}

/// Parses a number from a string, with the given radix. The radix must be between 2 and 16,
/// inclusive, and every character of `s` must be a valid digit for that radix; the parser
/// guarantees both.
pub fn from_str_radix(s: &str, radix: u8) -> Integer {
    let allowed_digits = &DIGITS[..radix as usize];

    let mut result = int(0);
    for c in s.chars() {
        let digit = allowed_digits.iter().position(|&d| d == c).unwrap_or(0);
        result *= u32::from(radix);
        result += digit as u32;
    }

    result
}

/// Raises an exact rational to an integer power. Returns [`None`] when the result is undefined,
/// i.e. when the base is zero and the exponent is not positive.
pub fn rat_pow(base: &Rational, exp: i32) -> Option<Rational> {
    if *base == 0 && exp <= 0 {
        return None;
    }

    use rug::ops::Pow;
    Some(Rational::from(base.pow(exp)))
}
