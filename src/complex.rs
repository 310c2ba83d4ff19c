//! Complex Arithmetic - power, subtraction, magnitude, random integers
//!
//! Pure functions over `(re, im)` pairs of f64. Nothing here fails on
//! degenerate numeric input; NaN and infinity propagate the way native
//! floating point does, which the escape-time renderer relies on.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::TAU;
use thiserror::Error;

/// Complex number as an ordered (re, im) pair
pub type Complex = Complex64;

/// Integer exponents beyond this use `powf` instead of square-and-multiply
const FAST_POW_LIMIT: f64 = i32::MAX as f64;

/// Largest magnitude at which every integer is an exact f64 (2^53)
pub const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("Empty integer range: ceil({min}) > floor({max})")]
    Empty { min: f64, max: f64 },
    #[error("Non-finite range bound: [{min}, {max}]")]
    NonFinite { min: f64, max: f64 },
    #[error("Range bound beyond ±2^53: [{min}, {max}]")]
    OutOfRange { min: f64, max: f64 },
}

/// Raise `base` to an integer power by square-and-multiply
///
/// Negative exponents return the reciprocal of the positive power.
pub fn fast_pow(base: f64, exp: i64) -> f64 {
    let positive = pow_unsigned(base, exp.unsigned_abs());
    if exp < 0 {
        1.0 / positive
    } else {
        positive
    }
}

fn pow_unsigned(base: f64, mut n: u64) -> f64 {
    let mut result = 1.0;
    let mut x = base;
    while n > 0 {
        if n & 1 == 1 {
            result *= x;
        }
        x *= x;
        n >>= 1;
    }
    result
}

/// r^x, taking the square-and-multiply path for integer x
fn real_pow(r: f64, x: f64) -> f64 {
    if x.is_finite() && x.fract() == 0.0 && x.abs() <= FAST_POW_LIMIT {
        fast_pow(r, x as i64)
    } else {
        r.powf(x)
    }
}

/// Complex exponentiation `base^exponent` in polar form
///
/// c^z = r^x · e^(-yθ) · (cos φ + i sin φ), where φ = y·ln r + x·θ.
///
/// The origin raised to an exponent with positive real part is exactly zero.
/// With a non-positive real part the result has non-finite components.
pub fn power(base: Complex, exponent: Complex) -> Complex {
    let (x, y) = (exponent.re, exponent.im);
    let r = base.re.hypot(base.im);

    if r == 0.0 && x > 0.0 {
        return Complex::new(0.0, 0.0);
    }

    let theta = base.im.atan2(base.re);
    let log_r = r.ln();

    // rem_euclid keeps negative angles inside [0, 2π)
    let angle = (y * log_r + x * theta).rem_euclid(TAU);
    let factor = real_pow(r, x) * (-y * theta).exp();

    Complex::new(factor * angle.cos(), factor * angle.sin())
}

/// Component-wise `a - b`
pub fn subtract(a: Complex, b: Complex) -> Complex {
    Complex::new(a.re - b.re, a.im - b.im)
}

/// Euclidean norm sqrt(re² + im²)
pub fn magnitude(z: Complex) -> f64 {
    (z.re * z.re + z.im * z.im).sqrt()
}

/// Round bounds inward to the inclusive integer range [ceil(min), floor(max)]
pub fn int_range(min: f64, max: f64) -> Result<(i64, i64), RangeError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(RangeError::NonFinite { min, max });
    }

    let lo = min.ceil();
    let hi = max.floor();
    if lo > hi {
        return Err(RangeError::Empty { min, max });
    }
    if lo < -MAX_EXACT_INT || hi > MAX_EXACT_INT {
        return Err(RangeError::OutOfRange { min, max });
    }

    Ok((lo as i64, hi as i64))
}

/// Uniform integer in [ceil(min), floor(max)]
///
/// Uses the thread-local generator. Not cryptographically secure.
pub fn random_int(min: f64, max: f64) -> Result<i64, RangeError> {
    let (lo, hi) = int_range(min, max)?;
    Ok(rand::thread_rng().gen_range(lo..=hi))
}
