//! Deterministic fixed-point mathematics for the swarm simulation.
//!
//! All hot-path arithmetic runs on scaled integers so the simulation behaves
//! identically on every platform and architecture. Conversion to floating
//! point happens only at the protocol boundary when a tick frame is built.

use fixed::types::I54F10;

pub use vec2::FixedVec2;

mod vec2;

/// Fixed-point number type used throughout the simulation.
///
/// Uses I54F10 format: 54 bits for the integer part, 10 bits for the fractional
/// part (scale factor 1024, resolution 1/1024). World bounds are capped well
/// below the point where squared distances could overflow the raw i64.
pub type FixedNum = I54F10;

/// Number of fractional bits in [`FixedNum`].
pub const FRAC_BITS: u32 = 10;

/// Approximate square root of a fixed-point value.
///
/// Runs a Newton (Babylonian) integer square root over the raw scaled bits,
/// then shifts the result left by half the fractional shift to land back on
/// the fixed-point scale: sqrt(v * 1024) * 32 == sqrt(v) * 1024.
///
/// Non-positive inputs return zero.
pub fn sqrt_fixed(v: FixedNum) -> FixedNum {
    let bits = v.to_bits();
    if bits <= 0 {
        return FixedNum::ZERO;
    }
    FixedNum::from_bits(isqrt(bits) << (FRAC_BITS / 2))
}

/// Integer square root by Newton iteration. Returns floor(sqrt(n)).
fn isqrt(n: i64) -> i64 {
    if n <= 0 {
        return 0;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}
