//! Z-order (Morton) keys for spatial sorting.
//!
//! Agents are re-sorted by Morton key before every tick so that neighbours in
//! space tend to be neighbours in memory during the tree build and force
//! pass. The key only affects iteration order, never simulation results.

use super::fixed_math::{FixedVec2, FRAC_BITS};

/// Maximum per-axis coordinate after the fractional scale is stripped.
const AXIS_MAX: i64 = 0xFFFF;

/// Interleaved-bit sort key for a fixed-point position.
///
/// Drops the fractional bits, clamps each axis into [0, 0xFFFF] and
/// interleaves x into the even bits and y into the odd bits of a u32.
/// Pure and deterministic: equal positions always produce equal keys.
pub fn morton_key(pos: FixedVec2) -> u32 {
    let x = (pos.x.to_bits() >> FRAC_BITS).clamp(0, AXIS_MAX) as u32;
    let y = (pos.y.to_bits() >> FRAC_BITS).clamp(0, AXIS_MAX) as u32;
    spread_bits(x) | (spread_bits(y) << 1)
}

/// Spreads the low 16 bits of `v` so each lands on an even bit position.
fn spread_bits(v: u32) -> u32 {
    let mut v = v & 0xFFFF;
    v = (v | (v << 8)) & 0x00FF_00FF;
    v = (v | (v << 4)) & 0x0F0F_0F0F;
    v = (v | (v << 2)) & 0x3333_3333;
    v = (v | (v << 1)) & 0x5555_5555;
    v
}
