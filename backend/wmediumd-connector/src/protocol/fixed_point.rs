//! Probability encoding used by the error-prob and spec-prob updates.
//!
//! The integer part is shifted into bit 31 and the fraction is scaled by
//! `1 << 31` read as a signed 32 bit value, i.e. by `-2^31`.

const FIXED_POINT_SHIFT: u32 = 31;

const ONE_SHIFTED: f64 = i32::MIN as f64;

/// Encode a probability in `[0.0, 1.0]` the way wmediumd expects it.
pub fn to_fixed_point(value: f64) -> i32 {
    let before_comma = value.trunc();
    // Saturating cast; for validated input the product lies in (-2^31, 0].
    let after_comma = ((value - before_comma) * ONE_SHIFTED) as i32;
    (before_comma as i32)
        .wrapping_shl(FIXED_POINT_SHIFT)
        .wrapping_add(after_comma)
}

/// Inverse of [`to_fixed_point`] for values produced from `[0.0, 1.0]`.
pub fn from_fixed_point(value: i32) -> f64 {
    f64::from(value) / ONE_SHIFTED
}
