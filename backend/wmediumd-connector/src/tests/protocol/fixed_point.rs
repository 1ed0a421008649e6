use crate::protocol::{from_fixed_point, to_fixed_point};

/// **VALUE**: Verifies the encoding of the probability bounds and one half.
///
/// **WHY THIS MATTERS**: wmediumd decodes probabilities with the same shift and scale. If the
/// constant or the sign of the scale drifts, every error-prob update lands on a different
/// value than the harness asked for.
///
/// **BUG THIS CATCHES**: Would catch scaling by `i32::MAX` instead of `i32::MIN`, or a missing
/// wrapping shift of the integer part (1.0 must encode as `i32::MIN`).
#[test]
fn given_bound_probabilities_when_encoded_then_match_server_representation() {
    // GIVEN / WHEN / THEN: Known encodings
    assert_eq!(to_fixed_point(0.0), 0);
    assert_eq!(to_fixed_point(0.5), -1_073_741_824);
    assert_eq!(to_fixed_point(1.0), i32::MIN);
}

/// **VALUE**: Verifies a decoded value lies within one unit of precision of the original.
///
/// **WHY THIS MATTERS**: The fake server in the integration tests and any log line showing a
/// decoded update rely on `from_fixed_point` inverting `to_fixed_point`.
///
/// **BUG THIS CATCHES**: Would catch an inverse using the wrong divisor.
#[test]
fn given_probability_when_encoded_and_decoded_then_within_precision() {
    // GIVEN: Probabilities with fractional parts
    for value in [0.1, 0.25, 0.333, 0.9, 1.0] {
        // WHEN: Encoding and decoding
        let decoded = from_fixed_point(to_fixed_point(value));

        // THEN: Same value up to fixed point precision
        assert!(
            (decoded - value).abs() < 1e-9,
            "{value} decoded as {decoded}"
        );
    }
}
