use crate::{ErrorProbLink, LINK_RATE_COUNT, MacAddress, SnrLink, SpecProbLink};

fn sta(n: u8) -> MacAddress {
    MacAddress::new([0x02, 0, 0, 0, n, 0])
}

/// **VALUE**: Verifies error probabilities outside 0.0-1.0 are rejected.
///
/// **WHY THIS MATTERS**: wmediumd stores probabilities as fixed point; out of range values
/// wrap into nonsense instead of failing.
///
/// **BUG THIS CATCHES**: Would catch a missing bound check or a NaN slipping through.
#[test]
fn given_out_of_range_errprob_when_validated_then_fails() {
    // GIVEN: Invalid probabilities
    for value in [-0.1, 1.01, f64::NAN, f64::INFINITY] {
        // WHEN: Validating
        let result = ErrorProbLink::new(sta(0), sta(1), value).validate();

        // THEN: Rejected
        assert!(result.is_err(), "Should reject {value}");
    }

    // AND: Bounds themselves are accepted
    assert!(ErrorProbLink::new(sta(0), sta(1), 0.0).validate().is_ok());
    assert!(ErrorProbLink::new(sta(0), sta(1), 1.0).validate().is_ok());
}

/// **VALUE**: Verifies links whose endpoints are the same interface are rejected.
///
/// **WHY THIS MATTERS**: A self link is never meaningful and indicates a harness bug.
///
/// **BUG THIS CATCHES**: Would catch if endpoint validation is dropped.
#[test]
fn given_self_link_when_validated_then_fails() {
    // GIVEN / WHEN: A link from a station to itself
    let result = SnrLink::new(sta(3), sta(3), 20).validate();

    // THEN: Rejected
    assert!(result.is_err());
}

/// **VALUE**: Verifies the spec-prob matrix flattens row-major and validates every cell.
///
/// **WHY THIS MATTERS**: The wire layout is `size_idx * 12 + rate_idx`; a transposed
/// matrix would silently apply probabilities to the wrong rate.
///
/// **BUG THIS CATCHES**: Would catch column-major flattening or unchecked cells.
#[test]
fn given_spec_prob_matrix_when_flattened_then_row_major() {
    // GIVEN: A matrix with one distinct cell
    let mut link = SpecProbLink::uniform(sta(0), sta(1), 0.0);
    link.errprobs[2][5] = 0.5;

    // WHEN: Flattening
    let flat: Vec<f64> = link.flattened().collect();

    // THEN: The cell lands at size_idx * 12 + rate_idx
    assert_eq!(flat.len(), 144);
    assert_eq!(flat[2 * LINK_RATE_COUNT + 5], 0.5);
    assert!(link.validate().is_ok());

    // AND: An invalid cell is reported
    link.errprobs[11][11] = 2.0;
    assert!(link.validate().is_err());
}
