use asg_core::Scalar;

/// Outcome of comparing a reference sequence against a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParitySummary {
    pub compared: usize,
    /// `(expected, actual)` lengths when they differ.
    pub length_mismatch: Option<(usize, usize)>,
    pub mismatches: usize,
    pub first_mismatch: Option<usize>,
    pub max_abs_error: Scalar,
}

impl ParitySummary {
    pub fn is_match(&self) -> bool {
        self.length_mismatch.is_none() && self.mismatches == 0
    }
}

/// Element-wise comparison. A tolerance of zero demands exact equality;
/// equal infinities always match.
pub fn compare_sequences(
    expected: &[Scalar],
    actual: &[Scalar],
    tolerance: Scalar,
) -> ParitySummary {
    let mut summary = ParitySummary {
        compared: expected.len().min(actual.len()),
        length_mismatch: (expected.len() != actual.len()).then_some((expected.len(), actual.len())),
        ..Default::default()
    };

    for (idx, (lhs, rhs)) in expected.iter().zip(actual.iter()).enumerate() {
        if lhs == rhs {
            continue;
        }
        let err = (lhs - rhs).abs();
        if err.is_finite() {
            summary.max_abs_error = summary.max_abs_error.max(err);
        }
        if !(err <= tolerance) {
            summary.mismatches += 1;
            summary.first_mismatch.get_or_insert(idx);
        }
    }

    summary
}
