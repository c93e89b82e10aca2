//! Float vs Q16.16 comparison: how far a 32-bit fixed-point accumulator drifts
//! from the float formula, and what each costs to generate.

use std::{fmt, time::Duration};

use asg_core::{
    fixed_point::{fixed_point_sequence, generate_fixed_point, term_differences},
    generate_serial,
    report::SPOT_CHECK_LEN,
    AllocationError, Scalar, SequenceArgs,
};

/// Sequences up to this length list every term's difference.
pub const PER_TERM_LIMIT: usize = 20;

/// Terms generated for the float vs fixed-point timing comparison.
pub const DEFAULT_TIMING_TERMS: u32 = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct FixedPointComparison {
    /// `float - fixed` for every term of the case.
    pub differences: Vec<Scalar>,
    pub max_abs_error: Scalar,
    pub timing_terms: u32,
    pub float_time: Duration,
    pub fixed_time: Duration,
}

/// Diffs `float` (the serial run of `args`) against the fixed-point sequence,
/// then times both generators over `timing_terms` terms of the same `a1`/`d`.
pub fn compare_fixed_point(
    args: &SequenceArgs,
    float: &[Scalar],
    timing_terms: u32,
) -> Result<FixedPointComparison, AllocationError> {
    let fixed = fixed_point_sequence(args.a1, args.d, args.n);
    let differences = term_differences(float, &fixed);
    let max_abs_error = differences
        .iter()
        .map(|diff| diff.abs())
        .filter(|err| err.is_finite())
        .fold(0.0, Scalar::max);

    let timing_args = SequenceArgs {
        n: timing_terms,
        ..*args
    };
    let float_time = generate_serial(&timing_args)?.elapsed;
    let fixed_time = generate_fixed_point(&timing_args)?.elapsed;
    tracing::debug!(timing_terms, ?float_time, ?fixed_time, "fixed-point timing pass");

    Ok(FixedPointComparison {
        differences,
        max_abs_error,
        timing_terms,
        float_time,
        fixed_time,
    })
}

impl fmt::Display for FixedPointComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Difference between floating-point and Q16.16:")?;
        let len = self.differences.len();
        if len <= PER_TERM_LIMIT {
            for (idx, diff) in self.differences.iter().enumerate() {
                writeln!(f, "  Term {}: {diff:.10}", idx + 1)?;
            }
        } else {
            for (idx, diff) in self.differences.iter().enumerate().take(SPOT_CHECK_LEN) {
                writeln!(f, "  Term {}: {diff:.10}", idx + 1)?;
            }
            writeln!(f, "  ...")?;
            let tail_start = len - SPOT_CHECK_LEN;
            for (idx, diff) in self.differences.iter().enumerate().skip(tail_start) {
                writeln!(f, "  Term {}: {diff:.10}", idx + 1)?;
            }
        }
        writeln!(f, "Max |float - Q16.16|: {:.3e}", self.max_abs_error)?;
        writeln!(f)?;
        writeln!(f, "Time to generate {} terms:", self.timing_terms)?;
        writeln!(f, "  Floating-point: {:.6} seconds", self.float_time.as_secs_f64())?;
        write!(f, "  Fixed-point:    {:.6} seconds", self.fixed_time.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison(differences: Vec<Scalar>) -> FixedPointComparison {
        FixedPointComparison {
            max_abs_error: differences.iter().fold(0.0, |acc: Scalar, d| acc.max(d.abs())),
            differences,
            timing_terms: 1_000,
            float_time: Duration::from_micros(1_500),
            fixed_time: Duration::from_micros(2_250),
        }
    }

    #[test]
    fn short_sequences_list_every_term() {
        let text = comparison(vec![0.0, -0.5, 0.25]).to_string();
        let expected = "Difference between floating-point and Q16.16:\n\
                        \x20 Term 1: 0.0000000000\n\
                        \x20 Term 2: -0.5000000000\n\
                        \x20 Term 3: 0.2500000000\n\
                        Max |float - Q16.16|: 5.000e-1\n\
                        \n\
                        Time to generate 1000 terms:\n\
                        \x20 Floating-point: 0.001500 seconds\n\
                        \x20 Fixed-point:    0.002250 seconds";
        assert_eq!(text, expected);
    }

    #[test]
    fn long_sequences_show_first_and_last_terms() {
        let text = comparison((0..100).map(|i| i as Scalar).collect()).to_string();
        assert!(text.contains("  Term 5: 4.0000000000\n  ...\n  Term 96: 95.0000000000\n"));
        assert!(!text.contains("Term 6:"));
        assert!(text.contains("  Term 100: 99.0000000000\n"));
    }

    #[test]
    fn compares_case_and_times_both_generators() {
        let args = SequenceArgs {
            a1: 1.0,
            d: 0.1,
            n: 8,
        };
        let float = generate_serial(&args).unwrap().values;
        let result = compare_fixed_point(&args, &float, 10_000).unwrap();
        assert_eq!(result.differences.len(), 8);
        assert_eq!(result.differences[0], 0.0);
        assert!(result.max_abs_error > 0.0 && result.max_abs_error < 1e-3);
        assert_eq!(result.timing_terms, 10_000);

        let exact = SequenceArgs { d: 0.5, ..args };
        let float = generate_serial(&exact).unwrap().values;
        let result = compare_fixed_point(&exact, &float, 16).unwrap();
        assert!(result.differences.iter().all(|&diff| diff == 0.0));
        assert_eq!(result.max_abs_error, 0.0);
    }
}
