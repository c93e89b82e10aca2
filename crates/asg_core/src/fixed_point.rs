//! Q16.16 fixed-point reference, modelling a hardware generator that
//! accumulates `term += d` in 32-bit registers.

use std::time::Instant;

use serde::Serialize;

use crate::{
    args::SequenceArgs,
    sequence::{allocate_output, AllocationError, SerialRun},
    Scalar,
};

/// Signed 32-bit value with 16 fractional bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Q16_16(i32);

impl Q16_16 {
    pub const FRACTIONAL_BITS: u32 = 16;
    const SCALE: f64 = (1u32 << Self::FRACTIONAL_BITS) as f64;

    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Scales by 2^16 and rounds half-to-even, saturating at the i32 range.
    pub fn from_f32(value: Scalar) -> Self {
        Self((f64::from(value) * Self::SCALE).round_ties_even() as i32)
    }

    pub fn to_f32(self) -> Scalar {
        (f64::from(self.0) / Self::SCALE) as Scalar
    }

    /// Two's-complement addition, wrapping like a 32-bit register.
    pub fn wrapping_add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

/// Overwrites `output` with the first `n` terms of the fixed-point accumulation.
pub fn fill_fixed_point(output: &mut Vec<Scalar>, a1: Scalar, d: Scalar, n: u32) {
    let step = Q16_16::from_f32(d);
    let mut current = Q16_16::from_f32(a1);
    output.clear();
    output.extend((0..n).map(|_| {
        let value = current.to_f32();
        current = current.wrapping_add(step);
        value
    }));
}

/// First `n` terms computed by fixed-point accumulation and converted back to floats.
pub fn fixed_point_sequence(a1: Scalar, d: Scalar, n: u32) -> Vec<Scalar> {
    let mut sequence = Vec::with_capacity(n as usize);
    fill_fixed_point(&mut sequence, a1, d, n);
    sequence
}

/// Fixed-point counterpart of [`crate::generate_serial`]: allocation happens
/// first and only the accumulation is timed.
pub fn generate_fixed_point(args: &SequenceArgs) -> Result<SerialRun, AllocationError> {
    let mut values = allocate_output(args.n)?;

    let start = Instant::now();
    fill_fixed_point(&mut values, args.a1, args.d, args.n);
    let elapsed = start.elapsed();

    Ok(SerialRun { values, elapsed })
}

/// Per-term `float - fixed` over the common prefix.
pub fn term_differences(float: &[Scalar], fixed: &[Scalar]) -> Vec<Scalar> {
    float.iter().zip(fixed).map(|(f, q)| f - q).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::term;

    #[test]
    fn conversions_handle_sign() {
        assert_eq!(Q16_16::from_f32(1.0).raw(), 65_536);
        assert_eq!(Q16_16::from_f32(-0.5).raw(), -32_768);
        assert_eq!(Q16_16::from_raw(-98_304).to_f32(), -1.5);
        assert_eq!(Q16_16::from_f32(1e9).raw(), i32::MAX);
    }

    #[test]
    fn rounds_half_to_even() {
        // 2.5 / 65536 and 3.5 / 65536 sit exactly between two raw steps.
        assert_eq!(Q16_16::from_f32(2.5 / 65_536.0).raw(), 2);
        assert_eq!(Q16_16::from_f32(3.5 / 65_536.0).raw(), 4);
    }

    #[test]
    fn representable_steps_match_float_sequence() {
        let fixed = fixed_point_sequence(1.0, 0.5, 10);
        let float: Vec<f32> = (0..10).map(|i| term(1.0, 0.5, i)).collect();
        assert_eq!(fixed, float);
    }

    #[test]
    fn unrepresentable_step_drifts_linearly() {
        let n = 1000;
        let fixed = fixed_point_sequence(0.0, 0.1, n);
        // 0.1 quantizes to 6554 / 65536.
        let per_step = 6554.0 / 65_536.0 - 0.1;
        for (i, value) in fixed.iter().enumerate() {
            let drift = f64::from(*value) - i as f64 * 0.1;
            assert!(
                (drift - i as f64 * per_step).abs() < 1e-3,
                "term {i}: drift {drift}"
            );
        }
    }

    #[test]
    fn timed_generation_matches_plain_sequence() {
        let args = SequenceArgs {
            a1: -2.0,
            d: 0.1,
            n: 257,
        };
        let run = generate_fixed_point(&args).unwrap();
        assert_eq!(run.values, fixed_point_sequence(args.a1, args.d, args.n));
    }

    #[test]
    fn differences_are_float_minus_fixed() {
        let float: Vec<f32> = (0..4).map(|i| term(0.0, 0.1, i)).collect();
        let fixed = fixed_point_sequence(0.0, 0.1, 4);
        let diffs = term_differences(&float, &fixed);
        assert_eq!(diffs.len(), 4);
        assert_eq!(diffs[0], 0.0);
        // 6554/65536 overshoots 0.1, so the float side is smaller.
        assert!(diffs[1..].iter().all(|&diff| diff < 0.0), "{diffs:?}");
        assert_eq!(term_differences(&float, &fixed[..2]).len(), 2);
    }

    #[test]
    fn accumulator_wraps_like_a_register() {
        let max = Q16_16::from_raw(i32::MAX);
        assert_eq!(max.wrapping_add(Q16_16::from_raw(1)).raw(), i32::MIN);
    }
}
