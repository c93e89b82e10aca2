//! Serial arithmetic-sequence generator.

use std::{
    collections::TryReserveError,
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::{args::SequenceArgs, Scalar};

/// Element `i` of the sequence. Kept as a separate multiply and add (no fused
/// multiply-add) so the device kernel produces the same bits.
#[inline]
pub fn term(a1: Scalar, d: Scalar, i: u32) -> Scalar {
    a1 + (i as Scalar) * d
}

#[derive(Debug, Error)]
#[error("Memory allocation failed ({elements} elements)")]
pub struct AllocationError {
    pub elements: u32,
    #[source]
    source: TryReserveError,
}

/// Reserves exactly `n` slots without touching them.
pub fn allocate_output(n: u32) -> Result<Vec<Scalar>, AllocationError> {
    let mut output = Vec::new();
    output
        .try_reserve_exact(n as usize)
        .map_err(|source| AllocationError {
            elements: n,
            source,
        })?;
    Ok(output)
}

/// Overwrites `output` with the first `n` terms.
pub fn fill_sequence(output: &mut Vec<Scalar>, a1: Scalar, d: Scalar, n: u32) {
    output.clear();
    output.extend((0..n).map(|i| term(a1, d, i)));
}

/// Values and timing of one serial pass.
#[derive(Debug, Clone)]
pub struct SerialRun {
    pub values: Vec<Scalar>,
    pub elapsed: Duration,
}

/// Allocates the output, then times only the generation pass.
pub fn generate_serial(args: &SequenceArgs) -> Result<SerialRun, AllocationError> {
    let mut values = allocate_output(args.n)?;

    let start = Instant::now();
    fill_sequence(&mut values, args.a1, args.d, args.n);
    let elapsed = start.elapsed();

    Ok(SerialRun { values, elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn ten_odd_numbers() {
        let run = generate_serial(&SequenceArgs {
            a1: 1.0,
            d: 2.0,
            n: 10,
        })
        .unwrap();
        assert_eq!(
            run.values,
            vec![1.0, 3.0, 5.0, 7.0, 9.0, 11.0, 13.0, 15.0, 17.0, 19.0]
        );
    }

    #[test]
    fn matches_formula_for_random_inputs() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xA5A5);
        for _ in 0..64 {
            let a1: f32 = rng.gen_range(-1000.0..=1000.0);
            let d: f32 = rng.gen_range(-10.0..=10.0);
            let n: u32 = rng.gen_range(1..=2048);
            let run = generate_serial(&SequenceArgs { a1, d, n }).unwrap();
            assert_eq!(run.values.len(), n as usize);
            for (i, value) in run.values.iter().enumerate() {
                let expected = a1 + (i as f32) * d;
                assert_eq!(value.to_bits(), expected.to_bits(), "index {i}");
            }
        }
    }

    #[test]
    fn fill_reuses_reserved_capacity() {
        let mut out = allocate_output(128).unwrap();
        let ptr = out.as_ptr();
        fill_sequence(&mut out, 0.5, 0.25, 128);
        assert_eq!(out.len(), 128);
        assert_eq!(out.as_ptr(), ptr);
        assert_eq!(out[4], 1.5);
    }
}
