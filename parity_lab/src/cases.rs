//! Inputs exercised by `asg_parity --sweep`.

use asg_core::SequenceArgs;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic random inputs. Every `a1`/`d` is a small dyadic fraction so each
/// term is exactly representable and serial/device results must agree bit for bit.
pub fn generate_sequence_cases(count: usize, seed: u64) -> Vec<SequenceArgs> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| SequenceArgs {
            a1: rng.gen_range(-4096i32..=4096) as f32 / 16.0,
            d: rng.gen_range(-64i32..=64) as f32 / 16.0,
            n: rng.gen_range(1..=200_000),
        })
        .collect()
}

/// Edge cases around the work-group boundary, a zero step, negative steps and a
/// single element.
pub fn sequence_stress_cases() -> Vec<SequenceArgs> {
    vec![
        case(1.0, 2.0, 10),
        case(0.0, 1.0, 1),
        case(-5.0, 0.5, 63),
        case(-5.0, 0.5, 64),
        case(-5.0, 0.5, 65),
        case(3.25, 0.0, 100),
        case(1000.0, -0.25, 4096),
        case(0.0, 1.0, 1 << 20),
    ]
}

fn case(a1: f32, d: f32, n: u32) -> SequenceArgs {
    SequenceArgs { a1, d, n }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(generate_sequence_cases(8, 0xA11CE), generate_sequence_cases(8, 0xA11CE));
        assert_ne!(generate_sequence_cases(8, 1), generate_sequence_cases(8, 2));
    }

    #[test]
    fn generated_terms_are_exact() {
        for case in generate_sequence_cases(32, 7) {
            assert!(case.n >= 1);
            // |a1 + i * d| < 2^20 with 4 fractional bits fits in 24 significant bits.
            let last = case.a1 + (case.n - 1) as f32 * case.d;
            let exact = f64::from(case.a1) + f64::from(case.n - 1) * f64::from(case.d);
            assert_eq!(f64::from(last), exact);
        }
    }
}
