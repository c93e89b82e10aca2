//! Parity Lab crate: serial⇄wgpu comparison helpers and the case sets the
//! `asg_parity` harness sweeps over.

pub mod cases;
pub mod compare;
pub mod fixed_point;

pub use cases::{generate_sequence_cases, sequence_stress_cases};
pub use compare::{compare_sequences, ParitySummary};
pub use fixed_point::{compare_fixed_point, FixedPointComparison, DEFAULT_TIMING_TERMS};
