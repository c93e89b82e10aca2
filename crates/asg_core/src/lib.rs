//! Core arithmetic-sequence logic that stays independent of GPU backends and binaries.
//!
//! This crate hosts:
//! - positional argument validation shared by every benchmark binary
//! - the serial generator and the elementwise formula both paths agree on
//! - work-group sizing for the data-parallel dispatch
//! - printable/serializable run reports
//! - the Q16.16 fixed-point reference used for hardware-style comparisons

pub mod args;
pub mod dispatch;
pub mod fixed_point;
pub mod report;
pub mod sequence;

/// Convenience re-export for the element type produced by every generator.
pub type Scalar = f32;

pub use args::{parse_args, ArgsError, ParsedArgs, SequenceArgs};
pub use dispatch::{DispatchError, DispatchPlan, MAX_WORKGROUP_SIZE};
pub use report::{throughput_meps, Report};
pub use sequence::{generate_serial, term, AllocationError, SerialRun};
