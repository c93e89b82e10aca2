//! GPU layer over `wgpu`: picks a compute adapter and runs the arithmetic sequence kernel
//! with wall-clock and timestamp-query timing.

pub mod device;
pub mod runner;

pub use device::{init, init_blocking, DeviceOptions, DevicePreference, GpuContext};
pub use runner::{run_sequence, run_sequence_async, GpuRun};
