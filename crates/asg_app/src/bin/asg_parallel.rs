//! Data-parallel arithmetic sequence generator: one wgpu work-item per element.

use std::env;

use anyhow::Result;
use asg_app::{parse_parallel_options, tracer::init_tracing, write_report_json};
use asg_core::Report;
use asg_gpu::{init_blocking, run_sequence, DevicePreference};

fn main() -> Result<()> {
    init_tracing();

    let options = parse_parallel_options(env::args())?;
    let kernel = options.kernel.load()?;
    let ctx = init_blocking(&options.device)?;
    if ctx.is_cpu_fallback() && options.device.preference == DevicePreference::Auto {
        println!("Using CPU as fallback");
    }

    let run = run_sequence(&ctx, &options.sequence, &kernel)?;

    let mut report = Report::new("wgpu", &run.values)
        .with_device(ctx.describe())
        .with_timing("Total wall time", run.wall);
    if let Some(kernel) = run.kernel {
        report = report.with_timing("Kernel execution time", kernel);
    }
    let report = report.with_throughput_from(run.throughput_basis());
    println!("{report}");

    if let Some(ref path) = options.export_json {
        write_report_json(&report, path)?;
    }

    Ok(())
}
