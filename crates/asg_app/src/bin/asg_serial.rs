//! Single-threaded arithmetic sequence generator.

use std::env;

use anyhow::Result;
use asg_app::{parse_serial_options, tracer::init_tracing, write_report_json};
use asg_core::{generate_serial, Report};

fn main() -> Result<()> {
    init_tracing();

    let options = parse_serial_options(env::args())?;
    let run = generate_serial(&options.sequence)?;
    tracing::debug!(elements = run.values.len(), elapsed = ?run.elapsed, "serial pass finished");

    let report = Report::new("Serial", &run.values)
        .with_timing("Total time", run.elapsed)
        .with_throughput_from(run.elapsed);
    println!("{report}");

    if let Some(ref path) = options.export_json {
        write_report_json(&report, path)?;
    }

    Ok(())
}
