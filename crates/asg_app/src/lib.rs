//! Glue shared by the benchmark binaries: flag parsing, tracing setup and report export.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use asg_core::{parse_args, Report, SequenceArgs};
use asg_gpu::{device::parse_backends, DeviceOptions};
use asg_shaders::KernelSource;

pub mod tracer {
    use tracing_subscriber::EnvFilter;

    /// Logs go to stderr so stdout carries only the report. `RUST_LOG` overrides the
    /// default `warn` level.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[derive(Debug, Clone)]
pub struct SerialOptions {
    pub sequence: SequenceArgs,
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ParallelOptions {
    pub sequence: SequenceArgs,
    pub kernel: KernelSource,
    pub device: DeviceOptions,
    pub export_json: Option<PathBuf>,
}

pub fn parse_serial_options<I>(args: I) -> Result<SerialOptions>
where
    I: IntoIterator<Item = String>,
{
    let parsed = parse_args(args)?;
    let mut opts = SerialOptions {
        sequence: parsed.sequence,
        export_json: None,
    };

    for arg in parsed.flags {
        if let Some(value) = arg.strip_prefix("--export-json=") {
            opts.export_json = Some(PathBuf::from(value));
        } else {
            bail!("unrecognized argument: {arg}");
        }
    }

    Ok(opts)
}

pub fn parse_parallel_options<I>(args: I) -> Result<ParallelOptions>
where
    I: IntoIterator<Item = String>,
{
    let parsed = parse_args(args)?;
    let mut opts = ParallelOptions {
        sequence: parsed.sequence,
        kernel: KernelSource::Embedded,
        device: DeviceOptions::default(),
        export_json: None,
    };

    for arg in parsed.flags {
        if let Some(value) = arg.strip_prefix("--export-json=") {
            opts.export_json = Some(PathBuf::from(value));
        } else if !apply_device_flag(&arg, &mut opts.device, &mut opts.kernel)? {
            bail!("unrecognized argument: {arg}");
        }
    }

    Ok(opts)
}

/// Handles `--kernel=`, `--device=` and `--backends=`. Returns `false` when `arg`
/// is none of them.
pub fn apply_device_flag(
    arg: &str,
    device: &mut DeviceOptions,
    kernel: &mut KernelSource,
) -> Result<bool> {
    if let Some(value) = arg.strip_prefix("--kernel=") {
        *kernel = KernelSource::from_path(value);
    } else if let Some(value) = arg.strip_prefix("--device=") {
        device.preference = value.parse().context("invalid --device value")?;
    } else if let Some(value) = arg.strip_prefix("--backends=") {
        device.backends = parse_backends(value).context("invalid --backends value")?;
    } else {
        return Ok(false);
    }
    Ok(true)
}

pub fn write_report_json(report: &Report, path: &Path) -> Result<()> {
    let json = report.to_json().context("failed to serialize report")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write report JSON to {}", path.display()))?;
    Ok(())
}
