use std::env;

use anyhow::{bail, Context, Result};
use asg_app::{apply_device_flag, tracer::init_tracing};
use asg_core::{generate_serial, parse_args, SequenceArgs};
use asg_gpu::{init_blocking, run_sequence, DeviceOptions, GpuContext};
use asg_shaders::{KernelSource, LoadedKernel};
use parity_lab::{
    compare_fixed_point, compare_sequences, generate_sequence_cases, sequence_stress_cases,
    DEFAULT_TIMING_TERMS,
};

struct CliOptions {
    cases: Vec<(String, SequenceArgs)>,
    tolerance: f32,
    fixed_point: bool,
    timing_terms: u32,
    device: DeviceOptions,
    kernel: KernelSource,
}

fn main() -> Result<()> {
    init_tracing();

    let options = parse_options()?;
    let kernel = options.kernel.load()?;
    let ctx = init_blocking(&options.device)?;
    println!("Parity device: {}", ctx.describe());

    let mut diverged = 0usize;
    for (label, args) in &options.cases {
        if !run_case(&ctx, &kernel, label, args, &options)? {
            diverged += 1;
        }
    }

    if diverged > 0 {
        bail!(
            "{diverged} of {} cases diverged beyond tolerance {}",
            options.cases.len(),
            options.tolerance
        );
    }
    Ok(())
}

fn parse_options() -> Result<CliOptions> {
    let mut argv = env::args();
    let program = argv.next().unwrap_or_else(|| "asg_parity".to_string());

    let mut opts = CliOptions {
        cases: Vec::new(),
        tolerance: 0.0,
        fixed_point: false,
        timing_terms: DEFAULT_TIMING_TERMS,
        device: DeviceOptions::default(),
        kernel: KernelSource::Embedded,
    };
    let mut sweep = false;
    let mut count = 32usize;
    let mut seed = 0xA11CEu64;
    let mut positionals = Vec::new();

    for arg in argv {
        if arg == "--sweep" {
            sweep = true;
        } else if let Some(value) = arg.strip_prefix("--count=") {
            count = value.parse().context("invalid --count value")?;
        } else if let Some(value) = arg.strip_prefix("--seed=") {
            seed = parse_seed(value).context("invalid --seed value")?;
        } else if let Some(value) = arg.strip_prefix("--tolerance=") {
            opts.tolerance = value.parse().context("invalid --tolerance value")?;
            if !(opts.tolerance >= 0.0) {
                bail!("--tolerance must be a non-negative number");
            }
        } else if arg == "--fixed-point" {
            opts.fixed_point = true;
        } else if let Some(value) = arg.strip_prefix("--timing-terms=") {
            opts.timing_terms = value.parse().context("invalid --timing-terms value")?;
            if opts.timing_terms == 0 {
                bail!("--timing-terms must be greater than 0");
            }
        } else if apply_device_flag(&arg, &mut opts.device, &mut opts.kernel)? {
            continue;
        } else if arg.starts_with("--") {
            bail!("unrecognized argument: {arg}");
        } else {
            positionals.push(arg);
        }
    }

    if sweep {
        if !positionals.is_empty() {
            bail!("--sweep does not take <a1> <d> <n>");
        }
        println!("Generating parity cases (random count={count}, seed=0x{seed:X})");
        opts.cases.extend(
            sequence_stress_cases()
                .into_iter()
                .enumerate()
                .map(|(idx, args)| (format!("stress_{idx}"), args)),
        );
        opts.cases.extend(
            generate_sequence_cases(count, seed)
                .into_iter()
                .enumerate()
                .map(|(idx, args)| (format!("random_0x{seed:X}_{idx}"), args)),
        );
    } else {
        let parsed = parse_args(std::iter::once(program).chain(positionals))?;
        opts.cases.push(("cli".to_string(), parsed.sequence));
    }

    Ok(opts)
}

fn run_case(
    ctx: &GpuContext,
    kernel: &LoadedKernel,
    label: &str,
    args: &SequenceArgs,
    options: &CliOptions,
) -> Result<bool> {
    tracing::debug!(label, a1 = args.a1, d = args.d, n = args.n, "running parity case");
    let serial = generate_serial(args)?;
    let gpu = run_sequence(ctx, args, kernel)
        .with_context(|| format!("device run failed for case '{label}'"))?;
    let summary = compare_sequences(&serial.values, &gpu.values, options.tolerance);

    println!("Case '{label}' (a1={}, d={}, n={}):", args.a1, args.d, args.n);
    println!("  serial time           : {:.6} s", serial.elapsed.as_secs_f64());
    println!("  device wall time      : {:.6} s", gpu.wall.as_secs_f64());
    if let Some(kernel_time) = gpu.kernel {
        println!("  kernel execution time : {:.6} s", kernel_time.as_secs_f64());
    }
    println!("  max |serial - gpu|    : {:.3e}", summary.max_abs_error);
    println!(
        "  mismatches            : {} / {} (tolerance={})",
        summary.mismatches, summary.compared, options.tolerance
    );
    if let Some((expected, actual)) = summary.length_mismatch {
        println!("  length mismatch: serial={expected}, gpu={actual}");
    }
    if let Some(idx) = summary.first_mismatch {
        println!(
            "  first mismatch #{idx}: serial={}, gpu={}",
            serial.values[idx], gpu.values[idx]
        );
    }

    if options.fixed_point {
        let comparison = compare_fixed_point(args, &serial.values, options.timing_terms)?;
        println!("{comparison}");
    }

    Ok(summary.is_match())
}

fn parse_seed(value: &str) -> Result<u64> {
    if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).context("expected hex literal")
    } else {
        value.parse().context("expected integer seed")
    }
}
