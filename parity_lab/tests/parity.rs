use std::process::Command;

use asg_core::{fixed_point::fixed_point_sequence, generate_serial, SequenceArgs};
use asg_gpu::{init_blocking, run_sequence, DeviceOptions};
use asg_shaders::LoadedKernel;
use parity_lab::{compare_sequences, generate_sequence_cases, sequence_stress_cases};

#[test]
fn serial_matches_fixed_point_on_dyadic_cases() {
    // Steps of 1/16 are exact in Q16.16; capping n keeps the accumulator well
    // inside the 16-bit integer range, so the hardware model agrees exactly.
    for case in generate_sequence_cases(16, 0x5EED) {
        let case = SequenceArgs {
            n: case.n.min(4096),
            ..case
        };
        let run = generate_serial(&case).unwrap();
        let fixed = fixed_point_sequence(case.a1, case.d, case.n);
        let summary = compare_sequences(&run.values, &fixed, 0.0);
        assert!(summary.is_match(), "{case:?}: {summary:?}");
    }
}

#[test]
fn stress_cases_cover_group_boundaries() {
    let sizes: Vec<u32> = sequence_stress_cases().iter().map(|c| c.n).collect();
    for n in [1, 63, 64, 65] {
        assert!(sizes.contains(&n), "missing n={n}");
    }
}

#[test]
fn device_matches_serial_on_stress_cases() {
    let ctx = match init_blocking(&DeviceOptions::default()) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("skipping GPU parity test: {err:#}");
            return;
        }
    };
    let kernel = LoadedKernel::embedded();
    for case in sequence_stress_cases() {
        let serial = generate_serial(&case).unwrap();
        let gpu = run_sequence(&ctx, &case, &kernel).unwrap();
        let summary = compare_sequences(&serial.values, &gpu.values, 0.0);
        assert!(summary.is_match(), "{case:?}: {summary:?}");
    }
}

#[test]
fn harness_rejects_bad_invocations_before_touching_the_device() {
    let exe = env!("CARGO_BIN_EXE_asg_parity");

    let output = Command::new(exe).args(["1", "2", "0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("'n' must be greater than 0"));

    let output = Command::new(exe)
        .args(["--sweep", "1", "2", "3"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let output = Command::new(exe)
        .args(["1", "2", "3", "--tolerance=-1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn harness_reads_kernel_and_flags_before_device_selection() {
    let exe = env!("CARGO_BIN_EXE_asg_parity");

    let output = Command::new(exe)
        .args(["1", "2", "3", "--kernel=definitely/not/here.wgsl"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load kernel file"));

    let output = Command::new(exe)
        .args(["1", "2", "3", "--fixed-point", "--timing-terms=0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--timing-terms"));
}
