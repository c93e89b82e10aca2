//! Human-readable (and JSON) run summaries printed by the benchmark binaries.

use std::{fmt, time::Duration};

use serde::Serialize;

use crate::Scalar;

/// How many leading/trailing values are echoed for spot checks.
pub const SPOT_CHECK_LEN: usize = 5;

/// Elements per microsecond, i.e. millions of elements per second.
pub fn throughput_meps(elements: usize, seconds: f64) -> f64 {
    if seconds <= 0.0 {
        return f64::INFINITY;
    }
    elements as f64 / (seconds * 1e6)
}

pub fn head(values: &[Scalar]) -> &[Scalar] {
    &values[..values.len().min(SPOT_CHECK_LEN)]
}

pub fn tail(values: &[Scalar]) -> &[Scalar] {
    &values[values.len().saturating_sub(SPOT_CHECK_LEN)..]
}

/// Two decimals per value, space separated.
pub fn format_values(values: &[Scalar]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timing {
    pub label: String,
    pub seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub implementation: String,
    pub device: Option<String>,
    pub total_elements: usize,
    pub timings: Vec<Timing>,
    pub throughput_meps: f64,
    pub first: Vec<Scalar>,
    pub last: Vec<Scalar>,
}

impl Report {
    /// Starts a report over the generated `values`; throughput stays zero
    /// until [`Report::with_throughput_from`] is called.
    pub fn new(implementation: impl Into<String>, values: &[Scalar]) -> Self {
        Self {
            implementation: implementation.into(),
            device: None,
            total_elements: values.len(),
            timings: Vec::new(),
            throughput_meps: 0.0,
            first: head(values).to_vec(),
            last: tail(values).to_vec(),
        }
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn with_timing(mut self, label: impl Into<String>, elapsed: Duration) -> Self {
        self.timings.push(Timing {
            label: label.into(),
            seconds: elapsed.as_secs_f64(),
        });
        self
    }

    pub fn with_throughput_from(mut self, elapsed: Duration) -> Self {
        self.throughput_meps = throughput_meps(self.total_elements, elapsed.as_secs_f64());
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Implementation Results:", self.implementation)?;
        if let Some(device) = &self.device {
            writeln!(f, "Device: {device}")?;
        }
        writeln!(f, "Total elements: {}", self.total_elements)?;
        for timing in &self.timings {
            writeln!(f, "{}: {:.6} seconds", timing.label, timing.seconds)?;
        }
        writeln!(
            f,
            "Throughput: {:.2} million elements/second",
            self.throughput_meps
        )?;
        writeln!(f)?;
        writeln!(f, "First 5 elements: {}", format_values(&self.first))?;
        write!(f, "Last 5 elements: {}", format_values(&self.last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ODDS: [f32; 10] = [1.0, 3.0, 5.0, 7.0, 9.0, 11.0, 13.0, 15.0, 17.0, 19.0];

    #[test]
    fn spot_checks_format_two_decimals() {
        assert_eq!(format_values(head(&ODDS)), "1.00 3.00 5.00 7.00 9.00");
        assert_eq!(format_values(tail(&ODDS)), "11.00 13.00 15.00 17.00 19.00");
    }

    #[test]
    fn short_sequences_overlap() {
        let values = [0.5, 1.5, 2.5];
        assert_eq!(head(&values), &values);
        assert_eq!(tail(&values), &values);
    }

    #[test]
    fn throughput_is_elements_per_microsecond() {
        assert_eq!(throughput_meps(2_000_000, 0.5), 4.0);
        assert_eq!(throughput_meps(10, 0.0), f64::INFINITY);
    }

    #[test]
    fn renders_serial_layout() {
        let report = Report::new("Serial", &ODDS)
            .with_timing("Total time", Duration::from_micros(2))
            .with_throughput_from(Duration::from_micros(2));
        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Serial Implementation Results:",
                "Total elements: 10",
                "Total time: 0.000002 seconds",
                "Throughput: 5.00 million elements/second",
                "",
                "First 5 elements: 1.00 3.00 5.00 7.00 9.00",
                "Last 5 elements: 11.00 13.00 15.00 17.00 19.00",
            ]
        );
    }

    #[test]
    fn json_carries_device_and_timings() {
        let report = Report::new("wgpu", &ODDS)
            .with_device("llvmpipe (Cpu, Vulkan)")
            .with_timing("Total wall time", Duration::from_millis(3))
            .with_timing("Kernel execution time", Duration::from_millis(1))
            .with_throughput_from(Duration::from_millis(1));
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["device"], "llvmpipe (Cpu, Vulkan)");
        assert_eq!(value["total_elements"], 10);
        assert_eq!(value["timings"][1]["label"], "Kernel execution time");
        assert_eq!(value["first"][0], 1.0);
    }
}
