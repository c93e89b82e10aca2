//! Centralized storage for the WGSL kernel and the helpers that turn it into a validated module.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use naga::valid::{Capabilities, ValidationFlags, Validator};
use thiserror::Error;

pub mod compute {
    pub const ARITHMETIC_SEQUENCE: &str = include_str!("kernels/arithmetic_sequence.wgsl");
    pub const ENTRY_POINT: &str = "asg_parallel";
}

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("Failed to load kernel file {path}")]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Kernel build error:\n{log}")]
    Build { log: String },
    #[error("kernel has no compute entry point named '{0}'")]
    MissingEntryPoint(String),
    #[error("kernel entry point declares workgroup size {declared:?}, expected [{expected}, 1, 1]")]
    WorkgroupMismatch { declared: [u32; 3], expected: u32 },
}

/// Where the kernel text comes from. The embedded copy is compiled into the binary
/// so the benchmark does not depend on the working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KernelSource {
    #[default]
    Embedded,
    File(PathBuf),
}

impl KernelSource {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    /// Reads the kernel text. Binaries call this before touching any device so a
    /// bad `--kernel` path fails the same way on every host.
    pub fn load(&self) -> Result<LoadedKernel, KernelError> {
        let source = match self {
            Self::Embedded => compute::ARITHMETIC_SEQUENCE.to_string(),
            Self::File(path) => fs::read_to_string(path).map_err(|source| KernelError::Load {
                path: path.clone(),
                source,
            })?,
        };
        tracing::debug!(kernel = %self, bytes = source.len(), "kernel source loaded");
        Ok(LoadedKernel {
            label: self.to_string(),
            source,
        })
    }
}

/// Kernel text plus the label its diagnostics are reported against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedKernel {
    pub label: String,
    pub source: String,
}

impl LoadedKernel {
    pub fn embedded() -> Self {
        Self {
            label: KernelSource::Embedded.to_string(),
            source: compute::ARITHMETIC_SEQUENCE.to_string(),
        }
    }

    pub fn build(&self, workgroup_size: u32) -> Result<BuiltKernel, KernelError> {
        build(&self.label, &self.source, workgroup_size)
    }
}

impl fmt::Display for KernelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => f.write_str("embedded arithmetic_sequence.wgsl"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Prepends the `WORKGROUP_SIZE` constant the kernel's `@workgroup_size` refers to.
pub fn specialize(source: &str, workgroup_size: u32) -> String {
    format!("const WORKGROUP_SIZE: u32 = {workgroup_size}u;\n\n{source}")
}

/// A specialized kernel that parsed and validated cleanly.
#[derive(Debug)]
pub struct BuiltKernel {
    pub source: String,
    pub module: naga::Module,
}

/// Specializes `source` for `workgroup_size`, then parses and validates it.
///
/// Failures carry the full diagnostic text, rendered against the specialized source.
pub fn build(label: &str, source: &str, workgroup_size: u32) -> Result<BuiltKernel, KernelError> {
    let source = specialize(source, workgroup_size);

    let module = naga::front::wgsl::parse_str(&source).map_err(|err| KernelError::Build {
        log: err.emit_to_string_with_path(&source, label),
    })?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    validator
        .validate(&module)
        .map_err(|err| KernelError::Build {
            log: err.emit_to_string_with_path(&source, label),
        })?;

    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga::ShaderStage::Compute && ep.name == compute::ENTRY_POINT)
        .ok_or_else(|| KernelError::MissingEntryPoint(compute::ENTRY_POINT.to_string()))?;
    if entry.workgroup_size != [workgroup_size, 1, 1] {
        return Err(KernelError::WorkgroupMismatch {
            declared: entry.workgroup_size,
            expected: workgroup_size,
        });
    }

    tracing::debug!(label, workgroup_size, "kernel validated");
    Ok(BuiltKernel { source, module })
}
