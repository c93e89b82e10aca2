//! Adapter discovery and device creation.
//!
//! GPU-class adapters win over CPU (software) adapters; a CPU adapter is only
//! used when no GPU is exposed by the selected backends.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use wgpu::{
    Adapter, AdapterInfo, Backends, Device, DeviceDescriptor, DeviceType, Features, Instance,
    InstanceDescriptor, Queue,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DevicePreference {
    /// Best GPU, falling back to a CPU adapter.
    #[default]
    Auto,
    Gpu,
    Cpu,
}

impl FromStr for DevicePreference {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "gpu" => Ok(Self::Gpu),
            "cpu" => Ok(Self::Cpu),
            other => bail!("unknown device preference '{other}' (expected auto, gpu or cpu)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Gpu,
    Cpu,
}

/// Unknown (`Other`) adapters are treated as GPUs; several backends report real
/// hardware that way.
pub fn device_class(device_type: DeviceType) -> DeviceClass {
    match device_type {
        DeviceType::Cpu => DeviceClass::Cpu,
        _ => DeviceClass::Gpu,
    }
}

fn rank(device_type: DeviceType) -> u8 {
    match device_type {
        DeviceType::DiscreteGpu => 0,
        DeviceType::IntegratedGpu => 1,
        DeviceType::VirtualGpu => 2,
        DeviceType::Cpu => 4,
        _ => 3,
    }
}

/// Index of the adapter to use, or `None` when nothing satisfies `preference`.
/// Ties keep enumeration order.
pub fn pick_adapter(device_types: &[DeviceType], preference: DevicePreference) -> Option<usize> {
    device_types
        .iter()
        .enumerate()
        .filter(|(_, &device_type)| match preference {
            DevicePreference::Auto => true,
            DevicePreference::Gpu => device_class(device_type) == DeviceClass::Gpu,
            DevicePreference::Cpu => device_class(device_type) == DeviceClass::Cpu,
        })
        .min_by_key(|(index, &device_type)| (rank(device_type), *index))
        .map(|(index, _)| index)
}

#[derive(Debug, Clone)]
pub struct DeviceOptions {
    pub preference: DevicePreference,
    pub backends: Backends,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            preference: DevicePreference::Auto,
            backends: Backends::all(),
        }
    }
}

/// Parses a `vulkan,metal,dx12,gl` style list.
pub fn parse_backends(list: &str) -> Result<Backends> {
    let backends = Backends::from_comma_list(list);
    if backends.is_empty() {
        bail!("no known wgpu backend in '{list}'");
    }
    Ok(backends)
}

pub struct GpuContext {
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
    pub info: AdapterInfo,
    /// Whether the device was created with `TIMESTAMP_QUERY`.
    pub timestamps: bool,
}

impl GpuContext {
    pub fn is_cpu_fallback(&self) -> bool {
        device_class(self.info.device_type) == DeviceClass::Cpu
    }

    /// `name (type, backend)` line used in reports.
    pub fn describe(&self) -> String {
        format!(
            "{} ({:?}, {:?})",
            self.info.name, self.info.device_type, self.info.backend
        )
    }
}

/// Enumerates adapters on the requested backends, applies the selection policy,
/// and opens a device with timestamp queries when the adapter supports them.
pub async fn init(options: &DeviceOptions) -> Result<GpuContext> {
    let instance = Instance::new(&InstanceDescriptor {
        backends: options.backends,
        ..Default::default()
    });

    let mut adapters = instance.enumerate_adapters(options.backends);
    for adapter in &adapters {
        let info = adapter.get_info();
        tracing::debug!(
            name = %info.name,
            device_type = ?info.device_type,
            backend = ?info.backend,
            "found adapter"
        );
    }

    let device_types: Vec<DeviceType> = adapters
        .iter()
        .map(|adapter| adapter.get_info().device_type)
        .collect();
    let index = pick_adapter(&device_types, options.preference).ok_or_else(|| {
        anyhow!(
            "no compatible {} adapter found ({} adapters enumerated)",
            match options.preference {
                DevicePreference::Auto => "GPU or CPU",
                DevicePreference::Gpu => "GPU",
                DevicePreference::Cpu => "CPU",
            },
            device_types.len()
        )
    })?;
    let adapter = adapters.swap_remove(index);
    let info = adapter.get_info();

    let timestamps = adapter.features().contains(Features::TIMESTAMP_QUERY);
    if !timestamps {
        tracing::warn!(
            adapter = %info.name,
            "adapter lacks timestamp queries; kernel execution time will not be reported"
        );
    }
    let required_features = if timestamps {
        Features::TIMESTAMP_QUERY
    } else {
        Features::empty()
    };

    let (device, queue) = adapter
        .request_device(&DeviceDescriptor {
            label: Some("asg_device"),
            required_features,
            required_limits: adapter.limits(),
            ..Default::default()
        })
        .await
        .context("failed to request wgpu device")?;

    tracing::info!(
        adapter = %info.name,
        device_type = ?info.device_type,
        backend = ?info.backend,
        timestamps,
        "selected adapter"
    );

    Ok(GpuContext {
        adapter,
        device,
        queue,
        info,
        timestamps,
    })
}

pub fn init_blocking(options: &DeviceOptions) -> Result<GpuContext> {
    pollster::block_on(init(options))
}
