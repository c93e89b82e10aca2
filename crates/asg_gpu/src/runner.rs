use std::{
    borrow::Cow,
    sync::mpsc,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use asg_core::{DispatchPlan, Scalar, SequenceArgs};
use asg_shaders::{compute, LoadedKernel};
use wgpu::util::DeviceExt;

use crate::device::GpuContext;

/// Matches `SequenceParams` in arithmetic_sequence.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SequenceParams {
    a1: f32,
    d: f32,
    n: u32,
    row_stride: u32,
}

const TIMESTAMP_COUNT: u32 = 2;
const TIMESTAMP_BYTES: u64 = TIMESTAMP_COUNT as u64 * wgpu::QUERY_SIZE as u64;

#[derive(Debug, Clone)]
pub struct GpuRun {
    pub values: Vec<Scalar>,
    pub plan: DispatchPlan,
    /// Submission to completion, as seen by the host.
    pub wall: Duration,
    /// Device timestamps around the compute pass, when the adapter supports them.
    pub kernel: Option<Duration>,
}

impl GpuRun {
    /// Duration used for throughput: device time when known, else wall time.
    pub fn throughput_basis(&self) -> Duration {
        self.kernel.unwrap_or(self.wall)
    }
}

pub async fn run_sequence_async(
    ctx: &GpuContext,
    args: &SequenceArgs,
    kernel: &LoadedKernel,
) -> Result<GpuRun> {
    let device = &ctx.device;
    let limits = device.limits();

    let output_size = u64::from(args.n) * std::mem::size_of::<Scalar>() as u64;
    let binding_limit =
        u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
    if output_size > binding_limit {
        bail!(
            "output buffer of {output_size} bytes exceeds the device limit of {binding_limit} bytes"
        );
    }

    let plan = DispatchPlan::new(args.n, limits.max_compute_workgroups_per_dimension)?;
    tracing::debug!(
        elements = plan.elements,
        workgroup_size = plan.workgroup_size,
        global_size = plan.global_size(),
        grid = ?plan.grid,
        "dispatch plan"
    );

    let built = kernel.build(plan.workgroup_size)?;

    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let params = SequenceParams {
        a1: args.a1,
        d: args.d,
        n: args.n,
        row_stride: plan.row_stride,
    };
    let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("SequenceParams"),
        contents: bytemuck::bytes_of(&params),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("SequenceOutput"),
        size: output_size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });
    let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("SequenceStaging"),
        size: output_size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let timestamps = ctx.timestamps.then(|| TimestampQueries::new(device));
    if let Some(err) = device.pop_error_scope().await {
        bail!("failed to allocate device buffers: {err}");
    }

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("SequenceBindGroupLayout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("SequenceBindGroup"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: output_buffer.as_entire_binding(),
            },
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("SequencePipelineLayout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("ArithmeticSequenceShader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(built.source)),
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("ArithmeticSequencePipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some(compute::ENTRY_POINT),
        compilation_options: Default::default(),
        cache: None,
    });
    if let Some(err) = device.pop_error_scope().await {
        bail!("Kernel build error:\n{err}");
    }

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("SequenceDispatchEncoder"),
    });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("SequencePass"),
            timestamp_writes: timestamps.as_ref().map(TimestampQueries::pass_writes),
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        let [x, y, z] = plan.grid;
        pass.dispatch_workgroups(x, y, z);
    }
    if let Some(queries) = &timestamps {
        queries.resolve(&mut encoder);
    }

    let start = Instant::now();
    ctx.queue.submit(Some(encoder.finish()));
    device
        .poll(wgpu::PollType::Wait)
        .context("failed waiting for kernel completion")?;
    let wall = start.elapsed();

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("SequenceReadbackEncoder"),
    });
    encoder.copy_buffer_to_buffer(&output_buffer, 0, &staging_buffer, 0, output_size);
    if let Some(queries) = &timestamps {
        queries.copy_to_readback(&mut encoder);
    }
    ctx.queue.submit(Some(encoder.finish()));

    let values: Vec<Scalar> = map_read(device, &staging_buffer).context("reading output buffer")?;
    let kernel = match &timestamps {
        Some(queries) => queries.elapsed(ctx)?,
        None => None,
    };

    Ok(GpuRun {
        values,
        plan,
        wall,
        kernel,
    })
}

pub fn run_sequence(
    ctx: &GpuContext,
    args: &SequenceArgs,
    kernel: &LoadedKernel,
) -> Result<GpuRun> {
    pollster::block_on(run_sequence_async(ctx, args, kernel))
}

/// Begin/end timestamps written around the compute pass.
struct TimestampQueries {
    set: wgpu::QuerySet,
    resolve: wgpu::Buffer,
    readback: wgpu::Buffer,
}

impl TimestampQueries {
    fn new(device: &wgpu::Device) -> Self {
        Self {
            set: device.create_query_set(&wgpu::QuerySetDescriptor {
                label: Some("SequenceTimestamps"),
                ty: wgpu::QueryType::Timestamp,
                count: TIMESTAMP_COUNT,
            }),
            resolve: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("SequenceTimestampResolve"),
                size: TIMESTAMP_BYTES,
                usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            }),
            readback: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("SequenceTimestampReadback"),
                size: TIMESTAMP_BYTES,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
        }
    }

    fn pass_writes(&self) -> wgpu::ComputePassTimestampWrites<'_> {
        wgpu::ComputePassTimestampWrites {
            query_set: &self.set,
            beginning_of_pass_write_index: Some(0),
            end_of_pass_write_index: Some(1),
        }
    }

    fn resolve(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.resolve_query_set(&self.set, 0..TIMESTAMP_COUNT, &self.resolve, 0);
    }

    fn copy_to_readback(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_buffer_to_buffer(&self.resolve, 0, &self.readback, 0, TIMESTAMP_BYTES);
    }

    fn elapsed(&self, ctx: &GpuContext) -> Result<Option<Duration>> {
        let ticks: Vec<u64> = map_read(&ctx.device, &self.readback).context("reading timestamps")?;
        let period = ctx.queue.get_timestamp_period();
        Ok(ticks_to_duration(ticks[0], ticks[1], period))
    }
}

/// Converts a begin/end tick pair to wall time. Drivers that do not actually
/// record timestamps leave both at zero (or out of order); that yields `None`.
fn ticks_to_duration(begin: u64, end: u64, period_ns: f32) -> Option<Duration> {
    if end <= begin || period_ns <= 0.0 {
        tracing::warn!(begin, end, period_ns, "device timestamps unusable");
        return None;
    }
    let nanos = (end - begin) as f64 * f64::from(period_ns);
    Some(Duration::from_nanos(nanos.round() as u64))
}

fn map_read<T: bytemuck::Pod>(device: &wgpu::Device, buffer: &wgpu::Buffer) -> Result<Vec<T>> {
    let slice = buffer.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device
        .poll(wgpu::PollType::Wait)
        .context("failed waiting for buffer mapping")?;
    receiver
        .recv()
        .context("buffer mapping callback never ran")?
        .context("failed to map buffer for reading")?;

    let data = slice.get_mapped_range();
    let values: Vec<T> = bytemuck::cast_slice::<u8, T>(&data).to_vec();
    drop(data);
    buffer.unmap();
    Ok(values)
}
