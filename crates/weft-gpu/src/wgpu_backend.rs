//! wgpu compute backend.
//!
//! Runs the WGSL kernels in `shaders/spring.wgsl`. Every dispatch writes
//! the node array, runs one compute pass, copies the outputs into a
//! staging buffer and waits on that submission until the staging buffer
//! is mapped and read back.

use std::sync::mpsc;

use tracing::{info, trace, warn};
use wgpu::util::DeviceExt;
use weft_types::{WeftError, WeftResult};

use crate::backend::{check_dispatch, GpuBackend};
use crate::buffers::{ColliderSet, GpuDamper, GpuNode, NodeOutput, SimParams};
use crate::kernels::{workgroup_count, Kernel};

const SHADER_SOURCE: &str = include_str!("../shaders/spring.wgsl");

struct Device {
    device: wgpu::Device,
    queue: wgpu::Queue,
    layout: wgpu::BindGroupLayout,
    spring_force: wgpu::ComputePipeline,
    resolve_collisions: wgpu::ComputePipeline,
    adapter_name: String,
}

struct TopologyBuffers {
    node_count: usize,
    params: wgpu::Buffer,
    nodes: wgpu::Buffer,
    dampers: wgpu::Buffer,
    outputs: wgpu::Buffer,
    staging: wgpu::Buffer,
}

/// GPU compute via wgpu.
#[derive(Default)]
pub struct WgpuBackend {
    device: Option<Device>,
    buffers: Option<TopologyBuffers>,
}

impl WgpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the adapter picked by `init`, if initialized.
    pub fn adapter_name(&self) -> Option<&str> {
        self.device.as_ref().map(|d| d.adapter_name.as_str())
    }

    fn device(&self) -> WeftResult<&Device> {
        self.device
            .as_ref()
            .ok_or_else(|| WeftError::Gpu("wgpu backend used before init".into()))
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Outcome of mapping the staging buffer, as seen after the device poll.
fn readback_status(
    received: Result<Result<(), wgpu::BufferAsyncError>, mpsc::TryRecvError>,
) -> WeftResult<()> {
    match received {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(WeftError::Gpu(format!("readback map failed: {e}"))),
        Err(mpsc::TryRecvError::Empty) => Err(WeftError::Gpu(
            "device poll returned before the readback was mapped".into(),
        )),
        Err(mpsc::TryRecvError::Disconnected) => {
            Err(WeftError::Gpu("readback callback dropped".into()))
        }
    }
}

fn byte_size<T>(count: usize) -> u64 {
    (count.max(1) * std::mem::size_of::<T>()) as u64
}

impl GpuBackend for WgpuBackend {
    fn init(&mut self) -> WeftResult<()> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| WeftError::Gpu("no compatible GPU adapter".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("weft device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| WeftError::Gpu(format!("request_device failed: {e}")))?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("spring shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("spring bind group layout"),
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
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
                storage_entry(4, true),
                storage_entry(5, true),
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("spring pipeline layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = |kernel: Kernel| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(kernel.entry_point()),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some(kernel.entry_point()),
                compilation_options: Default::default(),
                cache: None,
            })
        };
        let spring_force = pipeline(Kernel::SpringForce);
        let resolve_collisions = pipeline(Kernel::ResolveCollisions);

        let adapter_name = adapter.get_info().name;
        info!(adapter = %adapter_name, "wgpu backend initialized");
        self.device = Some(Device {
            device,
            queue,
            layout,
            spring_force,
            resolve_collisions,
            adapter_name,
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "wgpu"
    }

    fn is_gpu(&self) -> bool {
        true
    }

    fn upload_topology(&mut self, node_count: usize, dampers: &[GpuDamper]) -> WeftResult<()> {
        let gpu = self.device()?;
        let device = &gpu.device;

        // Storage bindings may not be empty.
        let damper_records: Vec<GpuDamper> = if dampers.is_empty() {
            vec![GpuDamper::default()]
        } else {
            dampers.to_vec()
        };

        let buffers = TopologyBuffers {
            node_count,
            params: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("sim params"),
                size: byte_size::<SimParams>(1),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            nodes: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("nodes"),
                size: byte_size::<GpuNode>(node_count),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            dampers: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("dampers"),
                contents: bytemuck::cast_slice(&damper_records),
                usage: wgpu::BufferUsages::STORAGE,
            }),
            outputs: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("node outputs"),
                size: byte_size::<NodeOutput>(node_count),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            }),
            staging: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("node output staging"),
                size: byte_size::<NodeOutput>(node_count),
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
        };
        self.buffers = Some(buffers);
        Ok(())
    }

    fn dispatch(
        &mut self,
        kernel: Kernel,
        params: &SimParams,
        nodes: &[GpuNode],
        colliders: &ColliderSet,
        out: &mut [NodeOutput],
    ) -> WeftResult<()> {
        check_dispatch(params, nodes, colliders, out)?;
        let gpu = self.device()?;
        let buffers = self
            .buffers
            .as_ref()
            .ok_or_else(|| WeftError::Gpu("dispatch before upload_topology".into()))?;
        if buffers.node_count != nodes.len() {
            return Err(WeftError::Gpu(format!(
                "topology has {} nodes, dispatch got {}",
                buffers.node_count,
                nodes.len()
            )));
        }
        if nodes.is_empty() {
            return Ok(());
        }

        let device = &gpu.device;
        gpu.queue
            .write_buffer(&buffers.params, 0, bytemuck::bytes_of(params));
        gpu.queue
            .write_buffer(&buffers.nodes, 0, bytemuck::cast_slice(nodes));

        let spheres = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere colliders"),
            contents: bytemuck::cast_slice(&colliders.spheres),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let cuboids = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cuboid colliders"),
            contents: bytemuck::cast_slice(&colliders.cuboids),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("spring bind group"),
            layout: &gpu.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffers.nodes.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffers.dampers.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: buffers.outputs.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: spheres.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: cuboids.as_entire_binding(),
                },
            ],
        });

        let pipeline = match kernel {
            Kernel::SpringForce => &gpu.spring_force,
            Kernel::ResolveCollisions => &gpu.resolve_collisions,
        };
        let groups = workgroup_count(nodes.len());
        let output_bytes = byte_size::<NodeOutput>(nodes.len());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(kernel.entry_point()),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(kernel.entry_point()),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&buffers.outputs, 0, &buffers.staging, 0, output_bytes);
        let submission = gpu.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffers.staging.slice(..output_bytes);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            if tx.send(result).is_err() {
                warn!("readback mapped after its dispatch gave up");
            }
        });
        let status = device.poll(wgpu::Maintain::wait_for(submission));
        trace!(queue_empty = status.is_queue_empty(), "device polled");
        readback_status(rx.try_recv())?;
        {
            let data = slice.get_mapped_range();
            out.copy_from_slice(bytemuck::cast_slice(&data));
        }
        buffers.staging.unmap();

        trace!(kernel = kernel.entry_point(), groups, "wgpu dispatch");
        Ok(())
    }

    fn release(&mut self) {
        if let Some(buffers) = self.buffers.take() {
            buffers.params.destroy();
            buffers.nodes.destroy();
            buffers.dampers.destroy();
            buffers.outputs.destroy();
            buffers.staging.destroy();
        }
    }
}
