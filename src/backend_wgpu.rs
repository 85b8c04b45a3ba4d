use std::sync::{Arc, Mutex};

use wgpu::util::DeviceExt as _;

use crate::{
    backend::{AcceleratorSettings, DrawBackend, PowerPreference},
    dispatch::{DispatchGrid, KernelParams},
    foundation::core::{Dimensions, Viewport, check_raster_len},
    foundation::error::{FractaleError, FractaleResult},
    program::ENTRY_POINT,
};

/// Device, queue and compiled kernel, ready to dispatch.
///
/// Construction either fully succeeds or returns [`FractaleError::DeviceInit`]; there is no
/// partially initialized state. Dispatches are serialized through an internal submission lock,
/// so one context can be shared between threads behind an [`Arc`]. Dropping the last handle (or
/// calling [`AcceleratorContext::release`]) releases the device.
pub struct AcceleratorContext {
    adapter_info: wgpu::AdapterInfo,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    submit: Mutex<()>,
}

impl AcceleratorContext {
    #[tracing::instrument(name = "accelerator_init", skip_all)]
    pub fn new(settings: &AcceleratorSettings) -> FractaleResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: match settings.power {
                PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
                PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
            },
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| match e {
            wgpu::RequestAdapterError::NotFound { .. } => {
                FractaleError::device_init("no gpu adapter available")
            }
            other => FractaleError::device_init(format!("wgpu request_adapter failed: {other:?}")),
        })?;

        let adapter_info = adapter.get_info();
        tracing::info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            "acquired gpu adapter"
        );

        if !adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
        {
            return Err(FractaleError::device_init(format!(
                "adapter '{}' does not support compute shaders",
                adapter_info.name
            )));
        }

        let mut limits = adapter.limits();
        if let Some(cap) = settings.max_buffer_bytes {
            let cap32 = u32::try_from(cap).unwrap_or(u32::MAX);
            limits.max_buffer_size = limits.max_buffer_size.min(cap);
            limits.max_storage_buffer_binding_size =
                limits.max_storage_buffer_binding_size.min(cap32);
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("fractale_device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| FractaleError::device_init(format!("wgpu request_device failed: {e:?}")))?;

        let source = settings.kernel.load()?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fractale_mandelbrot"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let log = build_log(&pollster::block_on(module.get_compilation_info()));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fractale_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<KernelParams>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fractale_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("fractale_pipeline"),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some(ENTRY_POINT),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(FractaleError::device_init(format!(
                "unable to build kernel program: {err}\n{log}"
            )));
        }
        if !log.is_empty() {
            tracing::warn!("kernel compiled with diagnostics:\n{log}");
        }
        tracing::info!("accelerator initialized");

        Ok(Self {
            adapter_info,
            device,
            queue,
            pipeline,
            bind_group_layout,
            submit: Mutex::new(()),
        })
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Limits the device was created with.
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Largest destination buffer, in bytes, a single dispatch can allocate.
    pub fn max_raster_bytes(&self) -> u64 {
        let limits = self.device.limits();
        (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size)
    }

    /// Run the kernel over `dims` and block until the values are copied into `dest`.
    ///
    /// All failures here are [`FractaleError::Dispatch`]. `dest` is only written after a
    /// successful read-back.
    #[tracing::instrument(name = "accelerator_draw", skip_all, fields(width = dims.width, height = dims.height))]
    pub fn dispatch(
        &self,
        dest: &mut [f32],
        dims: Dimensions,
        viewport: &Viewport,
    ) -> FractaleResult<()> {
        check_raster_len(dest, dims)?;
        viewport.validate()?;

        let _submit = self
            .submit
            .lock()
            .map_err(|_| FractaleError::dispatch("submission lock poisoned"))?;

        let limits = self.device.limits();
        let size = dims.pixel_count() as u64 * std::mem::size_of::<f32>() as u64;
        if size > self.max_raster_bytes() {
            return Err(FractaleError::dispatch(format!(
                "unable to create destination buffer: {size} bytes exceeds device limits"
            )));
        }
        let params = KernelParams::new(dims, viewport);
        let grid = DispatchGrid::plan(params.total, limits.max_compute_workgroups_per_dimension)?;
        tracing::debug!(
            groups_x = grid.x,
            groups_y = grid.y,
            padding = grid.invocations() - params.total as u64,
            "dispatching"
        );

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let output = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fractale_output"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fractale_readback"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let params_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("fractale_params"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(FractaleError::dispatch(format!(
                "unable to create destination buffer: {err}"
            )));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fractale_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: output.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buf.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fractale_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("fractale_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(grid.x, grid.y, 1);
        }
        encoder.copy_buffer_to_buffer(&output, 0, &readback, 0, size);
        self.queue.submit(Some(encoder.finish()));
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(FractaleError::dispatch(format!("enqueue kernel failed: {err}")));
        }

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| FractaleError::dispatch(format!("wgpu poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| FractaleError::dispatch("readback channel closed"))?
            .map_err(|e| FractaleError::dispatch(format!("readback map failed: {e:?}")))?;

        {
            let mapped = slice.get_mapped_range();
            let values: &[f32] = bytemuck::cast_slice(&mapped);
            dest.copy_from_slice(values);
        }
        readback.unmap();
        Ok(())
    }

    /// Release the device now instead of waiting for the last handle to drop.
    pub fn release(self) {
        tracing::debug!(adapter = %self.adapter_info.name, "releasing accelerator");
        self.device.destroy();
    }
}

/// [`DrawBackend`] over a shared [`AcceleratorContext`].
#[derive(Clone)]
pub struct AcceleratorBackend {
    ctx: Arc<AcceleratorContext>,
}

impl AcceleratorBackend {
    pub fn new(ctx: Arc<AcceleratorContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<AcceleratorContext> {
        &self.ctx
    }
}

impl DrawBackend for AcceleratorBackend {
    fn name(&self) -> &'static str {
        "accelerator"
    }

    fn draw(
        &mut self,
        dest: &mut [f32],
        dims: Dimensions,
        viewport: &Viewport,
    ) -> FractaleResult<()> {
        self.ctx.dispatch(dest, dims, viewport)
    }
}

fn build_log(info: &wgpu::CompilationInfo) -> String {
    let mut out = String::new();
    for msg in &info.messages {
        #[allow(unreachable_patterns)]
        let kind = match msg.message_type {
            wgpu::CompilationMessageType::Error => "error",
            wgpu::CompilationMessageType::Warning => "warning",
            wgpu::CompilationMessageType::Info => "info",
            _ => "note",
        };
        match msg.location {
            Some(loc) => out.push_str(&format!(
                "{kind} at {}:{}: {}\n",
                loc.line_number, loc.line_position, msg.message
            )),
            None => out.push_str(&format!("{kind}: {}\n", msg.message)),
        }
    }
    out
}
