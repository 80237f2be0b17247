use std::fmt::Write as _;

use futures::executor::block_on;
use wgpu::util::DeviceExt;
use wgpu::{
    util::BufferInitDescriptor, Adapter, Backends, BindGroupDescriptor, BindGroupEntry,
    BufferDescriptor, BufferUsages, CommandEncoderDescriptor, ComputePassDescriptor,
    ComputePipelineDescriptor, Device, DeviceDescriptor, ErrorFilter, Features, Instance,
    InstanceDescriptor, Limits, Queue, ShaderModule, ShaderModuleDescriptor, ShaderSource,
};

use crate::buffer::{AccessMode, DeviceBuffer};
use crate::config::DeviceClass;
use crate::error::{WgError, WgResult};
use crate::kernel::{Kernel, KernelArg, KernelInvocation, WorkPartition};
use crate::status;
use crate::utils::padded_buffer_size;

/// Adapter the backend runs on.
#[derive(Clone, Debug)]
pub struct DeviceInfo {
    pub name: String,
    pub device_type: wgpu::DeviceType,
    pub backend: wgpu::Backend,
}

/// A compiled kernel source.
pub struct Program {
    module: ShaderModule,
}

/// Build options: each define becomes a WGSL `const NAME: i32 = value;`
/// ahead of the source.
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    pub defines: Vec<(String, i32)>,
}

impl CompileOptions {
    pub fn define(mut self, name: impl Into<String>, value: i32) -> Self {
        self.defines.push((name.into(), value));
        self
    }

    fn apply(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len() + 32 * self.defines.len());
        for (name, value) in &self.defines {
            let _ = writeln!(out, "const {name}: i32 = {value};");
        }
        out.push_str(source);
        out
    }
}

/// Device, queue and limits for one run. Built once and passed to every
/// stage by reference.
pub struct WgBackend {
    pub device: Device,
    pub queue: Queue,
    limits: Limits,
    info: DeviceInfo,
}

impl WgBackend {
    pub async fn new_async(class: DeviceClass) -> WgResult<Self> {
        let instance = Instance::new(InstanceDescriptor::default());
        let adapter = select_platform_and_device(&instance, class)?;
        let info = adapter.get_info();
        let info = DeviceInfo {
            name: info.name,
            device_type: info.device_type,
            backend: info.backend,
        };

        // Adapter limits rather than the defaults: 32x32 work-groups exceed
        // the default invocation limit.
        let limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("wgblur device"),
                    features: Features::empty(),
                    limits: limits.clone(),
                },
                None,
            )
            .await
            .map_err(|err| {
                fatal(WgError::accel_with_detail(
                    "create_context",
                    status::DEVICE_NOT_AVAILABLE,
                    err.to_string(),
                ))
            })?;
        device.on_uncaptured_error(Box::new(|err: wgpu::Error| {
            tracing::error!(error = %err, "uncaptured wgpu error");
        }));

        tracing::debug!(
            adapter = %info.name,
            device_type = ?info.device_type,
            backend = ?info.backend,
            "created context and command queue"
        );
        Ok(Self {
            device,
            queue,
            limits,
            info,
        })
    }

    pub fn new(class: DeviceClass) -> WgResult<Self> {
        block_on(Self::new_async(class))
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Compiles kernel source. On failure the error carries the full
    /// compiler diagnostic.
    pub fn compile_program(&self, source: &str, options: &CompileOptions) -> WgResult<Program> {
        let source = options.apply(source);
        let (module, error) = self.scoped(|| {
            self.device.create_shader_module(ShaderModuleDescriptor {
                label: Some("wgblur kernels"),
                source: ShaderSource::Wgsl(source.as_str().into()),
            })
        });
        if let Some(err) = error {
            let log = error_description(&err);
            tracing::error!(
                code = status::BUILD_PROGRAM_FAILURE,
                desc = status::describe_or_default(status::BUILD_PROGRAM_FAILURE),
                "compile_program() failed"
            );
            return Err(WgError::Build {
                code: status::BUILD_PROGRAM_FAILURE,
                log,
            });
        }
        tracing::debug!(bytes = source.len(), "compiled program");
        Ok(Program { module })
    }

    pub fn allocate_buffer(
        &self,
        access: AccessMode,
        byte_len: usize,
        init: Option<&[u8]>,
    ) -> WgResult<DeviceBuffer> {
        validate_allocation(byte_len, init, self.limits.max_buffer_size)?;

        let size = padded_buffer_size(byte_len);
        let (buffer, error) = self.scoped(|| {
            let buffer = self.device.create_buffer(&BufferDescriptor {
                label: Some(access.name()),
                size,
                usage: access.usages(),
                mapped_at_creation: init.is_some(),
            });
            if let Some(data) = init {
                buffer.slice(..).get_mapped_range_mut()[..data.len()].copy_from_slice(data);
                buffer.unmap();
            }
            buffer
        });
        if let Some(err) = error {
            return Err(fatal(classify(
                "allocate_buffer",
                &err,
                status::INVALID_BUFFER_SIZE,
            )));
        }
        tracing::trace!(bytes = byte_len, access = access.name(), "allocated buffer");
        Ok(DeviceBuffer::new(buffer, byte_len, access))
    }

    /// Resolves a compute entry point of `program` by name.
    pub fn create_kernel(&self, program: &Program, name: &str) -> WgResult<Kernel> {
        let (pipeline, error) = self.scoped(|| {
            self.device
                .create_compute_pipeline(&ComputePipelineDescriptor {
                    label: Some(name),
                    layout: None,
                    module: &program.module,
                    entry_point: name,
                })
        });
        if let Some(err) = error {
            let description = error_description(&err).to_lowercase();
            let code = if description.contains("workgroup size") {
                status::INVALID_WORK_GROUP_SIZE
            } else if description.contains("entry point") {
                status::INVALID_KERNEL_NAME
            } else {
                status::INVALID_KERNEL_DEFINITION
            };
            return Err(fatal(classify("create_kernel", &err, code)));
        }
        Ok(Kernel {
            name: name.to_string(),
            pipeline,
        })
    }

    /// Queues a host-to-device transfer. Returns without waiting.
    pub fn enqueue_write(&self, buffer: &DeviceBuffer, data: &[u8]) -> WgResult<()> {
        if !buffer.access().host_writable() {
            return Err(fatal(WgError::accel("enqueue_write", status::INVALID_OPERATION)));
        }
        if data.len() > buffer.len() {
            return Err(fatal(WgError::accel("enqueue_write", status::INVALID_VALUE)));
        }
        let padded = padded_buffer_size(data.len()) as usize;
        let ((), error) = self.scoped(|| {
            if padded == data.len() {
                self.queue.write_buffer(&buffer.buffer, 0, data);
            } else {
                let mut staged = data.to_vec();
                staged.resize(padded, 0);
                self.queue.write_buffer(&buffer.buffer, 0, &staged);
            }
        });
        if let Some(err) = error {
            return Err(fatal(classify("enqueue_write", &err, status::INVALID_MEM_OBJECT)));
        }
        Ok(())
    }

    /// Binds the arguments and submits the dispatch. Returns without waiting.
    pub fn enqueue_kernel(&self, invocation: &KernelInvocation<'_>) -> WgResult<()> {
        let partition = invocation.partition;
        let (groups_x, groups_y) = self.check_partition(&partition)?;

        let bound: Vec<Bound<'_>> = invocation
            .args
            .iter()
            .map(|arg| match arg {
                KernelArg::Buffer(buffer) => Bound::Storage(&buffer.buffer),
                KernelArg::Int(value) => {
                    Bound::Uniform(self.device.create_buffer_init(&BufferInitDescriptor {
                        label: Some("kernel scalar"),
                        contents: bytemuck::bytes_of(value),
                        usage: BufferUsages::UNIFORM,
                    }))
                }
            })
            .collect();
        let entries: Vec<BindGroupEntry<'_>> = bound
            .iter()
            .enumerate()
            .map(|(index, bound)| BindGroupEntry {
                binding: index as u32,
                resource: match bound {
                    Bound::Storage(buffer) => buffer.as_entire_binding(),
                    Bound::Uniform(buffer) => buffer.as_entire_binding(),
                },
            })
            .collect();

        let pipeline = &invocation.kernel.pipeline;
        let (bind_group, error) = self.scoped(|| {
            self.device.create_bind_group(&BindGroupDescriptor {
                label: Some(invocation.kernel.name()),
                layout: &pipeline.get_bind_group_layout(0),
                entries: &entries,
            })
        });
        if let Some(err) = error {
            return Err(fatal(classify("set_kernel_args", &err, status::INVALID_KERNEL_ARGS)));
        }

        let ((), error) = self.scoped(|| {
            let mut encoder = self
                .device
                .create_command_encoder(&CommandEncoderDescriptor {
                    label: Some(invocation.kernel.name()),
                });
            {
                let mut compute_pass =
                    encoder.begin_compute_pass(&ComputePassDescriptor { label: None });
                compute_pass.set_pipeline(pipeline);
                compute_pass.set_bind_group(0, &bind_group, &[]);
                compute_pass.dispatch_workgroups(groups_x, groups_y, 1);
            }
            self.queue.submit(Some(encoder.finish()));
        });
        if let Some(err) = error {
            return Err(fatal(classify("enqueue_kernel", &err, status::INVALID_COMMAND_QUEUE)));
        }

        tracing::trace!(
            kernel = invocation.kernel.name(),
            dims = partition.dims,
            global = ?partition.global,
            local = ?partition.local,
            groups = ?(groups_x, groups_y),
            "dispatched kernel"
        );
        Ok(())
    }

    /// Reads `dst.len()` bytes back, blocking until every earlier
    /// submission on the queue has completed.
    pub fn enqueue_read_blocking(&self, buffer: &DeviceBuffer, dst: &mut [u8]) -> WgResult<()> {
        if !buffer.access().host_readable() {
            return Err(fatal(WgError::accel(
                "enqueue_read_blocking",
                status::INVALID_OPERATION,
            )));
        }
        if dst.len() != buffer.len() {
            return Err(fatal(WgError::accel(
                "enqueue_read_blocking",
                status::INVALID_VALUE,
            )));
        }
        let (result, error) = self.scoped(|| buffer.read_blocking(&self.device, &self.queue, dst));
        if let Some(err) = error {
            return Err(fatal(classify(
                "enqueue_read_blocking",
                &err,
                status::INVALID_MEM_OBJECT,
            )));
        }
        result.map_err(fatal)
    }

    /// Validates `partition` against the device limits and returns the
    /// work-group grid to dispatch.
    fn check_partition(&self, partition: &WorkPartition) -> WgResult<(u32, u32)> {
        let fail = |code| Err(fatal(WgError::accel("enqueue_kernel", code)));
        if !(1..=2).contains(&partition.dims) {
            return fail(status::INVALID_WORK_DIMENSION);
        }
        if partition.global.contains(&0) {
            return fail(status::INVALID_GLOBAL_WORK_SIZE);
        }
        let [lx, ly] = partition.local;
        if lx == 0
            || ly == 0
            || lx > self.limits.max_compute_workgroup_size_x
            || ly > self.limits.max_compute_workgroup_size_y
            || partition.invocations_per_group() > self.limits.max_compute_invocations_per_workgroup
        {
            return fail(status::INVALID_WORK_GROUP_SIZE);
        }
        match partition.dispatch_size(self.limits.max_compute_workgroups_per_dimension) {
            Some(groups) => Ok(groups),
            None => fail(status::INVALID_GLOBAL_WORK_SIZE),
        }
    }

    /// Runs `work` inside validation and out-of-memory error scopes.
    fn scoped<T>(&self, work: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
        self.device.push_error_scope(ErrorFilter::OutOfMemory);
        self.device.push_error_scope(ErrorFilter::Validation);

        let value = work();

        let validation = block_on(self.device.pop_error_scope());
        let out_of_memory = block_on(self.device.pop_error_scope());
        (value, validation.or(out_of_memory))
    }
}

enum Bound<'a> {
    Storage(&'a wgpu::Buffer),
    Uniform(wgpu::Buffer),
}

/// First adapter of the requested class, across all native backends.
fn select_platform_and_device(instance: &Instance, class: DeviceClass) -> WgResult<Adapter> {
    for adapter in instance.enumerate_adapters(Backends::all()) {
        let info = adapter.get_info();
        tracing::debug!(adapter = %info.name, device_type = ?info.device_type, backend = ?info.backend, "found adapter");
        if class.matches(info.device_type) {
            return Ok(adapter);
        }
    }
    Err(fatal(WgError::accel_with_detail(
        "select_platform_and_device",
        status::DEVICE_NOT_FOUND,
        format!("no {class:?} adapter available"),
    )))
}

/// Rejects allocations the device would refuse before touching it.
pub fn validate_allocation(byte_len: usize, init: Option<&[u8]>, max_size: u64) -> WgResult<()> {
    if byte_len == 0 {
        return Err(fatal(WgError::accel("allocate_buffer", status::INVALID_BUFFER_SIZE)));
    }
    if padded_buffer_size(byte_len) > max_size {
        return Err(fatal(WgError::accel("allocate_buffer", status::INVALID_BUFFER_SIZE)));
    }
    if init.is_some_and(|data| data.len() > byte_len) {
        return Err(fatal(WgError::accel("allocate_buffer", status::INVALID_HOST_PTR)));
    }
    Ok(())
}

fn error_description(err: &wgpu::Error) -> String {
    match err {
        wgpu::Error::Validation { description, .. } => description.clone(),
        other => other.to_string(),
    }
}

fn classify(primitive: &'static str, err: &wgpu::Error, validation_code: i32) -> WgError {
    let code = match err {
        wgpu::Error::OutOfMemory { .. } => status::MEM_OBJECT_ALLOCATION_FAILURE,
        _ => validation_code,
    };
    WgError::accel_with_detail(primitive, code, error_description(err))
}

/// Logs a backend failure with its code and description.
fn fatal(err: WgError) -> WgError {
    if let WgError::Accel {
        primitive,
        code,
        detail,
    } = &err
    {
        tracing::error!(
            primitive,
            code,
            desc = status::describe_or_default(*code),
            detail = detail.as_deref().unwrap_or(""),
            "backend primitive failed"
        );
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_allocation_is_invalid() {
        let err = validate_allocation(0, None, u64::MAX).unwrap_err();
        assert_eq!(err.code(), Some(status::INVALID_BUFFER_SIZE));
    }

    #[test]
    fn oversized_allocation_is_invalid() {
        let err = validate_allocation(1025, None, 1024).unwrap_err();
        assert_eq!(err.code(), Some(status::INVALID_BUFFER_SIZE));
        assert!(validate_allocation(1024, None, 1024).is_ok());
    }

    #[test]
    fn initial_data_must_fit() {
        let err = validate_allocation(3, Some(&[1, 2, 3, 4]), u64::MAX).unwrap_err();
        assert_eq!(err.code(), Some(status::INVALID_HOST_PTR));
        assert!(validate_allocation(4, Some(&[1, 2, 3]), u64::MAX).is_ok());
    }

    #[test]
    fn defines_are_prepended_as_constants() {
        let options = CompileOptions::default().define("GAUSS_DIM", 5).define("LOCAL", 64);
        let src = options.apply("fn f() {}\n");
        assert_eq!(
            src,
            "const GAUSS_DIM: i32 = 5;\nconst LOCAL: i32 = 64;\nfn f() {}\n"
        );
    }
}
