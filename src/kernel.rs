//! Kernel handles, bound arguments and work partitions.

use wgpu::ComputePipeline;

use crate::buffer::DeviceBuffer;
use crate::error::{WgError, WgResult};
use crate::status;
use crate::utils::compute_work_group_count;

/// A compute entry point resolved from a compiled program.
pub struct Kernel {
    pub(crate) name: String,
    pub(crate) pipeline: ComputePipeline,
}

impl Kernel {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Releases the kernel handle.
    pub fn release(self) {}
}

/// One kernel argument. Argument `i` binds to `@group(0) @binding(i)`.
#[derive(Clone, Copy)]
pub enum KernelArg<'a> {
    Buffer(&'a DeviceBuffer),
    /// Scalar, staged as a 4-byte uniform.
    Int(i32),
}

/// Iteration space of a dispatch: `dims` axes of `global` items, scheduled
/// in groups of `local` items. Unused axes hold 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkPartition {
    pub dims: u32,
    pub global: [u32; 2],
    pub local: [u32; 2],
}

impl WorkPartition {
    pub fn one_d(global: u32, local: u32) -> Self {
        Self {
            dims: 1,
            global: [global, 1],
            local: [local, 1],
        }
    }

    pub fn two_d(global: [u32; 2], local: [u32; 2]) -> Self {
        Self {
            dims: 2,
            global,
            local,
        }
    }

    /// Work-groups dispatched per axis. Partial groups at the end of an
    /// axis are dispatched whole, so kernels must bounds-check.
    pub fn work_group_count(&self) -> (u32, u32) {
        compute_work_group_count(
            (self.global[0], self.global[1]),
            (self.local[0], self.local[1]),
        )
    }

    /// Work-groups to dispatch along x and y, given the device's
    /// per-dimension group limit.
    ///
    /// A one-dimensional partition whose group count exceeds the limit is
    /// folded into a grid of `x * y >= groups`; kernels recover the linear
    /// index from `num_workgroups`. Returns `None` when no grid fits.
    pub fn dispatch_size(&self, max_groups: u32) -> Option<(u32, u32)> {
        let (gx, gy) = self.work_group_count();
        if gx <= max_groups && gy <= max_groups {
            return Some((gx, gy));
        }
        if self.dims != 1 || max_groups == 0 {
            return None;
        }
        let rows = gx.div_ceil(max_groups);
        let cols = gx.div_ceil(rows);
        (rows <= max_groups).then_some((cols, rows))
    }

    pub fn invocations_per_group(&self) -> u32 {
        self.local[0] * self.local[1]
    }
}

/// Converts a host size into an `i32` scalar argument.
pub fn int_arg(value: usize) -> WgResult<i32> {
    i32::try_from(value).map_err(|_| WgError::accel("set_kernel_args", status::INVALID_ARG_VALUE))
}

/// A kernel with its bound argument list and dispatch shape.
pub struct KernelInvocation<'a> {
    pub kernel: &'a Kernel,
    pub args: Vec<KernelArg<'a>>,
    pub partition: WorkPartition,
}

impl<'a> KernelInvocation<'a> {
    pub fn new(kernel: &'a Kernel, partition: WorkPartition) -> Self {
        Self {
            kernel,
            args: Vec::new(),
            partition,
        }
    }

    pub fn arg_buffer(mut self, buffer: &'a DeviceBuffer) -> Self {
        self.args.push(KernelArg::Buffer(buffer));
        self
    }

    pub fn arg_int(mut self, value: i32) -> Self {
        self.args.push(KernelArg::Int(value));
        self
    }
}
