use futures::channel::oneshot;
use futures::executor::block_on;
use wgpu::{Buffer, BufferDescriptor, BufferUsages, CommandEncoderDescriptor, Device, Queue};

use crate::error::{WgError, WgResult};
use crate::status;
use crate::utils::padded_buffer_size;

/// How a kernel accesses a device buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    /// Written by the host, read by kernels.
    ReadOnly,
    /// Written by kernels, read back by the host.
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    pub(crate) fn usages(self) -> BufferUsages {
        match self {
            AccessMode::ReadOnly => BufferUsages::STORAGE | BufferUsages::COPY_DST,
            AccessMode::WriteOnly => BufferUsages::STORAGE | BufferUsages::COPY_SRC,
            AccessMode::ReadWrite => {
                BufferUsages::STORAGE | BufferUsages::COPY_DST | BufferUsages::COPY_SRC
            }
        }
    }

    pub fn host_writable(self) -> bool {
        self != AccessMode::WriteOnly
    }

    pub fn host_readable(self) -> bool {
        self != AccessMode::ReadOnly
    }

    pub fn name(self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "read-only",
            AccessMode::WriteOnly => "write-only",
            AccessMode::ReadWrite => "read-write",
        }
    }
}

/// Accelerator memory of a fixed logical length.
///
/// The allocation is padded to the copy alignment; only `len()` bytes are
/// ever transferred.
pub struct DeviceBuffer {
    pub(crate) buffer: Buffer,
    len: usize,
    access: AccessMode,
}

impl DeviceBuffer {
    pub(crate) fn new(buffer: Buffer, len: usize, access: AccessMode) -> Self {
        Self {
            buffer,
            len,
            access,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    /// Frees the device memory now instead of at drop.
    pub fn release(self) {
        self.buffer.destroy();
    }

    /// Copies the buffer into `dst`, blocking until the queue has drained.
    pub(crate) fn read_blocking(&self, device: &Device, queue: &Queue, dst: &mut [u8]) -> WgResult<()> {
        let padded = padded_buffer_size(self.len);
        let staging = device.create_buffer(&BufferDescriptor {
            label: Some("readback staging"),
            size: padded,
            usage: BufferUsages::COPY_DST | BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("readback"),
        });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging, 0, padded);
        queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device.poll(wgpu::Maintain::Wait);

        match block_on(receiver) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                return Err(WgError::accel_with_detail(
                    "enqueue_read_blocking",
                    status::MAP_FAILURE,
                    err.to_string(),
                ))
            }
            Err(_) => {
                return Err(WgError::accel_with_detail(
                    "enqueue_read_blocking",
                    status::MAP_FAILURE,
                    "map callback dropped",
                ))
            }
        }

        {
            let mapped = slice.get_mapped_range();
            dst.copy_from_slice(&mapped[..dst.len()]);
        }
        staging.unmap();
        staging.destroy();
        Ok(())
    }
}
