use crate::buffer::AccessMode;
use crate::config::GRAYSCALE_LOCAL_SIZE;
use crate::context::{Program, WgBackend};
use crate::error::WgResult;
use crate::image_context::{ImageContext, ImageKind};
use crate::kernel::{int_arg, KernelInvocation, WorkPartition};

/// Work partition of the grayscale stage: one invocation per pixel in
/// groups of `local_size` (64 by default). `pixel_count` need not be a
/// multiple of the group size.
pub fn work_partition_grayscale(pixel_count: u32, local_size: u32) -> WorkPartition {
    WorkPartition::one_d(pixel_count, local_size)
}

/// Converts three color planes to one luma plane on the device.
pub struct GrayScale<'a> {
    backend: &'a WgBackend,
    program: &'a Program,
    entry_point: &'a str,
    local_size: u32,
}

impl<'a> GrayScale<'a> {
    pub fn new(backend: &'a WgBackend, program: &'a Program, entry_point: &'a str) -> Self {
        GrayScale {
            backend,
            program,
            entry_point,
            local_size: GRAYSCALE_LOCAL_SIZE,
        }
    }

    pub fn with_local_size(mut self, local_size: u32) -> Self {
        self.local_size = local_size;
        self
    }

    pub fn run(&self, rgb: &ImageContext, gray: &mut ImageContext) -> WgResult<()> {
        rgb.expect_kind(ImageKind::Rgb)?;
        gray.expect_kind(ImageKind::Grayscale)?;
        rgb.expect_same_size(gray)?;

        let backend = self.backend;
        let len = rgb.pixel_count();
        let pixel_count = int_arg(len)?;
        let partition = work_partition_grayscale(pixel_count as u32, self.local_size);
        let planes = rgb.rgb()?;

        let kernel = backend.create_kernel(self.program, self.entry_point)?;

        let r = backend.allocate_buffer(AccessMode::ReadWrite, len, None)?;
        let g = backend.allocate_buffer(AccessMode::ReadWrite, len, None)?;
        let b = backend.allocate_buffer(AccessMode::ReadWrite, len, None)?;
        let out = backend.allocate_buffer(AccessMode::WriteOnly, len, None)?;

        let invocation = KernelInvocation::new(&kernel, partition)
            .arg_buffer(&r)
            .arg_buffer(&g)
            .arg_buffer(&b)
            .arg_buffer(&out)
            .arg_int(pixel_count);

        backend.enqueue_write(&r, planes.r)?;
        backend.enqueue_write(&g, planes.g)?;
        backend.enqueue_write(&b, planes.b)?;

        backend.enqueue_kernel(&invocation)?;
        tracing::debug!(
            pixels = len,
            global = len,
            local = self.local_size,
            "grayscale dispatched"
        );

        backend.enqueue_read_blocking(&out, gray.gray_mut()?)?;

        drop(invocation);
        r.release();
        g.release();
        b.release();
        out.release();
        kernel.release();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_does_not_round_global_size() {
        let p = work_partition_grayscale(1000, GRAYSCALE_LOCAL_SIZE);
        assert_eq!(p.dims, 1);
        assert_eq!(p.global[0], 1000);
        assert_eq!(p.local[0], 64);
        assert_eq!(p.work_group_count().0, 16);
    }

    #[test]
    fn partition_follows_configured_local_size() {
        let p = work_partition_grayscale(1000, 128);
        assert_eq!(p.global, [1000, 1]);
        assert_eq!(p.local, [128, 1]);
        assert_eq!(p.work_group_count(), (8, 1));
    }
}
