use crate::buffer::{AccessMode, DeviceBuffer};
use crate::config::GAUSSIAN_BLUR_LOCAL_SIZE;
use crate::context::{Program, WgBackend};
use crate::error::{WgError, WgResult};
use crate::image_context::{ImageContext, ImageKind};
use crate::kernel::{int_arg, Kernel, KernelInvocation, WorkPartition};

/// Work partition of the blur stage. Dimension 0 walks rows and dimension 1
/// walks columns; the kernel indexes pixels in that order.
pub fn work_partition_blur(width: u32, height: u32, local_size: [u32; 2]) -> WorkPartition {
    WorkPartition::two_d([height, width], local_size)
}

/// Square integer convolution weights with their normalization sum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GaussianKernel {
    dim: u32,
    weights: Vec<i32>,
    sum: i32,
}

const GAUSS_5X5: [i32; 25] = [
    1, 4, 7, 4, 1, //
    4, 16, 26, 16, 4, //
    7, 26, 41, 26, 7, //
    4, 16, 26, 16, 4, //
    1, 4, 7, 4, 1,
];

impl GaussianKernel {
    pub fn new(dim: u32, weights: Vec<i32>) -> WgResult<Self> {
        if dim == 0 || dim % 2 == 0 {
            return Err(WgError::kernel(format!("dimension {dim} must be odd")));
        }
        let expected = dim as usize * dim as usize;
        if weights.len() != expected {
            return Err(WgError::kernel(format!(
                "{} weights for a {dim}x{dim} kernel, expected {expected}",
                weights.len()
            )));
        }
        let sum = weights
            .iter()
            .try_fold(0i32, |acc, &w| acc.checked_add(w))
            .ok_or_else(|| WgError::kernel("weight sum overflows"))?;
        if sum <= 0 {
            return Err(WgError::kernel(format!("weight sum {sum} must be positive")));
        }
        // The convolution accumulates `w * sample + sum / 2` in i32.
        let magnitude: i64 = weights.iter().map(|&w| i64::from(w).abs()).sum();
        if magnitude * 255 + i64::from(sum / 2) > i64::from(i32::MAX) {
            return Err(WgError::kernel(format!(
                "weights of magnitude {magnitude} overflow a 32-bit accumulator"
            )));
        }
        Ok(Self { dim, weights, sum })
    }

    /// Integer approximation of a Gaussian with the center weight at 256.
    pub fn from_sigma(dim: u32, sigma: f32) -> WgResult<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(WgError::kernel("sigma must be > 0"));
        }
        if dim == 0 || dim % 2 == 0 {
            return Err(WgError::kernel(format!("dimension {dim} must be odd")));
        }
        let radius = (dim / 2) as i32;
        let denom = 2.0 * sigma as f64 * sigma as f64;
        let mut weights = Vec::with_capacity(dim as usize * dim as usize);
        for y in -radius..=radius {
            for x in -radius..=radius {
                let d2 = (x * x + y * y) as f64;
                weights.push((256.0 * (-d2 / denom).exp()).round() as i32);
            }
        }
        Self::new(dim, weights)
    }

    pub fn dim(&self) -> u32 {
        self.dim
    }

    pub fn radius(&self) -> u32 {
        self.dim / 2
    }

    pub fn weights(&self) -> &[i32] {
        &self.weights
    }

    pub fn sum(&self) -> i32 {
        self.sum
    }
}

impl Default for GaussianKernel {
    fn default() -> Self {
        Self {
            dim: 5,
            weights: GAUSS_5X5.to_vec(),
            sum: 273,
        }
    }
}

/// Blurs a grayscale plane on the device.
pub struct GaussianBlur<'a> {
    backend: &'a WgBackend,
    program: &'a Program,
    entry_point: &'a str,
    local_size: [u32; 2],
    kernel: &'a GaussianKernel,
}

/// A dispatched blur whose output has not been read back yet.
struct PendingBlur {
    kernel: Kernel,
    src: DeviceBuffer,
    weights: DeviceBuffer,
    dst: DeviceBuffer,
}

impl PendingBlur {
    fn finish(self, backend: &WgBackend, out: &mut [u8]) -> WgResult<()> {
        backend.enqueue_read_blocking(&self.dst, out)?;
        self.src.release();
        self.dst.release();
        self.weights.release();
        self.kernel.release();
        Ok(())
    }
}

impl<'a> GaussianBlur<'a> {
    pub fn new(
        backend: &'a WgBackend,
        program: &'a Program,
        entry_point: &'a str,
        kernel: &'a GaussianKernel,
    ) -> Self {
        GaussianBlur {
            backend,
            program,
            entry_point,
            local_size: GAUSSIAN_BLUR_LOCAL_SIZE,
            kernel,
        }
    }

    pub fn with_local_size(mut self, local_size: [u32; 2]) -> Self {
        self.local_size = local_size;
        self
    }

    pub fn run(&self, input: &ImageContext, output: &mut ImageContext) -> WgResult<()> {
        input.expect_kind(ImageKind::Grayscale)?;
        output.expect_kind(ImageKind::Grayscale)?;
        input.expect_same_size(output)?;

        let pending = self.dispatch(input.gray()?, input.width(), input.height())?;
        pending.finish(self.backend, output.gray_mut()?)
    }

    /// Blurs `image` into itself. The input plane is staged on the device
    /// before the host plane is overwritten by the readback.
    pub fn run_in_place(&self, image: &mut ImageContext) -> WgResult<()> {
        image.expect_kind(ImageKind::Grayscale)?;

        let pending = self.dispatch(image.gray()?, image.width(), image.height())?;
        pending.finish(self.backend, image.gray_mut()?)
    }

    fn dispatch(&self, src: &[u8], width: u32, height: u32) -> WgResult<PendingBlur> {
        let backend = self.backend;
        let len = src.len();
        let weights = bytemuck::cast_slice::<i32, u8>(self.kernel.weights());

        let kernel = backend.create_kernel(self.program, self.entry_point)?;

        let src_buf = backend.allocate_buffer(AccessMode::ReadOnly, len, None)?;
        let weights_buf = backend.allocate_buffer(AccessMode::ReadOnly, weights.len(), None)?;
        let dst_buf = backend.allocate_buffer(AccessMode::WriteOnly, len, None)?;

        {
            let partition = work_partition_blur(width, height, self.local_size);
            let invocation = KernelInvocation::new(&kernel, partition)
                .arg_buffer(&src_buf)
                .arg_buffer(&dst_buf)
                .arg_buffer(&weights_buf)
                .arg_int(int_arg(self.kernel.dim() as usize)?)
                .arg_int(self.kernel.sum())
                .arg_int(int_arg(width as usize)?)
                .arg_int(int_arg(height as usize)?);

            backend.enqueue_write(&src_buf, src)?;
            backend.enqueue_write(&weights_buf, weights)?;

            backend.enqueue_kernel(&invocation)?;
        }
        tracing::debug!(
            width,
            height,
            dim = self.kernel.dim(),
            sum = self.kernel.sum(),
            local = ?self.local_size,
            "gaussian blur dispatched"
        );

        Ok(PendingBlur {
            kernel,
            src: src_buf,
            weights: weights_buf,
            dst: dst_buf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_is_height_major() {
        let p = work_partition_blur(20, 10, GAUSSIAN_BLUR_LOCAL_SIZE);
        assert_eq!(p.dims, 2);
        assert_eq!(p.global, [10, 20]);
        assert_eq!(p.local, [32, 32]);

        let p = work_partition_blur(100, 40, [16, 8]);
        assert_eq!(p.global, [40, 100]);
        assert_eq!(p.work_group_count(), (3, 13));
    }

    #[test]
    fn default_kernel_is_normalized_5x5() {
        let k = GaussianKernel::default();
        assert_eq!(k.dim(), 5);
        assert_eq!(k.radius(), 2);
        assert_eq!(k.weights().len(), 25);
        assert_eq!(k.sum(), 273);
        assert_eq!(k.weights().iter().sum::<i32>(), k.sum());
        assert_eq!(GaussianKernel::new(5, GAUSS_5X5.to_vec()).unwrap(), k);
    }

    #[test]
    fn invalid_kernels_are_rejected() {
        assert!(GaussianKernel::new(4, vec![1; 16]).is_err());
        assert!(GaussianKernel::new(0, vec![]).is_err());
        assert!(GaussianKernel::new(3, vec![1; 8]).is_err());
        assert!(GaussianKernel::new(3, vec![0; 9]).is_err());
        assert!(GaussianKernel::new(1, vec![i32::MIN]).is_err());
        assert!(GaussianKernel::from_sigma(5, 0.0).is_err());
        assert!(GaussianKernel::from_sigma(5, f32::NAN).is_err());
    }

    #[test]
    fn weights_must_fit_i32_accumulator() {
        let mut center = vec![0; 9];
        center[4] = 100_000_000;
        assert!(matches!(
            GaussianKernel::new(3, center),
            Err(WgError::Kernel(_))
        ));

        // Negative weights count by magnitude even when the sum is small.
        let mut signed = vec![0; 9];
        signed[0] = 5_000_000;
        signed[8] = -4_999_999;
        assert!(GaussianKernel::new(3, signed).is_err());

        let mut largest = vec![0; 9];
        largest[4] = 8_000_000;
        assert!(GaussianKernel::new(3, largest).is_ok());
    }

    #[test]
    fn sigma_kernel_is_symmetric_and_peaks_at_center() {
        let k = GaussianKernel::from_sigma(7, 1.5).unwrap();
        let w = k.weights();
        let n = 7usize;
        assert_eq!(w[3 * n + 3], 256);
        for y in 0..n {
            for x in 0..n {
                assert_eq!(w[y * n + x], w[x * n + y]);
                assert_eq!(w[y * n + x], w[(n - 1 - y) * n + (n - 1 - x)]);
                assert!(w[y * n + x] <= 256);
            }
        }
        assert_eq!(w.iter().sum::<i32>(), k.sum());
    }
}
