//! Reference implementation of both stages on the host.
//!
//! Integer arithmetic identical to the bundled kernels, so device results
//! can be compared byte for byte.

use crate::error::WgResult;
use crate::gaussian_blur::GaussianKernel;
use crate::image_context::{ImageContext, ImageKind};
use crate::pipeline::ConvolutionPipeline;

/// `(77 r + 150 g + 29 b + 128) >> 8`
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32 + 128) >> 8) as u8
}

pub fn grayscale_plane(r: &[u8], g: &[u8], b: &[u8], out: &mut [u8]) {
    for (((q, &r), &g), &b) in out.iter_mut().zip(r).zip(g).zip(b) {
        *q = luma(r, g, b);
    }
}

/// Convolves `src` with `kernel`, clamping coordinates to the edge and
/// rounding to nearest.
pub fn gaussian_blur_plane(
    src: &[u8],
    dst: &mut [u8],
    width: u32,
    height: u32,
    kernel: &GaussianKernel,
) {
    let w = width as i32;
    let h = height as i32;
    let dim = kernel.dim() as i32;
    let radius = kernel.radius() as i32;
    let sum = kernel.sum();
    let weights = kernel.weights();

    for row in 0..h {
        for col in 0..w {
            let mut acc = 0i32;
            for ky in 0..dim {
                let sy = (row + ky - radius).clamp(0, h - 1);
                for kx in 0..dim {
                    let sx = (col + kx - radius).clamp(0, w - 1);
                    let sample = src[(sy * w + sx) as usize] as i32;
                    acc += weights[(ky * dim + kx) as usize] * sample;
                }
            }
            dst[(row * w + col) as usize] = ((acc + sum / 2) / sum).clamp(0, 255) as u8;
        }
    }
}

/// Runs both stages on the CPU.
#[derive(Clone, Debug, Default)]
pub struct HostPipeline {
    kernel: GaussianKernel,
}

impl HostPipeline {
    pub fn new(kernel: GaussianKernel) -> Self {
        Self { kernel }
    }
}

impl ConvolutionPipeline for HostPipeline {
    fn grayscale(&self, rgb: &ImageContext, gray: &mut ImageContext) -> WgResult<()> {
        rgb.expect_kind(ImageKind::Rgb)?;
        gray.expect_kind(ImageKind::Grayscale)?;
        rgb.expect_same_size(gray)?;

        let planes = rgb.rgb()?;
        grayscale_plane(planes.r, planes.g, planes.b, gray.gray_mut()?);
        Ok(())
    }

    fn gaussian_blur(&self, input: &ImageContext, output: &mut ImageContext) -> WgResult<()> {
        input.expect_kind(ImageKind::Grayscale)?;
        output.expect_kind(ImageKind::Grayscale)?;
        input.expect_same_size(output)?;

        let (w, h) = input.dimensions();
        gaussian_blur_plane(input.gray()?, output.gray_mut()?, w, h, &self.kernel);
        Ok(())
    }

    fn gaussian_blur_in_place(&self, image: &mut ImageContext) -> WgResult<()> {
        image.expect_kind(ImageKind::Grayscale)?;

        let (w, h) = image.dimensions();
        let src = image.gray()?.to_vec();
        gaussian_blur_plane(&src, image.gray_mut()?, w, h, &self.kernel);
        Ok(())
    }
}
