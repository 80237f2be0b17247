use crate::config::PipelineConfig;
use crate::context::{Program, WgBackend};
use crate::error::WgResult;
use crate::gaussian_blur::GaussianBlur;
use crate::grayscale::GrayScale;
use crate::image_context::{ImageContext, ImageKind};

/// The two stages of the filter.
pub trait ConvolutionPipeline {
    /// Converts an RGB context into a grayscale context of the same size.
    fn grayscale(&self, rgb: &ImageContext, gray: &mut ImageContext) -> WgResult<()>;

    fn gaussian_blur(&self, input: &ImageContext, output: &mut ImageContext) -> WgResult<()>;

    /// Same result as [`ConvolutionPipeline::gaussian_blur`] into a
    /// separate context.
    fn gaussian_blur_in_place(&self, image: &mut ImageContext) -> WgResult<()>;
}

/// Runs both stages on the accelerator.
pub struct AccelPipeline<'a> {
    backend: &'a WgBackend,
    program: &'a Program,
    config: &'a PipelineConfig,
}

impl<'a> AccelPipeline<'a> {
    pub fn new(backend: &'a WgBackend, program: &'a Program, config: &'a PipelineConfig) -> Self {
        Self {
            backend,
            program,
            config,
        }
    }

    fn blur(&self) -> GaussianBlur<'a> {
        GaussianBlur::new(
            self.backend,
            self.program,
            &self.config.blur_entry_point,
            &self.config.kernel,
        )
        .with_local_size(self.config.blur_local_size)
    }
}

impl ConvolutionPipeline for AccelPipeline<'_> {
    fn grayscale(&self, rgb: &ImageContext, gray: &mut ImageContext) -> WgResult<()> {
        GrayScale::new(
            self.backend,
            self.program,
            &self.config.grayscale_entry_point,
        )
        .with_local_size(self.config.grayscale_local_size)
        .run(rgb, gray)
    }

    fn gaussian_blur(&self, input: &ImageContext, output: &mut ImageContext) -> WgResult<()> {
        self.blur().run(input, output)
    }

    fn gaussian_blur_in_place(&self, image: &mut ImageContext) -> WgResult<()> {
        self.blur().run_in_place(image)
    }
}

/// Converts `rgb` to grayscale and blurs the result in place.
#[tracing::instrument(skip_all, fields(width = rgb.width(), height = rgb.height()))]
pub fn run<P: ConvolutionPipeline + ?Sized>(pipeline: &P, rgb: &ImageContext) -> WgResult<ImageContext> {
    let mut gray = ImageContext::new(
        rgb.width(),
        rgb.height(),
        ImageKind::Grayscale,
        rgb.colorspace(),
    )?;
    pipeline.grayscale(rgb, &mut gray)?;
    pipeline.gaussian_blur_in_place(&mut gray)?;
    Ok(gray)
}
