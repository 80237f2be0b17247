//! Conversion between packed interleaved pixel buffers and [`ImageContext`].

use crate::error::{WgError, WgResult};
use crate::image_context::{Colorspace, ImageContext, ImageKind, Planes, RgbPlanesMut};

/// Describes a packed interleaved buffer as produced by an image codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedLayout {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    /// Bytes between the starts of consecutive rows.
    pub row_stride: usize,
}

impl PackedLayout {
    /// Layout without row padding.
    pub fn tight(width: u32, height: u32, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            row_stride: width as usize * channels,
        }
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.channels
    }

    /// Padding bytes skipped at the end of every row.
    pub fn row_padding(&self) -> usize {
        self.row_stride.saturating_sub(self.row_bytes())
    }

    /// Smallest buffer that holds the image. The last row needs no padding.
    pub fn required_len(&self) -> usize {
        match self.height {
            0 => 0,
            h => (h as usize - 1) * self.row_stride + self.row_bytes(),
        }
    }

    pub fn validate(&self, min_channels: usize) -> WgResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(WgError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.channels < min_channels {
            return Err(WgError::layout(format!(
                "{} channels per pixel, at least {min_channels} required",
                self.channels
            )));
        }
        if self.row_stride < self.row_bytes() {
            return Err(WgError::layout(format!(
                "row stride {} shorter than row of {} bytes",
                self.row_stride,
                self.row_bytes()
            )));
        }
        Ok(())
    }

    fn check_buffer(&self, len: usize) -> WgResult<()> {
        if len < self.required_len() {
            return Err(WgError::layout(format!(
                "buffer of {len} bytes, layout needs {}",
                self.required_len()
            )));
        }
        Ok(())
    }

    fn rows<'a>(&self, buf: &'a [u8]) -> impl Iterator<Item = &'a [u8]> {
        let row_bytes = self.row_bytes();
        let stride = self.row_stride;
        (0..self.height as usize).map(move |y| &buf[y * stride..y * stride + row_bytes])
    }
}

/// Copies a packed buffer into a new planar context.
///
/// Grayscale targets take channel 0 of each pixel; RGB targets take
/// channels 0, 1 and 2.
pub fn ingest(
    src: &[u8],
    layout: PackedLayout,
    target: ImageKind,
    colorspace: Colorspace,
) -> WgResult<ImageContext> {
    let min_channels = match target {
        ImageKind::Grayscale => 1,
        ImageKind::Rgb => 3,
    };
    layout.validate(min_channels)?;
    layout.check_buffer(src.len())?;

    let mut ctx = ImageContext::new(layout.width, layout.height, target, colorspace)?;
    let nchan = layout.channels;
    let width = layout.width as usize;

    match target {
        ImageKind::Grayscale => {
            let gray = ctx.gray_mut()?;
            for (row, out) in layout.rows(src).zip(gray.chunks_exact_mut(width)) {
                for (px, q) in row.chunks_exact(nchan).zip(out.iter_mut()) {
                    *q = px[0];
                }
            }
        }
        ImageKind::Rgb => {
            let RgbPlanesMut { r, g, b } = ctx.rgb_mut()?;
            let outs = r
                .chunks_exact_mut(width)
                .zip(g.chunks_exact_mut(width))
                .zip(b.chunks_exact_mut(width));
            for (row, ((r, g), b)) in layout.rows(src).zip(outs) {
                for (i, px) in row.chunks_exact(nchan).enumerate() {
                    r[i] = px[0];
                    g[i] = px[1];
                    b[i] = px[2];
                }
            }
        }
    }

    tracing::trace!(
        width = layout.width,
        height = layout.height,
        channels = nchan,
        padding = layout.row_padding(),
        kind = target.name(),
        "ingested packed buffer"
    );
    Ok(ctx)
}

/// Writes a context back into a packed buffer.
///
/// A grayscale sample is replicated into channels 0, 1 and 2. Channels
/// past the third and row padding are left untouched.
pub fn emit(ctx: &ImageContext, dst: &mut [u8], layout: PackedLayout) -> WgResult<()> {
    layout.validate(3)?;
    layout.check_buffer(dst.len())?;
    if (layout.width, layout.height) != ctx.dimensions() {
        return Err(WgError::DimensionMismatch {
            left: ctx.dimensions(),
            right: (layout.width, layout.height),
        });
    }

    let nchan = layout.channels;
    let width = ctx.width() as usize;
    let row_bytes = layout.row_bytes();

    for y in 0..ctx.height() as usize {
        let start = y * layout.row_stride;
        let row = &mut dst[start..start + row_bytes];
        let pixels = row.chunks_exact_mut(nchan);
        let base = y * width;
        match ctx.planes() {
            Planes::Gray(gray) => {
                for (px, &v) in pixels.zip(&gray[base..base + width]) {
                    px[0] = v;
                    px[1] = v;
                    px[2] = v;
                }
            }
            Planes::Rgb { r, g, b } => {
                for (i, px) in pixels.enumerate() {
                    px[0] = r[base + i];
                    px[1] = g[base + i];
                    px[2] = b[base + i];
                }
            }
        }
    }
    Ok(())
}

/// Ingests a decoded image from the codec.
pub fn from_rgb_image(image: &image::RgbImage, target: ImageKind) -> WgResult<ImageContext> {
    let (w, h) = image.dimensions();
    ingest(
        image.as_raw(),
        PackedLayout::tight(w, h, 3),
        target,
        Colorspace::Srgb,
    )
}

/// Materializes a context as an RGB image for the codec.
pub fn to_rgb_image(ctx: &ImageContext) -> WgResult<image::RgbImage> {
    let (w, h) = ctx.dimensions();
    let layout = PackedLayout::tight(w, h, 3);
    let mut raw = vec![0u8; layout.required_len()];
    emit(ctx, &mut raw, layout)?;
    image::RgbImage::from_raw(w, h, raw)
        .ok_or_else(|| WgError::layout("packed buffer does not match image dimensions"))
}
