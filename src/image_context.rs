//! Planar pixel buffers in the layout the kernels consume.

use crate::error::{WgError, WgResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Grayscale,
    Rgb,
}

impl ImageKind {
    pub fn name(self) -> &'static str {
        match self {
            ImageKind::Grayscale => "grayscale",
            ImageKind::Rgb => "rgb",
        }
    }
}

/// Colorspace tag carried alongside the pixels. Never interpreted here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Colorspace {
    #[default]
    None,
    Srgb,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Planes {
    Gray(Vec<u8>),
    Rgb { r: Vec<u8>, g: Vec<u8>, b: Vec<u8> },
}

/// Borrowed view of the three color planes.
pub struct RgbPlanes<'a> {
    pub r: &'a [u8],
    pub g: &'a [u8],
    pub b: &'a [u8],
}

pub struct RgbPlanesMut<'a> {
    pub r: &'a mut [u8],
    pub g: &'a mut [u8],
    pub b: &'a mut [u8],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageContext {
    width: u32,
    height: u32,
    colorspace: Colorspace,
    planes: Planes,
}

fn checked_pixel_count(width: u32, height: u32) -> WgResult<usize> {
    if width == 0 || height == 0 {
        return Err(WgError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .map(|n| n as usize)
        .ok_or(WgError::InvalidDimensions { width, height })
}

impl ImageContext {
    /// Zero-initialized context, used as an output sink.
    pub fn new(width: u32, height: u32, kind: ImageKind, colorspace: Colorspace) -> WgResult<Self> {
        let len = checked_pixel_count(width, height)?;
        let planes = match kind {
            ImageKind::Grayscale => Planes::Gray(vec![0; len]),
            ImageKind::Rgb => Planes::Rgb {
                r: vec![0; len],
                g: vec![0; len],
                b: vec![0; len],
            },
        };
        Ok(Self {
            width,
            height,
            colorspace,
            planes,
        })
    }

    pub fn from_gray_plane(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        plane: Vec<u8>,
    ) -> WgResult<Self> {
        let len = checked_pixel_count(width, height)?;
        check_plane_len("gray", &plane, len)?;
        Ok(Self {
            width,
            height,
            colorspace,
            planes: Planes::Gray(plane),
        })
    }

    pub fn from_rgb_planes(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        r: Vec<u8>,
        g: Vec<u8>,
        b: Vec<u8>,
    ) -> WgResult<Self> {
        let len = checked_pixel_count(width, height)?;
        check_plane_len("red", &r, len)?;
        check_plane_len("green", &g, len)?;
        check_plane_len("blue", &b, len)?;
        Ok(Self {
            width,
            height,
            colorspace,
            planes: Planes::Rgb { r, g, b },
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    pub fn kind(&self) -> ImageKind {
        match self.planes {
            Planes::Gray(_) => ImageKind::Grayscale,
            Planes::Rgb { .. } => ImageKind::Rgb,
        }
    }

    pub fn planes(&self) -> &Planes {
        &self.planes
    }

    pub fn gray(&self) -> WgResult<&[u8]> {
        match &self.planes {
            Planes::Gray(pix) => Ok(pix.as_slice()),
            Planes::Rgb { .. } => Err(self.mismatch(ImageKind::Grayscale)),
        }
    }

    pub fn gray_mut(&mut self) -> WgResult<&mut [u8]> {
        match &mut self.planes {
            Planes::Gray(pix) => Ok(pix.as_mut_slice()),
            Planes::Rgb { .. } => Err(WgError::KindMismatch {
                expected: ImageKind::Grayscale.name(),
                actual: ImageKind::Rgb.name(),
            }),
        }
    }

    pub fn rgb(&self) -> WgResult<RgbPlanes<'_>> {
        match &self.planes {
            Planes::Rgb { r, g, b } => Ok(RgbPlanes { r, g, b }),
            Planes::Gray(_) => Err(self.mismatch(ImageKind::Rgb)),
        }
    }

    pub fn rgb_mut(&mut self) -> WgResult<RgbPlanesMut<'_>> {
        match &mut self.planes {
            Planes::Rgb { r, g, b } => Ok(RgbPlanesMut { r, g, b }),
            Planes::Gray(_) => Err(WgError::KindMismatch {
                expected: ImageKind::Rgb.name(),
                actual: ImageKind::Grayscale.name(),
            }),
        }
    }

    /// Fails unless `self` is of `kind`.
    pub fn expect_kind(&self, kind: ImageKind) -> WgResult<()> {
        if self.kind() == kind {
            Ok(())
        } else {
            Err(self.mismatch(kind))
        }
    }

    /// Fails unless both contexts have the same width and height.
    pub fn expect_same_size(&self, other: &ImageContext) -> WgResult<()> {
        if self.dimensions() == other.dimensions() {
            Ok(())
        } else {
            Err(WgError::DimensionMismatch {
                left: self.dimensions(),
                right: other.dimensions(),
            })
        }
    }

    fn mismatch(&self, expected: ImageKind) -> WgError {
        WgError::KindMismatch {
            expected: expected.name(),
            actual: self.kind().name(),
        }
    }
}

fn check_plane_len(name: &str, plane: &[u8], len: usize) -> WgResult<()> {
    if plane.len() != len {
        return Err(WgError::layout(format!(
            "{name} plane holds {} samples, expected {len}",
            plane.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_allocates_planes_per_kind() {
        let gray = ImageContext::new(4, 3, ImageKind::Grayscale, Colorspace::None).unwrap();
        assert_eq!(gray.pixel_count(), 12);
        assert_eq!(gray.gray().unwrap(), &[0u8; 12][..]);
        assert!(gray.rgb().is_err());

        let rgb = ImageContext::new(4, 3, ImageKind::Rgb, Colorspace::Srgb).unwrap();
        let planes = rgb.rgb().unwrap();
        assert_eq!(planes.r.len(), 12);
        assert_eq!(planes.g.len(), 12);
        assert_eq!(planes.b.len(), 12);
        assert_eq!(rgb.colorspace(), Colorspace::Srgb);
        assert!(matches!(rgb.gray(), Err(WgError::KindMismatch { .. })));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            ImageContext::new(0, 5, ImageKind::Grayscale, Colorspace::None),
            Err(WgError::InvalidDimensions { width: 0, height: 5 })
        ));
        assert!(ImageContext::new(5, 0, ImageKind::Rgb, Colorspace::None).is_err());
        assert!(ImageContext::new(u32::MAX, 2, ImageKind::Grayscale, Colorspace::None).is_err());
    }

    #[test]
    fn adopted_planes_must_match_pixel_count() {
        assert!(ImageContext::from_gray_plane(2, 2, Colorspace::None, vec![1, 2, 3]).is_err());
        assert!(ImageContext::from_rgb_planes(
            2,
            1,
            Colorspace::None,
            vec![1, 2],
            vec![3],
            vec![5, 6]
        )
        .is_err());
        let ctx =
            ImageContext::from_rgb_planes(2, 1, Colorspace::None, vec![1, 2], vec![3, 4], vec![5, 6])
                .unwrap();
        assert_eq!(ctx.kind(), ImageKind::Rgb);
    }

    #[test]
    fn size_checks_compare_both_axes() {
        let a = ImageContext::new(3, 2, ImageKind::Grayscale, Colorspace::None).unwrap();
        let b = ImageContext::new(2, 3, ImageKind::Grayscale, Colorspace::None).unwrap();
        assert!(matches!(
            a.expect_same_size(&b),
            Err(WgError::DimensionMismatch { .. })
        ));
        assert!(a.expect_same_size(&a.clone()).is_ok());
    }
}
