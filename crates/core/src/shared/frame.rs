use ndarray::{Array3, ArrayView3};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FrameError {
    #[error("frame dimensions must be non-zero, got {width}x{height}")]
    Empty { width: u32, height: u32 },
    #[error("expected {expected} bytes for a {width}x{height} RGB frame, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// One RGB image in a frame sequence, stored as `[height, width, 3]`.
///
/// `index` is the frame's position in its source. The body detector's ROI
/// cache assumes frames arrive in increasing index order.
#[derive(Clone, Debug)]
pub struct Frame {
    pixels: Array3<u8>,
    index: usize,
}

impl Frame {
    /// Wraps row-major RGB bytes.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32, index: usize) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        let actual = data.len();
        let pixels = Array3::from_shape_vec((height as usize, width as usize, 3), data).map_err(
            |_| FrameError::SizeMismatch {
                width,
                height,
                expected,
                actual,
            },
        )?;
        Ok(Self { pixels, index })
    }

    pub fn from_image(image: image::RgbImage, index: usize) -> Result<Self, FrameError> {
        let (width, height) = image.dimensions();
        Self::from_rgb(image.into_raw(), width, height, index)
    }

    pub fn width(&self) -> u32 {
        self.pixels.shape()[1] as u32
    }

    pub fn height(&self) -> u32 {
        self.pixels.shape()[0] as u32
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pixels(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    /// Channel value at `(y, x, c)` as `f32`.
    #[inline]
    pub(crate) fn sample(&self, y: usize, x: usize, c: usize) -> f32 {
        self.pixels[[y, x, c]] as f32
    }
}
