//! Tensor preprocessing for graph models.
//!
//! All outputs are NHWC `[1, size, size, 3]`. Sampling follows TensorFlow's
//! `resize_bilinear` (no corner alignment, no half-pixel centers) and
//! `crop_and_resize` (extrapolation value 0) so that models exported from
//! TensorFlow see the inputs they were trained on.

use ndarray::Array4;

use crate::shared::bounding_box::CropBox;
use crate::shared::frame::Frame;

/// Bilinear resize of the whole frame to `size × size`.
pub fn resize_bilinear(frame: &Frame, size: u32) -> Array4<f32> {
    let s = size as usize;
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let scale_y = src_h as f64 / s as f64;
    let scale_x = src_w as f64 / s as f64;

    let mut tensor = Array4::<f32>::zeros((1, s, s, 3));
    for y in 0..s {
        let in_y = y as f64 * scale_y;
        for x in 0..s {
            let in_x = x as f64 * scale_x;
            for c in 0..3 {
                tensor[[0, y, x, c]] = bilinear(frame, in_y, in_x, c);
            }
        }
    }
    tensor
}

/// Crops `crop` out of the frame and bilinearly resizes it to `size × size`.
///
/// Sample positions falling outside the frame produce 0.
pub fn crop_and_resize(frame: &Frame, crop: &CropBox, size: u32) -> Array4<f32> {
    let s = size as usize;
    let max_y = (frame.height() - 1) as f64;
    let max_x = (frame.width() - 1) as f64;

    let mut tensor = Array4::<f32>::zeros((1, s, s, 3));
    for y in 0..s {
        let in_y = sample_position(crop.y1, crop.y2, y, s, max_y);
        if in_y < 0.0 || in_y > max_y {
            continue;
        }
        for x in 0..s {
            let in_x = sample_position(crop.x1, crop.x2, x, s, max_x);
            if in_x < 0.0 || in_x > max_x {
                continue;
            }
            for c in 0..3 {
                tensor[[0, y, x, c]] = bilinear(frame, in_y, in_x, c);
            }
        }
    }
    tensor
}

/// Truncating cast, matching how integer-input pose models are fed.
pub fn cast_i32(tensor: &Array4<f32>) -> Array4<i32> {
    tensor.mapv(|v| v as i32)
}

/// Scales 0-255 channel values to 0-1.
pub fn normalize(tensor: Array4<f32>) -> Array4<f32> {
    tensor.mapv_into(|v| v / 255.0)
}

fn sample_position(start: f64, end: f64, i: usize, size: usize, max: f64) -> f64 {
    if size > 1 {
        start * max + i as f64 * (end - start) * max / (size - 1) as f64
    } else {
        0.5 * (start + end) * max
    }
}

fn bilinear(frame: &Frame, in_y: f64, in_x: f64, c: usize) -> f32 {
    let max_y = frame.height() as usize - 1;
    let max_x = frame.width() as usize - 1;
    let y0 = (in_y.floor() as usize).min(max_y);
    let x0 = (in_x.floor() as usize).min(max_x);
    let y1 = (y0 + 1).min(max_y);
    let x1 = (x0 + 1).min(max_x);
    let dy = (in_y - y0 as f64) as f32;
    let dx = (in_x - x0 as f64) as f32;

    let top = frame.sample(y0, x0, c) + (frame.sample(y0, x1, c) - frame.sample(y0, x0, c)) * dx;
    let bottom = frame.sample(y1, x0, c) + (frame.sample(y1, x1, c) - frame.sample(y1, x0, c)) * dx;
    top + (bottom - top) * dy
}
