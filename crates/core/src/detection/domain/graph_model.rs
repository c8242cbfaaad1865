use ndarray::{Array4, ArrayD};

use super::detection_error::DetectionError;

/// A loaded inference graph taking one NHWC integer image tensor.
///
/// Detectors own their input tensors and hand them over by value; every
/// tensor produced along the way is dropped before `forward` returns.
pub trait GraphModel: Send {
    /// Square spatial input size, or `None` when the model declares no usable input shape.
    fn input_size(&self) -> Option<u32>;

    /// Runs one forward pass, returning every graph output in declaration order.
    fn forward(&mut self, input: Array4<i32>) -> Result<Vec<ArrayD<f32>>, DetectionError>;
}
