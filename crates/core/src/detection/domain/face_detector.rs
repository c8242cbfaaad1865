use ndarray::Array4;
use serde::Serialize;

use crate::shared::bounding_box::{BoundingBox, NormalizedBox};
use crate::shared::config::FaceConfig;
use crate::shared::frame::Frame;

use super::detection_error::DetectionError;

/// A detected face and its normalized crop, ready for downstream face models.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceResult {
    pub confidence: f64,
    pub bbox: BoundingBox,
    pub bbox_raw: NormalizedBox,
    /// `[1, S, S, 3]` crop with channels in 0-1.
    #[serde(skip)]
    pub crop: Array4<f32>,
}

/// Domain interface for face detection. Stateless across frames.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame, config: &FaceConfig) -> Result<Vec<FaceResult>, DetectionError>;
}
