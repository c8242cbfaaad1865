use std::sync::Arc;

use serde::Serialize;

use crate::shared::config::DetectionConfig;
use crate::shared::frame::Frame;

use super::body_result::BodyResult;
use super::detection_error::DetectionError;

/// Where a frame's bodies came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PredictionSource {
    /// No model loaded; results are empty.
    Unavailable,
    /// Previous frame's results, returned without inference.
    Cached,
    /// Inference on crops around previously tracked bodies.
    Regions,
    /// Inference on the whole frame.
    FullFrame,
}

#[derive(Clone, Debug)]
pub struct Prediction {
    pub bodies: Arc<[BodyResult]>,
    pub source: PredictionSource,
}

impl Prediction {
    pub fn unavailable() -> Self {
        Self {
            bodies: Arc::from(Vec::new()),
            source: PredictionSource::Unavailable,
        }
    }
}

/// Domain interface for body pose detection over a frame stream.
///
/// Implementations keep state between calls, so frames must be passed in
/// stream order; `&mut self` keeps calls strictly sequential.
pub trait BodyDetector: Send {
    fn predict(&mut self, frame: &Frame, config: &DetectionConfig) -> Result<Prediction, DetectionError>;
}
