/// FaceBoxes face detector.
///
/// Runs once per frame on the whole image; no state is carried between
/// frames. Each accepted box is enlarged and its region cropped out of the
/// frame as a normalized tensor for downstream face models.
use std::path::Path;

use crate::detection::domain::detection_error::DetectionError;
use crate::detection::domain::face_detector::{FaceDetector, FaceResult};
use crate::detection::domain::graph_model::GraphModel;
use crate::shared::bounding_box::CropBox;
use crate::shared::config::FaceConfig;
use crate::shared::constants::FACE_ENLARGE_FACTOR;
use crate::shared::frame::Frame;
use crate::shared::image_ops;

use super::onnx_graph_model::OnnxGraphModel;

pub struct FaceBoxesDetector {
    model: Option<Box<dyn GraphModel>>,
}

impl FaceBoxesDetector {
    pub fn new(model: Box<dyn GraphModel>) -> Self {
        Self { model: Some(model) }
    }

    pub fn unloaded() -> Self {
        Self { model: None }
    }

    pub fn load(model_path: &Path) -> Result<Self, DetectionError> {
        let model = OnnxGraphModel::load(model_path)?;
        log::info!("Loaded face model {}", model_path.display());
        Ok(Self::new(Box::new(model)))
    }
}

impl FaceDetector for FaceBoxesDetector {
    fn detect(&mut self, frame: &Frame, config: &FaceConfig) -> Result<Vec<FaceResult>, DetectionError> {
        let Some(model) = self.model.as_deref_mut() else {
            return Ok(Vec::new());
        };
        let Some(input_size) = model.input_size() else {
            return Ok(Vec::new());
        };

        let input = image_ops::cast_i32(&image_ops::resize_bilinear(frame, input_size));
        let outputs = model.forward(input)?;
        // Outputs: scores [1, N], boxes [1, N, 4] as [y1, x1, y2, x2], count.
        let (Some(scores), Some(boxes)) = (outputs.first(), outputs.get(1)) else {
            return Err(DetectionError::MalformedOutput {
                shape: vec![outputs.len()],
            });
        };
        if boxes.len() % 4 != 0 {
            return Err(DetectionError::MalformedOutput {
                shape: boxes.shape().to_vec(),
            });
        }

        let scores: Vec<f32> = scores.iter().copied().collect();
        let boxes: Vec<f32> = boxes.iter().copied().collect();
        let faces: Vec<FaceResult> = boxes
            .chunks_exact(4)
            .zip(scores)
            .filter(|(_, score)| *score as f64 > config.min_confidence)
            .map(|(b, score)| {
                let crop = enlarge([b[0], b[1], b[2], b[3]]);
                let bbox_raw = crop.as_normalized();
                FaceResult {
                    confidence: score as f64,
                    bbox: bbox_raw.to_pixels(frame.width(), frame.height()),
                    bbox_raw,
                    crop: image_ops::normalize(image_ops::crop_and_resize(frame, &crop, input_size)),
                }
            })
            .collect();

        log::trace!("Frame {}: {} faces", frame.index(), faces.len());
        Ok(faces)
    }
}

/// Pushes the top-left corner toward the origin and the bottom-right away
/// from it. The result is not clamped.
fn enlarge(b: [f32; 4]) -> CropBox {
    CropBox {
        y1: b[0] as f64 / FACE_ENLARGE_FACTOR,
        x1: b[1] as f64 / FACE_ENLARGE_FACTOR,
        y2: b[2] as f64 * FACE_ENLARGE_FACTOR,
        x2: b[3] as f64 * FACE_ENLARGE_FACTOR,
    }
}
