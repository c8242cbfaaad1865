//! MoveNet body detector with frame-to-frame region-of-interest reuse.
//!
//! Per frame the detector either returns the previous frame's bodies
//! unchanged, runs the model on crops around the bodies it tracked last
//! frame, or falls back to a full-frame pass when the crops do not find
//! exactly `max_detected` people. Overlapping crops can each report the
//! same person, so an overfull crop pass is discarded as well.
use std::path::Path;

use ndarray::Array4;

use crate::detection::domain::body_detector::{BodyDetector, Prediction, PredictionSource};
use crate::detection::domain::body_result::BodyResult;
use crate::detection::domain::detection_error::DetectionError;
use crate::detection::domain::graph_model::GraphModel;
use crate::detection::domain::pose_parser::{parse_poses, InputRegion};
use crate::detection::domain::roi_cache::RoiCache;
use crate::shared::bounding_box::CropBox;
use crate::shared::config::{BodyConfig, DetectionConfig};
use crate::shared::frame::Frame;
use crate::shared::image_ops;

use super::onnx_graph_model::OnnxGraphModel;

pub struct MoveNetDetector {
    model: Option<Box<dyn GraphModel>>,
    cache: RoiCache,
}

impl MoveNetDetector {
    pub fn new(model: Box<dyn GraphModel>) -> Self {
        Self {
            model: Some(model),
            cache: RoiCache::new(),
        }
    }

    /// A detector without a model. Every prediction is empty.
    pub fn unloaded() -> Self {
        Self {
            model: None,
            cache: RoiCache::new(),
        }
    }

    pub fn load(model_path: &Path) -> Result<Self, DetectionError> {
        let model = OnnxGraphModel::load(model_path)?;
        log::info!(
            "Loaded body model {} (input {:?})",
            model_path.display(),
            model.input_size()
        );
        Ok(Self::new(Box::new(model)))
    }

    pub fn is_loaded(&self) -> bool {
        self.model.as_ref().is_some_and(|m| m.input_size().is_some())
    }

    pub fn cache(&self) -> &RoiCache {
        &self.cache
    }
}

impl BodyDetector for MoveNetDetector {
    /// Frames must arrive in stream order: the crop boxes and cached
    /// results always describe the frame passed to the previous call.
    fn predict(&mut self, frame: &Frame, config: &DetectionConfig) -> Result<Prediction, DetectionError> {
        let Some(model) = self.model.as_deref_mut() else {
            return Ok(Prediction::unavailable());
        };
        let Some(input_size) = model.input_size() else {
            return Ok(Prediction::unavailable());
        };
        let body = &config.body;

        if !config.skip_frame {
            self.cache.clear_boxes();
        }
        if let Some(bodies) = self.cache.try_reuse(config.skip_frame, body.skip_frames) {
            log::trace!(
                "Frame {}: reusing {} cached bodies",
                frame.index(),
                bodies.len()
            );
            return Ok(Prediction {
                bodies,
                source: PredictionSource::Cached,
            });
        }

        self.cache.begin_pass();
        match detect(model, self.cache.boxes(), frame, input_size, body) {
            Ok((bodies, source)) => {
                log::debug!(
                    "Frame {}: {} bodies from {:?}",
                    frame.index(),
                    bodies.len(),
                    source
                );
                Ok(Prediction {
                    bodies: self.cache.commit(bodies),
                    source,
                })
            }
            Err(e) => {
                self.cache.invalidate();
                Err(e)
            }
        }
    }
}

fn detect(
    model: &mut dyn GraphModel,
    boxes: &[CropBox],
    frame: &Frame,
    input_size: u32,
    config: &BodyConfig,
) -> Result<(Vec<BodyResult>, PredictionSource), DetectionError> {
    let mut bodies = Vec::new();
    if boxes.len() >= config.max_detected {
        for crop in boxes {
            let input = image_ops::cast_i32(&image_ops::crop_and_resize(frame, crop, input_size));
            bodies.extend(infer(model, input, crop, frame, config)?);
        }
    }

    if bodies.len() != config.max_detected {
        let input = image_ops::cast_i32(&image_ops::resize_bilinear(frame, input_size));
        let full = infer(model, input, &CropBox::FULL, frame, config)?;
        return Ok((full, PredictionSource::FullFrame));
    }
    Ok((bodies, PredictionSource::Regions))
}

fn infer(
    model: &mut dyn GraphModel,
    input: Array4<i32>,
    crop: &CropBox,
    frame: &Frame,
    config: &BodyConfig,
) -> Result<Vec<BodyResult>, DetectionError> {
    let outputs = model.forward(input)?;
    let output = outputs
        .first()
        .ok_or(DetectionError::MalformedOutput { shape: Vec::new() })?;
    let region = InputRegion {
        crop,
        frame_width: frame.width(),
        frame_height: frame.height(),
    };
    parse_poses(output, region, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::body_part::KEYPOINT_COUNT;
    use crate::detection::domain::roi_cache::FORCE_DETECTION;
    use ndarray::{ArrayD, IxDyn};
    use std::sync::{Arc, Mutex};

    const INPUT_SIZE: u32 = 8;

    /// Replays canned outputs in order (cycling) and records each input shape.
    struct FakeModel {
        input_size: Option<u32>,
        responses: Vec<ArrayD<f32>>,
        calls: Arc<Mutex<Vec<Vec<usize>>>>,
    }

    impl GraphModel for FakeModel {
        fn input_size(&self) -> Option<u32> {
            self.input_size
        }

        fn forward(&mut self, input: Array4<i32>) -> Result<Vec<ArrayD<f32>>, DetectionError> {
            let mut calls = self.calls.lock().unwrap();
            let response = self.responses[calls.len() % self.responses.len()].clone();
            calls.push(input.shape().to_vec());
            Ok(vec![response])
        }
    }

    fn detector(responses: Vec<ArrayD<f32>>) -> (MoveNetDetector, Arc<Mutex<Vec<Vec<usize>>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let model = FakeModel {
            input_size: Some(INPUT_SIZE),
            responses,
            calls: calls.clone(),
        };
        (MoveNetDetector::new(Box::new(model)), calls)
    }

    fn call_count(calls: &Arc<Mutex<Vec<Vec<usize>>>>) -> usize {
        calls.lock().unwrap().len()
    }

    /// Single-pose output with `visible` confident keypoints around the center.
    fn single_pose(visible: usize) -> ArrayD<f32> {
        let mut data = Vec::new();
        for i in 0..KEYPOINT_COUNT {
            let score = if i < visible { 0.9 } else { 0.0 };
            let offset = i as f32 * 0.01;
            data.extend_from_slice(&[0.4 + offset, 0.4 + offset, score]);
        }
        ArrayD::from_shape_vec(IxDyn(&[1, 1, KEYPOINT_COUNT, 3]), data).unwrap()
    }

    /// Multi-pose output with one fully visible person per instance score.
    fn multi_pose(instance_scores: &[f32]) -> ArrayD<f32> {
        let mut data = Vec::new();
        for (n, &score) in instance_scores.iter().enumerate() {
            let base = 0.1 + 0.4 * n as f32;
            for i in 0..KEYPOINT_COUNT {
                let offset = i as f32 * 0.01;
                data.extend_from_slice(&[base + offset, base + offset, 0.9]);
            }
            data.extend_from_slice(&[0.0, 0.0, 1.0, 1.0, score]);
        }
        ArrayD::from_shape_vec(IxDyn(&[1, instance_scores.len(), 56]), data).unwrap()
    }

    fn frame(index: usize) -> Frame {
        Frame::from_rgb(vec![90u8; 32 * 24 * 3], 32, 24, index).unwrap()
    }

    fn config(skip_frame: bool, skip_frames: usize, max_detected: usize) -> DetectionConfig {
        let mut config = DetectionConfig {
            skip_frame,
            ..DetectionConfig::default()
        };
        config.body.skip_frames = skip_frames;
        config.body.max_detected = max_detected;
        config.body.min_confidence = 0.2;
        config
    }

    #[test]
    fn test_unloaded_detector_returns_empty() {
        let mut detector = MoveNetDetector::unloaded();
        let prediction = detector.predict(&frame(0), &config(true, 1, 1)).unwrap();

        assert!(prediction.bodies.is_empty());
        assert_eq!(prediction.source, PredictionSource::Unavailable);
        assert!(!detector.is_loaded());
    }

    #[test]
    fn test_model_without_input_size_returns_empty() {
        let model = FakeModel {
            input_size: None,
            responses: vec![single_pose(17)],
            calls: Arc::new(Mutex::new(Vec::new())),
        };
        let mut detector = MoveNetDetector::new(Box::new(model));
        let prediction = detector.predict(&frame(0), &config(true, 1, 1)).unwrap();

        assert!(prediction.bodies.is_empty());
        assert_eq!(prediction.source, PredictionSource::Unavailable);
        assert_eq!(detector.cache().skipped(), FORCE_DETECTION);
    }

    #[test]
    fn test_first_frame_runs_full_pass_and_seeds_boxes() {
        let (mut detector, calls) = detector(vec![single_pose(17)]);
        let prediction = detector.predict(&frame(0), &config(false, 0, 1)).unwrap();

        assert_eq!(prediction.source, PredictionSource::FullFrame);
        assert_eq!(prediction.bodies.len(), 1);
        assert_eq!(detector.cache().skipped(), 0);
        assert_eq!(detector.cache().boxes().len(), 1);
        assert_eq!(
            calls.lock().unwrap()[0],
            vec![1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3]
        );
    }

    #[test]
    fn test_skip_disabled_always_runs_full_frame() {
        let (mut detector, calls) = detector(vec![single_pose(17)]);
        let config = config(false, 3, 1);

        for i in 0..4 {
            let prediction = detector.predict(&frame(i), &config).unwrap();
            assert_eq!(prediction.source, PredictionSource::FullFrame);
            assert_eq!(detector.cache().skipped(), 0);
        }
        assert_eq!(call_count(&calls), 4);
    }

    #[test]
    fn test_skip_frames_reuses_results_then_refreshes() {
        let (mut detector, calls) = detector(vec![single_pose(17)]);
        let config = config(true, 3, 1);

        let first = detector.predict(&frame(1), &config).unwrap();
        assert_eq!(first.source, PredictionSource::FullFrame);

        for i in 2..=4 {
            let hit = detector.predict(&frame(i), &config).unwrap();
            assert_eq!(hit.source, PredictionSource::Cached);
            assert!(Arc::ptr_eq(&hit.bodies, &first.bodies));
            assert_eq!(detector.cache().skipped(), i - 1);
        }
        assert_eq!(call_count(&calls), 1);

        let fifth = detector.predict(&frame(5), &config).unwrap();
        assert_ne!(fifth.source, PredictionSource::Cached);
        assert!(!Arc::ptr_eq(&fifth.bodies, &first.bodies));
        assert_eq!(detector.cache().skipped(), 0);
        assert_eq!(call_count(&calls), 2);
    }

    #[test]
    fn test_cached_boxes_drive_crop_inference() {
        let (mut detector, calls) = detector(vec![single_pose(17)]);
        let config = config(true, 0, 1);

        detector.predict(&frame(0), &config).unwrap();
        let second = detector.predict(&frame(1), &config).unwrap();

        assert_eq!(second.source, PredictionSource::Regions);
        assert_eq!(second.bodies.len(), 1);
        assert_eq!(call_count(&calls), 2);
    }

    #[test]
    fn test_insufficient_crop_results_fall_back_to_full_frame() {
        // Full pass finds two people, both crops then find nobody, so the
        // fallback full pass runs and its results replace the crop results.
        let (mut detector, calls) = detector(vec![
            multi_pose(&[0.9, 0.8]),
            multi_pose(&[0.1]),
            multi_pose(&[0.1]),
            multi_pose(&[0.7, 0.6]),
        ]);
        let config = config(true, 0, 2);

        let first = detector.predict(&frame(0), &config).unwrap();
        assert_eq!(first.bodies.len(), 2);
        assert_eq!(detector.cache().boxes().len(), 2);

        let second = detector.predict(&frame(1), &config).unwrap();
        assert_eq!(second.source, PredictionSource::FullFrame);
        assert_eq!(second.bodies.len(), 2);
        assert!((second.bodies[0].score - 0.7).abs() < 1e-9);
        assert_eq!(call_count(&calls), 4);
    }

    #[test]
    fn test_overlapping_crops_stay_within_max_detected() {
        // Every crop reports both people, so each crop pass overfills and
        // the full pass has to replace it.
        let (mut detector, calls) = detector(vec![multi_pose(&[0.9, 0.8])]);
        let config = config(true, 0, 2);

        for i in 0..5 {
            let prediction = detector.predict(&frame(i), &config).unwrap();
            assert_eq!(prediction.source, PredictionSource::FullFrame);
            assert!(prediction.bodies.len() <= 2, "frame {i}: {} bodies", prediction.bodies.len());
            assert!(detector.cache().boxes().len() <= 2, "frame {i}: {} boxes", detector.cache().boxes().len());
        }
        assert_eq!(call_count(&calls), 1 + 4 * 4);
    }

    #[test]
    fn test_too_few_boxes_skip_crop_path() {
        let (mut detector, calls) = detector(vec![multi_pose(&[0.9])]);
        let config = config(true, 0, 2);

        detector.predict(&frame(0), &config).unwrap();
        assert_eq!(detector.cache().boxes().len(), 1);
        let second = detector.predict(&frame(1), &config).unwrap();

        // One box is fewer than max_detected=2, so only a full pass runs
        assert_eq!(second.source, PredictionSource::FullFrame);
        assert_eq!(call_count(&calls), 2);
    }

    #[test]
    fn test_weakly_tracked_body_is_returned_without_box() {
        let (mut detector, _calls) = detector(vec![single_pose(8)]);
        let prediction = detector.predict(&frame(0), &config(true, 0, 1)).unwrap();

        assert_eq!(prediction.bodies.len(), 1);
        assert_eq!(prediction.bodies[0].keypoints.len(), 8);
        assert!(detector.cache().boxes().is_empty());
    }

    #[test]
    fn test_malformed_output_invalidates_cache() {
        let bad = ArrayD::<f32>::zeros(IxDyn(&[1, 3, 3]));
        let (mut detector, calls) = detector(vec![single_pose(17), bad, single_pose(17)]);
        let config = config(true, 0, 1);

        detector.predict(&frame(0), &config).unwrap();
        assert_eq!(detector.cache().boxes().len(), 1);

        let err = detector.predict(&frame(1), &config).unwrap_err();
        assert!(matches!(err, DetectionError::MalformedOutput { .. }));
        assert!(detector.cache().boxes().is_empty());
        assert!(detector.cache().bodies().is_empty());

        let recovered = detector.predict(&frame(2), &config).unwrap();
        assert_eq!(recovered.source, PredictionSource::FullFrame);
        assert_eq!(call_count(&calls), 3);
    }

    #[test]
    fn test_counter_resets_only_on_inference_frames() {
        let (mut detector, _calls) = detector(vec![single_pose(17)]);
        let config = config(true, 2, 1);
        let mut counters = Vec::new();
        for i in 0..7 {
            detector.predict(&frame(i), &config).unwrap();
            counters.push(detector.cache().skipped());
        }
        assert_eq!(counters, vec![0, 1, 2, 0, 1, 2, 0]);
    }
}
