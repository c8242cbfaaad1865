//! Decoding of MoveNet output tensors into [`BodyResult`]s.
//!
//! Keypoints are emitted as `[y, x, score]` triples normalized to the model
//! input, which itself covers `crop` of the frame. Positions are mapped back
//! through the crop so results are always expressed in full-frame space.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use ndarray::ArrayD;

use crate::shared::bounding_box::{BoundingBox, CropBox};
use crate::shared::config::BodyConfig;

use super::body_part::{BodyPart, CONNECTED_PARTS, KEYPOINT_COUNT};
use super::body_result::{BodyResult, Keypoint, Segment};
use super::detection_error::DetectionError;

const KEYPOINT_VALUES: usize = KEYPOINT_COUNT * 3;

/// Width of one multi-pose row: keypoints, then `[ymin, xmin, ymax, xmax, score]`.
const MULTI_POSE_STRIDE: usize = KEYPOINT_VALUES + 5;

const INSTANCE_SCORE: usize = KEYPOINT_VALUES + 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoseLayout {
    /// `[1, 1, 17, 3]`: exactly one person.
    SinglePose,
    /// `[1, N, 56]`: up to N people, each with an instance score.
    MultiPose,
}

impl PoseLayout {
    pub fn detect(shape: &[usize]) -> Result<Self, DetectionError> {
        match shape {
            [1, 1, KEYPOINT_COUNT, 3] => Ok(PoseLayout::SinglePose),
            [1, _, MULTI_POSE_STRIDE] => Ok(PoseLayout::MultiPose),
            _ => Err(DetectionError::MalformedOutput {
                shape: shape.to_vec(),
            }),
        }
    }
}

/// Frame the model input was sampled from.
#[derive(Clone, Copy, Debug)]
pub struct InputRegion<'a> {
    pub crop: &'a CropBox,
    pub frame_width: u32,
    pub frame_height: u32,
}

/// Parses a pose model output, dispatching on its shape.
pub fn parse_poses(
    output: &ArrayD<f32>,
    region: InputRegion<'_>,
    config: &BodyConfig,
) -> Result<Vec<BodyResult>, DetectionError> {
    let layout = PoseLayout::detect(output.shape())?;
    let data: Vec<f32> = output.iter().copied().collect();
    Ok(match layout {
        PoseLayout::SinglePose => vec![parse_single_pose(&data, region, config)],
        PoseLayout::MultiPose => parse_multi_pose(&data, region, config),
    })
}

/// Always yields one body; its score is the best keypoint score.
fn parse_single_pose(data: &[f32], region: InputRegion<'_>, config: &BodyConfig) -> BodyResult {
    let keypoints = decode_keypoints(&data[..KEYPOINT_VALUES], region, config.min_confidence);
    let score = keypoints.iter().map(|kp| kp.score).fold(0.0, f64::max);
    build_body(0, score, keypoints, region, config.min_confidence)
}

/// Bodies above the confidence threshold, best first, at most `max_detected`.
fn parse_multi_pose(data: &[f32], region: InputRegion<'_>, config: &BodyConfig) -> Vec<BodyResult> {
    let mut bodies: Vec<BodyResult> = data
        .chunks_exact(MULTI_POSE_STRIDE)
        .enumerate()
        .filter_map(|(id, row)| {
            let score = round2(row[INSTANCE_SCORE] as f64);
            if score <= config.min_confidence {
                return None;
            }
            let keypoints = decode_keypoints(&row[..KEYPOINT_VALUES], region, config.min_confidence);
            Some(build_body(id, score, keypoints, region, config.min_confidence))
        })
        .collect();

    bodies.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    bodies.truncate(config.max_detected);
    bodies
}

fn decode_keypoints(values: &[f32], region: InputRegion<'_>, min_confidence: f64) -> Vec<Keypoint> {
    values
        .chunks_exact(3)
        .zip(BodyPart::ALL)
        .filter_map(|(kpt, part)| {
            let score = kpt[2] as f64;
            if score <= min_confidence {
                return None;
            }
            let position_raw = region.crop.map_point(kpt[1] as f64, kpt[0] as f64);
            Some(Keypoint {
                part,
                score: round2(score),
                position_raw,
                position: [
                    (region.frame_width as f64 * position_raw[0]).round() as i32,
                    (region.frame_height as f64 * position_raw[1]).round() as i32,
                ],
            })
        })
        .collect()
}

fn build_body(
    id: usize,
    score: f64,
    keypoints: Vec<Keypoint>,
    region: InputRegion<'_>,
    min_confidence: f64,
) -> BodyResult {
    let positions: Vec<[i32; 2]> = keypoints.iter().map(|kp| kp.position).collect();
    let (bbox, bbox_raw) =
        BoundingBox::enclosing(&positions, region.frame_width, region.frame_height);
    let annotations = annotate(&keypoints, min_confidence);
    BodyResult {
        id,
        score,
        bbox,
        bbox_raw,
        keypoints,
        annotations,
    }
}

fn annotate(keypoints: &[Keypoint], min_confidence: f64) -> BTreeMap<String, Vec<Segment>> {
    let find = |part: BodyPart| keypoints.iter().find(|kp| kp.part == part);
    CONNECTED_PARTS
        .iter()
        .map(|(name, chain)| {
            let segments = chain
                .windows(2)
                .filter_map(|pair| {
                    let a = find(pair[0])?;
                    let b = find(pair[1])?;
                    (a.score > min_confidence && b.score > min_confidence)
                        .then_some([a.position, b.position])
                })
                .collect();
            (name.to_string(), segments)
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
