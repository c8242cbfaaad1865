use std::collections::BTreeMap;

use serde::Serialize;

use crate::shared::bounding_box::{BoundingBox, NormalizedBox};

use super::body_part::{BodyPart, KEYPOINT_COUNT};

/// Line between two keypoint pixel positions.
pub type Segment = [[i32; 2]; 2];

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Keypoint {
    pub part: BodyPart,
    /// Confidence rounded to two decimals.
    pub score: f64,
    /// `[x, y]` normalized to the full frame.
    pub position_raw: [f64; 2],
    /// `[x, y]` in frame pixels.
    pub position: [i32; 2],
}

/// One detected person.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyResult {
    pub id: usize,
    pub score: f64,
    pub bbox: BoundingBox,
    pub bbox_raw: NormalizedBox,
    pub keypoints: Vec<Keypoint>,
    pub annotations: BTreeMap<String, Vec<Segment>>,
}

impl BodyResult {
    /// More than half of the skeleton is visible, so the box is stable
    /// enough to crop the next frame with.
    pub fn is_trackable(&self) -> bool {
        self.keypoints.len() * 2 > KEYPOINT_COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_with(count: usize) -> BodyResult {
        let keypoints = BodyPart::ALL
            .iter()
            .take(count)
            .map(|&part| Keypoint {
                part,
                score: 0.9,
                position_raw: [0.5, 0.5],
                position: [50, 50],
            })
            .collect();
        BodyResult {
            id: 0,
            score: 0.9,
            bbox: BoundingBox::default(),
            bbox_raw: NormalizedBox::default(),
            keypoints,
            annotations: BTreeMap::new(),
        }
    }

    #[test]
    fn test_trackable_needs_more_than_half() {
        assert!(!body_with(0).is_trackable());
        assert!(!body_with(8).is_trackable());
        assert!(body_with(9).is_trackable());
        assert!(body_with(17).is_trackable());
    }

    #[test]
    fn test_serializes_camel_case_fields() {
        let json = serde_json::to_value(body_with(1)).unwrap();
        assert!(json["bboxRaw"].is_array());
        assert_eq!(json["keypoints"][0]["part"], "nose");
        assert!(json["keypoints"][0].get("positionRaw").is_some());
    }
}
