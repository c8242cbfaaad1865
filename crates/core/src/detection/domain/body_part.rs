//! The 17-point COCO body layout produced by MoveNet.

use serde::Serialize;

/// Number of keypoints in one full skeleton.
pub const KEYPOINT_COUNT: usize = 17;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyPart {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

use BodyPart::*;

impl BodyPart {
    /// Parts in model output order.
    pub const ALL: [BodyPart; KEYPOINT_COUNT] = [
        Nose,
        LeftEye,
        RightEye,
        LeftEar,
        RightEar,
        LeftShoulder,
        RightShoulder,
        LeftElbow,
        RightElbow,
        LeftWrist,
        RightWrist,
        LeftHip,
        RightHip,
        LeftKnee,
        RightKnee,
        LeftAnkle,
        RightAnkle,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Named keypoint chains. Each consecutive pair in a chain is one segment.
pub const CONNECTED_PARTS: &[(&str, &[BodyPart])] = &[
    ("leftLeg", &[LeftHip, LeftKnee, LeftAnkle]),
    ("rightLeg", &[RightHip, RightKnee, RightAnkle]),
    (
        "torso",
        &[LeftShoulder, RightShoulder, RightHip, LeftHip, LeftShoulder],
    ),
    ("leftArm", &[LeftShoulder, LeftElbow, LeftWrist]),
    ("rightArm", &[RightShoulder, RightElbow, RightWrist]),
    ("head", &[]),
];
