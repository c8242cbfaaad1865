//! Body pose and face detection over frame sequences, with frame-to-frame
//! reuse of body detections.
pub mod detection;
pub mod pipeline;
pub mod shared;
pub mod video;
