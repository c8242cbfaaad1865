pub mod body_detector;
pub mod body_part;
pub mod body_result;
pub mod detection_error;
pub mod face_detector;
pub mod graph_model;
pub mod pose_parser;
pub mod roi_cache;
