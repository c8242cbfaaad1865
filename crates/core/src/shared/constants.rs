pub const BODY_MODEL_NAME: &str = "movenet-lightning.onnx";
pub const FACE_MODEL_NAME: &str = "faceboxes.onnx";

/// Input size used when a model declares a dynamic spatial dimension.
pub const DEFAULT_INPUT_SIZE: u32 = 256;

/// Growth applied to a tracked body's box before it is reused as next frame's crop.
pub const BOX_EXPAND_FACTOR: f64 = 1.5;

/// Growth applied to FaceBoxes detections so the crop covers the whole head.
pub const FACE_ENLARGE_FACTOR: f64 = 1.1;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
