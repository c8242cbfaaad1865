pub mod execution_provider;
pub mod face_boxes_detector;
pub mod model_resolver;
pub mod movenet_detector;
pub mod onnx_graph_model;
