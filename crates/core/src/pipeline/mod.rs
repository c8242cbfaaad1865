pub mod benchmark_use_case;
pub mod detect_frames_use_case;
pub mod infrastructure;
pub mod pipeline_logger;
pub mod result_writer;
