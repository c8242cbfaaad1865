use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("unrecognized model output shape {shape:?}")]
    MalformedOutput { shape: Vec<usize> },
    #[error("inference failed: {0}")]
    Inference(String),
}

