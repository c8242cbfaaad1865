/// `GraphModel` backed by an ONNX Runtime session via `ort`.
use std::path::Path;

use ndarray::{Array4, ArrayD};

use crate::detection::domain::detection_error::DetectionError;
use crate::detection::domain::graph_model::GraphModel;
use crate::shared::constants::DEFAULT_INPUT_SIZE;

use super::execution_provider::preferred_execution_providers;

impl From<ort::Error> for DetectionError {
    fn from(e: ort::Error) -> Self {
        DetectionError::Inference(e.to_string())
    }
}

pub struct OnnxGraphModel {
    session: ort::session::Session,
    input_size: Option<u32>,
}

impl OnnxGraphModel {
    /// Load a model whose single input is an `[1, H, W, 3]` int32 image.
    ///
    /// The spatial size is read from the declared input shape; a dynamic
    /// dimension falls back to [`DEFAULT_INPUT_SIZE`].
    pub fn load(model_path: &Path) -> Result<Self, DetectionError> {
        if !model_path.exists() {
            return Err(DetectionError::ModelUnavailable(model_path.display().to_string()));
        }
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session.inputs().first().and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                match shape.get(2) {
                    Some(&-1) => Some(DEFAULT_INPUT_SIZE),
                    Some(&dim) if dim > 0 => Some(dim as u32),
                    _ => None,
                }
            } else {
                None
            }
        });

        Ok(Self { session, input_size })
    }
}

impl GraphModel for OnnxGraphModel {
    fn input_size(&self) -> Option<u32> {
        self.input_size
    }

    fn forward(&mut self, input: Array4<i32>) -> Result<Vec<ArrayD<f32>>, DetectionError> {
        let output_count = self.session.outputs().len();
        let outputs = self
            .session
            .run(ort::inputs![ort::value::Tensor::from_array(input)?])?;

        let mut tensors = Vec::with_capacity(output_count);
        for i in 0..output_count {
            let value = &outputs[i];
            // Count outputs (e.g. detection totals) are often integer typed.
            let tensor = match value.try_extract_array::<f32>() {
                Ok(view) => view.to_owned(),
                Err(_) => value.try_extract_array::<i32>()?.mapv(|v| v as f32),
            };
            tensors.push(tensor);
        }
        Ok(tensors)
    }
}
