//! ONNX Runtime backend

use std::path::Path;
use std::time::Instant;

use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::preprocess::image_to_tensor;
use super::{load_labels, ClassifierError, ImageClassifier, Prediction};

/// Exported floor classifier running on ONNX Runtime (CPU)
pub struct OnnxClassifier {
    session: Mutex<Session>,
    labels: Vec<String>,
    input_size: u32,
}

impl OnnxClassifier {
    /// Load the model and its label list
    pub fn load(model_path: &Path, labels_path: &Path, input_size: u32) -> Result<Self, ClassifierError> {
        tracing::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(ClassifierError::Model(format!(
                "Model not found: {}",
                model_path.display()
            )));
        }

        let labels = load_labels(labels_path)?;

        let session = Session::builder()
            .map_err(|e| ClassifierError::Model(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ClassifierError::Model(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| ClassifierError::Model(format!("Failed to load model: {}", e)))?;

        tracing::info!(
            "ONNX model loaded ({} classes, {}x{} input)",
            labels.len(),
            input_size,
            input_size
        );

        Ok(Self {
            session: Mutex::new(session),
            labels,
            input_size,
        })
    }

    fn run(&self, tensor: ndarray::Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        let mut session = self.session.lock();

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ClassifierError::Model("No output defined".to_string()))?;

        let input_tensor = Value::from_array(tensor)?;
        let outputs = session.run(ort::inputs![input_tensor])?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| ClassifierError::Model("Model produced no outputs".to_string()))?;

        let (_, data) = output.try_extract_tensor::<f32>()?;
        Ok(data.to_vec())
    }
}

impl ImageClassifier for OnnxClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, image: &[u8]) -> Result<Prediction, ClassifierError> {
        let start = Instant::now();

        let tensor = image_to_tensor(image, self.input_size)?;
        let scores = self.run(tensor)?;
        let prediction = Prediction::from_scores(&scores, &self.labels)?;

        tracing::debug!(
            "Predicted '{}' (index {}) in {:?}",
            prediction.predicted_class,
            prediction.class_index,
            start.elapsed()
        );

        Ok(prediction)
    }
}
