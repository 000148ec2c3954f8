//! Building floor classifier
//!
//! The model is an exported image classifier; its internals are opaque. This
//! module only prepares the input tensor and turns the output into a
//! label/probability triple.

pub mod onnx;
pub mod preprocess;

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

pub use onnx::OnnxClassifier;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("failed to load labels from {path}: {reason}")]
    Labels { path: String, reason: String },

    #[error("model produced {outputs} scores but {labels} labels are configured")]
    LabelMismatch { outputs: usize, labels: usize },
}

impl From<ort::Error> for ClassifierError {
    fn from(err: ort::Error) -> Self {
        ClassifierError::Model(err.to_string())
    }
}

/// Result of classifying one image
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Prediction {
    pub predicted_class: String,
    pub class_index: usize,
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// Build a prediction from raw model logits
    pub fn from_scores(scores: &[f32], labels: &[String]) -> Result<Self, ClassifierError> {
        if scores.len() != labels.len() {
            return Err(ClassifierError::LabelMismatch {
                outputs: scores.len(),
                labels: labels.len(),
            });
        }

        let probabilities = softmax(scores);

        let class_index = argmax(&probabilities).ok_or_else(|| {
            ClassifierError::Model("model produced an empty output".to_string())
        })?;

        Ok(Self {
            predicted_class: labels[class_index].clone(),
            class_index,
            probabilities,
        })
    }
}

/// Something that can classify an encoded image (JPEG, PNG, ...)
///
/// `classify` blocks; async callers should go through `spawn_blocking`.
pub trait ImageClassifier: Send + Sync {
    fn labels(&self) -> &[String];

    fn classify(&self, image: &[u8]) -> Result<Prediction, ClassifierError>;
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exp: Vec<f32> = logits.iter().map(|&x| (x - max_logit).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|x| x / sum).collect()
}

pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
}

/// Labels file: a JSON array of strings, or one label per line for `.txt`
pub fn load_labels(path: &Path) -> Result<Vec<String>, ClassifierError> {
    let labels_error = |reason: String| ClassifierError::Labels {
        path: path.display().to_string(),
        reason,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| labels_error(e.to_string()))?;

    let labels: Vec<String> = if path.extension().is_some_and(|ext| ext == "txt") {
        raw.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    } else {
        serde_json::from_str(&raw).map_err(|e| labels_error(e.to_string()))?
    };

    if labels.is_empty() {
        return Err(labels_error("no labels defined".to_string()));
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (1..=n).map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[2.0, 1.0, 0.1, -3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }

    #[test]
    fn test_prediction_from_logits() {
        let prediction = Prediction::from_scores(&[0.2, 4.0, -1.0], &labels(3)).unwrap();
        assert_eq!(prediction.class_index, 1);
        assert_eq!(prediction.predicted_class, "2");
        let sum: f32 = prediction.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_unit_range_logits_are_still_softmaxed() {
        let scores = [0.1, 0.2, 0.7];
        let prediction = Prediction::from_scores(&scores, &labels(3)).unwrap();
        assert_eq!(prediction.probabilities, softmax(&scores));
        assert_ne!(prediction.probabilities, scores.to_vec());
        assert_eq!(prediction.class_index, 2);
    }

    #[test]
    fn test_label_mismatch() {
        let result = Prediction::from_scores(&[0.5, 0.5], &labels(3));
        assert!(matches!(
            result,
            Err(ClassifierError::LabelMismatch { outputs: 2, labels: 3 })
        ));
    }

    #[test]
    fn test_load_labels_json_and_txt() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("floors.labels.json");
        std::fs::write(&json_path, r#"["1", "2", "3", "4"]"#).unwrap();
        assert_eq!(load_labels(&json_path).unwrap().len(), 4);

        let txt_path = dir.path().join("floors.txt");
        std::fs::write(&txt_path, "1\n2\n\n3\n").unwrap();
        assert_eq!(load_labels(&txt_path).unwrap(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_load_labels_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(load_labels(&path), Err(ClassifierError::Labels { .. })));
    }
}
