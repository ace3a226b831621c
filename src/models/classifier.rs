use crate::utils::error::ClassifyError;
use crate::{Config, Result};
use ndarray::Array4;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;

/// 类别顺序固定为 [cat, dog]
pub type ProbabilityVector = [f32; 2];

/// 分类模型能力：单张 (1, 224, 224, 3) 张量 -> 两类概率
pub trait ImageClassifier: Send + Sync {
    fn predict(&self, tensor: &Array4<f32>) -> Result<ProbabilityVector>;

    fn name(&self) -> &str;
}

pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String, // 动态发现的输出名称
    model_name: String,
}

impl OnnxClassifier {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = &config.model_path;

        if !model_path.exists() {
            return Err(ClassifyError::ModelLoad(format!(
                "Classification model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let load_error = |e: &dyn std::fmt::Display| {
            ClassifyError::ModelLoad(format!("{}: {}", model_path.display(), e))
        };

        let session = Session::builder()
            .map_err(|e| load_error(&e))?
            .with_optimization_level(optimization_level(config.onnx_config.optimization_level))
            .map_err(|e| load_error(&e))?
            .with_intra_threads(config.onnx_config.intra_threads)
            .map_err(|e| load_error(&e))?
            .commit_from_file(model_path)
            .map_err(|e| load_error(&e))?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(ClassifyError::ModelLoad(
                    "Classification model has no inputs".to_string(),
                ))
            }
        };

        // 动态发现输出名称
        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(ClassifyError::ModelLoad(
                    "Classification model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classification model io: input='{}', output='{}'",
            input_name,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classification output[{}]: '{}'", i, output.name);
        }

        let model_name = model_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model.onnx".to_string());

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            model_name,
        })
    }
}

impl ImageClassifier for OnnxClassifier {
    fn predict(&self, tensor: &Array4<f32>) -> Result<ProbabilityVector> {
        if tensor.shape()[0] != 1 {
            return Err(ClassifyError::Inference(format!(
                "Expected batch size 1, got tensor shape {:?}",
                tensor.shape()
            )));
        }

        let input_tensor = Tensor::from_array(tensor.to_owned())?;

        let predictions = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available_outputs: Vec<String> =
                        outputs.keys().map(|s| s.to_string()).collect();
                    return Err(ClassifyError::Inference(format!(
                        "Classification output '{}' not found. Available outputs: {:?}",
                        self.output_name, available_outputs
                    )));
                }
            }
        };

        if predictions.shape() != [1, 2] {
            return Err(ClassifyError::Inference(format!(
                "Expected classification output of shape [1, 2], got {:?}",
                predictions.shape()
            )));
        }

        let values: Vec<f32> = predictions.iter().copied().collect();
        Ok([values[0], values[1]])
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

fn optimization_level(level: i32) -> GraphOptimizationLevel {
    match level {
        i32::MIN..=0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}
