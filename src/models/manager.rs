use crate::models::{ImageClassifier, OnnxClassifier};
use crate::utils::error::ClassifyError;
use crate::{Config, Result};
use serde::Serialize;
use std::sync::Arc;

/// 启动时加载一次、之后只读共享的模型句柄
#[derive(Clone)]
pub struct ModelManager {
    classifier: Option<Arc<dyn ImageClassifier>>,
}

impl ModelManager {
    /// 加载分类模型；失败时记录日志并以"未加载"状态继续运行
    pub fn load(config: &Config) -> Self {
        tracing::info!("Initializing model manager...");

        match OnnxClassifier::new(config) {
            Ok(classifier) => {
                tracing::info!("Model loaded successfully");
                Self::with_classifier(Arc::new(classifier))
            }
            Err(e) => {
                tracing::error!("Error loading model: {}", e);
                Self::empty()
            }
        }
    }

    pub fn with_classifier(classifier: Arc<dyn ImageClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    pub fn empty() -> Self {
        Self { classifier: None }
    }

    /// 获取分类器引用
    pub fn classifier(&self) -> Result<Arc<dyn ImageClassifier>> {
        self.classifier
            .as_ref()
            .map(Arc::clone)
            .ok_or(ClassifyError::ModelNotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn get_stats(&self, config: &Config) -> ModelStats {
        ModelStats {
            loaded: self.is_loaded(),
            model_name: self.classifier.as_ref().map(|c| c.name().to_string()),
            model_path: config.model_path.display().to_string(),
            intra_threads: config.onnx_config.intra_threads,
            optimization_level: config.onnx_config.optimization_level,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, Serialize)]
pub struct ModelStats {
    pub loaded: bool,
    pub model_name: Option<String>,
    pub model_path: String,
    pub intra_threads: usize,
    pub optimization_level: i32,
}
