use crate::config::TtaConfig;
use crate::image::ImagePreprocessor;
use crate::models::{ImageClassifier, ProbabilityVector};
use crate::tta::{Label, UnknownReason, Verdict};
use crate::utils::error::ClassifyError;
use crate::Result;
use serde::Serialize;

/// 概率和允许的误差
const PROBABILITY_SUM_TOLERANCE: f32 = 1e-3;

/// 各变体预测的逐元素均值与总体标准差 (ddof = 0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionStats {
    pub mean: ProbabilityVector,
    pub std: ProbabilityVector,
}

impl PredictionStats {
    pub fn from_predictions(predictions: &[ProbabilityVector]) -> Result<Self> {
        if predictions.is_empty() {
            return Err(ClassifyError::Inference(
                "No predictions to aggregate".to_string(),
            ));
        }

        let n = predictions.len() as f64;
        let mut mean = [0.0f32; 2];
        let mut std = [0.0f32; 2];

        for class in 0..2 {
            let class_mean = predictions.iter().map(|p| f64::from(p[class])).sum::<f64>() / n;
            let variance = predictions
                .iter()
                .map(|p| (f64::from(p[class]) - class_mean).powi(2))
                .sum::<f64>()
                / n;

            mean[class] = class_mean as f32;
            std[class] = variance.sqrt() as f32;
        }

        Ok(Self { mean, std })
    }

    /// (argmax, max)，并列时取第一个
    pub fn top_class(&self) -> (usize, f32) {
        if self.mean[1] > self.mean[0] {
            (1, self.mean[1])
        } else {
            (0, self.mean[0])
        }
    }

    pub fn max_std(&self) -> f32 {
        self.std[0].max(self.std[1])
    }
}

/// 测试时增强 (TTA) 判定引擎
#[derive(Debug, Clone)]
pub struct TtaEngine {
    config: TtaConfig,
    max_image_size: usize,
}

impl TtaEngine {
    pub fn new(config: TtaConfig, max_image_size: usize) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            max_image_size,
        })
    }

    pub fn config(&self) -> &TtaConfig {
        &self.config
    }

    /// 对每个增强变体独立推理，汇总后给出判定
    pub fn predict(&self, classifier: &dyn ImageClassifier, bytes: &[u8]) -> Result<Verdict> {
        let tensors =
            ImagePreprocessor::prepare_variants(bytes, &self.config.augmentations, self.max_image_size)?;

        let mut predictions = Vec::with_capacity(tensors.len());
        for (augmentation, tensor) in self.config.augmentations.iter().zip(&tensors) {
            let prediction = classifier.predict(tensor)?;
            Self::validate_prediction(&prediction)?;

            tracing::debug!(
                "Variant {} -> cat={:.4}, dog={:.4}",
                augmentation.describe(),
                prediction[0],
                prediction[1]
            );
            predictions.push(prediction);
        }

        self.decide(&predictions)
    }

    /// 纯汇总步骤：均值、标准差、阈值判定
    pub fn decide(&self, predictions: &[ProbabilityVector]) -> Result<Verdict> {
        let stats = PredictionStats::from_predictions(predictions)?;
        Ok(self.decide_from_stats(&stats))
    }

    pub fn decide_from_stats(&self, stats: &PredictionStats) -> Verdict {
        let (class_index, confidence) = stats.top_class();
        let is_unstable = stats.max_std() > self.config.instability_threshold;
        let is_low_confidence = confidence < self.config.confidence_threshold;

        tracing::debug!(
            "TTA stats: mean={:?}, std={:?}, unstable={}, low_confidence={}",
            stats.mean,
            stats.std,
            is_unstable,
            is_low_confidence
        );

        // 两个条件同时成立时原因取 instability
        if is_unstable {
            return Verdict::unknown(confidence, UnknownReason::Instability);
        }
        if is_low_confidence {
            return Verdict::unknown(confidence, UnknownReason::LowConfidence);
        }

        Verdict::success(Label::from_class_index(class_index), confidence)
    }

    fn validate_prediction(prediction: &ProbabilityVector) -> Result<()> {
        if prediction.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(ClassifyError::Inference(format!(
                "Classifier returned invalid probabilities: {:?}",
                prediction
            )));
        }

        let sum: f32 = prediction.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(ClassifyError::Inference(format!(
                "Classifier probabilities sum to {} instead of 1",
                sum
            )));
        }

        Ok(())
    }
}
