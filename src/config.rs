use crate::image::Augmentation;
use crate::utils::error::ClassifyError;
use crate::Result;
use serde::Serialize;
use std::path::PathBuf;

/// 默认允许的前端来源
pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:3000",
];

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// ONNX 模型文件路径
    pub model_path: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,

    /// TTA 判定配置
    pub tta_config: TtaConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,

    /// 允许跨域的来源
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TtaConfig {
    /// 有序的增强列表，每项对应一次模型调用
    pub augmentations: Vec<Augmentation>,

    /// 平均置信度低于该值判为 unknown
    pub confidence_threshold: f32,

    /// 任一类别标准差超过该值判为不稳定
    pub instability_threshold: f32,
}

impl Default for TtaConfig {
    fn default() -> Self {
        Self {
            augmentations: vec![
                Augmentation::identity(),
                Augmentation::flip(),
                Augmentation::zoom(1.2),
            ],
            confidence_threshold: 0.98,
            instability_threshold: 0.15,
        }
    }
}

impl TtaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.augmentations.is_empty() {
            return Err(ClassifyError::Config(
                "At least one augmentation is required".to_string(),
            ));
        }

        for augmentation in &self.augmentations {
            augmentation
                .validate()
                .map_err(|e| ClassifyError::Config(e.to_string()))?;
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ClassifyError::Config(format!(
                "Confidence threshold must be between 0.0 and 1.0, got {}",
                self.confidence_threshold
            )));
        }

        if !self.instability_threshold.is_finite() || self.instability_threshold < 0.0 {
            return Err(ClassifyError::Config(format!(
                "Instability threshold must be >= 0.0, got {}",
                self.instability_threshold
            )));
        }

        Ok(())
    }
}

impl Config {
    pub fn new(
        bind_addr: String,
        model_path: impl Into<PathBuf>,
        workers: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);
        if workers == 0 {
            return Err(ClassifyError::Config("Worker count must be positive".to_string()));
        }

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: 20 * 1024 * 1024, // 20MB
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            bind_addr,
            model_path: model_path.into(),
            workers,
            dev_mode,
            onnx_config,
            server_config,
            tta_config: TtaConfig::default(),
        })
    }

    pub fn with_tta(mut self, tta_config: TtaConfig) -> Result<Self> {
        tta_config.validate()?;
        self.tta_config = tta_config;
        Ok(self)
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        if !origins.is_empty() {
            self.server_config.cors_origins = origins;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_recipe_is_identity_flip_zoom() {
        let tta = TtaConfig::default();
        assert_eq!(
            tta.augmentations,
            vec![Augmentation::identity(), Augmentation::flip(), Augmentation::zoom(1.2)]
        );
        assert_eq!(tta.confidence_threshold, 0.98);
        assert_eq!(tta.instability_threshold, 0.15);
        assert!(tta.validate().is_ok());
    }

    #[test]
    fn empty_recipe_is_rejected() {
        let tta = TtaConfig {
            augmentations: Vec::new(),
            ..TtaConfig::default()
        };
        assert!(matches!(tta.validate(), Err(ClassifyError::Config(_))));
    }

    #[test]
    fn out_of_range_thresholds_are_rejected() {
        let config = Config::new("127.0.0.1:0".to_string(), "model.onnx", Some(1), false).unwrap();
        let tta = TtaConfig {
            confidence_threshold: 1.5,
            ..TtaConfig::default()
        };
        assert!(config.with_tta(tta).is_err());
    }

    #[test]
    fn cors_origins_fall_back_to_defaults() {
        let config = Config::new("127.0.0.1:0".to_string(), "model.onnx", Some(1), false)
            .unwrap()
            .with_cors_origins(Vec::new());
        assert_eq!(config.server_config.cors_origins.len(), 3);
        assert_eq!(config.server_config.cors_origins[0], "http://localhost:5173");
    }
}
