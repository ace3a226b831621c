use crate::{
    tta::Verdict,
    utils::error::ClassifyError,
    web::{extractors::RequestId, AppState},
    Result,
};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Json,
};
use serde_json::{json, Value};
use std::time::Instant;

/// 存活检查
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Dogs vs Cats Classifier API" }))
}

/// Multipart 图片上传 -> TTA 判定
pub async fn predict_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Verdict>> {
    // 模型未加载时直接失败，不读取上传内容
    let classifier = state.models.classifier()?;
    let multipart = multipart
        .map_err(|e| ClassifyError::InvalidInput(format!("Invalid multipart request: {}", e)))?;

    let start_time = Instant::now();
    tracing::info!("Processing predict request: request_id={}", request_id);

    let image_data = read_image_field(multipart).await?;
    tracing::debug!(
        "Received file: request_id={}, {} bytes",
        request_id,
        image_data.len()
    );

    let engine = state.engine.clone();
    let verdict = tokio::task::spawn_blocking(move || {
        engine.predict(classifier.as_ref(), &image_data)
    })
    .await
    .map_err(|e| ClassifyError::Internal(format!("Inference task failed: {}", e)))??;

    tracing::info!(
        "Predict completed: request_id={}, label={}, confident={}, confidence={:.4}, reason={:?}, time={:.3}s",
        request_id,
        verdict.label.as_str(),
        verdict.is_confident(),
        verdict.confidence,
        verdict.reason,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(verdict))
}

async fn read_image_field(mut multipart: Multipart) -> Result<Bytes> {
    let mut image_data: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ClassifyError::InvalidInput(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();

        if field_name != "file" {
            tracing::debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        // 验证内容类型
        if let Some(content_type) = field.content_type() {
            if !content_type.starts_with("image/") && content_type != "application/octet-stream" {
                return Err(ClassifyError::UnsupportedFormat(content_type.to_string()));
            }
        }

        let data = field.bytes().await.map_err(|e| {
            ClassifyError::InvalidInput(format!("Failed to read file data: {}", e))
        })?;

        if data.is_empty() {
            return Err(ClassifyError::InvalidInput("Empty file".to_string()));
        }

        image_data = Some(data);
    }

    image_data.ok_or_else(|| ClassifyError::InvalidInput("No image file provided".to_string()))
}

/// 健康检查端点
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let model_loaded = state.models.is_loaded();
    let status = if model_loaded { "healthy" } else { "degraded" };

    Json(json!({
        "status": status,
        "model_loaded": model_loaded,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 服务信息端点
pub async fn info_handler(State(state): State<AppState>) -> Json<Value> {
    let stats = state.models.get_stats(&state.config);
    let tta = state.engine.config();

    Json(json!({
        "service": "Dogs vs Cats Classifier API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": stats,
        "classes": crate::tta::CLASS_NAMES,
        "tta": {
            "augmentations": tta.augmentations.iter().map(|a| a.describe()).collect::<Vec<_>>(),
            "confidence_threshold": tta.confidence_threshold,
            "instability_threshold": tta.instability_threshold
        }
    }))
}
