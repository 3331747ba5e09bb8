use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::Html,
    routing::{get, post},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::AppConfig,
    error::ServiceError,
    model::{InferenceInvoker, ModelMetadata},
    pipeline::{UploadedImage, colorize_upload},
};

const IMAGE_FIELD: &str = "image";
const LANDING_PAGE: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub invoker: InferenceInvoker,
}

#[derive(Debug, Serialize)]
pub struct EnhanceResponse {
    pub image: String,
    pub format: &'static str,
    pub success: bool,
}

#[derive(Debug, Serialize)]
struct MetadataResponse {
    model: ModelMetadata,
    max_upload_bytes: usize,
}

pub fn build_router(config: Arc<AppConfig>, invoker: InferenceInvoker) -> Router {
    let body_limit = config.max_upload_bytes;
    let state = AppState { config, invoker };

    Router::new()
        .route("/", get(landing_page))
        .route("/health", get(health))
        .route("/metadata", get(metadata))
        .route("/enhance", post(enhance))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn landing_page() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

async fn health() -> &'static str {
    "ok"
}

async fn metadata(State(state): State<AppState>) -> Json<MetadataResponse> {
    Json(MetadataResponse {
        model: state.invoker.metadata(),
        max_upload_bytes: state.config.max_upload_bytes,
    })
}

async fn enhance(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<EnhanceResponse>, ServiceError> {
    // A body that is not multipart carries no files at all.
    let multipart =
        multipart.map_err(|_| ServiceError::Validation("No image provided".into()))?;
    let upload = read_image_field(multipart).await?;

    let png = colorize_upload(state.invoker.clone(), upload).await?;
    info!(bytes = png.len(), "returning colorized image");

    Ok(Json(EnhanceResponse {
        image: STANDARD.encode(png),
        format: "png",
        success: true,
    }))
}

async fn read_image_field(mut multipart: Multipart) -> Result<UploadedImage, ServiceError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        // A part without a filename is a plain form value, not a file.
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        return Ok(UploadedImage {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(ServiceError::Validation("No image provided".into()))
}

fn multipart_error(err: MultipartError) -> ServiceError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServiceError::PayloadTooLarge(err.body_text())
    } else {
        ServiceError::Validation(format!("malformed upload: {}", err.body_text()))
    }
}
