//! HTTP presentation layer.
//!
//! Collects the uploaded image and backend choice, pushes the request
//! through the admission gate and the pipeline, and returns the resulting
//! artifact reference as JSON. Extracted WAV files are served from the
//! work directory under `/files`.

use crate::admission::AdmissionGate;
use crate::models::{BackendKind, ImageReference, MediaArtifact};
use crate::pipeline::Pipeline;
use crate::Error;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use uuid::Uuid;

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub gate: Arc<AdmissionGate>,
    pub work_dir: PathBuf,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub backend: BackendKind,
    pub artifact: MediaArtifact,
}

#[derive(Serialize)]
pub struct CompareEntry {
    pub backend: BackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<MediaArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct CompareResponse {
    pub caption: String,
    pub results: Vec<CompareEntry>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/generate", post(generate_handler))
        .route("/api/compare", post(compare_handler))
        .nest_service("/files", ServeDir::new(state.work_dir.clone()))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Image input as supplied by the multipart form.
enum UploadedImage {
    File { filename: String, data: Vec<u8> },
    Url(String),
}

#[tracing::instrument(skip(state, multipart))]
pub async fn generate_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    let (image, backend) = match parse_request_fields(multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let backend = match backend {
        Some(backend) => backend,
        None => return bad_request("Missing 'backend' field"),
    };

    let _permit = match state.gate.admit().await {
        Ok(permit) => permit,
        Err(e) => return error_response(&e),
    };

    let (image_ref, upload_path) = match materialize_image(&state, image).await {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    let result = state.pipeline.run(&image_ref, backend).await;
    discard_upload(upload_path).await;

    match result {
        Ok(artifact) => (
            StatusCode::OK,
            Json(GenerateResponse {
                backend,
                artifact: published(&state, artifact),
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

#[tracing::instrument(skip(state, multipart))]
pub async fn compare_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    let (image, _) = match parse_request_fields(multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    let _permit = match state.gate.admit().await {
        Ok(permit) => permit,
        Err(e) => return error_response(&e),
    };

    let (image_ref, upload_path) = match materialize_image(&state, image).await {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    let result = state.pipeline.run_all(&image_ref).await;
    discard_upload(upload_path).await;

    match result {
        Ok(comparison) => {
            let results = comparison
                .results
                .into_iter()
                .map(|(backend, outcome)| match outcome {
                    Ok(artifact) => CompareEntry {
                        backend,
                        artifact: Some(published(&state, artifact)),
                        error: None,
                    },
                    Err(e) => CompareEntry {
                        backend,
                        artifact: None,
                        error: Some(e.to_string()),
                    },
                })
                .collect();

            (
                StatusCode::OK,
                Json(CompareResponse {
                    caption: comparison.caption.to_string(),
                    results,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn parse_request_fields(
    mut multipart: Multipart,
) -> std::result::Result<(UploadedImage, Option<BackendKind>), Response> {
    let mut image = None;
    let mut backend = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart body");
                return Err(bad_request(&format!("Failed to read multipart: {}", e)));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = match field.bytes().await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(e) => return Err(bad_request(&format!("Failed to read image: {}", e))),
                };
                if data.is_empty() {
                    return Err(bad_request("Uploaded image is empty"));
                }
                image = Some(UploadedImage::File { filename, data });
            }
            "image_url" => {
                let url = match field.text().await {
                    Ok(text) => text,
                    Err(e) => return Err(bad_request(&format!("Failed to read image_url: {}", e))),
                };
                image = Some(UploadedImage::Url(url));
            }
            "backend" => {
                let value = match field.text().await {
                    Ok(text) => text,
                    Err(e) => return Err(bad_request(&format!("Failed to read backend: {}", e))),
                };
                match value.parse::<BackendKind>() {
                    Ok(kind) => backend = Some(kind),
                    Err(message) => return Err(bad_request(&message)),
                }
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    match image {
        Some(image) => Ok((image, backend)),
        None => Err(bad_request("No image provided")),
    }
}

/// Turn the uploaded image into an [`ImageReference`], writing file uploads
/// to a request-unique path in the work directory.
async fn materialize_image(
    state: &AppState,
    image: UploadedImage,
) -> std::result::Result<(ImageReference, Option<PathBuf>), Response> {
    match image {
        UploadedImage::Url(url) => Ok((ImageReference::Url(url), None)),
        UploadedImage::File { filename, data } => {
            let extension = Path::new(&filename)
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("png");
            let path = state
                .work_dir
                .join(format!("upload_{}.{}", Uuid::new_v4(), extension));

            if let Err(e) = tokio::fs::write(&path, &data).await {
                tracing::error!(error = %e, "Failed to store uploaded image");
                return Err(error_response(&Error::Io(e)));
            }
            Ok((ImageReference::Path(path.clone()), Some(path)))
        }
    }
}

/// Uploads are not retained once the response is produced.
async fn discard_upload(path: Option<PathBuf>) {
    if let Some(path) = path {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::debug!(error = %e, "Failed to remove uploaded image");
        }
    }
}

/// Rewrite work-dir artifact paths to their `/files` serving URL.
fn published(state: &AppState, artifact: MediaArtifact) -> MediaArtifact {
    let path = Path::new(&artifact.location);
    if path.starts_with(&state.work_dir) {
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            return MediaArtifact {
                location: format!("/files/{}", name),
                kind: artifact.kind,
            };
        }
    }
    artifact
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::CapacityExceeded => StatusCode::TOO_MANY_REQUESTS,
        Error::BackendUnavailable(_) | Error::BackendNotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::CaptionFormat(_) | Error::BackendInvocation(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &Error) -> Response {
    (
        status_for(error),
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&Error::CapacityExceeded),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_for(&Error::BackendNotReady("loading".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&Error::BackendUnavailable("down".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&Error::CaptionFormat("bad".to_string())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status_for(&Error::NoAudioTrack), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_published_rewrites_work_dir_paths() {
        let state = AppState {
            pipeline: Arc::new(Pipeline::with_services(crate::pipeline::PipelineServices {
                caption: Box::new(crate::caption::MockCaptioner::new()),
                backends: vec![],
                extractor: Box::new(crate::media::MockAudioExtractor::new()),
            })),
            gate: Arc::new(AdmissionGate::new(1, 1)),
            work_dir: PathBuf::from("/tmp/image2sfx"),
        };

        let local = MediaArtifact::audio("/tmp/image2sfx/sfx_abc.wav");
        assert_eq!(published(&state, local).location, "/files/sfx_abc.wav");

        let remote = MediaArtifact::audio("https://space.test/file=/tmp/out.wav");
        assert_eq!(
            published(&state, remote).location,
            "https://space.test/file=/tmp/out.wav"
        );
    }
}
