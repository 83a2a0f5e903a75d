// HTTP front end: POST /process-image

use crate::error::ExtractError;
use crate::image_analyzer::{ImageAnalyzer, StatsRecord};
use anyhow::Result;
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use log::{error, info};
use serde::Serialize;
use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use tempfile::NamedTempFile;
use tokio::{net::TcpListener, sync::Semaphore};
use tower_http::cors::CorsLayer;

pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Uploads live here for the duration of one request.
    pub upload_dir: PathBuf,
    pub allowed_origin: String,
    /// Number of extractions allowed to run at the same time.
    pub ocr_workers: usize,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("temp_uploads"),
            allowed_origin: "https://eafc-dashboard-mvp.vercel.app".to_string(),
            ocr_workers: 1,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

#[derive(Clone)]
struct AppState {
    analyzer: Arc<ImageAnalyzer>,
    upload_dir: Arc<PathBuf>,
    ocr_permits: Arc<Semaphore>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// A failed request, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        if err.is_bad_input() {
            ApiError::bad_request(err.to_string())
        } else {
            ApiError::internal(format!("processing failed: {err}"))
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Build the application router. Creates the upload directory if needed.
pub fn router(analyzer: ImageAnalyzer, config: &ServerConfig) -> Result<Router> {
    std::fs::create_dir_all(&config.upload_dir)?;

    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_str(&config.allowed_origin)?)
        .allow_methods([Method::POST]);

    let state = AppState {
        analyzer: Arc::new(analyzer),
        upload_dir: Arc::new(config.upload_dir.clone()),
        ocr_permits: Arc::new(Semaphore::new(config.ocr_workers.max(1))),
    };

    Ok(Router::new()
        .route("/process-image", post(process_image))
        .route_layer(cors)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state))
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Done");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down gracefully..."),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }
}

struct Upload {
    file_name: String,
    data: Vec<u8>,
}

async fn process_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<StatsRecord>, ApiError> {
    let upload = read_image_field(multipart?).await?;
    let now = Instant::now();

    let temp = persist_upload(&state.upload_dir, &upload)
        .map_err(|e| ApiError::internal(format!("could not store upload: {e}")))?;

    let _permit = state
        .ocr_permits
        .acquire()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    // The temp file moves into the task so it is removed only after the
    // extraction is done with it, even if the client went away.
    let analyzer = state.analyzer.clone();
    let result = tokio::task::spawn_blocking(move || {
        let result = analyzer.analyze_file(temp.path());
        if let Err(e) = temp.close() {
            error!("Could not remove temporary upload: {}", e);
        }
        result
    })
    .await
    .map_err(|e| ApiError::internal(format!("processing task failed: {e}")))?;

    match result {
        Ok(record) => {
            info!(
                "Processed '{}' ({} bytes) in {} ms",
                upload.file_name,
                upload.data.len(),
                now.elapsed().as_millis()
            );
            Ok(Json(record))
        }
        Err(err) => {
            error!("Processing '{}' failed: {}", upload.file_name, err);
            Err(err.into())
        }
    }
}

async fn read_image_field(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(ApiError::bad_request("no file selected"));
        }

        let data = field.bytes().await?.to_vec();
        return Ok(Upload { file_name, data });
    }

    Err(ApiError::bad_request("no image file sent"))
}

/// Write the upload under a random name, keeping a plain extension so the
/// file stays recognizable when inspecting the directory.
fn persist_upload(dir: &Path, upload: &Upload) -> std::io::Result<NamedTempFile> {
    let suffix = Path::new(&upload.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&suffix)
        .tempfile_in(dir)?;
    file.write_all(&upload.data)?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_are_client_errors() {
        let err: ApiError = ExtractError::ImageDecode("bad".to_string()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: ApiError = ExtractError::Ocr {
            region: "circulo_time1_dribles",
            message: "engine gone".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("circulo_time1_dribles"));
    }

    #[test]
    fn upload_keeps_safe_extension() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let upload = Upload {
            file_name: "match.PNG".to_string(),
            data: vec![1, 2, 3],
        };
        let file = persist_upload(dir.path(), &upload)?;
        assert!(file.path().to_string_lossy().ends_with(".PNG"));
        assert_eq!(std::fs::read(file.path())?, vec![1, 2, 3]);

        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn upload_drops_odd_extension() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let upload = Upload {
            file_name: "shot.p n;g".to_string(),
            data: vec![],
        };
        let file = persist_upload(dir.path(), &upload)?;
        assert!(file.path().extension().is_none());
        Ok(())
    }
}
