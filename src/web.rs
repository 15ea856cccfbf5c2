//
// web.rs
// Dicom-Convert-rs
//
// Axum-based HTTP server exposing single-file DICOM to JPEG conversion and a liveness probe.
//

use std::net::SocketAddr;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection}, DefaultBodyLimit, Multipart,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::convert;
use crate::error::{ConvertError, ErrorKind};
use crate::models::OutputFormat;

const UPLOAD_FIELD: &str = "file";
const DOWNLOAD_DISPOSITION: &str = "attachment; filename=\"converted.jpg\"";

/// Listener and request limits for the conversion service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: 256 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFile,

    #[error("Empty filename")]
    EmptyFilename,

    #[error("Uploaded file too large")]
    TooLarge,

    #[error("Failed to convert DICOM")]
    Conversion(#[from] ConvertError),

    #[error("Failed to convert DICOM")]
    Internal(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NoFile | ApiError::EmptyFilename | ApiError::TooLarge => {
                ErrorKind::RequestMalformed
            }
            ApiError::Conversion(e) => e.kind(),
            ApiError::Internal(_) => ErrorKind::EncodeFailure,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFile | ApiError::EmptyFilename => StatusCode::BAD_REQUEST,
            ApiError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Conversion(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        // The display text is the public message; causes only reach the log.
        match &self {
            ApiError::Conversion(e) => error!(?kind, "conversion failed: {}", e),
            ApiError::Internal(msg) => error!(?kind, "conversion task failed: {}", msg),
            _ => warn!(?kind, status = status.as_u16(), "rejected request: {}", self),
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the router with all endpoints and middleware.
pub fn build_router(config: &ServiceConfig) -> Router {
    Router::new()
        .route("/convert", post(convert_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bootstraps the Axum HTTP server and serves until the process stops.
pub async fn start_server(config: ServiceConfig) -> anyhow::Result<()> {
    let app = build_router(&config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler() -> Json<HealthBody> {
    Json(HealthBody { status: "healthy" })
}

async fn convert_handler(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        warn!("rejected upload: {}", rejection);
        ApiError::NoFile
    })?;

    let data = read_upload(&mut multipart).await?;
    let jpeg = tokio::task::spawn_blocking(move || {
        convert::convert_bytes(&data, OutputFormat::Jpg)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(OutputFormat::Jpg.mime_type()),
            ),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static(DOWNLOAD_DISPOSITION),
            ),
        ],
        jpeg,
    )
        .into_response())
}

/// Finds the first file part named "file" and pulls its bytes eagerly.
async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(ApiError::NoFile),
            Err(e) => return Err(upload_error(e)),
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        // Plain form values under the same name are not uploads.
        match field.file_name() {
            None => continue,
            Some("") => return Err(ApiError::EmptyFilename),
            Some(_) => {}
        }

        let data = field.bytes().await.map_err(upload_error)?;
        return Ok(data.to_vec());
    }
}

/// Body-limit overruns surface as multipart errors carrying a 413 status.
fn upload_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::TooLarge
    } else {
        warn!("malformed multipart body: {}", err);
        ApiError::NoFile
    }
}
