//! HTTP Server for the metre API.
//!
//! The handlers are thin: they read the multipart upload, run the pipeline,
//! and return either the preview JSON or the processed workbook.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                              |
//! |--------|-------------------|------------------------------------------|
//! | GET    | `/health`         | Health check                             |
//! | POST   | `/api/preview`    | Upload a sheet, get the processed preview|
//! | POST   | `/api/process`    | Upload a sheet, download the processed xlsx |
//! | GET    | `/api/logs`       | SSE stream for real-time logs            |
//!
//! Both upload endpoints take a multipart form with a `file` part and an
//! optional `elementQueryParam` field. `/api/preview` also reads `previewRows`.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, error_response_with, PreviewResponse, UploadForm};
use crate::config::ProcessOptions;
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::export::XLSX_MIME;
use crate::transform::pipeline::{process_bytes, PipelineResult};

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Header carrying the missing-column messages of a download.
pub const WARNINGS_HEADER: &str = "x-metre-warnings";

/// Header carrying the job id of a download, as tagged on its log entries.
pub const JOB_ID_HEADER: &str = "x-metre-job-id";

/// Start the HTTP server
pub async fn start_server(port: u16, options: ProcessOptions) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(options);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Metre server running on http://localhost:{}", port);
    println!("   POST /api/preview - Upload sheet, get preview JSON");
    println!("   POST /api/process - Upload sheet, download processed xlsx");
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// All routes, with `options` as the defaults for every upload.
pub fn router(options: ProcessOptions) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([
            header::CONTENT_TYPE,
            header::CONTENT_DISPOSITION,
            header::HeaderName::from_static(WARNINGS_HEADER),
            header::HeaderName::from_static(JOB_ID_HEADER),
        ]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/preview", post(preview))
        .route("/api/process", post(process))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(options)
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "metre",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "preview": "POST /api/preview",
            "process": "POST /api/process",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip the entries they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload a sheet and return the processed preview
async fn preview(
    State(defaults): State<ProcessOptions>,
    multipart: Multipart,
) -> ServerResult<Json<PreviewResponse>> {
    let form = read_upload(multipart).await?;
    let options = defaults
        .with_element_query_param(form.element_query_param.clone())
        .with_preview_rows(form.preview_rows);

    let result = run_pipeline(form, options.clone()).await?;
    Ok(Json(PreviewResponse::from_result(
        &result,
        options.preview_rows,
        &options.element_query_param,
    )))
}

/// Upload a sheet and download the processed workbook
async fn process(
    State(defaults): State<ProcessOptions>,
    multipart: Multipart,
) -> ServerResult<Response> {
    let form = read_upload(multipart).await?;
    let options = defaults.with_element_query_param(form.element_query_param.clone());

    let result = run_pipeline(form, options).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(XLSX_MIME));
    let disposition = content_disposition(&result.file_name);
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).map_err(|e| ServerError::Internal(e.to_string()))?,
    );
    if let Ok(value) = HeaderValue::from_str(&result.job_id) {
        headers.insert(header::HeaderName::from_static(JOB_ID_HEADER), value);
    }
    if !result.warnings.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&result.warning_messages().join(" | ")) {
            headers.insert(header::HeaderName::from_static(WARNINGS_HEADER), value);
        }
    }

    Ok((StatusCode::OK, headers, result.output).into_response())
}

/// Collect the `file` part and form fields of an upload.
async fn read_upload(mut multipart: Multipart) -> ServerResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                form.bytes = Some(bytes.to_vec());
            }
            "elementQueryParam" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                form.element_query_param = Some(text);
            }
            "previewRows" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                let rows = text
                    .trim()
                    .parse()
                    .map_err(|_| ServerError::BadRequest(format!("Invalid previewRows: {}", text)))?;
                form.preview_rows = Some(rows);
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn run_pipeline(form: UploadForm, options: ProcessOptions) -> ServerResult<PipelineResult> {
    let bytes = form
        .bytes
        .ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;
    let file_name = form.file_name;

    let result = tokio::task::spawn_blocking(move || process_bytes(&bytes, file_name.as_deref(), &options))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(result)
}

/// `attachment` disposition with an ASCII fallback and the UTF-8 name.
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        percent_encode(file_name)
    )
}

/// RFC 5987 value encoding: everything but unreserved characters is escaped.
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, error_response(msg)),
            ServerError::Pipeline(PipelineError::Sheet(e)) => {
                (StatusCode::BAD_REQUEST, error_response(&e.to_string()))
            }
            ServerError::Pipeline(PipelineError::Columns(errors)) => {
                let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    error_response_with("Required columns are missing", &details),
                )
            }
            ServerError::Pipeline(e) => (StatusCode::INTERNAL_SERVER_ERROR, error_response(&e.to_string())),
            ServerError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, error_response(msg)),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "metre-test-boundary";

    fn multipart_body(file_name: &str, content: &str, fields: &[(&str, &str)]) -> String {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n{c}\r\n",
            b = BOUNDARY,
            f = file_name,
            c = content
        );
        for (name, value) in fields {
            body.push_str(&format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"{n}\"\r\n\r\n{v}\r\n",
                b = BOUNDARY,
                n = name,
                v = value
            ));
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));
        body
    }

    fn upload(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const CSV: &str = "Hoeveelheid;Hours;Meeteenheid;ID Klant\n10;0;M3;A1\n0;5;st;A2";

    #[tokio::test]
    async fn test_health() {
        let response = router(ProcessOptions::default())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_preview_endpoint() {
        let body = multipart_body("Meetstaat.csv", CSV, &[("elementQueryParam", "Code")]);
        let response = router(ProcessOptions::default())
            .oneshot(upload("/api/preview", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ready");
        assert_eq!(json["fileName"], "Meetstaat Processed.xlsx");
        assert_eq!(json["metadata"]["droppedRows"], 1);
        assert_eq!(json["rows"][0][8], "['Code'] = 'A1'");
    }

    #[tokio::test]
    async fn test_process_endpoint_returns_workbook() {
        let body = multipart_body("Meetstaat.csv", "Hoeveelheid;Hours;ID Klant\n2;1;K1", &[]);
        let response = router(ProcessOptions::default())
            .oneshot(upload("/api/process", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], XLSX_MIME);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.contains("Meetstaat%20Processed.xlsx"));
        assert!(response.headers().contains_key(WARNINGS_HEADER));
        assert!(response.headers().contains_key(JOB_ID_HEADER));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_missing_quantity_is_unprocessable() {
        let body = multipart_body("m.csv", "Hours;ID Klant\n1;K1", &[]);
        let response = router(ProcessOptions::default())
            .oneshot(upload("/api/preview", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = json_body(response).await;
        assert_eq!(json["details"][0], "Error: 'Hoeveelheid' column not found in the file.");
    }

    #[tokio::test]
    async fn test_upload_without_file_is_bad_request() {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"elementQueryParam\"\r\n\r\nCode\r\n--{b}--\r\n",
            b = BOUNDARY
        );
        let response = router(ProcessOptions::default())
            .oneshot(upload("/api/process", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_content_disposition_encodes_utf8() {
        let value = content_disposition("Métré Processed.xlsx");
        assert_eq!(
            value,
            "attachment; filename=\"M_tr_ Processed.xlsx\"; filename*=UTF-8''M%C3%A9tr%C3%A9%20Processed.xlsx"
        );
    }
}
