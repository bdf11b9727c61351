//! REST API types for the preview screen.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::CellValue;
use crate::transform::pipeline::{PipelineResult, SheetInfo};

/// Response sent after an upload is processed for preview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// Job id of the run, matching the `jobId` of its log entries
    pub job_id: String,

    /// Status: "ready" or "warning" (some derived columns skipped)
    pub status: String,

    /// Output column order
    pub columns: Vec<String>,

    /// First rows of the processed sheet, aligned with `columns`
    pub rows: Vec<Vec<CellValue>>,

    /// Suggested download name
    pub file_name: String,

    pub metadata: PreviewMetadata,
}

/// Counts and messages about the run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewMetadata {
    /// Rows in the processed sheet (not only the preview)
    pub total_rows: usize,

    /// Rows removed by the quantity filter
    pub dropped_rows: usize,

    /// Whether `rows` holds fewer rows than `total_rows`
    pub truncated: bool,

    /// One message per missing column
    pub warnings: Vec<String>,

    pub element_query_param: String,

    pub sheet: SheetInfo,
}

impl PreviewResponse {
    pub fn from_result(result: &PipelineResult, preview_rows: usize, element_query_param: &str) -> Self {
        let preview = result.dataset.head(preview_rows);
        let total_rows = result.dataset.row_count();

        PreviewResponse {
            job_id: result.job_id.clone(),
            status: if result.warnings.is_empty() { "ready" } else { "warning" }.to_string(),
            columns: preview.columns().to_vec(),
            rows: preview.rows().to_vec(),
            file_name: result.file_name.clone(),
            metadata: PreviewMetadata {
                total_rows,
                dropped_rows: result.dropped_rows,
                truncated: total_rows > preview.row_count(),
                warnings: result.warning_messages(),
                element_query_param: element_query_param.to_string(),
                sheet: result.sheet_info.clone(),
            },
        }
    }
}

/// Multipart upload: the file and the optional form fields
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub bytes: Option<Vec<u8>>,
    pub file_name: Option<String>,
    /// `elementQueryParam` field
    pub element_query_param: Option<String>,
    /// `previewRows` field
    pub preview_rows: Option<usize>,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    error_response_with(error, &[])
}

/// Error response listing individual problems (e.g. each missing column)
pub fn error_response_with(error: &str, details: &[String]) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "details": details,
        "columns": [],
        "rows": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessOptions;
    use crate::transform::pipeline::process_bytes;

    #[test]
    fn test_preview_response_shape() {
        let csv = "Hoeveelheid;Hours;Meeteenheid\n1;1;m\n2;2;m2\n3;3;m3\n";
        let result = process_bytes(csv.as_bytes(), Some("m.csv"), &ProcessOptions::default()).unwrap();

        let response = PreviewResponse::from_result(&result, 2, "Code métré");
        assert_eq!(response.job_id, result.job_id);
        assert_eq!(response.status, "warning");
        assert_eq!(response.rows.len(), 2);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["fileName"], "m Processed.xlsx");
        assert_eq!(json["metadata"]["totalRows"], 3);
        assert_eq!(json["metadata"]["truncated"], true);
        assert_eq!(json["metadata"]["sheet"]["format"], "delimited");
        assert_eq!(json["columns"][4], "Quantity Type");
        assert_eq!(json["rows"][0][3], 8.0);
        assert_eq!(
            json["metadata"]["warnings"][0],
            "Error: 'ID Klant' column not found in the file."
        );
    }

    #[test]
    fn test_error_response() {
        let json = error_response_with("missing columns", &["a".to_string()]);
        assert_eq!(json["status"], "error");
        assert_eq!(json["details"][0], "a");
    }
}
