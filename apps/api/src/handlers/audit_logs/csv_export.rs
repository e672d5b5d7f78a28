use axum::http::{HeaderMap, HeaderValue, header};
use serde::Serialize;

use super::*;

const CSV_HEADER: [&str; 14] = [
    "id",
    "createdAt",
    "actor",
    "actorType",
    "action",
    "targetRef",
    "severity",
    "requestId",
    "ipHash",
    "userAgent",
    "metadata",
    "diff",
    "metadataRedacted",
    "diffRedacted",
];

const REDACTED_CELL: &str = "[redacted]";

pub(super) fn csv_response(
    target_ref: &str,
    items: &[AuditLogEntryResponse],
    next_page_token: Option<&str>,
) -> ApiResult<Response> {
    let body = render_csv(items).map_err(|error| {
        tracing::error!(target_ref = %target_ref, error = %error, "failed to render audit csv");
        ApiError::internal("export_failed", "failed to render audit log export")
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!(
            "attachment; filename=\"{}\"",
            export_filename(target_ref)
        ))
        .map_err(|_| ApiError::internal("export_failed", "invalid export filename"))?,
    );
    if let Some(token) = next_page_token {
        headers.insert(
            "x-next-page-token",
            HeaderValue::from_str(token)
                .map_err(|_| ApiError::internal("export_failed", "invalid page token"))?,
        );
    }

    Ok((StatusCode::OK, headers, body).into_response())
}

pub(super) fn export_filename(target_ref: &str) -> String {
    let slug: String = target_ref
        .replace('/', "-")
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | ':'))
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "audit-logs.csv".to_owned()
    } else {
        format!("audit-logs-{slug}.csv")
    }
}

fn render_csv(items: &[AuditLogEntryResponse]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for item in items {
        let metadata_redacted = item.metadata_redacted.unwrap_or(false);
        let diff_redacted = item.diff_redacted.unwrap_or(false);
        writer.write_record([
            item.id.clone(),
            item.created_at.clone(),
            item.actor.clone(),
            item.actor_type.clone(),
            item.action.clone(),
            item.target_ref.clone(),
            item.severity.clone().unwrap_or_default(),
            item.request_id.clone().unwrap_or_default(),
            item.ip_hash.clone().unwrap_or_default(),
            item.user_agent.clone().unwrap_or_default(),
            json_cell(item.metadata.as_ref(), metadata_redacted)?,
            json_cell(item.diff.as_ref(), diff_redacted)?,
            metadata_redacted.to_string(),
            diff_redacted.to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|error| ExportError::Flush(error.to_string()))
}

fn json_cell<T: Serialize>(value: Option<&T>, redacted: bool) -> Result<String, ExportError> {
    if redacted {
        return Ok(REDACTED_CELL.to_owned());
    }
    match value {
        Some(value) => Ok(serde_json::to_string(value)?),
        None => Ok(String::new()),
    }
}

#[derive(Debug, thiserror::Error)]
enum ExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to flush csv writer: {0}")]
    Flush(String),
}
