use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use log::info;
use std::collections::HashMap;

use crate::analysis::{CaptureSummary, FilterEngine};
use crate::api::AppState;
use crate::models::filter::{FilterCriteria, FilterForm};
use crate::utils::error::{AppError, AppResult};

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

/// Filter criteria carried in a query string. Unknown keys are ignored and
/// unparsable bounds are treated as unset.
pub(crate) fn criteria_from_query(params: &HashMap<String, String>) -> AppResult<FilterCriteria> {
    let form: FilterForm = serde_json::from_value(serde_json::to_value(params)?)?;
    Ok(FilterCriteria::from(form))
}

fn number_param(params: &HashMap<String, String>, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// List loaded captures
pub async fn list_captures(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.store.list())
}

/// Get the summary statistics of a capture
pub async fn get_summary(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let capture = state.store.get(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(CaptureSummary::from_records(&capture.packets)))
}

/// Get the dashboard panels of a capture
pub async fn get_dashboard(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let capture = state.store.get(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(&capture.dashboard))
}

/// Get one page of the packet table, narrowed by the filter criteria and
/// the free-text search term `q`
pub async fn get_packets(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
) -> AppResult<HttpResponse> {
    let capture_id = path.into_inner();
    let params = query.into_inner();

    let criteria = criteria_from_query(&params)?;
    let term = params.get("q").cloned().unwrap_or_default();
    let offset = number_param(&params, "offset", 0);
    let limit = number_param(&params, "limit", DEFAULT_LIMIT).min(MAX_LIMIT);

    let matches = FilterEngine::predicate(&criteria);
    let page = state.store.query(
        &capture_id,
        |record| matches(record) && FilterEngine::search(record, &term),
        offset,
        limit,
    )?;

    info!(
        "Retrieved {} packets from {} (offset: {}, limit: {}, matched: {})",
        page.packets.len(),
        capture_id,
        offset,
        limit,
        page.total
    );

    Ok(HttpResponse::Ok().json(page))
}

/// Read the file a capture was loaded from. Captures inserted without a
/// source file have nothing to serve.
async fn capture_source(state: &AppState, capture_id: &str) -> AppResult<Vec<u8>> {
    let capture = state.store.get(capture_id)?;
    let source = capture
        .source
        .as_ref()
        .ok_or_else(|| AppError::CaptureNotFound(capture_id.to_string()))?;
    match tokio::fs::read(source).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::CaptureNotFound(capture_id.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Get the capture document exactly as it sits on disk
pub async fn get_raw_capture(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let capture_id = path.into_inner();
    let content = capture_source(&state, &capture_id).await?;
    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(content))
}

/// Download the capture document as a file named after the capture
pub async fn download_capture(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let capture_id = path.into_inner();
    let content = capture_source(&state, &capture_id).await?;
    info!("Serving {} ({} bytes) for download", capture_id, content.len());

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(capture_id)],
        })
        .body(content))
}
