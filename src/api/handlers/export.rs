use actix_web::http::header;
use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::api::AppState;
use crate::models::export::{ControlState, ExportAction, ExportOutcome, ReportRequest};
use crate::models::filter::FilterCriteria;
use crate::utils::error::{AppError, AppResult};

/// State of one export control
#[derive(Serialize)]
struct ControlEntry {
    action: ExportAction,
    #[serde(flatten)]
    control: ControlState,
}

#[derive(Serialize)]
struct ExportResponse {
    status: &'static str,
    result: ExportOutcome,
}

fn filtered_action(kind: &str) -> AppResult<ExportAction> {
    match kind {
        "report" => Ok(ExportAction::FilteredReport),
        "csv" => Ok(ExportAction::FilteredCsv),
        other => Err(AppError::ValidationError(format!(
            "Unknown export '{}', expected report or csv",
            other
        ))),
    }
}

/// Current enabled/label state of every export control
pub async fn get_export_controls(state: web::Data<AppState>) -> HttpResponse {
    let controls: Vec<ControlEntry> = [
        ExportAction::FilteredReport,
        ExportAction::FilteredCsv,
        ExportAction::Report,
    ]
    .into_iter()
    .map(|action| ControlEntry {
        action,
        control: state.exports.get(action).control(),
    })
    .collect();

    HttpResponse::Ok().json(controls)
}

/// Send the current filter criteria to the report service
pub async fn export_filtered(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    criteria: web::Json<FilterCriteria>,
) -> AppResult<HttpResponse> {
    let (capture_id, kind) = path.into_inner();
    let action = filtered_action(&kind)?;
    state.store.get(&capture_id)?;

    let result = state
        .exports
        .get(action)
        .submit_filtered(&capture_id, &criteria)
        .await?;

    Ok(HttpResponse::Ok().json(ExportResponse {
        status: "success",
        result,
    }))
}

/// Request a report made of the selected sections and hand the rendered
/// document back as the service sent it
pub async fn generate_report(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<ReportRequest>,
) -> AppResult<HttpResponse> {
    let capture_id = path.into_inner();
    state.store.get(&capture_id)?;

    let document = state
        .exports
        .report
        .submit_report(&capture_id, &request.options)
        .await?;

    let mut response = HttpResponse::Ok();
    if let Some(content_type) = document.content_type {
        response.insert_header((header::CONTENT_TYPE, content_type));
    }
    if let Some(disposition) = document.content_disposition {
        response.insert_header((header::CONTENT_DISPOSITION, disposition));
    }
    Ok(response.body(document.body))
}
