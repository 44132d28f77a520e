use futures::future::{BoxFuture, FutureExt};
use log::debug;
use reqwest::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::models::export::{
    ExportAction, ExportOutcome, FilteredCsvResponse, FilteredReportResponse, ReportDocument,
};
use crate::models::filter::FilterCriteria;
use crate::utils::error::{AppError, AppResult};

/// The remote service that renders reports and CSV exports
pub trait ReportService: Send + Sync {
    /// `POST` the filter criteria to the endpoint of a filtered export action
    fn submit_filtered<'a>(
        &'a self,
        action: ExportAction,
        capture_id: &'a str,
        criteria: &'a FilterCriteria,
    ) -> BoxFuture<'a, AppResult<ExportOutcome>>;

    /// `GET` a report built from the selected sections
    fn request_report<'a>(
        &'a self,
        capture_id: &'a str,
        options: &'a [String],
    ) -> BoxFuture<'a, AppResult<ReportDocument>>;
}

/// `ReportService` over HTTP
pub struct HttpReportService {
    client: Client,
    base_url: Url,
}

impl HttpReportService {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            AppError::ConfigError(format!("invalid report service URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::ConfigError(format!(
                "report service URL '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// `{base}/{endpoint}/{capture_id}`, with the id percent-encoded as a
    /// single path segment
    pub fn endpoint_url(&self, action: ExportAction, capture_id: &str) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AppError::ConfigError(format!("{} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .push(action.endpoint())
            .push(capture_id);
        Ok(url)
    }

    async fn post_filtered(
        &self,
        action: ExportAction,
        capture_id: &str,
        criteria: &FilterCriteria,
    ) -> AppResult<ExportOutcome> {
        if action == ExportAction::Report {
            return Err(AppError::ConfigError(
                "section reports are requested with GET, not with filter criteria".to_string(),
            ));
        }

        let url = self.endpoint_url(action, capture_id)?;
        debug!("POST {}", url);

        let response = self.client.post(url).json(criteria).send().await?;

        if action == ExportAction::FilteredReport {
            let (status, body) = read_json::<FilteredReportResponse>(response).await?;
            return match (body.success, body.report_url) {
                (true, Some(report_url)) => Ok(ExportOutcome::FilteredReport { report_url }),
                (true, None) => Err(AppError::ServiceError {
                    status,
                    message: Some("Report service returned no report URL".to_string()),
                }),
                (false, _) => Err(AppError::ServiceError {
                    status,
                    message: body.error,
                }),
            };
        }

        let (status, body) = read_json::<FilteredCsvResponse>(response).await?;
        match (body.success, body.csv_url) {
            (true, Some(csv_url)) => Ok(ExportOutcome::FilteredCsv {
                csv_url,
                total_packets: body.total_packets,
            }),
            (true, None) => Err(AppError::ServiceError {
                status,
                message: Some("Report service returned no CSV URL".to_string()),
            }),
            (false, _) => Err(AppError::ServiceError {
                status,
                message: body.error,
            }),
        }
    }

    async fn get_report(&self, capture_id: &str, options: &[String]) -> AppResult<ReportDocument> {
        let url = self.endpoint_url(ExportAction::Report, capture_id)?;
        let query: Vec<(&str, &str)> = options
            .iter()
            .map(|option| ("options[]", option.as_str()))
            .collect();
        debug!("GET {} with {} options", url, query.len());

        let response = self.client.get(url).query(&query).send().await?;
        if !response.status().is_success() {
            return Err(service_failure(response).await);
        }

        let content_type = header_text(&response, CONTENT_TYPE);
        let content_disposition = header_text(&response, CONTENT_DISPOSITION);

        Ok(ReportDocument {
            content_type,
            content_disposition,
            body: response.bytes().await?,
        })
    }
}

fn header_text(response: &Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Turn a non-success response into a service error, keeping the
/// server's `error` message when the body carries one
async fn service_failure(response: Response) -> AppError {
    let status = response.status().as_u16();
    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(str::to_string));
    AppError::ServiceError { status, message }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<(u16, T)> {
    let status = response.status();
    if !status.is_success() {
        return Err(service_failure(response).await);
    }

    let body = response.json::<T>().await.map_err(|e| AppError::ServiceError {
        status: status.as_u16(),
        message: Some(format!("Unreadable response from report service: {}", e)),
    })?;
    Ok((status.as_u16(), body))
}

impl ReportService for HttpReportService {
    fn submit_filtered<'a>(
        &'a self,
        action: ExportAction,
        capture_id: &'a str,
        criteria: &'a FilterCriteria,
    ) -> BoxFuture<'a, AppResult<ExportOutcome>> {
        self.post_filtered(action, capture_id, criteria).boxed()
    }

    fn request_report<'a>(
        &'a self,
        capture_id: &'a str,
        options: &'a [String],
    ) -> BoxFuture<'a, AppResult<ReportDocument>> {
        self.get_report(capture_id, options).boxed()
    }
}
