use log::{error, info};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

use crate::export::service::ReportService;
use crate::models::export::{ControlState, ExportAction, ExportOutcome, ExportState, ReportDocument};
use crate::models::filter::FilterCriteria;
use crate::utils::error::{AppError, AppResult};

/// Message surfaced when a section report is requested with nothing selected
pub const NO_OPTION_SELECTED: &str = "Select at least one report section to generate a report.";

/// Marks an action in flight for as long as it lives. Dropping it, on
/// success, failure or cancellation, puts the action back to idle.
struct InFlight<'a> {
    state: &'a Mutex<ExportState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.state.lock() = ExportState::Idle;
    }
}

/// Runs one export action against the report service, allowing at most
/// one request in flight at a time.
pub struct ExportCoordinator {
    action: ExportAction,
    state: Mutex<ExportState>,
    service: Arc<dyn ReportService>,
}

impl ExportCoordinator {
    pub fn new(action: ExportAction, service: Arc<dyn ReportService>) -> Self {
        Self {
            action,
            state: Mutex::new(ExportState::Idle),
            service,
        }
    }

    pub fn action(&self) -> ExportAction {
        self.action
    }

    pub fn state(&self) -> ExportState {
        *self.state.lock()
    }

    /// Enabled/label state of the control that triggers this action
    pub fn control(&self) -> ControlState {
        match self.state() {
            ExportState::Idle => ControlState {
                enabled: true,
                label: self.action.idle_label().to_string(),
            },
            ExportState::InFlight => ControlState {
                enabled: false,
                label: self.action.busy_label().to_string(),
            },
        }
    }

    fn begin(&self) -> AppResult<InFlight<'_>> {
        let mut state = self.state.lock();
        if *state == ExportState::InFlight {
            return Err(AppError::ExportBusy(self.action.to_string()));
        }
        *state = ExportState::InFlight;
        Ok(InFlight { state: &self.state })
    }

    /// Send the filter criteria for a filtered report or CSV export
    pub async fn submit_filtered(
        &self,
        capture_id: &str,
        criteria: &FilterCriteria,
    ) -> AppResult<ExportOutcome> {
        if self.action == ExportAction::Report {
            return Err(AppError::ConfigError(format!(
                "{} does not take filter criteria",
                self.action
            )));
        }

        let _in_flight = self.begin()?;
        let request_id = Uuid::new_v4();
        info!(
            "[{}] {} started for capture {}",
            request_id, self.action, capture_id
        );

        let result = self
            .service
            .submit_filtered(self.action, capture_id, criteria)
            .await;
        self.log_result(request_id, &result);
        result
    }

    /// Request a report made of the selected sections. An empty selection
    /// is rejected before any request is issued.
    pub async fn submit_report(
        &self,
        capture_id: &str,
        options: &[String],
    ) -> AppResult<ReportDocument> {
        if self.action != ExportAction::Report {
            return Err(AppError::ConfigError(format!(
                "{} does not take report sections",
                self.action
            )));
        }

        let options: Vec<String> = options
            .iter()
            .map(|option| option.trim())
            .filter(|option| !option.is_empty())
            .map(str::to_string)
            .collect();
        if options.is_empty() {
            return Err(AppError::ValidationError(NO_OPTION_SELECTED.to_string()));
        }

        let _in_flight = self.begin()?;
        let request_id = Uuid::new_v4();
        info!(
            "[{}] {} started for capture {} with sections {:?}",
            request_id, self.action, capture_id, options
        );

        let result = self.service.request_report(capture_id, &options).await;
        self.log_result(request_id, &result);
        result
    }

    fn log_result<T>(&self, request_id: Uuid, result: &AppResult<T>) {
        match result {
            Ok(_) => info!("[{}] {} completed", request_id, self.action),
            Err(e) => error!(
                "[{}] {} failed: {} ({})",
                request_id,
                self.action,
                e.user_message(),
                e
            ),
        }
    }
}

/// The three export coordinators of a dashboard, one per action
pub struct ExportCoordinators {
    pub filtered_report: ExportCoordinator,
    pub filtered_csv: ExportCoordinator,
    pub report: ExportCoordinator,
}

impl ExportCoordinators {
    pub fn new(service: Arc<dyn ReportService>) -> Self {
        Self {
            filtered_report: ExportCoordinator::new(ExportAction::FilteredReport, service.clone()),
            filtered_csv: ExportCoordinator::new(ExportAction::FilteredCsv, service.clone()),
            report: ExportCoordinator::new(ExportAction::Report, service),
        }
    }

    pub fn get(&self, action: ExportAction) -> &ExportCoordinator {
        match action {
            ExportAction::FilteredReport => &self.filtered_report,
            ExportAction::FilteredCsv => &self.filtered_csv,
            ExportAction::Report => &self.report,
        }
    }
}
