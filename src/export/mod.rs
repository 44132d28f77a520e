pub mod coordinator;
pub mod service;

pub use coordinator::{ExportCoordinator, ExportCoordinators};
pub use service::{HttpReportService, ReportService};
