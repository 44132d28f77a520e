pub mod handlers;
pub mod routes;

use crate::export::ExportCoordinators;
use crate::store::CaptureStore;

/// State shared by every request handler
pub struct AppState {
    pub store: CaptureStore,
    pub exports: ExportCoordinators,
}
