// Library exports for sharkview
pub mod analysis;
pub mod api;
pub mod export;
pub mod models;
pub mod store;
pub mod utils;

pub use analysis::{CaptureSummary, FilterEngine, GraphAggregator};
pub use models::filter::FilterCriteria;
pub use models::graph::{CommunicationEvent, Graph, GraphOptions};
pub use models::packet::PacketRecord;
pub use utils::error::{AppError, AppResult};
