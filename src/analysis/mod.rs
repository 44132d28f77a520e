pub mod filter_engine;
pub mod graph_aggregator;
pub mod summary;

pub use filter_engine::FilterEngine;
pub use graph_aggregator::GraphAggregator;
pub use summary::CaptureSummary;
