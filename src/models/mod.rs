pub mod config;
pub mod export;
pub mod filter;
pub mod graph;
pub mod packet;
pub mod stats;
