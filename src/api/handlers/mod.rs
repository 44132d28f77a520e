pub mod export;
pub mod graph;
pub mod packets;
