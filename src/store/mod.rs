pub mod capture_store;
pub mod loader;

pub use capture_store::{Capture, CaptureInfo, CaptureStore, PacketPage};
