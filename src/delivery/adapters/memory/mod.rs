//! In-memory transport for tests and local runs.

mod transport;

pub use transport::RecordingTransport;
