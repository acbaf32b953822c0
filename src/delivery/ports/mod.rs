//! Port trait definitions for delivery.

mod transport;

#[cfg(test)]
pub use transport::MockTransport;
pub use transport::{Transport, TransportError, TransportResult};
