//! Port for the shared tracking number counter.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by tracking sequence adapters.
    pub enum TrackingSequenceError {
        Connection { message: String } =>
            "tracking sequence connection failed: {message}",
        Query { message: String } =>
            "tracking sequence query failed: {message}",
    }
}

/// Atomic counter shared by both ticket types. Values are never reused.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackingSequence: Send + Sync {
    async fn next_value(&self) -> Result<u64, TrackingSequenceError>;
}
