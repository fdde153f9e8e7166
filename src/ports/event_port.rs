//! Event sink port trait.

use crate::domain::error::BreakoutError;
use crate::domain::failure::FailureEvent;

/// Durable destination for detected events.
///
/// Callers report a sink error and keep the analysis result; they do not
/// retry.
pub trait EventSink {
    /// Stores a batch and returns the number of newly stored events.
    fn insert_failures(&self, events: &[FailureEvent]) -> Result<usize, BreakoutError>;
}
