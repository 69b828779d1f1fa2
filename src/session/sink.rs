//! Presentation-side callbacks.

use super::state::SessionState;
use crate::report::{ChartPoint, PartialResult};

/// Receives session updates for rendering.
///
/// Every method defaults to a no-op.
pub trait ResultSink: Send {
    /// Top-level fields or tags of the running submit changed.
    fn on_partial_fields_updated(&mut self, _partial: &PartialResult) {}

    /// A record was committed by the running request, level stamped.
    fn on_record_committed(&mut self, _record: &ChartPoint) {}

    /// The displayed record set was replaced wholesale.
    fn on_record_set_replaced(&mut self, _records: &[ChartPoint]) {}

    /// The displayed record set was cleared ahead of a new request.
    fn on_record_set_cleared(&mut self) {}

    fn on_state_changed(&mut self, _state: SessionState) {}
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ResultSink for NullSink {}
