//! Analysis session state machine.
//!
//! [`AnalysisSession`] owns everything one client sees: identity, the
//! displayed records and their level, top-level fields, drill anchors and
//! the drill stack. It is sans-IO. Operations return a [`PendingRequest`]
//! that the caller (usually [`SessionDriver`](crate::driver::SessionDriver))
//! sends through a transport, reporting progress back via
//! [`AnalysisSession::handle_chunk`], [`AnalysisSession::handle_complete`]
//! and [`AnalysisSession::handle_failure`].
//!
//! # Design
//!
//! Exactly one operation is active at a time. Starting a new one cancels the
//! previous [`OperationTicket`]; every callback checks its ticket against the
//! active one and silently ignores stale tickets. This keeps a superseded
//! stream from touching the session even if it delivers data after the
//! cancellation was requested.
//!
//! ```text
//!            submit / drill                first chunk
//!   Idle ─────────────────────▶ Loading ─────────────────▶ Streaming
//!     ▲                            │                          │
//!     │ restart                    │ failure          complete│
//!     │                            ▼                          ▼
//!   (any) ◀── back (Done) ─────  Error ◀──── empty ─────────  Done
//! ```

mod anchor;
mod error;
mod frame;
mod request;
mod sink;
mod state;

pub use anchor::{CoarseAnchor, MediumAnchor};
pub use error::SessionError;
pub use frame::{DrillFrame, DrillStack};
pub use request::{AnalysisRequest, Gender, Identity, Mode, RequestError};
pub use sink::{NullSink, ResultSink};
pub use state::SessionState;

use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::report::{
    reconcile, ChartPoint, IncrementalRecordParser, Level, ParseEvent, PartialResult,
    ReportSchema, ResultSource, ScalarValue,
};
use crate::transport::TransportError;

/// Identifies one operation and carries its cancellation signal.
#[derive(Debug, Clone)]
pub struct OperationTicket {
    id: u64,
    cancel: CancellationToken,
}

impl OperationTicket {
    fn new(id: u64) -> Self {
        Self {
            id,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Token that fires when this operation is superseded or aborted.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// A request the caller must send on behalf of the session.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub ticket: OperationTicket,
    pub request: AnalysisRequest,
}

/// How an operation ended, from the session's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Results are on display.
    Done {
        level: Level,
        records: usize,
        source: ResultSource,
    },
    /// The operation was superseded or cancelled. Nothing changed.
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperationKind {
    Submit,
    Drill,
}

#[derive(Debug)]
struct ActiveOperation {
    ticket: OperationTicket,
    kind: OperationKind,
    level: Level,
    parser: IncrementalRecordParser,
}

/// Client-side session: one identity, one view, one request in flight.
pub struct AnalysisSession<S: ResultSink = NullSink> {
    sink: S,
    schema: ReportSchema,
    state: SessionState,
    level: Level,
    identity: Option<Identity>,
    fields: BTreeMap<String, ScalarValue>,
    tags: Vec<String>,
    records: Vec<ChartPoint>,
    coarse_anchor: Option<CoarseAnchor>,
    medium_anchor: Option<MediumAnchor>,
    stack: DrillStack,
    active: Option<ActiveOperation>,
    next_id: u64,
    last_error: Option<String>,
}

impl Default for AnalysisSession<NullSink> {
    fn default() -> Self {
        Self::new(NullSink)
    }
}

impl<S: ResultSink> AnalysisSession<S> {
    pub fn new(sink: S) -> Self {
        Self::with_schema(sink, ReportSchema::default())
    }

    pub fn with_schema(sink: S, schema: ReportSchema) -> Self {
        Self {
            sink,
            schema,
            state: SessionState::Idle,
            level: Level::Coarse,
            identity: None,
            fields: BTreeMap::new(),
            tags: Vec::new(),
            records: Vec::new(),
            coarse_anchor: None,
            medium_anchor: None,
            stack: DrillStack::new(),
            active: None,
            next_id: 0,
            last_error: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Level of the records on display.
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn records(&self) -> &[ChartPoint] {
        &self.records
    }

    pub fn fields(&self) -> &BTreeMap<String, ScalarValue> {
        &self.fields
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn coarse_anchor(&self) -> Option<&CoarseAnchor> {
        self.coarse_anchor.as_ref()
    }

    pub fn medium_anchor(&self) -> Option<&MediumAnchor> {
        self.medium_anchor.as_ref()
    }

    pub fn can_go_back(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn drill_depth(&self) -> usize {
        self.stack.len()
    }

    /// Message of the last failure, cleared by the next operation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Live parse state of the running operation.
    pub fn partial(&self) -> Option<&PartialResult> {
        self.active.as_ref().map(|op| op.parser.partial())
    }

    /// Ticket of the running operation.
    pub fn active_ticket(&self) -> Option<&OperationTicket> {
        self.active.as_ref().map(|op| &op.ticket)
    }

    pub fn schema(&self) -> &ReportSchema {
        &self.schema
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Start a fresh yearly report, discarding all previous state.
    pub fn submit(&mut self, identity: Identity) -> Result<PendingRequest, SessionError> {
        if !identity.is_complete() {
            return Err(SessionError::MissingIdentity);
        }
        let request = AnalysisRequest::year(identity.clone());

        self.cancel_active();
        self.identity = Some(identity);
        self.fields.clear();
        self.tags.clear();
        self.coarse_anchor = None;
        self.medium_anchor = None;
        self.stack.clear();
        self.clear_records();

        Ok(self.begin(OperationKind::Submit, request))
    }

    /// Drill from a year record into its months.
    pub fn drill_to_medium(&mut self, record: &ChartPoint) -> Result<PendingRequest, SessionError> {
        let identity = self.identity.clone().ok_or(SessionError::NotSubmitted)?;
        self.require_level(Level::Coarse, record)?;
        let coarse = CoarseAnchor::from(record);
        let request = AnalysisRequest::month(identity, coarse.clone());
        request.validate()?;

        self.push_frame();
        self.coarse_anchor = Some(coarse);
        self.medium_anchor = None;
        self.cancel_active();
        self.clear_records();

        Ok(self.begin(OperationKind::Drill, request))
    }

    /// Drill from a month record into its days.
    pub fn drill_to_fine(&mut self, record: &ChartPoint) -> Result<PendingRequest, SessionError> {
        let identity = self.identity.clone().ok_or(SessionError::NotSubmitted)?;
        self.require_level(Level::Medium, record)?;
        let coarse = self
            .coarse_anchor
            .clone()
            .ok_or(SessionError::MissingCoarseAnchor)?;
        let medium = MediumAnchor::from_point(record).ok_or(SessionError::MissingMonth)?;
        if medium.year != coarse.year {
            return Err(SessionError::AnchorMismatch {
                anchor_year: coarse.year,
                record_year: medium.year,
            });
        }
        let request = AnalysisRequest::day(identity, coarse, medium.clone());
        request.validate()?;

        self.push_frame();
        self.medium_anchor = Some(medium);
        self.cancel_active();
        self.clear_records();

        Ok(self.begin(OperationKind::Drill, request))
    }

    /// Both the current view and the clicked record must sit at `expected`.
    fn require_level(&self, expected: Level, record: &ChartPoint) -> Result<(), SessionError> {
        let clicked = record.infer_level();
        if self.level != expected || clicked != expected {
            return Err(SessionError::WrongLevel {
                view: self.level,
                record: clicked,
            });
        }
        Ok(())
    }

    /// Double-activation on a record: drill one level down when the record
    /// belongs to the current view. Returns `Ok(None)` when nothing applies.
    pub fn activate(
        &mut self,
        record: &ChartPoint,
    ) -> Result<Option<PendingRequest>, SessionError> {
        match (self.level, record.infer_level()) {
            (Level::Coarse, Level::Coarse) => self.drill_to_medium(record).map(Some),
            (Level::Medium, Level::Medium) => self.drill_to_fine(record).map(Some),
            (view, clicked) => {
                debug!(%view, %clicked, "activation does not drill");
                Ok(None)
            }
        }
    }

    /// Restore the view from before the last drill. No request is issued.
    ///
    /// Returns `false` when there is nothing to go back to.
    pub fn back(&mut self) -> bool {
        let Some(frame) = self.stack.pop() else {
            return false;
        };
        self.cancel_active();

        self.level = frame.level;
        self.records = frame.records;
        self.coarse_anchor = frame.coarse_anchor;
        self.medium_anchor = frame.medium_anchor;
        self.last_error = None;
        debug!(level = %self.level, depth = self.stack.len(), "restored drill frame");

        self.sink.on_record_set_replaced(&self.records);
        self.set_state(SessionState::Done);
        true
    }

    /// Drop everything and return to idle.
    pub fn restart(&mut self) {
        self.cancel_active();
        self.identity = None;
        self.fields.clear();
        self.tags.clear();
        self.coarse_anchor = None;
        self.medium_anchor = None;
        self.stack.clear();
        self.last_error = None;
        self.level = Level::Coarse;
        self.clear_records();
        self.set_state(SessionState::Idle);
    }

    /// Abort the running operation, keeping whatever is on display.
    ///
    /// Returns `false` when nothing was running.
    pub fn cancel(&mut self) -> bool {
        if !self.cancel_active() {
            return false;
        }
        self.settle_after_cancel();
        true
    }

    // ------------------------------------------------------------------
    // Transport callbacks
    // ------------------------------------------------------------------

    /// Whether `ticket` belongs to the running operation.
    pub fn is_current(&self, ticket: &OperationTicket) -> bool {
        self.owns(ticket) && !ticket.is_cancelled()
    }

    /// Whether `ticket` was issued for the running operation, cancelled or not.
    fn owns(&self, ticket: &OperationTicket) -> bool {
        self.active.as_ref().is_some_and(|op| op.ticket.id == ticket.id)
    }

    /// Feed a fragment of the running operation's stream.
    pub fn handle_chunk(&mut self, ticket: &OperationTicket, chunk: &str) {
        if chunk.is_empty() || !self.is_current(ticket) {
            return;
        }
        let Some(op) = self.active.as_mut() else {
            return;
        };
        let mut events = Vec::new();
        op.parser.push(chunk, &mut events);
        let (kind, level) = (op.kind, op.level);

        self.set_state(SessionState::Streaming);
        self.relay(kind, level, events);
    }

    /// The running operation's stream ended normally.
    pub fn handle_complete(&mut self, ticket: &OperationTicket) -> Result<Completion, SessionError> {
        if self.owns(ticket) && ticket.is_cancelled() {
            self.cancel_active();
            self.settle_after_cancel();
            return Ok(Completion::Abandoned);
        }
        if !self.is_current(ticket) {
            return Ok(Completion::Abandoned);
        }
        let Some(op) = self.active.take() else {
            return Ok(Completion::Abandoned);
        };

        let mut events = Vec::new();
        let outcome = op.parser.finish(&mut events);
        self.relay(op.kind, op.level, events);

        let reconciled = reconcile(outcome, &self.schema);
        let source = reconciled.source;
        let mut result = reconciled.result;
        result.stamp_level(op.level);

        if !result.has_records() {
            let err = SessionError::EmptyResult { level: op.level };
            warn!(id = op.ticket.id, "{}", err);
            self.last_error = Some(err.to_string());
            self.set_state(SessionState::Error);
            return Err(err);
        }

        if op.kind == OperationKind::Submit {
            self.sink.on_partial_fields_updated(&result);
        }
        let (fields, tags, records) = result.into_parts();
        if op.kind == OperationKind::Submit {
            self.fields = fields;
            self.tags = tags;
        }
        self.level = op.level;
        self.records = records;
        self.sink.on_record_set_replaced(&self.records);
        debug!(
            id = op.ticket.id,
            level = %op.level,
            records = self.records.len(),
            ?source,
            "operation complete"
        );
        self.set_state(SessionState::Done);

        Ok(Completion::Done {
            level: op.level,
            records: self.records.len(),
            source,
        })
    }

    /// The running operation's stream failed.
    pub fn handle_failure(
        &mut self,
        ticket: &OperationTicket,
        error: TransportError,
    ) -> Result<Completion, SessionError> {
        if !self.owns(ticket) {
            return Ok(Completion::Abandoned);
        }
        if error.is_cancelled() || ticket.is_cancelled() {
            self.cancel_active();
            self.settle_after_cancel();
            return Ok(Completion::Abandoned);
        }

        self.active = None;
        warn!(id = ticket.id, error = %error, "stream failed");
        self.last_error = Some(error.to_string());
        self.set_state(SessionState::Error);
        Err(SessionError::Transport(error))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn begin(&mut self, kind: OperationKind, request: AnalysisRequest) -> PendingRequest {
        self.next_id += 1;
        let ticket = OperationTicket::new(self.next_id);
        let level = request.level();
        debug!(id = ticket.id, mode = %request.mode, "starting operation");

        self.level = level;
        self.last_error = None;
        self.active = Some(ActiveOperation {
            ticket: ticket.clone(),
            kind,
            level,
            parser: IncrementalRecordParser::with_schema(self.schema.clone()),
        });
        self.set_state(SessionState::Loading);

        PendingRequest { ticket, request }
    }

    /// Cancel and forget the running operation. Returns `true` if there was one.
    fn cancel_active(&mut self) -> bool {
        match self.active.take() {
            Some(op) => {
                debug!(id = op.ticket.id, "cancelling operation");
                op.ticket.cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn settle_after_cancel(&mut self) {
        let next = if self.records.is_empty() && self.identity.is_none() {
            SessionState::Idle
        } else {
            SessionState::Done
        };
        self.set_state(next);
    }

    fn push_frame(&mut self) {
        self.stack.push(DrillFrame {
            level: self.level,
            records: self.records.clone(),
            coarse_anchor: self.coarse_anchor.clone(),
            medium_anchor: self.medium_anchor.clone(),
        });
    }

    fn clear_records(&mut self) {
        self.records.clear();
        self.sink.on_record_set_cleared();
    }

    fn relay(&mut self, kind: OperationKind, level: Level, events: Vec<ParseEvent>) {
        let mut fields_changed = false;
        for event in events {
            match event {
                ParseEvent::Field { name, value } if kind == OperationKind::Submit => {
                    self.fields.insert(name, value);
                    fields_changed = true;
                }
                ParseEvent::Tags(tags) if kind == OperationKind::Submit => {
                    self.tags = tags;
                    fields_changed = true;
                }
                ParseEvent::Field { .. } | ParseEvent::Tags(_) => {}
                ParseEvent::Record(record) => {
                    let record = record.with_level(level);
                    self.sink.on_record_committed(&record);
                    self.records.push(record);
                }
            }
        }
        if fields_changed {
            if let Some(op) = &self.active {
                self.sink.on_partial_fields_updated(op.parser.partial());
            }
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "session state");
            self.state = state;
            self.sink.on_state_changed(state);
        }
    }
}
