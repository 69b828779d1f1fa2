//! Async driver connecting a [`StreamTransport`] to an [`AnalysisSession`].
//!
//! # Design
//!
//! The session lives behind an `Arc<Mutex<_>>` so UI-side calls (`back`,
//! `restart`, a new drill) can run while a stream is being pumped. The lock
//! is only taken for the synchronous session calls and never held across an
//! await. Every await is raced against the operation's cancellation token,
//! biased towards cancellation, so a superseded stream stops at its next
//! suspension point.

use futures::StreamExt;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tracing::debug;

use crate::report::ChartPoint;
use crate::session::{
    AnalysisSession, Completion, Identity, NullSink, OperationTicket, PendingRequest, ResultSink,
    SessionError,
};
use crate::transport::{StreamTransport, TransportError};

/// Runs session operations against a transport.
pub struct SessionDriver<S: ResultSink = NullSink> {
    session: Arc<Mutex<AnalysisSession<S>>>,
    transport: Arc<dyn StreamTransport>,
}

impl<S: ResultSink> Clone for SessionDriver<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<S: ResultSink> SessionDriver<S> {
    pub fn new(session: AnalysisSession<S>, transport: Arc<dyn StreamTransport>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            transport,
        }
    }

    /// Lock the session for inspection. Do not hold the guard across an await.
    pub fn lock(&self) -> MutexGuard<'_, AnalysisSession<S>> {
        self.session.lock()
    }

    /// Shared handle to the session.
    pub fn session(&self) -> Arc<Mutex<AnalysisSession<S>>> {
        Arc::clone(&self.session)
    }

    pub fn transport(&self) -> &Arc<dyn StreamTransport> {
        &self.transport
    }

    /// Submit a new identity and stream the yearly report.
    pub async fn submit(&self, identity: Identity) -> Result<Completion, SessionError> {
        let pending = self.session.lock().submit(identity)?;
        self.run(pending).await
    }

    /// Drill into the months of a year record.
    pub async fn drill_to_medium(&self, record: &ChartPoint) -> Result<Completion, SessionError> {
        let pending = self.session.lock().drill_to_medium(record)?;
        self.run(pending).await
    }

    /// Drill into the days of a month record.
    pub async fn drill_to_fine(&self, record: &ChartPoint) -> Result<Completion, SessionError> {
        let pending = self.session.lock().drill_to_fine(record)?;
        self.run(pending).await
    }

    /// Double-activation. `Ok(None)` when the record does not drill.
    pub async fn activate(
        &self,
        record: &ChartPoint,
    ) -> Result<Option<Completion>, SessionError> {
        let pending = self.session.lock().activate(record)?;
        match pending {
            Some(pending) => self.run(pending).await.map(Some),
            None => Ok(None),
        }
    }

    pub fn back(&self) -> bool {
        self.session.lock().back()
    }

    pub fn restart(&self) {
        self.session.lock().restart();
    }

    /// Abort the running operation, if any.
    pub fn cancel(&self) -> bool {
        self.session.lock().cancel()
    }

    /// Pump one pending request to completion, failure or cancellation.
    pub async fn run(&self, pending: PendingRequest) -> Result<Completion, SessionError> {
        let PendingRequest { ticket, request } = pending;
        let cancel = ticket.cancellation().clone();
        debug!(id = ticket.id(), mode = %request.mode, "running operation");

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            opened = self.transport.open(&request, cancel.clone()) => opened,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => return self.fail(&ticket, e),
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => Some(Err(TransportError::Cancelled)),
                item = stream.next() => item,
            };
            match next {
                Some(Ok(chunk)) => {
                    self.session.lock().handle_chunk(&ticket, &chunk);
                }
                Some(Err(e)) => return self.fail(&ticket, e),
                None => return self.session.lock().handle_complete(&ticket),
            }
        }
    }

    fn fail(&self, ticket: &OperationTicket, error: TransportError) -> Result<Completion, SessionError> {
        self.session.lock().handle_failure(ticket, error)
    }
}
