//! Integration tests for the async session driver
//!
//! Reports are served by `ReplayTransport` or by small scripted transports
//! that fail or stall on purpose.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use kline::driver::SessionDriver;
use kline::report::{Level, ResultSource};
use kline::session::{
    AnalysisRequest, AnalysisSession, Completion, Mode, SessionError, SessionState,
};
use kline::transport::{ChunkStream, ReplayTransport, StreamTransport, TransportError};

use crate::helpers::{fixture_identity, fixtures_dir, record_for};

fn replay() -> Arc<ReplayTransport> {
    Arc::new(
        ReplayTransport::from_dir(&fixtures_dir())
            .unwrap()
            .with_chunk_chars(9),
    )
}

/// Sends some text, then fails.
struct BrokenTransport {
    prefix: String,
}

#[async_trait]
impl StreamTransport for BrokenTransport {
    async fn open(
        &self,
        _request: &AnalysisRequest,
        _cancel: CancellationToken,
    ) -> Result<ChunkStream, TransportError> {
        let items = vec![
            Ok(self.prefix.clone()),
            Err(TransportError::Network("connection reset".to_string())),
        ];
        Ok(stream::iter(items).boxed())
    }
}

/// Opens but never produces anything.
struct StalledTransport;

#[async_trait]
impl StreamTransport for StalledTransport {
    async fn open(
        &self,
        _request: &AnalysisRequest,
        _cancel: CancellationToken,
    ) -> Result<ChunkStream, TransportError> {
        Ok(stream::pending().boxed())
    }
}

// ============================================================================
// Full walkthrough
// ============================================================================

#[tokio::test]
async fn drill_year_month_day_then_back() {
    let transport = replay();
    let driver = SessionDriver::new(AnalysisSession::default(), transport.clone());

    let done = driver.submit(fixture_identity()).await.unwrap();
    assert_eq!(
        done,
        Completion::Done {
            level: Level::Coarse,
            records: 4,
            source: ResultSource::Authoritative,
        }
    );

    let year = record_for(driver.lock().records(), 1991, None);
    let done = driver.activate(&year).await.unwrap();
    assert!(matches!(done, Some(Completion::Done { level: Level::Medium, .. })));

    let month = record_for(driver.lock().records(), 1991, Some(2));
    let done = driver.activate(&month).await.unwrap();
    assert!(matches!(done, Some(Completion::Done { level: Level::Fine, records: 2, .. })));

    let requests = transport.requests();
    let modes: Vec<Mode> = requests.iter().map(|r| r.mode).collect();
    assert_eq!(modes, vec![Mode::Year, Mode::Month, Mode::Day]);
    let day_request = &requests[2];
    assert_eq!(day_request.target_year, Some(1991));
    assert_eq!(day_request.target_month, Some(2));
    assert!(day_request.validate().is_ok());

    assert!(driver.back());
    assert!(driver.back());
    let session = driver.lock();
    assert_eq!(session.level(), Level::Coarse);
    assert_eq!(session.records().len(), 4);
    // Going back never issues a request.
    assert_eq!(transport.requests().len(), 3);
}

// ============================================================================
// Supersession and cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn newer_submit_abandons_the_running_one() {
    let transport = Arc::new(
        ReplayTransport::from_dir(&fixtures_dir())
            .unwrap()
            .with_chunk_chars(64)
            .with_delay(Duration::from_millis(20)),
    );
    let driver = SessionDriver::new(AnalysisSession::default(), transport.clone());

    let first = {
        let driver = driver.clone();
        tokio::spawn(async move { driver.submit(fixture_identity()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(driver.lock().state(), SessionState::Streaming);

    let second = driver.submit(fixture_identity()).await.unwrap();
    let first = first.await.unwrap().unwrap();

    assert_eq!(first, Completion::Abandoned);
    assert!(matches!(second, Completion::Done { records: 4, .. }));
    assert_eq!(driver.lock().records().len(), 4);
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_a_stalled_stream() {
    let driver = SessionDriver::new(AnalysisSession::default(), Arc::new(StalledTransport));

    let running = {
        let driver = driver.clone();
        tokio::spawn(async move { driver.submit(fixture_identity()).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(driver.lock().state(), SessionState::Loading);

    assert!(driver.cancel());
    let completion = running.await.unwrap().unwrap();
    assert_eq!(completion, Completion::Abandoned);
    // Identity is kept, so the session settles on Done with nothing shown.
    assert_eq!(driver.lock().state(), SessionState::Done);
    assert!(driver.lock().records().is_empty());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn stream_failure_keeps_committed_records_visible() {
    let transport = BrokenTransport {
        prefix: "chartPoints:\n  - age: 1\n    year: 1990\n    reason: a\n  - age: 2\n".to_string(),
    };
    let driver = SessionDriver::new(AnalysisSession::default(), Arc::new(transport));

    let err = driver.submit(fixture_identity()).await.unwrap_err();
    assert!(matches!(err, SessionError::Transport(TransportError::Network(_))));

    let session = driver.lock();
    assert_eq!(session.state(), SessionState::Error);
    assert_eq!(session.records().len(), 1);
    assert!(session.last_error().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn missing_replay_report_is_http_404() {
    let transport = Arc::new(ReplayTransport::new());
    let driver = SessionDriver::new(AnalysisSession::default(), transport);

    let err = driver.submit(fixture_identity()).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Transport(TransportError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn precondition_errors_issue_no_request() {
    let transport = replay();
    let driver = SessionDriver::new(AnalysisSession::default(), transport.clone());
    driver.submit(fixture_identity()).await.unwrap();

    let year = record_for(driver.lock().records(), 1990, None);
    let err = driver.drill_to_fine(&year).await.unwrap_err();
    assert!(err.is_precondition());
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(driver.lock().state(), SessionState::Done);
}
