//! Session error taxonomy.
//!
//! Precondition errors are returned synchronously and leave the session
//! untouched. Transport and empty-result errors move the session to
//! [`SessionState::Error`](super::SessionState::Error). Cancellation is
//! never an error.

use thiserror::Error;

use super::request::RequestError;
use crate::report::Level;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("birth date and birth time are required")]
    MissingIdentity,

    #[error("no report has been submitted yet")]
    NotSubmitted,

    #[error("no year is selected; drill into a year before choosing a month")]
    MissingCoarseAnchor,

    #[error("cannot drill from the {view} view on a {record} record")]
    WrongLevel { view: Level, record: Level },

    #[error("selected record has no month")]
    MissingMonth,

    #[error("selected month belongs to {record_year}, but the drilled year is {anchor_year}")]
    AnchorMismatch { anchor_year: i32, record_year: i32 },

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("stream failed: {0}")]
    Transport(#[from] TransportError),

    #[error("{level} report came back without any records")]
    EmptyResult { level: Level },
}

impl SessionError {
    /// Rejected before any request was issued.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SessionError::MissingIdentity
                | SessionError::NotSubmitted
                | SessionError::MissingCoarseAnchor
                | SessionError::WrongLevel { .. }
                | SessionError::MissingMonth
                | SessionError::AnchorMismatch { .. }
                | SessionError::InvalidRequest(_)
        )
    }
}
