//! Report parsing.
//!
//! - [`scalar`] decodes `key: value` scalars
//! - [`record`] holds chart points and their typed accumulator
//! - [`parser`] is the streaming line parser
//! - [`reconcile`] picks the final result at end of stream
//! - [`traits`] lists the trait cards carried as top-level fields

pub mod parser;
pub mod reconcile;
pub mod record;
pub mod result;
pub mod scalar;
pub mod traits;

pub use parser::{IncrementalRecordParser, ParseEvent, ParseObserver, ParseOutcome, ReportSchema};
pub use reconcile::{parse_authoritative, reconcile, ReconcileError, Reconciled, ResultSource};
pub use record::{ChartPoint, Level, RecordAccumulator, RecordField, RecordRejection};
pub use result::PartialResult;
pub use scalar::{decode_scalar, is_exact_integer, split_key_value, ScalarValue};
pub use traits::{filled_cards, FilledCard, TraitCard, TRAIT_CARDS};
