//! Core engine for writing-process keystroke logs.
//!
//! This crate contains:
//! - Record model: parsing the five-map log document into an [`EventLog`]
//! - Reconciliation: merging key, cursor and text records into one canonical
//!   token stream that reproduces the snapshots wherever a single-region edit
//!   explains each change
//! - Metrics: product and process measures computed from the stream
//! - Diagnostics: the plain-text diff export, step-through and replay views

pub mod config;
pub mod counts;
pub mod diff;
pub mod error;
pub mod export;
pub mod index;
pub mod key;
pub mod keystroke;
pub mod metrics;
pub mod normalize;
pub mod pause;
pub mod reconcile;
pub mod record;
pub mod replay;
pub mod revision;
pub mod segment;
pub mod token;

pub use config::EngineConfig;
pub use counts::ProcessCounts;
pub use error::LogError;
pub use export::{EXPORTER_VERSION, ExportHeader, Step, diff_trace, steps, write_export};
pub use keystroke::{KeystrokeToken, TagCategory, keystroke_linear};
pub use metrics::{MeasureValue, Measures, compute_measures};
pub use reconcile::{Linearization, linearize};
pub use record::{EventLog, Header, RecordKind, UnknownRecordKind};
pub use replay::{ReplayFrame, ReplayIndex};
pub use revision::{RevisionGroup, RevisionKind, revision_groups};
pub use token::{Marker, Reconstruction, Token, TokenKind, reconstruct_prefix, render};
