//! Core contracts for chainledger.
//!
//! This crate contains:
//! - The canonical accounting event schema and its validation engine
//! - Source identifiers, the adapter contract, and its error taxonomy
//! - The per-source mode policy and the adapter registry
//! - The concurrent batch aggregator and the gated exporter
//! - The HTTP transport seam and the in-tree reference adapters

pub mod adapter;
pub mod adapters;
pub mod aggregator;
pub mod domain;
pub mod error;
pub mod exporter;
pub mod mode;
pub mod registry;
pub mod source;
pub mod transport;
pub mod validation;

pub use adapter::{
    Account, CapabilitySet, Credentials, FetchError, FetchErrorKind, FetchOutcome,
    SourceAdapter, SourceDescriptor, PAGE_CAP,
};
pub use adapters::{CosmosHubAdapter, DriftPerpsAdapter, KavaFundingAdapter, ObolVaultAdapter};
pub use aggregator::{
    Aggregator, BatchError, BatchResult, SourceReport, SourceStatus, SourceStatusEntry,
};
pub use domain::{
    fractional_digits, parse_decimal, render_fixed, Event, EventCategory, EventTimestamp,
    MAX_FRACTIONAL_DIGITS,
};
pub use error::SchemaError;
pub use exporter::{export_csv, export_json, ExportError, EXPORT_COLUMNS};
pub use mode::{Mode, ModePolicy};
pub use registry::SourceRegistry;
pub use source::SourceId;
pub use transport::{
    HttpError, HttpRequest, HttpResponse, NoopTransport, ReqwestTransport, Transport,
};
pub use validation::{validate, ValidationError};
