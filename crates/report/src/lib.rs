//! Report consumer.
//!
//! This crate provides:
//! - [`ReportOrder`] projection built from `order.placed` and `order.ready`
//! - [`ReportProcessingService`] with idempotent placed/ready upserts
//! - Two broker handlers, one per work queue
//! - [`aggregate`], a pure fold from projections to a [`ReportSummary`]
//! - [`ReportService`] answering date-range revenue queries

pub mod aggregation;
pub mod date_range;
pub mod error;
pub mod listener;
pub mod processing;
pub mod projection;
pub mod service;
pub mod store;

pub use aggregation::{ProductSummary, ReportSummary, aggregate};
pub use date_range::{DateRange, DateRangeFilter};
pub use error::{ReportError, Result};
pub use listener::{OrderPlacedReportListener, OrderReadyReportListener};
pub use processing::{RecordPlaced, RecordReady, ReportProcessingService, UpsertOutcome};
pub use projection::{ReportItem, ReportOrder};
pub use service::ReportService;
pub use store::{InMemoryReportStore, ReportOrderStore};
