//! # dealgrid-ingest
//!
//! Bulk ingestion and normalization engine for an energy-infrastructure
//! deals platform: it turns spreadsheet exports into a validated,
//! normalized multi-table entity graph ready for a bulk write.
//!
//! ## Pipeline
//!
//! raw text → tokenizer → row materializer → a deal-type extractor
//! (selected by [`IngestKind`]) → descriptor-annotated table set →
//! validation engine → persistence gateway (caller-supplied).
//!
//! Everything up to the gateway is synchronous, pure and free of shared
//! mutable state: reference data for dedup is passed in explicitly, so
//! the pipeline is safe to run repeatedly and concurrently.
//!
//! ## Example
//!
//! ```rust,ignore
//! use dealgrid_ingest::{IngestBatch, IngestKind, ReferenceData};
//!
//! let csv = std::fs::read_to_string("deals.csv")?;
//! let mut batch = IngestBatch::from_text(
//!     IngestKind::MergerAcquisition,
//!     &csv,
//!     &ReferenceData::default(),
//! );
//! let errors = batch.validate();
//! if errors.is_empty() {
//!     batch.save(&gateway)?;
//! }
//! ```

pub mod descriptor;
pub mod enums;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod ident;
pub mod model;
pub mod normalize;
pub mod template;
pub mod tokenizer;
pub mod validate;

pub use descriptor::{Column, ColumnKind};
pub use enums::*;
pub use error::{IngestError, Result};
pub use gateway::{
    build_request, prune_saved, BulkSaveRequest, BulkSaveResponse, PersistenceGateway,
    TablePayload, TableSaveResult,
};
pub use ident::generate_id;
pub use model::*;
pub use normalize::{
    parse_date, parse_enum, parse_geography, parse_multi, parse_number, parse_revenue_model,
    parse_sponsor, resolve_country, split_names_numbers, NamedNumbers, RevenueTerm, SponsorInfo,
};
pub use template::template_csv;
pub use tokenizer::{materialize, parse_delimited, tokenize, RawRow};
pub use validate::{validate_tables, ValidationError};

use log::{debug, info};

/// One ingestion batch: the table set produced from a single uploaded
/// file, held in memory for editing until the gateway confirms a save.
#[derive(Debug, Clone)]
pub struct IngestBatch {
    pub kind: IngestKind,
    pub tables: Vec<AnyTable>,
}

impl IngestBatch {
    /// Runs parse → extract over raw delimited text.
    pub fn from_text(kind: IngestKind, text: &str, reference: &ReferenceData) -> Self {
        let (headers, rows) = tokenizer::parse_delimited(text);
        debug!(
            "Parsed {} header(s) and {} data row(s) for {:?}",
            headers.len(),
            rows.len(),
            kind
        );
        let tables = extract::extract(kind, &rows, reference);
        info!(
            "Extracted batch for {:?}: {} table(s), {} total row(s)",
            kind,
            tables.len(),
            tables.iter().map(AnyTable::len).sum::<usize>()
        );
        Self { kind, tables }
    }

    /// Validates the current table snapshot. Pure; call on demand after
    /// edits rather than reactively.
    pub fn validate(&self) -> Vec<ValidationError> {
        validate::validate_tables(&self.tables)
    }

    /// Validates, forwards the table set to the gateway, and prunes
    /// rows the gateway confirms as written. Outstanding validation
    /// errors block the save; they never block in-memory editing.
    pub fn save(&mut self, gateway: &dyn PersistenceGateway) -> Result<BulkSaveResponse> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(IngestError::ValidationFailed {
                errors: errors.len(),
            });
        }

        let request = gateway::build_request(self.kind, &self.tables)?;
        let response = gateway.save(&request).map_err(IngestError::Gateway)?;
        info!(
            "Gateway accepted batch: {} row(s) inserted",
            response.results.values().map(|r| r.inserted).sum::<usize>()
        );
        gateway::prune_saved(&mut self.tables, &response);
        Ok(response)
    }
}
