//! Deal-type extractors: one per caller-selectable ingest kind. Each is
//! a pure function from raw rows plus reference data to a normalized,
//! cross-referenced table set, deduplicating entity mentions against
//! both the reference set and entities introduced earlier in the batch.

pub mod acquisition;
pub mod entities;
pub mod financing;
pub mod joint_venture;
pub mod ppa;
pub mod project_update;

use crate::enums::CompanyRole;
use crate::ident::generate_id;
use crate::model::{AnyTable, CompanyRecord, DealCompanyLink, IngestKind, NamedRef, ReferenceData};
use crate::tokenizer::RawRow;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Runs the extractor selected by `kind`.
pub fn extract(kind: IngestKind, rows: &[RawRow], reference: &ReferenceData) -> Vec<AnyTable> {
    let tables = match kind {
        IngestKind::MergerAcquisition => acquisition::extract(rows, reference),
        IngestKind::Financing => financing::extract(rows, reference),
        IngestKind::PowerPurchaseAgreement => ppa::extract(rows, reference),
        IngestKind::JointVenture => joint_venture::extract(rows, reference),
        IngestKind::ProjectUpdate => project_update::extract(rows, reference),
        IngestKind::Project => entities::extract_projects(rows, reference),
        IngestKind::Company => entities::extract_companies(rows, reference),
    };
    for table in &tables {
        debug!("Extracted {} row(s) into table '{}'", table.len(), table.name());
    }
    tables
}

/// The fixed header set a kind's extractor consumes. Also the template
/// the UI offers for download.
pub fn headers_for(kind: IngestKind) -> &'static [&'static str] {
    match kind {
        IngestKind::MergerAcquisition => acquisition::HEADERS,
        IngestKind::Financing => financing::HEADERS,
        IngestKind::PowerPurchaseAgreement => ppa::HEADERS,
        IngestKind::JointVenture => joint_venture::HEADERS,
        IngestKind::ProjectUpdate => project_update::HEADERS,
        IngestKind::Project => entities::PROJECT_HEADERS,
        IngestKind::Company => entities::COMPANY_HEADERS,
    }
}

/// Dedup index over one entity space (deals, projects or companies),
/// seeded from the reference set and accumulating batch entities as
/// they are created.
pub(crate) struct EntityPool {
    ids: HashSet<String>,
    by_name: HashMap<String, String>,
}

impl EntityPool {
    pub fn from_refs(refs: &[NamedRef]) -> Self {
        let mut pool = Self {
            ids: HashSet::new(),
            by_name: HashMap::new(),
        };
        for r in refs {
            pool.ids.insert(r.id.clone());
            pool.by_name.insert(r.name.to_lowercase(), r.id.clone());
        }
        pool
    }

    /// Returns the canonical identifier for this mention and whether a
    /// new record should be created. A match on id OR case-insensitive
    /// name suffices to skip creation; a name match redirects to the
    /// already-known identifier.
    pub fn resolve(&mut self, id: String, name: &str) -> (String, bool) {
        if self.ids.contains(&id) {
            return (id, false);
        }
        if let Some(existing) = self.by_name.get(&name.to_lowercase()) {
            return (existing.clone(), false);
        }
        self.ids.insert(id.clone());
        self.by_name.insert(name.to_lowercase(), id.clone());
        (id, true)
    }
}

/// Resolves a mention against the pool, appending a new record built by
/// `build` on first sight. Returns the canonical identifier either way.
pub(crate) fn ensure_entity<T>(
    pool: &mut EntityPool,
    rows: &mut Vec<T>,
    id: String,
    name: &str,
    build: impl FnOnce(String) -> T,
) -> String {
    let (id, created) = pool.resolve(id, name);
    if created {
        rows.push(build(id.clone()));
    }
    id
}

/// Positional fallback for rows whose name-bearing column is blank, so
/// identifier synthesis never sees an empty name.
pub(crate) fn name_or_fallback(raw: &str, label: &str, index: usize) -> String {
    if raw.is_empty() {
        format!("{}-{}", label, index + 1)
    } else {
        raw.to_string()
    }
}

pub(crate) fn opt_text(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Company dedup plus deal↔company relationship accumulation, shared by
/// every deal extractor. Keeps (deal, company, role) keys unique.
pub(crate) struct CompanyLinks {
    pool: EntityPool,
    pub companies: Vec<CompanyRecord>,
    pub links: Vec<DealCompanyLink>,
    keys: HashSet<(String, String, CompanyRole)>,
}

impl CompanyLinks {
    pub fn new(refs: &[NamedRef]) -> Self {
        Self {
            pool: EntityPool::from_refs(refs),
            companies: Vec::new(),
            links: Vec::new(),
            keys: HashSet::new(),
        }
    }

    /// Records the company on first mention and appends a relationship
    /// row unless the composite key already exists. Returns the new row
    /// so the caller can attach role-specific attributes.
    pub fn attach(
        &mut self,
        deal_id: &str,
        name: &str,
        role: CompanyRole,
        source_row: usize,
    ) -> Option<&mut DealCompanyLink> {
        let id = generate_id(name, Some("company"));
        let company_id = ensure_entity(&mut self.pool, &mut self.companies, id, name, |id| {
            CompanyRecord::bare(id, name, source_row)
        });
        let key = (deal_id.to_string(), company_id.clone(), role);
        if !self.keys.insert(key) {
            return None;
        }
        self.links
            .push(DealCompanyLink::new(deal_id, company_id, role, source_row));
        self.links.last_mut()
    }

    /// Plain semicolon list: one relationship row per entry, no
    /// attributes.
    pub fn attach_list(&mut self, deal_id: &str, raw: &str, role: CompanyRole, source_row: usize) {
        for name in split_list(raw) {
            self.attach(deal_id, &name, role, source_row);
        }
    }
}
