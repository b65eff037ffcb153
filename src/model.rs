//! Entity and relationship records produced by the extractors, the
//! typed table wrapper shared with validation and persistence, and the
//! caller-facing ingest kind selector.

use crate::descriptor::Column;
use crate::enums::{
    CompanyClassification, CompanyRole, CountryCode, DealSubtype, DomainEnum, ProjectStage,
    RevenueModel, Sector, Technology,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The caller-supplied data type / subtype choice that selects an
/// extractor, a descriptor set and a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestKind {
    MergerAcquisition,
    Financing,
    PowerPurchaseAgreement,
    JointVenture,
    ProjectUpdate,
    Project,
    Company,
}

impl IngestKind {
    pub const ALL: &'static [Self] = &[
        Self::MergerAcquisition,
        Self::Financing,
        Self::PowerPurchaseAgreement,
        Self::JointVenture,
        Self::ProjectUpdate,
        Self::Project,
        Self::Company,
    ];

    /// The `data_type` field of the persistence gateway request.
    pub fn data_type(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Company => "company",
            _ => "deal",
        }
    }

    /// The `sub_type` field of the persistence gateway request. Only
    /// deal kinds carry one.
    pub fn sub_type(self) -> Option<&'static str> {
        match self {
            Self::MergerAcquisition => Some("merger_acquisition"),
            Self::Financing => Some("financing"),
            Self::PowerPurchaseAgreement => Some("power_purchase_agreement"),
            Self::JointVenture => Some("joint_venture"),
            Self::ProjectUpdate => Some("project_update"),
            Self::Project | Self::Company => None,
        }
    }

    pub fn from_parts(data_type: &str, sub_type: Option<&str>) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.data_type() == data_type && kind.sub_type() == sub_type)
    }
}

/// A previously persisted entity the extractors must treat as already
/// existing for dedup purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

impl NamedRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The three reference lists supplied by the caller before extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub deals: Vec<NamedRef>,
    pub projects: Vec<NamedRef>,
    pub companies: Vec<NamedRef>,
}

/// Uniform run-time view of a record field, used by the validation
/// engine and nowhere else. Records stay strongly typed; this is a
/// derived projection, not storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Absent,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
    List(Vec<String>),
    Geography(Vec<f64>),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn text(value: &Option<String>) -> Self {
        value.as_deref().map_or(Self::Absent, |s| Self::Text(s.to_string()))
    }

    pub fn number(value: Option<f64>) -> Self {
        value.map_or(Self::Absent, Self::Number)
    }

    pub fn date(value: Option<NaiveDate>) -> Self {
        value.map_or(Self::Absent, Self::Date)
    }

    pub fn token<T: DomainEnum>(value: Option<T>) -> Self {
        value.map_or(Self::Absent, |v| Self::Text(v.token().to_string()))
    }

    pub fn tokens<T: DomainEnum>(values: &[T]) -> Self {
        Self::List(values.iter().map(|v| v.token().to_string()).collect())
    }

    pub fn geography(value: Option<[f64; 2]>) -> Self {
        value.map_or(Self::Absent, |coords| Self::Geography(coords.to_vec()))
    }
}

/// Field access by descriptor key. Implemented by every record type so
/// the validation engine can walk (table, row, column) triples without
/// knowing concrete shapes.
pub trait Tabular {
    fn value(&self, key: &str) -> Value;

    /// Display name used to locate the row after the gateway confirms a
    /// save. Relationship rows have none.
    fn display_name(&self) -> Option<&str>;

    fn source_row(&self) -> usize;
}

/// Merger/acquisition deal row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaDeal {
    pub id: String,
    pub name: String,
    pub subtype: Option<DealSubtype>,
    pub date: Option<NaiveDate>,
    pub country: Option<CountryCode>,
    pub sectors: Vec<Sector>,
    pub technologies: Vec<Technology>,
    pub amount: Option<f64>,
    pub equity_pct: Option<f64>,
    pub summary: Option<String>,
    pub source_url: Option<String>,
    #[serde(skip)]
    pub source_row: usize,
}

/// Financing deal row (debt, equity, refinancing, green bond).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancingDeal {
    pub id: String,
    pub name: String,
    pub subtype: Option<DealSubtype>,
    pub date: Option<NaiveDate>,
    pub country: Option<CountryCode>,
    pub sectors: Vec<Sector>,
    pub technologies: Vec<Technology>,
    pub amount: Option<f64>,
    pub summary: Option<String>,
    pub source_url: Option<String>,
    #[serde(skip)]
    pub source_row: usize,
}

/// Power-purchase-agreement deal row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PpaDeal {
    pub id: String,
    pub name: String,
    pub subtype: Option<DealSubtype>,
    pub date: Option<NaiveDate>,
    pub country: Option<CountryCode>,
    pub technologies: Vec<Technology>,
    pub capacity_mw: Option<f64>,
    pub term_years: Option<f64>,
    pub price_mwh: Option<f64>,
    pub revenue_model: Option<RevenueModel>,
    pub summary: Option<String>,
    pub source_url: Option<String>,
    #[serde(skip)]
    pub source_row: usize,
}

/// Joint-venture deal row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JvDeal {
    pub id: String,
    pub name: String,
    pub subtype: Option<DealSubtype>,
    pub date: Option<NaiveDate>,
    pub country: Option<CountryCode>,
    pub sectors: Vec<Sector>,
    pub technologies: Vec<Technology>,
    pub summary: Option<String>,
    pub source_url: Option<String>,
    #[serde(skip)]
    pub source_row: usize,
}

/// Project status-update deal row. The project itself lands in the
/// projects table; this row carries the update narrative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateDeal {
    pub id: String,
    pub name: String,
    pub subtype: Option<DealSubtype>,
    pub date: Option<NaiveDate>,
    pub country: Option<CountryCode>,
    pub summary: Option<String>,
    pub source_url: Option<String>,
    #[serde(skip)]
    pub source_row: usize,
}

/// Tagged union over the per-kind deal shapes. A deals table only ever
/// holds one variant; the extractor that built it decides which.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DealRecord {
    MergerAcquisition(MaDeal),
    Financing(FinancingDeal),
    PowerPurchase(PpaDeal),
    JointVenture(JvDeal),
    ProjectUpdate(UpdateDeal),
}

impl Tabular for DealRecord {
    fn value(&self, key: &str) -> Value {
        match self {
            Self::MergerAcquisition(d) => d.value(key),
            Self::Financing(d) => d.value(key),
            Self::PowerPurchase(d) => d.value(key),
            Self::JointVenture(d) => d.value(key),
            Self::ProjectUpdate(d) => d.value(key),
        }
    }

    fn display_name(&self) -> Option<&str> {
        let name = match self {
            Self::MergerAcquisition(d) => &d.name,
            Self::Financing(d) => &d.name,
            Self::PowerPurchase(d) => &d.name,
            Self::JointVenture(d) => &d.name,
            Self::ProjectUpdate(d) => &d.name,
        };
        Some(name)
    }

    fn source_row(&self) -> usize {
        match self {
            Self::MergerAcquisition(d) => d.source_row,
            Self::Financing(d) => d.source_row,
            Self::PowerPurchase(d) => d.source_row,
            Self::JointVenture(d) => d.source_row,
            Self::ProjectUpdate(d) => d.source_row,
        }
    }
}

impl MaDeal {
    fn value(&self, key: &str) -> Value {
        match key {
            "id" => Value::Text(self.id.clone()),
            "name" => Value::Text(self.name.clone()),
            "subtype" => Value::token(self.subtype),
            "date" => Value::date(self.date),
            "country" => Value::token(self.country),
            "sectors" => Value::tokens(&self.sectors),
            "technologies" => Value::tokens(&self.technologies),
            "amount" => Value::number(self.amount),
            "equity_pct" => Value::number(self.equity_pct),
            "summary" => Value::text(&self.summary),
            "source_url" => Value::text(&self.source_url),
            _ => Value::Absent,
        }
    }
}

impl FinancingDeal {
    fn value(&self, key: &str) -> Value {
        match key {
            "id" => Value::Text(self.id.clone()),
            "name" => Value::Text(self.name.clone()),
            "subtype" => Value::token(self.subtype),
            "date" => Value::date(self.date),
            "country" => Value::token(self.country),
            "sectors" => Value::tokens(&self.sectors),
            "technologies" => Value::tokens(&self.technologies),
            "amount" => Value::number(self.amount),
            "summary" => Value::text(&self.summary),
            "source_url" => Value::text(&self.source_url),
            _ => Value::Absent,
        }
    }
}

impl PpaDeal {
    fn value(&self, key: &str) -> Value {
        match key {
            "id" => Value::Text(self.id.clone()),
            "name" => Value::Text(self.name.clone()),
            "subtype" => Value::token(self.subtype),
            "date" => Value::date(self.date),
            "country" => Value::token(self.country),
            "technologies" => Value::tokens(&self.technologies),
            "capacity_mw" => Value::number(self.capacity_mw),
            "term_years" => Value::number(self.term_years),
            "price_mwh" => Value::number(self.price_mwh),
            "revenue_model" => Value::token(self.revenue_model),
            "summary" => Value::text(&self.summary),
            "source_url" => Value::text(&self.source_url),
            _ => Value::Absent,
        }
    }
}

impl JvDeal {
    fn value(&self, key: &str) -> Value {
        match key {
            "id" => Value::Text(self.id.clone()),
            "name" => Value::Text(self.name.clone()),
            "subtype" => Value::token(self.subtype),
            "date" => Value::date(self.date),
            "country" => Value::token(self.country),
            "sectors" => Value::tokens(&self.sectors),
            "technologies" => Value::tokens(&self.technologies),
            "summary" => Value::text(&self.summary),
            "source_url" => Value::text(&self.source_url),
            _ => Value::Absent,
        }
    }
}

impl UpdateDeal {
    fn value(&self, key: &str) -> Value {
        match key {
            "id" => Value::Text(self.id.clone()),
            "name" => Value::Text(self.name.clone()),
            "subtype" => Value::token(self.subtype),
            "date" => Value::date(self.date),
            "country" => Value::token(self.country),
            "summary" => Value::text(&self.summary),
            "source_url" => Value::text(&self.source_url),
            _ => Value::Absent,
        }
    }
}

/// Physical asset / infrastructure project row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub country: Option<CountryCode>,
    pub stage: Option<ProjectStage>,
    pub technologies: Vec<Technology>,
    pub capacity_mw: Option<f64>,
    pub coordinates: Option<[f64; 2]>,
    pub description: Option<String>,
    #[serde(skip)]
    pub source_row: usize,
}

impl ProjectRecord {
    /// Minimal record for a project first seen as a role mention on a
    /// deal row.
    pub fn bare(id: String, name: &str, source_row: usize) -> Self {
        Self {
            id,
            name: name.to_string(),
            country: None,
            stage: None,
            technologies: Vec::new(),
            capacity_mw: None,
            coordinates: None,
            description: None,
            source_row,
        }
    }
}

impl Tabular for ProjectRecord {
    fn value(&self, key: &str) -> Value {
        match key {
            "id" => Value::Text(self.id.clone()),
            "name" => Value::Text(self.name.clone()),
            "country" => Value::token(self.country),
            "stage" => Value::token(self.stage),
            "technologies" => Value::tokens(&self.technologies),
            "capacity_mw" => Value::number(self.capacity_mw),
            "coordinates" => Value::geography(self.coordinates),
            "description" => Value::text(&self.description),
            _ => Value::Absent,
        }
    }

    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn source_row(&self) -> usize {
        self.source_row
    }
}

/// Company row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyRecord {
    pub id: String,
    pub name: String,
    pub country: Option<CountryCode>,
    pub classifications: Vec<CompanyClassification>,
    pub website: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub source_row: usize,
}

impl CompanyRecord {
    pub fn bare(id: String, name: &str, source_row: usize) -> Self {
        Self {
            id,
            name: name.to_string(),
            country: None,
            classifications: Vec::new(),
            website: None,
            description: None,
            source_row,
        }
    }
}

impl Tabular for CompanyRecord {
    fn value(&self, key: &str) -> Value {
        match key {
            "id" => Value::Text(self.id.clone()),
            "name" => Value::Text(self.name.clone()),
            "country" => Value::token(self.country),
            "classifications" => Value::tokens(&self.classifications),
            "website" => Value::text(&self.website),
            "description" => Value::text(&self.description),
            _ => Value::Absent,
        }
    }

    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn source_row(&self) -> usize {
        self.source_row
    }
}

/// Deal ↔ asset relationship row. Unique on (deal_id, asset_id).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealAssetLink {
    pub deal_id: String,
    pub asset_id: String,
    pub stake_pct: Option<f64>,
    #[serde(skip)]
    pub source_row: usize,
}

impl Tabular for DealAssetLink {
    fn value(&self, key: &str) -> Value {
        match key {
            "deal_id" => Value::Text(self.deal_id.clone()),
            "asset_id" => Value::Text(self.asset_id.clone()),
            "stake_pct" => Value::number(self.stake_pct),
            _ => Value::Absent,
        }
    }

    fn display_name(&self) -> Option<&str> {
        None
    }

    fn source_row(&self) -> usize {
        self.source_row
    }
}

/// Deal ↔ company relationship row with role-specific attributes.
/// Unique on (deal_id, company_id, role).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealCompanyLink {
    pub deal_id: String,
    pub company_id: String,
    pub role: CompanyRole,
    pub commitment: Option<f64>,
    pub equity_pct: Option<f64>,
    pub equity_amount: Option<f64>,
    pub maturity_years: Option<f64>,
    pub contracted_mw: Option<f64>,
    pub detail: Option<String>,
    #[serde(skip)]
    pub source_row: usize,
}

impl DealCompanyLink {
    pub fn new(deal_id: &str, company_id: String, role: CompanyRole, source_row: usize) -> Self {
        Self {
            deal_id: deal_id.to_string(),
            company_id,
            role,
            commitment: None,
            equity_pct: None,
            equity_amount: None,
            maturity_years: None,
            contracted_mw: None,
            detail: None,
            source_row,
        }
    }
}

impl Tabular for DealCompanyLink {
    fn value(&self, key: &str) -> Value {
        match key {
            "deal_id" => Value::Text(self.deal_id.clone()),
            "company_id" => Value::Text(self.company_id.clone()),
            "role" => Value::Text(self.role.token().to_string()),
            "commitment" => Value::number(self.commitment),
            "equity_pct" => Value::number(self.equity_pct),
            "equity_amount" => Value::number(self.equity_amount),
            "maturity_years" => Value::number(self.maturity_years),
            "contracted_mw" => Value::number(self.contracted_mw),
            "detail" => Value::text(&self.detail),
            _ => Value::Absent,
        }
    }

    fn display_name(&self) -> Option<&str> {
        None
    }

    fn source_row(&self) -> usize {
        self.source_row
    }
}

/// Project ↔ company relationship row. Unique on
/// (project_id, company_id, role).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCompanyLink {
    pub project_id: String,
    pub company_id: String,
    pub role: CompanyRole,
    pub ownership_pct: Option<f64>,
    #[serde(skip)]
    pub source_row: usize,
}

impl Tabular for ProjectCompanyLink {
    fn value(&self, key: &str) -> Value {
        match key {
            "project_id" => Value::Text(self.project_id.clone()),
            "company_id" => Value::Text(self.company_id.clone()),
            "role" => Value::Text(self.role.token().to_string()),
            "ownership_pct" => Value::number(self.ownership_pct),
            _ => Value::Absent,
        }
    }

    fn display_name(&self) -> Option<&str> {
        None
    }

    fn source_row(&self) -> usize {
        self.source_row
    }
}

/// A named, typed collection of records plus its descriptor: the unit
/// the validation engine and the persistence call operate on.
#[derive(Debug, Clone)]
pub struct TableData<T> {
    pub name: &'static str,
    pub columns: Vec<Column>,
    pub rows: Vec<T>,
}

impl<T> TableData<T> {
    pub fn new(name: &'static str, columns: Vec<Column>, rows: Vec<T>) -> Self {
        Self {
            name,
            columns,
            rows,
        }
    }
}

/// Tagged union over the concrete table types so a batch can hold a
/// heterogeneous table set.
#[derive(Debug, Clone)]
pub enum AnyTable {
    Deals(TableData<DealRecord>),
    Projects(TableData<ProjectRecord>),
    Companies(TableData<CompanyRecord>),
    DealAssets(TableData<DealAssetLink>),
    DealCompanies(TableData<DealCompanyLink>),
    ProjectCompanies(TableData<ProjectCompanyLink>),
}

macro_rules! with_table {
    ($any:expr, $table:ident => $body:expr) => {
        match $any {
            AnyTable::Deals($table) => $body,
            AnyTable::Projects($table) => $body,
            AnyTable::Companies($table) => $body,
            AnyTable::DealAssets($table) => $body,
            AnyTable::DealCompanies($table) => $body,
            AnyTable::ProjectCompanies($table) => $body,
        }
    };
}
pub(crate) use with_table;

impl AnyTable {
    pub fn name(&self) -> &'static str {
        with_table!(self, t => t.name)
    }

    pub fn len(&self) -> usize {
        with_table!(self, t => t.rows.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes every row to a JSON object for the gateway payload.
    pub fn json_rows(&self) -> serde_json::Result<Vec<serde_json::Value>> {
        with_table!(self, t => t.rows.iter().map(serde_json::to_value).collect())
    }

    /// Drops rows whose display name is in `saved_names` (already
    /// lowercased). Rows without a display name are kept.
    pub fn retain_unsaved(&mut self, saved_names: &std::collections::HashSet<String>) {
        with_table!(self, t => t.rows.retain(|row| {
            row.display_name()
                .map_or(true, |name| !saved_names.contains(&name.to_lowercase()))
        }))
    }
}
