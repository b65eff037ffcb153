//! Declarative per-table column schema, shared by the validation engine
//! and by the editable-grid presentation layer.

use crate::enums::{
    CompanyClassification, CompanyRole, CountryCode, DealSubtype, DomainEnum, ProjectStage,
    RevenueModel, Sector, Technology,
};
use crate::model::IngestKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Select,
    Number,
    Date,
    Url,
    Textarea,
    Boolean,
    Multiselect,
    Geography,
    Json,
    Image,
    Link,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
    pub options: Vec<String>,
    pub link_to: Option<&'static str>,
}

impl Column {
    pub fn new(key: &'static str, label: &'static str, kind: ColumnKind) -> Self {
        Self {
            key,
            label,
            kind,
            required: false,
            options: Vec::new(),
            link_to: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Fills the allowed option set from a domain enum's token list.
    pub fn with_options<T: DomainEnum>(mut self) -> Self {
        self.options = T::tokens();
        self
    }

    pub fn links(mut self, table: &'static str) -> Self {
        self.link_to = Some(table);
        self
    }
}

fn deal_core() -> Vec<Column> {
    vec![
        Column::new("id", "ID", ColumnKind::Text).required(),
        Column::new("name", "Deal update", ColumnKind::Text).required(),
        Column::new("subtype", "Subtype", ColumnKind::Select).with_options::<DealSubtype>(),
        Column::new("date", "Date", ColumnKind::Date),
        Column::new("country", "Country", ColumnKind::Select).with_options::<CountryCode>(),
    ]
}

/// Columns of the deals table for the given kind. Each deal family has
/// its own shape; the shared core comes first.
pub fn deal_columns(kind: IngestKind) -> Vec<Column> {
    let mut columns = deal_core();
    match kind {
        IngestKind::MergerAcquisition => {
            columns.push(
                Column::new("sectors", "Sector(s)", ColumnKind::Multiselect)
                    .with_options::<Sector>(),
            );
            columns.push(
                Column::new("technologies", "Technology", ColumnKind::Multiselect)
                    .with_options::<Technology>(),
            );
            columns.push(Column::new("amount", "Deal value ($ million)", ColumnKind::Number));
            columns.push(Column::new("equity_pct", "Equity (%)", ColumnKind::Number));
            columns.push(Column::new("summary", "Summary", ColumnKind::Textarea));
        }
        IngestKind::Financing => {
            columns.push(
                Column::new("sectors", "Sector(s)", ColumnKind::Multiselect)
                    .with_options::<Sector>(),
            );
            columns.push(
                Column::new("technologies", "Technology", ColumnKind::Multiselect)
                    .with_options::<Technology>(),
            );
            columns.push(Column::new("amount", "Amount ($ million)", ColumnKind::Number));
            columns.push(Column::new("summary", "Use of proceeds", ColumnKind::Textarea));
        }
        IngestKind::PowerPurchaseAgreement => {
            columns.push(
                Column::new("technologies", "Technology", ColumnKind::Multiselect)
                    .with_options::<Technology>(),
            );
            columns.push(Column::new("capacity_mw", "Capacity (MW)", ColumnKind::Number));
            columns.push(Column::new("term_years", "Term (years)", ColumnKind::Number));
            columns.push(Column::new("price_mwh", "Price ($/MWh)", ColumnKind::Number));
            columns.push(
                Column::new("revenue_model", "Revenue model", ColumnKind::Select)
                    .with_options::<RevenueModel>(),
            );
            columns.push(Column::new("summary", "Summary", ColumnKind::Textarea));
        }
        IngestKind::JointVenture => {
            columns.push(
                Column::new("sectors", "Sector(s)", ColumnKind::Multiselect)
                    .with_options::<Sector>(),
            );
            columns.push(
                Column::new("technologies", "Technology", ColumnKind::Multiselect)
                    .with_options::<Technology>(),
            );
            columns.push(Column::new("summary", "Purpose", ColumnKind::Textarea));
        }
        IngestKind::ProjectUpdate => {
            columns.push(Column::new("summary", "Summary", ColumnKind::Textarea));
        }
        IngestKind::Project | IngestKind::Company => {}
    }
    columns.push(Column::new("source_url", "Source", ColumnKind::Url));
    columns
}

pub fn project_columns() -> Vec<Column> {
    vec![
        Column::new("id", "ID", ColumnKind::Text).required(),
        Column::new("name", "Name", ColumnKind::Text).required(),
        Column::new("country", "Country", ColumnKind::Select).with_options::<CountryCode>(),
        Column::new("stage", "Stage", ColumnKind::Select).with_options::<ProjectStage>(),
        Column::new("technologies", "Technology", ColumnKind::Multiselect)
            .with_options::<Technology>(),
        Column::new("capacity_mw", "Capacity (MW)", ColumnKind::Number),
        Column::new("coordinates", "Coordinates", ColumnKind::Geography),
        Column::new("description", "Description", ColumnKind::Textarea),
    ]
}

pub fn company_columns() -> Vec<Column> {
    vec![
        Column::new("id", "ID", ColumnKind::Text).required(),
        Column::new("name", "Name", ColumnKind::Text).required(),
        Column::new("country", "Country", ColumnKind::Select).with_options::<CountryCode>(),
        Column::new("classifications", "Classification(s)", ColumnKind::Multiselect)
            .with_options::<CompanyClassification>(),
        Column::new("website", "Website", ColumnKind::Url),
        Column::new("description", "Description", ColumnKind::Textarea),
    ]
}

pub fn deal_asset_columns() -> Vec<Column> {
    vec![
        Column::new("deal_id", "Deal", ColumnKind::Link).required().links("deals"),
        Column::new("asset_id", "Asset", ColumnKind::Link).required().links("projects"),
        Column::new("stake_pct", "Stake (%)", ColumnKind::Number),
    ]
}

pub fn deal_company_columns() -> Vec<Column> {
    vec![
        Column::new("deal_id", "Deal", ColumnKind::Link).required().links("deals"),
        Column::new("company_id", "Company", ColumnKind::Link)
            .required()
            .links("companies"),
        Column::new("role", "Role", ColumnKind::Select)
            .required()
            .with_options::<CompanyRole>(),
        Column::new("commitment", "Commitment ($ million)", ColumnKind::Number),
        Column::new("equity_pct", "Equity (%)", ColumnKind::Number),
        Column::new("equity_amount", "Equity ($ million)", ColumnKind::Number),
        Column::new("maturity_years", "Maturity (years)", ColumnKind::Number),
        Column::new("contracted_mw", "Contracted capacity (MW)", ColumnKind::Number),
        Column::new("detail", "Detail", ColumnKind::Text),
    ]
}

pub fn project_company_columns() -> Vec<Column> {
    vec![
        Column::new("project_id", "Project", ColumnKind::Link)
            .required()
            .links("projects"),
        Column::new("company_id", "Company", ColumnKind::Link)
            .required()
            .links("companies"),
        Column::new("role", "Role", ColumnKind::Select)
            .required()
            .with_options::<CompanyRole>(),
        Column::new("ownership_pct", "Ownership (%)", ColumnKind::Number),
    ]
}
