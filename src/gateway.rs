//! Persistence gateway seam. The core never writes anything itself: it
//! builds the request payload, hands it to a caller-supplied gateway,
//! and prunes rows the gateway confirms as saved. The gateway is
//! assumed atomic per call; its failure surfaces as one opaque message.

use crate::error::{IngestError, Result};
use crate::model::{AnyTable, IngestKind};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Serialize)]
pub struct TablePayload {
    pub name: String,
    pub data: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkSaveRequest {
    pub data_type: String,
    pub sub_type: Option<String>,
    pub tables: Vec<TablePayload>,
}

/// Per-table save outcome: how many rows were inserted and the display
/// names that now exist server-side. Names are never renamed by the
/// gateway; identifiers may be remapped, which is why pruning matches
/// on names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSaveResult {
    pub inserted: usize,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkSaveResponse {
    pub results: BTreeMap<String, TableSaveResult>,
}

/// The external collaborator that performs the actual bulk write.
/// Failure is reported as a single opaque message.
pub trait PersistenceGateway {
    fn save(&self, request: &BulkSaveRequest) -> std::result::Result<BulkSaveResponse, String>;
}

/// Serializes a validated table set into the gateway request shape.
pub fn build_request(kind: IngestKind, tables: &[AnyTable]) -> Result<BulkSaveRequest> {
    let mut payloads = Vec::with_capacity(tables.len());
    for table in tables {
        payloads.push(TablePayload {
            name: table.name().to_string(),
            data: table.json_rows().map_err(IngestError::SerializationError)?,
        });
    }
    Ok(BulkSaveRequest {
        data_type: kind.data_type().to_string(),
        sub_type: kind.sub_type().map(str::to_string),
        tables: payloads,
    })
}

/// Removes rows the gateway confirmed, matching by display name
/// (case-insensitive). Known limitation: two distinct entities sharing
/// a display name are pruned together.
pub fn prune_saved(tables: &mut [AnyTable], response: &BulkSaveResponse) {
    for table in tables.iter_mut() {
        let Some(result) = response.results.get(table.name()) else {
            continue;
        };
        if result.names.is_empty() {
            continue;
        }
        let saved: HashSet<String> = result.names.iter().map(|n| n.to_lowercase()).collect();
        let before = table.len();
        table.retain_unsaved(&saved);
        debug!(
            "Pruned {} saved row(s) from table '{}'",
            before - table.len(),
            table.name()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::company_columns;
    use crate::model::{CompanyRecord, TableData};

    fn companies_table(names: &[&str]) -> AnyTable {
        let rows = names
            .iter()
            .map(|n| CompanyRecord::bare(format!("company-{}", n.to_lowercase()), n, 0))
            .collect();
        AnyTable::Companies(TableData::new("companies", company_columns(), rows))
    }

    #[test]
    fn test_build_request_shape() {
        let tables = vec![companies_table(&["Acme"])];
        let request = build_request(IngestKind::Company, &tables).unwrap();
        assert_eq!(request.data_type, "company");
        assert_eq!(request.sub_type, None);
        assert_eq!(request.tables.len(), 1);
        assert_eq!(request.tables[0].name, "companies");
        assert_eq!(request.tables[0].data[0]["name"], "Acme");
    }

    #[test]
    fn test_prune_matches_by_name_not_id() {
        let mut tables = vec![companies_table(&["Acme", "Beta"])];
        let mut response = BulkSaveResponse::default();
        response.results.insert(
            "companies".to_string(),
            TableSaveResult {
                inserted: 1,
                names: vec!["ACME".to_string()],
            },
        );
        prune_saved(&mut tables, &response);
        assert_eq!(tables[0].len(), 1);
        match &tables[0] {
            AnyTable::Companies(t) => assert_eq!(t.rows[0].name, "Beta"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_prune_ignores_unlisted_tables() {
        let mut tables = vec![companies_table(&["Acme"])];
        prune_saved(&mut tables, &BulkSaveResponse::default());
        assert_eq!(tables[0].len(), 1);
    }
}
