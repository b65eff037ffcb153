//! Project status-update extractor. The update itself is a deal row;
//! the project it concerns is upserted with stage/capacity/location and
//! linked through the deal_assets table. Developers land in the
//! project_companies table.

use crate::descriptor::{
    company_columns, deal_asset_columns, deal_columns, project_columns, project_company_columns,
};
use crate::enums::{CompanyRole, DealSubtype, ProjectStage, Technology};
use crate::extract::{ensure_entity, name_or_fallback, opt_text, EntityPool};
use crate::ident::generate_id;
use crate::model::{
    AnyTable, CompanyRecord, DealAssetLink, DealRecord, IngestKind, ProjectCompanyLink,
    ProjectRecord, ReferenceData, TableData, UpdateDeal,
};
use crate::normalize::{
    parse_date, parse_enum, parse_geography, parse_multi, parse_number, resolve_country,
    split_names_numbers,
};
use crate::tokenizer::RawRow;
use std::collections::HashSet;

pub(crate) const HEADERS: &[&str] = &[
    "Deal update",
    "Project",
    "Date",
    "Country",
    "Stage",
    "Technology",
    "Capacity (MW)",
    "Coordinates",
    "Developer(s)",
    "Summary",
    "Source",
];

pub fn extract(rows: &[RawRow], reference: &ReferenceData) -> Vec<AnyTable> {
    let mut deal_pool = EntityPool::from_refs(&reference.deals);
    let mut project_pool = EntityPool::from_refs(&reference.projects);
    let mut company_pool = EntityPool::from_refs(&reference.companies);

    let mut deals: Vec<DealRecord> = Vec::new();
    let mut projects: Vec<ProjectRecord> = Vec::new();
    let mut companies: Vec<CompanyRecord> = Vec::new();
    let mut deal_assets: Vec<DealAssetLink> = Vec::new();
    let mut project_companies: Vec<ProjectCompanyLink> = Vec::new();
    let mut asset_keys: HashSet<(String, String)> = HashSet::new();
    let mut developer_keys: HashSet<(String, String, CompanyRole)> = HashSet::new();

    for row in rows {
        let country = resolve_country(row.get("Country"));

        let project_name = name_or_fallback(row.get("Project"), "project", row.index);
        let project_id = ensure_entity(
            &mut project_pool,
            &mut projects,
            generate_id(&project_name, Some("project")),
            &project_name,
            |id| ProjectRecord {
                id,
                name: project_name.clone(),
                country,
                stage: parse_enum::<ProjectStage>(row.get("Stage")),
                technologies: parse_multi::<Technology>(row.get("Technology")),
                capacity_mw: parse_number(row.get("Capacity (MW)")),
                coordinates: parse_geography(row.get("Coordinates")),
                description: None,
                source_row: row.index,
            },
        );

        let deal_name = name_or_fallback(row.get("Deal update"), "deal", row.index);
        let deal_id = ensure_entity(
            &mut deal_pool,
            &mut deals,
            generate_id(&deal_name, Some("deal")),
            &deal_name,
            |id| {
                DealRecord::ProjectUpdate(UpdateDeal {
                    id,
                    name: deal_name.clone(),
                    subtype: Some(DealSubtype::ProjectUpdate),
                    date: parse_date(row.get("Date")),
                    country,
                    summary: opt_text(row.get("Summary")),
                    source_url: opt_text(row.get("Source")),
                    source_row: row.index,
                })
            },
        );

        if asset_keys.insert((deal_id.clone(), project_id.clone())) {
            deal_assets.push(DealAssetLink {
                deal_id,
                asset_id: project_id.clone(),
                stake_pct: None,
                source_row: row.index,
            });
        }

        let developers = split_names_numbers(row.get("Developer(s)"));
        for (pos, developer) in developers.names.iter().enumerate() {
            let company_id = ensure_entity(
                &mut company_pool,
                &mut companies,
                generate_id(developer, Some("company")),
                developer,
                |id| CompanyRecord::bare(id, developer, row.index),
            );
            let key = (project_id.clone(), company_id.clone(), CompanyRole::Developer);
            if developer_keys.insert(key) {
                project_companies.push(ProjectCompanyLink {
                    project_id: project_id.clone(),
                    company_id,
                    role: CompanyRole::Developer,
                    ownership_pct: developers.numbers.get(pos).copied().flatten(),
                    source_row: row.index,
                });
            }
        }
    }

    vec![
        AnyTable::Deals(TableData::new(
            "deals",
            deal_columns(IngestKind::ProjectUpdate),
            deals,
        )),
        AnyTable::Projects(TableData::new("projects", project_columns(), projects)),
        AnyTable::Companies(TableData::new("companies", company_columns(), companies)),
        AnyTable::DealAssets(TableData::new(
            "deal_assets",
            deal_asset_columns(),
            deal_assets,
        )),
        AnyTable::ProjectCompanies(TableData::new(
            "project_companies",
            project_company_columns(),
            project_companies,
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::parse_delimited;

    #[test]
    fn test_project_upsert_and_links() {
        let csv = "Deal update,Project,Stage,Technology,Capacity (MW),Coordinates,Developer(s)\n\
                   Milestone reached,Solar Park One,RTB,Solar PV,200,\"4.35, 50.85\",Acme (60%)\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &ReferenceData::default());

        let projects = match tables.iter().find(|t| t.name() == "projects").unwrap() {
            AnyTable::Projects(t) => t,
            _ => unreachable!(),
        };
        let project = &projects.rows[0];
        assert_eq!(project.stage, Some(ProjectStage::ReadyToBuild));
        assert_eq!(project.technologies, vec![Technology::Photovoltaic]);
        assert_eq!(project.coordinates, Some([4.35, 50.85]));

        let links = match tables.iter().find(|t| t.name() == "project_companies").unwrap() {
            AnyTable::ProjectCompanies(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(links.rows[0].role, CompanyRole::Developer);
        assert_eq!(links.rows[0].ownership_pct, Some(60.0));

        let deal_assets = match tables.iter().find(|t| t.name() == "deal_assets").unwrap() {
            AnyTable::DealAssets(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(deal_assets.rows.len(), 1);
    }

    #[test]
    fn test_two_updates_same_project() {
        let csv = "Deal update,Project\nPermit granted,Wind Farm\nConstruction start,Wind Farm\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &ReferenceData::default());

        let projects = match tables.iter().find(|t| t.name() == "projects").unwrap() {
            AnyTable::Projects(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(projects.rows.len(), 1);

        let deals = match tables.iter().find(|t| t.name() == "deals").unwrap() {
            AnyTable::Deals(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(deals.rows.len(), 2);
    }
}
