//! Joint-venture extractor. Partner equity splits ride positionally on
//! the partner list.

use crate::descriptor::{
    company_columns, deal_asset_columns, deal_columns, deal_company_columns, project_columns,
};
use crate::enums::{CompanyRole, DealSubtype, Sector, Technology};
use crate::extract::{ensure_entity, name_or_fallback, opt_text, split_list, CompanyLinks, EntityPool};
use crate::ident::generate_id;
use crate::model::{
    AnyTable, DealAssetLink, DealRecord, IngestKind, JvDeal, ProjectRecord, ReferenceData,
    TableData,
};
use crate::normalize::{
    parse_date, parse_multi, resolve_country, split_names_numbers,
};
use crate::tokenizer::RawRow;
use std::collections::HashSet;

pub(crate) const HEADERS: &[&str] = &[
    "Deal update",
    "Date",
    "Country",
    "Sector(s)",
    "Technology",
    "Partner(s)",
    "Project(s)",
    "Purpose",
    "Source",
];

pub fn extract(rows: &[RawRow], reference: &ReferenceData) -> Vec<AnyTable> {
    let mut deal_pool = EntityPool::from_refs(&reference.deals);
    let mut project_pool = EntityPool::from_refs(&reference.projects);
    let mut companies = CompanyLinks::new(&reference.companies);

    let mut deals: Vec<DealRecord> = Vec::new();
    let mut projects: Vec<ProjectRecord> = Vec::new();
    let mut deal_assets: Vec<DealAssetLink> = Vec::new();
    let mut asset_keys: HashSet<(String, String)> = HashSet::new();

    for row in rows {
        let name = name_or_fallback(row.get("Deal update"), "deal", row.index);
        let country = resolve_country(row.get("Country"));
        let technologies = parse_multi::<Technology>(row.get("Technology"));

        let deal_id = ensure_entity(
            &mut deal_pool,
            &mut deals,
            generate_id(&name, Some("deal")),
            &name,
            |id| {
                DealRecord::JointVenture(JvDeal {
                    id,
                    name: name.clone(),
                    subtype: Some(DealSubtype::JointVenture),
                    date: parse_date(row.get("Date")),
                    country,
                    sectors: parse_multi::<Sector>(row.get("Sector(s)")),
                    technologies: technologies.clone(),
                    summary: opt_text(row.get("Purpose")),
                    source_url: opt_text(row.get("Source")),
                    source_row: row.index,
                })
            },
        );

        let partners = split_names_numbers(row.get("Partner(s)"));
        for (pos, partner) in partners.names.iter().enumerate() {
            if let Some(link) = companies.attach(&deal_id, partner, CompanyRole::Partner, row.index)
            {
                link.equity_pct = partners.numbers.get(pos).copied().flatten();
            }
        }

        for project_name in split_list(row.get("Project(s)")) {
            let asset_id = ensure_entity(
                &mut project_pool,
                &mut projects,
                generate_id(&project_name, Some("project")),
                &project_name,
                |id| {
                    let mut record = ProjectRecord::bare(id, &project_name, row.index);
                    record.country = country;
                    record.technologies = technologies.clone();
                    record
                },
            );
            if asset_keys.insert((deal_id.clone(), asset_id.clone())) {
                deal_assets.push(DealAssetLink {
                    deal_id: deal_id.clone(),
                    asset_id,
                    stake_pct: None,
                    source_row: row.index,
                });
            }
        }
    }

    vec![
        AnyTable::Deals(TableData::new(
            "deals",
            deal_columns(IngestKind::JointVenture),
            deals,
        )),
        AnyTable::Projects(TableData::new("projects", project_columns(), projects)),
        AnyTable::Companies(TableData::new(
            "companies",
            company_columns(),
            companies.companies,
        )),
        AnyTable::DealAssets(TableData::new(
            "deal_assets",
            deal_asset_columns(),
            deal_assets,
        )),
        AnyTable::DealCompanies(TableData::new(
            "deal_companies",
            deal_company_columns(),
            companies.links,
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::parse_delimited;

    #[test]
    fn test_partner_equity_split() {
        let csv = "Deal update,Partner(s),Purpose\n\
                   Offshore JV,Acme (51%); Beta Energy (49%),Develop offshore wind\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &ReferenceData::default());

        let links = match tables.iter().find(|t| t.name() == "deal_companies").unwrap() {
            AnyTable::DealCompanies(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(links.rows.len(), 2);
        assert_eq!(links.rows[0].equity_pct, Some(51.0));
        assert_eq!(links.rows[1].equity_pct, Some(49.0));
        assert!(links.rows.iter().all(|l| l.role == CompanyRole::Partner));
    }

    #[test]
    fn test_same_partner_in_two_deals() {
        let csv = "Deal update,Partner(s)\nJV One,Acme\nJV Two,Acme\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &ReferenceData::default());

        // One company record, two relationship rows.
        let companies = match tables.iter().find(|t| t.name() == "companies").unwrap() {
            AnyTable::Companies(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(companies.rows.len(), 1);
        let links = match tables.iter().find(|t| t.name() == "deal_companies").unwrap() {
            AnyTable::DealCompanies(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(links.rows.len(), 2);
    }
}
