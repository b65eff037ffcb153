//! Merger & acquisition extractor. The "Deal Type" column discriminates
//! asset deals (which fan out into the projects and deal_assets tables)
//! from corporate deals (companies only). An unrecognized discriminator
//! keeps the row with no subtype.

use crate::descriptor::{
    deal_asset_columns, deal_columns, deal_company_columns, company_columns, project_columns,
};
use crate::enums::{CompanyRole, DealSubtype, Sector, Technology};
use crate::extract::{ensure_entity, name_or_fallback, opt_text, CompanyLinks, EntityPool};
use crate::ident::generate_id;
use crate::model::{
    AnyTable, DealAssetLink, DealRecord, IngestKind, MaDeal, ProjectRecord, ReferenceData,
    TableData,
};
use crate::normalize::{
    match_token, parse_date, parse_multi, parse_number, resolve_country, split_names_numbers,
};
use crate::tokenizer::RawRow;
use std::collections::HashSet;

pub(crate) const HEADERS: &[&str] = &[
    "Deal update",
    "Date",
    "Deal Type",
    "Country",
    "Sector(s)",
    "Technology",
    "Asset(s)",
    "Capacity (MW)",
    "Buyer(s)",
    "Seller(s)",
    "Advisor(s)",
    "Deal value ($ million)",
    "Equity (%)",
    "Summary",
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
        let subtype = parse_subtype(row.get("Deal Type"));
        let country = resolve_country(row.get("Country"));
        let technologies = parse_multi::<Technology>(row.get("Technology"));

        let deal_id = ensure_entity(
            &mut deal_pool,
            &mut deals,
            generate_id(&name, Some("deal")),
            &name,
            |id| {
                DealRecord::MergerAcquisition(MaDeal {
                    id,
                    name: name.clone(),
                    subtype,
                    date: parse_date(row.get("Date")),
                    country,
                    sectors: parse_multi::<Sector>(row.get("Sector(s)")),
                    technologies: technologies.clone(),
                    amount: parse_number(row.get("Deal value ($ million)")),
                    equity_pct: parse_number(row.get("Equity (%)")),
                    summary: opt_text(row.get("Summary")),
                    source_url: opt_text(row.get("Source")),
                    source_row: row.index,
                })
            },
        );

        // Corporate deals carry no asset fan-out.
        if subtype != Some(DealSubtype::MaCorporate) {
            let assets = split_names_numbers(row.get("Asset(s)"));
            let capacity =
                parse_number(row.get("Capacity (MW)")).filter(|_| assets.names.len() == 1);
            for (pos, asset_name) in assets.names.iter().enumerate() {
                let asset_id = ensure_entity(
                    &mut project_pool,
                    &mut projects,
                    generate_id(asset_name, Some("project")),
                    asset_name,
                    |id| ProjectRecord {
                        id,
                        name: asset_name.clone(),
                        country,
                        stage: None,
                        technologies: technologies.clone(),
                        capacity_mw: capacity,
                        coordinates: None,
                        description: None,
                        source_row: row.index,
                    },
                );
                if asset_keys.insert((deal_id.clone(), asset_id.clone())) {
                    deal_assets.push(DealAssetLink {
                        deal_id: deal_id.clone(),
                        asset_id,
                        stake_pct: assets.numbers.get(pos).copied().flatten(),
                        source_row: row.index,
                    });
                }
            }
        }

        let buyers = split_names_numbers(row.get("Buyer(s)"));
        for (pos, buyer) in buyers.names.iter().enumerate() {
            if let Some(link) = companies.attach(&deal_id, buyer, CompanyRole::Buyer, row.index) {
                link.equity_pct = buyers.numbers.get(pos).copied().flatten();
            }
        }

        let sellers = split_names_numbers(row.get("Seller(s)"));
        for (pos, seller) in sellers.names.iter().enumerate() {
            if let Some(link) = companies.attach(&deal_id, seller, CompanyRole::Seller, row.index) {
                link.equity_pct = sellers.numbers.get(pos).copied().flatten();
            }
        }

        companies.attach_list(&deal_id, row.get("Advisor(s)"), CompanyRole::Advisor, row.index);
    }

    vec![
        AnyTable::Deals(TableData::new(
            "deals",
            deal_columns(IngestKind::MergerAcquisition),
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

fn parse_subtype(raw: &str) -> Option<DealSubtype> {
    match match_token(raw).as_deref() {
        Some("asset" | "ma_asset") => Some(DealSubtype::MaAsset),
        Some("corporate" | "ma_corporate") => Some(DealSubtype::MaCorporate),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NamedRef, Tabular};
    use crate::tokenizer::parse_delimited;

    fn table<'a>(tables: &'a [AnyTable], name: &str) -> &'a AnyTable {
        tables.iter().find(|t| t.name() == name).unwrap()
    }

    #[test]
    fn test_corporate_deal_example() {
        let csv = "Deal update,Deal Type,Buyer(s),Seller(s),Deal value ($ million)\n\
                   Acme buys SolarCo,Corporate,Acme Corp,SolarCo,150.5\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &ReferenceData::default());

        let deals = match table(&tables, "deals") {
            AnyTable::Deals(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(deals.rows.len(), 1);
        match &deals.rows[0] {
            DealRecord::MergerAcquisition(deal) => {
                assert_eq!(deal.subtype, Some(DealSubtype::MaCorporate));
                assert_eq!(deal.amount, Some(150.5));
            }
            _ => unreachable!(),
        }

        let companies = match table(&tables, "companies") {
            AnyTable::Companies(t) => t,
            _ => unreachable!(),
        };
        let ids: Vec<_> = companies.rows.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["company-acme-corp", "company-solarco"]);

        let links = match table(&tables, "deal_companies") {
            AnyTable::DealCompanies(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(links.rows.len(), 2);
        assert_eq!(links.rows[0].role, CompanyRole::Buyer);
        assert_eq!(links.rows[0].company_id, "company-acme-corp");
        assert_eq!(links.rows[1].role, CompanyRole::Seller);
        assert_eq!(links.rows[1].company_id, "company-solarco");

        // Corporate deals produce no asset rows.
        assert!(table(&tables, "projects").is_empty());
        assert!(table(&tables, "deal_assets").is_empty());
    }

    #[test]
    fn test_asset_deal_fans_out_with_stakes() {
        let csv = "Deal update,Deal Type,Asset(s),Capacity (MW),Buyer(s)\n\
                   Stake sale,Asset,Wind One (49%); Wind Two,400,Acme\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &ReferenceData::default());

        let assets = match table(&tables, "deal_assets") {
            AnyTable::DealAssets(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(assets.rows.len(), 2);
        assert_eq!(assets.rows[0].stake_pct, Some(49.0));
        assert_eq!(assets.rows[1].stake_pct, None);

        // Capacity only attaches when the row names a single asset.
        let projects = match table(&tables, "projects") {
            AnyTable::Projects(t) => t,
            _ => unreachable!(),
        };
        assert!(projects.rows.iter().all(|p| p.capacity_mw.is_none()));
    }

    #[test]
    fn test_unrecognized_subtype_keeps_row() {
        let csv = "Deal update,Deal Type\nMystery deal,Hostile\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &ReferenceData::default());
        let deals = match table(&tables, "deals") {
            AnyTable::Deals(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(deals.rows.len(), 1);
        assert_eq!(deals.rows[0].value("subtype"), crate::model::Value::Absent);
    }

    #[test]
    fn test_blank_name_falls_back_to_position() {
        let csv = "Deal update,Buyer(s)\n,Acme\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &ReferenceData::default());
        let deals = match table(&tables, "deals") {
            AnyTable::Deals(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(deals.rows[0].display_name(), Some("deal-1"));
    }

    #[test]
    fn test_reference_company_not_recreated_but_linked() {
        let reference = ReferenceData {
            companies: vec![NamedRef::new("company-acme-corp", "Acme Corp")],
            ..Default::default()
        };
        let csv = "Deal update,Buyer(s)\nDeal,Acme Corp\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &reference);

        assert!(table(&tables, "companies").is_empty());
        let links = match table(&tables, "deal_companies") {
            AnyTable::DealCompanies(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(links.rows[0].company_id, "company-acme-corp");
    }
}
