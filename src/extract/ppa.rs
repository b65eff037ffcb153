//! Power-purchase-agreement extractor. Offtaker entries carry their
//! contracted capacity positionally; the revenue-model cell may embed
//! the contract term in a parenthetical.

use crate::descriptor::{
    company_columns, deal_asset_columns, deal_columns, deal_company_columns, project_columns,
};
use crate::enums::{CompanyRole, DealSubtype, Technology};
use crate::extract::{ensure_entity, name_or_fallback, opt_text, split_list, CompanyLinks, EntityPool};
use crate::ident::generate_id;
use crate::model::{
    AnyTable, DealAssetLink, DealRecord, IngestKind, PpaDeal, ProjectRecord, ReferenceData,
    TableData,
};
use crate::normalize::{
    parse_date, parse_multi, parse_number, parse_revenue_model, resolve_country,
    split_names_numbers,
};
use crate::tokenizer::RawRow;
use std::collections::HashSet;

pub(crate) const HEADERS: &[&str] = &[
    "Deal update",
    "Date",
    "Country",
    "Technology",
    "Project(s)",
    "Capacity (MW)",
    "Offtaker(s)",
    "Seller",
    "Revenue model",
    "Term (years)",
    "Price ($/MWh)",
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
        let country = resolve_country(row.get("Country"));
        let technologies = parse_multi::<Technology>(row.get("Technology"));
        let revenue = parse_revenue_model(row.get("Revenue model"));

        // Explicit term column wins over the parenthetical duration.
        let term_years = parse_number(row.get("Term (years)")).or(revenue.duration_years);

        let project_names = split_list(row.get("Project(s)"));
        let capacity =
            parse_number(row.get("Capacity (MW)")).filter(|_| project_names.len() == 1);

        let deal_id = ensure_entity(
            &mut deal_pool,
            &mut deals,
            generate_id(&name, Some("deal")),
            &name,
            |id| {
                DealRecord::PowerPurchase(PpaDeal {
                    id,
                    name: name.clone(),
                    subtype: Some(DealSubtype::Ppa),
                    date: parse_date(row.get("Date")),
                    country,
                    technologies: technologies.clone(),
                    capacity_mw: parse_number(row.get("Capacity (MW)")),
                    term_years,
                    price_mwh: parse_number(row.get("Price ($/MWh)")),
                    revenue_model: revenue.model,
                    summary: opt_text(row.get("Summary")),
                    source_url: opt_text(row.get("Source")),
                    source_row: row.index,
                })
            },
        );

        for project_name in &project_names {
            let asset_id = ensure_entity(
                &mut project_pool,
                &mut projects,
                generate_id(project_name, Some("project")),
                project_name,
                |id| {
                    let mut record = ProjectRecord::bare(id, project_name, row.index);
                    record.country = country;
                    record.technologies = technologies.clone();
                    record.capacity_mw = capacity;
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

        let offtakers = split_names_numbers(row.get("Offtaker(s)"));
        for (pos, offtaker) in offtakers.names.iter().enumerate() {
            if let Some(link) =
                companies.attach(&deal_id, offtaker, CompanyRole::Offtaker, row.index)
            {
                link.contracted_mw = offtakers.numbers.get(pos).copied().flatten();
            }
        }

        let seller = row.get("Seller");
        if !seller.is_empty() {
            companies.attach(&deal_id, seller, CompanyRole::Seller, row.index);
        }
    }

    vec![
        AnyTable::Deals(TableData::new(
            "deals",
            deal_columns(IngestKind::PowerPurchaseAgreement),
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
    use crate::enums::RevenueModel;
    use crate::tokenizer::parse_delimited;

    #[test]
    fn test_revenue_model_and_term() {
        let csv = "Deal update,Project(s),Offtaker(s),Revenue model,Capacity (MW)\n\
                   Corporate PPA,Solar Park One,Acme Industrial (120),Power Purchase Agreement (20),150\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &ReferenceData::default());

        let deals = match tables.iter().find(|t| t.name() == "deals").unwrap() {
            AnyTable::Deals(t) => t,
            _ => unreachable!(),
        };
        match &deals.rows[0] {
            DealRecord::PowerPurchase(deal) => {
                assert_eq!(deal.revenue_model, Some(RevenueModel::PowerPurchaseAgreement));
                assert_eq!(deal.term_years, Some(20.0));
                assert_eq!(deal.capacity_mw, Some(150.0));
            }
            _ => unreachable!(),
        }

        let links = match tables.iter().find(|t| t.name() == "deal_companies").unwrap() {
            AnyTable::DealCompanies(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(links.rows[0].role, CompanyRole::Offtaker);
        assert_eq!(links.rows[0].contracted_mw, Some(120.0));

        let projects = match tables.iter().find(|t| t.name() == "projects").unwrap() {
            AnyTable::Projects(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(projects.rows[0].capacity_mw, Some(150.0));
    }

    #[test]
    fn test_term_column_wins() {
        let csv = "Deal update,Revenue model,Term (years)\n\
                   PPA,Power Purchase Agreement (20),15\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &ReferenceData::default());
        let deals = match tables.iter().find(|t| t.name() == "deals").unwrap() {
            AnyTable::Deals(t) => t,
            _ => unreachable!(),
        };
        match &deals.rows[0] {
            DealRecord::PowerPurchase(deal) => assert_eq!(deal.term_years, Some(15.0)),
            _ => unreachable!(),
        }
    }
}
