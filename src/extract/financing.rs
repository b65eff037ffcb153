//! Financing extractor: debt/equity/refinancing/green-bond raises.
//! Lender commitments correlate positionally with the lender list;
//! sponsor entries carry their own parenthesized descriptor.

use crate::descriptor::{
    company_columns, deal_asset_columns, deal_columns, deal_company_columns, project_columns,
};
use crate::enums::{CompanyRole, DealSubtype, Sector, Technology};
use crate::extract::{ensure_entity, name_or_fallback, opt_text, split_list, CompanyLinks, EntityPool};
use crate::ident::generate_id;
use crate::model::{
    AnyTable, DealAssetLink, DealRecord, FinancingDeal, IngestKind, ProjectRecord, ReferenceData,
    TableData,
};
use crate::normalize::{
    parse_date, parse_enum, parse_multi, parse_number, parse_sponsor, resolve_country,
    split_names_numbers,
};
use crate::tokenizer::RawRow;
use std::collections::HashSet;

pub(crate) const HEADERS: &[&str] = &[
    "Deal update",
    "Date",
    "Financing Type",
    "Country",
    "Sector(s)",
    "Technology",
    "Amount ($ million)",
    "Borrower",
    "Project(s)",
    "Sponsor(s)",
    "Lender(s)",
    "Maturity (years)",
    "Use of proceeds",
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
        let subtype = parse_enum::<DealSubtype>(row.get("Financing Type")).filter(|s| {
            matches!(
                s,
                DealSubtype::Debt | DealSubtype::Equity | DealSubtype::Refinancing
                    | DealSubtype::GreenBond
            )
        });
        let country = resolve_country(row.get("Country"));
        let technologies = parse_multi::<Technology>(row.get("Technology"));

        let deal_id = ensure_entity(
            &mut deal_pool,
            &mut deals,
            generate_id(&name, Some("deal")),
            &name,
            |id| {
                DealRecord::Financing(FinancingDeal {
                    id,
                    name: name.clone(),
                    subtype,
                    date: parse_date(row.get("Date")),
                    country,
                    sectors: parse_multi::<Sector>(row.get("Sector(s)")),
                    technologies: technologies.clone(),
                    amount: parse_number(row.get("Amount ($ million)")),
                    summary: opt_text(row.get("Use of proceeds")),
                    source_url: opt_text(row.get("Source")),
                    source_row: row.index,
                })
            },
        );

        let borrower = row.get("Borrower");
        if !borrower.is_empty() {
            companies.attach(&deal_id, borrower, CompanyRole::Borrower, row.index);
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

        for entry in split_list(row.get("Sponsor(s)")) {
            if let Some(info) = parse_sponsor(&entry) {
                if let Some(link) =
                    companies.attach(&deal_id, &info.name, CompanyRole::Sponsor, row.index)
                {
                    link.equity_amount = info.equity_amount;
                    link.equity_pct = info.percentage_ownership;
                    link.detail = info.detail;
                }
            }
        }

        let lenders = split_names_numbers(row.get("Lender(s)"));
        let maturity = parse_number(row.get("Maturity (years)"));
        for (pos, lender) in lenders.names.iter().enumerate() {
            if let Some(link) = companies.attach(&deal_id, lender, CompanyRole::Lender, row.index) {
                link.commitment = lenders.numbers.get(pos).copied().flatten();
                link.maturity_years = maturity;
            }
        }
    }

    vec![
        AnyTable::Deals(TableData::new(
            "deals",
            deal_columns(IngestKind::Financing),
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

    fn deal_companies(tables: &[AnyTable]) -> &TableData<crate::model::DealCompanyLink> {
        match tables.iter().find(|t| t.name() == "deal_companies").unwrap() {
            AnyTable::DealCompanies(t) => t,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_lender_commitments_by_position() {
        let csv = "Deal update,Financing Type,Lender(s),Maturity (years)\n\
                   Loan A,Debt,Bank One ($200); Bank Two ($150); Bank Three,7\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &ReferenceData::default());

        let links = deal_companies(&tables);
        assert_eq!(links.rows.len(), 3);
        assert_eq!(links.rows[0].commitment, Some(200.0));
        assert_eq!(links.rows[1].commitment, Some(150.0));
        assert_eq!(links.rows[2].commitment, None);
        assert!(links.rows.iter().all(|l| l.maturity_years == Some(7.0)));
        assert!(links.rows.iter().all(|l| l.role == CompanyRole::Lender));
    }

    #[test]
    fn test_sponsor_descriptor_attributes() {
        let csv = "Deal update,Financing Type,Sponsor(s)\n\
                   Raise,Equity,Fund X ($120.5/30%); Fund Y (40%)\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &ReferenceData::default());

        let links = deal_companies(&tables);
        assert_eq!(links.rows[0].equity_amount, Some(120.5));
        assert_eq!(links.rows[0].equity_pct, Some(30.0));
        assert_eq!(links.rows[1].equity_amount, None);
        assert_eq!(links.rows[1].equity_pct, Some(40.0));
    }

    #[test]
    fn test_subtype_and_empty_roles() {
        let csv = "Deal update,Financing Type,Borrower,Lender(s)\n\
                   Bond,Green Bond,,n/a\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract(&rows, &ReferenceData::default());

        let deals = match tables.iter().find(|t| t.name() == "deals").unwrap() {
            AnyTable::Deals(t) => t,
            _ => unreachable!(),
        };
        match &deals.rows[0] {
            DealRecord::Financing(deal) => {
                assert_eq!(deal.subtype, Some(DealSubtype::GreenBond))
            }
            _ => unreachable!(),
        }
        // Empty role cells produce no relationship rows.
        assert!(deal_companies(&tables).rows.is_empty());
    }
}
