//! Non-deal loaders: plain project rows and plain company rows. Project
//! sponsors fan out into the companies and project_companies tables.

use crate::descriptor::{company_columns, project_columns, project_company_columns};
use crate::enums::{CompanyClassification, CompanyRole, ProjectStage, Technology};
use crate::extract::{ensure_entity, name_or_fallback, opt_text, split_list, EntityPool};
use crate::ident::generate_id;
use crate::model::{
    AnyTable, CompanyRecord, ProjectCompanyLink, ProjectRecord, ReferenceData, TableData,
};
use crate::normalize::{
    parse_enum, parse_geography, parse_multi, parse_number, parse_sponsor, resolve_country,
};
use crate::tokenizer::RawRow;
use std::collections::HashSet;

pub(crate) const PROJECT_HEADERS: &[&str] = &[
    "Name",
    "Country",
    "Stage",
    "Technology",
    "Capacity (MW)",
    "Coordinates",
    "Sponsor(s)",
    "Description",
];

pub(crate) const COMPANY_HEADERS: &[&str] = &[
    "Name",
    "Country",
    "Classification(s)",
    "Website",
    "Description",
];

pub fn extract_projects(rows: &[RawRow], reference: &ReferenceData) -> Vec<AnyTable> {
    let mut project_pool = EntityPool::from_refs(&reference.projects);
    let mut company_pool = EntityPool::from_refs(&reference.companies);

    let mut projects: Vec<ProjectRecord> = Vec::new();
    let mut companies: Vec<CompanyRecord> = Vec::new();
    let mut project_companies: Vec<ProjectCompanyLink> = Vec::new();
    let mut sponsor_keys: HashSet<(String, String, CompanyRole)> = HashSet::new();

    for row in rows {
        let name = name_or_fallback(row.get("Name"), "project", row.index);
        let project_id = ensure_entity(
            &mut project_pool,
            &mut projects,
            generate_id(&name, Some("project")),
            &name,
            |id| ProjectRecord {
                id,
                name: name.clone(),
                country: resolve_country(row.get("Country")),
                stage: parse_enum::<ProjectStage>(row.get("Stage")),
                technologies: parse_multi::<Technology>(row.get("Technology")),
                capacity_mw: parse_number(row.get("Capacity (MW)")),
                coordinates: parse_geography(row.get("Coordinates")),
                description: opt_text(row.get("Description")),
                source_row: row.index,
            },
        );

        for entry in split_list(row.get("Sponsor(s)")) {
            let Some(info) = parse_sponsor(&entry) else {
                continue;
            };
            let company_id = ensure_entity(
                &mut company_pool,
                &mut companies,
                generate_id(&info.name, Some("company")),
                &info.name,
                |id| CompanyRecord::bare(id, &info.name, row.index),
            );
            let key = (project_id.clone(), company_id.clone(), CompanyRole::Sponsor);
            if sponsor_keys.insert(key) {
                project_companies.push(ProjectCompanyLink {
                    project_id: project_id.clone(),
                    company_id,
                    role: CompanyRole::Sponsor,
                    ownership_pct: info.percentage_ownership,
                    source_row: row.index,
                });
            }
        }
    }

    vec![
        AnyTable::Projects(TableData::new("projects", project_columns(), projects)),
        AnyTable::Companies(TableData::new("companies", company_columns(), companies)),
        AnyTable::ProjectCompanies(TableData::new(
            "project_companies",
            project_company_columns(),
            project_companies,
        )),
    ]
}

pub fn extract_companies(rows: &[RawRow], reference: &ReferenceData) -> Vec<AnyTable> {
    let mut company_pool = EntityPool::from_refs(&reference.companies);
    let mut companies: Vec<CompanyRecord> = Vec::new();

    for row in rows {
        let name = name_or_fallback(row.get("Name"), "company", row.index);
        ensure_entity(
            &mut company_pool,
            &mut companies,
            generate_id(&name, Some("company")),
            &name,
            |id| CompanyRecord {
                id,
                name: name.clone(),
                country: resolve_country(row.get("Country")),
                classifications: parse_multi::<CompanyClassification>(
                    row.get("Classification(s)"),
                ),
                website: opt_text(row.get("Website")),
                description: opt_text(row.get("Description")),
                source_row: row.index,
            },
        );
    }

    vec![AnyTable::Companies(TableData::new(
        "companies",
        company_columns(),
        companies,
    ))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::CountryCode;
    use crate::model::NamedRef;
    use crate::tokenizer::parse_delimited;

    #[test]
    fn test_project_rows_with_sponsors() {
        let csv = "Name,Country,Stage,Technology,Sponsor(s)\n\
                   Solar Park One,Spain,Operational,Solar PV,Fund X ($120.5/30%)\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract_projects(&rows, &ReferenceData::default());

        let projects = match &tables[0] {
            AnyTable::Projects(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(projects.rows[0].country, Some(CountryCode::Es));
        assert_eq!(projects.rows[0].stage, Some(ProjectStage::Operational));

        let links = match &tables[2] {
            AnyTable::ProjectCompanies(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(links.rows[0].ownership_pct, Some(30.0));

        let companies = match &tables[1] {
            AnyTable::Companies(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(companies.rows[0].name, "Fund X");
    }

    #[test]
    fn test_company_rows() {
        let csv = "Name,Country,Classification(s),Website\n\
                   Acme Power,Germany,IPP; Utility,https://acme.example\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract_companies(&rows, &ReferenceData::default());

        let companies = match &tables[0] {
            AnyTable::Companies(t) => t,
            _ => unreachable!(),
        };
        let company = &companies.rows[0];
        assert_eq!(company.id, "company-acme-power");
        assert_eq!(company.country, Some(CountryCode::De));
        assert_eq!(
            company.classifications,
            vec![
                CompanyClassification::IndependentPowerProducer,
                CompanyClassification::Utility
            ]
        );
    }

    #[test]
    fn test_known_company_skipped() {
        let reference = ReferenceData {
            companies: vec![NamedRef::new("company-acme-power", "Acme Power")],
            ..Default::default()
        };
        let csv = "Name\nAcme Power\nBeta\n";
        let (_, rows) = parse_delimited(csv);
        let tables = extract_companies(&rows, &reference);
        let companies = match &tables[0] {
            AnyTable::Companies(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(companies.rows.len(), 1);
        assert_eq!(companies.rows[0].name, "Beta");
    }
}
