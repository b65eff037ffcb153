//! Pure field normalizers: free-text and abbreviated business data in,
//! canonical typed values out. Every function here fails soft — a cell
//! that cannot be interpreted becomes `None`, never an error, so one bad
//! cell can never abort a batch.

use crate::enums::{CountryCode, DomainEnum, RevenueModel};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Ad hoc abbreviation rewrites applied after canonicalization and
/// before enum membership testing. Configuration data, not logic: new
/// synonyms are added here without touching any extractor.
pub const SYNONYMS: &[(&str, &str)] = &[
    ("rtb", "ready_to_build"),
    ("solar_pv", "photovoltaic"),
    ("pv", "photovoltaic"),
    ("ipp", "independent_power_producer"),
    ("bess", "battery_storage"),
    ("battery", "battery_storage"),
    ("wind_onshore", "onshore_wind"),
    ("wind_offshore", "offshore_wind"),
    ("hydro", "hydroelectric"),
    ("gas", "natural_gas"),
    ("storage", "energy_storage"),
    ("oil_gas", "oil_and_gas"),
    ("ppa", "power_purchase_agreement"),
    ("cfd", "contract_for_difference"),
    ("fit", "feed_in_tariff"),
    ("epc", "epc_contractor"),
    ("fund", "investment_fund"),
];

static PAREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]*)\)").unwrap());
static NUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());
static NUM_FRAGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\s*-?\d[\d.,]*\s*%?").unwrap());
static AMOUNT_AND_PCT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\$\s*([\d,]+(?:\.\d+)?)\s*(?:m|mm|million)?\s*/\s*([\d,]+(?:\.\d+)?)\s*%$")
        .unwrap()
});
static AMOUNT_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\$\s*([\d,]+(?:\.\d+)?)\s*(?:m|mm|million)?$").unwrap());
static PCT_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\d,]+(?:\.\d+)?)\s*%$").unwrap());

/// Canonicalizes a raw cell into a candidate enum token: lowercase,
/// whitespace runs, `/` and `-` all become `_`, then the synonym table
/// is applied. Returns `None` for empty input; membership in any
/// particular enum is the caller's concern.
pub fn match_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut token = String::with_capacity(trimmed.len());
    let mut last_was_sep = false;
    for c in trimmed.to_lowercase().chars() {
        if c.is_whitespace() || c == '/' || c == '-' || c == '_' {
            if !last_was_sep && !token.is_empty() {
                token.push('_');
            }
            last_was_sep = true;
        } else {
            last_was_sep = false;
            token.push(c);
        }
    }
    let token = token.trim_end_matches('_').to_string();
    if token.is_empty() {
        return None;
    }

    match SYNONYMS.iter().find(|(from, _)| *from == token) {
        Some((_, to)) => Some((*to).to_string()),
        None => Some(token),
    }
}

/// Enum matcher: canonicalize, then accept only members of `T`'s
/// canonical token list. Unrecognized values are dropped, never errors.
pub fn parse_enum<T: DomainEnum>(raw: &str) -> Option<T> {
    match_token(raw).and_then(|token| T::from_token(&token))
}

/// Multi-value splitter for `;`-separated cells (sectors, technologies,
/// classifications). Unrecognized entries are filtered out; duplicates
/// collapse to the first occurrence.
pub fn parse_multi<T: DomainEnum + PartialEq>(raw: &str) -> Vec<T> {
    let mut values = Vec::new();
    for entry in raw.split(';') {
        if let Some(value) = parse_enum::<T>(entry) {
            if !values.contains(&value) {
                values.push(value);
            }
        }
    }
    values
}

/// Numeric coercion tolerant of currency symbols, thousands separators
/// and percent signs. Never yields NaN or infinity.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Date coercion across the layouts seen in spreadsheet exports.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Parses a "lon, lat" cell into a two-element coordinate.
pub fn parse_geography(raw: &str) -> Option<[f64; 2]> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 2 {
        return None;
    }
    let lon = parse_number(parts[0])?;
    let lat = parse_number(parts[1])?;
    Some([lon, lat])
}

/// Parallel names/numbers extracted from a semicolon list whose entries
/// interleave free text with numeric or percentage annotations, e.g.
/// `"Acme (25%); Beta (40)"`. Correlation is strictly positional: the
/// Nth name pairs with the Nth number, and entries without a number
/// leave a `None` in the tail rather than shifting later pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedNumbers {
    pub names: Vec<String>,
    pub numbers: Vec<Option<f64>>,
}

pub fn split_names_numbers(raw: &str) -> NamedNumbers {
    let mut out = NamedNumbers::default();
    for entry in raw.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        // Prefer a number inside a parenthetical; fall back to the
        // first number anywhere in the entry.
        let number = PAREN_RE
            .captures_iter(entry)
            .find_map(|caps| NUM_RE.find(caps.get(1).map_or("", |g| g.as_str())))
            .or_else(|| NUM_RE.find(entry))
            .and_then(|m| m.as_str().parse::<f64>().ok());

        let cleaned = PAREN_RE.replace_all(entry, "");
        let cleaned = NUM_FRAGMENT_RE.replace_all(&cleaned, "");
        let name = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            continue;
        }

        out.names.push(name);
        out.numbers.push(number);
    }
    out
}

/// A sponsor mention parsed from a single free-text entry of the form
/// `"Name ($amount / pct%)"`, or the amount-only / percentage-only /
/// free-text-detail variants.
#[derive(Debug, Clone, PartialEq)]
pub struct SponsorInfo {
    pub name: String,
    pub equity_amount: Option<f64>,
    pub percentage_ownership: Option<f64>,
    pub detail: Option<String>,
}

/// Parses one sponsor descriptor. Parenthesized groups are scanned for
/// a combined `$X / Y%` pattern first, then amount-only, then
/// percentage-only; anything else with letters in it becomes free-text
/// detail. Garbled groups (e.g. a stray `"/ %"`) are ignored rather
/// than failing.
pub fn parse_sponsor(raw: &str) -> Option<SponsorInfo> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut equity_amount = None;
    let mut percentage_ownership = None;
    let mut detail = None;

    for caps in PAREN_RE.captures_iter(raw) {
        let group = caps.get(1).map_or("", |g| g.as_str()).trim();
        if group.is_empty() {
            continue;
        }
        if let Some(c) = AMOUNT_AND_PCT_RE.captures(group) {
            if equity_amount.is_none() {
                equity_amount = parse_number(&c[1]);
            }
            if percentage_ownership.is_none() {
                percentage_ownership = parse_number(&c[2]);
            }
        } else if let Some(c) = AMOUNT_ONLY_RE.captures(group) {
            if equity_amount.is_none() {
                equity_amount = parse_number(&c[1]);
            }
        } else if let Some(c) = PCT_ONLY_RE.captures(group) {
            if percentage_ownership.is_none() {
                percentage_ownership = parse_number(&c[1]);
            }
        } else if group.chars().any(char::is_alphabetic) && detail.is_none() {
            detail = Some(group.to_string());
        }
    }

    let name = PAREN_RE.replace_all(raw, "");
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return None;
    }

    Some(SponsorInfo {
        name,
        equity_amount,
        percentage_ownership,
        detail,
    })
}

/// Revenue model plus optional contract duration parsed from a cell
/// like `"Power Purchase Agreement (20)"`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RevenueTerm {
    pub model: Option<RevenueModel>,
    pub duration_years: Option<f64>,
}

pub fn parse_revenue_model(raw: &str) -> RevenueTerm {
    let duration_years = PAREN_RE
        .captures_iter(raw)
        .find_map(|caps| NUM_RE.find(caps.get(1).map_or("", |g| g.as_str())))
        .and_then(|m| m.as_str().parse::<f64>().ok());
    let base = PAREN_RE.replace_all(raw, "");
    RevenueTerm {
        model: parse_enum::<RevenueModel>(&base),
        duration_years,
    }
}

/// Country name/synonym table, lowercase, multiple source languages per
/// country. Configuration data like `SYNONYMS`.
pub const COUNTRY_NAMES: &[(&str, CountryCode)] = &[
    ("argentina", CountryCode::Ar),
    ("australia", CountryCode::Au),
    ("austria", CountryCode::At),
    ("österreich", CountryCode::At),
    ("belgium", CountryCode::Be),
    ("belgique", CountryCode::Be),
    ("belgië", CountryCode::Be),
    ("brazil", CountryCode::Br),
    ("brasil", CountryCode::Br),
    ("canada", CountryCode::Ca),
    ("chile", CountryCode::Cl),
    ("china", CountryCode::Cn),
    ("colombia", CountryCode::Co),
    ("czech republic", CountryCode::Cz),
    ("czechia", CountryCode::Cz),
    ("denmark", CountryCode::Dk),
    ("danmark", CountryCode::Dk),
    ("egypt", CountryCode::Eg),
    ("finland", CountryCode::Fi),
    ("suomi", CountryCode::Fi),
    ("france", CountryCode::Fr),
    ("germany", CountryCode::De),
    ("deutschland", CountryCode::De),
    ("alemania", CountryCode::De),
    ("allemagne", CountryCode::De),
    ("greece", CountryCode::Gr),
    ("india", CountryCode::In),
    ("indonesia", CountryCode::Id),
    ("ireland", CountryCode::Ie),
    ("israel", CountryCode::Il),
    ("italy", CountryCode::It),
    ("italia", CountryCode::It),
    ("japan", CountryCode::Jp),
    ("kenya", CountryCode::Ke),
    ("south korea", CountryCode::Kr),
    ("korea", CountryCode::Kr),
    ("mexico", CountryCode::Mx),
    ("méxico", CountryCode::Mx),
    ("morocco", CountryCode::Ma),
    ("maroc", CountryCode::Ma),
    ("netherlands", CountryCode::Nl),
    ("the netherlands", CountryCode::Nl),
    ("holland", CountryCode::Nl),
    ("nederland", CountryCode::Nl),
    ("nigeria", CountryCode::Ng),
    ("norway", CountryCode::No),
    ("norge", CountryCode::No),
    ("new zealand", CountryCode::Nz),
    ("peru", CountryCode::Pe),
    ("perú", CountryCode::Pe),
    ("philippines", CountryCode::Ph),
    ("poland", CountryCode::Pl),
    ("polska", CountryCode::Pl),
    ("portugal", CountryCode::Pt),
    ("romania", CountryCode::Ro),
    ("saudi arabia", CountryCode::Sa),
    ("singapore", CountryCode::Sg),
    ("south africa", CountryCode::Za),
    ("spain", CountryCode::Es),
    ("españa", CountryCode::Es),
    ("espana", CountryCode::Es),
    ("espagne", CountryCode::Es),
    ("sweden", CountryCode::Se),
    ("sverige", CountryCode::Se),
    ("switzerland", CountryCode::Ch),
    ("schweiz", CountryCode::Ch),
    ("suisse", CountryCode::Ch),
    ("taiwan", CountryCode::Tw),
    ("thailand", CountryCode::Th),
    ("turkey", CountryCode::Tr),
    ("türkiye", CountryCode::Tr),
    ("ukraine", CountryCode::Ua),
    ("united arab emirates", CountryCode::Ae),
    ("uae", CountryCode::Ae),
    ("united kingdom", CountryCode::Gb),
    ("uk", CountryCode::Gb),
    ("great britain", CountryCode::Gb),
    ("united states", CountryCode::Us),
    ("united states of america", CountryCode::Us),
    ("usa", CountryCode::Us),
    ("estados unidos", CountryCode::Us),
    ("uruguay", CountryCode::Uy),
    ("vietnam", CountryCode::Vn),
    ("viet nam", CountryCode::Vn),
    ("zambia", CountryCode::Zm),
];

/// Resolves a free-text country name (or an already-valid alpha-2 code)
/// into the fixed country-code enum.
pub fn resolve_country(raw: &str) -> Option<CountryCode> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    if lowered.len() == 2 {
        if let Some(code) = CountryCode::from_token(&lowered) {
            return Some(code);
        }
    }
    COUNTRY_NAMES
        .iter()
        .find(|(name, _)| *name == lowered)
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{ProjectStage, Sector, Technology};

    #[test]
    fn test_match_token_canonicalization() {
        assert_eq!(match_token("Ready-to-Build").as_deref(), Some("ready_to_build"));
        assert_eq!(match_token("Solar  PV").as_deref(), Some("photovoltaic"));
        assert_eq!(match_token("RTB").as_deref(), Some("ready_to_build"));
        assert_eq!(match_token("oil/gas").as_deref(), Some("oil_and_gas"));
        assert_eq!(match_token("  "), None);
    }

    #[test]
    fn test_parse_enum_rejects_non_members() {
        assert_eq!(parse_enum::<ProjectStage>("bogus_value"), None);
        assert_eq!(
            parse_enum::<ProjectStage>("rtb"),
            Some(ProjectStage::ReadyToBuild)
        );
        assert_eq!(
            parse_enum::<Technology>("Wind-Offshore"),
            Some(Technology::OffshoreWind)
        );
    }

    #[test]
    fn test_parse_multi_filters_and_dedups() {
        let sectors = parse_multi::<Sector>("Renewables; bogus; storage; Renewables");
        assert_eq!(sectors, vec![Sector::Renewables, Sector::EnergyStorage]);
        assert!(parse_multi::<Sector>("").is_empty());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("150.5"), Some(150.5));
        assert_eq!(parse_number("$1,200"), Some(1200.0));
        assert_eq!(parse_number("45 %"), Some(45.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("2024-03-15"), Some(expected));
        assert_eq!(parse_date("15/03/2024"), Some(expected));
        assert_eq!(parse_date("15 Mar 2024"), Some(expected));
        assert_eq!(parse_date("March 15, 2024"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_parse_geography() {
        assert_eq!(parse_geography("4.35, 50.85"), Some([4.35, 50.85]));
        assert_eq!(parse_geography("4.35"), None);
        assert_eq!(parse_geography("a, b"), None);
    }

    #[test]
    fn test_split_names_numbers() {
        let got = split_names_numbers("Alpha Corp (100%); Beta (50)");
        assert_eq!(got.names, vec!["Alpha Corp", "Beta"]);
        assert_eq!(got.numbers, vec![Some(100.0), Some(50.0)]);
    }

    #[test]
    fn test_split_names_numbers_ragged() {
        let got = split_names_numbers("Acme (25%); Beta; ; Gamma (40%)");
        assert_eq!(got.names, vec!["Acme", "Beta", "Gamma"]);
        assert_eq!(got.numbers, vec![Some(25.0), None, Some(40.0)]);
    }

    #[test]
    fn test_split_names_numbers_inline_fragment() {
        let got = split_names_numbers("Acme 25%; Beta Fund ($40)");
        assert_eq!(got.names, vec!["Acme", "Beta Fund"]);
        assert_eq!(got.numbers, vec![Some(25.0), Some(40.0)]);
    }

    #[test]
    fn test_parse_sponsor_combined() {
        let info = parse_sponsor("Fund X ($120.5/30%)").unwrap();
        assert_eq!(info.name, "Fund X");
        assert_eq!(info.equity_amount, Some(120.5));
        assert_eq!(info.percentage_ownership, Some(30.0));
        assert_eq!(info.detail, None);
    }

    #[test]
    fn test_parse_sponsor_partial_variants() {
        let info = parse_sponsor("Fund Y ($80)").unwrap();
        assert_eq!(info.equity_amount, Some(80.0));
        assert_eq!(info.percentage_ownership, None);

        let info = parse_sponsor("Fund Z (25%)").unwrap();
        assert_eq!(info.equity_amount, None);
        assert_eq!(info.percentage_ownership, Some(25.0));

        let info = parse_sponsor("Fund W (pending approval)").unwrap();
        assert_eq!(info.detail.as_deref(), Some("pending approval"));
    }

    #[test]
    fn test_parse_sponsor_garbled_group_ignored() {
        let info = parse_sponsor("Fund V (/ %)").unwrap();
        assert_eq!(info.name, "Fund V");
        assert_eq!(info.equity_amount, None);
        assert_eq!(info.percentage_ownership, None);
        assert_eq!(info.detail, None);

        assert_eq!(parse_sponsor(""), None);
    }

    #[test]
    fn test_parse_revenue_model() {
        let term = parse_revenue_model("Power Purchase Agreement (20)");
        assert_eq!(term.model, Some(RevenueModel::PowerPurchaseAgreement));
        assert_eq!(term.duration_years, Some(20.0));

        let term = parse_revenue_model("Merchant");
        assert_eq!(term.model, Some(RevenueModel::Merchant));
        assert_eq!(term.duration_years, None);

        let term = parse_revenue_model("something else");
        assert_eq!(term.model, None);
    }

    #[test]
    fn test_resolve_country() {
        assert_eq!(resolve_country("Germany"), Some(CountryCode::De));
        assert_eq!(resolve_country("DEUTSCHLAND"), Some(CountryCode::De));
        assert_eq!(resolve_country("alemania"), Some(CountryCode::De));
        assert_eq!(resolve_country("de"), Some(CountryCode::De));
        assert_eq!(resolve_country("GB"), Some(CountryCode::Gb));
        assert_eq!(resolve_country("Atlantis"), None);
    }
}
