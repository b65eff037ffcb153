/// Derives a stable, human-auditable identifier from a display name.
///
/// The same (name, prefix) pair always yields the same identifier, so
/// deduplication can work by plain equality instead of fuzzy matching.
/// Callers must substitute a positional fallback name (e.g. "deal-3")
/// before calling this with an empty string.
pub fn generate_id(name: &str, prefix: Option<&str>) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        }
        // Anything else (punctuation, symbols, non-ASCII) is stripped.
    }

    match prefix {
        Some(p) => format!("{}-{}", p, slug),
        None => slug,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let a = generate_id("Acme Renewables Ltd.", Some("company"));
        let b = generate_id("Acme Renewables Ltd.", Some("company"));
        assert_eq!(a, b);
        assert_eq!(a, "company-acme-renewables-ltd");
    }

    #[test]
    fn test_alphabet() {
        let id = generate_id("Größe & Wind GmbH (50%)", Some("company"));
        assert!(id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn test_collapses_separators() {
        assert_eq!(generate_id("  Solar   --  One  ", None), "solar-one");
        assert_eq!(generate_id("A - B", Some("project")), "project-a-b");
    }

    #[test]
    fn test_no_edge_hyphens() {
        assert_eq!(generate_id("- Acme -", None), "acme");
    }

    #[test]
    fn test_empty_name_keeps_prefix() {
        assert_eq!(generate_id("", Some("deal")), "deal-");
        assert_eq!(generate_id("deal-3", Some("deal")), "deal-deal-3");
    }
}
