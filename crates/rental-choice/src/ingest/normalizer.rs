/// Strips byte-order and zero-width marks and collapses runs of whitespace.
pub(crate) fn clean_text(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Categorical level as used in model covariates: cleaned and lowercased.
pub(crate) fn level(value: &str) -> String {
    clean_text(value).to_lowercase()
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|raw| clean_text(&raw)).filter(|raw| !raw.is_empty())
}

pub(crate) fn level_opt(value: Option<&str>) -> Option<String> {
    value.map(level).filter(|raw| !raw.is_empty())
}

/// Lenient flag parsing for amenity columns; anything unrecognised is `false`.
pub(crate) fn flag(value: Option<&str>) -> bool {
    matches!(
        value.map(level).as_deref(),
        Some("1" | "true" | "t" | "yes" | "y")
    )
}

/// Numbers may carry currency symbols or thousands separators.
pub(crate) fn number<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    let cleaned: String = value?
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_removes_marks_and_whitespace() {
        assert_eq!(clean_text("\u{feff}Bondi   Beach "), "Bondi Beach");
        assert_eq!(level("  Entire  Apartment"), "entire apartment");
        assert_eq!(non_empty(Some("   ".to_string())), None);
    }

    #[test]
    fn numbers_tolerate_currency_formatting() {
        assert_eq!(number::<f64>(Some("$1,250.50")), Some(1250.5));
        assert_eq!(number::<u32>(Some(" 3 ")), Some(3));
        assert_eq!(number::<u32>(Some("three")), None);
        assert_eq!(number::<f64>(None), None);
    }

    #[test]
    fn flags_accept_common_truthy_spellings() {
        assert!(flag(Some("Yes")));
        assert!(flag(Some("1")));
        assert!(!flag(Some("0")));
        assert!(!flag(None));
    }
}
