/// Country names and common variants mapped to ISO alpha-2 codes.
const COUNTRY_CODES: &[(&str, &str)] = &[
    ("united states", "US"),
    ("usa", "US"),
    ("us", "US"),
    ("united kingdom", "GB"),
    ("uk", "GB"),
    ("canada", "CA"),
    ("australia", "AU"),
    ("germany", "DE"),
    ("france", "FR"),
    ("spain", "ES"),
    ("italy", "IT"),
    ("netherlands", "NL"),
    ("sweden", "SE"),
    ("norway", "NO"),
    ("denmark", "DK"),
    ("finland", "FI"),
    ("poland", "PL"),
    ("india", "IN"),
    ("china", "CN"),
    ("japan", "JP"),
    ("south korea", "KR"),
    ("singapore", "SG"),
    ("brazil", "BR"),
    ("mexico", "MX"),
    ("argentina", "AR"),
    ("south africa", "ZA"),
];

/// Alias buckets for the country matcher. A criterion equal to a bucket key
/// expands to the whole variant list for containment tests.
const ALIAS_BUCKETS: &[(&str, &[&str])] = &[
    ("us", &["us", "usa", "united states"]),
    ("uk", &["uk", "gb", "united kingdom"]),
    ("ca", &["ca", "canada"]),
];

/// Normalize a country name or code to ISO alpha-2.
///
/// Unrecognized 2-letter input is upper-cased and passed through so codes
/// outside the table still reach providers; anything longer that is not in
/// the table yields `None`.
pub fn country_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lowered = trimmed.to_lowercase();
    if let Some((_, code)) = COUNTRY_CODES.iter().find(|(name, _)| *name == lowered) {
        return Some((*code).to_string());
    }

    if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(trimmed.to_ascii_uppercase());
    }

    None
}

/// Expand a criterion country into its alias bucket, when it has one.
pub fn alias_bucket(raw: &str) -> Option<&'static [&'static str]> {
    let lowered = raw.trim().to_lowercase();
    ALIAS_BUCKETS
        .iter()
        .find(|(key, _)| *key == lowered)
        .map(|(_, aliases)| *aliases)
}
