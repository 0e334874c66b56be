use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TRAILING_STATE_RE: Regex = Regex::new(r",\s*([A-Z]{2})(?:\s|$)").unwrap();
}

/// US state names recognized when a display string carries no 2-letter code.
const STATE_NAMES: &[(&str, &str)] = &[
    ("california", "CA"),
    ("texas", "TX"),
    ("florida", "FL"),
    ("new york", "NY"),
    ("pennsylvania", "PA"),
    ("illinois", "IL"),
    ("ohio", "OH"),
    ("georgia", "GA"),
    ("north carolina", "NC"),
    ("michigan", "MI"),
    ("new jersey", "NJ"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("arizona", "AZ"),
    ("massachusetts", "MA"),
    ("tennessee", "TN"),
    ("indiana", "IN"),
    ("missouri", "MO"),
    ("maryland", "MD"),
    ("wisconsin", "WI"),
    ("colorado", "CO"),
    ("minnesota", "MN"),
    ("south carolina", "SC"),
];

/// Parts of a comma-separated location display string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLocation {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// Split a `"City, State[, Country]"` display string into its parts.
/// Positions are fixed: the first segment is the city, the second the
/// state, the third the country. Blank segments come back as `None`.
pub fn split_location(raw: &str) -> ParsedLocation {
    let mut parts = raw.split(',').map(|p| p.trim().to_string());
    let city = parts.next().filter(|p| !p.is_empty());
    let state = parts.next().filter(|p| !p.is_empty());
    let country = parts.next().filter(|p| !p.is_empty());
    ParsedLocation { city, state, country }
}

/// Recover a 2-letter US state code from a free-text location string.
///
/// Prefers a trailing uppercase code after a comma (`"Austin, TX"`),
/// falling back to a full state-name scan (`"Austin, Texas"`).
pub fn recover_state_code(location: &str) -> Option<String> {
    let upper = location.to_uppercase();
    if let Some(caps) = TRAILING_STATE_RE.captures(&upper) {
        return Some(caps[1].to_string());
    }

    let lowered = location.to_lowercase();
    STATE_NAMES
        .iter()
        .find(|(name, _)| lowered.contains(name))
        .map(|(_, code)| (*code).to_string())
}
