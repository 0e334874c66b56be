use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(r"\d+").unwrap();
}

/// Parse a free-text salary string into a numeric `(min, max)` range.
///
/// Contract:
/// 1. Empty input and the literal `"N/A"` yield no range.
/// 2. Commas are thousands separators and are stripped before scanning.
/// 3. A single numeric token yields the degenerate range `(v, v)`.
/// 4. Two or more tokens yield the first two, sorted so min <= max; any
///    remaining tokens are ignored.
pub fn parse_salary_range(raw: &str) -> Option<(f64, f64)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
        return None;
    }

    let stripped = trimmed.replace(',', "");
    let mut numbers = NUMBER_RE
        .find_iter(&stripped)
        .filter_map(|m| m.as_str().parse::<f64>().ok());

    let first = numbers.next()?;
    match numbers.next() {
        Some(second) if second < first => Some((second, first)),
        Some(second) => Some((first, second)),
        None => Some((first, first)),
    }
}
