use once_cell::sync::Lazy;
use regex::Regex;

/// Label repeated in the area column at the top of every table block.
pub const HEADER_LABEL: &str = "Metropolitan Statistical Area";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s").expect("static regex"));
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L} ,\-]+").expect("static regex"));

/// Reduce a raw area label to letters, spaces, commas and hyphens.
///
/// Footnote markers and row numbers (digits, `/`, `.`, `*`) are dropped, so
/// `"123 Atlanta-Sandy Springs-Marietta, GA  "` becomes
/// `"Atlanta-Sandy Springs-Marietta, GA"`.
pub fn sanitize_area_name(raw: &str) -> String {
    let spaced = WHITESPACE.replace_all(raw.trim(), " ");
    DISALLOWED.replace_all(&spaced, "").trim().to_string()
}

/// Render a value the way a dataframe CSV export does: `68.0`, `5.25`,
/// blank for missing.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{v:.1}"),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}
