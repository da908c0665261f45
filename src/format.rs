//! Text formatting shared by the terminal output and every export format.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Format an integer with thousands separators (1234567 -> "1,234,567")
pub fn format_grouped_int(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let mut grouped: String = out.chars().rev().collect();
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// Format a number with thousands separators, keeping up to two decimals
pub fn format_grouped_number(value: f64) -> String {
    if value.fract() == 0.0 {
        return format_grouped_int(value as i64);
    }

    let rounded = format!("{:.2}", value);
    let (whole, frac) = rounded.split_once('.').unwrap_or((&rounded, "00"));
    let negative = whole.starts_with('-');
    let digits = whole.trim_start_matches('-');
    let grouped = format_grouped_int(digits.parse::<i64>().unwrap_or(0));
    let frac = frac.trim_end_matches('0');

    match (negative, frac.is_empty()) {
        (true, true) => format!("-{grouped}"),
        (true, false) => format!("-{grouped}.{frac}"),
        (false, true) => grouped,
        (false, false) => format!("{grouped}.{frac}"),
    }
}

/// Currency symbol followed by the rounded, grouped amount ("KES 1,500")
pub fn format_money(value: f64, currency_symbol: &str) -> String {
    format!("{}{}", currency_symbol, format_grouped_int(value.round() as i64))
}

/// Number without trailing zeros: 70.0 -> "70", 72.50 -> "72.5"
pub fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        return format!("{}", value as i64);
    }
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn format_percent(value: f64) -> String {
    format!("{}%", trim_number(value))
}

/// "financial" -> "Financial", "total_units" -> "Total Units"
pub fn title_case(text: &str) -> String {
    text.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn a camelCase or snake_case key into a label: "netIncome" -> "Net Income"
pub fn humanize_key(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for ch in key.chars() {
        if ch.is_uppercase() && prev_lower {
            spaced.push(' ');
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        spaced.push(ch);
    }
    title_case(&spaced)
}

/// Parse the date shapes the backend emits
pub fn parse_date_flexible(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Display form of a backend date; unparsable values pass through unchanged
pub fn format_display_date(raw: &str) -> String {
    match parse_date_flexible(raw) {
        Some(date) => date.format("%b %d, %Y").to_string(),
        None => raw.to_string(),
    }
}
