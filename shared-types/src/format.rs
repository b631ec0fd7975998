//! Display helpers used by page data and the client.

use chrono::{DateTime, Datelike, Timelike, Utc};
use num_format::{Locale, ToFormattedString};

use crate::validation::parse_datetime;

const MINUTES_IN_DAY: f64 = 1440.0;
const MINUTES_IN_MONTH: f64 = 43200.0;
const MINUTES_IN_TWO_MONTHS: f64 = 86400.0;

fn currency_prefix(currency: &str) -> String {
    match currency.to_ascii_uppercase().as_str() {
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        "INR" => "₹".to_string(),
        "CNY" => "CN¥".to_string(),
        "CAD" => "CA$".to_string(),
        "AUD" => "A$".to_string(),
        "MXN" => "MX$".to_string(),
        "BRL" => "R$".to_string(),
        other => format!("{}\u{a0}", other),
    }
}

/// Whole-unit amount with thousands separators, e.g. `$1,234,567`.
///
/// A missing amount renders as `$0.00`.
pub fn format_currency(amount: Option<f64>, currency: &str) -> String {
    let Some(amount) = amount else {
        return "$0.00".to_string();
    };
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_formatted_string(&Locale::en);
    let sign = if rounded < 0 { "-" } else { "" };
    format!("{}{}{}", sign, currency_prefix(currency), digits)
}

/// `MMM d, yyyy`. Empty or unparseable input renders as an empty string.
pub fn format_date(value: Option<&str>) -> String {
    value
        .and_then(parse_datetime)
        .map(|ts| format_timestamp(Some(ts)))
        .unwrap_or_default()
}

pub fn format_timestamp(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .map(|dt| dt.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Distance between `value` and `now` in words, e.g. `3 days ago` or `in about 1 hour`.
pub fn format_relative_date(value: Option<&str>, now: DateTime<Utc>) -> String {
    match value.and_then(parse_datetime) {
        Some(ts) => format_relative_timestamp(Some(ts), now.timestamp()),
        None => String::new(),
    }
}

pub fn format_relative_timestamp(timestamp: Option<i64>, now: i64) -> String {
    let (Some(then), Some(now)) = (
        timestamp.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        DateTime::<Utc>::from_timestamp(now, 0),
    ) else {
        return String::new();
    };

    let (earlier, later, past) = if then <= now {
        (then, now, true)
    } else {
        (now, then, false)
    };
    let distance = distance_in_words(earlier, later);
    if past {
        format!("{} ago", distance)
    } else {
        format!("in {}", distance)
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

fn distance_in_words(earlier: DateTime<Utc>, later: DateTime<Utc>) -> String {
    let seconds = (later - earlier).num_seconds() as f64;
    let minutes = (seconds / 60.0).round();

    if minutes < 2.0 {
        return if minutes == 0.0 {
            "less than a minute".to_string()
        } else {
            "1 minute".to_string()
        };
    }
    if minutes < 45.0 {
        return plural(minutes as i64, "minute");
    }
    if minutes < 90.0 {
        return "about 1 hour".to_string();
    }
    if minutes < MINUTES_IN_DAY {
        return format!("about {}", plural((minutes / 60.0).round() as i64, "hour"));
    }
    if minutes < 2520.0 {
        return "1 day".to_string();
    }
    if minutes < MINUTES_IN_MONTH {
        return plural((minutes / MINUTES_IN_DAY).round() as i64, "day");
    }
    if minutes < MINUTES_IN_TWO_MONTHS {
        return format!(
            "about {}",
            plural((minutes / MINUTES_IN_MONTH).round() as i64, "month")
        );
    }

    let months = calendar_months_between(earlier, later);
    if months < 12 {
        return plural((minutes / MINUTES_IN_MONTH).round() as i64, "month");
    }

    let years = months / 12;
    let remainder = months % 12;
    if remainder < 3 {
        format!("about {}", plural(years, "year"))
    } else if remainder < 9 {
        format!("over {}", plural(years, "year"))
    } else {
        format!("almost {}", plural(years + 1, "year"))
    }
}

/// Whole calendar months from `earlier` to `later`.
fn calendar_months_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    let mut months = (later.year() - earlier.year()) as i64 * 12
        + later.month() as i64
        - earlier.month() as i64;
    let later_in_month = (later.day(), later.num_seconds_from_midnight());
    let earlier_in_month = (earlier.day(), earlier.num_seconds_from_midnight());
    if months > 0 && later_in_month < earlier_in_month {
        months -= 1;
    }
    months
}

/// Up to two uppercase initials from the first two words of `name`.
pub fn get_initials(name: &str) -> String {
    name.split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}
