//! Formatting helpers shared across UIs.

use chrono::{DateTime, Utc};

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Format an optional timestamp as relative time, or a dash if missing.
pub fn format_relative_time_opt(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => format_relative_time(ts),
        None => "-".to_string(),
    }
}

/// Format a timestamp for documentation page headers.
pub fn format_generated_at(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc::now();
        assert!(format_relative_time(now - Duration::seconds(30)).ends_with("s ago"));
        assert!(format_relative_time(now - Duration::minutes(5)).ends_with("m ago"));
        assert!(format_relative_time(now - Duration::hours(3)).ends_with("h ago"));
        assert!(format_relative_time(now - Duration::days(2)).ends_with("d ago"));
    }

    #[test]
    fn test_relative_time_opt_missing() {
        assert_eq!(format_relative_time_opt(None), "-");
    }
}
