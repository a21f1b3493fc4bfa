//! Wall-clock helpers.

use chrono::{Local, LocalResult, TimeZone, Utc};

/// Current time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Renders an epoch-millis date as `dd MMM yyyy` in local time.
///
/// `None` (unset) renders today's date.
pub fn format_due_date(epoch_ms: Option<i64>) -> String {
    let date = match epoch_ms.map(|ms| Local.timestamp_millis_opt(ms)) {
        Some(LocalResult::Single(value)) | Some(LocalResult::Ambiguous(value, _)) => {
            value.date_naive()
        }
        Some(LocalResult::None) | None => Local::now().date_naive(),
    };
    date.format("%d %b %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_due_date, now_epoch_ms};

    #[test]
    fn now_is_after_2020() {
        assert!(now_epoch_ms() > 1_577_836_800_000);
    }

    #[test]
    fn due_date_format_has_three_parts() {
        let rendered = format_due_date(Some(1_700_000_000_000));
        let parts: Vec<_> = rendered.split(' ').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2], "2023");
        assert_eq!(format_due_date(None).split(' ').count(), 3);
    }
}
