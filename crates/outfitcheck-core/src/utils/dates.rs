//! Friendly rendering of wear dates.

use chrono::NaiveDate;

/// Items unworn for longer than this many days get a donation nudge
const DONATION_THRESHOLD_DAYS: i64 = 30;

/// Dates closer than this many days are shown relative to today
const RELATIVE_DAYS: i64 = 6;

const DONATION_MESSAGE: &str =
    "It looks like this item hasn't been worn in a while. You might consider donating it.";

/// Describe when an item was last worn, relative to `today`.
///
/// "Today", "Yesterday", "N days ago" up to a week, then e.g. "3 Mar 2025".
/// Future dates (clock skew) fall through to the absolute form.
pub fn format_last_used(date: NaiveDate, today: NaiveDate) -> String {
    let days_ago = (today - date).num_days();
    match days_ago {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=RELATIVE_DAYS => format!("{} days ago", days_ago),
        _ => date.format("%-d %b %Y").to_string(),
    }
}

pub fn donation_suggestion(last_used: Option<NaiveDate>, today: NaiveDate) -> Option<&'static str> {
    let last_used = last_used?;
    ((today - last_used).num_days() > DONATION_THRESHOLD_DAYS).then_some(DONATION_MESSAGE)
}
