//! Release schedule lookups for the release-name option.

use time::Date;
use time::macros::format_description;

use crate::app::options::sanitize_class_segment;
use crate::domain::model::ReleaseEntry;

/// Parse a `YYYY-MM-DD` expiry date.
pub fn parse_expiry(value: &str) -> Option<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).ok()
}

fn dated(releases: &[ReleaseEntry]) -> impl Iterator<Item = (&ReleaseEntry, Date)> {
    releases.iter().filter_map(|entry| match parse_expiry(&entry.expiry) {
        Some(date) => Some((entry, date)),
        None => {
            tracing::warn!(
                release = %entry.name,
                expiry = %entry.expiry,
                "ignoring release with invalid expiry date"
            );
            None
        }
    })
}

/// The unexpired release with the earliest expiry. Ties keep list order.
pub fn active_release(releases: &[ReleaseEntry], today: Date) -> Option<&ReleaseEntry> {
    dated(releases)
        .filter(|(_, expiry)| *expiry >= today)
        .min_by_key(|(_, expiry)| *expiry)
        .map(|(entry, _)| entry)
}

/// Releases whose expiry day lies strictly before `today`.
pub fn expired_releases(releases: &[ReleaseEntry], today: Date) -> Vec<&ReleaseEntry> {
    dated(releases)
        .filter(|(_, expiry)| *expiry < today)
        .map(|(entry, _)| entry)
        .collect()
}

/// Sanitized name of the active release, or of `default_name` when none is active.
pub fn release_name(releases: &[ReleaseEntry], default_name: &str, today: Date) -> String {
    match active_release(releases, today) {
        Some(entry) => sanitize_class_segment(&entry.name),
        None => sanitize_class_segment(default_name),
    }
}
