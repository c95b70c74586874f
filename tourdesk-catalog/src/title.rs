use chrono::{Datelike, NaiveDate};
use tourdesk_shared::Highlight;

/// Builds a tour title as `{month}{day} {letters}H`, e.g. `118 TKH` for a tour
/// starting January 18 through Tanzania and Kenya.
///
/// Several highlights contribute their first letter each; a single highlight
/// contributes its first two letters.
pub fn generate_title(highlights: &[Highlight], start_date: NaiveDate) -> String {
    let date_prefix = format!("{}{}", start_date.month(), start_date.day());

    let letters: String = if highlights.len() > 1 {
        highlights
            .iter()
            .filter_map(|h| h.title.trim().chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    } else {
        highlights
            .first()
            .map(|h| {
                h.title
                    .trim()
                    .chars()
                    .take(2)
                    .flat_map(char::to_uppercase)
                    .collect()
            })
            .unwrap_or_default()
    };

    format!("{} {}H", date_prefix, letters)
}
