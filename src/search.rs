//! Display-name search over aggregated rows.
//!
//! Applied only after aggregation and rollups, for UI convenience; it never
//! affects the underlying sums. Case-insensitive substring match,
//! order-preserving.

use crate::report::StatRow;

/// Keep rows whose display name contains `needle`, ignoring case. A blank
/// needle keeps everything.
pub fn filter_rows(rows: Vec<StatRow>, needle: &str) -> Vec<StatRow> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| row.name.to_lowercase().contains(&needle))
        .collect()
}
