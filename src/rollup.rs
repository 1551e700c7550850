//! Team and organization rollups over per-subject stat records.
//!
//! Rollups are pure summation, field by field. They run before any display
//! filtering so a search never changes the totals.

use std::collections::HashMap;

use serde::Serialize;

use crate::scope::Team;
use crate::types::StatRecord;

/// Rolled-up statistics for one admin's team: the admin's own record summed
/// with every member's. `team_members_count` is the member-set cardinality,
/// counted even for members with zero entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub admin_id: String,
    pub member_ids: Vec<String>,
    pub team_members_count: usize,
    pub stats: StatRecord,
}

/// Sum per-user records into one record per team, keyed by admin id.
///
/// Subjects without a record (no attributed entries) contribute nothing to
/// the sums but still count toward `team_members_count`.
pub fn team_stats(
    per_subject: &HashMap<String, StatRecord>,
    teams: &[Team],
) -> HashMap<String, TeamStats> {
    teams
        .iter()
        .map(|team| {
            let mut stats = per_subject.get(&team.admin_id).cloned().unwrap_or_default();
            for member_id in &team.member_ids {
                if let Some(record) = per_subject.get(member_id) {
                    stats.absorb(record);
                }
            }
            (
                team.admin_id.clone(),
                TeamStats {
                    admin_id: team.admin_id.clone(),
                    member_ids: team.member_ids.clone(),
                    team_members_count: team.member_ids.len(),
                    stats,
                },
            )
        })
        .collect()
}

/// Sum all visible records into one overall record for the dashboard
/// summary tiles. No weighting or normalization.
pub fn organization_stats<'a, I>(records: I) -> StatRecord
where
    I: IntoIterator<Item = &'a StatRecord>,
{
    let mut total = StatRecord::default();
    for record in records {
        total.absorb(record);
    }
    total
}
