//! Flattening of aggregated stats into plain rows for the rendering and
//! export collaborators.
//!
//! Rows are format-agnostic data; serializing them to a spreadsheet is the
//! export collaborator's job, not ours. Row order follows roster order so
//! output is deterministic across passes.

use std::collections::HashMap;

use serde::Serialize;

use crate::rollup::TeamStats;
use crate::types::{StatRecord, User};

/// One display/export row: a subject and its aggregated record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatRow {
    pub subject_id: String,
    pub name: String,
    #[serde(flatten)]
    pub stats: StatRecord,
}

/// Per-user rows in roster order. Subjects that accumulated no record are
/// omitted (they had no attributed entries in this pass).
pub fn stat_rows(per_subject: &HashMap<String, StatRecord>, roster: &[User]) -> Vec<StatRow> {
    roster
        .iter()
        .filter_map(|user| {
            per_subject.get(&user.id).map(|stats| StatRow {
                subject_id: user.id.clone(),
                name: display_name(user),
                stats: stats.clone(),
            })
        })
        .collect()
}

/// Per-team rows in roster order of the admins.
pub fn team_rows(teams: &HashMap<String, TeamStats>, roster: &[User]) -> Vec<StatRow> {
    roster
        .iter()
        .filter_map(|user| {
            teams.get(&user.id).map(|team| StatRow {
                subject_id: team.admin_id.clone(),
                name: display_name(user),
                stats: team.stats.clone(),
            })
        })
        .collect()
}

fn display_name(user: &User) -> String {
    if user.username.trim().is_empty() {
        user.id.clone()
    } else {
        user.username.clone()
    }
}
