//! Per-subject aggregation: fold a filtered entry list into one
//! [`StatRecord`] per visible subject.
//!
//! The fold is pure and single-pass over an immutable snapshot. The
//! month-bucketing "now" is an injected parameter, never read from a clock,
//! so re-running with identical inputs yields identical output. Data-quality
//! problems never abort the pass: the offending entry degrades (skipped or
//! left unbucketed) and a [`Diagnostic`] is recorded for the caller to
//! surface, mirrored to the log.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};

use crate::scope::VisibilityScope;
use crate::types::{CloseType, Entry, EntryStatus, StatRecord};

/// Inputs for one aggregation pass.
#[derive(Debug, Clone)]
pub struct AggregationInput<'a> {
    /// Already range-filtered entries, borrowed and never mutated.
    pub entries: &'a [Entry],
    pub scope: &'a VisibilityScope,
    /// Reference instant for current-calendar-month bucketing.
    pub now: DateTime<Utc>,
    /// Accumulate `hot_value`/`warm_value` from estimated values. Views that
    /// only render counters skip the monetary sums.
    pub collect_values: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Entry has no creator reference at all.
    MissingCreator,
    /// Creator exists but is outside the viewer's visibility scope.
    CreatorOutOfScope,
    /// Status/close-type combination maps to no bucket.
    UnclassifiedStatus,
    /// A monetary field was present but not a positive finite number.
    InvalidAmount,
}

/// One data-quality finding from a pass. Non-fatal by design; the caller may
/// surface these as a UI hint.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub entry_id: String,
    pub detail: String,
}

/// Output of one pass: fresh records keyed by subject id, plus the findings.
#[derive(Debug, Clone, Default)]
pub struct AggregationResult {
    pub per_subject: HashMap<String, StatRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AggregationResult {
    /// Sum of attributed entries across all subjects. Equals the number of
    /// input entries with a resolvable, in-scope creator.
    pub fn attributed_entries(&self) -> u32 {
        self.per_subject.values().map(|r| r.all_time_entries).sum()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Bucket {
    Cold,
    Warm,
    Hot,
    ClosedWon,
    ClosedLost,
    Unclassified,
}

fn classify(entry: &Entry) -> Bucket {
    match (&entry.status, &entry.close_type) {
        (Some(EntryStatus::NotInterested), _) => Bucket::Cold,
        (Some(EntryStatus::Maybe), _) => Bucket::Warm,
        (Some(EntryStatus::Interested), _) => Bucket::Hot,
        (Some(EntryStatus::Closed), Some(CloseType::ClosedWon)) => Bucket::ClosedWon,
        (Some(EntryStatus::Closed), Some(CloseType::ClosedLost)) => Bucket::ClosedLost,
        _ => Bucket::Unclassified,
    }
}

/// An entry counts toward the current month when either its creation or its
/// last update falls in `now`'s calendar month.
fn touches_month(entry: &Entry, now: DateTime<Utc>) -> bool {
    let month = (now.year(), now.month());
    [entry.created_at, entry.updated_at]
        .into_iter()
        .flatten()
        .any(|ts| (ts.year(), ts.month()) == month)
}

/// A monetary value is usable when it is a positive finite number.
fn usable_amount(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Fold entries into per-subject stat records.
///
/// Attribution is by `createdBy`; entries whose creator is missing or out of
/// scope are skipped with a diagnostic (soft-fail: the entry may simply
/// belong to a user outside the current view). `month_entries` counts one
/// per matching entry; visit totals are the separate `total_visits` metric.
pub fn aggregate(input: AggregationInput) -> AggregationResult {
    let mut per_subject: HashMap<String, StatRecord> = HashMap::new();
    let mut diagnostics = Vec::new();

    for entry in input.entries {
        let Some(creator) = entry.created_by.as_ref() else {
            log::debug!("entry {} has no creator; skipped", entry.id);
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::MissingCreator,
                entry_id: entry.id.clone(),
                detail: "entry has no createdBy reference".to_string(),
            });
            continue;
        };
        if !input.scope.contains(&creator.id) {
            log::debug!(
                "entry {} creator {} outside scope of viewer {}; skipped",
                entry.id,
                creator.id,
                input.scope.viewer_id
            );
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::CreatorOutOfScope,
                entry_id: entry.id.clone(),
                detail: format!("creator {} not in visibility scope", creator.id),
            });
            continue;
        }

        let record = per_subject.entry(creator.id.clone()).or_default();
        record.all_time_entries += 1;
        record.total_visits += entry.history.len() as u32;
        if touches_month(entry, input.now) {
            record.month_entries += 1;
        }

        match classify(entry) {
            Bucket::Cold => record.cold += 1,
            Bucket::Warm => {
                record.warm += 1;
                if input.collect_values {
                    match usable_amount(entry.estimated_value) {
                        Some(value) => record.warm_value += value,
                        None => {
                            if entry.estimated_value.is_some() {
                                diagnostics.push(invalid_amount(entry, "estimatedValue"));
                            }
                        }
                    }
                }
            }
            Bucket::Hot => {
                record.hot += 1;
                if input.collect_values {
                    match usable_amount(entry.estimated_value) {
                        Some(value) => record.hot_value += value,
                        None => {
                            if entry.estimated_value.is_some() {
                                diagnostics.push(invalid_amount(entry, "estimatedValue"));
                            }
                        }
                    }
                }
            }
            Bucket::ClosedWon => {
                record.closed_won += 1;
                match usable_amount(entry.close_amount) {
                    Some(amount) => record.total_closing_amount += amount,
                    None => diagnostics.push(invalid_amount(entry, "closeamount")),
                }
            }
            Bucket::ClosedLost => record.closed_lost += 1,
            Bucket::Unclassified => {
                log::debug!(
                    "entry {} status {:?}/{:?} maps to no bucket",
                    entry.id,
                    entry.status,
                    entry.close_type
                );
                diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::UnclassifiedStatus,
                    entry_id: entry.id.clone(),
                    detail: format!(
                        "status {:?} with close type {:?} maps to no bucket",
                        entry.status, entry.close_type
                    ),
                });
            }
        }
    }

    if !diagnostics.is_empty() {
        log::debug!(
            "aggregation pass finished with {} diagnostic(s) over {} entries",
            diagnostics.len(),
            input.entries.len()
        );
    }

    AggregationResult {
        per_subject,
        diagnostics,
    }
}

fn invalid_amount(entry: &Entry, field: &str) -> Diagnostic {
    log::debug!("entry {} has unusable {}; contributes zero", entry.id, field);
    Diagnostic {
        kind: DiagnosticKind::InvalidAmount,
        entry_id: entry.id.clone(),
        detail: format!("{} is missing or not a positive number", field),
    }
}
