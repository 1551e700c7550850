//! Domain data model for the lead analytics core.
//!
//! `Entry` and `User` mirror what the remote REST backend returns. The
//! backend is loose about shapes (single ref vs. array, raw id vs. populated
//! object, numbers as strings), so every flexible field goes through a
//! normalizing deserializer in [`crate::normalize`] and exactly one
//! canonical shape leaves this module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize;

// =============================================================================
// Classification enums
// =============================================================================

/// Lead status as entered by the salesperson.
///
/// Unknown strings are preserved in `Other` rather than rejected; the
/// aggregator counts such entries toward totals but no temperature bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryStatus {
    NotInterested,
    Maybe,
    Interested,
    Closed,
    Other(String),
}

impl From<String> for EntryStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "not interested" => EntryStatus::NotInterested,
            "maybe" => EntryStatus::Maybe,
            "interested" => EntryStatus::Interested,
            "closed" => EntryStatus::Closed,
            _ => EntryStatus::Other(raw),
        }
    }
}

impl From<EntryStatus> for String {
    fn from(status: EntryStatus) -> Self {
        match status {
            EntryStatus::NotInterested => "Not Interested".to_string(),
            EntryStatus::Maybe => "Maybe".to_string(),
            EntryStatus::Interested => "Interested".to_string(),
            EntryStatus::Closed => "Closed".to_string(),
            EntryStatus::Other(raw) => raw,
        }
    }
}

/// Outcome of a closed lead. Only meaningful when status is `Closed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CloseType {
    ClosedWon,
    ClosedLost,
    Other(String),
}

impl From<String> for CloseType {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "closed won" => CloseType::ClosedWon,
            "closed lost" => CloseType::ClosedLost,
            _ => CloseType::Other(raw),
        }
    }
}

impl From<CloseType> for String {
    fn from(close_type: CloseType) -> Self {
        match close_type {
            CloseType::ClosedWon => "Closed Won".to_string(),
            CloseType::ClosedLost => "Closed Lost".to_string(),
            CloseType::Other(raw) => raw,
        }
    }
}

/// Directory role. Unknown role strings map to `Others` (least privilege)
/// with a logged diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Superadmin,
    Admin,
    #[default]
    Others,
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "superadmin" => Role::Superadmin,
            "admin" => Role::Admin,
            "others" | "" => Role::Others,
            other => {
                log::debug!("unknown role '{}' mapped to others", other);
                Role::Others
            }
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Superadmin => "superadmin".to_string(),
            Role::Admin => "admin".to_string(),
            Role::Others => "others".to_string(),
        }
    }
}

// =============================================================================
// Entries
// =============================================================================

/// Canonical user reference after boundary normalization.
///
/// The backend sends either a raw id string or a populated object; both land
/// here with the id always present and the username when the object carried
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl SubjectRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
        }
    }
}

/// One snapshot in an entry's append-only audit trail. The trail's length is
/// the entry's visit count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    #[serde(
        default,
        alias = "createdAt",
        deserialize_with = "normalize::lenient_timestamp"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<EntryStatus>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default, deserialize_with = "normalize::subject_refs")]
    pub assigned_to: Vec<SubjectRef>,
}

/// One tracked sales lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(alias = "_id")]
    pub id: String,
    /// Owner for attribution. Missing creators are skipped by the aggregator.
    #[serde(default, deserialize_with = "normalize::opt_subject_ref")]
    pub created_by: Option<SubjectRef>,
    /// Collaborators with view access.
    #[serde(default, deserialize_with = "normalize::subject_refs")]
    pub assigned_to: Vec<SubjectRef>,
    #[serde(default)]
    pub status: Option<EntryStatus>,
    /// Backend field is lowercase `closetype`.
    #[serde(default, rename = "closetype", alias = "closeType")]
    pub close_type: Option<CloseType>,
    /// Meaningful when status is Interested/Maybe.
    #[serde(default, deserialize_with = "normalize::lenient_amount")]
    pub estimated_value: Option<f64>,
    /// Meaningful when close type is Closed Won. Backend field is `closeamount`.
    #[serde(
        default,
        rename = "closeamount",
        alias = "closeAmount",
        deserialize_with = "normalize::lenient_amount"
    )]
    pub close_amount: Option<f64>,
    #[serde(default, deserialize_with = "normalize::lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "normalize::lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

// =============================================================================
// Users
// =============================================================================

/// Directory record for one user.
///
/// The backend spreads admin supervision across two fields (`assignedAdmin`
/// singular, `assignedAdmins` plural), each in any of the reference shapes.
/// Deserialization merges both into `assigned_admins`, deduplicated,
/// original order preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawUser", rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub assigned_admins: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    #[serde(alias = "_id")]
    id: String,
    #[serde(default, alias = "name")]
    username: String,
    #[serde(default)]
    role: Role,
    #[serde(default, deserialize_with = "normalize::subject_refs")]
    assigned_admin: Vec<SubjectRef>,
    #[serde(default, deserialize_with = "normalize::subject_refs")]
    assigned_admins: Vec<SubjectRef>,
}

impl From<RawUser> for User {
    fn from(raw: RawUser) -> Self {
        let mut assigned_admins: Vec<String> = Vec::new();
        for admin in raw.assigned_admin.into_iter().chain(raw.assigned_admins) {
            if !assigned_admins.contains(&admin.id) {
                assigned_admins.push(admin.id);
            }
        }
        User {
            id: raw.id,
            username: raw.username,
            role: raw.role,
            assigned_admins,
        }
    }
}

// =============================================================================
// Derived statistics
// =============================================================================

/// Counters and sums for one subject over one aggregation pass.
///
/// Constructed fresh per pass, never mutated outside it. `month_entries`
/// counts one per entry touching the current calendar month; `total_visits`
/// is the sum of audit-trail lengths (the two were conflated upstream and
/// are deliberately separate named metrics here).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatRecord {
    pub all_time_entries: u32,
    pub month_entries: u32,
    pub total_visits: u32,
    pub cold: u32,
    pub warm: u32,
    pub hot: u32,
    pub closed_won: u32,
    pub closed_lost: u32,
    pub total_closing_amount: f64,
    pub hot_value: f64,
    pub warm_value: f64,
}

impl StatRecord {
    /// Field-by-field additive combination, used by team and org rollups.
    pub fn absorb(&mut self, other: &StatRecord) {
        self.all_time_entries += other.all_time_entries;
        self.month_entries += other.month_entries;
        self.total_visits += other.total_visits;
        self.cold += other.cold;
        self.warm += other.warm;
        self.hot += other.hot;
        self.closed_won += other.closed_won;
        self.closed_lost += other.closed_lost;
        self.total_closing_amount += other.total_closing_amount;
        self.hot_value += other.hot_value;
        self.warm_value += other.warm_value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_labels_case_insensitively() {
        assert_eq!(
            EntryStatus::from("not interested".to_string()),
            EntryStatus::NotInterested
        );
        assert_eq!(
            EntryStatus::from("MAYBE".to_string()),
            EntryStatus::Maybe
        );
        assert_eq!(
            EntryStatus::from("Interested".to_string()),
            EntryStatus::Interested
        );
        assert_eq!(EntryStatus::from("Closed".to_string()), EntryStatus::Closed);
    }

    #[test]
    fn unknown_status_is_preserved_not_rejected() {
        let status = EntryStatus::from("Follow Up".to_string());
        assert_eq!(status, EntryStatus::Other("Follow Up".to_string()));
        assert_eq!(String::from(status), "Follow Up");
    }

    #[test]
    fn unknown_role_defaults_to_others() {
        assert_eq!(Role::from("manager".to_string()), Role::Others);
        assert_eq!(Role::from("SuperAdmin".to_string()), Role::Superadmin);
    }

    #[test]
    fn entry_deserializes_backend_field_names() {
        let entry: Entry = serde_json::from_str(
            r#"{
                "_id": "e1",
                "createdBy": {"_id": "u1", "username": "priya"},
                "status": "Closed",
                "closetype": "Closed Won",
                "closeamount": "5000",
                "createdAt": "2024-05-01T10:30:00.000Z",
                "history": [{"timestamp": "2024-05-01T10:30:00.000Z", "status": "Interested"}]
            }"#,
        )
        .expect("deserialize");

        assert_eq!(entry.id, "e1");
        assert_eq!(entry.created_by.as_ref().map(|c| c.id.as_str()), Some("u1"));
        assert_eq!(entry.status, Some(EntryStatus::Closed));
        assert_eq!(entry.close_type, Some(CloseType::ClosedWon));
        assert_eq!(entry.close_amount, Some(5000.0));
        assert_eq!(entry.history.len(), 1);
        assert!(entry.created_at.is_some());
    }

    #[test]
    fn user_merges_singular_and_plural_admin_fields() {
        let user: User = serde_json::from_str(
            r#"{
                "_id": "u7",
                "username": "dev",
                "role": "others",
                "assignedAdmin": "a1",
                "assignedAdmins": [{"_id": "a2"}, "a1"]
            }"#,
        )
        .expect("deserialize");

        assert_eq!(user.role, Role::Others);
        assert_eq!(user.assigned_admins, vec!["a1", "a2"]);
    }

    #[test]
    fn absorb_sums_every_field() {
        let mut a = StatRecord {
            all_time_entries: 2,
            month_entries: 1,
            total_visits: 3,
            hot: 1,
            total_closing_amount: 100.0,
            ..StatRecord::default()
        };
        let b = StatRecord {
            all_time_entries: 1,
            closed_won: 1,
            total_closing_amount: 50.0,
            hot_value: 900.0,
            ..StatRecord::default()
        };
        a.absorb(&b);
        assert_eq!(a.all_time_entries, 3);
        assert_eq!(a.closed_won, 1);
        assert_eq!(a.total_closing_amount, 150.0);
        assert_eq!(a.hot_value, 900.0);
        assert_eq!(a.total_visits, 3);
    }
}
