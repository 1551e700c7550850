//! Analytics core for a sales lead tracking dashboard.
//!
//! Turns a flat list of lead entries into hierarchical statistics
//! (per-user, per-team, organization-wide) under a role-based visibility
//! scope and an optional date range. The whole pipeline is pure: callers
//! fetch snapshots through [`client`], then compose
//!
//! ```
//! use leadboard::{aggregate, date_filter, rollup, scope};
//! use leadboard::types::Role;
//!
//! let entries: Vec<leadboard::types::Entry> = Vec::new();
//! let roster: Vec<leadboard::types::User> = Vec::new();
//!
//! let visibility = scope::resolve_visibility(Role::Admin, "a1", &roster);
//! let range = date_filter::DateRange::parse(Some("2024-05-01"), Some("2024-05-31"));
//! let filtered = date_filter::filter_by_range(entries, &range);
//! let result = aggregate::aggregate(aggregate::AggregationInput {
//!     entries: &filtered,
//!     scope: &visibility,
//!     now: chrono::Utc::now(),
//!     collect_values: true,
//! });
//! let teams = rollup::team_stats(&result.per_subject, &scope::derive_teams(&roster));
//! let org = rollup::organization_stats(result.per_subject.values());
//! # let _ = (teams, org);
//! ```
//!
//! Rendering, routing, auth, and export serialization are external
//! collaborators; they consume the plain data this crate produces.

pub mod aggregate;
pub mod client;
pub mod date_filter;
pub mod normalize;
pub mod report;
pub mod rollup;
pub mod scope;
pub mod search;
pub mod session;
pub mod types;
