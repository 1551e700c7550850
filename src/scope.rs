//! Role-based visibility scoping and team derivation.
//!
//! The scope decides whose entries a viewer may see aggregated. Teams are
//! derived, never stored: an admin plus every "others" user whose assigned
//! admins include that admin. Both are recomputed on every pass.

use std::collections::HashSet;

use crate::types::{Role, User};

/// The set of subjects a viewer is authorized to see stats for.
#[derive(Debug, Clone)]
pub struct VisibilityScope {
    pub viewer_id: String,
    pub role: Role,
    visible: HashSet<String>,
}

impl VisibilityScope {
    pub fn contains(&self, subject_id: &str) -> bool {
        self.visible.contains(subject_id)
    }

    pub fn visible_ids(&self) -> &HashSet<String> {
        &self.visible
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

/// Resolve the viewer's visibility scope against the full roster.
///
/// - superadmin: every admin and others user in the roster
/// - admin: the viewer itself plus every others user supervised by it
/// - others: only the viewer itself
///
/// An empty roster is not an error; it yields an empty scope (singleton for
/// an "others" viewer, who always sees their own entries).
pub fn resolve_visibility(role: Role, viewer_id: &str, roster: &[User]) -> VisibilityScope {
    let mut visible = HashSet::new();

    match role {
        Role::Superadmin => {
            for user in roster {
                if matches!(user.role, Role::Admin | Role::Others) {
                    visible.insert(user.id.clone());
                }
            }
        }
        Role::Admin => {
            visible.insert(viewer_id.to_string());
            for user in roster {
                if user.role == Role::Others
                    && user.assigned_admins.iter().any(|a| a == viewer_id)
                {
                    visible.insert(user.id.clone());
                }
            }
        }
        Role::Others => {
            visible.insert(viewer_id.to_string());
        }
    }

    VisibilityScope {
        viewer_id: viewer_id.to_string(),
        role,
        visible,
    }
}

/// One admin and the others-users it supervises. Derived per pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub admin_id: String,
    pub member_ids: Vec<String>,
}

/// Derive every team from the roster, in roster order for both admins and
/// members. An admin with no supervised users still forms a (memberless)
/// team.
pub fn derive_teams(roster: &[User]) -> Vec<Team> {
    roster
        .iter()
        .filter(|u| u.role == Role::Admin)
        .map(|admin| Team {
            admin_id: admin.id.clone(),
            member_ids: roster
                .iter()
                .filter(|u| {
                    u.role == Role::Others && u.assigned_admins.iter().any(|a| a == &admin.id)
                })
                .map(|u| u.id.clone())
                .collect(),
        })
        .collect()
}
