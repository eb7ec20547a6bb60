//! Membership set reconciliation.
//!
//! Pure diff between a user's stored memberships and a requested skill-name
//! set. The stores apply the resulting plan inside a transaction; this module
//! never touches the database.

use super::user_models::MembershipRecord;
use std::collections::HashSet;

/// The minimal set of operations converging a membership set to a requested
/// set: at most one delete + one create per differing skill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Memberships to delete (their skill name is absent from the request).
    pub delete: Vec<MembershipRecord>,
    /// Net-new skill names to create memberships for, in request order.
    pub create_names: Vec<String>,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.delete.is_empty() && self.create_names.is_empty()
    }
}

/// Diffs `current` against `desired`.
///
/// Scans the current memberships once: a membership whose skill name appears
/// in the working set is kept (and the name is consumed, so a duplicate row
/// for the same skill gets deleted); any other membership is deleted. Names
/// left unconsumed after the scan are net-new.
pub fn plan_reconciliation(current: &[MembershipRecord], desired: &[String]) -> ReconcilePlan {
    let mut working: HashSet<&str> = desired.iter().map(String::as_str).collect();

    let mut delete = Vec::new();
    for membership in current {
        if !working.remove(membership.skill_name.as_str()) {
            delete.push(membership.clone());
        }
    }

    let mut create_names = Vec::new();
    for name in desired {
        if working.remove(name.as_str()) {
            create_names.push(name.clone());
        }
    }

    ReconcilePlan {
        delete,
        create_names,
    }
}
