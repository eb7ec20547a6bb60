//! User domain models

use serde::{Deserialize, Serialize};

/// A registered team member. Shell records (created on sign-up intent) have
/// `authorized = false` and empty profile fields until sign-up completes.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    /// External GitHub handle, fixed at shell creation. Search matches on it.
    pub github_login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub authorized: bool,
}

/// The mutable profile fields applied by sign-up and profile edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
}

/// An entry of the skill catalog. Immutable once seeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}

/// One membership row: a user claiming one skill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipRecord {
    pub id: i64,
    pub skill_name: String,
}

/// Outcome of one membership reconciliation.
///
/// `unknown` holds requested names that are not in the skill catalog; they are
/// skipped, never turned into memberships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MembershipDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub unknown: Vec<String>,
}

impl MembershipDelta {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// The per-user challenge record. Every active user is expected to have one.
#[derive(Debug, Clone, Serialize)]
pub struct Challenge {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub progress: u32,
}

/// Transient presence state, stored as a plain string in the state store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserState {
    Online,
    Away,
    Busy,
    Offline,
}

impl UserState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserState::Online => "online",
            UserState::Away => "away",
            UserState::Busy => "busy",
            UserState::Offline => "offline",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "online" => Some(UserState::Online),
            "away" => Some(UserState::Away),
            "busy" => Some(UserState::Busy),
            "offline" => Some(UserState::Offline),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read model returned by `ProfileService::get_profile`, combining the user
/// row, claimed skill names, the challenge record and the presence state.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfileView {
    pub user: User,
    pub skills: Vec<String>,
    pub challenge: Challenge,
    pub state: Option<UserState>,
}

/// Projection returned by user search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchedUser {
    pub id: i64,
    pub github_login: String,
    pub name: Option<String>,
}
