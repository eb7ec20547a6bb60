mod profile_service;
mod reconcile;
mod sqlite_team_store;
pub mod user_models;
mod user_store;

pub use profile_service::{presence_state_key, ProfileError, ProfileService};
pub use reconcile::{plan_reconciliation, ReconcilePlan};
pub use sqlite_team_store::SqliteTeamStore;
pub use user_models::{
    Challenge, MembershipDelta, MembershipRecord, SearchedUser, Skill, User, UserProfile,
    UserProfileView, UserState,
};
pub use user_store::{ChallengeStore, MembershipStore, SkillCatalogStore, TeamStore, UserStore};
