use super::user_models::{
    Challenge, MembershipDelta, MembershipRecord, SearchedUser, Skill, User, UserProfile,
};
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Creates a shell user record for the given GitHub login and returns the
    /// user id. Profile fields stay empty and `authorized` is false until
    /// sign-up completes.
    fn create_user_shell(&self, github_login: &str) -> Result<i64>;

    /// Returns the user with the given id.
    /// Returns Ok(None) if the user does not exist.
    /// Returns Err if there is a database error.
    fn find_user(&self, user_id: i64) -> Result<Option<User>>;

    /// Applies the profile fields to the user row.
    fn update_profile(&self, user_id: i64, profile: &UserProfile) -> Result<()>;

    /// Sets the user's authorized flag.
    fn set_authorized(&self, user_id: i64, authorized: bool) -> Result<()>;

    /// Deletes the user row together with its memberships and challenge,
    /// inside one transaction.
    fn delete_user_cascade(&self, user_id: i64) -> Result<()>;

    /// Returns users whose GitHub login contains the given fragment.
    fn search_users_by_login(&self, fragment: &str) -> Result<Vec<SearchedUser>>;
}

pub trait SkillCatalogStore: Send + Sync {
    /// Returns every skill in the catalog.
    fn list_all_skills(&self) -> Result<Vec<Skill>>;

    /// Adds a skill to the catalog and returns its id. Used for seeding only;
    /// the reconciliation paths never write the catalog.
    fn add_skill(&self, name: &str) -> Result<i64>;
}

pub trait MembershipStore: Send + Sync {
    /// Returns the skill names the user currently claims.
    fn membership_names_for_user(&self, user_id: i64) -> Result<Vec<String>>;

    /// Returns the user's membership rows with their ids.
    fn memberships_for_user(&self, user_id: i64) -> Result<Vec<MembershipRecord>>;

    /// Converges the user's membership set to `desired`, deleting memberships
    /// absent from the request and creating the net-new ones, inside one
    /// transaction. Requested names missing from the skill catalog are skipped
    /// and reported in the returned delta.
    fn reconcile_memberships(&self, user_id: i64, desired: &[String]) -> Result<MembershipDelta>;
}

pub trait ChallengeStore: Send + Sync {
    /// Returns the user's challenge record.
    /// Returns Ok(None) if the user has none.
    fn challenge_for_user(&self, user_id: i64) -> Result<Option<Challenge>>;

    /// Creates a challenge record for the user and returns its id.
    fn create_challenge(&self, user_id: i64, title: &str) -> Result<i64>;
}

/// Combined trait for the team database: users, skills, memberships and
/// challenges live in one file and share transactions.
pub trait TeamStore: UserStore + SkillCatalogStore + MembershipStore + ChallengeStore {}

impl<T: UserStore + SkillCatalogStore + MembershipStore + ChallengeStore> TeamStore for T {}
