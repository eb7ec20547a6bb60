//! Profile reconciliation service.
//!
//! Orchestrates the team store and the state store to implement sign-up,
//! profile edits and withdrawal. Every path that touches memberships goes
//! through the store's transactional reconciliation, so sign-up and profile
//! edits converge the same way and cannot create duplicate memberships.

use super::user_models::{
    MembershipDelta, SearchedUser, User, UserProfile, UserProfileView, UserState,
};
use super::user_store::TeamStore;
use crate::state_store::StateStore;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// State-store key holding a user's presence state.
pub fn presence_state_key(user_id: i64) -> String {
    format!("userState-{}", user_id)
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("User {0} not found")]
    UserNotFound(i64),
    #[error("Challenge for user {0} not found")]
    ChallengeNotFound(i64),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub struct ProfileService {
    team_store: Arc<dyn TeamStore>,
    state_store: Arc<dyn StateStore>,
}

impl ProfileService {
    pub fn new(team_store: Arc<dyn TeamStore>, state_store: Arc<dyn StateStore>) -> Self {
        Self {
            team_store,
            state_store,
        }
    }

    fn require_user(&self, user_id: i64) -> Result<User, ProfileError> {
        self.team_store
            .find_user(user_id)?
            .ok_or(ProfileError::UserNotFound(user_id))
    }

    fn reconcile(&self, user_id: i64, desired: &[String]) -> Result<MembershipDelta, ProfileError> {
        let delta = self.team_store.reconcile_memberships(user_id, desired)?;
        if !delta.unknown.is_empty() {
            warn!(
                "Skipped {} skill name(s) not in the catalog for user {}: {}",
                delta.unknown.len(),
                user_id,
                delta.unknown.join(", ")
            );
        }
        debug!(
            "Reconciled memberships of user {}: +{} -{}",
            user_id,
            delta.added.len(),
            delta.removed.len()
        );
        Ok(delta)
    }

    /// Completes sign-up for a shell user: applies the profile fields, marks
    /// the user authorized and, when a non-empty skill list is given,
    /// reconciles the membership set to it.
    pub fn sign_up(
        &self,
        user_id: i64,
        profile: &UserProfile,
        skills: Option<&[String]>,
    ) -> Result<MembershipDelta, ProfileError> {
        self.require_user(user_id)?;
        self.team_store.update_profile(user_id, profile)?;
        self.team_store.set_authorized(user_id, true)?;

        match skills {
            // Absent or empty list leaves the membership set untouched.
            None => Ok(MembershipDelta::default()),
            Some(desired) if desired.is_empty() => Ok(MembershipDelta::default()),
            Some(desired) => self.reconcile(user_id, desired),
        }
    }

    /// Composes the profile read model: user row, claimed skill names, the
    /// challenge record and the presence state. A missing presence value is
    /// `None`; a missing challenge is an error.
    pub fn get_profile(&self, user_id: i64) -> Result<UserProfileView, ProfileError> {
        let user = self.require_user(user_id)?;
        let skills = self.team_store.membership_names_for_user(user_id)?;
        let challenge = self
            .team_store
            .challenge_for_user(user_id)?
            .ok_or(ProfileError::ChallengeNotFound(user_id))?;
        let state = self
            .state_store
            .get_state(&presence_state_key(user_id))?
            .and_then(|value| UserState::parse(&value));

        Ok(UserProfileView {
            user,
            skills,
            challenge,
            state,
        })
    }

    /// Applies the profile fields and, when a skill list is given, reconciles
    /// the membership set to it. Passing an empty list removes every
    /// membership; passing `None` leaves them untouched.
    pub fn modify_profile(
        &self,
        user_id: i64,
        profile: &UserProfile,
        skills: Option<&[String]>,
    ) -> Result<MembershipDelta, ProfileError> {
        self.require_user(user_id)?;
        self.team_store.update_profile(user_id, profile)?;

        match skills {
            None => Ok(MembershipDelta::default()),
            Some(desired) => self.reconcile(user_id, desired),
        }
    }

    /// Deletes the user together with its memberships and challenge in one
    /// transaction, then clears the presence key. The presence write lives in
    /// its own consistency domain, so a failure there only leaves a stale
    /// cache entry behind.
    pub fn withdraw(&self, user_id: i64) -> Result<(), ProfileError> {
        self.require_user(user_id)?;
        self.team_store.delete_user_cascade(user_id)?;

        if let Err(e) = self.state_store.delete_state(&presence_state_key(user_id)) {
            warn!("Failed to clear presence state of user {}: {}", user_id, e);
        }
        Ok(())
    }

    /// Unconditionally overwrites the user's presence state.
    pub fn update_presence(&self, user_id: i64, state: UserState) -> Result<(), ProfileError> {
        self.state_store
            .set_state(&presence_state_key(user_id), state.as_str())?;
        Ok(())
    }

    /// Substring search on the GitHub login. Read-only.
    pub fn search_users(&self, fragment: &str) -> Result<Vec<SearchedUser>, ProfileError> {
        Ok(self.team_store.search_users_by_login(fragment)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_store::SqliteStateStore;
    use crate::user::{
        ChallengeStore, MembershipStore, SkillCatalogStore, SqliteTeamStore, UserStore,
    };
    use tempfile::TempDir;

    struct Fixture {
        service: ProfileService,
        team_store: Arc<SqliteTeamStore>,
        state_store: Arc<SqliteStateStore>,
        _temp_dir: TempDir,
    }

    fn create_fixture(catalog: &[&str]) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let team_store = Arc::new(SqliteTeamStore::new(temp_dir.path().join("team.db")).unwrap());
        let state_store =
            Arc::new(SqliteStateStore::new(temp_dir.path().join("state.db")).unwrap());
        for skill in catalog {
            team_store.add_skill(skill).unwrap();
        }
        let service = ProfileService::new(team_store.clone(), state_store.clone());
        Fixture {
            service,
            team_store,
            state_store,
            _temp_dir: temp_dir,
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn profile(name: &str) -> UserProfile {
        UserProfile {
            name: Some(name.to_string()),
            email: None,
            bio: None,
        }
    }

    #[test]
    fn sign_up_applies_profile_and_authorizes() {
        let f = create_fixture(&["java", "go"]);
        let user_id = f.team_store.create_user_shell("octocat").unwrap();

        f.service
            .sign_up(user_id, &profile("Mona"), Some(&names(&["java"])))
            .unwrap();

        let user = f.team_store.find_user(user_id).unwrap().unwrap();
        assert_eq!(user.name.as_deref(), Some("Mona"));
        assert!(user.authorized);
        assert_eq!(
            f.team_store.membership_names_for_user(user_id).unwrap(),
            names(&["java"])
        );
    }

    #[test]
    fn sign_up_drops_names_missing_from_catalog() {
        let f = create_fixture(&["java", "go"]);
        let user_id = f.team_store.create_user_shell("octocat").unwrap();

        let delta = f
            .service
            .sign_up(user_id, &profile("Mona"), Some(&names(&["java", "python"])))
            .unwrap();

        assert_eq!(delta.added, names(&["java"]));
        assert_eq!(delta.unknown, names(&["python"]));
        assert_eq!(
            f.team_store.membership_names_for_user(user_id).unwrap(),
            names(&["java"])
        );
    }

    #[test]
    fn repeated_sign_up_creates_no_duplicates() {
        let f = create_fixture(&["java", "go"]);
        let user_id = f.team_store.create_user_shell("octocat").unwrap();

        f.service
            .sign_up(user_id, &profile("Mona"), Some(&names(&["java", "go"])))
            .unwrap();
        let second = f
            .service
            .sign_up(user_id, &profile("Mona"), Some(&names(&["java", "go"])))
            .unwrap();

        assert!(second.is_noop());
        assert_eq!(
            f.team_store.membership_names_for_user(user_id).unwrap(),
            names(&["java", "go"])
        );
    }

    #[test]
    fn sign_up_without_skills_leaves_memberships_untouched() {
        let f = create_fixture(&["java"]);
        let user_id = f.team_store.create_user_shell("octocat").unwrap();
        f.team_store
            .reconcile_memberships(user_id, &names(&["java"]))
            .unwrap();

        f.service.sign_up(user_id, &profile("Mona"), None).unwrap();
        f.service
            .sign_up(user_id, &profile("Mona"), Some(&[]))
            .unwrap();

        assert_eq!(
            f.team_store.membership_names_for_user(user_id).unwrap(),
            names(&["java"])
        );
    }

    #[test]
    fn sign_up_unknown_user_fails() {
        let f = create_fixture(&[]);
        let result = f.service.sign_up(7, &profile("Mona"), None);
        assert!(matches!(result, Err(ProfileError::UserNotFound(7))));
    }

    #[test]
    fn modify_profile_converges_to_requested_set() {
        let f = create_fixture(&["java", "go", "rust"]);
        let user_id = f.team_store.create_user_shell("octocat").unwrap();
        f.service
            .sign_up(user_id, &profile("Mona"), Some(&names(&["java", "go"])))
            .unwrap();

        let delta = f
            .service
            .modify_profile(user_id, &profile("Mona"), Some(&names(&["go", "rust"])))
            .unwrap();

        assert_eq!(delta.removed, names(&["java"]));
        assert_eq!(delta.added, names(&["rust"]));
        assert_eq!(
            f.team_store.membership_names_for_user(user_id).unwrap(),
            names(&["go", "rust"])
        );
    }

    #[test]
    fn modify_profile_twice_is_idempotent() {
        let f = create_fixture(&["java", "go"]);
        let user_id = f.team_store.create_user_shell("octocat").unwrap();

        f.service
            .modify_profile(user_id, &profile("Mona"), Some(&names(&["java", "go"])))
            .unwrap();
        let second = f
            .service
            .modify_profile(user_id, &profile("Mona"), Some(&names(&["java", "go"])))
            .unwrap();

        assert!(second.is_noop());
    }

    #[test]
    fn modify_profile_with_empty_list_removes_all_memberships() {
        let f = create_fixture(&["java"]);
        let user_id = f.team_store.create_user_shell("octocat").unwrap();
        f.service
            .sign_up(user_id, &profile("Mona"), Some(&names(&["java"])))
            .unwrap();

        let delta = f
            .service
            .modify_profile(user_id, &profile("Mona"), Some(&[]))
            .unwrap();

        assert_eq!(delta.removed, names(&["java"]));
        assert!(f
            .team_store
            .membership_names_for_user(user_id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn get_profile_composes_the_read_model() {
        let f = create_fixture(&["java"]);
        let user_id = f.team_store.create_user_shell("octocat").unwrap();
        f.service
            .sign_up(user_id, &profile("Mona"), Some(&names(&["java"])))
            .unwrap();
        f.team_store.create_challenge(user_id, "30 commits").unwrap();
        f.service.update_presence(user_id, UserState::Online).unwrap();

        let view = f.service.get_profile(user_id).unwrap();

        assert_eq!(view.user.github_login, "octocat");
        assert_eq!(view.skills, names(&["java"]));
        assert_eq!(view.challenge.title, "30 commits");
        assert_eq!(view.state, Some(UserState::Online));
    }

    #[test]
    fn get_profile_without_challenge_fails() {
        let f = create_fixture(&[]);
        let user_id = f.team_store.create_user_shell("octocat").unwrap();

        let result = f.service.get_profile(user_id);
        assert!(matches!(result, Err(ProfileError::ChallengeNotFound(id)) if id == user_id));
    }

    #[test]
    fn get_profile_without_presence_state_is_none() {
        let f = create_fixture(&[]);
        let user_id = f.team_store.create_user_shell("octocat").unwrap();
        f.team_store.create_challenge(user_id, "30 commits").unwrap();

        let view = f.service.get_profile(user_id).unwrap();
        assert!(view.state.is_none());
    }

    #[test]
    fn update_presence_overwrites() {
        let f = create_fixture(&[]);
        let user_id = f.team_store.create_user_shell("octocat").unwrap();

        f.service.update_presence(user_id, UserState::Online).unwrap();
        f.service.update_presence(user_id, UserState::Busy).unwrap();

        assert_eq!(
            f.state_store
                .get_state(&presence_state_key(user_id))
                .unwrap()
                .as_deref(),
            Some("busy")
        );
    }

    #[test]
    fn withdraw_removes_user_dependents_and_presence() {
        let f = create_fixture(&["java"]);
        let user_id = f.team_store.create_user_shell("octocat").unwrap();
        f.service
            .sign_up(user_id, &profile("Mona"), Some(&names(&["java"])))
            .unwrap();
        f.team_store.create_challenge(user_id, "30 commits").unwrap();
        f.service.update_presence(user_id, UserState::Online).unwrap();

        f.service.withdraw(user_id).unwrap();

        assert!(f.team_store.find_user(user_id).unwrap().is_none());
        assert!(f
            .team_store
            .memberships_for_user(user_id)
            .unwrap()
            .is_empty());
        assert!(f.team_store.challenge_for_user(user_id).unwrap().is_none());
        assert!(f
            .state_store
            .get_state(&presence_state_key(user_id))
            .unwrap()
            .is_none());

        let again = f.service.withdraw(user_id);
        assert!(matches!(again, Err(ProfileError::UserNotFound(_))));
    }

    #[test]
    fn search_users_matches_substring() {
        let f = create_fixture(&[]);
        f.team_store.create_user_shell("octocat").unwrap();
        f.team_store.create_user_shell("hubot").unwrap();

        let found = f.service.search_users("cat").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].github_login, "octocat");
    }
}
