//! End-to-end flows through the profile service against real SQLite stores.

use crewline_server::state_store::SqliteStateStore;
use crewline_server::user::{
    ChallengeStore, MembershipStore, ProfileError, ProfileService, SkillCatalogStore,
    SqliteTeamStore, UserProfile, UserState, UserStore,
};
use std::sync::Arc;
use tempfile::TempDir;

struct Env {
    service: ProfileService,
    team_store: Arc<SqliteTeamStore>,
    _temp_dir: TempDir,
}

fn setup(catalog: &[&str]) -> Env {
    let temp_dir = TempDir::new().unwrap();
    let team_store = Arc::new(SqliteTeamStore::new(temp_dir.path().join("team.db")).unwrap());
    let state_store = Arc::new(SqliteStateStore::new(temp_dir.path().join("state.db")).unwrap());
    for skill in catalog {
        team_store.add_skill(skill).unwrap();
    }
    Env {
        service: ProfileService::new(team_store.clone(), state_store),
        team_store,
        _temp_dir: temp_dir,
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn full_member_lifecycle() {
    let env = setup(&["java", "go", "rust"]);
    let user_id = env.team_store.create_user_shell("octocat").unwrap();
    env.team_store
        .create_challenge(user_id, "first sprint")
        .unwrap();

    // Sign up with one unknown skill; it is dropped silently.
    let delta = env
        .service
        .sign_up(
            user_id,
            &UserProfile {
                name: Some("Mona".to_string()),
                email: Some("mona@example.com".to_string()),
                bio: None,
            },
            Some(&names(&["java", "python"])),
        )
        .unwrap();
    assert_eq!(delta.added, names(&["java"]));
    assert_eq!(delta.unknown, names(&["python"]));

    // Edit the profile and skill set.
    env.service
        .modify_profile(
            user_id,
            &UserProfile {
                name: Some("Mona Lisa".to_string()),
                email: Some("mona@example.com".to_string()),
                bio: Some("octo things".to_string()),
            },
            Some(&names(&["go", "rust"])),
        )
        .unwrap();

    env.service
        .update_presence(user_id, UserState::Online)
        .unwrap();

    let view = env.service.get_profile(user_id).unwrap();
    assert_eq!(view.user.name.as_deref(), Some("Mona Lisa"));
    assert!(view.user.authorized);
    assert_eq!(view.skills, names(&["go", "rust"]));
    assert_eq!(view.challenge.title, "first sprint");
    assert_eq!(view.state, Some(UserState::Online));

    // Search sees the user until withdrawal.
    assert_eq!(env.service.search_users("octo").unwrap().len(), 1);

    env.service.withdraw(user_id).unwrap();
    assert!(env.team_store.find_user(user_id).unwrap().is_none());
    assert!(env
        .team_store
        .memberships_for_user(user_id)
        .unwrap()
        .is_empty());
    assert!(env.service.search_users("octo").unwrap().is_empty());

    let profile = env.service.get_profile(user_id);
    assert!(matches!(profile, Err(ProfileError::UserNotFound(_))));
}

#[test]
fn membership_set_always_converges_to_request() {
    let env = setup(&["java", "go", "rust", "kotlin"]);
    let user_id = env.team_store.create_user_shell("octocat").unwrap();

    let requests: &[&[&str]] = &[
        &["java"],
        &["java", "go", "rust"],
        &["kotlin"],
        &[],
        &["go", "go", "java"],
    ];

    for request in requests {
        let desired = names(request);
        env.service
            .modify_profile(user_id, &UserProfile::default(), Some(&desired))
            .unwrap();

        let mut expected: Vec<String> = desired.clone();
        expected.dedup();
        let mut actual = env
            .team_store
            .membership_names_for_user(user_id)
            .unwrap();
        actual.sort();
        let mut expected_sorted = expected;
        expected_sorted.sort();
        expected_sorted.dedup();
        assert_eq!(actual, expected_sorted);
    }
}

#[test]
fn profiles_are_isolated_between_users() {
    let env = setup(&["java", "go"]);
    let mona = env.team_store.create_user_shell("octocat").unwrap();
    let hubot = env.team_store.create_user_shell("hubot").unwrap();

    env.service
        .sign_up(mona, &UserProfile::default(), Some(&names(&["java"])))
        .unwrap();
    env.service
        .sign_up(hubot, &UserProfile::default(), Some(&names(&["go"])))
        .unwrap();

    env.service.withdraw(mona).unwrap();

    // Withdrawing one user leaves the other's memberships intact.
    assert_eq!(
        env.team_store.membership_names_for_user(hubot).unwrap(),
        names(&["go"])
    );
}
