use super::reconcile::plan_reconciliation;
use super::user_models::{
    Challenge, MembershipDelta, MembershipRecord, SearchedUser, Skill, User, UserProfile,
};
use super::user_store::{ChallengeStore, MembershipStore, SkillCatalogStore, UserStore};
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP,
};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "github_login",
            &SqlType::Text,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!("name", &SqlType::Text),
        sqlite_column!("email", &SqlType::Text),
        sqlite_column!("bio", &SqlType::Text),
        sqlite_column!(
            "authorized",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_github_login", "github_login")],
};

const SKILL_TABLE_V_0: Table = Table {
    name: "skill",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
    ],
    unique_constraints: &[],
    indices: &[("idx_skill_name", "name")],
};

const USER_SKILL_TABLE_V_0: Table = Table {
    name: "user_skill",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "skill_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "skill",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["user_id", "skill_id"]],
    indices: &[("idx_user_skill_user_id", "user_id")],
};

const CHALLENGE_TABLE_V_0: Table = Table {
    name: "challenge",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "progress",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_challenge_user_id", "user_id")],
};

pub const TEAM_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE_V_0,
        SKILL_TABLE_V_0,
        USER_SKILL_TABLE_V_0,
        CHALLENGE_TABLE_V_0,
    ],
    migration: None,
}];

#[derive(Clone)]
pub struct SqliteTeamStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTeamStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(db_path, TEAM_VERSIONED_SCHEMAS)?;
        Ok(SqliteTeamStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            github_login: row.get(1)?,
            name: row.get(2)?,
            email: row.get(3)?,
            bio: row.get(4)?,
            authorized: row.get::<_, i64>(5)? != 0,
        })
    }
}

impl UserStore for SqliteTeamStore {
    fn create_user_shell(&self, github_login: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user (github_login) VALUES (?1)",
            params![github_login],
        )
        .with_context(|| format!("Failed to create user shell for {}", github_login))?;
        Ok(conn.last_insert_rowid())
    }

    fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, github_login, name, email, bio, authorized FROM user WHERE id = ?1",
        )?;
        let user = stmt
            .query_row(params![user_id], Self::row_to_user)
            .optional()?;
        Ok(user)
    }

    fn update_profile(&self, user_id: i64, profile: &UserProfile) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE user SET name = ?1, email = ?2, bio = ?3 WHERE id = ?4",
            params![profile.name, profile.email, profile.bio, user_id],
        )
        .with_context(|| format!("Failed to update profile of user {}", user_id))?;
        Ok(())
    }

    fn set_authorized(&self, user_id: i64, authorized: bool) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE user SET authorized = ?1 WHERE id = ?2",
            params![authorized as i64, user_id],
        )?;
        Ok(())
    }

    fn delete_user_cascade(&self, user_id: i64) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        // Dependents first, then the user row. The FK cascades would cover the
        // first two, but withdrawal enumerates its dependents deliberately.
        tx.execute(
            "DELETE FROM user_skill WHERE user_id = ?1",
            params![user_id],
        )?;
        tx.execute("DELETE FROM challenge WHERE user_id = ?1", params![user_id])?;
        tx.execute("DELETE FROM user WHERE id = ?1", params![user_id])?;

        tx.commit()?;
        Ok(())
    }

    fn search_users_by_login(&self, fragment: &str) -> Result<Vec<SearchedUser>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, github_login, name FROM user WHERE github_login LIKE ?1 ORDER BY github_login",
        )?;
        let users = stmt
            .query_map(params![format!("%{}%", fragment)], |row| {
                Ok(SearchedUser {
                    id: row.get(0)?,
                    github_login: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }
}

impl SkillCatalogStore for SqliteTeamStore {
    fn list_all_skills(&self) -> Result<Vec<Skill>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, name FROM skill ORDER BY id")?;
        let skills = stmt
            .query_map([], |row| {
                Ok(Skill {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(skills)
    }

    fn add_skill(&self, name: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute("INSERT INTO skill (name) VALUES (?1)", params![name])
            .with_context(|| format!("Failed to add skill {}", name))?;
        Ok(conn.last_insert_rowid())
    }
}

impl MembershipStore for SqliteTeamStore {
    fn membership_names_for_user(&self, user_id: i64) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT s.name FROM user_skill us JOIN skill s ON s.id = us.skill_id
             WHERE us.user_id = ?1 ORDER BY us.id",
        )?;
        let names = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn memberships_for_user(&self, user_id: i64) -> Result<Vec<MembershipRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT us.id, s.name FROM user_skill us JOIN skill s ON s.id = us.skill_id
             WHERE us.user_id = ?1 ORDER BY us.id",
        )?;
        let memberships = stmt
            .query_map(params![user_id], |row| {
                Ok(MembershipRecord {
                    id: row.get(0)?,
                    skill_name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(memberships)
    }

    fn reconcile_memberships(&self, user_id: i64, desired: &[String]) -> Result<MembershipDelta> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let skill_map: HashMap<String, i64> = {
            let mut stmt = tx.prepare("SELECT name, id FROM skill")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            rows.collect::<Result<_, _>>()?
        };

        let current: Vec<MembershipRecord> = {
            let mut stmt = tx.prepare(
                "SELECT us.id, s.name FROM user_skill us JOIN skill s ON s.id = us.skill_id
                 WHERE us.user_id = ?1 ORDER BY us.id",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(MembershipRecord {
                    id: row.get(0)?,
                    skill_name: row.get(1)?,
                })
            })?;
            rows.collect::<Result<_, _>>()?
        };

        let plan = plan_reconciliation(&current, desired);

        let mut removed = Vec::with_capacity(plan.delete.len());
        for membership in plan.delete {
            tx.execute(
                "DELETE FROM user_skill WHERE id = ?1",
                params![membership.id],
            )?;
            removed.push(membership.skill_name);
        }

        let mut added = Vec::new();
        let mut unknown = Vec::new();
        for name in plan.create_names {
            match skill_map.get(&name) {
                Some(skill_id) => {
                    tx.execute(
                        "INSERT INTO user_skill (user_id, skill_id) VALUES (?1, ?2)",
                        params![user_id, skill_id],
                    )
                    .with_context(|| {
                        format!("Failed to create membership {} for user {}", name, user_id)
                    })?;
                    added.push(name);
                }
                None => unknown.push(name),
            }
        }

        tx.commit()?;
        Ok(MembershipDelta {
            added,
            removed,
            unknown,
        })
    }
}

impl ChallengeStore for SqliteTeamStore {
    fn challenge_for_user(&self, user_id: i64) -> Result<Option<Challenge>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, user_id, title, progress FROM challenge WHERE user_id = ?1")?;
        let challenge = stmt
            .query_row(params![user_id], |row| {
                Ok(Challenge {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    title: row.get(2)?,
                    progress: row.get(3)?,
                })
            })
            .optional()?;
        Ok(challenge)
    }

    fn create_challenge(&self, user_id: i64, title: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO challenge (user_id, title) VALUES (?1, ?2)",
            params![user_id, title],
        )
        .with_context(|| format!("Failed to create challenge for user {}", user_id))?;
        Ok(conn.last_insert_rowid())
    }
}
