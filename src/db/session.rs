//! Caller-bound data access over SQLite.
//!
//! A session enforces the row-level security rules of the hosted backend:
//! members of a project may read it, members whose role carries
//! `can_manage_master_data` may change its memberships.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use super::repository::{caller_permissions, member_from_row, MEMBER_COLUMNS, MEMBER_JOINS};
use crate::access::{AccessResult, MemberDataAccess};
use crate::errors::codes;
use crate::models::{
    AddMemberRequest, MemberDetails, OperationResult, ProfilePatch, ProjectRole,
    UpdateMemberRequest,
};

const NOT_A_MEMBER: &str = "You are not a member of this project";
const CANNOT_MANAGE: &str = "Your role does not allow managing project members";

/// Data access handle acting on behalf of one user.
#[derive(Clone)]
pub struct MemberSession {
    pool: SqlitePool,
    caller_id: String,
}

/// Outcome of the row-level security check.
enum Access {
    Granted,
    Denied(&'static str),
}

impl MemberSession {
    pub fn new(pool: SqlitePool, caller_id: String) -> Self {
        Self { pool, caller_id }
    }

    async fn check_read(&self, project_id: &str) -> Result<Access, sqlx::Error> {
        let permissions = caller_permissions(&self.pool, project_id, &self.caller_id).await?;
        Ok(match permissions {
            Some(_) => Access::Granted,
            None => Access::Denied(NOT_A_MEMBER),
        })
    }

    async fn check_manage(&self, project_id: &str) -> Result<Access, sqlx::Error> {
        let permissions = caller_permissions(&self.pool, project_id, &self.caller_id).await?;
        Ok(match permissions {
            Some(p) if p.can_manage_master_data => Access::Granted,
            Some(_) => Access::Denied(CANNOT_MANAGE),
            None => Access::Denied(NOT_A_MEMBER),
        })
    }

    async fn fetch_member(
        &self,
        member_id: &str,
        project_id: &str,
    ) -> Result<Option<MemberDetails>, sqlx::Error> {
        let sql = format!(
            "SELECT {} {} WHERE m.id = ? AND m.project_id = ?",
            MEMBER_COLUMNS, MEMBER_JOINS
        );
        let row = sqlx::query(&sql)
            .bind(member_id)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(member_from_row))
    }
}

/// Deny helper keeping the result type of each operation.
fn forbidden<T>(reason: &str) -> AccessResult<T> {
    tracing::warn!("Row-level security denied request: {}", reason);
    Ok(OperationResult::failure(codes::FORBIDDEN, reason))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

async fn role_in_project(
    conn: &mut SqliteConnection,
    role_id: &str,
    project_id: &str,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT id FROM project_roles WHERE id = ? AND project_id = ?")
        .bind(role_id)
        .bind(project_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}

/// Create the profile row for a user if missing, seeding the contact email
/// from the account.
async fn ensure_profile(conn: &mut SqliteConnection, user_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO user_profiles (user_id, public_contact_email, updated_at)
        SELECT id, email, ? FROM users WHERE id = ?
        "#,
    )
    .bind(Utc::now().to_rfc3339())
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Write the fields present in `patch`. With `only_missing`, existing
/// values win over the patch.
async fn apply_profile_patch(
    conn: &mut SqliteConnection,
    user_id: &str,
    patch: &ProfilePatch,
    only_missing: bool,
) -> Result<(), sqlx::Error> {
    let entries = patch.entries();
    if entries.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE user_profiles SET ");
    for (field, value) in entries {
        let column = field.column();
        builder.push(column);
        if only_missing {
            builder
                .push(" = COALESCE(")
                .push(column)
                .push(", ")
                .push_bind(value.to_string())
                .push("), ");
        } else {
            builder.push(" = ").push_bind(value.to_string()).push(", ");
        }
    }
    builder
        .push("updated_at = ")
        .push_bind(Utc::now().to_rfc3339())
        .push(" WHERE user_id = ")
        .push_bind(user_id.to_string());

    builder.build().execute(&mut *conn).await?;
    Ok(())
}

#[async_trait]
impl MemberDataAccess for MemberSession {
    async fn list_assignable_roles(&self, project_id: &str) -> AccessResult<Vec<ProjectRole>> {
        if let Access::Denied(reason) = self.check_read(project_id).await? {
            return forbidden(reason);
        }

        let rows = sqlx::query(
            "SELECT id, role_name FROM project_roles WHERE project_id = ? ORDER BY role_name",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        let roles = rows
            .into_iter()
            .map(|row| ProjectRole {
                id: row.get("id"),
                role_name: row.get("role_name"),
            })
            .collect();
        Ok(OperationResult::Success(roles))
    }

    async fn get_member_detail(
        &self,
        member_id: &str,
        project_id: &str,
    ) -> AccessResult<Option<MemberDetails>> {
        if let Access::Denied(reason) = self.check_read(project_id).await? {
            return forbidden(reason);
        }

        let member = self.fetch_member(member_id, project_id).await?;
        Ok(OperationResult::Success(member))
    }

    async fn list_members(&self, project_id: &str) -> AccessResult<Vec<MemberDetails>> {
        if let Access::Denied(reason) = self.check_read(project_id).await? {
            return forbidden(reason);
        }

        let sql = format!(
            "SELECT {} {} WHERE m.project_id = ? ORDER BY m.joined_at, m.id",
            MEMBER_COLUMNS, MEMBER_JOINS
        );
        let rows = sqlx::query(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(OperationResult::Success(
            rows.iter().map(member_from_row).collect(),
        ))
    }

    async fn add_member(&self, request: &AddMemberRequest) -> AccessResult<MemberDetails> {
        if let Access::Denied(reason) = self.check_manage(&request.project_id).await? {
            return forbidden(reason);
        }

        let mut tx = self.pool.begin().await?;

        if !role_in_project(&mut tx, &request.role_id, &request.project_id).await? {
            return Ok(OperationResult::failure(
                codes::INVALID_ROLE,
                format!("Role {} does not belong to this project", request.role_id),
            ));
        }

        let user = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(&request.user_email)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(user) = user else {
            return Ok(OperationResult::failure(
                codes::USER_NOT_FOUND,
                format!("No user registered with email {}", request.user_email),
            ));
        };
        let user_id: String = user.get("id");

        // UNIQUE(project_id, user_id) is the duplicate check.
        let member_id = uuid::Uuid::new_v4().to_string();
        let inserted = sqlx::query(
            "INSERT INTO project_members (id, project_id, user_id, project_role_id, joined_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&member_id)
        .bind(&request.project_id)
        .bind(&user_id)
        .bind(&request.role_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await;
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Ok(OperationResult::failure(
                    codes::ALREADY_MEMBER,
                    "User is already a member of this project",
                ));
            }
            Err(err) => return Err(err.into()),
        }

        ensure_profile(&mut tx, &user_id).await?;
        if let Some(initial) = &request.initial_profile {
            apply_profile_patch(&mut tx, &user_id, initial, true).await?;
        }

        tx.commit().await?;
        tracing::info!(
            "Added user {} to project {} as member {}",
            user_id,
            request.project_id,
            member_id
        );

        match self.fetch_member(&member_id, &request.project_id).await? {
            Some(member) => Ok(OperationResult::Success(member)),
            None => Ok(OperationResult::failure(
                codes::NOT_FOUND,
                format!("Member {} not found after insert", member_id),
            )),
        }
    }

    async fn update_member(&self, request: &UpdateMemberRequest) -> AccessResult<()> {
        if let Access::Denied(reason) = self.check_manage(&request.project_id).await? {
            return forbidden(reason);
        }

        // Both partitions are applied in one transaction here; the data
        // access contract itself does not promise this.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT user_id FROM project_members WHERE id = ? AND project_id = ?")
            .bind(&request.project_member_id)
            .bind(&request.project_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(OperationResult::failure(
                codes::NOT_FOUND,
                format!("Member {} not found", request.project_member_id),
            ));
        };
        let user_id: String = row.get("user_id");

        if let Some(change) = &request.member_updates {
            if !role_in_project(&mut tx, &change.new_role_id, &request.project_id).await? {
                return Ok(OperationResult::failure(
                    codes::INVALID_ROLE,
                    format!("Role {} does not belong to this project", change.new_role_id),
                ));
            }

            sqlx::query("UPDATE project_members SET project_role_id = ? WHERE id = ?")
                .bind(&change.new_role_id)
                .bind(&request.project_member_id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(patch) = request.profile_updates.as_ref().filter(|p| !p.is_empty()) {
            ensure_profile(&mut tx, &user_id).await?;
            apply_profile_patch(&mut tx, &user_id, patch, false).await?;
        }

        tx.commit().await?;
        tracing::debug!("Updated member {}", request.project_member_id);

        Ok(OperationResult::Success(()))
    }

    async fn remove_member(&self, project_id: &str, member_id: &str) -> AccessResult<()> {
        if let Access::Denied(reason) = self.check_manage(project_id).await? {
            return forbidden(reason);
        }

        let result = sqlx::query("DELETE FROM project_members WHERE id = ? AND project_id = ?")
            .bind(member_id)
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(OperationResult::failure(
                codes::NOT_FOUND,
                format!("Member {} not found", member_id),
            ));
        }

        tracing::info!("Removed member {} from project {}", member_id, project_id);
        Ok(OperationResult::Success(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_database, Repository};
    use crate::models::{BackendFailure, ProfileField, RoleChange};
    use tempfile::TempDir;

    struct Seed {
        repo: Repository,
        project_id: String,
        manager_id: String,
        viewer_id: String,
        outsider_id: String,
        lead_role: String,
        researcher_role: String,
        viewer_member: String,
        _temp_dir: TempDir,
    }

    async fn seed() -> Seed {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        let repo = Repository::new(pool);

        let project_id = repo.insert_project("Coastal survey").await.unwrap();
        let lead_role = repo.insert_role(&project_id, "Lead", true).await.unwrap();
        let researcher_role = repo
            .insert_role(&project_id, "Researcher", false)
            .await
            .unwrap();

        let manager_id = repo.insert_user("lead@example.com").await.unwrap();
        let viewer_id = repo.insert_user("ana@example.com").await.unwrap();
        let outsider_id = repo.insert_user("outsider@example.com").await.unwrap();
        repo.insert_user("new@example.com").await.unwrap();

        repo.insert_membership(&project_id, &manager_id, &lead_role)
            .await
            .unwrap();
        let viewer_member = repo
            .insert_membership(&project_id, &viewer_id, &researcher_role)
            .await
            .unwrap();
        repo.insert_profile(&viewer_id, "ana@example.com", "Ana", "Lee")
            .await
            .unwrap();

        Seed {
            repo,
            project_id,
            manager_id,
            viewer_id,
            outsider_id,
            lead_role,
            researcher_role,
            viewer_member,
            _temp_dir: temp_dir,
        }
    }

    fn failure_code<T>(result: OperationResult<T>) -> Option<String> {
        match result {
            OperationResult::Failure(BackendFailure { error_code, .. }) => error_code,
            OperationResult::Success(_) => None,
        }
    }

    #[tokio::test]
    async fn test_roles_ordered_by_name() {
        let seed = seed().await;
        let session = seed.repo.session(&seed.viewer_id);

        let result = session
            .list_assignable_roles(&seed.project_id)
            .await
            .unwrap();
        let OperationResult::Success(roles) = result else {
            panic!("expected roles");
        };
        let names: Vec<_> = roles.iter().map(|r| r.role_name.as_str()).collect();
        assert_eq!(names, vec!["Lead", "Researcher"]);
    }

    #[tokio::test]
    async fn test_outsider_cannot_read_project() {
        let seed = seed().await;
        let session = seed.repo.session(&seed.outsider_id);

        let result = session
            .get_member_detail(&seed.viewer_member, &seed.project_id)
            .await
            .unwrap();
        assert_eq!(failure_code(result).as_deref(), Some("FORBIDDEN"));
    }

    #[tokio::test]
    async fn test_member_detail_includes_profile_and_role() {
        let seed = seed().await;
        let session = seed.repo.session(&seed.viewer_id);

        let result = session
            .get_member_detail(&seed.viewer_member, &seed.project_id)
            .await
            .unwrap();
        let OperationResult::Success(Some(member)) = result else {
            panic!("expected member");
        };
        assert_eq!(member.role_name.as_deref(), Some("Researcher"));
        assert_eq!(member.contact_email(), Some("ana@example.com"));
        assert_eq!(member.display_name().as_deref(), Some("Ana Lee"));

        let missing = session
            .get_member_detail("missing", &seed.project_id)
            .await
            .unwrap();
        assert_eq!(missing, OperationResult::Success(None));
    }

    #[tokio::test]
    async fn test_non_manager_cannot_write() {
        let seed = seed().await;
        let session = seed.repo.session(&seed.viewer_id);

        let result = session
            .remove_member(&seed.project_id, &seed.viewer_member)
            .await
            .unwrap();
        assert_eq!(failure_code(result).as_deref(), Some("FORBIDDEN"));
    }

    #[tokio::test]
    async fn test_add_member_error_codes() {
        let seed = seed().await;
        let session = seed.repo.session(&seed.manager_id);

        let request = |email: &str, role: &str| AddMemberRequest {
            project_id: seed.project_id.clone(),
            user_email: email.to_string(),
            role_id: role.to_string(),
            initial_profile: None,
        };

        let missing = session
            .add_member(&request("ghost@example.com", &seed.researcher_role))
            .await
            .unwrap();
        assert_eq!(failure_code(missing).as_deref(), Some("USER_NOT_FOUND"));

        let duplicate = session
            .add_member(&request("ana@example.com", &seed.researcher_role))
            .await
            .unwrap();
        assert_eq!(failure_code(duplicate).as_deref(), Some("ALREADY_MEMBER"));

        let bad_role = session
            .add_member(&request("new@example.com", "not-a-role"))
            .await
            .unwrap();
        assert_eq!(failure_code(bad_role).as_deref(), Some("INVALID_ROLE"));
    }

    #[tokio::test]
    async fn test_add_member_after_concurrent_insert_is_already_member() {
        let seed = seed().await;
        let session = seed.repo.session(&seed.manager_id);
        let new_user = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind("new@example.com")
            .fetch_one(&session.pool)
            .await
            .unwrap()
            .get::<String, _>("id");

        // Another manager's insert lands first.
        let existing = seed
            .repo
            .insert_membership(&seed.project_id, &new_user, &seed.lead_role)
            .await
            .unwrap();

        let result = session
            .add_member(&AddMemberRequest {
                project_id: seed.project_id.clone(),
                user_email: "NEW@example.com".to_string(),
                role_id: seed.researcher_role.clone(),
                initial_profile: None,
            })
            .await
            .unwrap();
        assert_eq!(failure_code(result).as_deref(), Some("ALREADY_MEMBER"));

        let member = session
            .get_member_detail(&existing, &seed.project_id)
            .await
            .unwrap();
        let OperationResult::Success(Some(member)) = member else {
            panic!("expected member");
        };
        assert_eq!(member.project_role_id, seed.lead_role);
    }

    #[tokio::test]
    async fn test_add_member_seeds_profile() {
        let seed = seed().await;
        let session = seed.repo.session(&seed.manager_id);

        let mut initial = ProfilePatch::default();
        initial.set(ProfileField::FirstName, "Nico");
        initial.set(ProfileField::Language, "pt");

        let result = session
            .add_member(&AddMemberRequest {
                project_id: seed.project_id.clone(),
                user_email: "NEW@example.com".to_string(),
                role_id: seed.researcher_role.clone(),
                initial_profile: Some(initial),
            })
            .await
            .unwrap();
        let OperationResult::Success(member) = result else {
            panic!("expected member");
        };

        let profile = member.profile.unwrap();
        assert_eq!(profile.first_name.as_deref(), Some("Nico"));
        assert_eq!(profile.preferred_language.as_deref(), Some("pt"));
        assert_eq!(profile.public_contact_email.as_deref(), Some("new@example.com"));
        assert_eq!(member.role_name.as_deref(), Some("Researcher"));
    }

    #[tokio::test]
    async fn test_add_member_keeps_existing_profile_values() {
        let seed = seed().await;
        let session = seed.repo.session(&seed.manager_id);

        // Ana already has a profile; remove and re-add her with other names.
        session
            .remove_member(&seed.project_id, &seed.viewer_member)
            .await
            .unwrap();

        let mut initial = ProfilePatch::default();
        initial.set(ProfileField::FirstName, "Ignored");
        initial.set(ProfileField::Institution, "UdeC");

        let result = session
            .add_member(&AddMemberRequest {
                project_id: seed.project_id.clone(),
                user_email: "ana@example.com".to_string(),
                role_id: seed.researcher_role.clone(),
                initial_profile: Some(initial),
            })
            .await
            .unwrap();
        let OperationResult::Success(member) = result else {
            panic!("expected member");
        };

        let profile = member.profile.unwrap();
        assert_eq!(profile.first_name.as_deref(), Some("Ana"));
        assert_eq!(profile.primary_institution.as_deref(), Some("UdeC"));
    }

    #[tokio::test]
    async fn test_update_applies_role_and_profile() {
        let seed = seed().await;
        let session = seed.repo.session(&seed.manager_id);

        let mut patch = ProfilePatch::default();
        patch.set(ProfileField::LastName, "Lee-Park");

        let result = session
            .update_member(&UpdateMemberRequest {
                project_id: seed.project_id.clone(),
                project_member_id: seed.viewer_member.clone(),
                profile_updates: Some(patch),
                member_updates: Some(RoleChange {
                    new_role_id: seed.lead_role.clone(),
                }),
            })
            .await
            .unwrap();
        assert!(result.is_success());

        let OperationResult::Success(Some(member)) = session
            .get_member_detail(&seed.viewer_member, &seed.project_id)
            .await
            .unwrap()
        else {
            panic!("expected member");
        };
        assert_eq!(member.project_role_id, seed.lead_role);
        let profile = member.profile.unwrap();
        assert_eq!(profile.last_name.as_deref(), Some("Lee-Park"));
        assert_eq!(profile.first_name.as_deref(), Some("Ana"));
        assert_eq!(profile.user_id, seed.viewer_id);
    }

    #[tokio::test]
    async fn test_update_with_foreign_role_changes_nothing() {
        let seed = seed().await;
        let session = seed.repo.session(&seed.manager_id);

        let mut patch = ProfilePatch::default();
        patch.set(ProfileField::FirstName, "Changed");

        let result = session
            .update_member(&UpdateMemberRequest {
                project_id: seed.project_id.clone(),
                project_member_id: seed.viewer_member.clone(),
                profile_updates: Some(patch),
                member_updates: Some(RoleChange {
                    new_role_id: "elsewhere".to_string(),
                }),
            })
            .await
            .unwrap();
        assert_eq!(failure_code(result).as_deref(), Some("INVALID_ROLE"));

        let OperationResult::Success(Some(member)) = session
            .get_member_detail(&seed.viewer_member, &seed.project_id)
            .await
            .unwrap()
        else {
            panic!("expected member");
        };
        assert_eq!(member.project_role_id, seed.researcher_role);
        assert_eq!(member.profile.unwrap().first_name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_remove_member_twice() {
        let seed = seed().await;
        let session = seed.repo.session(&seed.manager_id);

        let first = session
            .remove_member(&seed.project_id, &seed.viewer_member)
            .await
            .unwrap();
        assert!(first.is_success());

        let second = session
            .remove_member(&seed.project_id, &seed.viewer_member)
            .await
            .unwrap();
        assert_eq!(failure_code(second).as_deref(), Some("NOT_FOUND"));
    }
}
