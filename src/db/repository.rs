//! Database repository: pool ownership, caller sessions and shared row mapping.

use sqlx::{Row, SqlitePool};

use super::MemberSession;
use crate::errors::AppError;
use crate::models::{MemberDetails, MemberProfile, ProjectContext, ProjectPermissions};

/// Columns selected for a member snapshot. Used with `MEMBER_JOINS`.
pub(crate) const MEMBER_COLUMNS: &str = r#"
    m.id AS project_member_id, m.user_id, m.project_role_id, m.joined_at, r.role_name,
    p.user_id AS profile_user_id, p.public_display_name, p.first_name, p.last_name,
    p.primary_institution, p.contact_phone, p.public_contact_email,
    p.preferred_language, p.pronouns, p.general_notes
"#;

pub(crate) const MEMBER_JOINS: &str = r#"
    FROM project_members m
    LEFT JOIN project_roles r ON r.id = m.project_role_id
    LEFT JOIN user_profiles p ON p.user_id = m.user_id
"#;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Data access handle acting on behalf of one user.
    pub fn session(&self, user_id: impl Into<String>) -> MemberSession {
        MemberSession::new(self.pool.clone(), user_id.into())
    }

    /// Build the project context for a caller.
    ///
    /// Callers without a membership get a context with no permissions; the
    /// session decides what they may actually read.
    pub async fn project_context(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<ProjectContext, AppError> {
        let permissions = caller_permissions(&self.pool, project_id, user_id)
            .await?
            .unwrap_or_default();
        Ok(ProjectContext::new(project_id, permissions))
    }
}

/// Permissions the user holds through their membership, `None` if not a member.
pub(crate) async fn caller_permissions(
    pool: &SqlitePool,
    project_id: &str,
    user_id: &str,
) -> Result<Option<ProjectPermissions>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT r.can_manage_master_data
        FROM project_members m
        JOIN project_roles r ON r.id = m.project_role_id
        WHERE m.project_id = ? AND m.user_id = ?
        "#,
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| ProjectPermissions {
        can_manage_master_data: row.get::<i32, _>("can_manage_master_data") != 0,
    }))
}

// ==================== ROW MAPPING ====================

pub(crate) fn member_from_row(row: &sqlx::sqlite::SqliteRow) -> MemberDetails {
    let profile_user_id: Option<String> = row.get("profile_user_id");

    let profile = profile_user_id.map(|user_id| MemberProfile {
        user_id,
        public_display_name: row.get("public_display_name"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        primary_institution: row.get("primary_institution"),
        contact_phone: row.get("contact_phone"),
        public_contact_email: row.get("public_contact_email"),
        preferred_language: row.get("preferred_language"),
        pronouns: row.get("pronouns"),
        general_notes: row.get("general_notes"),
    });

    MemberDetails {
        project_member_id: row.get("project_member_id"),
        user_id: row.get("user_id"),
        project_role_id: row.get("project_role_id"),
        role_name: row.get("role_name"),
        joined_at: row.get("joined_at"),
        profile,
    }
}

/// Provisioning helpers for tests. Users, projects and roles are managed
/// outside this module in production.
#[cfg(test)]
impl Repository {
    pub async fn insert_user(&self, email: &str) -> Result<String, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO users (id, email, created_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(email)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn insert_project(&self, name: &str) -> Result<String, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO projects (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn insert_role(
        &self,
        project_id: &str,
        role_name: &str,
        can_manage_master_data: bool,
    ) -> Result<String, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO project_roles (id, project_id, role_name, can_manage_master_data) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(project_id)
        .bind(role_name)
        .bind(can_manage_master_data as i32)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn insert_membership(
        &self,
        project_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<String, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO project_members (id, project_id, user_id, project_role_id, joined_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(project_id)
        .bind(user_id)
        .bind(role_id)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn insert_profile(
        &self,
        user_id: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_profiles (user_id, public_contact_email, first_name, last_name, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
