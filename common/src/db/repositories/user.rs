// User repository implementation, including job applications

use crate::db::DbPool;
use crate::errors::{AppError, DatabaseError};
use crate::models::{NewUser, User, UserDetail, UserUpdate};
use crate::sql::{bind_all, sql_for_partial_update, ColumnMap};
use sqlx::FromRow;
use tracing::instrument;

const USER_COLUMNS: ColumnMap =
    ColumnMap::new(&[("firstName", "first_name"), ("lastName", "last_name")]);

const USER_FIELDS: &str = "username, first_name, last_name, email, is_admin";

#[derive(FromRow)]
struct UserWithPassword {
    #[sqlx(flatten)]
    user: User,
    password: String,
}

/// Repository for user-related database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a user whose password has already been hashed
    #[instrument(skip(self, user, password_hash), fields(username = %user.username))]
    pub async fn create(&self, user: &NewUser, password_hash: &str) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password, first_name, last_name, email, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_FIELDS
        ))
        .bind(&user.username)
        .bind(password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.is_admin)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::DuplicateKey(_) => {
                AppError::bad_request(format!("Duplicate username: {}", user.username))
            }
            other => other.into(),
        })?;

        tracing::info!(username = %created.username, is_admin = created.is_admin, "User created");
        Ok(created)
    }

    /// Find a user together with the stored password hash
    #[instrument(skip(self))]
    pub async fn find_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, AppError> {
        let row = sqlx::query_as::<_, UserWithPassword>(&format!(
            "SELECT {}, password FROM users WHERE username = $1",
            USER_FIELDS
        ))
        .bind(username)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(row.map(|r| (r.user, r.password)))
    }

    /// Find all users, ordered by username
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY username",
            USER_FIELDS
        ))
        .fetch_all(self.pool.pool())
        .await?;

        Ok(users)
    }

    /// Find a user with the ids of the jobs they applied to
    #[instrument(skip(self))]
    pub async fn get(&self, username: &str) -> Result<UserDetail, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_FIELDS
        ))
        .bind(username)
        .fetch_optional(self.pool.pool())
        .await?
        .ok_or_else(|| AppError::not_found(format!("No user: {}", username)))?;

        let jobs: Vec<i32> = sqlx::query_scalar(
            "SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id",
        )
        .bind(username)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(UserDetail { user, jobs })
    }

    /// Apply a partial update
    ///
    /// `password_hash` replaces the plaintext password carried by the patch.
    #[instrument(skip(self, patch, password_hash))]
    pub async fn update(
        &self,
        username: &str,
        patch: UserUpdate,
        password_hash: Option<String>,
    ) -> Result<User, AppError> {
        if patch.username.is_some() {
            return Err(AppError::bad_request("Not allowed to change username"));
        }

        let set = sql_for_partial_update(patch.into_field_set(password_hash), &USER_COLUMNS)?;
        let sql = format!(
            "UPDATE users SET {} WHERE username = ${} RETURNING {}",
            set.clause,
            set.next_placeholder(),
            USER_FIELDS
        );

        let updated = bind_all(sqlx::query_as::<_, User>(&sql), set.values)
            .bind(username)
            .fetch_optional(self.pool.pool())
            .await?
            .ok_or_else(|| AppError::not_found(format!("No user: {}", username)))?;

        tracing::info!(username = %username, "User updated");
        Ok(updated)
    }

    /// Delete a user; their applications go with them
    #[instrument(skip(self))]
    pub async fn remove(&self, username: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(self.pool.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("No user: {}", username)));
        }

        tracing::info!(username = %username, "User deleted");
        Ok(())
    }

    /// Record that a user applied to a job
    ///
    /// Missing job or user is NotFound; applying twice is rejected by the
    /// `applications` primary key and surfaces as BadRequest.
    #[instrument(skip(self))]
    pub async fn apply_to_job(&self, username: &str, job_id: i32) -> Result<(), AppError> {
        let job: Option<(i32,)> = sqlx::query_as("SELECT id FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(self.pool.pool())
            .await?;
        if job.is_none() {
            return Err(AppError::not_found(format!("No job: {}", job_id)));
        }

        let user: Option<(String,)> =
            sqlx::query_as("SELECT username FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(self.pool.pool())
                .await?;
        if user.is_none() {
            return Err(AppError::not_found(format!("No username: {}", username)));
        }

        sqlx::query("INSERT INTO applications (job_id, username) VALUES ($1, $2)")
            .bind(job_id)
            .bind(username)
            .execute(self.pool.pool())
            .await
            .map_err(|e| match DatabaseError::from(e) {
                DatabaseError::DuplicateKey(_) => {
                    AppError::bad_request(format!("Already applied to job: {}", job_id))
                }
                other => other.into(),
            })?;

        tracing::info!(username = %username, job_id = job_id, "Job application recorded");
        Ok(())
    }
}
