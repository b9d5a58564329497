// Job repository implementation

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::{Job, JobFilter, JobUpdate, NewJob};
use crate::sql::{bind_all, sql_for_partial_update, ColumnMap};
use tracing::instrument;

/// Only the mutable job columns; all of them share their field name
const JOB_COLUMNS: ColumnMap = ColumnMap::new(&[]);

const JOB_FIELDS: &str = "id, title, salary, equity, company_handle";

/// Repository for job-related database operations
#[derive(Clone)]
pub struct JobRepository {
    pool: DbPool,
}

impl JobRepository {
    /// Create a new JobRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a job for an existing company
    ///
    /// Fails with BadRequest (and inserts nothing) when the company does not exist.
    #[instrument(skip(self, job), fields(company_handle = %job.company_handle))]
    pub async fn create(&self, job: &NewJob) -> Result<Job, AppError> {
        let company: Option<(String,)> =
            sqlx::query_as("SELECT handle FROM companies WHERE handle = $1")
                .bind(&job.company_handle)
                .fetch_optional(self.pool.pool())
                .await?;

        if company.is_none() {
            return Err(AppError::bad_request(format!(
                "Company not found: {}",
                job.company_handle
            )));
        }

        let created = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (title, salary, equity, company_handle)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            JOB_FIELDS
        ))
        .bind(&job.title)
        .bind(job.salary)
        .bind(job.equity)
        .bind(&job.company_handle)
        .fetch_one(self.pool.pool())
        .await?;

        tracing::info!(job_id = created.id, company_handle = %created.company_handle, "Job created");
        Ok(created)
    }

    /// Find jobs matching the filter, ordered by id
    #[instrument(skip(self))]
    pub async fn find_all(&self, filter: &JobFilter) -> Result<Vec<Job>, AppError> {
        let where_clause = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM jobs{} ORDER BY id",
            JOB_FIELDS, where_clause.sql
        );

        let jobs = bind_all(sqlx::query_as::<_, Job>(&sql), where_clause.values)
            .fetch_all(self.pool.pool())
            .await?;

        tracing::debug!(count = jobs.len(), "Jobs listed");
        Ok(jobs)
    }

    /// Find a job by id
    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<Job, AppError> {
        sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = $1", JOB_FIELDS))
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?
            .ok_or_else(|| AppError::not_found(format!("No job with id: {}", id)))
    }

    /// Apply a partial update
    ///
    /// Patches naming `id` or `companyHandle` are rejected before any query runs.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i32, patch: JobUpdate) -> Result<Job, AppError> {
        if patch.touches_immutable_fields() {
            return Err(AppError::bad_request(
                "Not allowed to change id or companyHandle",
            ));
        }

        let set = sql_for_partial_update(patch.into_field_set(), &JOB_COLUMNS)?;
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ${} RETURNING {}",
            set.clause,
            set.next_placeholder(),
            JOB_FIELDS
        );

        let updated = bind_all(sqlx::query_as::<_, Job>(&sql), set.values)
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?
            .ok_or_else(|| AppError::not_found(format!("No job with id: {}", id)))?;

        tracing::info!(job_id = id, "Job updated");
        Ok(updated)
    }

    /// Delete a job
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("No job with id: {}", id)));
        }

        tracing::info!(job_id = id, "Job deleted");
        Ok(())
    }
}
