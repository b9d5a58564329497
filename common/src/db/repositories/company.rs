// Company repository implementation

use crate::db::DbPool;
use crate::errors::{AppError, DatabaseError};
use crate::models::{Company, CompanyDetail, CompanyFilter, CompanyJob, CompanyUpdate, NewCompany};
use crate::sql::{bind_all, sql_for_partial_update, ColumnMap};
use tracing::instrument;

const COMPANY_COLUMNS: ColumnMap =
    ColumnMap::new(&[("numEmployees", "num_employees"), ("logoUrl", "logo_url")]);

const COMPANY_FIELDS: &str = "handle, name, description, num_employees, logo_url";

/// Repository for company-related database operations
#[derive(Clone)]
pub struct CompanyRepository {
    pool: DbPool,
}

impl CompanyRepository {
    /// Create a new CompanyRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a company; a taken handle is a BadRequest
    #[instrument(skip(self, company), fields(handle = %company.handle))]
    pub async fn create(&self, company: &NewCompany) -> Result<Company, AppError> {
        let created = sqlx::query_as::<_, Company>(&format!(
            r#"
            INSERT INTO companies (handle, name, description, num_employees, logo_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            COMPANY_FIELDS
        ))
        .bind(&company.handle)
        .bind(&company.name)
        .bind(&company.description)
        .bind(company.num_employees)
        .bind(&company.logo_url)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::DuplicateKey(_) => {
                AppError::bad_request(format!("Duplicate company: {}", company.handle))
            }
            other => other.into(),
        })?;

        tracing::info!(handle = %created.handle, "Company created");
        Ok(created)
    }

    /// Find companies matching the filter, ordered by name
    #[instrument(skip(self))]
    pub async fn find_all(&self, filter: &CompanyFilter) -> Result<Vec<Company>, AppError> {
        let where_clause = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM companies{} ORDER BY name",
            COMPANY_FIELDS, where_clause.sql
        );

        let companies = bind_all(sqlx::query_as::<_, Company>(&sql), where_clause.values)
            .fetch_all(self.pool.pool())
            .await?;

        tracing::debug!(count = companies.len(), "Companies listed");
        Ok(companies)
    }

    /// Find a company by handle, along with its jobs ordered by id
    #[instrument(skip(self))]
    pub async fn get(&self, handle: &str) -> Result<CompanyDetail, AppError> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE handle = $1",
            COMPANY_FIELDS
        ))
        .bind(handle)
        .fetch_optional(self.pool.pool())
        .await?
        .ok_or_else(|| AppError::not_found(format!("No company: {}", handle)))?;

        let jobs = sqlx::query_as::<_, CompanyJob>(
            r#"
            SELECT id, title, salary, equity
            FROM jobs
            WHERE company_handle = $1
            ORDER BY id
            "#,
        )
        .bind(handle)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(CompanyDetail { company, jobs })
    }

    /// Apply a partial update; the handle itself cannot change
    #[instrument(skip(self, patch))]
    pub async fn update(&self, handle: &str, patch: CompanyUpdate) -> Result<Company, AppError> {
        if patch.handle.is_some() {
            return Err(AppError::bad_request("Not allowed to change handle"));
        }

        let set = sql_for_partial_update(patch.into_field_set(), &COMPANY_COLUMNS)?;
        let sql = format!(
            "UPDATE companies SET {} WHERE handle = ${} RETURNING {}",
            set.clause,
            set.next_placeholder(),
            COMPANY_FIELDS
        );

        let updated = bind_all(sqlx::query_as::<_, Company>(&sql), set.values)
            .bind(handle)
            .fetch_optional(self.pool.pool())
            .await?
            .ok_or_else(|| AppError::not_found(format!("No company: {}", handle)))?;

        tracing::info!(handle = %handle, "Company updated");
        Ok(updated)
    }

    /// Delete a company; its jobs go with it
    #[instrument(skip(self))]
    pub async fn remove(&self, handle: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE handle = $1")
            .bind(handle)
            .execute(self.pool.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("No company: {}", handle)));
        }

        tracing::info!(handle = %handle, "Company deleted");
        Ok(())
    }
}
