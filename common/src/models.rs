// Domain models: companies, jobs, users, applications

use crate::sql::{FieldSet, WhereBuilder, WhereClause};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// Company Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// Company with the jobs it posts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<CompanyJob>,
}

/// Job summary nested under a company
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CompanyJob {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub handle: Option<Option<serde_json::Value>>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub num_employees: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_url: Option<Option<String>>,
}

impl CompanyUpdate {
    pub fn into_field_set(self) -> FieldSet {
        let mut fields = FieldSet::new();
        if let Some(name) = self.name {
            fields.push("name", name);
        }
        if let Some(description) = self.description {
            fields.push("description", description);
        }
        if let Some(num_employees) = self.num_employees {
            fields.push("numEmployees", num_employees);
        }
        if let Some(logo_url) = self.logo_url {
            fields.push("logoUrl", logo_url);
        }
        fields
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyFilter {
    pub name_like: Option<String>,
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
}

impl CompanyFilter {
    pub fn where_clause(&self) -> WhereClause {
        let mut builder = WhereBuilder::new();
        if let Some(name) = self.name_like.as_deref().filter(|n| !n.is_empty()) {
            builder.push_param("name ILIKE $", format!("%{}%", name));
        }
        if let Some(min) = self.min_employees {
            builder.push_param("num_employees >= $", min);
        }
        if let Some(max) = self.max_employees {
            builder.push_param("num_employees <= $", max);
        }
        builder.build()
    }
}

// ============================================================================
// Job Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// Partial job update. `id` and `companyHandle` are accepted by the parser only so
/// that the model can reject them explicitly; a present key counts even when `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub id: Option<Option<serde_json::Value>>,
    #[serde(default, deserialize_with = "double_option")]
    pub company_handle: Option<Option<serde_json::Value>>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub equity: Option<Option<Decimal>>,
}

impl JobUpdate {
    pub fn touches_immutable_fields(&self) -> bool {
        self.id.is_some() || self.company_handle.is_some()
    }

    pub fn into_field_set(self) -> FieldSet {
        let mut fields = FieldSet::new();
        if let Some(title) = self.title {
            fields.push("title", title);
        }
        if let Some(salary) = self.salary {
            fields.push("salary", salary);
        }
        if let Some(equity) = self.equity {
            fields.push("equity", equity);
        }
        fields
    }
}

/// Job search criteria
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobFilter {
    pub title: Option<String>,
    pub min_salary: Option<i32>,
    pub has_equity: Option<bool>,
}

impl JobFilter {
    /// `hasEquity=false` adds no predicate at all; it is not "equity = 0".
    pub fn where_clause(&self) -> WhereClause {
        let mut builder = WhereBuilder::new();
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            builder.push_param("title ILIKE $", format!("%{}%", title));
        }
        if let Some(min_salary) = self.min_salary {
            builder.push_param("salary >= $", min_salary);
        }
        if self.has_equity == Some(true) {
            builder.push_raw("equity > 0");
        }
        builder.build()
    }
}

// ============================================================================
// User Models
// ============================================================================

/// User as exposed to API consumers; the password hash never leaves the repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// User with the ids of the jobs they applied to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub jobs: Vec<i32>,
}

/// Admin-side user creation; may grant admin rights
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Self-service signup; always creates a non-admin user
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<RegisterUser> for NewUser {
    fn from(reg: RegisterUser) -> Self {
        Self {
            username: reg.username,
            password: reg.password,
            first_name: reg.first_name,
            last_name: reg.last_name,
            email: reg.email,
            is_admin: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub username: Option<Option<serde_json::Value>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

impl UserUpdate {
    /// Field set with `password` already replaced by its hash
    pub fn into_field_set(self, password_hash: Option<String>) -> FieldSet {
        let mut fields = FieldSet::new();
        if let Some(first_name) = self.first_name {
            fields.push("firstName", first_name);
        }
        if let Some(last_name) = self.last_name {
            fields.push("lastName", last_name);
        }
        if let Some(hash) = password_hash {
            fields.push("password", hash);
        }
        if let Some(email) = self.email {
            fields.push("email", email);
        }
        fields
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// JWT token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserClaims {
    pub username: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub exp: i64, // Expiration time (Unix timestamp)
    pub iat: i64, // Issued at (Unix timestamp)
}
