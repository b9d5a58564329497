// Value rules applied to request payloads after deserialization

use crate::errors::ValidationError;
use crate::models::{
    CompanyFilter, CompanyUpdate, Credentials, JobFilter, JobUpdate, NewCompany, NewJob, NewUser,
    RegisterUser, UserUpdate,
};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid");
    static ref HANDLE_RE: Regex = Regex::new(r"^[a-z0-9-]+$").expect("handle regex is valid");
    static ref URL_RE: Regex = Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("url regex is valid");
}

/// Payload value rules beyond what the type system already guarantees
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::invalid(field, "must not be empty"));
    }
    Ok(())
}

fn length_between(field: &str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::invalid(
            field,
            format!("length must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

fn non_negative(field: &str, value: i32) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::invalid(field, "must be >= 0"));
    }
    Ok(())
}

fn equity_in_range(value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ValidationError::invalid("equity", "must be between 0 and 1"));
    }
    Ok(())
}

fn valid_handle(value: &str) -> Result<(), ValidationError> {
    length_between("handle", value, 1, 25)?;
    if !HANDLE_RE.is_match(value) {
        return Err(ValidationError::invalid(
            "handle",
            "may only contain lowercase letters, digits and dashes",
        ));
    }
    Ok(())
}

fn valid_url(field: &str, value: &str) -> Result<(), ValidationError> {
    if !URL_RE.is_match(value) {
        return Err(ValidationError::invalid(field, "must be an http(s) URL"));
    }
    Ok(())
}

fn valid_email(value: &str) -> Result<(), ValidationError> {
    length_between("email", value, 6, 60)?;
    if !EMAIL_RE.is_match(value) {
        return Err(ValidationError::invalid("email", "must be a valid email address"));
    }
    Ok(())
}

fn valid_password(value: &str) -> Result<(), ValidationError> {
    length_between("password", value, 5, 20)
}

fn valid_name(field: &str, value: &str) -> Result<(), ValidationError> {
    length_between(field, value, 1, 30)
}

// ============================================================================
// Jobs
// ============================================================================

impl Validate for NewJob {
    fn validate(&self) -> Result<(), ValidationError> {
        non_empty("title", &self.title)?;
        if let Some(salary) = self.salary {
            non_negative("salary", salary)?;
        }
        if let Some(equity) = self.equity {
            equity_in_range(equity)?;
        }
        non_empty("companyHandle", &self.company_handle)
    }
}

impl Validate for JobUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            non_empty("title", title)?;
        }
        if let Some(Some(salary)) = self.salary {
            non_negative("salary", salary)?;
        }
        if let Some(Some(equity)) = self.equity {
            equity_in_range(equity)?;
        }
        Ok(())
    }
}

impl Validate for JobFilter {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(min_salary) = self.min_salary {
            non_negative("minSalary", min_salary)?;
        }
        Ok(())
    }
}

// ============================================================================
// Companies
// ============================================================================

impl Validate for NewCompany {
    fn validate(&self) -> Result<(), ValidationError> {
        valid_handle(&self.handle)?;
        non_empty("name", &self.name)?;
        if let Some(num_employees) = self.num_employees {
            non_negative("numEmployees", num_employees)?;
        }
        if let Some(logo_url) = &self.logo_url {
            valid_url("logoUrl", logo_url)?;
        }
        Ok(())
    }
}

impl Validate for CompanyUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            non_empty("name", name)?;
        }
        if let Some(Some(num_employees)) = self.num_employees {
            non_negative("numEmployees", num_employees)?;
        }
        if let Some(Some(logo_url)) = &self.logo_url {
            valid_url("logoUrl", logo_url)?;
        }
        Ok(())
    }
}

impl Validate for CompanyFilter {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(min) = self.min_employees {
            non_negative("minEmployees", min)?;
        }
        if let Some(max) = self.max_employees {
            non_negative("maxEmployees", max)?;
        }
        if let (Some(min), Some(max)) = (self.min_employees, self.max_employees) {
            if min > max {
                return Err(ValidationError::invalid(
                    "minEmployees",
                    "cannot be greater than maxEmployees",
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Users
// ============================================================================

impl Validate for NewUser {
    fn validate(&self) -> Result<(), ValidationError> {
        valid_name("username", &self.username)?;
        valid_password(&self.password)?;
        valid_name("firstName", &self.first_name)?;
        valid_name("lastName", &self.last_name)?;
        valid_email(&self.email)
    }
}

impl Validate for RegisterUser {
    fn validate(&self) -> Result<(), ValidationError> {
        valid_name("username", &self.username)?;
        valid_password(&self.password)?;
        valid_name("firstName", &self.first_name)?;
        valid_name("lastName", &self.last_name)?;
        valid_email(&self.email)
    }
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(first_name) = &self.first_name {
            valid_name("firstName", first_name)?;
        }
        if let Some(last_name) = &self.last_name {
            valid_name("lastName", last_name)?;
        }
        if let Some(password) = &self.password {
            valid_password(password)?;
        }
        if let Some(email) = &self.email {
            valid_email(email)?;
        }
        Ok(())
    }
}

impl Validate for Credentials {
    fn validate(&self) -> Result<(), ValidationError> {
        non_empty("username", &self.username)?;
        non_empty("password", &self.password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn new_job() -> NewJob {
        NewJob {
            title: "new".to_string(),
            salary: Some(100),
            equity: Some(Decimal::from_str("0.1").unwrap()),
            company_handle: "c1".to_string(),
        }
    }

    fn new_user() -> NewUser {
        NewUser {
            username: "new".to_string(),
            password: "password".to_string(),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            email: "new@email.com".to_string(),
            is_admin: false,
        }
    }

    #[test]
    fn test_valid_new_job() {
        assert!(new_job().validate().is_ok());
    }

    #[test]
    fn test_new_job_rejects_negative_salary() {
        let job = NewJob {
            salary: Some(-1),
            ..new_job()
        };
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_new_job_rejects_equity_above_one() {
        let job = NewJob {
            equity: Some(Decimal::from_str("1.1").unwrap()),
            ..new_job()
        };
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_job_update_allows_null_salary() {
        let update = JobUpdate {
            salary: Some(None),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_job_filter_rejects_negative_min_salary() {
        let filter = JobFilter {
            min_salary: Some(-5),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_company_handle_rules() {
        assert!(valid_handle("c1").is_ok());
        assert!(valid_handle("bauer-gallagher").is_ok());
        assert!(valid_handle("Upper").is_err());
        assert!(valid_handle("").is_err());
        assert!(valid_handle(&"a".repeat(26)).is_err());
    }

    #[test]
    fn test_company_filter_min_greater_than_max() {
        let filter = CompanyFilter {
            min_employees: Some(10),
            max_employees: Some(5),
            ..Default::default()
        };
        let err = filter.validate().unwrap_err();
        assert!(err.to_string().contains("minEmployees"));
    }

    #[test]
    fn test_company_logo_url_must_be_http() {
        let company = NewCompany {
            handle: "new".to_string(),
            name: "New".to_string(),
            description: "New Description".to_string(),
            num_employees: Some(10),
            logo_url: Some("not-a-url".to_string()),
        };
        assert!(company.validate().is_err());

        let company = NewCompany {
            logo_url: Some("http://new.img".to_string()),
            ..company
        };
        assert!(company.validate().is_ok());
    }

    #[test]
    fn test_valid_new_user() {
        assert!(new_user().validate().is_ok());
    }

    #[test]
    fn test_new_user_rejects_bad_email() {
        let user = NewUser {
            email: "not-an-email".to_string(),
            ..new_user()
        };
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_new_user_rejects_short_password() {
        let user = NewUser {
            password: "pw".to_string(),
            ..new_user()
        };
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_user_update_checks_only_supplied_fields() {
        assert!(UserUpdate::default().validate().is_ok());
        let update = UserUpdate {
            email: Some("bad".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_credentials_must_be_non_empty() {
        let creds = Credentials {
            username: String::new(),
            password: "password".to_string(),
        };
        assert!(creds.validate().is_err());
    }
}
