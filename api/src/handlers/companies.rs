use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::handlers::{ErrorResponse, PathParams, ValidatedJson, ValidatedQuery};
use crate::state::AppState;
use common::models::{CompanyFilter, CompanyUpdate, NewCompany};

/// Create a company (admin)
#[tracing::instrument(skip(state, company))]
pub async fn create_company(
    State(state): State<AppState>,
    ValidatedJson(company): ValidatedJson<NewCompany>,
) -> Result<(StatusCode, Json<Value>), ErrorResponse> {
    let company = state.companies().create(&company).await?;
    Ok((StatusCode::CREATED, Json(json!({ "company": company }))))
}

/// List companies matching `?nameLike&minEmployees&maxEmployees`
#[tracing::instrument(skip(state))]
pub async fn list_companies(
    State(state): State<AppState>,
    ValidatedQuery(filter): ValidatedQuery<CompanyFilter>,
) -> Result<Json<Value>, ErrorResponse> {
    let companies = state.companies().find_all(&filter).await?;
    Ok(Json(json!({ "companies": companies })))
}

/// Company details including its jobs
#[tracing::instrument(skip(state))]
pub async fn get_company(
    State(state): State<AppState>,
    PathParams(handle): PathParams<String>,
) -> Result<Json<Value>, ErrorResponse> {
    let company = state.companies().get(&handle).await?;
    Ok(Json(json!({ "company": company })))
}

#[tracing::instrument(skip(state, patch))]
pub async fn update_company(
    State(state): State<AppState>,
    PathParams(handle): PathParams<String>,
    ValidatedJson(patch): ValidatedJson<CompanyUpdate>,
) -> Result<Json<Value>, ErrorResponse> {
    let company = state.companies().update(&handle, patch).await?;
    Ok(Json(json!({ "company": company })))
}

#[tracing::instrument(skip(state))]
pub async fn delete_company(
    State(state): State<AppState>,
    PathParams(handle): PathParams<String>,
) -> Result<Json<Value>, ErrorResponse> {
    state.companies().remove(&handle).await?;
    Ok(Json(json!({ "deleted": handle })))
}
