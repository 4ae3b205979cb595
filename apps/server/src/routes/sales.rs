//! Sale endpoints.
//!
//! ```text
//! POST   /sales               commit          201 | 200 (replay) | 400 | 404 | 409 | 500
//! GET    /sales               list            200 | 400
//! GET    /sales/{id}          get             200 | 404
//! PATCH  /sales/{id}/status   update_status   200 | 400 | 404
//! POST   /sales/{id}/void     void            200 | 400 | 404
//! DELETE /sales/{id}          delete          200 | 404
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use minipos_core::validation::{validate_payment_method, validate_status};
use minipos_core::{
    NewSale, PaymentMethod, Sale, SaleWithItems, ValidationError, MAX_LIST_LIMIT,
};
use minipos_db::SaleFilter;
use minipos_sales::CommitContext;

use crate::error::ApiError;
use crate::AppState;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
pub const CASHIER_HEADER: &str = "x-cashier-id";

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ListSalesQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub customer_id: Option<String>,
    pub cashier_id: Option<String>,
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct DeleteSaleResponse {
    pub id: String,
    pub stock_restored: bool,
}

// -- Handlers --

/// POST /sales: commit a sale atomically.
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<NewSale>, JsonRejection>,
) -> Result<(StatusCode, Json<SaleWithItems>), ApiError> {
    let Json(request) = body?;
    let ctx = CommitContext {
        cashier_id: header(&headers, CASHIER_HEADER)?,
        idempotency_key: header(&headers, IDEMPOTENCY_KEY_HEADER)?,
    };

    let outcome = state.engine.commit(&request, ctx).await?;
    let status = if outcome.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome.sale)))
}

/// GET /sales: one page of sales, newest first.
#[tracing::instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListSalesQuery>, QueryRejection>,
) -> Result<Json<Vec<Sale>>, ApiError> {
    let Query(query) = query?;
    let filter = SaleFilter {
        start_date: parse_date("start_date", query.start_date.as_deref())?,
        end_date: parse_date("end_date", query.end_date.as_deref())?,
        customer_id: non_blank(query.customer_id),
        cashier_id: non_blank(query.cashier_id),
        status: non_blank(query.status)
            .map(|raw| validate_status(&raw))
            .transpose()?,
        payment_method: non_blank(query.payment_method)
            .map(|raw| validate_payment_method(Some(&raw), &PaymentMethod::ALL))
            .transpose()?,
        limit: check_range("limit", query.limit, 1, MAX_LIST_LIMIT)?,
        offset: check_range("offset", query.offset, 0, i64::MAX)?,
    };

    Ok(Json(state.engine.list(&filter).await?))
}

/// GET /sales/{id}: one sale with its line items.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SaleWithItems>, ApiError> {
    Ok(Json(state.engine.get(&id).await?))
}

/// PATCH /sales/{id}/status: move a sale along the status table.
#[tracing::instrument(skip(state, body))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<SaleWithItems>, ApiError> {
    let Json(body) = body?;
    let target = validate_status(&body.status)?;

    Ok(Json(state.engine.update_status(&id, target).await?))
}

/// POST /sales/{id}/void: restore stock and cancel or refund.
#[tracing::instrument(skip(state))]
pub async fn void(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SaleWithItems>, ApiError> {
    Ok(Json(state.engine.void(&id).await?))
}

/// DELETE /sales/{id}: hard delete, restoring stock unless a void already did.
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteSaleResponse>, ApiError> {
    let deleted = state.engine.delete(&id).await?;
    Ok(Json(DeleteSaleResponse {
        id: deleted.id,
        stock_restored: deleted.stock_restored,
    }))
}

// -- Helpers --

fn header(headers: &HeaderMap, name: &str) -> Result<Option<String>, ApiError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.to_string()))
            .map_err(|_| ApiError::validation(format!("{name} header must be visible ASCII"))),
    }
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::validation(format!("{field} must be a YYYY-MM-DD date"))),
    }
}

fn check_range(
    field: &str,
    value: Option<i64>,
    min: i64,
    max: i64,
) -> Result<Option<i64>, ApiError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        }
        .into()),
        other => Ok(other),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
