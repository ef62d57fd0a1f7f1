//! Session lifecycle handlers: create from OCR output, read, adjust totals,
//! discard.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use service_core::error::AppError;

use crate::dtos::{CreateSplitRequest, ErrorResponse, SplitResponse, UpdateTotalsRequest};
use crate::handlers::{domain_err, session_or_404};
use crate::models::{ReceiptTotals, SplitSession, TipPolicy};
use crate::services::metrics::{ITEMS_COERCED_TOTAL, SPLITS_CREATED_TOTAL};
use crate::services::normalizer;
use crate::AppState;

// flagged when the upstream subtotal strays by more than a cent
const SUBTOTAL_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

fn validate_tax_rate(rate: Decimal) -> Result<(), AppError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "tax_rate_percent must be between 0 and 100"
        )));
    }
    Ok(())
}

fn validate_tip(tip: &TipPolicy) -> Result<(), AppError> {
    if tip.is_negative() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Tip cannot be negative"
        )));
    }
    Ok(())
}

/// Create a split session from parsed receipt output.
#[utoipa::path(
    post,
    path = "/splits",
    request_body = CreateSplitRequest,
    responses(
        (status = 201, description = "Split session created", body = SplitResponse),
        (status = 400, description = "Uncoercible tax rate or negative tip", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Session store is full", body = ErrorResponse)
    ),
    tag = "Splits"
)]
pub async fn create_split(
    State(state): State<AppState>,
    Json(req): Json<CreateSplitRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let normalized = normalizer::normalize_items(&req.items);
    let computed_subtotal: Decimal = normalized.items.iter().map(|i| i.line_total()).sum();

    let tax_rate_percent = match req.tax_rate_percent.as_ref() {
        None => Decimal::ZERO,
        Some(value) => normalizer::coerce_decimal(Some(value)).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Invalid tax_rate_percent"))
        })?,
    };
    validate_tax_rate(tax_rate_percent)?;

    let tip = req.tip.unwrap_or_default();
    validate_tip(&tip)?;

    let claimed_subtotal = normalizer::coerce_decimal(req.subtotal.as_ref());
    let subtotal_mismatch = claimed_subtotal
        .map(|claimed| (claimed - computed_subtotal).abs() > SUBTOTAL_TOLERANCE)
        .unwrap_or(false);
    if subtotal_mismatch {
        tracing::warn!(
            claimed = %claimed_subtotal.unwrap_or_default(),
            computed = %computed_subtotal,
            "Upstream subtotal disagrees with recomputed subtotal; using recomputed value"
        );
    }

    let totals = ReceiptTotals {
        subtotal: computed_subtotal,
        tax_rate_percent,
        tip,
    };
    let session = SplitSession::new(
        req.store_name,
        normalized.items,
        totals,
        subtotal_mismatch,
        normalized.coerced_records,
    );

    SPLITS_CREATED_TOTAL.inc();
    ITEMS_COERCED_TOTAL.inc_by(normalized.coerced_records as u64);

    let response = SplitResponse::from_session(&session);
    let split_id = state.store.insert(session)?;

    tracing::info!(
        split_id = %split_id,
        items = response.items.len(),
        coerced = response.warnings,
        "Split session created"
    );

    Ok((StatusCode::CREATED, Json(response)))
}

/// Get the current session state.
#[utoipa::path(
    get,
    path = "/splits/{split_id}",
    params(("split_id" = Uuid, Path, description = "Split session id")),
    responses(
        (status = 200, description = "Current session state", body = SplitResponse),
        (status = 404, description = "Split not found", body = ErrorResponse)
    ),
    tag = "Splits"
)]
pub async fn get_split(
    State(state): State<AppState>,
    Path(split_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_or_404(&state, split_id)?;
    let session = session.lock().await;
    Ok(Json(SplitResponse::from_session(&session)))
}

/// Adjust the tax rate and/or tip policy.
#[utoipa::path(
    patch,
    path = "/splits/{split_id}/totals",
    params(("split_id" = Uuid, Path, description = "Split session id")),
    request_body = UpdateTotalsRequest,
    responses(
        (status = 200, description = "Totals updated", body = SplitResponse),
        (status = 404, description = "Split not found", body = ErrorResponse),
        (status = 409, description = "Split already finalized", body = ErrorResponse)
    ),
    tag = "Splits"
)]
pub async fn update_totals(
    State(state): State<AppState>,
    Path(split_id): Path<Uuid>,
    Json(req): Json<UpdateTotalsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(rate) = req.tax_rate_percent {
        validate_tax_rate(rate)?;
    }
    if let Some(ref tip) = req.tip {
        validate_tip(tip)?;
    }

    let session = session_or_404(&state, split_id)?;
    let mut session = session.lock().await;
    session
        .set_totals(req.tax_rate_percent, req.tip)
        .map_err(domain_err)?;

    Ok(Json(SplitResponse::from_session(&session)))
}

/// Discard a session.
#[utoipa::path(
    delete,
    path = "/splits/{split_id}",
    params(("split_id" = Uuid, Path, description = "Split session id")),
    responses(
        (status = 204, description = "Split discarded"),
        (status = 404, description = "Split not found", body = ErrorResponse)
    ),
    tag = "Splits"
)]
pub async fn delete_split(
    State(state): State<AppState>,
    Path(split_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.remove(split_id) {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Split {} not found",
            split_id
        )));
    }
    tracing::info!(split_id = %split_id, "Split session discarded");
    Ok(StatusCode::NO_CONTENT)
}
