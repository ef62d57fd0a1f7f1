//! HTTP handlers for split-service.

pub mod assignment;
pub mod finalize;
pub mod metrics;
pub mod person;
pub mod split;

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use service_core::error::AppError;

use crate::models::{SplitError, SplitSession};
use crate::services::metrics::ERRORS_TOTAL;
use crate::AppState;

pub(crate) fn session_or_404(
    state: &AppState,
    split_id: Uuid,
) -> Result<Arc<Mutex<SplitSession>>, AppError> {
    state.store.get(split_id).ok_or_else(|| {
        ERRORS_TOTAL.with_label_values(&["not_found"]).inc();
        AppError::NotFound(anyhow::anyhow!("Split {} not found", split_id))
    })
}

pub(crate) fn domain_err(err: SplitError) -> AppError {
    let label = match err {
        SplitError::UnknownItem(_) | SplitError::UnknownPerson(_) => "not_found",
        SplitError::SessionFinalized => "conflict",
        _ => "validation_error",
    };
    ERRORS_TOTAL.with_label_values(&[label]).inc();
    AppError::from(err)
}
