//! Finalized allocation models for split-service.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::LineItem;

/// One person's slice of a finalized split, rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PersonSummary {
    pub person_id: Uuid,
    pub name: String,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax_share: Decimal,
    pub tip_share: Decimal,
    pub total: Decimal,
}

/// The shareable result of finalization. Per-person totals reconcile exactly
/// with `grand_total`: the rounding remainder is folded into the first
/// person's share.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SplitSummary {
    pub split_id: Uuid,
    pub store_name: Option<String>,
    pub people: Vec<PersonSummary>,
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub tip_total: Decimal,
    pub grand_total: Decimal,
}
