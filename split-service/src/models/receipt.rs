//! Receipt models for split-service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::TipPolicy;

/// Stable identifier assigned to a line item at normalization time.
/// Items live in the session arena in id order; ownership lookups never
/// rely on name or price.
pub type ItemId = u32;

/// One distinct purchasable item extracted from a receipt. Immutable after
/// normalization; only its ownership changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    pub id: ItemId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Receipt-level amounts driving the proportional split. The subtotal is
/// always the sum of line totals, recomputed whenever items are normalized.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReceiptTotals {
    pub subtotal: Decimal,
    pub tax_rate_percent: Decimal,
    pub tip: TipPolicy,
}
