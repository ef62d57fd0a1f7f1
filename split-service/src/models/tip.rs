//! Tip policy model for split-service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tip policy: a percentage of the subtotal or a fixed dollar amount.
/// Either form is distributed across people in proportion to spend, not
/// split evenly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TipPolicy {
    Percentage { rate: Decimal },
    Fixed { amount: Decimal },
}

impl TipPolicy {
    pub fn is_negative(&self) -> bool {
        match self {
            TipPolicy::Percentage { rate } => *rate < Decimal::ZERO,
            TipPolicy::Fixed { amount } => *amount < Decimal::ZERO,
        }
    }
}

impl Default for TipPolicy {
    fn default() -> Self {
        TipPolicy::Percentage {
            rate: Decimal::ZERO,
        }
    }
}
