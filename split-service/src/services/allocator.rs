//! Proportional allocation of tax and tip by share of subtotal.
//!
//! People who ordered more contribute proportionally more to the shared tax
//! and tip; a fixed-amount tip is distributed by spend, not split evenly.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{ReceiptTotals, TipPolicy};

/// One person's slice of the receipt-level amounts, at full precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShareBreakdown {
    pub tax_share: Decimal,
    pub tip_share: Decimal,
    pub total: Decimal,
}

/// Total tax on the receipt.
pub fn tax_total(totals: &ReceiptTotals) -> Decimal {
    totals.subtotal * totals.tax_rate_percent / Decimal::ONE_HUNDRED
}

/// Total tip on the receipt.
pub fn tip_total(totals: &ReceiptTotals) -> Decimal {
    match totals.tip {
        TipPolicy::Percentage { rate } => totals.subtotal * rate / Decimal::ONE_HUNDRED,
        TipPolicy::Fixed { amount } => amount,
    }
}

/// Compute one person's shares from their assigned subtotal.
///
/// A zero receipt subtotal yields zero proportion for everyone; it is never
/// a division fault.
pub fn person_share(person_subtotal: Decimal, totals: &ReceiptTotals) -> ShareBreakdown {
    let proportion = if totals.subtotal > Decimal::ZERO {
        person_subtotal / totals.subtotal
    } else {
        Decimal::ZERO
    };

    let tax_share = tax_total(totals) * proportion;
    let tip_share = tip_total(totals) * proportion;

    ShareBreakdown {
        tax_share,
        tip_share,
        total: person_subtotal + tax_share + tip_share,
    }
}

/// Round a monetary amount to cents, half away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
