//! Normalization of raw OCR output into clean line items.
//!
//! OCR backends emit loosely-typed records: numbers arrive as strings,
//! fields go missing, repeated purchases show up as duplicate rows. Nothing
//! here ever fails — every malformation degrades to a safe default, and the
//! caller learns how many records needed coercion.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::dtos::RawReceiptItem;
use crate::models::{ItemId, LineItem};

pub const PLACEHOLDER_NAME: &str = "Unknown Item";

/// Output of a normalization pass.
#[derive(Debug, Clone)]
pub struct NormalizedReceipt {
    pub items: Vec<LineItem>,
    /// Records that needed at least one coercion default.
    pub coerced_records: u32,
}

/// Coerce and merge raw records into line items.
///
/// Records sharing a normalized name merge into one item: quantities sum and
/// the unit price becomes the quantity-weighted average, which keeps
/// per-unit economics intact for the proportional split downstream. Output
/// order is first-occurrence order of distinct names.
pub fn normalize_items(raw: &[RawReceiptItem]) -> NormalizedReceipt {
    let mut items: Vec<LineItem> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut coerced_records = 0u32;

    for record in raw {
        let (name, name_coerced) = coerce_name(record.name.as_ref());
        let (unit_price, price_coerced) = coerce_price(record.price.as_ref());
        let (quantity, quantity_coerced) = coerce_quantity(record.quantity.as_ref());
        if name_coerced || price_coerced || quantity_coerced {
            coerced_records += 1;
        }

        match index.get(&name) {
            Some(&i) => {
                let existing = &mut items[i];
                let merged_quantity = existing.quantity + quantity;
                let weighted = existing.unit_price * Decimal::from(existing.quantity)
                    + unit_price * Decimal::from(quantity);
                existing.unit_price = weighted / Decimal::from(merged_quantity);
                existing.quantity = merged_quantity;
            }
            None => {
                let id = items.len() as ItemId;
                index.insert(name.clone(), items.len());
                items.push(LineItem {
                    id,
                    name,
                    unit_price,
                    quantity,
                });
            }
        }
    }

    NormalizedReceipt {
        items,
        coerced_records,
    }
}

/// Decimal from a loosely-typed JSON value. Strings are trimmed and may
/// carry a leading dollar sign; anything else is unparseable.
pub fn coerce_decimal(value: Option<&Value>) -> Option<Decimal> {
    match value? {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => {
            let s = s.trim();
            let s = s.strip_prefix('$').unwrap_or(s).trim();
            parse_decimal(s)
        }
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn coerce_name(value: Option<&Value>) -> (String, bool) {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => (s.trim().to_string(), false),
        _ => (PLACEHOLDER_NAME.to_string(), true),
    }
}

fn coerce_price(value: Option<&Value>) -> (Decimal, bool) {
    match coerce_decimal(value) {
        Some(price) if price >= Decimal::ZERO => (price, false),
        Some(_) => (Decimal::ZERO, true),
        None => (Decimal::ZERO, true),
    }
}

fn coerce_quantity(value: Option<&Value>) -> (u32, bool) {
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    };

    match parsed {
        Some(q) if q >= 1 => (q.min(u32::MAX as i64) as u32, false),
        Some(_) => (1, true),
        None => (1, true),
    }
}
