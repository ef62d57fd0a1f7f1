//! Person model for split-service.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// A participant in the split. The share fields are derived state, refreshed
/// by the allocator after every mutation so the session is always
/// consistent. Names may stay empty while the user is mid-typing; the
/// finalization gate rejects them.
#[derive(Debug, Clone, Serialize)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub subtotal: Decimal,
    pub tax_share: Decimal,
    pub tip_share: Decimal,
    pub total: Decimal,
}

impl Person {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            subtotal: Decimal::ZERO,
            tax_share: Decimal::ZERO,
            tip_share: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }
}
