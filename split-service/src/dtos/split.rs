use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{ItemId, SplitSession, TipPolicy};
use crate::services::allocator::{self, round_cents};

/// Raw record as produced by the OCR collaborator. Every field may be
/// missing or mistyped; the normalizer coerces rather than rejects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RawReceiptItem {
    #[schema(value_type = Option<String>, example = "Burger")]
    pub name: Option<Value>,
    #[schema(value_type = Option<Object>, example = "8.99")]
    pub price: Option<Value>,
    #[schema(value_type = Option<Object>, example = "1")]
    pub quantity: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSplitRequest {
    #[validate(length(max = 120, message = "Store name is too long"))]
    #[schema(example = "Sample Store")]
    pub store_name: Option<String>,

    #[validate(length(min = 1, max = 500, message = "At least one receipt item is required"))]
    pub items: Vec<RawReceiptItem>,

    /// Subtotal as reported upstream; only used to flag mismatches.
    #[schema(value_type = Option<Object>, example = "12.48")]
    pub subtotal: Option<Value>,

    #[schema(value_type = Option<Object>, example = "8")]
    pub tax_rate_percent: Option<Value>,

    pub tip: Option<TipPolicy>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTotalsRequest {
    #[schema(value_type = Option<String>, example = "8.25")]
    pub tax_rate_percent: Option<Decimal>,
    pub tip: Option<TipPolicy>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddPersonRequest {
    /// May be empty while the user is still typing; finalization requires
    /// a non-empty name.
    #[validate(length(max = 80, message = "Name is too long"))]
    #[schema(example = "Alice")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RenamePersonRequest {
    #[validate(length(max = 80, message = "Name is too long"))]
    #[schema(example = "Alice")]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignItemRequest {
    pub person_id: Uuid,
}

/// One normalized item with its current owner.
#[derive(Debug, Serialize, ToSchema)]
pub struct ItemView {
    pub id: ItemId,
    pub name: String,
    #[schema(value_type = String, example = "8.99")]
    pub unit_price: Decimal,
    pub quantity: u32,
    #[schema(value_type = String, example = "8.99")]
    pub line_total: Decimal,
    pub owner: Option<Uuid>,
}

/// One participant with live derived shares, rounded for display.
#[derive(Debug, Serialize, ToSchema)]
pub struct PersonView {
    pub id: Uuid,
    pub name: String,
    pub item_ids: Vec<ItemId>,
    #[schema(value_type = String, example = "8.99")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "0.72")]
    pub tax_share: Decimal,
    #[schema(value_type = String, example = "1.62")]
    pub tip_share: Decimal,
    #[schema(value_type = String, example = "11.33")]
    pub total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TotalsView {
    #[schema(value_type = String, example = "12.48")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "8")]
    pub tax_rate_percent: Decimal,
    #[schema(value_type = String, example = "1.00")]
    pub tax_total: Decimal,
    pub tip: TipPolicy,
    #[schema(value_type = String, example = "2.25")]
    pub tip_total: Decimal,
    #[schema(value_type = String, example = "15.73")]
    pub grand_total: Decimal,
}

/// Full session view returned by every read and mutation endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct SplitResponse {
    pub split_id: Uuid,
    pub store_name: Option<String>,
    #[schema(example = "open")]
    pub status: String,
    pub items: Vec<ItemView>,
    pub people: Vec<PersonView>,
    pub totals: TotalsView,
    pub subtotal_mismatch: bool,
    /// Raw records that needed coercion during normalization.
    pub warnings: u32,
}

impl SplitResponse {
    pub fn from_session(session: &SplitSession) -> Self {
        let items = session
            .items
            .iter()
            .map(|item| ItemView {
                id: item.id,
                name: item.name.clone(),
                unit_price: round_cents(item.unit_price),
                quantity: item.quantity,
                line_total: round_cents(item.line_total()),
                owner: session.owners.get(&item.id).copied(),
            })
            .collect();

        let people = session
            .people
            .iter()
            .map(|person| PersonView {
                id: person.id,
                name: person.name.clone(),
                item_ids: session.items_of(person.id).iter().map(|i| i.id).collect(),
                subtotal: round_cents(person.subtotal),
                tax_share: round_cents(person.tax_share),
                tip_share: round_cents(person.tip_share),
                total: round_cents(person.total),
            })
            .collect();

        let tax_total = allocator::tax_total(&session.totals);
        let tip_total = allocator::tip_total(&session.totals);
        let totals = TotalsView {
            subtotal: round_cents(session.totals.subtotal),
            tax_rate_percent: session.totals.tax_rate_percent,
            tax_total: round_cents(tax_total),
            tip: session.totals.tip.clone(),
            tip_total: round_cents(tip_total),
            grand_total: round_cents(session.totals.subtotal + tax_total + tip_total),
        };

        Self {
            split_id: session.id,
            store_name: session.store_name.clone(),
            status: session.status.as_str().to_string(),
            items,
            people,
            totals,
            subtotal_mismatch: session.subtotal_mismatch,
            warnings: session.coerced_records,
        }
    }
}
