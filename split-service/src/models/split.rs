//! Split session state: item arena, exclusive ownership, derived shares.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use service_core::error::AppError;

use crate::models::{
    ItemId, LineItem, Person, PersonSummary, ReceiptTotals, SplitSummary, TipPolicy,
};
use crate::services::allocator::{self, round_cents};

/// Session lifecycle. A finalized session is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStatus {
    Open,
    Finalized,
}

impl SplitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitStatus::Open => "open",
            SplitStatus::Finalized => "finalized",
        }
    }
}

/// Domain failures for session operations. Handlers map these onto the
/// shared `AppError` taxonomy.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Item {0} not found")]
    UnknownItem(ItemId),

    #[error("Person not found")]
    UnknownPerson(Uuid),

    #[error("Item {0} is not assigned to anyone")]
    NotAssigned(ItemId),

    #[error("Cannot remove the last remaining person")]
    LastPerson,

    #[error("Split is finalized and can no longer be edited")]
    SessionFinalized,

    #[error("Please assign all items before previewing ({unassigned} unassigned)")]
    UnassignedItems { unassigned: usize },

    #[error("Please enter names for all people")]
    UnnamedPerson,

    #[error("At least one person is required")]
    NoPeople,
}

impl From<SplitError> for AppError {
    fn from(err: SplitError) -> Self {
        match err {
            SplitError::UnknownItem(_) | SplitError::UnknownPerson(_) => {
                AppError::NotFound(anyhow::Error::new(err))
            }
            SplitError::SessionFinalized => AppError::Conflict(anyhow::Error::new(err)),
            _ => AppError::Unprocessable(anyhow::Error::new(err)),
        }
    }
}

/// One in-progress split: normalized items, exclusive ownership, people with
/// live derived shares.
///
/// Ownership is a single item-to-person map over the item arena, so an item
/// can never be counted for two people: assignment replaces any previous
/// owner atomically.
#[derive(Debug, Clone, Serialize)]
pub struct SplitSession {
    pub id: Uuid,
    pub store_name: Option<String>,
    pub items: Vec<LineItem>,
    pub owners: BTreeMap<ItemId, Uuid>,
    pub people: Vec<Person>,
    pub totals: ReceiptTotals,
    pub subtotal_mismatch: bool,
    pub coerced_records: u32,
    pub status: SplitStatus,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl SplitSession {
    /// Create a session over normalized items. The receipt subtotal is
    /// recomputed from the items; the upstream figure only feeds the
    /// mismatch flag. Seeds a single unnamed person, matching the
    /// interactive flow where the first participant types their name in
    /// place.
    pub fn new(
        store_name: Option<String>,
        items: Vec<LineItem>,
        mut totals: ReceiptTotals,
        subtotal_mismatch: bool,
        coerced_records: u32,
    ) -> Self {
        let now = Utc::now();
        totals.subtotal = items.iter().map(LineItem::line_total).sum();

        let mut session = Self {
            id: Uuid::new_v4(),
            store_name,
            items,
            owners: BTreeMap::new(),
            people: vec![Person::new("")],
            totals,
            subtotal_mismatch,
            coerced_records,
            status: SplitStatus::Open,
            created_utc: now,
            updated_utc: now,
        };
        session.recompute();
        session
    }

    pub fn person(&self, person_id: Uuid) -> Option<&Person> {
        self.people.iter().find(|p| p.id == person_id)
    }

    pub fn item(&self, item_id: ItemId) -> Option<&LineItem> {
        self.items.get(item_id as usize)
    }

    /// Items owned by a person, in arena order.
    pub fn items_of(&self, person_id: Uuid) -> Vec<&LineItem> {
        self.owners
            .iter()
            .filter(|(_, owner)| **owner == person_id)
            .map(|(item_id, _)| &self.items[*item_id as usize])
            .collect()
    }

    pub fn person_subtotal(&self, person_id: Uuid) -> Decimal {
        self.items_of(person_id)
            .iter()
            .map(|item| item.line_total())
            .sum()
    }

    pub fn add_person(&mut self, name: &str) -> Result<Uuid, SplitError> {
        self.ensure_open()?;
        let person = Person::new(name);
        let id = person.id;
        self.people.push(person);
        self.touch_and_recompute();
        Ok(id)
    }

    pub fn rename_person(&mut self, person_id: Uuid, name: &str) -> Result<(), SplitError> {
        self.ensure_open()?;
        let person = self
            .people
            .iter_mut()
            .find(|p| p.id == person_id)
            .ok_or(SplitError::UnknownPerson(person_id))?;
        person.name = name.trim().to_string();
        self.touch_and_recompute();
        Ok(())
    }

    /// Remove a person; their items transfer to the first-created remaining
    /// person so nothing previously assigned becomes unassigned. Removing
    /// the only person is rejected and leaves the session untouched.
    pub fn remove_person(&mut self, person_id: Uuid) -> Result<(), SplitError> {
        self.ensure_open()?;
        let index = self
            .people
            .iter()
            .position(|p| p.id == person_id)
            .ok_or(SplitError::UnknownPerson(person_id))?;
        if self.people.len() == 1 {
            return Err(SplitError::LastPerson);
        }

        let fallback = if index == 0 {
            self.people[1].id
        } else {
            self.people[0].id
        };
        for owner in self.owners.values_mut() {
            if *owner == person_id {
                *owner = fallback;
            }
        }

        self.people.remove(index);
        self.touch_and_recompute();
        Ok(())
    }

    /// Assign an item, atomically displacing any previous owner.
    pub fn assign_item(&mut self, item_id: ItemId, person_id: Uuid) -> Result<(), SplitError> {
        self.ensure_open()?;
        if self.item(item_id).is_none() {
            return Err(SplitError::UnknownItem(item_id));
        }
        if self.person(person_id).is_none() {
            return Err(SplitError::UnknownPerson(person_id));
        }
        self.owners.insert(item_id, person_id);
        self.touch_and_recompute();
        Ok(())
    }

    pub fn unassign_item(&mut self, item_id: ItemId) -> Result<(), SplitError> {
        self.ensure_open()?;
        if self.item(item_id).is_none() {
            return Err(SplitError::UnknownItem(item_id));
        }
        self.owners
            .remove(&item_id)
            .ok_or(SplitError::NotAssigned(item_id))?;
        self.touch_and_recompute();
        Ok(())
    }

    /// Adjust the tax rate and/or tip policy (the slider and preset flow).
    pub fn set_totals(
        &mut self,
        tax_rate_percent: Option<Decimal>,
        tip: Option<TipPolicy>,
    ) -> Result<(), SplitError> {
        self.ensure_open()?;
        if let Some(rate) = tax_rate_percent {
            self.totals.tax_rate_percent = rate;
        }
        if let Some(tip) = tip {
            self.totals.tip = tip;
        }
        self.touch_and_recompute();
        Ok(())
    }

    /// Refresh every person's derived shares. Pure in the session state:
    /// running it twice without a mutation in between yields identical
    /// results.
    pub fn recompute(&mut self) {
        let totals = self.totals.clone();
        let subtotals: Vec<Decimal> = self
            .people
            .iter()
            .map(|p| self.person_subtotal(p.id))
            .collect();

        for (person, subtotal) in self.people.iter_mut().zip(subtotals) {
            let share = allocator::person_share(subtotal, &totals);
            person.subtotal = subtotal;
            person.tax_share = share.tax_share;
            person.tip_share = share.tip_share;
            person.total = share.total;
        }
    }

    /// The validation gate between assignment and the shareable result.
    ///
    /// Checks run in the order the interactive flow reports them: full
    /// assignment first, then person names. The first failure is returned
    /// and the session is left untouched. On success shares are rounded to
    /// cents with the remainder folded into the first person, the session
    /// becomes finalized, and further mutations are rejected. Re-finalizing
    /// an already-finalized session returns the same summary.
    pub fn finalize(&mut self) -> Result<SplitSummary, SplitError> {
        if self.people.is_empty() {
            return Err(SplitError::NoPeople);
        }

        let unassigned = self
            .items
            .iter()
            .filter(|item| !self.owners.contains_key(&item.id))
            .count();
        if unassigned > 0 {
            return Err(SplitError::UnassignedItems { unassigned });
        }

        if self.people.iter().any(|p| p.name.trim().is_empty()) {
            return Err(SplitError::UnnamedPerson);
        }

        self.recompute();

        let tax_total = allocator::tax_total(&self.totals);
        let tip_total = allocator::tip_total(&self.totals);
        let grand_total = round_cents(self.totals.subtotal + tax_total + tip_total);

        let mut people: Vec<PersonSummary> = self
            .people
            .iter()
            .map(|person| PersonSummary {
                person_id: person.id,
                name: person.name.clone(),
                items: self.items_of(person.id).into_iter().cloned().collect(),
                subtotal: round_cents(person.subtotal),
                tax_share: round_cents(person.tax_share),
                tip_share: round_cents(person.tip_share),
                total: round_cents(person.total),
            })
            .collect();

        // rounding remainder lands with the first person so the published
        // per-person totals reconcile exactly with the grand total
        let rounded_sum: Decimal = people.iter().map(|p| p.total).sum();
        let remainder = grand_total - rounded_sum;
        if remainder != Decimal::ZERO {
            if let Some(first) = people.first_mut() {
                first.tip_share += remainder;
                first.total += remainder;
            }
        }

        self.status = SplitStatus::Finalized;
        self.updated_utc = Utc::now();

        Ok(SplitSummary {
            split_id: self.id,
            store_name: self.store_name.clone(),
            people,
            subtotal: round_cents(self.totals.subtotal),
            tax_total: round_cents(tax_total),
            tip_total: round_cents(tip_total),
            grand_total,
        })
    }

    fn ensure_open(&self) -> Result<(), SplitError> {
        if self.status == SplitStatus::Finalized {
            return Err(SplitError::SessionFinalized);
        }
        Ok(())
    }

    fn touch_and_recompute(&mut self) {
        self.updated_utc = Utc::now();
        self.recompute();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(id: ItemId, name: &str, price: Decimal, quantity: u32) -> LineItem {
        LineItem {
            id,
            name: name.to_string(),
            unit_price: price,
            quantity,
        }
    }

    fn session(tax_rate: Decimal, tip: TipPolicy) -> SplitSession {
        SplitSession::new(
            Some("Sample Store".to_string()),
            vec![
                item(0, "Burger", dec!(8.99), 1),
                item(1, "Fries", dec!(3.49), 1),
            ],
            ReceiptTotals {
                subtotal: Decimal::ZERO,
                tax_rate_percent: tax_rate,
                tip,
            },
            false,
            0,
        )
    }

    #[test]
    fn new_session_seeds_one_unnamed_person() {
        let session = session(dec!(8), TipPolicy::default());
        assert_eq!(session.people.len(), 1);
        assert!(session.people[0].name.is_empty());
        assert_eq!(session.totals.subtotal, dec!(12.48));
        assert_eq!(session.status, SplitStatus::Open);
    }

    #[test]
    fn assignment_updates_derived_shares() {
        let mut session = session(dec!(8), TipPolicy::default());
        let alice = session.people[0].id;
        session.rename_person(alice, "Alice").unwrap();
        let bob = session.add_person("Bob").unwrap();

        session.assign_item(0, alice).unwrap();
        session.assign_item(1, bob).unwrap();

        let alice = session.person(alice).unwrap();
        let bob = session.person(bob).unwrap();
        assert_eq!(alice.subtotal, dec!(8.99));
        assert_eq!(bob.subtotal, dec!(3.49));
        assert_eq!(round_cents(alice.tax_share), dec!(0.72));
        assert_eq!(round_cents(bob.tax_share), dec!(0.28));
        assert_eq!(round_cents(alice.total), dec!(9.71));
        assert_eq!(round_cents(bob.total), dec!(3.77));
    }

    #[test]
    fn reassignment_moves_the_item() {
        let mut session = session(dec!(8), TipPolicy::default());
        let alice = session.people[0].id;
        let bob = session.add_person("Bob").unwrap();

        session.assign_item(0, alice).unwrap();
        session.assign_item(0, bob).unwrap();

        assert_eq!(session.person(alice).unwrap().subtotal, Decimal::ZERO);
        assert_eq!(session.person(bob).unwrap().subtotal, dec!(8.99));
        // never double-counted
        let assigned: Decimal = session.people.iter().map(|p| p.subtotal).sum();
        assert_eq!(assigned, dec!(8.99));
    }

    #[test]
    fn removing_a_person_transfers_their_items() {
        let mut session = session(dec!(0), TipPolicy::default());
        let alice = session.people[0].id;
        let bob = session.add_person("Bob").unwrap();

        session.assign_item(0, alice).unwrap();
        session.assign_item(1, bob).unwrap();
        session.remove_person(bob).unwrap();

        assert_eq!(session.people.len(), 1);
        let items: Vec<_> = session
            .items_of(alice)
            .iter()
            .map(|i| i.name.clone())
            .collect();
        assert_eq!(items, vec!["Burger", "Fries"]);
        assert_eq!(session.person(alice).unwrap().subtotal, dec!(12.48));
    }

    #[test]
    fn removing_the_last_person_is_rejected() {
        let mut session = session(dec!(0), TipPolicy::default());
        let alice = session.people[0].id;
        session.assign_item(0, alice).unwrap();

        let err = session.remove_person(alice).unwrap_err();
        assert!(matches!(err, SplitError::LastPerson));
        assert_eq!(session.people.len(), 1);
        assert_eq!(session.person(alice).unwrap().subtotal, dec!(8.99));
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut session = session(dec!(8.25), TipPolicy::Percentage { rate: dec!(18) });
        let alice = session.people[0].id;
        session.assign_item(0, alice).unwrap();
        session.assign_item(1, alice).unwrap();

        let before: Vec<_> = session
            .people
            .iter()
            .map(|p| (p.subtotal, p.tax_share, p.tip_share, p.total))
            .collect();
        session.recompute();
        let after: Vec<_> = session
            .people
            .iter()
            .map(|p| (p.subtotal, p.tax_share, p.tip_share, p.total))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn finalize_rejects_unassigned_items_first() {
        let mut session = session(dec!(8), TipPolicy::default());
        let alice = session.people[0].id;
        session.assign_item(0, alice).unwrap();

        let err = session.finalize().unwrap_err();
        assert!(matches!(err, SplitError::UnassignedItems { unassigned: 1 }));
        assert_eq!(session.status, SplitStatus::Open);
    }

    #[test]
    fn finalize_rejects_unnamed_people_and_preserves_state() {
        let mut session = session(dec!(8), TipPolicy::default());
        let alice = session.people[0].id;
        session.assign_item(0, alice).unwrap();
        session.assign_item(1, alice).unwrap();

        let err = session.finalize().unwrap_err();
        assert!(matches!(err, SplitError::UnnamedPerson));
        assert_eq!(session.status, SplitStatus::Open);
        assert_eq!(session.people.len(), 1);
        assert_eq!(session.person_subtotal(alice), dec!(12.48));
    }

    #[test]
    fn finalize_reconciles_rounding_to_the_first_person() {
        let mut session = SplitSession::new(
            None,
            vec![
                item(0, "Pad Thai", dec!(3.33), 1),
                item(1, "Rolls", dec!(3.33), 1),
                item(2, "Curry", dec!(3.34), 1),
            ],
            ReceiptTotals {
                subtotal: Decimal::ZERO,
                tax_rate_percent: dec!(8.25),
                tip: TipPolicy::default(),
            },
            false,
            0,
        );
        let p1 = session.people[0].id;
        session.rename_person(p1, "Ana").unwrap();
        let p2 = session.add_person("Ben").unwrap();
        let p3 = session.add_person("Cam").unwrap();
        session.assign_item(0, p1).unwrap();
        session.assign_item(1, p2).unwrap();
        session.assign_item(2, p3).unwrap();

        let summary = session.finalize().unwrap();

        // 10.00 * 1.0825 = 10.825, rounds to 10.83
        assert_eq!(summary.grand_total, dec!(10.83));
        let sum: Decimal = summary.people.iter().map(|p| p.total).sum();
        assert_eq!(sum, summary.grand_total);
        // the cent of drift goes to the first person
        assert_eq!(summary.people[0].total, dec!(3.61));
        assert_eq!(summary.people[1].total, dec!(3.60));
        assert_eq!(summary.people[2].total, dec!(3.62));
    }

    #[test]
    fn finalize_is_idempotent_and_freezes_the_session() {
        let mut session = session(dec!(8), TipPolicy::default());
        let alice = session.people[0].id;
        session.rename_person(alice, "Alice").unwrap();
        session.assign_item(0, alice).unwrap();
        session.assign_item(1, alice).unwrap();

        let first = session.finalize().unwrap();
        assert_eq!(session.status, SplitStatus::Finalized);

        let second = session.finalize().unwrap();
        assert_eq!(first.people, second.people);
        assert_eq!(first.grand_total, second.grand_total);

        let err = session.add_person("Late").unwrap_err();
        assert!(matches!(err, SplitError::SessionFinalized));
    }

    #[test]
    fn zero_priced_receipt_finalizes_with_zero_shares() {
        let mut session = SplitSession::new(
            None,
            vec![item(0, "Water", Decimal::ZERO, 2)],
            ReceiptTotals {
                subtotal: Decimal::ZERO,
                tax_rate_percent: dec!(8),
                tip: TipPolicy::Fixed { amount: dec!(0) },
            },
            false,
            0,
        );
        let alice = session.people[0].id;
        session.rename_person(alice, "Alice").unwrap();
        session.assign_item(0, alice).unwrap();

        let summary = session.finalize().unwrap();
        assert_eq!(summary.grand_total, Decimal::ZERO);
        assert_eq!(summary.people[0].total, Decimal::ZERO);
    }
}
