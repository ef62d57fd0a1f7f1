//! Finalization gate tests for split-service.

mod common;

use common::{first_person_id, money, sample_receipt, split_id, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

/// Burger -> Alice, Fries -> Bob, everyone named.
async fn assigned_two_person_split(app: &TestApp) -> String {
    let split = app.create_split(&sample_receipt()).await;
    let id = split_id(&split);
    let alice = first_person_id(&split);

    app.patch_json(
        &format!("/splits/{}/people/{}", id, alice),
        &json!({ "name": "Alice" }),
    )
    .await;
    let split: serde_json::Value = app
        .post_json(&format!("/splits/{}/people", id), &json!({ "name": "Bob" }))
        .await
        .json()
        .await
        .unwrap();
    let bob = split["people"][1]["id"].as_str().unwrap().to_string();

    app.put_json(
        &format!("/splits/{}/items/0/owner", id),
        &json!({ "person_id": alice }),
    )
    .await;
    app.put_json(
        &format!("/splits/{}/items/1/owner", id),
        &json!({ "person_id": bob }),
    )
    .await;

    id
}

#[tokio::test]
async fn finalize_blocks_until_all_items_are_assigned() {
    let app = TestApp::spawn().await;

    let split = app.create_split(&sample_receipt()).await;
    let id = split_id(&split);
    let alice = first_person_id(&split);

    app.patch_json(
        &format!("/splits/{}/people/{}", id, alice),
        &json!({ "name": "Alice" }),
    )
    .await;
    app.put_json(
        &format!("/splits/{}/items/0/owner", id),
        &json!({ "person_id": alice }),
    )
    .await;

    let response = app.post_empty(&format!("/splits/{}/finalize", id)).await;
    assert_eq!(response.status(), 422);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("assign all items"));

    // session is still open and untouched
    let split = app.get_split(&id).await;
    assert_eq!(split["status"], "open");
}

#[tokio::test]
async fn finalize_blocks_on_unnamed_people_and_preserves_state() {
    let app = TestApp::spawn().await;

    let split = app.create_split(&sample_receipt()).await;
    let id = split_id(&split);
    let alice = first_person_id(&split);

    // items fully assigned, but the seeded person never got a name
    app.put_json(
        &format!("/splits/{}/items/0/owner", id),
        &json!({ "person_id": alice }),
    )
    .await;
    app.put_json(
        &format!("/splits/{}/items/1/owner", id),
        &json!({ "person_id": alice }),
    )
    .await;

    let response = app.post_empty(&format!("/splits/{}/finalize", id)).await;
    assert_eq!(response.status(), 422);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("names"));

    let split = app.get_split(&id).await;
    assert_eq!(split["status"], "open");
    assert_eq!(money(&split["people"][0]["subtotal"]), dec!(12.48));
}

#[tokio::test]
async fn finalize_returns_a_reconciled_summary() {
    let app = TestApp::spawn().await;
    let id = assigned_two_person_split(&app).await;

    let response = app.post_empty(&format!("/splits/{}/finalize", id)).await;
    assert_eq!(response.status(), 200);

    let summary: serde_json::Value = response.json().await.unwrap();
    assert_eq!(summary["store_name"], "Sample Store");
    assert_eq!(money(&summary["subtotal"]), dec!(12.48));
    assert_eq!(money(&summary["tax_total"]), dec!(1.00));
    assert_eq!(money(&summary["grand_total"]), dec!(13.48));

    let people = summary["people"].as_array().unwrap();
    assert_eq!(people.len(), 2);
    assert_eq!(people[0]["name"], "Alice");
    assert_eq!(people[0]["items"][0]["name"], "Burger");
    assert_eq!(people[1]["name"], "Bob");
    assert_eq!(people[1]["items"][0]["name"], "Fries");

    // per-person totals reconcile exactly with the grand total
    let sum: Decimal = people.iter().map(|p| money(&p["total"])).sum();
    assert_eq!(sum, money(&summary["grand_total"]));

    let split = app.get_split(&id).await;
    assert_eq!(split["status"], "finalized");
}

#[tokio::test]
async fn rounding_remainder_goes_to_the_first_person() {
    let app = TestApp::spawn().await;

    let split = app
        .create_split(&json!({
            "items": [
                { "name": "Pad Thai", "price": 3.33, "quantity": 1 },
                { "name": "Rolls", "price": 3.33, "quantity": 1 },
                { "name": "Curry", "price": 3.34, "quantity": 1 }
            ],
            "tax_rate_percent": 8.25
        }))
        .await;
    let id = split_id(&split);
    let ana = first_person_id(&split);

    app.patch_json(
        &format!("/splits/{}/people/{}", id, ana),
        &json!({ "name": "Ana" }),
    )
    .await;
    let split: serde_json::Value = app
        .post_json(&format!("/splits/{}/people", id), &json!({ "name": "Ben" }))
        .await
        .json()
        .await
        .unwrap();
    let ben = split["people"][1]["id"].as_str().unwrap().to_string();
    let split: serde_json::Value = app
        .post_json(&format!("/splits/{}/people", id), &json!({ "name": "Cam" }))
        .await
        .json()
        .await
        .unwrap();
    let cam = split["people"][2]["id"].as_str().unwrap().to_string();

    for (item, person) in [(0, &ana), (1, &ben), (2, &cam)] {
        app.put_json(
            &format!("/splits/{}/items/{}/owner", id, item),
            &json!({ "person_id": person }),
        )
        .await;
    }

    let response = app.post_empty(&format!("/splits/{}/finalize", id)).await;
    assert_eq!(response.status(), 200);

    let summary: serde_json::Value = response.json().await.unwrap();
    assert_eq!(money(&summary["grand_total"]), dec!(10.83));

    let people = summary["people"].as_array().unwrap();
    // Ana absorbs the rounding cent
    assert_eq!(money(&people[0]["total"]), dec!(3.61));
    assert_eq!(money(&people[1]["total"]), dec!(3.60));
    assert_eq!(money(&people[2]["total"]), dec!(3.62));

    let sum: Decimal = people.iter().map(|p| money(&p["total"])).sum();
    assert_eq!(sum, money(&summary["grand_total"]));
}

#[tokio::test]
async fn finalize_is_idempotent() {
    let app = TestApp::spawn().await;
    let id = assigned_two_person_split(&app).await;

    let first: serde_json::Value = app
        .post_empty(&format!("/splits/{}/finalize", id))
        .await
        .json()
        .await
        .unwrap();
    let second: serde_json::Value = app
        .post_empty(&format!("/splits/{}/finalize", id))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn finalized_splits_reject_mutations() {
    let app = TestApp::spawn().await;
    let id = assigned_two_person_split(&app).await;

    let response = app.post_empty(&format!("/splits/{}/finalize", id)).await;
    assert_eq!(response.status(), 200);

    let response = app
        .post_json(
            &format!("/splits/{}/people", id),
            &json!({ "name": "Latecomer" }),
        )
        .await;
    assert_eq!(response.status(), 409);

    let response = app.delete(&format!("/splits/{}/items/0/owner", id)).await;
    assert_eq!(response.status(), 409);

    let response = app
        .patch_json(
            &format!("/splits/{}/totals", id),
            &json!({ "tax_rate_percent": "5" }),
        )
        .await;
    assert_eq!(response.status(), 409);
}
