//! Pricing endpoint integration tests.

mod common;

use axum::http::StatusCode;
use common::{test_config, TestHarness};
use serde_json::json;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn health_reports_service_and_cache() {
    let harness = TestHarness::new();

    let response = harness.server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "energy-pricing");
    assert!(body["config_cache"]["hits"].is_u64());
}

// ============================================================================
// Single calculation
// ============================================================================

#[tokio::test]
async fn calculate_package_price() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/prices/calculate")
        .json(&json!({
            "resource_type": "energy",
            "package_id": harness.energy.id.to_string(),
            "quantity": 1,
            "amount": 1000.0
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["final_price"], 1.5);
    assert_eq!(body["total"], body["final_price"]);
    assert_eq!(body["override_level"], "package");
    assert_eq!(body["path"], "single");
    assert_eq!(body["currency"], "TRX");
}

#[tokio::test]
async fn calculate_applies_highest_reached_tier_only() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/prices/calculate")
        .json(&json!({
            "resource_type": "energy",
            "package_id": harness.tiered.id.to_string(),
            "quantity": 150,
            "amount": 1000.0
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["subtotal"], 150.0);
    assert_eq!(body["discount_amount"], 15.0);
    assert_eq!(body["final_price"], 135.0);
    assert_eq!(body["applied_rules"], json!(["quantity_tier_100"]));
}

#[tokio::test]
async fn calculate_without_package_uses_system_fallback() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/prices/calculate")
        .json(&json!({ "resource_type": "energy", "quantity": 2, "amount": 1000.0 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["override_level"], "system");
    assert_eq!(body["final_price"], 4.0);
}

#[tokio::test]
async fn calculate_without_any_price_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/prices/calculate")
        .json(&json!({ "resource_type": "bandwidth", "quantity": 1, "amount": 4096.0 }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn calculate_rejects_invalid_input_with_field_details() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/prices/calculate")
        .json(&json!({
            "resource_type": "energy",
            "package_id": harness.energy.id.to_string(),
            "quantity": 0,
            "amount": 1000.0
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "invalid_input");
    assert_eq!(body["error"]["details"]["issues"][0]["field"], "quantity");
}

#[tokio::test]
async fn calculate_rejects_package_of_other_resource() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/prices/calculate")
        .json(&json!({
            "resource_type": "bandwidth",
            "package_id": harness.energy.id.to_string(),
            "quantity": 1,
            "amount": 4096.0
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn spend_limit_depends_on_user_level() {
    let harness = TestHarness::new();
    let order = |level: &str| {
        json!({
            "resource_type": "energy",
            "package_id": harness.energy.id.to_string(),
            "quantity": 10_000,
            "amount": 1000.0,
            "user_level": level
        })
    };

    let regular = harness
        .server
        .post("/v1/prices/calculate")
        .json(&order("regular"))
        .await;
    regular.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = regular.json();
    assert_eq!(body["error"]["code"], "spend_limit_exceeded");
    assert_eq!(body["error"]["details"]["limit"], 10_000.0);

    harness
        .server
        .post("/v1/prices/calculate")
        .json(&order("premium"))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn emergency_orders_carry_priority_adjustment() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/prices/calculate")
        .json(&json!({
            "resource_type": "energy",
            "package_id": harness.energy.id.to_string(),
            "quantity": 2,
            "amount": 1000.0,
            "is_emergency": true
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["base_amount"], 2.25);
    assert_eq!(body["final_price"], 4.5);
    assert_eq!(body["adjustments"][0]["name"], "priority");
}

// ============================================================================
// Batch
// ============================================================================

#[tokio::test]
async fn batch_reports_degraded_items_in_place() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/prices/batch")
        .json(&json!({
            "items": [
                { "resource_type": "energy", "package_id": harness.energy.id.to_string(), "quantity": 1, "amount": 1000.0 },
                { "resource_type": "bandwidth", "quantity": 1, "amount": 4096.0 },
                { "resource_type": "bandwidth", "package_id": harness.bandwidth.id.to_string(), "quantity": 4, "amount": 4096.0 }
            ]
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(body["degraded"], 1);

    assert_eq!(results[0]["final_price"], 1.5);
    assert_eq!(results[0]["path"], "batch");
    assert!(results[1]["error"].is_string());
    assert_eq!(results[1]["final_price"], 0.0);
    assert_eq!(results[2]["final_price"], 2.0);
}

#[tokio::test]
async fn batch_over_the_limit_is_rejected() {
    let harness = TestHarness::new();
    let item = json!({ "resource_type": "energy", "quantity": 1, "amount": 1000.0 });
    let items: Vec<_> = (0..=test_config().max_batch_size).map(|_| item.clone()).collect();

    let response = harness
        .server
        .post("/v1/prices/batch")
        .json(&json!({ "items": items }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_validation_can_be_requested() {
    let harness = TestHarness::new();
    let items = json!([
        { "resource_type": "energy", "package_id": harness.energy.id.to_string(), "quantity": 0, "amount": 1000.0 }
    ]);

    let unchecked: serde_json::Value = harness
        .server
        .post("/v1/prices/batch")
        .json(&json!({ "items": items }))
        .await
        .json();
    assert_eq!(unchecked["degraded"], 0);

    let checked: serde_json::Value = harness
        .server
        .post("/v1/prices/batch")
        .json(&json!({ "items": items, "options": { "validate_input": true } }))
        .await
        .json();
    assert_eq!(checked["degraded"], 1);
}

// ============================================================================
// Validate
// ============================================================================

#[tokio::test]
async fn validate_returns_findings_without_pricing() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/prices/validate")
        .json(&json!({ "resource_type": "bandwidth", "quantity": 5000, "amount": -1.0 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["is_valid"], false);
    assert_eq!(body["errors"][0]["code"], "amount_not_positive");
    assert_eq!(body["warnings"][0]["code"], "large_quantity");
    assert!(!body["suggestions"].as_array().unwrap().is_empty());
}
