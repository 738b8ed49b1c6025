//! Customer endpoints.
//!
//! These tests require a running API backed by a migrated database.

use reqwest::StatusCode;
use serde_json::json;

use scoop_integration_tests::{client, expect_json, get_ok, unique_email, url};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_customer_lifecycle() {
    let client = client();
    let email = unique_email("customer");

    let response = client
        .post(url("/api/customers"))
        .json(&json!({
            "firstname": "Ada",
            "lastname": "Lovelace",
            "email": email,
            "phone": "+44 20 7946 0000",
            "address": "12 Analytical Row",
            "city": "London",
            "country": "UK",
            "postalCode": "N1 9GU",
        }))
        .send()
        .await
        .expect("Request failed");
    let created = expect_json(response, StatusCode::CREATED).await;
    let id = created["data"]["id"].as_i64().expect("customer id");
    assert_eq!(created["data"]["fullname"], "Ada Lovelace");

    // Duplicate email
    let response = client
        .post(url("/api/customers"))
        .json(&json!({
            "firstname": "Ada", "lastname": "Again", "email": email, "phone": "1",
            "address": "x", "city": "London", "country": "UK", "postalCode": "N1",
        }))
        .send()
        .await
        .expect("Request failed");
    expect_json(response, StatusCode::CONFLICT).await;

    let fetched = get_ok(&client, &format!("/api/customers/email/{email}")).await;
    assert_eq!(fetched["data"]["id"], id);

    let response = client
        .put(url(&format!("/api/customers/{id}")))
        .json(&json!({ "city": "Cambridge" }))
        .send()
        .await
        .expect("Request failed");
    let updated = expect_json(response, StatusCode::OK).await;
    assert_eq!(updated["data"]["city"], "Cambridge");
    assert_eq!(updated["data"]["firstname"], "Ada");

    let search = get_ok(&client, "/api/customers/search/lovelace").await;
    assert!(
        search["data"]
            .as_array()
            .expect("customers")
            .iter()
            .any(|c| c["id"] == id)
    );

    let response = client
        .delete(url(&format!("/api/customers/{id}")))
        .send()
        .await
        .expect("Request failed");
    expect_json(response, StatusCode::OK).await;

    let response = client
        .delete(url(&format!("/api/customers/{id}")))
        .send()
        .await
        .expect("Request failed");
    expect_json(response, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_statistics_add_up() {
    let body = get_ok(&client(), "/api/customers/statistics").await;
    let stats = &body["data"];
    let total = stats["totalCustomers"].as_i64().expect("total");
    let registered = stats["registeredCustomers"].as_i64().expect("registered");
    let guests = stats["guestCustomers"].as_i64().expect("guests");
    assert_eq!(total, registered + guests);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_search_wildcards_match_literally() {
    let client = client();
    let email = unique_email("wild");

    let response = client
        .post(url("/api/customers"))
        .json(&json!({
            "firstname": "Percy", "lastname": "Wildcard", "email": email, "phone": "1",
            "address": "x", "city": "Leeds", "country": "UK", "postalCode": "LS1",
        }))
        .send()
        .await
        .expect("Request failed");
    let created = expect_json(response, StatusCode::CREATED).await;
    let id = created["data"]["id"].as_i64().expect("customer id");

    // `%25` is a literal percent sign; no customer name or email contains one.
    let body = get_ok(&client, "/api/customers/search/%25").await;
    assert!(
        !body["data"]
            .as_array()
            .expect("customers")
            .iter()
            .any(|c| c["id"] == id)
    );

    let body = get_ok(&client, "/api/customers/search/Wildcar_").await;
    assert_eq!(body["count"], 0);

    client
        .delete(url(&format!("/api/customers/{id}")))
        .send()
        .await
        .expect("Request failed");
}
