//! User registration, login, addresses and favorites.
//!
//! These tests require a running API backed by a migrated database seeded
//! with `demo/catalog.yaml`.

use reqwest::StatusCode;
use serde_json::{Value, json};

use scoop_integration_tests::{client, expect_json, get_ok, unique_email, url};

async fn register(client: &reqwest::Client, email: &str) -> Value {
    let response = client
        .post(url("/api/users/register-customer"))
        .json(&json!({
            "email": email,
            "password": "correct horse battery",
            "fullname": "Grace Hopper",
            "phone": "+1 555 0100",
            "city": "Arlington",
        }))
        .send()
        .await
        .expect("Request failed");
    expect_json(response, StatusCode::CREATED).await
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_register_then_login() {
    let client = client();
    let email = unique_email("grace");

    let registered = register(&client, &email).await;
    assert_eq!(registered["data"]["role"], "customer");
    assert_eq!(registered["data"]["profile"]["fullname"], "Grace Hopper");
    assert!(registered["data"].get("passwordHash").is_none());

    // Same email again
    let response = client
        .post(url("/api/users/register-customer"))
        .json(&json!({
            "email": email, "password": "correct horse battery",
            "fullname": "Grace Again", "phone": "1",
        }))
        .send()
        .await
        .expect("Request failed");
    expect_json(response, StatusCode::CONFLICT).await;

    let response = client
        .post(url("/api/users/login-customer"))
        .json(&json!({ "email": email, "password": "correct horse battery" }))
        .send()
        .await
        .expect("Request failed");
    let login = expect_json(response, StatusCode::OK).await;
    assert_eq!(login["data"]["email"], email);

    let response = client
        .post(url("/api/users/login-customer"))
        .json(&json!({ "email": email, "password": "wrong horse battery" }))
        .send()
        .await
        .expect("Request failed");
    expect_json(response, StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_staff_cannot_use_customer_login() {
    let client = client();
    let email = unique_email("rider");

    let response = client
        .post(url("/api/users/register-with-role"))
        .json(&json!({ "email": email, "password": "pedal-pushers", "role": "rider" }))
        .send()
        .await
        .expect("Request failed");
    expect_json(response, StatusCode::CREATED).await;

    let response = client
        .post(url("/api/users/login-customer"))
        .json(&json!({ "email": email, "password": "pedal-pushers" }))
        .send()
        .await
        .expect("Request failed");
    expect_json(response, StatusCode::UNAUTHORIZED).await;

    let response = client
        .post(url("/api/users/register-with-role"))
        .json(&json!({ "email": unique_email("x"), "password": "pedal-pushers", "role": "customer" }))
        .send()
        .await
        .expect("Request failed");
    expect_json(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_addresses_and_favorites() {
    let client = client();
    let registered = register(&client, &unique_email("ada")).await;
    let user_id = registered["data"]["id"].as_i64().expect("user id");

    let response = client
        .post(url(&format!("/api/users/{user_id}/addresses")))
        .json(&json!({
            "addressType": "home",
            "streetAddress": "1 Compiler Way",
            "city": "Arlington",
            "state": "VA",
            "country": "US",
            "postalCode": "22201",
            "isDefault": true,
        }))
        .send()
        .await
        .expect("Request failed");
    let address = expect_json(response, StatusCode::CREATED).await;
    let address_id = address["data"]["id"].as_i64().expect("address id");

    let list = get_ok(&client, &format!("/api/users/{user_id}/addresses")).await;
    assert_eq!(list["count"], 1);

    let response = client
        .delete(url(&format!("/api/users/{user_id}/addresses/{address_id}")))
        .send()
        .await
        .expect("Request failed");
    expect_json(response, StatusCode::OK).await;

    let products = get_ok(&client, "/api/products?limit=1").await;
    let product_id = products["data"][0]["id"].as_i64().expect("a seeded product");

    let favorite = format!("/api/users/{user_id}/favorites/{product_id}");
    let first = client.post(url(&favorite)).send().await.expect("Request failed");
    let first = expect_json(first, StatusCode::OK).await;
    let second = client.post(url(&favorite)).send().await.expect("Request failed");
    let second = expect_json(second, StatusCode::OK).await;
    assert_eq!(first["data"]["wishlistId"], second["data"]["wishlistId"]);

    let favorites = get_ok(&client, &format!("/api/users/{user_id}/favorites")).await;
    assert_eq!(favorites["count"], 1);

    let removed = client.delete(url(&favorite)).send().await.expect("Request failed");
    expect_json(removed, StatusCode::OK).await;
}
