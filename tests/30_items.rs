mod common;

use anyhow::Result;
use common::{login_new_user, spawn_server};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn item_crud_round() -> Result<()> {
    let server = spawn_server().await?;
    let client = reqwest::Client::new();
    let token = login_new_user(&server, "alice").await?;

    let res = client
        .post(server.url("/api/items"))
        .bearer_auth(&token)
        .json(&json!({
            "sku": "  BOLT-7 ",
            "name": "Hex bolt",
            "qty": "12",
            "location": "Shelf A",
            "purchase_price": "0.35"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = res.json::<Value>().await?["data"].clone();
    assert_eq!(created["sku"], "BOLT-7");
    assert_eq!(created["qty"], 12);
    assert_eq!(created["purchase_price"], 0.35);
    let id = created["id"].as_str().expect("id").to_string();

    let res = client
        .put(server.url(&format!("/api/items/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "sku": "CHANGED", "name": "Hex bolt M6", "qty": "lots" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = res.json::<Value>().await?["data"].clone();
    assert_eq!(updated["sku"], "BOLT-7");
    assert_eq!(updated["name"], "Hex bolt M6");
    assert_eq!(updated["qty"], 0);

    let list = client
        .get(server.url("/api/items"))
        .bearer_auth(&token)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(list["data"].as_array().map(Vec::len), Some(1));

    let res = client
        .delete(server.url(&format!("/api/items/{id}")))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(server.url(&format!("/api/items/{id}")))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn items_are_scoped_to_their_owner() -> Result<()> {
    let server = spawn_server().await?;
    let client = reqwest::Client::new();
    let alice = login_new_user(&server, "alice").await?;
    let bob = login_new_user(&server, "bob").await?;

    let res = client
        .post(server.url("/api/items"))
        .bearer_auth(&alice)
        .json(&json!({ "sku": "SHARED-1", "name": "Alice's widget" }))
        .send()
        .await?;
    let id = res.json::<Value>().await?["data"]["id"].as_str().expect("id").to_string();

    // Same SKU is fine for a different owner
    let res = client
        .post(server.url("/api/items"))
        .bearer_auth(&bob)
        .json(&json!({ "sku": "SHARED-1", "name": "Bob's widget" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let bob_list = client
        .get(server.url("/api/items"))
        .bearer_auth(&bob)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(bob_list["data"][0]["name"], "Bob's widget");
    assert_eq!(bob_list["data"].as_array().map(Vec::len), Some(1));

    let item_url = server.url(&format!("/api/items/{id}"));
    assert_eq!(client.get(&item_url).bearer_auth(&bob).send().await?.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        client
            .put(&item_url)
            .bearer_auth(&bob)
            .json(&json!({ "name": "stolen" }))
            .send()
            .await?
            .status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(client.delete(&item_url).bearer_auth(&bob).send().await?.status(), StatusCode::FORBIDDEN);

    // Still intact for the owner
    let res = client.get(&item_url).bearer_auth(&alice).send().await?;
    assert_eq!(res.json::<Value>().await?["data"]["name"], "Alice's widget");
    Ok(())
}

#[tokio::test]
async fn duplicate_sku_and_validation() -> Result<()> {
    let server = spawn_server().await?;
    let client = reqwest::Client::new();
    let token = login_new_user(&server, "erin").await?;

    let post = |body: Value| {
        client
            .post(server.url("/api/items"))
            .bearer_auth(&token)
            .json(&body)
            .send()
    };

    assert_eq!(post(json!({ "sku": "A-1", "name": "Anvil" })).await?.status(), StatusCode::CREATED);

    let res = post(json!({ "sku": "A-1", "name": "Another anvil" })).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(res.json::<Value>().await?["error"], "SKU already exists");

    let res = post(json!({ "sku": "   ", "name": "Blank" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["error"], "SKU and name required");

    let res = client
        .get(server.url("/api/items/not-a-uuid"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
