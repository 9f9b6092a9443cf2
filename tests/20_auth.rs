mod common;

use anyhow::Result;
use common::{register, session_cookie, spawn_server};
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn register_login_whoami_logout() -> Result<()> {
    let server = spawn_server().await?;
    let client = reqwest::Client::new();

    let res = register(&server, "alice", "s3cret").await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert!(body["data"]["user"].get("password_hash").is_none());

    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "username": "alice", "password": "s3cret" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie(&res).expect("login sets a session cookie");
    let body = res.json::<Value>().await?;
    let token = body["data"]["token"].as_str().expect("token").to_string();

    // Bearer token
    let res = client
        .get(server.url("/api/auth/whoami"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["data"]["username"], "alice");

    // Session cookie
    let res = client
        .get(server.url("/api/auth/whoami"))
        .header(header::COOKIE, &cookie)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.post(server.url("/auth/logout")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = session_cookie(&res).expect("logout clears the cookie");
    assert!(cleared.ends_with('='), "cookie should be emptied: {cleared}");
    Ok(())
}

#[tokio::test]
async fn duplicate_username_conflicts() -> Result<()> {
    let server = spawn_server().await?;

    assert_eq!(register(&server, "bob", "pw").await?.status(), StatusCode::CREATED);

    let res = register(&server, "bob", "other").await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Username already exists");
    Ok(())
}

#[tokio::test]
async fn registration_validation_errors() -> Result<()> {
    let server = spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/auth/register"))
        .json(&json!({ "username": "carol", "email": "c@example.com", "password": "a", "confirm": "b" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["error"], "Passwords do not match");

    let res = client
        .post(server.url("/auth/register"))
        .json(&json!({ "username": "carol" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["error"], "All fields are required");
    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_rejected() -> Result<()> {
    let server = spawn_server().await?;
    let client = reqwest::Client::new();
    register(&server, "dave", "right").await?;

    for (username, password) in [("dave", "wrong"), ("nobody", "right")] {
        let res = client
            .post(server.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.json::<Value>().await?["error"], "Invalid credentials");
    }
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_session() -> Result<()> {
    let server = spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/items")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(server.url("/api/auth/whoami"))
        .bearer_auth("not-a-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
