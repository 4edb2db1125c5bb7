mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{Auth, TestApp};
use serde_json::json;

#[tokio::test]
async fn lists_require_authentication() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.get("/api/TodoLists", Auth::None).await?;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()?["status"], 401);
    Ok(())
}

#[tokio::test]
async fn create_and_read_back_lists() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.signed_in_user("lists@example.com").await?;

    let created = app.post("/api/TodoLists", Auth::Bearer(&token), json!({ "title": "Groceries" })).await?;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.json()?.as_i64().expect("numeric id");

    app.post("/api/TodoLists", Auth::Bearer(&token), json!({ "title": "Chores" })).await?;

    let vm = app.get("/api/TodoLists", Auth::Bearer(&token)).await?.json()?;
    assert_eq!(vm["priorityLevels"].as_array().map(Vec::len), Some(4));
    assert_eq!(vm["priorityLevels"][3]["title"], "High");

    let lists = vm["lists"].as_array().expect("lists");
    let titles: Vec<_> = lists.iter().map(|l| l["title"].as_str().unwrap_or_default()).collect();
    assert_eq!(titles, vec!["Chores", "Groceries"]);

    let groceries = lists.iter().find(|l| l["id"] == id).expect("created list");
    assert_eq!(groceries["colour"], "#FFFFFF");
    assert_eq!(groceries["items"], json!([]));
    Ok(())
}

#[tokio::test]
async fn titles_are_required_bounded_and_unique() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.signed_in_user("titles@example.com").await?;

    let empty = app.post("/api/TodoLists", Auth::Bearer(&token), json!({ "title": "" })).await?;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.json()?["errors"]["Title"][0], "'Title' must not be empty.");

    let long = app
        .post("/api/TodoLists", Auth::Bearer(&token), json!({ "title": "x".repeat(201) }))
        .await?;
    assert_eq!(long.status, StatusCode::BAD_REQUEST);

    app.post("/api/TodoLists", Auth::Bearer(&token), json!({ "title": "Shopping" })).await?;
    let duplicate = app.post("/api/TodoLists", Auth::Bearer(&token), json!({ "title": "Shopping" })).await?;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.json()?["errors"]["Title"][0], "'Title' must be unique.");
    Ok(())
}

#[tokio::test]
async fn update_checks_ids_existence_and_uniqueness() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.signed_in_user("update@example.com").await?;

    let first = app.post("/api/TodoLists", Auth::Bearer(&token), json!({ "title": "One" })).await?.json()?;
    let second = app.post("/api/TodoLists", Auth::Bearer(&token), json!({ "title": "Two" })).await?.json()?;

    let mismatch = app
        .put(&format!("/api/TodoLists/{}", first), Auth::Bearer(&token), json!({ "id": second, "title": "Three" }))
        .await?;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);

    let missing = app
        .put("/api/TodoLists/9999", Auth::Bearer(&token), json!({ "id": 9999, "title": "Ghost" }))
        .await?;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let clash = app
        .put(&format!("/api/TodoLists/{}", first), Auth::Bearer(&token), json!({ "id": first, "title": "Two" }))
        .await?;
    assert_eq!(clash.status, StatusCode::BAD_REQUEST);

    // Keeping its own title is fine
    let same = app
        .put(&format!("/api/TodoLists/{}", first), Auth::Bearer(&token), json!({ "id": first, "title": "One" }))
        .await?;
    assert_eq!(same.status, StatusCode::NO_CONTENT);

    let renamed = app
        .put(&format!("/api/TodoLists/{}", first), Auth::Bearer(&token), json!({ "id": first, "title": "Uno" }))
        .await?;
    assert_eq!(renamed.status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn delete_removes_the_list_and_its_items() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.signed_in_user("delete@example.com").await?;

    let list = app.post("/api/TodoLists", Auth::Bearer(&token), json!({ "title": "Doomed" })).await?.json()?;
    app.post("/api/TodoItems", Auth::Bearer(&token), json!({ "listId": list, "title": "Item" }))
        .await?;

    let deleted = app.delete(&format!("/api/TodoLists/{}", list), Auth::Bearer(&token)).await?;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let again = app.delete(&format!("/api/TodoLists/{}", list), Auth::Bearer(&token)).await?;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let vm = app.get("/api/TodoLists", Auth::Bearer(&token)).await?.json()?;
    assert_eq!(vm["lists"], json!([]));
    Ok(())
}

#[tokio::test]
async fn purge_is_for_administrators_only() -> Result<()> {
    let app = TestApp::spawn().await?;
    let admin = app.signed_in_administrator().await?;
    let user = app.signed_in_user("regular@example.com").await?;

    let forbidden = app.delete("/api/TodoLists", Auth::Bearer(&user)).await?;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let purged = app.delete("/api/TodoLists", Auth::Bearer(&admin)).await?;
    assert_eq!(purged.status, StatusCode::NO_CONTENT);

    let vm = app.get("/api/TodoLists", Auth::Bearer(&user)).await?.json()?;
    assert_eq!(vm["lists"], json!([]));
    Ok(())
}
