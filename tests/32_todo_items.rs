mod common;

use anyhow::Result;
use architex_api::pipeline::DomainEvent;
use axum::http::StatusCode;
use common::{Auth, TestApp};
use serde_json::{json, Value};

async fn new_list(app: &TestApp, token: &str, title: &str) -> Result<i64> {
    let res = app.post("/api/TodoLists", Auth::Bearer(token), json!({ "title": title })).await?;
    Ok(res.json()?.as_i64().unwrap_or_default())
}

async fn new_item(app: &TestApp, token: &str, list_id: i64, title: &str) -> Result<i64> {
    let res = app
        .post("/api/TodoItems", Auth::Bearer(token), json!({ "listId": list_id, "title": title }))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    Ok(res.json()?.as_i64().unwrap_or_default())
}

#[tokio::test]
async fn create_item_raises_created_event() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.signed_in_user("items@example.com").await?;
    let list = new_list(&app, &token, "Errands").await?;

    let item = new_item(&app, &token, list, "Post letter").await?;

    assert!(app
        .events
        .events()
        .contains(&DomainEvent::TodoItemCreated { item_id: item, list_id: list }));
    Ok(())
}

#[tokio::test]
async fn create_item_validates_title_and_list() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.signed_in_user("itemval@example.com").await?;
    let list = new_list(&app, &token, "Errands").await?;

    let empty = app
        .post("/api/TodoItems", Auth::Bearer(&token), json!({ "listId": list, "title": "" }))
        .await?;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert!(empty.json()?["errors"]["Title"].is_array());

    let no_list = app
        .post("/api/TodoItems", Auth::Bearer(&token), json!({ "listId": 4242, "title": "Orphan" }))
        .await?;
    assert_eq!(no_list.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn items_page_in_title_order() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.signed_in_user("paging@example.com").await?;
    let list = new_list(&app, &token, "Alphabet").await?;
    for title in ["delta", "alpha", "charlie", "bravo", "echo"] {
        new_item(&app, &token, list, title).await?;
    }

    let page = app
        .get(&format!("/api/TodoItems?listId={}&pageNumber=2&pageSize=2", list), Auth::Bearer(&token))
        .await?;
    assert_eq!(page.status, StatusCode::OK);
    let page = page.json()?;

    let titles: Vec<_> = page["items"]
        .as_array()
        .map(|items| items.iter().map(|i| i["title"].clone()).collect())
        .unwrap_or_else(Vec::<Value>::new);
    assert_eq!(titles, vec![json!("charlie"), json!("delta")]);
    assert_eq!(page["pageNumber"], 2);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["totalCount"], 5);
    assert_eq!(page["hasPreviousPage"], true);
    assert_eq!(page["hasNextPage"], true);
    Ok(())
}

#[tokio::test]
async fn huge_page_arguments_return_sensible_pages() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.signed_in_user("hugepage@example.com").await?;
    let list = new_list(&app, &token, "Big").await?;
    new_item(&app, &token, list, "only").await?;

    let whole = app
        .get(
            &format!("/api/TodoItems?listId={}&pageNumber=1&pageSize={}", list, i64::MAX),
            Auth::Bearer(&token),
        )
        .await?;
    assert_eq!(whole.status, StatusCode::OK);
    let whole = whole.json()?;
    assert_eq!(whole["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(whole["totalPages"], 1);
    assert_eq!(whole["hasNextPage"], false);

    let far = app
        .get(
            &format!("/api/TodoItems?listId={}&pageNumber={}&pageSize=10", list, i64::MAX),
            Auth::Bearer(&token),
        )
        .await?;
    assert_eq!(far.status, StatusCode::OK);
    let far = far.json()?;
    assert_eq!(far["items"].as_array().map(Vec::len), Some(0));
    assert_eq!(far["totalPages"], 1);
    assert_eq!(far["hasPreviousPage"], true);
    Ok(())
}

#[tokio::test]
async fn paging_arguments_are_validated() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.signed_in_user("pagingval@example.com").await?;

    let res = app
        .get("/api/TodoItems?pageNumber=0&pageSize=0", Auth::Bearer(&token))
        .await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let errors = &res.json()?["errors"];
    assert_eq!(errors["ListId"][0], "ListId is required.");
    assert_eq!(errors["PageNumber"][0], "PageNumber at least greater than or equal to 1.");
    assert_eq!(errors["PageSize"][0], "PageSize at least greater than or equal to 1.");
    Ok(())
}

#[tokio::test]
async fn completing_an_item_raises_completed_once() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.signed_in_user("done@example.com").await?;
    let list = new_list(&app, &token, "Today").await?;
    let item = new_item(&app, &token, list, "Walk dog").await?;

    let body = json!({ "id": item, "title": "Walk the dog", "done": true });
    let res = app.put(&format!("/api/TodoItems/{}", item), Auth::Bearer(&token), body.clone()).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    app.put(&format!("/api/TodoItems/{}", item), Auth::Bearer(&token), body).await?;

    let completed = app
        .events
        .events()
        .into_iter()
        .filter(|e| matches!(e, DomainEvent::TodoItemCompleted { .. }))
        .count();
    assert_eq!(completed, 1);

    let vm = app.get("/api/TodoLists", Auth::Bearer(&token)).await?.json()?;
    assert_eq!(vm["lists"][0]["items"][0]["title"], "Walk the dog");
    assert_eq!(vm["lists"][0]["items"][0]["done"], true);
    Ok(())
}

#[tokio::test]
async fn update_item_checks_ids_and_existence() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.signed_in_user("itemids@example.com").await?;

    let mismatch = app
        .put("/api/TodoItems/1", Auth::Bearer(&token), json!({ "id": 2, "title": "x", "done": false }))
        .await?;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);

    let missing = app
        .put("/api/TodoItems/77", Auth::Bearer(&token), json!({ "id": 77, "title": "x", "done": false }))
        .await?;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn update_detail_moves_item_and_sets_priority_and_note() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.signed_in_user("detail@example.com").await?;
    let from = new_list(&app, &token, "A list").await?;
    let to = new_list(&app, &token, "B list").await?;
    let item = new_item(&app, &token, from, "Movable").await?;

    let res = app
        .put(
            &format!("/api/TodoItems/UpdateDetail/{}", item),
            Auth::Bearer(&token),
            json!({ "id": item, "listId": to, "priority": 3, "note": "urgent" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let vm = app.get("/api/TodoLists", Auth::Bearer(&token)).await?.json()?;
    assert_eq!(vm["lists"][0]["items"], json!([]));
    let moved = &vm["lists"][1]["items"][0];
    assert_eq!(moved["listId"], to);
    assert_eq!(moved["priority"], 3);
    assert_eq!(moved["note"], "urgent");

    let mismatch = app
        .put(
            &format!("/api/TodoItems/UpdateDetail/{}", item),
            Auth::Bearer(&token),
            json!({ "id": item + 1, "listId": to, "priority": 0 }),
        )
        .await?;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn delete_item_raises_deleted_event() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.signed_in_user("delitem@example.com").await?;
    let list = new_list(&app, &token, "Temp").await?;
    let item = new_item(&app, &token, list, "Gone soon").await?;

    let res = app.delete(&format!("/api/TodoItems/{}", item), Auth::Bearer(&token)).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let again = app.delete(&format!("/api/TodoItems/{}", item), Auth::Bearer(&token)).await?;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    assert!(app
        .events
        .events()
        .contains(&DomainEvent::TodoItemDeleted { item_id: item, list_id: list }));
    Ok(())
}
