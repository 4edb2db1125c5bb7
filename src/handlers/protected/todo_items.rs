// handlers/protected/todo_items.rs - /api/TodoItems handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::application::common::PaginatedList;
use crate::application::todo_items::{
    CreateTodoItem, DeleteTodoItem, GetTodoItemsWithPagination, TodoItemBriefDto, UpdateTodoItem,
    UpdateTodoItemDetail,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/TodoItems?listId&pageNumber&pageSize
pub async fn todo_items_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<GetTodoItemsWithPagination>,
) -> ApiResult<PaginatedList<TodoItemBriefDto>> {
    let page = state.sender(Some(&user)).send(query).await?;
    Ok(ApiResponse::success(page))
}

pub async fn todo_items_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(command): Json<CreateTodoItem>,
) -> ApiResult<i64> {
    let id = state.sender(Some(&user)).send(command).await?;
    Ok(ApiResponse::created(id))
}

pub async fn todo_item_put(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Json(command): Json<UpdateTodoItem>,
) -> ApiResult<()> {
    if command.id != id {
        return Err(ApiError::bad_request());
    }
    state.sender(Some(&user)).send(command).await?;
    Ok(ApiResponse::no_content())
}

/// PUT /api/TodoItems/UpdateDetail/:id - move between lists, priority, note
pub async fn todo_item_detail_put(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Json(command): Json<UpdateTodoItemDetail>,
) -> ApiResult<()> {
    if command.id != id {
        return Err(ApiError::bad_request());
    }
    state.sender(Some(&user)).send(command).await?;
    Ok(ApiResponse::no_content())
}

pub async fn todo_item_delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<()> {
    state.sender(Some(&user)).send(DeleteTodoItem { id }).await?;
    Ok(ApiResponse::no_content())
}
