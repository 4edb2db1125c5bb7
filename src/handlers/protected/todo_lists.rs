// handlers/protected/todo_lists.rs - /api/TodoLists handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::application::todo_lists::{
    CreateTodoList, DeleteTodoList, GetTodos, PurgeTodoLists, TodosVm, UpdateTodoList,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/TodoLists - every list with its items, plus the priority lookup
pub async fn todo_lists_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<TodosVm> {
    let vm = state.sender(Some(&user)).send(GetTodos).await?;
    Ok(ApiResponse::success(vm))
}

/// POST /api/TodoLists - 201 with the new list id
pub async fn todo_lists_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(command): Json<CreateTodoList>,
) -> ApiResult<i64> {
    let id = state.sender(Some(&user)).send(command).await?;
    Ok(ApiResponse::created(id))
}

/// DELETE /api/TodoLists - drop all lists (administrators holding CanPurge)
pub async fn todo_lists_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<()> {
    state.sender(Some(&user)).send(PurgeTodoLists).await?;
    Ok(ApiResponse::no_content())
}

/// PUT /api/TodoLists/:id
pub async fn todo_list_put(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Json(command): Json<UpdateTodoList>,
) -> ApiResult<()> {
    if command.id != id {
        return Err(ApiError::bad_request());
    }
    state.sender(Some(&user)).send(command).await?;
    Ok(ApiResponse::no_content())
}

/// DELETE /api/TodoLists/:id - items go with the list
pub async fn todo_list_delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<()> {
    state.sender(Some(&user)).send(DeleteTodoList { id }).await?;
    Ok(ApiResponse::no_content())
}
