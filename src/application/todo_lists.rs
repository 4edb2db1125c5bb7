use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::application::common::validate_title;
use crate::database::models::{TodoItem, TodoList};
use crate::database::{todo_items, todo_lists};
use crate::pipeline::{Authorize, PipelineError, Request, RequestContext, ValidationFailures};
use crate::types::{Colour, LookupDto, Policy, PriorityLevel, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodosVm {
    pub priority_levels: Vec<LookupDto>,
    pub lists: Vec<TodoListDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoListDto {
    pub id: i64,
    pub title: String,
    pub colour: String,
    pub items: Vec<TodoItemDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemDto {
    pub id: i64,
    pub list_id: i64,
    pub title: Option<String>,
    pub done: bool,
    pub priority: PriorityLevel,
    pub note: Option<String>,
}

impl From<TodoItem> for TodoItemDto {
    fn from(item: TodoItem) -> Self {
        Self {
            priority: item.priority(),
            id: item.id,
            list_id: item.list_id,
            title: item.title,
            done: item.done,
            note: item.note,
        }
    }
}

impl TodoListDto {
    fn new(list: TodoList, items: Vec<TodoItemDto>) -> Self {
        Self {
            colour: list.colour().code().to_string(),
            id: list.id,
            title: list.title,
            items,
        }
    }
}

/// Every list with its items, plus the priority lookup
#[derive(Debug, Default)]
pub struct GetTodos;

#[async_trait]
impl Request for GetTodos {
    type Response = TodosVm;
    const NAME: &'static str = "GetTodosQuery";

    fn authorization(&self) -> &'static [Authorize] {
        &[Authorize::AUTHENTICATED]
    }

    async fn handle(self, ctx: &RequestContext) -> Result<TodosVm, PipelineError> {
        let lists = todo_lists::all_ordered_by_title(&ctx.pool).await?;

        let mut items_by_list: HashMap<i64, Vec<TodoItemDto>> = HashMap::new();
        for item in todo_items::all(&ctx.pool).await? {
            items_by_list.entry(item.list_id).or_default().push(item.into());
        }

        let lists = lists
            .into_iter()
            .map(|list| {
                let items = items_by_list.remove(&list.id).unwrap_or_default();
                TodoListDto::new(list, items)
            })
            .collect();

        Ok(TodosVm {
            priority_levels: PriorityLevel::lookups(),
            lists,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoList {
    #[serde(default)]
    pub title: Option<String>,
}

#[async_trait]
impl Request for CreateTodoList {
    type Response = i64;
    const NAME: &'static str = "CreateTodoListCommand";

    async fn validate(&self, ctx: &RequestContext) -> Result<ValidationFailures, PipelineError> {
        let mut failures = ValidationFailures::new();
        let title = self.title.as_deref();
        if validate_title(&mut failures, title) {
            let title = title.unwrap_or_default();
            if todo_lists::title_taken(&ctx.pool, title, None).await? {
                failures.add("Title", "'Title' must be unique.");
            }
        }
        Ok(failures)
    }

    async fn handle(self, ctx: &RequestContext) -> Result<i64, PipelineError> {
        let title = self.title.unwrap_or_default();
        let id = todo_lists::insert(&ctx.pool, &title, Colour::default(), &ctx.audit_stamp()).await?;
        tracing::debug!("Created todo list {} '{}'", id, title);
        Ok(id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoList {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

#[async_trait]
impl Request for UpdateTodoList {
    type Response = ();
    const NAME: &'static str = "UpdateTodoListCommand";

    async fn validate(&self, ctx: &RequestContext) -> Result<ValidationFailures, PipelineError> {
        let mut failures = ValidationFailures::new();
        let title = self.title.as_deref();
        if validate_title(&mut failures, title) {
            let title = title.unwrap_or_default();
            if todo_lists::title_taken(&ctx.pool, title, Some(self.id)).await? {
                failures.add("Title", "'Title' must be unique.");
            }
        }
        Ok(failures)
    }

    async fn handle(self, ctx: &RequestContext) -> Result<(), PipelineError> {
        if !todo_lists::exists(&ctx.pool, self.id).await? {
            return Err(PipelineError::not_found("TodoList", self.id));
        }
        let title = self.title.unwrap_or_default();
        todo_lists::update_title(&ctx.pool, self.id, &title, &ctx.audit_stamp()).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteTodoList {
    pub id: i64,
}

#[async_trait]
impl Request for DeleteTodoList {
    type Response = ();
    const NAME: &'static str = "DeleteTodoListCommand";

    async fn handle(self, ctx: &RequestContext) -> Result<(), PipelineError> {
        if !todo_lists::delete(&ctx.pool, self.id).await? {
            return Err(PipelineError::not_found("TodoList", self.id));
        }
        Ok(())
    }
}

/// Remove every list and item. Administrators only.
#[derive(Debug, Default)]
pub struct PurgeTodoLists;

const PURGE_RULES: &[Authorize] = &[
    Authorize::roles(&[Role::Administrator]),
    Authorize::policy(Policy::CanPurge),
];

#[async_trait]
impl Request for PurgeTodoLists {
    type Response = ();
    const NAME: &'static str = "PurgeTodoListsCommand";

    fn authorization(&self) -> &'static [Authorize] {
        PURGE_RULES
    }

    async fn handle(self, ctx: &RequestContext) -> Result<(), PipelineError> {
        let removed = todo_lists::delete_all(&ctx.pool).await?;
        tracing::info!("Purged {} todo lists", removed);
        Ok(())
    }
}
