use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::common::{validate_title, PaginatedList};
use crate::database::models::TodoItem;
use crate::database::{todo_items, todo_lists};
use crate::pipeline::{DomainEvent, PipelineError, Request, RequestContext, ValidationFailures};
use crate::types::PriorityLevel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemBriefDto {
    pub id: i64,
    pub list_id: i64,
    pub title: Option<String>,
    pub done: bool,
}

impl From<TodoItem> for TodoItemBriefDto {
    fn from(item: TodoItem) -> Self {
        Self {
            id: item.id,
            list_id: item.list_id,
            title: item.title,
            done: item.done,
        }
    }
}

fn default_page_number() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

/// A page of one list's items, ordered by title
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTodoItemsWithPagination {
    #[serde(default)]
    pub list_id: i64,
    #[serde(default = "default_page_number")]
    pub page_number: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

#[async_trait]
impl Request for GetTodoItemsWithPagination {
    type Response = PaginatedList<TodoItemBriefDto>;
    const NAME: &'static str = "GetTodoItemsWithPaginationQuery";

    async fn validate(&self, _ctx: &RequestContext) -> Result<ValidationFailures, PipelineError> {
        let mut failures = ValidationFailures::new();
        if self.list_id == 0 {
            failures.add("ListId", "ListId is required.");
        }
        if self.page_number < 1 {
            failures.add("PageNumber", "PageNumber at least greater than or equal to 1.");
        }
        if self.page_size < 1 {
            failures.add("PageSize", "PageSize at least greater than or equal to 1.");
        }
        Ok(failures)
    }

    async fn handle(self, ctx: &RequestContext) -> Result<Self::Response, PipelineError> {
        let total_count = todo_items::count_for_list(&ctx.pool, self.list_id).await?;
        let offset = PaginatedList::<TodoItemBriefDto>::offset(self.page_number, self.page_size);
        let items = todo_items::page_for_list(&ctx.pool, self.list_id, offset, self.page_size)
            .await?
            .into_iter()
            .map(TodoItemBriefDto::from)
            .collect();

        Ok(PaginatedList::new(items, total_count, self.page_number, self.page_size))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoItem {
    #[serde(default)]
    pub list_id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

#[async_trait]
impl Request for CreateTodoItem {
    type Response = i64;
    const NAME: &'static str = "CreateTodoItemCommand";

    async fn validate(&self, _ctx: &RequestContext) -> Result<ValidationFailures, PipelineError> {
        let mut failures = ValidationFailures::new();
        validate_title(&mut failures, self.title.as_deref());
        Ok(failures)
    }

    async fn handle(self, ctx: &RequestContext) -> Result<i64, PipelineError> {
        if !todo_lists::exists(&ctx.pool, self.list_id).await? {
            return Err(PipelineError::not_found("TodoList", self.list_id));
        }

        let title = self.title.unwrap_or_default();
        let id = todo_items::insert(&ctx.pool, self.list_id, &title, &ctx.audit_stamp()).await?;

        ctx.publish(DomainEvent::TodoItemCreated { item_id: id, list_id: self.list_id }).await;
        Ok(id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoItem {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub done: bool,
}

#[async_trait]
impl Request for UpdateTodoItem {
    type Response = ();
    const NAME: &'static str = "UpdateTodoItemCommand";

    async fn validate(&self, _ctx: &RequestContext) -> Result<ValidationFailures, PipelineError> {
        let mut failures = ValidationFailures::new();
        validate_title(&mut failures, self.title.as_deref());
        Ok(failures)
    }

    async fn handle(self, ctx: &RequestContext) -> Result<(), PipelineError> {
        let Some(mut item) = todo_items::find(&ctx.pool, self.id).await? else {
            return Err(PipelineError::not_found("TodoItem", self.id));
        };

        let completed = self.done && !item.done;
        item.title = self.title;
        item.done = self.done;
        todo_items::update(&ctx.pool, &item, &ctx.audit_stamp()).await?;

        if completed {
            ctx.publish(DomainEvent::TodoItemCompleted { item_id: item.id, list_id: item.list_id }).await;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoItemDetail {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub list_id: i64,
    #[serde(default)]
    pub priority: PriorityLevel,
    #[serde(default)]
    pub note: Option<String>,
}

#[async_trait]
impl Request for UpdateTodoItemDetail {
    type Response = ();
    const NAME: &'static str = "UpdateTodoItemDetailCommand";

    async fn handle(self, ctx: &RequestContext) -> Result<(), PipelineError> {
        let Some(mut item) = todo_items::find(&ctx.pool, self.id).await? else {
            return Err(PipelineError::not_found("TodoItem", self.id));
        };
        if item.list_id != self.list_id && !todo_lists::exists(&ctx.pool, self.list_id).await? {
            return Err(PipelineError::not_found("TodoList", self.list_id));
        }

        item.list_id = self.list_id;
        item.priority = self.priority.into();
        item.note = self.note;
        todo_items::update(&ctx.pool, &item, &ctx.audit_stamp()).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteTodoItem {
    pub id: i64,
}

#[async_trait]
impl Request for DeleteTodoItem {
    type Response = ();
    const NAME: &'static str = "DeleteTodoItemCommand";

    async fn handle(self, ctx: &RequestContext) -> Result<(), PipelineError> {
        let Some(item) = todo_items::find(&ctx.pool, self.id).await? else {
            return Err(PipelineError::not_found("TodoItem", self.id));
        };

        todo_items::delete(&ctx.pool, item.id).await?;
        ctx.publish(DomainEvent::TodoItemDeleted { item_id: item.id, list_id: item.list_id }).await;
        Ok(())
    }
}
