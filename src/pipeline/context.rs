use sqlx::SqlitePool;
use std::sync::Arc;

use crate::database::models::AuditStamp;
use crate::identity::IdentityService;
use crate::pipeline::events::{DomainEvent, EventDispatcher};

/// Everything a request handler may touch
#[derive(Clone)]
pub struct RequestContext {
    /// Id of the signed-in user, if any
    pub user_id: Option<String>,
    pub pool: SqlitePool,
    pub identity: Arc<dyn IdentityService>,
    pub events: EventDispatcher,
}

impl RequestContext {
    pub fn new(pool: SqlitePool, identity: Arc<dyn IdentityService>, events: EventDispatcher) -> Self {
        Self {
            user_id: None,
            pool,
            identity,
            events,
        }
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Audit values for a row written now by the current user
    pub fn audit_stamp(&self) -> AuditStamp {
        AuditStamp::now(self.user_id.clone())
    }

    pub async fn publish(&self, event: DomainEvent) {
        self.events.dispatch(event).await;
    }
}
