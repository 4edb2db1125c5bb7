use async_trait::async_trait;
use std::sync::Arc;

/// Something that happened to a to-do item, published once the change is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    TodoItemCreated { item_id: i64, list_id: i64 },
    TodoItemCompleted { item_id: i64, list_id: i64 },
    TodoItemDeleted { item_id: i64, list_id: i64 },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::TodoItemCreated { .. } => "TodoItemCreatedEvent",
            DomainEvent::TodoItemCompleted { .. } => "TodoItemCompletedEvent",
            DomainEvent::TodoItemDeleted { .. } => "TodoItemDeletedEvent",
        }
    }
}

#[async_trait]
pub trait DomainEventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

pub struct LoggingEventHandler;

#[async_trait]
impl DomainEventHandler for LoggingEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        tracing::info!("Domain Event: {} {:?}", event.name(), event);
    }
}

/// Fans each event out to every registered handler, in registration order
#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn DomainEventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with the logging handler registered
    pub fn with_logging() -> Self {
        Self::new().register(Arc::new(LoggingEventHandler))
    }

    pub fn register(mut self, handler: Arc<dyn DomainEventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub async fn dispatch(&self, event: DomainEvent) {
        for handler in &self.handlers {
            handler.handle(&event).await;
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
