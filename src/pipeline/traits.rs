use async_trait::async_trait;
use std::fmt::Debug;

use crate::pipeline::context::RequestContext;
use crate::pipeline::error::PipelineError;
use crate::pipeline::validation::ValidationFailures;
use crate::types::{Policy, Role};

/// Authorization rule declared by a request.
///
/// A request with no rules is open to anyone. Any rule at all requires a
/// signed-in user; roles across all rules are alternatives, policies are
/// each mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authorize {
    pub roles: &'static [Role],
    pub policy: Option<Policy>,
}

impl Authorize {
    /// Any signed-in user
    pub const AUTHENTICATED: Authorize = Authorize { roles: &[], policy: None };

    pub const fn roles(roles: &'static [Role]) -> Self {
        Self { roles, policy: None }
    }

    pub const fn policy(policy: Policy) -> Self {
        Self { roles: &[], policy: Some(policy) }
    }
}

/// A command or query handled through the pipeline
#[async_trait]
pub trait Request: Debug + Send + Sync + Sized + 'static {
    type Response: Send;

    /// Name used in pipeline logs
    const NAME: &'static str;

    fn authorization(&self) -> &'static [Authorize] {
        &[]
    }

    /// All failures are collected; an empty result lets the handler run
    async fn validate(&self, _ctx: &RequestContext) -> Result<ValidationFailures, PipelineError> {
        Ok(ValidationFailures::default())
    }

    async fn handle(self, ctx: &RequestContext) -> Result<Self::Response, PipelineError>;
}
