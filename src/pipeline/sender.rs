use std::time::{Duration, Instant};

use crate::pipeline::context::RequestContext;
use crate::pipeline::error::PipelineError;
use crate::pipeline::traits::{Authorize, Request};
use crate::types::Role;

/// Sends requests through the behaviour stages and on to their handlers
pub struct Sender {
    ctx: RequestContext,
    slow_request_threshold: Duration,
}

impl Sender {
    pub fn new(ctx: RequestContext, slow_request_threshold: Duration) -> Self {
        Self {
            ctx,
            slow_request_threshold,
        }
    }

    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response, PipelineError> {
        let start_time = Instant::now();
        let user_id = self.ctx.user_id.clone().unwrap_or_default();
        let user_name = self.user_name().await;

        tracing::info!("Request: {} {} {} {:?}", R::NAME, user_id, user_name, request);
        let description = format!("{:?}", request);

        let result = self.process(request).await;

        if let Err(error) = &result {
            if error.is_unhandled() {
                tracing::error!(
                    "Request: Unhandled Exception for Request {} {}: {}",
                    R::NAME,
                    description,
                    error
                );
            }
        }

        let elapsed = start_time.elapsed();
        if elapsed > self.slow_request_threshold {
            tracing::warn!(
                "Long Running Request: {} ({} milliseconds) {} {} {}",
                R::NAME,
                elapsed.as_millis(),
                user_id,
                user_name,
                description
            );
        }

        result
    }

    async fn process<R: Request>(&self, request: R) -> Result<R::Response, PipelineError> {
        self.authorize(request.authorization()).await?;

        let failures = request.validate(&self.ctx).await?;
        if !failures.is_empty() {
            tracing::debug!("Request {} failed validation with {} failures", R::NAME, failures.len());
            return Err(PipelineError::Validation(failures));
        }

        request.handle(&self.ctx).await
    }

    async fn authorize(&self, rules: &[Authorize]) -> Result<(), PipelineError> {
        if rules.is_empty() {
            return Ok(());
        }

        let Some(user_id) = self.ctx.user_id.as_deref() else {
            return Err(PipelineError::Unauthorized);
        };

        // Roles from every rule are alternatives
        let roles: Vec<Role> = rules.iter().flat_map(|rule| rule.roles.iter().copied()).collect();
        if !roles.is_empty() {
            let mut authorized = false;
            for role in roles {
                if self.ctx.identity.is_in_role(user_id, role).await? {
                    authorized = true;
                    break;
                }
            }
            if !authorized {
                tracing::warn!("User {} is not in any role required by the request", user_id);
                return Err(PipelineError::Forbidden);
            }
        }

        // Every policy must hold
        for policy in rules.iter().filter_map(|rule| rule.policy) {
            if !self.ctx.identity.authorize(user_id, policy).await? {
                tracing::warn!("User {} does not satisfy policy {}", user_id, policy.as_str());
                return Err(PipelineError::Forbidden);
            }
        }

        Ok(())
    }

    async fn user_name(&self) -> String {
        let Some(user_id) = self.ctx.user_id.as_deref() else {
            return String::new();
        };
        match self.ctx.identity.user_name(user_id).await {
            Ok(name) => name.unwrap_or_default(),
            Err(e) => {
                tracing::debug!("Could not resolve user name for {}: {}", user_id, e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdentityError, IdentityService};
    use crate::pipeline::events::EventDispatcher;
    use crate::pipeline::validation::ValidationFailures;
    use crate::types::Policy;
    use async_trait::async_trait;
    use sqlx::SqlitePool;
    use std::sync::Arc;

    struct FixedRoles(Vec<Role>);

    #[async_trait]
    impl IdentityService for FixedRoles {
        async fn user_name(&self, _user_id: &str) -> Result<Option<String>, IdentityError> {
            Ok(Some("someone@example.com".into()))
        }

        async fn is_in_role(&self, _user_id: &str, role: Role) -> Result<bool, IdentityError> {
            Ok(self.0.contains(&role))
        }

        async fn authorize(&self, _user_id: &str, policy: Policy) -> Result<bool, IdentityError> {
            Ok(policy.required_roles().iter().any(|r| self.0.contains(r)))
        }
    }

    #[derive(Debug)]
    struct Probe {
        rules: &'static [Authorize],
        title: Option<String>,
    }

    #[async_trait]
    impl Request for Probe {
        type Response = &'static str;
        const NAME: &'static str = "Probe";

        fn authorization(&self) -> &'static [Authorize] {
            self.rules
        }

        async fn validate(&self, _ctx: &RequestContext) -> Result<ValidationFailures, PipelineError> {
            let mut failures = ValidationFailures::new();
            failures.not_empty("Title", self.title.as_deref());
            Ok(failures)
        }

        async fn handle(self, _ctx: &RequestContext) -> Result<Self::Response, PipelineError> {
            Ok("handled")
        }
    }

    const ADMINS: &[Authorize] = &[Authorize::roles(&[Role::Administrator])];
    const PURGERS: &[Authorize] = &[
        Authorize::roles(&[Role::Administrator]),
        Authorize::policy(Policy::CanPurge),
    ];

    fn sender(user: Option<&str>, roles: Vec<Role>) -> Sender {
        let pool = SqlitePool::connect_lazy("sqlite::memory:").unwrap();
        let ctx = RequestContext::new(pool, Arc::new(FixedRoles(roles)), EventDispatcher::new())
            .with_user(user.map(String::from));
        Sender::new(ctx, Duration::from_millis(500))
    }

    fn probe(rules: &'static [Authorize]) -> Probe {
        Probe { rules, title: Some("title".into()) }
    }

    #[tokio::test]
    async fn open_requests_need_no_user() {
        let result = sender(None, vec![]).send(probe(&[])).await.unwrap();
        assert_eq!(result, "handled");
    }

    #[tokio::test]
    async fn any_rule_requires_a_user() {
        let result = sender(None, vec![]).send(probe(&[Authorize::AUTHENTICATED])).await;
        assert!(matches!(result, Err(PipelineError::Unauthorized)));
    }

    #[tokio::test]
    async fn missing_role_is_forbidden() {
        let result = sender(Some("u1"), vec![]).send(probe(ADMINS)).await;
        assert!(matches!(result, Err(PipelineError::Forbidden)));

        let result = sender(Some("u1"), vec![Role::Administrator]).send(probe(ADMINS)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn roles_and_policies_combine() {
        let result = sender(Some("u1"), vec![Role::Administrator]).send(probe(PURGERS)).await;
        assert!(result.is_ok());

        let result = sender(Some("u1"), vec![]).send(probe(PURGERS)).await;
        assert!(matches!(result, Err(PipelineError::Forbidden)));
    }

    #[tokio::test]
    async fn authorization_runs_before_validation() {
        let request = Probe { rules: ADMINS, title: None };
        let result = sender(None, vec![]).send(request).await;
        assert!(matches!(result, Err(PipelineError::Unauthorized)));

        let request = Probe { rules: &[], title: None };
        match sender(None, vec![]).send(request).await {
            Err(PipelineError::Validation(failures)) => assert_eq!(failures.len(), 1),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }
}
