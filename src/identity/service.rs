use async_trait::async_trait;

use super::errors::IdentityError;
use super::manager::UserManager;
use crate::types::{Policy, Role};

/// What the request pipeline needs to know about the current user
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn user_name(&self, user_id: &str) -> Result<Option<String>, IdentityError>;

    async fn is_in_role(&self, user_id: &str, role: Role) -> Result<bool, IdentityError>;

    async fn authorize(&self, user_id: &str, policy: Policy) -> Result<bool, IdentityError>;
}

#[async_trait]
impl IdentityService for UserManager {
    async fn user_name(&self, user_id: &str) -> Result<Option<String>, IdentityError> {
        Ok(self.find_by_id(user_id).await?.map(|user| user.user_name))
    }

    async fn is_in_role(&self, user_id: &str, role: Role) -> Result<bool, IdentityError> {
        UserManager::is_in_role(self, user_id, role.as_str()).await
    }

    /// A policy is met when the user holds any of its roles
    async fn authorize(&self, user_id: &str, policy: Policy) -> Result<bool, IdentityError> {
        if self.find_by_id(user_id).await?.is_none() {
            return Ok(false);
        }
        for role in policy.required_roles() {
            if UserManager::is_in_role(self, user_id, role.as_str()).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
