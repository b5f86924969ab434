use crate::domain_model::Action;

#[async_trait::async_trait]
pub trait Authorizer: Send + Sync {
    /// Decides from the arguments alone; nothing is remembered between calls.
    async fn is_allowed(&self, roles: &[String], subject: &str, object: &str, action: Action)
    -> bool;
}
