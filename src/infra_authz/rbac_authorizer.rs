use crate::domain_model::Action;
use crate::domain_port::Authorizer;

/// A single grant: holders of `role` may perform `action` on `object`.
///
/// `object` matches exactly, or by prefix when it ends in `*`. A bare `*`
/// role or action matches anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub role: String,
    pub object: String,
    pub action: String,
}

impl Policy {
    pub fn new(role: impl Into<String>, object: impl Into<String>, action: impl Into<String>) -> Self {
        Policy {
            role: role.into(),
            object: object.into(),
            action: action.into(),
        }
    }

    fn matches(&self, subject: &str, roles: &[String], object: &str, action: Action) -> bool {
        let role_ok =
            self.role == "*" || self.role == subject || roles.iter().any(|r| *r == self.role);
        let action_ok = self.action == "*" || self.action == action.as_str();
        let object_ok = match self.object.strip_suffix('*') {
            Some(prefix) => object.starts_with(prefix),
            None => self.object == object,
        };
        role_ok && action_ok && object_ok
    }
}

/// Role-based access control over an in-process policy list.
///
/// A subject always holds a role named after itself, plus the roles the
/// caller passes in for this one decision.
pub struct RbacAuthorizer {
    policies: Vec<Policy>,
}

impl RbacAuthorizer {
    pub fn new(policies: Vec<Policy>) -> Self {
        RbacAuthorizer { policies }
    }
}

#[async_trait::async_trait]
impl Authorizer for RbacAuthorizer {
    async fn is_allowed(
        &self,
        roles: &[String],
        subject: &str,
        object: &str,
        action: Action,
    ) -> bool {
        self.policies
            .iter()
            .any(|policy| policy.matches(subject, roles, object, action))
    }
}
