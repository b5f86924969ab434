use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call values that used to ride on the ambient request object.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub subject: String,
    /// Roles granted by this request's own credentials.
    pub roles: Vec<String>,
    /// Resource path the caller is acting on, e.g. `/api/v1/messages`.
    pub object: String,
}

impl RequestContext {
    pub fn new(
        request_id: impl Into<String>,
        subject: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        RequestContext {
            request_id: request_id.into(),
            subject: subject.into(),
            roles: Vec::new(),
            object: object.into(),
        }
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }
}
