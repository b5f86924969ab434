mod bearer_token;
mod rbac_authorizer;

pub use bearer_token::*;
pub use rbac_authorizer::*;
