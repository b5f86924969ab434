//! Global tracing setup with a filter that can be swapped once settings are
//! loaded. See `bin/logger_demo.rs` for manual verification.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
