//! Settings come from a TOML file picked by `--settings` (or the build
//! profile default) with environment overrides on top.
//! See `bin/settings_demo.rs` for manual verification.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
