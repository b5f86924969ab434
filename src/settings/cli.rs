use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Append-only guestbook over a flat object store")]
pub struct Cli {
    /// Path to a TOML settings file
    #[arg(long)]
    pub settings: Option<String>,
}
