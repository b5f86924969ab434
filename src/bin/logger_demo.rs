use guestbook::logger::*;

fn main() -> anyhow::Result<()> {
    // $ RUST_LOG=trace cargo run --bin logger_demo  (config reload is skipped)
    let logger = Logger::new_bootstrap();
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");

    let config = LogConfig {
        filter: "debug".to_string(),
    };
    let applied = logger.reload_from_config(&config)?;
    info!(applied, "reloaded filter from config");
    trace!("application trace log");
    debug!("application debug log");
    info!("application info log");

    let bad = LogConfig {
        filter: "not a [valid filter".to_string(),
    };
    info!(rejected = logger.reload_from_config(&bad).is_err(), "bad filter");

    Ok(())
}
