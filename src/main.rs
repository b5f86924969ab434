use guestbook::api;
use guestbook::logger::*;
use guestbook::server::*;
use guestbook::settings::*;
use std::fs;
use std::sync::Arc;
use tokio::signal;
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(
        settings = cli.settings.as_deref().unwrap_or("<default>"),
        store = %project_settings.store.backend,
        "settings loaded"
    );
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    if !logger.reload_from_config(&logger_config)? {
        info!("RUST_LOG is set, ignoring log.filter from settings");
    }

    let address: std::net::SocketAddr = project_settings.http.address.parse()?;
    let server = Arc::new(Server::try_new(&project_settings).await?);
    let routes = api::api(server).with(warp::trace::request());

    let shutdown = async {
        signal::ctrl_c().await.expect("Could not register SIGINT");
    };

    match &project_settings.http.tls {
        Some(tls) => {
            for path in [&tls.cert_path, &tls.key_path] {
                if !fs::metadata(path)?.is_file() {
                    return Err(anyhow::anyhow!("TLS file is not a regular file: {:?}", path));
                }
            }
            let (bound, serving) = warp::serve(routes)
                .tls()
                .cert_path(&tls.cert_path)
                .key_path(&tls.key_path)
                .bind_with_graceful_shutdown(address, shutdown);
            info!(%bound, "listening (tls)");
            serving.await;
        }
        None => {
            let (bound, serving) = warp::serve(routes).bind_with_graceful_shutdown(address, shutdown);
            info!(%bound, "listening");
            serving.await;
        }
    }

    info!("server stopped");

    Ok(())
}
