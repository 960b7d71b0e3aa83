use std::net::SocketAddr;

use api::auth::middleware::log_request;
use api::routes::app;
use axum::middleware::from_fn;
use tracing_appender::rolling;
use util::{config, state::AppState};

#[tokio::main]
async fn main() {
    let _log_guard = init_logging(&config::log_file(), &config::log_level());

    let db = db::connect_and_migrate(&config::database_path())
        .await
        .expect("Failed to open database");

    let app = app(AppState::new(db)).layer(from_fn(log_request));

    let addr: SocketAddr = format!("{}:{}", config::host(), config::port())
        .parse()
        .expect("Invalid address");

    tracing::info!(%addr, env = %config::env(), "starting {}", config::project_name());

    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server crashed");
}

fn init_logging(log_file: &str, log_level: &str) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = config::log_to_stdout().then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(true)
    });

    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}
