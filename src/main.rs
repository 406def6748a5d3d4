use std::sync::Arc;

use clap::{Arg, Command};
use dotenv::dotenv;
use tokio::net::{TcpListener, UnixListener};
use tracing::info;

use coursegen::{
    api::{self, AppState},
    config::Config,
    inference_client, init_tracing,
    store::Store,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing();

    let matches = Command::new("coursegen-server")
        .about("Course generation API server")
        .arg(Arg::new("port").default_value("8090").help("TCP port to listen on"))
        .arg(
            Arg::new("unix")
                .long("unix")
                .value_name("PATH")
                .help("Listen on a Unix socket instead of TCP"),
        )
        .get_matches();

    let config = Config::from_env()?;
    let store = Store::connect(&config.database_url).await?;
    store.migrate().await?;

    let inference = inference_client(&config.inference)?;
    let shared_state = Arc::new(AppState::new(store, inference));
    let app = api::router(shared_state, &config.static_dir);

    info!("Initialized routes");

    if let Some(socket_path) = matches.get_one::<String>("unix") {
        // delete the file before binding
        tokio::fs::remove_file(socket_path).await.ok();
        let listener = UnixListener::bind(socket_path)?;

        info!("Starting server on Unix socket: {}", socket_path);
        axum::serve(listener, app.into_make_service()).await?;
    } else {
        let port = matches
            .get_one::<String>("port")
            .map(String::as_str)
            .unwrap_or("8090");
        let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
        info!("Starting server on port {}", port);
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}
