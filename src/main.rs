use std::sync::Arc;

use edge_experiments::{
    handlers::{self, AppState},
    HttpEdgeConfigClient, Settings,
};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            log::error!(target: "edge_experiments", "{}", err);
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> edge_experiments::Result<()> {
    let settings = Settings::from_env()?;
    let edge_config = HttpEdgeConfigClient::from_connection_string(&settings.edge_config)?;
    log::info!(target: "edge_experiments",
               edge_config_id = edge_config.edge_config_id(),
               local_mode = settings.local_mode;
               "starting server on {}", settings.bind_address);

    let listener = tokio::net::TcpListener::bind(settings.bind_address).await?;
    let app = handlers::router(AppState::new(settings, Arc::new(edge_config)));

    axum::serve(listener, app).await?;
    Ok(())
}
