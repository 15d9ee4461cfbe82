use influx_starter::config::Config;
use influx_starter::routes::boilerplate;
use influx_starter::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    server::init_tracing();
    tracing::info!("Starting boilerplate app...");

    let config = Config::from_env()?;
    tracing::info!(influx = %config.influx_host, port = config.api_port, "Configuration loaded");

    let addr = config.bind_address();
    let state = boilerplate::connect(config).await?;
    server::serve(boilerplate::build_router(state), &addr).await?;
    Ok(())
}
