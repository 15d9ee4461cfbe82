use influx_starter::config::Config;
use influx_starter::routes::sample;
use influx_starter::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    server::init_tracing();
    tracing::info!("Starting sample app...");

    let config = Config::from_env()?;
    tracing::info!(influx = %config.influx_host, port = config.api_port, "Configuration loaded");

    let addr = config.bind_address();
    let state = sample::connect(config).await?;
    server::serve(sample::build_router(state), &addr).await?;
    Ok(())
}
