use influx_starter::config::Config;
use influx_starter::routes::iot;
use influx_starter::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    server::init_tracing();
    tracing::info!("Starting IoT app...");

    let config = Config::from_env()?;
    tracing::info!(influx = %config.influx_host, port = config.api_port, "Configuration loaded");

    let addr = config.bind_address();
    let state = iot::connect(config).await?;
    server::serve(iot::build_router(state), &addr).await?;
    Ok(())
}
