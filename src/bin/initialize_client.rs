//! Create a client from the environment and check the server answers.

use influx_starter::config::Config;
use influx_starter::influx::InfluxClient;
use influx_starter::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    server::init_tracing();

    let config = Config::from_env()?;
    let client = InfluxClient::new(&config.influx_host, config.token()?, config.influx_timeout())?;
    client.ping().await?;

    println!("Connected to {}", client.base_url());
    Ok(())
}
