//! Write five sample points, one second apart.

use std::time::Duration;

use influx_starter::config::Config;
use influx_starter::influx::InfluxClient;
use influx_starter::{server, snippets};

const POINTS: i64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    server::init_tracing();

    let config = Config::from_env()?;
    let client = InfluxClient::new(&config.influx_host, config.token()?, config.influx_timeout())?;

    snippets::write_sample_points(
        &client,
        config.organization()?,
        config.bucket()?,
        POINTS,
        Duration::from_secs(1),
    )
    .await?;

    println!("Wrote {POINTS} points to {}", config.bucket()?);
    Ok(())
}
