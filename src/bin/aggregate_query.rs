//! Print the mean of the sample measurement over the last ten minutes.

use influx_starter::config::Config;
use influx_starter::influx::InfluxClient;
use influx_starter::{server, snippets};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    server::init_tracing();

    let config = Config::from_env()?;
    let client = InfluxClient::new(&config.influx_host, config.token()?, config.influx_timeout())?;

    let records = snippets::mean_records(&client, config.organization()?, config.bucket()?).await?;
    for record in &records {
        println!("{record}");
    }
    Ok(())
}
