//! Building blocks of the single-purpose command line samples.

use std::time::Duration;

use crate::influx::{FluxRecord, InfluxClient, InfluxResult, Point};
use crate::queries;

pub const SAMPLE_MEASUREMENT: &str = "measurement1";

/// Points written by `write_data`: `measurement1,tagname1=tagvalue1 field1=<value>i`.
#[must_use]
pub fn sample_point(value: i64) -> Point {
    Point::new(SAMPLE_MEASUREMENT)
        .tag("tagname1", "tagvalue1")
        .field("field1", value)
}

/// Write `count` sample points one at a time, waiting `spacing` between them
/// so each lands on its own timestamp.
///
/// # Errors
///
/// Stops at the first failed write.
pub async fn write_sample_points(
    client: &InfluxClient,
    org: &str,
    bucket: &str,
    count: i64,
    spacing: Duration,
) -> InfluxResult<()> {
    for value in 0..count {
        if value > 0 && !spacing.is_zero() {
            tokio::time::sleep(spacing).await;
        }
        client
            .write_point(org, bucket, &sample_point(value))
            .await?;
        tracing::info!(value, "Wrote point");
    }
    Ok(())
}

/// Records of the sample measurement from the last ten minutes.
///
/// # Errors
///
/// Returns the query error.
pub async fn recent_records(
    client: &InfluxClient,
    org: &str,
    bucket: &str,
) -> InfluxResult<Vec<FluxRecord>> {
    let flux = queries::measurement_query(bucket, SAMPLE_MEASUREMENT);
    Ok(flatten(client.query(org, &flux).await?))
}

/// Mean of the sample measurement over the last ten minutes, one record per series.
///
/// # Errors
///
/// Returns the query error.
pub async fn mean_records(
    client: &InfluxClient,
    org: &str,
    bucket: &str,
) -> InfluxResult<Vec<FluxRecord>> {
    let flux = queries::measurement_mean_query(bucket, SAMPLE_MEASUREMENT);
    Ok(flatten(client.query(org, &flux).await?))
}

fn flatten(tables: Vec<crate::influx::FluxTable>) -> Vec<FluxRecord> {
    tables.into_iter().flat_map(|t| t.records).collect()
}
