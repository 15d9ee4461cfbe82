//! Flux sources used by the sample programs.
//!
//! Queries that run through the query API bind their inputs as
//! `params.<name>`; task sources cannot take params, so their inputs are
//! embedded as quoted Flux string literals.

use std::collections::HashMap;

/// Measurement the boilerplate app's downsampling task writes to.
pub const DOWNSAMPLED_MEASUREMENT: &str = "downsampled";

/// Quote `s` as a Flux string literal.
#[must_use]
pub fn flux_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // `${` would open string interpolation.
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Build a params map from `(name, value)` pairs.
#[must_use]
pub fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// All of a user's data from the last hour.
///
/// Params: `bucket_name`, `user_id`.
pub const USER_DATA_QUERY: &str = r#"from(bucket: params.bucket_name)
    |> range(start: -1h)
    |> filter(fn: (r) => r.user_id == params.user_id)"#;

/// Latest downsampled value of each field for a user.
///
/// Params: `bucket_name`, `user_id`.
pub const DOWNSAMPLED_LAST_QUERY: &str = r#"from(bucket: params.bucket_name)
    |> range(start: -1h)
    |> filter(fn: (r) => r._measurement == "downsampled")
    |> filter(fn: (r) => r.user_id == params.user_id)
    |> group(columns: ["_field"])
    |> last()"#;

/// Everything written to a bucket in the last 100 hours.
///
/// Params: `bucket_name`.
pub const RECENT_DATA_QUERY: &str = r"from(bucket: params.bucket_name)
    |> range(start: -100h)";

/// Task source that writes the min, max and mean of each of a user's fields
/// over the last five minutes back to `bucket` as the `downsampled` measurement.
#[must_use]
pub fn downsample_task(bucket: &str, user_id: &str) -> String {
    let bucket = flux_string(bucket);
    let user_id = flux_string(user_id);
    let downsampled = flux_string(DOWNSAMPLED_MEASUREMENT);

    format!(
        r#"data = from(bucket: {bucket})
    |> range(start: -5m)
    |> filter(fn: (r) => r.user_id == {user_id})
    |> filter(fn: (r) => r._measurement != {downsampled})
    |> drop(columns: ["_start", "_time", "_stop"])

max_data = data
    |> max()
    |> map(fn: (r) => ({{r with _field: r._field + "_max"}}))

min_data = data
    |> min()
    |> map(fn: (r) => ({{r with _field: r._field + "_min"}}))

mean_data = data
    |> mean()
    |> map(fn: (r) => ({{r with _field: r._field + "_mean"}}))

union(tables: [max_data, min_data, mean_data])
    |> map(fn: (r) => ({{r with _time: now(), _measurement: {downsampled}}}))
    |> to(bucket: {bucket})"#
    )
}

/// Task source that copies a user's zero values from `source` into `target`.
///
/// Running it every minute gives both a materialized view of the zero
/// readings and a hook for alerting on them.
#[must_use]
pub fn copy_zero_values_task(source: &str, target: &str, user_id: &str) -> String {
    format!(
        r"from(bucket: {source})
    |> range(start: -1m)
    |> filter(fn: (r) => r.user_id == {user_id})
    |> filter(fn: (r) => r._value == 0.0)
    |> to(bucket: {target})",
        source = flux_string(source),
        target = flux_string(target),
        user_id = flux_string(user_id),
    )
}

/// Points of `measurement` in `bucket` from the last ten minutes.
#[must_use]
pub fn measurement_query(bucket: &str, measurement: &str) -> String {
    format!(
        r"from(bucket: {})
    |> range(start: -10m)
    |> filter(fn: (r) => r._measurement == {})",
        flux_string(bucket),
        flux_string(measurement)
    )
}

/// Mean of `measurement` in `bucket` over the last ten minutes.
#[must_use]
pub fn measurement_mean_query(bucket: &str, measurement: &str) -> String {
    format!("{}\n    |> mean()", measurement_query(bucket, measurement))
}
