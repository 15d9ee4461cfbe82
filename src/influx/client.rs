use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use crate::influx::error::{InfluxError, InfluxResult};
use crate::influx::models::{
    ApiErrorBody, Bucket, BucketsResponse, CreateBucketRequest, CreateTaskRequest, Dialect,
    Organization, OrganizationsResponse, QueryRequest, Task,
};
use crate::influx::point::{self, Point};
use crate::influx::result::{parse_annotated_csv, FluxTable};
use crate::queries::flux_string;

/// Thin client over the slice of the InfluxDB v2 HTTP API used by the samples.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct InfluxClient {
    http_client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for InfluxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl InfluxClient {
    /// Create a client for `host` authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns `InfluxError::Setup` if the HTTP client cannot be constructed.
    pub fn new(host: &str, token: &str, timeout: Duration) -> InfluxResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(InfluxError::Setup)?;

        Ok(Self {
            http_client,
            base_url: host.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the server is reachable.
    ///
    /// # Errors
    ///
    /// Returns `InfluxError` if the request fails or the server answers with an error status.
    pub async fn ping(&self) -> InfluxResult<()> {
        let url = format!("{}/ping", self.base_url);
        self.send(&url, self.http_client.get(&url)).await?;
        Ok(())
    }

    /// Write a single point and wait for the server to acknowledge it.
    ///
    /// # Errors
    ///
    /// Returns `InfluxError::Point` if the point cannot be encoded, or the API error otherwise.
    pub async fn write_point(&self, org: &str, bucket: &str, point: &Point) -> InfluxResult<()> {
        self.write_points(org, bucket, std::slice::from_ref(point))
            .await
    }

    /// Write a batch of points in one request.
    ///
    /// # Errors
    ///
    /// Returns `InfluxError::Point` if any point cannot be encoded, or the API error otherwise.
    pub async fn write_points(
        &self,
        org: &str,
        bucket: &str,
        points: &[Point],
    ) -> InfluxResult<()> {
        if points.is_empty() {
            return Ok(());
        }

        let body = point::to_line_protocol(points)?;
        let url = format!("{}/api/v2/write", self.base_url);

        let request = self
            .http_client
            .post(&url)
            .query(&[("org", org), ("bucket", bucket), ("precision", "ns")])
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body);

        self.send(&url, request).await?;

        tracing::debug!(org, bucket, points = points.len(), "Points written");
        Ok(())
    }

    /// Run a Flux query and parse the tables it returns.
    ///
    /// # Errors
    ///
    /// Returns the API error, or `InfluxError::Query` for errors reported inside the result.
    pub async fn query(&self, org: &str, flux: &str) -> InfluxResult<Vec<FluxTable>> {
        self.run_query(org, flux, None).await
    }

    /// Run a Flux query with `params.<name>` bindings.
    ///
    /// # Errors
    ///
    /// Returns the API error, or `InfluxError::Query` for errors reported inside the result.
    pub async fn query_with_params(
        &self,
        org: &str,
        flux: &str,
        params: &HashMap<String, String>,
    ) -> InfluxResult<Vec<FluxTable>> {
        self.run_query(org, flux, Some(params)).await
    }

    async fn run_query(
        &self,
        org: &str,
        flux: &str,
        params: Option<&HashMap<String, String>>,
    ) -> InfluxResult<Vec<FluxTable>> {
        let url = format!("{}/api/v2/query", self.base_url);
        let body = QueryRequest {
            query: flux,
            query_type: "flux",
            params,
            dialect: Dialect::default(),
        };

        let request = self
            .http_client
            .post(&url)
            .query(&[("org", org)])
            .header(header::ACCEPT, "application/csv")
            .json(&body);

        let response = self.send(&url, request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| InfluxError::Decode(format!("Failed to read query response: {e}")))?;

        let tables = parse_annotated_csv(&bytes)?;
        tracing::debug!(org, tables = tables.len(), "Query completed");
        Ok(tables)
    }

    /// Look up an organization by name.
    ///
    /// # Errors
    ///
    /// Returns `InfluxError::NotFound` if no organization has that name.
    pub async fn find_organization_by_name(&self, name: &str) -> InfluxResult<Organization> {
        let url = format!("{}/api/v2/orgs", self.base_url);
        let request = self.http_client.get(&url).query(&[("org", name)]);

        let response: OrganizationsResponse = self.send_json(&url, request).await?;
        response
            .orgs
            .into_iter()
            .find(|o| o.name == name)
            .ok_or_else(|| InfluxError::NotFound {
                kind: "Organization",
                name: name.to_string(),
            })
    }

    /// Look up a bucket by name within an organization.
    ///
    /// # Errors
    ///
    /// Returns the API error if the lookup fails. A missing bucket is `Ok(None)`.
    pub async fn find_bucket_by_name(
        &self,
        org_id: &str,
        name: &str,
    ) -> InfluxResult<Option<Bucket>> {
        let url = format!("{}/api/v2/buckets", self.base_url);
        let request = self
            .http_client
            .get(&url)
            .query(&[("orgID", org_id), ("name", name)]);

        match self.send_json::<BucketsResponse>(&url, request).await {
            Ok(response) => Ok(response.buckets.into_iter().find(|b| b.name == name)),
            Err(InfluxError::Api { status, .. }) if status == StatusCode::NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a bucket with infinite retention.
    ///
    /// # Errors
    ///
    /// Returns the API error, e.g. 422 if the bucket already exists.
    pub async fn create_bucket(&self, org_id: &str, name: &str) -> InfluxResult<Bucket> {
        let url = format!("{}/api/v2/buckets", self.base_url);
        let request = self.http_client.post(&url).json(&CreateBucketRequest {
            org_id,
            name,
            retention_rules: Vec::new(),
        });

        let bucket: Bucket = self.send_json(&url, request).await?;
        tracing::info!(bucket = %bucket.name, id = %bucket.id, "Bucket created");
        Ok(bucket)
    }

    /// Return the named bucket, creating it if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns the API error if the lookup or creation fails.
    pub async fn find_or_create_bucket(&self, org_id: &str, name: &str) -> InfluxResult<Bucket> {
        if let Some(bucket) = self.find_bucket_by_name(org_id, name).await? {
            tracing::debug!(bucket = %bucket.name, "Bucket already exists");
            return Ok(bucket);
        }

        self.create_bucket(org_id, name).await
    }

    /// Create a task that runs `flux` on the given `every` schedule (e.g. `5m`).
    ///
    /// # Errors
    ///
    /// Returns the API error if the task cannot be created.
    pub async fn create_task_with_every(
        &self,
        name: &str,
        flux: &str,
        every: &str,
        org_id: &str,
    ) -> InfluxResult<Task> {
        let url = format!("{}/api/v2/tasks", self.base_url);
        let body = CreateTaskRequest {
            org_id,
            flux: task_flux(name, every, flux),
            status: "active",
        };

        let task: Task = self
            .send_json(&url, self.http_client.post(&url).json(&body))
            .await?;
        tracing::info!(task = %task.name, id = %task.id, every, "Task created");
        Ok(task)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> InfluxResult<T> {
        let response = self.send(url, request).await?;
        let text = response
            .text()
            .await
            .map_err(|e| InfluxError::Decode(format!("Failed to get response text: {e}")))?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                url,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse InfluxDB response"
            );
            InfluxError::Decode(format!("Failed to parse response: {e}"))
        })
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> InfluxResult<Response> {
        let response = request
            .header(header::AUTHORIZATION, format!("Token {}", self.token))
            .send()
            .await
            .map_err(|source| InfluxError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) => (body.code, body.message.unwrap_or_else(|| text.clone())),
            Err(_) => (None, text),
        };

        tracing::warn!(%status, url, message = %message, "InfluxDB API error");
        Err(InfluxError::Api {
            status,
            code,
            message,
        })
    }
}

/// Prefix `flux` with the task options block InfluxDB uses to schedule it.
#[must_use]
pub fn task_flux(name: &str, every: &str, flux: &str) -> String {
    format!(
        "option task = {{name: {}, every: {every}}}\n\n{flux}",
        flux_string(name)
    )
}
