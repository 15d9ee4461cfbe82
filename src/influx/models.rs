use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error body returned by the InfluxDB v2 API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response from `GET /api/v2/orgs`
#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationsResponse {
    #[serde(default)]
    pub orgs: Vec<Organization>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Response from `GET /api/v2/buckets`
#[derive(Debug, Clone, Deserialize)]
pub struct BucketsResponse {
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub id: String,
    pub name: String,
    #[serde(rename = "orgID", default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub retention_rules: Vec<RetentionRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionRule {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub every_seconds: i64,
}

/// Request body for `POST /api/v2/buckets`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketRequest<'a> {
    #[serde(rename = "orgID")]
    pub org_id: &'a str,
    pub name: &'a str,
    pub retention_rules: Vec<RetentionRule>,
}

/// Request body for `POST /api/v2/tasks`
#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskRequest<'a> {
    #[serde(rename = "orgID")]
    pub org_id: &'a str,
    pub flux: String,
    pub status: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(rename = "orgID", default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub every: Option<String>,
    #[serde(default)]
    pub flux: Option<String>,
}

/// Request body for `POST /api/v2/query`
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
    #[serde(rename = "type")]
    pub query_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<&'a HashMap<String, String>>,
    pub dialect: Dialect,
}

/// CSV dialect asking for all annotations, which the result parser relies on.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialect {
    pub header: bool,
    pub delimiter: &'static str,
    pub annotations: [&'static str; 3],
    pub comment_prefix: &'static str,
    pub date_time_format: &'static str,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            header: true,
            delimiter: ",",
            annotations: ["datatype", "group", "default"],
            comment_prefix: "#",
            date_time_format: "RFC3339",
        }
    }
}
