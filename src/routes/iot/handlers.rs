use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::influx::{FluxTable, InfluxClient, Point};
use crate::logins::{self, LoginError, NewUser};
use crate::queries;

use super::pages;
use super::session::ActiveUser;
use super::IotState;

/// Range of the random readings written by the profile page, centered on zero.
const RANDOM_READING_RANGE: f32 = 128.0;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(rename = "readToken")]
    pub read_token: String,
    #[serde(rename = "writeToken")]
    pub write_token: String,
}

/// One Plotly trace.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct GraphData {
    pub x: Vec<usize>,
    pub y: Vec<f64>,
}

/// Plot the `_value` column of the first table against the record index.
///
/// Stops at the first record without a numeric value.
#[must_use]
pub fn graph_first_table(tables: &[FluxTable]) -> GraphData {
    let mut graph = GraphData::default();
    let Some(table) = tables.first() else {
        return graph;
    };

    for (index, record) in table.records.iter().enumerate() {
        let Some(value) = record.value().and_then(|v| v.as_f64()) else {
            tracing::debug!(index, "Record without a numeric _value, stopping");
            break;
        };
        graph.x.push(index);
        graph.y.push(value);
    }

    graph
}

pub async fn index() -> Html<String> {
    Html(pages::index())
}

pub async fn login_page() -> Html<String> {
    Html(pages::login())
}

pub async fn signup_page() -> Html<String> {
    Html(pages::signup())
}

pub async fn login(
    State(state): State<IotState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Redirect> {
    tracing::info!(email = %form.email, "Login attempt");

    let account = match logins::try_login(&state.db, &form.email, &form.password).await {
        Ok(account) => account,
        Err(LoginError::Database(e)) => return Err(e.into()),
        Err(e) => {
            tracing::warn!(email = %form.email, reason = %e, "Login failed");
            return Err(AppError::Forbidden("Invalid login".to_string()));
        }
    };

    // The tokens were just retrieved, so build fresh read and write clients.
    let timeout = state.config.influx_timeout();
    let host = &state.config.influx_host;
    let user = ActiveUser {
        read_client: InfluxClient::new(host, &account.read_token, timeout)?,
        write_client: InfluxClient::new(host, &account.write_token, timeout)?,
        name: account.name,
        email: account.email,
    };

    tracing::info!(email = %user.email, "Login success");
    state.session.login(user).await;
    Ok(Redirect::to("/profile"))
}

pub async fn logout(State(state): State<IotState>) -> Redirect {
    state.session.logout().await;
    Redirect::to("/login")
}

pub async fn profile(State(state): State<IotState>) -> Response {
    match state.session.current().await {
        Some(user) => Html(pages::profile(&user.name)).into_response(),
        None => {
            tracing::debug!("Not logged in, redirecting to login page");
            Redirect::to("/login").into_response()
        }
    }
}

pub async fn graph_query_data(State(state): State<IotState>) -> AppResult<Json<Vec<GraphData>>> {
    let user = state.session.current().await.ok_or(AppError::Unauthorized)?;

    let params = queries::params(&[("bucket_name", state.bucket.as_str())]);
    let tables = user
        .read_client
        .query_with_params(&state.organization_id, queries::RECENT_DATA_QUERY, &params)
        .await?;

    // Plotly.js takes a list of traces; only the first table is graphed.
    Ok(Json(vec![graph_first_table(&tables)]))
}

pub async fn graph_write_data(State(state): State<IotState>) -> AppResult<StatusCode> {
    let user = state.session.current().await.ok_or(AppError::Unauthorized)?;

    let reading = rand::random::<f32>() * RANDOM_READING_RANGE - RANDOM_READING_RANGE * 0.5;
    let point = Point::new("measurement1")
        .tag("tagname1", "tagvalue1")
        .field("field1", reading);

    user.write_client
        .write_point(&state.organization_id, &state.bucket, &point)
        .await?;

    tracing::debug!(reading, email = %user.email, "Wrote random reading");
    Ok(StatusCode::OK)
}

pub async fn signup(
    State(state): State<IotState>,
    Form(form): Form<SignupForm>,
) -> AppResult<Redirect> {
    tracing::info!(email = %form.email, name = %form.name, "Registering new user");

    let new_user = NewUser {
        email: form.email,
        name: form.name,
        password: form.password,
        read_token: form.read_token,
        write_token: form.write_token,
    };

    match logins::register_user(&state.db, new_user).await {
        Ok(_) => Ok(Redirect::to("/login")),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to register user");
            Err(AppError::BadRequest("Failed to register user.".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::influx::result::parse_annotated_csv;

    #[test]
    fn graphs_first_table_until_a_non_numeric_value() {
        let body = "\
#datatype,string,long,double
#group,false,false,false
#default,_result,,
,result,table,_value
,,0,1.5
,,0,-2
,,0,
,,0,4
,,1,9
";
        let tables = parse_annotated_csv(body.as_bytes()).unwrap();
        let graph = graph_first_table(&tables);

        assert_eq!(graph.x, vec![0, 1]);
        assert_eq!(graph.y, vec![1.5, -2.0]);
    }

    #[test]
    fn no_tables_gives_an_empty_trace() {
        assert_eq!(graph_first_table(&[]), GraphData::default());
    }
}
