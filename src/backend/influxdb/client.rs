use async_trait::async_trait;
use std::time::{Duration, Instant};
use url::Url;

use super::config::InfluxConnectionConfig;
use super::influxql::{self, Statement};
use super::response::{
    awaiting_first_admin, classify_http_error, classify_statement_error, QueryResponse,
};
use crate::backend::{AdminClient, ClientError, ClientResult, ErrorCode};
use crate::error::{AppError, AppResult};

const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// [`AdminClient`] over the InfluxDB 1.x HTTP API
///
/// Every administrative operation is an InfluxQL statement POSTed to
/// `/query`. Credentials bound with [`AdminClient::authenticate_as`] are sent
/// as the `u`/`p` form parameters on each request.
pub struct InfluxDbClient {
    http: Option<reqwest::Client>,
    query_url: Url,
    ping_url: Url,
    credentials: Option<(String, String)>,
}

impl InfluxDbClient {
    /// Build a client for `config`. No request is made until the first call.
    pub fn connect(config: &InfluxConnectionConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http: Some(http),
            query_url: config.query_url()?,
            ping_url: config.ping_url()?,
            credentials: None,
        })
    }

    fn http(&self) -> ClientResult<&reqwest::Client> {
        self.http
            .as_ref()
            .ok_or_else(|| ClientError::Transport("client is closed".to_string()))
    }

    /// Check liveness; returns the server version when it reports one
    pub async fn ping(&self) -> ClientResult<Option<String>> {
        let response = self
            .http()?
            .get(self.ping_url.clone())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_error(status.as_u16(), &body));
        }

        Ok(response
            .headers()
            .get("X-Influxdb-Version")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }

    /// Poll `/ping` until it answers or `timeout` elapses
    pub async fn wait_until_ready(&self, timeout: Duration) -> ClientResult<Option<String>> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.ping().await {
                Ok(version) => {
                    tracing::info!(
                        "InfluxDB is ready (version {})",
                        version.as_deref().unwrap_or("unknown")
                    );
                    return Ok(version);
                }
                Err(e) if Instant::now() + READY_POLL_INTERVAL < deadline => {
                    tracing::debug!("InfluxDB not ready yet: {}", e);
                    tokio::time::sleep(READY_POLL_INTERVAL).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn execute(
        &self,
        statement: &Statement,
        credentials: Option<(&str, &str)>,
    ) -> ClientResult<QueryResponse> {
        tracing::debug!("InfluxDB request: {}", statement.redacted);

        let mut form = vec![("q", statement.text.as_str())];
        if let Some((user, password)) = credentials {
            form.push(("u", user));
            form.push(("p", password));
        }

        let response = self
            .http()?
            .post(self.query_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        tracing::debug!("InfluxDB response ({}): {}", status.as_u16(), body.trim());

        if !status.is_success() {
            return Err(classify_http_error(status.as_u16(), &body));
        }

        let parsed: QueryResponse = serde_json::from_str(&body).map_err(|e| {
            ClientError::application(ErrorCode::Server, format!("unreadable response: {}", e))
        })?;

        if let Some(message) = parsed.first_error() {
            return Err(classify_statement_error(message));
        }

        Ok(parsed)
    }

    async fn existing_users(&self, credentials: Option<(&str, &str)>) -> ClientResult<Vec<String>> {
        Ok(self
            .execute(&influxql::show_users(), credentials)
            .await?
            .first_column())
    }

    fn bound_credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(user, password)| (user.as_str(), password.as_str()))
    }
}

fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Transport(format!("request timed out: {}", err))
    } else {
        ClientError::Transport(err.to_string())
    }
}

#[async_trait]
impl AdminClient for InfluxDbClient {
    async fn create_superuser(&mut self, user: &str, password: &str) -> ClientResult<()> {
        // CREATE USER succeeds on an existing user with the same password and
        // privileges, so existence is checked first. Authenticate as the
        // account being created: only its own credentials can list users on
        // an already bootstrapped server.
        match self.existing_users(Some((user, password))).await {
            Ok(users) if users.iter().any(|existing| existing == user) => {
                return Err(ClientError::AlreadyExists(format!(
                    "user {} already exists",
                    user
                )));
            }
            Ok(_) => {}
            Err(e) if awaiting_first_admin(&e) => {
                tracing::debug!("InfluxDB has no admin account yet");
            }
            Err(e) => return Err(e),
        }

        self.execute(
            &influxql::create_user(user, password, true),
            Some((user, password)),
        )
        .await
        .map(|_| ())
    }

    fn authenticate_as(&mut self, user: &str, password: &str) {
        tracing::debug!("Switching InfluxDB credentials to user {}", user);
        self.credentials = Some((user.to_string(), password.to_string()));
    }

    async fn create_database(&mut self, name: &str) -> ClientResult<()> {
        // CREATE DATABASE succeeds silently on an existing database
        let existing = self
            .execute(&influxql::show_databases(), self.bound_credentials())
            .await?
            .first_column();

        if existing.iter().any(|db| db == name) {
            return Err(ClientError::AlreadyExists(format!(
                "database {} already exists",
                name
            )));
        }

        self.execute(&influxql::create_database(name), self.bound_credentials())
            .await
            .map(|_| ())
    }

    async fn create_user(&mut self, user: &str, password: &str) -> ClientResult<()> {
        let existing = self.existing_users(self.bound_credentials()).await?;
        if existing.iter().any(|name| name == user) {
            return Err(ClientError::AlreadyExists(format!(
                "user {} already exists",
                user
            )));
        }

        self.execute(
            &influxql::create_user(user, password, false),
            self.bound_credentials(),
        )
        .await
        .map(|_| ())
    }

    async fn grant_all_privileges(&mut self, user: &str, database: &str) -> ClientResult<()> {
        self.execute(&influxql::grant_all(database, user), self.bound_credentials())
            .await
            .map(|_| ())
    }

    async fn close(&mut self) {
        if self.http.take().is_some() {
            self.credentials = None;
            tracing::info!("InfluxDB client: closed HTTP session");
        }
    }
}
