//! HTTP client for the InfluxDB 1.x API

use std::time::Duration;

use daq_core::QueryResult;
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, instrument};
use url::Url;

use crate::{DbError, DbResult, Point};

/// Client handle bound to one server and a default database
#[derive(Clone)]
pub struct InfluxClient {
    http: Client,
    base_url: Url,
    database: String,
    username: Option<String>,
    password: Option<String>,
}

impl std::fmt::Debug for InfluxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxClient")
            .field("base_url", &self.base_url.as_str())
            .field("database", &self.database)
            .field("username", &self.username)
            .finish()
    }
}

impl InfluxClient {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Default database used when a call does not name one
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Check that the server answers
    #[instrument(skip(self))]
    pub async fn ping(&self) -> DbResult<()> {
        let resp = self.auth(self.http.get(self.base_url.join("ping")?)).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Run an InfluxQL statement. Reads go out as GET, anything else
    /// (CREATE, DROP, ...) as POST.
    #[instrument(skip(self))]
    pub async fn query(&self, q: &str, database: Option<&str>) -> DbResult<QueryResult> {
        let db = database.unwrap_or(self.database.as_str());
        let url = self.base_url.join("query")?;
        let params = [("q", q), ("db", db)];

        let req = if is_read_only(q) {
            self.http.get(url).query(&params)
        } else {
            self.http.post(url).form(&params)
        };
        debug!(db, "issuing query");

        let resp = self.auth(req).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(server_error(status.as_u16(), body));
        }
        let result: QueryResult = if body.trim().is_empty() {
            QueryResult::default()
        } else {
            serde_json::from_str(&body)?
        };
        if let Some(err) = result.error() {
            return Err(DbError::Server(err.to_string()));
        }
        Ok(result)
    }

    /// Names of all databases on the server
    pub async fn get_list_database(&self) -> DbResult<Vec<String>> {
        let res = self.query("SHOW DATABASES", None).await?;
        Ok(first_column(&res, "databases"))
    }

    pub async fn create_database(&self, name: &str) -> DbResult<()> {
        let q = format!("CREATE DATABASE {}", daq_core::quote_ident(name));
        self.query(&q, None).await?;
        Ok(())
    }

    /// Write points in line protocol with nanosecond precision
    #[instrument(skip(self, points), fields(count = points.len()))]
    pub async fn write_points(&self, points: &[Point], database: Option<&str>) -> DbResult<()> {
        if points.is_empty() {
            return Ok(());
        }
        let db = database.unwrap_or(self.database.as_str());
        let lines = points
            .iter()
            .map(Point::to_line_protocol)
            .collect::<DbResult<Vec<_>>>()?
            .join("\n");

        let req = self
            .http
            .post(self.base_url.join("write")?)
            .query(&[("db", db), ("precision", "ns")])
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(lines);
        let resp = self.auth(req).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    fn auth(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(user) => req.basic_auth(user, self.password.as_ref()),
            None => req,
        }
    }
}

/// Build an [`InfluxClient`] from connection components
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    host: String,
    port: u16,
    database: String,
    username: Option<String>,
    password: Option<String>,
    ssl: bool,
    verify_ssl: bool,
    timeout: Option<Duration>,
}

impl ConnectionBuilder {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8086,
            database: database.into(),
            username: None,
            password: None,
            ssl: false,
            verify_ssl: false,
            timeout: None,
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Use https instead of http
    pub fn ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    /// Verify server certificates for https requests
    pub fn verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> DbResult<Url> {
        if self.host.is_empty() {
            return Err(DbError::ConfigError("empty host".to_string()));
        }
        let scheme = if self.ssl { "https" } else { "http" };
        Ok(Url::parse(&format!("{}://{}:{}/", scheme, self.host, self.port))?)
    }

    /// Construct the client. No request is sent.
    pub fn build(self) -> DbResult<InfluxClient> {
        let base_url = self.base_url()?;
        let mut http = Client::builder();
        if self.ssl && !self.verify_ssl {
            http = http.danger_accept_invalid_certs(true);
        }
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        Ok(InfluxClient {
            http: http.build()?,
            base_url,
            database: self.database,
            username: self.username,
            password: self.password,
        })
    }
}

fn is_read_only(q: &str) -> bool {
    let head = q.trim_start().to_ascii_uppercase();
    head.starts_with("SELECT") || head.starts_with("SHOW")
}

async fn check_status(resp: Response) -> DbResult<()> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(server_error(status.as_u16(), body))
}

/// Prefer the server's own `{"error": ...}` message when there is one
fn server_error(status: u16, body: String) -> DbError {
    match serde_json::from_str::<QueryResult>(&body)
        .ok()
        .and_then(|r| r.error().map(str::to_string))
    {
        Some(msg) => DbError::Server(msg),
        None => DbError::Status { status, body },
    }
}

/// String values of the first column of a named series
pub(crate) fn first_column(res: &QueryResult, series: &str) -> Vec<String> {
    res.find(series)
        .map(|s| {
            s.values
                .iter()
                .filter_map(|row| row.first().and_then(|v| v.as_str()).map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
