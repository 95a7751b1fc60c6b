//! Authenticated HTTP session against the HR service
//!
//! The service authenticates with a browser-style form sign-in: the session
//! cookie set by the server is what later calls ride on, so the underlying
//! reqwest client keeps a cookie store for its whole lifetime.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use timeclock_util::{Result, TimeclockError};
use tracing::{debug, info, warn};

use crate::markup::{extract_error, extract_token};

const SIGN_IN_PATH: &str = "/users/sign_in";

/// Connection parameters for a [`SessionClient`]
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Value of the `return_host` form field
    pub return_host: String,
    pub request_timeout: Option<Duration>,
}

/// Outcome of an attendance write the service answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Accepted,
    Rejected(StatusCode),
}

impl WriteStatus {
    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::OK | StatusCode::CREATED => WriteStatus::Accepted,
            other => WriteStatus::Rejected(other),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, WriteStatus::Accepted)
    }
}

/// Cookie-backed session. Owned by whoever drives attendance calls.
pub struct SessionClient {
    http: reqwest::Client,
    base_url: String,
    return_host: String,
    request_timeout: Option<Duration>,
    authenticated: bool,
}

fn build_http(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().cookie_store(true);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| TimeclockError::api(format!("Failed to build HTTP client: {}", e)))
}

impl SessionClient {
    pub fn new(config: SessionConfig) -> Result<Self> {
        Ok(Self {
            http: build_http(config.request_timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            return_host: config.return_host,
            request_timeout: config.request_timeout,
            authenticated: false,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Forget the session. Cookies are replaced by building a fresh client.
    pub fn invalidate(&mut self) -> Result<()> {
        self.http = build_http(self.request_timeout)?;
        self.authenticated = false;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sign in with email and password.
    ///
    /// A missing anti-forgery token fails before any credentials are sent.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        self.authenticated = false;

        info!("Fetching sign-in token");
        let response = self
            .http
            .get(self.url(SIGN_IN_PATH))
            .send()
            .await
            .map_err(|e| TimeclockError::api(format!("Network error during login: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TimeclockError::api(format!(
                "Sign-in page returned {}",
                status
            )));
        }

        let page = response
            .text()
            .await
            .map_err(|e| TimeclockError::api(format!("Network error during login: {}", e)))?;

        let token = extract_token(&page)
            .ok_or_else(|| TimeclockError::auth("Could not extract CSRF token"))?;
        debug!("Sign-in token extracted");

        let form = [
            ("authenticity_token", token.as_str()),
            ("return_host", self.return_host.as_str()),
            ("user[email]", email),
            ("user[password]", password),
            ("user[remember_me]", "0"),
            ("commit", "Sign in"),
        ];

        info!(email = %email, "Submitting credentials");
        let response = self
            .http
            .post(self.url(SIGN_IN_PATH))
            .form(&form)
            .send()
            .await
            .map_err(|e| TimeclockError::api(format!("Network error during login: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TimeclockError::api(format!("Network error during login: {}", e)))?;

        if let Some(message) = extract_error(&body) {
            warn!(%message, "Sign-in rejected");
            return Err(TimeclockError::auth(format!("Login failed: {}", message)));
        }

        if !status.is_success() {
            return Err(TimeclockError::api(format!("Sign-in returned {}", status)));
        }

        self.authenticated = true;
        info!("Login successful");
        Ok(())
    }

    pub fn ensure_logged_in(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(TimeclockError::auth("Not logged in. Call login() first."))
        }
    }

    /// GET a JSON document. Non-2xx and undecodable bodies are API errors.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.ensure_logged_in()?;

        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| TimeclockError::api(format!("Error fetching {}: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TimeclockError::api(format!("{} returned {}", path, status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TimeclockError::api(format!("Malformed response from {}: {}", path, e)))
    }

    /// POST to an attendance write endpoint. Never retried.
    pub async fn post_attendance(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<WriteStatus> {
        self.ensure_logged_in()?;

        let response = self
            .http
            .post(self.url(path))
            .query(query)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| TimeclockError::api(format!("Error posting {}: {}", path, e)))?;

        let status = WriteStatus::from_status(response.status());
        if let WriteStatus::Rejected(code) = status {
            let body = response.text().await.unwrap_or_default();
            warn!(%path, status = code.as_u16(), %body, "Attendance write rejected");
        }
        Ok(status)
    }
}
