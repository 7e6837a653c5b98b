//! API Session
//!
//! Thin HTTP session for REST checks. A session is created empty and must be
//! [`init`](ApiSession::init)-ed with a base URL; every request on an
//! uninitialized session fails with [`CheckError::Uninitialized`].
//!
//! Endpoints resolve against the base URL the way a browser resolves links:
//! `/users` against `https://host/v1/index.html` is `https://host/users`.

use crate::result::{CheckError, CheckResult};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

/// Timeout applied to POST, PUT and DELETE requests (10 seconds)
pub const WRITE_TIMEOUT_MS: u64 = 10_000;

/// Kind of authentication attached to requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    /// No credentials
    #[default]
    None,
    /// HTTP Basic
    Basic,
    /// `Authorization: Bearer`
    Bearer,
}

impl FromStr for AuthKind {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "basic" => Ok(Self::Basic),
            "bearer" => Ok(Self::Bearer),
            _ => Err(CheckError::UnsupportedConfig {
                setting: "auth kind",
                value: s.to_string(),
                expected: "none, basic, bearer",
            }),
        }
    }
}

/// Credentials attached to every request of a session
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ApiAuth {
    /// No credentials
    #[default]
    None,
    /// HTTP Basic
    Basic {
        /// User name
        username: String,
        /// Password
        password: String,
    },
    /// Bearer token
    Bearer {
        /// Token
        token: String,
    },
}

impl ApiAuth {
    /// Build credentials of `kind`
    ///
    /// Basic uses `user` and `secret`; bearer uses `secret` as the token.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Config`] when a required credential is missing.
    pub fn from_kind(kind: AuthKind, user: Option<String>, secret: Option<String>) -> CheckResult<Self> {
        match kind {
            AuthKind::None => Ok(Self::None),
            AuthKind::Basic => Ok(Self::Basic {
                username: user.ok_or_else(|| CheckError::config("basic auth needs a username"))?,
                password: secret.unwrap_or_default(),
            }),
            AuthKind::Bearer => Ok(Self::Bearer {
                token: secret.ok_or_else(|| CheckError::config("bearer auth needs a token"))?,
            }),
        }
    }

    /// Kind of these credentials
    #[must_use]
    pub const fn kind(&self) -> AuthKind {
        match self {
            Self::None => AuthKind::None,
            Self::Basic { .. } => AuthKind::Basic,
            Self::Bearer { .. } => AuthKind::Bearer,
        }
    }

    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::None => request,
            Self::Basic { username, password } => request.basic_auth(username, Some(password)),
            Self::Bearer { token } => request.bearer_auth(token),
        }
    }
}

/// A fully-read HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Status code
    pub status: u16,
    /// Raw body
    pub body: String,
}

impl ApiResponse {
    /// Create a response from its parts
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    #[must_use]
    pub const fn ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Body as text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Body parsed as JSON
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Json`] when the body is not valid JSON.
    pub fn json(&self) -> CheckResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Body deserialized into `T`
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Json`] when the body does not fit `T`.
    pub fn json_as<T: DeserializeOwned>(&self) -> CheckResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[derive(Debug, Clone)]
struct Session {
    base_url: Url,
    client: reqwest::Client,
    auth: ApiAuth,
}

/// HTTP session bound to one base URL
#[derive(Debug, Clone, Default)]
pub struct ApiSession {
    inner: Option<Session>,
}

impl ApiSession {
    /// Create an uninitialized session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the session to `base_url` without credentials
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Config`] for a base URL that does not parse, or
    /// [`CheckError::Http`] if the HTTP client cannot be built.
    pub fn init(&mut self, base_url: impl Into<String>) -> CheckResult<()> {
        self.init_with_auth(base_url, ApiAuth::None)
    }

    /// Bind the session to `base_url` with `auth` on every request
    ///
    /// # Errors
    ///
    /// See [`init`](Self::init).
    pub fn init_with_auth(&mut self, base_url: impl Into<String>, auth: ApiAuth) -> CheckResult<()> {
        let base_url = base_url.into();
        let base_url = Url::parse(&base_url)
            .map_err(|e| CheckError::config(format!("invalid API base URL '{base_url}': {e}")))?;
        let client = reqwest::Client::builder().build()?;
        tracing::debug!(%base_url, auth = ?auth.kind(), "api session initialized");
        self.inner = Some(Session {
            base_url,
            client,
            auth,
        });
        Ok(())
    }

    /// Whether [`init`](Self::init) ran
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.inner.is_some()
    }

    /// Base URL, once initialized
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.inner.as_ref().map(|s| s.base_url.as_str())
    }

    fn session(&self) -> CheckResult<&Session> {
        self.inner.as_ref().ok_or(CheckError::Uninitialized {
            resource: "API session",
            init: "init(base_url)",
        })
    }

    fn request(&self, method: reqwest::Method, endpoint: &str) -> CheckResult<reqwest::RequestBuilder> {
        let session = self.session()?;
        let url = session
            .base_url
            .join(endpoint)
            .map_err(|e| CheckError::config(format!("cannot resolve endpoint '{endpoint}': {e}")))?;
        tracing::debug!(%method, %url, "api request");
        Ok(session.auth.apply(session.client.request(method, url)))
    }

    async fn send(request: reqwest::RequestBuilder) -> CheckResult<ApiResponse> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(status, bytes = body.len(), "api response");
        Ok(ApiResponse { status, body })
    }

    /// GET `endpoint`
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Uninitialized`] before [`init`](Self::init), or
    /// [`CheckError::Http`] on transport failure.
    pub async fn get(&self, endpoint: &str) -> CheckResult<ApiResponse> {
        Self::send(self.request(reqwest::Method::GET, endpoint)?).await
    }

    /// POST `payload` as JSON to `endpoint`
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn post<T: Serialize + ?Sized>(&self, endpoint: &str, payload: &T) -> CheckResult<ApiResponse> {
        let request = self
            .request(reqwest::Method::POST, endpoint)?
            .json(payload)
            .timeout(Duration::from_millis(WRITE_TIMEOUT_MS));
        Self::send(request).await
    }

    /// PUT `payload` as JSON to `endpoint`
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn put<T: Serialize + ?Sized>(&self, endpoint: &str, payload: &T) -> CheckResult<ApiResponse> {
        let request = self
            .request(reqwest::Method::PUT, endpoint)?
            .json(payload)
            .timeout(Duration::from_millis(WRITE_TIMEOUT_MS));
        Self::send(request).await
    }

    /// DELETE `endpoint`
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn delete(&self, endpoint: &str) -> CheckResult<ApiResponse> {
        let request = self
            .request(reqwest::Method::DELETE, endpoint)?
            .timeout(Duration::from_millis(WRITE_TIMEOUT_MS));
        Self::send(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod response {
        use super::*;

        #[test]
        fn test_ok_range() {
            assert!(ApiResponse::new(200, "").ok());
            assert!(ApiResponse::new(201, "").ok());
            assert!(!ApiResponse::new(302, "").ok());
            assert!(!ApiResponse::new(404, "").ok());
        }

        #[test]
        fn test_json_parse() {
            let response = ApiResponse::new(200, r#"{"id": 7}"#);
            assert_eq!(response.json().unwrap()["id"], 7);
            assert!(ApiResponse::new(200, "<html>").json().is_err());
        }
    }

    mod auth {
        use super::*;

        #[test]
        fn test_kind_parsing() {
            assert_eq!("bearer".parse::<AuthKind>().unwrap(), AuthKind::Bearer);
            assert_eq!("".parse::<AuthKind>().unwrap(), AuthKind::None);
            let err = "digest".parse::<AuthKind>().unwrap_err();
            assert!(matches!(err, CheckError::UnsupportedConfig { setting: "auth kind", .. }));
        }

        #[test]
        fn test_bearer_needs_token() {
            assert!(ApiAuth::from_kind(AuthKind::Bearer, None, None).is_err());
            let auth = ApiAuth::from_kind(AuthKind::Basic, Some("ci".into()), None).unwrap();
            assert_eq!(auth.kind(), AuthKind::Basic);
        }
    }

    mod session {
        use super::*;

        #[tokio::test]
        async fn test_uninitialized_session_fails() {
            let session = ApiSession::new();
            let err = session.get("/users").await.unwrap_err();
            assert!(matches!(err, CheckError::Uninitialized { resource: "API session", .. }));
            assert!(session.delete("/users/1").await.is_err());
        }

        #[test]
        fn test_init_parses_base_url() {
            let mut session = ApiSession::new();
            session.init("http://127.0.0.1:9/api/").unwrap();
            assert!(session.is_initialized());
            assert_eq!(session.base_url(), Some("http://127.0.0.1:9/api/"));
        }

        #[test]
        fn test_init_rejects_garbage() {
            let mut session = ApiSession::new();
            let err = session.init("not a url").unwrap_err();
            assert!(matches!(err, CheckError::Config { .. }));
            assert!(!session.is_initialized());
        }

        #[test]
        fn test_endpoints_join_like_links() {
            let mut session = ApiSession::new();
            session.init("https://shop.test/v1/index.html").unwrap();
            let url = |endpoint: &str| session.request(reqwest::Method::GET, endpoint).unwrap().build().unwrap().url().clone();
            assert_eq!(url("/users").as_str(), "https://shop.test/users");
            assert_eq!(url("users/2").as_str(), "https://shop.test/v1/users/2");
            assert_eq!(url("https://other.test/ping").as_str(), "https://other.test/ping");
        }
    }
}
