//! HTTP gateway to the TaskFlux service
//!
//! Every remote call goes through [`ApiClient::request`], which attaches the
//! bearer token, encodes JSON bodies and turns failures into [`Error`]s.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::Error;
use crate::session::SessionStore;
use crate::Result;

/// HTTP method accepted by the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Attach `Authorization: Bearer <token>` when a token is stored
    pub requires_auth: bool,
    pub extra_headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Option<Value>) -> Self {
        Self {
            method: Method::Post,
            body,
            ..Self::default()
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: Method::Put,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::Delete,
            ..Self::default()
        }
    }

    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }
}

/// Cheap-to-clone API client bound to one session
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Send a request to `path` (relative to the base URL)
    ///
    /// Returns the parsed JSON body, or `None` when the body is empty or not
    /// JSON. A non-success status becomes [`Error::Request`] carrying the
    /// body's `message` or `error` field; a failed connection becomes
    /// [`Error::Network`].
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Option<Value>> {
        let url = format!("{}{}", self.base_url, path);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &options.extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidInput(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidInput(format!("Invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let mut builder = self
            .http
            .request(options.method.into(), &url)
            .headers(headers);

        if options.requires_auth {
            let token = self.session.token().await;
            if !token.is_empty() {
                builder = builder.bearer_auth(token);
            }
        }
        if let Some(body) = &options.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        debug!("{:?} {}", options.method, path);
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let data = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .filter(|value| !value.is_null());

        if !status.is_success() {
            let message = error_message(data.as_ref())
                .unwrap_or_else(|| format!("Request failed ({})", status.as_u16()));
            warn!("{:?} {} failed with {}: {}", options.method, path, status, message);
            return Err(Error::Request {
                status: status.as_u16(),
                message,
            });
        }

        Ok(data)
    }
}

fn error_message(data: Option<&Value>) -> Option<String> {
    let data = data?;
    ["message", "error"].into_iter().find_map(|key| {
        data.get(key)
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    })
}

/// Pull `key` out of a response body, treating a missing body, a missing key
/// and `null` alike
pub(crate) fn take_field<T: DeserializeOwned>(data: Option<Value>, key: &str) -> Result<Option<T>> {
    let Some(mut data) = data else {
        return Ok(None);
    };
    match data.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}
