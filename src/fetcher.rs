use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::utils::error::{AppError, FetchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One document request.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    /// Sent url-encoded when the method is `Post`.
    pub form: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            form: Vec::new(),
            headers: HashMap::new(),
        }
    }

    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            form,
            ..Self::get(url)
        }
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }
}

/// Retrieves raw document text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher. Each source adapter owns one, so cookies and
/// connection pools are never shared between sources.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(
        user_agent: &str,
        cookies: &HashMap<String, String>,
        timeout: Duration,
    ) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(user_agent)?);
        if let Some(cookie) = cookie_header(cookies) {
            headers.insert(COOKIE, header_value(&cookie)?);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<String, FetchError> {
        let url = request.url.as_str();
        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url).form(&request.form),
        };

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| FetchError::Request {
                url: url.to_string(),
                message: format!("invalid header name {name}: {e}"),
            })?;
            builder = builder.header(name, value.as_str());
        }

        tracing::debug!("Fetching {:?} {}", request.method, url);
        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }
}

fn header_value(value: &str) -> crate::Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        AppError::Config(config::ConfigError::Message(format!(
            "invalid header value {value:?}: {e}"
        )))
    })
}

/// `a=1; b=2`, sorted by name.
fn cookie_header(cookies: &HashMap<String, String>) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    let sorted: BTreeMap<_, _> = cookies.iter().collect();
    Some(
        sorted
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}
