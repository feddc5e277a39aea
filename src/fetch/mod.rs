//! A small HTTP client for talking to the dialog platform and friends.
//!
//! Every call returns the response body as text, whatever the status code.
//! Only transport failures are errors.

pub mod query;

use anyhow::{Context, Result, bail};
use reqwest::RequestBuilder;
use reqwest::header::CONTENT_TYPE;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};
use url::form_urlencoded;

pub use query::{append_query_params, query_param, query_params, remove_query_params};

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Request headers as name/value pairs.
pub type Headers = [(String, String)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    /// POST the url's own query parameters as a form.
    PostForm,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::PostForm => "POST-FORM",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "POST-FORM" => Ok(Self::PostForm),
            _ => bail!("unsupported method: {s}"),
        }
    }
}

/// Thin wrapper over a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, url: &str, headers: &Headers) -> Result<String> {
        self.send(Method::Get, self.client.get(url), headers).await
    }

    /// POST `body` as JSON.
    pub async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<String> {
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON)
            .body(body.to_string());
        self.send(Method::Post, request, headers).await
    }

    /// PUT `body` as JSON.
    pub async fn put(&self, url: &str, body: &str, headers: &Headers) -> Result<String> {
        let request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, JSON)
            .body(body.to_string());
        self.send(Method::Put, request, headers).await
    }

    pub async fn delete(&self, url: &str, headers: &Headers) -> Result<String> {
        self.send(Method::Delete, self.client.delete(url), headers).await
    }

    /// POST `params` as an url-encoded form.
    pub async fn post_form<K, V>(
        &self,
        url: &str,
        params: &[(K, V)],
        headers: &Headers,
    ) -> Result<String>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let body = encode_form(params);
        let request = self.client.post(url).header(CONTENT_TYPE, FORM).body(body);
        self.send(Method::PostForm, request, headers).await
    }

    /// Dispatch on `method`. `body` is ignored by methods that carry none.
    pub async fn fetch(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
        headers: &Headers,
    ) -> Result<String> {
        let body = body.unwrap_or_default();
        match method {
            Method::Get => self.get(url, headers).await,
            Method::Post => self.post(url, body, headers).await,
            Method::Put => self.put(url, body, headers).await,
            Method::Delete => self.delete(url, headers).await,
            Method::PostForm => {
                let mut params: Vec<(String, String)> = query_params(url)?.into_iter().collect();
                params.sort();
                self.post_form(url, &params, headers).await
            }
        }
    }

    async fn send(&self, method: Method, request: RequestBuilder, headers: &Headers) -> Result<String> {
        let request = headers
            .iter()
            .fold(request, |request, (name, value)| request.header(name, value));

        let response = request
            .send()
            .await
            .with_context(|| format!("{method} request failed"))?;
        let status = response.status();
        let url = response.url().to_string();
        if status.is_success() {
            debug!(%method, %url, %status, "request completed");
        } else {
            warn!(%method, %url, %status, "request returned an error status");
        }

        response
            .text()
            .await
            .with_context(|| format!("failed to read {method} response body from {url}"))
    }
}

fn encode_form<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut form = form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        form.append_pair(name.as_ref(), value.as_ref());
    }
    form.finish()
}

/// Parse a `Name: value` header line.
pub fn parse_header(line: &str) -> Result<(String, String)> {
    let (name, value) = line
        .split_once(':')
        .with_context(|| format!("header must look like `Name: value`, got `{line}`"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("header has an empty name: `{line}`");
    }
    Ok((name.to_string(), value.trim().to_string()))
}
