//! HTTP client for the Capsule CRM REST API.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::{query::Query, Error};

/// Request timeout for Capsule API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP verbs understood by [`Client::request`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}
impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Method::Get => "GET",
                Method::Post => "POST",
                Method::Put => "PUT",
                Method::Delete => "DELETE",
            }
        )
    }
}

/// Status, `Location` header and raw body of a successful response.
///
/// Write calls (POST/PUT/DELETE) hand this back untouched; the caller decides
/// whether it needs the created id, the decoded body, or nothing at all.
#[derive(Debug, Clone)]
pub struct WriteResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

impl WriteResponse {
    /// Extracts the numeric id of a newly created resource from the last
    /// path segment of the `Location` header.
    pub fn created_id(&self) -> Result<u64, Error> {
        let location = self.location.as_deref().ok_or(Error::MissingLocation)?;
        location
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse::<u64>().ok())
            .ok_or(Error::MissingLocation)
    }

    /// Decodes the body as JSON.
    pub fn json(&self) -> Result<Value, Error> {
        serde_json::from_str(&self.body).map_err(|e| {
            tracing::error!("Failed to parse response body: {} | body: {}", e, truncate_body(&self.body));
            Error::InvalidJson(e.to_string())
        })
    }
}

/// HTTP client for the Capsule CRM API.
///
/// Every request carries HTTP Basic credentials: the API key as the user
/// name and the account name as the password. One `reqwest::Client` is built
/// per `Client` with a 30-second timeout.
pub struct Client {
    /// Base URL for the API. Defaults to `https://{account}.capsulecrm.com/api`.
    base_api_url: String,
    account: String,
    api_key: String,
    http: reqwest::Client,
}

impl Client {
    /// Creates a client for the production API of the given account.
    pub fn new(account: &str, api_key: &str) -> Result<Self, Error> {
        let base_url = format!("https://{}.capsulecrm.com/api", account);
        Self::with_base_url(&base_url, account, api_key)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, account: &str, api_key: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
            account: account.to_string(),
            api_key: api_key.to_string(),
            http,
        })
    }

    /// The account (subdomain) this client talks to.
    pub fn account(&self) -> &str {
        &self.account
    }

    fn get_url(&self, path: &str, query: Option<&impl Query>) -> Result<Url, Error> {
        let url = Url::parse(
            format!("{}/{}", &self.base_api_url, path.trim_start_matches('/')).as_str(),
        )
        .map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        Ok(match query {
            Some(query) => query.add_to_url(&url),
            None => url,
        })
    }

    /// Generic request. GET sends `params` as the query string (null values
    /// are left out), every other verb sends them as a JSON body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &serde_json::Map<String, Value>,
    ) -> Result<WriteResponse, Error> {
        let mut url = self.get_url(path, None::<&crate::PartyQuery>)?;
        match method {
            Method::Get => {
                for (key, value) in params {
                    let value = match value {
                        Value::Null => continue,
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    url.query_pairs_mut().append_pair(key, &value);
                }
                self.send(method, url, None).await
            }
            _ => {
                let body = Value::Object(params.clone());
                self.send(method, url, Some(&body)).await
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<WriteResponse, Error> {
        tracing::debug!("{} {}", method, url.path());
        let builder = match method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Put => self.http.put(url),
            Method::Delete => self.http.delete(url),
        };
        let builder = builder
            .basic_auth(&self.api_key, Some(&self.account))
            .header("accept", "application/json")
            .header("content-type", "application/json");
        let builder = match body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let resp = builder.send().await.map_err(|e| {
            tracing::error!("Failed to send {} request: {}", method, e);
            Error::RequestFailed
        })?;

        let status = resp.status();
        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(WriteResponse {
            status: status.as_u16(),
            location,
            body,
        })
    }

    /// Fetches a resource and decodes the body as JSON.
    pub async fn get<Q>(&self, path: &str, query: Option<&Q>) -> Result<Value, Error>
    where
        Q: Query,
    {
        let url = self.get_url(path, query)?;
        self.send(Method::Get, url, None).await?.json()
    }

    /// Fetches a resource that takes no query parameters.
    pub async fn get_path(&self, path: &str) -> Result<Value, Error> {
        self.get::<crate::PartyQuery>(path, None).await
    }

    /// Sends `body` as a JSON POST.
    pub async fn post(&self, path: &str, body: &Value) -> Result<WriteResponse, Error> {
        let url = self.get_url(path, None::<&crate::PartyQuery>)?;
        self.send(Method::Post, url, Some(body)).await
    }

    /// Sends `body` as a JSON PUT.
    pub async fn put(&self, path: &str, body: &Value) -> Result<WriteResponse, Error> {
        let url = self.get_url(path, None::<&crate::PartyQuery>)?;
        self.send(Method::Put, url, Some(body)).await
    }

    /// Sends a DELETE, with `body` as JSON.
    pub async fn delete(&self, path: &str, body: &Value) -> Result<WriteResponse, Error> {
        let url = self.get_url(path, None::<&crate::PartyQuery>)?;
        self.send(Method::Delete, url, Some(body)).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
