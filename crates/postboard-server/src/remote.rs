//! The REST API that supplies users, posts and comments.

use std::fmt;
use std::future::Future;

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FetchError;

pub const DEFAULT_API_BASE: &str = "https://dummyjson.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Posts,
    Comments,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Users, Resource::Posts, Resource::Comments];

    /// Path segment of the collection, which is also the array field of its envelope.
    pub fn name(self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Posts => "posts",
            Resource::Comments => "comments",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source of raw collection envelopes (`{<resource>: [...], total, skip, limit}`).
pub trait RemoteSource {
    fn fetch(&self, resource: Resource) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// `<base>/<resource>?limit=0`, the all-records form of a collection request.
pub fn resource_url(base: &str, resource: Resource) -> String {
    format!("{}/{}?limit=0", base.trim_end_matches('/'), resource.name())
}

/// Pull the named array out of an envelope and decode it. Other envelope fields are ignored.
pub fn extract_collection<T: DeserializeOwned>(
    resource: Resource,
    envelope: Value,
) -> Result<Vec<T>, FetchError> {
    let items = match envelope {
        Value::Object(mut map) => map.remove(resource.name()),
        _ => None,
    }
    .ok_or_else(|| FetchError::Decode {
        resource,
        message: format!("missing '{}' array", resource.name()),
    })?;

    serde_json::from_value(items).map_err(|e| FetchError::Decode {
        resource,
        message: e.to_string(),
    })
}

pub struct DummyJsonSource {
    http: reqwest::Client,
    base: String,
}

impl DummyJsonSource {
    pub fn new(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self { http, base: base.into() }
    }
}

impl RemoteSource for DummyJsonSource {
    async fn fetch(&self, resource: Resource) -> Result<Value, FetchError> {
        let url = resource_url(&self.base, resource);
        tracing::info!(%resource, %url, "fetching");

        let resp = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                resource,
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                resource,
                status: status.as_u16(),
            });
        }

        resp.json::<Value>().await.map_err(|e| FetchError::Decode {
            resource,
            message: e.to_string(),
        })
    }
}
