//! Request descriptions, raw responses and status classification.

use super::error::{MemosError, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// One logical API call; replayed verbatim on every retry attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the base URL, e.g. `/api/v1/memos/1`.
    pub path: String,
    /// Query parameters in the order they are sent.
    pub query: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Request without query or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// `GET path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path` with a JSON body.
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    /// `PATCH path` with a JSON body.
    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_body(body)
    }

    /// `DELETE path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

/// Successful (2xx) response as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status.
    pub status: u16,
    /// Raw body text.
    pub body: String,
}

impl ApiResponse {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|err| MemosError::InvalidResponse(err.to_string()))
    }
}

/// Resource type and identifier addressed by `path`.
///
/// Only `/api/v1/{resources}/{id}` style paths resolve: the type is the third segment with a
/// single trailing `s` removed and the id is the fourth segment, if any. Anything else yields two
/// empty strings.
pub fn resource_info(path: &str) -> (String, String) {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.len() < 3 || segments[1] != "v1" {
        return (String::new(), String::new());
    }
    let collection = segments[2];
    let resource = collection.strip_suffix('s').unwrap_or(collection);
    let resource_id = segments.get(3).copied().unwrap_or_default();
    (resource.to_string(), resource_id.to_string())
}

/// Map a non-success status to its error variant.
pub fn classify_status(status: u16, body: &str, path: &str) -> MemosError {
    match status {
        401 => MemosError::Authentication {
            message: "Authentication failed".to_string(),
        },
        404 => {
            let (resource, resource_id) = resource_info(path);
            if resource.is_empty() {
                MemosError::Api {
                    status,
                    message: body.to_string(),
                }
            } else {
                MemosError::NotFound {
                    resource,
                    resource_id,
                }
            }
        }
        400 => MemosError::Validation {
            message: detail(body).unwrap_or_else(|| "Validation failed".to_string()),
        },
        500..=599 => MemosError::Server {
            status,
            message: body.to_string(),
        },
        _ => MemosError::Api {
            status,
            message: body.to_string(),
        },
    }
}

fn detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
