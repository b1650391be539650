use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response, multipart};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// An error response from the server.
#[derive(Debug, Error)]
#[error("{message} ({code}, HTTP {status})")]
pub struct ApiError {
    pub status: u16,
    pub code: String,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Blocking client for the `/api/v1` surface.
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(server: &str, token: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: format!("{}/api/v1", server.trim_end_matches('/')),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        decode(self.request(Method::GET, path).send()?)
    }

    pub fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        decode(self.request(Method::DELETE, path).send()?)
    }

    pub fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &Value,
    ) -> Result<T> {
        decode(self.request(method, path).json(body).send()?)
    }

    pub fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> Result<T> {
        decode(self.request(Method::POST, path).multipart(form).send()?)
    }

    pub fn put_bytes<T: DeserializeOwned>(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<T> {
        decode(
            self.request(Method::PUT, path)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(bytes)
                .send()?,
        )
    }
}

fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
    let status = res.status();
    if status.is_success() {
        return res.json().context("Unexpected response body");
    }

    let text = res.text().unwrap_or_default();
    let error = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => ApiError {
            status: status.as_u16(),
            code: body.code,
            message: body.message,
        },
        Err(_) => ApiError {
            status: status.as_u16(),
            code: "HTTP_ERROR".to_string(),
            message: if text.is_empty() {
                status.to_string()
            } else {
                text
            },
        },
    };
    Err(error.into())
}
