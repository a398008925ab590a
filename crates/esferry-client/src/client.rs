//! Connection handle for one configured endpoint

use reqwest::Method;
use serde::Deserialize;

use crate::error::ClientError;
use crate::http::{block_on, http_client};
use crate::scroll::Scroll;

/// Error bodies are truncated to this length before ending up in messages
const ERROR_BODY_LIMIT: usize = 400;

/// Connection settings for one run.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Endpoint URL, e.g. `http://localhost:9200`
    pub url: String,
    /// Basic auth user name (required when X-Pack security is enabled)
    pub username: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
    /// Log request/response bodies at debug level
    pub trace_requests: bool,
}

/// Cluster banner returned by `GET /`
#[derive(Debug, Deserialize)]
struct ClusterBanner {
    #[serde(default)]
    cluster_name: String,
    #[serde(default)]
    version: BannerVersion,
}

#[derive(Debug, Default, Deserialize)]
struct BannerVersion {
    #[serde(default)]
    number: String,
}

/// Immutable connection handle, passed into each pipeline call.
pub struct EsClient {
    base: String,
    auth: Option<(String, String)>,
    trace: bool,
}

impl EsClient {
    /// Establish the connection: build the handle and verify the endpoint
    /// answers with a cluster banner. Failure here aborts the whole run
    /// before either pipeline starts.
    pub fn connect(opts: &ConnectOptions) -> Result<Self, ClientError> {
        let auth = match (&opts.username, &opts.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };
        let client = Self {
            base: opts.url.trim_end_matches('/').to_string(),
            auth,
            trace: opts.trace_requests,
        };

        let body = client.request(Method::GET, &client.endpoint(""), None)?;
        let banner: ClusterBanner = serde_json::from_str(&body)?;
        log::info!(
            "connected to cluster \"{}\" (version {})",
            banner.cluster_name,
            banner.version.number
        );
        Ok(client)
    }

    /// Open a scroll over `index`, draining it `page_size` documents at a time.
    pub fn open_scroll(&self, index: &str, page_size: usize) -> Scroll<'_> {
        Scroll::new(self, index, page_size)
    }

    /// Index a single document. `document` must be one JSON object.
    pub fn index_document(
        &self,
        index: &str,
        doctype: &str,
        document: &str,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&format!("{index}/{doctype}"));
        self.request(Method::POST, &url, Some(document.to_string()))?;
        Ok(())
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/", self.base)
        } else {
            format!("{}/{path}", self.base)
        }
    }

    /// One synchronous HTTP round trip; non-2xx statuses become errors.
    pub(crate) fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> Result<String, ClientError> {
        if self.trace {
            log::debug!(
                "{method} {url} body={}",
                body.as_deref().unwrap_or("<none>")
            );
        }

        let text = block_on(async {
            let mut req = http_client().request(method, url);
            if let Some((user, pass)) = &self.auth {
                req = req.basic_auth(user, Some(pass));
            }
            if let Some(body) = body {
                req = req
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body);
            }

            let resp = req
                .send()
                .await
                .map_err(|e| ClientError::from_reqwest(&e))?;
            let status = resp.status();
            let text = resp
                .text()
                .await
                .map_err(|e| ClientError::from_reqwest(&e))?;

            if !status.is_success() {
                return Err(ClientError::Http {
                    status: Some(status.as_u16()),
                    message: truncate_body(&text),
                });
            }
            Ok(text)
        })?;

        if self.trace {
            log::debug!("response: {text}");
        }
        Ok(text)
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    let cut = (0..=ERROR_BODY_LIMIT)
        .rev()
        .find(|&i| body.is_char_boundary(i))
        .unwrap_or(0);
    format!("{}...", &body[..cut])
}
