//! Scroll-based pagination over an index.
//!
//! The scroll id is server state; it lives for the duration of one export
//! run and is released (best effort) when the [`Scroll`] is dropped.

use reqwest::Method;
use serde::Deserialize;

use crate::client::EsClient;
use crate::error::ClientError;

/// Keepalive window the server holds the cursor open between pages
const SCROLL_KEEPALIVE: &str = "1m";

/// One search hit. `_source` can be absent on source-disabled indices.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_source", default)]
    pub source: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "_scroll_id", default)]
    scroll_id: Option<String>,
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Vec<Hit>,
}

/// `hits.total` is a plain number up to ES 6 and an object from ES 7 on.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Relation { value: u64 },
}

impl TotalHits {
    pub fn value(self) -> u64 {
        match self {
            Self::Count(n) => n,
            Self::Relation { value } => value,
        }
    }
}

/// Pagination cursor over one index.
pub struct Scroll<'a> {
    client: &'a EsClient,
    index: String,
    page_size: usize,
    scroll_id: Option<String>,
    total: Option<u64>,
    started: bool,
    exhausted: bool,
}

impl<'a> Scroll<'a> {
    pub(crate) fn new(client: &'a EsClient, index: &str, page_size: usize) -> Self {
        Self {
            client,
            index: index.to_string(),
            page_size,
            scroll_id: None,
            total: None,
            started: false,
            exhausted: false,
        }
    }

    /// Total matching documents reported by the server, known after the
    /// first page.
    pub fn total_hits(&self) -> Option<u64> {
        self.total
    }

    /// Fetch the next page of hits; `None` once the index is drained.
    pub fn next_page(&mut self) -> Result<Option<Vec<Hit>>, ClientError> {
        if self.exhausted {
            return Ok(None);
        }

        let text = if !self.started {
            self.started = true;
            let url = self
                .client
                .endpoint(&format!("{}/_search?scroll={SCROLL_KEEPALIVE}", self.index));
            let body = serde_json::json!({
                "size": self.page_size,
                "sort": ["_doc"],
                "query": { "match_all": {} },
            });
            self.client
                .request(Method::POST, &url, Some(body.to_string()))?
        } else {
            let Some(id) = self.scroll_id.as_deref() else {
                self.exhausted = true;
                return Err(ClientError::Unexpected(
                    "server returned hits without a scroll id".to_string(),
                ));
            };
            let url = self.client.endpoint("_search/scroll");
            let body = serde_json::json!({
                "scroll": SCROLL_KEEPALIVE,
                "scroll_id": id,
            });
            self.client
                .request(Method::POST, &url, Some(body.to_string()))?
        };

        let resp: SearchResponse = serde_json::from_str(&text)?;
        if let Some(id) = resp.scroll_id {
            self.scroll_id = Some(id);
        }
        if self.total.is_none() {
            self.total = resp.hits.total.map(TotalHits::value);
        }

        if resp.hits.hits.is_empty() {
            self.exhausted = true;
            self.release();
            return Ok(None);
        }
        Ok(Some(resp.hits.hits))
    }

    /// Tell the server to drop the cursor. Best effort only.
    fn release(&mut self) {
        let Some(id) = self.scroll_id.take() else {
            return;
        };
        let url = self.client.endpoint("_search/scroll");
        let body = serde_json::json!({ "scroll_id": [id] });
        if let Err(e) = self
            .client
            .request(Method::DELETE, &url, Some(body.to_string()))
        {
            log::debug!("failed to clear scroll: {e}");
        }
    }
}

impl Drop for Scroll<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_legacy_numeric_total() {
        let resp: SearchResponse = serde_json::from_str(
            r#"{"_scroll_id":"abc123","hits":{"total":42,"hits":[{"_id":"1","_source":{"a":1}}]}}"#,
        )
        .unwrap();
        assert_eq!(resp.scroll_id.as_deref(), Some("abc123"));
        assert_eq!(resp.hits.total.map(TotalHits::value), Some(42));
        assert_eq!(resp.hits.hits.len(), 1);
    }

    #[test]
    fn decode_object_total() {
        let resp: SearchResponse = serde_json::from_str(
            r#"{"hits":{"total":{"value":7,"relation":"eq"},"hits":[]}}"#,
        )
        .unwrap();
        assert_eq!(resp.hits.total.map(TotalHits::value), Some(7));
        assert!(resp.hits.hits.is_empty());
    }

    #[test]
    fn decode_hit_without_source() {
        let resp: SearchResponse =
            serde_json::from_str(r#"{"hits":{"hits":[{"_id":"9"}]}}"#).unwrap();
        let hit = &resp.hits.hits[0];
        assert_eq!(hit.id.as_deref(), Some("9"));
        assert!(hit.source.is_none());
    }

    #[test]
    fn decode_source_payload_preserved() {
        let resp: SearchResponse = serde_json::from_str(
            r#"{"hits":{"hits":[{"_id":"1","_source":{"msg":"hello","n":[1,2,3]}}]}}"#,
        )
        .unwrap();
        let source = resp.hits.hits[0].source.as_ref().unwrap();
        assert_eq!(source["msg"], "hello");
        assert_eq!(source["n"][2], 3);
    }
}
