//! Bounded fan-out for object-detail reads
//!
//! Every processor lists its kind once and then needs one detail read
//! per instance. Those reads are independent, so they run through a
//! bounded `buffer_unordered` stream: up to `workers` requests in
//! flight, results consumed in completion order. A failed detail read
//! is logged and dropped from the batch; it never aborts its siblings.

use crate::xc::client::XcClient;
use futures::stream::{self, StreamExt};
use serde_json::Value;

/// One detail read: the resource URI plus the identity the result
/// should be filed under (usually the object or site name).
#[derive(Debug, Clone)]
pub struct FetchTarget {
    pub name: String,
    pub uri: String,
}

impl FetchTarget {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
        }
    }
}

/// A completed detail read
#[derive(Debug, Clone)]
pub struct Fetched {
    pub name: String,
    pub body: Value,
}

/// Fetch all targets with at most `workers` requests in flight.
///
/// Results carry their own identity, so completion order does not
/// matter to callers. Failures are excluded from the result set.
pub async fn fetch_all(client: &XcClient, targets: Vec<FetchTarget>, workers: usize) -> Vec<Fetched> {
    let workers = workers.max(1);

    stream::iter(targets)
        .map(|target| async move {
            match client.get(&target.uri).await {
                Ok(body) => Some(Fetched {
                    name: target.name,
                    body,
                }),
                Err(err) => {
                    tracing::warn!("detail read {} failed: {}", target.uri, err);
                    None
                }
            }
        })
        .buffer_unordered(workers)
        .filter_map(|r| async move { r })
        .collect()
        .await
}
