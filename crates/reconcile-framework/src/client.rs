//! # Remote Client Boundary
//!
//! Drivers talk to the provisioning API only through these traits, so the
//! same driver runs against the actor-backed simulator, a real HTTP client,
//! or the expectation mock in tests.
//!
//! Every call returns the HTTP-style [`ApiResponse`](crate::response::ApiResponse)
//! alongside the decoded value; a [`TransportError`](crate::response::TransportError)
//! means no response was received at all.

use crate::kind::{ManagedKind, ResourceKind};
use crate::response::{CallResult, StatusResult};
use async_trait::async_trait;

#[async_trait]
pub trait RemoteClient<K: ResourceKind>: Send + Sync {
    /// Fetches the full collection.
    async fn find(&self) -> CallResult<Vec<K::Object>>;

    async fn get(&self, id: &str) -> CallResult<K::Object>;
}

#[async_trait]
pub trait ManagedClient<K: ManagedKind>: RemoteClient<K> {
    /// Creates an object under `parent_id`. The new identifier is only
    /// reported through the `location` header.
    async fn add(&self, parent_id: &str, body: &K::Body) -> StatusResult;

    async fn update(&self, id: &str, body: &K::Body) -> CallResult<K::Object>;

    async fn delete(&self, id: &str) -> StatusResult;
}
