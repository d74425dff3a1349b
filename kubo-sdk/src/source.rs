// ABOUTME: Abstraction over anything that can serve content by identifier
// ABOUTME: Lets the pipeline run against the live node or an in-memory fake

use crate::{ContentId, ContentStream, Result};
use async_trait::async_trait;

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Open the content body of `id` for streaming
    async fn cat(&self, id: &ContentId) -> Result<ContentStream>;

    /// Whether the source is currently reachable
    async fn is_up(&self) -> bool;
}
