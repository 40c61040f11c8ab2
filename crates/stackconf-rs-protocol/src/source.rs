use crate::bag::{ConfigBag, SiteTag};
use crate::stack::StackConfigItem;
use async_trait::async_trait;

/// Errors returned by config sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The request could not be completed.
    #[error("transport failed: {0}")]
    Transport(String),
    /// The response body could not be decoded.
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Source of stack definitions and stored property bags.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Fetch stack-declared properties for one service.
    async fn advanced_configs(&self, service_name: &str)
    -> Result<Vec<StackConfigItem>, SourceError>;

    /// Fetch the bags for the requested site/tag pairs. Pairs without a
    /// server record are simply absent from the result.
    async fn config_bags(&self, tags: &[SiteTag]) -> Result<Vec<ConfigBag>, SourceError>;
}
