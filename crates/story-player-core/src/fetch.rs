//! Story fetcher abstraction.

use async_trait::async_trait;

use crate::entry::EntryDescriptor;
use crate::error::PlayerError;

/// Retrieves additional story descriptors from a publisher endpoint.
#[async_trait(?Send)]
pub trait StoryFetcher {
    /// Issues a GET to `url` and decodes a JSON array of descriptors.
    async fn fetch(&self, url: &str) -> Result<Vec<EntryDescriptor>, PlayerError>;
}
