//! HTTP story fetcher backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use story_player_core::entry::EntryDescriptor;
use story_player_core::error::PlayerError;
use story_player_core::fetch::StoryFetcher;
use tracing::{debug, instrument};

use crate::domain::config::JSON_CONTENT_TYPE;

/// Fetches story descriptors from a publisher endpoint with a plain GET.
#[derive(Debug, Clone)]
pub struct HttpStoryFetcher {
    client: reqwest::Client,
}

impl HttpStoryFetcher {
    /// Creates a fetcher with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Fetch` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, PlayerError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PlayerError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait(?Send)]
impl StoryFetcher for HttpStoryFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<EntryDescriptor>, PlayerError> {
        let response = self
            .client
            .get(url)
            .header("Accept", JSON_CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| PlayerError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlayerError::Fetch(format!("{url} answered {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PlayerError::Fetch(e.to_string()))?;
        let stories = decode_stories(&body)?;
        debug!(count = stories.len(), "fetched stories");
        Ok(stories)
    }
}

/// Decodes an endpoint response body: a JSON array of descriptors.
///
/// # Errors
///
/// Returns `PlayerError::Fetch` if the body is not such an array.
pub fn decode_stories(body: &str) -> Result<Vec<EntryDescriptor>, PlayerError> {
    serde_json::from_str(body).map_err(|e| PlayerError::Fetch(format!("malformed story list: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_stories_reads_endpoint_array() {
        // Arrange
        let body = r#"[
            {"href": "https://s.example/4.html", "title": "Four"},
            {"href": "https://s.example/5.html", "posterImage": "https://s.example/5.jpg"}
        ]"#;

        // Act
        let stories = decode_stories(body).unwrap();

        // Assert
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].locator, "https://s.example/4.html");
        assert_eq!(stories[0].title.as_deref(), Some("Four"));
        assert_eq!(
            stories[1].poster_image.as_deref(),
            Some("https://s.example/5.jpg")
        );
    }

    #[test]
    fn test_decode_stories_accepts_empty_array() {
        assert!(decode_stories("[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_stories_rejects_non_array() {
        let result = decode_stories(r#"{"stories": []}"#);

        assert!(matches!(result, Err(PlayerError::Fetch(_))));
    }

    #[test]
    fn test_new_builds_client() {
        assert!(HttpStoryFetcher::new().is_ok());
    }
}
