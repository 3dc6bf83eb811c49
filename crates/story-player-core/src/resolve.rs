//! Serving-address resolution.

use async_trait::async_trait;

use crate::error::PlayerError;

/// Rewrites a story locator to a URL served by a caching host.
#[async_trait(?Send)]
pub trait ServingResolver {
    /// Returns true if `url` is already served from a proxy origin.
    fn is_proxy_origin(&self, url: &str) -> bool;

    /// Returns the URL under which `host` serves `locator`.
    async fn serving_url(&self, host: &str, locator: &str) -> Result<String, PlayerError>;
}

/// Resolver that never rewrites. Used when no serving host is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughResolver;

#[async_trait(?Send)]
impl ServingResolver for PassthroughResolver {
    fn is_proxy_origin(&self, _url: &str) -> bool {
        false
    }

    async fn serving_url(&self, _host: &str, locator: &str) -> Result<String, PlayerError> {
        Ok(locator.to_owned())
    }
}
