//! Test fetcher, resolver and page scroller.

use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use story_player_core::entry::EntryDescriptor;
use story_player_core::error::PlayerError;
use story_player_core::fetch::StoryFetcher;
use story_player_core::resolve::ServingResolver;
use story_player_core::scroll::PageScroller;
use url::{Position, Url};

/// A fetcher that answers from a queue of canned responses. An empty queue
/// answers with no stories.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: RefCell<VecDeque<Result<Vec<EntryDescriptor>, PlayerError>>>,
    requested: RefCell<Vec<String>>,
}

impl StaticFetcher {
    /// Creates a fetcher with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the response for the next fetch.
    pub fn respond(&self, response: Result<Vec<EntryDescriptor>, PlayerError>) {
        self.responses.borrow_mut().push_back(response);
    }

    /// Every URL fetched, in order.
    #[must_use]
    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

#[async_trait(?Send)]
impl StoryFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<EntryDescriptor>, PlayerError> {
        self.requested.borrow_mut().push(url.to_owned());
        let next = self.responses.borrow_mut().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// A resolver that rewrites `https://a.example/x` served by `host` to
/// `https://a-example.<host>/v/s/a.example/x`, the way a caching host does.
#[derive(Debug, Default)]
pub struct RewritingResolver {
    calls: RefCell<Vec<(String, String)>>,
}

impl RewritingResolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(host, locator)` resolved, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl ServingResolver for RewritingResolver {
    fn is_proxy_origin(&self, url: &str) -> bool {
        Url::parse(url).ok().is_some_and(|url| {
            url.host_str().is_some_and(|domain| {
                domain.ends_with(".cdn.ampproject.org") || domain.ends_with(".www.bing-amp.com")
            })
        })
    }

    async fn serving_url(&self, host: &str, locator: &str) -> Result<String, PlayerError> {
        self.calls
            .borrow_mut()
            .push((host.to_owned(), locator.to_owned()));
        let url = Url::parse(locator)
            .ok()
            .filter(|url| url.scheme() == "https")
            .ok_or_else(|| PlayerError::Validation(format!("not an absolute url: {locator}")))?;
        let domain = url.host_str().unwrap_or_default().replace('.', "-");
        let rest = &url[Position::BeforeHost..];
        Ok(format!("https://{domain}.{host}/v/s/{rest}"))
    }
}

/// A page-scroller call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollCall {
    /// `on_touch_start`.
    Start {
        /// Event time.
        time_stamp: f64,
        /// Viewport y.
        client_y: f64,
    },
    /// `on_touch_move`.
    Move {
        /// Event time.
        time_stamp: f64,
        /// Viewport y.
        client_y: f64,
    },
    /// `on_touch_end`.
    End {
        /// Event time.
        time_stamp: f64,
    },
}

/// A page scroller that records every call.
#[derive(Debug, Default)]
pub struct RecordingPageScroller {
    calls: RefCell<Vec<ScrollCall>>,
}

impl RecordingPageScroller {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ScrollCall> {
        self.calls.borrow().clone()
    }
}

impl PageScroller for RecordingPageScroller {
    fn on_touch_start(&self, time_stamp: f64, client_y: f64) {
        self.calls
            .borrow_mut()
            .push(ScrollCall::Start { time_stamp, client_y });
    }

    fn on_touch_move(&self, time_stamp: f64, client_y: f64) {
        self.calls
            .borrow_mut()
            .push(ScrollCall::Move { time_stamp, client_y });
    }

    fn on_touch_end(&self, time_stamp: f64) {
        self.calls.borrow_mut().push(ScrollCall::End { time_stamp });
    }
}
