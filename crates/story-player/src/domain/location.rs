//! Story addressing: the source a frame is pointed at and how sources compare.

use serde::{Deserialize, Serialize};
use story_player_core::error::PlayerError;
use url::{Url, form_urlencoded};

use super::config::Attribution;

/// Placeholder in a fetch endpoint replaced by the current story count.
pub const OFFSET_PLACEHOLDER: &str = "${offset}";

/// Visibility state communicated to a story document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityState {
    /// Loading in the background before it is ever shown.
    Prerender,
    /// Shown and playing.
    Visible,
    /// Shown but paused.
    Paused,
    /// Loaded but not shown.
    Inactive,
}

impl VisibilityState {
    /// Returns the wire value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prerender => "prerender",
            Self::Visible => "visible",
            Self::Paused => "paused",
            Self::Inactive => "inactive",
        }
    }
}

/// Player parameters appended to every story's fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerParams {
    /// Origin of the host page.
    pub host_origin: String,
    /// Attribution mode.
    pub attribution: Attribution,
}

impl PlayerParams {
    fn fragment_pairs(&self, visibility: VisibilityState) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("visibilityState", visibility.as_str().to_owned()),
            ("origin", self.host_origin.clone()),
            ("showStoryUrlInfo", "0".to_owned()),
            ("storyPlayer", "v0".to_owned()),
            ("cap", "swipe".to_owned()),
        ];
        if self.attribution == Attribution::Auto {
            pairs.push(("attribution", "auto".to_owned()));
        }
        pairs
    }
}

fn parse_url(url: &str) -> Result<Url, PlayerError> {
    Url::parse(url)
        .map_err(|e| PlayerError::Validation(format!("invalid story address {url}: {e}")))
}

/// Builds the address a frame is pointed at: the URL with its fragment
/// replaced by the original fragment params merged with the player params.
/// Proxy-origin URLs additionally request the AMP runtime version.
///
/// # Errors
///
/// Returns `PlayerError::Validation` if `url` is not an absolute URL.
pub fn encoded_location(
    url: &str,
    params: &PlayerParams,
    visibility: VisibilityState,
    is_proxy_origin: bool,
) -> Result<String, PlayerError> {
    let mut location = parse_url(url)?;

    let mut fragment: Vec<(String, String)> =
        form_urlencoded::parse(location.fragment().unwrap_or_default().as_bytes())
            .into_owned()
            .collect();
    for (key, value) in params.fragment_pairs(visibility) {
        match fragment.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => fragment.push((key.to_owned(), value)),
        }
    }
    let fragment = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&fragment)
        .finish();

    if is_proxy_origin {
        location.query_pairs_mut().append_pair("amp_js_v", "0.1");
    }
    location.set_fragment(Some(&fragment));

    Ok(location.into())
}

/// Returns true if both addresses point at the same document once query and
/// fragment are ignored. An empty or unparsable current source never matches.
#[must_use]
pub fn sources_match(resolved: &str, current: &str) -> bool {
    match (document_address(resolved), document_address(current)) {
        (Some(resolved), Some(current)) => resolved == current,
        _ => false,
    }
}

fn document_address(url: &str) -> Option<Url> {
    let mut url = Url::parse(url).ok()?;
    url.set_query(None);
    url.set_fragment(None);
    Some(url)
}

/// Returns the serialized origin of an absolute URL. Default ports are
/// omitted; URLs with an opaque origin have none.
#[must_use]
pub fn origin_of(url: &str) -> Option<String> {
    let origin = Url::parse(url).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// Substitutes the offset placeholder in a fetch endpoint.
#[must_use]
pub fn substitute_offset(endpoint: &str, offset: usize) -> String {
    endpoint.replacen(OFFSET_PLACEHOLDER, &offset.to_string(), 1)
}
