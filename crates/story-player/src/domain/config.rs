//! Declarative player input and its resolved configuration.

use serde::{Deserialize, Serialize};
use story_player_core::entry::EntryDescriptor;
use story_player_core::error::PlayerError;
use story_player_core::host::ExitControl;
use tracing::warn;

/// Serving hosts the player knows how to rewrite locators for.
pub const SUPPORTED_SERVING_HOSTS: [&str; 2] = ["cdn.ampproject.org", "www.bing-amp.com"];

/// The only content type accepted for the configuration block.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Custom-control names that skip to the next story.
const SKIP_NEXT_CONTROLS: [&str; 2] = ["skip-next", "skip-to-next"];

/// The configuration block embedded in the player declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigBlock {
    /// Declared content type; must be `application/json`.
    pub content_type: String,
    /// Raw JSON text.
    pub text: String,
}

impl ConfigBlock {
    /// Creates a JSON configuration block.
    #[must_use]
    pub fn json(text: impl Into<String>) -> Self {
        Self {
            content_type: JSON_CONTENT_TYPE.to_owned(),
            text: text.into(),
        }
    }
}

/// Everything the host declares up front. Read once at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerDeclaration {
    /// Allow-listed serving host used to rewrite locators.
    pub serving_host: Option<String>,
    /// Legacy exit-control attribute (`back-button` or `close-button`).
    pub exit_control: Option<String>,
    /// Stories declared inline.
    pub entries: Vec<EntryDescriptor>,
    /// JSON configuration block.
    pub config: Option<ConfigBlock>,
}

/// Raw `behavior` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorConfig {
    /// Trigger, e.g. `end`.
    pub on: Option<String>,
    /// Action, e.g. `fetch` or `circular-wrapping`.
    pub action: Option<String>,
    /// Fetch endpoint with an optional `${offset}` placeholder.
    pub endpoint: Option<String>,
    /// Whether the active story plays on load.
    pub autoplay: Option<bool>,
    /// Whether vertical swipes scroll the host page.
    pub page_scroll: Option<bool>,
}

/// Raw `display` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DisplayConfig {
    /// `auto` enables attribution.
    pub attribution: Option<String>,
}

/// One custom control descriptor forwarded to story documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerControl {
    /// Control name, e.g. `close` or `skip-next`.
    pub name: String,
    /// Control state, e.g. `disabled`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Event dispatched when the control is activated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Visibility hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    /// Position hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// Icon URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_url: Option<String>,
}

/// Raw configuration block schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlayerConfig {
    /// Behavior section.
    pub behavior: Option<BehaviorConfig>,
    /// Display section.
    pub display: Option<DisplayConfig>,
    /// Custom controls.
    pub controls: Option<Vec<ViewerControl>>,
}

/// What happens when the viewer reaches the end of the sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EndBehavior {
    /// Navigation stops at the edges.
    #[default]
    None,
    /// More stories are fetched from `endpoint`.
    Fetch {
        /// Endpoint template.
        endpoint: String,
    },
    /// Navigation wraps modulo the sequence length.
    CircularWrap,
}

/// Attribution display mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Attribution {
    /// No attribution.
    #[default]
    Off,
    /// Attribution chosen automatically by the story.
    Auto,
}

/// Validated configuration, resolved once at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// End-of-sequence behavior.
    pub end_behavior: EndBehavior,
    /// Explicit autoplay override.
    pub autoplay: Option<bool>,
    /// Whether the page scroller is enabled.
    pub page_scroll: bool,
    /// Attribution mode.
    pub attribution: Attribution,
    /// Custom controls; `None` when the block declared none.
    pub controls: Option<Vec<ViewerControl>>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            end_behavior: EndBehavior::None,
            autoplay: None,
            page_scroll: true,
            attribution: Attribution::Off,
            controls: None,
        }
    }
}

impl ResolvedConfig {
    /// Parses and resolves an optional configuration block.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Validation` if the block's content type is not
    /// JSON or its text does not match the schema.
    pub fn parse(block: Option<&ConfigBlock>) -> Result<Self, PlayerError> {
        let Some(block) = block else {
            return Ok(Self::default());
        };

        if block.content_type != JSON_CONTENT_TYPE {
            return Err(PlayerError::Validation(format!(
                "configuration block must have type \"{JSON_CONTENT_TYPE}\", got \"{}\"",
                block.content_type
            )));
        }

        let raw: PlayerConfig = serde_json::from_str(&block.text)
            .map_err(|e| PlayerError::Validation(format!("malformed configuration: {e}")))?;

        Ok(Self::resolve(raw))
    }

    /// Resolves a raw configuration.
    #[must_use]
    pub fn resolve(raw: PlayerConfig) -> Self {
        let behavior = raw.behavior.unwrap_or_default();

        let end_behavior = match (
            behavior.on.as_deref(),
            behavior.action.as_deref(),
            behavior.endpoint.as_deref(),
        ) {
            (Some("end"), Some("circular-wrapping"), _) => EndBehavior::CircularWrap,
            (Some("end"), Some("fetch"), Some(endpoint)) if !endpoint.is_empty() => {
                EndBehavior::Fetch {
                    endpoint: endpoint.to_owned(),
                }
            }
            _ => EndBehavior::None,
        };

        let attribution = match raw.display.and_then(|d| d.attribution).as_deref() {
            Some("auto") => Attribution::Auto,
            _ => Attribution::Off,
        };

        Self {
            end_behavior,
            autoplay: behavior.autoplay,
            page_scroll: behavior.page_scroll != Some(false),
            attribution,
            controls: raw.controls,
        }
    }

    /// Whether navigation wraps around the ends of the sequence.
    #[must_use]
    pub fn wraps(&self) -> bool {
        self.end_behavior == EndBehavior::CircularWrap
    }

    /// The fetch endpoint, when fetching more stories is configured.
    #[must_use]
    pub fn fetch_endpoint(&self) -> Option<&str> {
        match &self.end_behavior {
            EndBehavior::Fetch { endpoint } => Some(endpoint),
            _ => None,
        }
    }

    /// Controls as pushed to the story at `index`: the skip-next control is
    /// disabled for the last story.
    #[must_use]
    pub fn controls_for(&self, index: usize, len: usize) -> Option<Vec<ViewerControl>> {
        let mut controls = self.controls.clone()?;
        if index + 1 == len {
            if let Some(skip) = controls
                .iter_mut()
                .find(|c| SKIP_NEXT_CONTROLS.contains(&c.name.as_str()))
            {
                skip.state = Some("disabled".to_owned());
            }
        }
        Some(controls)
    }
}

/// Returns the serving host to rewrite locators with, or `None` if it is
/// absent or unsupported. Unsupported hosts are logged, not rejected.
#[must_use]
pub fn resolve_serving_host(declared: Option<&str>) -> Option<String> {
    let host = declared?;
    if SUPPORTED_SERVING_HOSTS.contains(&host) {
        return Some(host.to_owned());
    }
    warn!(
        host,
        supported = ?SUPPORTED_SERVING_HOSTS,
        "unsupported serving host specified, using raw locators"
    );
    None
}

/// Parses the legacy exit-control attribute. Unknown values disable it.
#[must_use]
pub fn parse_exit_control(attribute: Option<&str>) -> Option<ExitControl> {
    match attribute? {
        "back-button" => Some(ExitControl::Back),
        "close-button" => Some(ExitControl::Close),
        _ => None,
    }
}
