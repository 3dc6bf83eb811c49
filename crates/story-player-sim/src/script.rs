//! Scripted sessions: a player wired to headless collaborators, driven by a
//! list of commands.

use std::rc::Rc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use story_player::application::player::StoryStateKind;
use story_player::application::render::RenderPass;
use story_player::domain::entry::EntryView;
use story_player::http_fetcher::HttpStoryFetcher;
use story_player::{Collaborators, Player, PlayerDeclaration, ShowOptions};
use story_player_core::entry::EntryDescriptor;
use tracing::{info, instrument, warn};

use crate::error::SimError;
use crate::headless::{CacheUrlResolver, HeadlessSurface, LoggingHost, LoopbackTransport};

fn animate() -> bool {
    true
}

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    /// Lay the player out.
    Layout,
    /// Report the player visible in the viewport.
    Visible,
    /// Resume playback.
    Play,
    /// Pause playback.
    Pause,
    /// Next story.
    Next,
    /// Previous story.
    Previous,
    /// Relative move.
    Go {
        /// Story delta.
        #[serde(default)]
        stories: i64,
        /// Page delta.
        #[serde(default)]
        pages: i64,
        /// Animate the switch.
        #[serde(default = "animate")]
        animate: bool,
    },
    /// Show a story by locator.
    Show {
        /// Story locator; the current story when absent.
        #[serde(default)]
        href: Option<String>,
        /// Page to move to.
        #[serde(default, rename = "pageId")]
        page_id: Option<String>,
        /// Animate the switch.
        #[serde(default = "animate")]
        animate: bool,
    },
    /// Append stories.
    Add {
        /// Stories to append.
        stories: Vec<EntryDescriptor>,
    },
    /// Mute the active story.
    Mute,
    /// Unmute the active story.
    Unmute,
    /// Rewind a story.
    Rewind {
        /// Story locator.
        href: String,
    },
    /// Ask the active story for its page-attachment state.
    PageAttachmentState,
    /// Activate the legacy exit control.
    ExitControl,
    /// A frame finished loading.
    FrameLoaded {
        /// Entry index.
        index: usize,
    },
    /// A frame failed loading.
    FrameError {
        /// Entry index.
        index: usize,
    },
    /// A navigation transition finished.
    TransitionEnd {
        /// Entry index.
        index: usize,
    },
    /// The viewport was resized.
    Resize,
    /// The host's animation-frame tick.
    AnimationFrame,
    /// A message sent by a story document.
    Message {
        /// Entry index of the sending document.
        index: usize,
        /// Message name.
        name: String,
        /// Message payload.
        #[serde(default)]
        payload: Value,
    },
    /// Let background work run for a while.
    Wait {
        /// Milliseconds.
        ms: u64,
    },
}

/// Parses a script file: a JSON array of commands.
///
/// # Errors
///
/// Returns `SimError::Json` if the text is not a valid script.
pub fn parse_script(text: &str) -> Result<Vec<Command>, SimError> {
    Ok(serde_json::from_str(text)?)
}

/// The script run when none is supplied.
#[must_use]
pub fn default_script() -> Vec<Command> {
    vec![Command::Visible, Command::Layout]
}

/// A player and the headless collaborators it runs against.
pub struct Session {
    player: Player,
    transport: LoopbackTransport,
    host: Rc<LoggingHost>,
    pass_timeout: Duration,
}

impl Session {
    /// Builds a player from its declaration.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Player` if the declaration is rejected or the HTTP
    /// client cannot be created.
    pub fn start(declaration: PlayerDeclaration, host_origin: &str) -> Result<Self, SimError> {
        let transport = LoopbackTransport::default();
        let host = Rc::new(LoggingHost::default());
        let collaborators = Collaborators {
            surface: Rc::new(HeadlessSurface::default()),
            transport: Rc::new(transport.clone()),
            host: host.clone(),
            resolver: Rc::new(CacheUrlResolver),
            fetcher: Rc::new(HttpStoryFetcher::new()?),
            page_scroller: None,
            host_origin: host_origin.to_owned(),
        };
        let player = Player::build(declaration, collaborators)?;
        Ok(Self {
            player,
            transport,
            host,
            pass_timeout: Duration::from_secs(2),
        })
    }

    /// Bounds how long each command waits for its render pass.
    #[must_use]
    pub fn with_pass_timeout(mut self, timeout: Duration) -> Self {
        self.pass_timeout = timeout;
        self
    }

    /// The player under simulation.
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Number of host events dispatched so far.
    #[must_use]
    pub fn events_dispatched(&self) -> usize {
        self.host.dispatched()
    }

    /// Runs every command in order. A command the player rejects is logged
    /// and the script continues.
    pub async fn run(&self, script: &[Command]) {
        for (step, command) in script.iter().enumerate() {
            if let Err(err) = self.execute(command).await {
                warn!(step, error = %err, "command rejected");
            }
        }
    }

    /// Runs one command and waits for the work it started.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Player` if the player rejects the command.
    #[instrument(skip(self))]
    pub async fn execute(&self, command: &Command) -> Result<(), SimError> {
        let player = &self.player;
        match command {
            Command::Layout => self.settle(player.layout()).await,
            Command::Visible => player.on_visible(),
            Command::Play => player.play(),
            Command::Pause => player.pause(),
            Command::Next => self.settle(player.next()).await,
            Command::Previous => self.settle(player.previous()).await,
            Command::Go {
                stories,
                pages,
                animate,
            } => self.settle(player.go(*stories, *pages, ShowOptions { animate: *animate })?).await,
            Command::Show {
                href,
                page_id,
                animate,
            } => {
                let options = ShowOptions { animate: *animate };
                self.settle(player.show(href.as_deref(), page_id.as_deref(), options)?).await;
            }
            Command::Add { stories } => self.settle(player.add(stories.clone())?).await,
            Command::Mute => player.mute(),
            Command::Unmute => player.unmute(),
            Command::Rewind { href } => player.rewind(href)?,
            Command::PageAttachmentState => {
                player.get_story_state(StoryStateKind::PageAttachment);
            }
            Command::ExitControl => player.activate_exit_control(),
            Command::FrameLoaded { index } => player.on_frame_loaded(*index),
            Command::FrameError { index } => player.on_frame_error(*index),
            Command::TransitionEnd { index } => player.on_transition_end(*index),
            Command::Resize => self.settle(player.on_resize()).await,
            Command::AnimationFrame => {
                let written = player.animation_frame();
                info!(written, "animation frame");
            }
            Command::Message {
                index,
                name,
                payload,
            } => {
                if !self.transport.deliver(*index, name, payload.clone()) {
                    warn!(index, name, "no connected document to deliver from");
                }
            }
            Command::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
        }
        tokio::task::yield_now().await;
        Ok(())
    }

    /// Snapshot of every entry.
    #[must_use]
    pub fn entries(&self) -> Vec<EntryView> {
        self.player.entries()
    }

    async fn settle(&self, pass: RenderPass) {
        if tokio::time::timeout(self.pass_timeout, pass.settled())
            .await
            .is_err()
        {
            warn!("render pass still waiting; continuing");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::task::LocalSet;

    fn declaration() -> PlayerDeclaration {
        PlayerDeclaration {
            entries: (0..3)
                .map(|i| EntryDescriptor::new(format!("https://s.example/{i}.html")))
                .collect(),
            ..PlayerDeclaration::default()
        }
    }

    #[test]
    fn test_parse_script_reads_tagged_commands() {
        // Arrange
        let text = r#"[
            {"command": "visible"},
            {"command": "go", "stories": 1},
            {
                "command": "show",
                "href": "https://s.example/0.html",
                "pageId": "cover",
                "animate": false
            },
            {"command": "message", "index": 0, "name": "storyContentLoaded"}
        ]"#;

        // Act
        let script = parse_script(text).unwrap();

        // Assert
        assert_eq!(script.len(), 4);
        assert_eq!(
            script[1],
            Command::Go {
                stories: 1,
                pages: 0,
                animate: true
            }
        );
        assert_eq!(
            script[2],
            Command::Show {
                href: Some("https://s.example/0.html".to_owned()),
                page_id: Some("cover".to_owned()),
                animate: false
            }
        );
        assert_eq!(
            script[3],
            Command::Message {
                index: 0,
                name: "storyContentLoaded".to_owned(),
                payload: Value::Null
            }
        );
    }

    #[test]
    fn test_parse_script_rejects_unknown_command() {
        let result = parse_script(r#"[{"command": "teleport"}]"#);

        assert!(matches!(result, Err(SimError::Json(_))));
    }

    #[tokio::test]
    async fn test_scripted_session_navigates_and_keeps_window() {
        LocalSet::new()
            .run_until(async {
                // Arrange
                let session = Session::start(declaration(), "https://publisher.example")
                    .unwrap()
                    .with_pass_timeout(Duration::from_millis(50));
                let script = vec![
                    Command::Visible,
                    Command::Layout,
                    Command::Message {
                        index: 0,
                        name: "storyContentLoaded".to_owned(),
                        payload: json!({}),
                    },
                    Command::Next,
                    Command::Next,
                ];

                // Act
                session.run(&script).await;

                // Assert
                assert_eq!(session.player().active_index(), 2);
                let attached: Vec<usize> = session
                    .entries()
                    .iter()
                    .filter(|e| e.attached)
                    .map(|e| e.index)
                    .collect();
                assert_eq!(attached, vec![1, 2]);
                assert!(session.events_dispatched() >= 3);
            })
            .await;
    }
}
