//! Story Player — an embedding player for a sequence of story documents.
//!
//! Each story renders inside its own sandboxed frame. Only the active story
//! and its immediate neighbors are materialized; the player speaks a small
//! request/response protocol with each attached document and exposes unified
//! navigation, playback, muting and state queries to the host.

pub mod application;
pub mod domain;
pub mod http_fetcher;

pub use application::player::{Player, ShowOptions, StoryStateKind};
pub use application::render::RenderPass;
pub use domain::config::PlayerDeclaration;
pub use story_player_core::collaborators::Collaborators;
