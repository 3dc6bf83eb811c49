//! Shared test helpers for player integration tests.
#![allow(dead_code)]

use serde_json::{Value, json};
use story_player::domain::config::ConfigBlock;
use story_player::{Player, PlayerDeclaration, RenderPass};
use story_player_core::entry::EntryDescriptor;
use story_player_test_support::{Harness, settle};

/// Locator of the `i`th test story.
pub fn locator(i: usize) -> String {
    format!("https://s.example/{i}.html")
}

/// Descriptors for stories `range`.
pub fn stories(range: std::ops::Range<usize>) -> Vec<EntryDescriptor> {
    range.map(|i| EntryDescriptor::new(locator(i))).collect()
}

/// A declaration with `count` inline stories and no configuration.
pub fn declaration(count: usize) -> PlayerDeclaration {
    PlayerDeclaration {
        entries: stories(0..count),
        ..PlayerDeclaration::default()
    }
}

/// A declaration with `count` stories and the given JSON configuration.
pub fn configured(count: usize, config: &Value) -> PlayerDeclaration {
    PlayerDeclaration {
        config: Some(ConfigBlock::json(config.to_string())),
        ..declaration(count)
    }
}

/// Builds a visible player without laying it out.
pub fn build(harness: &Harness, declaration: PlayerDeclaration) -> Player {
    let player = Player::build(declaration, harness.collaborators()).unwrap();
    player.on_visible();
    player
}

/// Lets the active story's document report its content loaded, then waits
/// for `pass` to settle.
pub async fn complete(harness: &Harness, player: &Player, pass: RenderPass) {
    settle().await;
    harness
        .transport
        .send(player.active_index(), "storyContentLoaded", json!({}));
    pass.await;
    settle().await;
}

/// Builds, lays out and fully loads a player.
pub async fn loaded(harness: &Harness, declaration: PlayerDeclaration) -> Player {
    let player = build(harness, declaration);
    let pass = player.layout();
    complete(harness, &player, pass).await;
    player
}

/// Indices of entries whose frame is in the visual tree.
pub fn attached(player: &Player) -> Vec<usize> {
    player
        .entries()
        .iter()
        .filter(|e| e.attached)
        .map(|e| e.index)
        .collect()
}

/// A touch payload with a single point.
pub fn touch(time_stamp: f64, x: f64, y: f64) -> Value {
    json!({
        "timeStamp": time_stamp,
        "touches": [{ "screenX": x, "screenY": y, "clientX": x, "clientY": y }]
    })
}

/// A document state update payload.
pub fn state_update(state: &str, value: Value) -> Value {
    json!({ "state": state, "value": value })
}
