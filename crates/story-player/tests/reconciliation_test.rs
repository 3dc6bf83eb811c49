//! Integration tests for the reconciliation pass and frame lifecycle.

mod common;

use story_player_core::entry::EntryDescriptor;
use story_player_core::error::PlayerError;
use story_player_core::host::PlayerEvent;
use story_player_core::surface::StoryPosition;
use story_player_test_support::{Harness, RecordingSurface, run_local, settle};

#[tokio::test]
async fn test_layout_attaches_only_the_active_story_and_its_neighbor() {
    run_local(async {
        // Arrange
        let harness = Harness::new();

        // Act
        let player = common::loaded(&harness, common::declaration(4)).await;

        // Assert
        assert_eq!(common::attached(&player), vec![0, 1]);
        let distances: Vec<usize> = player.entries().iter().map(|e| e.distance).collect();
        assert_eq!(distances, vec![0, 1, 2, 3]);
        assert_eq!(harness.surface.frame(2).src(), "");
        assert_eq!(harness.surface.frame(3).attach_count(), 0);
    })
    .await;
}

#[tokio::test]
async fn test_active_source_carries_player_params() {
    run_local(async {
        let harness = Harness::new();

        common::loaded(&harness, common::declaration(2)).await;

        assert_eq!(
            harness.surface.frame(0).src(),
            "https://s.example/0.html#visibilityState=prerender\
             &origin=https%3A%2F%2Fpublisher.example&showStoryUrlInfo=0\
             &storyPlayer=v0&cap=swipe"
        );
    })
    .await;
}

#[tokio::test]
async fn test_title_is_applied_with_the_source() {
    run_local(async {
        let harness = Harness::new();
        let mut declaration = common::declaration(1);
        declaration.entries[0].title = Some("  Morning brief ".to_owned());

        common::loaded(&harness, declaration).await;

        assert_eq!(
            harness.surface.frame(0).title().as_deref(),
            Some("Morning brief")
        );
    })
    .await;
}

#[tokio::test]
async fn test_stepping_twice_through_three_stories_slides_the_window() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(3)).await;

        // Act
        let pass = player.next();
        common::complete(&harness, &player, pass).await;
        let pass = player.next();
        common::complete(&harness, &player, pass).await;

        // Assert
        assert_eq!(player.active_index(), 2);
        assert_eq!(common::attached(&player), vec![1, 2]);
        let first = harness.surface.frame(0);
        assert!(!first.is_attached());
        assert_eq!(first.detach_count(), 1);
        assert_eq!(first.src(), "");
        assert_eq!(
            harness.host.events().last(),
            Some(&PlayerEvent::Navigation {
                index: 2,
                remaining: 0
            })
        );
    })
    .await;
}

#[tokio::test]
async fn test_positions_and_focus_are_applied_on_animation_frame() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(3)).await;
        let pass = player.next();
        common::complete(&harness, &player, pass).await;

        // Act
        let written = player.animation_frame();

        // Assert
        assert_eq!(written, 3);
        assert_eq!(harness.surface.frame(0).position(), Some(StoryPosition::Previous));
        assert_eq!(harness.surface.frame(1).position(), Some(StoryPosition::Current));
        assert_eq!(harness.surface.frame(2).position(), Some(StoryPosition::Next));
        assert!(harness.surface.frame(1).focus_count() >= 1);
        assert_eq!(player.animation_frame(), 0);
    })
    .await;
}

#[tokio::test]
async fn test_appended_stories_keep_indices_and_distances() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(3)).await;
        let pass = player.next();
        common::complete(&harness, &player, pass).await;

        // Act
        let pass = player.add(common::stories(3..5)).unwrap();
        common::complete(&harness, &player, pass).await;

        // Assert
        let entries = player.entries();
        assert_eq!(entries.len(), 5);
        for (position, entry) in entries.iter().enumerate() {
            assert_eq!(entry.index, position);
            assert_eq!(entry.locator, common::locator(position));
            assert_eq!(entry.distance, position.abs_diff(1));
        }
        assert_eq!(common::attached(&player), vec![0, 1, 2]);
    })
    .await;
}

#[tokio::test]
async fn test_malformed_batch_appends_nothing() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(2)).await;
        let frames_before = harness.surface.frame_count();
        let batch = vec![
            EntryDescriptor::new(common::locator(2)),
            EntryDescriptor::new("  "),
        ];

        // Act
        let result = player.add(batch);

        // Assert
        assert!(matches!(result, Err(PlayerError::Validation(_))));
        assert_eq!(player.entries().len(), 2);
        assert_eq!(harness.surface.frame_count(), frames_before);
    })
    .await;
}

#[tokio::test]
async fn test_neighbor_waits_for_active_content_loaded() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::build(&harness, common::declaration(2));

        // Act
        let pass = player.layout();
        settle().await;

        // Assert
        assert!(!harness.surface.frame(0).src().is_empty());
        assert_eq!(harness.surface.frame(1).src(), "");

        harness.transport.send(0, "storyContentLoaded", serde_json::json!({}));
        pass.await;
        assert!(!harness.surface.frame(1).src().is_empty());
        assert!(player.entries()[0].content_loaded);
    })
    .await;
}

#[tokio::test]
async fn test_superseded_load_wait_is_swallowed() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::build(&harness, common::declaration(3));
        let first = player.layout();
        settle().await;

        // Act
        let second = player.next();
        first.await;
        settle().await;

        // Assert
        assert!(!harness.surface.frame(1).src().is_empty());
        assert_eq!(harness.surface.frame(2).src(), "");
        common::complete(&harness, &player, second).await;
        assert!(!harness.surface.frame(2).src().is_empty());
        assert_eq!(harness.host.count("ready"), 1);
        assert_eq!(harness.host.count("navigation"), 1);
    })
    .await;
}

#[tokio::test]
async fn test_unchanged_source_is_not_reassigned() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(2)).await;

        // Act
        let pass = player.on_resize();
        common::complete(&harness, &player, pass).await;

        // Assert
        assert_eq!(harness.surface.frame(0).src_history().len(), 1);
        assert_eq!(harness.surface.frame(1).src_history().len(), 1);
    })
    .await;
}

#[tokio::test]
async fn test_story_without_capability_support_gets_no_frame() {
    run_local(async {
        // Arrange
        let surface = RecordingSurface::new().unsupported_for(&common::locator(1));
        let harness = Harness::with_surface(surface);

        // Act
        let player = common::loaded(&harness, common::declaration(3)).await;

        // Assert
        assert!(!player.entries()[1].has_frame);
        assert_eq!(common::attached(&player), vec![0]);
        assert!(harness.surface.frame(1).src_history().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_serving_host_rewrites_the_source() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let mut declaration = common::declaration(1);
        declaration.serving_host = Some("cdn.ampproject.org".to_owned());

        // Act
        common::loaded(&harness, declaration).await;

        // Assert
        let src = harness.surface.frame(0).src();
        assert!(src.starts_with(
            "https://s-example.cdn.ampproject.org/v/s/s.example/0.html?amp_js_v=0.1#"
        ));
        let handshake = &harness.transport.handshakes()[0];
        assert_eq!(handshake.origin, "https://s-example.cdn.ampproject.org");
    })
    .await;
}

#[tokio::test]
async fn test_unsupported_serving_host_uses_raw_locator() {
    run_local(async {
        let harness = Harness::new();
        let mut declaration = common::declaration(1);
        declaration.serving_host = Some("cache.example".to_owned());

        common::loaded(&harness, declaration).await;

        assert!(harness.resolver.calls().is_empty());
        assert!(harness.surface.frame(0).src().starts_with("https://s.example/0.html#"));
    })
    .await;
}
