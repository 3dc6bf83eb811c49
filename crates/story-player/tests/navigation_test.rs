//! Integration tests for navigation, show/go and fetching more stories.

mod common;

use serde_json::json;
use story_player::ShowOptions;
use story_player_core::error::PlayerError;
use story_player_core::host::PlayerEvent;
use story_player_test_support::{Harness, SentMessage, run_local, settle};

fn circular() -> serde_json::Value {
    json!({ "behavior": { "on": "end", "action": "circular-wrapping" } })
}

fn fetching() -> serde_json::Value {
    json!({
        "behavior": {
            "on": "end",
            "action": "fetch",
            "endpoint": "https://feed.example/stories?offset=${offset}"
        }
    })
}

fn select_page_to(harness: &Harness, index: usize) -> Vec<SentMessage> {
    harness
        .transport
        .sent_to(index)
        .into_iter()
        .filter(|m| m.name == "selectPage")
        .collect()
}

#[tokio::test]
async fn test_go_nowhere_is_a_no_op() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(3)).await;
        harness.host.clear();

        // Act
        let pass = player.go(0, 0, ShowOptions::default()).unwrap();

        // Assert
        assert!(pass.is_empty());
        assert_eq!(player.active_index(), 0);
        assert!(harness.host.events().is_empty());
    })
    .await;
}

#[tokio::test]
async fn test_go_out_of_range_without_wrap_is_rejected() {
    run_local(async {
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(3)).await;

        let result = player.go(5, 0, ShowOptions::default());

        assert!(matches!(
            result,
            Err(PlayerError::OutOfRange { target: 5, len: 3 })
        ));
        assert_eq!(player.active_index(), 0);
    })
    .await;
}

#[tokio::test]
async fn test_go_with_extreme_delta_is_rejected_without_wrap() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(3)).await;
        let pass = player.next();
        common::complete(&harness, &player, pass).await;

        // Act
        let result = player.go(i64::MAX, 0, ShowOptions::default());

        // Assert
        assert!(matches!(
            result,
            Err(PlayerError::OutOfRange { target: i64::MAX, len: 3 })
        ));
        assert_eq!(player.active_index(), 1);
    })
    .await;
}

#[tokio::test]
async fn test_go_with_extreme_delta_wraps_when_circular() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::loaded(&harness, common::configured(3, &circular())).await;

        // Act
        let pass = player.go(i64::MIN, 0, ShowOptions::default()).unwrap();
        common::complete(&harness, &player, pass).await;

        // Assert
        assert_eq!(player.active_index(), 1);
    })
    .await;
}

#[tokio::test]
async fn test_next_at_the_end_without_wrap_does_nothing() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(2)).await;
        let pass = player.next();
        common::complete(&harness, &player, pass).await;

        // Act
        let pass = player.next();

        // Assert
        assert!(pass.is_empty());
        assert_eq!(player.active_index(), 1);
        assert_eq!(harness.host.count("navigation"), 1);
    })
    .await;
}

#[tokio::test]
async fn test_previous_at_the_start_wraps_when_circular() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::loaded(&harness, common::configured(3, &circular())).await;

        // Act
        let pass = player.previous();
        common::complete(&harness, &player, pass).await;

        // Assert
        assert_eq!(player.active_index(), 2);
        assert_eq!(common::attached(&player), vec![1, 2]);
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
async fn test_go_wraps_modulo_length_when_circular() {
    run_local(async {
        let harness = Harness::new();
        let player = common::loaded(&harness, common::configured(3, &circular())).await;

        let pass = player.go(4, 0, ShowOptions::default()).unwrap();
        common::complete(&harness, &player, pass).await;

        assert_eq!(player.active_index(), 1);
    })
    .await;
}

#[tokio::test]
async fn test_go_forwards_page_delta_to_the_new_active_story() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(3)).await;

        // Act
        let pass = player.go(1, 2, ShowOptions::default()).unwrap();
        common::complete(&harness, &player, pass).await;

        // Assert
        assert_eq!(player.active_index(), 1);
        let selections = select_page_to(&harness, 1);
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].payload, json!({ "delta": 2 }));
        assert!(selections[0].acknowledged);
    })
    .await;
}

#[tokio::test]
async fn test_go_with_only_a_page_delta_stays_on_the_story() {
    run_local(async {
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(2)).await;
        harness.host.clear();

        let pass = player.go(0, -1, ShowOptions::default()).unwrap();
        pass.await;
        settle().await;

        assert_eq!(player.active_index(), 0);
        assert_eq!(harness.host.count("navigation"), 0);
        assert_eq!(select_page_to(&harness, 0)[0].payload, json!({ "delta": -1 }));
    })
    .await;
}

#[tokio::test]
async fn test_show_switches_story_and_selects_page() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(3)).await;

        // Act
        let pass = player
            .show(Some(&common::locator(2)), Some("page-3"), ShowOptions::default())
            .unwrap();
        common::complete(&harness, &player, pass).await;

        // Assert
        assert_eq!(player.active_index(), 2);
        assert_eq!(common::attached(&player), vec![1, 2]);
        let selections = select_page_to(&harness, 2);
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].payload, json!({ "id": "page-3" }));
    })
    .await;
}

#[tokio::test]
async fn test_show_unknown_story_is_not_found() {
    run_local(async {
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(2)).await;

        let result = player.show(
            Some("https://elsewhere.example/x.html"),
            None,
            ShowOptions::default(),
        );

        assert!(matches!(result, Err(PlayerError::NotFound(_))));
        assert_eq!(player.active_index(), 0);
    })
    .await;
}

#[tokio::test]
async fn test_show_current_story_without_stories_is_not_found() {
    run_local(async {
        let harness = Harness::new();
        let player = common::build(&harness, common::declaration(0));

        let result = player.show(None, Some("cover"), ShowOptions::default());

        assert!(matches!(result, Err(PlayerError::NotFound(_))));
    })
    .await;
}

#[tokio::test]
async fn test_instant_show_suppresses_transition_until_it_ends() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::loaded(&harness, common::declaration(3)).await;

        // Act
        let pass = player
            .show(Some(&common::locator(1)), None, ShowOptions::instant())
            .unwrap();
        common::complete(&harness, &player, pass).await;
        player.on_transition_end(0);
        let after_unrelated = harness.surface.navigation_transitions();
        player.on_transition_end(1);

        // Assert
        assert_eq!(after_unrelated, vec![false]);
        assert_eq!(harness.surface.navigation_transitions(), vec![false, true]);
    })
    .await;
}

#[tokio::test]
async fn test_build_prefetches_when_few_stories_remain() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        harness.fetcher.respond(Ok(common::stories(3..5)));

        // Act
        let player = common::loaded(&harness, common::configured(3, &fetching())).await;
        settle().await;

        // Assert
        assert_eq!(
            harness.fetcher.requested_urls(),
            vec!["https://feed.example/stories?offset=3".to_owned()]
        );
        assert_eq!(player.entries().len(), 5);
        assert_eq!(player.entries()[4].locator, common::locator(4));
        assert!(player.is_fetch_enabled());
    })
    .await;
}

#[tokio::test]
async fn test_navigation_near_the_end_fetches_with_current_count() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        harness.fetcher.respond(Ok(common::stories(3..5)));
        let player = common::loaded(&harness, common::configured(3, &fetching())).await;
        settle().await;

        // Act
        let pass = player.next();
        common::complete(&harness, &player, pass).await;
        let pass = player.next();
        common::complete(&harness, &player, pass).await;

        // Assert
        assert_eq!(
            harness.fetcher.requested_urls(),
            vec![
                "https://feed.example/stories?offset=3".to_owned(),
                "https://feed.example/stories?offset=5".to_owned(),
            ]
        );
        assert_eq!(player.entries().len(), 5);
    })
    .await;
}

#[tokio::test]
async fn test_failed_fetch_is_not_surfaced() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        harness
            .fetcher
            .respond(Err(PlayerError::Fetch("503 from feed".to_owned())));

        // Act
        let player = common::loaded(&harness, common::configured(2, &fetching())).await;
        settle().await;
        let pass = player.next();
        common::complete(&harness, &player, pass).await;

        // Assert
        assert_eq!(player.entries().len(), 2);
        assert_eq!(player.active_index(), 1);
        assert_eq!(harness.fetcher.requested_urls().len(), 2);
    })
    .await;
}

#[tokio::test]
async fn test_only_one_fetch_is_in_flight() {
    run_local(async {
        // Arrange
        let harness = Harness::new();
        let player = common::build(&harness, common::configured(3, &fetching()));

        // Act
        drop(player.layout());
        drop(player.next());
        settle().await;

        // Assert
        assert_eq!(harness.fetcher.requested_urls().len(), 1);
    })
    .await;
}

#[tokio::test]
async fn test_fetch_is_disabled_without_endpoint() {
    run_local(async {
        let harness = Harness::new();
        let config = json!({ "behavior": { "on": "end", "action": "fetch" } });

        let player = common::loaded(&harness, common::configured(1, &config)).await;

        assert!(!player.is_fetch_enabled());
        assert!(harness.fetcher.requested_urls().is_empty());
    })
    .await;
}
