//! Tests for the ordered map client

use super::*;
use crate::backends::MemoryBackend;
use crate::error::ValidationError;
use crate::types::MAX_RANGE_COUNT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PlayerScore {
    player: String,
    points: u32,
}

fn score(player: &str, points: u32) -> PlayerScore {
    PlayerScore {
        player: player.to_string(),
        points,
    }
}

fn client<V: StoreValue>(name: &str) -> OrderedMapClient<V> {
    OrderedMapClient::new(
        Arc::new(MemoryBackend::default()),
        StoreName::new(name.to_string()).unwrap(),
        RetryPolicy::default(),
    )
}

fn key(value: &str) -> StoreKey {
    StoreKey::new(value.to_string()).unwrap()
}

fn ttl(seconds: u64) -> Ttl {
    Ttl::from_secs(seconds).unwrap()
}

#[tokio::test]
async fn test_set_then_get_roundtrip() {
    let map = client::<PlayerScore>("scores");

    map.set(&key("alice"), &score("alice", 120), ttl(60))
        .await
        .unwrap();

    let loaded = map.get(&key("alice")).await.unwrap();
    assert_eq!(loaded, Some(score("alice", 120)));
}

#[tokio::test]
async fn test_get_missing_key_returns_none() {
    let map = client::<PlayerScore>("scores");

    let loaded = map.get(&key("nobody")).await.unwrap();
    assert_eq!(loaded, None);
}

#[tokio::test]
async fn test_set_reports_newly_created() {
    let map = client::<u64>("counters");

    assert!(map.set(&key("visits"), &1, ttl(60)).await.unwrap());
    assert!(!map.set(&key("visits"), &2, ttl(60)).await.unwrap());
}

#[tokio::test]
async fn test_remove_clears_entry_and_is_idempotent() {
    let map = client::<String>("notes");

    map.set(&key("draft"), &"hello".to_string(), ttl(60))
        .await
        .unwrap();

    map.remove(&key("draft")).await.unwrap();
    assert_eq!(map.get(&key("draft")).await.unwrap(), None);

    map.remove(&key("draft")).await.unwrap();
}

#[tokio::test]
async fn test_get_range_returns_typed_entries_in_order() {
    let map = client::<u32>("ladder");

    for (name, rank) in [("alpha", 1u32), ("bravo", 2), ("charlie", 3), ("delta", 4)] {
        map.set(&key(name), &rank, ttl(60)).await.unwrap();
    }

    let entries = map
        .get_range(
            RangeQuery::new()
                .with_lower_bound(key("alpha"))
                .with_upper_bound(key("delta")),
        )
        .await
        .unwrap();

    let pairs: Vec<(&str, u32)> = entries.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    assert_eq!(pairs, vec![("bravo", 2), ("charlie", 3)]);
}

#[tokio::test]
async fn test_get_range_rejects_invalid_count() {
    let map = client::<u32>("ladder");

    let zero = map.get_range(RangeQuery::new().with_count(0)).await;
    assert!(matches!(
        zero,
        Err(StoreError::Validation(ValidationError::OutOfRange { .. }))
    ));

    let too_many = map
        .get_range(RangeQuery::new().with_count(MAX_RANGE_COUNT + 1))
        .await;
    assert!(too_many.is_err());
}

#[tokio::test]
async fn test_update_seeds_and_increments() {
    let map = client::<u64>("counters");

    let seeded = map
        .update(&key("hits"), ttl(60), |current| current.unwrap_or(0) + 1)
        .await
        .unwrap();
    assert_eq!(seeded, 1);

    let incremented = map
        .update(&key("hits"), ttl(60), |current| current.unwrap_or(0) + 1)
        .await
        .unwrap();
    assert_eq!(incremented, 2);

    assert_eq!(map.get(&key("hits")).await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_update_transforms_structured_values() {
    let map = client::<PlayerScore>("scores");

    map.set(&key("alice"), &score("alice", 100), ttl(60))
        .await
        .unwrap();

    let updated = map
        .update(&key("alice"), ttl(60), |current| {
            let mut value = current.unwrap_or_else(|| score("alice", 0));
            value.points += 25;
            value
        })
        .await
        .unwrap();

    assert_eq!(updated, score("alice", 125));
}

#[tokio::test(start_paused = true)]
async fn test_entries_expire_after_ttl() {
    let map = client::<String>("sessions");

    map.set(&key("token"), &"abc".to_string(), ttl(1))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(2)).await;

    assert_eq!(map.get(&key("token")).await.unwrap(), None);
}
