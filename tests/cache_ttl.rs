//! Integration tests for result-cache behavior.
//!
//! Covered (strict):
//! - MISS → HIT for an identical key (compute runs once)
//! - expiration driven by a short TTL (absolute TTL, no sliding refresh)
//! - a failing compute is NOT cached: the next call re-invokes it
//! - different argument signatures never collide

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::sleep;

use fx_lens::{CacheKey, LensError, ResultCache};

fn key(tag: &str) -> CacheKey {
    CacheKey::of("test_fn").arg(tag).finish()
}

#[tokio::test]
async fn identical_key_hits_without_recomputing() {
    let cache = ResultCache::new();
    let computed = AtomicUsize::new(0);

    for _ in 0..3 {
        let value: Result<String, LensError> = cache
            .get_or_compute(key("miss_then_hit"), Some(Duration::from_secs(30)), || async {
                computed.fetch_add(1, Ordering::SeqCst);
                Ok("fresh".to_string())
            })
            .await;
        assert_eq!(value.unwrap(), "fresh");
    }

    assert_eq!(computed.load(Ordering::SeqCst), 1, "compute must run once");
}

#[tokio::test]
async fn entry_expires_after_ttl_and_recomputes() {
    async fn run(cache: &ResultCache, computed: &AtomicUsize, ttl: Duration) -> u32 {
        let v: Result<u32, LensError> = cache
            .get_or_compute(key("ttl_expiry"), Some(ttl), || async {
                computed.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await;
        v.unwrap()
    }

    let cache = ResultCache::new();
    let computed = AtomicUsize::new(0);
    let ttl = Duration::from_millis(50);

    // Warm-up: MISS then HIT.
    assert_eq!(run(&cache, &computed, ttl).await, 7);
    assert_eq!(run(&cache, &computed, ttl).await, 7);
    assert_eq!(computed.load(Ordering::SeqCst), 1);

    // Sleep well over TTL to avoid boundary flakes, then expect a recompute.
    sleep(ttl * 5).await;
    assert_eq!(run(&cache, &computed, ttl).await, 7);
    assert_eq!(
        computed.load(Ordering::SeqCst),
        2,
        "expired entry must recompute"
    );

    // And the refreshed entry serves the next call again.
    assert_eq!(run(&cache, &computed, ttl).await, 7);
    assert_eq!(computed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_compute_is_not_cached() {
    let cache = ResultCache::new();
    let attempts = AtomicUsize::new(0);

    let first: Result<String, LensError> = cache
        .get_or_compute(key("failing"), Some(Duration::from_secs(30)), || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(LensError::Transport("boom".to_string()))
        })
        .await;
    assert!(first.is_err());
    assert!(cache.is_empty(), "a failure must not populate the cache");

    let second: Result<String, LensError> = cache
        .get_or_compute(key("failing"), Some(Duration::from_secs(30)), || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Ok("recovered".to_string())
        })
        .await;
    assert_eq!(second.unwrap(), "recovered");
    assert_eq!(attempts.load(Ordering::SeqCst), 2, "second call must re-invoke");
}

#[tokio::test]
async fn different_argument_signatures_do_not_collide() {
    let cache = ResultCache::new();

    let a: Result<String, LensError> = cache
        .get_or_compute(
            CacheKey::of("fetch").arg("forex market news").arg("30").finish(),
            None,
            || async { Ok("global".to_string()) },
        )
        .await;
    let b: Result<String, LensError> = cache
        .get_or_compute(
            CacheKey::of("fetch").arg("EUR/USD forex news").arg("20").finish(),
            None,
            || async { Ok("pair".to_string()) },
        )
        .await;

    assert_eq!(a.unwrap(), "global");
    assert_eq!(b.unwrap(), "pair");
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn entries_without_ttl_never_expire() {
    let cache = ResultCache::new();
    let computed = AtomicUsize::new(0);

    for _ in 0..2 {
        let v: Result<u32, LensError> = cache
            .get_or_compute(key("no_ttl"), None, || async {
                computed.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            })
            .await;
        v.unwrap();
        sleep(Duration::from_millis(30)).await;
    }

    assert_eq!(computed.load(Ordering::SeqCst), 1);
}
