use std::time::{Duration, Instant};
use xboost::rate_limit::{RateLimitConfig, SlidingWindowLimiter};

fn limiter(max_requests: u32, window_secs: u64) -> SlidingWindowLimiter {
    SlidingWindowLimiter::new(RateLimitConfig {
        max_requests,
        window_secs,
        cleanup_interval_secs: 60,
    })
}

#[tokio::test]
async fn allows_up_to_limit_then_rejects() {
    let limiter = limiter(3, 60);
    let start = Instant::now();

    for expected_remaining in [2, 1, 0] {
        let decision = limiter.check_at("key", start).await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, expected_remaining);
        assert_eq!(decision.limit, 3);
    }

    let rejected = limiter
        .check_at("key", start + Duration::from_secs(10))
        .await;
    assert!(!rejected.allowed);
    assert_eq!(rejected.remaining, 0);
    assert_eq!(rejected.retry_after, Duration::from_secs(50));
}

#[tokio::test]
async fn keys_are_limited_independently() {
    let limiter = limiter(1, 60);
    let now = Instant::now();

    assert!(limiter.check_at("alpha", now).await.allowed);
    assert!(!limiter.check_at("alpha", now).await.allowed);
    assert!(limiter.check_at("beta", now).await.allowed);
}

#[tokio::test]
async fn window_slides_instead_of_resetting() {
    let limiter = limiter(2, 60);
    let start = Instant::now();

    assert!(limiter.check_at("key", start).await.allowed);
    assert!(limiter
        .check_at("key", start + Duration::from_secs(30))
        .await
        .allowed);
    assert!(!limiter
        .check_at("key", start + Duration::from_secs(45))
        .await
        .allowed);

    // The first request has aged out; the one at 30s still counts.
    let at_sixty = start + Duration::from_secs(60);
    let decision = limiter.check_at("key", at_sixty).await;
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 0);
    assert!(!limiter
        .check_at("key", start + Duration::from_secs(70))
        .await
        .allowed);
    assert!(limiter
        .check_at("key", start + Duration::from_secs(90))
        .await
        .allowed);
}

#[tokio::test]
async fn rejected_requests_do_not_extend_the_window() {
    let limiter = limiter(1, 10);
    let start = Instant::now();

    assert!(limiter.check_at("key", start).await.allowed);
    for second in 1..10 {
        let decision = limiter
            .check_at("key", start + Duration::from_secs(second))
            .await;
        assert!(!decision.allowed);
    }
    assert!(limiter
        .check_at("key", start + Duration::from_secs(10))
        .await
        .allowed);
}

#[tokio::test]
async fn cleanup_drops_idle_keys_only() {
    let limiter = limiter(5, 60);
    let start = Instant::now();

    limiter.check_at("idle", start).await;
    limiter
        .check_at("active", start + Duration::from_secs(50))
        .await;
    assert_eq!(limiter.tracked_keys().await, 2);

    let removed = limiter
        .cleanup_at(start + Duration::from_secs(61))
        .await;
    assert_eq!(removed, 1);
    assert_eq!(limiter.tracked_keys().await, 1);
}

#[tokio::test]
async fn zero_limit_rejects_everything() {
    let limiter = limiter(0, 60);
    let decision = limiter.check_at("key", Instant::now()).await;
    assert!(!decision.allowed);
    assert_eq!(decision.retry_after, Duration::from_secs(60));
}
