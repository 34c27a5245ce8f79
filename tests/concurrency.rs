//! Concurrency properties of the admit-and-increment path.

mod common;

use serde_json::json;

use axum_test::TestServer;
use shortbin::application::services::RequestMeta;
use shortbin::domain::repositories::{LinkRepository, ShareRepository};
use shortbin::error::AppError;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_monotonic_counter_no_lost_updates() {
    let ctx = common::create_test_state();
    let server = TestServer::new(common::test_router(ctx.state.clone())).unwrap();

    let created = server
        .post("/api/links")
        .json(&json!({ "url": "https://example.com", "custom_slug": "hot-key" }))
        .await;
    assert_eq!(created.status_code(), 201);

    const N: usize = 50;
    let mut handles = Vec::with_capacity(N);
    for _ in 0..N {
        let service = ctx.state.link_service.clone();
        handles.push(tokio::spawn(async move {
            service
                .resolve("hot-key", None, None, RequestMeta::default())
                .await
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, N);

    // final counter equals initial value + N exactly
    let link = ctx.links.find_by_key("hot-key").await.unwrap().unwrap();
    assert_eq!(link.click_count, N as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_boundary_exactness_at_view_limit() {
    let ctx = common::create_test_state();
    let server = TestServer::new(common::test_router(ctx.state.clone())).unwrap();

    let created = server
        .post("/api/shares")
        .json(&json!({ "title": "t", "content": "c", "custom_slug": "edge-key", "view_limit": 5 }))
        .await;
    assert_eq!(created.status_code(), 201);

    // burn 4 of the 5 admissions
    for _ in 0..4 {
        ctx.state
            .share_service
            .resolve("edge-key", None, None, RequestMeta::default())
            .await
            .unwrap();
    }

    // two concurrent attempts at view_count == 4: exactly one is admitted
    let a = {
        let service = ctx.state.share_service.clone();
        tokio::spawn(
            async move { service.resolve("edge-key", None, None, RequestMeta::default()).await },
        )
    };
    let b = {
        let service = ctx.state.share_service.clone();
        tokio::spawn(
            async move { service.resolve("edge-key", None, None, RequestMeta::default()).await },
        )
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let admitted = results.iter().filter(|r| r.is_ok()).count();
    let limited = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::LimitReached { .. })))
        .count();

    assert_eq!(admitted, 1);
    assert_eq!(limited, 1);

    let share = ctx.shares.find_by_key("edge-key").await.unwrap().unwrap();
    assert_eq!(share.view_count, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_view_limit_one_concurrent_pair() {
    let ctx = common::create_test_state();
    let server = TestServer::new(common::test_router(ctx.state.clone())).unwrap();

    let created = server
        .post("/api/shares")
        .json(&json!({ "title": "t", "content": "c", "custom_slug": "one-shot", "view_limit": 1 }))
        .await;
    assert_eq!(created.status_code(), 201);

    let a = {
        let service = ctx.state.share_service.clone();
        tokio::spawn(
            async move { service.resolve("one-shot", None, None, RequestMeta::default()).await },
        )
    };
    let b = {
        let service = ctx.state.share_service.clone();
        tokio::spawn(
            async move { service.resolve("one-shot", None, None, RequestMeta::default()).await },
        )
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let admitted = results.iter().filter(|r| r.is_ok()).count();
    let limited = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::LimitReached { .. })))
        .count();

    assert_eq!(admitted, 1);
    assert_eq!(limited, 1);

    let share = ctx.shares.find_by_key("one-shot").await.unwrap().unwrap();
    assert_eq!(share.view_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_custom_slug_claims_resolve_by_conflict() {
    let ctx = common::create_test_state();

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = ctx.state.link_service.clone();
        handles.push(tokio::spawn(async move {
            service
                .create(
                    &shortbin::domain::entities::Principal::Guest(format!("racer-{i}")),
                    shortbin::application::services::CreateLink {
                        original_url: format!("https://example.com/{i}"),
                        custom_slug: Some("contested".to_string()),
                        ..Default::default()
                    },
                )
                .await
        }));
    }

    let mut winners = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(AppError::Conflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    // exactly one claim wins; the losers get Conflict, never an overwrite
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 7);
}
