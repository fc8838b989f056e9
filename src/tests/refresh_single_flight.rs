// Coordination of concurrent callers around one refresh attempt.

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;

use crate::cache::manager::TokenManager;
use crate::error::TokenError;
use crate::tests::common::{identity, init_tracing, refusal, token_response, FakeExchange};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn a_stale_burst_issues_exactly_one_exchange() {
    init_tracing();
    let fake = FakeExchange::with_delay(
        Ok(token_response("bearer-1", 3600)),
        Duration::from_millis(50),
    );
    let manager = Arc::new(TokenManager::new(identity("burst"), fake.clone(), 0.85).unwrap());

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                let mut tokens = Vec::new();
                for _ in 0..8 {
                    tokens.push(manager.get_token().await.unwrap());
                }
                tokens
            })
        })
        .collect();

    for task in tasks {
        for token in task.await.unwrap() {
            assert_eq!(token, "bearer-1");
        }
    }

    // 128 calls, one exchange: the token stays fresh for 3060 seconds.
    assert_eq!(fake.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn every_waiter_of_a_failed_attempt_observes_that_failure() {
    let fake = FakeExchange::with_delay(
        Err(refusal(StatusCode::BAD_GATEWAY, r#"{"errorCode":"BXNIM0109E"}"#)),
        Duration::from_millis(50),
    );
    let manager = Arc::new(TokenManager::new(identity("fail"), fake.clone(), 0.85).unwrap());

    // On the paused clock every task reaches the manager before the in-flight
    // exchange can complete, so the whole burst joins a single attempt.
    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.get_token().await })
        })
        .collect();

    for task in tasks {
        match task.await.unwrap() {
            Err(TokenError::TokenExchange(failure)) => {
                assert_eq!(failure.status, Some(StatusCode::BAD_GATEWAY));
                assert_eq!(failure.body.as_deref(), Some(r#"{"errorCode":"BXNIM0109E"}"#));
            }
            other => panic!("expected the shared exchange failure, got {other:?}"),
        }
    }
    assert_eq!(fake.calls(), 1);
}

#[tokio::test]
async fn a_failed_attempt_is_not_cached() {
    let fake = FakeExchange::returning(Ok(token_response("recovered", 3600)));
    fake.push(Err(refusal(
        StatusCode::INTERNAL_SERVER_ERROR,
        "temporarily broken",
    )));
    let manager = TokenManager::new(identity("retry"), fake.clone(), 0.85).unwrap();

    let err = manager.get_token().await.unwrap_err();
    assert!(matches!(err, TokenError::TokenExchange(_)));

    // The record slot was left untouched, so the very next call exchanges
    // again and succeeds.
    assert_eq!(manager.get_token().await.unwrap(), "recovered");
    assert_eq!(fake.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn managers_for_different_identities_refresh_independently() {
    let slow = FakeExchange::with_delay(
        Ok(token_response("slow-token", 3600)),
        Duration::from_millis(200),
    );
    let quick = FakeExchange::returning(Ok(token_response("quick-token", 3600)));

    let slow_manager = Arc::new(TokenManager::new(identity("slow"), slow, 0.85).unwrap());
    let quick_manager = Arc::new(TokenManager::new(identity("quick"), quick, 0.85).unwrap());

    let slow_task = {
        let manager = Arc::clone(&slow_manager);
        tokio::spawn(async move { manager.get_token().await.unwrap() })
    };

    // The quick manager's refresh must not queue behind the slow one.
    let quick_token = tokio::time::timeout(Duration::from_millis(100), quick_manager.get_token())
        .await
        .expect("independent manager was blocked by an unrelated refresh")
        .unwrap();
    assert_eq!(quick_token, "quick-token");

    assert_eq!(slow_task.await.unwrap(), "slow-token");
}
