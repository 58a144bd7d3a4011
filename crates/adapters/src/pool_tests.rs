// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::session::FakeConnector;
use proptest::prelude::*;
use std::collections::HashMap;

fn endpoints(n: usize) -> Vec<Endpoint> {
    (1..=n).map(|i| Endpoint::new(format!("browser-{i}"), format!("http://127.0.0.1:{}", 9221 + i))).collect()
}

async fn ready_pool(n: usize) -> (SessionPool<FakeConnector>, FakeConnector) {
    let connector = FakeConnector::new();
    let pool = SessionPool::new(connector.clone(), endpoints(n), PoolConfig::default());
    pool.initialize().await.unwrap();
    (pool, connector)
}

fn acquire_name(pool: &SessionPool<FakeConnector>) -> String {
    pool.acquire().unwrap().endpoint().name.clone()
}

#[tokio::test]
async fn initialize_tolerates_partial_failure() {
    let connector = FakeConnector::new();
    connector.set_unreachable("browser-2");
    let pool = SessionPool::new(connector.clone(), endpoints(3), PoolConfig::default());
    assert_eq!(pool.initialize().await.unwrap(), 2);
    assert_eq!(connector.connects(), vec!["browser-1", "browser-3"]);

    let status = pool.status();
    assert_eq!(status.total, 3);
    assert_eq!(status.available, 2);
    assert_eq!(status.sessions[1].state, SessionState::Disconnected);
}

#[tokio::test]
async fn initialize_with_no_sessions_is_fatal() {
    let connector = FakeConnector::new();
    connector.set_unreachable("browser-1");
    let pool = SessionPool::new(connector, endpoints(1), PoolConfig::default());
    let err = pool.initialize().await.unwrap_err();
    assert!(matches!(err, PoolError::NoSessions { attempted: 1 }));
}

#[tokio::test]
async fn acquire_on_empty_pool_errors() {
    let pool = SessionPool::new(FakeConnector::new(), Vec::new(), PoolConfig::default());
    assert!(matches!(pool.acquire(), Err(PoolError::NoEndpointAvailable)));
    assert!(matches!(pool.dispatch("hi").await, Err(PoolError::NoEndpointAvailable)));
}

#[tokio::test]
async fn round_robin_in_registration_order() {
    let (pool, _) = ready_pool(3).await;
    let names: Vec<String> = (0..6).map(|_| acquire_name(&pool)).collect();
    assert_eq!(names, ["browser-1", "browser-2", "browser-3", "browser-1", "browser-2", "browser-3"]);
}

proptest! {
    #[test]
    fn each_session_once_per_cycle(k in 1usize..8, cycles in 1usize..5) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let (pool, _) = rt.block_on(ready_pool(k));
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..k * cycles {
            *counts.entry(acquire_name(&pool)).or_default() += 1;
        }
        prop_assert_eq!(counts.len(), k);
        prop_assert!(counts.values().all(|&c| c == cycles));
    }

    #[test]
    fn eviction_mid_sequence_never_errors(k in 2usize..6, before in 0usize..10, victim in 0usize..6) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let (pool, connector) = rt.block_on(ready_pool(k));
        for _ in 0..before {
            acquire_name(&pool);
        }
        let victim = format!("browser-{}", victim % k + 1);
        connector.set_unhealthy(&victim);
        let evicted = rt.block_on(pool.check_health());
        prop_assert_eq!(evicted, vec![victim.clone()]);
        for _ in 0..(k - 1) * 2 {
            let name = pool.acquire().map(|s| s.endpoint().name.clone());
            prop_assert!(name.is_ok());
            prop_assert_ne!(name.unwrap(), victim.clone());
        }
    }
}

#[tokio::test]
async fn health_check_evicts_and_closes() {
    let (pool, connector) = ready_pool(2).await;
    connector.set_unhealthy("browser-1");
    assert_eq!(pool.check_health().await, vec!["browser-1"]);
    assert_eq!(connector.closed(), vec!["browser-1"]);
    assert!(pool.get("browser-1").is_none());

    // Eviction is permanent even once the endpoint recovers
    connector.set_healthy("browser-1");
    assert!(pool.check_health().await.is_empty());
    assert_eq!(pool.status().available, 1);
}

#[tokio::test]
async fn evicting_last_session_empties_pool() {
    let (pool, connector) = ready_pool(1).await;
    connector.set_unhealthy("browser-1");
    pool.check_health().await;
    assert!(matches!(pool.dispatch("x").await, Err(PoolError::NoEndpointAvailable)));
}

#[tokio::test]
async fn dispatch_returns_reply_and_session() {
    let (pool, connector) = ready_pool(2).await;
    connector.push_reply("first");
    let dispatched = pool.dispatch("hello").await.unwrap();
    assert_eq!(dispatched.reply.answer, "first");
    assert_eq!(dispatched.session, "browser-1");
    assert_eq!(connector.calls()[0].prompt, "hello");
}

#[tokio::test]
async fn dispatch_call_error_names_session() {
    let (pool, connector) = ready_pool(1).await;
    connector.push_error("page crashed");
    let err = pool.dispatch("hello").await.unwrap_err();
    assert!(matches!(err, PoolError::Session { ref session, .. } if session == "browser-1"));
    assert!(err.to_string().contains("page crashed"));
}

#[tokio::test(start_paused = true)]
async fn dispatch_times_out() {
    let connector = FakeConnector::new();
    connector.set_call_delay(Duration::from_secs(600));
    let config = PoolConfig { dispatch_timeout: Duration::from_secs(5), ..PoolConfig::default() };
    let pool = SessionPool::new(connector, endpoints(1), config);
    pool.initialize().await.unwrap();
    let err = pool.dispatch("slow").await.unwrap_err();
    assert!(matches!(err, PoolError::Timeout { after, .. } if after == Duration::from_secs(5)));
}

#[tokio::test(start_paused = true)]
async fn health_probe_runs_on_interval_until_cancelled() {
    let (pool, connector) = ready_pool(2).await;
    let cancel = CancellationToken::new();
    let handle = pool.spawn_health_probe(Duration::from_secs(30), cancel.clone());

    connector.set_unhealthy("browser-2");
    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(pool.status().available, 2);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(pool.status().available, 1);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn register_adds_and_replaces() {
    let (pool, connector) = ready_pool(1).await;
    pool.register(Endpoint::new("browser-9", "http://10.0.0.9:9222")).await.unwrap();
    assert_eq!(pool.status().available, 2);

    pool.register(Endpoint::new("browser-1", "http://10.0.0.1:9222")).await.unwrap();
    let status = pool.status();
    assert_eq!(status.total, 2);
    assert_eq!(status.available, 2);
    assert_eq!(status.sessions[0].url, "http://10.0.0.1:9222");
    assert_eq!(connector.closed(), vec!["browser-1"]);
}

#[tokio::test]
async fn register_restores_evicted_endpoint() {
    let (pool, connector) = ready_pool(1).await;
    connector.set_unhealthy("browser-1");
    pool.check_health().await;
    connector.set_healthy("browser-1");
    pool.register(Endpoint::new("browser-1", "http://127.0.0.1:9222")).await.unwrap();
    assert_eq!(pool.status().sessions[0].state, SessionState::Connected);
}

#[tokio::test]
async fn shutdown_closes_everything() {
    let (pool, connector) = ready_pool(3).await;
    pool.shutdown().await;
    assert_eq!(connector.closed().len(), 3);
    assert_eq!(pool.status().available, 0);
}
