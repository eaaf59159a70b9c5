//! Load testing: many concurrent callers sharing one pipeline's state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::{Method, StatusCode};

use migration_resilience::config::ResilienceConfig;
use migration_resilience::lifecycle::Cancellation;
use migration_resilience::pipeline::{CachedPipelineBuilder, PolicyPipeline};
use migration_resilience::ResilienceError;

mod common;
use common::Reply;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_gate_holds_under_load() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (inf, pk) = (in_flight.clone(), peak.clone());
    let addr = common::start_programmable_backend(move || {
        let (inf, pk) = (inf.clone(), pk.clone());
        async move {
            let now = inf.fetch_add(1, Ordering::SeqCst) + 1;
            pk.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            inf.fetch_sub(1, Ordering::SeqCst);
            Reply::status(200)
        }
    })
    .await;

    let mut config = ResilienceConfig::default();
    config.concurrency.max_concurrent_requests = 4;
    config.concurrency.max_queued_requests = 1000;
    let pipeline = Arc::new(CachedPipelineBuilder::new(config));
    let transport = Arc::new(common::transport());

    let concurrency = 20;
    let requests_per_task = 5;
    let start = Instant::now();

    let mut tasks = Vec::new();
    for task in 0..concurrency {
        let pipeline = Arc::clone(&pipeline);
        let transport = Arc::clone(&transport);
        tasks.push(tokio::spawn(async move {
            let mut ok = 0;
            for i in 0..requests_per_task {
                let path = format!("/api/3.19/sites/s{task}/projects/p{i}");
                let request = common::request(Method::GET, addr, &path);
                let response = pipeline
                    .get_policies(&request)
                    .execute(transport.as_ref(), &request, &Cancellation::new())
                    .await;
                if matches!(response, Ok(r) if r.status() == StatusCode::OK) {
                    ok += 1;
                }
            }
            ok
        }));
    }

    let mut succeeded = 0;
    for task in tasks {
        succeeded += task.await.unwrap();
    }

    println!(
        "{} requests in {:?}, peak backend concurrency {}",
        concurrency * requests_per_task,
        start.elapsed(),
        peak.load(Ordering::SeqCst)
    );
    assert_eq!(succeeded, concurrency * requests_per_task);
    assert!(peak.load(Ordering::SeqCst) <= 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_client_throttle_bucket_is_shared_per_class() {
    let addr = common::start_programmable_backend(|| async { Reply::status(200) }).await;

    let mut config = ResilienceConfig::default();
    config.client_throttle.enabled = true;
    config.client_throttle.read.max_burst = 5;
    config.client_throttle.read.max_requests = 1;
    config.client_throttle.publish.max_burst = 2;
    config.client_throttle.publish.max_requests = 1;
    let pipeline = Arc::new(CachedPipelineBuilder::new(config));
    let transport = Arc::new(common::transport());

    let mut tasks = Vec::new();
    for i in 0..20 {
        let pipeline = Arc::clone(&pipeline);
        let transport = Arc::clone(&transport);
        let (method, path) = if i % 2 == 0 {
            (Method::GET, format!("/api/3.19/sites/s{i}"))
        } else {
            (Method::PUT, format!("/api/3.19/sites/s{i}"))
        };
        tasks.push(tokio::spawn(async move {
            let request = common::request(method, addr, &path);
            pipeline
                .get_policies(&request)
                .execute(transport.as_ref(), &request, &Cancellation::new())
                .await
        }));
    }

    let (mut reads_ok, mut writes_ok, mut limited) = (0, 0, 0);
    for (i, task) in tasks.into_iter().enumerate() {
        match task.await.unwrap() {
            Ok(_) if i % 2 == 0 => reads_ok += 1,
            Ok(_) => writes_ok += 1,
            Err(ResilienceError::RateLimited { .. }) => limited += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(reads_ok, 5);
    assert_eq!(writes_ok, 2);
    assert_eq!(limited, 13);
}
