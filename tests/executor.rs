// ABOUTME: Integration tests for batched, paced deployment execution.
// ABOUTME: Uses paused tokio time to check batch shapes, pacing delays, and true fan-out.

mod support;

use deckhand::deploy::{BatchExecutor, Deployer};
use deckhand::discovery::Module;
use deckhand::types::Concurrency;
use std::time::Duration;
use support::{FakeDeployer, module, stage};
use tempfile::TempDir;
use tokio::time::Instant;

const PACING: Duration = Duration::from_secs(3);
const DEPLOY_TIME: Duration = Duration::from_secs(1);

async fn run_five(concurrency: usize) -> (FakeDeployer, Duration) {
    let ws = TempDir::new().unwrap();
    let modules: Vec<Module> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|n| module(ws.path(), n))
        .collect();
    let deployer = FakeDeployer::new().with_delay(DEPLOY_TIME);
    let executor = BatchExecutor::new(Concurrency::new(concurrency).unwrap(), PACING);
    let dev = stage("dev");

    let started = Instant::now();
    let results = executor
        .run(modules, |m| {
            let deployer = &deployer;
            let dev = &dev;
            async move { deployer.deploy(&m, dev).await.is_ok() }
        })
        .await;
    let elapsed = started.elapsed();

    assert_eq!(results, vec![true; 5]);
    (deployer, elapsed)
}

#[tokio::test(start_paused = true)]
async fn five_modules_at_two_run_as_two_two_one_with_two_pauses() {
    let (deployer, elapsed) = run_five(2).await;

    // Three batches of one deploy-time each, plus exactly two pacing delays.
    assert_eq!(elapsed, DEPLOY_TIME * 3 + PACING * 2);
    assert_eq!(deployer.max_in_flight(), 2);
    assert_eq!(deployer.calls(), vec!["a", "b", "c", "d", "e"]);

    let starts = deployer.starts();
    let first = starts[0];
    let offsets: Vec<u64> = starts.iter().map(|s| (*s - first).as_secs()).collect();
    assert_eq!(offsets, vec![0, 0, 4, 4, 8]);
}

#[tokio::test(start_paused = true)]
async fn concurrency_of_one_is_sequential() {
    let (deployer, elapsed) = run_five(1).await;

    assert_eq!(deployer.max_in_flight(), 1);
    assert_eq!(elapsed, DEPLOY_TIME * 5 + PACING * 4);
}

#[tokio::test(start_paused = true)]
async fn a_single_batch_never_pauses() {
    let executor = BatchExecutor::new(Concurrency::new(3).unwrap(), PACING);

    let started = Instant::now();
    let results = executor
        .run(vec![1, 2, 3], |n| async move {
            tokio::time::sleep(DEPLOY_TIME).await;
            n
        })
        .await;

    assert_eq!(results, vec![1, 2, 3]);
    assert_eq!(started.elapsed(), DEPLOY_TIME);
}

#[tokio::test(start_paused = true)]
async fn batch_waits_for_its_slowest_member() {
    let executor = BatchExecutor::new(Concurrency::new(2).unwrap(), Duration::ZERO);

    let started = Instant::now();
    let results = executor
        .run(vec![5u64, 1, 1], |secs| async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            Instant::now()
        })
        .await;

    // The third item starts only after the 5s member of the first batch settles.
    assert_eq!(results[2] - started, Duration::from_secs(6));
}
