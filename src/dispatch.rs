//! Fans dependencies out to a fixed pool of workers.
//!
//! Records are moved through channels, so each one is owned by exactly one
//! worker while it is being resolved. The queue receiver is shared behind a
//! mutex that is held only while dequeuing, never across a network call.

use std::sync::Arc;

use anyhow::Result;
use indicatif::ProgressBar;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::chain::ResolutionChain;
use crate::context::RunContext;
use crate::models::Dependency;

type Job = (usize, Dependency);

/// Every dispatched record, back in the order it was dispatched.
pub struct Dispatched {
    pub deps: Vec<Dependency>,
    /// Number of records that went through the full chain.
    pub completed: usize,
    pub cancelled: bool,
}

/// Resolve every record with up to `workers` resolutions in flight at once.
///
/// When `ctx` is cancelled, in-flight resolutions are dropped and the remaining
/// records are returned unresolved.
pub async fn dispatch(
    deps: Vec<Dependency>,
    chain: Arc<ResolutionChain>,
    workers: usize,
    ctx: &RunContext,
    progress: Option<&ProgressBar>,
) -> Result<Dispatched> {
    let total = deps.len();
    let workers = workers.max(1);

    let (work_tx, work_rx) = mpsc::unbounded_channel::<Job>();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(Job, bool)>();

    for job in deps.into_iter().enumerate() {
        // The receiver is still held here, so the send cannot fail.
        let _ = work_tx.send(job);
    }
    drop(work_tx);

    let work_rx = Arc::new(Mutex::new(work_rx));
    let mut join_set = JoinSet::new();
    for worker in 0..workers {
        join_set.spawn(run_worker(
            worker,
            Arc::clone(&work_rx),
            done_tx.clone(),
            Arc::clone(&chain),
            ctx.clone(),
        ));
    }
    drop(done_tx);

    let mut slots: Vec<Option<Dependency>> = (0..total).map(|_| None).collect();
    let mut completed = 0usize;
    while let Some(((idx, dep), finished)) = done_rx.recv().await {
        if finished {
            completed += 1;
        }
        if let Some(pb) = progress {
            pb.inc(1);
        }
        slots[idx] = Some(dep);
    }

    while let Some(res) = join_set.join_next().await {
        res.map_err(|e| anyhow::anyhow!("worker task join: {}", e))?;
    }

    let deps: Vec<Dependency> = slots.into_iter().flatten().collect();
    debug_assert_eq!(deps.len(), total);

    Ok(Dispatched {
        deps,
        completed,
        cancelled: ctx.is_cancelled(),
    })
}

async fn run_worker(
    worker: usize,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    done: mpsc::UnboundedSender<(Job, bool)>,
    chain: Arc<ResolutionChain>,
    ctx: RunContext,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some((idx, mut dep)) = next else {
            break;
        };

        let finished = if ctx.is_cancelled() {
            false
        } else {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => false,
                _ = chain.resolve(&mut dep) => true,
            }
        };

        tracing::trace!(worker, dep = %dep.name, finished, "dependency done");
        if done.send(((idx, dep), finished)).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::models::LicenseSource;
    use crate::source::testing::StaticResolver;

    fn deps(n: usize) -> Vec<Dependency> {
        (0..n)
            .map(|i| {
                let name = format!("owner{}/repo{}", i, i);
                Dependency::new(name.clone(), format!("https://github.com/{}", name), name)
            })
            .collect()
    }

    /// Licenses every third dependency on the forge and every fifth manually.
    fn chain() -> Arc<ResolutionChain> {
        let names: Vec<String> = (0..60).map(|i| format!("owner{}/repo{}", i, i)).collect();
        let forge: Vec<(&str, &str)> = names.iter().step_by(3).map(|n| (n.as_str(), "MIT")).collect();
        let manual: Vec<(&str, &str)> = names
            .iter()
            .step_by(5)
            .map(|n| (n.as_str(), "Apache-2.0"))
            .collect();

        Arc::new(
            ResolutionChain::new()
                .with(Arc::new(
                    StaticResolver::new(LicenseSource::Forge, &forge).with_delay(Duration::from_millis(1)),
                ))
                .with(Arc::new(StaticResolver::new(LicenseSource::Manual, &manual))),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_record_processed_once_in_order() {
        let forge = Arc::new(StaticResolver::unavailable(LicenseSource::Forge));
        let chain = Arc::new(ResolutionChain::new().with(forge.clone()));
        let input = deps(40);

        let out = dispatch(input.clone(), chain, 12, &RunContext::new(), None)
            .await
            .unwrap();

        assert_eq!(forge.calls(), 40);
        assert_eq!(out.completed, 40);
        assert!(!out.cancelled);
        let names: Vec<&str> = out.deps.iter().map(|d| d.name.as_str()).collect();
        let expected: Vec<&str> = input.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_worker_count_does_not_change_outcome() {
        let one = dispatch(deps(60), chain(), 1, &RunContext::new(), None)
            .await
            .unwrap();
        let twelve = dispatch(deps(60), chain(), 12, &RunContext::new(), None)
            .await
            .unwrap();

        let summary = |d: &Dispatched| -> Vec<(String, String)> {
            d.deps.iter().map(|d| (d.name.clone(), d.spdx_id.clone())).collect()
        };
        assert_eq!(summary(&one), summary(&twelve));
        // 0..60: 20 multiples of 3, plus 8 multiples of 5 that are not multiples of 3.
        assert_eq!(one.deps.iter().filter(|d| d.is_resolved()).count(), 28);
    }

    #[tokio::test]
    async fn test_zero_workers_still_runs() {
        let out = dispatch(deps(3), chain(), 0, &RunContext::new(), None)
            .await
            .unwrap();
        assert_eq!(out.deps.len(), 3);
        assert_eq!(out.deps[0].spdx_id, "MIT");
    }

    #[tokio::test]
    async fn test_empty_input() {
        let out = dispatch(Vec::new(), chain(), 12, &RunContext::new(), None)
            .await
            .unwrap();
        assert!(out.deps.is_empty());
        assert_eq!(out.completed, 0);
    }

    #[tokio::test]
    async fn test_cancelled_run_returns_every_record() {
        let slow = Arc::new(
            StaticResolver::new(LicenseSource::Forge, &[("owner0/repo0", "MIT")])
                .with_delay(Duration::from_secs(30)),
        );
        let chain = Arc::new(ResolutionChain::new().with(slow));
        let ctx = RunContext::new();

        let canceller = {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                ctx.cancel();
            })
        };

        let out = tokio::time::timeout(
            Duration::from_secs(5),
            dispatch(deps(10), chain, 2, &ctx, None),
        )
        .await
        .unwrap()
        .unwrap();
        canceller.await.unwrap();

        assert!(out.cancelled);
        assert_eq!(out.deps.len(), 10);
        assert_eq!(out.completed, 0);
        assert!(out.deps.iter().all(|d| !d.is_resolved()));
    }
}
