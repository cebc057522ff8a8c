//! Ties normalization, dispatch and partitioning together.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use indicatif::ProgressBar;

use crate::chain::ResolutionChain;
use crate::context::RunContext;
use crate::dispatch::dispatch;
use crate::error::RunError;
use crate::models::Dependency;
use crate::normalize::Normalizer;
use crate::records::write_records;

/// Resolved and missing dependencies, each in first-seen order.
#[derive(Debug, Default)]
pub struct Partition {
    pub resolved: Vec<Dependency>,
    pub missing: Vec<Dependency>,
}

/// Where the two output files go.
#[derive(Debug, Clone)]
pub struct Destinations {
    pub resolved: PathBuf,
    pub missing: Option<PathBuf>,
}

pub fn partition(deps: Vec<Dependency>) -> Partition {
    let (resolved, missing) = deps.into_iter().partition(Dependency::is_resolved);
    Partition { resolved, missing }
}

/// Everything a run produced, cancelled or not.
#[derive(Debug, Default)]
pub struct Outcome {
    pub partition: Partition,
    /// Records that went through the full chain.
    pub completed: usize,
    pub total: usize,
    pub cancelled: bool,
}

/// Normalize `identifiers`, resolve every unique dependency and partition the results.
///
/// A cancelled run still returns every record: those the chain never finished
/// land in `missing`.
pub async fn resolve_all(
    identifiers: &[String],
    normalizer: &Normalizer,
    chain: Arc<ResolutionChain>,
    workers: usize,
    ctx: &RunContext,
    progress: Option<&ProgressBar>,
) -> Result<Outcome> {
    let deps = normalizer.collect(identifiers.iter().map(String::as_str));
    tracing::info!(
        identifiers = identifiers.len(),
        unique = deps.len(),
        workers,
        "resolving licenses"
    );
    if let Some(pb) = progress {
        pb.set_length(deps.len() as u64);
    }

    let total = deps.len();
    let dispatched = dispatch(deps, chain, workers, ctx, progress).await?;
    let partition = partition(dispatched.deps);

    if dispatched.cancelled {
        tracing::warn!(
            completed = dispatched.completed,
            total,
            resolved = partition.resolved.len(),
            missing = partition.missing.len(),
            "run cancelled, writing partial results"
        );
    }

    Ok(Outcome {
        partition,
        completed: dispatched.completed,
        total,
        cancelled: dispatched.cancelled,
    })
}

/// Write both outputs, then fail with [`RunError::Cancelled`] if the run did not finish.
pub fn finish(outcome: &Outcome, dest: &Destinations) -> Result<()> {
    let written = write_outputs(&outcome.partition, dest);
    if !outcome.cancelled {
        return written;
    }

    if let Err(err) = written {
        tracing::error!(error = %err, "partial results not fully written");
    }
    Err(RunError::Cancelled {
        completed: outcome.completed,
        total: outcome.total,
    }
    .into())
}

/// Write both partitions. Missing dependencies without a destination are fatal,
/// after the resolved output has been written.
pub fn write_outputs(result: &Partition, dest: &Destinations) -> Result<()> {
    write_records(&dest.resolved, &result.resolved)?;

    match &dest.missing {
        Some(path) => write_records(path, &result.missing)?,
        None if !result.missing.is_empty() => {
            return Err(RunError::MissingWithoutDestination(result.missing.len()).into());
        }
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    use serde_json::json;
    use tempfile::tempdir;

    use crate::config::Config;
    use crate::models::LicenseSource;
    use crate::source::manual::{ManualOverrides, ManualResolver};
    use crate::source::testing::StaticResolver;

    fn config() -> Config {
        let mut remap = HashMap::new();
        remap.insert("pixie-labs/bcc".to_string(), "iovisor/bcc".to_string());
        Config {
            remap,
            ..Config::default()
        }
    }

    fn offline_chain(overrides: ManualOverrides) -> Arc<ResolutionChain> {
        Arc::new(
            ResolutionChain::new()
                .with(Arc::new(StaticResolver::unavailable(LicenseSource::Forge)))
                .with(Arc::new(StaticResolver::unavailable(LicenseSource::Registry)))
                .with(Arc::new(ManualResolver::new(Arc::new(overrides)))),
        )
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_end_to_end_with_manual_override() {
        let dir = tempdir().unwrap();
        let manual_path = dir.path().join("manual.json");
        std::fs::write(
            &manual_path,
            r#"[{"name":"foo/bar","spdxID":"MIT","licenseText":"..."}]"#,
        )
        .unwrap();
        let overrides = ManualOverrides::load(&manual_path).unwrap();

        let normalizer = Normalizer::new(&config(), false);
        let outcome = resolve_all(
            &ids(&["github.com/pixie-labs/bcc", "github.com/foo/bar"]),
            &normalizer,
            offline_chain(overrides),
            12,
            &RunContext::new(),
            None,
        )
        .await
        .unwrap();
        assert!(!outcome.cancelled);

        let dest = Destinations {
            resolved: dir.path().join("licenses.json"),
            missing: Some(dir.path().join("missing.json")),
        };
        finish(&outcome, &dest).unwrap();

        let resolved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&dest.resolved).unwrap()).unwrap();
        let missing: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dest.missing.unwrap()).unwrap()).unwrap();

        assert_eq!(
            resolved,
            json!([{
                "name": "foo/bar",
                "url": "https://github.com/foo/bar",
                "spdxID": "MIT",
                "licenseText": "..."
            }])
        );
        assert_eq!(
            missing,
            json!([{"name": "iovisor/bcc", "url": "https://github.com/iovisor/bcc"}])
        );
    }

    #[tokio::test]
    async fn test_partition_covers_every_unique_dependency() {
        let raw = ids(&[
            "github.com/a/one",
            "github.com/b/two",
            "github.com/a/one/v2",
            "k8s.io/klog",
            "git@github.com:c/three.git",
            "github.com/b/two",
        ]);
        let overrides = ManualOverrides::from_records(vec![Dependency {
            spdx_id: "ISC".to_string(),
            ..Dependency::new("b/two".to_string(), String::new(), String::new())
        }]);
        let normalizer = Normalizer::new(&config(), false);

        let result = resolve_all(
            &raw,
            &normalizer,
            offline_chain(overrides),
            3,
            &RunContext::new(),
            None,
        )
        .await
        .unwrap()
        .partition;

        let resolved: HashSet<&str> = result.resolved.iter().map(|d| d.name.as_str()).collect();
        let missing: HashSet<&str> = result.missing.iter().map(|d| d.name.as_str()).collect();
        assert!(resolved.is_disjoint(&missing));

        let all: HashSet<&str> = resolved.union(&missing).copied().collect();
        let expected: HashSet<&str> = ["a/one", "b/two", "k8s.io/klog", "c/three"].into_iter().collect();
        assert_eq!(all, expected);
        assert_eq!(result.resolved.len() + result.missing.len(), 4);

        let missing_order: Vec<&str> = result.missing.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(missing_order, ["a/one", "k8s.io/klog", "c/three"]);
    }

    #[test]
    fn test_missing_without_destination_fails() {
        let dir = tempdir().unwrap();
        let result = partition(vec![Dependency::new(
            "iovisor/bcc".to_string(),
            "https://github.com/iovisor/bcc".to_string(),
            "github.com/pixie-labs/bcc".to_string(),
        )]);
        let dest = Destinations {
            resolved: dir.path().join("licenses.json"),
            missing: None,
        };

        let err = write_outputs(&result, &dest).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RunError>(),
            Some(&RunError::MissingWithoutDestination(1))
        );
        // Resolved output is still written.
        assert_eq!(std::fs::read_to_string(&dest.resolved).unwrap(), "[]");
    }

    #[test]
    fn test_nothing_missing_needs_no_destination() {
        let dir = tempdir().unwrap();
        let dest = Destinations {
            resolved: dir.path().join("licenses.json"),
            missing: None,
        };
        assert!(write_outputs(&Partition::default(), &dest).is_ok());
    }

    fn read_json(path: &std::path::Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_cancelled_run_is_an_error() {
        let dir = tempdir().unwrap();
        let ctx = RunContext::new();
        ctx.cancel();
        let normalizer = Normalizer::new(&config(), false);

        let outcome = resolve_all(
            &ids(&["github.com/foo/bar"]),
            &normalizer,
            offline_chain(ManualOverrides::default()),
            2,
            &ctx,
            None,
        )
        .await
        .unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.completed, 0);

        let dest = Destinations {
            resolved: dir.path().join("licenses.json"),
            missing: Some(dir.path().join("missing.json")),
        };
        let err = finish(&outcome, &dest).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RunError>(),
            Some(&RunError::Cancelled { completed: 0, total: 1 })
        );
        assert_eq!(read_json(&dest.resolved), json!([]));
        assert_eq!(
            read_json(dest.missing.as_ref().unwrap()),
            json!([{"name": "foo/bar", "url": "https://github.com/foo/bar"}])
        );
    }

    #[tokio::test]
    async fn test_cancelled_run_keeps_completed_records() {
        let dir = tempdir().unwrap();
        let overrides = ManualOverrides::from_records(vec![Dependency {
            spdx_id: "MIT".to_string(),
            license_text: "fast text".to_string(),
            ..Dependency::new("a/fast".to_string(), String::new(), String::new())
        }]);
        // Overrides answer first; everything else hangs on a slow source.
        let chain = Arc::new(
            ResolutionChain::new()
                .with(Arc::new(ManualResolver::new(Arc::new(overrides))))
                .with(Arc::new(
                    StaticResolver::unavailable(LicenseSource::Forge).with_delay(Duration::from_secs(30)),
                )),
        );
        let ctx = RunContext::new();
        {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                ctx.cancel();
            });
        }
        let normalizer = Normalizer::new(&config(), false);

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            resolve_all(
                &ids(&[
                    "github.com/a/fast",
                    "github.com/b/slow",
                    "github.com/c/slow",
                    "github.com/d/slow",
                ]),
                &normalizer,
                chain,
                1,
                &ctx,
                None,
            ),
        )
        .await
        .unwrap()
        .unwrap();

        let dest = Destinations {
            resolved: dir.path().join("licenses.json"),
            missing: Some(dir.path().join("missing.json")),
        };
        let err = finish(&outcome, &dest).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RunError>(),
            Some(&RunError::Cancelled { completed: 1, total: 4 })
        );

        assert_eq!(
            read_json(&dest.resolved),
            json!([{
                "name": "a/fast",
                "url": "https://github.com/a/fast",
                "spdxID": "MIT",
                "licenseText": "fast text"
            }])
        );
        let missing: Vec<String> = read_json(dest.missing.as_ref().unwrap())
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(missing, ["b/slow", "c/slow", "d/slow"]);
    }
}
