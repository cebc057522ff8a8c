//! License sources, tried in order by the [`ResolutionChain`](crate::chain::ResolutionChain).
//!
//! - [`github`] — repository license endpoint of the GitHub REST API.
//! - [`pkg_go_dev`] — licenses tab of pkg.go.dev, for non-GitHub Go modules.
//! - [`manual`] — curated overrides loaded from a JSON file.
//!
//! A resolver returns `Some(license)` when it found a classifiable license and
//! `None` otherwise. Network and decode failures are logged and become `None`;
//! they never abort the run.

use futures::future::BoxFuture;

use crate::models::{Dependency, License, LicenseSource};

pub mod github;
pub mod manual;
pub mod pkg_go_dev;

pub trait Resolver: Send + Sync {
    /// Source reported for licenses found by this resolver.
    fn source(&self) -> LicenseSource;

    fn resolve<'a>(&'a self, dep: &'a Dependency) -> BoxFuture<'a, Option<License>>;
}

/// Build the shared HTTP client used by the network resolvers.
pub fn http_client(user_agent: &str, timeout: std::time::Duration) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?)
}
