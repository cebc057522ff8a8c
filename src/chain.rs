//! Ordered application of license sources to a single dependency.

use std::sync::Arc;

use crate::models::Dependency;
use crate::source::Resolver;

/// Fixed sequence of resolvers. The first one to return a license wins;
/// resolvers only see `&Dependency`, so a later source can never overwrite
/// an earlier result.
#[derive(Default, Clone)]
pub struct ResolutionChain {
    resolvers: Vec<Arc<dyn Resolver>>,
}

impl ResolutionChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub async fn resolve(&self, dep: &mut Dependency) {
        if dep.is_resolved() {
            return;
        }
        for resolver in &self.resolvers {
            if let Some(license) = resolver.resolve(dep).await {
                tracing::debug!(
                    dep = %dep.name,
                    spdx = %license.spdx_id,
                    source = %resolver.source(),
                    "license found"
                );
                dep.apply(license);
                return;
            }
        }
        tracing::debug!(dep = %dep.name, "no source found a license");
    }
}
