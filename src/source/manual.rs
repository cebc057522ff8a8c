use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::models::{Dependency, License, LicenseSource};
use crate::records::read_records;

use super::Resolver;

/// Curated licenses keyed by canonical dependency name. Read-only once loaded.
#[derive(Debug, Default)]
pub struct ManualOverrides {
    entries: HashMap<String, License>,
}

impl ManualOverrides {
    /// Load overrides from a JSON array of records (`name`, `spdxID`, `licenseText`).
    pub fn load(path: &Path) -> Result<Self> {
        let overrides = Self::from_records(read_records(path)?);
        tracing::info!(path = %path.display(), count = overrides.len(), "loaded manual licenses");
        Ok(overrides)
    }

    /// Records without a usable `spdxID` are ignored. A later record for the
    /// same name replaces an earlier one.
    pub fn from_records(records: Vec<Dependency>) -> Self {
        let entries = records
            .into_iter()
            .filter_map(|r| {
                let license = License::new(r.spdx_id, r.license_text, LicenseSource::Manual)?;
                Some((r.name, license))
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&License> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

pub struct ManualResolver {
    overrides: Arc<ManualOverrides>,
}

impl ManualResolver {
    pub fn new(overrides: Arc<ManualOverrides>) -> Self {
        Self { overrides }
    }
}

impl Resolver for ManualResolver {
    fn source(&self) -> LicenseSource {
        LicenseSource::Manual
    }

    fn resolve<'a>(&'a self, dep: &'a Dependency) -> BoxFuture<'a, Option<License>> {
        let found = self.overrides.get(&dep.name).cloned();
        if found.is_none() {
            // Someone needs to add this dependency to the manual licenses file.
            tracing::debug!(dep = %dep.name, "no manual license entry");
        }
        futures::future::ready(found).boxed()
    }
}
