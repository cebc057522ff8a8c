use serde::{Deserialize, Serialize};

use crate::license::spdx::is_unclassified;

/// A single dependency as it flows through the pipeline and into the output files.
///
/// The JSON shape (`name`, `url`, `spdxID`, `licenseText`) is shared by the
/// manual-override input and both outputs; empty license fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    /// Canonical `owner/repo` (or registry path) identifier; the dedup key.
    pub name: String,
    #[serde(default)]
    pub url: String,
    /// Raw identifier as it appeared in the listing.
    #[serde(skip)]
    pub package: String,
    #[serde(rename = "spdxID", default, skip_serializing_if = "String::is_empty")]
    pub spdx_id: String,
    #[serde(rename = "licenseText", default, skip_serializing_if = "String::is_empty")]
    pub license_text: String,
    #[serde(skip)]
    pub source: LicenseSource,
}

impl Dependency {
    pub fn new(name: String, url: String, package: String) -> Self {
        Self {
            name,
            url,
            package,
            spdx_id: String::new(),
            license_text: String::new(),
            source: LicenseSource::None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.spdx_id.is_empty()
    }

    /// Record a discovered license on this dependency.
    pub fn apply(&mut self, license: License) {
        self.spdx_id = license.spdx_id;
        self.license_text = license.text;
        self.source = license.source;
    }
}

/// A license found by one of the resolvers.
///
/// Only classifiable licenses can be constructed: an empty identifier or the
/// `NOASSERTION` sentinel yields `None`, which keeps the rest of the chain in play.
#[derive(Debug, Clone, PartialEq)]
pub struct License {
    pub spdx_id: String,
    pub text: String,
    pub source: LicenseSource,
}

impl License {
    pub fn new(spdx_id: impl Into<String>, text: impl Into<String>, source: LicenseSource) -> Option<Self> {
        let spdx_id = spdx_id.into().trim().to_string();
        if is_unclassified(&spdx_id) {
            return None;
        }
        Some(Self {
            spdx_id,
            text: text.into(),
            source,
        })
    }
}

/// Where a dependency's license came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LicenseSource {
    Forge,
    Registry,
    Manual,
    #[default]
    None,
}

impl std::fmt::Display for LicenseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseSource::Forge => write!(f, "github"),
            LicenseSource::Registry => write!(f, "pkg.go.dev"),
            LicenseSource::Manual => write!(f, "manual"),
            LicenseSource::None => write!(f, "none"),
        }
    }
}
