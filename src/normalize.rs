//! Maps raw dependency identifiers onto canonical project names.

use std::collections::{HashMap, HashSet};

use crate::config::Config;
use crate::models::Dependency;

/// Fork → upstream name mapping with case-insensitive lookup.
#[derive(Debug, Clone, Default)]
pub struct RemapTable {
    entries: HashMap<String, String>,
}

impl RemapTable {
    pub fn new(entries: &HashMap<String, String>) -> Self {
        let entries = entries
            .iter()
            .map(|(fork, upstream)| (fork.to_lowercase(), upstream.clone()))
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// Canonicalizes identifiers such as `github.com/owner/repo/v2`,
/// `git@github.com:owner/repo.git` or `https://github.com/owner/repo`.
#[derive(Debug, Clone)]
pub struct Normalizer {
    forge_host: String,
    registry_url: String,
    registry_fallback: bool,
    remap: RemapTable,
}

impl Normalizer {
    pub fn new(config: &Config, registry_fallback: bool) -> Self {
        Self {
            forge_host: config.forge.host.clone(),
            registry_url: config.registry.base_url.trim_end_matches('/').to_string(),
            registry_fallback,
            remap: RemapTable::new(&config.remap),
        }
    }

    /// Returns `(name, url)` for a raw identifier. The URL is empty when the
    /// identifier cannot be resolved to a forge repository.
    pub fn normalize(&self, raw: &str) -> (String, String) {
        let on_forge = raw.contains(self.forge_host.as_str());

        if self.registry_fallback && !on_forge {
            // Registry paths are URL-like but not always real pages (e.g. k8s.io/klog),
            // so they are kept verbatim and resolved through the registry.
            return (raw.to_string(), format!("{}/{}", self.registry_url, raw));
        }

        if !on_forge {
            return (raw.to_string(), String::new());
        }

        let mut pkg = raw.replacen(&format!("git@{}:", self.forge_host), &format!("{}/", self.forge_host), 1);
        if let Some(stripped) = pkg.strip_suffix(".git") {
            pkg = stripped.to_string();
        }
        if let Some((_, rest)) = pkg.split_once("://") {
            pkg = rest.to_string();
        }

        let segments: Vec<&str> = pkg.split('/').collect();
        let Some(host_idx) = segments.iter().position(|s| s.ends_with(self.forge_host.as_str())) else {
            return (raw.to_string(), String::new());
        };
        let (owner, repo) = match (segments.get(host_idx + 1), segments.get(host_idx + 2)) {
            (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => (*owner, *repo),
            _ => return (raw.to_string(), String::new()),
        };

        let mut name = format!("{}/{}", owner, repo);
        if let Some(upstream) = self.remap.get(&name) {
            name = upstream.to_string();
        }
        let url = format!("https://{}/{}", self.forge_host, name);
        (name, url)
    }

    /// Normalize every identifier and keep the first record per canonical name,
    /// in encounter order.
    pub fn collect<'a, I>(&self, identifiers: I) -> Vec<Dependency>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut deps = Vec::new();

        for raw in identifiers {
            let (name, url) = self.normalize(raw);
            if seen.insert(name.clone()) {
                deps.push(Dependency::new(name, url, raw.to_string()));
            } else {
                tracing::trace!(package = raw, name = %name, "duplicate dependency skipped");
            }
        }

        deps
    }
}
