use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use regex::Regex;
use reqwest::{Client, StatusCode};

use crate::config::RegistryConfig;
use crate::error::FetchError;
use crate::license::spdx::normalize;
use crate::models::{Dependency, License, LicenseSource};

use super::Resolver;

/// Scrapes the licenses tab of pkg.go.dev. There is no API for it, so this
/// relies on the page keeping its `License` / `License-contents` markup.
pub struct PkgGoDevResolver {
    client: Client,
    base_url: String,
    page: LicensePage,
}

impl PkgGoDevResolver {
    pub fn new(client: Client, config: &RegistryConfig) -> Result<Self> {
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page: LicensePage::new()?,
        })
    }

    async fn fetch(&self, package: &str) -> Result<Option<License>, FetchError> {
        let url = format!("{}/{}?tab=licenses", self.base_url, package);
        let response = self.client.get(&url).send().await?;

        if response.status() != StatusCode::OK {
            tracing::debug!(package, status = %response.status(), "pkg.go.dev returned no licenses page");
            return Ok(None);
        }

        let html = response.text().await?;
        Ok(self.page.first_license(&html))
    }
}

impl Resolver for PkgGoDevResolver {
    fn source(&self) -> LicenseSource {
        LicenseSource::Registry
    }

    fn resolve<'a>(&'a self, dep: &'a Dependency) -> BoxFuture<'a, Option<License>> {
        async move {
            if dep.package.is_empty() {
                return None;
            }
            match self.fetch(&dep.package).await {
                Ok(license) => license,
                Err(err) => {
                    tracing::debug!(dep = %dep.name, error = %err, "pkg.go.dev license lookup failed");
                    None
                }
            }
        }
        .boxed()
    }
}

/// Extracts license sections from a pkg.go.dev licenses tab.
///
/// Mirrors the selectors `.License`, `.License h2 div` and `.License-contents`:
/// class attributes may hold several classes and the label `div` may be nested
/// anywhere inside the `h2`.
struct LicensePage {
    section: Regex,
    heading: Regex,
    div_open: Regex,
    contents: Regex,
    tag: Regex,
    numeric_entity: Regex,
}

impl LicensePage {
    fn new() -> Result<Self> {
        Ok(Self {
            section: Regex::new(r#"<[a-zA-Z]+[^>]*\bclass="(?:[^"]*\s)?License(?:\s[^"]*)?"[^>]*>"#)?,
            heading: Regex::new(r"(?s)<h2\b[^>]*>(.*?)</h2>")?,
            div_open: Regex::new(r"<div\b[^>]*>")?,
            contents: Regex::new(
                r#"(?s)<(?:pre|div)[^>]*\bclass="(?:[^"]*\s)?License-contents(?:\s[^"]*)?"[^>]*>(.*?)</(?:pre|div)>"#,
            )?,
            tag: Regex::new(r"<[^>]*>")?,
            numeric_entity: Regex::new(r"&#(\d+);")?,
        })
    }

    /// The first section whose label is a classifiable license.
    fn first_license(&self, html: &str) -> Option<License> {
        let starts: Vec<usize> = self.section.find_iter(html).map(|m| m.end()).collect();

        starts.iter().enumerate().find_map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(html.len());
            let section = &html[start..end];

            let label = self.label(section).unwrap_or_default();
            let text = self
                .contents
                .captures(section)
                .map(|c| self.text(&c[1]))
                .unwrap_or_default();

            License::new(normalize(&label), text, LicenseSource::Registry)
        })
    }

    /// Text of the outermost `div` inside the section's `h2`.
    fn label(&self, section: &str) -> Option<String> {
        let heading = self.heading.captures(section)?;
        let inner = heading.get(1)?.as_str();
        let open = self.div_open.find(inner)?;
        let close = inner.rfind("</div>").filter(|&c| c >= open.end())?;
        Some(self.text(&inner[open.end()..close]))
    }

    /// Text content of a markup fragment: tags removed, entities decoded.
    fn text(&self, fragment: &str) -> String {
        let stripped = self.tag.replace_all(fragment, "");
        let decoded = self.numeric_entity.replace_all(&stripped, |caps: &regex::Captures| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        });
        decoded
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }
}
