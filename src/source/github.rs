use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::ForgeConfig;
use crate::error::FetchError;
use crate::models::{Dependency, License, LicenseSource};

use super::Resolver;

/// Fetches the license GitHub detected for a repository.
pub struct GithubResolver {
    client: Client,
    api_url: String,
    repo_prefix: String,
    token: Option<String>,
}

/// Response of `GET /repos/{owner}/{repo}/license`.
#[derive(Debug, Deserialize)]
struct RepoLicense {
    #[serde(default)]
    content: String,
    license: Option<LicenseInfo>,
}

#[derive(Debug, Deserialize)]
struct LicenseInfo {
    spdx_id: Option<String>,
}

impl GithubResolver {
    pub fn new(client: Client, config: &ForgeConfig, token: Option<String>) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            repo_prefix: format!("https://{}", config.host),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn applies(&self, dep: &Dependency) -> bool {
        dep.url.starts_with(&self.repo_prefix)
    }

    async fn fetch(&self, owner: &str, repo: &str) -> Result<Option<License>, FetchError> {
        let url = format!("{}/repos/{}/{}/license", self.api_url, owner, repo);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => return Err(FetchError::Status(status)),
            _ => {}
        }

        let body: RepoLicense = response.json().await?;
        Ok(license_from_response(body))
    }
}

impl Resolver for GithubResolver {
    fn source(&self) -> LicenseSource {
        LicenseSource::Forge
    }

    fn resolve<'a>(&'a self, dep: &'a Dependency) -> BoxFuture<'a, Option<License>> {
        async move {
            if !self.applies(dep) {
                return None;
            }
            let mut parts = dep.name.split('/');
            let (owner, repo) = (parts.next()?, parts.next()?);

            match self.fetch(owner, repo).await {
                Ok(license) => license,
                Err(err) => {
                    tracing::debug!(dep = %dep.name, error = %err, "github license lookup failed");
                    None
                }
            }
        }
        .boxed()
    }
}

fn license_from_response(body: RepoLicense) -> Option<License> {
    // NOASSERTION means GitHub found license text it could not classify;
    // License::new rejects it so a later source can try.
    let spdx_id = body.license.and_then(|l| l.spdx_id).unwrap_or_default();
    License::new(spdx_id, decode_content(&body.content), LicenseSource::Forge)
}

/// GitHub returns the license file base64 encoded, wrapped at 60 columns.
fn decode_content(content: &str) -> String {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    match STANDARD.decode(compact) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => content.to_string(),
    }
}
