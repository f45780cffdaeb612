use anyhow::Result;
use url::Url;

/// Scheme prefix that marks a repository URL as consign-managed.
pub const LOCATOR_PREFIX: &str = "consign";

/// API host used when the locator names the literal host `consign`.
pub const DEFAULT_HOST: &str = "api.consign.dev";

/// Parsed publishing target.
///
/// Locators look like `consign+https://<api-host>/<owner>/<repo>`; the host
/// shorthand `consign` selects the hosted default endpoint, so
/// `consign+https://consign/acme/widgets` publishes to
/// `https://api.consign.dev`. Any path segments ahead of the final
/// `<owner>/<repo>` pair stay part of the API base, which keeps proxied
/// deployments (`…/svc/<owner>/<repo>`) working.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocator {
    pub owner: String,
    pub repository: String,
    /// Scheme, host, optional port, and any path prefix; no trailing slash.
    pub api_base: String,
}

impl RepoLocator {
    pub fn parse(locator: &str) -> Result<Self> {
        let parts: Vec<&str> = locator.split('+').collect();
        let [prefix, remote] = parts.as_slice() else {
            return Err(form_error(locator));
        };
        if *prefix != LOCATOR_PREFIX {
            return Err(form_error(locator));
        }

        let url = match Url::parse(remote) {
            Ok(u) => u,
            Err(_) => return Err(form_error(locator)),
        };

        let host = match url.host_str() {
            Some(h) if h != LOCATOR_PREFIX => h.to_string(),
            _ => DEFAULT_HOST.to_string(),
        };

        let path = url.path().trim_end_matches('/');
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() < 2 {
            return Err(form_error(locator));
        }

        let owner = segments[segments.len() - 2];
        let repository = segments[segments.len() - 1];
        if owner.is_empty() || repository.is_empty() {
            return Err(form_error(locator));
        }

        let mut api_base = format!("{}://{}", url.scheme(), host);
        if let Some(port) = url.port() {
            api_base.push_str(&format!(":{port}"));
        }
        api_base.push_str(&segments[..segments.len() - 2].join("/"));

        Ok(Self {
            owner: owner.to_string(),
            repository: repository.to_string(),
            api_base,
        })
    }
}

// Same message on every reject path so operators always see the expected form.
fn form_error(locator: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "repository locator must be in the form \
         'consign+https://<api-host>/<owner>/<repo>', got: {locator}"
    )
}
