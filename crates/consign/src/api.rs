//! Blocking HTTP client for the consign service API.
//!
//! Covers the authenticated control-plane calls: registering a file for
//! upload, creating a package from uploaded files, polling package status,
//! and reading repository metadata. The presigned data-plane upload itself
//! lives in [`crate::upload`].

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Serialize;

use crate::error::PublishError;
use crate::package::PackageRequest;
use crate::types::{PackageHandle, PackageStatus, RepoInfo, UploadRegistration};

/// Header carrying the API key on authenticated requests.
pub const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Serialize)]
struct RegisterRequest<'a> {
    filename: &'a str,
    md5_checksum: &'a str,
}

/// Client for one service endpoint, bound to its base URL and credentials.
pub struct ApiClient {
    base: String,
    http: Client,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(
        base: &str,
        api_key: Option<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!("consign/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()
            .context("failed to construct HTTP client")?;

        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            http,
            api_key,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn is_authenticated(&self) -> bool {
        self.api_key.is_some()
    }

    /// Register an upcoming file upload and obtain the presigned target.
    pub fn register_upload(
        &self,
        owner: &str,
        repository: &str,
        filename: &str,
        md5_checksum: &str,
    ) -> Result<UploadRegistration, PublishError> {
        let url = format!("{}/files/{owner}/{repository}/", self.base);
        let body = RegisterRequest {
            filename,
            md5_checksum,
        };

        let resp = self
            .post(&url)
            .json(&body)
            .send()
            .map_err(|err| PublishError::RegistrationRejected {
                detail: err.to_string(),
            })?;
        if !resp.status().is_success() {
            return Err(PublishError::RegistrationRejected {
                detail: reject_detail(resp),
            });
        }

        resp.json()
            .map_err(|err| PublishError::RegistrationRejected {
                detail: err.to_string(),
            })
    }

    /// Assemble the uploaded files into a package and start its sync.
    pub fn create_package(
        &self,
        owner: &str,
        repository: &str,
        request: &PackageRequest,
    ) -> Result<PackageHandle, PublishError> {
        let url = format!("{}/packages/{owner}/{repository}/", self.base);

        let resp = self
            .post(&url)
            .json(request)
            .send()
            .map_err(|err| PublishError::PackageCreationRejected {
                detail: err.to_string(),
            })?;
        if !resp.status().is_success() {
            return Err(PublishError::PackageCreationRejected {
                detail: reject_detail(resp),
            });
        }

        resp.json()
            .map_err(|err| PublishError::PackageCreationRejected {
                detail: err.to_string(),
            })
    }

    /// One synchronization status snapshot for a created package.
    pub fn package_status(
        &self,
        owner: &str,
        repository: &str,
        slug: &str,
    ) -> Result<PackageStatus, PublishError> {
        let url = format!("{}/packages/{owner}/{repository}/{slug}/status/", self.base);

        self.get(&url)
            .send()
            .and_then(Response::error_for_status)
            .and_then(|resp| resp.json::<PackageStatus>())
            .map_err(|source| PublishError::PollTransport { source })
    }

    /// Repository metadata, including the CDN base used for downloads.
    pub fn repo_info(&self, owner: &str, repository: &str) -> Result<RepoInfo> {
        let url = format!("{}/repos/{owner}/{repository}/", self.base);

        let resp = self
            .get(&url)
            .send()
            .with_context(|| format!("failed to query repository info for {owner}/{repository}"))?;
        match resp.status() {
            StatusCode::OK => resp
                .json::<RepoInfo>()
                .context("repository info response was not valid JSON"),
            status => bail!("repository info request failed with HTTP {status}"),
        }
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.authorize(self.http.get(url))
    }

    fn post(&self, url: &str) -> RequestBuilder {
        self.authorize(self.http.post(url))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req.header(API_KEY_HEADER, key),
            None => req,
        }
    }
}

// Rejections surface the response body when the server sent one.
fn reject_detail(resp: Response) -> String {
    let status = resp.status();
    match resp.text() {
        Ok(body) if !body.trim().is_empty() => body,
        _ => format!("HTTP {status}"),
    }
}
