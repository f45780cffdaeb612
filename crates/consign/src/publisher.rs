//! The publication pipeline: classify, upload, assemble, wait.
//!
//! A [`Publisher`] owns one publication run against one repository. Files
//! are staged with [`Publisher::put`]; the metadata index arriving marks
//! the end of the set and triggers [`Publisher::finalize`], which creates
//! the package and waits out its synchronization. The first fatal error
//! latches the run as failed and turns every later transfer into a no-op.

use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client;

use crate::api::ApiClient;
use crate::auth;
use crate::classify;
use crate::error::PublishError;
use crate::locator::RepoLocator;
use crate::package::PackageRequest;
use crate::report::Reporter;
use crate::run::PublicationRun;
use crate::settings::Settings;
use crate::sniff;
use crate::sync::{self, SyncWait};
use crate::types::{FileRole, PackageStatus};
use crate::upload::Uploader;

/// Index file maintained by the repository itself. Build tools write it
/// last, so its arrival marks the end of the artifact set.
const FINALIZE_SENTINEL: &str = "maven-metadata.xml";

/// Path segment under the CDN base where the formatted repository lives.
const DOWNLOAD_FORMAT: &str = "maven";

pub struct Publisher {
    locator: RepoLocator,
    settings: Settings,
    api: ApiClient,
    transfer: Client,
    run: PublicationRun,
    request: PackageRequest,
    slug: Option<String>,
    cdn_base: Option<String>,
}

impl Publisher {
    /// Open a publication run against one repository.
    ///
    /// `api_key` is the host's explicit credential and outranks both the
    /// `CONSIGN_API_KEY` environment variable and the config file.
    pub fn open(
        locator: RepoLocator,
        settings: Settings,
        api_key: Option<&str>,
        reporter: &mut dyn Reporter,
    ) -> Result<Self> {
        let key = auth::resolve_api_key(api_key, settings.api_key.as_deref());
        if key.is_none() {
            reporter.warn(
                "no API key configured; private repositories will refuse anonymous access",
            );
        }

        let api = ApiClient::new(
            &locator.api_base,
            key,
            settings.connect_timeout(),
            settings.read_timeout(),
        )?;
        // Uploads get their own client: presigned POSTs carry no API key
        // and large transfers need the longer write timeout.
        let transfer = Client::builder()
            .user_agent(format!("consign/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.write_timeout())
            .build()
            .context("failed to construct transfer client")?;

        reporter.debug(&format!(
            "Publishing to {}/{} via {}",
            locator.owner, locator.repository, locator.api_base
        ));
        Ok(Self {
            locator,
            settings,
            api,
            transfer,
            run: PublicationRun::new(),
            request: PackageRequest::default(),
            slug: None,
            cdn_base: None,
        })
    }

    pub fn locator(&self) -> &RepoLocator {
        &self.locator
    }

    pub fn run(&self) -> &PublicationRun {
        &self.run
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.is_authenticated()
    }

    /// Slug of the package created by this run, once [`Publisher::finalize`]
    /// has reached package creation.
    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    /// Attach caller metadata to the eventual package creation call.
    ///
    /// Keys that collide with the file identifier fields are ignored with a
    /// warning rather than corrupting the request.
    pub fn add_metadata(
        &mut self,
        key: &str,
        value: serde_json::Value,
        reporter: &mut dyn Reporter,
    ) {
        if !self.request.insert_metadata(key, value) {
            reporter.warn(&format!("ignoring metadata key '{key}': it is reserved"));
        }
    }

    /// Stage one local file for the package being assembled.
    ///
    /// The destination path's basename drives classification together with
    /// the detected media type; the upload itself names the file after the
    /// local source. Files without a publishable role are skipped; the
    /// metadata sentinel finalizes the package instead of being uploaded.
    pub fn put(
        &mut self,
        source: &Path,
        destination: &str,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        if self.run.is_terminated() {
            reporter.debug(&format!(
                "Skipping {destination}: publication already terminated"
            ));
            return Ok(());
        }

        let filename = destination.rsplit('/').next().unwrap_or("");
        if filename.is_empty() {
            reporter.debug(&format!("Skipping {destination}: no file name in destination"));
            return Ok(());
        }
        if filename == FINALIZE_SENTINEL {
            reporter.debug("Metadata index received; assembling the package");
            self.finalize(reporter)?;
            return Ok(());
        }

        let source_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        let content_type = match sniff::sniff_path(source, &source_name) {
            Ok(content_type) => content_type,
            Err(err) => {
                return self.fatal(
                    PublishError::ClassificationIo {
                        file: source.display().to_string(),
                        source: err,
                    },
                    reporter,
                );
            }
        };

        let role = classify::classify(&content_type, filename, &source_name);
        if role == FileRole::Unknown {
            reporter.debug(&format!(
                "Skipping {filename}: no publishable role ({content_type})"
            ));
            return Ok(());
        }
        reporter.debug(&format!("Classified {filename} as {role} ({content_type})"));

        let uploader = Uploader::new(
            &self.api,
            &self.transfer,
            &self.locator.owner,
            &self.locator.repository,
        );
        let identifier = match uploader.upload(source, &source_name, &content_type, reporter) {
            Ok(identifier) => identifier,
            Err(err) => return self.fatal(err, reporter),
        };
        if let Err(err) = self
            .request
            .record(role, &identifier, self.settings.strict_roles)
        {
            return self.fatal(err, reporter);
        }
        Ok(())
    }

    /// Assemble the uploaded files into a package and wait out its sync.
    ///
    /// Returns the completed status snapshot, or `None` when sync-wait is
    /// disabled or the run was already terminated. A failed sync latches
    /// the run as failed and is reported as an error naming the terminal
    /// status and stage.
    pub fn finalize(&mut self, reporter: &mut dyn Reporter) -> Result<Option<PackageStatus>> {
        if self.run.is_terminated() {
            reporter.debug("Skipping package assembly: publication already terminated");
            return Ok(None);
        }
        if !self.request.has_primary() {
            return self.fatal(PublishError::MissingPrimaryArtifact, reporter);
        }

        reporter.info(&format!(
            "Creating package from {} uploaded files",
            self.request.file_count()
        ));
        let handle = match self.api.create_package(
            &self.locator.owner,
            &self.locator.repository,
            &self.request,
        ) {
            Ok(handle) => handle,
            Err(err) => return self.fatal(err, reporter),
        };
        reporter.info(&format!(
            "Created: {}/{}/{}",
            self.locator.owner, self.locator.repository, handle.slug
        ));
        self.slug = Some(handle.slug.clone());

        if !self.settings.sync_wait.enabled {
            reporter.info("Sync wait disabled; the package will synchronise in the background");
            self.run.complete();
            return Ok(None);
        }

        let wait = SyncWait {
            interval: self.settings.sync_interval(),
            max_wait: self.settings.max_sync_wait(),
            verbose: self.settings.sync_wait.verbose,
        };
        let status = match sync::await_terminal(
            &self.api,
            &self.locator.owner,
            &self.locator.repository,
            &handle.slug,
            wait,
            reporter,
        ) {
            Ok(status) => status,
            Err(err) => return self.fatal(err, reporter),
        };

        if status.is_sync_failed {
            let msg = format!(
                "package sync failed (status={}, stage={})",
                status.status_str, status.stage_str
            );
            reporter.error(&msg);
            self.run.fail(&msg);
            bail!(msg);
        }

        reporter.info(&format!(
            "Publish complete: {}/{}/{}",
            self.locator.owner, self.locator.repository, handle.slug
        ));
        self.run.complete();
        Ok(Some(status))
    }

    /// Fetch a repository path from the CDN into a local file.
    ///
    /// Returns `false` when the fetch was skipped: after a failed run, and
    /// for the metadata index the repository maintains itself.
    pub fn get(
        &mut self,
        remote_path: &str,
        out: &Path,
        reporter: &mut dyn Reporter,
    ) -> Result<bool> {
        if self.run.is_failed() {
            reporter.debug(&format!(
                "Skipping download of {remote_path}: publication failed"
            ));
            return Ok(false);
        }
        let filename = remote_path.rsplit('/').next().unwrap_or("");
        if filename == FINALIZE_SENTINEL {
            reporter.debug("Skipping metadata download; the repository rebuilds its own index");
            return Ok(false);
        }

        let cdn_base = self.cdn_base(reporter)?;
        let url = format!("{cdn_base}/{}", remote_path.trim_start_matches('/'));
        reporter.debug(&format!("Fetching {url}"));
        let mut resp = self
            .transfer
            .get(&url)
            .send()
            .with_context(|| format!("failed to fetch {url}"))?;
        match resp.status() {
            StatusCode::OK => {
                // Stream straight to disk; artifacts can be large.
                let mut file = std::fs::File::create(out)
                    .with_context(|| format!("failed to create {}", out.display()))?;
                std::io::copy(&mut resp, &mut file)
                    .with_context(|| format!("failed to write {}", out.display()))?;
                Ok(true)
            }
            StatusCode::NOT_FOUND => bail!("{remote_path} does not exist in the repository"),
            status => bail!("download of {remote_path} failed with HTTP {status}"),
        }
    }

    /// Timestamp-conditional fetch. The CDN does not expose modification
    /// times, so the remote is never considered newer and nothing is
    /// downloaded.
    pub fn get_if_newer(
        &mut self,
        remote_path: &str,
        _out: &Path,
        _than: SystemTime,
        reporter: &mut dyn Reporter,
    ) -> Result<bool> {
        reporter.debug(&format!(
            "Skipping conditional fetch of {remote_path}: timestamps are not exposed"
        ));
        Ok(false)
    }

    /// One status snapshot for an already-created package.
    pub fn status(&self, slug: &str) -> Result<PackageStatus, PublishError> {
        self.api
            .package_status(&self.locator.owner, &self.locator.repository, slug)
    }

    /// The CDN base for downloads, fetched once per run and cached.
    pub fn cdn_base(&mut self, reporter: &mut dyn Reporter) -> Result<String> {
        if let Some(base) = &self.cdn_base {
            return Ok(base.clone());
        }
        let info = self
            .api
            .repo_info(&self.locator.owner, &self.locator.repository)?;
        let base = format!("{}/{DOWNLOAD_FORMAT}", info.cdn_url.trim_end_matches('/'));
        reporter.debug(&format!("Repository CDN base: {base}"));
        self.cdn_base = Some(base.clone());
        Ok(base)
    }

    fn fatal<T>(&self, err: PublishError, reporter: &mut dyn Reporter) -> Result<T> {
        let msg = err.to_string();
        reporter.error(&msg);
        self.run.fail(&msg);
        Err(err.into())
    }
}
