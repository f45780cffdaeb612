use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Role a file plays within a published package.
///
/// Assigned once per file by [`crate::classify::classify`]; `Unknown` files
/// are skipped by the pipeline rather than uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileRole {
    Unknown,
    PrimaryArtifact,
    Descriptor,
    Documentation,
    Sources,
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileRole::Unknown => "unknown",
            FileRole::PrimaryArtifact => "primary artifact",
            FileRole::Descriptor => "descriptor",
            FileRole::Documentation => "documentation",
            FileRole::Sources => "sources",
        };
        f.write_str(s)
    }
}

/// Server-issued upload coordinates for one file.
///
/// Returned by the upload-registration endpoint and consumed immediately by
/// the multipart transfer; never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadRegistration {
    /// Opaque identifier later referenced in the package request.
    pub identifier: String,
    /// Where the file bytes must be POSTed.
    pub upload_url: String,
    /// Form fields the server requires ahead of the file part, in order.
    #[serde(default)]
    pub upload_fields: BTreeMap<String, String>,
}

/// Handle to a created package, as returned by the packages endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageHandle {
    pub slug: String,
}

/// One poll's snapshot of the remote sync job.
///
/// Every field is defaulted so sparse server payloads still parse; a fresh
/// snapshot is fetched per poll and never cached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageStatus {
    #[serde(default)]
    pub status_str: String,
    #[serde(default)]
    pub stage_str: String,
    /// Percentage in `0..=100`.
    #[serde(default)]
    pub sync_progress: u8,
    #[serde(default)]
    pub is_sync_completed: bool,
    #[serde(default)]
    pub is_sync_failed: bool,
}

impl PackageStatus {
    /// Whether this snapshot is one of the two absorbing terminal states.
    pub fn is_terminal(&self) -> bool {
        self.is_sync_completed || self.is_sync_failed
    }
}

/// Repository details used for the download path.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    /// Base URL of the repository's CDN; artifact downloads resolve
    /// against `{cdn_url}/maven/`.
    pub cdn_url: String,
}
