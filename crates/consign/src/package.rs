//! Package assembly request built from uploaded file identifiers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::PublishError;
use crate::types::FileRole;

/// Slot names owned by the roles; caller metadata may not shadow them.
const RESERVED_FIELDS: [&str; 4] = [
    "package_file",
    "descriptor_file",
    "docs_file",
    "sources_file",
];

/// Body of the package creation call.
///
/// Each slot carries the server-issued identifier of one uploaded file.
/// Empty slots are left out of the payload entirely so the service applies
/// its own defaults for missing companions. Mutation is unsynchronized;
/// callers that parallelize uploads serialize access around the request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    package_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    descriptor_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    docs_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sources_file: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl PackageRequest {
    /// Record one uploaded file under its role.
    ///
    /// Re-recording a role overwrites the previous identifier unless strict
    /// mode is on, in which case the duplicate is rejected. Files without a
    /// role are ignored.
    pub fn record(
        &mut self,
        role: FileRole,
        identifier: &str,
        strict: bool,
    ) -> Result<(), PublishError> {
        let slot = match role {
            FileRole::PrimaryArtifact => &mut self.package_file,
            FileRole::Descriptor => &mut self.descriptor_file,
            FileRole::Documentation => &mut self.docs_file,
            FileRole::Sources => &mut self.sources_file,
            FileRole::Unknown => return Ok(()),
        };
        if strict && slot.is_some() {
            return Err(PublishError::DuplicateRole { role });
        }
        *slot = Some(identifier.to_string());
        Ok(())
    }

    /// Whether the deployable archive slot has been filled.
    pub fn has_primary(&self) -> bool {
        self.package_file.is_some()
    }

    pub fn file_count(&self) -> usize {
        [
            &self.package_file,
            &self.descriptor_file,
            &self.docs_file,
            &self.sources_file,
        ]
        .iter()
        .filter(|slot| slot.is_some())
        .count()
    }

    /// Attach a caller-supplied field to the creation payload.
    ///
    /// Returns `false` when the key would shadow a role slot, leaving the
    /// request unchanged.
    pub fn insert_metadata(&mut self, key: &str, value: serde_json::Value) -> bool {
        if RESERVED_FIELDS.contains(&key) {
            return false;
        }
        self.extra.insert(key.to_string(), value);
        true
    }
}
