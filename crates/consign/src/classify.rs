use crate::types::FileRole;

const XML_MEDIA_TYPE: &str = "application/xml";

/// Media types that mark a file as a deployable archive.
const ARCHIVE_MEDIA_TYPES: [&str; 6] = [
    "application/java-archive",
    "application/x-java-archive",
    "application/x-ear",
    "application/x-war",
    "application/x-aar",
    "application/zip",
];

const DOCS_MARKER: &str = "-javadoc.";
const SOURCES_MARKER: &str = "-sources.";

/// Assign a publishing role to one file of an artifact set.
///
/// XML wins outright: a descriptor is recognized by its detected media type
/// no matter what the file is called. Archives are recognized either by
/// media type or by the destination name carrying an `*ar` extension, then
/// split by the classifier markers in the source file's own name. Anything
/// else has no role in the package and is reported as [`FileRole::Unknown`].
pub fn classify(content_type: &str, dest_name: &str, source_name: &str) -> FileRole {
    if content_type == XML_MEDIA_TYPE {
        return FileRole::Descriptor;
    }

    if ARCHIVE_MEDIA_TYPES.contains(&content_type) || has_archive_extension(dest_name) {
        if source_name.contains(DOCS_MARKER) {
            return FileRole::Documentation;
        }
        if source_name.contains(SOURCES_MARKER) {
            return FileRole::Sources;
        }
        return FileRole::PrimaryArtifact;
    }

    FileRole::Unknown
}

// A leading dot is a hidden file, not an extension.
fn has_archive_extension(name: &str) -> bool {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx + 1..].to_ascii_lowercase().ends_with("ar"),
        _ => false,
    }
}
