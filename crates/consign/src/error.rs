//! Publishing error types.

use std::io;
use std::time::Duration;

use crate::types::FileRole;

/// Errors produced by the publishing pipeline.
///
/// All of these are fatal for the run: the first one sets the run's failed
/// latch and every later put/finalize on the same run becomes a no-op.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Reading the file to detect its media type failed.
    #[error("could not determine file type for {file}")]
    ClassificationIo {
        file: String,
        #[source]
        source: io::Error,
    },

    /// Reading the file while computing its checksum failed.
    #[error("could not calculate checksum for {file}")]
    ChecksumIo {
        file: String,
        #[source]
        source: io::Error,
    },

    /// The upload-registration endpoint refused the file or was unreachable.
    #[error("could not request file upload: {detail}")]
    RegistrationRejected { detail: String },

    /// Reading the file back for the transfer itself failed.
    #[error("could not read {file} for upload")]
    UploadIo {
        file: String,
        #[source]
        source: io::Error,
    },

    /// The server-issued upload URL answered with a non-success status.
    ///
    /// For HTTP 400 the `detail` is the response body verbatim; the server
    /// uses it for structured rejections such as checksum mismatches.
    #[error("upload rejected with HTTP {status}: {detail}")]
    UploadRejected { status: u16, detail: String },

    /// The multipart transfer failed on the wire before a response arrived.
    #[error("could not upload file: {file}")]
    UploadTransport {
        file: String,
        #[source]
        source: reqwest::Error,
    },

    /// The packages endpoint refused the assembled request.
    #[error("could not create package: {detail}")]
    PackageCreationRejected { detail: String },

    /// A status poll failed on the wire; losing the ability to ask is fatal,
    /// unlike the remote job itself failing (which is a terminal snapshot).
    #[error("could not wait for package sync")]
    PollTransport {
        #[source]
        source: reqwest::Error,
    },

    /// The sync poll deadline elapsed without a terminal state.
    #[error("package sync did not reach a terminal state within {waited:?}")]
    PollTimeout { waited: Duration },

    /// Finalize was requested but no primary artifact was ever recorded.
    #[error("no primary artifact was uploaded; nothing to publish")]
    MissingPrimaryArtifact,

    /// Strict role mode: a second upload arrived for an occupied role.
    #[error("a {role} file was already uploaded for this package")]
    DuplicateRole { role: FileRole },
}
