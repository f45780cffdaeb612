//! # Consign
//!
//! A publishing pipeline for pushing artifact sets to a consign package
//! repository over HTTP.
//!
//! Consign takes a group of related build outputs — a primary archive plus
//! its descriptor, documentation, and sources side-files — uploads each file
//! through the repository's two-phase upload protocol, assembles them into a
//! single package, and then blocks until the repository has finished syncing
//! the package into a queryable state.
//!
//! ## Pipeline
//!
//! The core flow is **classify → checksum → upload → assemble → finalize →
//! await sync**:
//!
//! 1. [`classify::classify`] decides each file's role (primary artifact,
//!    descriptor, documentation, sources) from its detected media type and
//!    the `-javadoc.` / `-sources.` markers in its name. Files that fit no
//!    role are skipped.
//! 2. [`checksum::md5_hex`] streams the file through MD5; the digest rides
//!    along with the upload registration so the server can verify receipt.
//! 3. [`upload::Uploader`] registers the file with the API, then POSTs the
//!    bytes to the server-issued upload URL together with the server-issued
//!    form fields.
//! 4. [`package::PackageRequest`] accumulates the uploaded file identifiers
//!    under their roles; [`publisher::Publisher::finalize`] turns it into a
//!    package via the packages endpoint.
//! 5. [`sync::await_terminal`] polls the package status until the repository
//!    reports the sync completed or failed.
//!
//! A run either reaches the completed state or fails at the first fatal
//! error; [`run::PublicationRun`] latches whichever happens first, and every
//! later operation on the same run becomes a silent no-op.
//!
//! ## Example
//!
//! ```ignore
//! use consign::locator::RepoLocator;
//! use consign::publisher::Publisher;
//! use consign::report::NullReporter;
//! use consign::settings::Settings;
//!
//! let mut reporter = NullReporter;
//! let locator = RepoLocator::parse("consign+https://consign/acme/widgets")?;
//! let settings = Settings::resolve(None, &mut reporter)?;
//! let mut publisher = Publisher::open(locator, settings, None, &mut reporter)?;
//!
//! publisher.put("widget-1.0.jar".as_ref(), "acme/widget/1.0/widget-1.0.jar", &mut reporter)?;
//! publisher.put("widget-1.0.pom".as_ref(), "acme/widget/1.0/widget-1.0.pom", &mut reporter)?;
//! publisher.finalize(&mut reporter)?;
//! ```
//!
//! ## Key Types
//!
//! - `RepoLocator` — parsed `consign+https://…/<owner>/<repo>` target
//! - `Settings` — resolved configuration (env > `.consign.toml` > defaults)
//! - `FileRole` — classification outcome for a single file
//! - `PackageRequest` — role-to-identifier accumulator for one package
//! - `PackageStatus` — one poll's snapshot of the remote sync job
//! - `PublishError` — the pipeline's fatal error taxonomy
//!
//! ## CLI Usage
//!
//! For command-line usage, see the consign-cli crate.

/// JSON API client: upload registration, package creation, status, repo info.
pub mod api;

/// API key resolution: `CONSIGN_API_KEY` → `.consign.toml`.
pub mod auth;

/// Streaming MD5 checksums for upload verification.
pub mod checksum;

/// File role classification from media type and naming conventions.
pub mod classify;

/// The pipeline's fatal error taxonomy.
pub mod error;

/// Repository locator parsing (`consign+<scheme>://…/<owner>/<repo>`).
pub mod locator;

/// Package request assembly: role slots and metadata passthrough.
pub mod package;

/// Put/get surface driven by the transport host; orchestrates the pipeline.
pub mod publisher;

/// Logging seam threaded through every operation.
pub mod report;

/// Run-scoped failed/completed latches.
pub mod run;

/// Configuration file (`.consign.toml`) loading and env overlay.
pub mod settings;

/// Media type detection from leading file bytes.
pub mod sniff;

/// Poll-to-terminal loop for remote package sync.
pub mod sync;

/// Wire and domain models shared across the pipeline.
pub mod types;

/// Multipart upload sessions against server-issued upload URLs.
pub mod upload;

pub use error::PublishError;
pub use types::FileRole;
