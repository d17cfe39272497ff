//! Error types shared by every furyctl crate

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Main error type for furyctl operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Invalid settings or flags
    #[error("Configuration error: {message}")]
    #[diagnostic(code(furyctl::config))]
    Configuration {
        /// Description of the problem
        message: String,
        /// Optional remediation hint
        #[help]
        help: Option<String>,
    },

    /// A YAML document could not be unmarshalled
    #[error("error while parsing {}: {message}", path.display())]
    #[diagnostic(
        code(furyctl::config::parse),
        help("Check that the file is valid YAML and contains apiVersion, kind, metadata.name and spec.distributionVersion")
    )]
    ConfigParse {
        /// File being parsed
        path: Box<Path>,
        /// Parser message
        message: String,
    },

    /// I/O error with path context
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(furyctl::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "copy", "rename")
        operation: String,
    },

    /// A single getter attempt failed
    #[error("failed to fetch '{src}': {message}")]
    #[diagnostic(code(furyctl::netx::fetch))]
    Fetch {
        /// Source locator as handed to the getter
        src: String,
        /// Reason reported by the getter
        message: String,
    },

    /// Every protocol candidate failed for a source locator
    #[error("all download options exhausted for '{src}'")]
    #[diagnostic(
        code(furyctl::netx::exhausted),
        help("Check the location, your network connection and your git/SSH credentials")
    )]
    DownloadOptionsExhausted {
        /// Source locator without protocol prefix
        src: String,
        /// Every candidate that was tried, in order
        attempts: Vec<String>,
    },

    /// The distribution bundle could not be fetched
    #[error("{message}")]
    #[diagnostic(code(furyctl::distribution::download))]
    DistributionFetch {
        /// Message naming the location or version
        message: String,
        /// Underlying fetch failure
        #[source]
        source: Box<Error>,
    },

    /// The bundle is not a usable distribution
    #[error("unsupported distribution version: {message}")]
    #[diagnostic(code(furyctl::distribution::unsupported))]
    UnsupportedDistributionVersion {
        /// Message naming the location or version
        message: String,
        /// Optional remediation hint
        #[help]
        help: Option<String>,
    },

    /// `kfd.yaml` failed to parse or validate
    #[error("invalid distribution manifest {}: {}", path.display(), violations.join("; "))]
    #[diagnostic(code(furyctl::distribution::schema))]
    SchemaValidation {
        /// Manifest path
        path: Box<Path>,
        /// Every violated constraint
        violations: Vec<String>,
    },

    /// The checksum table has no entry for the host platform
    #[error("{tool}: no checksum entry for platform {platform}")]
    #[diagnostic(
        code(furyctl::tools::checksum_missing),
        help("The distribution does not publish a checksum for this platform")
    )]
    ChecksumEntryMissing {
        /// Tool name
        tool: String,
        /// Platform key, e.g. "linux/amd64"
        platform: String,
    },

    /// The binary hash does not match the published one
    #[error("{tool}: checksum mismatch - expected = {expected}, actual = {actual}")]
    #[diagnostic(
        code(furyctl::tools::checksum_mismatch),
        help("The binary may be corrupted or tampered with; remove it and download it again")
    )]
    ChecksumMismatch {
        /// Tool name
        tool: String,
        /// Published sha256
        expected: String,
        /// Computed sha256
        actual: String,
    },

    /// The tool binary could not be invoked at all
    #[error("{tool}: missing binary {} - {message}", path.display())]
    #[diagnostic(
        code(furyctl::tools::missing_binary),
        help("Run 'furyctl download dependencies' or install the tool manually")
    )]
    MissingBinary {
        /// Tool name
        tool: String,
        /// Path or program name that was invoked
        path: Box<Path>,
        /// Reason the invocation failed
        message: String,
    },

    /// The installed tool reports a different version than the pinned one
    #[error("{tool}: wrong tool version - installed = {installed}, expected = {expected}")]
    #[diagnostic(code(furyctl::tools::wrong_version))]
    WrongToolVersion {
        /// Tool name
        tool: String,
        /// Normalized installed version
        installed: String,
        /// Normalized expected version
        expected: String,
    },

    /// The manifest pins no version for a tool that needs one
    #[error("{tool}: empty expected version")]
    #[diagnostic(code(furyctl::tools::empty_version))]
    EmptyToolVersion {
        /// Tool name
        tool: String,
    },

    /// A version probe did not finish in time
    #[error("{tool}: version probe timed out after {seconds} seconds")]
    #[diagnostic(code(furyctl::exec::timeout))]
    ProbeTimeout {
        /// Tool name
        tool: String,
        /// Configured timeout
        seconds: u64,
    },

    /// Aggregate of every failed dependency check
    #[error("{} dependency check(s) failed", errors.len())]
    #[diagnostic(
        code(furyctl::dependencies),
        help("Fix every listed tool, or run 'furyctl download dependencies'")
    )]
    DependencyCheck {
        /// Individual failures, in tool order
        #[related]
        errors: Vec<Error>,
    },
}

/// Classification of a dependency validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The binary is absent or could not be run.
    MissingBinary,
    /// The binary reports another version.
    WrongVersion,
    /// The manifest does not pin a version.
    EmptyExpectedVersion,
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text
    #[must_use]
    pub fn configuration_with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
            help: Some(help.into()),
        }
    }

    /// Create a YAML parse error
    #[must_use]
    pub fn config_parse(path: &Path, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create an I/O error without path context
    #[must_use]
    pub fn io_no_path(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: None,
            operation: operation.into(),
        }
    }

    /// Create a single-attempt fetch error
    #[must_use]
    pub fn fetch(src: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            src: src.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported distribution error
    #[must_use]
    pub fn unsupported_distribution(message: impl Into<String>) -> Self {
        Self::UnsupportedDistributionVersion {
            message: message.into(),
            help: None,
        }
    }

    /// Create a schema validation error
    #[must_use]
    pub fn schema_validation(path: &Path, violations: Vec<String>) -> Self {
        Self::SchemaValidation {
            path: path.into(),
            violations,
        }
    }

    /// Create a missing binary error
    #[must_use]
    pub fn missing_binary(
        tool: impl Into<String>,
        path: impl AsRef<Path>,
        message: impl Into<String>,
    ) -> Self {
        Self::MissingBinary {
            tool: tool.into(),
            path: path.as_ref().into(),
            message: message.into(),
        }
    }

    /// Create a wrong version error
    #[must_use]
    pub fn wrong_tool_version(
        tool: impl Into<String>,
        installed: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::WrongToolVersion {
            tool: tool.into(),
            installed: installed.into(),
            expected: expected.into(),
        }
    }

    /// Create an empty version error
    #[must_use]
    pub fn empty_tool_version(tool: impl Into<String>) -> Self {
        Self::EmptyToolVersion { tool: tool.into() }
    }

    /// Which dependency validation class this error belongs to, if any.
    ///
    /// Probe timeouts count as missing binaries: the tool never reported a version.
    #[must_use]
    pub fn validation_kind(&self) -> Option<ValidationErrorKind> {
        match self {
            Self::MissingBinary { .. } | Self::ProbeTimeout { .. } => {
                Some(ValidationErrorKind::MissingBinary)
            }
            Self::WrongToolVersion { .. } => Some(ValidationErrorKind::WrongVersion),
            Self::EmptyToolVersion { .. } => Some(ValidationErrorKind::EmptyExpectedVersion),
            _ => None,
        }
    }

    /// Name of the tool this error is about, if any.
    #[must_use]
    pub fn tool(&self) -> Option<&str> {
        match self {
            Self::ChecksumEntryMissing { tool, .. }
            | Self::ChecksumMismatch { tool, .. }
            | Self::MissingBinary { tool, .. }
            | Self::WrongToolVersion { tool, .. }
            | Self::EmptyToolVersion { tool }
            | Self::ProbeTimeout { tool, .. } => Some(tool),
            _ => None,
        }
    }

    /// Whether this error, or the error it wraps, is a download exhaustion.
    #[must_use]
    pub fn is_download_exhausted(&self) -> bool {
        match self {
            Self::DownloadOptionsExhausted { .. } => true,
            Self::DistributionFetch { source, .. } => source.is_download_exhausted(),
            _ => false,
        }
    }
}

/// Result type for furyctl operations
pub type Result<T> = std::result::Result<T, Error>;
