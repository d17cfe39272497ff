//! Validation and installation of the tools a distribution pins.
//!
//! [`DependencyValidator`] probes installed binaries and reports every
//! mismatch in one pass. [`DependenciesDownloader`] installs the pinned
//! releases under `<binRoot>/<tool>/<version>`.

mod downloader;
mod validator;

pub use downloader::{DependenciesDownloader, InstallOutcome};
pub use validator::{BASE_REQUIREMENTS, DependencyValidator, MANDATORY_TOOLS, into_result};
