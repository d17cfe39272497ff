//! Core types and utilities for furyctl.
//!
//! This crate holds everything the distribution and dependency crates share:
//!
//! - [`Error`] / [`Result`] - the error taxonomy used across the workspace
//! - [`Platform`], [`Os`], [`Arch`] - host identification for release URLs
//! - [`ExecContext`] - explicit subprocess execution context (runner, timeout, debug)
//! - [`MinimalClusterConfig`] - the few `furyctl.yaml` fields this core reads
//! - [`DistributionManifest`] - the parsed `kfd.yaml`
//! - [`Settings`] - paths and switches resolved by the CLI

mod error;

pub mod cluster;
pub mod exec;
pub mod manifest;
pub mod platform;
pub mod settings;
pub mod tool_name;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cluster::{ClusterKind, MinimalClusterConfig};
pub use error::{Error, Result, ValidationErrorKind};
pub use exec::{CommandOutput, CommandRunner, ExecContext, SystemRunner};
pub use manifest::{DistributionManifest, ManifestTools, Tool};
pub use platform::{Arch, Os, Platform};
pub use settings::{GitProtocol, Settings};
pub use tool_name::ToolName;

/// Name of the distribution manifest at the root of every bundle.
pub const KFD_FILE_NAME: &str = "kfd.yaml";

/// Directory under the output directory holding furyctl state.
pub const FURYCTL_DIR_NAME: &str = ".furyctl";
