//! Tool descriptors for furyctl.
//!
//! A [`ToolDescriptor`] knows, for one tool at one pinned version, where its
//! release artifact lives ([`ToolDescriptor::src_path`]), how to normalize
//! what the artifact unpacks to ([`ToolDescriptor::rename`]) and how to check
//! an installed binary ([`ToolDescriptor::check_bin_version`]). Version
//! parsing is table-driven, see [`version::RULES`].

mod checksum;
mod descriptor;
mod factory;
pub mod version;

pub use checksum::{sha256_file, validate_checksum};
pub use descriptor::ToolDescriptor;
pub use factory::ToolFactory;
pub use version::{VersionChecker, VersionRule, normalize_version};
