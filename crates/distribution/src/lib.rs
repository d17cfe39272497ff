//! Distribution resolution for furyctl.
//!
//! [`DistributionResolver::download`] turns a cluster configuration into a
//! local, patched copy of the fury-distribution bundle plus its parsed
//! manifest.

mod compatibility;
mod patches;
mod resolver;

pub use compatibility::{Compatibility, check as check_compatibility};
pub use patches::{PatchSet, embedded_patches};
pub use resolver::{DistributionResolver, DownloadResult};
