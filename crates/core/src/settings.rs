//! Paths and switches shared by every command.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::exec::{DEFAULT_PROBE_TIMEOUT, ExecContext};
use crate::{Error, FURYCTL_DIR_NAME};

/// Protocol used to reach the default distribution repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitProtocol {
    #[default]
    Https,
    Ssh,
}

impl GitProtocol {
    /// Prefix of every SIGHUP repository for this protocol.
    #[must_use]
    pub fn repository_prefix(self) -> &'static str {
        match self {
            Self::Https => "https://github.com/sighupio",
            Self::Ssh => "git@github.com:sighupio",
        }
    }
}

impl FromStr for GitProtocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "https" => Ok(Self::Https),
            "ssh" => Ok(Self::Ssh),
            other => Err(Error::configuration_with_help(
                format!("invalid git protocol '{other}'"),
                "Use 'https' or 'ssh'",
            )),
        }
    }
}

impl std::fmt::Display for GitProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Https => f.write_str("https"),
            Self::Ssh => f.write_str("ssh"),
        }
    }
}

/// Settings resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base directory for `.furyctl` state.
    pub outdir: PathBuf,
    /// Tool binaries root; defaults to `<outdir>/.furyctl/bin`.
    pub bin_path: Option<PathBuf>,
    /// Download cache root; defaults to `<outdir>/.furyctl/cache`.
    pub cache_dir: Option<PathBuf>,
    pub git_protocol: GitProtocol,
    /// Explicit distribution location; the default repository is used when unset.
    pub distro_location: Option<String>,
    /// Location of user-provided distribution patches.
    pub distro_patches_location: Option<String>,
    pub probe_timeout: Duration,
    pub skip_validation: bool,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            outdir: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            bin_path: None,
            cache_dir: None,
            git_protocol: GitProtocol::default(),
            distro_location: None,
            distro_patches_location: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            skip_validation: false,
            debug: false,
        }
    }
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_outdir(mut self, outdir: PathBuf) -> Self {
        self.outdir = outdir;
        self
    }

    #[must_use]
    pub fn with_bin_path(mut self, path: PathBuf) -> Self {
        self.bin_path = Some(path);
        self
    }

    #[must_use]
    pub fn with_cache_dir(mut self, path: PathBuf) -> Self {
        self.cache_dir = Some(path);
        self
    }

    #[must_use]
    pub fn with_git_protocol(mut self, protocol: GitProtocol) -> Self {
        self.git_protocol = protocol;
        self
    }

    #[must_use]
    pub fn with_distro_location(mut self, location: impl Into<String>) -> Self {
        self.distro_location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_distro_patches_location(mut self, location: impl Into<String>) -> Self {
        self.distro_patches_location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// `<outdir>/.furyctl`
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.outdir.join(FURYCTL_DIR_NAME)
    }

    /// Tool binaries root.
    #[must_use]
    pub fn bin_path(&self) -> PathBuf {
        self.bin_path
            .clone()
            .unwrap_or_else(|| self.state_dir().join("bin"))
    }

    /// Download cache root.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.state_dir().join("cache"))
    }

    /// Execution context honouring the probe timeout and debug switch.
    #[must_use]
    pub fn exec_context(&self) -> ExecContext {
        ExecContext::new()
            .with_probe_timeout(self.probe_timeout)
            .with_debug(self.debug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_derive_from_outdir() {
        let settings = Settings::new().with_outdir(PathBuf::from("/work"));
        assert_eq!(settings.bin_path(), PathBuf::from("/work/.furyctl/bin"));
        assert_eq!(settings.cache_dir(), PathBuf::from("/work/.furyctl/cache"));
    }

    #[test]
    fn test_explicit_paths_win() {
        let settings = Settings::new()
            .with_outdir(PathBuf::from("/work"))
            .with_bin_path(PathBuf::from("/opt/bin"))
            .with_cache_dir(PathBuf::from("/var/cache/furyctl"));
        assert_eq!(settings.bin_path(), PathBuf::from("/opt/bin"));
        assert_eq!(settings.cache_dir(), PathBuf::from("/var/cache/furyctl"));
    }

    #[test]
    fn test_git_protocol_parse() {
        assert_eq!("HTTPS".parse::<GitProtocol>().unwrap(), GitProtocol::Https);
        assert_eq!("ssh".parse::<GitProtocol>().unwrap(), GitProtocol::Ssh);
        assert!("ftp".parse::<GitProtocol>().is_err());
        assert_eq!(
            GitProtocol::Ssh.repository_prefix(),
            "git@github.com:sighupio"
        );
    }

    #[test]
    fn test_exec_context_carries_timeout() {
        let settings = Settings::new()
            .with_probe_timeout(Duration::from_secs(7))
            .with_debug(true);
        let ctx = settings.exec_context();
        assert_eq!(ctx.probe_timeout(), Duration::from_secs(7));
        assert!(ctx.debug());
    }
}
